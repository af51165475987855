//! Request handlers and JSON shapes for the HTTP API.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

use setaside::county::IndexStats;
use setaside::partner::{PartnerSearch, PartnerSearchResponse};
use setaside::sba::SbaClient;
use setaside::usaspending::UsaSpendingClient;
use setaside::{CountyLocator, Error, ErrorKind, RadiusResult};

/// Application state shared across handlers
pub struct AppState {
    pub locator: Arc<CountyLocator>,
    pub partner: PartnerSearch<UsaSpendingClient, SbaClient>,
    pub radius_miles: f64,
}

#[derive(Serialize)]
pub struct ErrorBody {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
}

fn error_response(err: Error) -> ApiError {
    let status = match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::UpstreamFailure | ErrorKind::Internal => {
            tracing::error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    reference_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<IndexStats>,
}

/// Health check endpoint. Never triggers a reference load.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let loaded = state.locator.is_loaded();
    let stats = if loaded {
        state.locator.ensure_loaded().await.ok().map(|i| i.stats())
    } else {
        None
    };

    Json(HealthResponse {
        status: "ok",
        reference_loaded: loaded,
        stats,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountySearchRequest {
    address: Option<String>,
    radius_miles: Option<f64>,
}

/// Counties within the radius of the ZIP found in an address
pub async fn county_search_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CountySearchRequest>,
) -> Result<Json<RadiusResult>, ApiError> {
    let address = body
        .address
        .filter(|a| !a.is_empty())
        .ok_or_else(|| bad_request("Address is required"))?;
    let radius = body.radius_miles.unwrap_or(state.radius_miles);

    state
        .locator
        .find_counties_near_address(&address, radius)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSearchRequest {
    #[serde(default)]
    address: String,
    #[serde(default)]
    naics_code: String,
    #[serde(default)]
    set_aside_type: String,
}

/// Certified contractors with award history near an address
pub async fn partner_search_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PartnerSearchRequest>,
) -> Result<Json<PartnerSearchResponse>, ApiError> {
    state
        .partner
        .run(&body.address, &body.naics_code, &body.set_aside_type)
        .await
        .map(Json)
        .map_err(error_response)
}
