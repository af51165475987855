//! HTTP server for county and partner searches.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use setaside::config::Config;
use setaside::partner::PartnerSearch;
use setaside::sba::SbaClient;
use setaside::usaspending::UsaSpendingClient;
use setaside::CountyLocator;

mod handlers;
use handlers::{county_search_handler, health_handler, partner_search_handler, AppState};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Set-aside partner search server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the county reference files (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Search radius in miles (overrides config)
    #[arg(long)]
    radius: Option<f64>,

    /// Load reference data at startup instead of on the first request
    #[arg(long)]
    preload: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setaside::logging::init(args.verbose)?;

    let config = Config::load_or_default(args.config.as_deref())?
        .with_overrides(args.data_dir, args.radius)?;

    info!("Setaside Server");
    info!(
        "Reference data directory: {}",
        config.reference.data_dir.display()
    );

    let locator = Arc::new(CountyLocator::new(config.reference.paths()));
    if args.preload {
        let index = locator
            .ensure_loaded()
            .await
            .context("Failed to load county reference data")?;
        info!("Preloaded {} county centroids", index.stats().counties_with_centroids);
    }

    let awards = UsaSpendingClient::new(&config.api, &config.search)?;
    let certifications = SbaClient::new(&config.api)?;
    let partner = PartnerSearch::new(
        Arc::clone(&locator),
        awards,
        certifications,
        config.search.radius_miles,
        config.search.max_contractors,
    );

    let state = Arc::new(AppState {
        locator,
        partner,
        radius_miles: config.search.radius_miles,
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/county-search", post(county_search_handler))
        .route("/api/partner-search", post(partner_search_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
