//! SBA small business search, used to attach contact details and active
//! certifications to contractors found in award data.

use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::models::{ContractorResult, EnrichedContractor};

/// Business profile from the SBA search
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SbaProfile {
    pub uei: String,
    pub legal_business_name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub year_established: Option<String>,
    pub sam_active: bool,
    pub certifications: Vec<String>,
}

/// Source of SBA certification profiles keyed by unique entity id
pub trait CertificationLookup {
    /// Profile for a UEI, or `None` when it can't be found for any reason
    fn lookup(&self, uei: &str) -> impl Future<Output = Option<SbaProfile>> + Send;
}

#[derive(Debug, Deserialize)]
struct SbaResponse {
    #[serde(default)]
    results: Vec<SbaRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SbaRecord {
    uei: Option<String>,
    legal_business_name: Option<String>,
    contact_person: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    year_established: Option<Value>,
    sam_extract_code: Option<String>,
    active_8a_boolean: Option<bool>,
    active_wosb_boolean: Option<bool>,
    active_edwosb_boolean: Option<bool>,
    active_vosb_boolean: Option<bool>,
    active_sdvosb_boolean: Option<bool>,
    active_hz_boolean: Option<bool>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl From<SbaRecord> for SbaProfile {
    fn from(r: SbaRecord) -> Self {
        let flags = [
            (r.active_8a_boolean, "8(a)"),
            (r.active_wosb_boolean, "WOSB"),
            (r.active_edwosb_boolean, "EDWOSB"),
            (r.active_vosb_boolean, "VOSB"),
            (r.active_sdvosb_boolean, "SDVOSB"),
            (r.active_hz_boolean, "HUBZone"),
        ];
        let certifications = flags
            .iter()
            .filter(|(active, _)| active.unwrap_or(false))
            .map(|(_, label)| label.to_string())
            .collect();

        // Year is sometimes a number, sometimes a string
        let year_established = match r.year_established {
            Some(Value::String(s)) if !s.is_empty() => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Self {
            uei: r.uei.unwrap_or_default(),
            legal_business_name: r.legal_business_name.unwrap_or_default(),
            contact_person: non_empty(r.contact_person),
            email: non_empty(r.email),
            phone: non_empty(r.phone),
            website: non_empty(r.website),
            year_established,
            sam_active: r.sam_extract_code.as_deref() == Some("A"),
            certifications,
        }
    }
}

/// Search body with every facet left open except the UEI search term
fn request_body(uei: &str) -> Value {
    json!({
        "searchProfiles": { "searchTerm": uei },
        "location": { "states": [], "zipCodes": [], "counties": [], "districts": [], "msas": [] },
        "sbaCertifications": { "activeCerts": [], "isPreviousCert": false, "operatorType": "Or" },
        "naics": { "codes": [], "isPrimary": false, "operatorType": "Or" },
        "selfCertifications": { "certifications": [], "operatorType": "Or" },
        "keywords": { "list": [], "operatorType": "Or" },
        "lastUpdated": { "date": { "label": "Anytime", "value": "anytime" } },
        "samStatus": { "isActiveSAM": false },
        "qualityAssuranceProgram": { "description": "Anytime", "value": "anytime" },
        "entityDetailId": ""
    })
}

/// Client for the SBA certification search endpoint
#[derive(Clone)]
pub struct SbaClient {
    client: Client,
    url: String,
}

impl SbaClient {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: api.sba_url.clone(),
        })
    }

    async fn search_by_uei(&self, uei: &str) -> Result<Option<SbaProfile>> {
        let response = self
            .client
            .post(&self.url)
            .json(&request_body(uei))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "SBA search returned status {}",
                response.status()
            )));
        }

        let data: SbaResponse = response.json().await?;
        Ok(data.results.into_iter().next().map(SbaProfile::from))
    }
}

impl CertificationLookup for SbaClient {
    async fn lookup(&self, uei: &str) -> Option<SbaProfile> {
        if uei.is_empty() {
            return None;
        }

        match self.search_by_uei(uei).await {
            Ok(profile) => {
                debug!("SBA lookup for {}: found={}", uei, profile.is_some());
                profile
            }
            Err(e) => {
                warn!("SBA lookup for {} failed: {}", uei, e);
                None
            }
        }
    }
}

/// Attach SBA details to each contractor, looking all of them up at once.
/// Output order matches input order.
pub async fn enrich_contractors<C: CertificationLookup>(
    lookup: &C,
    contractors: Vec<ContractorResult>,
) -> Vec<EnrichedContractor> {
    let profiles = join_all(contractors.iter().map(|c| lookup.lookup(&c.recipient_uei))).await;

    contractors
        .into_iter()
        .zip(profiles)
        .map(|(contractor, profile)| {
            let profile = profile.unwrap_or_default();
            EnrichedContractor {
                contractor,
                contact_person: profile.contact_person,
                email: profile.email,
                phone: profile.phone,
                website: profile.website,
                year_established: profile.year_established,
                sam_active: profile.sam_active,
                sba_certifications: profile.certifications,
            }
        })
        .collect()
}
