//! USAspending `spending_by_award` client.

use chrono::{Months, NaiveDate, Utc};
use hashbrown::HashMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::states::state_abbr;
use super::AwardSearch;
use crate::config::{ApiConfig, SearchConfig};
use crate::error::{Error, Result};
use crate::models::{ContractorResult, SetAsideType};

/// Contract award types: BPA call, purchase order, delivery order, definitive contract
const AWARD_TYPE_CODES: &[&str] = &["A", "B", "C", "D"];
const FIELDS: &[&str] = &["Recipient Name", "recipient_id", "Recipient UEI", "Award Amount"];

/// Place-of-performance filter entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub country: &'static str,
    pub state: &'static str,
    pub county: String,
}

#[derive(Debug, Serialize)]
struct TimePeriod {
    start_date: String,
    end_date: String,
}

#[derive(Debug, Serialize)]
struct NaicsFilter<'a> {
    require: [&'a str; 1],
}

#[derive(Debug, Serialize)]
struct Filters<'a> {
    award_type_codes: &'static [&'static str],
    time_period: [TimePeriod; 1],
    place_of_performance_locations: Vec<Location>,
    naics_codes: NaicsFilter<'a>,
    set_aside_type_codes: [&'static str; 1],
}

#[derive(Debug, Serialize)]
struct AwardSearchRequest<'a> {
    filters: &'a Filters<'a>,
    fields: &'static [&'static str],
    limit: u32,
    page: u32,
}

#[derive(Debug, Deserialize)]
struct AwardSearchResponse {
    #[serde(default)]
    results: Vec<AwardRow>,
    page_metadata: Option<PageMetadata>,
}

#[derive(Debug, Deserialize)]
struct PageMetadata {
    #[serde(rename = "hasNext", default)]
    has_next: bool,
}

/// A single award row as returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AwardRow {
    #[serde(rename = "Recipient Name")]
    pub recipient_name: Option<String>,
    pub recipient_id: Option<String>,
    #[serde(rename = "Recipient UEI")]
    pub recipient_uei: Option<String>,
    #[serde(rename = "Award Amount")]
    pub award_amount: Option<f64>,
}

/// NAICS codes are exactly six digits
pub fn validate_naics(naics_code: &str) -> Result<()> {
    if naics_code.len() == 6 && naics_code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Invalid NAICS code: must be 6 digits, got {}",
            naics_code
        )))
    }
}

/// Split a county FIPS into a state/county location. Unknown states yield `None`.
pub fn fips_to_location(fips: &str) -> Option<Location> {
    let state = state_abbr(fips.get(..2)?)?;
    Some(Location {
        country: "USA",
        state,
        county: fips[2..].to_string(),
    })
}

fn time_period(today: NaiveDate, years_lookback: u32) -> TimePeriod {
    let start = today
        .checked_sub_months(Months::new(years_lookback * 12))
        .unwrap_or(NaiveDate::MIN);
    TimePeriod {
        start_date: start.format("%Y-%m-%d").to_string(),
        end_date: today.format("%Y-%m-%d").to_string(),
    }
}

/// Roll award rows up per recipient id and keep the `limit` largest.
///
/// Rows without a recipient id or name are dropped. The first row seen for a
/// recipient decides its name and UEI.
pub fn aggregate_awards(rows: Vec<AwardRow>, limit: usize) -> Option<Vec<ContractorResult>> {
    let mut contractors: Vec<ContractorResult> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let (Some(id), Some(name)) = (row.recipient_id, row.recipient_name) else {
            continue;
        };
        if id.is_empty() || name.is_empty() {
            continue;
        }
        let amount = row.award_amount.unwrap_or(0.0);

        match by_id.get(&id) {
            Some(&i) => {
                let existing = &mut contractors[i];
                existing.total_awards += amount;
                existing.award_count += 1;
            }
            None => {
                by_id.insert(id.clone(), contractors.len());
                contractors.push(ContractorResult {
                    recipient_name: name,
                    recipient_id: id,
                    recipient_uei: row.recipient_uei.unwrap_or_default(),
                    total_awards: amount,
                    award_count: 1,
                });
            }
        }
    }

    contractors.sort_by(|a, b| b.total_awards.total_cmp(&a.total_awards));
    contractors.truncate(limit);

    if contractors.is_empty() {
        None
    } else {
        Some(contractors)
    }
}

/// Paginating client for the USAspending award search endpoint
#[derive(Clone)]
pub struct UsaSpendingClient {
    client: Client,
    url: String,
    years_lookback: u32,
    page_size: u32,
    max_pages: u32,
}

impl UsaSpendingClient {
    pub fn new(api: &ApiConfig, search: &SearchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(api.timeout())
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: api.usaspending_url.clone(),
            years_lookback: search.years_lookback,
            page_size: search.page_size,
            max_pages: search.max_pages,
        })
    }

    /// Fetch every page of award rows, up to `max_pages`
    async fn fetch_awards(&self, filters: &Filters<'_>) -> Result<Vec<AwardRow>> {
        let mut rows = Vec::new();
        let mut page = 1;

        loop {
            let request = AwardSearchRequest {
                filters,
                fields: FIELDS,
                limit: self.page_size,
                page,
            };

            let response = self.client.post(&self.url).json(&request).send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!("USAspending request failed with status {}", status);
                return Err(Error::Upstream(format!(
                    "USAspending API error: {} - {}",
                    status.as_u16(),
                    body
                )));
            }

            let data: AwardSearchResponse = response.json().await?;
            debug!("USAspending page {}: {} awards", page, data.results.len());
            rows.extend(data.results);

            let has_next = data.page_metadata.map_or(false, |m| m.has_next);
            if !has_next || page >= self.max_pages {
                break;
            }
            page += 1;
        }

        Ok(rows)
    }
}

impl AwardSearch for UsaSpendingClient {
    async fn search_contractors(
        &self,
        county_fips: &[String],
        naics_code: &str,
        set_aside: SetAsideType,
        limit: usize,
    ) -> Result<Option<Vec<ContractorResult>>> {
        validate_naics(naics_code)?;

        let locations: Vec<Location> = county_fips
            .iter()
            .filter_map(|f| fips_to_location(f))
            .collect();
        if locations.is_empty() {
            return Err(Error::InvalidInput(
                "No valid county FIPS codes provided".to_string(),
            ));
        }

        info!(
            "Searching awards for NAICS {} ({}) across {} counties",
            naics_code,
            set_aside,
            locations.len()
        );

        let filters = Filters {
            award_type_codes: AWARD_TYPE_CODES,
            time_period: [time_period(Utc::now().date_naive(), self.years_lookback)],
            place_of_performance_locations: locations,
            naics_codes: NaicsFilter {
                require: [naics_code],
            },
            set_aside_type_codes: [set_aside.as_str()],
        };

        let rows = self.fetch_awards(&filters).await?;
        info!("USAspending returned {} award rows", rows.len());

        Ok(aggregate_awards(rows, limit))
    }
}
