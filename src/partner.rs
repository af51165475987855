//! Partner search: counties near an address, contractors who won set-aside
//! awards there, filtered to those holding the matching SBA certification.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::address::extract_zip_from_address;
use crate::county::CountyLocator;
use crate::error::{Error, Result};
use crate::models::{CountyRef, EnrichedContractor, SetAsideType};
use crate::sba::{enrich_contractors, CertificationLookup};
use crate::usaspending::AwardSearch;

const NO_CONTRACTORS_MESSAGE: &str = "No contractors found matching criteria";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerSearchResponse {
    pub center_county: CountyRef,
    pub total_counties_searched: usize,
    pub contractors: Vec<EnrichedContractor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub struct PartnerSearch<A, C> {
    locator: Arc<CountyLocator>,
    awards: A,
    certifications: C,
    radius_miles: f64,
    max_contractors: usize,
}

impl<A, C> PartnerSearch<A, C>
where
    A: AwardSearch,
    C: CertificationLookup,
{
    pub fn new(
        locator: Arc<CountyLocator>,
        awards: A,
        certifications: C,
        radius_miles: f64,
        max_contractors: usize,
    ) -> Self {
        Self {
            locator,
            awards,
            certifications,
            radius_miles,
            max_contractors,
        }
    }

    pub async fn run(
        &self,
        address: &str,
        naics_code: &str,
        set_aside: &str,
    ) -> Result<PartnerSearchResponse> {
        if address.is_empty() || naics_code.is_empty() || set_aside.is_empty() {
            return Err(Error::InvalidInput(
                "Address, NAICS code, and set-aside type are required".to_string(),
            ));
        }

        let zip = extract_zip_from_address(address)
            .ok_or_else(|| Error::InvalidInput("No ZIP code found in address".to_string()))?;
        let set_aside: SetAsideType = set_aside.parse()?;

        let counties = self
            .locator
            .find_counties_within_radius(zip, self.radius_miles)
            .await?;

        let contractors = self
            .awards
            .search_contractors(
                &counties.fips_codes(),
                naics_code,
                set_aside,
                self.max_contractors,
            )
            .await?;

        let Some(contractors) = contractors else {
            info!(
                "No {} awards for NAICS {} within {} counties of {}",
                set_aside, naics_code, counties.total_found, zip
            );
            return Ok(PartnerSearchResponse {
                center_county: counties.center_county,
                total_counties_searched: counties.total_found,
                contractors: Vec::new(),
                message: Some(NO_CONTRACTORS_MESSAGE.to_string()),
            });
        };

        let found = contractors.len();
        let certified: Vec<EnrichedContractor> =
            enrich_contractors(&self.certifications, contractors)
                .await
                .into_iter()
                .filter(|c| c.is_certified_for(set_aside))
                .collect();

        info!(
            "Partner search near {}: {} award recipients, {} with active {} certification",
            zip,
            found,
            certified.len(),
            set_aside
        );

        Ok(PartnerSearchResponse {
            center_county: counties.center_county,
            total_counties_searched: counties.total_found,
            contractors: certified,
            message: None,
        })
    }
}
