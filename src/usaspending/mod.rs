//! USAspending.gov award search.
//!
//! Looks up prime contract awards performed in a set of counties and rolls
//! them up per recipient.

mod client;
mod states;

use std::future::Future;

pub use client::{
    aggregate_awards, fips_to_location, validate_naics, AwardRow, Location, UsaSpendingClient,
};
pub use states::state_abbr;

use crate::error::Result;
use crate::models::{ContractorResult, SetAsideType};

/// Source of contractor award history by county
pub trait AwardSearch {
    /// Top recipients by total award amount, or `None` when nothing matched
    fn search_contractors(
        &self,
        county_fips: &[String],
        naics_code: &str,
        set_aside: SetAsideType,
        limit: usize,
    ) -> impl Future<Output = Result<Option<Vec<ContractorResult>>>> + Send;
}
