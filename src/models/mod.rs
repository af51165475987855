//! Core data models for county lookups and contractor search.

pub mod contractor;
pub mod county;

pub use contractor::{ContractorResult, EnrichedContractor, SetAsideType};
pub use county::{CountyInfo, CountyRef, NeighborCounty, RadiusResult};
