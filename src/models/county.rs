//! County identity and radius query result types.

use serde::{Deserialize, Serialize};

/// Display name and state of a county.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyInfo {
    pub name: String,
    pub state: String,
}

impl CountyInfo {
    pub fn new(name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: state.into(),
        }
    }

    /// Placeholder for a county that has no name row in the adjacency file:
    /// `County <FIPS>` with an empty state.
    pub fn fallback(fips: &str) -> Self {
        Self {
            name: format!("County {}", fips),
            state: String::new(),
        }
    }
}

/// A county identified by FIPS code together with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyRef {
    pub fips: String,
    pub name: String,
    pub state: String,
}

impl CountyRef {
    pub fn new(fips: &str, info: CountyInfo) -> Self {
        Self {
            fips: fips.to_string(),
            name: info.name,
            state: info.state,
        }
    }
}

/// A county within the search radius, distance rounded to whole miles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborCounty {
    pub fips: String,
    pub name: String,
    pub state: String,
    pub distance: u32,
}

/// Result of a radius query around a ZIP code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadiusResult {
    pub center_county: CountyRef,
    /// Sorted ascending by distance; the center county is always first-ranked at 0
    pub nearby_counties: Vec<NeighborCounty>,
    pub total_found: usize,
}

impl RadiusResult {
    /// FIPS codes of every county in the result, in ranked order
    pub fn fips_codes(&self) -> Vec<String> {
        self.nearby_counties.iter().map(|c| c.fips.clone()).collect()
    }
}
