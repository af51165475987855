//! Contractor aggregates exchanged with the award search and certification services.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Federal contracting set-aside category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetAsideType {
    #[serde(rename = "NONE")]
    None,
    #[serde(rename = "8(a)")]
    EightA,
    #[serde(rename = "WOSB")]
    Wosb,
    #[serde(rename = "VOSB")]
    Vosb,
    #[serde(rename = "SDVOSB")]
    Sdvosb,
    #[serde(rename = "HUBZone")]
    HubZone,
    #[serde(rename = "EDWOSB")]
    Edwosb,
    #[serde(rename = "SDB")]
    Sdb,
    #[serde(rename = "SBA")]
    Sba,
}

impl SetAsideType {
    pub fn all() -> &'static [SetAsideType] {
        &[
            SetAsideType::None,
            SetAsideType::EightA,
            SetAsideType::Wosb,
            SetAsideType::Vosb,
            SetAsideType::Sdvosb,
            SetAsideType::HubZone,
            SetAsideType::Edwosb,
            SetAsideType::Sdb,
            SetAsideType::Sba,
        ]
    }

    /// Token used by USAspending filters and SBA certification labels
    pub fn as_str(&self) -> &'static str {
        match self {
            SetAsideType::None => "NONE",
            SetAsideType::EightA => "8(a)",
            SetAsideType::Wosb => "WOSB",
            SetAsideType::Vosb => "VOSB",
            SetAsideType::Sdvosb => "SDVOSB",
            SetAsideType::HubZone => "HUBZone",
            SetAsideType::Edwosb => "EDWOSB",
            SetAsideType::Sdb => "SDB",
            SetAsideType::Sba => "SBA",
        }
    }
}

impl std::fmt::Display for SetAsideType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SetAsideType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SetAsideType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = SetAsideType::all().iter().map(|t| t.as_str()).collect();
                Error::InvalidInput(format!(
                    "Invalid set-aside type: {}. Valid types: {}",
                    s,
                    valid.join(", ")
                ))
            })
    }
}

/// Award totals for a single recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractorResult {
    pub recipient_name: String,
    pub recipient_id: String,
    /// Unique entity id; empty when the award data carried none
    pub recipient_uei: String,
    pub total_awards: f64,
    pub award_count: u32,
}

/// A contractor with SBA contact and certification details attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedContractor {
    #[serde(flatten)]
    pub contractor: ContractorResult,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub year_established: Option<String>,
    pub sam_active: bool,
    pub sba_certifications: Vec<String>,
}

impl EnrichedContractor {
    /// Whether the SBA reports an active certification matching the set-aside
    pub fn is_certified_for(&self, set_aside: SetAsideType) -> bool {
        self.sba_certifications
            .iter()
            .any(|c| c == set_aside.as_str())
    }
}
