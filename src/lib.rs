//! Setaside - find small businesses eligible for federal set-asides near a ZIP code.
//!
//! The county engine maps a ZIP to its county and ranks nearby counties by
//! centroid distance. The award search and SBA certification clients use
//! those counties to find certified contractors.

pub mod address;
pub mod config;
pub mod county;
pub mod error;
pub mod logging;
pub mod models;
pub mod partner;
pub mod sba;
pub mod usaspending;

pub use address::extract_zip_from_address;
pub use county::{CountyIndex, CountyLocator};
pub use error::{Error, ErrorKind, Result};
pub use models::{CountyRef, NeighborCounty, RadiusResult};
