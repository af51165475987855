//! ZIP to county geography and radius queries.
//!
//! Reads the ZIP/county, ZIP coordinate and county adjacency reference
//! files once, derives a centroid per county and ranks counties by
//! great-circle distance.

mod distance;
mod index;
mod reference;
mod service;

pub use distance::{distance_between, distance_miles, EARTH_RADIUS_MILES};
pub use index::{CountyIndex, IndexStats};
pub use reference::{
    pad_fips, pad_zip, parse_county_names, parse_zip_coords, parse_zip_counties, read_sources,
    ReferencePaths, ReferenceSources, DEFAULT_ADJACENCY_FILE, DEFAULT_DATA_DIR,
    DEFAULT_ZIP_COORDS_FILE, DEFAULT_ZIP_COUNTY_FILE,
};
pub use service::{CountyLocator, DEFAULT_RADIUS_MILES};
