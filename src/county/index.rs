//! In-memory county index built from the reference tables.

use geo::{Centroid, MultiPoint, Point};
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use tracing::info;

use super::distance::distance_between;
use super::reference::{pad_zip, parse_county_names, parse_zip_coords, parse_zip_counties};
use crate::error::{Error, Result};
use crate::models::{CountyInfo, CountyRef, NeighborCounty, RadiusResult};

/// Mean position of the ZIP points belonging to a county
#[derive(Debug, Clone, PartialEq)]
struct CountyCentroid {
    fips: String,
    point: Point,
}

/// Row counts for logging and health output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct IndexStats {
    pub zips: usize,
    pub zips_with_coords: usize,
    pub named_counties: usize,
    pub counties_with_centroids: usize,
}

/// Immutable lookup tables for ZIP and county geography.
///
/// Centroids are kept in the order their county first appears in the ZIP
/// mapping; radius results with equal distances keep this order.
pub struct CountyIndex {
    zip_to_fips: HashMap<String, String>,
    county_names: HashMap<String, CountyInfo>,
    centroids: Vec<CountyCentroid>,
    centroid_by_fips: HashMap<String, usize>,
    zips_with_coords: usize,
}

impl CountyIndex {
    /// Build the index from parsed reference rows.
    ///
    /// Only ZIPs present in both the county mapping and the coordinate
    /// table contribute to a centroid.
    pub fn build(
        zip_counties: Vec<(String, String)>,
        zip_coords: Vec<(String, Point)>,
        county_names: Vec<(String, CountyInfo)>,
    ) -> Self {
        // First mapping for a ZIP wins; later rows are ignored
        let mut zip_to_fips = HashMap::with_capacity(zip_counties.len());
        let mut zip_order = Vec::with_capacity(zip_counties.len());
        for (zip, fips) in zip_counties {
            if let Entry::Vacant(e) = zip_to_fips.entry(zip) {
                zip_order.push(e.key().clone());
                e.insert(fips);
            }
        }

        let zip_coords: HashMap<String, Point> = zip_coords.into_iter().collect();
        let county_names: HashMap<String, CountyInfo> = county_names.into_iter().collect();

        let mut members: Vec<(String, Vec<Point>)> = Vec::new();
        let mut slot_by_fips: HashMap<String, usize> = HashMap::new();
        let mut zips_with_coords = 0;

        for zip in &zip_order {
            let Some(&point) = zip_coords.get(zip) else {
                continue;
            };
            zips_with_coords += 1;

            let fips = &zip_to_fips[zip];
            let slot = match slot_by_fips.get(fips) {
                Some(&i) => i,
                None => {
                    members.push((fips.clone(), Vec::new()));
                    slot_by_fips.insert(fips.clone(), members.len() - 1);
                    members.len() - 1
                }
            };
            members[slot].1.push(point);
        }

        // The centroid of a point set is the arithmetic mean of its coordinates
        let centroids: Vec<CountyCentroid> = members
            .into_iter()
            .filter_map(|(fips, points)| {
                let point = MultiPoint::new(points).centroid()?;
                Some(CountyCentroid { fips, point })
            })
            .collect();

        let centroid_by_fips = centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (c.fips.clone(), i))
            .collect();

        let index = Self {
            zip_to_fips,
            county_names,
            centroids,
            centroid_by_fips,
            zips_with_coords,
        };

        let stats = index.stats();
        info!(
            "County index built: {} ZIPs, {} with coordinates, {} named counties, {} county centroids",
            stats.zips, stats.zips_with_coords, stats.named_counties, stats.counties_with_centroids
        );

        index
    }

    /// Parse the raw text of the three reference files and build the index
    pub fn from_sources(zip_county: &str, zip_coords: &str, adjacency: &str) -> Self {
        Self::build(
            parse_zip_counties(zip_county),
            parse_zip_coords(zip_coords),
            parse_county_names(adjacency),
        )
    }

    /// County FIPS for a ZIP code
    pub fn county_for_zip(&self, zip: &str) -> Option<&str> {
        self.zip_to_fips.get(zip).map(String::as_str)
    }

    /// Name and state as listed in the adjacency file, if any
    pub fn named_county(&self, fips: &str) -> Option<&CountyInfo> {
        self.county_names.get(fips)
    }

    /// Name and state for a county, falling back to `County <FIPS>`
    pub fn county_info(&self, fips: &str) -> CountyInfo {
        self.named_county(fips)
            .cloned()
            .unwrap_or_else(|| CountyInfo::fallback(fips))
    }

    /// Centroid of a county, absent when none of its ZIPs have coordinates
    pub fn centroid(&self, fips: &str) -> Option<Point> {
        self.centroid_by_fips
            .get(fips)
            .map(|&i| self.centroids[i].point)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            zips: self.zip_to_fips.len(),
            zips_with_coords: self.zips_with_coords,
            named_counties: self.county_names.len(),
            counties_with_centroids: self.centroids.len(),
        }
    }

    /// Counties whose centroid lies within `radius_miles` of `center`,
    /// sorted ascending by rounded distance (stable over index order)
    pub fn counties_within(&self, center: Point, radius_miles: f64) -> Vec<NeighborCounty> {
        let mut nearby: Vec<NeighborCounty> = self
            .centroids
            .iter()
            .filter_map(|c| {
                let distance = distance_between(center, c.point);
                (distance <= radius_miles).then(|| {
                    let info = self.county_info(&c.fips);
                    NeighborCounty {
                        fips: c.fips.clone(),
                        name: info.name,
                        state: info.state,
                        distance: distance.round() as u32,
                    }
                })
            })
            .collect();

        nearby.sort_by_key(|c| c.distance);
        nearby
    }

    /// Resolve a ZIP to its county and rank every county within the radius.
    ///
    /// Fails with `NotFound` when the ZIP is unknown or its county has no
    /// centroid, and with `InvalidInput` for a negative or non-finite radius.
    pub fn find_counties_within_radius(&self, zip: &str, radius_miles: f64) -> Result<RadiusResult> {
        if !radius_miles.is_finite() || radius_miles < 0.0 {
            return Err(Error::InvalidInput(format!(
                "Radius must be a non-negative number of miles, got {}",
                radius_miles
            )));
        }

        let zip = pad_zip(zip.trim());
        let center_fips = self
            .county_for_zip(&zip)
            .ok_or_else(|| Error::NotFound(format!("ZIP {} not found in database", zip)))?;

        let center = self.centroid(center_fips).ok_or_else(|| {
            Error::NotFound(format!("No coordinates for county FIPS {}", center_fips))
        })?;

        let nearby_counties = self.counties_within(center, radius_miles);

        Ok(RadiusResult {
            center_county: CountyRef::new(center_fips, self.county_info(center_fips)),
            total_found: nearby_counties.len(),
            nearby_counties,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;

    pub(crate) const ZIP_COUNTY: &str = "\
ZIP,COUNTY,USPS_ZIP_PREF_CITY,USPS_ZIP_PREF_STATE
62701,17167,SPRINGFIELD,IL
62704,17167,SPRINGFIELD,IL
62675,17129,PETERSBURG,IL
62656,17107,LINCOLN,IL
60601,17031,CHICAGO,IL
62704,17031,SPRINGFIELD,IL
501,36103,HOLTSVILLE,NY
99950,02130,KETCHIKAN,AK
";

    pub(crate) const ZIP_COORDS: &str = "\
ZCTA5CE20,GEOID20,CLASSFP20,MTFCC20,FUNCSTAT20,ALAND20,AWATER20,INTPTLAT20,INTPTLON20
62701,62701,B5,G6350,S,1,0,+39.8000,-089.6500
62704,62704,B5,G6350,S,1,0,+39.7700,-089.6800
62675,62675,B5,G6350,S,1,0,+40.0100,-089.8500
62656,62656,B5,G6350,S,1,0,+40.1500,-089.3700
60601,60601,B5,G6350,S,1,0,+41.8860,-087.6180
00501,00501,B5,G6350,S,1,0,+40.8133,-073.0476
99999,99999,B5,G6350,S,1,0,+39.9000,-089.5000
";

    pub(crate) const ADJACENCY: &str = "\
\"Sangamon County, IL\"\t17167\t\"Sangamon County, IL\"\t17167
\t\t\"Menard County, IL\"\t17129
\"Menard County, IL\"\t17129\t\"Menard County, IL\"\t17129
\"Logan County, IL\"\t17107\t\"Logan County, IL\"\t17107
\"Cook County, IL\"\t17031\t\"Cook County, IL\"\t17031
";

    pub(crate) fn sample_index() -> CountyIndex {
        CountyIndex::from_sources(ZIP_COUNTY, ZIP_COORDS, ADJACENCY)
    }

    #[test]
    fn test_first_zip_mapping_wins() {
        let index = sample_index();
        assert_eq!(index.county_for_zip("62704"), Some("17167"));
    }

    #[test]
    fn test_leading_zero_zip_preserved() {
        let index = sample_index();
        assert_eq!(index.county_for_zip("00501"), Some("36103"));
        assert_eq!(index.county_for_zip("501"), None);
    }

    #[test]
    fn test_centroid_is_mean_of_member_zips() {
        let index = sample_index();
        let c = index.centroid("17167").unwrap();
        assert!((c.y() - 39.785).abs() < 1e-9);
        assert!((c.x() + 89.665).abs() < 1e-9);
    }

    #[test]
    fn test_county_without_coordinates_has_no_centroid() {
        let index = sample_index();
        assert!(index.centroid("02130").is_none());
        assert_eq!(index.stats().counties_with_centroids, 5);
    }

    #[test]
    fn test_coordinates_without_county_mapping_ignored() {
        // 99999 has coordinates near Springfield but no county row
        let with_orphan = sample_index();
        let coords: String = ZIP_COORDS
            .lines()
            .filter(|line| !line.starts_with("99999"))
            .map(|line| format!("{}\n", line))
            .collect();
        let without_orphan = CountyIndex::from_sources(ZIP_COUNTY, &coords, ADJACENCY);

        assert_eq!(with_orphan.county_for_zip("99999"), None);
        assert_eq!(
            with_orphan.stats(),
            IndexStats {
                zips: 7,
                zips_with_coords: 6,
                named_counties: 4,
                counties_with_centroids: 5,
            }
        );
        assert_eq!(with_orphan.stats(), without_orphan.stats());

        for fips in ["17167", "17129", "17107", "17031", "36103"] {
            assert_eq!(with_orphan.centroid(fips), without_orphan.centroid(fips));
        }
        assert_eq!(
            with_orphan.find_counties_within_radius("62701", 1000.0).unwrap(),
            without_orphan.find_counties_within_radius("62701", 1000.0).unwrap()
        );
    }

    #[test]
    fn test_fallback_county_name() {
        let index = sample_index();
        assert_eq!(index.county_info("36103"), CountyInfo::new("County 36103", ""));
        assert_eq!(
            index.county_info("17129"),
            CountyInfo::new("Menard County", "IL")
        );
    }

    #[test]
    fn test_center_county_included_at_zero() {
        let index = sample_index();
        let result = index.find_counties_within_radius("62704", 100.0).unwrap();
        assert_eq!(result.center_county.fips, "17167");
        assert_eq!(result.center_county.name, "Sangamon County");
        assert_eq!(result.nearby_counties[0].fips, "17167");
        assert_eq!(result.nearby_counties[0].distance, 0);
        assert_eq!(result.total_found, result.nearby_counties.len());
    }

    #[test]
    fn test_every_locatable_zip_includes_own_county() {
        let index = sample_index();
        let mut checked = 0;
        for (zip, _) in parse_zip_counties(ZIP_COUNTY) {
            let Some(fips) = index.county_for_zip(&zip) else {
                continue;
            };
            if index.centroid(fips).is_none() {
                continue;
            }

            let result = index.find_counties_within_radius(&zip, 100.0).unwrap();
            assert_eq!(result.center_county.fips, fips, "ZIP {}", zip);
            let own = result
                .nearby_counties
                .iter()
                .find(|c| c.fips == fips)
                .unwrap_or_else(|| panic!("ZIP {} missing its own county", zip));
            assert_eq!(own.distance, 0, "ZIP {}", zip);
            assert_eq!(result.nearby_counties[0].distance, 0);
            checked += 1;
        }
        // 62704 is listed twice; 99950 has no centroid
        assert_eq!(checked, 7);
    }

    #[test]
    fn test_results_sorted_ascending() {
        let index = sample_index();
        let result = index.find_counties_within_radius("62701", 1000.0).unwrap();
        assert_eq!(result.total_found, 5);
        for pair in result.nearby_counties.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_radius_monotonic() {
        let index = sample_index();
        let mut previous: Vec<String> = Vec::new();
        for radius in [0.0, 10.0, 30.0, 200.0, 1000.0] {
            let fips = index
                .find_counties_within_radius("62704", radius)
                .unwrap()
                .fips_codes();
            assert!(previous.iter().all(|f| fips.contains(f)));
            previous = fips;
        }
    }

    #[test]
    fn test_zero_radius_returns_only_center() {
        let index = sample_index();
        let result = index.find_counties_within_radius("62704", 0.0).unwrap();
        assert_eq!(result.total_found, 1);
        assert_eq!(result.nearby_counties[0].fips, "17167");
    }

    #[test]
    fn test_unknown_zip_not_found() {
        let index = sample_index();
        let err = index.find_counties_within_radius("00000", 100.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "ZIP 00000 not found in database");
    }

    #[test]
    fn test_center_without_centroid_not_found() {
        let index = sample_index();
        let err = index.find_counties_within_radius("99950", 100.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_negative_radius_rejected() {
        let index = sample_index();
        let err = index.find_counties_within_radius("62704", -1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        let err = index
            .find_counties_within_radius("62704", f64::NAN)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_equal_distances_keep_index_order() {
        // Two counties placed symmetrically around the center
        let index = CountyIndex::build(
            vec![
                ("10001".into(), "00001".into()),
                ("10002".into(), "00003".into()),
                ("10003".into(), "00002".into()),
            ],
            vec![
                ("10001".into(), Point::new(-90.0, 40.0)),
                ("10002".into(), Point::new(-89.5, 40.0)),
                ("10003".into(), Point::new(-90.5, 40.0)),
            ],
            vec![],
        );
        let result = index.find_counties_within_radius("10001", 100.0).unwrap();
        let fips = result.fips_codes();
        assert_eq!(fips, vec!["00001", "00003", "00002"]);
        assert_eq!(
            result.nearby_counties[1].distance,
            result.nearby_counties[2].distance
        );
    }
}
