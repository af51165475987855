//! Reference file reading and row parsing.
//!
//! Three flat files feed the county index:
//! - ZIP to county FIPS mapping (CSV with header)
//! - ZCTA internal points (CSV with header, lat/lon in columns 7 and 8)
//! - Census county adjacency (tab separated, quoted `"Name, ST"` tokens)

use csv::{ReaderBuilder, Trim};
use flate2::read::GzDecoder;
use geo::Point;
use regex::Regex;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::CountyInfo;

pub const DEFAULT_DATA_DIR: &str = "public/county_db";
pub const DEFAULT_ZIP_COUNTY_FILE: &str = "ZIP_COUNTY_062025.csv";
pub const DEFAULT_ZIP_COORDS_FILE: &str = "tl_2020_us_zcta520.csv";
pub const DEFAULT_ADJACENCY_FILE: &str = "county_adjacency.txt";

const LAT_COLUMN: usize = 7;
const LON_COLUMN: usize = 8;

static COUNTY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^,]+),\s*([A-Z]{2})""#).expect("valid county name pattern"));

/// Locations of the three reference files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferencePaths {
    pub zip_county: PathBuf,
    pub zip_coords: PathBuf,
    pub adjacency: PathBuf,
}

impl ReferencePaths {
    /// Default file names inside a data directory
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            zip_county: dir.join(DEFAULT_ZIP_COUNTY_FILE),
            zip_coords: dir.join(DEFAULT_ZIP_COORDS_FILE),
            adjacency: dir.join(DEFAULT_ADJACENCY_FILE),
        }
    }
}

impl Default for ReferencePaths {
    fn default() -> Self {
        Self::in_dir(DEFAULT_DATA_DIR)
    }
}

/// Raw text of the three reference files
#[derive(Debug, Clone)]
pub struct ReferenceSources {
    pub zip_county: String,
    pub zip_coords: String,
    pub adjacency: String,
}

/// Read all three files concurrently. Any failure aborts the whole read.
pub async fn read_sources(paths: &ReferencePaths) -> Result<ReferenceSources> {
    info!(
        "Reading reference data: {}, {}, {}",
        paths.zip_county.display(),
        paths.zip_coords.display(),
        paths.adjacency.display()
    );

    let (zip_county, zip_coords, adjacency) = tokio::try_join!(
        read_text(&paths.zip_county),
        read_text(&paths.zip_coords),
        read_text(&paths.adjacency),
    )?;

    Ok(ReferenceSources {
        zip_county,
        zip_coords,
        adjacency,
    })
}

async fn read_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| Error::reference_io(path, e))?;
    decode(path, bytes)
}

/// Decompress `.gz` files; invalid UTF-8 is replaced rather than rejected
fn decode(path: &Path, bytes: Vec<u8>) -> Result<String> {
    if path.extension().map_or(false, |e| e == "gz") {
        let mut raw = Vec::new();
        GzDecoder::new(bytes.as_slice())
            .read_to_end(&mut raw)
            .map_err(|e| Error::reference_io(path, e))?;
        Ok(String::from_utf8_lossy(&raw).into_owned())
    } else {
        Ok(match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

/// Left-pad a code with `0` to the given width. Longer codes are left as-is.
fn pad_code(code: &str, width: usize) -> String {
    format!("{:0>width$}", code, width = width)
}

/// Normalize a ZIP code to 5 characters
pub fn pad_zip(zip: &str) -> String {
    pad_code(zip, 5)
}

/// Normalize a county FIPS code to 5 characters
pub fn pad_fips(fips: &str) -> String {
    pad_code(fips, 5)
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

/// Parse ZIP to county rows in file order. Duplicates are kept here; the
/// index decides which one wins.
pub fn parse_zip_counties(text: &str) -> Vec<(String, String)> {
    let mut rows = Vec::new();

    for result in csv_reader(text).records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping unreadable ZIP/county row: {}", e);
                continue;
            }
        };
        if record.len() < 2 {
            continue;
        }
        rows.push((pad_zip(&record[0]), pad_fips(&record[1])));
    }

    rows
}

/// Parse ZIP internal-point rows in file order, as `(lon, lat)` points
pub fn parse_zip_coords(text: &str) -> Vec<(String, Point)> {
    let mut rows = Vec::new();

    for result in csv_reader(text).records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping unreadable coordinate row: {}", e);
                continue;
            }
        };
        if record.len() <= LON_COLUMN {
            continue;
        }

        let lat = parse_signed(&record[LAT_COLUMN]);
        let lon = parse_signed(&record[LON_COLUMN]);
        match (lat, lon) {
            (Some(lat), Some(lon)) => rows.push((pad_zip(&record[0]), Point::new(lon, lat))),
            _ => debug!("Skipping non-numeric coordinates for ZIP {}", &record[0]),
        }
    }

    rows
}

/// Census publishes coordinates with an explicit `+` sign
fn parse_signed(value: &str) -> Option<f64> {
    let parsed: f64 = value.replace('+', "").trim().parse().ok()?;
    parsed.is_finite().then_some(parsed)
}

/// Parse county name rows from the adjacency file.
///
/// Only self-referential rows (county listed as its own neighbor) carry the
/// canonical name. Rows whose name token doesn't look like `"Name, ST"` are
/// skipped.
pub fn parse_county_names(text: &str) -> Vec<(String, CountyInfo)> {
    let reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();

    for result in reader.into_records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                debug!("Skipping unreadable adjacency row: {}", e);
                continue;
            }
        };
        if record.len() < 4 || record[0] != record[2] {
            continue;
        }

        if let Some(caps) = COUNTY_NAME_RE.captures(&record[0]) {
            rows.push((pad_fips(&record[1]), CountyInfo::new(&caps[1], &caps[2])));
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_zip_preserves_leading_zeros() {
        assert_eq!(pad_zip("501"), "00501");
        assert_eq!(pad_zip("02134"), "02134");
        assert_eq!(pad_zip("123456"), "123456");
    }

    #[test]
    fn test_parse_zip_counties_skips_header_and_blanks() {
        let text = "ZIP,COUNTY,USPS_ZIP_PREF_CITY\n501,36103,HOLTSVILLE\n\n  62704,17167,SPRINGFIELD  \nbad\n";
        let rows = parse_zip_counties(text);
        assert_eq!(
            rows,
            vec![
                ("00501".to_string(), "36103".to_string()),
                ("62704".to_string(), "17167".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_zip_counties_keeps_duplicates_in_order() {
        let text = "ZIP,COUNTY\n62704,17167\n62704,17129\n";
        let rows = parse_zip_counties(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].1, "17167");
        assert_eq!(rows[1].1, "17129");
    }

    #[test]
    fn test_parse_zip_coords() {
        let text = "\
ZCTA5CE20,GEOID20,CLASSFP20,MTFCC20,FUNCSTAT20,ALAND20,AWATER20,INTPTLAT20,INTPTLON20
62704,62704,B5,G6350,S,1,0,+39.7726,-089.6829
00501,00501,B5,G6350,S,1,0,+40.8133,-073.0476
99999,99999,B5,G6350,S,1,0,N/A,-073.0476
12345,12345,B5,G6350
";
        let rows = parse_zip_coords(text);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, "62704");
        assert!((rows[0].1.y() - 39.7726).abs() < 1e-9);
        assert!((rows[0].1.x() + 89.6829).abs() < 1e-9);
        assert_eq!(rows[1].0, "00501");
    }

    #[test]
    fn test_parse_county_names_self_rows_only() {
        let text = "\
\"Sangamon County, IL\"\t17167\t\"Sangamon County, IL\"\t17167
\t\t\"Menard County, IL\"\t17129
\"Menard County, IL\"\t17129\t\"Logan County, IL\"\t17107
\"Menard County, IL\"\t17129\t\"Menard County, IL\"\t17129
\"Unnamed\"\t99999\t\"Unnamed\"\t99999
";
        let rows = parse_county_names(text);
        assert_eq!(
            rows,
            vec![
                ("17167".to_string(), CountyInfo::new("Sangamon County", "IL")),
                ("17129".to_string(), CountyInfo::new("Menard County", "IL")),
            ]
        );
    }

    #[test]
    fn test_decode_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"ZIP,COUNTY\n62704,17167\n").unwrap();
        let bytes = encoder.finish().unwrap();

        let text = decode(Path::new("zips.csv.gz"), bytes).unwrap();
        assert_eq!(text, "ZIP,COUNTY\n62704,17167\n");
    }

    #[tokio::test]
    async fn test_read_sources_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_sources(&ReferencePaths::in_dir(dir.path()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::UpstreamFailure);
        assert!(matches!(err, Error::ReferenceIo { .. }));
    }
}
