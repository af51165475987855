use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::county::{
    ReferencePaths, DEFAULT_ADJACENCY_FILE, DEFAULT_DATA_DIR, DEFAULT_RADIUS_MILES,
    DEFAULT_ZIP_COORDS_FILE, DEFAULT_ZIP_COUNTY_FILE,
};

pub const USASPENDING_API_URL: &str =
    "https://api.usaspending.gov/api/v2/search/spending_by_award/";
pub const SBA_API_URL: &str = "https://search.certifications.sba.gov/_api/v2/search";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub reference: ReferenceConfig,
    pub search: SearchConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReferenceConfig {
    pub data_dir: PathBuf,
    pub zip_county_file: String,
    pub zip_coords_file: String,
    pub adjacency_file: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub radius_miles: f64,
    pub max_contractors: usize,
    pub years_lookback: u32,
    pub page_size: u32,
    pub max_pages: u32,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub usaspending_url: String,
    pub sba_url: String,
    pub timeout_secs: u64,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            zip_county_file: DEFAULT_ZIP_COUNTY_FILE.to_string(),
            zip_coords_file: DEFAULT_ZIP_COORDS_FILE.to_string(),
            adjacency_file: DEFAULT_ADJACENCY_FILE.to_string(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            radius_miles: DEFAULT_RADIUS_MILES,
            max_contractors: 10,
            years_lookback: 5,
            page_size: 100,
            max_pages: 10,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            usaspending_url: USASPENDING_API_URL.to_string(),
            sba_url: SBA_API_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl ReferenceConfig {
    pub fn paths(&self) -> ReferencePaths {
        ReferencePaths {
            zip_county: self.data_dir.join(&self.zip_county_file),
            zip_coords: self.data_dir.join(&self.zip_coords_file),
            adjacency: self.data_dir.join(&self.adjacency_file),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides, then validate the combined config
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        radius_miles: Option<f64>,
    ) -> Result<Self> {
        if let Some(dir) = data_dir {
            self.reference.data_dir = dir;
        }
        if let Some(radius) = radius_miles {
            self.search.radius_miles = radius;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        Url::parse(&self.api.usaspending_url).context("Invalid api.usaspending_url")?;
        Url::parse(&self.api.sba_url).context("Invalid api.sba_url")?;

        if !self.search.radius_miles.is_finite() || self.search.radius_miles < 0.0 {
            anyhow::bail!(
                "search.radius_miles must be a non-negative number, got {}",
                self.search.radius_miles
            );
        }
        if self.search.page_size == 0 || self.search.max_pages == 0 {
            anyhow::bail!("search.page_size and search.max_pages must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.search.radius_miles, 100.0);
        assert_eq!(config.search.max_contractors, 10);
        assert_eq!(config.api.usaspending_url, USASPENDING_API_URL);
        assert_eq!(
            config.reference.paths().adjacency,
            PathBuf::from("public/county_db/county_adjacency.txt")
        );
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
            [reference]
            data_dir = "/srv/county_db"
            zip_coords_file = "zcta.csv.gz"

            [search]
            radius_miles = 50.0
            "#,
        )
        .unwrap();

        let paths = config.reference.paths();
        assert_eq!(paths.zip_coords, PathBuf::from("/srv/county_db/zcta.csv.gz"));
        assert_eq!(
            paths.zip_county,
            PathBuf::from("/srv/county_db/ZIP_COUNTY_062025.csv")
        );
        assert_eq!(config.search.radius_miles, 50.0);
        assert_eq!(config.search.page_size, 100);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = Config::from_toml(
            r#"
            [api]
            sba_url = "not a url"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("sba_url"));
    }

    #[test]
    fn test_negative_radius_rejected() {
        assert!(Config::from_toml("[search]\nradius_miles = -5.0\n").is_err());
    }

    #[test]
    fn test_overrides_are_validated() {
        let err = Config::default()
            .with_overrides(None, Some(-10.0))
            .unwrap_err();
        assert!(err.to_string().contains("radius_miles"));
        assert!(Config::default()
            .with_overrides(None, Some(f64::NAN))
            .is_err());

        let config = Config::default()
            .with_overrides(Some(PathBuf::from("/srv/county_db")), Some(25.0))
            .unwrap();
        assert_eq!(config.search.radius_miles, 25.0);
        assert_eq!(
            config.reference.paths().adjacency,
            PathBuf::from("/srv/county_db/county_adjacency.txt")
        );
    }
}
