//! Lazily loaded county locator shared across requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info};

use super::index::CountyIndex;
use super::reference::{read_sources, ReferencePaths};
use crate::address::extract_zip_from_address;
use crate::error::{Error, Result};
use crate::models::RadiusResult;

/// Default search radius when the caller doesn't pick one
pub const DEFAULT_RADIUS_MILES: f64 = 100.0;

/// Radius query service over a county index that is read from disk on
/// first use.
///
/// Concurrent first calls share a single load; once loaded the index is
/// never modified. Callers waiting on a load that fails all receive its
/// error. A failed load is not cached, so a call arriving afterwards reads
/// the files again.
pub struct CountyLocator {
    paths: ReferencePaths,
    index: OnceCell<CountyIndex>,
    /// Held for the duration of a load; keeps the last failure for waiters
    last_failure: Mutex<Option<Error>>,
    load_attempts: AtomicUsize,
    failed_loads: AtomicUsize,
}

impl CountyLocator {
    /// Create an unloaded locator reading from the given reference files
    pub fn new(paths: ReferencePaths) -> Self {
        Self {
            paths,
            index: OnceCell::new(),
            last_failure: Mutex::new(None),
            load_attempts: AtomicUsize::new(0),
            failed_loads: AtomicUsize::new(0),
        }
    }

    /// Create a locator around an already built index
    pub fn from_index(index: CountyIndex) -> Self {
        Self {
            paths: ReferencePaths::default(),
            index: OnceCell::new_with(Some(index)),
            last_failure: Mutex::new(None),
            load_attempts: AtomicUsize::new(0),
            failed_loads: AtomicUsize::new(0),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.index.initialized()
    }

    /// Number of times the reference files were actually read
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    /// Load the reference tables if needed and return the index
    pub async fn ensure_loaded(&self) -> Result<&CountyIndex> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }

        let failures_seen = self.failed_loads.load(Ordering::SeqCst);
        let mut last_failure = self.last_failure.lock().await;

        if let Some(index) = self.index.get() {
            return Ok(index);
        }
        // A load finished and failed while this call was waiting on it
        if self.failed_loads.load(Ordering::SeqCst) != failures_seen {
            if let Some(err) = last_failure.as_ref() {
                return Err(err.clone());
            }
        }

        match self.load_index().await {
            Ok(index) => {
                *last_failure = None;
                Ok(self.index.get_or_init(|| async move { index }).await)
            }
            Err(e) => {
                error!("County reference data failed to load: {}", e);
                *last_failure = Some(e.clone());
                self.failed_loads.fetch_add(1, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    async fn load_index(&self) -> Result<CountyIndex> {
        let attempt = self.load_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Loading county reference data (attempt {})", attempt);

        let sources = read_sources(&self.paths).await?;

        tokio::task::spawn_blocking(move || {
            CountyIndex::from_sources(&sources.zip_county, &sources.zip_coords, &sources.adjacency)
        })
        .await
        .map_err(|e| Error::Internal(format!("County index build panicked: {}", e)))
    }

    /// Rank every county whose centroid is within `radius_miles` of the
    /// county containing `zip`
    pub async fn find_counties_within_radius(
        &self,
        zip: &str,
        radius_miles: f64,
    ) -> Result<RadiusResult> {
        let index = self.ensure_loaded().await?;
        let result = index.find_counties_within_radius(zip, radius_miles)?;

        debug!(
            "ZIP {} -> county {}: {} counties within {} miles",
            zip, result.center_county.fips, result.total_found, radius_miles
        );

        Ok(result)
    }

    /// Extract a ZIP from free text and run a radius query around it
    pub async fn find_counties_near_address(
        &self,
        address: &str,
        radius_miles: f64,
    ) -> Result<RadiusResult> {
        let zip = extract_zip_from_address(address)
            .ok_or_else(|| Error::InvalidInput("No ZIP code found in address".to_string()))?;
        self.find_counties_within_radius(zip, radius_miles).await
    }
}
