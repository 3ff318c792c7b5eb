//! Geocoding of store addresses via the Google Maps Geocoding API
//!
//! Results are cached in a JSON file keyed by the lowercased query, so
//! repeat runs over the same stores never touch the network. Only
//! successful lookups are cached.

use crate::config::Config;
use crate::error::{Result, TripLedgerError};
use crate::models::GeoLocation;
use crate::store::ReceiptStore;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

const GEOCODING_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// File-backed cache of geocoding results
#[derive(Debug)]
pub struct GeocodeCache {
    path: PathBuf,
    entries: HashMap<String, GeoLocation>,
}

impl GeocodeCache {
    /// Open the cache file. A missing file is an empty cache; an
    /// unreadable or corrupt one degrades to empty with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "geocode cache unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "geocode cache unreadable, starting empty");
                HashMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn get(&self, query: &str) -> Option<&GeoLocation> {
        self.entries.get(&query.to_lowercase())
    }

    /// Record a result and persist immediately
    pub fn put(&mut self, query: &str, location: GeoLocation) {
        self.entries.insert(query.to_lowercase(), location);
        if let Err(e) = self.persist() {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist geocode cache");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Google Maps geocoding client with region bias
pub struct Geocoder {
    api_key: String,
    region: String,
    client: reqwest::Client,
    cache: GeocodeCache,
}

impl Geocoder {
    pub fn new(
        api_key: String,
        region: &str,
        cache: GeocodeCache,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            region: normalize_region(region),
            client,
            cache,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .google_maps_api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                TripLedgerError::Config("GOOGLE_MAPS_API_KEY is not set".to_string())
            })?;
        Self::new(
            api_key,
            &config.region,
            GeocodeCache::open(config.geocode_cache_path()),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Resolve an address or place name to coordinates. `Ok(None)` means
    /// the API answered but found nothing.
    pub async fn geocode(&mut self, query: &str) -> Result<Option<GeoLocation>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }
        if let Some(hit) = self.cache.get(query) {
            tracing::debug!(%query, "geocode cache hit");
            return Ok(Some(hit.clone()));
        }

        let location = self.call_api(query).await?;
        if let Some(location) = &location {
            self.cache.put(query, location.clone());
        }
        Ok(location)
    }

    /// Geocode every receipt that has no location row yet, using the
    /// store address when present and the store name otherwise. Lookup
    /// failures are logged and skipped. Returns the number of receipts
    /// that gained a location.
    pub async fn geocode_receipts(&mut self, store: &ReceiptStore) -> Result<usize> {
        let located: HashSet<String> = store
            .read_locations()?
            .into_iter()
            .map(|(receipt_id, _)| receipt_id)
            .collect();

        let mut updated = 0;
        for receipt in store.read_receipts()? {
            if located.contains(&receipt.receipt_id) {
                continue;
            }
            let query = receipt
                .store_address
                .clone()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| receipt.store_name.clone());

            match self.geocode(&query).await {
                Ok(Some(location)) => {
                    store.upsert_location(&receipt.receipt_id, &location)?;
                    updated += 1;
                }
                Ok(None) => {
                    tracing::debug!(receipt = %receipt.receipt_id, %query, "no geocoding result");
                }
                Err(e) => {
                    tracing::warn!(receipt = %receipt.receipt_id, %query, error = %e, "geocoding failed");
                }
            }
        }
        Ok(updated)
    }

    async fn call_api(&self, query: &str) -> Result<Option<GeoLocation>> {
        #[derive(Deserialize)]
        struct GeocodeResponse {
            status: String,
            #[serde(default)]
            results: Vec<GeocodeResult>,
        }

        #[derive(Deserialize)]
        struct GeocodeResult {
            geometry: Geometry,
            #[serde(default)]
            formatted_address: Option<String>,
            #[serde(default)]
            place_id: Option<String>,
        }

        #[derive(Deserialize)]
        struct Geometry {
            location: LatLng,
        }

        #[derive(Deserialize)]
        struct LatLng {
            lat: f64,
            lng: f64,
        }

        let response = self
            .client
            .get(GEOCODING_URL)
            .query(&[
                ("address", query),
                ("key", self.api_key.as_str()),
                ("region", self.region.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TripLedgerError::Provider(format!(
                "geocoding API error {}: {}",
                status, body
            )));
        }

        let body: GeocodeResponse = response.json().await?;
        match body.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Ok(None),
            other => {
                return Err(TripLedgerError::Provider(format!(
                    "geocoding API status {}",
                    other
                )))
            }
        }

        Ok(body.results.into_iter().next().map(|result| GeoLocation {
            latitude: result.geometry.location.lat,
            longitude: result.geometry.location.lng,
            formatted_address: result.formatted_address,
            place_id: result.place_id,
        }))
    }
}

/// Map common region names to the ccTLD codes the API expects
fn normalize_region(region: &str) -> String {
    let lower = region.to_lowercase();
    match lower.as_str() {
        "japan" => "jp".to_string(),
        "taiwan" => "tw".to_string(),
        "korea" => "kr".to_string(),
        "usa" => "us".to_string(),
        _ => lower,
    }
}
