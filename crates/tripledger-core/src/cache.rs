//! Extraction cache: persisted fingerprint -> receipt mapping
//!
//! One JSON file backs an in-memory index. Entries have no TTL; an entry
//! exists until removed or cleared, and `--force` bypasses lookup without
//! touching stored entries. IO problems degrade to cache-miss behavior so
//! the pipeline stays available.

use crate::error::Result;
use crate::models::CacheEntry;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub path: PathBuf,
}

/// Persisted extraction cache with an in-memory index
#[derive(Debug)]
pub struct ExtractionCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl ExtractionCache {
    /// Open the cache at `path`, loading any existing entries. A missing
    /// file is an empty cache; an unreadable or corrupt file is logged
    /// and also treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("extraction cache at {} is corrupt, starting empty: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("cannot read extraction cache at {}, starting empty: {}", path.display(), e);
                HashMap::new()
            }
        };
        Self { path, entries }
    }

    /// Pure read; no side effects
    pub fn lookup(&self, fingerprint: &str) -> Option<&CacheEntry> {
        self.entries.get(fingerprint)
    }

    /// Idempotent overwrite; last write wins. Persists immediately so an
    /// interrupted batch keeps entries for every completed image.
    pub fn store(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.fingerprint.clone(), entry);
        self.persist();
    }

    /// Remove a single entry, returning whether it existed
    pub fn remove(&mut self, fingerprint: &str) -> bool {
        let removed = self.entries.remove(fingerprint).is_some();
        if removed {
            self.persist();
        }
        removed
    }

    /// Remove all entries, returning how many were dropped
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.persist();
        count
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

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            path: self.path.clone(),
        }
    }

    /// Write the full index to disk
    pub fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    fn persist(&self) {
        if let Err(e) = self.flush() {
            warn!("cannot persist extraction cache at {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Currency, Item, Language, Receipt};
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn sample_entry(fingerprint: &str) -> CacheEntry {
        let receipt_id: String = fingerprint.chars().take(16).collect();
        let receipt = Receipt {
            receipt_id: receipt_id.clone(),
            timestamp: NaiveDate::from_ymd_opt(2024, 11, 2)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
            store_name: "セブンイレブン".to_string(),
            store_name_translated: Some("7-Eleven".to_string()),
            store_address: None,
            items: vec![Item {
                item_id: format!("{}_item_000", receipt_id),
                receipt_id,
                name: "コーヒー".to_string(),
                name_translated: Some("Coffee".to_string()),
                quantity: 1,
                unit_price: Some(Decimal::new(150, 0)),
                total_price: Some(Decimal::new(150, 0)),
                category: Category::Beverage,
                subcategory: Some("coffee".to_string()),
            }],
            subtotal: Some(Decimal::new(150, 0)),
            tax: None,
            total: Decimal::new(150, 0),
            currency: Currency::JPY,
            original_language: Language::Ja,
            source_image: "photos/IMG_0001.jpg".to_string(),
        };
        CacheEntry {
            fingerprint: fingerprint.to_string(),
            source_image: receipt.source_image.clone(),
            processed_at: Utc::now(),
            receipt,
        }
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ExtractionCache::open(dir.path().join("processed.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_store_then_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ExtractionCache::open(dir.path().join("processed.json"));
        cache.store(sample_entry("aabbccdd00112233aabbccdd00112233"));
        let hit = cache.lookup("aabbccdd00112233aabbccdd00112233").unwrap();
        assert_eq!(hit.receipt.store_name, "セブンイレブン");
        assert!(cache.lookup("ffffffffffffffff").is_none());
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("processed.json");
        {
            let mut cache = ExtractionCache::open(&path);
            cache.store(sample_entry("1111111111111111aaaa"));
        }
        let cache = ExtractionCache::open(&path);
        assert_eq!(cache.len(), 1);
        assert!(cache.lookup("1111111111111111aaaa").is_some());
    }

    #[test]
    fn test_store_overwrites_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ExtractionCache::open(dir.path().join("processed.json"));
        cache.store(sample_entry("deadbeefdeadbeefdeadbeef"));
        let mut updated = sample_entry("deadbeefdeadbeefdeadbeef");
        updated.receipt.store_name = "ファミリーマート".to_string();
        cache.store(updated);
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.lookup("deadbeefdeadbeefdeadbeef").unwrap().receipt.store_name,
            "ファミリーマート"
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ExtractionCache::open(dir.path().join("processed.json"));
        cache.store(sample_entry("aaaa0000aaaa0000aaaa"));
        cache.store(sample_entry("bbbb1111bbbb1111bbbb"));
        assert!(cache.remove("aaaa0000aaaa0000aaaa"));
        assert!(!cache.remove("aaaa0000aaaa0000aaaa"));
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed.json");
        std::fs::write(&path, "{not json at all").unwrap();
        let cache = ExtractionCache::open(&path);
        assert!(cache.is_empty());
    }
}
