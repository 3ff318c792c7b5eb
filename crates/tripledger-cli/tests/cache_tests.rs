//! Integration tests for cache management and extract preflight

use assert_cmd::Command;
use chrono::{NaiveDate, Utc};
use predicates::prelude::*;
use rust_decimal::Decimal;
use tempfile::TempDir;
use tripledger_core::{
    CacheEntry, Category, Currency, ExtractionCache, Item, Language, Receipt,
};

const FINGERPRINT: &str = "aabbccdd00112233aabbccdd00112233aabbccdd00112233aabbccdd00112233";

fn tripledger_cmd(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tripledger").unwrap();
    cmd.env("TRIPLEDGER_DATA_DIR", data_dir.path());
    cmd
}

fn seed_cache(data_dir: &TempDir) {
    let receipt_id: String = FINGERPRINT.chars().take(16).collect();
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
            item_id: format!("{receipt_id}_item_000"),
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
        source_image: "IMG_0001.jpg".to_string(),
    };

    let mut cache =
        ExtractionCache::open(data_dir.path().join("cache").join("processed.json"));
    cache.store(CacheEntry {
        fingerprint: FINGERPRINT.to_string(),
        source_image: receipt.source_image.clone(),
        processed_at: Utc::now(),
        receipt,
    });
}

#[test]
fn test_cache_stats_empty() {
    let data_dir = TempDir::new().unwrap();

    tripledger_cmd(&data_dir)
        .arg("cache")
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries:  0"))
        .stdout(predicate::str::contains("Location:"));
}

#[test]
fn test_cache_stats_counts_entries() {
    let data_dir = TempDir::new().unwrap();
    seed_cache(&data_dir);

    tripledger_cmd(&data_dir)
        .arg("cache")
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries:  1"));
}

#[test]
fn test_cache_clear_reports_count() {
    let data_dir = TempDir::new().unwrap();
    seed_cache(&data_dir);

    tripledger_cmd(&data_dir)
        .arg("cache")
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1 cache entries"));

    tripledger_cmd(&data_dir)
        .arg("cache")
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries:  0"));
}

#[test]
fn test_cache_remove_entry() {
    let data_dir = TempDir::new().unwrap();
    seed_cache(&data_dir);

    tripledger_cmd(&data_dir)
        .arg("cache")
        .arg("remove")
        .arg(FINGERPRINT)
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed cache entry"));
}

#[test]
fn test_cache_remove_unknown_fingerprint_is_invalid_input() {
    let data_dir = TempDir::new().unwrap();

    tripledger_cmd(&data_dir)
        .arg("cache")
        .arg("remove")
        .arg("ffffffffffffffff")
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("no cache entry"));
}

#[test]
fn test_extract_without_credentials_is_config_error() {
    let data_dir = TempDir::new().unwrap();
    let config_dir = TempDir::new().unwrap();

    tripledger_cmd(&data_dir)
        .env("XDG_CONFIG_HOME", config_dir.path())
        .env("EXTRACTION_PROVIDER", "gemini")
        .env_remove("GEMINI_API_KEY")
        .arg("extract")
        .arg(data_dir.path().join("IMG_0001.jpg"))
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn test_extract_unsupported_file_fails_without_network() {
    let data_dir = TempDir::new().unwrap();
    let notes = data_dir.path().join("notes.txt");
    std::fs::write(&notes, "not an image").unwrap();

    tripledger_cmd(&data_dir)
        .env("EXTRACTION_PROVIDER", "gemini")
        .env("GEMINI_API_KEY", "test-key")
        .arg("extract")
        .arg(&notes)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("failed"))
        .stdout(predicate::str::contains("unsupported image type"))
        .stderr(predicate::str::contains("1 of 1 images failed"));
}

#[test]
fn test_extract_empty_directory() {
    let data_dir = TempDir::new().unwrap();
    let images = data_dir.path().join("photos");
    std::fs::create_dir(&images).unwrap();

    tripledger_cmd(&data_dir)
        .env("EXTRACTION_PROVIDER", "gemini")
        .env("GEMINI_API_KEY", "test-key")
        .arg("extract")
        .arg(&images)
        .assert()
        .success()
        .stdout(predicate::str::contains("No supported images found"));
}
