//! CSV-backed tabular store
//!
//! Three flat tables under the data directory: receipts, items, and
//! locations, keyed by generated IDs. Column order is part of the
//! on-disk contract and must not change. Tables are small and have a
//! single writer, so every mutation rewrites the whole file.

use crate::error::{Result, TripLedgerError};
use crate::models::{Category, Currency, GeoLocation, Item, Language, Receipt};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Receipts table row. Field order defines the CSV column order.
#[derive(Debug, Serialize, Deserialize)]
struct ReceiptRow {
    receipt_id: String,
    timestamp: NaiveDateTime,
    store_name: String,
    store_name_translated: Option<String>,
    store_address: Option<String>,
    subtotal: Option<Decimal>,
    tax: Option<Decimal>,
    total: Decimal,
    currency: Currency,
    original_language: Language,
    source_image: String,
}

/// Items table row
#[derive(Debug, Serialize, Deserialize)]
struct ItemRow {
    item_id: String,
    receipt_id: String,
    name: String,
    name_translated: Option<String>,
    quantity: u32,
    unit_price: Option<Decimal>,
    total_price: Option<Decimal>,
    category: Category,
    subcategory: Option<String>,
}

/// Locations table row
#[derive(Debug, Serialize, Deserialize)]
struct LocationRow {
    receipt_id: String,
    latitude: f64,
    longitude: f64,
    formatted_address: Option<String>,
    place_id: Option<String>,
}

/// Store statistics for status output
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub receipts: usize,
    pub items: usize,
    pub locations: usize,
    pub totals_by_currency: Vec<(Currency, Decimal)>,
}

/// The CSV ledger
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    receipts_path: PathBuf,
    items_path: PathBuf,
    locations_path: PathBuf,
}

impl ReceiptStore {
    /// Open a store over the three table files, creating parent
    /// directories. Missing files read as empty tables.
    pub fn open(
        receipts_path: impl Into<PathBuf>,
        items_path: impl Into<PathBuf>,
        locations_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let store = Self {
            receipts_path: receipts_path.into(),
            items_path: items_path.into(),
            locations_path: locations_path.into(),
        };
        for path in [
            &store.receipts_path,
            &store.items_path,
            &store.locations_path,
        ] {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(store)
    }

    /// Open the store at the configured table paths
    pub fn from_config(config: &crate::config::Config) -> Result<Self> {
        Self::open(
            config.receipts_path(),
            config.items_path(),
            config.locations_path(),
        )
    }

    /// Append a receipt and its items. Upserts by `receipt_id`: existing
    /// receipt, item, and location rows for the same ID are replaced, so
    /// forced re-extraction stays idempotent.
    pub fn append(&self, receipt: &Receipt) -> Result<()> {
        let mut receipts: Vec<ReceiptRow> = self.read_rows(&self.receipts_path)?;
        receipts.retain(|row| row.receipt_id != receipt.receipt_id);
        receipts.push(receipt_to_row(receipt));
        self.write_rows(&self.receipts_path, &receipts)?;

        let mut items: Vec<ItemRow> = self.read_rows(&self.items_path)?;
        items.retain(|row| row.receipt_id != receipt.receipt_id);
        items.extend(receipt.items.iter().map(item_to_row));
        self.write_rows(&self.items_path, &items)?;

        let mut locations: Vec<LocationRow> = self.read_rows(&self.locations_path)?;
        let before = locations.len();
        locations.retain(|row| row.receipt_id != receipt.receipt_id);
        if locations.len() != before {
            self.write_rows(&self.locations_path, &locations)?;
        }
        Ok(())
    }

    /// Read every receipt with its items attached, in file order
    pub fn read_receipts(&self) -> Result<Vec<Receipt>> {
        let receipt_rows: Vec<ReceiptRow> = self.read_rows(&self.receipts_path)?;
        let item_rows: Vec<ItemRow> = self.read_rows(&self.items_path)?;

        let mut items_by_receipt: BTreeMap<String, Vec<Item>> = BTreeMap::new();
        for row in item_rows {
            items_by_receipt
                .entry(row.receipt_id.clone())
                .or_default()
                .push(item_from_row(row));
        }

        Ok(receipt_rows
            .into_iter()
            .map(|row| {
                let items = items_by_receipt.remove(&row.receipt_id).unwrap_or_default();
                receipt_from_row(row, items)
            })
            .collect())
    }

    /// Receipts whose purchase date falls in the inclusive range. Open
    /// bounds are unconstrained.
    pub fn read_receipts_in_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Receipt>> {
        Ok(self
            .read_receipts()?
            .into_iter()
            .filter(|receipt| {
                let date = receipt.timestamp.date();
                from.map_or(true, |from| date >= from) && to.map_or(true, |to| date <= to)
            })
            .collect())
    }

    /// Look up one receipt by ID
    pub fn get(&self, receipt_id: &str) -> Result<Option<Receipt>> {
        Ok(self
            .read_receipts()?
            .into_iter()
            .find(|r| r.receipt_id == receipt_id))
    }

    /// Update an existing receipt in place. Unlike `append`, a missing
    /// ID is an error rather than an insert.
    pub fn update_receipt(&self, receipt: &Receipt) -> Result<()> {
        let receipts: Vec<ReceiptRow> = self.read_rows(&self.receipts_path)?;
        if !receipts
            .iter()
            .any(|row| row.receipt_id == receipt.receipt_id)
        {
            return Err(TripLedgerError::ReceiptNotFound(
                receipt.receipt_id.clone(),
            ));
        }
        self.append(receipt)
    }

    /// Delete a receipt, cascading to its item and location rows.
    /// Returns whether the receipt existed.
    pub fn delete(&self, receipt_id: &str) -> Result<bool> {
        let mut receipts: Vec<ReceiptRow> = self.read_rows(&self.receipts_path)?;
        let before = receipts.len();
        receipts.retain(|row| row.receipt_id != receipt_id);
        if receipts.len() == before {
            return Ok(false);
        }
        self.write_rows(&self.receipts_path, &receipts)?;

        let mut items: Vec<ItemRow> = self.read_rows(&self.items_path)?;
        items.retain(|row| row.receipt_id != receipt_id);
        self.write_rows(&self.items_path, &items)?;

        let mut locations: Vec<LocationRow> = self.read_rows(&self.locations_path)?;
        let before = locations.len();
        locations.retain(|row| row.receipt_id != receipt_id);
        if locations.len() != before {
            self.write_rows(&self.locations_path, &locations)?;
        }
        Ok(true)
    }

    /// Insert or replace the location row for a receipt
    pub fn upsert_location(&self, receipt_id: &str, location: &GeoLocation) -> Result<()> {
        let mut locations: Vec<LocationRow> = self.read_rows(&self.locations_path)?;
        locations.retain(|row| row.receipt_id != receipt_id);
        locations.push(LocationRow {
            receipt_id: receipt_id.to_string(),
            latitude: location.latitude,
            longitude: location.longitude,
            formatted_address: location.formatted_address.clone(),
            place_id: location.place_id.clone(),
        });
        self.write_rows(&self.locations_path, &locations)
    }

    /// Read all location rows as (receipt_id, location) pairs
    pub fn read_locations(&self) -> Result<Vec<(String, GeoLocation)>> {
        let rows: Vec<LocationRow> = self.read_rows(&self.locations_path)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.receipt_id,
                    GeoLocation {
                        latitude: row.latitude,
                        longitude: row.longitude,
                        formatted_address: row.formatted_address,
                        place_id: row.place_id,
                    },
                )
            })
            .collect())
    }

    /// Groups of receipts sharing the same purchase timestamp and total,
    /// the usual signature of the same receipt photographed twice.
    /// Decimal comparison ignores scale, so 421 and 421.00 group together.
    pub fn find_duplicates(&self) -> Result<Vec<Vec<Receipt>>> {
        let mut groups: BTreeMap<(NaiveDateTime, Decimal), Vec<Receipt>> = BTreeMap::new();
        for receipt in self.read_receipts()? {
            let key = (receipt.timestamp, receipt.total);
            groups.entry(key).or_default().push(receipt);
        }
        Ok(groups
            .into_values()
            .filter(|group| group.len() > 1)
            .collect())
    }

    /// Item spending summed per category, largest first. Sums are raw
    /// numbers; mixed-currency trips mix units here.
    pub fn spending_by_category(&self) -> Result<Vec<(Category, Decimal)>> {
        let item_rows: Vec<ItemRow> = self.read_rows(&self.items_path)?;
        let mut sums: BTreeMap<Category, Decimal> = BTreeMap::new();
        for row in item_rows {
            if let Some(total) = row.total_price {
                *sums.entry(row.category).or_insert(Decimal::ZERO) += total;
            }
        }
        let mut sorted: Vec<(Category, Decimal)> = sums.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(sorted)
    }

    /// Receipt totals summed per day, in date order
    pub fn daily_spending(&self) -> Result<Vec<(NaiveDate, Decimal)>> {
        let receipt_rows: Vec<ReceiptRow> = self.read_rows(&self.receipts_path)?;
        let mut sums: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for row in receipt_rows {
            *sums.entry(row.timestamp.date()).or_insert(Decimal::ZERO) += row.total;
        }
        Ok(sums.into_iter().collect())
    }

    /// Row counts and per-currency totals
    pub fn stats(&self) -> Result<StoreStats> {
        let receipt_rows: Vec<ReceiptRow> = self.read_rows(&self.receipts_path)?;
        let item_rows: Vec<ItemRow> = self.read_rows(&self.items_path)?;
        let location_rows: Vec<LocationRow> = self.read_rows(&self.locations_path)?;

        let mut totals: BTreeMap<Currency, Decimal> = BTreeMap::new();
        for row in &receipt_rows {
            *totals.entry(row.currency).or_insert(Decimal::ZERO) += row.total;
        }

        Ok(StoreStats {
            receipts: receipt_rows.len(),
            items: item_rows.len(),
            locations: location_rows.len(),
            totals_by_currency: totals.into_iter().collect(),
        })
    }

    pub fn receipts_path(&self) -> &Path {
        &self.receipts_path
    }

    fn read_rows<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            rows.push(row?);
        }
        Ok(rows)
    }

    fn write_rows<T: Serialize>(&self, path: &Path, rows: &[T]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer
            .flush()
            .map_err(|e| TripLedgerError::Store(format!("flush {}: {}", path.display(), e)))?;
        Ok(())
    }
}

fn receipt_to_row(receipt: &Receipt) -> ReceiptRow {
    ReceiptRow {
        receipt_id: receipt.receipt_id.clone(),
        timestamp: receipt.timestamp,
        store_name: receipt.store_name.clone(),
        store_name_translated: receipt.store_name_translated.clone(),
        store_address: receipt.store_address.clone(),
        subtotal: receipt.subtotal,
        tax: receipt.tax,
        total: receipt.total,
        currency: receipt.currency,
        original_language: receipt.original_language,
        source_image: receipt.source_image.clone(),
    }
}

fn receipt_from_row(row: ReceiptRow, items: Vec<Item>) -> Receipt {
    Receipt {
        receipt_id: row.receipt_id,
        timestamp: row.timestamp,
        store_name: row.store_name,
        store_name_translated: row.store_name_translated,
        store_address: row.store_address,
        items,
        subtotal: row.subtotal,
        tax: row.tax,
        total: row.total,
        currency: row.currency,
        original_language: row.original_language,
        source_image: row.source_image,
    }
}

fn item_to_row(item: &Item) -> ItemRow {
    ItemRow {
        item_id: item.item_id.clone(),
        receipt_id: item.receipt_id.clone(),
        name: item.name.clone(),
        name_translated: item.name_translated.clone(),
        quantity: item.quantity,
        unit_price: item.unit_price,
        total_price: item.total_price,
        category: item.category,
        subcategory: item.subcategory.clone(),
    }
}

fn item_from_row(row: ItemRow) -> Item {
    Item {
        item_id: row.item_id,
        receipt_id: row.receipt_id,
        name: row.name,
        name_translated: row.name_translated,
        quantity: row.quantity,
        unit_price: row.unit_price,
        total_price: row.total_price,
        category: row.category,
        subcategory: row.subcategory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> ReceiptStore {
        ReceiptStore::open(
            dir.path().join("receipts.csv"),
            dir.path().join("items.csv"),
            dir.path().join("locations.csv"),
        )
        .unwrap()
    }

    fn sample_receipt(receipt_id: &str, total: i64) -> Receipt {
        let timestamp = NaiveDate::from_ymd_opt(2024, 11, 2)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        Receipt {
            receipt_id: receipt_id.to_string(),
            timestamp,
            store_name: "セブンイレブン渋谷店".to_string(),
            store_name_translated: Some("7-Eleven Shibuya".to_string()),
            store_address: Some("東京都渋谷区1-2-3".to_string()),
            items: vec![
                Item {
                    item_id: format!("{}_item_000", receipt_id),
                    receipt_id: receipt_id.to_string(),
                    name: "コーヒー".to_string(),
                    name_translated: Some("Coffee".to_string()),
                    quantity: 1,
                    unit_price: Some(Decimal::new(150, 0)),
                    total_price: Some(Decimal::new(150, 0)),
                    category: Category::Beverage,
                    subcategory: Some("coffee".to_string()),
                },
                Item {
                    item_id: format!("{}_item_001", receipt_id),
                    receipt_id: receipt_id.to_string(),
                    name: "おにぎり".to_string(),
                    name_translated: Some("Rice ball".to_string()),
                    quantity: 2,
                    unit_price: Some(Decimal::new(120, 0)),
                    total_price: Some(Decimal::new(240, 0)),
                    category: Category::Food,
                    subcategory: Some("snack".to_string()),
                },
            ],
            subtotal: Some(Decimal::new(total - 31, 0)),
            tax: Some(Decimal::new(31, 0)),
            total: Decimal::new(total, 0),
            currency: Currency::JPY,
            original_language: Language::Ja,
            source_image: "IMG_0001.jpg".to_string(),
        }
    }

    #[test]
    fn test_append_writes_one_receipt_row_and_n_item_rows() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.append(&sample_receipt("aaaa000011112222", 421)).unwrap();

        let receipts = store.read_receipts().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].items.len(), 2);
        assert!(receipts[0]
            .items
            .iter()
            .all(|item| item.receipt_id == "aaaa000011112222"));
    }

    #[test]
    fn test_round_trip_preserves_all_columns() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let receipt = sample_receipt("bbbb000011112222", 421);
        store.append(&receipt).unwrap();

        let read_back = store.get("bbbb000011112222").unwrap().unwrap();
        assert_eq!(read_back, receipt);
    }

    #[test]
    fn test_append_same_id_replaces() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.append(&sample_receipt("cccc000011112222", 421)).unwrap();
        let mut updated = sample_receipt("cccc000011112222", 999);
        updated.store_name = "ファミリーマート".to_string();
        store.append(&updated).unwrap();

        let receipts = store.read_receipts().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].store_name, "ファミリーマート");
        assert_eq!(receipts[0].total, Decimal::new(999, 0));
        assert_eq!(receipts[0].items.len(), 2);
    }

    #[test]
    fn test_delete_cascades_to_items_and_locations() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.append(&sample_receipt("dddd000011112222", 421)).unwrap();
        store.append(&sample_receipt("eeee000011112222", 300)).unwrap();
        store
            .upsert_location(
                "dddd000011112222",
                &GeoLocation {
                    latitude: 35.658,
                    longitude: 139.701,
                    formatted_address: Some("Shibuya, Tokyo".to_string()),
                    place_id: None,
                },
            )
            .unwrap();

        assert!(store.delete("dddd000011112222").unwrap());
        assert!(!store.delete("dddd000011112222").unwrap());

        let receipts = store.read_receipts().unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].receipt_id, "eeee000011112222");
        assert!(store.read_locations().unwrap().is_empty());
        let stats = store.stats().unwrap();
        assert_eq!(stats.items, 2);
    }

    #[test]
    fn test_update_requires_existing_id() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let err = store
            .update_receipt(&sample_receipt("ffff000011112222", 421))
            .unwrap_err();
        assert!(matches!(err, TripLedgerError::ReceiptNotFound(_)));

        store.append(&sample_receipt("ffff000011112222", 421)).unwrap();
        let mut updated = sample_receipt("ffff000011112222", 421);
        updated.store_address = None;
        store.update_receipt(&updated).unwrap();
        let read_back = store.get("ffff000011112222").unwrap().unwrap();
        assert_eq!(read_back.store_address, None);
    }

    #[test]
    fn test_upsert_location_replaces() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.append(&sample_receipt("aaaa111122223333", 421)).unwrap();
        let first = GeoLocation {
            latitude: 1.0,
            longitude: 2.0,
            formatted_address: None,
            place_id: None,
        };
        let second = GeoLocation {
            latitude: 35.658,
            longitude: 139.701,
            formatted_address: Some("Shibuya".to_string()),
            place_id: Some("ChIJxxx".to_string()),
        };
        store.upsert_location("aaaa111122223333", &first).unwrap();
        store.upsert_location("aaaa111122223333", &second).unwrap();

        let locations = store.read_locations().unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].1, second);
    }

    #[test]
    fn test_date_range_filter_is_inclusive() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        let mut early = sample_receipt("aaaa0000aaaa0000", 100);
        early.timestamp = NaiveDate::from_ymd_opt(2024, 11, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        store.append(&early).unwrap();
        store.append(&sample_receipt("bbbb0000bbbb0000", 200)).unwrap();

        let nov_first = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let nov_second = NaiveDate::from_ymd_opt(2024, 11, 2).unwrap();

        let from_second = store
            .read_receipts_in_range(Some(nov_second), None)
            .unwrap();
        assert_eq!(from_second.len(), 1);
        assert_eq!(from_second[0].receipt_id, "bbbb0000bbbb0000");

        let first_only = store
            .read_receipts_in_range(Some(nov_first), Some(nov_first))
            .unwrap();
        assert_eq!(first_only.len(), 1);
        assert_eq!(first_only[0].receipt_id, "aaaa0000aaaa0000");

        assert_eq!(store.read_receipts_in_range(None, None).unwrap().len(), 2);
    }

    #[test]
    fn test_find_duplicates_groups_matching_receipts() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.append(&sample_receipt("1111222233334444", 421)).unwrap();
        store.append(&sample_receipt("5555666677778888", 421)).unwrap();
        store.append(&sample_receipt("9999aaaabbbbcccc", 300)).unwrap();

        let duplicates = store.find_duplicates().unwrap();
        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].len(), 2);
    }

    #[test]
    fn test_spending_aggregations() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        store.append(&sample_receipt("aaaabbbbccccdddd", 421)).unwrap();

        let by_category = store.spending_by_category().unwrap();
        // Food 240 ahead of beverage 150.
        assert_eq!(by_category[0], (Category::Food, Decimal::new(240, 0)));
        assert_eq!(by_category[1], (Category::Beverage, Decimal::new(150, 0)));

        let daily = store.daily_spending().unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].0, NaiveDate::from_ymd_opt(2024, 11, 2).unwrap());
        assert_eq!(daily[0].1, Decimal::new(421, 0));
    }

    #[test]
    fn test_missing_files_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);
        assert!(store.read_receipts().unwrap().is_empty());
        assert!(store.read_locations().unwrap().is_empty());
        let stats = store.stats().unwrap();
        assert_eq!(stats.receipts, 0);
        assert_eq!(stats.items, 0);
    }
}
