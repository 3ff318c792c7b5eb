//! Status command

use anyhow::Result;
use tripledger_core::{Config, ExtractionCache, GeocodeCache, ReceiptStore};

pub async fn run(config: &Config) -> Result<()> {
    let store = ReceiptStore::from_config(config)?;
    let stats = store.stats()?;
    let extraction_cache = ExtractionCache::open(config.extraction_cache_path());
    let geocode_cache = GeocodeCache::open(config.geocode_cache_path());

    println!("Provider:        {}", config.provider.as_str());
    println!("Data directory:  {}", config.data_dir().display());
    println!();
    println!("Receipts:        {}", stats.receipts);
    println!("Items:           {}", stats.items);
    println!("Locations:       {}", stats.locations);
    if !stats.totals_by_currency.is_empty() {
        println!();
        println!("Totals:");
        for (currency, total) in &stats.totals_by_currency {
            println!("  {}: {}", currency.as_str(), total);
        }
    }
    println!();
    println!("Caches:");
    println!("  Extractions:   {}", extraction_cache.len());
    println!("  Geocodes:      {}", geocode_cache.len());
    Ok(())
}
