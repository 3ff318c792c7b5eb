//! Geocode command

use anyhow::Result;
use tripledger_core::{Config, Geocoder, ReceiptStore};

pub async fn run(config: &Config) -> Result<()> {
    let store = ReceiptStore::from_config(config)?;
    let mut geocoder = Geocoder::from_config(config)?;

    let updated = geocoder.geocode_receipts(&store).await?;
    if updated == 0 {
        println!("No receipts updated");
    } else {
        println!("Geocoded {} receipts", updated);
    }
    Ok(())
}
