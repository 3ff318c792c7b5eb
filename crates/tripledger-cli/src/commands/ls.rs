//! List command

use crate::app::LsArgs;
use anyhow::Result;
use std::collections::HashSet;
use tripledger_core::{Config, ReceiptStore};

pub async fn run(args: LsArgs, config: &Config) -> Result<()> {
    let store = ReceiptStore::from_config(config)?;
    let receipts = store.read_receipts()?;

    if receipts.is_empty() {
        println!("No receipts stored");
        return Ok(());
    }

    // Same timestamp and total usually means the same receipt twice.
    let duplicate_ids: HashSet<String> = store
        .find_duplicates()?
        .into_iter()
        .flatten()
        .map(|receipt| receipt.receipt_id)
        .collect();

    for receipt in &receipts {
        let store_name = receipt
            .store_name_translated
            .as_deref()
            .unwrap_or(&receipt.store_name);
        let marker = if duplicate_ids.contains(&receipt.receipt_id) {
            "  [duplicate?]"
        } else {
            ""
        };
        println!(
            "{}  {}  {:<24} {:>10} {}  ({} items){}",
            receipt.receipt_id,
            receipt.timestamp.format("%Y-%m-%d %H:%M"),
            store_name,
            receipt.total,
            receipt.currency.as_str(),
            receipt.items.len(),
            marker
        );

        if args.items {
            for item in &receipt.items {
                let name = item.name_translated.as_deref().unwrap_or(&item.name);
                let price = item
                    .total_price
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                match &item.subcategory {
                    Some(subcategory) => println!(
                        "    {:<28} x{:<3} {:>10}  {}/{}",
                        name,
                        item.quantity,
                        price,
                        item.category.as_str(),
                        subcategory
                    ),
                    None => println!(
                        "    {:<28} x{:<3} {:>10}  {}",
                        name,
                        item.quantity,
                        price,
                        item.category.as_str()
                    ),
                }
            }
        }
    }

    println!();
    println!("{} receipts", receipts.len());
    Ok(())
}
