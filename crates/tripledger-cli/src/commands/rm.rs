//! Remove command

use crate::app::RmArgs;
use anyhow::Result;
use tripledger_core::{Config, ReceiptStore, TripLedgerError};

pub async fn run(args: RmArgs, config: &Config) -> Result<()> {
    let store = ReceiptStore::from_config(config)?;

    if !store.delete(&args.receipt_id)? {
        return Err(TripLedgerError::ReceiptNotFound(args.receipt_id).into());
    }
    println!("Removed receipt {}", args.receipt_id);
    Ok(())
}
