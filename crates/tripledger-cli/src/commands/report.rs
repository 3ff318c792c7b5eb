//! Report command

use crate::app::ReportArgs;
use anyhow::Result;
use tripledger_core::{render_report, Config, ReceiptStore};

pub async fn run(args: ReportArgs, config: &Config) -> Result<()> {
    let store = ReceiptStore::from_config(config)?;
    let receipts = store.read_receipts_in_range(args.from, args.to)?;
    print!("{}", render_report(&receipts));
    Ok(())
}
