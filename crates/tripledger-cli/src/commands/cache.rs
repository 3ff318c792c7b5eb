//! Cache management commands

use crate::app::{CacheAction, CacheArgs};
use anyhow::Result;
use tripledger_core::{Config, ExtractionCache, TripLedgerError};

pub async fn run(args: CacheArgs, config: &Config) -> Result<()> {
    let mut cache = ExtractionCache::open(config.extraction_cache_path());

    match args.action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("Entries:  {}", stats.entries);
            println!("Location: {}", stats.path.display());
        }
        CacheAction::Clear => {
            let removed = cache.clear();
            cache.flush()?;
            println!("Cleared {} cache entries", removed);
        }
        CacheAction::Remove { fingerprint } => {
            if !cache.remove(&fingerprint) {
                return Err(TripLedgerError::InvalidInput(format!(
                    "no cache entry for fingerprint {}",
                    fingerprint
                ))
                .into());
            }
            cache.flush()?;
            println!("Removed cache entry {}", fingerprint);
        }
    }
    Ok(())
}
