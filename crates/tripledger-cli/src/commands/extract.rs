//! Extract command

use crate::app::ExtractArgs;
use crate::progress::ProgressReporter;
use anyhow::Result;
use tripledger_core::{scan_directory, Config, ExtractionPipeline};

pub async fn run(args: ExtractArgs, config: &Config) -> Result<()> {
    let mut pipeline = ExtractionPipeline::from_config(config)?;

    let paths = if args.path.is_dir() {
        scan_directory(&args.path)?
    } else {
        vec![args.path.clone()]
    };
    if paths.is_empty() {
        println!("No supported images found in {}", args.path.display());
        return Ok(());
    }

    let mut progress = ProgressReporter::new(paths.len());
    let summary = pipeline
        .process_batch(&paths, args.force, |current, _total, name| {
            progress.step(current, name);
        })
        .await;
    progress.finish();

    for result in &summary.results {
        match (&result.receipt, &result.error) {
            (Some(receipt), _) => {
                let marker = if result.cached { "cached" } else { "ok" };
                println!(
                    "{:<7} {}  {}  {} {} ({} items)",
                    marker,
                    receipt.receipt_id,
                    result.source_image,
                    receipt.total,
                    receipt.currency.as_str(),
                    receipt.items.len()
                );
            }
            (None, Some(error)) => {
                println!("failed  {}  {}", result.source_image, error);
            }
            _ => {}
        }
    }

    println!();
    println!(
        "Processed: {} | Cached: {} | Failed: {}",
        summary.processed, summary.cached, summary.failed
    );

    if !summary.all_succeeded() {
        anyhow::bail!("{} of {} images failed", summary.failed, summary.total());
    }
    Ok(())
}
