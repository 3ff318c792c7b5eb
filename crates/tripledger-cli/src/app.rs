//! CLI argument definitions

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tripledger")]
#[command(
    author,
    version,
    about = "Receipt extraction and travel expense tracking"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract receipts from an image or a directory of images
    Extract(ExtractArgs),

    /// Classify an item or store name without calling the model
    Classify(ClassifyArgs),

    /// List stored receipts
    Ls(LsArgs),

    /// Remove a receipt and its items
    Rm(RmArgs),

    /// Show store and cache status
    Status,

    /// Manage the extraction cache
    Cache(CacheArgs),

    /// Fill in missing store coordinates
    Geocode,

    /// Render a plain-text expense report
    Report(ReportArgs),
}

#[derive(Args)]
pub struct ExtractArgs {
    /// Image file or directory of images
    pub path: PathBuf,

    /// Reprocess even when a cached extraction exists
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Name to classify
    #[arg(required = true)]
    pub name: Vec<String>,
}

#[derive(Args)]
pub struct LsArgs {
    /// Show item lines under each receipt
    #[arg(long)]
    pub items: bool,
}

#[derive(Args)]
pub struct RmArgs {
    /// Receipt ID to delete
    pub receipt_id: String,
}

#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry count and cache location
    Stats,
    /// Drop every cache entry
    Clear,
    /// Drop one entry by fingerprint
    #[command(alias = "rm")]
    Remove { fingerprint: String },
}

#[derive(Args)]
pub struct ReportArgs {
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub to: Option<NaiveDate>,
}
