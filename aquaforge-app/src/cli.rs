use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// AquaForge - feeding and growth calculations for aquaculture batches.
#[derive(Debug, Parser)]
#[command(name = "aquaforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Farm knowledge base directory
    #[arg(long, global = true, env = "AQUAFORGE_DATA_DIR", default_value = "./data/farm")]
    pub data_dir: PathBuf,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recommend a daily ration for a batch
    Feed(FeedArgs),

    /// Record a biometric sample and commit the batch's new population
    Sample(SampleArgs),

    /// Show a batch's biometric history and growth summary
    History(HistoryArgs),

    /// List batches in the knowledge base
    Batches,
}

#[derive(Debug, Args)]
pub struct FeedArgs {
    /// Batch ID
    #[arg(short, long)]
    pub batch: String,

    /// Average individual weight in grams
    #[arg(short, long)]
    pub weight: f64,

    /// Water temperature in °C
    #[arg(short, long)]
    pub temp: f64,

    /// Also record a feeding of this many grams
    #[arg(long)]
    pub log_grams: Option<f64>,

    /// Feed product for the recorded feeding
    #[arg(long, requires = "log_grams")]
    pub feed_type: Option<String>,

    /// When the recorded feeding happened (RFC 3339, defaults to now)
    #[arg(long, requires = "log_grams")]
    pub fed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Batch ID
    #[arg(short, long)]
    pub batch: String,

    /// Number of fish weighed
    #[arg(short = 'n', long)]
    pub fish_count: u32,

    /// Combined weight of the weighed fish in grams
    #[arg(short = 'w', long)]
    pub total_weight: f64,

    /// When the sample was taken (RFC 3339, defaults to now)
    #[arg(long)]
    pub taken_at: Option<DateTime<Utc>>,

    /// Measured mean length in cm
    #[arg(long)]
    pub length: Option<f64>,

    /// Deaths since the previous sample
    #[arg(long, default_value_t = 0)]
    pub mortality: u64,

    /// Feed delivered since the previous sample, in kg
    #[arg(long, default_value_t = 0.0)]
    pub feed_kg: f64,

    /// Observed head count, overriding the batch's last known population
    #[arg(long)]
    pub population: Option<u64>,

    /// Individual weights in grams, comma separated
    #[arg(long, value_delimiter = ',')]
    pub weights: Vec<f64>,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Batch ID
    #[arg(short, long)]
    pub batch: String,
}
