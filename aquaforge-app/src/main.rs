use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::KnowledgeBase;
use crate::store::FileStore;

mod cli;
mod config;
mod store;
mod workflow;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let kb = KnowledgeBase::load(&cli.data_dir)?;
    let mut store = FileStore::new(kb);

    match cli.command {
        Command::Feed(args) => workflow::run_feed(&store, args, cli.json),
        Command::Sample(args) => workflow::run_sample(&mut store, args, cli.json),
        Command::History(args) => workflow::run_history(&store, args, cli.json),
        Command::Batches => workflow::run_batches(&store, cli.json),
    }
}
