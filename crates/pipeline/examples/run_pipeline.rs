//! Run the full pipeline from a JSON configuration file.
//!
//! ```text
//! cargo run -p clipper-pipeline --example run_pipeline -- pipeline.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use clipper_pipeline::{run_with_config, PipelineConfig};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "run_pipeline")]
#[command(about = "Extract training samples and classify a Sentinel-2 product", long_about = None)]
struct Args {
    /// Pipeline configuration (JSON)
    config: PathBuf,

    /// Verbose output, in addition to the configuration's `verbose` flag
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = PipelineConfig::from_file(&args.config)
        .with_context(|| format!("failed to load configuration {}", args.config.display()))?;
    setup_logging(args.verbose || config.verbose);

    let report = run_with_config(&config)?;
    println!("{}", report);
    Ok(())
}
