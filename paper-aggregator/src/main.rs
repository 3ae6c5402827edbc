use anyhow::Context;
use clap::Parser;
use paper_aggregator::{build_pipeline, AppConfig, ProgressMode, RunOptions};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Fetch recent arXiv and IACR papers, keep the ones matching keyword rules,
/// summarize them in Chinese and English, and publish an RSS feed.
#[derive(Debug, Parser)]
#[command(name = "paper-pulse", version, about)]
struct Args {
    /// Configuration file (TOML, YAML or JSON); defaults to ./config.toml when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding papers.json, failed.json and generated artifacts
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keyword rule file
    #[arg(long)]
    keywords: Option<PathBuf>,

    #[arg(long, value_enum)]
    progress: Option<ProgressMode>,

    /// Skip writing feed.xml
    #[arg(long)]
    no_feed: bool,

    /// Write the report but do not mail it
    #[arg(long)]
    no_email: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(data_dir) = args.data_dir {
        config.general.data_dir = data_dir;
    }
    if let Some(keywords) = args.keywords {
        config.general.keywords_file = keywords;
    }
    if let Some(progress) = args.progress {
        config.general.progress = progress;
    }

    info!("Starting paper-pulse (data dir: {})", config.general.data_dir.display());

    let options = RunOptions {
        write_feed: !args.no_feed,
        send_email: !args.no_email,
    };
    let mut pipeline = build_pipeline(config)
        .context("Failed to initialise pipeline")?
        .with_options(options);

    let summary = pipeline.run().await.context("Run failed")?;
    info!(
        "Finished: {} new summaries, {} pending retry, {} papers in store",
        summary.summarized, summary.failed, summary.total_in_store
    );
    Ok(())
}
