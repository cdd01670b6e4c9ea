use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use market_data_ingestor::providers::alpaca_rest::AlpacaProvider;
use market_monitor::{
    acquisition::ProviderBarSource,
    config::{MonitorOptions, load_options_path},
    news::RssFeed,
    publish::{JsonLinesSink, LogSink, SnapshotSink},
    scheduler::{RefreshScheduler, shutdown_channel},
    sentiment::LexiconScorer,
    telemetry::init_tracing,
};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Live price, indicator and news-mood monitor")]
struct Cli {
    /// Options file (TOML). Missing keys take their defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Instrument to monitor; overrides the options file.
    #[arg(long)]
    symbol: Option<String>,

    /// Print each snapshot as a JSON line on stdout instead of logging it.
    #[arg(long)]
    json: bool,

    /// Run a single cycle and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => load_options_path(path)
            .with_context(|| format!("loading options from {}", path.display()))?,
        None => MonitorOptions::default(),
    };
    if let Some(symbol) = cli.symbol {
        options.symbol = symbol;
    }
    let options = options.validate().context("invalid options")?;

    let provider = AlpacaProvider::new().context("initializing Alpaca provider")?;
    let source = ProviderBarSource::from_options(Box::new(provider), &options);
    let feed = RssFeed::new(options.feed_url.clone()).context("building headline feed client")?;
    let sink: Box<dyn SnapshotSink> = if cli.json {
        Box::new(JsonLinesSink::new(std::io::stdout()))
    } else {
        Box::new(LogSink)
    };

    let scheduler = RefreshScheduler::new(
        options,
        Box::new(source),
        Box::new(feed),
        Box::new(LexiconScorer::new()),
        sink,
    )?;

    if cli.once {
        let outcome = scheduler.run_cycle().await;
        info!(status = %outcome.status, "single cycle finished");
        return Ok(());
    }

    let (trigger, shutdown) = shutdown_channel();
    let refresh = tokio::spawn(async move { scheduler.run(shutdown).await });

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl-c")?;
    info!("shutdown requested");
    trigger.trigger();
    refresh.await.context("refresh loop task failed")?;

    Ok(())
}
