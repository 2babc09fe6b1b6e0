//! Collector CLI - Primes or refreshes the local source cache
//!
//! Usage:
//!   # All three time series:
//!   cargo run --bin collector
//!
//!   # One metric, ignoring what is cached:
//!   cargo run --bin collector -- --metric deaths --force
//!
//!   # A daily snapshot file (never cached):
//!   cargo run --bin collector -- --daily 2020-04-01

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use collector::{
    content_hash, latest_revision, should_load_from_cache, Config, FsStore, HttpSource,
    SourceCache,
};
use parser::Metric;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "collector", about = "Collects raw outbreak source files")]
struct Args {
    /// Metric to collect (infections, deaths, recoveries); all when omitted
    #[arg(long)]
    metric: Option<Metric>,

    /// Daily snapshot date to fetch (YYYY-MM-DD) instead of time series
    #[arg(long)]
    daily: Option<NaiveDate>,

    /// Force re-download even if cached
    #[arg(long, default_value = "false")]
    force: bool,

    /// Dry run - fetch but don't touch the cache
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

fn print_payload(label: &str, text: &str) {
    if text.is_empty() {
        println!("  ✗ {}: empty payload", label);
        return;
    }
    println!(
        "  ✓ {}: {} bytes, {} lines, {}",
        label,
        text.len(),
        text.lines().count(),
        content_hash(text.as_bytes())
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    println!("=== Outbreak Collector ===");
    println!("Cache: {}", config.cache_dir.display());

    let store = Arc::new(FsStore::new(&config.cache_dir).context("Failed to open cache dir")?);
    let remote = Arc::new(HttpSource::new(&config).context("Failed to build HTTP client")?);
    let gate = SourceCache::new(store, remote.clone());

    if let Some(date) = args.daily {
        let url = config.daily_report_url(date);
        println!("Daily report: {}", url);
        let text = gate.fetch_live(&url).await;
        print_payload(&date.to_string(), &text);
        return Ok(());
    }

    let revision = latest_revision(remote.as_ref(), &config.revisions_url).await;
    match revision {
        Some(at) => println!("Upstream revision: {}", at.to_rfc3339()),
        None => println!("Upstream revision: unresolved"),
    }

    let load_from_cache = !args.force
        && should_load_from_cache(revision.map(|t| t.timestamp_millis()), gate.last_stored().await);
    println!("Mode: {}", if load_from_cache { "cached" } else { "fetch" });

    let metrics: Vec<Metric> = match args.metric {
        Some(m) => vec![m],
        None => Metric::ALL.to_vec(),
    };

    let mut collected = 0;
    let mut failed = 0;
    for metric in metrics {
        let url = config.time_series_url(metric);
        let text = if args.dry_run {
            gate.fetch_live(&url).await
        } else {
            gate.load(&metric.cache_key(), &url, load_from_cache).await
        };
        print_payload(&metric.to_string(), &text);
        if text.is_empty() {
            failed += 1;
        } else {
            collected += 1;
        }
    }

    if !args.dry_run && failed == 0 && !load_from_cache {
        gate.mark_stored(Utc::now()).await;
    }

    println!("\n=== Collection Summary ===");
    println!("Collected: {}", collected);
    println!("Failed: {}", failed);

    if collected == 0 {
        anyhow::bail!("No sources collected");
    }
    Ok(())
}
