//! Parser CLI - Parses a local outbreak CSV file and prints what it found
//!
//! Usage:
//!   cargo run --bin parser -- --file time_series_covid19_confirmed_global.csv
//!   cargo run --bin parser -- --file 04-01-2020.csv --kind daily

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use parser::{decode_text, parse_daily_snapshot, parse_time_series, Location};
use tokio::fs;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FileKind {
    /// Per-metric time series (one column per day)
    Timeseries,
    /// Single-day snapshot report
    Daily,
}

#[derive(Parser, Debug)]
#[command(name = "parser", about = "Parses outbreak CSV files into locations")]
struct Args {
    /// Path to the CSV file
    #[arg(long)]
    file: String,

    /// Layout of the file
    #[arg(long, value_enum, default_value = "timeseries")]
    kind: FileKind,

    /// Number of sample locations to print
    #[arg(long, default_value = "5")]
    sample: usize,
}

fn print_sample(locations: &[Location], sample: usize, kind: FileKind) {
    for (i, location) in locations.iter().take(sample).enumerate() {
        match kind {
            FileKind::Timeseries => {
                let last = location.history.last();
                println!(
                    "  [{}] {} | {} days | last {} = {}",
                    i + 1,
                    location.id,
                    location.history.len(),
                    last.map(|d| d.date.to_string()).unwrap_or_default(),
                    last.map(|d| d.cases).unwrap_or(0)
                );
            }
            FileKind::Daily => {
                println!(
                    "  [{}] {} {} | confirmed {} | deaths {} | recovered {}",
                    i + 1,
                    location.id,
                    location.place,
                    location.current.daily_infections,
                    location.current.daily_deaths,
                    location.current.daily_recoveries
                );
            }
        }
    }
    if locations.len() > sample {
        println!("  ... and {} more", locations.len() - sample);
    }
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

    println!("=== Outbreak Parser ===");
    println!("File: {}", args.file);

    let bytes = fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file))?;
    println!("Content size: {} bytes", bytes.len());

    let content = decode_text(&bytes);
    let locations = match args.kind {
        FileKind::Timeseries => parse_time_series(&content),
        FileKind::Daily => parse_daily_snapshot(&content),
    };

    if locations.is_empty() {
        anyhow::bail!("No locations parsed from {}", args.file);
    }

    println!("\nParsed {} locations", locations.len());
    print_sample(&locations, args.sample, args.kind);

    Ok(())
}
