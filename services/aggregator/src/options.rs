//! Aggregation constants

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Leading days dropped from every history (unreliable early reporting)
    pub warmup_days: usize,
    /// Length of the trailing "weekly" window in days
    pub window_days: usize,
    /// Weekly and cumulative infections both reach this on the origin day
    pub origin_threshold: i64,
    /// Countries at or below this population are dropped
    pub min_population: u64,
    /// Base URL of flag images, joined with the lowercase ISO code
    pub flags_url: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            warmup_days: 8,
            window_days: 10,
            origin_threshold: 100,
            min_population: 10_000,
            flags_url: collector::config::DEFAULT_FLAGS_URL.to_string(),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value '{}'", name, v)),
        Err(_) => Ok(default),
    }
}

impl ReportOptions {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let options = Self {
            warmup_days: env_or("WARMUP_DAYS", defaults.warmup_days)?,
            window_days: env_or("WINDOW_DAYS", defaults.window_days)?,
            origin_threshold: env_or("ORIGIN_THRESHOLD", defaults.origin_threshold)?,
            min_population: env_or("MIN_POPULATION", defaults.min_population)?,
            flags_url: std::env::var("FLAGS_URL").unwrap_or(defaults.flags_url),
        };
        if options.window_days == 0 {
            anyhow::bail!("WINDOW_DAYS must be at least 1");
        }
        Ok(options)
    }
}
