//! Source locations and HTTP settings

use anyhow::{Context, Result};
use chrono::NaiveDate;
use parser::dates::daily_file_stem;
use parser::Metric;
use std::path::PathBuf;

pub const DEFAULT_DATA_BASE_URL: &str =
    "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/master/csse_covid_19_data";
pub const DEFAULT_REVISIONS_URL: &str = "https://api.github.com/repos/CSSEGISandData/COVID-19/commits";
pub const DEFAULT_FLAGS_URL: &str = "https://static.infragistics.com/xplatform/images/flags/";

const TIME_SERIES_DIR: &str = "csse_covid_19_time_series";
const DAILY_REPORTS_DIR: &str = "csse_covid_19_daily_reports";

#[derive(Debug, Clone)]
pub struct Config {
    pub data_base_url: String,
    pub revisions_url: String,
    pub flags_url: String,
    pub cache_dir: PathBuf,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_base_url: DEFAULT_DATA_BASE_URL.to_string(),
            revisions_url: DEFAULT_REVISIONS_URL.to_string(),
            flags_url: DEFAULT_FLAGS_URL.to_string(),
            cache_dir: PathBuf::from("./data/cache"),
            timeout_secs: 60,
            user_agent: "OutbreakTracker/1.0".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            data_base_url: std::env::var("DATA_BASE_URL").unwrap_or(defaults.data_base_url),
            revisions_url: std::env::var("REVISIONS_URL").unwrap_or(defaults.revisions_url),
            flags_url: std::env::var("FLAGS_URL").unwrap_or(defaults.flags_url),
            cache_dir: std::env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            timeout_secs: match std::env::var("HTTP_TIMEOUT_SECS") {
                Ok(v) => v.parse().context("HTTP_TIMEOUT_SECS must be an integer")?,
                Err(_) => defaults.timeout_secs,
            },
            user_agent: std::env::var("USER_AGENT").unwrap_or(defaults.user_agent),
        })
    }

    pub fn time_series_url(&self, metric: Metric) -> String {
        format!(
            "{}/{}/{}",
            self.data_base_url.trim_end_matches('/'),
            TIME_SERIES_DIR,
            metric.file_name()
        )
    }

    pub fn daily_report_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/{}/{}.csv",
            self.data_base_url.trim_end_matches('/'),
            DAILY_REPORTS_DIR,
            daily_file_stem(date)
        )
    }
}

/// Cache key of a daily snapshot file
pub fn daily_cache_key(date: NaiveDate) -> String {
    format!("data-daily-{}", daily_file_stem(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_series_url() {
        let config = Config {
            data_base_url: "https://example.org/data/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.time_series_url(Metric::Deaths),
            "https://example.org/data/csse_covid_19_time_series/time_series_covid19_deaths_global.csv"
        );
    }

    #[test]
    fn test_daily_report_url_and_key() {
        let config = Config::default();
        let date = NaiveDate::from_ymd_opt(2020, 4, 1).unwrap();
        assert!(config
            .daily_report_url(date)
            .ends_with("/csse_covid_19_daily_reports/04-01-2020.csv"));
        assert_eq!(daily_cache_key(date), "data-daily-04-01-2020");
    }
}
