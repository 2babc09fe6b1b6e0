//! Outbreak data model shared by every service
//!
//! A `Location` owns its `history` of `DailyStat` values. Each day embeds a
//! `Stats` value, and the location mirrors the last day into `current`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::AddAssign;

/// Time-series file families published upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Infections,
    Deaths,
    Recoveries,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Infections, Metric::Deaths, Metric::Recoveries];

    /// Suffix used by upstream file names
    pub fn slug(&self) -> &'static str {
        match self {
            Metric::Infections => "confirmed_global",
            Metric::Deaths => "deaths_global",
            Metric::Recoveries => "recovered_global",
        }
    }

    pub fn file_name(&self) -> String {
        format!("time_series_covid19_{}.csv", self.slug())
    }

    /// Key under which the raw CSV text is cached
    pub fn cache_key(&self) -> String {
        format!("data-totals-time_series_covid19_{}", self.slug())
    }

    pub fn total_label(&self) -> &'static str {
        match self {
            Metric::Infections => "Total Cases",
            Metric::Deaths => "Total Deaths",
            Metric::Recoveries => "Total Recoveries",
        }
    }

    pub fn weekly_label(&self) -> &'static str {
        match self {
            Metric::Infections => "Weekly Cases",
            Metric::Deaths => "Weekly Deaths",
            Metric::Recoveries => "Weekly Recoveries",
        }
    }

    /// Column display name, optionally for per-capita views
    pub fn display_name(&self, weekly: bool, per_million: bool) -> String {
        let mut name = if weekly {
            self.weekly_label().to_string()
        } else {
            self.total_label().to_string()
        };
        if per_million {
            name.push_str(" / 1M People");
        }
        name
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Metric::Infections => "infections",
            Metric::Deaths => "deaths",
            Metric::Recoveries => "recoveries",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "infections" | "confirmed" | "cases" => Ok(Metric::Infections),
            "deaths" => Ok(Metric::Deaths),
            "recoveries" | "recovered" => Ok(Metric::Recoveries),
            other => Err(format!("unknown metric '{}'", other)),
        }
    }
}

/// Cumulative, daily and rolling-window counts for one entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_infections: i64,
    pub total_deaths: i64,
    pub total_recoveries: i64,
    pub daily_infections: i64,
    pub daily_deaths: i64,
    pub daily_recoveries: i64,
    pub weekly_infections: i64,
    pub weekly_deaths: i64,
    pub weekly_recoveries: i64,
}

impl Stats {
    pub fn total(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Infections => self.total_infections,
            Metric::Deaths => self.total_deaths,
            Metric::Recoveries => self.total_recoveries,
        }
    }

    pub fn set_total(&mut self, metric: Metric, value: i64) {
        match metric {
            Metric::Infections => self.total_infections = value,
            Metric::Deaths => self.total_deaths = value,
            Metric::Recoveries => self.total_recoveries = value,
        }
    }

    pub fn daily(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Infections => self.daily_infections,
            Metric::Deaths => self.daily_deaths,
            Metric::Recoveries => self.daily_recoveries,
        }
    }

    pub fn set_daily(&mut self, metric: Metric, value: i64) {
        match metric {
            Metric::Infections => self.daily_infections = value,
            Metric::Deaths => self.daily_deaths = value,
            Metric::Recoveries => self.daily_recoveries = value,
        }
    }

    pub fn weekly(&self, metric: Metric) -> i64 {
        match metric {
            Metric::Infections => self.weekly_infections,
            Metric::Deaths => self.weekly_deaths,
            Metric::Recoveries => self.weekly_recoveries,
        }
    }

    pub fn set_weekly(&mut self, metric: Metric, value: i64) {
        match metric {
            Metric::Infections => self.weekly_infections = value,
            Metric::Deaths => self.weekly_deaths = value,
            Metric::Recoveries => self.weekly_recoveries = value,
        }
    }
}

/// Field-wise sum, saturating at the `i64` bounds
impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        self.total_infections = self.total_infections.saturating_add(other.total_infections);
        self.total_deaths = self.total_deaths.saturating_add(other.total_deaths);
        self.total_recoveries = self.total_recoveries.saturating_add(other.total_recoveries);
        self.daily_infections = self.daily_infections.saturating_add(other.daily_infections);
        self.daily_deaths = self.daily_deaths.saturating_add(other.daily_deaths);
        self.daily_recoveries = self.daily_recoveries.saturating_add(other.daily_recoveries);
        self.weekly_infections = self.weekly_infections.saturating_add(other.weekly_infections);
        self.weekly_deaths = self.weekly_deaths.saturating_add(other.weekly_deaths);
        self.weekly_recoveries = self.weekly_recoveries.saturating_add(other.weekly_recoveries);
    }
}

/// One calendar day of one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStat {
    pub date: NaiveDate,
    /// Raw value read from the single-metric source file
    pub cases: i64,
    #[serde(flatten)]
    pub stats: Stats,
}

impl DailyStat {
    pub fn new(date: NaiveDate, cases: i64) -> Self {
        Self {
            date,
            cases,
            stats: Stats::default(),
        }
    }

    /// Zero-filled day
    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, 0)
    }
}

/// Longitude/latitude pair of a shape outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub x: f64,
    pub y: f64,
}

/// A country or sub-national reporting unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub country: String,
    pub province: String,
    pub continent: String,
    /// Admin2 column of daily snapshot files (county level)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub place: String,
    pub latitude: f64,
    pub longitude: f64,
    pub history: Vec<DailyStat>,
    pub current: Stats,
    pub population: Option<u64>,
    pub iso: Option<String>,
    pub flag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shapes: Vec<Vec<GeoPoint>>,
}

impl Location {
    pub fn new(country: impl Into<String>, province: impl Into<String>) -> Self {
        let country = country.into();
        let province = province.into();
        Self {
            id: location_id(&country, &province),
            country,
            province,
            ..Default::default()
        }
    }

    /// Mirror the last history entry into `current`
    pub fn refresh_current(&mut self) {
        self.current = self.history.last().map(|d| d.stats).unwrap_or_default();
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.history.last().map(|d| d.date)
    }
}

/// Identity shared by all three metric sources
pub fn location_id(country: &str, province: &str) -> String {
    format!("{}-{}", country, province)
}
