//! Daily snapshot parser
//!
//! Daily report files carry one cross-sectional row per reporting unit.
//! Two header generations exist (`Province/State` and `Province_State`);
//! both are accepted. Rows carry the day's raw counts only.

use crate::model::Location;
use crate::names::canonical_identity;
use crate::text::parse_count;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Locations reported in a single daily file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyReport {
    pub date: Option<NaiveDate>,
    /// Position of the day within the time series, as requested by the caller
    pub index: usize,
    pub locations: Vec<Location>,
}

impl DailyReport {
    pub fn empty(date: NaiveDate, index: usize) -> Self {
        Self {
            date: Some(date),
            index,
            locations: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct DailyColumns {
    province: Option<usize>,
    country: Option<usize>,
    place: Option<usize>,
    confirmed: Option<usize>,
    deaths: Option<usize>,
    recovered: Option<usize>,
}

impl DailyColumns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut columns = DailyColumns::default();
        for (idx, header) in headers.iter().enumerate() {
            match header.trim() {
                "Province_State" | "Province/State" => columns.province = Some(idx),
                "Country_Region" | "Country/Region" => columns.country = Some(idx),
                "Admin2" => columns.place = Some(idx),
                "Confirmed" => columns.confirmed = Some(idx),
                "Deaths" => columns.deaths = Some(idx),
                "Recovered" => columns.recovered = Some(idx),
                _ => {}
            }
        }
        columns
    }
}

fn cell<'a>(record: &'a csv::StringRecord, idx: Option<usize>) -> &'a str {
    idx.and_then(|i| record.get(i)).unwrap_or("")
}

/// Parse a daily snapshot file into locations without history
pub fn parse_daily_snapshot(content: &str) -> Vec<Location> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns = match reader.headers() {
        Ok(h) => DailyColumns::from_headers(h),
        Err(e) => {
            warn!("daily snapshot header unreadable: {}", e);
            return Vec::new();
        }
    };

    if columns.country.is_none() {
        warn!("daily snapshot has no country column");
    }

    let mut locations = Vec::new();
    for (line_idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("line {}: skipping unreadable row: {}", line_idx + 2, e);
                continue;
            }
        };

        let (country, province) =
            canonical_identity(cell(&record, columns.country), cell(&record, columns.province));
        let mut location = Location::new(country, province);
        location.place = cell(&record, columns.place).to_string();
        location.current.daily_infections = parse_count(cell(&record, columns.confirmed));
        location.current.daily_deaths = parse_count(cell(&record, columns.deaths));
        location.current.daily_recoveries = parse_count(cell(&record, columns.recovered));
        locations.push(location);
    }

    debug!("parsed {} daily snapshot rows", locations.len());
    locations
}
