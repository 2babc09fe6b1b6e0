//! Time-series CSV normalizer
//!
//! Layout: `Province/State, Country/Region, Lat, Long, <date>...` with one
//! row per reporting unit. Output order follows input row order.

use crate::dates::parse_header_date;
use crate::model::{DailyStat, Location};
use crate::names::{canonical_identity, EXCLUDED_COUNTRY};
use crate::text::{parse_coordinate, parse_count};
use chrono::NaiveDate;
use tracing::{debug, warn};

/// First column holding a date
const FIRST_DATE_COLUMN: usize = 4;

/// Parse one metric's time-series text into locations.
///
/// Never fails: empty text yields no locations, unreadable rows are
/// skipped and unreadable cells count as `0`.
pub fn parse_time_series(content: &str) -> Vec<Location> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = match reader.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            warn!("time series header unreadable: {}", e);
            return Vec::new();
        }
    };

    // (column index, date) for every header that parses as a date
    let date_columns: Vec<(usize, NaiveDate)> = headers
        .iter()
        .enumerate()
        .skip(FIRST_DATE_COLUMN)
        .filter_map(|(idx, h)| match parse_header_date(h) {
            Some(date) => Some((idx, date)),
            None => {
                warn!("skipping column {} with unreadable date header '{}'", idx, h);
                None
            }
        })
        .collect();

    let mut locations = Vec::new();
    let mut skipped = 0usize;

    for (line_idx, result) in reader.records().enumerate() {
        let line_num = line_idx + 2; // +1 for 0-index, +1 for header
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("line {}: skipping unreadable row: {}", line_num, e);
                skipped += 1;
                continue;
            }
        };

        let raw_country = record.get(1).unwrap_or("");
        if raw_country.trim().is_empty() || raw_country.trim() == EXCLUDED_COUNTRY {
            skipped += 1;
            continue;
        }

        let (country, province) = canonical_identity(raw_country, record.get(0).unwrap_or(""));
        let mut location = Location::new(country, province);
        location.latitude = parse_coordinate(record.get(2).unwrap_or(""));
        location.longitude = parse_coordinate(record.get(3).unwrap_or(""));

        location.history = date_columns
            .iter()
            .map(|(idx, date)| DailyStat::new(*date, parse_count(record.get(*idx).unwrap_or(""))))
            .collect();

        if location.history.is_empty() {
            skipped += 1;
            continue;
        }
        locations.push(location);
    }

    debug!(
        "parsed {} locations over {} days ({} rows skipped)",
        locations.len(),
        date_columns.len(),
        skipped
    );
    locations
}
