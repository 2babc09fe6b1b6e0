//! Parser - turns upstream outbreak CSV files into typed locations
//!
//! Responsibilities:
//! - Canonicalize country names against the geographic reference spelling
//! - Parse per-metric time-series files into locations with history
//! - Parse single-day snapshot files (both header generations)
//! - Decode fetched payloads and read ragged numeric cells leniently
//!
//! Parsing is DETERMINISTIC and never fails: bad rows are skipped and bad
//! cells read as zero.

pub mod daily;
pub mod dates;
pub mod model;
pub mod names;
pub mod text;
pub mod timeseries;

pub use daily::{parse_daily_snapshot, DailyReport};
pub use model::{location_id, DailyStat, GeoPoint, Location, Metric, Stats};
pub use names::{canonical_country, canonical_identity};
pub use text::decode_text;
pub use timeseries::parse_time_series;
