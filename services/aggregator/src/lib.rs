//! Aggregator - builds the outbreak report from the three metric series
//!
//! Responsibilities:
//! - Merge infections, deaths and recoveries into one history per location
//! - Derive daily deltas and trailing-window sums
//! - Stack per-date totals by continent
//! - Consolidate locations into countries against the geographic reference
//! - Decide cache vs. live loading and keep the three sources consistent

pub mod continents;
pub mod countries;
pub mod format;
pub mod merge;
pub mod options;
pub mod report;

pub use continents::{Continent, ContinentMap};
pub use countries::{aggregate_countries, flag_url, GeoRecord};
pub use format::{abbreviate, format_count, per_million};
pub use merge::{derive_stats, join_series, merge_locations, MergeOutput, StackedChartEntry, StackedTables};
pub use options::ReportOptions;
pub use report::{Report, ReportAssembler};
