//! Report assembler
//!
//! Decides between stored and live payloads, checks the three sources agree,
//! runs the merger and country aggregator, and builds the report.
//! Every failure degrades to less data; nothing is returned as an error.

use crate::continents::ContinentMap;
use crate::countries::{aggregate_countries, GeoRecord};
use crate::merge::{merge_locations, StackedChartEntry};
use crate::options::ReportOptions;
use chrono::{DateTime, NaiveDate, Utc};
use collector::{daily_cache_key, latest_revision, should_load_from_cache, Config, SourceCache};
use parser::dates::display_date;
use parser::{parse_daily_snapshot, parse_time_series, DailyReport, Location, Metric};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Aggregate result handed to the visualization layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub countries: Vec<Location>,
    /// Merged locations before country consolidation
    pub locations: Vec<Location>,
    pub stacked_chart_data: Vec<StackedChartEntry>,
    pub stacked_death_chart_data: Vec<StackedChartEntry>,
    pub stacked_daily_chart_data: Vec<StackedChartEntry>,
    pub stacked_daily_death_chart_data: Vec<StackedChartEntry>,
    /// Label of the most recent data revision
    pub date: String,
}

impl Report {
    /// True when every fetch failed and nothing could be merged
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty() && self.locations.is_empty()
    }
}

/// The three parsed metric collections of one run
#[derive(Debug, Default)]
struct MetricSeries {
    infections: Vec<Location>,
    deaths: Vec<Location>,
    recoveries: Vec<Location>,
}

impl MetricSeries {
    fn first_lengths(&self) -> [Option<usize>; 3] {
        [&self.infections, &self.deaths, &self.recoveries]
            .map(|c| c.first().map(|l| l.history.len()))
    }

    fn any_empty(&self) -> bool {
        self.infections.is_empty() || self.deaths.is_empty() || self.recoveries.is_empty()
    }

    /// First-entry history lengths agree across the three sources
    fn consistent(&self) -> bool {
        let [a, b, c] = self.first_lengths();
        a == b && b == c
    }
}

fn sort_by_infections(locations: &mut [Location]) {
    locations.sort_by(|a, b| b.current.total_infections.cmp(&a.current.total_infections));
}

pub struct ReportAssembler {
    cache: SourceCache,
    config: Config,
    options: ReportOptions,
    continents: ContinentMap,
}

impl ReportAssembler {
    pub fn new(cache: SourceCache, config: Config, options: ReportOptions, continents: ContinentMap) -> Self {
        Self {
            cache,
            config,
            options,
            continents,
        }
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    async fn load_metric(&self, metric: Metric, load_from_cache: bool) -> Vec<Location> {
        let url = self.config.time_series_url(metric);
        let text = self.cache.load(&metric.cache_key(), &url, load_from_cache).await;
        let locations = parse_time_series(&text);
        debug!(
            "{}: {} locations ({})",
            metric,
            locations.len(),
            if load_from_cache { "cached" } else { "live" }
        );
        locations
    }

    /// Fetch and parse all three metrics concurrently
    async fn load_all(&self, load_from_cache: bool) -> MetricSeries {
        let (infections, deaths, recoveries) = tokio::join!(
            self.load_metric(Metric::Infections, load_from_cache),
            self.load_metric(Metric::Deaths, load_from_cache),
            self.load_metric(Metric::Recoveries, load_from_cache),
        );
        MetricSeries {
            infections,
            deaths,
            recoveries,
        }
    }

    /// Build the full report against the given geographic reference
    pub async fn produce_report(&self, shapes: &[GeoRecord]) -> Report {
        let revision = latest_revision(self.cache.remote().as_ref(), &self.config.revisions_url).await;
        let mut load_from_cache = should_load_from_cache(
            revision.map(|t| t.timestamp_millis()),
            self.cache.last_stored().await,
        );
        info!(
            "producing report ({})",
            if load_from_cache { "cached sources" } else { "live sources" }
        );

        let mut series = self.load_all(load_from_cache).await;

        // a stale entry for one metric must not be merged with fresh ones
        if !series.consistent() || (load_from_cache && series.any_empty()) {
            warn!(
                "sources disagree (first history lengths {:?}), refetching all",
                series.first_lengths()
            );
            load_from_cache = false;
            series = self.load_all(load_from_cache).await;
            if !series.consistent() {
                warn!(
                    "sources still disagree after refetch ({:?}), merging what is available",
                    series.first_lengths()
                );
            }
        }

        let merged = merge_locations(
            &series.infections,
            &series.deaths,
            &series.recoveries,
            &self.continents,
            &self.options,
        );

        let mut countries = aggregate_countries(&merged.locations, shapes, &self.continents, &self.options);
        sort_by_infections(&mut countries);

        let mut locations = merged.locations;
        sort_by_infections(&mut locations);

        self.cache.mark_stored(Utc::now()).await;

        let date = report_date(revision, &locations);
        info!(
            "report ready: {} countries, {} locations, dated '{}'",
            countries.len(),
            locations.len(),
            date
        );

        Report {
            countries,
            locations,
            stacked_chart_data: merged.stacked.infections,
            stacked_death_chart_data: merged.stacked.deaths,
            stacked_daily_chart_data: merged.stacked.daily_infections,
            stacked_daily_death_chart_data: merged.stacked.daily_deaths,
            date,
        }
    }

    /// Single-day snapshot, always fetched live.
    ///
    /// `load_from_cache` is accepted for call compatibility and ignored.
    pub async fn daily_report(&self, date: NaiveDate, index: usize, load_from_cache: bool) -> DailyReport {
        if load_from_cache {
            debug!("{}: cache hint ignored for daily snapshots", daily_cache_key(date));
        }
        let url = self.config.daily_report_url(date);
        let text = self.cache.fetch_live(&url).await;

        let mut report = DailyReport::empty(date, index);
        report.locations = parse_daily_snapshot(&text);
        info!("daily report {}: {} locations", date, report.locations.len());
        report
    }
}

/// Revision date label, falling back to the newest day in the data
fn report_date(revision: Option<DateTime<Utc>>, locations: &[Location]) -> String {
    match revision {
        Some(at) => display_date(at.date_naive()),
        None => locations
            .iter()
            .filter_map(|l| l.last_date())
            .max()
            .map(display_date)
            .unwrap_or_default(),
    }
}
