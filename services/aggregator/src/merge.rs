//! Location merger
//!
//! Joins the three single-metric series into one history per location,
//! derives daily deltas and rolling windows, and fills the continent
//! stacking tables.
//!
//! Series are matched on each day's date rather than on position. A source
//! whose dates differ from the canonical record's is not copied at all, so a
//! missing or extra day can neither shift values onto the wrong day nor
//! leave a gap that reads as a drop in the cumulative count.

use crate::continents::{Continent, ContinentMap};
use crate::options::ReportOptions;
use chrono::NaiveDate;
use parser::{DailyStat, Location, Metric};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// One date's value split into the six continent buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedChartEntry {
    pub date: NaiveDate,
    pub north_america: i64,
    pub south_america: i64,
    pub asia: i64,
    pub europe: i64,
    pub oceania: i64,
    pub africa: i64,
}

impl StackedChartEntry {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            north_america: 0,
            south_america: 0,
            asia: 0,
            europe: 0,
            oceania: 0,
            africa: 0,
        }
    }

    fn bucket_mut(&mut self, continent: Continent) -> &mut i64 {
        match continent {
            Continent::NorthAmerica => &mut self.north_america,
            Continent::SouthAmerica => &mut self.south_america,
            Continent::Asia => &mut self.asia,
            Continent::Europe => &mut self.europe,
            Continent::Oceania => &mut self.oceania,
            Continent::Africa => &mut self.africa,
        }
    }

    pub fn add(&mut self, continent: Continent, value: i64) {
        let bucket = self.bucket_mut(continent);
        *bucket = bucket.saturating_add(value);
    }

    pub fn get(&self, continent: Continent) -> i64 {
        match continent {
            Continent::NorthAmerica => self.north_america,
            Continent::SouthAmerica => self.south_america,
            Continent::Asia => self.asia,
            Continent::Europe => self.europe,
            Continent::Oceania => self.oceania,
            Continent::Africa => self.africa,
        }
    }

    pub fn total(&self) -> i64 {
        Continent::ALL
            .iter()
            .fold(0i64, |acc, c| acc.saturating_add(self.get(*c)))
    }
}

/// The four per-date continent tables, each in chronological order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackedTables {
    pub infections: Vec<StackedChartEntry>,
    pub deaths: Vec<StackedChartEntry>,
    pub daily_infections: Vec<StackedChartEntry>,
    pub daily_deaths: Vec<StackedChartEntry>,
}

#[derive(Debug, Default)]
struct StackAccumulator {
    infections: BTreeMap<NaiveDate, StackedChartEntry>,
    deaths: BTreeMap<NaiveDate, StackedChartEntry>,
    daily_infections: BTreeMap<NaiveDate, StackedChartEntry>,
    daily_deaths: BTreeMap<NaiveDate, StackedChartEntry>,
}

fn add_to(table: &mut BTreeMap<NaiveDate, StackedChartEntry>, date: NaiveDate, continent: Continent, value: i64) {
    table
        .entry(date)
        .or_insert_with(|| StackedChartEntry::new(date))
        .add(continent, value);
}

impl StackAccumulator {
    fn add_location(&mut self, location: &Location) {
        let Some(continent) = Continent::from_name(&location.continent) else {
            return;
        };
        for day in &location.history {
            add_to(&mut self.infections, day.date, continent, day.stats.total_infections);
            add_to(&mut self.deaths, day.date, continent, day.stats.total_deaths);
            add_to(&mut self.daily_infections, day.date, continent, day.stats.daily_infections);
            add_to(&mut self.daily_deaths, day.date, continent, day.stats.daily_deaths);
        }
    }

    fn finish(self) -> StackedTables {
        StackedTables {
            infections: self.infections.into_values().collect(),
            deaths: self.deaths.into_values().collect(),
            daily_infections: self.daily_infections.into_values().collect(),
            daily_deaths: self.daily_deaths.into_values().collect(),
        }
    }
}

/// Merged locations plus the stacking tables built alongside them
#[derive(Debug, Clone, Default)]
pub struct MergeOutput {
    pub locations: Vec<Location>,
    pub stacked: StackedTables,
}

/// Copy `source`'s per-day values into `target` as `metric` totals.
///
/// Both histories must cover the same dates. Otherwise the copy is skipped
/// and the metric stays zero for that location, so a short or shifted
/// source cannot leave a fake drop in the cumulative series.
fn copy_metric(target: &mut Location, source: &Location, metric: Metric) {
    let by_date: HashMap<NaiveDate, usize> = target
        .history
        .iter()
        .enumerate()
        .map(|(i, day)| (day.date, i))
        .collect();

    let same_dates = target.history.len() == source.history.len()
        && source.history.iter().all(|day| by_date.contains_key(&day.date));
    if !same_dates {
        warn!(
            "{}: {} history ({} days) does not cover the canonical record's {} days, skipping",
            source.id,
            metric,
            source.history.len(),
            target.history.len()
        );
        return;
    }

    for day in &source.history {
        if let Some(&i) = by_date.get(&day.date) {
            target.history[i].stats.set_total(metric, day.cases);
        }
    }
}

/// Join the three metric series by location id.
///
/// The first collection to mention an id provides its canonical record;
/// output order is first appearance across infections, deaths, recoveries.
pub fn join_series(
    infections: &[Location],
    deaths: &[Location],
    recoveries: &[Location],
) -> Vec<Location> {
    let mut merged: Vec<Location> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    let sources = [
        (Metric::Infections, infections),
        (Metric::Deaths, deaths),
        (Metric::Recoveries, recoveries),
    ];

    for (metric, collection) in sources {
        for location in collection {
            let slot = *index.entry(location.id.clone()).or_insert_with(|| {
                merged.push(location.clone());
                merged.len() - 1
            });
            copy_metric(&mut merged[slot], location, metric);
        }
    }

    merged
}

/// Fill daily deltas and trailing-window sums for one history.
///
/// `weekly` sums the last `min(i + 1, window_days)` daily values. Before
/// the origin day (first day where both weekly and cumulative infections
/// reach the threshold) weekly infections are replaced by the cumulative
/// count; when no origin exists the whole history is backfilled.
pub fn derive_stats(history: &mut [DailyStat], options: &ReportOptions) {
    let window = options.window_days.max(1);

    for i in 0..history.len() {
        for metric in Metric::ALL {
            let daily = if i == 0 {
                0
            } else {
                history[i]
                    .stats
                    .total(metric)
                    .saturating_sub(history[i - 1].stats.total(metric))
            };
            history[i].stats.set_daily(metric, daily);
        }

        let start = (i + 1).saturating_sub(window);
        for metric in Metric::ALL {
            let weekly = history[start..=i]
                .iter()
                .fold(0i64, |acc, d| acc.saturating_add(d.stats.daily(metric)));
            history[i].stats.set_weekly(metric, weekly);
        }
    }

    let origin = history.iter().position(|d| {
        d.stats.weekly_infections >= options.origin_threshold
            && d.stats.total_infections >= options.origin_threshold
    });

    let backfill_end = origin.unwrap_or(history.len());
    for day in &mut history[..backfill_end] {
        day.stats.weekly_infections = day.stats.total_infections;
    }
}

/// Merge the three metric collections into finished locations.
///
/// Locations with no history are dropped. The stacking tables cover every
/// day of every history; the warm-up days are trimmed afterwards.
pub fn merge_locations(
    infections: &[Location],
    deaths: &[Location],
    recoveries: &[Location],
    continents: &ContinentMap,
    options: &ReportOptions,
) -> MergeOutput {
    let joined = join_series(infections, deaths, recoveries);
    let mut stacks = StackAccumulator::default();
    let mut locations = Vec::with_capacity(joined.len());

    for mut location in joined {
        if location.history.is_empty() {
            continue;
        }

        location.continent = continents.continent_of(&location.country);
        derive_stats(&mut location.history, options);
        stacks.add_location(&location);
        location.refresh_current();

        let warmup = options.warmup_days.min(location.history.len());
        location.history.drain(..warmup);
        locations.push(location);
    }

    info!("merged {} locations", locations.len());
    MergeOutput {
        locations,
        stacked: stacks.finish(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, 1).unwrap() + chrono::Duration::days(n as i64)
    }

    fn series(country: &str, province: &str, values: &[i64]) -> Location {
        let mut location = Location::new(country, province);
        location.history = values
            .iter()
            .enumerate()
            .map(|(i, v)| DailyStat::new(day(i as u32), *v))
            .collect();
        location
    }

    fn no_warmup() -> ReportOptions {
        ReportOptions {
            warmup_days: 0,
            ..ReportOptions::default()
        }
    }

    fn column(location: &Location, f: impl Fn(&DailyStat) -> i64) -> Vec<i64> {
        location.history.iter().map(f).collect()
    }

    // -------------------------------------------------------------------------
    // JOIN
    // -------------------------------------------------------------------------

    #[test]
    fn test_three_sources_join_by_id() {
        let inf = vec![series("X", "Y", &[1, 2, 3, 5, 8])];
        let dea = vec![series("X", "Y", &[0, 0, 1, 1, 2])];
        let rec = vec![series("X", "Y", &[0, 0, 0, 1, 1])];

        let out = merge_locations(&inf, &dea, &rec, &ContinentMap::default(), &no_warmup());
        assert_eq!(out.locations.len(), 1);
        let loc = &out.locations[0];
        assert_eq!(loc.id, "X-Y");
        assert_eq!(column(loc, |d| d.stats.total_infections), vec![1, 2, 3, 5, 8]);
        assert_eq!(column(loc, |d| d.stats.total_deaths), vec![0, 0, 1, 1, 2]);
        assert_eq!(column(loc, |d| d.stats.total_recoveries), vec![0, 0, 0, 1, 1]);
        assert_eq!(column(loc, |d| d.stats.daily_infections), vec![0, 1, 1, 2, 3]);
        assert_eq!(column(loc, |d| d.stats.weekly_infections), vec![1, 2, 3, 5, 8]);
        assert_eq!(column(loc, |d| d.stats.daily_deaths), vec![0, 0, 1, 0, 1]);
        assert_eq!(loc.current.total_infections, 8);
        assert_eq!(loc.current.total_recoveries, 1);
    }

    #[test]
    fn test_join_order_is_first_appearance() {
        let inf = vec![series("A", "", &[1]), series("B", "", &[1])];
        let dea = vec![series("C", "", &[1]), series("A", "", &[1])];
        let joined = join_series(&inf, &dea, &[]);
        let ids: Vec<&str> = joined.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["A-", "B-", "C-"]);
    }

    #[test]
    fn test_location_only_in_deaths_keeps_zero_infections() {
        let dea = vec![series("Z", "", &[1, 2])];
        let joined = join_series(&[], &dea, &[]);
        assert_eq!(column(&joined[0], |d| d.stats.total_deaths), vec![1, 2]);
        assert_eq!(column(&joined[0], |d| d.stats.total_infections), vec![0, 0]);
    }

    #[test]
    fn test_shifted_source_is_not_copied() {
        let inf = vec![series("X", "", &[10, 20, 30])];
        // same length, but the deaths source starts one day later
        let mut dea = series("X", "", &[1, 2, 3]);
        for d in &mut dea.history {
            d.date = d.date + chrono::Duration::days(1);
        }
        let joined = join_series(&inf, &[dea], &[]);
        assert_eq!(column(&joined[0], |d| d.stats.total_deaths), vec![0, 0, 0]);
        assert_eq!(column(&joined[0], |d| d.stats.total_infections), vec![10, 20, 30]);
    }

    #[test]
    fn test_short_source_is_not_copied() {
        let inf = vec![series("X", "", &[10, 20, 30, 40])];
        let rec = vec![series("X", "", &[5, 6, 7])];
        let out = merge_locations(&inf, &[], &rec, &ContinentMap::default(), &no_warmup());
        let loc = &out.locations[0];
        assert_eq!(column(loc, |d| d.stats.total_recoveries), vec![0, 0, 0, 0]);
        assert_eq!(column(loc, |d| d.stats.daily_recoveries), vec![0, 0, 0, 0]);
        assert_eq!(loc.current.total_recoveries, 0);
        assert_eq!(column(loc, |d| d.stats.total_infections), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_matching_source_copied_alongside_skipped_one() {
        let inf = vec![series("A", "", &[1, 2]), series("B", "", &[3, 4])];
        let dea = vec![series("A", "", &[0, 1]), series("B", "", &[1])];
        let joined = join_series(&inf, &dea, &[]);
        assert_eq!(column(&joined[0], |d| d.stats.total_deaths), vec![0, 1]);
        assert_eq!(column(&joined[1], |d| d.stats.total_deaths), vec![0, 0]);
    }

    // -------------------------------------------------------------------------
    // DERIVED STATS
    // -------------------------------------------------------------------------

    #[test]
    fn test_daily_is_exact_difference_even_when_decreasing() {
        let inf = vec![series("X", "", &[5, 3, 10])];
        let out = merge_locations(&inf, &[], &[], &ContinentMap::default(), &no_warmup());
        assert_eq!(column(&out.locations[0], |d| d.stats.daily_infections), vec![0, -2, 7]);
    }

    #[test]
    fn test_weekly_window_after_origin() {
        // 50 new infections a day from day 1
        let totals: Vec<i64> = (0..15).map(|i| 100 + 50 * i).collect();
        let mut history = series("X", "", &totals).history;
        for (d, total) in history.iter_mut().zip(&totals) {
            d.stats.total_infections = *total;
        }
        derive_stats(&mut history, &ReportOptions::default());

        // day 1: weekly = 0 + 50 < 100, day 2: 0 + 50 + 50 = 100 -> origin
        assert_eq!(history[0].stats.weekly_infections, 100);
        assert_eq!(history[1].stats.weekly_infections, 150);
        assert_eq!(history[2].stats.weekly_infections, 100);
        // full 10-day window reached at day 9 (daily[0] = 0 drops out at day 10)
        assert_eq!(history[9].stats.weekly_infections, 450);
        assert_eq!(history[10].stats.weekly_infections, 500);
        assert_eq!(history[14].stats.weekly_infections, 500);
    }

    #[test]
    fn test_weekly_matches_window_sum_for_all_metrics() {
        let values: Vec<i64> = (0..20).map(|i| i * i).collect();
        let inf = vec![series("X", "", &values)];
        let dea = vec![series("X", "", &values)];
        let out = merge_locations(&inf, &dea, &[], &ContinentMap::default(), &no_warmup());
        let h = &out.locations[0].history;
        for i in 0..h.len() {
            let k = i.min(9);
            let expected: i64 = h[i - k..=i].iter().map(|d| d.stats.daily_deaths).sum();
            assert_eq!(h[i].stats.weekly_deaths, expected, "day {}", i);
        }
    }

    #[test]
    fn test_no_origin_backfills_everything() {
        let mut history = series("X", "", &[0, 0, 0]).history;
        for (i, d) in history.iter_mut().enumerate() {
            d.stats.total_infections = (i as i64 + 1) * 10;
        }
        derive_stats(&mut history, &ReportOptions::default());
        let weekly: Vec<i64> = history.iter().map(|d| d.stats.weekly_infections).collect();
        assert_eq!(weekly, vec![10, 20, 30]);
    }

    #[test]
    fn test_extreme_counts_saturate() {
        let csv = "Province/State,Country/Region,Lat,Long,3/1/20,3/2/20\n,Peru,0,0,-9e18,9e18\n";
        let inf = parser::parse_time_series(csv);
        let out = merge_locations(&inf, &[], &[], &ContinentMap::builtin(), &no_warmup());
        let loc = &out.locations[0];
        assert_eq!(column(loc, |d| d.stats.daily_infections), vec![0, i64::MAX]);
        assert_eq!(loc.history[1].stats.weekly_infections, i64::MAX);
        assert_eq!(out.stacked.daily_infections[1].south_america, i64::MAX);
    }

    #[test]
    fn test_stacked_buckets_saturate() {
        let inf = vec![
            series("Peru", "", &[i64::MAX - 1]),
            series("Chile", "", &[i64::MAX - 1]),
        ];
        let out = merge_locations(&inf, &[], &[], &ContinentMap::builtin(), &no_warmup());
        assert_eq!(out.stacked.infections[0].south_america, i64::MAX);
        assert_eq!(out.stacked.infections[0].total(), i64::MAX);
    }

    // -------------------------------------------------------------------------
    // TRUNCATION
    // -------------------------------------------------------------------------

    #[test]
    fn test_warmup_days_dropped() {
        let values: Vec<i64> = (1..=12).collect();
        let inf = vec![series("X", "", &values)];
        let out = merge_locations(&inf, &[], &[], &ContinentMap::default(), &ReportOptions::default());
        let loc = &out.locations[0];
        assert_eq!(loc.history.len(), 4);
        assert_eq!(loc.history[0].date, day(8));
        assert_eq!(loc.history[0].stats.total_infections, 9);
        assert_eq!(loc.current.total_infections, 12);
    }

    #[test]
    fn test_short_history_truncates_to_empty() {
        let inf = vec![series("X", "", &[1, 2, 3])];
        let out = merge_locations(&inf, &[], &[], &ContinentMap::default(), &ReportOptions::default());
        assert!(out.locations[0].history.is_empty());
        assert_eq!(out.locations[0].current.total_infections, 3);
    }

    #[test]
    fn test_empty_inputs() {
        let out = merge_locations(&[], &[], &[], &ContinentMap::default(), &ReportOptions::default());
        assert!(out.locations.is_empty());
        assert!(out.stacked.infections.is_empty());
    }

    // -------------------------------------------------------------------------
    // STACKED TABLES
    // -------------------------------------------------------------------------

    #[test]
    fn test_stacked_buckets_sum_to_location_totals() {
        let continents = ContinentMap::builtin();
        let inf = vec![
            series("Italy", "", &[1, 4, 9]),
            series("Germany", "", &[2, 3, 5]),
            series("China", "Hubei", &[10, 20, 40]),
            series("Atlantis", "", &[1000, 1000, 1000]),
        ];
        let out = merge_locations(&inf, &[], &[], &continents, &no_warmup());

        assert_eq!(out.stacked.infections.len(), 3);
        for (i, entry) in out.stacked.infections.iter().enumerate() {
            let expected: i64 = out
                .locations
                .iter()
                .filter(|l| !l.continent.is_empty())
                .map(|l| l.history[i].stats.total_infections)
                .sum();
            assert_eq!(entry.total(), expected);
            assert_eq!(entry.date, day(i as u32));
        }
        assert_eq!(out.stacked.infections[2].europe, 14);
        assert_eq!(out.stacked.infections[2].asia, 40);
        assert_eq!(out.stacked.daily_infections[2].asia, 20);
    }

    #[test]
    fn test_stacked_tables_chronological_across_locations() {
        let continents = ContinentMap::builtin();
        let late = {
            let mut l = series("Peru", "", &[1]);
            l.history[0].date = day(5);
            l
        };
        let inf = vec![late, series("Chile", "", &[1, 2])];
        let out = merge_locations(&inf, &[], &[], &continents, &no_warmup());
        let dates: Vec<NaiveDate> = out.stacked.infections.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(5)]);
        assert_eq!(out.stacked.infections[0].south_america, 1);
    }

    #[test]
    fn test_stacked_chart_entry_add_and_total() {
        let mut entry = StackedChartEntry::new(day(0));
        entry.add(Continent::Oceania, 3);
        entry.add(Continent::Africa, 4);
        entry.add(Continent::Oceania, 1);
        assert_eq!(entry.oceania, 4);
        assert_eq!(entry.total(), 8);
    }
}
