//! Country aggregator
//!
//! Folds sub-national locations into one record per country, adds records
//! for reference countries without case data, attaches geographic metadata
//! and drops countries too small to compare.

use crate::continents::ContinentMap;
use crate::options::ReportOptions;
use chrono::NaiveDate;
use parser::{DailyStat, GeoPoint, Location};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Attribute table of one reference shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoFields {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Code", default)]
    pub code: Value,
    #[serde(rename = "Population", default)]
    pub population: Value,
    #[serde(rename = "ShapePosX", default)]
    pub shape_pos_x: Value,
    #[serde(rename = "ShapePosY", default)]
    pub shape_pos_y: Value,
}

/// One country of the geographic reference collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    #[serde(rename = "fieldValues")]
    pub field_values: GeoFields,
    #[serde(default)]
    pub points: Vec<Vec<GeoPoint>>,
}

/// Attribute values arrive as numbers or numeric strings
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl GeoRecord {
    pub fn name(&self) -> &str {
        &self.field_values.name
    }

    pub fn population(&self) -> Option<u64> {
        value_as_f64(&self.field_values.population)
            .filter(|p| p.is_finite() && *p >= 0.0)
            .map(|p| p.trunc() as u64)
    }

    pub fn iso(&self) -> String {
        value_as_string(&self.field_values.code)
    }

    pub fn latitude(&self) -> f64 {
        value_as_f64(&self.field_values.shape_pos_y).unwrap_or(0.0)
    }

    pub fn longitude(&self) -> f64 {
        value_as_f64(&self.field_values.shape_pos_x).unwrap_or(0.0)
    }
}

/// Flag image reference for an ISO code
pub fn flag_url(base: &str, iso: &str) -> String {
    format!("{}{}.svg", base, iso.to_lowercase())
}

/// Add `source`'s days into `base`, matching days by date
fn fold_into(base: &mut Location, source: &Location) {
    let by_date: HashMap<NaiveDate, usize> = base
        .history
        .iter()
        .enumerate()
        .map(|(i, day)| (day.date, i))
        .collect();

    for day in &source.history {
        match by_date.get(&day.date) {
            Some(&i) => base.history[i].stats += day.stats,
            None => debug!("{}: no {} day to fold {} into", base.country, day.date, source.id),
        }
    }
}

fn attach_geo(location: &mut Location, record: &GeoRecord, flags_url: &str) {
    let iso = record.iso();
    location.latitude = record.latitude();
    location.longitude = record.longitude();
    location.population = record.population();
    location.flag = if iso.is_empty() {
        None
    } else {
        Some(flag_url(flags_url, &iso))
    };
    location.iso = Some(iso).filter(|s| !s.is_empty());
    location.shapes = record.points.clone();
}

/// Consolidate merged locations into country records.
///
/// Output order: countries with case data in first-seen order, then
/// reference-only countries in reference order.
pub fn aggregate_countries(
    locations: &[Location],
    shapes: &[GeoRecord],
    continents: &ContinentMap,
    options: &ReportOptions,
) -> Vec<Location> {
    let mut countries: Vec<Location> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for location in locations {
        match index.get(&location.country) {
            Some(&i) => fold_into(&mut countries[i], location),
            None => {
                let mut base = location.clone();
                base.id = base.country.clone();
                base.province.clear();
                base.place.clear();
                index.insert(base.country.clone(), countries.len());
                countries.push(base);
            }
        }
    }

    // zero-filled days for countries with no case data
    let template: Vec<NaiveDate> = locations
        .iter()
        .max_by_key(|l| l.history.len())
        .map(|l| l.history.iter().map(|d| d.date).collect())
        .unwrap_or_default();

    let mut synthesized = 0usize;
    for record in shapes {
        let name = record.name().trim();
        if name.is_empty() {
            continue;
        }
        let i = match index.get(name) {
            Some(&i) => i,
            None => {
                let mut location = Location::new(name, "");
                location.id = name.to_string();
                location.continent = continents.continent_of(name);
                location.history = template.iter().map(|d| DailyStat::empty(*d)).collect();
                index.insert(name.to_string(), countries.len());
                countries.push(location);
                synthesized += 1;
                countries.len() - 1
            }
        };
        attach_geo(&mut countries[i], record, &options.flags_url);
    }

    let before = countries.len();
    let mut countries: Vec<Location> = countries
        .into_iter()
        .filter(|c| c.population.is_some_and(|p| p > options.min_population))
        .collect();

    for country in &mut countries {
        country.refresh_current();
    }

    info!(
        "aggregated {} countries ({} without case data, {} below population threshold)",
        countries.len(),
        synthesized,
        before - countries.len()
    );
    countries
}
