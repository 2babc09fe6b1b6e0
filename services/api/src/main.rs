//! API Service - Public API for the outbreak report
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /report - Full report (built on first request)
//! - POST /refresh - Rebuild the report from the sources
//! - GET /countries - Country summaries, optionally per million people
//! - GET /locations - Search merged locations
//! - GET /stacked - One continent stacking table
//! - GET /daily - Live daily snapshot for a date

use aggregator::{
    abbreviate, format_count, per_million, ContinentMap, GeoRecord, Report, ReportAssembler,
    ReportOptions, StackedChartEntry,
};
use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use collector::{Config, FsStore, HttpSource, SourceCache};
use parser::{Location, Metric};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ============================================================================
// State
// ============================================================================

struct AppState {
    assembler: ReportAssembler,
    geo: Vec<GeoRecord>,
    report: RwLock<Option<Arc<Report>>>,
    /// Serializes builds; readers only wait on `report` for the swap
    refresh: Mutex<()>,
}

impl AppState {
    fn new(assembler: ReportAssembler, geo: Vec<GeoRecord>) -> Self {
        Self {
            assembler,
            geo,
            report: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Held report, produced on first use
    async fn report(&self) -> Arc<Report> {
        if let Some(report) = self.report.read().await.as_ref() {
            return report.clone();
        }
        self.produce(false).await
    }

    /// Build a report and hold it. Empty reports are returned but not kept,
    /// so the next request tries again. Readers keep getting the previous
    /// report while a build runs.
    async fn produce(&self, force: bool) -> Arc<Report> {
        let _building = self.refresh.lock().await;
        if !force {
            if let Some(report) = self.report.read().await.as_ref() {
                return report.clone();
            }
        }

        let report = Arc::new(self.assembler.produce_report(&self.geo).await);
        if report.is_empty() {
            warn!("report came back empty, keeping the previous one");
        } else {
            *self.report.write().await = Some(report.clone());
        }
        report
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct RefreshResponse {
    countries: usize,
    locations: usize,
    date: String,
}

#[derive(Serialize)]
struct CountrySummary {
    id: String,
    country: String,
    continent: String,
    iso: Option<String>,
    flag: Option<String>,
    population: Option<u64>,
    infections: f64,
    deaths: f64,
    recoveries: f64,
    weekly_infections: f64,
    infections_label: String,
    infections_formatted: String,
}

#[derive(Serialize)]
struct CountriesResponse {
    date: String,
    metric: String,
    per_million: bool,
    total: usize,
    countries: Vec<CountrySummary>,
}

#[derive(Serialize)]
struct LocationsResponse<'a> {
    total: usize,
    locations: Vec<&'a Location>,
}

#[derive(Serialize)]
struct StackedResponse<'a> {
    table: &'a str,
    entries: &'a [StackedChartEntry],
}

// ============================================================================
// Query params
// ============================================================================

#[derive(Deserialize)]
struct CountriesQuery {
    limit: Option<usize>,
    per_million: Option<bool>,
}

#[derive(Deserialize)]
struct LocationsQuery {
    query: Option<String>,
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct StackedQuery {
    table: Option<String>,
}

#[derive(Deserialize)]
struct DailyQuery {
    date: Option<String>,
    index: Option<usize>,
}

// ============================================================================
// Handlers
// ============================================================================

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn report_handler(State(state): State<Arc<AppState>>) -> Response {
    let report = state.report().await;
    if report.is_empty() {
        return error_response(StatusCode::NOT_FOUND, "No data available");
    }
    Json(report.as_ref()).into_response()
}

async fn refresh_handler(State(state): State<Arc<AppState>>) -> Response {
    let report = state.produce(true).await;
    if report.is_empty() {
        return error_response(StatusCode::NOT_FOUND, "No data available");
    }
    Json(RefreshResponse {
        countries: report.countries.len(),
        locations: report.locations.len(),
        date: report.date.clone(),
    })
    .into_response()
}

fn summarize(country: &Location, scaled: bool) -> CountrySummary {
    let value = |v: i64| {
        if scaled {
            per_million(v, country.population).unwrap_or(0.0)
        } else {
            v as f64
        }
    };
    let infections = value(country.current.total_infections);

    CountrySummary {
        id: country.id.clone(),
        country: country.country.clone(),
        continent: country.continent.clone(),
        iso: country.iso.clone(),
        flag: country.flag.clone(),
        population: country.population,
        infections,
        deaths: value(country.current.total_deaths),
        recoveries: value(country.current.total_recoveries),
        weekly_infections: value(country.current.weekly_infections),
        infections_label: abbreviate(infections, 1),
        infections_formatted: format_count(infections),
    }
}

async fn countries_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountriesQuery>,
) -> Response {
    let report = state.report().await;
    if report.countries.is_empty() {
        return error_response(StatusCode::NOT_FOUND, "No data available");
    }

    let scaled = params.per_million.unwrap_or(false);
    let limit = params.limit.unwrap_or(250);

    Json(CountriesResponse {
        date: report.date.clone(),
        metric: Metric::Infections.display_name(false, scaled),
        per_million: scaled,
        total: report.countries.len(),
        countries: report
            .countries
            .iter()
            .take(limit)
            .map(|c| summarize(c, scaled))
            .collect(),
    })
    .into_response()
}

async fn locations_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationsQuery>,
) -> Response {
    let report = state.report().await;
    let limit = params.limit.unwrap_or(50).min(500);
    let needle = params
        .query
        .map(|q| q.trim().to_lowercase())
        .unwrap_or_default();

    let matches: Vec<&Location> = report
        .locations
        .iter()
        .filter(|l| needle.is_empty() || l.id.to_lowercase().contains(&needle))
        .collect();

    if matches.is_empty() {
        return error_response(StatusCode::NOT_FOUND, "No matching locations");
    }

    Json(LocationsResponse {
        total: matches.len(),
        locations: matches.into_iter().take(limit).collect(),
    })
    .into_response()
}

async fn stacked_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StackedQuery>,
) -> Response {
    let Some(table) = params.table else {
        return error_response(StatusCode::BAD_REQUEST, "table is required");
    };

    let report = state.report().await;
    let entries = match table.as_str() {
        "infections" => &report.stacked_chart_data,
        "deaths" => &report.stacked_death_chart_data,
        "daily-infections" => &report.stacked_daily_chart_data,
        "daily-deaths" => &report.stacked_daily_death_chart_data,
        other => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!(
                    "unknown table '{}' (infections, deaths, daily-infections, daily-deaths)",
                    other
                ),
            )
        }
    };

    Json(StackedResponse {
        table: &table,
        entries,
    })
    .into_response()
}

async fn daily_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DailyQuery>,
) -> Response {
    let Some(raw) = params.date else {
        return error_response(StatusCode::BAD_REQUEST, "date is required (YYYY-MM-DD)");
    };
    let date = match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(d) => d,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("invalid date '{}', expected YYYY-MM-DD", raw),
            )
        }
    };

    let daily = state
        .assembler
        .daily_report(date, params.index.unwrap_or(0), false)
        .await;
    if daily.locations.is_empty() {
        return error_response(StatusCode::NOT_FOUND, format!("No daily report for {}", date));
    }
    Json(daily).into_response()
}

fn app(state: Arc<AppState>) -> Router {
    // CORS for the visualization frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/report", get(report_handler))
        .route("/refresh", post(refresh_handler))
        .route("/countries", get(countries_handler))
        .route("/locations", get(locations_handler))
        .route("/stacked", get(stacked_handler))
        .route("/daily", get(daily_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Main
// ============================================================================

async fn load_geo_reference(path: &str) -> anyhow::Result<Vec<GeoRecord>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read geographic reference {}", path))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse geographic reference {}", path))
}

async fn load_continents() -> anyhow::Result<ContinentMap> {
    match std::env::var("CONTINENTS_PATH") {
        Ok(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read continent table {}", path))?;
            ContinentMap::from_json(&text)
        }
        Err(_) => Ok(ContinentMap::builtin()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let bind = std::env::var("API_BIND").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let geo_path =
        std::env::var("GEO_REFERENCE").unwrap_or_else(|_| "./data/geo/countries.json".to_string());
    let config = Config::from_env()?;
    let options = ReportOptions::from_env()?;

    println!("=== Outbreak Report API ===");
    println!("Source: {}", config.data_base_url);
    println!("Cache: {}", config.cache_dir.display());

    let geo = load_geo_reference(&geo_path).await?;
    println!("Geographic reference: {} countries", geo.len());

    let continents = load_continents().await?;
    println!("Continent table: {} countries", continents.len());

    let store = Arc::new(FsStore::new(&config.cache_dir).context("Failed to open cache dir")?);
    let remote = Arc::new(HttpSource::new(&config).context("Failed to build HTTP client")?);
    let assembler = ReportAssembler::new(SourceCache::new(store, remote), config, options, continents);

    let state = Arc::new(AppState::new(assembler, geo));
    let app = app(state);

    info!("listening on {}", bind);
    println!("API listening on http://{}", bind);
    println!("\nEndpoints:");
    println!("  GET  /health");
    println!("  GET  /report");
    println!("  POST /refresh");
    println!("  GET  /countries?limit=&per_million=");
    println!("  GET  /locations?query=&limit=");
    println!("  GET  /stacked?table=infections|deaths|daily-infections|daily-deaths");
    println!("  GET  /daily?date=YYYY-MM-DD&index=");

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
