use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use portfolio_dashboard_core::errors::CoreError;
use portfolio_dashboard_core::models::analytics::DashboardSnapshot;
use portfolio_dashboard_core::models::settings::DashboardParams;
use portfolio_dashboard_core::PortfolioDashboard;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::render::{self, FormState};

#[derive(Clone)]
pub struct AppState {
    dashboard: Arc<Mutex<PortfolioDashboard>>,
    title: String,
}

impl AppState {
    pub fn new(dashboard: PortfolioDashboard) -> Self {
        let title = dashboard.config().name.clone();
        Self {
            dashboard: Arc::new(Mutex::new(dashboard)),
            title,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct ApiError {
    error: String,
}

/// Raw query string of `/` and `/api/dashboard`.
///
/// Fields are kept as strings so that empty form inputs fall back to the
/// defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<String>,
    pub end: Option<String>,
    pub capital: Option<String>,
    pub refresh: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DashboardQuery {
    /// Resolve the query against the defaults for `today`.
    ///
    /// A refresh of `0` disables auto-refresh.
    pub fn to_params(&self, today: NaiveDate) -> Result<DashboardParams, CoreError> {
        let mut params = DashboardParams::ending_on(today);

        if let Some(end) = non_empty(&self.end) {
            params.end = parse_date("end", end)?;
            params.start = DashboardParams::ending_on(params.end).start;
        }
        if let Some(start) = non_empty(&self.start) {
            params.start = parse_date("start", start)?;
        }
        if let Some(capital) = non_empty(&self.capital) {
            params.initial_capital = capital.parse().map_err(|_| {
                CoreError::ValidationError(format!("capital must be a number, got {capital:?}"))
            })?;
        }
        if let Some(refresh) = non_empty(&self.refresh) {
            let secs: u32 = refresh.parse().map_err(|_| {
                CoreError::ValidationError(format!(
                    "refresh must be a whole number of seconds, got {refresh:?}"
                ))
            })?;
            params.refresh_interval_secs = (secs > 0).then_some(secs);
        }

        params.validate()?;
        Ok(params)
    }

    /// Sidebar values for an error page: whatever the user typed that
    /// parses, the defaults for `today` otherwise.
    pub fn form_state(&self, today: NaiveDate) -> FormState {
        let mut form = FormState::from(&DashboardParams::ending_on(today));
        if let Some(end) = non_empty(&self.end).and_then(|v| parse_date("end", v).ok()) {
            form.end = end;
            form.start = DashboardParams::ending_on(end).start;
        }
        if let Some(start) = non_empty(&self.start).and_then(|v| parse_date("start", v).ok()) {
            form.start = start;
        }
        if let Some(capital) = non_empty(&self.capital).and_then(|v| v.parse::<f64>().ok()) {
            if capital.is_finite() {
                form.capital = capital;
            }
        }
        if let Some(refresh) = non_empty(&self.refresh).and_then(|v| v.parse::<u32>().ok()) {
            form.refresh_secs = refresh;
        }
        form
    }
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        CoreError::ValidationError(format!("{field} must be a YYYY-MM-DD date, got {value:?}"))
    })
}

/// HTTP status for a failed render.
pub fn status_for(err: &CoreError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if err.is_upstream_error() {
        StatusCode::BAD_GATEWAY
    } else {
        match err {
            CoreError::Deserialization(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health))
        .route("/api/dashboard", get(dashboard_json))
        .route("/api/cache/clear", post(clear_cache))
        .with_state(state)
}

pub async fn run_server(host: &str, port: u16, dashboard: PortfolioDashboard) -> Result<()> {
    let app = router(AppState::new(dashboard));

    let addr = format!("{host}:{port}");
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn render_snapshot(
    state: &AppState,
    query: &DashboardQuery,
) -> Result<DashboardSnapshot, (StatusCode, CoreError, Option<DashboardParams>)> {
    let today = Utc::now().date_naive();
    let params = query
        .to_params(today)
        .map_err(|e| (status_for(&e), e, None))?;

    let mut dashboard = state.dashboard.lock().await;
    dashboard.render(&params).await.map_err(|e| {
        let status = status_for(&e);
        if status.is_server_error() {
            error!("Render failed: {e}");
        } else {
            warn!("Render rejected: {e}");
        }
        (status, e, Some(params))
    })
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> (StatusCode, Html<String>) {
    match render_snapshot(&state, &query).await {
        Ok(snapshot) => (StatusCode::OK, Html(render::render_dashboard(&snapshot))),
        Err((status, err, params)) => {
            let form = match params {
                Some(params) => FormState::from(&params),
                None => query.form_state(Utc::now().date_naive()),
            };
            (
                status,
                Html(render::render_error(&state.title, &form, &err.to_string())),
            )
        }
    }
}

async fn dashboard_json(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardSnapshot>, (StatusCode, Json<ApiError>)> {
    render_snapshot(&state, &query)
        .await
        .map(Json)
        .map_err(|(status, err, _)| api_err(status, &err.to_string()))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    let mut dashboard = state.dashboard.lock().await;
    let stats = dashboard.cache_stats();
    dashboard.invalidate_cache();
    Json(serde_json::json!({ "cleared": stats.entries, "hits": stats.hits, "misses": stats.misses }))
}

fn api_err(status: StatusCode, message: &str) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.to_string(),
        }),
    )
}
