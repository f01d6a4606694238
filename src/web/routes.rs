//! HTTP routes
//!
//! JSON API endpoints plus the embedded front-end.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, CALCULATION_FAILED, EXPORT_FAILED, VISUALIZATION_FAILED};
use super::server::AppState;
use crate::chart::{self, ChartKind, ChartRequest, ChartResponse, ChartStyle};
use crate::distance::{self, BatchResult, Metric, PairwiseResult};
use crate::export::{self, ExportFormat, ExportResponse};

/// Embedded static assets
#[derive(RustEmbed)]
#[folder = "web-assets/"]
struct Assets;

type Payload<T> = Result<Json<T>, JsonRejection>;

/// Body of POST /api/calculate-distance
#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub point_a: Option<Vec<f64>>,
    pub point_b: Option<Vec<f64>>,
    #[serde(rename = "type")]
    pub metric: Option<String>,
}

/// Body of POST /api/batch-calculate
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub points: Option<Vec<Vec<f64>>>,
    #[serde(rename = "type")]
    pub metric: Option<String>,
}

/// Body of POST /api/export-results
#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default = "empty_results")]
    pub results: Value,
    pub format: Option<String>,
}

fn empty_results() -> Value {
    Value::Object(Map::new())
}

/// Everything the API accepts, by name
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub metrics: Vec<&'static str>,
    pub chart_types: Vec<&'static str>,
    pub styles: Vec<&'static str>,
    pub export_formats: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
}

/// Create API routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/calculate-distance", post(calculate_distance))
        .route("/api/batch-calculate", post(batch_calculate))
        .route("/api/generate-visualization", post(generate_visualization))
        .route("/api/export-results", post(export_results))
        .route("/api/options", get(options))
        .route("/health", get(health_check))
}

/// Create static file routes
pub fn static_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index_html))
        .route("/{*path}", get(static_handler))
}

fn parse_metric(name: Option<&str>) -> Result<Metric, ApiError> {
    name.map_or(Ok(Metric::default()), str::parse::<Metric>)
        .map_err(|e| ApiError::failed(CALCULATION_FAILED, e))
}

/// POST /api/calculate-distance - Distance between two points
async fn calculate_distance(payload: Payload<CalculateRequest>) -> Result<Json<PairwiseResult>, ApiError> {
    let Json(request) = payload?;

    let (point_a, point_b) = match (request.point_a, request.point_b) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => (a, b),
        _ => {
            return Err(ApiError::Validation(
                "Both point_a and point_b are required".to_string(),
            ));
        }
    };

    let metric = parse_metric(request.metric.as_deref())?;
    let result = distance::calculate(point_a, point_b, metric)
        .map_err(|e| ApiError::failed(CALCULATION_FAILED, e))?;
    Ok(Json(result))
}

/// POST /api/batch-calculate - Distance matrix for a set of points
async fn batch_calculate(payload: Payload<BatchRequest>) -> Result<Json<BatchResult>, ApiError> {
    let Json(request) = payload?;

    let points = request
        .points
        .ok_or_else(|| ApiError::Validation("points is required".to_string()))?;

    let metric = parse_metric(request.metric.as_deref())?;
    let result = distance::batch_calculate(points, metric)
        .map_err(|e| ApiError::failed(CALCULATION_FAILED, e))?;
    Ok(Json(result))
}

/// POST /api/generate-visualization - Render a chart as base64 PNG
async fn generate_visualization(
    State(state): State<Arc<AppState>>,
    payload: Payload<ChartRequest>,
) -> Result<Json<ChartResponse>, ApiError> {
    let Json(request) = payload?;
    let settings = state.config.visualization.clone();

    let response = tokio::task::spawn_blocking(move || {
        chart::render_chart_with_settings(&request, &settings)
    })
    .await
    .map_err(|e| ApiError::failed(VISUALIZATION_FAILED, e))?
    .map_err(|e| ApiError::failed(VISUALIZATION_FAILED, e))?;

    Ok(Json(response))
}

/// POST /api/export-results - Serialize results in a file format
async fn export_results(
    State(state): State<Arc<AppState>>,
    payload: Payload<ExportRequest>,
) -> Result<Json<ExportResponse>, ApiError> {
    let Json(request) = payload?;
    let format = request.format.as_deref().unwrap_or(ExportFormat::default().name());

    let response = export::export_results_with_settings(&request.results, format, &state.config.export)
        .map_err(|e| ApiError::failed(EXPORT_FAILED, e))?;
    Ok(Json(response))
}

/// GET /api/options - Supported metrics, chart kinds, styles and formats
async fn options() -> Json<OptionsResponse> {
    Json(OptionsResponse {
        metrics: Metric::ALL.iter().map(Metric::name).collect(),
        chart_types: ChartKind::ALL.iter().map(ChartKind::name).collect(),
        styles: ChartStyle::ALL.iter().map(ChartStyle::name).collect(),
        export_formats: ExportFormat::ALL.iter().map(ExportFormat::name).collect(),
    })
}

/// GET /health - Health check endpoint
async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy",
        service: "distance-server",
    })
}

/// GET / - Serve index.html
async fn index_html() -> impl IntoResponse {
    match Assets::get("index.html") {
        Some(content) => Html(content.data.into_owned()).into_response(),
        None => (StatusCode::NOT_FOUND, "index.html not found").into_response(),
    }
}

/// Static file handler for embedded assets
async fn static_handler(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, format!("File not found: {}", path)).into_response(),
    }
}
