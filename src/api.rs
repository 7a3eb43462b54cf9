use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::catalog::CatalogService;
use crate::models::{ConversionCandidate, ConversionResult};
use crate::transform::ClientSeries;

/// Start the REST API server
pub async fn start_server(catalog: Arc<CatalogService>, host: String, port: u16) -> anyhow::Result<()> {
    let state = ApiState { catalog };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("REST API server starting on http://{}", addr);
    eprintln!("\x1b[32m✓\x1b[0m Server listening on \x1b[1mhttp://{}\x1b[0m", addr);
    eprintln!("\x1b[36m  • Health check:\x1b[0m http://{}/health", addr);
    eprintln!("\x1b[36m  • Series:\x1b[0m       http://{}/series\n", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared application state accessible to all API handlers
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
}

/// Body of `POST /series/convert`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub file_paths: Option<Vec<String>>,
}

/// Payload of `GET /series/:id`
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDetail {
    pub series: ClientSeries,
    pub series_id: String,
    pub episodes_to_convert: Vec<ConversionCandidate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// Uniform error envelope: `{ success: false, error: { code, message } }`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{}: {}", context, err),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            success: false,
            error: ErrorBody {
                code: self.status.as_u16(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Create the API router with all routes
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/series", get(list_series))
        .route("/series/refresh", get(refresh_series))
        .route("/series/convert", get(list_conversion_candidates).post(convert_episodes))
        .route("/series/:id", get(get_series_detail))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn list_series(State(state): State<ApiState>) -> Result<Json<Vec<ClientSeries>>, ApiError> {
    let series = state
        .catalog
        .get_series(false)
        .await
        .map_err(|e| ApiError::internal("Failed to load series", e))?;
    Ok(Json(series.as_ref().clone()))
}

async fn refresh_series(State(state): State<ApiState>) -> Result<Json<Vec<ClientSeries>>, ApiError> {
    let series = state
        .catalog
        .get_series(true)
        .await
        .map_err(|e| ApiError::internal("Failed to refresh series folders", e))?;
    Ok(Json(series.as_ref().clone()))
}

async fn get_series_detail(
    State(state): State<ApiState>,
    Path(series_id): Path<String>,
) -> Result<Json<SeriesDetail>, ApiError> {
    let series = state
        .catalog
        .get_series_by_id(&series_id, false)
        .await
        .map_err(|e| ApiError::internal("Failed to load series", e))?
        .ok_or_else(|| ApiError::not_found(format!("Series {} not found", series_id)))?;

    let candidates = state
        .catalog
        .get_conversion_candidates()
        .await
        .map_err(|e| ApiError::internal("Failed to check for conversion candidates", e))?;

    let episodes_to_convert = candidates
        .into_iter()
        .filter(|c| c.series_name == series.name)
        .collect();

    Ok(Json(SeriesDetail {
        series,
        series_id,
        episodes_to_convert,
    }))
}

async fn list_conversion_candidates(
    State(state): State<ApiState>,
) -> Result<Json<Vec<ConversionCandidate>>, ApiError> {
    let candidates = state
        .catalog
        .get_conversion_candidates()
        .await
        .map_err(|e| ApiError::internal("Failed to check for conversion candidates", e))?;
    Ok(Json(candidates))
}

async fn convert_episodes(
    State(state): State<ApiState>,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConversionResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::internal("Failed to convert files", e))?;
    let result = state
        .catalog
        .convert_episode(request.file_paths.as_deref())
        .await
        .map_err(|e| ApiError::internal("Failed to convert files", e))?;
    Ok(Json(result))
}
