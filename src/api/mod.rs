//! HTTP API handlers for mnemo

pub mod audio;
pub mod data;
pub mod generate;
pub mod import;

pub use audio::{audio_status, generate_audio, get_audio};
pub use data::{get_all_data, get_set_data, list_sets};
pub use generate::{generate_content, test_ai_config};
pub use import::import_document;

use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::Provider(_) | Error::Parse { .. } => StatusCode::BAD_GATEWAY,
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "mnemo".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /api/learning/progress
///
/// Review-progress reporting is not persisted yet; the endpoint accepts
/// the payload so front-ends can ship it unconditionally.
pub async fn record_progress(
    State(_state): State<AppState>,
    _body: Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    Json(json!({"status": "accepted"}))
}
