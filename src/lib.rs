//! mnemo library - language-learning content service
//!
//! Manages learning sets (passage text, vocabulary with recall cues, and
//! practice sentences), a JSON import/export codec for them, AI-driven
//! content generation against configurable providers, and a text-to-speech
//! bridge for narration audio.

use axum::Router;
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::cors::{Any, CorsLayer};

pub mod ai;
pub mod api;
pub mod codec;
pub mod config;
pub mod db;
pub mod error;
pub mod tts;

pub use error::{Error, Result};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Shared HTTP client for AI providers and the TTS service
    pub http: reqwest::Client,
    /// Loaded service configuration
    pub config: config::AppConfig,
    /// Folder holding the database and AI error side files
    pub data_dir: PathBuf,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, config: config::AppConfig, data_dir: PathBuf) -> Self {
        Self {
            db,
            http: reqwest::Client::new(),
            config,
            data_dir,
        }
    }
}

/// Build application router
///
/// Every route is served CORS-open so browser front-ends on other origins
/// can call the API directly.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(api::health_check))
        .route("/api/learning/data", get(api::get_all_data))
        .route("/api/learning/sets", get(api::list_sets))
        .route("/api/learning/set/:id", get(api::get_set_data))
        .route("/api/learning/import", post(api::import_document))
        .route("/api/learning/generate/:id", post(api::generate_content))
        .route("/api/learning/audio/:id", get(api::get_audio))
        .route("/api/learning/audio/test/:id", get(api::audio_status))
        .route("/api/learning/audio/generate/:id", post(api::generate_audio))
        .route("/api/learning/ai/test/:id", post(api::test_ai_config))
        .route("/api/learning/progress", post(api::record_progress))
        .layer(cors)
        .with_state(state)
}
