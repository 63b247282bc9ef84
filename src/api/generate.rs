//! AI generation and provider-test endpoints

use crate::ai::provider::{ProviderClient, ProviderConfig};
use crate::ai::{prompt, GenerateMode, GenerationReport, Generator};
use crate::db::store;
use crate::{AppState, Result};
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Explicit provider configuration; the default config when omitted
    pub config_id: Option<i64>,
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "replace".to_string()
}

/// POST /api/learning/generate/:id
pub async fn generate_content(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationReport>> {
    let set = store::get_set(&state.db, id).await?;
    let mode = GenerateMode::parse(&request.mode)?;

    let row = match request.config_id {
        Some(config_id) => store::get_ai_config(&state.db, config_id).await?,
        None => store::get_default_ai_config(&state.db).await?,
    };
    let config = ProviderConfig::from_row(&row)?;
    let client = ProviderClient::new(state.http.clone(), config);
    let generator = Generator::new(state.db.clone(), state.data_dir.clone(), client);

    if mode.purges_existing() {
        store::delete_set_children(&state.db, set.id).await?;
    }

    let report = generator.run(&set, mode).await?;
    Ok(Json(report))
}

/// POST /api/learning/ai/test/:id
///
/// Sends a one-line probe through the configured provider and records the
/// outcome on the configuration row. The probe result is returned either
/// way; only lookup failures become error responses.
pub async fn test_ai_config(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let row = store::get_ai_config(&state.db, id).await?;
    let config = ProviderConfig::from_row(&row)?;
    let provider_name = config.provider_name.clone();
    let client = ProviderClient::new(state.http.clone(), config);

    match client.complete(prompt::test_prompt()).await {
        Ok(response) => {
            store::set_ai_config_test_result(&state.db, id, true, "connection ok").await?;
            tracing::info!(provider = %provider_name, "AI config test passed");
            Ok(Json(json!({
                "status": "success",
                "provider": provider_name,
                "response": response,
            })))
        }
        Err(e) => {
            let message = e.to_string();
            store::set_ai_config_test_result(&state.db, id, false, &message).await?;
            tracing::warn!(provider = %provider_name, error = %message, "AI config test failed");
            Ok(Json(json!({
                "status": "failed",
                "provider": provider_name,
                "error": message,
            })))
        }
    }
}
