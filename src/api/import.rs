//! Document import endpoint

use crate::db::store;
use crate::{codec, AppState, Error, Result};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Document object, or a raw JSON string of one
    pub data: Value,
    #[serde(default)]
    pub overwrite: bool,
}

/// POST /api/learning/import
///
/// Imports one or more sets from a document. Existing names are rejected
/// unless `overwrite` is set, in which case the old sets are deleted first.
pub async fn import_document(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<Value>> {
    // Front-ends sometimes post file contents as a string, BOM included
    let document = match &request.data {
        Value::String(raw) => {
            let raw = raw.trim_start_matches('\u{feff}');
            serde_json::from_str(raw)
                .map_err(|e| Error::InvalidInput(format!("data is not valid JSON: {e}")))?
        }
        other => other.clone(),
    };

    let sets = codec::parse_document(&document)?;
    if sets.is_empty() {
        return Err(Error::InvalidInput(
            "document contains no learning sets".to_string(),
        ));
    }

    if request.overwrite {
        for (name, _) in &sets {
            if let Some(existing) = store::find_set_by_name(&state.db, name).await? {
                tracing::info!(set = %name, id = existing.id, "Overwriting existing set");
                store::delete_set(&state.db, existing.id).await?;
            }
        }
    }

    let imported = codec::import_sets(&state.db, &sets).await?;
    tracing::info!(count = imported.len(), "Import completed");
    Ok(Json(json!({"status": "ok", "imported": imported})))
}
