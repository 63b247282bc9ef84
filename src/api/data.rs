//! Read endpoints: full export, set listing, single-set export

use crate::db::models::SetSummary;
use crate::db::store;
use crate::{codec, AppState, Result};
use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;

/// GET /api/learning/data
///
/// Export every active set keyed by name, in the import document shape.
pub async fn get_all_data(State(state): State<AppState>) -> Result<Json<Value>> {
    let data = codec::export_all(&state.db).await?;
    Ok(Json(data))
}

/// GET /api/learning/sets
pub async fn list_sets(State(state): State<AppState>) -> Result<Json<Vec<SetSummary>>> {
    let summaries = store::list_set_summaries(&state.db).await?;
    Ok(Json(summaries))
}

/// GET /api/learning/set/:id
pub async fn get_set_data(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let data = codec::export_one(&state.db, id).await?;
    Ok(Json(data))
}
