//! Narration audio endpoints
//!
//! Audio is synthesized lazily: the first playback request for a set that
//! has text but no stored audio triggers the TTS bridge.

use crate::db::models::LearningSetRow;
use crate::db::store;
use crate::tts::TtsClient;
use crate::{AppState, Error, Result};
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// GET /api/learning/audio/:id
pub async fn get_audio(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Response> {
    let set = store::get_set(&state.db, id).await?;

    let set = if set.audio_file.is_none() {
        if set.full_text.trim().is_empty() {
            return Err(Error::NotFound(format!(
                "learning set '{}' has no audio and no text to narrate",
                set.name
            )));
        }
        tracing::info!(set = %set.name, "No stored audio, generating");
        let tts = TtsClient::new(state.http.clone(), &state.config.tts);
        tts.generate_for_set(&state.db, &set).await?;
        store::get_set(&state.db, id).await?
    } else {
        set
    };

    audio_response(set)
}

fn audio_response(set: LearningSetRow) -> Result<Response> {
    let audio = set
        .audio_file
        .ok_or_else(|| Error::Internal("audio missing after generation".to_string()))?;
    let filename = set
        .audio_filename
        .unwrap_or_else(|| format!("{}.mp3", set.name));

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg".to_string()),
            (header::CACHE_CONTROL, "public, max-age=3600".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{filename}\""),
            ),
        ],
        audio,
    )
        .into_response())
}

/// GET /api/learning/audio/test/:id
///
/// Status probe used by front-ends to decide whether to show a play button.
pub async fn audio_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let set = store::get_set(&state.db, id).await?;
    let has_audio = set.audio_file.is_some();
    let has_text = !set.full_text.trim().is_empty();

    let mut status = json!({
        "id": set.id,
        "name": set.name,
        "has_audio": has_audio,
        "has_text": has_text,
        "can_generate_audio": has_audio || has_text,
    });
    if let Some(audio) = &set.audio_file {
        status["size"] = json!(audio.len());
    }
    if let Some(filename) = &set.audio_filename {
        status["filename"] = json!(filename);
    }
    Ok(Json(status))
}

/// POST /api/learning/audio/generate/:id
///
/// Regenerates narration even when audio is already stored.
pub async fn generate_audio(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>> {
    let set = store::get_set(&state.db, id).await?;
    let tts = TtsClient::new(state.http.clone(), &state.config.tts);
    tts.generate_for_set(&state.db, &set).await?;

    let set = store::get_set(&state.db, id).await?;
    Ok(Json(json!({
        "status": "ok",
        "filename": set.audio_filename,
        "size": set.audio_file.map(|a| a.len()),
    })))
}
