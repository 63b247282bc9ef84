//! Row models for the content store

use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct LearningSetRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub full_text: String,
    pub owner: String,
    pub sequence: i64,
    pub audio_file: Option<Vec<u8>>,
    pub audio_filename: Option<String>,
    pub active: bool,
}

impl LearningSetRow {
    /// URL the front-end uses to fetch the narration audio, when present
    pub fn audio_url(&self) -> Option<String> {
        if self.audio_file.is_some() && self.audio_filename.is_some() {
            Some(format!("/api/learning/audio/{}", self.id))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VocabularyRow {
    pub id: i64,
    pub learning_set_id: i64,
    pub word: String,
    pub translation: String,
    pub example: String,
    pub common_mistake: String,
    pub lambda: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct CueRow {
    pub id: i64,
    pub vocabulary_id: i64,
    pub cue_type: String,
    pub text: String,
    pub strength: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct SentenceRow {
    pub id: i64,
    pub learning_set_id: i64,
    pub sentence_id: i64,
    pub title: String,
    pub sentence: String,
    pub prediction_question: String,
    pub wrong_options: String,
    pub correct_answer: String,
    pub explanation: String,
    pub grammar_pattern: String,
    pub grammar_breakdown: String,
    pub lambda: f64,
}

#[derive(Debug, Clone, FromRow)]
pub struct AiConfigRow {
    pub id: i64,
    pub provider_name: String,
    pub provider_kind: String,
    pub api_url: String,
    pub api_key: String,
    pub model_name: Option<String>,
    pub timeout_secs: i64,
    pub max_tokens: i64,
    pub temperature: f64,
    pub active: bool,
    pub is_default: bool,
}

/// Set metadata for the listing endpoint
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SetSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub full_text: String,
    pub vocabulary_count: i64,
    pub sentence_count: i64,
    pub user: String,
}
