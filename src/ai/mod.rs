//! AI generation orchestrator
//!
//! Drives provider calls for a learning set, extracts the JSON payload from
//! the response, imports the generated items, and records a bookkeeping row
//! per run whether it succeeded or failed. Batch mode makes two calls
//! (vocabulary, then sentences); the other modes make one combined call.

pub mod extract;
pub mod prompt;
pub mod provider;

use crate::codec::{self, SentenceDoc, VocabularyDoc, AI_DEFAULTS};
use crate::db::models::LearningSetRow;
use crate::db::store::{self, RunRecord};
use crate::{Error, Result};
use provider::ProviderClient;
use serde::Serialize;
use serde_json::Value;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Instant;

/// How generated content is applied to the set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateMode {
    /// Purge existing vocabulary and sentences, then generate fresh content
    Replace,
    /// Generate and add alongside existing content
    Append,
    /// Generate and add; existing rows are left untouched
    Update,
    /// Two-step generation: vocabulary first, then sentences
    Batch,
}

impl GenerateMode {
    pub fn parse(mode: &str) -> Result<Self> {
        match mode {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            "update" => Ok(Self::Update),
            "batch" => Ok(Self::Batch),
            other => Err(Error::InvalidInput(format!(
                "Unknown generation mode: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
            Self::Update => "update",
            Self::Batch => "batch",
        }
    }

    /// Only replace mode discards what the set already has
    pub fn purges_existing(&self) -> bool {
        matches!(self, Self::Replace)
    }
}

/// Outcome summary returned to the caller of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub mode: &'static str,
    pub provider_name: String,
    pub model_used: String,
    pub vocabulary_added: usize,
    pub sentences_added: usize,
    pub tokens_estimated: i64,
    pub cost_estimate: f64,
    pub response_secs: f64,
}

/// Rough token count: four characters per token
fn estimate_tokens(chars: usize) -> i64 {
    (chars / 4) as i64
}

/// Per-run accounting shared by the single-call and batch paths
struct RunTally {
    started: Instant,
    chars: usize,
    call_log: Vec<String>,
    last_prompt: String,
    last_response: String,
}

impl RunTally {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            chars: 0,
            call_log: Vec::new(),
            last_prompt: String::new(),
            last_response: String::new(),
        }
    }

    fn record_call(&mut self, label: &str, prompt: &str, response: &str) {
        self.chars += prompt.len() + response.len();
        self.call_log.push(format!(
            "{label}: prompt {} chars, response {} chars",
            prompt.len(),
            response.len()
        ));
        self.last_prompt = prompt.to_string();
        self.last_response = response.to_string();
    }

    fn record_failure(&mut self, label: &str, prompt: &str, error: &str) {
        self.chars += prompt.len();
        self.call_log
            .push(format!("{label}: prompt {} chars, failed: {error}", prompt.len()));
        self.last_prompt = prompt.to_string();
    }

    fn tokens(&self) -> i64 {
        estimate_tokens(self.chars)
    }

    fn elapsed_secs(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Orchestrates generation runs against one provider configuration
pub struct Generator {
    pool: SqlitePool,
    data_dir: PathBuf,
    client: ProviderClient,
}

impl Generator {
    pub fn new(pool: SqlitePool, data_dir: PathBuf, client: ProviderClient) -> Self {
        Self {
            pool,
            data_dir,
            client,
        }
    }

    /// Run one generation for `set` and persist its bookkeeping row
    pub async fn run(&self, set: &LearningSetRow, mode: GenerateMode) -> Result<GenerationReport> {
        if set.full_text.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "Learning set '{}' has no full text to generate from",
                set.name
            )));
        }
        tracing::info!(
            set = %set.name,
            mode = mode.as_str(),
            provider = %self.client.config().provider_name,
            "Starting AI generation"
        );

        let mut tally = RunTally::new();
        let outcome = match mode {
            GenerateMode::Batch => self.run_batch(set, &mut tally).await,
            _ => self.run_complete(set, &mut tally).await,
        };

        match outcome {
            Ok((vocabulary_added, sentences_added)) => {
                let report = GenerationReport {
                    mode: mode.as_str(),
                    provider_name: self.client.config().provider_name.clone(),
                    model_used: self.client.config().model().to_string(),
                    vocabulary_added,
                    sentences_added,
                    tokens_estimated: tally.tokens(),
                    cost_estimate: self.cost(&tally),
                    response_secs: tally.elapsed_secs(),
                };
                self.persist_run(set, mode, &tally, "success", None).await;
                tracing::info!(
                    set = %set.name,
                    vocabulary = vocabulary_added,
                    sentences = sentences_added,
                    secs = %format!("{:.2}", report.response_secs),
                    "AI generation completed"
                );
                Ok(report)
            }
            Err(e) => {
                if let Error::Parse { raw, .. } = &e {
                    self.write_error_side_file(&set.name, raw);
                }
                self.persist_run(set, mode, &tally, "error", Some(e.to_string()))
                    .await;
                tracing::warn!(set = %set.name, error = %e, "AI generation failed");
                Err(e)
            }
        }
    }

    /// Single-call path: one prompt yields vocabulary and sentences together
    async fn run_complete(
        &self,
        set: &LearningSetRow,
        tally: &mut RunTally,
    ) -> Result<(usize, usize)> {
        let prompt = prompt::complete_prompt(&set.name, &set.full_text);
        let response = self.call(tally, "complete", &prompt).await?;
        let payload = extract::extract_json(&response)?;
        let (payload, keyed_name) = unwrap_keyed_document(payload);

        let vocabulary = vocabulary_from_payload(&payload, &response)?;
        let sentences = sentences_from_payload(&payload, &response)?;
        codec::import_vocabulary_items(&self.pool, set.id, &vocabulary, AI_DEFAULTS).await?;
        codec::import_sentence_items(&self.pool, set.id, &sentences, AI_DEFAULTS).await?;
        self.apply_identity(set, &payload, keyed_name.as_deref())
            .await?;
        Ok((vocabulary.len(), sentences.len()))
    }

    /// Two-call path. Vocabulary that imported successfully is kept even
    /// when the sentence step fails.
    async fn run_batch(
        &self,
        set: &LearningSetRow,
        tally: &mut RunTally,
    ) -> Result<(usize, usize)> {
        let vocab_prompt = prompt::vocabulary_prompt(&set.name, &set.full_text);
        let vocab_response = self.call(tally, "vocabulary", &vocab_prompt).await?;
        let vocab_payload = extract::extract_json(&vocab_response)?;
        let vocabulary = vocabulary_from_payload(&vocab_payload, &vocab_response)?;
        codec::import_vocabulary_items(&self.pool, set.id, &vocabulary, AI_DEFAULTS).await?;

        let words: Vec<String> = vocabulary.iter().map(|v| v.word.clone()).collect();
        let sentence_prompt = prompt::sentences_prompt(&set.name, &set.full_text, &words);
        let sentence_response = self.call(tally, "sentences", &sentence_prompt).await?;
        let sentence_payload = extract::extract_json(&sentence_response)?;
        let sentences = sentences_from_payload(&sentence_payload, &sentence_response)?;
        codec::import_sentence_items(&self.pool, set.id, &sentences, AI_DEFAULTS).await?;

        Ok((vocabulary.len(), sentences.len()))
    }

    /// Take over name/description when the generated document carries them.
    /// A name-keyed document's key wins over a `name` field in the body.
    async fn apply_identity(
        &self,
        set: &LearningSetRow,
        payload: &Value,
        keyed_name: Option<&str>,
    ) -> Result<()> {
        let map = match payload {
            Value::Object(map) => Some(map),
            _ => None,
        };
        let name = keyed_name
            .or_else(|| map.and_then(|m| m.get("name")).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty());
        let description = map
            .and_then(|m| m.get("description"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty());
        if name.is_none() && description.is_none() {
            return Ok(());
        }
        store::update_set_identity(
            &self.pool,
            set.id,
            name.unwrap_or(&set.name),
            description.unwrap_or(&set.description),
        )
        .await
    }

    async fn call(&self, tally: &mut RunTally, label: &str, prompt: &str) -> Result<String> {
        match self.client.complete(prompt).await {
            Ok(response) => {
                tally.record_call(label, prompt, &response);
                Ok(response)
            }
            Err(e) => {
                tally.record_failure(label, prompt, &e.to_string());
                Err(e.into())
            }
        }
    }

    fn cost(&self, tally: &RunTally) -> f64 {
        tally.tokens() as f64 / 1000.0 * self.client.config().kind.cost_per_1k_tokens()
    }

    async fn persist_run(
        &self,
        set: &LearningSetRow,
        mode: GenerateMode,
        tally: &RunTally,
        status: &str,
        error_message: Option<String>,
    ) {
        let run = RunRecord {
            learning_set_id: set.id,
            mode: mode.as_str().to_string(),
            provider_name: self.client.config().provider_name.clone(),
            model_used: self.client.config().model().to_string(),
            prompt: tally.last_prompt.clone(),
            raw_response: tally.last_response.clone(),
            status: status.to_string(),
            error_message,
            tokens_estimated: tally.tokens(),
            cost_estimate: self.cost(tally),
            response_secs: tally.elapsed_secs(),
            call_log: tally.call_log.join("\n"),
        };
        // Bookkeeping must not mask the run outcome
        if let Err(e) = store::insert_generation_run(&self.pool, &run).await {
            tracing::warn!(error = %e, "Failed to record generation run");
        }
    }

    /// Dump an unparseable response next to the database for inspection
    fn write_error_side_file(&self, set_name: &str, raw: &str) {
        let slug: String = set_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.data_dir.join(format!("ai_error_{slug}_{timestamp}.txt"));
        if let Err(e) = std::fs::write(&path, raw) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write AI error file");
        } else {
            tracing::info!(path = %path.display(), "Saved unparseable AI response");
        }
    }
}

/// Unwrap a response in the export document shape.
///
/// Models asked for a "full document" often answer keyed by set name,
/// `{"<name>": {vocabulary, sentences, ...}}`, with the items one level
/// down. Returns the inner document and the key as the set's new name.
/// Payloads already carrying `vocabulary`/`sentences` at the root pass
/// through untouched.
fn unwrap_keyed_document(payload: Value) -> (Value, Option<String>) {
    let Value::Object(map) = &payload else {
        return (payload, None);
    };
    if map.contains_key("vocabulary") || map.contains_key("sentences") {
        return (payload, None);
    }
    if map.len() == 1 {
        if let Some((name, Value::Object(inner))) = map.iter().next() {
            if inner.contains_key("vocabulary") || inner.contains_key("sentences") {
                return (Value::Object(inner.clone()), Some(name.clone()));
            }
        }
    }
    (payload, None)
}

fn vocabulary_from_payload(payload: &Value, raw: &str) -> Result<Vec<VocabularyDoc>> {
    items_from_payload(payload, "vocabulary", raw)
}

fn sentences_from_payload(payload: &Value, raw: &str) -> Result<Vec<SentenceDoc>> {
    items_from_payload(payload, "sentences", raw)
}

/// Accept `{"<key>": [...]}` or a bare top-level array; a payload without
/// the key yields an empty list rather than an error so the combined
/// document shape stays forgiving.
fn items_from_payload<T: serde::de::DeserializeOwned>(
    payload: &Value,
    key: &str,
    raw: &str,
) -> Result<Vec<T>> {
    let items = match payload {
        Value::Array(_) => payload.clone(),
        Value::Object(map) => match map.get(key) {
            Some(v) => v.clone(),
            None => return Ok(Vec::new()),
        },
        _ => {
            return Err(Error::Parse {
                message: format!("AI payload is not an object or array (wanted '{key}')"),
                raw: raw.to_string(),
            })
        }
    };
    serde_json::from_value(items).map_err(|e| Error::Parse {
        message: format!("AI payload '{key}' has unexpected shape: {e}"),
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mode_parsing_and_purge_semantics() {
        assert_eq!(GenerateMode::parse("replace").unwrap(), GenerateMode::Replace);
        assert_eq!(GenerateMode::parse("batch").unwrap(), GenerateMode::Batch);
        assert!(GenerateMode::parse("refresh").is_err());

        assert!(GenerateMode::Replace.purges_existing());
        assert!(!GenerateMode::Append.purges_existing());
        assert!(!GenerateMode::Update.purges_existing());
        assert!(!GenerateMode::Batch.purges_existing());
    }

    #[test]
    fn payload_accepts_object_or_bare_array() {
        let object = json!({"vocabulary": [{"word": "ache", "cues": []}]});
        let items: Vec<VocabularyDoc> = items_from_payload(&object, "vocabulary", "").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].word, "ache");

        let array = json!([{"word": "posture", "cues": []}]);
        let items: Vec<VocabularyDoc> = items_from_payload(&array, "vocabulary", "").unwrap();
        assert_eq!(items[0].word, "posture");

        let missing = json!({"sentences": []});
        let items: Vec<VocabularyDoc> = items_from_payload(&missing, "vocabulary", "").unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn name_keyed_document_unwraps_to_inner_items() {
        let keyed = json!({
            "Shoulder Pain": {
                "description": "Generated",
                "vocabulary": [{"word": "stiff", "cues": []}],
                "sentences": []
            }
        });
        let (inner, name) = unwrap_keyed_document(keyed);
        assert_eq!(name.as_deref(), Some("Shoulder Pain"));
        let items: Vec<VocabularyDoc> = items_from_payload(&inner, "vocabulary", "").unwrap();
        assert_eq!(items[0].word, "stiff");

        // Root-level items pass through without a name
        let flat = json!({"vocabulary": [], "sentences": []});
        let (same, name) = unwrap_keyed_document(flat.clone());
        assert_eq!(same, flat);
        assert!(name.is_none());

        // A single foreign key that is not a document is left alone
        let other = json!({"note": "no items here"});
        let (same, name) = unwrap_keyed_document(other.clone());
        assert_eq!(same, other);
        assert!(name.is_none());
    }

    #[test]
    fn scalar_payload_is_a_parse_error() {
        let scalar = json!("just text");
        let result: Result<Vec<VocabularyDoc>> =
            items_from_payload(&scalar, "vocabulary", "just text");
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn token_estimate_is_chars_over_four() {
        assert_eq!(estimate_tokens(4000), 1000);
        assert_eq!(estimate_tokens(3), 0);
    }
}
