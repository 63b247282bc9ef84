//! Content store queries
//!
//! All write-time validation lives here, in front of the INSERTs: cue
//! strength must be non-negative, at most one active AI config may be
//! the default, and directly uploaded audio must be an MP3 file.

use crate::db::models::{
    AiConfigRow, CueRow, LearningSetRow, SentenceRow, SetSummary, VocabularyRow,
};
use crate::{Error, Result};
use sqlx::SqlitePool;

const SET_COLUMNS: &str = "id, name, description, full_text, owner, sequence, \
                           audio_file, audio_filename, active";

// ---------------------------------------------------------------------------
// Learning sets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewLearningSet {
    pub name: String,
    pub description: String,
    pub full_text: String,
    pub owner: String,
}

pub async fn create_set(pool: &SqlitePool, set: &NewLearningSet) -> Result<i64> {
    let owner = if set.owner.is_empty() {
        "public"
    } else {
        &set.owner
    };
    let result = sqlx::query(
        "INSERT INTO learning_sets (name, description, full_text, owner) VALUES (?, ?, ?, ?)",
    )
    .bind(&set.name)
    .bind(&set.description)
    .bind(&set.full_text)
    .bind(owner)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_set(pool: &SqlitePool, id: i64) -> Result<LearningSetRow> {
    let query = format!("SELECT {SET_COLUMNS} FROM learning_sets WHERE id = ?");
    sqlx::query_as::<_, LearningSetRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("learning set {id}")))
}

pub async fn find_set_by_name(pool: &SqlitePool, name: &str) -> Result<Option<LearningSetRow>> {
    let query =
        format!("SELECT {SET_COLUMNS} FROM learning_sets WHERE name = ? AND active = 1 LIMIT 1");
    Ok(sqlx::query_as::<_, LearningSetRow>(&query)
        .bind(name)
        .fetch_optional(pool)
        .await?)
}

pub async fn list_active_sets(pool: &SqlitePool) -> Result<Vec<LearningSetRow>> {
    let query = format!(
        "SELECT {SET_COLUMNS} FROM learning_sets WHERE active = 1 ORDER BY sequence, name"
    );
    Ok(sqlx::query_as::<_, LearningSetRow>(&query)
        .fetch_all(pool)
        .await?)
}

pub async fn list_set_summaries(pool: &SqlitePool) -> Result<Vec<SetSummary>> {
    Ok(sqlx::query_as::<_, SetSummary>(
        r#"
        SELECT s.id, s.name, s.description, s.full_text, s.owner AS user,
               (SELECT COUNT(*) FROM vocabulary v WHERE v.learning_set_id = s.id) AS vocabulary_count,
               (SELECT COUNT(*) FROM sentences t WHERE t.learning_set_id = s.id) AS sentence_count
        FROM learning_sets s
        WHERE s.active = 1
        ORDER BY s.sequence, s.name
        "#,
    )
    .fetch_all(pool)
    .await?)
}

/// Delete a set; children cascade
pub async fn delete_set(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM learning_sets WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a set's vocabulary (with cues) and sentences, keeping the set
///
/// Used by the AI generation "replace" mode before a fresh import.
pub async fn delete_set_children(pool: &SqlitePool, set_id: i64) -> Result<()> {
    sqlx::query("DELETE FROM vocabulary WHERE learning_set_id = ?")
        .bind(set_id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM sentences WHERE learning_set_id = ?")
        .bind(set_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Overwrite name and description, used when a generated document
/// carries its own identity fields
pub async fn update_set_identity(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    description: &str,
) -> Result<()> {
    sqlx::query("UPDATE learning_sets SET name = ?, description = ? WHERE id = ?")
        .bind(name)
        .bind(description)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Store generated narration audio on a set
pub async fn store_audio(
    pool: &SqlitePool,
    id: i64,
    audio: &[u8],
    filename: &str,
) -> Result<()> {
    sqlx::query("UPDATE learning_sets SET audio_file = ?, audio_filename = ? WHERE id = ?")
        .bind(audio)
        .bind(filename)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Store directly uploaded audio; only `.mp3` files pass validation.
///
/// Backs operator tooling that loads pre-recorded narration instead of
/// synthesizing it; the HTTP surface only serves and regenerates audio,
/// so uploads go through this function directly.
pub async fn upload_audio(
    pool: &SqlitePool,
    id: i64,
    audio: &[u8],
    filename: &str,
) -> Result<()> {
    if !filename.to_lowercase().ends_with(".mp3") {
        return Err(Error::InvalidInput(
            "only MP3 audio files are supported".to_string(),
        ));
    }
    store_audio(pool, id, audio, filename).await
}

// ---------------------------------------------------------------------------
// Vocabulary and cues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewVocabulary {
    pub word: String,
    pub translation: String,
    pub example: String,
    pub common_mistake: String,
    pub lambda: f64,
}

pub async fn insert_vocabulary(
    pool: &SqlitePool,
    set_id: i64,
    vocab: &NewVocabulary,
) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO vocabulary (learning_set_id, word, translation, example, common_mistake, lambda) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(set_id)
    .bind(&vocab.word)
    .bind(&vocab.translation)
    .bind(&vocab.example)
    .bind(&vocab.common_mistake)
    .bind(vocab.lambda)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn insert_cue(
    pool: &SqlitePool,
    vocabulary_id: i64,
    cue_type: &str,
    text: &str,
    strength: f64,
) -> Result<i64> {
    if strength < 0.0 {
        return Err(Error::InvalidInput(format!(
            "cue strength must be non-negative, got {strength}"
        )));
    }
    let result =
        sqlx::query("INSERT INTO cues (vocabulary_id, cue_type, text, strength) VALUES (?, ?, ?, ?)")
            .bind(vocabulary_id)
            .bind(cue_type)
            .bind(text)
            .bind(strength)
            .execute(pool)
            .await?;
    Ok(result.last_insert_rowid())
}

pub async fn list_vocabulary(pool: &SqlitePool, set_id: i64) -> Result<Vec<VocabularyRow>> {
    Ok(sqlx::query_as::<_, VocabularyRow>(
        "SELECT id, learning_set_id, word, translation, example, common_mistake, lambda \
         FROM vocabulary WHERE learning_set_id = ? ORDER BY sequence, id",
    )
    .bind(set_id)
    .fetch_all(pool)
    .await?)
}

pub async fn list_cues(pool: &SqlitePool, vocabulary_id: i64) -> Result<Vec<CueRow>> {
    Ok(sqlx::query_as::<_, CueRow>(
        "SELECT id, vocabulary_id, cue_type, text, strength \
         FROM cues WHERE vocabulary_id = ? ORDER BY sequence, id",
    )
    .bind(vocabulary_id)
    .fetch_all(pool)
    .await?)
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NewSentence {
    /// Unique id within the set; auto-assigned as max+1 when omitted
    pub sentence_id: Option<i64>,
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

pub async fn insert_sentence(
    pool: &SqlitePool,
    set_id: i64,
    sentence: &NewSentence,
) -> Result<i64> {
    let sentence_id = match sentence.sentence_id {
        Some(id) => id,
        None => next_sentence_id(pool, set_id).await?,
    };
    let result = sqlx::query(
        "INSERT INTO sentences (learning_set_id, sentence_id, title, sentence, \
         prediction_question, wrong_options, correct_answer, explanation, \
         grammar_pattern, grammar_breakdown, lambda) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(set_id)
    .bind(sentence_id)
    .bind(&sentence.title)
    .bind(&sentence.sentence)
    .bind(&sentence.prediction_question)
    .bind(&sentence.wrong_options)
    .bind(&sentence.correct_answer)
    .bind(&sentence.explanation)
    .bind(&sentence.grammar_pattern)
    .bind(&sentence.grammar_breakdown)
    .bind(sentence.lambda)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

async fn next_sentence_id(pool: &SqlitePool, set_id: i64) -> Result<i64> {
    let max: Option<i64> =
        sqlx::query_scalar("SELECT MAX(sentence_id) FROM sentences WHERE learning_set_id = ?")
            .bind(set_id)
            .fetch_one(pool)
            .await?;
    Ok(max.unwrap_or(0) + 1)
}

pub async fn list_sentences(pool: &SqlitePool, set_id: i64) -> Result<Vec<SentenceRow>> {
    Ok(sqlx::query_as::<_, SentenceRow>(
        "SELECT id, learning_set_id, sentence_id, title, sentence, prediction_question, \
         wrong_options, correct_answer, explanation, grammar_pattern, grammar_breakdown, lambda \
         FROM sentences WHERE learning_set_id = ? ORDER BY sequence, sentence_id",
    )
    .bind(set_id)
    .fetch_all(pool)
    .await?)
}

// ---------------------------------------------------------------------------
// AI provider configurations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NewAiConfig {
    pub provider_name: String,
    pub provider_kind: String,
    pub api_url: String,
    pub api_key: String,
    pub model_name: Option<String>,
    pub timeout_secs: i64,
    pub max_tokens: i64,
    pub temperature: f64,
    pub is_default: bool,
}

const AI_CONFIG_COLUMNS: &str = "id, provider_name, provider_kind, api_url, api_key, \
                                 model_name, timeout_secs, max_tokens, temperature, \
                                 active, is_default";

pub async fn insert_ai_config(pool: &SqlitePool, config: &NewAiConfig) -> Result<i64> {
    if config.is_default {
        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM ai_configs WHERE is_default = 1 AND active = 1",
        )
        .fetch_one(pool)
        .await?;
        if existing > 0 {
            return Err(Error::InvalidInput(
                "only one default AI provider may be configured".to_string(),
            ));
        }
    }
    let result = sqlx::query(
        "INSERT INTO ai_configs (provider_name, provider_kind, api_url, api_key, model_name, \
         timeout_secs, max_tokens, temperature, is_default) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&config.provider_name)
    .bind(&config.provider_kind)
    .bind(&config.api_url)
    .bind(&config.api_key)
    .bind(&config.model_name)
    .bind(config.timeout_secs)
    .bind(config.max_tokens)
    .bind(config.temperature)
    .bind(config.is_default)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn get_ai_config(pool: &SqlitePool, id: i64) -> Result<AiConfigRow> {
    let query = format!("SELECT {AI_CONFIG_COLUMNS} FROM ai_configs WHERE id = ?");
    sqlx::query_as::<_, AiConfigRow>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("AI config {id}")))
}

/// Default provider, falling back to any active one
pub async fn get_default_ai_config(pool: &SqlitePool) -> Result<AiConfigRow> {
    let query = format!(
        "SELECT {AI_CONFIG_COLUMNS} FROM ai_configs WHERE active = 1 \
         ORDER BY is_default DESC, id LIMIT 1"
    );
    sqlx::query_as::<_, AiConfigRow>(&query)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound("no active AI provider configured".to_string()))
}

pub async fn set_ai_config_test_result(
    pool: &SqlitePool,
    id: i64,
    success: bool,
    message: &str,
) -> Result<()> {
    let status = if success { "success" } else { "failed" };
    sqlx::query("UPDATE ai_configs SET test_status = ?, test_message = ? WHERE id = ?")
        .bind(status)
        .bind(message)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Generation run bookkeeping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub learning_set_id: i64,
    pub mode: String,
    pub provider_name: String,
    pub model_used: String,
    pub prompt: String,
    pub raw_response: String,
    pub status: String,
    pub error_message: Option<String>,
    pub tokens_estimated: i64,
    pub cost_estimate: f64,
    pub response_secs: f64,
    pub call_log: String,
}

pub async fn insert_generation_run(pool: &SqlitePool, run: &RunRecord) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO generation_runs (learning_set_id, mode, provider_name, model_used, prompt, \
         raw_response, status, error_message, tokens_estimated, cost_estimate, response_secs, call_log) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(run.learning_set_id)
    .bind(&run.mode)
    .bind(&run.provider_name)
    .bind(&run.model_used)
    .bind(&run.prompt)
    .bind(&run.raw_response)
    .bind(&run.status)
    .bind(&run.error_message)
    .bind(run.tokens_estimated)
    .bind(run.cost_estimate)
    .bind(run.response_secs)
    .bind(&run.call_log)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;

    fn sample_set(name: &str) -> NewLearningSet {
        NewLearningSet {
            name: name.to_string(),
            description: format!("{name} description"),
            full_text: "Lately, my back has been aching.".to_string(),
            owner: String::new(),
        }
    }

    #[tokio::test]
    async fn sentence_id_auto_assignment() {
        let pool = connect_memory().await.unwrap();
        let set_id = create_set(&pool, &sample_set("autoid")).await.unwrap();

        // Empty set starts at 1
        let sentence = NewSentence {
            title: "first".to_string(),
            sentence: "One.".to_string(),
            ..Default::default()
        };
        insert_sentence(&pool, set_id, &sentence).await.unwrap();
        let rows = list_sentences(&pool, set_id).await.unwrap();
        assert_eq!(rows[0].sentence_id, 1);

        // Existing ids {1, 2, 3} yield 4
        for id in [2, 3] {
            let explicit = NewSentence {
                sentence_id: Some(id),
                title: format!("s{id}"),
                sentence: "Text.".to_string(),
                ..Default::default()
            };
            insert_sentence(&pool, set_id, &explicit).await.unwrap();
        }
        let auto = NewSentence {
            title: "next".to_string(),
            sentence: "Four.".to_string(),
            ..Default::default()
        };
        insert_sentence(&pool, set_id, &auto).await.unwrap();
        let rows = list_sentences(&pool, set_id).await.unwrap();
        assert_eq!(rows.last().unwrap().sentence_id, 4);
    }

    #[tokio::test]
    async fn negative_cue_strength_rejected() {
        let pool = connect_memory().await.unwrap();
        let set_id = create_set(&pool, &sample_set("strength")).await.unwrap();
        let vocab = NewVocabulary {
            word: "ache".to_string(),
            translation: "pain".to_string(),
            example: String::new(),
            common_mistake: String::new(),
            lambda: 10.0,
        };
        let vocab_id = insert_vocabulary(&pool, set_id, &vocab).await.unwrap();

        let err = insert_cue(&pool, vocab_id, "phonetic", "/eɪk/", -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // Nothing persisted
        assert!(list_cues(&pool, vocab_id).await.unwrap().is_empty());

        insert_cue(&pool, vocab_id, "phonetic", "/eɪk/", 0.0)
            .await
            .unwrap();
        assert_eq!(list_cues(&pool, vocab_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn only_one_default_ai_config() {
        let pool = connect_memory().await.unwrap();
        let config = NewAiConfig {
            provider_name: "OpenAI".to_string(),
            provider_kind: "openai".to_string(),
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: "sk-test".to_string(),
            model_name: None,
            timeout_secs: 60,
            max_tokens: 4000,
            temperature: 0.7,
            is_default: true,
        };
        insert_ai_config(&pool, &config).await.unwrap();

        let second = NewAiConfig {
            provider_name: "DeepSeek".to_string(),
            provider_kind: "deepseek".to_string(),
            ..config
        };
        let err = insert_ai_config(&pool, &second).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        // A non-default second config is fine
        let non_default = NewAiConfig {
            is_default: false,
            ..second
        };
        insert_ai_config(&pool, &non_default).await.unwrap();
    }

    #[tokio::test]
    async fn delete_set_cascades_to_children() {
        let pool = connect_memory().await.unwrap();
        let set_id = create_set(&pool, &sample_set("cascade")).await.unwrap();
        let vocab = NewVocabulary {
            word: "back".to_string(),
            translation: "rear".to_string(),
            example: String::new(),
            common_mistake: String::new(),
            lambda: 10.0,
        };
        let vocab_id = insert_vocabulary(&pool, set_id, &vocab).await.unwrap();
        insert_cue(&pool, vocab_id, "image", "🔙", 0.0).await.unwrap();
        insert_sentence(
            &pool,
            set_id,
            &NewSentence {
                title: "t".to_string(),
                sentence: "s".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete_set(&pool, set_id).await.unwrap();

        let vocab_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vocabulary")
            .fetch_one(&pool)
            .await
            .unwrap();
        let cues_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cues")
            .fetch_one(&pool)
            .await
            .unwrap();
        let sentences_left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sentences")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((vocab_left, cues_left, sentences_left), (0, 0, 0));
    }

    #[tokio::test]
    async fn non_mp3_upload_rejected() {
        let pool = connect_memory().await.unwrap();
        let set_id = create_set(&pool, &sample_set("audio")).await.unwrap();

        let err = upload_audio(&pool, set_id, b"RIFF", "narration.wav")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        upload_audio(&pool, set_id, b"ID3", "narration.MP3")
            .await
            .unwrap();
        let set = get_set(&pool, set_id).await.unwrap();
        assert_eq!(set.audio_filename.as_deref(), Some("narration.MP3"));
        assert!(set.audio_url().is_some());
    }
}
