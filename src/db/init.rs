//! Schema creation
//!
//! Idempotent `CREATE TABLE IF NOT EXISTS` statements, safe to run on
//! every startup. CHECK constraints mirror the write-time validation in
//! the store layer.

use crate::Result;
use sqlx::SqlitePool;

/// Create all tables and indexes
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_learning_sets_table(pool).await?;
    create_vocabulary_table(pool).await?;
    create_cues_table(pool).await?;
    create_sentences_table(pool).await?;
    create_ai_configs_table(pool).await?;
    create_generation_runs_table(pool).await?;
    Ok(())
}

async fn create_learning_sets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learning_sets (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            full_text TEXT NOT NULL,
            owner TEXT NOT NULL DEFAULT 'public',
            sequence INTEGER NOT NULL DEFAULT 10,
            audio_file BLOB,
            audio_filename TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_learning_sets_name ON learning_sets(name)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_vocabulary_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS vocabulary (
            id INTEGER PRIMARY KEY,
            learning_set_id INTEGER NOT NULL REFERENCES learning_sets(id) ON DELETE CASCADE,
            word TEXT NOT NULL,
            translation TEXT NOT NULL,
            example TEXT NOT NULL DEFAULT '',
            common_mistake TEXT NOT NULL DEFAULT '',
            lambda REAL NOT NULL DEFAULT 10.0,
            sequence INTEGER NOT NULL DEFAULT 10,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_vocabulary_set ON vocabulary(learning_set_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_cues_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cues (
            id INTEGER PRIMARY KEY,
            vocabulary_id INTEGER NOT NULL REFERENCES vocabulary(id) ON DELETE CASCADE,
            cue_type TEXT NOT NULL DEFAULT 'text',
            text TEXT NOT NULL,
            strength REAL NOT NULL DEFAULT 0.0,
            sequence INTEGER NOT NULL DEFAULT 10,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (strength >= 0.0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_cues_vocabulary ON cues(vocabulary_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_sentences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sentences (
            id INTEGER PRIMARY KEY,
            learning_set_id INTEGER NOT NULL REFERENCES learning_sets(id) ON DELETE CASCADE,
            sentence_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            sentence TEXT NOT NULL,
            prediction_question TEXT NOT NULL DEFAULT '',
            wrong_options TEXT NOT NULL DEFAULT '',
            correct_answer TEXT NOT NULL DEFAULT '',
            explanation TEXT NOT NULL DEFAULT '',
            grammar_pattern TEXT NOT NULL DEFAULT '',
            grammar_breakdown TEXT NOT NULL DEFAULT '',
            lambda REAL NOT NULL DEFAULT 10.0,
            sequence INTEGER NOT NULL DEFAULT 10,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sentences_set ON sentences(learning_set_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_ai_configs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS ai_configs (
            id INTEGER PRIMARY KEY,
            provider_name TEXT NOT NULL,
            provider_kind TEXT NOT NULL CHECK (provider_kind IN ('openai', 'gemini', 'deepseek', 'anthropic', 'custom')),
            api_url TEXT NOT NULL,
            api_key TEXT NOT NULL,
            model_name TEXT,
            timeout_secs INTEGER NOT NULL DEFAULT 60,
            max_tokens INTEGER NOT NULL DEFAULT 4000,
            temperature REAL NOT NULL DEFAULT 0.7,
            active INTEGER NOT NULL DEFAULT 1,
            is_default INTEGER NOT NULL DEFAULT 0,
            test_status TEXT NOT NULL DEFAULT 'not_tested' CHECK (test_status IN ('not_tested', 'success', 'failed')),
            test_message TEXT,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (timeout_secs > 0),
            CHECK (max_tokens > 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_generation_runs_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS generation_runs (
            id INTEGER PRIMARY KEY,
            learning_set_id INTEGER NOT NULL REFERENCES learning_sets(id) ON DELETE CASCADE,
            mode TEXT NOT NULL,
            provider_name TEXT NOT NULL,
            model_used TEXT NOT NULL,
            prompt TEXT NOT NULL,
            raw_response TEXT NOT NULL DEFAULT '',
            status TEXT NOT NULL CHECK (status IN ('success', 'error')),
            error_message TEXT,
            tokens_estimated INTEGER NOT NULL DEFAULT 0,
            cost_estimate REAL NOT NULL DEFAULT 0.0,
            response_secs REAL NOT NULL DEFAULT 0.0,
            call_log TEXT NOT NULL DEFAULT '',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_generation_runs_set ON generation_runs(learning_set_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
