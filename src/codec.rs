//! JSON codec
//!
//! Bidirectional mapping between the relational content store and the
//! nested document shape the front-end consumes. Wrong-answer options
//! are stored as newline-joined text and the grammar breakdown as a
//! JSON string; both are rebuilt into structured form on export, and
//! the round trip is exact for well-formed documents. Malformed stored
//! grammar JSON degrades to an empty object instead of failing the
//! export.

use crate::db::models::LearningSetRow;
use crate::db::store::{self, NewLearningSet, NewSentence, NewVocabulary};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;

/// Missing lambda on the direct JSON import path.
///
/// The AI import path uses [`AI_DEFAULTS`] (lambda 10) instead. The
/// asymmetry is inherited behavior the front-end depends on; keep the
/// two constants distinct.
pub const IMPORT_DEFAULTS: FieldDefaults = FieldDefaults {
    lambda: 0.1,
    strength: 1.0,
};

/// Missing lambda/strength on the AI generation import path
pub const AI_DEFAULTS: FieldDefaults = FieldDefaults {
    lambda: 10.0,
    strength: 0.0,
};

#[derive(Debug, Clone, Copy)]
pub struct FieldDefaults {
    pub lambda: f64,
    pub strength: f64,
}

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

fn default_owner() -> String {
    "public".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDocument {
    #[serde(rename = "fullText", default)]
    pub full_text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_owner")]
    pub user: String,
    #[serde(rename = "audioUrl", default)]
    pub audio_url: Option<String>,
    #[serde(rename = "audioFilename", default)]
    pub audio_filename: Option<String>,
    #[serde(default)]
    pub vocabulary: Vec<VocabularyDoc>,
    #[serde(default)]
    pub sentences: Vec<SentenceDoc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyDoc {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub cues: Vec<CueDoc>,
    #[serde(default)]
    pub translation: String,
    #[serde(default)]
    pub example: String,
    #[serde(rename = "commonMistake", default)]
    pub common_mistake: String,
    #[serde(default)]
    pub lambda: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueDoc {
    #[serde(rename = "type", default)]
    pub cue_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub strength: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceDoc {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sentence: String,
    #[serde(default)]
    pub prediction: PredictionDoc,
    #[serde(default)]
    pub grammar: GrammarDoc,
    #[serde(default)]
    pub lambda: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionDoc {
    #[serde(default)]
    pub question: String,
    #[serde(rename = "wrongOptions", default)]
    pub wrong_options: Vec<String>,
    #[serde(rename = "correctAnswer", default)]
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrammarDoc {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub breakdown: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Export one set into its document form
pub async fn export_set(pool: &SqlitePool, set: &LearningSetRow) -> Result<SetDocument> {
    let mut vocabulary = Vec::new();
    for vocab in store::list_vocabulary(pool, set.id).await? {
        let cues = store::list_cues(pool, vocab.id)
            .await?
            .into_iter()
            .map(|cue| CueDoc {
                cue_type: cue.cue_type,
                text: cue.text,
                strength: Some(cue.strength),
            })
            .collect();
        vocabulary.push(VocabularyDoc {
            word: vocab.word,
            cues,
            translation: vocab.translation,
            example: vocab.example,
            common_mistake: vocab.common_mistake,
            lambda: Some(vocab.lambda),
        });
    }

    let mut sentences = Vec::new();
    for row in store::list_sentences(pool, set.id).await? {
        let wrong_options = if row.wrong_options.is_empty() {
            Vec::new()
        } else {
            row.wrong_options.split('\n').map(String::from).collect()
        };
        sentences.push(SentenceDoc {
            id: Some(row.sentence_id),
            title: row.title,
            sentence: row.sentence,
            prediction: PredictionDoc {
                question: row.prediction_question,
                wrong_options,
                correct_answer: row.correct_answer,
                explanation: row.explanation,
            },
            grammar: GrammarDoc {
                pattern: row.grammar_pattern,
                breakdown: parse_breakdown(&row.grammar_breakdown),
            },
            lambda: Some(row.lambda),
        });
    }

    Ok(SetDocument {
        full_text: set.full_text.clone(),
        description: Some(set.description.clone()),
        user: set.owner.clone(),
        audio_url: set.audio_url(),
        audio_filename: set.audio_filename.clone(),
        vocabulary,
        sentences,
    })
}

/// Stored grammar breakdown string as a structured object
///
/// Malformed or empty stored JSON degrades to an empty object.
fn parse_breakdown(stored: &str) -> Map<String, Value> {
    if stored.is_empty() {
        return Map::new();
    }
    match serde_json::from_str::<Value>(stored) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Export all active sets, keyed by set name
pub async fn export_all(pool: &SqlitePool) -> Result<Value> {
    let mut result = Map::new();
    for set in store::list_active_sets(pool).await? {
        let doc = export_set(pool, &set).await?;
        result.insert(set.name.clone(), serde_json::to_value(doc)?);
    }
    Ok(Value::Object(result))
}

/// Export a single set, keyed by its name
pub async fn export_one(pool: &SqlitePool, set_id: i64) -> Result<Value> {
    let set = store::get_set(pool, set_id).await?;
    let doc = export_set(pool, &set).await?;
    let mut result = Map::new();
    result.insert(set.name, serde_json::to_value(doc)?);
    Ok(Value::Object(result))
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Parse a document body into named set documents, preserving order
pub fn parse_document(value: &Value) -> Result<Vec<(String, SetDocument)>> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::InvalidInput("document root must be a JSON object".to_string()))?;
    let mut sets = Vec::with_capacity(object.len());
    for (name, set_value) in object {
        let doc: SetDocument = serde_json::from_value(set_value.clone())
            .map_err(|e| Error::InvalidInput(format!("learning set '{name}': {e}")))?;
        sets.push((name.clone(), doc));
    }
    Ok(sets)
}

/// Import named set documents, creating each set with its children
///
/// Fails with [`Error::AlreadyExists`] when an active set shares a name
/// with a document key; the caller is responsible for deleting the
/// conflict first when overwriting was requested. Returns the created
/// set names.
pub async fn import_sets(
    pool: &SqlitePool,
    sets: &[(String, SetDocument)],
) -> Result<Vec<String>> {
    for (name, _) in sets {
        if store::find_set_by_name(pool, name).await?.is_some() {
            return Err(Error::AlreadyExists(name.clone()));
        }
    }

    let mut created = Vec::with_capacity(sets.len());
    for (name, doc) in sets {
        let set_id = store::create_set(
            pool,
            &NewLearningSet {
                name: name.clone(),
                description: doc.description.clone().unwrap_or_else(|| name.clone()),
                full_text: doc.full_text.clone(),
                owner: doc.user.clone(),
            },
        )
        .await?;
        import_vocabulary_items(pool, set_id, &doc.vocabulary, IMPORT_DEFAULTS).await?;
        import_sentence_items(pool, set_id, &doc.sentences, IMPORT_DEFAULTS).await?;
        created.push(name.clone());
    }
    Ok(created)
}

/// Create vocabulary rows with their cues, in document order
pub async fn import_vocabulary_items(
    pool: &SqlitePool,
    set_id: i64,
    items: &[VocabularyDoc],
    defaults: FieldDefaults,
) -> Result<()> {
    for item in items {
        let vocab_id = store::insert_vocabulary(
            pool,
            set_id,
            &NewVocabulary {
                word: item.word.clone(),
                translation: item.translation.clone(),
                example: item.example.clone(),
                common_mistake: item.common_mistake.clone(),
                lambda: item.lambda.unwrap_or(defaults.lambda),
            },
        )
        .await?;
        for cue in &item.cues {
            store::insert_cue(
                pool,
                vocab_id,
                &cue.cue_type,
                &cue.text,
                cue.strength.unwrap_or(defaults.strength),
            )
            .await?;
        }
    }
    Ok(())
}

/// Create sentence rows in document order
///
/// A document entry without an id gets the set's next sequence number.
pub async fn import_sentence_items(
    pool: &SqlitePool,
    set_id: i64,
    items: &[SentenceDoc],
    defaults: FieldDefaults,
) -> Result<()> {
    for item in items {
        store::insert_sentence(
            pool,
            set_id,
            &NewSentence {
                sentence_id: item.id,
                title: item.title.clone(),
                sentence: item.sentence.clone(),
                prediction_question: item.prediction.question.clone(),
                wrong_options: item.prediction.wrong_options.join("\n"),
                correct_answer: item.prediction.correct_answer.clone(),
                explanation: item.prediction.explanation.clone(),
                grammar_pattern: item.grammar.pattern.clone(),
                grammar_breakdown: serialize_breakdown(&item.grammar.breakdown)?,
                lambda: item.lambda.unwrap_or(defaults.lambda),
            },
        )
        .await?;
    }
    Ok(())
}

fn serialize_breakdown(breakdown: &Map<String, Value>) -> Result<String> {
    if breakdown.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(breakdown)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_memory;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "back-pain": {
                "fullText": "Lately, my back has been aching.",
                "description": "Back pain phrases",
                "user": "public",
                "audioUrl": null,
                "audioFilename": null,
                "vocabulary": [
                    {
                        "word": "aching",
                        "cues": [
                            {"type": "phonetic", "text": "/ˈeɪkɪŋ/", "strength": 0.0},
                            {"type": "context", "text": "Lately, my back has been ___.", "strength": 0.5}
                        ],
                        "translation": "hurting with a dull pain",
                        "example": "My legs were aching after the climb.",
                        "commonMistake": "Not a synonym for sharp pain.",
                        "lambda": 10.0
                    }
                ],
                "sentences": [
                    {
                        "id": 1,
                        "title": "Present perfect continuous",
                        "sentence": "Lately, my back has been aching.",
                        "prediction": {
                            "question": "What tense is used and why?",
                            "wrongOptions": [
                                "Simple past (the pain ended)",
                                "Present simple (a habit)"
                            ],
                            "correctAnswer": "Present perfect continuous",
                            "explanation": "An action starting in the past and continuing now."
                        },
                        "grammar": {
                            "pattern": "has been + V-ing",
                            "breakdown": {
                                "Lately": "time adverb",
                                "has been aching": "present perfect continuous"
                            }
                        },
                        "lambda": 10.0
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn export_import_round_trip_is_exact() {
        let pool = connect_memory().await.unwrap();
        let document = sample_document();

        let sets = parse_document(&document).unwrap();
        import_sets(&pool, &sets).await.unwrap();

        let exported = export_all(&pool).await.unwrap();
        assert_eq!(exported, document);
    }

    #[tokio::test]
    async fn import_rejects_existing_set_name_without_creating_rows() {
        let pool = connect_memory().await.unwrap();
        let sets = parse_document(&sample_document()).unwrap();
        import_sets(&pool, &sets).await.unwrap();

        let err = import_sets(&pool, &sets).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(name) if name == "back-pain"));

        let set_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM learning_sets")
            .fetch_one(&pool)
            .await
            .unwrap();
        let vocab_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vocabulary")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((set_count, vocab_count), (1, 1));
    }

    #[tokio::test]
    async fn missing_lambda_defaults_differ_by_path() {
        let pool = connect_memory().await.unwrap();
        let document = json!({
            "defaults": {
                "fullText": "Text.",
                "vocabulary": [{"word": "text", "translation": "words", "cues": []}]
            }
        });
        let sets = parse_document(&document).unwrap();
        import_sets(&pool, &sets).await.unwrap();

        let set = crate::db::store::find_set_by_name(&pool, "defaults")
            .await
            .unwrap()
            .unwrap();
        let vocab = crate::db::store::list_vocabulary(&pool, set.id)
            .await
            .unwrap();
        // Direct import path uses 0.1
        assert_eq!(vocab[0].lambda, 0.1);

        // AI path uses 10
        let items = vec![VocabularyDoc {
            word: "other".to_string(),
            cues: Vec::new(),
            translation: "another".to_string(),
            example: String::new(),
            common_mistake: String::new(),
            lambda: None,
        }];
        import_vocabulary_items(&pool, set.id, &items, AI_DEFAULTS)
            .await
            .unwrap();
        let vocab = crate::db::store::list_vocabulary(&pool, set.id)
            .await
            .unwrap();
        assert_eq!(vocab[1].lambda, 10.0);
    }

    #[tokio::test]
    async fn malformed_stored_grammar_degrades_to_empty_object() {
        let pool = connect_memory().await.unwrap();
        let set_id = crate::db::store::create_set(
            &pool,
            &crate::db::store::NewLearningSet {
                name: "broken".to_string(),
                description: "broken".to_string(),
                full_text: "Text.".to_string(),
                owner: String::new(),
            },
        )
        .await
        .unwrap();
        crate::db::store::insert_sentence(
            &pool,
            set_id,
            &crate::db::store::NewSentence {
                title: "t".to_string(),
                sentence: "s".to_string(),
                grammar_breakdown: "{not valid json".to_string(),
                lambda: 10.0,
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let exported = export_one(&pool, set_id).await.unwrap();
        let breakdown = &exported["broken"]["sentences"][0]["grammar"]["breakdown"];
        assert_eq!(breakdown, &json!({}));
    }

    #[test]
    fn parse_document_rejects_non_object_root() {
        let err = parse_document(&json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
