//! Prompt builders for generation calls
//!
//! All prompts demand JSON-only responses in the import document shape so
//! the orchestrator can feed extracted payloads straight into the codec.

/// Single-call prompt producing vocabulary and sentences together
pub fn complete_prompt(set_name: &str, full_text: &str) -> String {
    format!(
        r#"You are a language-learning content generator. Study the passage below and produce study material for the learning set "{set_name}".

Passage:
{full_text}

Respond with ONLY a JSON object, no prose and no markdown fences, in exactly this shape:
{{
  "description": "one-line summary of the set",
  "vocabulary": [
    {{
      "word": "...",
      "translation": "...",
      "example": "...",
      "commonMistake": "...",
      "cues": [
        {{"type": "phonetic", "text": "..."}},
        {{"type": "context", "text": "..."}},
        {{"type": "synonym", "text": "..."}},
        {{"type": "antonymy", "text": "..."}},
        {{"type": "image", "text": "..."}}
      ]
    }}
  ],
  "sentences": [
    {{
      "id": 1,
      "title": "...",
      "sentence": "...",
      "prediction": {{
        "question": "... ___ ...",
        "wrongOptions": ["...", "..."],
        "correctAnswer": "...",
        "explanation": "..."
      }},
      "grammar": {{"pattern": "...", "breakdown": {{}}}}
    }}
  ]
}}

Select 4 to 8 vocabulary entries that learners of this passage most need, and 4 to 8 practice sentences grounded in the passage. Give every word exactly five cues, one of each type: phonetic (IPA), context (the passage sentence with the word blanked out), synonym, antonymy, image (a short visual description). Number sentence ids from 1."#
    )
}

/// Batch step one: vocabulary only
pub fn vocabulary_prompt(set_name: &str, full_text: &str) -> String {
    format!(
        r#"You are a language-learning content generator. Study the passage below for the learning set "{set_name}" and pick the 4 to 8 vocabulary items learners most need.

Passage:
{full_text}

Respond with ONLY a JSON object, no prose and no markdown fences:
{{
  "vocabulary": [
    {{
      "word": "...",
      "translation": "...",
      "example": "...",
      "commonMistake": "...",
      "cues": [
        {{"type": "phonetic", "text": "..."}},
        {{"type": "context", "text": "..."}},
        {{"type": "synonym", "text": "..."}},
        {{"type": "antonymy", "text": "..."}},
        {{"type": "image", "text": "..."}}
      ]
    }}
  ]
}}

Give every word exactly five cues, one of each type: phonetic (IPA), context (the passage sentence with the word blanked out), synonym, antonymy, image (a short visual description)."#
    )
}

/// Batch step two: sentences, informed by the words already chosen
pub fn sentences_prompt(set_name: &str, full_text: &str, words: &[String]) -> String {
    let word_list = if words.is_empty() {
        "(none yet)".to_string()
    } else {
        words.join(", ")
    };
    format!(
        r#"You are a language-learning content generator. Produce 4 to 8 practice sentences for the learning set "{set_name}" based on the passage below. Prefer sentences exercising these vocabulary words: {word_list}.

Passage:
{full_text}

Respond with ONLY a JSON object, no prose and no markdown fences:
{{
  "sentences": [
    {{
      "id": 1,
      "title": "...",
      "sentence": "...",
      "prediction": {{
        "question": "... ___ ...",
        "wrongOptions": ["...", "..."],
        "correctAnswer": "...",
        "explanation": "..."
      }},
      "grammar": {{"pattern": "...", "breakdown": {{}}}}
    }}
  ]
}}

Number sentence ids from 1."#
    )
}

/// Minimal connectivity probe used by the configuration test endpoint
pub fn test_prompt() -> &'static str {
    "Reply with the single word: ok"
}
