//! AI provider adapters
//!
//! One request/response mapping per vendor behind a uniform
//! `complete(prompt) -> text` contract. A single failed call aborts the
//! enclosing generation step; no retry or backoff.

use crate::db::models::AiConfigRow;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Provider adapter errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Response envelope missing expected field: {0}")]
    MissingField(&'static str),

    #[error("Unknown provider kind: {0}")]
    UnknownKind(String),
}

impl From<ProviderError> for crate::Error {
    fn from(e: ProviderError) -> Self {
        crate::Error::Provider(e.to_string())
    }
}

/// Supported chat-completion style vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    DeepSeek,
    Anthropic,
    Custom,
}

impl ProviderKind {
    pub fn parse(kind: &str) -> Result<Self, ProviderError> {
        match kind {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            "anthropic" => Ok(Self::Anthropic),
            "custom" => Ok(Self::Custom),
            other => Err(ProviderError::UnknownKind(other.to_string())),
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAi => "gpt-3.5-turbo",
            Self::Gemini => "gemini-pro",
            Self::DeepSeek => "deepseek-chat",
            Self::Anthropic => "claude-3-sonnet-20240229",
            Self::Custom => "custom",
        }
    }

    /// Advisory $/1k-token rate used for the run cost estimate
    pub fn cost_per_1k_tokens(&self) -> f64 {
        match self {
            Self::OpenAi => 0.002,
            Self::Gemini => 0.001,
            Self::DeepSeek => 0.0001,
            Self::Anthropic => 0.003,
            Self::Custom => 0.002,
        }
    }
}

/// Resolved provider settings passed explicitly into the orchestrator
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub provider_name: String,
    pub api_url: String,
    pub api_key: String,
    pub model_name: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl ProviderConfig {
    pub fn from_row(row: &AiConfigRow) -> Result<Self, ProviderError> {
        Ok(Self {
            kind: ProviderKind::parse(&row.provider_kind)?,
            provider_name: row.provider_name.clone(),
            api_url: row.api_url.clone(),
            api_key: row.api_key.clone(),
            model_name: row.model_name.clone(),
            timeout_secs: row.timeout_secs.max(1) as u64,
            max_tokens: row.max_tokens.max(1) as u32,
            temperature: row.temperature,
        })
    }

    /// Model identifier recorded in run bookkeeping
    pub fn model(&self) -> &str {
        self.model_name
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }
}

/// Provider HTTP client
pub struct ProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl ProviderClient {
    pub fn new(http: reqwest::Client, config: ProviderConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Send a prompt and return the generated text
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        tracing::debug!(
            provider = %self.config.provider_name,
            model = %self.config.model(),
            prompt_chars = prompt.len(),
            "Calling AI provider"
        );
        let text = match self.config.kind {
            ProviderKind::OpenAi | ProviderKind::DeepSeek => self.call_chat_completion(prompt).await?,
            ProviderKind::Gemini => self.call_gemini(prompt).await?,
            ProviderKind::Anthropic => self.call_anthropic(prompt).await?,
            ProviderKind::Custom => self.call_custom(prompt).await?,
        };
        tracing::debug!(
            provider = %self.config.provider_name,
            response_chars = text.len(),
            "AI provider call completed"
        );
        Ok(text)
    }

    /// OpenAI-style chat completion (also DeepSeek)
    async fn call_chat_completion(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.config.model(),
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });
        let response = self
            .post_json(&self.config.api_url, &body, &[(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )])
            .await?;
        extract_text(&response, "/choices/0/message/content", "choices[0].message.content")
    }

    /// Google Gemini generate-content
    async fn call_gemini(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}?key={}", self.config.api_url, self.config.api_key);
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "maxOutputTokens": self.config.max_tokens,
                "temperature": self.config.temperature,
            },
        });
        let response = self.post_json(&url, &body, &[]).await?;
        extract_text(
            &response,
            "/candidates/0/content/parts/0/text",
            "candidates[0].content.parts[0].text",
        )
    }

    /// Anthropic messages
    async fn call_anthropic(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.config.model(),
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });
        let response = self
            .post_json(
                &self.config.api_url,
                &body,
                &[
                    ("x-api-key", self.config.api_key.clone()),
                    ("anthropic-version", "2023-06-01".to_string()),
                ],
            )
            .await?;
        extract_text(&response, "/content/0/text", "content[0].text")
    }

    /// Generic custom POST; answer at `response`, then `content`,
    /// falling back to the whole body as text
    async fn call_custom(&self, prompt: &str) -> Result<String, ProviderError> {
        let body = json!({
            "prompt": prompt,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
        });
        let response = self
            .post_json(&self.config.api_url, &body, &[(
                "Authorization",
                format!("Bearer {}", self.config.api_key),
            )])
            .await?;
        if let Some(text) = response.get("response").and_then(Value::as_str) {
            return Ok(text.to_string());
        }
        if let Some(text) = response.get("content").and_then(Value::as_str) {
            return Ok(text.to_string());
        }
        Ok(response.to_string())
    }

    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&'static str, String)],
    ) -> Result<Value, ProviderError> {
        let mut request = self
            .http
            .post(url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), text));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))
    }
}

fn extract_text(
    response: &Value,
    pointer: &str,
    field: &'static str,
) -> Result<String, ProviderError> {
    response
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(ProviderError::MissingField(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_parsing_round_trip() {
        assert_eq!(ProviderKind::parse("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            ProviderKind::parse("anthropic").unwrap(),
            ProviderKind::Anthropic
        );
        assert!(matches!(
            ProviderKind::parse("bard"),
            Err(ProviderError::UnknownKind(_))
        ));
    }

    #[test]
    fn envelope_extraction() {
        let openai = json!({"choices": [{"message": {"content": "hello"}}]});
        assert_eq!(
            extract_text(&openai, "/choices/0/message/content", "f").unwrap(),
            "hello"
        );

        let gemini = json!({"candidates": [{"content": {"parts": [{"text": "hi"}]}}]});
        assert_eq!(
            extract_text(&gemini, "/candidates/0/content/parts/0/text", "f").unwrap(),
            "hi"
        );

        let anthropic = json!({"content": [{"type": "text", "text": "hey"}]});
        assert_eq!(extract_text(&anthropic, "/content/0/text", "f").unwrap(), "hey");

        let empty = json!({"choices": []});
        assert!(matches!(
            extract_text(&empty, "/choices/0/message/content", "f"),
            Err(ProviderError::MissingField(_))
        ));
    }

    #[test]
    fn model_falls_back_to_kind_default() {
        let config = ProviderConfig {
            kind: ProviderKind::DeepSeek,
            provider_name: "DeepSeek".to_string(),
            api_url: "https://api.deepseek.com/chat/completions".to_string(),
            api_key: "sk-test".to_string(),
            model_name: None,
            timeout_secs: 60,
            max_tokens: 4000,
            temperature: 0.7,
        };
        assert_eq!(config.model(), "deepseek-chat");
        assert_eq!(config.kind.cost_per_1k_tokens(), 0.0001);
    }
}
