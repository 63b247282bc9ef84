//! Text-to-speech bridge
//!
//! Sends a set's full text to an external synthesis service, downloads the
//! first audio file it returns, and stores the bytes on the set row. Audio
//! is generated lazily: the first playback request for a set without stored
//! audio triggers synthesis.

use crate::config::TtsConfig;
use crate::db::models::LearningSetRow;
use crate::db::store;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::json;
use sqlx::SqlitePool;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SynthesizedClip {
    url: String,
}

/// Client for the external synthesis endpoint
#[derive(Clone)]
pub struct TtsClient {
    http: reqwest::Client,
    endpoint: String,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl TtsClient {
    pub fn new(http: reqwest::Client, config: &TtsConfig) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    /// Synthesize narration for `set` and store it as `<set name>.mp3`
    pub async fn generate_for_set(&self, pool: &SqlitePool, set: &LearningSetRow) -> Result<()> {
        if set.full_text.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "Learning set '{}' has no full text to narrate",
                set.name
            )));
        }
        tracing::info!(set = %set.name, chars = set.full_text.len(), "Requesting TTS synthesis");

        let audio_url = self.synthesize(&set.full_text).await?;
        let audio = self.download(&audio_url).await?;
        tracing::info!(set = %set.name, bytes = audio.len(), "Storing synthesized audio");

        let filename = format!("{}.mp3", set.name);
        store::store_audio(pool, set.id, &audio, &filename).await
    }

    /// Submit text for synthesis and return the URL of the first clip
    async fn synthesize(&self, text: &str) -> Result<String> {
        let body = json!({
            "language": "en-US",
            "paragraphs": text,
            "splitParagraph": true,
        });
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("TTS request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!("TTS service error {status}: {text}")));
        }

        let clips: Vec<SynthesizedClip> = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("TTS response was not a clip list: {e}")))?;
        clips
            .into_iter()
            .next()
            .map(|c| c.url)
            .ok_or_else(|| Error::Provider("TTS service returned no clips".to_string()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Audio download failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Provider(format!("Audio download error {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Provider(format!("Audio download failed: {e}")))?;
        if bytes.is_empty() {
            return Err(Error::Provider("Audio download was empty".to_string()));
        }
        Ok(bytes.to_vec())
    }
}
