//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Text-to-speech bridge settings
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// TTS API endpoint
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,
    /// Timeout for the synthesis request (seconds)
    #[serde(default = "default_tts_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for downloading the generated audio file (seconds)
    #[serde(default = "default_tts_download_timeout")]
    pub download_timeout_secs: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_tts_endpoint(),
            request_timeout_secs: default_tts_request_timeout(),
            download_timeout_secs: default_tts_download_timeout(),
        }
    }
}

fn default_tts_endpoint() -> String {
    "https://text2audio.cc/api/audio".to_string()
}

fn default_tts_request_timeout() -> u64 {
    30
}

fn default_tts_download_timeout() -> u64 {
    60
}

fn default_bind_addr() -> String {
    "127.0.0.1:5730".to_string()
}

/// Service configuration
///
/// Resolution priority for the data folder:
/// 1. `MNEMO_DATA` environment variable
/// 2. `data_dir` key in the TOML config file
/// 3. OS-dependent compiled default
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Listen address for the HTTP server
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Folder holding the database and AI error side files
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub tts: TtsConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: None,
            tts: TtsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the platform config file, if present
    ///
    /// Missing file is not an error; defaults apply.
    pub fn load() -> Result<Self> {
        let Some(path) = config_file_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Resolve the data folder, creating it if needed
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        let dir = if let Ok(env_dir) = std::env::var("MNEMO_DATA") {
            PathBuf::from(env_dir)
        } else if let Some(dir) = &self.data_dir {
            dir.clone()
        } else {
            default_data_dir()
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Database file path inside the data folder
    pub fn database_path(&self, data_dir: &std::path::Path) -> PathBuf {
        data_dir.join("mnemo.db")
    }
}

fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mnemo").join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mnemo"))
        .unwrap_or_else(|| PathBuf::from("./mnemo_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:5730");
        assert_eq!(config.tts.endpoint, "https://text2audio.cc/api/audio");
        assert_eq!(config.tts.request_timeout_secs, 30);
        assert_eq!(config.tts.download_timeout_secs, 60);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            bind_addr = "0.0.0.0:8080"

            [tts]
            endpoint = "http://localhost:9999/api/audio"
            "#,
        )
        .unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.tts.endpoint, "http://localhost:9999/api/audio");
        assert_eq!(config.tts.request_timeout_secs, 30);
    }
}
