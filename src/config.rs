//! Configuration management for NovelSeg.
//!
//! Handles loading, saving, and validating configuration from
//! platform-specific config directories.

use crate::error::ConfigError;
use crate::segmenter::{DEFAULT_MAX_CHARS, MAX_CHAPTER_NUMBER};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application name used for config directory.
const APP_NAME: &str = "NovelSeg";

/// Default config filename.
const CONFIG_FILENAME: &str = "config.toml";

/// Placeholder value for unconfigured API keys.
const API_KEY_PLACEHOLDER: &str = "YOUR_API_KEY_HERE";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Translation API configuration.
    pub api: ApiConfig,

    /// Translation behavior settings.
    pub translation: TranslationConfig,

    /// Chapter and segment splitting settings.
    pub segmentation: SegmentationConfig,

    /// File paths.
    pub paths: PathsConfig,
}

/// API configuration for LLM endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key (required).
    pub key: String,

    /// Base URL for the API.
    pub base_url: String,

    /// Model identifier.
    pub model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: API_KEY_PLACEHOLDER.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini-2024-07-18".to_string(),
        }
    }
}

impl ApiConfig {
    /// Checks if the API key is configured (not placeholder).
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty() && self.key != API_KEY_PLACEHOLDER
    }
}

/// Translation behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Upper bound on tokens in each reply.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f64,

    /// Pause after every segment in seconds, whatever the outcome.
    pub delay_between_requests_sec: f64,

    /// Instruction placed before the segment text in the user message.
    pub user_instruction: String,

    /// Stream the reply and show live progress.
    pub stream: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 5000,
            temperature: 0.7,
            delay_between_requests_sec: 135.0,
            user_instruction: "Dịch từ tiếng Trung sang tiếng Việt đoạn văn sau:".to_string(),
            stream: true,
        }
    }
}

/// Chapter and segment splitting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Segment budget in non-whitespace characters.
    pub max_chars: usize,

    /// Highest chapter number accepted from a header.
    pub max_chapter: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_chapter: MAX_CHAPTER_NUMBER,
        }
    }
}

/// File path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Run log written by the translate command.
    pub log_file: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("translation_log.txt"),
        }
    }
}

impl Config {
    /// Returns the platform-specific config directory path.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Returns the full path to the config file.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILENAME))
    }

    /// Loads configuration from the default location.
    ///
    /// If the config file doesn't exist, creates a default one.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Saves configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates the settings used by the split command.
    pub fn validate_segmentation(&self) -> Result<(), ConfigError> {
        if self.segmentation.max_chars == 0 {
            return Err(invalid("segmentation.max_chars", "must be greater than 0"));
        }

        if self.segmentation.max_chapter == 0 {
            return Err(invalid("segmentation.max_chapter", "must be greater than 0"));
        }

        Ok(())
    }

    /// Validates the settings used by the translate command.
    pub fn validate_translation(&self) -> Result<(), ConfigError> {
        if !self.api.is_configured() {
            return Err(ConfigError::MissingValue(
                "api.key (set your API key in config file)".to_string(),
            ));
        }

        let delay = self.translation.delay_between_requests_sec;
        if !delay.is_finite() || delay < 0.0 {
            return Err(invalid(
                "translation.delay_between_requests_sec",
                "must be a non-negative number",
            ));
        }

        if !(0.0..=2.0).contains(&self.translation.temperature) {
            return Err(invalid("translation.temperature", "must be between 0 and 2"));
        }

        Ok(())
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
