//! Error types for the NovelSeg application.
//!
//! Uses `thiserror` for structured error definitions that provide
//! clear context about what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse config file
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// Missing required configuration value
    #[error("Missing required config value: {0}")]
    MissingValue(String),

    /// Invalid configuration value
    #[error("Invalid config value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Config directory not found
    #[error("Could not determine config directory")]
    NoConfigDir,
}

/// Error type for segment file operations.
#[derive(Error, Debug)]
pub enum RecordError {
    /// Failed to read the segment file
    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The segment file is not a valid sequence of records
    #[error("Malformed segment file {path}: {source}")]
    DecodeError {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A scalar could not be encoded
    #[error("Failed to encode value: {0}")]
    EncodeError(#[from] serde_yaml::Error),

    /// Failed to write the segment file
    #[error("Failed to write {path}: {message}")]
    WriteError { path: PathBuf, message: String },
}

/// Error type for prompt file loading.
#[derive(Error, Debug)]
pub enum PromptError {
    /// Prompt file is missing or unreadable
    #[error("Failed to read prompt file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Error type for translation operations.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// HTTP request to API failed
    #[error("API request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API returned an error response
    #[error("API error: {0}")]
    ApiError(String),

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Translation was refused by the model
    #[error("Translation refused: {0}")]
    Refused(String),

    /// Invalid API configuration
    #[error("Invalid API configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias using anyhow for application-level error handling.
pub type Result<T> = anyhow::Result<T>;
