// src/error.rs

//! Unified error handling for the sign snapshot pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Every variant is fatal for the batch that raised it.
#[derive(Error, Debug)]
pub enum AppError {
    /// Feed could not be retrieved
    #[error("Fetch error: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Compressed payload is corrupt or truncated
    #[error("Decompress error for {path}: {message}")]
    Decompress { path: String, message: String },

    /// Markup is not well-formed XML
    #[error("Markup error: {0}")]
    Markup(#[from] quick_xml::Error),

    /// Parsed document does not match the expected feed schema
    #[error("Structure error: {0}")]
    Structure(String),

    /// A numeric field carried non-numeric text
    #[error("Parse error in field '{field}': {value:?} is not a valid number")]
    Parse { field: &'static str, value: String },

    /// Snapshot could not be written or read
    #[error("Load error: {0}")]
    Load(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a decompression error for the given artifact.
    pub fn decompress(path: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Decompress {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::Structure(message.into())
    }

    /// Create a numeric parse error.
    pub fn parse(field: &'static str, value: impl Into<String>) -> Self {
        Self::Parse {
            field,
            value: value.into(),
        }
    }

    /// Create a load error.
    pub fn load(message: impl fmt::Display) -> Self {
        Self::Load(message.to_string())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Load(error.to_string())
    }
}
