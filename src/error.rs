//! Error types for Svar.

use thiserror::Error;

/// Message shown when a question arrives before any video has been loaded.
pub const NO_INDEX_MESSAGE: &str = "No video has been loaded yet. Please load a video first.";

/// Library-level error type for Svar operations.
#[derive(Error, Debug)]
pub enum SvarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid source: {0}")]
    SourceInvalid(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("No persisted index found at {0}")]
    IndexNotFound(String),

    #[error("{}", NO_INDEX_MESSAGE)]
    NoIndex,

    #[error("The index is being built, please retry shortly")]
    IndexBusy,

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl SvarError {
    /// Whether retrying the same call shortly afterwards may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SvarError::Embedding(_)
                | SvarError::Generation(_)
                | SvarError::IndexBusy
                | SvarError::Http(_)
        )
    }

    /// Whether the message is meant for the end user rather than an operator.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SvarError::SourceInvalid(_)
                | SvarError::TranscriptUnavailable(_)
                | SvarError::NoIndex
                | SvarError::IndexNotFound(_)
                | SvarError::IndexBusy
        )
    }

    /// HTTP status code used when this error crosses the API boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            SvarError::SourceInvalid(_) | SvarError::TranscriptUnavailable(_) => 400,
            SvarError::NoIndex | SvarError::IndexNotFound(_) => 200,
            SvarError::IndexBusy
            | SvarError::Embedding(_)
            | SvarError::Generation(_)
            | SvarError::Http(_) => 503,
            _ => 500,
        }
    }
}

/// Result type alias for Svar operations.
pub type Result<T> = std::result::Result<T, SvarError>;
