//! Error types shared by the search engine

use std::path::PathBuf;

/// Result type for engine operations
pub type TsResult<T> = Result<T, TsError>;

/// Engine error types
#[derive(Debug, thiserror::Error)]
pub enum TsError {
    #[error("cannot parse '{value}' as {kind}")]
    InvalidNumber { kind: &'static str, value: String },

    #[error("invalid regular expression: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid structured query '{query}': {message}")]
    InvalidQuery { query: String, message: String },

    #[error("a search query is required for this mode")]
    MissingQuery,

    #[error("unknown helper switch: {0}")]
    UnknownHelper(String),

    #[error("config error at {path}:{line}: {message}")]
    Config {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("editor is not configured; set TS_EDIT_TEXT")]
    EditorNotConfigured,

    #[error("failed to launch {program}: {message}")]
    Launch { program: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
