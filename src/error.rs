//! Error types for the launcher host.

use lantern_query::QueryError;

/// Top-level error type for the launcher host.
#[derive(Debug, thiserror::Error)]
pub enum LanternError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error (history, typeahead, host protocol).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parse or serialize error.
    #[error("TOML error: {0}")]
    Toml(String),

    /// Query engine setup error.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

impl From<toml::de::Error> for LanternError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

impl From<toml::ser::Error> for LanternError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, LanternError>;
