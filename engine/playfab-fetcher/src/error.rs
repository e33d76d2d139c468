//! Error types for the fetcher

use thiserror::Error;

/// Result type alias for fetcher operations
pub type Result<T> = std::result::Result<T, FetcherError>;

/// Errors that can occur while resolving, fetching or storing players
#[derive(Error, Debug)]
pub enum FetcherError {
    /// A configuration file, parameter file or manual ID list is missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// PlayFab answered with a non-success status or a body we could not decode
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A required identity field is missing from the decoded payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// Writing a record to the store failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration is present but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("TOML error: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("TOML error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

impl FetcherError {
    /// Create a new not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new upstream error
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
