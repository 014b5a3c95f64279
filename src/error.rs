//! Error types for AskVox.

use thiserror::Error;

/// Library-level error type for AskVox operations.
#[derive(Error, Debug)]
pub enum VoxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Web search error: {0}")]
    WebSearch(String),

    #[error("Page fetch failed: {0}")]
    PageFetch(String),

    #[error("Upstream returned status {status}: {service}")]
    UpstreamStatus { service: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for AskVox operations.
pub type Result<T> = std::result::Result<T, VoxError>;
