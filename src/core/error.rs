//! Error types for verdure

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Unknown block: {0}")]
    UnknownBlock(String),

    #[error("No generator registered for '{0}'")]
    UnknownGenerator(String),

    #[error("No variant config for '{key}'")]
    UnknownVariant { key: String },

    #[error("Attribute error: {0}")]
    Attribute(String),
}
