//! Error types for the Misty voice loop

use thiserror::Error;

/// Result type alias for Misty voice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the conversation loop
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device or encoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text service error
    #[error("STT error: {0}")]
    Stt(String),

    /// Completion service error
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Robot did not answer the startup probe
    #[error("robot unreachable, check the IP and network connection")]
    RobotUnreachable,

    /// Interactive prompt error
    #[error("prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
