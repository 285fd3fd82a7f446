//! Error types for intervox.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntervoxError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Speech errors
    #[error("Speech tool not found: {tool}")]
    SpeechToolNotFound { tool: String },

    #[error("Speech synthesis failed: {message}")]
    SpeechFailed { message: String },

    #[error("Speech worker is not running")]
    SpeechWorkerStopped,

    #[error("Speech source failed: {message}")]
    SpeechSource { message: String },

    // Question oracle errors
    #[error("Question oracle unavailable: {message}")]
    OracleUnavailable { message: String },

    #[error("Question oracle request failed: {message}")]
    OracleRequest { message: String },

    #[error("Question oracle returned an unusable reply: {message}")]
    OracleReply { message: String },

    // Persistence errors
    #[error("Transcript persistence failed: {message}")]
    Transcript { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, IntervoxError>;
