//! intervox - Spoken mock interviews
//!
//! A turn-taking engine that asks questions, collects spoken answers as text
//! fragments, decides when an answer is done, and scores the session.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

#[cfg(feature = "cli")]
pub mod app;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod documents;
pub mod error;
pub mod oracle;
#[cfg(feature = "cli")]
pub mod output;
pub mod session;
pub mod speech;
pub mod transcript;

// Core traits (source → engine → sink)
pub use oracle::QuestionOracle;
pub use speech::{SpeechSink, SpeechSource};
pub use transcript::TranscriptStore;

// Engine
pub use session::{FragmentOutcome, InterviewEngine, SessionEvent, SessionReport, SessionState};

// Error handling
pub use error::{IntervoxError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
