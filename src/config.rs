use crate::defaults;
use crate::error::{IntervoxError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub interview: InterviewConfig,
    pub speech: SpeechConfig,
    pub oracle: OracleConfig,
    pub transcript: TranscriptConfig,
    pub documents: DocumentsConfig,
}

/// Question sequencing and turn-taking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InterviewConfig {
    /// Upper bound on questions asked, opener included
    pub max_questions: usize,
    /// Silence window before an answer is finalized
    pub silence_timeout_ms: u64,
    pub opener: String,
    /// Ask the oracle for an upfront batch of questions at session start
    pub seed_from_context: bool,
    /// Ask the oracle for a follow-up after each answer
    pub follow_ups: bool,
    pub pass_threshold: u8,
    pub stop_phrases: Vec<String>,
    pub repeat_phrase: String,
    pub skip_phrase: String,
    pub end_phrases: Vec<String>,
    pub greeting: String,
    pub closing: String,
    pub reprompt: String,
    pub farewell: String,
}

/// Speech output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SpeechConfig {
    /// External synthesizer (e.g. "espeak-ng"). None prints utterances only.
    pub command: Option<String>,
    /// Arguments passed before the utterance text
    pub args: Vec<String>,
}

/// Question oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    pub backend: OracleBackend,
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

/// Question oracle backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OracleBackend {
    Offline,
    Http,
}

/// Transcript persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranscriptConfig {
    pub dir: PathBuf,
}

/// Candidate context documents
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct DocumentsConfig {
    pub resume: Option<PathBuf>,
    pub job_description: Option<PathBuf>,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_questions: defaults::MAX_QUESTIONS,
            silence_timeout_ms: defaults::SILENCE_TIMEOUT_MS,
            opener: defaults::OPENER.to_string(),
            seed_from_context: true,
            follow_ups: true,
            pass_threshold: defaults::PASS_THRESHOLD,
            stop_phrases: to_strings(defaults::STOP_PHRASES),
            repeat_phrase: defaults::REPEAT_PHRASE.to_string(),
            skip_phrase: defaults::SKIP_PHRASE.to_string(),
            end_phrases: to_strings(defaults::END_PHRASES),
            greeting: defaults::GREETING.to_string(),
            closing: defaults::CLOSING.to_string(),
            reprompt: defaults::REPROMPT.to_string(),
            farewell: defaults::FAREWELL.to_string(),
        }
    }
}

impl InterviewConfig {
    pub fn silence_timeout(&self) -> Duration {
        Duration::from_millis(self.silence_timeout_ms)
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::Offline,
            endpoint: defaults::ORACLE_ENDPOINT.to_string(),
            model: defaults::ORACLE_MODEL.to_string(),
            api_key_env: defaults::ORACLE_API_KEY_ENV.to_string(),
            timeout_secs: defaults::ORACLE_TIMEOUT_SECS,
        }
    }
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::TRANSCRIPT_DIR),
        }
    }
}

impl std::fmt::Display for OracleBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleBackend::Offline => write!(f, "offline"),
            OracleBackend::Http => write!(f, "http"),
        }
    }
}

impl std::str::FromStr for OracleBackend {
    type Err = IntervoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "offline" => Ok(OracleBackend::Offline),
            "http" => Ok(OracleBackend::Http),
            other => Err(IntervoxError::ConfigInvalidValue {
                key: "oracle.backend".to_string(),
                message: format!("unknown backend '{other}' (expected offline or http)"),
            }),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IntervoxError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                IntervoxError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(IntervoxError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - INTERVOX_MAX_QUESTIONS → interview.max_questions
    /// - INTERVOX_SILENCE_MS → interview.silence_timeout_ms
    /// - INTERVOX_ORACLE → oracle.backend
    /// - INTERVOX_ORACLE_MODEL → oracle.model
    /// - INTERVOX_SPEECH_COMMAND → speech.command
    ///
    /// Empty or unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var("INTERVOX_MAX_QUESTIONS")
            && let Ok(max) = value.trim().parse()
        {
            self.interview.max_questions = max;
        }

        if let Ok(value) = std::env::var("INTERVOX_SILENCE_MS")
            && let Ok(ms) = value.trim().parse()
        {
            self.interview.silence_timeout_ms = ms;
        }

        if let Ok(value) = std::env::var("INTERVOX_ORACLE")
            && let Ok(backend) = value.parse()
        {
            self.oracle.backend = backend;
        }

        if let Ok(model) = std::env::var("INTERVOX_ORACLE_MODEL")
            && !model.is_empty()
        {
            self.oracle.model = model;
        }

        if let Ok(command) = std::env::var("INTERVOX_SPEECH_COMMAND")
            && !command.is_empty()
        {
            self.speech.command = Some(command);
        }

        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| IntervoxError::ConfigInvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.interview.max_questions == 0 {
            return Err(invalid("interview.max_questions", "must be at least 1"));
        }
        if self.interview.silence_timeout_ms == 0 {
            return Err(invalid("interview.silence_timeout_ms", "must be positive"));
        }
        if self.interview.pass_threshold > 100 {
            return Err(invalid("interview.pass_threshold", "must be between 0 and 100"));
        }
        if self.interview.opener.trim().is_empty() {
            return Err(invalid("interview.opener", "must not be empty"));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(invalid("oracle.timeout_secs", "must be positive"));
        }
        Ok(())
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| IntervoxError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/intervox/config.toml on Linux, falling back to the
    /// working directory when no config directory can be determined.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("intervox")
            .join("config.toml")
    }
}
