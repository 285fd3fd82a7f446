//! Command-line interface for intervox
//!
//! Provides argument parsing using clap derive macros.

use crate::config::OracleBackend;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Spoken mock interviews in the terminal
#[derive(Parser, Debug)]
#[command(
    name = "intervox",
    version,
    about = "Spoken mock interviews in the terminal",
    long_about = "Runs a spoken mock interview. Answers are read line by line from stdin, \
                  so a speech recogniser can be piped in or the candidate can type."
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Resume used to tailor questions and scoring (.txt, .md, .pdf or .docx)
    #[arg(long, value_name = "PATH")]
    pub resume: Option<PathBuf>,

    /// Job description used to tailor questions and scoring (.txt, .md, .pdf or .docx)
    #[arg(long = "jd", value_name = "PATH")]
    pub job_description: Option<PathBuf>,

    /// Maximum number of questions, opener included
    #[arg(long, value_name = "N")]
    pub max_questions: Option<usize>,

    /// Silence before an answer is taken as finished. Examples: 5s, 1500ms
    #[arg(long, value_name = "DURATION", value_parser = parse_silence)]
    pub silence: Option<Duration>,

    /// Question oracle backend (offline, http)
    #[arg(long, value_name = "BACKEND")]
    pub oracle: Option<OracleBackend>,

    /// Speech synthesizer command (e.g. espeak-ng)
    #[arg(long, value_name = "CMD")]
    pub voice: Option<String>,

    /// Print utterances only, never run the synthesizer
    #[arg(long)]
    pub mute: bool,

    /// Emit session events as JSON lines on stdout
    #[arg(long)]
    pub json: bool,

    /// Directory for transcripts and scorecards
    #[arg(long, value_name = "DIR")]
    pub transcript_dir: Option<PathBuf>,
}

/// Parse a silence duration.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`5s`, `1500ms`, `1m`).
fn parse_silence(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let duration = match s.parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if duration.is_zero() {
        return Err("silence must be positive".to_string());
    }
    Ok(duration)
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
