//! Transcript persistence.
//!
//! A session is written once on completion; the scorecard is appended to
//! the same artifact afterwards and also stored as structured JSON.

use crate::error::{IntervoxError, Result};
use crate::session::types::{Scorecard, TranscriptEntry};
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Where finished sessions go.
pub trait TranscriptStore: Send + Sync {
    /// Persist a session transcript, returning where it was written.
    fn append_session(&self, transcript: &[TranscriptEntry]) -> Result<PathBuf>;

    /// Attach a scorecard to a previously persisted session.
    fn append_scorecard(&self, location: &Path, scorecard: &Scorecard) -> Result<()>;
}

/// Writes `interview_transcript_<timestamp>.txt` files into a directory.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a fresh transcript file, adding a `_N` suffix when a session
    /// finished within the same second.
    fn create_unique(&self, stamp: &str) -> Result<(PathBuf, File)> {
        for n in 0..1000 {
            let name = if n == 0 {
                format!("interview_transcript_{stamp}.txt")
            } else {
                format!("interview_transcript_{stamp}_{n}.txt")
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(IntervoxError::Transcript {
            message: format!("no free transcript name for {stamp} in {}", self.dir.display()),
        })
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn append_session(&self, transcript: &[TranscriptEntry]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let now = Local::now();
        let (path, mut file) = self.create_unique(&now.format("%Y%m%d_%H%M%S").to_string())?;

        writeln!(file, "Interview transcript ({})", now.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file)?;
        file.write_all(render_transcript(transcript).as_bytes())?;
        file.flush()?;

        debug!(path = %path.display(), entries = transcript.len(), "transcript written");
        Ok(path)
    }

    fn append_scorecard(&self, location: &Path, scorecard: &Scorecard) -> Result<()> {
        let mut file = OpenOptions::new().append(true).open(location)?;
        file.write_all(render_scorecard(scorecard).as_bytes())?;
        file.flush()?;

        let json_path = scorecard_path(location);
        fs::write(&json_path, serde_json::to_string_pretty(scorecard)?)?;

        debug!(path = %json_path.display(), score = scorecard.score, "scorecard written");
        Ok(())
    }
}

/// `<stem>_scorecard.json` next to the transcript.
pub fn scorecard_path(location: &Path) -> PathBuf {
    let stem = location
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "interview".to_string());
    location.with_file_name(format!("{stem}_scorecard.json"))
}

fn render_transcript(transcript: &[TranscriptEntry]) -> String {
    if transcript.is_empty() {
        return "(no answers recorded)\n".to_string();
    }
    let mut out = String::new();
    for (i, entry) in transcript.iter().enumerate() {
        let n = i + 1;
        out.push_str(&format!("Q{n}: {}\nA{n}: {}\n\n", entry.question, entry.answer));
    }
    out
}

fn render_scorecard(scorecard: &Scorecard) -> String {
    let mut out = String::from("\n--- Scorecard ---\n");
    out.push_str(&format!("Score: {}/100\n", scorecard.score));
    out.push_str(&format!("Verdict: {}\n", scorecard.verdict));
    if !scorecard.reasons.is_empty() {
        out.push_str("Reasons:\n");
        for reason in &scorecard.reasons {
            out.push_str(&format!("- {reason}\n"));
        }
    }
    if !scorecard.suggestions.is_empty() {
        out.push_str("Suggestions:\n");
        for suggestion in &scorecard.suggestions {
            out.push_str(&format!("- {suggestion}\n"));
        }
    }
    out
}

/// In-memory store for tests, with failure injection.
#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    sessions: Mutex<Vec<Vec<TranscriptEntry>>>,
    scorecards: Mutex<Vec<(PathBuf, Scorecard)>>,
    fail_sessions: bool,
    fail_scorecards: bool,
    session_calls: AtomicUsize,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `append_session` call fails.
    pub fn with_session_failure(mut self) -> Self {
        self.fail_sessions = true;
        self
    }

    /// Every `append_scorecard` call fails.
    pub fn with_scorecard_failure(mut self) -> Self {
        self.fail_scorecards = true;
        self
    }

    /// Successfully persisted sessions, in order.
    pub fn sessions(&self) -> Vec<Vec<TranscriptEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn scorecards(&self) -> Vec<(PathBuf, Scorecard)> {
        self.scorecards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Attempts, including failed ones.
    pub fn session_calls(&self) -> usize {
        self.session_calls.load(Ordering::SeqCst)
    }
}

impl TranscriptStore for MemoryTranscriptStore {
    fn append_session(&self, transcript: &[TranscriptEntry]) -> Result<PathBuf> {
        self.session_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_sessions {
            return Err(IntervoxError::Transcript {
                message: "mock persistence failure".to_string(),
            });
        }
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.push(transcript.to_vec());
        Ok(PathBuf::from(format!("memory/session_{}.txt", sessions.len())))
    }

    fn append_scorecard(&self, location: &Path, scorecard: &Scorecard) -> Result<()> {
        if self.fail_scorecards {
            return Err(IntervoxError::Transcript {
                message: "mock scorecard failure".to_string(),
            });
        }
        self.scorecards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((location.to_path_buf(), scorecard.clone()));
        Ok(())
    }
}
