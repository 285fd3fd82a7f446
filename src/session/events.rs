//! Session events streamed to observers (terminal renderer, JSON output).

use crate::session::types::{SessionState, Verdict};
use serde::{Deserialize, Serialize};

/// Something observable happened in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        questions: Vec<String>,
    },
    QuestionAsked {
        /// 1-based question number
        number: usize,
        text: String,
    },
    /// A non-question line was spoken (greeting, acknowledgement, summary).
    Spoken {
        text: String,
    },
    FragmentReceived {
        text: String,
    },
    AnswerRecorded {
        number: usize,
        question: String,
        answer: String,
    },
    /// Silence expired with nothing said.
    Reprompted,
    QuestionAdded {
        text: String,
    },
    StateChanged {
        state: SessionState,
    },
    SessionCompleted {
        answered: usize,
        score: Option<u8>,
        verdict: Option<Verdict>,
        location: Option<String>,
    },
}

impl SessionEvent {
    /// Serialize event to a single JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
