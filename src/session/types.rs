//! Data types shared by the turn-taking engine and its collaborators.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle of an interview session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created or restarting; no question has been asked yet.
    Idle,
    /// A question is out and fragments are being collected.
    AwaitingAnswer,
    /// An answer was taken; the next prompt is being prepared.
    Finalizing,
    /// Terminal. Transcript persisted, timer cancelled.
    Complete,
}

impl SessionState {
    /// Whether incoming fragments are processed in this state.
    pub fn accepts_input(self) -> bool {
        self == SessionState::AwaitingAnswer
    }
}

/// One answered question. Never mutated once appended to a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub question: String,
    pub answer: String,
}

impl TranscriptEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Outcome of a scored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Pass,
    Reject,
}

impl Verdict {
    /// Verdict implied by a score against a pass threshold.
    pub fn from_score(score: u8, pass_threshold: u8) -> Self {
        if score >= pass_threshold {
            Verdict::Pass
        } else {
            Verdict::Reject
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Pass"),
            Verdict::Reject => write!(f, "Reject"),
        }
    }
}

/// Structured feedback produced at most once per session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    /// 0..=100
    pub score: u8,
    pub verdict: Verdict,
    pub reasons: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Scorecard {
    /// Builds a scorecard, clamping the score and deriving the verdict.
    pub fn from_score(score: u32, pass_threshold: u8) -> Self {
        let score = score.min(100) as u8;
        Self {
            score,
            verdict: Verdict::from_score(score, pass_threshold),
            reasons: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// One sentence suitable for speaking aloud.
    pub fn spoken_summary(&self) -> String {
        let mut summary = format!(
            "Your score is {} out of 100. Verdict: {}.",
            self.score, self.verdict
        );
        if let Some(suggestion) = self.suggestions.first() {
            summary.push_str(" One suggestion: ");
            summary.push_str(suggestion.trim_end_matches('.'));
            summary.push('.');
        }
        summary
    }
}

/// Everything a finished session produced, handed to the completion callback.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub transcript: Vec<TranscriptEntry>,
    pub scorecard: Option<Scorecard>,
    /// Where the transcript was persisted, if persistence succeeded.
    pub location: Option<PathBuf>,
}

/// Result of handing one recognised fragment to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentOutcome {
    /// Session not accepting input; fragment dropped.
    Ignored,
    /// Appended to the answer buffer; silence timer re-armed.
    Collected,
    Repeated,
    Skipped,
    /// End-of-answer phrase finalized the answer immediately.
    Finalized,
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_awaiting_answer_accepts_input() {
        assert!(SessionState::AwaitingAnswer.accepts_input());
        assert!(!SessionState::Idle.accepts_input());
        assert!(!SessionState::Finalizing.accepts_input());
        assert!(!SessionState::Complete.accepts_input());
    }

    #[test]
    fn verdict_from_score_uses_inclusive_threshold() {
        assert_eq!(Verdict::from_score(60, 60), Verdict::Pass);
        assert_eq!(Verdict::from_score(59, 60), Verdict::Reject);
        assert_eq!(Verdict::from_score(0, 0), Verdict::Pass);
    }

    #[test]
    fn scorecard_clamps_score() {
        let card = Scorecard::from_score(250, 60);
        assert_eq!(card.score, 100);
        assert_eq!(card.verdict, Verdict::Pass);
    }

    #[test]
    fn spoken_summary_mentions_first_suggestion() {
        let mut card = Scorecard::from_score(42, 60);
        card.suggestions = vec!["Quantify your impact.".to_string()];
        assert_eq!(
            card.spoken_summary(),
            "Your score is 42 out of 100. Verdict: Reject. One suggestion: Quantify your impact."
        );
    }

    #[test]
    fn scorecard_serializes_verdict_by_name() {
        let card = Scorecard::from_score(75, 60);
        let json = serde_json::to_string(&card).unwrap();
        assert!(json.contains("\"verdict\":\"Pass\""), "got {json}");
    }
}
