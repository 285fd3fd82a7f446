//! Question oracle: proposes seed and follow-up questions and scores sessions.
//!
//! Every method returns an explicit `Result`, and the follow-up method an
//! `Option`, so "no follow-up" is distinct from a failed request. The engine
//! degrades any error to "no result".

#[cfg(feature = "http-oracle")]
pub mod http;
pub mod offline;

#[cfg(feature = "http-oracle")]
pub use http::HttpOracle;
pub use offline::OfflineOracle;

use crate::error::{IntervoxError, Result};
use crate::session::types::{Scorecard, TranscriptEntry};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Candidate context used for seeding and scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterviewContext {
    pub resume: String,
    pub job_description: String,
}

impl InterviewContext {
    pub fn new(resume: impl Into<String>, job_description: impl Into<String>) -> Self {
        Self {
            resume: resume.into(),
            job_description: job_description.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resume.trim().is_empty() && self.job_description.trim().is_empty()
    }
}

/// Source of questions and feedback.
///
/// Called from engine threads; implementations may block.
pub trait QuestionOracle: Send + Sync {
    /// Propose up to `count` questions from the candidate context.
    fn seed_questions(&self, context: &InterviewContext, count: usize) -> Result<Vec<String>>;

    /// Propose one follow-up question for an answer, or `None`.
    fn follow_up_question(&self, answer: &str) -> Result<Option<String>>;

    /// Score a finished session.
    fn score_and_feedback(
        &self,
        context: &InterviewContext,
        transcript: &[TranscriptEntry],
        pass_threshold: u8,
    ) -> Result<Scorecard>;

    /// Name for logging.
    fn name(&self) -> &'static str {
        "oracle"
    }
}

/// Scripted oracle for tests.
#[derive(Debug, Default)]
pub struct MockOracle {
    seeds: Vec<String>,
    follow_ups: Mutex<VecDeque<Option<String>>>,
    scorecard: Option<Scorecard>,
    fail_seeds: bool,
    fail_follow_ups: bool,
    fail_scoring: bool,
    seed_calls: AtomicUsize,
    follow_up_calls: AtomicUsize,
    score_calls: AtomicUsize,
}

impl MockOracle {
    /// Oracle that proposes nothing and scores 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the questions returned by `seed_questions` (truncated to `count`).
    pub fn with_seeds(mut self, seeds: &[&str]) -> Self {
        self.seeds = seeds.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Queue follow-ups returned in order; `None` entries and an exhausted
    /// queue mean "no follow-up".
    pub fn with_follow_ups(self, follow_ups: &[Option<&str>]) -> Self {
        *self.follow_ups.lock().unwrap_or_else(PoisonError::into_inner) =
            follow_ups.iter().map(|f| f.map(str::to_string)).collect();
        self
    }

    pub fn with_scorecard(mut self, scorecard: Scorecard) -> Self {
        self.scorecard = Some(scorecard);
        self
    }

    pub fn with_seed_failure(mut self) -> Self {
        self.fail_seeds = true;
        self
    }

    pub fn with_follow_up_failure(mut self) -> Self {
        self.fail_follow_ups = true;
        self
    }

    pub fn with_scoring_failure(mut self) -> Self {
        self.fail_scoring = true;
        self
    }

    pub fn seed_calls(&self) -> usize {
        self.seed_calls.load(Ordering::SeqCst)
    }

    pub fn follow_up_calls(&self) -> usize {
        self.follow_up_calls.load(Ordering::SeqCst)
    }

    pub fn score_calls(&self) -> usize {
        self.score_calls.load(Ordering::SeqCst)
    }

    fn failure(what: &str) -> IntervoxError {
        IntervoxError::OracleUnavailable {
            message: format!("mock {what} failure"),
        }
    }
}

impl QuestionOracle for MockOracle {
    fn seed_questions(&self, _context: &InterviewContext, count: usize) -> Result<Vec<String>> {
        self.seed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_seeds {
            return Err(Self::failure("seed"));
        }
        Ok(self.seeds.iter().take(count).cloned().collect())
    }

    fn follow_up_question(&self, _answer: &str) -> Result<Option<String>> {
        self.follow_up_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_follow_ups {
            return Err(Self::failure("follow-up"));
        }
        Ok(self
            .follow_ups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .flatten())
    }

    fn score_and_feedback(
        &self,
        _context: &InterviewContext,
        _transcript: &[TranscriptEntry],
        pass_threshold: u8,
    ) -> Result<Scorecard> {
        self.score_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_scoring {
            return Err(Self::failure("scoring"));
        }
        Ok(self
            .scorecard
            .clone()
            .unwrap_or_else(|| Scorecard::from_score(0, pass_threshold)))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Split a model reply into question lines, stripping list markers such as
/// "1.", "2)", "-", "*" and surrounding quotes.
pub fn parse_question_lines(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| {
            let line = strip_list_number(line.trim());
            let line = line.trim_start().trim_start_matches(['-', '*', '•']);
            line.trim().trim_matches('"').trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// "12. text" and "3) text" lose their number; "3 things" keeps it.
fn strip_list_number(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return line;
    }
    rest.strip_prefix(['.', ')']).unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_oracle_truncates_seeds_to_count() {
        let oracle = MockOracle::new().with_seeds(&["A?", "B?", "C?"]);
        let seeds = oracle
            .seed_questions(&InterviewContext::default(), 2)
            .unwrap();
        assert_eq!(seeds, vec!["A?".to_string(), "B?".to_string()]);
        assert_eq!(oracle.seed_calls(), 1);
    }

    #[test]
    fn mock_oracle_follow_ups_drain_in_order() {
        let oracle = MockOracle::new().with_follow_ups(&[Some("Why?"), None]);
        assert_eq!(oracle.follow_up_question("x").unwrap(), Some("Why?".to_string()));
        assert_eq!(oracle.follow_up_question("x").unwrap(), None);
        assert_eq!(oracle.follow_up_question("x").unwrap(), None);
        assert_eq!(oracle.follow_up_calls(), 3);
    }

    #[test]
    fn mock_oracle_failures_are_errors() {
        let oracle = MockOracle::new()
            .with_seed_failure()
            .with_follow_up_failure()
            .with_scoring_failure();
        assert!(oracle.seed_questions(&InterviewContext::default(), 3).is_err());
        assert!(oracle.follow_up_question("x").is_err());
        assert!(
            oracle
                .score_and_feedback(&InterviewContext::default(), &[], 60)
                .is_err()
        );
    }

    #[test]
    fn parse_question_lines_strips_markers() {
        let reply = "1. Describe a project.\n2) What went wrong?\n\n- \"Why this role?\"\n* Anything else?";
        assert_eq!(
            parse_question_lines(reply),
            vec![
                "Describe a project.".to_string(),
                "What went wrong?".to_string(),
                "Why this role?".to_string(),
                "Anything else?".to_string(),
            ]
        );
    }

    #[test]
    fn parse_question_lines_keeps_leading_numbers_in_text() {
        let reply = "3 things you'd change?\n10. 2024 was busy, why?\n42";
        assert_eq!(
            parse_question_lines(reply),
            vec![
                "3 things you'd change?".to_string(),
                "2024 was busy, why?".to_string(),
                "42".to_string(),
            ]
        );
    }

    #[test]
    fn context_is_empty_when_blank() {
        assert!(InterviewContext::new("  ", "\n").is_empty());
        assert!(!InterviewContext::new("Rust engineer", "").is_empty());
    }
}
