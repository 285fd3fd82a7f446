//! Offline oracle: a fixed question bank and keyword/length scoring.
//!
//! Used when no language-model endpoint is configured. It never proposes
//! dynamic follow-ups.

use crate::error::Result;
use crate::oracle::{InterviewContext, QuestionOracle};
use crate::session::types::{Scorecard, TranscriptEntry};
use std::collections::HashSet;

/// Behavioural questions asked after the opener, in order.
const QUESTION_BANK: &[&str] = &[
    "What are your top strengths for this role? Give one example.",
    "Describe a challenging problem you solved. What was your approach and impact?",
    "Tell me about a time you worked with a difficult stakeholder or teammate. How did you handle it?",
    "Why do you want this role, and why now?",
    "What's a recent project you're proud of? What was your specific contribution?",
    "Where do you see yourself in the next 2 years, and how does this role help you get there?",
];

/// Words that suggest an answer backs its claims with evidence.
const EVIDENCE_TERMS: &[&str] = &["impact", "result", "improved", "reduced", "increased", "led"];

/// An answer this long earns the full length component.
const FULL_LENGTH_WORDS: usize = 60;

/// Words ignored when extracting job-description keywords.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "you", "our", "are", "will", "have", "that", "this", "from",
    "your", "their", "about", "who", "what", "into", "able", "work", "role", "team",
];

#[derive(Debug, Clone, Default)]
pub struct OfflineOracle;

impl OfflineOracle {
    pub fn new() -> Self {
        Self
    }
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Distinctive job-description words (length > 3, not a stopword).
fn keywords(job_description: &str) -> HashSet<String> {
    words(job_description)
        .filter(|w| w.len() > 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// 0..=100 score for a single answer.
fn answer_score(answer: &str, keywords: &HashSet<String>) -> u32 {
    let answer_words: Vec<String> = words(answer).collect();
    if answer_words.is_empty() {
        return 0;
    }

    let length = (answer_words.len().min(FULL_LENGTH_WORDS) * 50 / FULL_LENGTH_WORDS) as u32;

    let has_number = answer.chars().any(|c| c.is_ascii_digit());
    let has_evidence_term = answer_words
        .iter()
        .any(|w| EVIDENCE_TERMS.iter().any(|t| w.starts_with(t)));
    let evidence = match (has_number, has_evidence_term) {
        (true, true) => 30,
        (true, false) | (false, true) => 15,
        (false, false) => 0,
    };

    let relevance = if keywords.is_empty() {
        10
    } else {
        let hits = answer_words.iter().filter(|w| keywords.contains(*w)).count();
        (hits.min(4) * 5) as u32
    };

    length + evidence + relevance
}

impl QuestionOracle for OfflineOracle {
    fn seed_questions(&self, _context: &InterviewContext, count: usize) -> Result<Vec<String>> {
        Ok(QUESTION_BANK
            .iter()
            .take(count)
            .map(|q| q.to_string())
            .collect())
    }

    fn follow_up_question(&self, _answer: &str) -> Result<Option<String>> {
        Ok(None)
    }

    fn score_and_feedback(
        &self,
        context: &InterviewContext,
        transcript: &[TranscriptEntry],
        pass_threshold: u8,
    ) -> Result<Scorecard> {
        if transcript.is_empty() {
            let mut card = Scorecard::from_score(0, pass_threshold);
            card.reasons.push("No answers were recorded.".to_string());
            card.suggestions
                .push("Answer at least a few questions before ending the interview.".to_string());
            return Ok(card);
        }

        let keywords = keywords(&context.job_description);
        let scores: Vec<u32> = transcript
            .iter()
            .map(|entry| answer_score(&entry.answer, &keywords))
            .collect();
        let total = scores.iter().sum::<u32>() / scores.len() as u32;
        let mut card = Scorecard::from_score(total, pass_threshold);

        let short = transcript
            .iter()
            .filter(|e| e.answer.split_whitespace().count() < 15)
            .count();
        let quantified = transcript
            .iter()
            .filter(|e| e.answer.chars().any(|c| c.is_ascii_digit()))
            .count();

        card.reasons.push(format!(
            "Answered {} question{}.",
            transcript.len(),
            if transcript.len() == 1 { "" } else { "s" }
        ));
        if short > 0 {
            card.reasons
                .push(format!("{short} answer(s) were very brief."));
            card.suggestions
                .push("Expand short answers with context, action and outcome.".to_string());
        }
        if quantified == 0 {
            card.reasons
                .push("No answer quantified its results.".to_string());
            card.suggestions
                .push("Quantify your impact with concrete numbers.".to_string());
        } else {
            card.reasons
                .push(format!("{quantified} answer(s) included concrete numbers."));
        }
        if !keywords.is_empty() {
            let mentioned: HashSet<String> = transcript
                .iter()
                .flat_map(|e| words(&e.answer).collect::<Vec<_>>())
                .filter(|w| keywords.contains(w))
                .collect();
            if mentioned.is_empty() {
                card.suggestions.push(
                    "Tie your examples to the skills named in the job description.".to_string(),
                );
            } else {
                card.reasons.push(format!(
                    "Touched on {} job-description keyword(s).",
                    mentioned.len()
                ));
            }
        }

        Ok(card)
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
