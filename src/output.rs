//! Terminal rendering of session events.
//!
//! Human mode prints the conversation on stdout; JSON mode prints one event
//! per line for other programs to consume.

use crate::session::events::SessionEvent;
use crate::session::types::Verdict;
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// How events are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human { color: bool },
    Json,
}

/// Render one event for a person, or `None` for events that stay silent.
pub fn format_event(event: &SessionEvent, color: bool) -> Option<String> {
    let line = match event {
        SessionEvent::SessionStarted { questions } => {
            let text = format!("Interview started ({} questions planned)", questions.len());
            paint_dim(text, color)
        }
        SessionEvent::QuestionAsked { number, text } => {
            let label = format!("Q{number}:");
            if color {
                format!("\n{} {}", label.cyan().bold(), text.bold())
            } else {
                format!("\n{label} {text}")
            }
        }
        SessionEvent::Spoken { text } => {
            if color {
                format!("{} {}", "AI:".cyan(), text)
            } else {
                format!("AI: {text}")
            }
        }
        SessionEvent::AnswerRecorded { number, answer, .. } => {
            let text = format!("A{number}: {answer}");
            paint_dim(text, color)
        }
        SessionEvent::QuestionAdded { text } => paint_dim(format!("+ follow-up queued: {text}"), color),
        SessionEvent::SessionCompleted {
            answered,
            score,
            verdict,
            location,
        } => {
            let mut text = format!("Interview complete: {answered} answered");
            if let (Some(score), Some(verdict)) = (score, verdict) {
                let verdict_text = if color {
                    match verdict {
                        Verdict::Pass => verdict.green().bold().to_string(),
                        Verdict::Reject => verdict.red().bold().to_string(),
                    }
                } else {
                    verdict.to_string()
                };
                text.push_str(&format!(", score {score}/100, {verdict_text}"));
            }
            if let Some(location) = location {
                text.push_str(&format!("\nTranscript saved to {location}"));
            }
            text
        }
        SessionEvent::FragmentReceived { .. }
        | SessionEvent::Reprompted
        | SessionEvent::StateChanged { .. } => return None,
    };
    Some(line)
}

fn paint_dim(text: String, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text
    }
}

/// Write one event to stdout in the given mode.
pub fn print_event(event: &SessionEvent, mode: OutputMode) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    match mode {
        OutputMode::Json => {
            let json = event.to_json().map_err(io::Error::other)?;
            writeln!(stdout, "{json}")?;
        }
        OutputMode::Human { color } => {
            if let Some(line) = format_event(event, color) {
                writeln!(stdout, "{line}")?;
            }
        }
    }
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_is_numbered() {
        let event = SessionEvent::QuestionAsked {
            number: 2,
            text: "Describe a project.".to_string(),
        };
        assert_eq!(
            format_event(&event, false).as_deref(),
            Some("\nQ2: Describe a project.")
        );
    }

    #[test]
    fn spoken_lines_are_attributed() {
        let event = SessionEvent::Spoken {
            text: "Thanks. Next question.".to_string(),
        };
        assert_eq!(
            format_event(&event, false).as_deref(),
            Some("AI: Thanks. Next question.")
        );
    }

    #[test]
    fn internal_events_are_silent() {
        assert_eq!(format_event(&SessionEvent::Reprompted, false), None);
        assert_eq!(
            format_event(
                &SessionEvent::FragmentReceived {
                    text: "um".to_string()
                },
                false
            ),
            None
        );
    }

    #[test]
    fn completion_without_score_omits_verdict() {
        let event = SessionEvent::SessionCompleted {
            answered: 1,
            score: None,
            verdict: None,
            location: Some("transcripts/t.txt".to_string()),
        };
        assert_eq!(
            format_event(&event, false).as_deref(),
            Some("Interview complete: 1 answered\nTranscript saved to transcripts/t.txt")
        );
    }

    #[test]
    fn completion_with_score_shows_verdict() {
        let event = SessionEvent::SessionCompleted {
            answered: 3,
            score: Some(72),
            verdict: Some(Verdict::Pass),
            location: None,
        };
        assert_eq!(
            format_event(&event, false).as_deref(),
            Some("Interview complete: 3 answered, score 72/100, Pass")
        );
    }

    #[test]
    fn colored_output_contains_escape_codes() {
        let event = SessionEvent::QuestionAsked {
            number: 1,
            text: "Tell me about yourself.".to_string(),
        };
        let line = format_event(&event, true).unwrap();
        assert!(line.contains("\x1b["), "got {line:?}");
        assert!(line.contains("Tell me about yourself."));
    }
}
