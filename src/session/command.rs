//! Classification of recognised fragments into control commands or answer content.
//!
//! Each fragment is classified exactly once, then the engine matches the
//! result exhaustively. Phrases match case-insensitively anywhere in the
//! fragment, but only as whole words: "quit" stops, "quite" does not.
//! Precedence is fixed: stop, repeat, skip, end-of-answer, content.

use crate::config::InterviewConfig;

/// What a fragment means to the turn-taking engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// End the session now, flushing any partial answer.
    Stop,
    /// Re-emit the current question.
    Repeat,
    /// Discard the current answer and move on.
    Skip,
    /// The candidate signalled they are done. `remainder` is the fragment
    /// with the end phrase removed (possibly empty).
    EndOfAnswer { remainder: String },
    /// Ordinary answer text.
    Content(String),
}

/// Phrase tables used to classify fragments.
#[derive(Debug, Clone)]
pub struct CommandMatcher {
    stop: Vec<String>,
    repeat: Option<String>,
    skip: Option<String>,
    /// Sorted by descending length so "that's it" wins over "it" style overlaps.
    end: Vec<String>,
}

/// Characters stripped from the seams left behind when an end phrase is cut out.
fn is_seam(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '.' | ',' | ';' | ':' | '!' | '?' | '-')
}

/// Straightens typographic apostrophes so "that’s it" matches "that's it".
fn fold_apostrophes(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
}

/// Byte offset of the first occurrence of `phrase` in `text` that is not
/// glued to a neighbouring letter or digit.
fn find_phrase(text: &str, phrase: &str) -> Option<usize> {
    text.match_indices(phrase).map(|(pos, _)| pos).find(|&pos| {
        let before = text[..pos].chars().next_back();
        let after = text[pos + phrase.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn normalize_phrase(phrase: &str) -> Option<String> {
    let phrase = fold_apostrophes(phrase.trim()).to_ascii_lowercase();
    if phrase.is_empty() { None } else { Some(phrase) }
}

impl CommandMatcher {
    pub fn new(config: &InterviewConfig) -> Self {
        Self::from_phrases(
            &config.stop_phrases,
            &config.repeat_phrase,
            &config.skip_phrase,
            &config.end_phrases,
        )
    }

    /// Builds a matcher from raw phrase lists. Blank phrases are dropped; an
    /// empty phrase would otherwise match every fragment.
    pub fn from_phrases(
        stop: &[String],
        repeat: &str,
        skip: &str,
        end: &[String],
    ) -> Self {
        let mut end: Vec<String> = end.iter().filter_map(|p| normalize_phrase(p)).collect();
        end.sort_by_key(|p| std::cmp::Reverse(p.len()));

        Self {
            stop: stop.iter().filter_map(|p| normalize_phrase(p)).collect(),
            repeat: normalize_phrase(repeat),
            skip: normalize_phrase(skip),
            end,
        }
    }

    pub fn classify(&self, fragment: &str) -> Command {
        let folded = fold_apostrophes(fragment.trim());
        // ASCII lowercasing keeps byte offsets aligned with `folded`.
        let lowered = folded.to_ascii_lowercase();

        let matches = |phrase: &String| find_phrase(&lowered, phrase).is_some();

        if self.stop.iter().any(matches) {
            return Command::Stop;
        }
        if self.repeat.as_ref().is_some_and(matches) {
            return Command::Repeat;
        }
        if self.skip.as_ref().is_some_and(matches) {
            return Command::Skip;
        }
        for phrase in &self.end {
            if let Some(pos) = find_phrase(&lowered, phrase) {
                let before = folded[..pos].trim_end_matches(is_seam);
                let after = folded[pos + phrase.len()..].trim_start_matches(is_seam);
                let remainder = [before, after]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ");
                return Command::EndOfAnswer {
                    remainder: remainder.trim_matches(is_seam).to_string(),
                };
            }
        }
        Command::Content(fragment.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> CommandMatcher {
        CommandMatcher::new(&InterviewConfig::default())
    }

    #[test]
    fn stop_phrases_match_case_insensitively() {
        let m = matcher();
        assert_eq!(m.classify("Please STOP INTERVIEW now"), Command::Stop);
        assert_eq!(m.classify("ok, quit"), Command::Stop);
        assert_eq!(m.classify("End interview."), Command::Stop);
    }

    #[test]
    fn repeat_and_skip_match_inside_sentences() {
        let m = matcher();
        assert_eq!(m.classify("Can you repeat the question?"), Command::Repeat);
        assert_eq!(m.classify("Skip."), Command::Skip);
    }

    #[test]
    fn command_words_inside_longer_words_are_content() {
        let m = matcher();
        for text in [
            "I was quite involved in the rollout",
            "We were exiting the market",
            "I skipped the retro that week",
            "It was repeated every sprint",
            "That's items one and two",
        ] {
            assert_eq!(m.classify(text), Command::Content(text.to_string()), "{text}");
        }
    }

    #[test]
    fn command_words_next_to_punctuation_still_match() {
        let m = matcher();
        assert_eq!(m.classify("ok, quit."), Command::Stop);
        assert_eq!(m.classify("(skip)"), Command::Skip);
        assert_eq!(m.classify("exit!"), Command::Stop);
    }

    #[test]
    fn stop_takes_precedence_over_other_commands() {
        let m = matcher();
        assert_eq!(m.classify("skip it, actually just quit"), Command::Stop);
        assert_eq!(m.classify("repeat, no wait, skip"), Command::Repeat);
    }

    #[test]
    fn end_phrase_alone_has_empty_remainder() {
        let m = matcher();
        assert_eq!(
            m.classify("That's it."),
            Command::EndOfAnswer {
                remainder: String::new()
            }
        );
    }

    #[test]
    fn end_phrase_is_removed_from_answer_text() {
        let m = matcher();
        assert_eq!(
            m.classify("We cut costs by 30 percent, that's it"),
            Command::EndOfAnswer {
                remainder: "We cut costs by 30 percent".to_string()
            }
        );
    }

    #[test]
    fn typographic_apostrophe_matches_end_phrase() {
        let m = matcher();
        assert!(matches!(
            m.classify("I think that\u{2019}s all"),
            Command::EndOfAnswer { .. }
        ));
    }

    #[test]
    fn ordinary_text_is_content() {
        let m = matcher();
        assert_eq!(
            m.classify("  I led a migration project "),
            Command::Content("I led a migration project".to_string())
        );
    }

    #[test]
    fn blank_phrases_never_match() {
        let m = CommandMatcher::from_phrases(&["".to_string()], " ", "", &["  ".to_string()]);
        assert_eq!(
            m.classify("hello there"),
            Command::Content("hello there".to_string())
        );
    }

    #[test]
    fn custom_phrases_from_config() {
        let config = InterviewConfig {
            skip_phrase: "next".to_string(),
            end_phrases: vec!["over".to_string()],
            ..InterviewConfig::default()
        };
        let m = CommandMatcher::new(&config);
        assert_eq!(m.classify("next please"), Command::Skip);
        assert_eq!(
            m.classify("and that was my role, over"),
            Command::EndOfAnswer {
                remainder: "and that was my role".to_string()
            }
        );
    }
}
