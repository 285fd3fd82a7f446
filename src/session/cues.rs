//! Keyword heuristics: acknowledgements, follow-up cues, question identity.

use crate::defaults;

/// Technical vocabulary that earns a "got it" acknowledgement.
const TECHNICAL_TERMS: &[&str] = &[
    "xgboost",
    "rag",
    "langchain",
    "aws",
    "terraform",
    "timeseries",
    "arima",
    "llm",
    "kubernetes",
    "sql",
];

/// Collaboration vocabulary that earns an "understood" acknowledgement.
const COLLABORATION_TERMS: &[&str] = &["team", "stakeholder", "client", "collaborat"];

/// Words that show an answer covered its outcome.
const OUTCOME_TERMS: &[&str] = &["impact", "result"];

/// Short acknowledgement spoken before moving on.
pub fn acknowledgement(answer: &str) -> &'static str {
    let words = lowercase_words(answer);
    if TECHNICAL_TERMS
        .iter()
        .any(|term| words.iter().any(|w| w == term))
    {
        "Got it. Thanks."
    } else if COLLABORATION_TERMS
        .iter()
        .any(|term| words.iter().any(|w| w.starts_with(term)))
    {
        "Understood."
    } else {
        "Thanks."
    }
}

/// Follow-up cues derived from the question/answer pair. Empty when the
/// answer needs no nudge.
pub fn follow_up_cues(question: &str, answer: &str) -> Vec<&'static str> {
    let question = question.to_lowercase();
    let answer_lower = answer.to_lowercase();
    let mut cues = Vec::new();

    if question.contains("strength") && answer.split_whitespace().count() < defaults::SHORT_ANSWER_WORDS
    {
        cues.push("Please add one concrete example with measurable impact.");
    }
    if question.contains("challenging problem")
        && !OUTCOME_TERMS.iter().any(|term| answer_lower.contains(term))
    {
        cues.push("Also cover the impact or result in one line.");
    }
    cues
}

/// The utterance spoken between a finalized answer and the next question.
pub fn transition_line(question: &str, answer: &str) -> String {
    let mut line = format!("{} Next question.", acknowledgement(answer));
    for cue in follow_up_cues(question, answer) {
        line.push(' ');
        line.push_str(cue);
    }
    line
}

/// Identity key for duplicate suppression: case, punctuation and spacing
/// differences are ignored.
pub fn question_key(question: &str) -> String {
    question
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether `candidate` duplicates any question already in `questions`.
pub fn is_duplicate(questions: &[String], candidate: &str) -> bool {
    let key = question_key(candidate);
    key.is_empty() || questions.iter().any(|q| question_key(q) == key)
}

fn lowercase_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technical_answer_gets_got_it() {
        assert_eq!(acknowledgement("I built a RAG pipeline on AWS"), "Got it. Thanks.");
    }

    #[test]
    fn collaboration_answer_gets_understood() {
        assert_eq!(
            acknowledgement("I collaborated closely with my team"),
            "Understood."
        );
    }

    #[test]
    fn plain_answer_gets_thanks() {
        assert_eq!(acknowledgement("I like hiking"), "Thanks.");
        // "rag" must not match inside "dragon"
        assert_eq!(acknowledgement("I drew a dragon"), "Thanks.");
    }

    #[test]
    fn short_strength_answer_asks_for_example() {
        let cues = follow_up_cues("What are your top strengths for this role?", "I am diligent.");
        assert_eq!(
            cues,
            vec!["Please add one concrete example with measurable impact."]
        );
    }

    #[test]
    fn long_strength_answer_needs_no_cue() {
        let answer = "I am diligent and I once rebuilt our billing reconciliation so that month end \
                      closing went from five days to one day for the whole finance org";
        assert!(follow_up_cues("What are your strengths?", answer).is_empty());
    }

    #[test]
    fn challenging_problem_without_outcome_asks_for_impact() {
        let cues = follow_up_cues(
            "Describe a challenging problem you solved.",
            "We had a memory leak and I found it with a profiler.",
        );
        assert_eq!(cues, vec!["Also cover the impact or result in one line."]);

        let cues = follow_up_cues(
            "Describe a challenging problem you solved.",
            "The result was a 40% drop in pages.",
        );
        assert!(cues.is_empty());
    }

    #[test]
    fn transition_line_combines_ack_and_cues() {
        assert_eq!(
            transition_line("What is your main strength?", "Teamwork."),
            "Understood. Next question. Please add one concrete example with measurable impact."
        );
        assert_eq!(
            transition_line("Tell me about yourself.", "I like hiking"),
            "Thanks. Next question."
        );
    }

    #[test]
    fn question_key_ignores_case_and_punctuation() {
        assert_eq!(
            question_key("Tell me   about yourself."),
            question_key("tell me about YOURSELF")
        );
    }

    #[test]
    fn duplicates_are_detected() {
        let questions = vec!["Tell me about yourself.".to_string()];
        assert!(is_duplicate(&questions, "TELL ME ABOUT YOURSELF!"));
        assert!(!is_duplicate(&questions, "Describe a project."));
        // Nothing left after normalization counts as unusable.
        assert!(is_duplicate(&questions, " ?! "));
    }
}
