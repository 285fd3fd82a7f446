//! Default configuration constants for intervox.
//!
//! Shared by the config layer, the engine and the test doubles so the spoken
//! wording and the timing defaults live in one place.

/// Default silence window in milliseconds before an answer is finalized.
///
/// Five seconds tolerates a candidate pausing to think mid-sentence while
/// still moving the interview along once they have clearly finished.
pub const SILENCE_TIMEOUT_MS: u64 = 5000;

/// Default maximum number of questions per session, opener included.
pub const MAX_QUESTIONS: usize = 5;

/// Default pass threshold for the scorecard verdict (score out of 100).
pub const PASS_THRESHOLD: u8 = 60;

/// The fixed first question of every session.
pub const OPENER: &str = "Tell me about yourself.";

pub const GREETING: &str = "Hi, I'm your interview assistant. I'll ask you a few questions. \
Say 'skip' to move on, 'repeat' to hear a question again, or 'stop interview' to end.";

pub const CLOSING: &str = "That's all I had. Thanks for your time.";

pub const REPROMPT: &str = "If you're ready, please answer now or say skip.";

pub const FAREWELL: &str = "Ending the interview session. Thank you for your time!";

/// Phrases that end the session immediately.
pub const STOP_PHRASES: &[&str] = &["stop interview", "end interview", "exit", "quit"];

/// Phrase that re-emits the current question.
pub const REPEAT_PHRASE: &str = "repeat";

/// Phrase that discards the current answer and moves on.
pub const SKIP_PHRASE: &str = "skip";

/// Phrases that finalize the current answer without waiting for silence.
pub const END_PHRASES: &[&str] = &[
    "that's it",
    "that is it",
    "that's all",
    "end of answer",
    "i'm done",
];

/// Answers to a "strength" question shorter than this many words get a cue
/// asking for a concrete example.
pub const SHORT_ANSWER_WORDS: usize = 15;

/// Window within which an identical fragment is treated as a recogniser echo.
pub const DEBOUNCE_MS: u64 = 1500;

/// Default directory for persisted transcripts.
pub const TRANSCRIPT_DIR: &str = "transcripts";

/// Default chat-completions endpoint for the HTTP oracle.
pub const ORACLE_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default model requested from the HTTP oracle.
pub const ORACLE_MODEL: &str = "gpt-4o-mini";

/// Environment variable holding the HTTP oracle API key.
pub const ORACLE_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// HTTP oracle request timeout in seconds.
pub const ORACLE_TIMEOUT_SECS: u64 = 30;
