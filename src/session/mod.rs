//! Interview session: the turn-taking engine and the pieces it is built from.
//!
//! ```text
//! SpeechSource ──fragments──▶ InterviewEngine ──utterances──▶ SpeechSink
//!                                 │    ▲
//!                      questions, │    │ silence deadline
//!                       scoring   ▼    │
//!                         QuestionOracle  TimerScheduler
//!                                 │
//!                                 ▼
//!                          TranscriptStore
//! ```

pub mod command;
pub mod cues;
pub mod engine;
pub mod events;
pub mod timer;
pub mod types;

pub use command::{Command, CommandMatcher};
pub use engine::{CompletionCallback, EngineBuilder, InterviewEngine};
pub use events::SessionEvent;
pub use timer::{ManualScheduler, ThreadScheduler, TimerHandle, TimerScheduler};
pub use types::{
    FragmentOutcome, Scorecard, SessionReport, SessionState, TranscriptEntry, Verdict,
};
