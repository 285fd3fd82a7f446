//! Speech plumbing around the engine: synthesizer output and recognised input.

pub mod executor;
pub mod sink;
pub mod source;

pub use executor::{CommandExecutor, RecordingExecutor, SystemCommandExecutor};
pub use sink::{CollectorSink, CommandVoice, NullVoice, SpeechObserver, SpeechSink, SpeechWorker, Voice};
pub use source::{FragmentDebouncer, LineSource, ScriptedSource, SourceControl, SpeechSource};
