use crate::error::{IntervoxError, Result};
use crate::speech::executor::CommandExecutor;
use crossbeam_channel::{Sender, bounded, unbounded};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Pluggable speech output. Pairs with `SpeechSource` for input.
pub trait SpeechSink: Send + Sync {
    /// Speak `text`. When `wait_for_completion` is true, block until playback
    /// has finished; otherwise return as soon as the utterance is queued.
    fn speak(&self, text: &str, wait_for_completion: bool) -> Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "speech"
    }
}

/// Blocking synthesizer backend driven by [`SpeechWorker`].
pub trait Voice: Send + 'static {
    /// Speak `text`, returning once playback has finished.
    fn say(&mut self, text: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Notified around every utterance, e.g. to pause capture while speaking.
pub trait SpeechObserver: Send + Sync {
    fn on_speech_start(&self);
    fn on_speech_end(&self);
}

/// Voice that runs an external synthesizer such as `espeak-ng` or `spd-say -w`.
pub struct CommandVoice<E: CommandExecutor> {
    executor: E,
    command: String,
    args: Vec<String>,
}

impl<E: CommandExecutor> CommandVoice<E> {
    /// `args` are passed before the utterance text.
    pub fn new(executor: E, command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            executor,
            command: command.into(),
            args,
        }
    }
}

impl<E: CommandExecutor + 'static> Voice for CommandVoice<E> {
    fn say(&mut self, text: &str) -> Result<()> {
        let mut args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        args.push(text);
        self.executor.execute(&self.command, &args).map(|_| ())
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Voice that produces no sound. Utterances still reach the terminal through
/// session events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullVoice;

impl Voice for NullVoice {
    fn say(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

struct Utterance {
    text: String,
    done_tx: Option<Sender<()>>,
}

/// Speech sink that plays utterances one at a time on a dedicated thread.
///
/// Utterances are spoken in the order they were queued. Voice failures are
/// logged and the observer's end hook still runs, so capture is never left
/// paused.
pub struct SpeechWorker {
    tx: Option<Sender<Utterance>>,
    handle: Option<JoinHandle<()>>,
    voice_name: &'static str,
}

impl SpeechWorker {
    pub fn spawn<V: Voice>(
        mut voice: V,
        observer: Option<Arc<dyn SpeechObserver>>,
    ) -> Result<Self> {
        let (tx, rx) = unbounded::<Utterance>();
        let voice_name = voice.name();

        let handle = thread::Builder::new()
            .name("speech-worker".to_string())
            .spawn(move || {
                for utterance in rx.iter() {
                    if utterance.text.is_empty() {
                        // Drain marker from `wait_idle`.
                        if let Some(done_tx) = utterance.done_tx {
                            done_tx.send(()).ok();
                        }
                        continue;
                    }
                    if let Some(ref observer) = observer {
                        observer.on_speech_start();
                    }
                    debug!(voice = voice.name(), text = %utterance.text, "speaking");
                    if let Err(e) = voice.say(&utterance.text) {
                        warn!("speech failed: {e}");
                    }
                    if let Some(ref observer) = observer {
                        observer.on_speech_end();
                    }
                    if let Some(done_tx) = utterance.done_tx {
                        // Waiter may have given up; nothing to report.
                        done_tx.send(()).ok();
                    }
                }
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            voice_name,
        })
    }

    /// Blocks until everything queued so far has been spoken.
    pub fn wait_idle(&self) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(IntervoxError::SpeechWorkerStopped)?;
        let (done_tx, done_rx) = bounded(1);
        tx.send(Utterance {
            text: String::new(),
            done_tx: Some(done_tx),
        })
        .map_err(|_| IntervoxError::SpeechWorkerStopped)?;
        done_rx
            .recv()
            .map_err(|_| IntervoxError::SpeechWorkerStopped)
    }

    /// Stops accepting utterances, lets the queue drain, and joins the thread.
    pub fn shutdown(mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("speech worker panicked during shutdown");
        }
    }
}

impl SpeechSink for SpeechWorker {
    fn speak(&self, text: &str, wait_for_completion: bool) -> Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }
        let tx = self.tx.as_ref().ok_or(IntervoxError::SpeechWorkerStopped)?;

        let (done_tx, done_rx) = if wait_for_completion {
            let (done_tx, done_rx) = bounded(1);
            (Some(done_tx), Some(done_rx))
        } else {
            (None, None)
        };

        tx.send(Utterance {
            text: text.to_string(),
            done_tx,
        })
        .map_err(|_| IntervoxError::SpeechWorkerStopped)?;

        if let Some(done_rx) = done_rx {
            done_rx
                .recv()
                .map_err(|_| IntervoxError::SpeechWorkerStopped)?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.voice_name
    }
}

impl Drop for SpeechWorker {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop; the thread is detached.
        self.tx.take();
    }
}

/// Sink that records utterances instead of speaking them.
#[derive(Debug, Default)]
pub struct CollectorSink {
    spoken: Mutex<Vec<(String, bool)>>,
    fail: bool,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure every `speak` to fail after recording the utterance.
    pub fn with_failure(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Every utterance with its `wait_for_completion` flag, in order.
    pub fn utterances(&self) -> Vec<(String, bool)> {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.utterances().into_iter().map(|(text, _)| text).collect()
    }

    /// How many utterances contain `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.texts().iter().filter(|t| t.contains(needle)).count()
    }
}

impl SpeechSink for CollectorSink {
    fn speak(&self, text: &str, wait_for_completion: bool) -> Result<()> {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((text.to_string(), wait_for_completion));
        if self.fail {
            return Err(IntervoxError::SpeechFailed {
                message: "mock speech failure".to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
