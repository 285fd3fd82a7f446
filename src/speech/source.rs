use crate::clock::{Clock, SystemClock};
use crate::defaults;
use crate::error::Result;
use crate::speech::sink::SpeechObserver;
use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// Trait for recognised-speech sources.
///
/// This trait allows swapping implementations (piped recogniser vs scripted).
pub trait SpeechSource: Send {
    /// Block until the next recognised fragment.
    ///
    /// # Returns
    /// `Ok(Some(text))` for a fragment, `Ok(None)` once input has ended.
    fn next_fragment(&mut self) -> Result<Option<String>>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "source"
    }
}

/// Shared pause flag for half-duplex operation: capture is halted while the
/// sink is speaking so the interviewer does not transcribe itself.
#[derive(Debug, Clone, Default)]
pub struct SourceControl {
    paused: Arc<AtomicBool>,
}

impl SourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

impl SpeechObserver for SourceControl {
    fn on_speech_start(&self) {
        self.pause();
    }

    fn on_speech_end(&self) {
        self.resume();
    }
}

/// Drops blank fragments and repeats of the previous fragment that arrive
/// within the debounce window (recognisers often re-emit the same phrase).
pub struct FragmentDebouncer<C: Clock = SystemClock> {
    window: Duration,
    last: Option<(String, Instant)>,
    clock: C,
}

impl FragmentDebouncer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(Duration::from_millis(defaults::DEBOUNCE_MS), SystemClock)
    }
}

impl Default for FragmentDebouncer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> FragmentDebouncer<C> {
    pub fn with_clock(window: Duration, clock: C) -> Self {
        Self {
            window,
            last: None,
            clock,
        }
    }

    /// Whether `text` should be delivered.
    pub fn accept(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }

        let now = self.clock.now();
        let normalized = text.to_lowercase();
        if let Some((ref last, at)) = self.last
            && *last == normalized
            && now.duration_since(at) < self.window
        {
            return false;
        }

        self.last = Some((normalized, now));
        true
    }
}

/// Reads newline-delimited fragments, e.g. from a recogniser piped into stdin.
pub struct LineSource<R: BufRead + Send, C: Clock = SystemClock> {
    reader: R,
    control: SourceControl,
    debouncer: FragmentDebouncer<C>,
}

impl<R: BufRead + Send> LineSource<R, SystemClock> {
    pub fn new(reader: R, control: SourceControl) -> Self {
        Self::with_debouncer(reader, control, FragmentDebouncer::new())
    }
}

impl<R: BufRead + Send, C: Clock> LineSource<R, C> {
    pub fn with_debouncer(reader: R, control: SourceControl, debouncer: FragmentDebouncer<C>) -> Self {
        Self {
            reader,
            control,
            debouncer,
        }
    }
}

impl<R: BufRead + Send, C: Clock> SpeechSource for LineSource<R, C> {
    fn next_fragment(&mut self) -> Result<Option<String>> {
        loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if self.control.is_paused() {
                debug!(text = line.trim(), "dropping fragment captured while speaking");
                continue;
            }
            let text = line.trim();
            if self.debouncer.accept(text) {
                return Ok(Some(text.to_string()));
            }
        }
    }

    fn name(&self) -> &'static str {
        "lines"
    }
}

/// Source that replays a fixed list of fragments, then ends.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    fragments: VecDeque<String>,
}

impl ScriptedSource {
    pub fn new(fragments: &[&str]) -> Self {
        Self {
            fragments: fragments.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl SpeechSource for ScriptedSource {
    fn next_fragment(&mut self) -> Result<Option<String>> {
        Ok(self.fragments.pop_front())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
