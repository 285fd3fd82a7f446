//! Turn-taking engine: question progression and answer capture.
//!
//! All mutable session state lives in one `Inner` behind one mutex. Every
//! operation does its check-and-mutate in a single critical section and only
//! then talks to collaborators (sink, oracle, store) with the lock released,
//! since speaking and oracle calls may block for seconds.

use crate::config::InterviewConfig;
use crate::oracle::{InterviewContext, QuestionOracle};
use crate::session::command::{Command, CommandMatcher};
use crate::session::cues;
use crate::session::events::SessionEvent;
use crate::session::timer::{ThreadScheduler, TimerHandle, TimerScheduler, TimerTask};
use crate::session::types::{
    FragmentOutcome, Scorecard, SessionReport, SessionState, TranscriptEntry,
};
use crate::speech::SpeechSink;
use crate::transcript::TranscriptStore;
use crossbeam_channel::Sender;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, info, warn};

/// Called once per session with everything the session produced.
pub type CompletionCallback = Arc<dyn Fn(&SessionReport) + Send + Sync>;

/// Why a finalize was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// Silence deadline of the given generation expired.
    Timer(u64),
    /// End-of-answer phrase or an explicit call.
    Explicit,
}

/// The live silence deadline. Dropping it cancels the scheduled task.
struct ArmedTimer {
    generation: u64,
    _handle: TimerHandle,
}

struct Inner {
    state: SessionState,
    questions: Vec<String>,
    /// Index of the question currently out; `None` before the first one.
    position: Option<usize>,
    buffer: Vec<String>,
    transcript: Vec<TranscriptEntry>,
    timer: Option<ArmedTimer>,
    /// Bumped on every arm and every new question. Monotonic across
    /// restarts so a timer from an earlier session can never match.
    generation: u64,
    scorecard: Option<Scorecard>,
    location: Option<PathBuf>,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            questions: Vec::new(),
            position: None,
            buffer: Vec::new(),
            transcript: Vec::new(),
            timer: None,
            generation: 0,
            scorecard: None,
            location: None,
        }
    }

    fn current_question(&self) -> Option<&str> {
        self.position
            .and_then(|p| self.questions.get(p))
            .map(String::as_str)
    }
}

/// What to do once the lock is released after moving to the next slot.
enum Step {
    /// `turn` is the generation the question was queued under; the first
    /// deadline is armed only if nothing moved it on meanwhile.
    Ask {
        number: usize,
        text: String,
        turn: u64,
    },
    Close,
}

/// Outcome of the locked half of a finalize.
enum Taken {
    Nothing,
    Reprompt,
    Answer {
        number: usize,
        question: String,
        answer: String,
    },
}

struct Shared {
    inner: Mutex<Inner>,
    config: InterviewConfig,
    matcher: CommandMatcher,
    context: InterviewContext,
    sink: Arc<dyn SpeechSink>,
    oracle: Arc<dyn QuestionOracle>,
    store: Arc<dyn TranscriptStore>,
    scheduler: Arc<dyn TimerScheduler>,
    event_tx: Option<Sender<SessionEvent>>,
    on_complete: Option<CompletionCallback>,
}

/// Configures an [`InterviewEngine`] before it is shared.
pub struct EngineBuilder {
    config: InterviewConfig,
    context: InterviewContext,
    scheduler: Arc<dyn TimerScheduler>,
    event_tx: Option<Sender<SessionEvent>>,
    on_complete: Option<CompletionCallback>,
}

impl EngineBuilder {
    /// Resume and job-description text used for seeding and scoring.
    pub fn with_context(mut self, context: InterviewContext) -> Self {
        self.context = context;
        self
    }

    /// Sets a custom timer scheduler (for deterministic testing).
    pub fn with_scheduler(mut self, scheduler: Arc<dyn TimerScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Stream session events to `tx`. Sends never block; a full or closed
    /// channel drops the event.
    pub fn with_events(mut self, tx: Sender<SessionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&SessionReport) + Send + Sync + 'static,
    {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    pub fn build(
        self,
        sink: Arc<dyn SpeechSink>,
        oracle: Arc<dyn QuestionOracle>,
        store: Arc<dyn TranscriptStore>,
    ) -> InterviewEngine {
        let matcher = CommandMatcher::new(&self.config);
        InterviewEngine {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::new()),
                config: self.config,
                matcher,
                context: self.context,
                sink,
                oracle,
                store,
                scheduler: self.scheduler,
                event_tx: self.event_tx,
                on_complete: self.on_complete,
            }),
        }
    }
}

/// Sole authority over question progression and answer capture.
///
/// Cheap to clone; clones drive the same session. Safe to call from any
/// thread, but fragments must be delivered from one thread at a time.
#[derive(Clone)]
pub struct InterviewEngine {
    shared: Arc<Shared>,
}

impl InterviewEngine {
    pub fn builder(config: InterviewConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            context: InterviewContext::default(),
            scheduler: Arc::new(ThreadScheduler),
            event_tx: None,
            on_complete: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Start (or restart) a session: seed questions, greet, ask the opener.
    pub fn start_session(&self) {
        let config = &self.shared.config;
        {
            let mut inner = self.lock();
            let generation = inner.generation;
            *inner = Inner::new();
            inner.generation = generation;
            inner.questions.push(config.opener.trim().to_string());
        }

        let seeds = if config.seed_from_context && config.max_questions > 1 {
            match self
                .shared
                .oracle
                .seed_questions(&self.shared.context, config.max_questions - 1)
            {
                Ok(seeds) => seeds,
                Err(e) => {
                    warn!(oracle = self.shared.oracle.name(), "seeding failed: {e}");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let questions = {
            let mut inner = self.lock();
            if inner.state == SessionState::Complete {
                debug!("session stopped while seeding");
                return;
            }
            for seed in seeds {
                if inner.questions.len() >= config.max_questions {
                    break;
                }
                let seed = seed.trim();
                if cues::is_duplicate(&inner.questions, seed) {
                    debug!(seed, "dropping duplicate seed question");
                    continue;
                }
                inner.questions.push(seed.to_string());
            }
            inner.questions.clone()
        };

        info!(questions = questions.len(), "session started");
        self.emit(SessionEvent::SessionStarted { questions });
        self.say(&config.greeting, false);
        self.advance();
    }

    /// Move to the next question, or complete the session when none is left.
    pub fn advance(&self) {
        let step = {
            let mut inner = self.lock();
            if inner.state == SessionState::Complete {
                return;
            }
            self.step_forward(&mut inner)
        };
        self.perform(step);
    }

    /// Hand one recognised fragment to the engine.
    pub fn submit_fragment(&self, text: &str) -> FragmentOutcome {
        let text = text.trim();
        if text.is_empty() {
            return FragmentOutcome::Ignored;
        }

        let command = self.shared.matcher.classify(text);
        let mut inner = self.lock();
        if !inner.state.accepts_input() {
            debug!(text, state = ?inner.state, "fragment ignored");
            return FragmentOutcome::Ignored;
        }
        self.emit(SessionEvent::FragmentReceived {
            text: text.to_string(),
        });

        match command {
            Command::Stop => {
                drop(inner);
                self.stop();
                FragmentOutcome::Stopped
            }
            Command::Repeat => {
                let question = inner.current_question().map(str::to_string);
                drop(inner);
                if let Some(question) = question {
                    self.say(&question, false);
                }
                FragmentOutcome::Repeated
            }
            Command::Skip => {
                debug!(discarded = inner.buffer.len(), "question skipped");
                let step = self.step_forward(&mut inner);
                drop(inner);
                self.perform(step);
                FragmentOutcome::Skipped
            }
            Command::EndOfAnswer { remainder } => {
                if !remainder.is_empty() {
                    inner.buffer.push(remainder);
                }
                let taken = self.take_answer(&mut inner, Trigger::Explicit);
                drop(inner);
                self.after_take(taken);
                FragmentOutcome::Finalized
            }
            Command::Content(content) => {
                inner.buffer.push(content);
                self.arm_timer(&mut inner);
                FragmentOutcome::Collected
            }
        }
    }

    /// Close out the current answer now. No-op unless awaiting an answer.
    pub fn finalize_if_pending(&self) {
        self.finalize(Trigger::Explicit);
    }

    /// End the session, keeping any partial answer. Later calls are no-ops.
    pub fn stop(&self) {
        let flushed = {
            let mut inner = self.lock();
            if inner.state == SessionState::Complete {
                return;
            }
            inner.timer = None;
            let mut flushed = None;
            if inner.state == SessionState::AwaitingAnswer && !inner.buffer.is_empty() {
                let answer = inner.buffer.join(" ");
                inner.buffer.clear();
                if let Some(question) = inner.current_question().map(str::to_string) {
                    inner
                        .transcript
                        .push(TranscriptEntry::new(question.clone(), answer.clone()));
                    flushed = Some(SessionEvent::AnswerRecorded {
                        number: inner.transcript.len(),
                        question,
                        answer,
                    });
                }
            }
            inner.buffer.clear();
            inner.state = SessionState::Complete;
            flushed
        };

        info!("session stopped");
        if let Some(event) = flushed {
            self.emit(event);
        }
        self.emit(SessionEvent::StateChanged {
            state: SessionState::Complete,
        });
        self.say(&self.shared.config.farewell, true);
        self.run_completion();
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn questions(&self) -> Vec<String> {
        self.lock().questions.clone()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock().transcript.clone()
    }

    /// Index of the question currently out, `None` before the first.
    pub fn position(&self) -> Option<usize> {
        self.lock().position
    }

    pub fn scorecard(&self) -> Option<Scorecard> {
        self.lock().scorecard.clone()
    }

    /// Where the transcript was persisted, once complete.
    pub fn location(&self) -> Option<PathBuf> {
        self.lock().location.clone()
    }

    /// Fragments collected for the current question.
    pub fn buffered_fragments(&self) -> Vec<String> {
        self.lock().buffer.clone()
    }

    /// Whether a silence deadline is armed.
    pub fn timer_armed(&self) -> bool {
        self.lock().timer.is_some()
    }

    fn on_silence_timeout(&self, generation: u64) {
        debug!(generation, "silence deadline expired");
        self.finalize(Trigger::Timer(generation));
    }

    fn finalize(&self, trigger: Trigger) {
        let taken = {
            let mut inner = self.lock();
            self.take_answer(&mut inner, trigger)
        };
        self.after_take(taken);
    }

    /// Locked half of advance: clear the buffer, cancel the timer and move
    /// the position on by one. The next deadline is armed by `perform`.
    fn step_forward(&self, inner: &mut Inner) -> Step {
        let config = &self.shared.config;
        inner.buffer.clear();
        inner.timer = None;

        let next = inner.position.map_or(0, |p| p + 1);
        inner.position = Some(next);

        if next >= inner.questions.len() || next >= config.max_questions {
            inner.state = SessionState::Complete;
            return Step::Close;
        }

        inner.state = SessionState::AwaitingAnswer;
        inner.generation += 1;
        Step::Ask {
            number: next + 1,
            text: inner.questions[next].clone(),
            turn: inner.generation,
        }
    }

    fn perform(&self, step: Step) {
        match step {
            Step::Ask { number, text, turn } => {
                debug!(number, "asking question");
                self.emit(SessionEvent::StateChanged {
                    state: SessionState::AwaitingAnswer,
                });
                self.emit(SessionEvent::QuestionAsked {
                    number,
                    text: text.clone(),
                });
                // Silence only counts once the question has been heard.
                if let Err(e) = self.shared.sink.speak(&text, true) {
                    warn!(sink = self.shared.sink.name(), "failed to speak question: {e}");
                }
                let mut inner = self.lock();
                if inner.state == SessionState::AwaitingAnswer && inner.generation == turn {
                    self.arm_timer(&mut inner);
                }
            }
            Step::Close => {
                self.emit(SessionEvent::StateChanged {
                    state: SessionState::Complete,
                });
                self.say(&self.shared.config.closing, false);
                self.run_completion();
            }
        }
    }

    /// Locked half of finalize: read and clear the buffer, record the entry.
    fn take_answer(&self, inner: &mut Inner, trigger: Trigger) -> Taken {
        if inner.state != SessionState::AwaitingAnswer {
            return Taken::Nothing;
        }
        if let Trigger::Timer(generation) = trigger
            && inner.timer.as_ref().map(|t| t.generation) != Some(generation)
        {
            debug!(generation, "stale silence deadline ignored");
            return Taken::Nothing;
        }

        inner.timer = None;
        if inner.buffer.is_empty() {
            return Taken::Reprompt;
        }

        let answer = inner.buffer.join(" ");
        inner.buffer.clear();
        let Some(question) = inner.current_question().map(str::to_string) else {
            return Taken::Nothing;
        };
        inner
            .transcript
            .push(TranscriptEntry::new(question.clone(), answer.clone()));
        inner.state = SessionState::Finalizing;
        Taken::Answer {
            number: inner.transcript.len(),
            question,
            answer,
        }
    }

    fn after_take(&self, taken: Taken) {
        match taken {
            Taken::Nothing => {}
            Taken::Reprompt => {
                debug!("nothing said yet, re-prompting");
                self.emit(SessionEvent::Reprompted);
                self.say(&self.shared.config.reprompt, false);
            }
            Taken::Answer {
                number,
                question,
                answer,
            } => {
                info!(number, words = answer.split_whitespace().count(), "answer recorded");
                self.emit(SessionEvent::StateChanged {
                    state: SessionState::Finalizing,
                });
                self.emit(SessionEvent::AnswerRecorded {
                    number,
                    question: question.clone(),
                    answer: answer.clone(),
                });
                self.move_on(&question, &answer);
            }
        }
    }

    /// After an answer: maybe add a follow-up, acknowledge, then advance.
    fn move_on(&self, question: &str, answer: &str) {
        let config = &self.shared.config;
        let follow_up = if config.follow_ups {
            match self.shared.oracle.follow_up_question(answer) {
                Ok(follow_up) => follow_up,
                Err(e) => {
                    warn!(oracle = self.shared.oracle.name(), "follow-up failed: {e}");
                    None
                }
            }
        } else {
            None
        };

        let (added, has_next) = {
            let mut inner = self.lock();
            if inner.state != SessionState::Finalizing {
                // Stopped while the oracle was thinking.
                return;
            }
            let mut added = None;
            if let Some(candidate) = follow_up.as_deref().map(str::trim)
                && inner.questions.len() < config.max_questions
                && !cues::is_duplicate(&inner.questions, candidate)
            {
                inner.questions.push(candidate.to_string());
                added = Some(candidate.to_string());
            }
            let next = inner.position.map_or(0, |p| p + 1);
            (added, next < inner.questions.len() && next < config.max_questions)
        };

        if let Some(text) = added {
            debug!(question = %text, "follow-up question added");
            self.emit(SessionEvent::QuestionAdded { text });
        }

        let line = if has_next {
            cues::transition_line(question, answer)
        } else {
            cues::acknowledgement(answer).to_string()
        };
        self.say(&line, false);

        let step = {
            let mut inner = self.lock();
            if inner.state != SessionState::Finalizing {
                return;
            }
            self.step_forward(&mut inner)
        };
        self.perform(step);
    }

    /// Replace the silence deadline. The previous handle is dropped first,
    /// and the new task carries a fresh generation.
    fn arm_timer(&self, inner: &mut Inner) {
        inner.timer = None;
        inner.generation += 1;
        let generation = inner.generation;

        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let task: TimerTask = Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                InterviewEngine { shared }.on_silence_timeout(generation);
            }
        });

        match self
            .shared
            .scheduler
            .schedule(self.shared.config.silence_timeout(), task)
        {
            Ok(handle) => {
                inner.timer = Some(ArmedTimer {
                    generation,
                    _handle: handle,
                });
            }
            Err(e) => warn!("failed to arm silence timer: {e}"),
        }
    }

    /// Persist, score, summarise, notify. Runs once per session, on the
    /// thread that moved the session to `Complete`.
    fn run_completion(&self) {
        let shared = &self.shared;
        let transcript = self.lock().transcript.clone();

        let location = match shared.store.append_session(&transcript) {
            Ok(location) => Some(location),
            Err(e) => {
                warn!("failed to persist transcript: {e}");
                None
            }
        };

        let scorecard = match shared.oracle.score_and_feedback(
            &shared.context,
            &transcript,
            shared.config.pass_threshold,
        ) {
            Ok(card) => Some(card),
            Err(e) => {
                warn!(oracle = shared.oracle.name(), "scoring failed: {e}");
                None
            }
        };

        if let (Some(location), Some(card)) = (&location, &scorecard)
            && let Err(e) = shared.store.append_scorecard(location, card)
        {
            warn!("failed to persist scorecard: {e}");
        }

        {
            let mut inner = self.lock();
            inner.scorecard = scorecard.clone();
            inner.location = location.clone();
        }

        if let Some(card) = &scorecard {
            self.say(&card.spoken_summary(), true);
        }

        info!(
            answered = transcript.len(),
            score = scorecard.as_ref().map(|c| c.score),
            "session complete"
        );
        self.emit(SessionEvent::SessionCompleted {
            answered: transcript.len(),
            score: scorecard.as_ref().map(|c| c.score),
            verdict: scorecard.as_ref().map(|c| c.verdict),
            location: location.as_ref().map(|p| p.display().to_string()),
        });

        if let Some(callback) = &shared.on_complete {
            callback(&SessionReport {
                transcript,
                scorecard,
                location,
            });
        }
    }

    /// Speak a non-question line. Failures are logged, never raised.
    fn say(&self, text: &str, wait_for_completion: bool) {
        if text.trim().is_empty() {
            return;
        }
        self.emit(SessionEvent::Spoken {
            text: text.to_string(),
        });
        if let Err(e) = self.shared.sink.speak(text, wait_for_completion) {
            warn!(sink = self.shared.sink.name(), "failed to speak: {e}");
        }
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.shared.event_tx
            && tx.try_send(event).is_err()
        {
            debug!("session event dropped");
        }
    }
}
