//! Interview application entry point.
//!
//! Wires the pieces together:
//! stdin fragments → engine → synthesizer + terminal, oracle, transcript files

use crate::config::{Config, DocumentsConfig, OracleBackend, OracleConfig, SpeechConfig};
use crate::documents::load_text;
use crate::error::{IntervoxError, Result};
use crate::oracle::{InterviewContext, OfflineOracle, QuestionOracle};
use crate::output::{OutputMode, print_event};
use crate::session::{InterviewEngine, SessionEvent, SessionReport, SessionState};
use crate::speech::{
    CommandVoice, LineSource, NullVoice, SourceControl, SpeechSource, SpeechWorker,
    SystemCommandExecutor,
};
use crate::transcript::FileTranscriptStore;
use crossbeam_channel::{bounded, select};
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Events buffered between the engine and the terminal.
const EVENT_BUFFER: usize = 1024;

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub resume: Option<PathBuf>,
    pub job_description: Option<PathBuf>,
    pub max_questions: Option<usize>,
    pub silence: Option<Duration>,
    pub oracle: Option<OracleBackend>,
    pub voice: Option<String>,
    pub mute: bool,
    pub transcript_dir: Option<PathBuf>,
}

impl RunOptions {
    pub fn apply(self, config: &mut Config) {
        if let Some(resume) = self.resume {
            config.documents.resume = Some(resume);
        }
        if let Some(jd) = self.job_description {
            config.documents.job_description = Some(jd);
        }
        if let Some(max) = self.max_questions {
            config.interview.max_questions = max;
        }
        if let Some(silence) = self.silence {
            config.interview.silence_timeout_ms =
                u64::try_from(silence.as_millis()).unwrap_or(u64::MAX);
        }
        if let Some(backend) = self.oracle {
            config.oracle.backend = backend;
        }
        if let Some(voice) = self.voice {
            config.speech.command = Some(voice);
        }
        if self.mute {
            config.speech.command = None;
        }
        if let Some(dir) = self.transcript_dir {
            config.transcript.dir = dir;
        }
    }
}

/// Run an interview reading fragments from stdin, one per line.
///
/// End of input stops the session. Returns once the session is complete.
pub fn run_interview(config: Config, mode: OutputMode) -> Result<SessionReport> {
    let control = SourceControl::new();
    let source = LineSource::new(BufReader::new(io::stdin()), control.clone());
    run_session(config, source, control, mode)
}

/// Run one session fed by `source`.
///
/// `control` is paused while the synthesizer speaks so the interviewer does
/// not hear itself.
pub fn run_session<S>(
    config: Config,
    mut source: S,
    control: SourceControl,
    mode: OutputMode,
) -> Result<SessionReport>
where
    S: SpeechSource + 'static,
{
    config.validate()?;

    let context = load_context(&config.documents);
    let oracle = build_oracle(&config.oracle);
    let sink = Arc::new(build_sink(&config.speech, control)?);
    let store = Arc::new(FileTranscriptStore::new(&config.transcript.dir));
    info!(
        oracle = oracle.name(),
        max_questions = config.interview.max_questions,
        transcripts = %store.dir().display(),
        "starting interview"
    );

    let (event_tx, event_rx) = bounded::<SessionEvent>(EVENT_BUFFER);
    let (done_tx, done_rx) = bounded::<SessionReport>(1);

    let engine = InterviewEngine::builder(config.interview.clone())
        .with_context(context)
        .with_events(event_tx)
        .on_complete(move |report| {
            if done_tx.try_send(report.clone()).is_err() {
                debug!("completion already reported");
            }
        })
        .build(sink.clone(), oracle, store);

    // Single delivery thread: fragments reach the engine in arrival order.
    let driver = engine.clone();
    thread::Builder::new()
        .name("fragment-delivery".to_string())
        .spawn(move || {
            driver.start_session();
            deliver_fragments(&driver, &mut source);
        })?;

    let report = loop {
        select! {
            recv(event_rx) -> event => {
                if let Ok(event) = event {
                    render(&event, mode);
                }
            }
            recv(done_rx) -> report => {
                break report.map_err(|_| {
                    IntervoxError::Other("interview ended without a report".to_string())
                })?;
            }
        }
    };

    // Completion is announced after its events were queued.
    for event in event_rx.try_iter() {
        render(&event, mode);
    }
    if let Err(e) = sink.wait_idle() {
        debug!("speech queue not drained: {e}");
    }
    Ok(report)
}

fn deliver_fragments<S: SpeechSource>(engine: &InterviewEngine, source: &mut S) {
    loop {
        if engine.state() == SessionState::Complete {
            return;
        }
        match source.next_fragment() {
            Ok(Some(text)) => {
                engine.submit_fragment(&text);
            }
            Ok(None) => {
                info!(source = source.name(), "input ended, stopping session");
                engine.stop();
                return;
            }
            Err(e) => {
                warn!(source = source.name(), "speech source failed: {e}");
                engine.stop();
                return;
            }
        }
    }
}

fn render(event: &SessionEvent, mode: OutputMode) {
    if let Err(e) = print_event(event, mode) {
        debug!("failed to print event: {e}");
    }
}

/// Read resume and job description. Unreadable documents count as empty.
pub fn load_context(documents: &DocumentsConfig) -> InterviewContext {
    let read = |path: &Option<PathBuf>| path.as_deref().map(load_text).unwrap_or_default();
    let context = InterviewContext::new(read(&documents.resume), read(&documents.job_description));
    if context.is_empty() {
        debug!("no candidate context loaded");
    }
    context
}

/// Pick the configured oracle, falling back to the offline bank when the
/// remote one cannot be set up.
pub fn build_oracle(config: &OracleConfig) -> Arc<dyn QuestionOracle> {
    match config.backend {
        OracleBackend::Offline => Arc::new(OfflineOracle::new()),
        OracleBackend::Http => http_oracle(config),
    }
}

#[cfg(feature = "http-oracle")]
fn http_oracle(config: &OracleConfig) -> Arc<dyn QuestionOracle> {
    match crate::oracle::HttpOracle::from_config(config) {
        Ok(oracle) => Arc::new(oracle),
        Err(e) => {
            warn!("{e}; using the offline question bank");
            Arc::new(OfflineOracle::new())
        }
    }
}

#[cfg(not(feature = "http-oracle"))]
fn http_oracle(_config: &OracleConfig) -> Arc<dyn QuestionOracle> {
    warn!("built without the http-oracle feature; using the offline question bank");
    Arc::new(OfflineOracle::new())
}

fn build_sink(speech: &SpeechConfig, control: SourceControl) -> Result<SpeechWorker> {
    match &speech.command {
        Some(command) => {
            info!(command, "speaking through external synthesizer");
            let voice = CommandVoice::new(
                SystemCommandExecutor::new(),
                command.clone(),
                speech.args.clone(),
            );
            SpeechWorker::spawn(voice, Some(Arc::new(control)))
        }
        None => SpeechWorker::spawn(NullVoice, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::ScriptedSource;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn run_options_override_config() {
        let mut config = Config::default();
        config.speech.command = Some("espeak-ng".to_string());

        RunOptions {
            max_questions: Some(3),
            silence: Some(Duration::from_millis(1500)),
            oracle: Some(OracleBackend::Http),
            mute: true,
            transcript_dir: Some(PathBuf::from("out")),
            ..RunOptions::default()
        }
        .apply(&mut config);

        assert_eq!(config.interview.max_questions, 3);
        assert_eq!(config.interview.silence_timeout_ms, 1500);
        assert_eq!(config.oracle.backend, OracleBackend::Http);
        assert_eq!(config.speech.command, None);
        assert_eq!(config.transcript.dir, PathBuf::from("out"));
    }

    #[test]
    fn empty_options_leave_config_untouched() {
        let mut config = Config::default();
        RunOptions::default().apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn http_oracle_without_key_falls_back_to_offline() {
        let config = OracleConfig {
            backend: OracleBackend::Http,
            api_key_env: "INTERVOX_TEST_ABSENT_KEY_5521".to_string(),
            ..OracleConfig::default()
        };
        assert_eq!(build_oracle(&config).name(), "offline");
    }

    #[test]
    fn load_context_reads_documents() {
        let dir = TempDir::new().unwrap();
        let resume = dir.path().join("resume.txt");
        fs::write(&resume, "Eight years of SQL").unwrap();

        let context = load_context(&DocumentsConfig {
            resume: Some(resume),
            job_description: Some(dir.path().join("missing.md")),
        });
        assert_eq!(context.resume, "Eight years of SQL");
        assert_eq!(context.job_description, "");
    }

    #[test]
    fn invalid_config_is_rejected_before_starting() {
        let mut config = Config::default();
        config.interview.max_questions = 0;
        let result = run_session(
            config,
            ScriptedSource::new(&[]),
            SourceControl::new(),
            OutputMode::Json,
        );
        assert!(matches!(
            result,
            Err(IntervoxError::ConfigInvalidValue { .. })
        ));
    }

    #[test]
    fn scripted_session_runs_to_completion() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.interview.max_questions = 2;
        config.transcript.dir = dir.path().to_path_buf();

        let report = run_session(
            config,
            ScriptedSource::new(&["I build data platforms, that's it"]),
            SourceControl::new(),
            OutputMode::Human { color: false },
        )
        .unwrap();

        assert_eq!(report.transcript.len(), 1);
        assert_eq!(report.transcript[0].question, "Tell me about yourself.");
        assert_eq!(report.transcript[0].answer, "I build data platforms");
        let location = report.location.expect("transcript persisted");
        assert!(fs::read_to_string(location).unwrap().contains("A1: I build data platforms"));
        assert!(report.scorecard.is_some());
    }
}
