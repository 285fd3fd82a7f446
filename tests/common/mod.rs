//! Shared harness: an engine wired to in-memory doubles and a manual timer.

#![allow(dead_code)]

use intervox::config::InterviewConfig;
use intervox::oracle::MockOracle;
use intervox::session::{InterviewEngine, ManualScheduler, SessionEvent, SessionReport};
use intervox::speech::CollectorSink;
use intervox::transcript::MemoryTranscriptStore;
use std::sync::{Arc, Mutex};

pub struct Harness {
    pub engine: InterviewEngine,
    pub sink: Arc<CollectorSink>,
    pub oracle: Arc<MockOracle>,
    pub store: Arc<MemoryTranscriptStore>,
    pub scheduler: ManualScheduler,
    pub reports: Arc<Mutex<Vec<SessionReport>>>,
    pub events: crossbeam_channel::Receiver<SessionEvent>,
}

impl Harness {
    pub fn new(config: InterviewConfig, oracle: MockOracle) -> Self {
        Self::with_store(config, oracle, MemoryTranscriptStore::new())
    }

    pub fn with_store(
        config: InterviewConfig,
        oracle: MockOracle,
        store: MemoryTranscriptStore,
    ) -> Self {
        let sink = Arc::new(CollectorSink::new());
        let oracle = Arc::new(oracle);
        let store = Arc::new(store);
        let scheduler = ManualScheduler::new();
        let reports = Arc::new(Mutex::new(Vec::new()));
        let (event_tx, events) = crossbeam_channel::unbounded();

        let collected = reports.clone();
        let engine = InterviewEngine::builder(config)
            .with_scheduler(Arc::new(scheduler.clone()))
            .with_events(event_tx)
            .on_complete(move |report| collected.lock().unwrap().push(report.clone()))
            .build(sink.clone(), oracle.clone(), store.clone());

        Self {
            engine,
            sink,
            oracle,
            store,
            scheduler,
            reports,
            events,
        }
    }

    pub fn reports(&self) -> Vec<SessionReport> {
        self.reports.lock().unwrap().clone()
    }

    pub fn drain_events(&self) -> Vec<SessionEvent> {
        self.events.try_iter().collect()
    }

    /// Say `text` and let the silence deadline expire.
    pub fn answer(&self, text: &str) {
        self.engine.submit_fragment(text);
        assert_eq!(self.scheduler.fire_live(), 1, "exactly one live deadline");
    }
}

pub fn config(max_questions: usize) -> InterviewConfig {
    InterviewConfig {
        max_questions,
        ..InterviewConfig::default()
    }
}
