//! Invariants of the turn-taking engine under repeated, racing and
//! out-of-order input.

mod common;

use common::{Harness, config};
use intervox::defaults;
use intervox::oracle::MockOracle;
use intervox::session::{FragmentOutcome, SessionState};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn rearming_many_times_finalizes_once() {
    for n in [1usize, 2, 5, 20] {
        let h = Harness::new(config(3), MockOracle::new());
        h.engine.start_session();

        let words: Vec<String> = (0..n).map(|i| format!("word{i}")).collect();
        for word in &words {
            h.engine.submit_fragment(word);
        }
        assert_eq!(h.scheduler.live_count(), 1, "n = {n}");

        // Superseded deadlines run too, as if cancellation lost the race.
        h.scheduler.fire_all_including_cancelled();

        let transcript = h.engine.transcript();
        assert_eq!(transcript.len(), 1, "n = {n}");
        assert_eq!(transcript[0].answer, words.join(" "));
    }
}

#[test]
fn stale_deadline_after_explicit_end_is_ignored() {
    let h = Harness::new(config(3), MockOracle::new().with_seeds(&["Describe a project."]));
    h.engine.start_session();
    h.engine.submit_fragment("I led a migration");
    h.engine.submit_fragment("that's it");
    assert_eq!(h.engine.position(), Some(1));

    // Old deadlines are stale; the next question's deadline finds nothing said.
    h.scheduler.fire_all_including_cancelled();

    assert_eq!(h.engine.transcript().len(), 1);
    assert_eq!(h.engine.position(), Some(1));
    assert_eq!(h.engine.state(), SessionState::AwaitingAnswer);
    assert_eq!(h.sink.count_containing(defaults::REPROMPT), 1);
}

#[test]
fn empty_finalize_neither_appends_nor_advances() {
    let h = Harness::new(config(3), MockOracle::new().with_seeds(&["Describe a project."]));
    h.engine.start_session();

    h.engine.finalize_if_pending();
    assert_eq!(h.scheduler.fire_live(), 0, "explicit finalize disarmed the deadline");
    h.engine.finalize_if_pending();

    assert!(h.engine.transcript().is_empty());
    assert_eq!(h.engine.position(), Some(0));
    assert_eq!(h.engine.state(), SessionState::AwaitingAnswer);
    assert_eq!(h.sink.count_containing(defaults::REPROMPT), 2);
}

#[test]
fn end_phrase_alone_reprompts() {
    let h = Harness::new(config(3), MockOracle::new());
    h.engine.start_session();

    assert_eq!(h.engine.submit_fragment("I'm done"), FragmentOutcome::Finalized);

    assert!(h.engine.transcript().is_empty());
    assert_eq!(h.engine.position(), Some(0));
    assert_eq!(h.sink.count_containing(defaults::REPROMPT), 1);
}

#[test]
fn timeout_after_reprompt_still_accepts_answer() {
    let h = Harness::new(config(2), MockOracle::new());
    h.engine.start_session();

    assert_eq!(h.scheduler.fire_live(), 1);
    assert!(!h.engine.timer_armed());
    h.answer("Sorry, I build data platforms");

    assert_eq!(h.engine.transcript().len(), 1);
}

#[test]
fn skip_clears_buffer_and_advances_by_one() {
    for fragments in [vec![], vec!["half"], vec!["one", "two", "three"]] {
        let h = Harness::new(
            config(4),
            MockOracle::new().with_seeds(&["Describe a project.", "Why this role?"]),
        );
        h.engine.start_session();
        for fragment in &fragments {
            h.engine.submit_fragment(fragment);
        }

        assert_eq!(h.engine.submit_fragment("skip"), FragmentOutcome::Skipped);

        assert!(h.engine.buffered_fragments().is_empty());
        assert_eq!(h.engine.position(), Some(1));
        assert!(h.engine.transcript().is_empty());
        assert_eq!(h.sink.texts().last().map(String::as_str), Some("Describe a project."));
    }
}

#[test]
fn skip_on_last_question_completes() {
    let h = Harness::new(config(1), MockOracle::new());
    h.engine.start_session();
    h.engine.submit_fragment("partial");

    assert_eq!(h.engine.submit_fragment("Skip this one"), FragmentOutcome::Skipped);

    assert_eq!(h.engine.state(), SessionState::Complete);
    assert!(h.engine.transcript().is_empty());
    assert_eq!(h.store.sessions().len(), 1);
}

#[test]
fn repeat_touches_nothing() {
    let h = Harness::new(config(3), MockOracle::new());
    h.engine.start_session();
    h.engine.submit_fragment("partial answer");

    let buffer = h.engine.buffered_fragments();
    let position = h.engine.position();
    let scheduled = h.scheduler.scheduled_count();
    let live = h.scheduler.live_count();

    assert_eq!(
        h.engine.submit_fragment("Could you repeat the question?"),
        FragmentOutcome::Repeated
    );

    assert_eq!(h.engine.buffered_fragments(), buffer);
    assert_eq!(h.engine.position(), position);
    assert_eq!(h.scheduler.scheduled_count(), scheduled);
    assert_eq!(h.scheduler.live_count(), live);
    assert_eq!(
        h.sink.texts().last().map(String::as_str),
        Some("Tell me about yourself.")
    );

    // The original deadline still finalizes the original answer.
    assert_eq!(h.scheduler.fire_live(), 1);
    assert_eq!(h.engine.transcript()[0].answer, "partial answer");
}

#[test]
fn transcript_never_exceeds_max_questions() {
    for max in 1..=4 {
        let follow_ups: Vec<Option<String>> =
            (0..10).map(|i| Some(format!("Follow-up number {i}?"))).collect();
        let follow_ups: Vec<Option<&str>> = follow_ups.iter().map(|f| f.as_deref()).collect();
        let h = Harness::new(
            config(max),
            MockOracle::new()
                .with_seeds(&["Seed one?", "Seed two?", "Seed three?", "Seed four?"])
                .with_follow_ups(&follow_ups),
        );
        h.engine.start_session();

        let mut rounds = 0;
        while h.engine.state() != SessionState::Complete {
            h.answer(&format!("answer {rounds}"));
            rounds += 1;
            assert!(rounds <= max, "session ran past its question bound");
        }

        assert_eq!(h.engine.transcript().len(), max);
        assert!(h.engine.questions().len() <= max);
    }
}

#[test]
fn stop_twice_persists_once() {
    let h = Harness::new(config(3), MockOracle::new());
    h.engine.start_session();
    h.engine.submit_fragment("something");

    h.engine.stop();
    h.engine.stop();

    assert_eq!(h.engine.state(), SessionState::Complete);
    assert_eq!(h.store.session_calls(), 1);
    assert_eq!(h.oracle.score_calls(), 1);
    assert_eq!(h.reports().len(), 1);
    assert_eq!(h.sink.count_containing(defaults::FAREWELL), 1);
}

#[test]
fn concurrent_stops_persist_once() {
    let h = Harness::new(config(3), MockOracle::new());
    h.engine.start_session();
    h.engine.submit_fragment("half an answer");

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = h.engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                engine.stop();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(h.engine.state(), SessionState::Complete);
    assert_eq!(h.store.session_calls(), 1);
    assert_eq!(h.store.sessions()[0].len(), 1);
    assert_eq!(h.reports().len(), 1);
}

#[test]
fn stop_racing_deadline_records_answer_once() {
    for _ in 0..20 {
        let h = Harness::new(config(3), MockOracle::new().with_seeds(&["Describe a project."]));
        h.engine.start_session();
        h.engine.submit_fragment("racing answer");

        let scheduler = h.scheduler.clone();
        let timer = thread::spawn(move || {
            scheduler.fire_live();
        });
        let engine = h.engine.clone();
        let stopper = thread::spawn(move || engine.stop());
        timer.join().unwrap();
        stopper.join().unwrap();

        assert_eq!(h.engine.state(), SessionState::Complete);
        assert_eq!(h.store.session_calls(), 1);
        let sessions = h.store.sessions();
        assert_eq!(sessions[0].len(), 1);
        assert_eq!(sessions[0][0].answer, "racing answer");
        assert_eq!(h.reports().len(), 1);
    }
}

#[test]
fn dropped_engine_disarms_pending_deadline() {
    let h = Harness::new(config(3), MockOracle::new());
    h.engine.start_session();
    h.engine.submit_fragment("abandoned");
    let scheduler = h.scheduler.clone();
    drop(h);

    // The task holds only a weak reference, so firing it is harmless.
    assert_eq!(scheduler.fire_all_including_cancelled(), 2);
}
