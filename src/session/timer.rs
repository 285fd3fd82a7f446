//! Cancellable one-shot timers for the silence deadline.
//!
//! A [`TimerHandle`] owns the cancel side of a channel; dropping or
//! cancelling it disconnects the channel and the pending task never runs.
//! Cancellation alone is not enough when a deadline expires at the same
//! moment it is replaced, so the engine also tags every timer with a
//! generation and re-checks it under its lock before acting.

use crate::error::{IntervoxError, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Work to run when a deadline expires.
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Cancel handle for a scheduled task. Dropping it cancels the task.
#[derive(Debug)]
pub struct TimerHandle {
    cancel_tx: Option<Sender<()>>,
}

impl TimerHandle {
    fn new(cancel_tx: Sender<()>) -> Self {
        Self {
            cancel_tx: Some(cancel_tx),
        }
    }

    /// Cancels the pending task. A task that already started is unaffected.
    pub fn cancel(mut self) {
        self.disarm();
    }

    fn disarm(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            // Full or disconnected both mean the task will not run the work.
            tx.try_send(()).ok();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// Schedules one-shot tasks after a delay.
pub trait TimerScheduler: Send + Sync {
    /// Runs `task` after `delay` unless the returned handle is cancelled or
    /// dropped first. Must never run `task` synchronously.
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle>;
}

/// Production scheduler: one short-lived thread per armed deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl TimerScheduler for ThreadScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);

        thread::Builder::new()
            .name("silence-timer".to_string())
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(delay) {
                    task();
                }
            })
            .map_err(|e| IntervoxError::Other(format!("failed to spawn timer thread: {e}")))?;

        Ok(TimerHandle::new(cancel_tx))
    }
}

struct PendingTask {
    delay: Duration,
    task: TimerTask,
    cancel_rx: Receiver<()>,
}

impl PendingTask {
    fn is_cancelled(&self) -> bool {
        !matches!(self.cancel_rx.try_recv(), Err(TryRecvError::Empty))
    }
}

/// Test scheduler: tasks run only when the test fires them.
///
/// `fire_all_including_cancelled` deliberately runs superseded tasks too, to
/// reproduce a stale deadline racing its replacement.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    pending: Arc<Mutex<Vec<PendingTask>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn take_all(&self) -> Vec<PendingTask> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of scheduled tasks whose handle is still live.
    pub fn live_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|p| !p.is_cancelled())
            .count()
    }

    /// Total tasks scheduled and not yet fired, cancelled or not.
    pub fn scheduled_count(&self) -> usize {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Delay of the most recently scheduled task.
    pub fn last_delay(&self) -> Option<Duration> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .map(|p| p.delay)
    }

    /// Runs every task whose handle is still live, as if their deadlines
    /// expired. Returns how many ran.
    pub fn fire_live(&self) -> usize {
        let mut fired = 0;
        for pending in self.take_all() {
            if !pending.is_cancelled() {
                (pending.task)();
                fired += 1;
            }
        }
        fired
    }

    /// Runs every scheduled task in scheduling order, ignoring cancellation.
    pub fn fire_all_including_cancelled(&self) -> usize {
        let tasks = self.take_all();
        let count = tasks.len();
        for pending in tasks {
            (pending.task)();
        }
        count
    }
}

impl TimerScheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> Result<TimerHandle> {
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PendingTask {
                delay,
                task,
                cancel_rx,
            });
        Ok(TimerHandle::new(cancel_tx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_task(counter: &Arc<AtomicUsize>) -> TimerTask {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn thread_scheduler_runs_task_after_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = bounded(1);
        let c = counter.clone();
        let _handle = ThreadScheduler
            .schedule(
                Duration::from_millis(10),
                Box::new(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                    done_tx.send(()).ok();
                }),
            )
            .unwrap();

        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn thread_scheduler_cancel_prevents_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = ThreadScheduler
            .schedule(Duration::from_millis(200), counting_task(&counter))
            .unwrap();
        handle.cancel();

        thread::sleep(Duration::from_millis(400));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropping_handle_cancels_thread_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        drop(
            ThreadScheduler
                .schedule(Duration::from_millis(200), counting_task(&counter))
                .unwrap(),
        );

        thread::sleep(Duration::from_millis(400));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn manual_scheduler_fires_only_live_tasks() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let first = scheduler
            .schedule(Duration::from_secs(5), counting_task(&counter))
            .unwrap();
        let _second = scheduler
            .schedule(Duration::from_secs(5), counting_task(&counter))
            .unwrap();
        drop(first);

        assert_eq!(scheduler.scheduled_count(), 2);
        assert_eq!(scheduler.live_count(), 1);
        assert_eq!(scheduler.fire_live(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.scheduled_count(), 0);
    }

    #[test]
    fn manual_scheduler_can_replay_cancelled_tasks() {
        let scheduler = ManualScheduler::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            scheduler
                .schedule(Duration::from_secs(1), counting_task(&counter))
                .unwrap()
                .cancel();
        }

        assert_eq!(scheduler.live_count(), 0);
        assert_eq!(scheduler.fire_all_including_cancelled(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn manual_scheduler_records_delay() {
        let scheduler = ManualScheduler::new();
        let _h = scheduler
            .schedule(Duration::from_millis(1234), Box::new(|| {}))
            .unwrap();
        assert_eq!(scheduler.last_delay(), Some(Duration::from_millis(1234)));
    }
}
