//! Cancellable one-shot timers behind a scheduler abstraction.
//!
//! The session manager and status reporter never sleep directly: every delay
//! (watchdog, restart settle, network retry, status auto-hide) is an explicit
//! scheduled task returned as a cancellable handle. Production code uses
//! `TokioScheduler`; tests use `ManualScheduler` and advance virtual time
//! deterministically.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A deferred unit of work.
pub type ScheduledTask = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a scheduled task. Cancelling after the task has run is a no-op.
pub trait TimerHandle: Send {
    fn cancel(&self);
}

/// Schedules one-shot tasks after a delay.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> Box<dyn TimerHandle>;
}

// =============================================================================
// Tokio scheduler
// =============================================================================

/// Scheduler backed by the tokio runtime.
///
/// Must be used from within a runtime; each task is a spawned
/// `tokio::time::sleep` followed by the callback, and cancelling aborts the
/// spawned task.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> Box<dyn TimerHandle> {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task();
        });
        Box::new(TokioTimerHandle { handle })
    }
}

struct TokioTimerHandle {
    handle: tokio::task::JoinHandle<()>,
}

impl TimerHandle for TokioTimerHandle {
    fn cancel(&self) {
        self.handle.abort();
    }
}

// =============================================================================
// Manual scheduler (virtual time)
// =============================================================================

/// Deterministic scheduler for tests.
///
/// Tasks are held until `advance` moves virtual time past their deadline;
/// due tasks then run in deadline order (ties in scheduling order), outside
/// the scheduler's lock so they may schedule or cancel further tasks.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Arc<Mutex<ManualInner>>,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    tasks: Vec<PendingTask>,
}

struct PendingTask {
    id: u64,
    due: Duration,
    task: ScheduledTask,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.lock().expect("scheduler mutex poisoned").now
    }

    /// Number of tasks still waiting to fire.
    pub fn pending(&self) -> usize {
        self.inner
            .lock()
            .expect("scheduler mutex poisoned")
            .tasks
            .len()
    }

    /// Advance virtual time by `delta`, running every task that comes due.
    pub fn advance(&self, delta: Duration) {
        let target = {
            let inner = self.inner.lock().expect("scheduler mutex poisoned");
            inner.now + delta
        };

        loop {
            let next = {
                let mut inner = self.inner.lock().expect("scheduler mutex poisoned");
                let idx = inner
                    .tasks
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                match idx {
                    Some(i) => {
                        let pending = inner.tasks.remove(i);
                        inner.now = pending.due;
                        Some(pending.task)
                    }
                    None => {
                        inner.now = target;
                        None
                    }
                }
            };

            match next {
                // Run with the lock released: the task may schedule or
                // cancel other tasks.
                Some(task) => task(),
                None => break,
            }
        }
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> Box<dyn TimerHandle> {
        let mut inner = self.inner.lock().expect("scheduler mutex poisoned");
        let id = inner.next_id;
        inner.next_id += 1;
        let due = inner.now + delay;
        inner.tasks.push(PendingTask { id, due, task });
        Box::new(ManualTimerHandle {
            id,
            inner: Arc::clone(&self.inner),
        })
    }
}

struct ManualTimerHandle {
    id: u64,
    inner: Arc<Mutex<ManualInner>>,
}

impl TimerHandle for ManualTimerHandle {
    fn cancel(&self) {
        self.inner
            .lock()
            .expect("scheduler mutex poisoned")
            .tasks
            .retain(|t| t.id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_manual_fires_in_deadline_order() {
        let sched = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for (label, ms) in [("b", 200u64), ("a", 100), ("c", 300)] {
            let order = Arc::clone(&order);
            sched.schedule(
                Duration::from_millis(ms),
                Box::new(move || order.lock().unwrap().push(label)),
            );
        }

        sched.advance(Duration::from_millis(250));
        assert_eq!(*order.lock().unwrap(), vec!["a", "b"]);
        assert_eq!(sched.pending(), 1);

        sched.advance(Duration::from_millis(50));
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_manual_cancel_prevents_fire() {
        let sched = ManualScheduler::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = sched.schedule(
            Duration::from_millis(100),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        handle.cancel();
        sched.advance(Duration::from_secs(1));
        assert!(!fired.load(Ordering::SeqCst));
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_manual_cancel_after_fire_is_noop() {
        let sched = ManualScheduler::new();
        let handle = sched.schedule(Duration::from_millis(10), Box::new(|| {}));
        sched.advance(Duration::from_millis(20));
        handle.cancel();
        assert_eq!(sched.pending(), 0);
    }

    #[test]
    fn test_manual_task_can_schedule_followup() {
        let sched = ManualScheduler::new();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        let chained = sched.clone();
        sched.schedule(
            Duration::from_millis(100),
            Box::new(move || {
                chained.schedule(
                    Duration::from_millis(100),
                    Box::new(move || flag.store(true, Ordering::SeqCst)),
                );
            }),
        );

        // Both the task and its follow-up come due within one advance.
        sched.advance(Duration::from_millis(250));
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(sched.now(), Duration::from_millis(250));
    }

    #[test]
    fn test_manual_advance_moves_time_even_when_idle() {
        let sched = ManualScheduler::new();
        sched.advance(Duration::from_secs(5));
        assert_eq!(sched.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_manual_same_deadline_runs_in_schedule_order() {
        let sched = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second"] {
            let order = Arc::clone(&order);
            sched.schedule(
                Duration::from_millis(50),
                Box::new(move || order.lock().unwrap().push(label)),
            );
        }

        sched.advance(Duration::from_millis(50));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_tokio_scheduler_fires() {
        let sched = TokioScheduler::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let _handle = sched.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );

        tokio::time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("timer should fire")
            .unwrap();
    }

    #[tokio::test]
    async fn test_tokio_scheduler_cancel() {
        let sched = TokioScheduler::new();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let handle = sched.schedule(
            Duration::from_millis(50),
            Box::new(move || flag.store(true, Ordering::SeqCst)),
        );

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
