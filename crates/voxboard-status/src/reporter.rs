//! Status reporter with two-step auto-hide.
//!
//! Hiding is fade-then-hide: after the hide delay the message is faded,
//! and after the fade duration it is actually hidden and the fade reset so
//! the surface is ready for the next message. A generation counter makes an
//! overwrite implicitly cancel any pending hide.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use voxboard_core::scheduler::{Scheduler, TimerHandle};
use voxboard_core::types::StatusKind;

/// Display surface for status messages. Rendering is out of scope; the demo
/// binary prints to the terminal and tests record calls.
pub trait StatusSurface: Send + Sync {
    /// Show `message` with the given kind, replacing whatever is shown.
    fn display(&self, message: &str, kind: StatusKind);

    /// Fade the current message in or out without hiding it.
    fn set_faded(&self, faded: bool);

    /// Hide the message entirely.
    fn hide(&self);
}

#[derive(Default)]
struct ReporterInner {
    /// Bumped on every show/hide; scheduled steps compare their snapshot
    /// against it and bail out when superseded.
    generation: u64,
    hide_timer: Option<Box<dyn TimerHandle>>,
    fade_timer: Option<Box<dyn TimerHandle>>,
}

impl ReporterInner {
    fn cancel_timers(&mut self) {
        if let Some(t) = self.hide_timer.take() {
            t.cancel();
        }
        if let Some(t) = self.fade_timer.take() {
            t.cancel();
        }
    }
}

/// Shows transient status messages and auto-hides them after a delay.
/// Cheap to clone; clones share the surface and timer state.
#[derive(Clone)]
pub struct StatusReporter {
    surface: Arc<dyn StatusSurface>,
    scheduler: Arc<dyn Scheduler>,
    fade: Duration,
    inner: Arc<Mutex<ReporterInner>>,
}

impl StatusReporter {
    pub fn new(
        surface: Arc<dyn StatusSurface>,
        scheduler: Arc<dyn Scheduler>,
        fade: Duration,
    ) -> Self {
        Self {
            surface,
            scheduler,
            fade,
            inner: Arc::new(Mutex::new(ReporterInner::default())),
        }
    }

    /// Show a message, overwriting the current one and cancelling any
    /// pending hide.
    pub fn show(&self, message: &str, kind: StatusKind) {
        {
            let mut inner = self.inner.lock().expect("reporter mutex poisoned");
            inner.generation += 1;
            inner.cancel_timers();
        }
        tracing::debug!(kind = kind.as_str(), %message, "Status shown");
        self.surface.set_faded(false);
        self.surface.display(message, kind);
    }

    /// Schedule the currently shown message to fade and hide after `delay`.
    pub fn hide_after(&self, delay: Duration) {
        let generation = {
            let mut inner = self.inner.lock().expect("reporter mutex poisoned");
            inner.cancel_timers();
            inner.generation
        };

        let surface = Arc::clone(&self.surface);
        let scheduler = Arc::clone(&self.scheduler);
        let shared = Arc::clone(&self.inner);
        let fade = self.fade;

        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                {
                    let inner = shared.lock().expect("reporter mutex poisoned");
                    if inner.generation != generation {
                        return;
                    }
                }
                surface.set_faded(true);

                let surface2 = Arc::clone(&surface);
                let shared2 = Arc::clone(&shared);
                let fade_handle = scheduler.schedule(
                    fade,
                    Box::new(move || {
                        {
                            let inner = shared2.lock().expect("reporter mutex poisoned");
                            if inner.generation != generation {
                                return;
                            }
                        }
                        surface2.hide();
                        // Reset opacity so the next message shows at full
                        // strength.
                        surface2.set_faded(false);
                    }),
                );
                shared
                    .lock()
                    .expect("reporter mutex poisoned")
                    .fade_timer = Some(fade_handle);
            }),
        );

        self.inner
            .lock()
            .expect("reporter mutex poisoned")
            .hide_timer = Some(handle);
    }

    /// Hide immediately, cancelling any pending hide.
    pub fn hide_now(&self) {
        {
            let mut inner = self.inner.lock().expect("reporter mutex poisoned");
            inner.generation += 1;
            inner.cancel_timers();
        }
        self.surface.hide();
        self.surface.set_faded(false);
    }
}

// =============================================================================
// Recording surface
// =============================================================================

/// `StatusSurface` that records calls in memory.
///
/// Used by tests across the workspace and by headless embeddings that only
/// want to inspect the current status.
#[derive(Default)]
pub struct MemoryStatus {
    inner: Mutex<MemoryStatusInner>,
}

#[derive(Default)]
struct MemoryStatusInner {
    message: String,
    kind: Option<StatusKind>,
    visible: bool,
    faded: bool,
    history: Vec<(String, StatusKind)>,
}

impl MemoryStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently shown `(message, kind)`, if visible.
    pub fn current(&self) -> Option<(String, StatusKind)> {
        let inner = self.inner.lock().expect("status mutex poisoned");
        if inner.visible {
            inner.kind.map(|k| (inner.message.clone(), k))
        } else {
            None
        }
    }

    pub fn is_visible(&self) -> bool {
        self.inner.lock().expect("status mutex poisoned").visible
    }

    pub fn is_faded(&self) -> bool {
        self.inner.lock().expect("status mutex poisoned").faded
    }

    /// Every `(message, kind)` ever displayed, in order.
    pub fn history(&self) -> Vec<(String, StatusKind)> {
        self.inner
            .lock()
            .expect("status mutex poisoned")
            .history
            .clone()
    }
}

impl StatusSurface for MemoryStatus {
    fn display(&self, message: &str, kind: StatusKind) {
        let mut inner = self.inner.lock().expect("status mutex poisoned");
        inner.message = message.to_string();
        inner.kind = Some(kind);
        inner.visible = true;
        inner.history.push((message.to_string(), kind));
    }

    fn set_faded(&self, faded: bool) {
        self.inner.lock().expect("status mutex poisoned").faded = faded;
    }

    fn hide(&self) {
        self.inner.lock().expect("status mutex poisoned").visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxboard_core::scheduler::ManualScheduler;

    fn reporter() -> (StatusReporter, Arc<MemoryStatus>, Arc<ManualScheduler>) {
        let surface = Arc::new(MemoryStatus::new());
        let scheduler = Arc::new(ManualScheduler::new());
        let reporter = StatusReporter::new(
            Arc::clone(&surface) as Arc<dyn StatusSurface>,
            Arc::clone(&scheduler) as Arc<dyn Scheduler>,
            Duration::from_millis(300),
        );
        (reporter, surface, scheduler)
    }

    #[test]
    fn test_show_displays_message() {
        let (reporter, surface, _) = reporter();
        reporter.show("Listening...", StatusKind::Info);
        assert_eq!(
            surface.current(),
            Some(("Listening...".to_string(), StatusKind::Info))
        );
    }

    #[test]
    fn test_hide_after_fades_then_hides() {
        let (reporter, surface, scheduler) = reporter();
        reporter.show("Speech recognized!", StatusKind::Success);
        reporter.hide_after(Duration::from_secs(2));

        // Still fully visible before the delay.
        scheduler.advance(Duration::from_millis(1999));
        assert!(surface.is_visible());
        assert!(!surface.is_faded());

        // Delay elapsed: faded but not yet hidden.
        scheduler.advance(Duration::from_millis(1));
        assert!(surface.is_visible());
        assert!(surface.is_faded());

        // Fade elapsed: hidden and opacity reset.
        scheduler.advance(Duration::from_millis(300));
        assert!(!surface.is_visible());
        assert!(!surface.is_faded());
    }

    #[test]
    fn test_overwrite_cancels_pending_hide() {
        let (reporter, surface, scheduler) = reporter();
        reporter.show("Recording stopped", StatusKind::Info);
        reporter.hide_after(Duration::from_secs(2));

        scheduler.advance(Duration::from_secs(1));
        reporter.show("Listening...", StatusKind::Info);

        // The original hide would have fired here; the new message survives.
        scheduler.advance(Duration::from_secs(5));
        assert_eq!(
            surface.current(),
            Some(("Listening...".to_string(), StatusKind::Info))
        );
        assert!(!surface.is_faded());
    }

    #[test]
    fn test_overwrite_during_fade_window() {
        let (reporter, surface, scheduler) = reporter();
        reporter.show("old", StatusKind::Info);
        reporter.hide_after(Duration::from_secs(1));

        // Into the fade window.
        scheduler.advance(Duration::from_millis(1100));
        assert!(surface.is_faded());

        reporter.show("new", StatusKind::Error);
        scheduler.advance(Duration::from_secs(1));
        assert_eq!(surface.current(), Some(("new".to_string(), StatusKind::Error)));
        assert!(!surface.is_faded());
    }

    #[test]
    fn test_hide_now_cancels_timers() {
        let (reporter, surface, scheduler) = reporter();
        reporter.show("Processing...", StatusKind::Info);
        reporter.hide_after(Duration::from_secs(3));
        reporter.hide_now();

        assert!(!surface.is_visible());
        scheduler.advance(Duration::from_secs(10));
        assert!(!surface.is_visible());
        assert!(!surface.is_faded());
    }

    #[test]
    fn test_history_records_overwrites() {
        let (reporter, surface, _) = reporter();
        reporter.show("a", StatusKind::Info);
        reporter.show("b", StatusKind::Error);
        let history = surface.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].0, "a");
        assert_eq!(history[1], ("b".to_string(), StatusKind::Error));
    }
}
