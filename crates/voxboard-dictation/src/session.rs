//! The recognition session manager.
//!
//! Owns the lifecycle of streaming recognition sessions: start, stop,
//! proactive watchdog restarts, error recovery, and transcript merging into
//! the shared text surface. The manager presents one unbroken dictation
//! stream even though the underlying engine only runs in bounded bursts.
//!
//! Staleness guard: every engine session gets a fresh `SessionId`, and every
//! deferred callback (engine event or timer) carries the id it was created
//! under. A callback acts only while its id is still the manager's current
//! one and the dictation is active and not manually stopped; the id is
//! bumped on every restart and teardown, so callbacks from superseded
//! sessions are no-ops.
//!
//! Lock discipline: the inner mutex is never held across calls into the
//! engine, scheduler, surfaces, or event channel, so engines that deliver
//! events synchronously cannot deadlock the manager.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use uuid::Uuid;

use voxboard_core::config::VoxboardConfig;
use voxboard_core::events::KeyboardEvent;
use voxboard_core::scheduler::{Scheduler, TimerHandle};
use voxboard_core::types::{RestartReason, SessionId, StatusKind, Timestamp};
use voxboard_status::StatusReporter;
use voxboard_text::TextSurface;

use crate::engine::{
    EngineErrorKind, EngineEvent, EngineSession, EventSink, RecognitionConfig, RecognitionEngine,
    ResultBatch,
};
use crate::state::SessionState;
use crate::transcript::Transcript;

#[derive(Default)]
struct Inner {
    state: SessionState,
    /// True from start_dictation until the dictation ends for any reason.
    active: bool,
    /// True once the user requested a stop; suppresses restarts and error
    /// reporting for the session being wound down.
    manually_stopped: bool,
    /// Id of the engine session all current callbacks must match.
    current: SessionId,
    /// Correlates all sessions of one voice-button press in logs and events.
    dictation_id: Option<Uuid>,
    session: Option<Arc<dyn EngineSession>>,
    transcript: Transcript,
    watchdog: Option<Box<dyn TimerHandle>>,
    restart: Option<Box<dyn TimerHandle>>,
}

impl Inner {
    fn is_current(&self, sid: SessionId) -> bool {
        self.current == sid && self.active && !self.manually_stopped
    }

    fn cancel_timers(&mut self) {
        if let Some(t) = self.watchdog.take() {
            t.cancel();
        }
        if let Some(t) = self.restart.take() {
            t.cancel();
        }
    }

    /// Apply a state transition if the matrix allows it; invalid edges are
    /// rejected and logged, leaving the state unchanged.
    fn transition(&mut self, target: SessionState) {
        if self.state.can_transition_to(target) {
            tracing::debug!("Session state: {} -> {}", self.state, target);
            self.state = target;
        } else {
            tracing::warn!("Invalid session state transition rejected: {} -> {}", self.state, target);
        }
    }
}

/// Maintains one continuous dictation stream across bounded engine sessions.
///
/// Constructed once per keyboard instance and shared as an `Arc`; engine
/// callbacks and timers hold a `Weak` reference so a dropped manager simply
/// stops reacting.
pub struct SessionManager {
    engine: Arc<dyn RecognitionEngine>,
    surface: Arc<dyn TextSurface>,
    status: StatusReporter,
    scheduler: Arc<dyn Scheduler>,
    config: VoxboardConfig,
    recognition: RecognitionConfig,
    events: broadcast::Sender<KeyboardEvent>,
    weak: Weak<SessionManager>,
    inner: Mutex<Inner>,
}

impl SessionManager {
    /// Create a manager wired to its collaborators.
    pub fn new(
        engine: Arc<dyn RecognitionEngine>,
        surface: Arc<dyn TextSurface>,
        status: StatusReporter,
        scheduler: Arc<dyn Scheduler>,
        config: VoxboardConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        let recognition = RecognitionConfig::for_locale(&config.recognition.locale);
        Arc::new_cyclic(|weak| Self {
            engine,
            surface,
            status,
            scheduler,
            config,
            recognition,
            events,
            weak: weak.clone(),
            inner: Mutex::new(Inner::default()),
        })
    }

    /// Subscribe to domain events.
    pub fn subscribe(&self) -> broadcast::Receiver<KeyboardEvent> {
        self.events.subscribe()
    }

    /// Current state of the session state machine.
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Whether a dictation is logically in progress.
    pub fn is_listening(&self) -> bool {
        self.lock().active
    }

    /// The merged transcript as currently displayed.
    pub fn merged_transcript(&self) -> String {
        self.lock().transcript.merged()
    }

    // =========================================================================
    // Public contract
    // =========================================================================

    /// Begin dictation. Idempotent while a dictation is already running.
    ///
    /// Never returns an error: engine failures surface as status messages.
    pub fn start_dictation(&self) {
        let sid = {
            let mut inner = self.lock();
            if inner.active {
                tracing::debug!("start_dictation ignored: already listening");
                return;
            }
            inner.active = true;
            inner.manually_stopped = false;
            inner.cancel_timers();
            inner.dictation_id = Some(Uuid::new_v4());
            inner.current = inner.current.next();
            inner.transition(SessionState::Starting);
            inner.current
        };
        tracing::info!(session = %sid, "Starting dictation");
        self.open_session(sid);
    }

    /// Request a graceful stop. Idempotent while idle.
    pub fn stop_dictation(&self) {
        let session = {
            let mut inner = self.lock();
            if !inner.active {
                tracing::debug!("stop_dictation ignored: not listening");
                return;
            }
            if inner.manually_stopped {
                return; // stop already in flight
            }
            inner.manually_stopped = true;
            inner.cancel_timers();
            inner.transition(SessionState::Stopping);
            inner.session.clone()
        };

        tracing::info!("Stopping dictation");
        self.status.show("Processing...", StatusKind::Info);

        match session {
            Some(session) => {
                if let Err(e) = session.stop() {
                    tracing::warn!(error = %e, "Engine stop failed; forcing teardown");
                    {
                        let mut inner = self.lock();
                        inner.active = false;
                        inner.session = None;
                        inner.current = inner.current.next();
                        inner.dictation_id = None;
                        inner.transition(SessionState::Idle);
                    }
                    self.status.hide_now();
                }
                // Otherwise the engine confirms with an Ended event.
            }
            None => {
                // Stopped inside a restart gap: there is no engine session
                // to wait for, the stop completes immediately.
                self.complete_stop();
            }
        }
    }

    // =========================================================================
    // Engine event handling
    // =========================================================================

    /// Entry point for all events of the session tagged `sid`.
    pub fn handle_engine_event(&self, sid: SessionId, event: EngineEvent) {
        match event {
            EngineEvent::Started => self.on_started(sid),
            EngineEvent::Result(batch) => self.on_result(sid, batch),
            EngineEvent::Error(kind) => self.on_error(sid, kind),
            EngineEvent::Ended => self.on_ended(sid),
        }
    }

    fn on_started(&self, sid: SessionId) {
        let dictation_id = {
            let mut inner = self.lock();
            if !inner.is_current(sid) {
                tracing::debug!(session = %sid, "Ignoring start confirmation from stale session");
                return;
            }
            inner.transition(SessionState::Listening);
            inner.dictation_id.unwrap_or_default()
        };

        tracing::info!(session = %sid, "Recognition session listening");

        // Arm the watchdog to restart before the engine's own auto-stop.
        let weak = self.weak.clone();
        let handle = self.scheduler.schedule(
            self.config.recognition.watchdog(),
            Box::new(move || {
                if let Some(manager) = weak.upgrade() {
                    manager.on_watchdog(sid);
                }
            }),
        );
        {
            let mut inner = self.lock();
            if inner.is_current(sid) {
                if let Some(old) = inner.watchdog.replace(handle) {
                    old.cancel();
                }
            } else {
                handle.cancel();
            }
        }

        self.status.show("Listening...", StatusKind::Info);
        self.emit(KeyboardEvent::DictationStarted {
            dictation_id,
            session: sid,
            timestamp: Timestamp::now(),
        });
    }

    fn on_result(&self, sid: SessionId, batch: ResultBatch) {
        let update = {
            let mut inner = self.lock();
            if !inner.is_current(sid) {
                tracing::debug!(session = %sid, "Ignoring results from stale session");
                return;
            }
            inner.transcript.apply(&batch);
            (
                inner.transcript.merged(),
                inner.dictation_id.unwrap_or_default(),
                inner.transcript.finalized().chars().count(),
                inner.transcript.interim().chars().count(),
            )
        };
        let (text, dictation_id, finalized_chars, interim_chars) = update;

        tracing::debug!(
            session = %sid,
            start_index = batch.start_index,
            entries = batch.entries.len(),
            "Result batch merged"
        );

        // Dictation always appends: replace the surface content and force
        // the cursor to end-of-text.
        let end = text.chars().count();
        self.surface.set_value(&text);
        self.surface.set_selection(end, end);

        self.emit(KeyboardEvent::TranscriptUpdated {
            dictation_id,
            finalized_chars,
            interim_chars,
            timestamp: Timestamp::now(),
        });
    }

    fn on_error(&self, sid: SessionId, kind: EngineErrorKind) {
        if kind.is_recoverable() {
            {
                let mut inner = self.lock();
                if !inner.is_current(sid) {
                    tracing::debug!(session = %sid, "Ignoring error from stale session");
                    return;
                }
                if let Some(t) = inner.watchdog.take() {
                    t.cancel();
                }
                if inner.state != SessionState::Restarting {
                    inner.transition(SessionState::Restarting);
                }
            }
            tracing::warn!(session = %sid, code = kind.code(), "Recoverable engine error; retrying");
            self.schedule_restart(
                sid,
                self.config.recognition.network_retry(),
                RestartReason::NetworkError,
            );
            return;
        }

        let teardown = {
            let mut inner = self.lock();
            if inner.current != sid {
                tracing::debug!(session = %sid, "Ignoring error from stale session");
                return;
            }
            if inner.manually_stopped || !inner.active {
                tracing::debug!(code = kind.code(), "Engine error during stop ignored");
                return;
            }
            inner.active = false;
            inner.cancel_timers();
            inner.current = inner.current.next();
            inner.transition(SessionState::Errored);
            inner.transition(SessionState::Idle);
            (inner.session.take(), inner.dictation_id.take().unwrap_or_default())
        };
        let (session, dictation_id) = teardown;
        if let Some(session) = session {
            if let Err(e) = session.stop() {
                tracing::debug!(error = %e, "Ignoring stop error for failed session");
            }
        }

        tracing::warn!(session = %sid, code = kind.code(), "Recognition session failed");
        self.status.show(kind.user_message(), StatusKind::Error);
        self.status.hide_after(self.config.status.error_hide());
        self.emit(KeyboardEvent::DictationFailed {
            dictation_id,
            reason: kind.to_string(),
            timestamp: Timestamp::now(),
        });
    }

    fn on_ended(&self, sid: SessionId) {
        let restart = {
            let mut inner = self.lock();
            if inner.current != sid {
                tracing::debug!(session = %sid, "Ignoring end of stale session");
                return;
            }
            if !inner.active {
                return;
            }
            if !inner.manually_stopped {
                // The engine gave up on its own; keep the dictation alive.
                inner.session = None;
                if let Some(t) = inner.watchdog.take() {
                    t.cancel();
                }
                if inner.state != SessionState::Restarting {
                    inner.transition(SessionState::Restarting);
                }
                true
            } else {
                false
            }
        };

        if restart {
            tracing::debug!(session = %sid, "Engine ended session on its own; restarting");
            self.schedule_restart(
                sid,
                self.config.recognition.restart_settle(),
                RestartReason::EngineEnded,
            );
        } else {
            self.complete_stop();
        }
    }

    // =========================================================================
    // Restarts
    // =========================================================================

    fn on_watchdog(&self, sid: SessionId) {
        {
            let mut inner = self.lock();
            if !inner.is_current(sid) || inner.state != SessionState::Listening {
                tracing::debug!(session = %sid, "Stale watchdog ignored");
                return;
            }
            inner.watchdog = None;
            inner.transition(SessionState::Restarting);
        }
        tracing::info!(session = %sid, "Watchdog fired; restarting before engine auto-stop");
        self.schedule_restart(
            sid,
            self.config.recognition.restart_settle(),
            RestartReason::Watchdog,
        );
    }

    fn schedule_restart(&self, sid: SessionId, delay: Duration, reason: RestartReason) {
        let weak = self.weak.clone();
        let handle = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(manager) = weak.upgrade() {
                    manager.on_restart_due(sid, reason);
                }
            }),
        );

        let mut inner = self.lock();
        if inner.is_current(sid) {
            if let Some(old) = inner.restart.replace(handle) {
                old.cancel();
            }
        } else {
            handle.cancel();
        }
    }

    fn on_restart_due(&self, sid: SessionId, reason: RestartReason) {
        let (new_sid, dictation_id) = {
            let mut inner = self.lock();
            if !inner.is_current(sid) {
                tracing::debug!(session = %sid, "Stale restart timer ignored");
                return;
            }
            inner.cancel_timers();
            // Unconfirmed text from the discarded session is dropped;
            // finalized fragments survive the restart.
            inner.transcript.clear_interim();
            inner.current = inner.current.next();
            inner.transition(SessionState::Starting);
            (inner.current, inner.dictation_id.unwrap_or_default())
        };

        tracing::info!(reason = %reason, session = %new_sid, "Opening replacement recognition session");
        self.emit(KeyboardEvent::SessionRestarted {
            dictation_id,
            session: new_sid,
            reason,
            timestamp: Timestamp::now(),
        });
        self.open_session(new_sid);
    }

    // =========================================================================
    // Session plumbing
    // =========================================================================

    fn open_session(&self, sid: SessionId) {
        // Discard any previous engine session first. Stopping an already
        // stopped session may error; that is expected here.
        let old = self.lock().session.take();
        if let Some(session) = old {
            if let Err(e) = session.stop() {
                tracing::debug!(error = %e, "Ignoring stop error for discarded session");
            }
        }

        let sink = self.event_sink(sid);
        match self.engine.open(&self.recognition, sink) {
            Ok(session) => {
                let session: Arc<dyn EngineSession> = Arc::from(session);
                let superseded = {
                    let mut inner = self.lock();
                    if inner.is_current(sid) {
                        inner.session = Some(Arc::clone(&session));
                        false
                    } else {
                        true
                    }
                };
                if superseded {
                    // A stop or newer session won the race while opening.
                    if let Err(e) = session.stop() {
                        tracing::debug!(error = %e, "Ignoring stop error for superseded session");
                    }
                }
            }
            Err(e) => self.fail_start(sid, e),
        }
    }

    fn event_sink(&self, sid: SessionId) -> EventSink {
        let weak = self.weak.clone();
        Box::new(move |event| {
            if let Some(manager) = weak.upgrade() {
                manager.handle_engine_event(sid, event);
            }
        })
    }

    fn fail_start(&self, sid: SessionId, error: voxboard_core::VoxboardError) {
        {
            let mut inner = self.lock();
            if inner.current != sid {
                return;
            }
            inner.active = false;
            inner.manually_stopped = false;
            inner.cancel_timers();
            inner.current = inner.current.next();
            inner.dictation_id = None;
            inner.transition(SessionState::Idle);
        }
        tracing::error!(error = %error, "Failed to start recognition session");
        self.status.show("Failed to start speech recognition", StatusKind::Error);
        self.status.hide_after(self.config.status.error_hide());
    }

    /// Finish a manual stop: report the outcome and return to Idle.
    fn complete_stop(&self) {
        let (had_speech, dictation_id) = {
            let mut inner = self.lock();
            inner.active = false;
            inner.cancel_timers();
            inner.session = None;
            inner.current = inner.current.next();
            inner.transition(SessionState::Idle);
            (
                inner.transcript.has_finalized(),
                inner.dictation_id.take().unwrap_or_default(),
            )
        };

        tracing::info!(had_speech, "Dictation stopped");
        if had_speech {
            self.status.show("Speech recognized!", StatusKind::Success);
        } else {
            self.status.show("Recording stopped", StatusKind::Info);
        }
        self.status.hide_after(self.config.status.stop_hide());
        self.emit(KeyboardEvent::DictationStopped {
            dictation_id,
            had_speech,
            timestamp: Timestamp::now(),
        });
    }

    fn emit(&self, event: KeyboardEvent) {
        tracing::debug!(event = event.event_name(), "Keyboard event");
        // Send fails only when nobody subscribed, which is fine.
        let _ = self.events.send(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("session mutex poisoned")
    }
}

// =============================================================================
// Tests
// =============================================================================
