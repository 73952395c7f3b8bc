//! Voxboard dictation crate - the recognition session manager.
//!
//! Maintains the illusion of one unbroken dictation stream across a speech
//! recognition engine that can only run in bounded, failure-prone bursts.
//! The `SessionManager` drives a strict state machine
//! (Idle -> Starting -> Listening -> Restarting/Stopping/Errored -> Idle),
//! restarts the engine before its ~60 second auto-stop, merges interim and
//! finalized transcript fragments into the shared text surface, and converts
//! every engine failure into either a silent restart or a transient status
//! message.

pub mod engine;
pub mod session;
pub mod state;
pub mod transcript;

pub use engine::{
    EngineErrorKind, EngineEvent, EngineSession, EventSink, RecognitionConfig, RecognitionEngine,
    ResultBatch, ResultEntry,
};
pub use session::SessionManager;
pub use state::SessionState;
pub use transcript::Transcript;
