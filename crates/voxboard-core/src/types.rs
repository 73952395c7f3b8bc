use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Enums
// =============================================================================

/// Severity/kind of a transient status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Neutral progress information ("Listening...", "Processing...").
    Info,
    /// A dictation completed with recognized speech.
    Success,
    /// A failure the user should know about.
    Error,
}

impl StatusKind {
    /// Stable lowercase name, used for logging and surface styling hooks.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        }
    }
}

/// Why a recognition session was torn down and replaced mid-dictation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartReason {
    /// The proactive watchdog fired before the engine's own auto-stop.
    Watchdog,
    /// The engine ended the session on its own while dictation was active.
    EngineEnded,
    /// A recoverable network error from the engine.
    NetworkError,
}

impl std::fmt::Display for RestartReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartReason::Watchdog => write!(f, "watchdog"),
            RestartReason::EngineEnded => write!(f, "engine_ended"),
            RestartReason::NetworkError => write!(f, "network_error"),
        }
    }
}

// =============================================================================
// Newtype Wrappers
// =============================================================================

/// Monotonically increasing identifier for a recognition session attempt.
///
/// Every deferred callback (timer or engine event) captures the id it was
/// created under; comparing it against the manager's current id is the
/// single authoritative staleness check. The id is bumped on every restart
/// and on every teardown, so callbacks from a superseded session never act.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Returns the next id in the sequence.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unix timestamp in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}
