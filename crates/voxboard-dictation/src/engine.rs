//! Recognition engine abstraction.
//!
//! Voxboard does not perform speech recognition itself. The engine is a
//! black-box streaming capability behind these traits: the manager opens a
//! session, receives start/result/error/end events through a sink, and stops
//! the session when done. Any engine that can be configured for continuous
//! mode with interim results can sit behind this seam; tests use scripted
//! implementations.

use voxboard_core::error::Result;

/// Engine configuration for one session.
///
/// The manager always requests continuous mode with interim results and a
/// single alternative per result; only the locale varies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionConfig {
    /// BCP-47 locale, e.g. "en-US".
    pub locale: String,
    /// Keep the session open across utterances.
    pub continuous: bool,
    /// Deliver best-guess results before they are finalized.
    pub interim_results: bool,
    /// Alternatives per result entry.
    pub max_alternatives: u32,
}

impl RecognitionConfig {
    pub fn for_locale(locale: &str) -> Self {
        Self {
            locale: locale.to_string(),
            continuous: true,
            interim_results: true,
            max_alternatives: 1,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self::for_locale("en-US")
    }
}

/// One entry within a result batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    /// Best transcript for this entry.
    pub transcript: String,
    /// Whether the engine has committed to this transcript.
    pub is_final: bool,
}

impl ResultEntry {
    pub fn final_text(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            is_final: true,
        }
    }

    pub fn interim(transcript: &str) -> Self {
        Self {
            transcript: transcript.to_string(),
            is_final: false,
        }
    }
}

/// A batch of incremental results from the engine.
///
/// `start_index` is the position of the first entry within the engine's
/// full result list for the session; `entries` holds everything from that
/// index on, finalized fragments first-come-first and at most one trailing
/// interim tail in practice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultBatch {
    pub start_index: usize,
    pub entries: Vec<ResultEntry>,
}

/// Classified engine errors.
///
/// Only `Network` is recoverable; everything else ends the current
/// dictation with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// No speech was detected before the engine gave up.
    NoSpeech,
    /// The microphone could not be opened.
    AudioCapture,
    /// Microphone permission was denied.
    NotAllowed,
    /// Transient connectivity failure to the recognition service.
    Network,
    /// The session was aborted by the platform.
    Aborted,
    /// Anything the engine reports that has no dedicated class.
    Other(String),
}

impl EngineErrorKind {
    /// Recoverable errors trigger a silent delayed restart instead of
    /// ending the dictation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, EngineErrorKind::Network)
    }

    /// Stable error code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            EngineErrorKind::NoSpeech => "no-speech",
            EngineErrorKind::AudioCapture => "audio-capture",
            EngineErrorKind::NotAllowed => "not-allowed",
            EngineErrorKind::Network => "network",
            EngineErrorKind::Aborted => "aborted",
            EngineErrorKind::Other(_) => "other",
        }
    }

    /// User-facing message shown when this error ends the dictation.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineErrorKind::NoSpeech => "No speech detected",
            EngineErrorKind::AudioCapture => "Microphone not accessible",
            EngineErrorKind::NotAllowed => "Microphone permission denied",
            _ => "Speech recognition failed",
        }
    }
}

impl std::fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrorKind::Other(msg) => write!(f, "other: {}", msg),
            _ => f.write_str(self.code()),
        }
    }
}

/// Events an engine session delivers through its sink.
///
/// Events for a given session arrive in emission order, but a superseded
/// session's events may still arrive after a restart has begun; the manager
/// discards those by session id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The engine confirmed the session is live.
    Started,
    /// An incremental result batch.
    Result(ResultBatch),
    /// A classified failure.
    Error(EngineErrorKind),
    /// The session ended, either on request or on the engine's own accord.
    Ended,
}

/// Callback through which a session delivers its events.
pub type EventSink = Box<dyn Fn(EngineEvent) + Send + Sync>;

/// A live streaming recognition session.
pub trait EngineSession: Send + Sync {
    /// Request a graceful stop. The engine confirms with `EngineEvent::Ended`.
    /// Stopping an already-stopped session may return an error; callers
    /// discarding a session ignore it.
    fn stop(&self) -> Result<()>;
}

/// Factory for streaming recognition sessions.
pub trait RecognitionEngine: Send + Sync {
    /// Open a new session. May fail synchronously (e.g. the capability is
    /// unavailable or the device is busy); the manager reports that as a
    /// start failure.
    fn open(&self, config: &RecognitionConfig, sink: EventSink) -> Result<Box<dyn EngineSession>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_engine_setup() {
        let config = RecognitionConfig::default();
        assert_eq!(config.locale, "en-US");
        assert!(config.continuous);
        assert!(config.interim_results);
        assert_eq!(config.max_alternatives, 1);
    }

    #[test]
    fn test_only_network_is_recoverable() {
        assert!(EngineErrorKind::Network.is_recoverable());
        assert!(!EngineErrorKind::NoSpeech.is_recoverable());
        assert!(!EngineErrorKind::AudioCapture.is_recoverable());
        assert!(!EngineErrorKind::NotAllowed.is_recoverable());
        assert!(!EngineErrorKind::Aborted.is_recoverable());
        assert!(!EngineErrorKind::Other("x".into()).is_recoverable());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(EngineErrorKind::NoSpeech.user_message(), "No speech detected");
        assert_eq!(
            EngineErrorKind::AudioCapture.user_message(),
            "Microphone not accessible"
        );
        assert_eq!(
            EngineErrorKind::NotAllowed.user_message(),
            "Microphone permission denied"
        );
        assert_eq!(
            EngineErrorKind::Aborted.user_message(),
            "Speech recognition failed"
        );
        assert_eq!(
            EngineErrorKind::Other("weird".into()).user_message(),
            "Speech recognition failed"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(EngineErrorKind::Network.to_string(), "network");
        assert_eq!(
            EngineErrorKind::Other("device lost".into()).to_string(),
            "other: device lost"
        );
    }

    #[test]
    fn test_result_entry_constructors() {
        let entry = ResultEntry::final_text("hello");
        assert!(entry.is_final);
        assert_eq!(entry.transcript, "hello");

        let entry = ResultEntry::interim("hel");
        assert!(!entry.is_final);
    }
}
