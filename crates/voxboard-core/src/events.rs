use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{RestartReason, SessionId, Timestamp};

/// Domain events emitted by the keyboard while dictation runs.
///
/// Events are published by the session manager after state changes and
/// consumed by observers (the app binary logs them; an embedding host could
/// drive indicators from them). `dictation_id` identifies one voice-button
/// press-to-release span; `session` identifies the individual engine
/// attempts within it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum KeyboardEvent {
    /// The engine confirmed a listening session.
    DictationStarted {
        dictation_id: Uuid,
        session: SessionId,
        timestamp: Timestamp,
    },

    /// The active engine session was discarded and replaced.
    SessionRestarted {
        dictation_id: Uuid,
        session: SessionId,
        reason: RestartReason,
        timestamp: Timestamp,
    },

    /// A result batch was merged into the text surface.
    TranscriptUpdated {
        dictation_id: Uuid,
        finalized_chars: usize,
        interim_chars: usize,
        timestamp: Timestamp,
    },

    /// Dictation ended cleanly (manual stop confirmed by the engine).
    DictationStopped {
        dictation_id: Uuid,
        had_speech: bool,
        timestamp: Timestamp,
    },

    /// Dictation ended on a fatal engine error.
    DictationFailed {
        dictation_id: Uuid,
        reason: String,
        timestamp: Timestamp,
    },
}

impl KeyboardEvent {
    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            KeyboardEvent::DictationStarted { timestamp, .. }
            | KeyboardEvent::SessionRestarted { timestamp, .. }
            | KeyboardEvent::TranscriptUpdated { timestamp, .. }
            | KeyboardEvent::DictationStopped { timestamp, .. }
            | KeyboardEvent::DictationFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            KeyboardEvent::DictationStarted { .. } => "dictation_started",
            KeyboardEvent::SessionRestarted { .. } => "session_restarted",
            KeyboardEvent::TranscriptUpdated { .. } => "transcript_updated",
            KeyboardEvent::DictationStopped { .. } => "dictation_stopped",
            KeyboardEvent::DictationFailed { .. } => "dictation_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_timestamp() {
        let ts = Timestamp::now();
        let event = KeyboardEvent::DictationStarted {
            dictation_id: Uuid::new_v4(),
            session: SessionId(1),
            timestamp: ts,
        };
        assert_eq!(event.timestamp(), ts);
    }

    #[test]
    fn test_event_names() {
        let ts = Timestamp::now();
        let id = Uuid::new_v4();

        let events: Vec<(KeyboardEvent, &str)> = vec![
            (
                KeyboardEvent::DictationStarted {
                    dictation_id: id,
                    session: SessionId(1),
                    timestamp: ts,
                },
                "dictation_started",
            ),
            (
                KeyboardEvent::SessionRestarted {
                    dictation_id: id,
                    session: SessionId(2),
                    reason: RestartReason::Watchdog,
                    timestamp: ts,
                },
                "session_restarted",
            ),
            (
                KeyboardEvent::TranscriptUpdated {
                    dictation_id: id,
                    finalized_chars: 12,
                    interim_chars: 4,
                    timestamp: ts,
                },
                "transcript_updated",
            ),
            (
                KeyboardEvent::DictationStopped {
                    dictation_id: id,
                    had_speech: true,
                    timestamp: ts,
                },
                "dictation_stopped",
            ),
            (
                KeyboardEvent::DictationFailed {
                    dictation_id: id,
                    reason: "not_allowed".to_string(),
                    timestamp: ts,
                },
                "dictation_failed",
            ),
        ];

        for (event, expected) in &events {
            assert_eq!(event.event_name(), *expected);
        }
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = KeyboardEvent::SessionRestarted {
            dictation_id: Uuid::new_v4(),
            session: SessionId(3),
            reason: RestartReason::NetworkError,
            timestamp: Timestamp::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        let rt: KeyboardEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(rt.event_name(), "session_restarted");
        assert_eq!(rt.timestamp(), event.timestamp());

        if let KeyboardEvent::SessionRestarted { reason, session, .. } = rt {
            assert_eq!(reason, RestartReason::NetworkError);
            assert_eq!(session, SessionId(3));
        } else {
            panic!("Expected SessionRestarted variant after deserialization");
        }
    }
}
