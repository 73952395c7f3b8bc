//! Session state machine for continuous dictation.
//!
//! Valid transitions:
//! - Idle -> Starting (start dictation)
//! - Starting -> Listening (engine confirmed the session)
//! - Starting/Listening -> Restarting (watchdog, involuntary end, network error)
//! - Restarting -> Starting (settle delay elapsed, fresh session opening)
//! - Starting/Listening -> Stopping (manual stop)
//! - Restarting -> Stopping (manual stop during the settle gap)
//! - Starting/Listening -> Errored (fatal engine error)
//! - Stopping/Errored/Restarting/Starting -> Idle (teardown complete)

use std::fmt;

/// Operational state of the recognition session manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session running. Ready to start.
    #[default]
    Idle,
    /// An engine session was requested but not yet confirmed.
    Starting,
    /// The engine is delivering results.
    Listening,
    /// The old engine session was discarded; a fresh one opens after the
    /// settle delay.
    Restarting,
    /// Manual stop requested; waiting for the engine to confirm the end.
    Stopping,
    /// A fatal engine error is being reported before returning to Idle.
    Errored,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Starting => write!(f, "Starting"),
            SessionState::Listening => write!(f, "Listening"),
            SessionState::Restarting => write!(f, "Restarting"),
            SessionState::Stopping => write!(f, "Stopping"),
            SessionState::Errored => write!(f, "Errored"),
        }
    }
}

impl SessionState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, target),
            (Idle, Starting)
                | (Starting, Listening)
                | (Starting, Restarting)
                | (Starting, Stopping)
                | (Starting, Errored)
                | (Starting, Idle)
                | (Listening, Restarting)
                | (Listening, Stopping)
                | (Listening, Errored)
                | (Restarting, Starting)
                | (Restarting, Stopping)
                | (Restarting, Idle)
                | (Stopping, Idle)
                | (Errored, Idle)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    #[test]
    fn test_state_display() {
        assert_eq!(Idle.to_string(), "Idle");
        assert_eq!(Starting.to_string(), "Starting");
        assert_eq!(Listening.to_string(), "Listening");
        assert_eq!(Restarting.to_string(), "Restarting");
        assert_eq!(Stopping.to_string(), "Stopping");
        assert_eq!(Errored.to_string(), "Errored");
    }

    #[test]
    fn test_default_is_idle() {
        assert_eq!(SessionState::default(), Idle);
    }

    #[test]
    fn test_happy_path_transitions() {
        assert!(Idle.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Listening));
        assert!(Listening.can_transition_to(Stopping));
        assert!(Stopping.can_transition_to(Idle));
    }

    #[test]
    fn test_restart_cycle() {
        assert!(Listening.can_transition_to(Restarting));
        assert!(Restarting.can_transition_to(Starting));
        assert!(Starting.can_transition_to(Listening));
    }

    #[test]
    fn test_error_transitions() {
        assert!(Listening.can_transition_to(Errored));
        assert!(Starting.can_transition_to(Errored));
        assert!(Errored.can_transition_to(Idle));
    }

    #[test]
    fn test_stop_during_restart_gap() {
        assert!(Restarting.can_transition_to(Stopping));
        assert!(Restarting.can_transition_to(Idle));
    }

    #[test]
    fn test_invalid_transitions() {
        // Cannot skip the engine confirmation.
        assert!(!Idle.can_transition_to(Listening));
        assert!(!Idle.can_transition_to(Stopping));

        // Cannot re-enter a running state from teardown.
        assert!(!Stopping.can_transition_to(Listening));
        assert!(!Errored.can_transition_to(Starting));

        // Cannot transition to self.
        for state in [Idle, Starting, Listening, Restarting, Stopping, Errored] {
            assert!(!state.can_transition_to(state));
        }
    }
}
