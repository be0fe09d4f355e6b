//! Monitor lifecycle state

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a monitoring session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    /// No worker is running
    #[default]
    Stopped,
    /// Worker spawned, socket not yet bound
    Starting,
    /// Receiving kernel events
    Running,
    /// Stop requested; worker exits on its next poll
    Stopping,
}

impl MonitorState {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Starting => "Starting",
            Self::Running => "Running",
            Self::Stopping => "Stopping",
        }
    }

    /// True while a worker thread is alive
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Stopped)
    }

    fn to_u8(self) -> u8 {
        match self {
            Self::Stopped => 0,
            Self::Starting => 1,
            Self::Running => 2,
            Self::Stopping => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

/// State shared between the controller and its worker
///
/// Uses atomic operations so either side can read or advance the state
/// without a lock.
#[derive(Debug, Default)]
pub struct SharedState {
    state: AtomicU8,
}

impl SharedState {
    /// Create state holding `Stopped`
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    pub fn get(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Unconditionally set the state
    pub fn set(&self, state: MonitorState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    /// Move from `from` to `to` if the state is still `from`
    pub fn transition(&self, from: MonitorState, to: MonitorState) -> bool {
        self.state
            .compare_exchange(from.to_u8(), to.to_u8(), Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        let shared = SharedState::new();
        assert_eq!(shared.get(), MonitorState::Stopped);

        for state in [
            MonitorState::Starting,
            MonitorState::Running,
            MonitorState::Stopping,
            MonitorState::Stopped,
        ] {
            shared.set(state);
            assert_eq!(shared.get(), state);
        }
    }

    #[test]
    fn test_transition_only_from_expected_state() {
        let shared = SharedState::new();
        assert!(!shared.transition(MonitorState::Running, MonitorState::Stopping));
        assert_eq!(shared.get(), MonitorState::Stopped);

        shared.set(MonitorState::Running);
        assert!(shared.transition(MonitorState::Running, MonitorState::Stopping));
        assert_eq!(shared.get(), MonitorState::Stopping);
    }

    #[test]
    fn test_is_active() {
        assert!(!MonitorState::Stopped.is_active());
        assert!(MonitorState::Starting.is_active());
        assert!(MonitorState::Stopping.is_active());
        assert_eq!(MonitorState::Running.name(), "Running");
    }
}
