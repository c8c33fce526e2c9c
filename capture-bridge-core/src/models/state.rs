use super::error::CaptureError;

/// Device session state machine.
///
/// State transitions:
/// ```text
/// uninitialized → starting → running → stopping → terminated
///                     ↓
///                   failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Uninitialized,
    Starting,
    Running,
    Stopping,
    Terminated,
    Failed(CaptureError),
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Failed(_))
    }

    /// Whether `start` may be called from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Uninitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_uninitialized_can_start() {
        assert!(SessionState::Uninitialized.can_start());
        assert!(!SessionState::Running.can_start());
        assert!(!SessionState::Terminated.can_start());
        assert!(!SessionState::Failed(CaptureError::DeviceNotAvailable).can_start());
    }

    #[test]
    fn terminal_states() {
        assert!(SessionState::Terminated.is_terminal());
        assert!(SessionState::Failed(CaptureError::DeviceNotAvailable).is_terminal());
        assert!(!SessionState::Running.is_terminal());
    }
}
