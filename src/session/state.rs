//! Session lifecycle state.

/// Represents the lifecycle state of a session resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Session is live and accepts attribute changes.
    #[default]
    Active,
    /// Session has been invalidated and its resource released.
    Invalidated,
}

impl SessionState {
    /// Check if transition to target state is valid.
    ///
    /// The only transition is Active -> Invalidated. Invalidated -> Invalidated
    /// is accepted so repeated invalidation stays harmless.
    pub fn can_transition_to(&self, target: SessionState) -> bool {
        use SessionState::*;
        matches!((*self, target), (Active, Invalidated) | (Invalidated, Invalidated))
    }

    /// Check if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Invalidated)
    }

    /// Check if the session still carries usable attributes.
    pub fn is_live(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(SessionState::Active.can_transition_to(SessionState::Invalidated));
        assert!(SessionState::Invalidated.can_transition_to(SessionState::Invalidated));
        assert!(!SessionState::Invalidated.can_transition_to(SessionState::Active));
        assert!(!SessionState::Active.can_transition_to(SessionState::Active));
    }

    #[test]
    fn test_is_terminal() {
        assert!(!SessionState::Active.is_terminal());
        assert!(SessionState::Invalidated.is_terminal());
    }

    #[test]
    fn test_default() {
        let state = SessionState::default();
        assert_eq!(state, SessionState::Active);
        assert!(state.is_live());
    }
}
