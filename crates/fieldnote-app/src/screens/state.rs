//! Observable UI state for screen controllers.

/// Enumerated UI state a screen binds to.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum UiState<T> {
    /// Nothing has happened yet.
    #[default]
    Initial,
    /// An async operation is in flight.
    Loading,
    /// The last operation succeeded.
    Success(T),
    /// The last operation failed; the message is user-readable.
    Error(String),
}

impl<T> UiState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, UiState::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UiState::Success(_))
    }

    /// The error message, when in the error state.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            UiState::Error(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(UiState::<()>::Loading.is_loading());
        assert!(UiState::Success(5).is_success());
        assert_eq!(
            UiState::<()>::Error("boom".into()).error_message(),
            Some("boom")
        );
        assert_eq!(UiState::<()>::Initial.error_message(), None);
    }
}
