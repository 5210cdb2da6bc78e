use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Исход ожидания события, завершившегося без совпадения.
///
/// Таймаут и отмена различимы: «перестали ждать сами» против «попросили
/// перестать ждать».
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("no matching event before the deadline")]
    Timeout,

    #[error("wait was cancelled")]
    Cancelled,
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl ErrorExt for WaitError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Timeout => StatusCode::Timeout,
            Self::Cancelled => StatusCode::Cancelled,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcomes_are_distinguishable() {
        assert!(WaitError::Timeout.is_timeout());
        assert!(!WaitError::Timeout.is_cancelled());
        assert!(WaitError::Cancelled.is_cancelled());
        assert_ne!(
            WaitError::Timeout.status_code(),
            WaitError::Cancelled.status_code()
        );
    }

    #[test]
    fn test_client_message() {
        assert_eq!(
            WaitError::Cancelled.client_message(),
            "wait was cancelled"
        );
    }
}
