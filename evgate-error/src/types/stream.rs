use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибка при получении события из потока подписчика.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RecvError {
    #[error("event stream is closed")]
    Closed,

    #[error("subscriber lagged behind by {0} events")]
    Lagged(u64),
}

/// Ошибка при неблокирующем получении события.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    #[error("no events available")]
    Empty,

    #[error("event stream is closed")]
    Closed,

    #[error("subscriber lagged behind by {0} events")]
    Lagged(u64),
}

impl ErrorExt for RecvError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Closed => StatusCode::ConnectionClosed,
            Self::Lagged(_) => StatusCode::Lagged,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ErrorExt for TryRecvError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Empty => StatusCode::Empty,
            Self::Closed => StatusCode::ConnectionClosed,
            Self::Lagged(_) => StatusCode::Lagged,
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
    fn test_recv_error_display() {
        assert_eq!(RecvError::Closed.to_string(), "event stream is closed");
        assert_eq!(
            RecvError::Lagged(10).to_string(),
            "subscriber lagged behind by 10 events"
        );
    }

    #[test]
    fn test_try_recv_error_codes() {
        assert_eq!(TryRecvError::Empty.status_code(), StatusCode::Empty);
        assert_eq!(TryRecvError::Lagged(3).status_code(), StatusCode::Lagged);
    }
}
