use std::any::Any;

use thiserror::Error;

use crate::{ErrorExt, StatusCode};

/// Ошибки разбора конверта события.
///
/// Никогда не доходят до ожидающих: шлюз логирует их и отбрасывает кадр.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty envelope")]
    Empty,

    #[error("envelope too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },

    #[error("bad envelope magic {found:#06x}")]
    BadMagic { found: u16 },

    #[error("unsupported envelope version {0}")]
    UnsupportedVersion(u8),

    #[error("unknown event kind {0}")]
    UnknownKind(u16),

    #[error("unknown envelope flags {0:#04x}")]
    UnknownFlags(u8),

    #[error("truncated {field}: need {need} bytes, {available} available")]
    Truncated {
        field: &'static str,
        need: usize,
        available: usize,
    },

    #[error("{0} trailing bytes after payload")]
    TrailingBytes(usize),

    #[error("envelope of {size} bytes exceeds limit of {max}")]
    TooLarge { size: usize, max: usize },
}

impl ErrorExt for DecodeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedVersion(_) => StatusCode::UnsupportedVersion,
            Self::TooLarge { .. } => StatusCode::SizeLimit,
            Self::Empty | Self::TooShort { .. } | Self::BadMagic { .. } => StatusCode::InvalidFrame,
            Self::UnknownKind(_)
            | Self::UnknownFlags(_)
            | Self::Truncated { .. }
            | Self::TrailingBytes(_) => StatusCode::DecodingError,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let reason = match self {
            Self::Empty => "empty",
            Self::TooShort { .. } => "too_short",
            Self::BadMagic { .. } => "bad_magic",
            Self::UnsupportedVersion(_) => "version",
            Self::UnknownKind(_) => "unknown_kind",
            Self::UnknownFlags(_) => "unknown_flags",
            Self::Truncated { .. } => "truncated",
            Self::TrailingBytes(_) => "trailing",
            Self::TooLarge { .. } => "too_large",
        };
        vec![
            ("error_type", "envelope_decode".to_string()),
            ("status_code", self.status_code().to_string()),
            ("reason", reason.to_string()),
        ]
    }
}
