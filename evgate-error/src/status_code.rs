use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde")]
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Коды статуса для категоризации ошибок брокера.
///
/// # Диапазоны:
/// - 0xxx: Успех
/// - 1xxx: Общие ошибки
/// - 2xxx: Ошибки конфигурации
/// - 6xxx: Ожидание событий / каналы подписчиков
/// - 8xxx: Ошибки протокола (конверт события)
#[cfg_attr(feature = "serde", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Успех ===
    Success = 0,

    // === 1xxx: Общие ошибки ===
    Unknown = 1000,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,

    // === 2xxx: Конфигурация ===
    InvalidConfig = 2000,

    // === 6xxx: Ожидание / каналы ===
    Timeout = 6002,
    Cancelled = 6010,
    ConnectionClosed = 6001,
    Empty = 6011,
    Lagged = 6012,

    // === 8xxx: Протокол ===
    InvalidFrame = 8000,
    UnsupportedVersion = 8002,
    SizeLimit = 8007,
    DecodingError = 8011,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Числовое представление кода статуса.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Пытается получить вариант `StatusCode` из `u32`.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// Имеет ли смысл повторить операцию с этим кодом.
    ///
    /// Повторное ожидание после таймаута допустимо, после отмены — нет.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Lagged | Self::Empty)
    }

    /// Ошибка протокола или разбора конверта (диапазон 8xxx).
    pub fn is_protocol_error(&self) -> bool {
        (8000..=8999).contains(&self.code())
    }

    /// Рекомендуемый уровень логирования для данного кода.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::Cancelled | Self::Empty => LogLevel::Debug,
            Self::Timeout | Self::Lagged | Self::ConnectionClosed => LogLevel::Info,
            Self::InvalidFrame
            | Self::UnsupportedVersion
            | Self::SizeLimit
            | Self::DecodingError
            | Self::InvalidArgs
            | Self::InvalidConfig => LogLevel::Warn,
            Self::Unknown | Self::Unexpected | Self::Internal => LogLevel::Error,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.code())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
