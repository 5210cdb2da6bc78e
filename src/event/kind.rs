use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

/// Вид уведомления, пришедшего от нативного движка.
///
/// Числовые коды совпадают с полем `kind` в конверте события.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive, Serialize,
)]
#[repr(u16)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Connect = 1,
    Disconnect = 2,
    Room = 3,
    Participant = 4,
    Track = 5,
    PublishTrack = 6,
    UnpublishTrack = 7,
    PublishData = 8,
    RpcResponse = 9,
    RpcInvocation = 10,
    CaptureAudioFrame = 11,
    GetStats = 12,
    Logs = 13,
    Panic = 14,
}

impl EventKind {
    /// Все виды событий в порядке кодов.
    pub const ALL: [EventKind; 14] = [
        Self::Connect,
        Self::Disconnect,
        Self::Room,
        Self::Participant,
        Self::Track,
        Self::PublishTrack,
        Self::UnpublishTrack,
        Self::PublishData,
        Self::RpcResponse,
        Self::RpcInvocation,
        Self::CaptureAudioFrame,
        Self::GetStats,
        Self::Logs,
        Self::Panic,
    ];

    pub fn code(self) -> u16 {
        self.into()
    }

    /// Является ли событие ответом на исходящий запрос (несёт `async_id`).
    pub fn is_callback(self) -> bool {
        matches!(
            self,
            Self::Connect
                | Self::Disconnect
                | Self::PublishTrack
                | Self::UnpublishTrack
                | Self::PublishData
                | Self::RpcResponse
                | Self::CaptureAudioFrame
                | Self::GetStats
        )
    }

    /// Имя в snake_case (используется в логах и CLI).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Room => "room",
            Self::Participant => "participant",
            Self::Track => "track",
            Self::PublishTrack => "publish_track",
            Self::UnpublishTrack => "unpublish_track",
            Self::PublishData => "publish_data",
            Self::RpcResponse => "rpc_response",
            Self::RpcInvocation => "rpc_invocation",
            Self::CaptureAudioFrame => "capture_audio_frame",
            Self::GetStats => "get_stats",
            Self::Logs => "logs",
            Self::Panic => "panic",
        }
    }

    /// Разбор имени, обратный [`EventKind::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_dense_and_unique() {
        for (i, kind) in EventKind::ALL.iter().enumerate() {
            assert_eq!(kind.code() as usize, i + 1);
            assert_eq!(EventKind::try_from(kind.code()).unwrap(), *kind);
        }
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        assert!(EventKind::try_from(0u16).is_err());
        assert!(EventKind::try_from(15u16).is_err());
    }

    #[test]
    fn test_name_roundtrip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(EventKind::from_name("nope"), None);
    }

    #[test]
    fn test_callbacks() {
        assert!(EventKind::RpcResponse.is_callback());
        assert!(!EventKind::Room.is_callback());
        assert!(!EventKind::Logs.is_callback());
    }
}
