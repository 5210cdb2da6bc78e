//! Событие нативного движка и его бинарный конверт.
//!
//! - `kind`: дискриминант события (`EventKind`).
//! - `envelope`: кодирование и разбор конверта, приходящего через
//!   FFI-границу.
//! - `frames`: файл кадров для записи и воспроизведения потоков.

pub mod envelope;
pub mod frames;
pub mod kind;

use std::fmt;

use bytes::Bytes;
use serde::Serialize;

pub use envelope::{decode, encode, encoded_len, HEADER_LEN, MAGIC, VERSION};
pub use kind::EventKind;

/// Неизменяемое событие, разобранное из конверта.
///
/// Клонирование дешёвое: полезная нагрузка хранится в `Bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    kind: EventKind,
    async_id: Option<u64>,
    handle: Option<u64>,
    #[serde(serialize_with = "serialize_payload")]
    payload: Bytes,
}

impl Event {
    pub fn new(
        kind: EventKind,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            kind,
            async_id: None,
            handle: None,
            payload: payload.into(),
        }
    }

    /// Привязывает событие к идентификатору исходящего запроса.
    pub fn with_async_id(
        mut self,
        async_id: u64,
    ) -> Self {
        self.async_id = Some(async_id);
        self
    }

    /// Привязывает событие к handle-объекту движка (комната, трек и т.п.).
    pub fn with_handle(
        mut self,
        handle: u64,
    ) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn async_id(&self) -> Option<u64> {
        self.async_id
    }

    pub fn handle(&self) -> Option<u64> {
        self.handle
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

impl fmt::Display for Event {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(id) = self.async_id {
            write!(f, " async_id={id}")?;
        }
        if let Some(h) = self.handle {
            write!(f, " handle={h}")?;
        }
        write!(f, " payload={}B", self.payload.len())
    }
}

/// Полезная нагрузка в JSON: строка, если это UTF-8, иначе hex.
fn serialize_payload<S>(
    payload: &Bytes,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match std::str::from_utf8(payload) {
        Ok(s) => serializer.serialize_str(s),
        Err(_) => serializer.serialize_str(&hex::encode(payload)),
    }
}
