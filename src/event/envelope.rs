//! Бинарный конверт события.
//!
//! Формат (big-endian):
//!
//! ```text
//! magic:u16 | version:u8 | flags:u8 | kind:u16 | [async_id:u64] | [handle:u64] | len:u32 | payload
//! ```
//!
//! Бит 0 во `flags` означает наличие `async_id`, бит 1 — наличие `handle`.
//! Байты после payload считаются ошибкой.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::trace;

use super::{Event, EventKind};
use crate::error::DecodeError;

/// Сигнатура конверта ("EG").
pub const MAGIC: u16 = 0x4547;
/// Текущая версия формата.
pub const VERSION: u8 = 1;
/// Фиксированная часть заголовка: magic + version + flags + kind.
pub const HEADER_LEN: usize = 6;
/// Минимальный размер конверта: заголовок + длина payload.
pub const MIN_LEN: usize = HEADER_LEN + 4;

const FLAG_ASYNC_ID: u8 = 0b0000_0001;
const FLAG_HANDLE: u8 = 0b0000_0010;
const KNOWN_FLAGS: u8 = FLAG_ASYNC_ID | FLAG_HANDLE;

/// Размер конверта для события, в байтах.
pub fn encoded_len(event: &Event) -> usize {
    let mut len = MIN_LEN + event.payload().len();
    if event.async_id().is_some() {
        len += 8;
    }
    if event.handle().is_some() {
        len += 8;
    }
    len
}

/// Кодирует событие в конверт.
///
/// Длина payload ограничена `u32::MAX`.
pub fn encode(event: &Event) -> Bytes {
    debug_assert!(event.payload().len() <= u32::MAX as usize);

    let mut buf = BytesMut::with_capacity(encoded_len(event));
    let mut flags = 0u8;
    if event.async_id().is_some() {
        flags |= FLAG_ASYNC_ID;
    }
    if event.handle().is_some() {
        flags |= FLAG_HANDLE;
    }

    buf.put_u16(MAGIC);
    buf.put_u8(VERSION);
    buf.put_u8(flags);
    buf.put_u16(event.kind().code());
    if let Some(id) = event.async_id() {
        buf.put_u64(id);
    }
    if let Some(h) = event.handle() {
        buf.put_u64(h);
    }
    buf.put_u32(event.payload().len() as u32);
    buf.put_slice(event.payload());
    buf.freeze()
}

/// Разбирает конверт. Никогда не паникует: любой некорректный ввод даёт
/// [`DecodeError`].
///
/// Payload копируется: буфер FFI-вызова живёт только до возврата из
/// callback-а.
pub fn decode(mut buf: &[u8]) -> Result<Event, DecodeError> {
    if buf.is_empty() {
        return Err(DecodeError::Empty);
    }
    if buf.len() < MIN_LEN {
        return Err(DecodeError::TooShort {
            len: buf.len(),
            min: MIN_LEN,
        });
    }

    let magic = buf.get_u16();
    if magic != MAGIC {
        return Err(DecodeError::BadMagic { found: magic });
    }
    let version = buf.get_u8();
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion(version));
    }
    let flags = buf.get_u8();
    if flags & !KNOWN_FLAGS != 0 {
        return Err(DecodeError::UnknownFlags(flags));
    }
    let code = buf.get_u16();
    let kind = EventKind::try_from(code).map_err(|_| DecodeError::UnknownKind(code))?;

    let async_id = if flags & FLAG_ASYNC_ID != 0 {
        Some(read_u64(&mut buf, "async_id")?)
    } else {
        None
    };
    let handle = if flags & FLAG_HANDLE != 0 {
        Some(read_u64(&mut buf, "handle")?)
    } else {
        None
    };

    ensure_remaining(buf, "payload length", 4)?;
    let len = buf.get_u32() as usize;
    ensure_remaining(buf, "payload", len)?;
    let payload = Bytes::copy_from_slice(&buf[..len]);
    buf.advance(len);

    if buf.has_remaining() {
        return Err(DecodeError::TrailingBytes(buf.remaining()));
    }

    let mut event = Event::new(kind, payload);
    if let Some(id) = async_id {
        event = event.with_async_id(id);
    }
    if let Some(h) = handle {
        event = event.with_handle(h);
    }
    trace!(kind = %kind, ?async_id, ?handle, payload_len = len, "Decoded envelope");
    Ok(event)
}

fn read_u64(
    buf: &mut &[u8],
    field: &'static str,
) -> Result<u64, DecodeError> {
    ensure_remaining(*buf, field, 8)?;
    Ok(buf.get_u64())
}

fn ensure_remaining(
    buf: &[u8],
    field: &'static str,
    need: usize,
) -> Result<(), DecodeError> {
    if buf.len() < need {
        return Err(DecodeError::Truncated {
            field,
            need,
            available: buf.len(),
        });
    }
    Ok(())
}
