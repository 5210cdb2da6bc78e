//! Файл кадров: последовательность `длина:u32 (big-endian) | конверт`.
//!
//! Используется CLI для записи и воспроизведения потоков событий.

use std::io::{self, Write};

use bytes::Buf;

use crate::error::DecodeError;

/// Записывает один кадр.
pub fn write_frame<W: Write>(
    out: &mut W,
    envelope: &[u8],
) -> io::Result<()> {
    let len = u32::try_from(envelope.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "envelope exceeds u32::MAX"))?;
    out.write_all(&len.to_be_bytes())?;
    out.write_all(envelope)
}

/// Итератор по кадрам буфера. Обрезанный хвост даёт одну ошибку
/// `Truncated`, после чего итерация заканчивается.
pub fn split_frames(data: &[u8]) -> Frames<'_> {
    Frames { rest: data }
}

pub struct Frames<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<&'a [u8], DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        if self.rest.len() < 4 {
            let available = self.rest.len();
            self.rest = &[];
            return Some(Err(DecodeError::Truncated {
                field: "frame length",
                need: 4,
                available,
            }));
        }

        let mut buf = self.rest;
        let len = buf.get_u32() as usize;
        if buf.len() < len {
            let available = buf.len();
            self.rest = &[];
            return Some(Err(DecodeError::Truncated {
                field: "frame",
                need: len,
                available,
            }));
        }
        let (frame, rest) = buf.split_at(len);
        self.rest = rest;
        Some(Ok(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_and_split() {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc").unwrap();
        write_frame(&mut out, b"").unwrap();
        write_frame(&mut out, b"z").unwrap();

        let frames: Vec<_> = split_frames(&out).collect::<Result<_, _>>().unwrap();
        assert_eq!(frames, vec![&b"abc"[..], &b""[..], &b"z"[..]]);
    }

    #[test]
    fn test_truncated_tail() {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc").unwrap();
        out.extend_from_slice(&[0, 0, 0, 5, 1]);

        let mut it = split_frames(&out);
        assert_eq!(it.next(), Some(Ok(&b"abc"[..])));
        assert_eq!(
            it.next(),
            Some(Err(DecodeError::Truncated {
                field: "frame",
                need: 5,
                available: 1
            }))
        );
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_short_length_prefix() {
        let mut it = split_frames(&[0, 1]);
        assert!(matches!(
            it.next(),
            Some(Err(DecodeError::Truncated { field: "frame length", .. }))
        ));
        assert!(it.next().is_none());
    }
}
