//! Line framing for tokio.
//!
//! Input lines end in LF with an optional preceding CR; output lines are
//! always terminated with CRLF. The length limit applies to the payload,
//! terminator excluded.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ProtocolError, Result};
use crate::MAX_LINE_LEN;

/// Newline-delimited line codec with a payload length cap.
#[derive(Debug)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
}

impl LineCodec {
    /// Codec with the protocol's standard 510-byte payload limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Codec with a custom payload limit.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Configured payload limit.
    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
            self.next_index = src.len();
            // CR plus LF may still follow a payload at the limit.
            if src.len() > self.max_len + 2 {
                return Err(ProtocolError::MessageTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }
            return Ok(None);
        };

        let line = src.split_to(self.next_index + offset + 1);
        self.next_index = 0;

        let mut payload = &line[..line.len() - 1];
        if let Some(stripped) = payload.strip_suffix(b"\r") {
            payload = stripped;
        }

        if payload.len() > self.max_len {
            return Err(ProtocolError::MessageTooLong {
                actual: payload.len(),
                limit: self.max_len,
            });
        }

        Ok(Some(String::from_utf8_lossy(payload).into_owned()))
    }
}

impl<T: AsRef<str>> Encoder<T> for LineCodec {
    type Error = ProtocolError;

    /// Writes one line. Anything from the first embedded CR or LF onward is
    /// dropped, and the payload is cut to the limit on a char boundary.
    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<()> {
        let text = item.as_ref();
        let text = match text.find(['\r', '\n']) {
            Some(end) => &text[..end],
            None => text,
        };

        let mut end = text.len().min(self.max_len);
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        dst.reserve(end + 2);
        dst.put_slice(text[..end].as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}
