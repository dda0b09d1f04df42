//! Newline framing for the TCP transport.
//!
//! Bytes are split on `\n`, a trailing `\r` is dropped, and whatever is
//! left is decoded as UTF-8 with invalid sequences replaced by U+FFFD.
//! A line that can't be decoded is therefore still a line; the protocol
//! layer gets to reject it and the connection survives.

use std::io;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// One unit read off the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    Line(String),
    /// A line went past the length cap. Its bytes are discarded up to and
    /// including the next `\n`.
    Oversized,
}

/// Splits a byte stream into lines of at most `max_length` bytes.
#[derive(Debug)]
pub(crate) struct LineCodec {
    max_length: usize,
    /// Where to resume the newline search in the buffer.
    next_index: usize,
    /// Inside an over-long line, waiting for its terminator.
    discarding: bool,
}

impl LineCodec {
    pub(crate) fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for LineCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        loop {
            let newline = buf[self.next_index..].iter().position(|b| *b == b'\n');

            let Some(offset) = newline else {
                if self.discarding {
                    buf.clear();
                    self.next_index = 0;
                    return Ok(None);
                }
                if buf.len() > self.max_length {
                    buf.clear();
                    self.next_index = 0;
                    self.discarding = true;
                    return Ok(Some(Frame::Oversized));
                }
                self.next_index = buf.len();
                return Ok(None);
            };

            let end = self.next_index + offset;
            let raw = buf.split_to(end + 1);
            self.next_index = 0;

            if self.discarding {
                // Tail of a line already reported as oversized.
                self.discarding = false;
                continue;
            }
            if end > self.max_length {
                return Ok(Some(Frame::Oversized));
            }
            return Ok(Some(Frame::Line(text(&raw[..end]))));
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Frame>, io::Error> {
        if let Some(frame) = self.decode(buf)? {
            return Ok(Some(frame));
        }
        if self.discarding || buf.is_empty() {
            buf.clear();
            return Ok(None);
        }
        // The peer closed after a last line without a terminator.
        let raw = buf.split_to(buf.len());
        self.next_index = 0;
        Ok(Some(Frame::Line(text(&raw))))
    }
}

fn text(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
