//! Newline frame codec.
//!
//! Wire format:
//! ```text
//! ┌──────────────────────────────┬────┐
//! │ ASCII command (≤ 255 bytes)  │ \n │     optional \r before \n is dropped
//! └──────────────────────────────┴────┘
//! ```
//!
//! The decoder accumulates bytes per connection and yields complete lines.
//! A single socket read may carry part of a line, exactly one line, or
//! several pipelined lines; partial input stays buffered across reads.
//!
//! A line that outgrows the buffer is discarded up to its terminating
//! newline and reported once as [`Line::Overflow`].

/// Maximum accepted line length, excluding the newline.
pub const MAX_LINE_LEN: usize = 255;

/// One decoded unit of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// A complete line without its terminator.
    Text(&'a str),
    /// The line exceeded [`MAX_LINE_LEN`] and was dropped.
    Overflow,
    /// The line was not valid UTF-8.
    Invalid,
}

/// Streaming line decoder.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    /// Set while skipping the tail of an over-long line.
    discarding: bool,
    /// The buffer holds a line already handed out; clear before reuse.
    consumed: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte.
    ///
    /// Returns `Some(line)` when `byte` completes a line.  The returned line
    /// borrows the decoder and is valid until the next call.
    pub fn push(&mut self, byte: u8) -> Option<Line<'_>> {
        if self.consumed {
            self.buf.clear();
            self.consumed = false;
        }

        if byte == b'\n' {
            if self.discarding {
                self.discarding = false;
                return Some(Line::Overflow);
            }
            self.consumed = true;
            let bytes = match self.buf.as_slice() {
                [head @ .., b'\r'] => head,
                all => all,
            };
            return Some(match core::str::from_utf8(bytes) {
                Ok(text) => Line::Text(text),
                Err(_) => Line::Invalid,
            });
        }

        if !self.discarding && self.buf.push(byte).is_err() {
            self.buf.clear();
            self.discarding = true;
        }
        None
    }

    /// Feed a chunk, calling `on_line` for every line it completes.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(Line<'_>)) {
        for &byte in data {
            if let Some(line) = self.push(byte) {
                on_line(line);
            }
        }
    }

    /// Bytes of the current, unterminated line.
    pub fn pending(&self) -> usize {
        if self.consumed { 0 } else { self.buf.len() }
    }

    /// Drop any partial input.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
        self.consumed = false;
    }
}
