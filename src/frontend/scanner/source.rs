//! UTF-8 decoding and line bookkeeping.
//!
//! The scanner reads one Unicode scalar at a time. Problems are reported and decoding continues:
//! - a byte-order mark past offset 0 is illegal,
//! - NUL is illegal,
//! - a malformed sequence yields `U+FFFD` and advances by one byte.

use super::Scanner;
use crate::frontend::ast::Pos;
use crate::frontend::diagnostics::errors;

pub(super) const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Decode the scalar at the start of `bytes`, returning it with its encoded width.
///
/// `None` means the leading bytes are not a valid UTF-8 sequence.
fn decode(bytes: &[u8]) -> Option<(char, usize)> {
    let lead = *bytes.first()?;
    let width = match lead {
        0x00..=0x7F => return Some((lead as char, 1)),
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    let encoded = bytes.get(..width)?;
    let ch = std::str::from_utf8(encoded).ok()?.chars().next()?;
    Some((ch, width))
}

impl<'a> Scanner<'a> {
    /// Advance to the next character, updating `ch`, `offset` and `read_offset`.
    pub(super) fn next(&mut self) {
        if self.read_offset >= self.src.len() {
            self.offset = self.src.len();
            self.record_line();
            self.ch = None;
            self.ch_reported = false;
            return;
        }

        self.offset = self.read_offset;
        self.record_line();

        let (ch, width, reported) = match decode(&self.src[self.offset..]) {
            Some((ch, width)) if ch == BYTE_ORDER_MARK && self.offset > 0 => {
                self.error(errors::illegal_byte_order_mark(self.offset));
                (ch, width, true)
            }
            Some(('\0', width)) => {
                self.error(errors::illegal_nul(self.offset));
                ('\0', width, true)
            }
            Some((ch, width)) => (ch, width, false),
            None => {
                self.error(errors::illegal_encoding(self.offset));
                (char::REPLACEMENT_CHARACTER, 1, true)
            }
        };

        self.read_offset += width;
        self.ch = Some(ch);
        self.ch_reported = reported;
    }

    /// Record a line start when stepping past a newline.
    ///
    /// Look-ahead may revisit the same newline, so offsets are only ever appended in increasing order.
    fn record_line(&mut self) {
        if self.ch == Some('\n') && self.line_starts.last().is_some_and(|&last| last < self.offset) {
            self.line_starts.push(self.offset);
        }
    }

    /// 1-based `(line, column)` of a byte offset, for offsets already scanned past.
    ///
    /// Columns count bytes, matching the byte offsets diagnostics carry.
    pub fn position(&self, pos: Pos) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&pos) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        (line + 1, pos - line_start + 1)
    }

    /// Offsets at which lines start (the first entry is always 0).
    pub fn line_starts(&self) -> &[Pos] {
        &self.line_starts
    }
}
