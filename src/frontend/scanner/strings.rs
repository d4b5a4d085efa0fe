//! String literal scanning.
//!
//! Escape grammar inside `"..."`:
//! - single-character escapes: `\a \b \f \n \r \t \v \\ \"`
//! - fixed-width hex escapes: `\xHH` (≤ 0xFF), `\uHHHH` and `\UHHHHHHHH` (≤ 0x10FFFF, surrogates rejected)
//!
//! The token text is the raw source slice including quotes; escapes are validated, not decoded.

use super::{Scanner, digit_value};
use crate::frontend::ast::Pos;
use crate::frontend::diagnostics::errors;

const MAX_CODE_POINT: u32 = 0x10FFFF;

impl<'a> Scanner<'a> {
    /// Scan a string literal whose opening quote (at `start`) is already consumed.
    pub(super) fn scan_string(&mut self, start: Pos) -> String {
        loop {
            let Some(ch) = self.ch else {
                self.error(errors::string_not_terminated(start));
                break;
            };
            self.next();
            if ch == '"' {
                break;
            }
            if ch == '\\' {
                self.scan_escape('"');
            }
        }
        self.text_from(start)
    }

    /// Validate one escape sequence; the backslash is already consumed.
    ///
    /// Returns `false` (after reporting) when the escape is malformed.
    fn scan_escape(&mut self, quote: char) -> bool {
        let start = self.offset;

        let (mut remaining, max) = match self.ch {
            Some(c) if c == quote || matches!(c, 'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\') => {
                self.next();
                return true;
            }
            Some('x') => (2, 0xFF),
            Some('u') => (4, MAX_CODE_POINT),
            Some('U') => (8, MAX_CODE_POINT),
            Some(_) => {
                self.error(errors::unknown_escape(start));
                return false;
            }
            None => {
                self.error(errors::escape_not_terminated(start));
                return false;
            }
        };
        self.next();

        let mut value: u32 = 0;
        while remaining > 0 {
            let Some(ch) = self.ch else {
                self.error(errors::escape_not_terminated(self.offset));
                return false;
            };
            let digit = digit_value(ch);
            if digit >= 16 {
                self.error(errors::illegal_escape_character(ch, self.offset));
                return false;
            }
            value = value * 16 + digit;
            self.next();
            remaining -= 1;
        }

        if value > max || (0xD800..0xE000).contains(&value) {
            self.error(errors::invalid_code_point(start));
            return false;
        }
        true
    }
}
