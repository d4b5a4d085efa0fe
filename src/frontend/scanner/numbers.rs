//! Numeric literal scanning.
//!
//! Accepted forms:
//! - decimal integers: `42`, `1_000`
//! - prefixed integers: `0b1010`, `0o777`, `0xFF`
//! - floats: `3.14`, `.5`, `5.`, `1e10`, `2.5E-3`
//!
//! Malformed literals are reported and their text replaced with `0`, so everything downstream sees text that
//! parses cleanly.

use super::{Scanner, Token, TokenKind, digit_value};
use crate::frontend::ast::Pos;
use crate::frontend::diagnostics::errors;

impl<'a> Scanner<'a> {
    /// Consume digits below `base` (and `_` separators); return how many real digits were seen.
    fn scan_mantissa(&mut self, base: u32) -> usize {
        let mut digits = 0;
        while let Some(ch) = self.ch {
            if ch == '_' {
                self.next();
                continue;
            }
            if digit_value(ch) >= base {
                break;
            }
            digits += 1;
            self.next();
        }
        digits
    }

    /// Scan a numeric literal starting at `start`.
    ///
    /// When `seen_decimal_point` is set the leading `.` is already consumed and `ch` is a digit.
    pub(super) fn scan_number(&mut self, start: Pos, seen_decimal_point: bool) -> Token {
        let mut kind = TokenKind::Int;
        let mut must_be_integer = false;
        let mut malformed = false;

        if seen_decimal_point {
            kind = TokenKind::Float;
            self.scan_mantissa(10);
        } else if self.ch == Some('0') {
            self.next();
            let prefixed = match self.ch {
                Some('b' | 'B') => Some((2, "binary")),
                Some('o' | 'O') => Some((8, "octal")),
                Some('x' | 'X') => Some((16, "hexadecimal")),
                _ => None,
            };
            match prefixed {
                Some((base, name)) => {
                    self.next();
                    must_be_integer = true;
                    if self.scan_mantissa(base) == 0 {
                        self.error(errors::illegal_number(name, start));
                        malformed = true;
                    }
                }
                None => {
                    self.scan_mantissa(10);
                }
            }
        } else {
            self.scan_mantissa(10);
        }

        // fraction
        if !must_be_integer && !seen_decimal_point && self.ch == Some('.') {
            kind = TokenKind::Float;
            self.next();
            self.scan_mantissa(10);
        }

        // exponent
        if !must_be_integer && matches!(self.ch, Some('e' | 'E')) {
            kind = TokenKind::Float;
            let exponent = self.offset;
            self.next();
            if matches!(self.ch, Some('-' | '+')) {
                self.next();
            }
            if self.scan_mantissa(10) == 0 {
                self.error(errors::illegal_exponent(exponent));
                malformed = true;
            }
        }

        let text = if malformed { "0".to_string() } else { self.text_from(start) };
        Token::new(kind, start, text)
    }
}
