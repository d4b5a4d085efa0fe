//! Scanner for the Kestrel programming language
//!
//! Converts a raw byte buffer into a lazy stream of tokens, one `(position, kind, text)` triplet per
//! [`Scanner::scan`] call. Handles:
//! - UTF-8 decoding with reported (non-fatal) rejection of byte-order marks, NUL and malformed sequences
//! - Comments (`//` and `/* */`)
//! - Numeric literals (base 2/8/10/16 integers, floats with fraction and exponent)
//! - String literals with a fixed escape grammar
//! - Keywords, operators and punctuation via the `kestrel_core::lang` registries
//! - Automatic statement-terminator insertion
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token)
//! - `source` - UTF-8 decoding and line bookkeeping
//! - `numbers` - Numeric literal scanning
//! - `strings` - String literal and escape scanning
//!
//! ## Notes
//!
//! - Errors go to the [`DiagnosticSink`] and scanning always continues; malformed input still yields a
//!   deterministic token so the parser can recover.
//! - After end of input every call returns the same `Eof` token.

mod numbers;
mod source;
mod strings;
pub mod tokens;

pub use tokens::{Token, TokenKind, keyword_id};

use crate::frontend::ast::Pos;
use crate::frontend::diagnostics::{Diagnostic, DiagnosticSink, errors};
use kestrel_core::lang::keywords;
use kestrel_core::lang::operators::OperatorId;
use kestrel_core::lang::punctuation::PunctuationId;

// ============================================================================
// SCANNER STATE
// ----------------------------------------------------------------------------
// Terminator insertion (simplified):
//
//   ident / literal / ) ] } / break continue fallthrough return nil
//        → insert_terminator = true
//   newline while insert_terminator   → Terminator("\n")
//   EOF while insert_terminator       → Terminator("\n"), then Eof
//   `// ...` while insert_terminator  → Terminator("\n"), rewind, then Comment
//   if / for / switch                 → terminate_before_lbrace = true
//   `{` while terminate_before_lbrace → Terminator("{"), then `{`
// ============================================================================

/// Byte-level scanner over a source buffer.
pub struct Scanner<'a> {
    src: &'a [u8],
    sink: &'a dyn DiagnosticSink,
    /// Current character; `None` at end of input.
    ch: Option<char>,
    /// Offset of `ch`.
    offset: Pos,
    /// Offset just past `ch`.
    read_offset: Pos,
    /// Decoding already reported `ch` (stray BOM, NUL, malformed UTF-8).
    ch_reported: bool,
    line_starts: Vec<Pos>,
    insert_terminator: bool,
    terminate_before_lbrace: bool,
    error_count: usize,
}

/// Saved read position for look-ahead that must not consume input.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    ch: Option<char>,
    offset: Pos,
    read_offset: Pos,
    ch_reported: bool,
}

impl<'a> Scanner<'a> {
    /// Create a scanner positioned on the first character.
    ///
    /// A byte-order mark at offset 0 is skipped silently; anywhere else it is reported.
    pub fn new(src: &'a [u8], sink: &'a dyn DiagnosticSink) -> Self {
        let mut scanner = Self {
            src,
            sink,
            ch: Some(' '),
            offset: 0,
            read_offset: 0,
            ch_reported: false,
            line_starts: vec![0],
            insert_terminator: false,
            terminate_before_lbrace: false,
            error_count: 0,
        };
        scanner.next();
        if scanner.ch == Some(source::BYTE_ORDER_MARK) {
            scanner.next();
        }
        scanner
    }

    /// Number of lexical errors reported so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Source buffer being scanned.
    pub fn source(&self) -> &'a [u8] {
        self.src
    }

    fn error(&mut self, diagnostic: Diagnostic) {
        self.error_count += 1;
        self.sink.report(diagnostic);
    }

    fn save(&self) -> Cursor {
        Cursor {
            ch: self.ch,
            offset: self.offset,
            read_offset: self.read_offset,
            ch_reported: self.ch_reported,
        }
    }

    fn restore(&mut self, cursor: Cursor) {
        self.ch = cursor.ch;
        self.offset = cursor.offset;
        self.read_offset = cursor.read_offset;
        self.ch_reported = cursor.ch_reported;
    }

    /// Source text from `start` up to the current offset.
    fn text_from(&self, start: Pos) -> String {
        String::from_utf8_lossy(&self.src[start..self.offset]).into_owned()
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    /// Scan the next token.
    pub fn scan(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.offset;
        let Some(ch) = self.ch else {
            if self.insert_terminator {
                self.insert_terminator = false;
                return Token::new(TokenKind::Terminator, start, "\n");
            }
            return Token::new(TokenKind::Eof, start, "");
        };

        let mut insert = false;
        let token = if is_letter(ch) {
            let text = self.scan_identifier();
            match keyword_id(&text) {
                Some(id) => {
                    insert = keywords::ends_statement(id);
                    if keywords::opens_condition(id) {
                        self.terminate_before_lbrace = true;
                    }
                    Token::new(TokenKind::Keyword(id), start, text)
                }
                None => {
                    insert = true;
                    Token::new(TokenKind::Ident, start, text)
                }
            }
        } else if ch.is_ascii_digit() {
            insert = true;
            self.scan_number(start, false)
        } else {
            if ch == '{' && self.terminate_before_lbrace {
                self.terminate_before_lbrace = false;
                return Token::new(TokenKind::Terminator, start, "{");
            }

            let reported = self.ch_reported;
            self.next(); // always make progress
            let kind = match ch {
                // We only get here when skip_whitespace stopped on a newline, i.e. a terminator is due.
                '\n' => {
                    self.insert_terminator = false;
                    self.terminate_before_lbrace = false;
                    return Token::new(TokenKind::Terminator, start, "\n");
                }
                '"' => {
                    insert = true;
                    let text = self.scan_string(start);
                    return self.finish(insert, Token::new(TokenKind::String, start, text));
                }
                '.' => {
                    if self.ch.is_some_and(|c| c.is_ascii_digit()) {
                        insert = true;
                        let token = self.scan_number(start, true);
                        return self.finish(insert, token);
                    } else if self.match_char('.') {
                        TokenKind::Punctuation(PunctuationId::Ellipsis)
                    } else {
                        TokenKind::Punctuation(PunctuationId::Dot)
                    }
                }
                ':' => TokenKind::Punctuation(PunctuationId::Colon),
                ',' => TokenKind::Punctuation(PunctuationId::Comma),
                '?' => TokenKind::Punctuation(PunctuationId::Question),
                '$' => TokenKind::Punctuation(PunctuationId::Dollar),
                ';' => TokenKind::Terminator,
                '(' => TokenKind::Punctuation(PunctuationId::LParen),
                '[' => TokenKind::Punctuation(PunctuationId::LBracket),
                '{' => TokenKind::Punctuation(PunctuationId::LBrace),
                ')' => {
                    insert = true;
                    TokenKind::Punctuation(PunctuationId::RParen)
                }
                ']' => {
                    insert = true;
                    TokenKind::Punctuation(PunctuationId::RBracket)
                }
                '}' => {
                    insert = true;
                    TokenKind::Punctuation(PunctuationId::RBrace)
                }
                '#' => {
                    while self.ch.is_some_and(|c| is_letter(c) || c.is_ascii_digit()) {
                        self.next();
                    }
                    TokenKind::Directive
                }
                '/' if self.ch == Some('/') || self.ch == Some('*') => {
                    if self.insert_terminator && self.find_line_end() {
                        // Rewind to the comment start; the comment itself comes on the next call.
                        self.ch = Some('/');
                        self.offset = start;
                        self.read_offset = start + 1;
                        self.ch_reported = false;
                        self.insert_terminator = false;
                        return Token::new(TokenKind::Terminator, start, "\n");
                    }
                    self.scan_comment(start);
                    TokenKind::Comment
                }
                '+' => self.operator(OperatorId::Plus, OperatorId::PlusAssign, None),
                '-' => {
                    if self.match_char('>') {
                        TokenKind::Punctuation(PunctuationId::Arrow)
                    } else {
                        self.operator(OperatorId::Minus, OperatorId::MinusAssign, None)
                    }
                }
                '*' => self.operator(OperatorId::Star, OperatorId::StarAssign, None),
                '/' => self.operator(OperatorId::Slash, OperatorId::SlashAssign, None),
                '%' => self.operator(OperatorId::Percent, OperatorId::PercentAssign, None),
                '^' => self.operator(OperatorId::Caret, OperatorId::CaretAssign, None),
                '~' => TokenKind::Operator(OperatorId::Tilde),
                '=' => self.operator(OperatorId::Assign, OperatorId::EqEq, None),
                '!' => self.operator(OperatorId::Bang, OperatorId::NotEq, None),
                '&' => self.operator(OperatorId::Amp, OperatorId::AmpAssign, Some(('&', OperatorId::AndAnd))),
                '|' => self.operator(OperatorId::Pipe, OperatorId::PipeAssign, Some(('|', OperatorId::OrOr))),
                '<' => self.shift(OperatorId::Lt, OperatorId::LtEq, '<', OperatorId::Shl, OperatorId::ShlAssign),
                '>' => self.shift(OperatorId::Gt, OperatorId::GtEq, '>', OperatorId::Shr, OperatorId::ShrAssign),
                _ => {
                    if !reported {
                        self.error(errors::illegal_character(ch, start));
                    }
                    insert = self.insert_terminator;
                    TokenKind::Illegal
                }
            };
            let text = if kind == TokenKind::Terminator { ";".to_string() } else { self.text_from(start) };
            Token::new(kind, start, text)
        };

        self.finish(insert, token)
    }

    fn finish(&mut self, insert: bool, token: Token) -> Token {
        self.insert_terminator = insert;
        token
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch {
            let skip = match ch {
                ' ' | '\t' | '\r' => true,
                '\n' => !self.insert_terminator,
                _ => false,
            };
            if !skip {
                break;
            }
            self.next();
        }
    }

    // ========================================================================
    // Operator helpers
    // ========================================================================

    fn match_char(&mut self, expected: char) -> bool {
        if self.ch == Some(expected) {
            self.next();
            true
        } else {
            false
        }
    }

    /// `op`, `op=`, or an optional doubled form (`&&`, `||`).
    fn operator(&mut self, simple: OperatorId, with_eq: OperatorId, doubled: Option<(char, OperatorId)>) -> TokenKind {
        if self.match_char('=') {
            return TokenKind::Operator(with_eq);
        }
        match doubled {
            Some((c, id)) if self.match_char(c) => TokenKind::Operator(id),
            _ => TokenKind::Operator(simple),
        }
    }

    /// `<`, `<=`, `<<`, `<<=` (and the `>` family).
    fn shift(&mut self, simple: OperatorId, with_eq: OperatorId, c: char, shift: OperatorId, shift_eq: OperatorId) -> TokenKind {
        if self.match_char('=') {
            return TokenKind::Operator(with_eq);
        }
        if self.match_char(c) {
            if self.match_char('=') {
                return TokenKind::Operator(shift_eq);
            }
            return TokenKind::Operator(shift);
        }
        TokenKind::Operator(simple)
    }

    // ========================================================================
    // Identifiers and comments
    // ========================================================================

    fn scan_identifier(&mut self) -> String {
        let start = self.offset;
        while self.ch.is_some_and(|c| is_letter(c) || c.is_ascii_digit()) {
            self.next();
        }
        self.text_from(start)
    }

    /// Scan a comment whose leading `/` (at `start`) is already consumed; `ch` is `/` or `*`.
    fn scan_comment(&mut self, start: Pos) {
        if self.ch == Some('/') {
            while self.ch.is_some_and(|c| c != '\n') {
                self.next();
            }
            return;
        }

        self.next(); // `*`
        while let Some(ch) = self.ch {
            self.next();
            if ch == '*' && self.ch == Some('/') {
                self.next();
                return;
            }
        }
        self.error(errors::comment_not_terminated(start));
    }

    /// Whether the comment run starting at the current `/` or `*` reaches a line end.
    ///
    /// Pure look-ahead: the read position is restored before returning.
    fn find_line_end(&mut self) -> bool {
        let saved = self.save();
        let found = self.find_line_end_inner();
        self.restore(saved);
        found
    }

    fn find_line_end_inner(&mut self) -> bool {
        while self.ch == Some('/') || self.ch == Some('*') {
            if self.ch == Some('/') {
                // `//` comments always end the line.
                return true;
            }
            // `/*` comment: look for a newline inside it.
            self.next();
            while let Some(ch) = self.ch {
                if ch == '\n' {
                    return true;
                }
                self.next();
                if ch == '*' && self.ch == Some('/') {
                    self.next();
                    break;
                }
            }
            self.skip_whitespace(); // insert_terminator is set, so newlines stop here
            match self.ch {
                None | Some('\n') => return true,
                Some('/') => {}
                Some(_) => return false,
            }
            self.next();
        }
        false
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if a character can start an identifier (ASCII-only).
fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Value of a hex digit, or 16 for anything else.
fn digit_value(c: char) -> u32 {
    c.to_digit(16).unwrap_or(16)
}

/// Scan a whole buffer into tokens, up to and including the first `Eof`.
#[tracing::instrument(skip_all, fields(source_len = src.len()))]
pub fn scan_all(src: &[u8], sink: &dyn DiagnosticSink) -> Vec<Token> {
    let mut scanner = Scanner::new(src, sink);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.scan();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    tracing::debug!(tokens = tokens.len(), errors = scanner.error_count(), "scanned");
    tokens
}

// ============================================================================
// TESTS
// ============================================================================
