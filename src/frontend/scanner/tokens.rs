//! Token types for the Kestrel scanner.
//!
//! The scanner uses **registry-backed IDs** for language vocabulary:
//! - `Keyword(KeywordId)` for reserved words
//! - `Operator(OperatorId)` for operators
//! - `Punctuation(PunctuationId)` for punctuation tokens
//!
//! ## Notes
//! - Token kinds carry no payload; the literal text travels alongside in [`Token::text`], so a token is exactly the
//!   `(position, kind, text)` triplet the parser consumes.

use std::fmt;

use crate::frontend::ast::{Pos, Span};
use kestrel_core::lang::keywords::{self, KeywordId};
use kestrel_core::lang::operators::{self, OperatorId};
use kestrel_core::lang::punctuation::{self, PunctuationId};

// ============================================================================
// TOKEN TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // ========== Keyword / operator / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Operator(OperatorId),
    Punctuation(PunctuationId),

    // ========== Identifiers and Literals ==========
    Ident,
    Int,
    Float,
    String,

    // ========== Trivia ==========
    Comment,
    /// `#name`
    Directive,

    // ========== Special ==========
    /// Statement terminator: explicit `;` or inserted at a newline, before `{`, or at end of input.
    Terminator,
    Eof,
    Illegal,
}

impl TokenKind {
    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    pub fn is_operator(&self, id: OperatorId) -> bool {
        matches!(self, TokenKind::Operator(o) if *o == id)
    }

    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }

    /// Human-readable name for diagnostics (`'+'`, `identifier`, `end of file`, ...).
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Keyword(k) => format!("'{}'", keywords::as_str(*k)),
            TokenKind::Operator(o) => format!("'{}'", operators::as_str(*o)),
            TokenKind::Punctuation(p) => format!("'{}'", punctuation::as_str(*p)),
            TokenKind::Ident => "identifier".to_string(),
            TokenKind::Int => "integer literal".to_string(),
            TokenKind::Float => "float literal".to_string(),
            TokenKind::String => "string literal".to_string(),
            TokenKind::Comment => "comment".to_string(),
            TokenKind::Directive => "directive".to_string(),
            TokenKind::Terminator => "terminator".to_string(),
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::Illegal => "illegal token".to_string(),
        }
    }
}

/// A scanned token: position, kind and literal text.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub pos: Pos,
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Pos, text: impl Into<String>) -> Self {
        Self {
            pos,
            kind,
            text: text.into(),
        }
    }

    /// Leaf span: `pos .. pos + text.len()`.
    pub fn span(&self) -> Span {
        Span::leaf(self.pos, self.text.len())
    }
}

/// Compact form used by `--lex` dumps and tests: `ident(foo)`, `':'`, `terminator`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Ident => write!(f, "ident({})", self.text),
            TokenKind::Int => write!(f, "int({})", self.text),
            TokenKind::Float => write!(f, "float({})", self.text),
            TokenKind::String => write!(f, "string({})", self.text),
            TokenKind::Directive => write!(f, "directive({})", self.text),
            TokenKind::Illegal => write!(f, "illegal({})", self.text),
            TokenKind::Comment => write!(f, "comment"),
            TokenKind::Eof => write!(f, "eof"),
            TokenKind::Terminator => write!(f, "term"),
            kind => f.write_str(&kind.describe()),
        }
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
///
/// ## Notes
/// - Every reserved word is longer than one character, so single-character spellings skip the lookup.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    if name.len() > 1 { keywords::from_str(name) } else { None }
}
