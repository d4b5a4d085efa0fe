//! Define the reserved keyword vocabulary for the Kestrel language.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a const
//! metadata table ([`KEYWORDS`]) that records canonical spellings, categories and the scanner-facing flags used by
//! automatic terminator insertion.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - Only `fn` and `return` have grammar rules today; the rest are [`Stability::Reserved`].
//!
//! ## Examples
//! ```rust
//! use kestrel_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("switch"), Some(KeywordId::Switch));
//! assert!(keywords::ends_statement(KeywordId::Return));
//! assert!(keywords::opens_condition(KeywordId::If));
//! ```

use super::registry::Stability;

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Conversions
    Cast,
    Bitcast,
    Autocast,

    // Modules / jumps
    Using,
    Goto,

    // Control flow
    Break,
    Continue,
    Fallthrough,
    Return,
    If,
    For,
    Else,
    Defer,
    In,
    Switch,
    Case,

    // Definitions
    Fn,
    Union,
    Enum,
    Struct,

    // Literals
    Nil,
}

/// High-level grouping for documentation and tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Conversion,
    Module,
    ControlFlow,
    Definition,
    Literal,
}

/// Metadata for a keyword.
///
/// ## Notes
/// - `ends_statement`: a newline directly after this keyword inserts a statement terminator.
/// - `opens_condition`: the next `{` is preceded by an inserted terminator, closing the condition header.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    pub ends_statement: bool,
    pub opens_condition: bool,
    pub stability: Stability,
}

/// Registry of all keywords.
///
/// ## Notes
/// - The ordering is not semantically meaningful, but is grouped for readability.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Conversions
    info(KeywordId::Cast, "cast", KeywordCategory::Conversion),
    info(KeywordId::Bitcast, "bitcast", KeywordCategory::Conversion),
    info(KeywordId::Autocast, "autocast", KeywordCategory::Conversion),
    // Modules / jumps
    info(KeywordId::Using, "using", KeywordCategory::Module),
    info(KeywordId::Goto, "goto", KeywordCategory::ControlFlow),
    // Control flow
    terminal(KeywordId::Break, "break", KeywordCategory::ControlFlow),
    terminal(KeywordId::Continue, "continue", KeywordCategory::ControlFlow),
    terminal(KeywordId::Fallthrough, "fallthrough", KeywordCategory::ControlFlow),
    active(terminal(KeywordId::Return, "return", KeywordCategory::ControlFlow)),
    condition(KeywordId::If, "if"),
    condition(KeywordId::For, "for"),
    info(KeywordId::Else, "else", KeywordCategory::ControlFlow),
    info(KeywordId::Defer, "defer", KeywordCategory::ControlFlow),
    info(KeywordId::In, "in", KeywordCategory::ControlFlow),
    condition(KeywordId::Switch, "switch"),
    info(KeywordId::Case, "case", KeywordCategory::ControlFlow),
    // Definitions
    active(info(KeywordId::Fn, "fn", KeywordCategory::Definition)),
    info(KeywordId::Union, "union", KeywordCategory::Definition),
    info(KeywordId::Enum, "enum", KeywordCategory::Definition),
    info(KeywordId::Struct, "struct", KeywordCategory::Definition),
    // Literals
    terminal(KeywordId::Nil, "nil", KeywordCategory::Literal),
];

/// Canonical spelling.
///
/// ## Parameters
/// - `id`: Keyword identifier.
///
/// ## Returns
/// - The canonical spelling string.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Whether a newline after this keyword ends the statement.
pub fn ends_statement(id: KeywordId) -> bool {
    info_for(id).ends_statement
}

/// Whether this keyword introduces a condition header terminated before `{`.
pub fn opens_condition(id: KeywordId) -> bool {
    info_for(id).opens_condition
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is reserved.
/// - `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(id: KeywordId, canonical: &'static str, category: KeywordCategory) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        ends_statement: false,
        opens_condition: false,
        stability: Stability::Reserved,
    }
}

const fn terminal(id: KeywordId, canonical: &'static str, category: KeywordCategory) -> KeywordInfo {
    let mut k = info(id, canonical, category);
    k.ends_statement = true;
    k
}

const fn condition(id: KeywordId, canonical: &'static str) -> KeywordInfo {
    let mut k = info(id, canonical, KeywordCategory::ControlFlow);
    k.opens_condition = true;
    k
}

const fn active(mut k: KeywordInfo) -> KeywordInfo {
    k.stability = Stability::Active;
    k
}
