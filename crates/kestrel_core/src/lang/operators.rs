//! Operator vocabulary.
//!
//! This module defines the canonical operator set along with the metadata the parser needs for precedence climbing.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive** and exact (no maximal munch; the scanner owns that).
//! - `precedence` is the binary binding power on a 1..=5 scale where higher binds tighter. `0` means the operator
//!   never appears in binary position (prefix-only or assignment).
//! - The ternary `?` is punctuation, but the parser treats it as a level-1 operator.
//!
//! ## Examples
//! ```rust
//! use kestrel_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_str("<<="), Some(OperatorId::ShlAssign));
//! assert!(operators::precedence(OperatorId::Star) > operators::precedence(OperatorId::Plus));
//! ```

/// Lowest binary precedence level (`||` and the ternary).
pub const LOWEST_PRECEDENCE: u8 = 1;

/// Highest binary precedence level (multiplicative).
pub const HIGHEST_PRECEDENCE: u8 = 5;

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Bitwise
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,

    // Logical
    AndAnd,
    OrOr,
    Bang,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Assignment
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    ShlAssign,
    ShrAssign,
}

/// Broad grouping for documentation and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorCategory {
    Arithmetic,
    Bitwise,
    Logical,
    Comparison,
    Assignment,
}

/// Metadata for an operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    pub category: OperatorCategory,
    pub precedence: u8,
    pub prefix: bool,
}

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Arithmetic
    op(OperatorId::Plus, "+", OperatorCategory::Arithmetic, 4, true),
    op(OperatorId::Minus, "-", OperatorCategory::Arithmetic, 4, true),
    op(OperatorId::Star, "*", OperatorCategory::Arithmetic, 5, false),
    op(OperatorId::Slash, "/", OperatorCategory::Arithmetic, 5, false),
    op(OperatorId::Percent, "%", OperatorCategory::Arithmetic, 5, false),
    // Bitwise
    op(OperatorId::Amp, "&", OperatorCategory::Bitwise, 5, false),
    op(OperatorId::Pipe, "|", OperatorCategory::Bitwise, 4, false),
    op(OperatorId::Caret, "^", OperatorCategory::Bitwise, 4, false),
    op(OperatorId::Tilde, "~", OperatorCategory::Bitwise, 0, true),
    op(OperatorId::Shl, "<<", OperatorCategory::Bitwise, 5, false),
    op(OperatorId::Shr, ">>", OperatorCategory::Bitwise, 5, false),
    // Logical
    op(OperatorId::AndAnd, "&&", OperatorCategory::Logical, 2, false),
    op(OperatorId::OrOr, "||", OperatorCategory::Logical, 1, false),
    op(OperatorId::Bang, "!", OperatorCategory::Logical, 0, true),
    // Comparison
    op(OperatorId::EqEq, "==", OperatorCategory::Comparison, 3, false),
    op(OperatorId::NotEq, "!=", OperatorCategory::Comparison, 3, false),
    op(OperatorId::Lt, "<", OperatorCategory::Comparison, 3, false),
    op(OperatorId::LtEq, "<=", OperatorCategory::Comparison, 3, false),
    op(OperatorId::Gt, ">", OperatorCategory::Comparison, 3, false),
    op(OperatorId::GtEq, ">=", OperatorCategory::Comparison, 3, false),
    // Assignment
    op(OperatorId::Assign, "=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::PlusAssign, "+=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::MinusAssign, "-=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::StarAssign, "*=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::SlashAssign, "/=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::PercentAssign, "%=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::AmpAssign, "&=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::PipeAssign, "|=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::CaretAssign, "^=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::ShlAssign, "<<=", OperatorCategory::Assignment, 0, false),
    op(OperatorId::ShrAssign, ">>=", OperatorCategory::Assignment, 0, false),
];

/// Return the full metadata entry for an operator.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Canonical spelling of an operator.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Binary precedence of an operator (`0` when it is never binary).
pub fn precedence(id: OperatorId) -> u8 {
    info_for(id).precedence
}

/// Resolve an operator spelling to its identifier.
///
/// ## Returns
/// - `Some(OperatorId)` if the spelling exists in [`OPERATORS`].
/// - `None` otherwise.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.spelling == spelling).map(|o| o.id)
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    spelling: &'static str,
    category: OperatorCategory,
    precedence: u8,
    prefix: bool,
) -> OperatorInfo {
    OperatorInfo {
        id,
        spelling,
        category,
        precedence,
        prefix,
    }
}
