//! Provide the canonical language vocabulary for the Kestrel compiler frontend.
//!
//! This crate is intentionally small and dependency-free. It holds registry tables that the scanner, parser and
//! diagnostics share, so spellings and operator precedence live in exactly one place.
//!
//! ## Notes
//!
//! - This is a “vocabulary core” crate: **no IO**, no global state, and no compiler-specific types.
//! - Current scope: reserved keywords, operators (with binary precedence), and punctuation.

pub mod lang;
