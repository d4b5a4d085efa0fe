//! Kestrel language vocabulary registries.
//!
//! This module is the “front door” for language-level vocabulary: reserved keywords, operators and punctuation.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings/metadata via registry
//! tables instead of comparing strings.
//!
//! ## Notes
//! - Registries are intentionally **pure**: no AST types, no IO, no side effects.
//! - The scanner/parser enforce syntax; registries provide spellings and metadata for shared use (diagnostics,
//!   token dumps, precedence climbing).
//!
//! ## Examples
//! ```rust
//! use kestrel_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("fn"), Some(KeywordId::Fn));
//! assert_eq!(keywords::as_str(KeywordId::Return), "return");
//! ```

pub mod keywords;
pub mod operators;
pub mod punctuation;
pub mod registry;
