//! Kestrel compiler frontend
//!
//! This module contains all frontend components:
//! - `scanner`: bytes to tokens, with automatic statement terminators
//! - `parser`: tokens to AST, binding top-level declarations as it goes
//! - `ast`: abstract syntax tree definitions
//! - `symbols`: entities, scopes and the per-entity resolution state
//! - `checker`: name resolution and constant propagation for one declaration at a time
//! - `diagnostics`: error reporting

pub mod ast;
pub mod checker;
pub mod diagnostics;
pub mod parser;
pub mod scanner;
pub mod symbols;
