//! Parser for the Kestrel programming language
//!
//! Converts a scanned token stream into a [`Program`]: recursive descent for statements, precedence climbing for
//! expressions. Top-level declarations are bound into the global scope as they are parsed, so forward references
//! resolve no matter where the referenced declaration appears.
//!
//! ## Examples
//!
//! ```rust
//! use kestrel::frontend::diagnostics::Diagnostics;
//! use kestrel::frontend::symbols::SymbolTable;
//! use kestrel::frontend::{parser, scanner};
//!
//! let source = b"answer :: 6 * 7\n";
//! let sink = Diagnostics::new();
//! let tokens = scanner::scan_all(source, &sink);
//! let symbols = SymbolTable::new();
//! let program = parser::parse(source, &tokens, &symbols, &sink);
//! assert_eq!(program.decls().count(), 1);
//! assert!(sink.is_empty());
//! ```

use crate::frontend::ast::*;
use crate::frontend::diagnostics::{Diagnostic, DiagnosticSink, errors};
use crate::frontend::scanner::{Token, TokenKind};
use crate::frontend::symbols::{ScopeId, SymbolTable};
use kestrel_core::lang::keywords::KeywordId;
use kestrel_core::lang::operators::{self, OperatorId};
use kestrel_core::lang::punctuation::{self, PunctuationId};

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
