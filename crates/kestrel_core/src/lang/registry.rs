//! Shareable metadata for `kestrel_core::lang` registries.
//!
//! ## Notes
//! - These types are `Copy`-friendly so registries can live in `const` tables.
//! - Metadata is meant for tooling/docs/diagnostics; enforcement of syntax rules still lives in the scanner and
//!   parser.

/// Whether a vocabulary item is interpreted by the frontend or only reserved.
///
/// ## Notes
/// - `Reserved` words are scanned as keywords (so they cannot be used as identifiers) but no parser rule gives them
///   a meaning yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stability {
    /// Fully interpreted by the parser/checker.
    Active,
    /// Reserved spelling with no grammar rule yet.
    Reserved,
}
