//! Code generation seam.
//!
//! Machine-code emission is outside this crate; a code generation job moves the entity through `Emitting` to
//! `Emitted` and hands the declaration to an [`Emitter`] in between.

use crate::frontend::ast::Decl;
use crate::frontend::symbols::Entity;

/// Receiver of checked declarations, called once per emitted entity.
///
/// Emitters run on worker threads; by the time `emit` is called every dependency of `decl` is `Emitted`.
pub trait Emitter: Sync {
    fn emit(&self, entity: &Entity, decl: &Decl);
}

impl<F> Emitter for F
where
    F: Fn(&Entity, &Decl) + Sync,
{
    fn emit(&self, entity: &Entity, decl: &Decl) {
        self(entity, decl)
    }
}

/// Emitter that only traces what it would emit.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubEmitter;

impl Emitter for StubEmitter {
    fn emit(&self, entity: &Entity, _decl: &Decl) {
        match entity.value() {
            Some(value) => tracing::trace!(name = %entity.name, %value, "emit constant"),
            None => tracing::trace!(name = %entity.name, "emit"),
        }
    }
}
