//! Checker unit tests.
//!
//! Entity states are driven by hand here; the job system that normally does it is tested in `crate::jobs`.

use super::*;
use crate::frontend::ast::Program;
use crate::frontend::diagnostics::Diagnostics;
use crate::frontend::symbols::{Claim, EntityState};
use crate::frontend::{parser, scanner};

const EXEC: ExecutorId = ExecutorId(1);

struct Fixture {
    program: Program,
    symbols: SymbolTable,
    sink: Diagnostics,
}

impl Fixture {
    fn new(source: &str) -> Self {
        let sink = Diagnostics::new();
        let symbols = SymbolTable::new();
        let tokens = scanner::scan_all(source.as_bytes(), &sink);
        let program = parser::parse(source.as_bytes(), &tokens, &symbols, &sink);
        assert!(sink.is_empty(), "unexpected parse errors: {:?}", sink.messages());
        Self { program, symbols, sink }
    }

    fn decl(&self, name: &str) -> &Decl {
        self.program
            .decls()
            .map(|(_, decl)| decl)
            .find(|decl| decl.name.node == name)
            .unwrap_or_else(|| panic!("no declaration named {}", name))
    }

    fn id(&self, name: &str) -> EntityId {
        self.decl(name).entity
    }

    /// Claim `name` for [`EXEC`] and run the checker on it.
    fn check(&self, name: &str) -> CheckResult {
        let decl = self.decl(name);
        let claim = self.symbols.claim(decl.entity, EXEC);
        assert!(matches!(claim, Claim::Claimed | Claim::AlreadyMine), "claim of {} gave {:?}", name, claim);
        Checker::new(&self.symbols, &self.sink).check_decl(decl, EXEC)
    }

    /// Check `name`, expect it to resolve, and mark it emitted.
    fn emit(&self, name: &str) {
        assert_eq!(self.check(name).outcome, Outcome::Resolved, "{:?}", self.sink.messages());
        assert!(self.symbols.advance(self.id(name), EntityState::Emitting));
        assert!(self.symbols.advance(self.id(name), EntityState::Emitted));
    }
}

#[test]
fn test_waits_on_unchecked_dependency() {
    let f = Fixture::new("a :: b + 1\nb :: 2\n");
    let result = f.check("a");
    assert_eq!(result.outcome, Outcome::Unresolved { waiting_on: f.id("b") });
    assert_eq!(result.value, None);
    assert!(f.sink.is_empty());
}

#[test]
fn test_resolves_once_dependency_is_emitted() {
    let f = Fixture::new("a :: b + 1\nb :: 2\n");
    f.emit("b");
    assert_eq!(f.symbols.value(f.id("b")), Some(ConstValue::Int(2)));

    let result = f.check("a");
    assert_eq!(result.outcome, Outcome::Resolved);
    assert_eq!(result.value, Some(ConstValue::Int(3)));
    assert_eq!(f.symbols.value(f.id("a")), Some(ConstValue::Int(3)));
}

#[test]
fn test_waits_on_dependency_held_by_another_executor() {
    let f = Fixture::new("a :: b\nb :: 2\n");
    assert_eq!(f.symbols.claim(f.id("b"), ExecutorId(7)), Claim::Claimed);
    assert_eq!(f.check("a").outcome, Outcome::Unresolved { waiting_on: f.id("b") });

    assert!(f.symbols.advance(f.id("b"), EntityState::Emitting));
    assert_eq!(f.check("a").outcome, Outcome::Unresolved { waiting_on: f.id("b") });
}

#[test]
fn test_self_reference_is_a_cycle() {
    let f = Fixture::new("a :: a + 1\n");
    assert_eq!(f.check("a").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["cyclic dependency detected: a refers to itself"]);
}

#[test]
fn test_recursion_through_function_body_is_a_cycle() {
    let f = Fixture::new("f :: fn(n) { return f }\n");
    assert_eq!(f.check("f").outcome, Outcome::Invalid);
    assert_eq!(f.sink.count_containing("cyclic dependency detected: f"), 1);
}

#[test]
fn test_failed_dependency_invalidates() {
    let f = Fixture::new("a :: b\nb :: 1\n");
    assert!(f.symbols.advance(f.id("b"), EntityState::Failed));
    assert_eq!(f.check("a").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["use of invalid declaration b"]);
}

#[test]
fn test_errors_accumulate_within_statement() {
    let f = Fixture::new("a :: nope + 1 / 0\n");
    assert_eq!(f.check("a").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["use of unresolved identifier nope", "constant division by zero"]);
}

#[test]
fn test_error_dominates_pending() {
    let f = Fixture::new("a :: b + nope\nb :: 1\n");
    assert_eq!(f.check("a").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["use of unresolved identifier nope"]);
}

#[test]
fn test_folding() {
    let f = Fixture::new("x :: 1 < 2 ? 10 : 20\ny :: 7 / 2.0\nz :: 0x10 | 1\nw :: -(3 - 5) * 2\n");
    assert_eq!(f.check("x").value, Some(ConstValue::Int(10)));
    assert_eq!(f.check("y").value, Some(ConstValue::Float(3.5)));
    assert_eq!(f.check("z").value, Some(ConstValue::Int(17)));
    assert_eq!(f.check("w").value, Some(ConstValue::Int(4)));
    assert!(f.sink.is_empty(), "{:?}", f.sink.messages());
}

#[test]
fn test_integer_literal_out_of_range() {
    let f = Fixture::new("big :: 9223372036854775808\n");
    assert_eq!(f.check("big").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["integer literal 9223372036854775808 is out of range"]);
}

#[test]
fn test_constant_declaration_needs_constant_value() {
    let f = Fixture::new("x := 1\ny :: x + 1\n");
    f.emit("x");
    assert_eq!(f.symbols.value(f.id("x")), None);

    assert_eq!(f.check("y").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["expected constant declaration: value of y is not constant"]);
}

#[test]
fn test_mutable_declaration_accepts_runtime_value() {
    let f = Fixture::new("x := 1\ny := x * 2\n");
    f.emit("x");
    let result = f.check("y");
    assert_eq!(result.outcome, Outcome::Resolved);
    assert_eq!(result.value, None);
}

#[test]
fn test_assignment_to_constant() {
    let f = Fixture::new("k :: 1\nf :: fn() {\n  k = 2\n  return k\n}\n");
    f.emit("k");
    assert_eq!(f.check("f").outcome, Outcome::Invalid);
    let diagnostics = f.sink.snapshot();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].message, "cannot assign to constant value k");
    assert_eq!(diagnostics[0].labels[0].0, f.decl("k").name.span);
}

#[test]
fn test_assignment_to_mutable_global_in_function() {
    let f = Fixture::new("x := 1\nf :: fn() {\n  x = x + 1\n  return x\n}\n");
    f.emit("x");
    let result = f.check("f");
    assert_eq!(result.outcome, Outcome::Resolved);
    assert_eq!(result.value, Some(ConstValue::Function));
}

#[test]
fn test_assignment_to_unknown_name() {
    let f = Fixture::new("f :: fn() {\n  y = 1\n  return 0\n}\n");
    assert_eq!(f.check("f").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["use of unresolved identifier y"]);
}

#[test]
fn test_missing_return() {
    let f = Fixture::new("f :: fn() { x := 1 }\n");
    assert_eq!(f.check("f").outcome, Outcome::Invalid);
    assert_eq!(f.sink.count_containing("missing return"), 1);
}

#[test]
fn test_locals_shadow_and_scope() {
    let f = Fixture::new("a :: 1\nf :: fn(p) {\n  a :: 2\n  { b := a + p }\n  return b\n}\n");
    f.emit("a");
    assert_eq!(f.check("f").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["use of unresolved identifier b"]);
}

#[test]
fn test_local_constant_folds() {
    let f = Fixture::new("f :: fn() {\n  k :: 2 * 3\n  j :: k + 1\n  return j\n}\n");
    assert_eq!(f.check("f").outcome, Outcome::Resolved);
    assert!(f.sink.is_empty(), "{:?}", f.sink.messages());
}

#[test]
fn test_duplicate_local_declaration() {
    let f = Fixture::new("f :: fn(a) {\n  a := 1\n  return a\n}\n");
    assert_eq!(f.check("f").outcome, Outcome::Invalid);
    assert_eq!(f.sink.messages(), ["duplicate declaration of a"]);
}

#[test]
fn test_local_waiting_on_global_is_pending() {
    let f = Fixture::new("f :: fn() {\n  k :: g\n  return k\n}\ng :: 1\n");
    assert_eq!(f.check("f").outcome, Outcome::Unresolved { waiting_on: f.id("g") });
}

#[test]
fn test_entry_point() {
    let f = Fixture::new("main :: fn() { return 0 }\n");
    let result = f.check("main");
    assert_eq!(result.outcome, Outcome::Resolved);
    assert_eq!(result.entry_point, Some(f.id("main")));
}

#[test]
fn test_main_that_is_not_a_function_warns() {
    let f = Fixture::new("main :: 1\n");
    let result = f.check("main");
    assert_eq!(result.outcome, Outcome::Resolved);
    assert_eq!(result.entry_point, None);
    assert!(!f.sink.has_errors());
    assert_eq!(f.sink.count_containing("`main` is not a constant function literal"), 1);
}

#[test]
fn test_diagnostics_deferred_while_unresolved() {
    let f = Fixture::new("main :: b\nb :: 1\n");
    assert!(matches!(f.check("main").outcome, Outcome::Unresolved { .. }));
    assert!(f.sink.is_empty());

    f.emit("b");
    assert_eq!(f.check("main").outcome, Outcome::Resolved);
    assert_eq!(f.sink.len(), 1);
}

#[test]
fn test_mutable_global_read_never_waits() {
    let f = Fixture::new("a := b\nb := 1\n");
    let result = f.check("a");
    assert_eq!(result.outcome, Outcome::Resolved);
    assert_eq!(result.value, None);
    assert!(f.sink.is_empty(), "{:?}", f.sink.messages());
    assert_eq!(f.symbols.state(f.id("b")), EntityState::Unchecked);
}

#[test]
fn test_function_reading_unsettled_mutable_global() {
    let f = Fixture::new("x := f\nf :: fn() { return x }\n");
    assert_eq!(f.symbols.state(f.id("x")), EntityState::Unchecked);
    f.emit("f");
    assert_eq!(f.symbols.value(f.id("f")), Some(ConstValue::Function));

    let result = f.check("x");
    assert_eq!(result.outcome, Outcome::Resolved);
    assert!(f.sink.is_empty(), "{:?}", f.sink.messages());
}

#[test]
fn test_each_run_allocates_fresh_scopes() {
    let f = Fixture::new("f :: fn(p) {\n  { q := p }\n  return g\n}\ng :: 1\n");
    let before = f.symbols.scope_count();
    let entities = f.symbols.entity_count();

    assert_eq!(f.check("f").outcome, Outcome::Unresolved { waiting_on: f.id("g") });
    assert_eq!(f.symbols.scope_count(), before + 2);
    assert_eq!(f.check("f").outcome, Outcome::Unresolved { waiting_on: f.id("g") });
    assert_eq!(f.symbols.scope_count(), before + 4);

    f.emit("g");
    assert_eq!(f.check("f").outcome, Outcome::Resolved);
    assert_eq!(f.symbols.scope_count(), before + 6);
    assert_eq!(f.symbols.entity_count(), entities);
    assert!(f.sink.is_empty(), "{:?}", f.sink.messages());
}
