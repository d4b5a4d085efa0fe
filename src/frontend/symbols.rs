//! Symbol table and scope management for Kestrel
//!
//! Scopes and entities live in arenas addressed by integer handles ([`ScopeId`], [`EntityId`]). The table is
//! shared by every worker of the job system, so all mutation goes through interior locks:
//!
//! - each scope's member map has its own lock (concurrent `declare` calls serialize per scope),
//! - each entity's resolution state is a single atomic word, so the Unchecked → Checking transition is one
//!   compare-and-swap ([`SymbolTable::claim`]),
//! - a constant value is materialized at most once per entity.
//!
//! ## State machine
//!
//! ```text
//! Unchecked → Checking(executor) → Emitting → Emitted
//!     └────────────┴─────────────────→ Failed
//! ```
//!
//! States only move forward; [`SymbolTable::advance`] refuses a regressing request.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::frontend::ast::{DeclId, Span};

// ============================================================================
// HANDLES
// ============================================================================

/// Handle of an entity in the [`SymbolTable`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle of a scope in the [`SymbolTable`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The global scope, created with the table.
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identity of one check job, stable across its retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExecutorId(pub u32);

impl fmt::Display for ExecutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ============================================================================
// ENTITY STATE
// ============================================================================

/// Resolution state of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Unchecked,
    /// Being checked by the given executor.
    Checking(ExecutorId),
    Emitting,
    Emitted,
    /// The declaration can never be emitted (semantic error, cycle, duplicate).
    Failed,
}

impl EntityState {
    /// Position in the forward-only ordering; `Emitted` and `Failed` are both terminal.
    fn rank(self) -> u8 {
        match self {
            EntityState::Unchecked => 0,
            EntityState::Checking(_) => 1,
            EntityState::Emitting => 2,
            EntityState::Emitted | EntityState::Failed => 3,
        }
    }

    /// `Emitted` or `Failed`: nothing will change any more.
    pub fn is_settled(self) -> bool {
        matches!(self, EntityState::Emitted | EntityState::Failed)
    }

    // Packed layout: low byte is the tag, the executor id sits above it.
    const TAG_UNCHECKED: u64 = 0;
    const TAG_CHECKING: u64 = 1;
    const TAG_EMITTING: u64 = 2;
    const TAG_EMITTED: u64 = 3;
    const TAG_FAILED: u64 = 4;

    fn pack(self) -> u64 {
        match self {
            EntityState::Unchecked => Self::TAG_UNCHECKED,
            EntityState::Checking(executor) => Self::TAG_CHECKING | (u64::from(executor.0) << 8),
            EntityState::Emitting => Self::TAG_EMITTING,
            EntityState::Emitted => Self::TAG_EMITTED,
            EntityState::Failed => Self::TAG_FAILED,
        }
    }

    fn unpack(word: u64) -> Self {
        match word & 0xFF {
            Self::TAG_UNCHECKED => EntityState::Unchecked,
            Self::TAG_CHECKING => EntityState::Checking(ExecutorId((word >> 8) as u32)),
            Self::TAG_EMITTING => EntityState::Emitting,
            Self::TAG_EMITTED => EntityState::Emitted,
            _ => EntityState::Failed,
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityState::Unchecked => write!(f, "unchecked"),
            EntityState::Checking(executor) => write!(f, "checking by {}", executor),
            EntityState::Emitting => write!(f, "emitting"),
            EntityState::Emitted => write!(f, "emitted"),
            EntityState::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of [`SymbolTable::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// Moved Unchecked → Checking(executor).
    Claimed,
    /// Already Checking by the same executor (a retry).
    AlreadyMine,
    /// Someone else holds it, or it has moved past checking.
    Busy(EntityState),
}

// ============================================================================
// CONSTANT VALUES
// ============================================================================

/// Folded value of a constant expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstValue {
    Int(i64),
    Float(f64),
    /// A function literal; its body is not evaluated.
    Function,
}

impl ConstValue {
    /// Non-zero numbers are true; a function value is always true.
    pub fn is_truthy(self) -> bool {
        match self {
            ConstValue::Int(v) => v != 0,
            ConstValue::Float(v) => v != 0.0,
            ConstValue::Function => true,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{}", v),
            ConstValue::Float(v) => write!(f, "{:?}", v),
            ConstValue::Function => write!(f, "fn"),
        }
    }
}

// ============================================================================
// ENTITIES AND SCOPES
// ============================================================================

/// A named, declared symbol.
#[derive(Debug)]
pub struct Entity {
    pub name: String,
    /// Span of the declaring identifier.
    pub span: Span,
    pub constant: bool,
    /// Back-link to the originating top-level declaration.
    pub decl: Option<DeclId>,
    state: AtomicU64,
    value: OnceLock<ConstValue>,
}

impl Entity {
    pub fn state(&self) -> EntityState {
        EntityState::unpack(self.state.load(Ordering::Acquire))
    }

    pub fn value(&self) -> Option<ConstValue> {
        self.value.get().copied()
    }

    pub fn is_top_level(&self) -> bool {
        self.decl.is_some()
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    members: RwLock<HashMap<String, EntityId>>,
}

/// Arenas of scopes and entities.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: RwLock<Vec<Arc<Scope>>>,
    entities: RwLock<Vec<Arc<Entity>>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        let global = Arc::new(Scope {
            parent: None,
            members: RwLock::new(HashMap::new()),
        });
        Self {
            scopes: RwLock::new(vec![global]),
            entities: RwLock::new(Vec::new()),
        }
    }

    // ========================================================================
    // Arena access
    // ========================================================================

    /// Allocate a new entity in the `Unchecked` state. It is not bound in any scope yet.
    pub fn new_entity(&self, name: impl Into<String>, span: Span, constant: bool, decl: Option<DeclId>) -> EntityId {
        let mut entities = self.entities.write();
        let id = EntityId(entities.len() as u32);
        entities.push(Arc::new(Entity {
            name: name.into(),
            span,
            constant,
            decl,
            state: AtomicU64::new(EntityState::Unchecked.pack()),
            value: OnceLock::new(),
        }));
        id
    }

    /// Look up an entity by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not allocated by this table.
    pub fn entity(&self, id: EntityId) -> Arc<Entity> {
        Arc::clone(&self.entities.read()[id.index()])
    }

    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().len()
    }

    fn scope(&self, id: ScopeId) -> Arc<Scope> {
        Arc::clone(&self.scopes.read()[id.index()])
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    /// Create a child scope of `parent`.
    ///
    /// Scopes are never freed; they live as long as the table.
    pub fn push_scope(&self, parent: ScopeId) -> ScopeId {
        let mut scopes = self.scopes.write();
        let id = ScopeId(scopes.len() as u32);
        scopes.push(Arc::new(Scope {
            parent: Some(parent),
            members: RwLock::new(HashMap::new()),
        }));
        id
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scope(scope).parent
    }

    /// Bind `entity` under its name in `scope`, returning the binding it replaced in this scope only.
    ///
    /// The new binding always wins; callers report the collision.
    pub fn declare(&self, scope: ScopeId, entity: EntityId) -> Option<EntityId> {
        let name = self.entity(entity).name.clone();
        self.scope(scope).members.write().insert(name, entity)
    }

    /// Resolve `name` from `scope` outward through the parent chain.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<EntityId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(&entity) = scope.members.read().get(name) {
                return Some(entity);
            }
            current = scope.parent;
        }
        None
    }

    /// Resolve `name` in `scope` only.
    pub fn lookup_local(&self, scope: ScopeId, name: &str) -> Option<EntityId> {
        self.scope(scope).members.read().get(name).copied()
    }

    // ========================================================================
    // Entity state
    // ========================================================================

    pub fn state(&self, id: EntityId) -> EntityState {
        self.entity(id).state()
    }

    /// Atomically move `id` from `Unchecked` to `Checking(executor)`.
    pub fn claim(&self, id: EntityId, executor: ExecutorId) -> Claim {
        let entity = self.entity(id);
        let unchecked = EntityState::Unchecked.pack();
        let checking = EntityState::Checking(executor).pack();
        match entity
            .state
            .compare_exchange(unchecked, checking, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Claim::Claimed,
            Err(word) if word == checking => Claim::AlreadyMine,
            Err(word) => Claim::Busy(EntityState::unpack(word)),
        }
    }

    /// Move `id` forward to `to`. Returns `false` (leaving the state alone) if that would regress.
    pub fn advance(&self, id: EntityId, to: EntityState) -> bool {
        let entity = self.entity(id);
        let mut current = entity.state.load(Ordering::Acquire);
        loop {
            let from = EntityState::unpack(current);
            if to.rank() <= from.rank() {
                return false;
            }
            match entity
                .state
                .compare_exchange_weak(current, to.pack(), Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Record the folded value of a constant; later calls keep the first value.
    pub fn set_value(&self, id: EntityId, value: ConstValue) {
        let _ = self.entity(id).value.set(value);
    }

    pub fn value(&self, id: EntityId) -> Option<ConstValue> {
        self.entity(id).value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(names: &[&str]) -> (SymbolTable, Vec<EntityId>) {
        let table = SymbolTable::new();
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| table.new_entity(*name, Span::leaf(i * 10, name.len()), true, None))
            .collect();
        (table, ids)
    }

    #[test]
    fn test_declare_returns_previous_in_same_scope_only() {
        let (table, ids) = table_with(&["x", "x", "x"]);
        assert_eq!(table.declare(ScopeId::GLOBAL, ids[0]), None);
        assert_eq!(table.declare(ScopeId::GLOBAL, ids[1]), Some(ids[0]));
        assert_eq!(table.lookup(ScopeId::GLOBAL, "x"), Some(ids[1]));

        let inner = table.push_scope(ScopeId::GLOBAL);
        assert_eq!(table.declare(inner, ids[2]), None);
        assert_eq!(table.lookup(inner, "x"), Some(ids[2]));
        assert_eq!(table.lookup(ScopeId::GLOBAL, "x"), Some(ids[1]));
    }

    #[test]
    fn test_arenas_only_grow() {
        let (table, ids) = table_with(&["a", "b"]);
        assert_eq!(table.entity_count(), 2);
        assert_eq!(table.scope_count(), 1);

        let inner = table.push_scope(ScopeId::GLOBAL);
        table.push_scope(inner);
        table.declare(inner, ids[0]);
        assert_eq!(table.scope_count(), 3);
        assert_eq!(table.entity_count(), 2);
        assert_eq!(table.new_entity("c", Span::default(), false, None), EntityId(2));
        assert_eq!(table.entity_count(), 3);
    }

    #[test]
    fn test_lookup_walks_parent_chain() {
        let (table, ids) = table_with(&["a", "b"]);
        table.declare(ScopeId::GLOBAL, ids[0]);
        let mid = table.push_scope(ScopeId::GLOBAL);
        let leaf = table.push_scope(mid);
        table.declare(mid, ids[1]);
        assert_eq!(table.lookup(leaf, "a"), Some(ids[0]));
        assert_eq!(table.lookup(leaf, "b"), Some(ids[1]));
        assert_eq!(table.lookup(ScopeId::GLOBAL, "b"), None);
        assert_eq!(table.lookup_local(leaf, "a"), None);
        assert_eq!(table.parent(leaf), Some(mid));
    }

    #[test]
    fn test_claim_is_exclusive() {
        let (table, ids) = table_with(&["a"]);
        let (one, two) = (ExecutorId(1), ExecutorId(2));
        assert_eq!(table.claim(ids[0], one), Claim::Claimed);
        assert_eq!(table.claim(ids[0], one), Claim::AlreadyMine);
        assert_eq!(table.claim(ids[0], two), Claim::Busy(EntityState::Checking(one)));
    }

    #[test]
    fn test_advance_is_forward_only() {
        let (table, ids) = table_with(&["a"]);
        let a = ids[0];
        assert_eq!(table.claim(a, ExecutorId(7)), Claim::Claimed);
        assert!(table.advance(a, EntityState::Emitting));
        assert!(!table.advance(a, EntityState::Checking(ExecutorId(7))));
        assert!(!table.advance(a, EntityState::Unchecked));
        assert!(table.advance(a, EntityState::Emitted));
        assert!(!table.advance(a, EntityState::Failed));
        assert_eq!(table.state(a), EntityState::Emitted);
    }

    #[test]
    fn test_failed_is_terminal() {
        let (table, ids) = table_with(&["a"]);
        assert!(table.advance(ids[0], EntityState::Failed));
        assert!(!table.advance(ids[0], EntityState::Emitted));
        assert_eq!(table.claim(ids[0], ExecutorId(0)), Claim::Busy(EntityState::Failed));
    }

    #[test]
    fn test_state_packing_keeps_large_executor_ids() {
        let state = EntityState::Checking(ExecutorId(u32::MAX));
        assert_eq!(EntityState::unpack(state.pack()), state);
    }

    #[test]
    fn test_value_is_materialized_once() {
        let (table, ids) = table_with(&["a"]);
        assert_eq!(table.value(ids[0]), None);
        table.set_value(ids[0], ConstValue::Int(3));
        table.set_value(ids[0], ConstValue::Int(4));
        assert_eq!(table.value(ids[0]), Some(ConstValue::Int(3)));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let (table, ids) = table_with(&["a"]);
        let winners: usize = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let table = &table;
                    let a = ids[0];
                    s.spawn(move || table.claim(a, ExecutorId(i)) == Claim::Claimed)
                })
                .collect();
            handles.into_iter().map(|h| usize::from(h.join().unwrap())).sum()
        });
        assert_eq!(winners, 1);
    }
}
