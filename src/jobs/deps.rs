//! Wait-for edges between top-level entities, and the checker jobs parked on them.
//!
//! ## Notes
//!
//! - Each suspended entity has at most one live edge: the first dependency its latest run was waiting on.
//! - [`DependencyRegistry::suspend`] reads entity states under the registry lock, and settling writes the state
//!   before taking it, so a waiter registered against an entity that is about to settle is always woken.
//! - Cycles are found at suspension time by following edges from the dependency; settled entities end a walk.
//! - Cycle members are failed under the registry lock, and so is every other failure (see
//!   [`DependencyRegistry::fail`]). A member whose retry is still running observes its neighbours failed only
//!   after its own entity has failed, so it cannot report the cycle a second time as an invalid dependency.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use crate::frontend::symbols::{EntityId, EntityState, SymbolTable};

use super::{CheckerJob, Suspension};

/// What became of a job handed to [`DependencyRegistry::suspend`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Suspend {
    /// Registered as a waiter on the dependency.
    Parked,
    /// Must be enqueued again (the dependency already settled, or the strategy is `Requeue`).
    Retry(CheckerJob),
    /// Waiting would close a cycle. Members in wait order, starting with the suspending entity; all of them
    /// are already `Failed`.
    Cycle(Vec<EntityId>),
    /// The job's own entity already settled (failed as part of a cycle found elsewhere).
    Dropped,
}

#[derive(Debug, Default)]
struct Registry {
    waiting_on: HashMap<EntityId, EntityId>,
    waiters: HashMap<EntityId, Vec<CheckerJob>>,
}

impl Registry {
    /// Follow edges from `dep`; returns the path `[start, dep, ...]` if it leads back to `start`.
    fn find_cycle(&self, symbols: &SymbolTable, start: EntityId, dep: EntityId) -> Option<Vec<EntityId>> {
        let mut path = vec![start];
        let mut visited = HashSet::from([start]);
        let mut current = dep;
        loop {
            if current == start {
                return Some(path);
            }
            if !visited.insert(current) || symbols.state(current).is_settled() {
                return None;
            }
            path.push(current);
            current = *self.waiting_on.get(&current)?;
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DependencyRegistry {
    inner: Mutex<Registry>,
}

impl DependencyRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn suspend(
        &self,
        symbols: &SymbolTable,
        job: CheckerJob,
        dep: EntityId,
        strategy: Suspension,
    ) -> Suspend {
        let mut registry = self.inner.lock();

        if symbols.state(job.entity).is_settled() {
            registry.waiting_on.remove(&job.entity);
            return Suspend::Dropped;
        }
        if symbols.state(dep).is_settled() {
            registry.waiting_on.remove(&job.entity);
            return Suspend::Retry(job);
        }
        if let Some(members) = registry.find_cycle(symbols, job.entity, dep) {
            for &member in &members {
                registry.waiting_on.remove(&member);
                symbols.advance(member, EntityState::Failed);
            }
            return Suspend::Cycle(members);
        }

        registry.waiting_on.insert(job.entity, dep);
        match strategy {
            Suspension::Park => {
                registry.waiters.entry(dep).or_default().push(job);
                Suspend::Parked
            }
            Suspension::Requeue => Suspend::Retry(job),
        }
    }

    /// Move `entity` to `Failed` under the registry lock.
    ///
    /// Returns `false` if it had already settled, e.g. as a member of a cycle reported by another job.
    pub(crate) fn fail(&self, symbols: &SymbolTable, entity: EntityId) -> bool {
        let _registry = self.inner.lock();
        symbols.advance(entity, EntityState::Failed)
    }

    /// Drop the live edge of `entity`, if any.
    pub(crate) fn clear(&self, entity: EntityId) {
        self.inner.lock().waiting_on.remove(&entity);
    }

    /// Called after `entity` reached `Emitted` or `Failed`: returns its waiters, now ready to run again.
    pub(crate) fn settle(&self, entity: EntityId) -> Vec<CheckerJob> {
        let mut registry = self.inner.lock();
        registry.waiting_on.remove(&entity);
        let woken = registry.waiters.remove(&entity).unwrap_or_default();
        for job in &woken {
            registry.waiting_on.remove(&job.entity);
        }
        woken
    }

    /// Remove every parked job, paired with the entity it was waiting on.
    pub(crate) fn drain_parked(&self) -> Vec<(CheckerJob, EntityId)> {
        let mut registry = self.inner.lock();
        registry.waiting_on.clear();
        let mut parked: Vec<_> = registry
            .waiters
            .drain()
            .flat_map(|(dep, jobs)| jobs.into_iter().map(move |job| (job, dep)))
            .collect();
        parked.sort_by_key(|(job, _)| job.decl);
        parked
    }

    #[cfg(test)]
    pub(crate) fn edge(&self, entity: EntityId) -> Option<EntityId> {
        self.inner.lock().waiting_on.get(&entity).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{DeclId, Span};
    use crate::frontend::symbols::ExecutorId;

    fn setup(names: &[&str]) -> (SymbolTable, Vec<CheckerJob>) {
        let symbols = SymbolTable::new();
        let jobs = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let decl = DeclId(i as u32);
                let entity = symbols.new_entity(*name, Span::default(), true, Some(decl));
                CheckerJob::new(decl, entity, ExecutorId(i as u32))
            })
            .collect();
        (symbols, jobs)
    }

    #[test]
    fn test_park_then_settle_wakes() {
        let (symbols, jobs) = setup(&["a", "b"]);
        let deps = DependencyRegistry::new();
        assert_eq!(deps.suspend(&symbols, jobs[0], jobs[1].entity, Suspension::Park), Suspend::Parked);
        assert_eq!(deps.edge(jobs[0].entity), Some(jobs[1].entity));

        assert!(symbols.advance(jobs[1].entity, EntityState::Emitted));
        assert_eq!(deps.settle(jobs[1].entity), vec![jobs[0]]);
        assert_eq!(deps.edge(jobs[0].entity), None);
        assert!(deps.settle(jobs[1].entity).is_empty());
    }

    #[test]
    fn test_settled_dependency_retries_immediately() {
        let (symbols, jobs) = setup(&["a", "b"]);
        let deps = DependencyRegistry::new();
        assert!(symbols.advance(jobs[1].entity, EntityState::Failed));
        assert_eq!(
            deps.suspend(&symbols, jobs[0], jobs[1].entity, Suspension::Park),
            Suspend::Retry(jobs[0])
        );
    }

    #[test]
    fn test_requeue_records_edge_without_parking() {
        let (symbols, jobs) = setup(&["a", "b"]);
        let deps = DependencyRegistry::new();
        assert_eq!(
            deps.suspend(&symbols, jobs[0], jobs[1].entity, Suspension::Requeue),
            Suspend::Retry(jobs[0])
        );
        assert_eq!(deps.edge(jobs[0].entity), Some(jobs[1].entity));
        assert!(deps.drain_parked().is_empty());
    }

    #[test]
    fn test_cycle_is_detected_on_closing_edge() {
        let (symbols, jobs) = setup(&["a", "b", "c"]);
        let deps = DependencyRegistry::new();
        let [a, b, c] = [jobs[0], jobs[1], jobs[2]];
        assert_eq!(deps.suspend(&symbols, a, b.entity, Suspension::Park), Suspend::Parked);
        assert_eq!(deps.suspend(&symbols, b, c.entity, Suspension::Park), Suspend::Parked);
        assert_eq!(
            deps.suspend(&symbols, c, a.entity, Suspension::Park),
            Suspend::Cycle(vec![c.entity, a.entity, b.entity])
        );
        assert_eq!(deps.edge(a.entity), None);
        assert_eq!(deps.edge(b.entity), None);
        for job in [a, b, c] {
            assert_eq!(symbols.state(job.entity), EntityState::Failed);
        }
        assert!(!deps.fail(&symbols, a.entity));
    }

    #[test]
    fn test_fail_reports_whether_it_settled() {
        let (symbols, jobs) = setup(&["a"]);
        let deps = DependencyRegistry::new();
        assert!(deps.fail(&symbols, jobs[0].entity));
        assert!(!deps.fail(&symbols, jobs[0].entity));
        assert_eq!(symbols.state(jobs[0].entity), EntityState::Failed);
    }

    #[test]
    fn test_settled_entity_breaks_chain() {
        let (symbols, jobs) = setup(&["a", "b", "c"]);
        let deps = DependencyRegistry::new();
        let [a, b, c] = [jobs[0], jobs[1], jobs[2]];
        assert_eq!(deps.suspend(&symbols, a, b.entity, Suspension::Requeue), Suspend::Retry(a));
        assert_eq!(deps.suspend(&symbols, c, a.entity, Suspension::Requeue), Suspend::Retry(c));
        assert!(symbols.advance(a.entity, EntityState::Emitted));
        // The stale edge a -> b must not close b -> c -> a -> b.
        assert_eq!(deps.suspend(&symbols, b, c.entity, Suspension::Park), Suspend::Parked);
    }

    #[test]
    fn test_settled_job_is_dropped() {
        let (symbols, jobs) = setup(&["a", "b"]);
        let deps = DependencyRegistry::new();
        assert!(symbols.advance(jobs[0].entity, EntityState::Failed));
        assert_eq!(deps.suspend(&symbols, jobs[0], jobs[1].entity, Suspension::Park), Suspend::Dropped);
    }

    #[test]
    fn test_drain_parked() {
        let (symbols, jobs) = setup(&["a", "b", "c"]);
        let deps = DependencyRegistry::new();
        deps.suspend(&symbols, jobs[1], jobs[2].entity, Suspension::Park);
        deps.suspend(&symbols, jobs[0], jobs[2].entity, Suspension::Park);
        assert_eq!(
            deps.drain_parked(),
            vec![(jobs[0], jobs[2].entity), (jobs[1], jobs[2].entity)]
        );
        assert_eq!(deps.edge(jobs[0].entity), None);
    }
}
