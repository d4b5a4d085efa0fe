//! Shared FIFO of work units.
//!
//! Workers block in [`WorkQueue::pop`] while the queue is empty but other workers are still executing units,
//! since those may enqueue more work. Once the queue is empty and nothing is in flight, every `pop` returns
//! `None` and the workers exit.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use super::WorkUnit;

#[derive(Default)]
struct QueueState {
    units: VecDeque<WorkUnit>,
    /// Units handed out by `pop` and not yet `finish`ed.
    in_flight: usize,
}

#[derive(Default)]
pub(crate) struct WorkQueue {
    state: Mutex<QueueState>,
    changed: Condvar,
}

impl WorkQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, unit: WorkUnit) {
        self.state.lock().units.push_back(unit);
        self.changed.notify_one();
    }

    /// Take the next unit, blocking while other workers might still produce one.
    ///
    /// Every `Some` must be paired with a [`WorkQueue::finish`] call.
    pub(crate) fn pop(&self) -> Option<WorkUnit> {
        let mut state = self.state.lock();
        loop {
            if let Some(unit) = state.units.pop_front() {
                state.in_flight += 1;
                return Some(unit);
            }
            if state.in_flight == 0 {
                drop(state);
                self.changed.notify_all();
                return None;
            }
            self.changed.wait(&mut state);
        }
    }

    /// Mark a unit returned by `pop` as done.
    pub(crate) fn finish(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        let idle = state.in_flight == 0 && state.units.is_empty();
        drop(state);
        if idle {
            self.changed.notify_all();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.state.lock().units.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::DeclId;
    use crate::frontend::symbols::EntityId;
    use crate::jobs::CodeGenJob;

    fn unit(n: u32) -> WorkUnit {
        WorkUnit::CodeGen(CodeGenJob::new(DeclId(n), EntityId(n)))
    }

    #[test]
    fn test_fifo_order() {
        let queue = WorkQueue::new();
        queue.push(unit(1));
        queue.push(unit(2));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(unit(1)));
        assert_eq!(queue.pop(), Some(unit(2)));
        queue.finish();
        queue.finish();
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_empty_and_idle_returns_none() {
        let queue = WorkQueue::new();
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_pop_waits_for_in_flight_work() {
        let queue = WorkQueue::new();
        queue.push(unit(1));
        let first = queue.pop();
        assert!(first.is_some());

        std::thread::scope(|scope| {
            let waiter = scope.spawn(|| queue.pop());
            std::thread::sleep(std::time::Duration::from_millis(20));
            // The in-flight unit produces a follow-up before it finishes.
            queue.push(unit(2));
            queue.finish();
            assert_eq!(waiter.join().unwrap(), Some(unit(2)));
        });
        queue.finish();
        assert_eq!(queue.pop(), None);
    }
}
