//! Tick-keyed task scheduler.
//!
//! The host drives the engine one tick at a time; anything the engine wants
//! to happen later (timeout checks, fast-forward steps) is queued here under
//! the server tick it is due on. Nothing is keyed to wall-clock time, so a
//! test can replay any scenario by simply advancing ticks.

use std::collections::BTreeMap;

use skipnight_types::{SessionId, VoteType, WorldId};

/// Deferred work for the vote engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Check a running vote for timeout or condition loss.
    VoteCheck {
        /// World of the vote.
        world: WorldId,
        /// Type of the vote.
        vote_type: VoteType,
        /// Session the check was scheduled for; stale checks are dropped.
        session: SessionId,
    },
    /// Advance a world's fast-forward by one step.
    FastForwardStep {
        /// World being fast-forwarded.
        world: WorldId,
    },
}

/// Server tick counter plus the queue of tasks due at future ticks.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: u64,
    queue: BTreeMap<u64, Vec<Task>>,
}

impl Scheduler {
    /// Create a scheduler at tick 0 with nothing queued.
    pub const fn new() -> Self {
        Self {
            now: 0,
            queue: BTreeMap::new(),
        }
    }

    /// Current server tick.
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Advance to the next tick and return it.
    pub const fn advance(&mut self) -> u64 {
        self.now = self.now.saturating_add(1);
        self.now
    }

    /// Queue `task` for `tick`. Ticks in the past run on the next drain.
    pub fn schedule_at(&mut self, tick: u64, task: Task) {
        self.queue.entry(tick).or_default().push(task);
    }

    /// Queue `task` for `delay` ticks from now (at least one).
    pub fn schedule_in(&mut self, delay: u64, task: Task) {
        let tick = self.now.saturating_add(delay.max(1));
        self.schedule_at(tick, task);
    }

    /// Remove and return every task due at or before the current tick,
    /// in tick order, then insertion order.
    pub fn take_due(&mut self) -> Vec<Task> {
        let later = self.queue.split_off(&self.now.saturating_add(1));
        let due = std::mem::replace(&mut self.queue, later);
        due.into_values().flatten().collect()
    }

    /// Number of queued tasks.
    pub fn pending(&self) -> usize {
        self.queue.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(world: WorldId) -> Task {
        Task::FastForwardStep { world }
    }

    #[test]
    fn tasks_run_when_due() {
        let mut s = Scheduler::new();
        let w = WorldId::new();
        s.schedule_in(2, step(w));
        assert!(s.take_due().is_empty());
        s.advance();
        assert!(s.take_due().is_empty());
        s.advance();
        assert_eq!(s.take_due(), vec![step(w)]);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn zero_delay_means_next_tick() {
        let mut s = Scheduler::new();
        let w = WorldId::new();
        s.schedule_in(0, step(w));
        assert!(s.take_due().is_empty());
        s.advance();
        assert_eq!(s.take_due().len(), 1);
    }

    #[test]
    fn overdue_tasks_keep_order() {
        let mut s = Scheduler::new();
        let a = WorldId::new();
        let b = WorldId::new();
        s.schedule_at(3, step(b));
        s.schedule_at(1, step(a));
        for _ in 0..5 {
            s.advance();
        }
        assert_eq!(s.take_due(), vec![step(a), step(b)]);
    }
}
