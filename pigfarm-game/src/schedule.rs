//! Cancellable tick sources.
//!
//! The engine never owns a timer. Hosts implement [`TickScheduler`] over whatever clock they
//! run on and drive it through [`AutoClickerTimer`], which guarantees a single live handle.
use std::collections::BTreeMap;

use crate::outcome::TickDirective;

/// Opaque handle to a scheduled repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// A clock that can start and cancel repeating timers.
pub trait TickScheduler {
    fn schedule_every(&mut self, interval_ms: u64) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// Owns the auto-clicker's single tick source.
#[derive(Debug)]
pub struct AutoClickerTimer<S: TickScheduler> {
    scheduler: S,
    active: Option<(TimerId, u64)>,
}

impl<S: TickScheduler> AutoClickerTimer<S> {
    pub const fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            active: None,
        }
    }

    /// Cancel the running tick, if any, then start a new one at `interval_ms`.
    pub fn restart(&mut self, interval_ms: u64) -> TimerId {
        self.stop();
        let id = self.scheduler.schedule_every(interval_ms);
        self.active = Some((id, interval_ms));
        id
    }

    pub fn apply(&mut self, directive: TickDirective) -> TimerId {
        match directive {
            TickDirective::Restart { interval_ms } => self.restart(interval_ms),
        }
    }

    pub fn stop(&mut self) {
        if let Some((id, _)) = self.active.take() {
            self.scheduler.cancel(id);
        }
    }

    #[must_use]
    pub fn timer_id(&self) -> Option<TimerId> {
        self.active.map(|(id, _)| id)
    }

    #[must_use]
    pub fn interval_ms(&self) -> Option<u64> {
        self.active.map(|(_, interval)| interval)
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub const fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn into_scheduler(self) -> S {
        self.scheduler
    }
}

#[derive(Debug, Clone, Copy)]
struct Repeating {
    interval_ms: u64,
    next_due_ms: u64,
}

/// Deterministic virtual clock.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: u64,
    timers: BTreeMap<TimerId, Repeating>,
}

impl ManualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    #[must_use]
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Move the clock forward, returning every firing in chronological order (ties by id).
    pub fn advance(&mut self, ms: u64) -> Vec<TimerId> {
        let target = self.now_ms.saturating_add(ms);
        let mut fired = Vec::new();
        loop {
            let next = self
                .timers
                .iter()
                .filter(|(_, timer)| timer.next_due_ms <= target)
                .min_by_key(|(id, timer)| (timer.next_due_ms, **id))
                .map(|(id, timer)| (*id, timer.next_due_ms));
            let Some((id, due)) = next else { break };

            self.now_ms = due;
            if let Some(timer) = self.timers.get_mut(&id) {
                timer.next_due_ms = due.saturating_add(timer.interval_ms);
            }
            fired.push(id);
        }
        self.now_ms = target;
        fired
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule_every(&mut self, interval_ms: u64) -> TimerId {
        let interval_ms = interval_ms.max(1);
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            id,
            Repeating {
                interval_ms,
                next_due_ms: self.now_ms.saturating_add(interval_ms),
            },
        );
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.remove(&id);
    }
}
