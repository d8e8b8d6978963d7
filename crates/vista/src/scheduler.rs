//! Virtual-time timer queue.
//!
//! The enhancer never sleeps. Every delayed action (settle delays, polling,
//! debounce) is a task in a [`Scheduler`], and the embedding host advances
//! time explicitly. Tasks due at the same instant run in the order they were
//! scheduled.

use std::{collections::BTreeMap, fmt, time::Duration};

use indexmap::IndexMap;

/// Milliseconds elapsed since the enhancer started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a timestamp `millis` milliseconds after startup.
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the milliseconds elapsed since startup.
    pub fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns the timestamp `delay` after this one.
    pub fn after(self, delay: Duration) -> Self {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Handle of a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Ordered queue of delayed tasks over a virtual clock.
#[derive(Debug)]
pub struct Scheduler<T> {
    now: Timestamp,
    next_id: u64,
    queue: BTreeMap<(Timestamp, u64), T>,
    deadlines: IndexMap<u64, Timestamp>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: Timestamp::default(),
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: IndexMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current virtual time.
    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Returns the number of tasks waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Schedules `task` to run `delay` from now.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;

        let at = self.now.after(delay);
        self.queue.insert((at, id), task);
        self.deadlines.insert(id, at);
        TimerId(id)
    }

    /// Cancels a scheduled task. Returns `false` if it already ran or was
    /// cancelled before.
    pub fn cancel(&mut self, timer: TimerId) -> bool {
        match self.deadlines.swap_remove(&timer.0) {
            Some(at) => self.queue.remove(&(at, timer.0)).is_some(),
            None => false,
        }
    }

    /// Returns when the earliest pending task is due.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Removes the earliest task due at or before `until`, moving the clock
    /// to its deadline.
    pub fn pop_due(&mut self, until: Timestamp) -> Option<(TimerId, T)> {
        let (&(at, id), _) = self.queue.first_key_value()?;
        if at > until {
            return None;
        }

        let task = self.queue.remove(&(at, id))?;
        self.deadlines.swap_remove(&id);
        self.now = self.now.max(at);
        Some((TimerId(id), task))
    }

    /// Moves the clock forward to `at`. Time never runs backwards.
    pub fn set_now(&mut self, at: Timestamp) {
        self.now = self.now.max(at);
    }
}
