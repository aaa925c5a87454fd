use std::time::{Duration, Instant};

/// Handle for a pending timer, returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending<E> {
    id: TimerId,
    deadline: Instant,
    event: E,
}

/// Single-threaded timer queue.
///
/// Every delayed action in the card (plane launch, index advance, finish
/// delay, balloon pop) is a value scheduled here and handed back by
/// [`Scheduler::drain_due`] once its deadline has passed. Nothing runs on
/// its own: the owner polls with the current frame time, so tests can step
/// virtual time without sleeping.
#[derive(Debug)]
pub struct Scheduler<E> {
    pending: Vec<Pending<E>>,
    next_id: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, now: Instant, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            deadline: now + delay,
            event,
        });
        id
    }

    /// Drop a single timer. Returns false if it already fired or was cancelled.
    #[cfg(test)]
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Drop every pending timer and return how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    /// Drop the timers whose event matches `pred`.
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&E) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| !pred(&p.event));
        before - self.pending.len()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, mut pred: impl FnMut(&E) -> bool) -> bool {
        self.pending.iter().any(|p| pred(&p.event))
    }

    /// Earliest deadline still pending, used to schedule the next repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    /// Remove and return every event due at `now`, ordered by deadline.
    /// Events sharing a deadline come back in the order they were scheduled.
    pub fn drain_due(&mut self, now: Instant) -> Vec<(Instant, E)> {
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.deadline <= now);
        self.pending = rest;
        due.sort_by_key(|p| (p.deadline, p.id));
        due.into_iter().map(|p| (p.deadline, p.event)).collect()
    }
}
