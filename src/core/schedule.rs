//! Scheduled-event queue keyed by simulation time
//!
//! Every delayed effect (attack wind-up, stagger end, hit-volume expiry...)
//! is an entry here rather than a timer callback. Entries tied to a
//! combatant carry a `CancelToken`: the combatant's generation at the time
//! of scheduling. Any transition that abandons pending follow-ups bumps the
//! generation, so stale entries are dropped when they come due.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::types::{Millis, Role};

/// Liveness guard for a scheduled entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelToken {
    pub role: Role,
    pub generation: u32,
}

#[derive(Debug)]
struct Entry<E> {
    due: Millis,
    seq: u64,
    token: Option<CancelToken>,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Reversed: BinaryHeap is a max-heap, we want earliest (due, seq) first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-heap of future events, polled once per tick
#[derive(Debug)]
pub struct Schedule<E> {
    heap: BinaryHeap<Entry<E>>,
    next_seq: u64,
}

impl<E> Default for Schedule<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Schedule<E> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedule `event` at absolute time `due`
    ///
    /// Entries due at the same time fire in insertion order.
    pub fn schedule(&mut self, due: Millis, token: Option<CancelToken>, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            due,
            seq,
            token,
            event,
        });
    }

    /// Pop the next entry due at or before `now` whose token is still live
    ///
    /// Stale entries encountered on the way are discarded.
    pub fn pop_due<F>(&mut self, now: Millis, mut is_live: F) -> Option<E>
    where
        F: FnMut(CancelToken) -> bool,
    {
        while self.heap.peek().is_some_and(|e| e.due <= now) {
            let entry = self.heap.pop()?;
            match entry.token {
                Some(token) if !is_live(token) => continue,
                _ => return Some(entry.event),
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
