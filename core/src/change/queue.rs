use std::fmt;

/// An event that can absorb a later, redundant event.
pub trait Coalesce {
    /// Tries to fold `incoming` into `self`.
    ///
    /// Returns `true` if `incoming` was redundant with `self` (and `self`
    /// was updated to represent both), `false` if it must be queued as a
    /// separate entry.
    fn coalesce(&mut self, incoming: &Self) -> bool;
}

/// Pending events awaiting a flush.
///
/// Every [`push`](Self::push) scans the queue from the most recent entry
/// and merges the incoming event into the first entry that accepts it, so
/// the queue never holds two events that are redundant with each other.
/// Entries keep the position of the first event that created them.
pub struct EventQueue<E> {
    events: Vec<E>,
}

impl<E: Coalesce> EventQueue<E> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends `event`, merging it into a redundant pending entry if one exists.
    ///
    /// Returns `true` if the event was merged.
    pub fn push(&mut self, event: E) -> bool {
        for pending in self.events.iter_mut().rev() {
            if pending.coalesce(&event) {
                return true;
            }
        }
        self.events.push(event);
        false
    }

    /// Removes and returns all pending events in creation order.
    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E: Coalesce> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.events).finish()
    }
}
