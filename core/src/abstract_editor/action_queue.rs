//! Thread-safe queue for submitting edits from worker threads.
//!
//! The region model has no internal locking: only the owner of a
//! [`Sequence`](crate::sequence::Sequence) mutates it. Background work such
//! as a long-running split gesture computes its edit off-thread and pushes
//! it here; the owner drains the queue and executes the edits through the
//! [`EditActionHistory`](super::EditActionHistory) in submission order.

use std::fmt;

use parking_lot::Mutex;

use super::action::{EditAction, Editable};

/// A thread-safe queue of pending [`EditAction`]s.
///
/// [`push()`](Self::push) only requires `&self`, so the queue can be shared
/// through an `Arc` with any number of producers.
pub struct ActionQueue<T: Editable> {
    queue: Mutex<Vec<Box<dyn EditAction<T>>>>,
}

impl<T: Editable> ActionQueue<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
        }
    }

    /// Enqueues an edit.
    pub fn push(&self, action: Box<dyn EditAction<T>>) {
        self.queue.lock().push(action);
    }

    /// Drains all queued edits in submission order.
    pub fn drain(&self) -> Vec<Box<dyn EditAction<T>>> {
        std::mem::take(&mut *self.queue.lock())
    }

    /// Number of edits waiting to be drained.
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Whether no edit is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T: Editable> Default for ActionQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Editable> fmt::Debug for ActionQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("pending", &self.len())
            .finish()
    }
}
