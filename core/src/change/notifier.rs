use std::fmt;

use super::queue::{Coalesce, EventQueue};

/// Callback invoked with each dispatched event.
pub type Listener<E> = Box<dyn FnMut(&E) + Send>;

/// Handle identifying one listener registration.
///
/// Registrations are never dropped implicitly: the subscriber releases
/// its handle with `remove_listener` when it goes away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Reentrant update bracket with coalesced dispatch.
///
/// Outside a bracket, [`notify`](Self::notify) dispatches synchronously.
/// Inside one, events are queued through the [`EventQueue`] merge rule and
/// flushed in creation order when the outermost
/// [`end_update`](Self::end_update) closes, so listeners are invoked once
/// per distinct pending entry rather than once per mutation.
pub struct UpdateNotifier<E> {
    depth: u32,
    pending: EventQueue<E>,
    listeners: Vec<(ListenerId, Listener<E>)>,
    next_listener: u64,
}

impl<E: Coalesce + fmt::Debug> UpdateNotifier<E> {
    pub fn new() -> Self {
        Self {
            depth: 0,
            pending: EventQueue::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn begin_update(&mut self) {
        self.depth += 1;
    }

    /// Closes one bracket; the outermost close flushes pending events.
    ///
    /// Returns the number of events dispatched.
    pub fn end_update(&mut self) -> usize {
        if self.depth == 0 {
            log::warn!("end_update called without a matching begin_update");
            return 0;
        }
        self.depth -= 1;
        if self.depth > 0 {
            return 0;
        }
        self.flush()
    }

    pub fn is_updating(&self) -> bool {
        self.depth > 0
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Dispatches `event`, or queues it while a bracket is open.
    pub fn notify(&mut self, event: E) {
        if self.depth > 0 {
            if self.pending.push(event) {
                log::trace!("event merged into pending entry");
            }
        } else {
            self.dispatch(&event);
        }
    }

    /// Events waiting for the outermost bracket to close.
    pub fn pending(&self) -> impl Iterator<Item = &E> {
        self.pending.iter()
    }

    fn dispatch(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    fn flush(&mut self) -> usize {
        let events = self.pending.drain();
        if !events.is_empty() {
            log::debug!(
                "flushing {} coalesced event(s) to {} listener(s)",
                events.len(),
                self.listeners.len()
            );
        }
        for event in &events {
            self.dispatch(event);
        }
        events.len()
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&E) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Releases a registration. Returns `false` if the handle was unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        let removed = self.listeners.len() != before;
        if !removed {
            log::warn!("listener {id:?} was not registered");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: Coalesce + fmt::Debug> Default for UpdateNotifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for UpdateNotifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateNotifier")
            .field("depth", &self.depth)
            .field("pending", &self.pending)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
