//! Change notification: coalescing queue and transaction bracket.
//!
//! - [`Coalesce`]: the redundancy/merge rule an event type implements
//! - [`EventQueue`]: pending events, merged on every append
//! - [`UpdateNotifier`]: reentrant `begin_update`/`end_update` bracket
//!   owning the pending queue and the listener registry

mod notifier;
mod queue;

pub use notifier::{Listener, ListenerId, UpdateNotifier};
pub use queue::{Coalesce, EventQueue};
