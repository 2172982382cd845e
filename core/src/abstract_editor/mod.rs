//! Edit log: reversible edits and the undo/redo history.
//!
//! - [`Editable`]: a target edits operate on, with a transaction bracket
//! - [`EditAction`]: an edit operation (Command pattern)
//! - [`CompositeAction`]: several edits grouped into one undo step
//! - [`EditActionHistory`]: undo/redo stack managing edit sequences
//! - [`ActionQueue`]: thread-safe queue for edits produced off-thread
//!
//! # Snapshot edits
//!
//! Some edits capture the full prior state of their target instead of a
//! forward delta. They are pushed with [`EditActionHistory::record`] after
//! the caller has mutated the target, can be undone, and report
//! [`EditAction::can_redo`] as `false`; redoing them yields
//! [`EditActionError::RedoUnsupported`].

mod action;
mod action_queue;
mod composite;
mod history;

pub use action::{AsAny, EditAction, EditActionError, EditActionResult, Editable};
pub use action_queue::ActionQueue;
pub use composite::CompositeAction;
pub use history::{DEFAULT_MAX_UNDO, EditActionHistory};
