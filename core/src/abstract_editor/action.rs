//! Editable targets and reversible edit actions.
//!
//! This module defines the core abstractions of the edit log:
//!
//! - [`Editable`]: a target that edits operate on, with a transaction bracket
//! - [`EditAction`]: a reversible edit (Command pattern)
//! - [`EditActionError`] / [`EditActionResult`]: error handling for actions
//!
//! Edits are self-contained: each implementation stores whatever it needs
//! to invert itself (region identifiers, removed regions, old names, ...).

use std::any::Any;
use std::fmt;

use crate::error::RoiError;

/// Helper trait for downcasting trait objects to concrete types.
///
/// Automatically implemented for all `'static` types. Used by
/// [`EditAction::merge`] to downcast `&dyn EditAction<T>` to the
/// concrete action type for merging.
pub trait AsAny: 'static {
    /// Returns a reference to `self` as `&dyn Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A target that edits operate on.
///
/// The history brackets every apply, undo and redo with
/// [`begin_update`](Self::begin_update) / [`end_update`](Self::end_update)
/// so that targets which coalesce change notifications flush them once per
/// edit, never in the middle of a compound mutation. Brackets nest.
pub trait Editable: 'static {
    /// Opens a transaction bracket. Default: no-op.
    fn begin_update(&mut self) {}

    /// Closes a transaction bracket. Default: no-op.
    fn end_update(&mut self) {}
}

/// Error type for action execution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditActionError {
    /// The target object was not found.
    #[error("target not found: {0}")]
    TargetNotFound(String),
    /// The target is in an invalid state for this action.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Redo was requested on an edit that only keeps enough state to undo.
    #[error("redo unsupported: {0}")]
    RedoUnsupported(String),
    /// The undo stack is empty.
    #[error("nothing to undo")]
    NothingToUndo,
    /// The redo stack is empty.
    #[error("nothing to redo")]
    NothingToRedo,
    /// A region operation failed while applying the edit.
    #[error(transparent)]
    Roi(#[from] RoiError),
    /// A custom error with a description.
    #[error("{0}")]
    Custom(String),
}

/// Result type for action operations.
pub type EditActionResult<T = ()> = Result<T, EditActionError>;

/// A reversible edit (Command pattern).
///
/// Edits capture enough state to undo the change and, unless they are
/// snapshot-based, to redo it.
///
/// # Merging
///
/// Edits that represent incremental changes (e.g. each keystroke of a
/// rename) can override [`merge`](Self::merge) so that consecutive edits
/// coalesce into one undo step. Use [`AsAny::as_any`] on the `other`
/// edit to downcast it to the concrete type.
///
/// # Object Safety
///
/// This trait is dyn-compatible so that different edit types can be stored
/// in a single [`EditActionHistory`](super::EditActionHistory) as
/// `Box<dyn EditAction<T>>`.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct Rename {
///     id: RoiId,
///     old: String,
///     new: String,
/// }
///
/// impl EditAction<SequenceState> for Rename {
///     fn apply(&mut self, target: &mut SequenceState) -> EditActionResult {
///         target.roi_mut(self.id)?.set_name(&self.new);
///         Ok(())
///     }
///
///     fn undo(&mut self, target: &mut SequenceState) -> EditActionResult {
///         target.roi_mut(self.id)?.set_name(&self.old);
///         Ok(())
///     }
///
///     fn description(&self) -> &str {
///         "Rename region"
///     }
/// }
/// ```
pub trait EditAction<T: Editable>: fmt::Debug + AsAny + Send {
    /// Applies the edit to the target (forward / redo direction).
    fn apply(&mut self, target: &mut T) -> EditActionResult;

    /// Reverses the edit (undo direction).
    ///
    /// Must restore the target to the state before [`apply`](Self::apply)
    /// was called.
    fn undo(&mut self, target: &mut T) -> EditActionResult;

    /// A short, human-readable description for display in the edit menu.
    fn description(&self) -> &str;

    /// Tries to merge `other` into `self`, taking ownership.
    ///
    /// If the edits are compatible, `self` absorbs `other`'s effect and
    /// returns `None`. Otherwise returns `Some(other)` back to the caller.
    ///
    /// Returns `Some(other)` by default (no merging).
    fn merge(&mut self, other: Box<dyn EditAction<T>>) -> Option<Box<dyn EditAction<T>>> {
        Some(other)
    }

    /// Whether the edit can be re-applied after an undo.
    ///
    /// Snapshot-based edits return `false`; the history then reports
    /// [`EditActionError::RedoUnsupported`] instead of re-applying.
    ///
    /// Default: `true`.
    fn can_redo(&self) -> bool {
        true
    }

    /// Whether this edit is recorded in the undo/redo history.
    ///
    /// Default: `true`.
    fn is_recorded(&self) -> bool {
        true
    }

    /// Whether executing this edit prevents the next recorded edit from
    /// merging with the previous undo entry.
    ///
    /// Only meaningful for non-recorded edits.
    ///
    /// Default: `false`.
    fn breaks_merge(&self) -> bool {
        false
    }

    /// Whether this edit changes document content (as opposed to UI state).
    ///
    /// Non-content edits are undoable but do not move the save point.
    ///
    /// Default: `true`.
    fn modifies_content(&self) -> bool {
        true
    }
}
