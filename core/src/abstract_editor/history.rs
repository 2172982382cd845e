//! Undo/redo edit log.
//!
//! [`EditActionHistory`] manages a linear undo/redo stack of [`EditAction`]
//! trait objects. When a new edit is pushed after undoing, the redo stack
//! is cleared. Every apply, undo and redo runs inside one
//! [`Editable::begin_update`] / [`Editable::end_update`] bracket so that
//! listeners observe each step as a single coalesced change.

use std::collections::VecDeque;
use std::fmt;

use super::action::{EditAction, EditActionError, EditActionResult, Editable};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// Runs `f` inside one transaction bracket on `target`.
fn bracketed<T: Editable, R>(target: &mut T, f: impl FnOnce(&mut T) -> R) -> R {
    target.begin_update();
    let result = f(target);
    target.end_update();
    result
}

/// Manages an undo/redo stack of edits.
///
/// The undo stack is a bounded [`VecDeque`]; when it exceeds `max_undo`,
/// the oldest edit is dropped from the front.
///
/// # Example
///
/// ```ignore
/// let mut history = EditActionHistory::new(50);
/// let mut state = SequenceState::new(extent);
///
/// history.execute(Box::new(AddRoi::new(roi)), &mut state)?;
/// history.undo(&mut state)?;
/// history.redo(&mut state)?;
/// ```
pub struct EditActionHistory<T: Editable> {
    undo_stack: VecDeque<Box<dyn EditAction<T>>>,
    redo_stack: Vec<Box<dyn EditAction<T>>>,
    max_undo: usize,
    merge_broken: bool,
    /// Distance from the saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)`, `n > 0`: `n` undos reach the saved state.
    /// - `Some(n)`, `n < 0`: `|n|` redos reach the saved state.
    /// - `None`: the save point is unreachable.
    save_distance: Option<i64>,
}

impl<T: Editable> EditActionHistory<T> {
    /// Creates an empty history with the given maximum undo depth.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
            merge_broken: false,
            save_distance: Some(0),
        }
    }

    /// Applies an edit to the target inside one bracket and, if the edit is
    /// [recorded](EditAction::is_recorded), pushes it onto the undo stack.
    ///
    /// If the edit fails, it is not pushed.
    pub fn execute(
        &mut self,
        mut action: Box<dyn EditAction<T>>,
        target: &mut T,
    ) -> EditActionResult {
        bracketed(target, |t| action.apply(t))?;
        self.record(action);
        Ok(())
    }

    /// Pushes an edit whose mutation the caller has already performed.
    ///
    /// Used for snapshot edits, which capture prior state, let the caller
    /// mutate, and are then logged without being re-applied.
    pub fn record(&mut self, mut action: Box<dyn EditAction<T>>) {
        if !action.is_recorded() {
            if action.breaks_merge() {
                self.merge_broken = true;
            }
            return;
        }

        let is_content = action.modifies_content();

        // Clearing the redo stack invalidates a save point that was in redo.
        self.redo_stack.clear();
        if is_content
            && let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }

        if !self.merge_broken
            && let Some(last) = self.undo_stack.back_mut()
        {
            match last.merge(action) {
                None => {
                    if is_content && self.save_distance == Some(0) {
                        self.save_distance = None;
                    }
                    return;
                }
                Some(returned) => action = returned,
            }
        }
        self.merge_broken = false;

        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.push_undo(action);
    }

    fn push_undo(&mut self, action: Box<dyn EditAction<T>>) {
        self.undo_stack.push_back(action);
        if self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    /// Undoes the most recent edit.
    ///
    /// On failure the edit stays on the undo stack.
    pub fn undo(&mut self, target: &mut T) -> EditActionResult {
        let mut action = self
            .undo_stack
            .pop_back()
            .ok_or(EditActionError::NothingToUndo)?;
        log::debug!("undo: {}", action.description());
        if let Err(e) = bracketed(target, |t| action.undo(t)) {
            log::warn!("undo of '{}' failed: {e}", action.description());
            self.undo_stack.push_back(action);
            return Err(e);
        }
        let is_content = action.modifies_content();
        self.redo_stack.push(action);
        if is_content && let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        Ok(())
    }

    /// Redoes the most recently undone edit.
    ///
    /// Returns [`EditActionError::RedoUnsupported`] without touching the
    /// target when the edit cannot be re-applied; the edit stays on the
    /// redo stack.
    pub fn redo(&mut self, target: &mut T) -> EditActionResult {
        let action = self
            .redo_stack
            .last()
            .ok_or(EditActionError::NothingToRedo)?;
        if !action.can_redo() {
            return Err(EditActionError::RedoUnsupported(
                action.description().to_string(),
            ));
        }
        let Some(mut action) = self.redo_stack.pop() else {
            return Err(EditActionError::NothingToRedo);
        };
        log::debug!("redo: {}", action.description());
        if let Err(e) = bracketed(target, |t| action.apply(t)) {
            log::warn!("redo of '{}' failed: {e}", action.description());
            self.redo_stack.push(action);
            return Err(e);
        }
        let is_content = action.modifies_content();
        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.push_undo(action);
        Ok(())
    }

    /// Returns `true` if there are edits that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if the next redo would re-apply an edit.
    pub fn can_redo(&self) -> bool {
        self.redo_stack.last().is_some_and(|a| a.can_redo())
    }

    /// Undo descriptions, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|a| a.description())
    }

    /// Redo descriptions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|a| a.description())
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved state.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Clears both stacks and resets the merge-broken flag.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.merge_broken = false;
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl<T: Editable> Default for EditActionHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl<T: Editable> fmt::Debug for EditActionHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditActionHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .field("merge_broken", &self.merge_broken)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Target that records bracket nesting so tests can assert every
    /// mutation happened inside one.
    #[derive(Default)]
    struct Ledger {
        value: i32,
        depth: u32,
        brackets_closed: u32,
        mutated_outside_bracket: bool,
    }

    impl Ledger {
        fn add(&mut self, amount: i32) {
            if self.depth == 0 {
                self.mutated_outside_bracket = true;
            }
            self.value += amount;
        }
    }

    impl Editable for Ledger {
        fn begin_update(&mut self) {
            self.depth += 1;
        }

        fn end_update(&mut self) {
            self.depth -= 1;
            if self.depth == 0 {
                self.brackets_closed += 1;
            }
        }
    }

    #[derive(Debug)]
    struct Deposit {
        amount: i32,
    }

    impl EditAction<Ledger> for Deposit {
        fn apply(&mut self, target: &mut Ledger) -> EditActionResult {
            target.add(self.amount);
            Ok(())
        }

        fn undo(&mut self, target: &mut Ledger) -> EditActionResult {
            target.add(-self.amount);
            Ok(())
        }

        fn description(&self) -> &str {
            "Deposit"
        }
    }

    /// Consecutive balance corrections merge (first old value, latest new value).
    #[derive(Debug)]
    struct SetBalance {
        old: i32,
        new: i32,
    }

    impl EditAction<Ledger> for SetBalance {
        fn apply(&mut self, target: &mut Ledger) -> EditActionResult {
            target.value = self.new;
            Ok(())
        }

        fn undo(&mut self, target: &mut Ledger) -> EditActionResult {
            target.value = self.old;
            Ok(())
        }

        fn description(&self) -> &str {
            "Set balance"
        }

        fn merge(
            &mut self,
            other: Box<dyn EditAction<Ledger>>,
        ) -> Option<Box<dyn EditAction<Ledger>>> {
            if let Some(other) = other.as_any().downcast_ref::<SetBalance>() {
                self.new = other.new;
                return None;
            }
            Some(other)
        }
    }

    /// Applied by the caller, undone from a snapshot, never redone.
    #[derive(Debug)]
    struct Snapshot {
        before: i32,
    }

    impl EditAction<Ledger> for Snapshot {
        fn apply(&mut self, _target: &mut Ledger) -> EditActionResult {
            Err(EditActionError::RedoUnsupported("Snapshot".into()))
        }

        fn undo(&mut self, target: &mut Ledger) -> EditActionResult {
            target.value = self.before;
            Ok(())
        }

        fn description(&self) -> &str {
            "Snapshot"
        }

        fn can_redo(&self) -> bool {
            false
        }
    }

    #[derive(Debug)]
    struct Failing;

    impl EditAction<Ledger> for Failing {
        fn apply(&mut self, _target: &mut Ledger) -> EditActionResult {
            Err(EditActionError::Custom("always fails".into()))
        }

        fn undo(&mut self, _target: &mut Ledger) -> EditActionResult {
            Err(EditActionError::Custom("always fails".into()))
        }

        fn description(&self) -> &str {
            "Failing"
        }
    }

    #[derive(Debug)]
    struct ViewportZoom;

    impl EditAction<Ledger> for ViewportZoom {
        fn apply(&mut self, _target: &mut Ledger) -> EditActionResult {
            Ok(())
        }

        fn undo(&mut self, _target: &mut Ledger) -> EditActionResult {
            unreachable!("non-recorded actions are never undone");
        }

        fn description(&self) -> &str {
            "Zoom"
        }

        fn is_recorded(&self) -> bool {
            false
        }

        fn breaks_merge(&self) -> bool {
            true
        }
    }

    #[test]
    fn execute_undo_redo_round_trip() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();

        history
            .execute(Box::new(Deposit { amount: 5 }), &mut ledger)
            .unwrap();
        assert_eq!(ledger.value, 5);
        assert_eq!(history.undo_count(), 1);

        history.undo(&mut ledger).unwrap();
        assert_eq!(ledger.value, 0);
        assert_eq!(history.redo_count(), 1);

        history.redo(&mut ledger).unwrap();
        assert_eq!(ledger.value, 5);
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.redo_count(), 0);
    }

    #[test]
    fn every_step_runs_inside_one_bracket() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();

        history
            .execute(Box::new(Deposit { amount: 1 }), &mut ledger)
            .unwrap();
        history.undo(&mut ledger).unwrap();
        history.redo(&mut ledger).unwrap();

        assert!(!ledger.mutated_outside_bracket);
        assert_eq!(ledger.brackets_closed, 3);
        assert_eq!(ledger.depth, 0);
    }

    #[test]
    fn execute_clears_redo_stack() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();

        history
            .execute(Box::new(Deposit { amount: 5 }), &mut ledger)
            .unwrap();
        history.undo(&mut ledger).unwrap();
        history
            .execute(Box::new(Deposit { amount: 3 }), &mut ledger)
            .unwrap();
        assert_eq!(history.redo_count(), 0);
        assert_eq!(ledger.value, 3);
    }

    #[test]
    fn empty_stacks_report_errors() {
        let mut history = EditActionHistory::<Ledger>::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();
        assert_eq!(history.undo(&mut ledger), Err(EditActionError::NothingToUndo));
        assert_eq!(history.redo(&mut ledger), Err(EditActionError::NothingToRedo));
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut history = EditActionHistory::new(2);
        let mut ledger = Ledger::default();
        for amount in 1..=3 {
            history
                .execute(Box::new(Deposit { amount }), &mut ledger)
                .unwrap();
        }
        assert_eq!(history.undo_count(), 2);
        history.undo(&mut ledger).unwrap();
        history.undo(&mut ledger).unwrap();
        assert_eq!(ledger.value, 1);
        assert!(history.undo(&mut ledger).is_err());
    }

    #[test]
    fn failed_execute_does_not_push() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();
        assert!(history.execute(Box::new(Failing), &mut ledger).is_err());
        assert_eq!(history.undo_count(), 0);
        assert_eq!(ledger.depth, 0);
    }

    #[test]
    fn merge_coalesces_consecutive_edits() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();
        for new in [1, 2, 3] {
            let old = ledger.value;
            history
                .execute(Box::new(SetBalance { old, new }), &mut ledger)
                .unwrap();
        }
        assert_eq!(history.undo_count(), 1);
        history.undo(&mut ledger).unwrap();
        assert_eq!(ledger.value, 0);
    }

    #[test]
    fn breaks_merge_separates_sequences() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();
        history
            .execute(Box::new(SetBalance { old: 0, new: 1 }), &mut ledger)
            .unwrap();
        history.execute(Box::new(ViewportZoom), &mut ledger).unwrap();
        history
            .execute(Box::new(SetBalance { old: 1, new: 2 }), &mut ledger)
            .unwrap();
        assert_eq!(history.undo_count(), 2);
    }

    #[test]
    fn snapshot_edit_undoes_but_refuses_redo() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();

        let before = ledger.value;
        ledger.value = 42;
        history.record(Box::new(Snapshot { before }));
        assert_eq!(history.undo_count(), 1);

        history.undo(&mut ledger).unwrap();
        assert_eq!(ledger.value, 0);
        assert!(!history.can_redo());
        assert_eq!(
            history.redo(&mut ledger),
            Err(EditActionError::RedoUnsupported("Snapshot".into()))
        );
        // The edit is still there and the target is untouched.
        assert_eq!(history.redo_count(), 1);
        assert_eq!(ledger.value, 0);
    }

    #[test]
    fn save_point_tracking() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();
        assert!(!history.has_unsaved_changes());

        history
            .execute(Box::new(Deposit { amount: 1 }), &mut ledger)
            .unwrap();
        history.mark_saved();
        history
            .execute(Box::new(Deposit { amount: 2 }), &mut ledger)
            .unwrap();
        assert!(history.has_unsaved_changes());

        history.undo(&mut ledger).unwrap();
        assert!(!history.has_unsaved_changes());

        history.undo(&mut ledger).unwrap();
        history
            .execute(Box::new(Deposit { amount: 7 }), &mut ledger)
            .unwrap();
        // The branch holding the save point was discarded.
        assert!(history.has_unsaved_changes());
        history.undo(&mut ledger).unwrap();
        assert!(history.has_unsaved_changes());
    }

    #[test]
    fn descriptions_most_recent_first() {
        let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
        let mut ledger = Ledger::default();
        history
            .execute(Box::new(Deposit { amount: 1 }), &mut ledger)
            .unwrap();
        history
            .execute(Box::new(SetBalance { old: 1, new: 9 }), &mut ledger)
            .unwrap();
        let undos: Vec<&str> = history.undo_descriptions().collect();
        assert_eq!(undos, vec!["Set balance", "Deposit"]);
    }
}
