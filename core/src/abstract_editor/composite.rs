//! Grouping several edits into one undo step.

use std::fmt;

use super::action::{EditAction, EditActionResult, Editable};

/// An ordered group of edits applied and undone as one step.
///
/// Children are applied first-to-last and undone last-to-first, all inside
/// the same transaction bracket. If a child fails while applying, the
/// children already applied are undone before the error is returned, so the
/// group is either fully applied or not at all.
pub struct CompositeAction<T: Editable> {
    description: String,
    children: Vec<Box<dyn EditAction<T>>>,
}

impl<T: Editable> CompositeAction<T> {
    pub fn new(description: impl Into<String>, children: Vec<Box<dyn EditAction<T>>>) -> Self {
        Self {
            description: description.into(),
            children,
        }
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> impl Iterator<Item = &dyn EditAction<T>> {
        self.children.iter().map(|c| c.as_ref())
    }
}

impl<T: Editable> fmt::Debug for CompositeAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeAction")
            .field("description", &self.description)
            .field("children", &self.children)
            .finish()
    }
}

impl<T: Editable> EditAction<T> for CompositeAction<T> {
    fn apply(&mut self, target: &mut T) -> EditActionResult {
        target.begin_update();
        let mut result = Ok(());
        for i in 0..self.children.len() {
            if let Err(e) = self.children[i].apply(target) {
                for applied in self.children[..i].iter_mut().rev() {
                    if let Err(rollback) = applied.undo(target) {
                        log::warn!(
                            "rollback of '{}' failed: {rollback}",
                            applied.description()
                        );
                    }
                }
                result = Err(e);
                break;
            }
        }
        target.end_update();
        result
    }

    fn undo(&mut self, target: &mut T) -> EditActionResult {
        target.begin_update();
        let mut result = Ok(());
        for child in self.children.iter_mut().rev() {
            if let Err(e) = child.undo(target) {
                result = Err(e);
                break;
            }
        }
        target.end_update();
        result
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn can_redo(&self) -> bool {
        self.children.iter().all(|c| c.can_redo())
    }

    fn modifies_content(&self) -> bool {
        self.children.iter().any(|c| c.modifies_content())
    }
}
