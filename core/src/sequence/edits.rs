//! Undoable edits on a [`SequenceState`].

use crate::abstract_editor::{EditAction, EditActionError, EditActionResult};
use crate::roi::{Roi, RoiId};

use super::SequenceState;

/// Adds a region. Undo takes it out again and keeps it for redo, so the
/// region returns with the same identifier and listeners.
#[derive(Debug)]
pub struct AddRoi {
    id: RoiId,
    roi: Option<Roi>,
}

impl AddRoi {
    pub fn new(roi: Roi) -> Self {
        Self {
            id: roi.id(),
            roi: Some(roi),
        }
    }

    pub fn id(&self) -> RoiId {
        self.id
    }
}

impl EditAction<SequenceState> for AddRoi {
    fn apply(&mut self, target: &mut SequenceState) -> EditActionResult {
        if target.contains_roi(self.id) {
            return Err(EditActionError::InvalidState(format!(
                "{} is already in the sequence",
                self.id
            )));
        }
        let roi = self
            .roi
            .take()
            .ok_or_else(|| EditActionError::InvalidState(format!("{} is not held", self.id)))?;
        target.insert_roi(roi)?;
        Ok(())
    }

    fn undo(&mut self, target: &mut SequenceState) -> EditActionResult {
        let (_, roi) = target.take_roi(self.id)?;
        self.roi = Some(roi);
        Ok(())
    }

    fn description(&self) -> &str {
        "Add region"
    }
}

/// Removes a region, remembering its position for undo.
#[derive(Debug)]
pub struct RemoveRoi {
    id: RoiId,
    removed: Option<(usize, Roi)>,
}

impl RemoveRoi {
    pub fn new(id: RoiId) -> Self {
        Self { id, removed: None }
    }
}

impl EditAction<SequenceState> for RemoveRoi {
    fn apply(&mut self, target: &mut SequenceState) -> EditActionResult {
        self.removed = Some(target.take_roi(self.id)?);
        Ok(())
    }

    fn undo(&mut self, target: &mut SequenceState) -> EditActionResult {
        let (index, roi) = self
            .removed
            .take()
            .ok_or_else(|| EditActionError::InvalidState(format!("{} was not removed", self.id)))?;
        target.insert_roi_at(index, roi)?;
        Ok(())
    }

    fn description(&self) -> &str {
        "Remove region"
    }
}

/// Renames a region. Consecutive renames of the same region merge.
#[derive(Debug)]
pub struct RenameRoi {
    id: RoiId,
    old: String,
    new: String,
}

impl RenameRoi {
    pub fn new(id: RoiId, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            id,
            old: old.into(),
            new: new.into(),
        }
    }
}

impl EditAction<SequenceState> for RenameRoi {
    fn apply(&mut self, target: &mut SequenceState) -> EditActionResult {
        target.roi_mut(self.id)?.set_name(self.new.clone());
        Ok(())
    }

    fn undo(&mut self, target: &mut SequenceState) -> EditActionResult {
        target.roi_mut(self.id)?.set_name(self.old.clone());
        Ok(())
    }

    fn description(&self) -> &str {
        "Rename region"
    }

    fn merge(
        &mut self,
        other: Box<dyn EditAction<SequenceState>>,
    ) -> Option<Box<dyn EditAction<SequenceState>>> {
        if let Some(next) = other.as_any().downcast_ref::<RenameRoi>()
            && next.id == self.id
        {
            self.new.clone_from(&next.new);
            return None;
        }
        Some(other)
    }
}

/// Full prior copy of a region, taken before an arbitrary mutation.
///
/// Recorded after the mutation has run. Undo restores the copy; redo is
/// not supported.
#[derive(Debug)]
pub struct SnapshotEdit {
    before: Roi,
    description: String,
}

impl SnapshotEdit {
    pub fn new(before: Roi, description: impl Into<String>) -> Self {
        Self {
            before,
            description: description.into(),
        }
    }
}

impl EditAction<SequenceState> for SnapshotEdit {
    fn apply(&mut self, _target: &mut SequenceState) -> EditActionResult {
        Err(EditActionError::RedoUnsupported(self.description.clone()))
    }

    fn undo(&mut self, target: &mut SequenceState) -> EditActionResult {
        target.roi_mut(self.before.id())?.restore(&self.before);
        Ok(())
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn can_redo(&self) -> bool {
        false
    }
}
