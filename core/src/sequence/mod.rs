//! The region collection that owns the edit log.
//!
//! [`SequenceState`] is the [`Editable`] target: an ordered list of
//! regions plus the extent of the enclosing image space. Each region it
//! holds carries a forwarding listener that pushes the region's flushed
//! events into a shared inbox; the state only keeps the strong end of that
//! inbox, the regions hold a [`Weak`] handle. When the state's outermost
//! bracket closes, the inbox is pumped into the state's own notifier as
//! [`SequenceEvent::Roi`] entries and flushed to sequence listeners.
//!
//! [`Sequence`] pairs the state with an [`EditActionHistory`] and exposes
//! the undoable operations.

mod edits;

pub use edits::{AddRoi, RemoveRoi, RenameRoi, SnapshotEdit};

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::abstract_editor::{
    ActionQueue, CompositeAction, EditAction, EditActionError, EditActionHistory,
    EditActionResult, Editable,
};
use crate::change::{Coalesce, ListenerId, UpdateNotifier};
use crate::config::SequenceConfig;
use crate::error::{RoiError, RoiResult};
use crate::geometry::{Axis, Bounds5, LineSegment, Point2};
use crate::roi::{Roi, RoiEvent, RoiId};
use crate::split::split_roi;

/// Notification dispatched to sequence listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceEvent {
    RoiAdded(RoiId),
    RoiRemoved(RoiId),
    /// A change forwarded from a member region.
    Roi(RoiEvent),
}

impl Coalesce for SequenceEvent {
    fn coalesce(&mut self, incoming: &Self) -> bool {
        match (self, incoming) {
            (SequenceEvent::Roi(pending), SequenceEvent::Roi(next)) => pending.coalesce(next),
            (SequenceEvent::RoiAdded(a), SequenceEvent::RoiAdded(b))
            | (SequenceEvent::RoiRemoved(a), SequenceEvent::RoiRemoved(b)) => a == b,
            _ => false,
        }
    }
}

type Inbox = Arc<Mutex<Vec<RoiEvent>>>;

/// Regions of one image plus the extent of its space.
pub struct SequenceState {
    extent: Bounds5,
    rois: Vec<Roi>,
    notifier: UpdateNotifier<SequenceEvent>,
    inbox: Inbox,
}

impl SequenceState {
    pub fn new(extent: Bounds5) -> Self {
        Self {
            extent,
            rois: Vec::new(),
            notifier: UpdateNotifier::new(),
            inbox: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Bounds of the enclosing image space.
    pub fn extent(&self) -> &Bounds5 {
        &self.extent
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// Member regions in insertion order.
    pub fn rois(&self) -> impl Iterator<Item = &Roi> {
        self.rois.iter()
    }

    pub fn index_of(&self, id: RoiId) -> Option<usize> {
        self.rois.iter().position(|roi| roi.id() == id)
    }

    pub fn contains_roi(&self, id: RoiId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn roi(&self, id: RoiId) -> Option<&Roi> {
        self.rois.iter().find(|roi| roi.id() == id)
    }

    pub fn roi_mut(&mut self, id: RoiId) -> RoiResult<&mut Roi> {
        self.rois
            .iter_mut()
            .find(|roi| roi.id() == id)
            .ok_or(RoiError::NotFound(id))
    }

    /// Appends a region.
    pub fn insert_roi(&mut self, roi: Roi) -> RoiResult {
        let end = self.rois.len();
        self.insert_roi_at(end, roi)
    }

    /// Inserts a region at `index` (clamped to the end) and starts forwarding its events.
    pub fn insert_roi_at(&mut self, index: usize, mut roi: Roi) -> RoiResult {
        if self.contains_roi(roi.id()) {
            return Err(RoiError::InvalidArgument(format!(
                "{} is already in the sequence",
                roi.id()
            )));
        }
        let inbox: Weak<Mutex<Vec<RoiEvent>>> = Arc::downgrade(&self.inbox);
        let link = roi.add_listener(move |event| {
            if let Some(inbox) = inbox.upgrade() {
                inbox.lock().push(event.clone());
            }
        });
        roi.sequence_link = Some(link);
        let id = roi.id();
        self.rois.insert(index.min(self.rois.len()), roi);
        self.notifier.notify(SequenceEvent::RoiAdded(id));
        Ok(())
    }

    /// Removes a region, returning its former index. The forwarding
    /// listener is released.
    pub fn take_roi(&mut self, id: RoiId) -> RoiResult<(usize, Roi)> {
        let index = self.index_of(id).ok_or(RoiError::NotFound(id))?;
        let mut roi = self.rois.remove(index);
        if let Some(link) = roi.sequence_link.take() {
            roi.remove_listener(link);
        }
        self.notifier.notify(SequenceEvent::RoiRemoved(id));
        Ok((index, roi))
    }

    /// Moves forwarded region events into the sequence notifier.
    ///
    /// Returns the number of region events taken from the inbox.
    pub fn pump_events(&mut self) -> usize {
        let events = std::mem::take(&mut *self.inbox.lock());
        let count = events.len();
        for event in events {
            self.notifier.notify(SequenceEvent::Roi(event));
        }
        count
    }

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&SequenceEvent) + Send + 'static,
    ) -> ListenerId {
        self.notifier.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    pub fn is_updating(&self) -> bool {
        self.notifier.is_updating()
    }
}

impl Editable for SequenceState {
    fn begin_update(&mut self) {
        self.notifier.begin_update();
    }

    fn end_update(&mut self) {
        self.pump_events();
        let flushed = self.notifier.end_update();
        if flushed > 0 {
            log::debug!("sequence dispatched {flushed} event(s)");
        }
    }
}

impl fmt::Debug for SequenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceState")
            .field("extent", &self.extent)
            .field("rois", &self.rois.len())
            .field("notifier", &self.notifier)
            .finish()
    }
}

/// A region collection with undo/redo.
///
/// All structural mutation goes through an [`EditAction`] executed by the
/// history, so every change runs inside one update bracket of the state
/// and can be undone.
pub struct Sequence {
    state: SequenceState,
    history: EditActionHistory<SequenceState>,
    queue: Arc<ActionQueue<SequenceState>>,
    config: SequenceConfig,
}

impl Sequence {
    pub fn new(extent: Bounds5) -> Self {
        Self::with_config(extent, SequenceConfig::default())
    }

    pub fn with_config(extent: Bounds5, config: SequenceConfig) -> Self {
        Self {
            state: SequenceState::new(extent),
            history: EditActionHistory::new(config.max_undo),
            queue: Arc::new(ActionQueue::new()),
            config,
        }
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    pub fn history(&self) -> &EditActionHistory<SequenceState> {
        &self.history
    }

    pub fn extent(&self) -> &Bounds5 {
        self.state.extent()
    }

    pub fn roi(&self, id: RoiId) -> Option<&Roi> {
        self.state.roi(id)
    }

    pub fn rois(&self) -> impl Iterator<Item = &Roi> {
        self.state.rois()
    }

    pub fn contains_roi(&self, id: RoiId) -> bool {
        self.state.contains_roi(id)
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Executes `action` through the history.
    pub fn execute(&mut self, action: Box<dyn EditAction<SequenceState>>) -> EditActionResult {
        self.history.execute(action, &mut self.state)
    }

    /// Adds a region as one undoable step.
    pub fn add_roi(&mut self, roi: Roi) -> EditActionResult<RoiId> {
        let id = roi.id();
        self.execute(Box::new(AddRoi::new(roi)))?;
        Ok(id)
    }

    pub fn remove_roi(&mut self, id: RoiId) -> EditActionResult {
        if !self.contains_roi(id) {
            return Err(RoiError::NotFound(id).into());
        }
        self.execute(Box::new(RemoveRoi::new(id)))
    }

    pub fn rename_roi(&mut self, id: RoiId, name: impl Into<String>) -> EditActionResult {
        let old = self
            .roi(id)
            .ok_or(RoiError::NotFound(id))?
            .name()
            .to_string();
        self.execute(Box::new(RenameRoi::new(id, old, name)))
    }

    /// Runs an arbitrary mutation on one region, recorded as a snapshot edit.
    ///
    /// The mutation runs inside one bracket of both the sequence and the
    /// region. If it fails, whatever it already changed stays changed and
    /// nothing is recorded. A mutation that leaves the region without a
    /// single event is not recorded either.
    pub fn edit_roi<R>(
        &mut self,
        id: RoiId,
        description: impl Into<String>,
        f: impl FnOnce(&mut Roi) -> RoiResult<R>,
    ) -> EditActionResult<R> {
        let snapshot = self.roi(id).ok_or(RoiError::NotFound(id))?.clone();
        self.state.begin_update();
        let result = self.state.roi_mut(id).and_then(|roi| {
            // An enclosing bracket holds the events back, so assume a change.
            let nested = roi.is_updating();
            roi.begin_update();
            let value = f(roi);
            let flushed = roi.end_update();
            value.map(|value| (value, nested || flushed > 0))
        });
        self.state.end_update();
        let (value, changed) = result?;
        if changed {
            self.history
                .record(Box::new(SnapshotEdit::new(snapshot, description)));
        } else {
            log::trace!("{id} unchanged; nothing recorded");
        }
        Ok(value)
    }

    /// The cutting segment actually used for `line`: extended across the
    /// sequence's XY extent when configured and the extent is bounded.
    pub fn split_line(&self, line: &LineSegment) -> LineSegment {
        if !self.config.extend_split_lines {
            return *line;
        }
        let extent = self.state.extent();
        let (x0, y0) = (extent.min(Axis::X), extent.min(Axis::Y));
        let (x1, y1) = (extent.max(Axis::X), extent.max(Axis::Y));
        if ![x0, y0, x1, y1].iter().all(|v| v.is_finite()) {
            return *line;
        }
        line.extended_to(Point2::new(x0, y0), Point2::new(x1, y1))
            .unwrap_or(*line)
    }

    /// Cuts every region the line separates, as one undoable step.
    ///
    /// Each cut region is replaced by its pieces. Returns the number of
    /// regions cut; zero leaves the sequence and its history untouched.
    pub fn split(&mut self, line: &LineSegment) -> EditActionResult<usize> {
        let line = self.split_line(line);
        let mut children: Vec<Box<dyn EditAction<SequenceState>>> = Vec::new();
        let mut cut = 0;
        for roi in self.state.rois() {
            let Some(pieces) = split_roi(roi, &line, self.config.ellipse_segments)? else {
                continue;
            };
            cut += 1;
            children.push(Box::new(RemoveRoi::new(roi.id())));
            for piece in pieces {
                children.push(Box::new(AddRoi::new(piece)));
            }
        }
        if cut == 0 {
            return Ok(0);
        }
        log::debug!("split gesture cut {cut} region(s)");
        self.execute(Box::new(CompositeAction::new("Split regions", children)))?;
        Ok(cut)
    }

    pub fn undo(&mut self) -> EditActionResult {
        self.history.undo(&mut self.state)
    }

    pub fn redo(&mut self) -> EditActionResult {
        self.history.redo(&mut self.state)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.history.has_unsaved_changes()
    }

    pub fn add_listener(
        &mut self,
        listener: impl FnMut(&SequenceEvent) + Send + 'static,
    ) -> ListenerId {
        self.state.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.state.remove_listener(id)
    }

    /// Opens a bracket spanning several edits; listeners are notified once
    /// the matching [`end_update`](Self::end_update) closes it.
    pub fn begin_update(&mut self) {
        self.state.begin_update();
    }

    pub fn end_update(&mut self) {
        self.state.end_update();
    }

    /// Queue shared with worker threads that prepare edits off-thread.
    pub fn action_queue(&self) -> Arc<ActionQueue<SequenceState>> {
        Arc::clone(&self.queue)
    }

    /// Executes every queued edit in submission order.
    ///
    /// Failed edits are skipped and logged; the first failure is returned
    /// after the queue has been drained.
    pub fn apply_queued(&mut self) -> EditActionResult<usize> {
        let mut applied = 0;
        let mut first_error: Option<EditActionError> = None;
        for action in self.queue.drain() {
            let description = action.description().to_string();
            match self.history.execute(action, &mut self.state) {
                Ok(()) => applied += 1,
                Err(e) => {
                    log::warn!("queued edit '{description}' failed: {e}");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(applied),
        }
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("state", &self.state)
            .field("history", &self.history)
            .field("config", &self.config)
            .finish()
    }
}
