//! Region change events and their merge rule.

use crate::change::Coalesce;
use crate::geometry::Point5;

use super::RoiId;

/// What happened to the points of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointChange {
    /// Generic change; no point-level detail.
    None,
    Added,
    Removed,
    Changed,
}

/// Event category and its category-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Membership, attachment or geometry changed.
    StateChanged {
        change: PointChange,
        /// The affected point, `None` when unknown or when several points changed.
        point: Option<Point5>,
    },
    NameChanged,
    /// Display-only change (colour, style).
    RepresentationChanged,
    /// A named user property changed.
    PropertyChanged(String),
}

/// Top-level category, used to decide which events may merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    State,
    Name,
    Representation,
    Property,
}

/// A change notification for one region.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiEvent {
    pub target: RoiId,
    pub kind: EventKind,
}

impl RoiEvent {
    pub fn new(target: RoiId, kind: EventKind) -> Self {
        Self { target, kind }
    }

    /// Generic state change without point detail.
    pub fn state_changed(target: RoiId) -> Self {
        Self::point(target, PointChange::None, None)
    }

    pub fn point_added(target: RoiId, point: Point5) -> Self {
        Self::point(target, PointChange::Added, Some(point))
    }

    pub fn point_removed(target: RoiId, point: Point5) -> Self {
        Self::point(target, PointChange::Removed, Some(point))
    }

    pub fn point_changed(target: RoiId, point: Point5) -> Self {
        Self::point(target, PointChange::Changed, Some(point))
    }

    pub fn point(target: RoiId, change: PointChange, point: Option<Point5>) -> Self {
        let point = if change == PointChange::None {
            None
        } else {
            point
        };
        Self::new(target, EventKind::StateChanged { change, point })
    }

    pub fn name_changed(target: RoiId) -> Self {
        Self::new(target, EventKind::NameChanged)
    }

    pub fn representation_changed(target: RoiId) -> Self {
        Self::new(target, EventKind::RepresentationChanged)
    }

    pub fn property_changed(target: RoiId, property: impl Into<String>) -> Self {
        Self::new(target, EventKind::PropertyChanged(property.into()))
    }

    pub fn category(&self) -> EventCategory {
        match self.kind {
            EventKind::StateChanged { .. } => EventCategory::State,
            EventKind::NameChanged => EventCategory::Name,
            EventKind::RepresentationChanged => EventCategory::Representation,
            EventKind::PropertyChanged(_) => EventCategory::Property,
        }
    }

    /// Point sub-kind of a state change.
    pub fn point_change(&self) -> Option<PointChange> {
        match self.kind {
            EventKind::StateChanged { change, .. } => Some(change),
            _ => None,
        }
    }

    /// Payload point of a state change, if still known.
    pub fn payload(&self) -> Option<Point5> {
        match self.kind {
            EventKind::StateChanged { point, .. } => point,
            _ => None,
        }
    }
}

impl Coalesce for RoiEvent {
    /// Merge rule for a pending event (`self`) and a newer one:
    ///
    /// - different target or category: separate entries
    /// - state changes of the same sub-kind merge; a differing payload
    ///   point becomes unknown (`None`)
    /// - a generic state change (or two different specific sub-kinds)
    ///   collapses the entry to `PointChange::None` with no payload
    /// - name and representation changes always merge
    /// - property changes merge when they name the same property
    fn coalesce(&mut self, incoming: &Self) -> bool {
        if self.target != incoming.target || self.category() != incoming.category() {
            return false;
        }
        match (&mut self.kind, &incoming.kind) {
            (
                EventKind::StateChanged { change, point },
                EventKind::StateChanged {
                    change: new_change,
                    point: new_point,
                },
            ) => {
                if change == new_change {
                    if point != new_point {
                        *point = None;
                    }
                } else {
                    *change = PointChange::None;
                    *point = None;
                }
                true
            }
            (EventKind::PropertyChanged(name), EventKind::PropertyChanged(new_name)) => {
                name == new_name
            }
            _ => true,
        }
    }
}
