//! Sparse stacks of lower-dimensional regions.
//!
//! A region of dimension `d` (3 to 5) is stored as a map from an index on
//! its stack axis (Z, T or C, see [`Axis::stack_axis`]) to a region of
//! dimension `d - 1`. Slices carry their own attachments: the stack axis is
//! pinned to the slice index and every axis above it mirrors the parent.

use std::collections::BTreeMap;

use crate::error::{RoiError, RoiResult};
use crate::geometry::{Axis, Bounds5};

use super::{Attachment, Attachments, Roi, Shape2D};

/// Concrete region type a stack stores at the 2D leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SliceKind {
    /// Boolean masks; shape slices are rasterised on insertion.
    Mask,
    /// Geometric shapes only.
    Shape,
    /// Either, stored as given.
    Any,
}

impl SliceKind {
    pub fn name(self) -> &'static str {
        match self {
            SliceKind::Mask => "mask",
            SliceKind::Shape => "shape",
            SliceKind::Any => "any",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SliceStack {
    dimension: usize,
    kind: SliceKind,
    slices: BTreeMap<i32, Roi>,
}

impl SliceStack {
    /// An empty stack for a region of `dimension` (3 to 5).
    pub fn new(dimension: usize, kind: SliceKind) -> RoiResult<Self> {
        if Axis::stack_axis(dimension).is_none() {
            return Err(RoiError::InvalidArgument(format!(
                "slice stacks exist for dimensions 3 to 5, got {dimension}"
            )));
        }
        Ok(Self {
            dimension,
            kind,
            slices: BTreeMap::new(),
        })
    }

    /// Dimension of the region owning the stack.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn kind(&self) -> SliceKind {
        self.kind
    }

    /// Axis the slice indices live on.
    pub fn axis(&self) -> Axis {
        Axis::ALL[self.dimension - 1]
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn slice(&self, index: i32) -> Option<&Roi> {
        self.slices.get(&index)
    }

    pub fn slice_mut(&mut self, index: i32) -> Option<&mut Roi> {
        self.slices.get_mut(&index)
    }

    /// Stored indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.slices.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &Roi)> {
        self.slices.iter().map(|(i, roi)| (*i, roi))
    }

    pub(crate) fn into_slices(self) -> impl Iterator<Item = (i32, Roi)> {
        self.slices.into_iter()
    }

    /// A fresh empty region of the slice dimension and kind.
    fn empty_slice(&self) -> RoiResult<Roi> {
        let lower = self.dimension - 1;
        match self.kind {
            SliceKind::Shape if lower == 2 => Roi::shape(Shape2D::Polygon(Vec::new())),
            SliceKind::Shape => Roi::stack(lower, SliceKind::Shape),
            SliceKind::Mask | SliceKind::Any => Roi::mask(lower),
        }
    }

    /// Aligns a slice's attachments with its index and the owning region.
    fn attach(&self, index: i32, slice: &mut Roi, parent: &Attachments) {
        let axis = self.axis();
        slice.force_attachment(axis, Attachment::pinned(index));
        for higher in Axis::HIGHER.into_iter().filter(|a| *a > axis) {
            slice.force_attachment(higher, parent.get(higher));
        }
    }

    /// Returns the slice at `index`, creating an empty one if absent.
    pub fn get_or_create(&mut self, index: i32, parent: &Attachments) -> RoiResult<&mut Roi> {
        if !self.slices.contains_key(&index) {
            let mut slice = self.empty_slice()?;
            self.attach(index, &mut slice, parent);
            log::trace!("created slice {} at {}={index}", slice.id(), self.axis());
            self.slices.insert(index, slice);
        }
        self.slices
            .get_mut(&index)
            .ok_or_else(|| RoiError::InvalidArgument(format!("slice {index} vanished")))
    }

    /// Converts `slice` to the stack's kind, or fails when no safe conversion exists.
    fn conform(&self, slice: Roi) -> RoiResult<Roi> {
        if slice.dimension() != self.dimension - 1 {
            return Err(RoiError::InvalidArgument(format!(
                "a {}D stack holds {}D slices, got a {}D region",
                self.dimension,
                self.dimension - 1,
                slice.dimension()
            )));
        }
        match self.kind {
            SliceKind::Any => Ok(slice),
            SliceKind::Mask => slice.into_mask_based(),
            SliceKind::Shape if slice.is_shape_based() => Ok(slice),
            SliceKind::Shape => Err(RoiError::TypeMismatch {
                expected: "shape",
                found: "mask",
            }),
        }
    }

    /// Stores `slice` at `index`.
    ///
    /// With `merge`, an existing slice is replaced by the union of both
    /// (keeping the existing slice's identity); otherwise `slice` replaces
    /// it outright. An empty result removes the entry.
    pub fn set_slice(
        &mut self,
        index: i32,
        slice: Roi,
        merge: bool,
        parent: &Attachments,
    ) -> RoiResult {
        let mut incoming = self.conform(slice)?;
        self.attach(index, &mut incoming, parent);

        let stored = match self.slices.get(&index) {
            Some(existing) if merge => {
                if self.kind == SliceKind::Shape {
                    return Err(RoiError::TypeMismatch {
                        expected: "shape",
                        found: "mask",
                    });
                }
                let mut union = Roi::union(existing, &incoming)?;
                union.adopt_identity(existing);
                self.attach(index, &mut union, parent);
                union
            }
            _ => incoming,
        };

        if stored.is_empty() {
            self.slices.remove(&index);
        } else {
            self.slices.insert(index, stored);
        }
        Ok(())
    }

    /// Stores `slice` without conversion or merging; used by set algebra.
    pub(crate) fn insert(&mut self, index: i32, mut slice: Roi, parent: &Attachments) {
        self.attach(index, &mut slice, parent);
        self.slices.insert(index, slice);
    }

    /// Removes the slice at `index`, returning it. No-op when absent.
    pub fn remove_slice(&mut self, index: i32) -> Option<Roi> {
        self.slices.remove(&index)
    }

    /// Mirrors a parent attachment change onto every slice.
    pub(crate) fn propagate(&mut self, axis: Axis, value: Attachment) {
        for slice in self.slices.values_mut() {
            slice.force_attachment(axis, value);
        }
    }

    /// Drops empty slices (recursively) and tightens every remaining one.
    ///
    /// Returns the number of slices removed at this level.
    pub fn optimize_bounds(&mut self) -> RoiResult<usize> {
        for slice in self.slices.values_mut() {
            slice.optimize_content()?;
        }
        let before = self.slices.len();
        self.slices.retain(|_, slice| !slice.is_empty());
        Ok(before - self.slices.len())
    }

    /// Union of slice bounds; spans `[min index, max index]` on the stack axis.
    pub fn bounds(&self) -> Bounds5 {
        self.slices
            .values()
            .fold(Bounds5::EMPTY, |acc, slice| acc.union(&slice.bounds()))
    }
}
