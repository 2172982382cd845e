//! Regions of interest in up to five axes (X, Y, Z, T, C).
//!
//! One [`Roi`] type covers every dimension count: a 2D region holds either
//! a [`Shape2D`] or a [`BooleanMask2D`], and a region of dimension 3 to 5
//! holds a [`SliceStack`] of regions one dimension lower. Axes above the
//! region's dimension carry an [`Attachment`] (universal or pinned).
//!
//! # Transactions
//!
//! Every mutation emits a [`RoiEvent`] through the region's
//! [`UpdateNotifier`]. Wrap compound mutations in
//! [`begin_update`](Roi::begin_update)/[`end_update`](Roi::end_update) (or
//! [`batch`](Roi::batch)) so listeners see one coalesced event per target
//! and category once the outermost bracket closes.
//!
//! ```ignore
//! let mut roi = Roi::mask(4)?;
//! roi.batch(|roi| {
//!     for x in 0..10 {
//!         roi.add_point(Point5::new(x as f64, 5.0, 0.0, 2.0, 0.0))?;
//!     }
//!     Ok::<_, RoiError>(())
//! })?;
//! ```

mod attachment;
mod event;
mod shape;
mod slice_stack;

pub use attachment::{Attachment, Attachments};
pub use event::{EventCategory, EventKind, PointChange, RoiEvent};
pub use shape::Shape2D;
pub use slice_stack::{SliceKind, SliceStack};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::change::{ListenerId, UpdateNotifier};
use crate::error::{RoiError, RoiResult};
use crate::geometry::{Axis, Bounds5, Point5};
use crate::mask::{BooleanMask, BooleanMask2D};

static NEXT_ROI_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a region, preserved across clones and undo/redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct RoiId(u64);

impl RoiId {
    fn next() -> Self {
        Self(NEXT_ROI_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "roi#{}", self.0)
    }
}

/// Display colour (RGBA, 8 bits per channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const GREEN: Color = Color::rgb(0, 255, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::GREEN
    }
}

/// Storage behind a region.
#[derive(Debug, Clone)]
pub enum RoiContent {
    Shape(Shape2D),
    Area(BooleanMask2D),
    Stack(SliceStack),
}

impl RoiContent {
    fn kind_name(&self) -> &'static str {
        match self {
            RoiContent::Shape(_) => "shape",
            RoiContent::Area(_) => "mask",
            RoiContent::Stack(_) => "stack",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SetOp {
    Union,
    Intersection,
    Subtraction,
}

/// A region of interest.
#[derive(Debug)]
pub struct Roi {
    id: RoiId,
    name: String,
    color: Color,
    attachments: Attachments,
    content: RoiContent,
    properties: BTreeMap<String, String>,
    notifier: UpdateNotifier<RoiEvent>,
    /// Forwarding listener installed by the owning sequence, if any.
    pub(crate) sequence_link: Option<ListenerId>,
}

impl Roi {
    fn with_content(content: RoiContent) -> Self {
        let name = match &content {
            RoiContent::Shape(shape) => shape.kind_name().to_string(),
            RoiContent::Area(_) => "area".to_string(),
            RoiContent::Stack(stack) => format!("{}D {} stack", stack.dimension(), stack.kind().name()),
        };
        Self {
            id: RoiId::next(),
            name,
            color: Color::default(),
            attachments: Attachments::UNIVERSAL,
            content,
            properties: BTreeMap::new(),
            notifier: UpdateNotifier::new(),
            sequence_link: None,
        }
    }

    /// A 2D shape-based region.
    pub fn shape(shape: Shape2D) -> RoiResult<Self> {
        shape.validate()?;
        Ok(Self::with_content(RoiContent::Shape(shape)))
    }

    /// A 2D mask-based region holding `mask`.
    pub fn from_mask(mask: BooleanMask2D) -> Self {
        Self::with_content(RoiContent::Area(mask))
    }

    /// An empty mask-based region of `dimension` (2 to 5).
    pub fn mask(dimension: usize) -> RoiResult<Self> {
        match dimension {
            2 => Ok(Self::from_mask(BooleanMask2D::empty())),
            _ => Self::stack(dimension, SliceKind::Mask),
        }
    }

    /// An empty stacked region of `dimension` (3 to 5).
    pub fn stack(dimension: usize, kind: SliceKind) -> RoiResult<Self> {
        Ok(Self::with_content(RoiContent::Stack(SliceStack::new(
            dimension, kind,
        )?)))
    }

    pub fn id(&self) -> RoiId {
        self.id
    }

    /// Number of spanned axes, starting from X.
    pub fn dimension(&self) -> usize {
        match &self.content {
            RoiContent::Shape(_) | RoiContent::Area(_) => 2,
            RoiContent::Stack(stack) => stack.dimension(),
        }
    }

    pub fn content(&self) -> &RoiContent {
        &self.content
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.name {
            self.name = name;
            self.notifier.notify(RoiEvent::name_changed(self.id));
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn set_color(&mut self, color: Color) {
        if color != self.color {
            self.color = color;
            self.notifier
                .notify(RoiEvent::representation_changed(self.id));
        }
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if self.properties.get(&name) == Some(&value) {
            return;
        }
        self.properties.insert(name.clone(), value);
        self.notifier
            .notify(RoiEvent::property_changed(self.id, name));
    }

    pub fn remove_property(&mut self, name: &str) -> Option<String> {
        let removed = self.properties.remove(name)?;
        self.notifier
            .notify(RoiEvent::property_changed(self.id, name));
        Some(removed)
    }

    // -- Attachments --

    pub fn attachments(&self) -> &Attachments {
        &self.attachments
    }

    /// Attachment on `axis`; spanned axes and X/Y read as universal.
    pub fn attachment(&self, axis: Axis) -> Attachment {
        if axis.index() < self.dimension() {
            return Attachment::UNIVERSAL;
        }
        self.attachments.get(axis)
    }

    /// Pins the region on `axis` (or makes it universal with [`Attachment::UNIVERSAL`]).
    ///
    /// Emits a generic state change when the value differs; fails for axes
    /// the region spans.
    pub fn set_attachment(&mut self, axis: Axis, value: Attachment) -> RoiResult {
        if axis.index() < self.dimension() {
            return Err(RoiError::InvalidArgument(format!(
                "axis {axis} is spanned by a {}D region and cannot be attached",
                self.dimension()
            )));
        }
        if self.attachments.get(axis) == value {
            return Ok(());
        }
        self.force_attachment(axis, value);
        self.notifier.notify(RoiEvent::state_changed(self.id));
        Ok(())
    }

    /// Sets an attachment silently, mirroring it into every slice.
    pub(crate) fn force_attachment(&mut self, axis: Axis, value: Attachment) {
        self.attachments.set(axis, value);
        if let RoiContent::Stack(stack) = &mut self.content {
            stack.propagate(axis, value);
        }
    }

    /// Whether the region is active at `coordinate` on `axis`.
    pub fn is_active_for(&self, axis: Axis, coordinate: i32) -> bool {
        self.attachment(axis).is_active_for(coordinate)
    }

    fn is_active_at(&self, z: i32, t: i32, c: i32) -> bool {
        self.is_active_for(Axis::Z, z) && self.is_active_for(Axis::T, t) && self.is_active_for(Axis::C, c)
    }

    // -- Transactions and listeners --

    pub fn begin_update(&mut self) {
        self.notifier.begin_update();
    }

    /// Closes a bracket; the outermost close dispatches the coalesced events.
    ///
    /// Returns the number of events dispatched, which is zero for inner
    /// closes and for brackets in which nothing changed.
    pub fn end_update(&mut self) -> usize {
        let flushed = self.notifier.end_update();
        if flushed > 0 {
            log::debug!("{} dispatched {flushed} event(s)", self.id);
        }
        flushed
    }

    pub fn is_updating(&self) -> bool {
        self.notifier.is_updating()
    }

    /// Runs `f` inside one update bracket.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_update();
        let result = f(self);
        self.end_update();
        result
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&RoiEvent) + Send + 'static) -> ListenerId {
        self.notifier.add_listener(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    /// Whether a sequence currently forwards this region's events.
    pub fn is_attached(&self) -> bool {
        self.sequence_link.is_some()
    }

    // -- Content access --

    pub fn shape_data(&self) -> Option<&Shape2D> {
        match &self.content {
            RoiContent::Shape(shape) => Some(shape),
            _ => None,
        }
    }

    pub fn mask_data(&self) -> Option<&BooleanMask2D> {
        match &self.content {
            RoiContent::Area(mask) => Some(mask),
            _ => None,
        }
    }

    pub fn slices(&self) -> Option<&SliceStack> {
        match &self.content {
            RoiContent::Stack(stack) => Some(stack),
            _ => None,
        }
    }

    /// Replaces the geometry of a shape-based region.
    pub fn set_shape(&mut self, shape: Shape2D) -> RoiResult {
        shape.validate()?;
        match &mut self.content {
            RoiContent::Shape(current) => {
                if *current != shape {
                    *current = shape;
                    self.notifier.notify(RoiEvent::state_changed(self.id));
                }
                Ok(())
            }
            other => Err(RoiError::TypeMismatch {
                expected: "shape",
                found: other.kind_name(),
            }),
        }
    }

    /// The slice stored at `index`; `None` when absent or not a stacked region.
    pub fn slice(&self, index: i32) -> Option<&Roi> {
        self.slices()?.slice(index)
    }

    fn slice_indices(&self) -> Vec<i32> {
        self.slices()
            .map(|stack| stack.indices().collect())
            .unwrap_or_default()
    }

    fn stack_mut(&mut self) -> RoiResult<&mut SliceStack> {
        let dimension = self.dimension();
        match &mut self.content {
            RoiContent::Stack(stack) => Ok(stack),
            _ => Err(RoiError::InvalidArgument(format!(
                "a {dimension}D region has no slices"
            ))),
        }
    }

    fn check_index(index: i32) -> RoiResult {
        if index < 0 {
            return Err(RoiError::InvalidArgument(format!(
                "slice index must be non-negative, got {index}"
            )));
        }
        Ok(())
    }

    /// Mutable access to the slice at `index`, creating it when `create` is set.
    ///
    /// Changes made through the returned slice notify the slice's listeners,
    /// not this region's.
    pub fn get_slice_mut(&mut self, index: i32, create: bool) -> RoiResult<Option<&mut Roi>> {
        let parent = self.attachments;
        let stack = self.stack_mut()?;
        if create {
            Self::check_index(index)?;
            stack.get_or_create(index, &parent).map(Some)
        } else {
            Ok(stack.slice_mut(index))
        }
    }

    /// Stores `slice` at `index`, merging by union with an existing slice if `merge`.
    pub fn set_slice(&mut self, index: i32, slice: Roi, merge: bool) -> RoiResult {
        Self::check_index(index)?;
        let parent = self.attachments;
        self.stack_mut()?.set_slice(index, slice, merge, &parent)?;
        self.notifier.notify(RoiEvent::state_changed(self.id));
        Ok(())
    }

    /// Removes the slice at `index`. No-op when absent.
    pub fn remove_slice(&mut self, index: i32) -> Option<Roi> {
        let removed = match &mut self.content {
            RoiContent::Stack(stack) => stack.remove_slice(index),
            _ => None,
        };
        if removed.is_some() {
            self.notifier.notify(RoiEvent::state_changed(self.id));
        }
        removed
    }

    // -- Point editing --

    fn check_point(p: &Point5) -> RoiResult {
        if Axis::ALL.iter().all(|axis| p.get(*axis).is_finite()) {
            Ok(())
        } else {
            Err(RoiError::InvalidArgument(format!(
                "point coordinates must be finite, got {p:?}"
            )))
        }
    }

    /// Sets or clears the lattice cell containing `p`, without events.
    fn write_point(&mut self, p: &Point5, value: bool) -> RoiResult<bool> {
        let parent = self.attachments;
        match &mut self.content {
            RoiContent::Shape(shape) => Err(RoiError::InvalidArgument(format!(
                "{} regions have no per-point membership",
                shape.kind_name()
            ))),
            RoiContent::Area(mask) => mask.set_point([p.cell(Axis::X), p.cell(Axis::Y)], value),
            RoiContent::Stack(stack) => {
                let index = p.cell(stack.axis());
                Self::check_index(index)?;
                if value {
                    let created = stack.slice(index).is_none();
                    let result = stack.get_or_create(index, &parent)?.write_point(p, true);
                    if result.is_err() && created {
                        stack.remove_slice(index);
                    }
                    result
                } else {
                    match stack.slice_mut(index) {
                        Some(slice) => slice.write_point(p, false),
                        None => Ok(false),
                    }
                }
            }
        }
    }

    /// Adds the lattice cell containing `p`. Returns `true` if it was not a member.
    pub fn add_point(&mut self, p: Point5) -> RoiResult<bool> {
        Self::check_point(&p)?;
        let changed = self.write_point(&p, true)?;
        if changed {
            self.notifier.notify(RoiEvent::point_added(self.id, p));
        }
        Ok(changed)
    }

    /// Removes the lattice cell containing `p`.
    ///
    /// Bounds are not shrunk and emptied slices stay stored until
    /// [`optimize_bounds`](Self::optimize_bounds).
    pub fn remove_point(&mut self, p: Point5) -> RoiResult<bool> {
        Self::check_point(&p)?;
        let changed = self.write_point(&p, false)?;
        if changed {
            self.notifier.notify(RoiEvent::point_removed(self.id, p));
        }
        Ok(changed)
    }

    pub fn set_point(&mut self, p: Point5, value: bool) -> RoiResult<bool> {
        if value {
            self.add_point(p)
        } else {
            self.remove_point(p)
        }
    }

    fn paint(&mut self, center: &Point5, radius: f64, value: bool) -> RoiResult<usize> {
        let parent = self.attachments;
        match &mut self.content {
            RoiContent::Shape(shape) => Err(RoiError::InvalidArgument(format!(
                "cannot paint into a {} region",
                shape.kind_name()
            ))),
            RoiContent::Area(mask) if value => mask.add_brush([center.x, center.y], radius),
            RoiContent::Area(mask) => mask.remove_brush([center.x, center.y], radius),
            RoiContent::Stack(stack) => {
                let index = center.cell(stack.axis());
                Self::check_index(index)?;
                if value {
                    let created = stack.slice(index).is_none();
                    let result = stack.get_or_create(index, &parent)?.paint(center, radius, true);
                    if result.is_err() && created {
                        stack.remove_slice(index);
                    }
                    result
                } else {
                    match stack.slice_mut(index) {
                        Some(slice) => slice.paint(center, radius, false),
                        None => Ok(0),
                    }
                }
            }
        }
    }

    /// Paints a disk of `radius` around `center` on its XY plane.
    ///
    /// Returns the number of cells added.
    pub fn add_brush(&mut self, center: Point5, radius: f64) -> RoiResult<usize> {
        Self::check_point(&center)?;
        let added = self.paint(&center, radius, true)?;
        if added > 0 {
            self.notifier.notify(RoiEvent::state_changed(self.id));
        }
        Ok(added)
    }

    /// Erases a disk of `radius` around `center`. Returns the number of cells removed.
    pub fn remove_brush(&mut self, center: Point5, radius: f64) -> RoiResult<usize> {
        Self::check_point(&center)?;
        let removed = self.paint(&center, radius, false)?;
        if removed > 0 {
            self.notifier.notify(RoiEvent::state_changed(self.id));
        }
        Ok(removed)
    }

    // -- Queries --

    pub fn contains(&self, p: &Point5) -> bool {
        let dimension = self.dimension();
        let attached = Axis::HIGHER
            .iter()
            .filter(|axis| axis.index() >= dimension)
            .all(|axis| self.attachments.get(*axis).is_active_for(p.cell(*axis)));
        if !attached {
            return false;
        }
        match &self.content {
            RoiContent::Shape(shape) => shape.contains(&p.to_point2()),
            RoiContent::Area(mask) => mask.contains(&[p.cell(Axis::X), p.cell(Axis::Y)]),
            RoiContent::Stack(stack) => stack
                .slice(p.cell(stack.axis()))
                .is_some_and(|slice| slice.contains(p)),
        }
    }

    /// Bounding hyper-rectangle.
    ///
    /// Mask-based content reports its stored rectangle, which is minimal
    /// after [`optimize_bounds`](Self::optimize_bounds). Universal axes are
    /// unbounded.
    pub fn bounds(&self) -> Bounds5 {
        let mut bounds = match &self.content {
            RoiContent::Shape(shape) => {
                let Some((lo, hi)) = shape.bounds() else {
                    return Bounds5::EMPTY;
                };
                let mut b = Bounds5::INFINITE;
                b.set_axis(Axis::X, lo.x, hi.x);
                b.set_axis(Axis::Y, lo.y, hi.y);
                b
            }
            RoiContent::Area(mask) => {
                let rect = mask.rect();
                if rect.is_empty() {
                    return Bounds5::EMPTY;
                }
                let mut b = Bounds5::INFINITE;
                b.set_axis(Axis::X, rect.origin[0] as f64, rect.end(0) as f64);
                b.set_axis(Axis::Y, rect.origin[1] as f64, rect.end(1) as f64);
                b
            }
            RoiContent::Stack(stack) => {
                let b = stack.bounds();
                if b.is_empty() {
                    return Bounds5::EMPTY;
                }
                b
            }
        };
        let dimension = self.dimension();
        for axis in Axis::HIGHER.into_iter().filter(|a| a.index() >= dimension) {
            let attachment = self.attachments.get(axis);
            if attachment.is_universal() {
                bounds.set_infinite(axis);
            } else {
                bounds.set_index(axis, attachment.value());
            }
        }
        bounds
    }

    /// Tightens mask rectangles and drops empty slices, recursively.
    ///
    /// Membership is unchanged, so no event is emitted.
    pub fn optimize_bounds(&mut self) -> RoiResult {
        self.optimize_content()
    }

    pub(crate) fn optimize_content(&mut self) -> RoiResult {
        match &mut self.content {
            RoiContent::Shape(_) => Ok(()),
            RoiContent::Area(mask) => mask.optimize_bounds(),
            RoiContent::Stack(stack) => {
                let dropped = stack.optimize_bounds()?;
                if dropped > 0 {
                    log::trace!("{} dropped {dropped} empty slice(s)", self.id);
                }
                Ok(())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.content {
            RoiContent::Shape(shape) => shape.is_empty(),
            RoiContent::Area(mask) => mask.is_empty(),
            RoiContent::Stack(stack) => stack.iter().all(|(_, slice)| slice.is_empty()),
        }
    }

    /// Number of member lattice cells.
    ///
    /// Shapes count the cells whose centre they contain; a shape too large
    /// to rasterise counts as zero.
    pub fn number_of_points(&self) -> usize {
        match &self.content {
            RoiContent::Shape(shape) => shape
                .to_mask()
                .map_or(0, |mask| mask.number_of_points()),
            RoiContent::Area(mask) => mask.number_of_points(),
            RoiContent::Stack(stack) => stack
                .iter()
                .map(|(_, slice)| slice.number_of_points())
                .sum(),
        }
    }

    /// Member lattice cells as (x, y, z, t, c); axes the region does not
    /// span are reported as 0.
    pub fn lattice_points(&self) -> RoiResult<Vec<[i32; 5]>> {
        let planar = |mask: &BooleanMask2D| -> Vec<[i32; 5]> {
            mask.points().map(|[x, y]| [x, y, 0, 0, 0]).collect()
        };
        match &self.content {
            RoiContent::Shape(shape) => Ok(planar(&shape.to_mask()?)),
            RoiContent::Area(mask) => Ok(planar(mask)),
            RoiContent::Stack(stack) => {
                let axis = stack.axis().index();
                let mut points = Vec::new();
                for (index, slice) in stack.iter() {
                    for mut p in slice.lattice_points()? {
                        p[axis] = index;
                        points.push(p);
                    }
                }
                Ok(points)
            }
        }
    }

    /// The XY membership active at (z, t, c).
    pub fn boolean_mask_2d(&self, z: i32, t: i32, c: i32) -> RoiResult<BooleanMask2D> {
        if !self.is_active_at(z, t, c) {
            return Ok(BooleanMask2D::empty());
        }
        match &self.content {
            RoiContent::Shape(shape) => shape.to_mask(),
            RoiContent::Area(mask) => Ok(mask.clone()),
            RoiContent::Stack(stack) => {
                let index = [z, t, c][stack.axis().index() - 2];
                match stack.slice(index) {
                    Some(slice) => slice.boolean_mask_2d(z, t, c),
                    None => Ok(BooleanMask2D::empty()),
                }
            }
        }
    }

    /// Whether the region is stored as geometric shapes rather than masks.
    pub fn is_shape_based(&self) -> bool {
        match &self.content {
            RoiContent::Shape(_) => true,
            RoiContent::Area(_) => false,
            RoiContent::Stack(stack) => match stack.kind() {
                SliceKind::Shape => true,
                SliceKind::Mask => false,
                SliceKind::Any => stack.iter().all(|(_, slice)| slice.is_shape_based()),
            },
        }
    }

    /// Converts shapes to rasterised masks, keeping identity and attachments.
    pub fn into_mask_based(mut self) -> RoiResult<Roi> {
        let content = std::mem::replace(&mut self.content, RoiContent::Area(BooleanMask2D::empty()));
        self.content = match content {
            RoiContent::Shape(shape) => RoiContent::Area(shape.to_mask()?),
            RoiContent::Stack(stack) if stack.kind() != SliceKind::Mask => {
                let mut converted = SliceStack::new(stack.dimension(), SliceKind::Mask)?;
                for (index, slice) in stack.into_slices() {
                    converted.insert(index, slice.into_mask_based()?, &self.attachments);
                }
                RoiContent::Stack(converted)
            }
            other => other,
        };
        Ok(self)
    }

    /// Copies identity and display attributes from `other`.
    pub(crate) fn adopt_identity(&mut self, other: &Roi) {
        self.id = other.id;
        self.name.clone_from(&other.name);
        self.color = other.color;
        self.properties.clone_from(&other.properties);
    }

    /// Restores data and attributes from a snapshot of this region.
    ///
    /// Listeners and the sequence link are kept.
    pub fn restore(&mut self, snapshot: &Roi) {
        self.begin_update();
        if self.name != snapshot.name {
            self.set_name(snapshot.name.clone());
        }
        self.set_color(snapshot.color);
        self.attachments = snapshot.attachments;
        self.content = snapshot.content.clone();
        if self.properties != snapshot.properties {
            self.properties.clone_from(&snapshot.properties);
            self.notifier
                .notify(RoiEvent::property_changed(self.id, "*"));
        }
        self.notifier.notify(RoiEvent::state_changed(self.id));
        self.end_update();
    }

    // -- Set algebra --

    /// Cells in either region.
    ///
    /// Both regions must share a dimension and the attachments on every
    /// axis above it; the result is mask-based and carries those
    /// attachments. Differently pinned regions are rejected with
    /// [`RoiError::InvalidArgument`].
    pub fn union(a: &Roi, b: &Roi) -> RoiResult<Roi> {
        Self::check_combinable(a, b)?;
        Self::combine(a, b, SetOp::Union)
    }

    /// Cells in both regions.
    pub fn intersection(a: &Roi, b: &Roi) -> RoiResult<Roi> {
        Self::check_combinable(a, b)?;
        Self::combine(a, b, SetOp::Intersection)
    }

    /// Cells in `a` but not in `b`.
    pub fn subtraction(a: &Roi, b: &Roi) -> RoiResult<Roi> {
        Self::check_combinable(a, b)?;
        Self::combine(a, b, SetOp::Subtraction)
    }

    fn check_combinable(a: &Roi, b: &Roi) -> RoiResult {
        let dimension = a.dimension();
        if b.dimension() != dimension {
            return Err(RoiError::InvalidArgument(format!(
                "cannot combine a {dimension}D region with a {}D region",
                b.dimension()
            )));
        }
        for axis in Axis::HIGHER.into_iter().filter(|h| h.index() >= dimension) {
            let (left, right) = (a.attachment(axis), b.attachment(axis));
            if left != right {
                return Err(RoiError::InvalidArgument(format!(
                    "cannot combine regions attached differently on {axis}: {left:?} and {right:?}"
                )));
            }
        }
        Ok(())
    }

    fn planar_mask(&self) -> RoiResult<BooleanMask2D> {
        match &self.content {
            RoiContent::Shape(shape) => shape.to_mask(),
            RoiContent::Area(mask) => Ok(mask.clone()),
            RoiContent::Stack(_) => Err(RoiError::InvalidArgument(
                "stacked regions have no single plane".into(),
            )),
        }
    }

    /// Slices missing from one operand are combined against an empty,
    /// unattached slice, so attachments are checked only at the top.
    fn combine(a: &Roi, b: &Roi, op: SetOp) -> RoiResult<Roi> {
        let dimension = a.dimension();
        let mut out = if dimension == 2 {
            let (ma, mb) = (a.planar_mask()?, b.planar_mask()?);
            let mask = match op {
                SetOp::Union => BooleanMask::union(&ma, &mb)?,
                SetOp::Intersection => BooleanMask::intersect(&ma, &mb)?,
                SetOp::Subtraction => BooleanMask::subtract(&ma, &mb)?,
            };
            Roi::from_mask(mask)
        } else {
            let mut stack = SliceStack::new(dimension, SliceKind::Mask)?;
            let empty = Roi::mask(dimension - 1)?;
            let indices: BTreeSet<i32> = match op {
                SetOp::Union => a.slice_indices().into_iter().chain(b.slice_indices()).collect(),
                SetOp::Intersection => {
                    let other: BTreeSet<i32> = b.slice_indices().into_iter().collect();
                    a.slice_indices().into_iter().filter(|i| other.contains(i)).collect()
                }
                SetOp::Subtraction => a.slice_indices().into_iter().collect(),
            };
            for index in indices {
                let sa = a.slice(index).unwrap_or(&empty);
                let sb = b.slice(index).unwrap_or(&empty);
                let piece = Self::combine(sa, sb, op)?;
                if !piece.is_empty() {
                    stack.insert(index, piece, &a.attachments);
                }
            }
            Roi::with_content(RoiContent::Stack(stack))
        };
        out.name.clone_from(&a.name);
        out.color = a.color;
        out.attachments = a.attachments;
        Ok(out)
    }
}

impl Clone for Roi {
    /// Copies data and identity; listeners and the sequence link are not cloned.
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            color: self.color,
            attachments: self.attachments,
            content: self.content.clone(),
            properties: self.properties.clone(),
            notifier: UpdateNotifier::new(),
            sequence_link: None,
        }
    }
}
