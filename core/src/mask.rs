//! Dense boolean masks over an integer lattice.
//!
//! A [`BooleanMask`] stores membership as a bit array laid over a
//! rectangle ([`MaskRect`]); cells outside the rectangle are implicitly
//! non-members. The dimension is a const parameter so the same engine
//! backs 2D areas, 3D volumes and the 5D lattice used while splitting.
//!
//! Setting a point outside the rectangle grows it (translating existing
//! bits). Clearing never shrinks it: call
//! [`optimize_bounds`](BooleanMask::optimize_bounds) after a batch of
//! removals to restore the minimal rectangle.

use std::collections::VecDeque;
use std::fmt;

use fixedbitset::FixedBitSet;

use crate::error::{RoiError, RoiResult};

/// Largest number of cells a single mask may address.
pub const MAX_MASK_CELLS: u128 = u32::MAX as u128;

/// Integer rectangle: origin plus size per axis, X varying fastest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaskRect<const D: usize> {
    pub origin: [i32; D],
    pub size: [u32; D],
}

impl<const D: usize> MaskRect<D> {
    pub const fn new(origin: [i32; D], size: [u32; D]) -> Self {
        Self { origin, size }
    }

    /// A zero-volume rectangle at the origin.
    pub const fn empty() -> Self {
        Self {
            origin: [0; D],
            size: [0; D],
        }
    }

    /// The 1-cell rectangle at `p`.
    pub fn cell(p: [i32; D]) -> Self {
        Self {
            origin: p,
            size: [1; D],
        }
    }

    /// Number of cells covered, computed without overflow.
    pub fn volume(&self) -> u128 {
        self.size
            .iter()
            .fold(1u128, |acc, &s| acc.saturating_mul(s as u128))
    }

    pub fn is_empty(&self) -> bool {
        self.size.contains(&0)
    }

    /// Exclusive upper corner on `axis`.
    pub fn end(&self, axis: usize) -> i64 {
        self.origin[axis] as i64 + self.size[axis] as i64
    }

    pub fn contains(&self, p: &[i32; D]) -> bool {
        !self.is_empty()
            && (0..D).all(|i| p[i] as i64 >= self.origin[i] as i64 && (p[i] as i64) < self.end(i))
    }

    /// Linear bit index of `p`, if it lies inside.
    fn index_of(&self, p: &[i32; D]) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }
        let mut index = 0usize;
        let mut stride = 1usize;
        for i in 0..D {
            index += (p[i] - self.origin[i]) as usize * stride;
            stride *= self.size[i] as usize;
        }
        Some(index)
    }

    /// Inverse of `index_of`.
    fn point_at(&self, mut index: usize) -> [i32; D] {
        let mut p = self.origin;
        for i in 0..D {
            let s = self.size[i] as usize;
            p[i] += (index % s) as i32;
            index /= s;
        }
        p
    }

    /// Smallest rectangle containing both.
    ///
    /// Fails with [`RoiError::AllocationTooLarge`] when a side of the result
    /// would not fit in `u32`.
    pub fn union(&self, other: &MaskRect<D>) -> RoiResult<MaskRect<D>> {
        if self.is_empty() {
            return Ok(*other);
        }
        if other.is_empty() {
            return Ok(*self);
        }
        let origin: [i32; D] = std::array::from_fn(|i| self.origin[i].min(other.origin[i]));
        let spans: [i64; D] =
            std::array::from_fn(|i| self.end(i).max(other.end(i)) - origin[i] as i64);
        if spans.iter().any(|&span| span > u32::MAX as i64) {
            let requested = spans
                .iter()
                .fold(1u128, |acc, &span| acc.saturating_mul(span as u128));
            return Err(RoiError::AllocationTooLarge { requested });
        }
        Ok(MaskRect {
            origin,
            size: spans.map(|span| span as u32),
        })
    }

    /// Overlap of both rectangles (empty when disjoint).
    pub fn intersection(&self, other: &MaskRect<D>) -> MaskRect<D> {
        let mut out = MaskRect::empty();
        for i in 0..D {
            let lo = self.origin[i].max(other.origin[i]);
            let hi = self.end(i).min(other.end(i));
            if hi <= lo as i64 {
                return MaskRect::empty();
            }
            out.origin[i] = lo;
            out.size[i] = (hi - lo as i64) as u32;
        }
        out
    }

    /// Smallest rectangle containing `self` and the cell `p`.
    pub fn including(&self, p: &[i32; D]) -> RoiResult<MaskRect<D>> {
        self.union(&MaskRect::cell(*p))
    }

    /// Every cell of the rectangle, X fastest.
    pub fn cells(&self) -> impl Iterator<Item = [i32; D]> + '_ {
        let count = if self.is_empty() {
            0
        } else {
            self.volume() as usize
        };
        (0..count).map(move |i| self.point_at(i))
    }
}

impl<const D: usize> Default for MaskRect<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const D: usize> fmt::Debug for MaskRect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MaskRect({:?} + {:?})", self.origin, self.size)
    }
}

fn check_volume<const D: usize>(rect: &MaskRect<D>) -> RoiResult {
    let requested = rect.volume();
    if requested > MAX_MASK_CELLS {
        return Err(RoiError::AllocationTooLarge { requested });
    }
    Ok(())
}

/// Per-cell membership over a [`MaskRect`].
#[derive(Clone)]
pub struct BooleanMask<const D: usize> {
    rect: MaskRect<D>,
    bits: FixedBitSet,
    optimized: bool,
}

/// Planar mask backing 2D areas.
pub type BooleanMask2D = BooleanMask<2>;

/// Volumetric mask.
pub type BooleanMask3D = BooleanMask<3>;

impl<const D: usize> BooleanMask<D> {
    /// An empty mask with no storage.
    pub fn empty() -> Self {
        Self {
            rect: MaskRect::empty(),
            bits: FixedBitSet::new(),
            optimized: true,
        }
    }

    /// An all-clear mask covering `rect`.
    ///
    /// Fails with [`RoiError::AllocationTooLarge`] if the rectangle volume
    /// exceeds [`MAX_MASK_CELLS`].
    pub fn new(rect: MaskRect<D>) -> RoiResult<Self> {
        check_volume(&rect)?;
        let len = if rect.is_empty() {
            0
        } else {
            rect.volume() as usize
        };
        Ok(Self {
            rect,
            bits: FixedBitSet::with_capacity(len),
            optimized: false,
        })
    }

    /// A mask with every cell of `rect` set.
    pub fn filled(rect: MaskRect<D>) -> RoiResult<Self> {
        let mut mask = Self::new(rect)?;
        let len = mask.bits.len();
        mask.bits.insert_range(..len);
        mask.optimized = true;
        Ok(mask)
    }

    /// Builds a tight mask holding exactly `points`.
    pub fn from_points(points: impl IntoIterator<Item = [i32; D]>) -> RoiResult<Self> {
        let points: Vec<[i32; D]> = points.into_iter().collect();
        let rect = points
            .iter()
            .try_fold(MaskRect::empty(), |r, p| r.including(p))?;
        let mut mask = Self::new(rect)?;
        for p in &points {
            if let Some(i) = mask.rect.index_of(p) {
                mask.bits.insert(i);
            }
        }
        mask.optimized = true;
        Ok(mask)
    }

    /// The stored rectangle; minimal only if [`is_bounds_optimized`](Self::is_bounds_optimized).
    pub fn rect(&self) -> MaskRect<D> {
        self.rect
    }

    /// Whether the stored rectangle is known to be the minimal one.
    pub fn is_bounds_optimized(&self) -> bool {
        self.optimized
    }

    pub fn contains(&self, p: &[i32; D]) -> bool {
        self.rect.index_of(p).is_some_and(|i| self.bits.contains(i))
    }

    pub fn number_of_points(&self) -> usize {
        self.bits.count_ones(..)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.ones().next().is_none()
    }

    /// Member cells in storage order.
    pub fn points(&self) -> impl Iterator<Item = [i32; D]> + '_ {
        self.bits.ones().map(|i| self.rect.point_at(i))
    }

    /// Re-lays the bits over `rect`, dropping members that fall outside it.
    fn relocate(&mut self, rect: MaskRect<D>) -> RoiResult {
        if rect == self.rect {
            return Ok(());
        }
        let mut next = Self::new(rect)?;
        for p in self.points() {
            if let Some(i) = next.rect.index_of(&p) {
                next.bits.insert(i);
            }
        }
        self.rect = next.rect;
        self.bits = next.bits;
        Ok(())
    }

    /// Sets or clears one cell. Returns `true` if membership changed.
    ///
    /// Setting outside the rectangle grows it first; clearing never shrinks.
    pub fn set_point(&mut self, p: [i32; D], value: bool) -> RoiResult<bool> {
        if value {
            if !self.rect.contains(&p) {
                let grown = self.rect.including(&p)?;
                self.relocate(grown)?;
            }
            let Some(i) = self.rect.index_of(&p) else {
                return Ok(false);
            };
            // Growing to the cell of a new member keeps a tight rect tight.
            Ok(!self.bits.put(i))
        } else {
            let Some(i) = self.rect.index_of(&p) else {
                return Ok(false);
            };
            let changed = self.bits.contains(i);
            self.bits.set(i, false);
            if changed {
                self.optimized = false;
            }
            Ok(changed)
        }
    }

    /// Cells whose centre lies within `radius` of `center`, plus the cell
    /// containing `center` itself.
    fn brush_cells(center: [f64; D], radius: f64) -> RoiResult<Vec<[i32; D]>> {
        if !(radius >= 0.0) || !radius.is_finite() {
            return Err(RoiError::InvalidArgument(format!(
                "brush radius must be finite and non-negative, got {radius}"
            )));
        }
        if !center.iter().all(|v| v.is_finite()) {
            return Err(RoiError::InvalidArgument(format!(
                "brush centre must be finite, got {center:?}"
            )));
        }
        let lo = center.map(|v| (v - radius).floor());
        let hi = center.map(|v| (v + radius).floor());
        let requested = (0..D).fold(1u128, |acc, i| {
            acc.saturating_mul(((hi[i] - lo[i]) as u128).saturating_add(1))
        });
        if requested > MAX_MASK_CELLS {
            return Err(RoiError::AllocationTooLarge { requested });
        }
        let lattice = i32::MIN as f64..=i32::MAX as f64;
        if !lo.iter().chain(&hi).all(|v| lattice.contains(v)) {
            return Err(RoiError::InvalidArgument(format!(
                "brush around {center:?} leaves the i32 lattice"
            )));
        }
        let size: [u32; D] = std::array::from_fn(|i| (hi[i] - lo[i]) as u32 + 1);
        let bbox = MaskRect::new(lo.map(|v| v as i32), size);
        let r2 = radius * radius;
        let own = center.map(|v| v.floor() as i32);
        Ok(bbox
            .cells()
            .filter(|cell| {
                *cell == own
                    || (0..D)
                        .map(|i| {
                            let d = cell[i] as f64 + 0.5 - center[i];
                            d * d
                        })
                        .sum::<f64>()
                        <= r2
            })
            .collect())
    }

    /// Sets every cell within `radius` (ball metric) of `center`.
    ///
    /// Returns the number of cells that became members.
    pub fn add_brush(&mut self, center: [f64; D], radius: f64) -> RoiResult<usize> {
        let cells = Self::brush_cells(center, radius)?;
        let grown = cells.iter().try_fold(self.rect, |r, c| r.including(c))?;
        self.relocate(grown)?;
        let mut added = 0;
        for cell in &cells {
            if let Some(i) = self.rect.index_of(cell)
                && !self.bits.put(i)
            {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Clears every cell within `radius` of `center`. Returns the number removed.
    pub fn remove_brush(&mut self, center: [f64; D], radius: f64) -> RoiResult<usize> {
        let cells = Self::brush_cells(center, radius)?;
        let mut removed = 0;
        for cell in cells {
            if self.set_point(cell, false)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Minimal rectangle around the member cells.
    pub fn tight_rect(&self) -> MaskRect<D> {
        let mut lo = [i32::MAX; D];
        let mut hi = [i32::MIN; D];
        let mut any = false;
        for p in self.points() {
            any = true;
            for i in 0..D {
                lo[i] = lo[i].min(p[i]);
                hi[i] = hi[i].max(p[i]);
            }
        }
        if !any {
            return MaskRect::empty();
        }
        let mut size = [0u32; D];
        for i in 0..D {
            size[i] = (hi[i] as i64 - lo[i] as i64 + 1) as u32;
        }
        MaskRect::new(lo, size)
    }

    /// Shrinks the rectangle to the minimal box around the member cells.
    pub fn optimize_bounds(&mut self) -> RoiResult {
        let tight = self.tight_rect();
        self.relocate(tight)?;
        self.optimized = true;
        Ok(())
    }

    /// Cells set in either mask; the rectangle is the bounding box of both.
    pub fn union(a: &Self, b: &Self) -> RoiResult<Self> {
        let mut out = Self::new(a.rect.union(&b.rect)?)?;
        for p in a.points().chain(b.points()) {
            if let Some(i) = out.rect.index_of(&p) {
                out.bits.insert(i);
            }
        }
        out.optimized = a.optimized && b.optimized;
        Ok(out)
    }

    /// Cells set in both masks.
    pub fn intersect(a: &Self, b: &Self) -> RoiResult<Self> {
        let (small, large) = if a.number_of_points() <= b.number_of_points() {
            (a, b)
        } else {
            (b, a)
        };
        Self::from_points(small.points().filter(|p| large.contains(p)))
    }

    /// Cells set in `a` but not in `b`.
    pub fn subtract(a: &Self, b: &Self) -> RoiResult<Self> {
        Self::from_points(a.points().filter(|p| !b.contains(p)))
    }

    /// Cells set in exactly one of the masks.
    pub fn exclusive_union(a: &Self, b: &Self) -> RoiResult<Self> {
        Self::from_points(
            a.points()
                .filter(|p| !b.contains(p))
                .chain(b.points().filter(|p| !a.contains(p))),
        )
    }

    /// Whether any cell is set in both masks.
    pub fn intersects(&self, other: &Self) -> bool {
        if self.rect.intersection(&other.rect).is_empty() {
            return false;
        }
        self.points().any(|p| other.contains(&p))
    }

    /// Whether every member of `other` is a member of `self`.
    pub fn contains_mask(&self, other: &Self) -> bool {
        other.points().all(|p| self.contains(&p))
    }

    /// Face-connected components (4-connected in 2D, 6-connected in 3D).
    pub fn connected_components(&self) -> RoiResult<Vec<Self>> {
        self.connected_components_with(|_, _| false)
    }

    /// Face-connected components where a step from `a` to `b` is forbidden
    /// whenever `blocked(a, b)` returns `true`.
    pub fn connected_components_with(
        &self,
        blocked: impl Fn(&[i32; D], &[i32; D]) -> bool,
    ) -> RoiResult<Vec<Self>> {
        let mut visited = FixedBitSet::with_capacity(self.bits.len());
        let mut components = Vec::new();
        let mut queue = VecDeque::new();

        for seed in self.bits.ones() {
            if visited.contains(seed) {
                continue;
            }
            visited.insert(seed);
            queue.push_back(seed);
            let mut members = Vec::new();

            while let Some(index) = queue.pop_front() {
                let p = self.rect.point_at(index);
                members.push(p);
                for axis in 0..D {
                    for step in [-1i32, 1] {
                        let mut q = p;
                        q[axis] = match q[axis].checked_add(step) {
                            Some(v) => v,
                            None => continue,
                        };
                        let Some(j) = self.rect.index_of(&q) else {
                            continue;
                        };
                        if self.bits.contains(j) && !visited.contains(j) && !blocked(&p, &q) {
                            visited.insert(j);
                            queue.push_back(j);
                        }
                    }
                }
            }
            components.push(Self::from_points(members)?);
        }
        Ok(components)
    }
}

impl<const D: usize> Default for BooleanMask<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const D: usize> PartialEq for BooleanMask<D> {
    /// Masks are equal when they hold the same cells, whatever their rectangles.
    fn eq(&self, other: &Self) -> bool {
        self.number_of_points() == other.number_of_points() && self.contains_mask(other)
    }
}

impl<const D: usize> fmt::Debug for BooleanMask<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanMask")
            .field("rect", &self.rect)
            .field("points", &self.number_of_points())
            .field("optimized", &self.optimized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i32, y0: i32, side: u32) -> BooleanMask2D {
        BooleanMask::filled(MaskRect::new([x0, y0], [side, side])).unwrap()
    }

    #[test]
    fn set_point_grows_rect() {
        let mut mask = BooleanMask2D::empty();
        assert!(mask.set_point([3, 4], true).unwrap());
        assert!(mask.set_point([-2, 10], true).unwrap());
        assert_eq!(mask.rect(), MaskRect::new([-2, 4], [6, 7]));
        assert!(mask.contains(&[3, 4]));
        assert!(mask.contains(&[-2, 10]));
        assert!(!mask.contains(&[0, 5]));
        assert_eq!(mask.number_of_points(), 2);
    }

    #[test]
    fn set_same_point_twice_reports_no_change() {
        let mut mask = BooleanMask2D::empty();
        assert!(mask.set_point([1, 1], true).unwrap());
        assert!(!mask.set_point([1, 1], true).unwrap());
    }

    #[test]
    fn clear_does_not_shrink_until_optimized() {
        let mut mask = square(0, 0, 4);
        for x in 0..4 {
            for y in 2..4 {
                mask.set_point([x, y], false).unwrap();
            }
        }
        assert_eq!(mask.rect(), MaskRect::new([0, 0], [4, 4]));
        assert!(!mask.is_bounds_optimized());

        mask.optimize_bounds().unwrap();
        assert_eq!(mask.rect(), MaskRect::new([0, 0], [4, 2]));
        assert!(mask.is_bounds_optimized());
        assert_eq!(mask.number_of_points(), 8);
    }

    #[test]
    fn optimize_empty_mask() {
        let mut mask = square(0, 0, 2);
        for p in [[0, 0], [0, 1], [1, 0], [1, 1]] {
            mask.set_point(p, false).unwrap();
        }
        mask.optimize_bounds().unwrap();
        assert!(mask.is_empty());
        assert!(mask.rect().is_empty());
    }

    #[test]
    fn allocation_too_large() {
        let result = BooleanMask2D::new(MaskRect::new([0, 0], [100_000, 100_000]));
        assert!(matches!(result, Err(RoiError::AllocationTooLarge { .. })));

        let mut mask = BooleanMask2D::empty();
        mask.set_point([0, 0], true).unwrap();
        let result = mask.set_point([i32::MAX - 1, i32::MAX - 1], true);
        assert!(matches!(result, Err(RoiError::AllocationTooLarge { .. })));
        // Failed growth leaves the mask untouched.
        assert_eq!(mask.number_of_points(), 1);
    }

    #[test]
    fn growth_past_u32_sides_is_rejected() {
        let mut mask = BooleanMask2D::empty();
        mask.set_point([i32::MIN, 0], true).unwrap();
        assert!(matches!(
            mask.set_point([i32::MAX, 0], true),
            Err(RoiError::AllocationTooLarge { requested }) if requested == 1u128 << 32
        ));
        assert_eq!(mask.number_of_points(), 1);
        assert!(!mask.contains(&[i32::MAX, 0]));

        let left = MaskRect::cell([i32::MIN, 0]);
        let right = MaskRect::cell([i32::MAX, 5]);
        assert!(matches!(
            left.union(&right),
            Err(RoiError::AllocationTooLarge { requested }) if requested == 6u128 << 32
        ));
        assert_eq!(
            left.union(&MaskRect::cell([i32::MAX - 1, 0])).unwrap().size,
            [u32::MAX, 1]
        );
    }

    #[test]
    fn brush_paints_disk() {
        let mut mask = BooleanMask2D::empty();
        let added = mask.add_brush([10.5, 10.5], 2.0).unwrap();
        assert_eq!(added, mask.number_of_points());
        assert!(mask.contains(&[10, 10]));
        assert!(mask.contains(&[12, 10]));
        assert!(!mask.contains(&[12, 12]));
        // Disk of radius 2 around a cell centre covers 13 cells.
        assert_eq!(added, 13);
        assert!(mask.is_bounds_optimized());
    }

    #[test]
    fn brush_rejects_negative_radius() {
        let mut mask = BooleanMask2D::empty();
        assert!(matches!(
            mask.add_brush([0.0, 0.0], -1.0),
            Err(RoiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn brush_rejects_huge_or_non_finite_input() {
        let mut mask = BooleanMask2D::empty();
        assert!(matches!(
            mask.add_brush([0.0, 0.0], 3.0e9),
            Err(RoiError::AllocationTooLarge { .. })
        ));
        assert!(matches!(
            mask.add_brush([f64::NAN, 0.0], 1.0),
            Err(RoiError::InvalidArgument(_))
        ));
        assert!(matches!(
            mask.add_brush([0.0, f64::INFINITY], 1.0),
            Err(RoiError::InvalidArgument(_))
        ));
        assert!(matches!(
            mask.remove_brush([3.0e9, 0.0], 1.0),
            Err(RoiError::InvalidArgument(_))
        ));
        assert!(mask.is_empty());
        assert!(mask.rect().is_empty());
    }

    #[test]
    fn remove_brush_clears() {
        let mut mask = square(0, 0, 10);
        let removed = mask.remove_brush([5.5, 5.5], 1.0).unwrap();
        assert_eq!(removed, 5);
        assert!(!mask.contains(&[5, 5]));
        assert_eq!(mask.number_of_points(), 95);
    }

    #[test]
    fn union_membership_and_rect() {
        let a = square(0, 0, 3);
        let b = square(5, 5, 2);
        let u = BooleanMask::union(&a, &b).unwrap();
        assert_eq!(u.rect(), MaskRect::new([0, 0], [7, 7]));
        assert_eq!(u.number_of_points(), 9 + 4);
        for p in MaskRect::<2>::new([-1, -1], [9, 9]).cells() {
            assert_eq!(u.contains(&p), a.contains(&p) || b.contains(&p));
        }
    }

    #[test]
    fn union_is_commutative_and_associative() {
        let a = square(0, 0, 4);
        let b = square(2, 2, 4);
        let mut c = BooleanMask2D::empty();
        c.add_brush([1.0, 6.0], 2.5).unwrap();

        let ab = BooleanMask::union(&a, &b).unwrap();
        let ba = BooleanMask::union(&b, &a).unwrap();
        assert_eq!(ab, ba);

        let ab_c = BooleanMask::union(&ab, &c).unwrap();
        let bc = BooleanMask::union(&b, &c).unwrap();
        let a_bc = BooleanMask::union(&a, &bc).unwrap();
        assert_eq!(ab_c, a_bc);
    }

    #[test]
    fn intersect_is_commutative_and_associative() {
        let a = square(0, 0, 5);
        let b = square(2, 2, 5);
        let c = square(3, 0, 5);

        let ab = BooleanMask::intersect(&a, &b).unwrap();
        assert_eq!(ab, BooleanMask::intersect(&b, &a).unwrap());
        assert_eq!(ab.number_of_points(), 9);
        assert_eq!(ab.rect(), MaskRect::new([2, 2], [3, 3]));

        let ab_c = BooleanMask::intersect(&ab, &c).unwrap();
        let bc = BooleanMask::intersect(&b, &c).unwrap();
        assert_eq!(ab_c, BooleanMask::intersect(&a, &bc).unwrap());
    }

    #[test]
    fn subtract_and_exclusive_union() {
        let a = square(0, 0, 4);
        let b = square(2, 0, 4);
        let diff = BooleanMask::subtract(&a, &b).unwrap();
        assert_eq!(diff.number_of_points(), 8);
        assert!(diff.contains(&[1, 3]));
        assert!(!diff.contains(&[2, 0]));

        let xor = BooleanMask::exclusive_union(&a, &b).unwrap();
        assert_eq!(xor.number_of_points(), 16);
        assert!(!xor.intersects(&BooleanMask::intersect(&a, &b).unwrap()));
    }

    #[test]
    fn contains_mask_and_intersects() {
        let big = square(0, 0, 6);
        let small = square(1, 1, 2);
        let far = square(20, 20, 2);
        assert!(big.contains_mask(&small));
        assert!(!small.contains_mask(&big));
        assert!(big.intersects(&small));
        assert!(!big.intersects(&far));
    }

    #[test]
    fn connected_components_split_blobs() {
        let a = square(0, 0, 2);
        let b = square(4, 0, 2);
        let both = BooleanMask::union(&a, &b).unwrap();
        let parts = both.connected_components().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].number_of_points() + parts[1].number_of_points(), 8);
    }

    #[test]
    fn diagonal_cells_are_separate_components() {
        let mask = BooleanMask2D::from_points([[0, 0], [1, 1]]).unwrap();
        assert_eq!(mask.connected_components().unwrap().len(), 2);
    }

    #[test]
    fn blocked_steps_cut_components() {
        let mask = square(0, 0, 4);
        let parts = mask
            .connected_components_with(|a, b| (a[0] < 2) != (b[0] < 2))
            .unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts.iter().all(|p| p.number_of_points() == 8));
    }

    #[test]
    fn volumetric_mask() {
        let mut mask = BooleanMask3D::empty();
        mask.set_point([0, 0, 0], true).unwrap();
        mask.set_point([0, 0, 3], true).unwrap();
        assert_eq!(mask.rect(), MaskRect::new([0, 0, 0], [1, 1, 4]));
        assert_eq!(mask.connected_components().unwrap().len(), 2);
        mask.add_brush([0.5, 0.5, 1.5], 1.0).unwrap();
        assert_eq!(mask.connected_components().unwrap().len(), 1);
    }
}
