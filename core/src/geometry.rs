//! Coordinate types shared by every region variant.
//!
//! Regions live in a space of up to five axes ordered X, Y, Z, T, C. X/Y/Z
//! are spatial (continuous for shapes, integer lattice for masks), T and C
//! are discrete. Bounds are half-open per axis: the integer index `k`
//! occupies `[k, k + 1)` and an unbounded axis spans `(-inf, +inf)`.

use std::fmt;
use std::ops::RangeInclusive;

pub use nalgebra;

/// 2D vector (f64).
pub type Vec2 = nalgebra::Vector2<f64>;

/// 2D point (f64).
pub type Point2 = nalgebra::Point2<f64>;

/// One of the five axes a region can span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    X,
    Y,
    Z,
    T,
    C,
}

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; 5] = [Axis::X, Axis::Y, Axis::Z, Axis::T, Axis::C];

    /// Position of this axis in a 5-tuple.
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
            Axis::T => 3,
            Axis::C => 4,
        }
    }

    /// The axis a slice stack of a `dimension`-dimensional region is keyed on.
    ///
    /// Only dimensions 3 to 5 are stacked (Z, T and C respectively).
    pub const fn stack_axis(dimension: usize) -> Option<Axis> {
        match dimension {
            3 => Some(Axis::Z),
            4 => Some(Axis::T),
            5 => Some(Axis::C),
            _ => None,
        }
    }

    /// Axes that may carry an attachment (everything above X/Y).
    pub const HIGHER: [Axis; 3] = [Axis::Z, Axis::T, Axis::C];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::T => "T",
            Axis::C => "C",
        };
        f.write_str(name)
    }
}

/// A coordinate in (x, y, z, t, c) space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Point5 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub t: f64,
    pub c: f64,
}

impl Point5 {
    pub const fn new(x: f64, y: f64, z: f64, t: f64, c: f64) -> Self {
        Self { x, y, z, t, c }
    }

    /// A point on the XY plane at z = t = c = 0.
    pub const fn xy(x: f64, y: f64) -> Self {
        Self::new(x, y, 0.0, 0.0, 0.0)
    }

    /// Builds a point from integer lattice coordinates.
    pub fn from_lattice(p: [i32; 5]) -> Self {
        Self::new(
            p[0] as f64,
            p[1] as f64,
            p[2] as f64,
            p[3] as f64,
            p[4] as f64,
        )
    }

    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::T => self.t,
            Axis::C => self.c,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
            Axis::T => self.t = value,
            Axis::C => self.c = value,
        }
    }

    /// Returns a copy with `axis` replaced by `value`.
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        self.set(axis, value);
        self
    }

    /// Integer index of the lattice cell containing this coordinate on `axis`.
    pub fn cell(&self, axis: Axis) -> i32 {
        self.get(axis).floor() as i32
    }

    /// Integer lattice cell containing this point.
    pub fn lattice(&self) -> [i32; 5] {
        Axis::ALL.map(|axis| self.cell(axis))
    }

    pub fn to_point2(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }
}

/// Minimal axis-aligned hyper-rectangle, half-open on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds5 {
    min: [f64; 5],
    max: [f64; 5],
}

impl Bounds5 {
    /// Bounds containing nothing; the identity for [`union`](Self::union).
    pub const EMPTY: Bounds5 = Bounds5 {
        min: [f64::INFINITY; 5],
        max: [f64::NEG_INFINITY; 5],
    };

    /// Bounds spanning every axis entirely.
    pub const INFINITE: Bounds5 = Bounds5 {
        min: [f64::NEG_INFINITY; 5],
        max: [f64::INFINITY; 5],
    };

    pub fn new(min: [f64; 5], max: [f64; 5]) -> Self {
        Self { min, max }
    }

    /// Bounds of a single lattice cell.
    pub fn of_cell(p: [i32; 5]) -> Self {
        let min = p.map(|v| v as f64);
        let max = p.map(|v| v as f64 + 1.0);
        Self { min, max }
    }

    pub fn min(&self, axis: Axis) -> f64 {
        self.min[axis.index()]
    }

    pub fn max(&self, axis: Axis) -> f64 {
        self.max[axis.index()]
    }

    /// Extent along `axis` (zero for empty bounds).
    pub fn size(&self, axis: Axis) -> f64 {
        (self.max(axis) - self.min(axis)).max(0.0)
    }

    pub fn set_axis(&mut self, axis: Axis, min: f64, max: f64) {
        self.min[axis.index()] = min;
        self.max[axis.index()] = max;
    }

    /// Sets `axis` to span the single integer index `index`.
    pub fn set_index(&mut self, axis: Axis, index: i32) {
        self.set_axis(axis, index as f64, index as f64 + 1.0);
    }

    pub fn set_infinite(&mut self, axis: Axis) {
        self.set_axis(axis, f64::NEG_INFINITY, f64::INFINITY);
    }

    pub fn is_infinite(&self, axis: Axis) -> bool {
        self.min(axis) == f64::NEG_INFINITY && self.max(axis) == f64::INFINITY
    }

    pub fn is_empty(&self) -> bool {
        (0..5).any(|i| self.min[i] >= self.max[i])
    }

    /// Smallest bounds containing both `self` and `other`.
    pub fn union(&self, other: &Bounds5) -> Bounds5 {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let mut out = *self;
        for i in 0..5 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    pub fn intersects(&self, other: &Bounds5) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && (0..5).all(|i| self.min[i] < other.max[i] && other.min[i] < self.max[i])
    }

    pub fn contains(&self, p: &Point5) -> bool {
        Axis::ALL
            .iter()
            .all(|&axis| p.get(axis) >= self.min(axis) && p.get(axis) < self.max(axis))
    }

    /// Inclusive range of integer indices covered on `axis`.
    ///
    /// Returns `None` for empty or unbounded axes.
    pub fn index_span(&self, axis: Axis) -> Option<RangeInclusive<i32>> {
        let (min, max) = (self.min(axis), self.max(axis));
        if !min.is_finite() || !max.is_finite() || min >= max {
            return None;
        }
        Some(min.floor() as i32..=(max.ceil() as i32 - 1))
    }
}

impl Default for Bounds5 {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// A cutting segment on the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSegment {
    pub start: Point2,
    pub end: Point2,
}

impl LineSegment {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    pub fn from_coords(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction().norm_squared() <= f64::EPSILON
    }

    /// Signed side of `p` relative to the supporting line (2D cross product).
    pub fn side(&self, p: &Point2) -> f64 {
        let d = self.direction();
        let v = p - self.start;
        d.x * v.y - d.y * v.x
    }

    /// Whether `p` lies on the non-negative side; points on the line count as positive.
    pub fn is_positive(&self, p: &Point2) -> bool {
        self.side(p) >= 0.0
    }

    /// Whether the segment cuts the straight edge `p -> q`.
    ///
    /// The edge is cut when `p` and `q` fall on different sides and the
    /// crossing point lies within the segment's extent.
    pub fn cuts_edge(&self, p: &Point2, q: &Point2) -> bool {
        let (sp, sq) = (self.side(p), self.side(q));
        if (sp >= 0.0) == (sq >= 0.0) {
            return false;
        }
        let crossing = p + (q - p) * (sp / (sp - sq));
        let d = self.direction();
        let t = (crossing - self.start).dot(&d) / d.norm_squared();
        (0.0..=1.0).contains(&t)
    }

    /// Extends the supporting line to its full intersection with the rectangle
    /// `[min, max)` (Liang-Barsky with an unbounded parameter).
    ///
    /// Returns `None` if the segment is degenerate or the line misses the rectangle.
    pub fn extended_to(&self, min: Point2, max: Point2) -> Option<LineSegment> {
        if self.is_degenerate() {
            return None;
        }
        let d = self.direction();
        let mut t0 = f64::NEG_INFINITY;
        let mut t1 = f64::INFINITY;
        for (origin, delta, lo, hi) in [
            (self.start.x, d.x, min.x, max.x),
            (self.start.y, d.y, min.y, max.y),
        ] {
            if delta.abs() <= f64::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }
            let a = (lo - origin) / delta;
            let b = (hi - origin) / delta;
            t0 = t0.max(a.min(b));
            t1 = t1.min(a.max(b));
        }
        if t0 > t1 {
            return None;
        }
        Some(LineSegment::new(self.start + d * t0, self.start + d * t1))
    }
}
