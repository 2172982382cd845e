//! Shape-based region geometry on the XY plane.

use crate::error::{RoiError, RoiResult};
use crate::geometry::{LineSegment, Point2};
use crate::mask::{BooleanMask2D, MAX_MASK_CELLS, MaskRect};

/// Tolerance for degenerate areas and collinear edges.
const AREA_EPSILON: f64 = 1e-9;

/// A 2D geometric boundary.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum Shape2D {
    /// Axis-aligned box, half-open: `[min, max)`.
    Rectangle { min: Point2, max: Point2 },
    Ellipse { center: Point2, radii: Point2 },
    /// Closed polygon; the last vertex connects back to the first.
    Polygon(Vec<Point2>),
    /// Open path with no interior.
    Polyline(Vec<Point2>),
}

impl Shape2D {
    /// Rectangle spanning both corners in any order.
    pub fn rectangle(a: Point2, b: Point2) -> Self {
        Shape2D::Rectangle {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn ellipse(center: Point2, rx: f64, ry: f64) -> Self {
        Shape2D::Ellipse {
            center,
            radii: Point2::new(rx, ry),
        }
    }

    pub fn polygon(vertices: impl IntoIterator<Item = Point2>) -> Self {
        Shape2D::Polygon(vertices.into_iter().collect())
    }

    pub fn polyline(vertices: impl IntoIterator<Item = Point2>) -> Self {
        Shape2D::Polyline(vertices.into_iter().collect())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape2D::Rectangle { .. } => "rectangle",
            Shape2D::Ellipse { .. } => "ellipse",
            Shape2D::Polygon(_) => "polygon",
            Shape2D::Polyline(_) => "polyline",
        }
    }

    fn vertices(&self) -> Vec<Point2> {
        match self {
            Shape2D::Polygon(v) | Shape2D::Polyline(v) => v.clone(),
            _ => Vec::new(),
        }
    }

    /// Rejects non-finite coordinates and negative radii.
    pub fn validate(&self) -> RoiResult {
        let finite = |p: &Point2| p.x.is_finite() && p.y.is_finite();
        let ok = match self {
            Shape2D::Rectangle { min, max } => finite(min) && finite(max),
            Shape2D::Ellipse { center, radii } => {
                finite(center) && finite(radii) && radii.x >= 0.0 && radii.y >= 0.0
            }
            Shape2D::Polygon(v) | Shape2D::Polyline(v) => v.iter().all(finite),
        };
        if ok {
            Ok(())
        } else {
            Err(RoiError::InvalidArgument(format!(
                "{} has non-finite coordinates or negative radii",
                self.kind_name()
            )))
        }
    }

    /// Whether `p` lies inside the shape. Polylines contain nothing.
    pub fn contains(&self, p: &Point2) -> bool {
        match self {
            Shape2D::Rectangle { min, max } => {
                p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y
            }
            Shape2D::Ellipse { center, radii } => {
                if radii.x <= 0.0 || radii.y <= 0.0 {
                    return false;
                }
                let dx = (p.x - center.x) / radii.x;
                let dy = (p.y - center.y) / radii.y;
                dx * dx + dy * dy <= 1.0
            }
            Shape2D::Polygon(vertices) => polygon_contains(vertices, p),
            Shape2D::Polyline(_) => false,
        }
    }

    /// Bounding box `(min, max)`, or `None` for a shape without vertices.
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        match self {
            Shape2D::Rectangle { min, max } => Some((*min, *max)),
            Shape2D::Ellipse { center, radii } => Some((
                Point2::new(center.x - radii.x, center.y - radii.y),
                Point2::new(center.x + radii.x, center.y + radii.y),
            )),
            Shape2D::Polygon(v) | Shape2D::Polyline(v) => {
                let first = v.first()?;
                Some(v.iter().fold((*first, *first), |(lo, hi), p| {
                    (
                        Point2::new(lo.x.min(p.x), lo.y.min(p.y)),
                        Point2::new(hi.x.max(p.x), hi.y.max(p.y)),
                    )
                }))
            }
        }
    }

    /// Whether the shape covers nothing: no vertices, or no area for closed shapes.
    pub fn is_empty(&self) -> bool {
        match self {
            Shape2D::Polyline(v) => v.is_empty(),
            _ => self.area() <= AREA_EPSILON,
        }
    }

    /// Enclosed area; zero for polylines.
    pub fn area(&self) -> f64 {
        match self {
            Shape2D::Rectangle { min, max } => (max.x - min.x) * (max.y - min.y),
            Shape2D::Ellipse { radii, .. } => std::f64::consts::PI * radii.x * radii.y,
            Shape2D::Polygon(v) => polygon_area(v).abs(),
            Shape2D::Polyline(_) => 0.0,
        }
    }

    /// Outline as a polygon; ellipses are approximated with `segments` vertices.
    pub fn to_polygon(&self, segments: usize) -> Vec<Point2> {
        match self {
            Shape2D::Rectangle { min, max } => vec![
                *min,
                Point2::new(max.x, min.y),
                *max,
                Point2::new(min.x, max.y),
            ],
            Shape2D::Ellipse { center, radii } => {
                let n = segments.max(3);
                (0..n)
                    .map(|i| {
                        let a = std::f64::consts::TAU * i as f64 / n as f64;
                        Point2::new(center.x + radii.x * a.cos(), center.y + radii.y * a.sin())
                    })
                    .collect()
            }
            Shape2D::Polygon(_) | Shape2D::Polyline(_) => self.vertices(),
        }
    }

    /// Whether the shape is a convex area.
    pub fn is_convex(&self) -> bool {
        match self {
            Shape2D::Rectangle { .. } | Shape2D::Ellipse { .. } => true,
            Shape2D::Polygon(v) => polygon_is_convex(v),
            Shape2D::Polyline(_) => false,
        }
    }

    /// Rasterises the shape: a cell is set when its centre lies inside.
    ///
    /// Polylines set every cell their segments pass through.
    pub fn to_mask(&self) -> RoiResult<BooleanMask2D> {
        let Some((lo, hi)) = self.bounds() else {
            return Ok(BooleanMask2D::empty());
        };
        let origin = [lo.x.floor() as i32, lo.y.floor() as i32];
        let size = [
            (hi.x.ceil() - lo.x.floor()).max(1.0) as u32,
            (hi.y.ceil() - lo.y.floor()).max(1.0) as u32,
        ];
        let rect = MaskRect::new(origin, size);
        let requested = rect.volume();
        if requested > MAX_MASK_CELLS {
            return Err(RoiError::AllocationTooLarge { requested });
        }
        if let Shape2D::Polyline(v) = self {
            return BooleanMask2D::from_points(trace_cells(v));
        }
        BooleanMask2D::from_points(rect.cells().filter(|c| {
            self.contains(&Point2::new(c[0] as f64 + 0.5, c[1] as f64 + 0.5))
        }))
    }

    /// Part of the outline on one side of `line` (Sutherland-Hodgman).
    ///
    /// Points exactly on the line belong to the positive side.
    pub fn clip(&self, line: &LineSegment, positive: bool, segments: usize) -> Vec<Point2> {
        let outline = self.to_polygon(segments);
        let keep = |p: &Point2| line.is_positive(p) == positive;
        let mut out = Vec::with_capacity(outline.len() + 2);
        for (i, current) in outline.iter().enumerate() {
            let previous = &outline[(i + outline.len() - 1) % outline.len()];
            match (keep(previous), keep(current)) {
                (true, true) => out.push(*current),
                (true, false) => out.push(crossing(line, previous, current)),
                (false, true) => {
                    out.push(crossing(line, previous, current));
                    out.push(*current);
                }
                (false, false) => {}
            }
        }
        out
    }
}

fn crossing(line: &LineSegment, p: &Point2, q: &Point2) -> Point2 {
    let (sp, sq) = (line.side(p), line.side(q));
    let t = sp / (sp - sq);
    p + (q - p) * t
}

/// Signed area (shoelace); positive for counter-clockwise vertices.
pub(crate) fn polygon_area(v: &[Point2]) -> f64 {
    if v.len() < 3 {
        return 0.0;
    }
    let twice: f64 = (0..v.len())
        .map(|i| {
            let (a, b) = (v[i], v[(i + 1) % v.len()]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Ray casting, crossing the edges to the right of `p`.
fn polygon_contains(v: &[Point2], p: &Point2) -> bool {
    if v.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = v.len() - 1;
    for i in 0..v.len() {
        let (vi, vj) = (&v[i], &v[j]);
        if (vi.y > p.y) != (vj.y > p.y) && p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn polygon_is_convex(v: &[Point2]) -> bool {
    if v.len() < 3 {
        return false;
    }
    let mut sign = 0.0f64;
    for i in 0..v.len() {
        let (a, b, c) = (v[i], v[(i + 1) % v.len()], v[(i + 2) % v.len()]);
        let cross = (b - a).perp(&(c - b));
        if cross.abs() <= AREA_EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    sign != 0.0
}

/// Cells visited by a path, sampled at quarter-cell steps.
fn trace_cells(v: &[Point2]) -> Vec<[i32; 2]> {
    let cell = |p: Point2| [p.x.floor() as i32, p.y.floor() as i32];
    let mut cells: Vec<[i32; 2]> = v.first().map(|p| vec![cell(*p)]).unwrap_or_default();
    for pair in v.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let steps = ((b - a).norm() * 4.0).ceil().max(1.0) as usize;
        for s in 1..=steps {
            let p = a + (b - a) * (s as f64 / steps as f64);
            cells.push(cell(p));
        }
    }
    cells
}
