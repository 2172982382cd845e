//! Cutting regions along a line segment.
//!
//! Convex shapes (rectangles, ellipses, convex polygons) are clipped into
//! two polygon halves. Everything else is split on the integer lattice: a
//! step between two face-adjacent member cells is forbidden when the
//! segment crosses the straight edge between their centres, and the
//! connected components that remain become the pieces.
//!
//! A cell centre lying exactly on the line belongs to the non-negative side.

use crate::error::{RoiError, RoiResult};
use crate::geometry::{Axis, LineSegment, Point2, Point5};
use crate::mask::BooleanMask;
use crate::roi::{Roi, RoiContent, Shape2D};

/// Pieces smaller than this (in square units) do not count as a cut.
const MIN_PIECE_AREA: f64 = 1e-6;

/// Splits `roi` along `line`.
///
/// Returns `Ok(None)` when the line does not separate the region into more
/// connected pieces than it already had; the region is never modified.
/// `ellipse_segments` controls the outline resolution used when clipping
/// ellipses.
pub fn split_roi(
    roi: &Roi,
    line: &LineSegment,
    ellipse_segments: usize,
) -> RoiResult<Option<Vec<Roi>>> {
    if line.is_degenerate() {
        return Err(RoiError::InvalidArgument(
            "split line has zero length".into(),
        ));
    }

    let pieces = match roi.content() {
        RoiContent::Shape(Shape2D::Polyline(_)) => None,
        RoiContent::Shape(shape) if shape.is_convex() => {
            split_convex(shape, line, ellipse_segments)?
        }
        RoiContent::Shape(shape) => {
            let rasterised = Roi::from_mask(shape.to_mask()?);
            split_lattice(&rasterised, line)?
        }
        RoiContent::Area(_) | RoiContent::Stack(_) => split_lattice(roi, line)?,
    };

    let Some(mut pieces) = pieces else {
        return Ok(None);
    };
    for (i, piece) in pieces.iter_mut().enumerate() {
        piece.set_name(format!("{} #{}", roi.name(), i + 1));
        piece.set_color(roi.color());
        let dimension = piece.dimension();
        for axis in Axis::HIGHER
            .into_iter()
            .filter(|a| a.index() >= dimension)
        {
            piece.force_attachment(axis, roi.attachment(axis));
        }
    }
    log::debug!("split {} into {} piece(s)", roi.id(), pieces.len());
    Ok(Some(pieces))
}

/// Whether the segment runs across the whole outline: every boundary
/// crossing of the supporting line lies within the segment.
fn crosses_outline(outline: &[Point2], line: &LineSegment) -> bool {
    let mut crossings = 0;
    for (i, p) in outline.iter().enumerate() {
        let q = &outline[(i + 1) % outline.len()];
        if line.is_positive(p) != line.is_positive(q) {
            if !line.cuts_edge(p, q) {
                return false;
            }
            crossings += 1;
        }
    }
    crossings >= 2
}

fn split_convex(
    shape: &Shape2D,
    line: &LineSegment,
    segments: usize,
) -> RoiResult<Option<Vec<Roi>>> {
    let outline = shape.to_polygon(segments);
    if outline.len() < 3 || !crosses_outline(&outline, line) {
        return Ok(None);
    }
    let halves = [
        Shape2D::Polygon(shape.clip(line, true, segments)),
        Shape2D::Polygon(shape.clip(line, false, segments)),
    ];
    if halves.iter().any(|half| half.area() <= MIN_PIECE_AREA) {
        return Ok(None);
    }
    let pieces = halves
        .into_iter()
        .map(Roi::shape)
        .collect::<RoiResult<Vec<_>>>()?;
    Ok(Some(pieces))
}

fn cell_centre(p: &[i32; 5]) -> Point2 {
    Point2::new(p[0] as f64 + 0.5, p[1] as f64 + 0.5)
}

fn split_lattice(roi: &Roi, line: &LineSegment) -> RoiResult<Option<Vec<Roi>>> {
    let lattice = BooleanMask::<5>::from_points(roi.lattice_points()?)?;
    if lattice.is_empty() {
        return Ok(None);
    }
    let before = lattice.connected_components()?.len();
    let components = lattice.connected_components_with(|a, b| {
        a[2..] == b[2..] && line.cuts_edge(&cell_centre(a), &cell_centre(b))
    })?;
    if components.len() <= before {
        return Ok(None);
    }

    let dimension = roi.dimension();
    let mut pieces = Vec::with_capacity(components.len());
    for component in &components {
        let mut piece = Roi::mask(dimension)?;
        piece.batch(|piece| {
            for p in component.points() {
                piece.add_point(Point5::from_lattice(p))?;
            }
            Ok::<_, RoiError>(())
        })?;
        piece.optimize_bounds()?;
        pieces.push(piece);
    }
    Ok(Some(pieces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roi::Attachment;

    fn square(side: i32) -> Roi {
        let mut roi = Roi::mask(2).unwrap();
        for x in 0..side {
            for y in 0..side {
                roi.add_point(Point5::xy(x as f64, y as f64)).unwrap();
            }
        }
        roi
    }

    #[test]
    fn bisecting_a_square_mask() {
        let roi = square(10);
        let line = LineSegment::from_coords(5.0, -1.0, 5.0, 11.0);
        let pieces = split_roi(&roi, &line, 32).unwrap().unwrap();
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].number_of_points(), 50);
        assert_eq!(pieces[1].number_of_points(), 50);
        assert_eq!(pieces[0].name(), format!("{} #1", roi.name()));
    }

    #[test]
    fn centres_on_the_line_go_to_one_side() {
        let roi = square(10);
        let line = LineSegment::from_coords(3.5, -1.0, 3.5, 11.0);
        let pieces = split_roi(&roi, &line, 32).unwrap().unwrap();
        let mut counts: Vec<usize> = pieces.iter().map(Roi::number_of_points).collect();
        counts.sort();
        assert_eq!(counts, vec![40, 60]);
    }

    #[test]
    fn partial_cut_does_not_split() {
        let roi = square(10);
        let line = LineSegment::from_coords(5.0, -1.0, 5.0, 6.0);
        assert!(split_roi(&roi, &line, 32).unwrap().is_none());
    }

    #[test]
    fn missing_line_does_not_split() {
        let roi = square(4);
        let line = LineSegment::from_coords(20.0, 0.0, 20.0, 10.0);
        assert!(split_roi(&roi, &line, 32).unwrap().is_none());
    }

    #[test]
    fn degenerate_line_is_invalid() {
        let roi = square(4);
        let line = LineSegment::from_coords(1.0, 1.0, 1.0, 1.0);
        assert!(matches!(
            split_roi(&roi, &line, 32),
            Err(RoiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rectangle_shape_is_clipped() {
        let roi = Roi::shape(Shape2D::rectangle(
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 4.0),
        ))
        .unwrap();
        let line = LineSegment::from_coords(-1.0, 2.0, 11.0, 2.0);
        let pieces = split_roi(&roi, &line, 32).unwrap().unwrap();
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            let shape = piece.shape_data().unwrap();
            assert!((shape.area() - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn concave_polygon_goes_through_the_lattice() {
        // U shape: cutting the bottom bar separates the two arms.
        let u = Shape2D::polygon([
            Point2::new(0.0, 0.0),
            Point2::new(6.0, 0.0),
            Point2::new(6.0, 6.0),
            Point2::new(4.0, 6.0),
            Point2::new(4.0, 2.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 6.0),
            Point2::new(0.0, 6.0),
        ]);
        let roi = Roi::shape(u).unwrap();
        let line = LineSegment::from_coords(3.0, -1.0, 3.0, 3.0);
        let pieces = split_roi(&roi, &line, 32).unwrap().unwrap();
        assert_eq!(pieces.len(), 2);
        assert!(pieces.iter().all(|p| p.mask_data().is_some()));
        let total: usize = pieces.iter().map(Roi::number_of_points).sum();
        assert_eq!(total, roi.number_of_points());
    }

    #[test]
    fn stacked_pieces_keep_attachments() {
        let mut roi = Roi::mask(3).unwrap();
        for z in 0..2 {
            for x in 0..4 {
                roi.add_point(Point5::new(x as f64, 0.0, z as f64, 0.0, 0.0))
                    .unwrap();
            }
        }
        roi.set_attachment(Axis::T, Attachment::pinned(2)).unwrap();
        let line = LineSegment::from_coords(2.0, -1.0, 2.0, 2.0);
        let pieces = split_roi(&roi, &line, 32).unwrap().unwrap();
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert_eq!(piece.dimension(), 3);
            assert_eq!(piece.number_of_points(), 4);
            assert_eq!(piece.attachment(Axis::T), Attachment::pinned(2));
            assert_eq!(piece.slices().unwrap().len(), 2);
        }
    }
}
