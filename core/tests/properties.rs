use std::collections::BTreeSet;

use hyperroi_core::roi::{Attachment, SliceKind};
use hyperroi_core::{Axis, LineSegment, Point5, Roi, RoiError, split_roi};

/// Small deterministic generator so failures reproduce.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: i32) -> i32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as i32
    }
}

fn scattered(seed: u64, dimension: usize, count: usize) -> Roi {
    let mut rng = Lcg(seed);
    let mut roi = Roi::mask(dimension).unwrap();
    roi.batch(|roi| {
        for _ in 0..count {
            let z = if dimension > 2 { rng.next(4) } else { 0 };
            let p = Point5::new(rng.next(12) as f64, rng.next(12) as f64, z as f64, 0.0, 0.0);
            roi.add_point(p).unwrap();
        }
    });
    roi
}

fn cells(roi: &Roi) -> BTreeSet<[i32; 5]> {
    roi.lattice_points().unwrap().into_iter().collect()
}

// ---------------------------------------------------------------------------
// Bounds optimisation
// ---------------------------------------------------------------------------

#[test]
fn optimized_stack_has_no_empty_slices_and_tight_span() {
    let mut roi = Roi::mask(3).unwrap();
    for z in [1, 4, 7] {
        roi.add_point(Point5::new(2.0, 2.0, z as f64, 0.0, 0.0))
            .unwrap();
    }
    roi.remove_point(Point5::new(2.0, 2.0, 4.0, 0.0, 0.0))
        .unwrap();
    assert_eq!(roi.slices().unwrap().len(), 3);

    roi.optimize_bounds().unwrap();
    let stack = roi.slices().unwrap();
    assert_eq!(stack.indices().collect::<Vec<_>>(), vec![1, 7]);
    assert!(stack.iter().all(|(_, slice)| !slice.is_empty()));
    assert_eq!(roi.bounds().index_span(Axis::Z), Some(1..=7));
    assert_eq!(roi.bounds().index_span(Axis::X), Some(2..=2));
}

#[test]
fn optimizing_keeps_membership() {
    let mut roi = scattered(7, 3, 60);
    let before = cells(&roi);
    roi.optimize_bounds().unwrap();
    assert_eq!(cells(&roi), before);
}

// ---------------------------------------------------------------------------
// Set algebra
// ---------------------------------------------------------------------------

#[test]
fn union_membership_matches_either_operand() {
    for seed in 1..6 {
        let a = scattered(seed, 3, 40);
        let b = scattered(seed * 31, 3, 40);
        let u = Roi::union(&a, &b).unwrap();
        for x in 0..12 {
            for y in 0..12 {
                for z in 0..4 {
                    let p = Point5::new(x as f64, y as f64, z as f64, 0.0, 0.0);
                    assert_eq!(u.contains(&p), a.contains(&p) || b.contains(&p));
                }
            }
        }
    }
}

#[test]
fn union_is_commutative_and_associative() {
    let a = scattered(11, 2, 30);
    let b = scattered(12, 2, 30);
    let c = scattered(13, 2, 30);

    assert_eq!(
        cells(&Roi::union(&a, &b).unwrap()),
        cells(&Roi::union(&b, &a).unwrap())
    );
    let left = Roi::union(&Roi::union(&a, &b).unwrap(), &c).unwrap();
    let right = Roi::union(&a, &Roi::union(&b, &c).unwrap()).unwrap();
    assert_eq!(cells(&left), cells(&right));
}

#[test]
fn intersection_and_subtraction_partition_the_left_operand() {
    let a = scattered(21, 3, 50);
    let b = scattered(22, 3, 50);
    let both = cells(&Roi::intersection(&a, &b).unwrap());
    let only_a = cells(&Roi::subtraction(&a, &b).unwrap());

    assert!(both.is_disjoint(&only_a));
    let rebuilt: BTreeSet<_> = both.union(&only_a).copied().collect();
    assert_eq!(rebuilt, cells(&a));
}

#[test]
fn combining_different_dimensions_is_rejected() {
    let a = Roi::mask(2).unwrap();
    let b = Roi::mask(3).unwrap();
    assert!(matches!(
        Roi::union(&a, &b),
        Err(RoiError::InvalidArgument(_))
    ));
}

#[test]
fn differently_pinned_operands_are_rejected() {
    let mut a = scattered(41, 2, 20);
    let mut b = scattered(42, 2, 20);
    a.set_attachment(Axis::T, Attachment::pinned(0)).unwrap();
    b.set_attachment(Axis::T, Attachment::pinned(1)).unwrap();

    assert!(matches!(Roi::union(&a, &b), Err(RoiError::InvalidArgument(_))));
    assert!(matches!(
        Roi::intersection(&a, &b),
        Err(RoiError::InvalidArgument(_))
    ));
    assert!(matches!(
        Roi::subtraction(&a, &b),
        Err(RoiError::InvalidArgument(_))
    ));

    // Pinned on one side only is still a mismatch.
    b.set_attachment(Axis::T, Attachment::UNIVERSAL).unwrap();
    assert!(matches!(Roi::union(&a, &b), Err(RoiError::InvalidArgument(_))));
}

#[test]
fn identically_pinned_operands_keep_membership() {
    for seed in 1..4 {
        let mut a = scattered(seed, 3, 30);
        let mut b = scattered(seed * 17, 3, 30);
        for roi in [&mut a, &mut b] {
            roi.set_attachment(Axis::T, Attachment::pinned(1)).unwrap();
            roi.set_attachment(Axis::C, Attachment::pinned(0)).unwrap();
        }
        let u = Roi::union(&a, &b).unwrap();
        let both = Roi::intersection(&a, &b).unwrap();
        let only_a = Roi::subtraction(&a, &b).unwrap();
        for x in 0..12 {
            for y in 0..12 {
                for z in 0..4 {
                    for t in 0..3 {
                        let p = Point5::new(x as f64, y as f64, z as f64, t as f64, 0.0);
                        let (in_a, in_b) = (a.contains(&p), b.contains(&p));
                        assert_eq!(u.contains(&p), in_a || in_b);
                        assert_eq!(both.contains(&p), in_a && in_b);
                        assert_eq!(only_a.contains(&p), in_a && !in_b);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

#[test]
fn pinned_axis_limits_membership() {
    let mut roi = Roi::mask(3).unwrap();
    roi.add_point(Point5::new(1.0, 1.0, 0.0, 0.0, 0.0)).unwrap();
    roi.set_attachment(Axis::C, Attachment::pinned(2)).unwrap();

    assert!(roi.is_active_for(Axis::C, 2));
    assert!(!roi.is_active_for(Axis::C, 0));
    assert!(roi.is_active_for(Axis::T, 9));
    assert!(roi.contains(&Point5::new(1.0, 1.0, 0.0, 5.0, 2.0)));
    assert!(!roi.contains(&Point5::new(1.0, 1.0, 0.0, 5.0, 1.0)));
    assert_eq!(roi.bounds().index_span(Axis::C), Some(2..=2));
    assert!(roi.bounds().is_infinite(Axis::T));
}

#[test]
fn spanned_axes_cannot_be_attached() {
    let mut roi = Roi::stack(4, SliceKind::Mask).unwrap();
    assert!(matches!(
        roi.set_attachment(Axis::Z, Attachment::pinned(1)),
        Err(RoiError::InvalidArgument(_))
    ));
    assert_eq!(roi.attachment(Axis::T), Attachment::UNIVERSAL);
    roi.set_attachment(Axis::C, Attachment::pinned(0)).unwrap();
    let slice = roi.get_slice_mut(3, true).unwrap().unwrap();
    assert_eq!(slice.attachment(Axis::C), Attachment::pinned(0));
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

#[test]
fn bisected_square_pieces_are_disjoint_and_cover_it() {
    let mut square = Roi::mask(2).unwrap();
    for x in 0..10 {
        for y in 0..10 {
            square.add_point(Point5::xy(x as f64, y as f64)).unwrap();
        }
    }
    let line = LineSegment::from_coords(5.0, -5.0, 5.0, 15.0);
    let pieces = split_roi(&square, &line, 64).unwrap().unwrap();

    assert_eq!(pieces.len(), 2);
    assert!(pieces.iter().all(|p| p.number_of_points() == 50));
    assert!(Roi::intersection(&pieces[0], &pieces[1]).unwrap().is_empty());
    let whole = Roi::union(&pieces[0], &pieces[1]).unwrap();
    assert_eq!(whole.number_of_points(), 100);
    assert_eq!(cells(&whole), cells(&square));
}
