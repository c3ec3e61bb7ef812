//! Integration tests for curve flattening and hole assembly
//!
//! Contours are built by hand so that the expected geometry is known exactly,
//! then pushed through the flattener and the geometry-engine boolean.

use pcb_trace::assemble::assemble_polygons;
use pcb_trace::boolean::GeoBoolean;
use pcb_trace::flatten::{Flattener, bezier_point, flatten_contours};
use pcb_trace::{CurveSegment, Point2D, Polygon, Sign, SignedContour, TraceError};
use std::f64::consts::PI;

// Helper to build an axis-aligned rectangle contour from corner segments
fn rect_contour(x0: f64, y0: f64, x1: f64, y1: f64, sign: Sign) -> SignedContour {
    SignedContour::new(
        Point2D::new(x0, y0),
        vec![
            CurveSegment::Corner {
                through: Point2D::new(x1, y0),
                to: Point2D::new(x1, y1),
            },
            CurveSegment::Corner {
                through: Point2D::new(x0, y1),
                to: Point2D::new(x0, y0),
            },
        ],
        sign,
    )
}

// Helper to build a circle from four cubic arcs
fn circle_contour(cx: f64, cy: f64, r: f64, sign: Sign) -> SignedContour {
    let k = 0.552_284_749_830_793_6 * r;
    let p = |x: f64, y: f64| Point2D::new(cx + x, cy + y);
    SignedContour::new(
        p(r, 0.0),
        vec![
            CurveSegment::CubicBezier {
                c0: p(r, k),
                c1: p(k, r),
                c2: p(0.0, r),
            },
            CurveSegment::CubicBezier {
                c0: p(-k, r),
                c1: p(-r, k),
                c2: p(-r, 0.0),
            },
            CurveSegment::CubicBezier {
                c0: p(-r, -k),
                c1: p(-k, -r),
                c2: p(0.0, -r),
            },
            CurveSegment::CubicBezier {
                c0: p(k, -r),
                c1: p(r, -k),
                c2: p(r, 0.0),
            },
        ],
        sign,
    )
}

fn assemble(contours: &[SignedContour]) -> Result<Vec<Polygon>, TraceError> {
    let flat = flatten_contours(contours, 0.25)?;
    assemble_polygons(&flat, &GeoBoolean)
}

fn total_area(polygons: &[Polygon]) -> f64 {
    polygons.iter().map(|p| p.area()).sum()
}

// ============================================================================
// Flattening Tests
// ============================================================================

#[test]
fn test_flattened_circle_stays_within_tolerance() {
    let delta = 0.25;
    let flattener = Flattener::new(delta).unwrap();
    let (p1, p2, p3, p4) = (
        Point2D::new(100.0, 0.0),
        Point2D::new(100.0, 55.2284749831),
        Point2D::new(55.2284749831, 100.0),
        Point2D::new(0.0, 100.0),
    );

    let mut points = vec![p1];
    points.extend(flattener.flatten_cubic(p1, p2, p3, p4));
    assert_eq!(*points.last().unwrap(), p4, "end point must be exact");

    // Every sample of the true curve must be close to the emitted polyline
    for i in 0..=2000 {
        let q = bezier_point(i as f64 / 2000.0, p1, p2, p3, p4);
        let nearest = points
            .windows(2)
            .map(|w| distance_to_segment(q, w[0], w[1]))
            .fold(f64::INFINITY, f64::min);
        assert!(nearest <= delta + 1e-9, "deviation {} at sample {}", nearest, i);
    }
}

fn distance_to_segment(p: Point2D, a: Point2D, b: Point2D) -> f64 {
    let ab = b - a;
    let len = ab.length_squared();
    if len == 0.0 {
        return (p - a).length_squared().sqrt();
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len).clamp(0.0, 1.0);
    (p - (a + ab * t)).length_squared().sqrt()
}

#[test]
fn test_flattening_is_reproducible() {
    let contours = vec![circle_contour(50.0, 50.0, 40.0, Sign::Positive)];
    let a = flatten_contours(&contours, 0.1).unwrap();
    let b = flatten_contours(&contours, 0.1).unwrap();
    assert_eq!(a, b);
}

// ============================================================================
// Assembly Tests
// ============================================================================

#[test]
fn test_annulus_area() {
    let polygons = assemble(&[
        circle_contour(0.0, 0.0, 100.0, Sign::Positive),
        circle_contour(0.0, 0.0, 50.0, Sign::Negative),
    ])
    .unwrap();

    assert_eq!(polygons.len(), 1);
    let expected = PI * (100.0 * 100.0 - 50.0 * 50.0);
    let area = total_area(&polygons);
    assert!(
        (area - expected).abs() / expected < 0.01,
        "annulus area {} too far from {}",
        area,
        expected
    );
}

#[test]
fn test_two_holes_in_one_body() {
    let polygons = assemble(&[
        rect_contour(0.0, 0.0, 30.0, 10.0, Sign::Positive),
        rect_contour(2.0, 2.0, 8.0, 8.0, Sign::Negative),
        rect_contour(12.0, 2.0, 18.0, 8.0, Sign::Negative),
    ])
    .unwrap();

    assert_eq!(polygons.len(), 1);
    assert!((total_area(&polygons) - (300.0 - 72.0)).abs() < 1e-6);
}

#[test]
fn test_splitting_hole_leaves_fragments() {
    let polygons = assemble(&[
        rect_contour(0.0, 0.0, 10.0, 10.0, Sign::Positive),
        rect_contour(4.0, -1.0, 6.0, 11.0, Sign::Negative),
    ])
    .unwrap();

    assert_eq!(polygons.len(), 2, "bar should cut the square in two");
    assert!((total_area(&polygons) - 80.0).abs() < 1e-6);
}

#[test]
fn test_hole_after_split_is_cut_from_its_piece() {
    let polygons = assemble(&[
        rect_contour(0.0, 0.0, 10.0, 10.0, Sign::Positive),
        rect_contour(4.0, -1.0, 6.0, 11.0, Sign::Negative),
        rect_contour(1.0, 1.0, 2.0, 2.0, Sign::Negative),
    ])
    .unwrap();

    assert_eq!(polygons.len(), 2);
    assert!(
        (total_area(&polygons) - 79.0).abs() < 1e-6,
        "small hole should be removed from the left piece, got area {}",
        total_area(&polygons)
    );
}

#[test]
fn test_hole_after_erasing_hole_is_malformed() {
    let err = assemble(&[
        rect_contour(0.0, 0.0, 10.0, 10.0, Sign::Positive),
        rect_contour(-1.0, -1.0, 11.0, 11.0, Sign::Negative),
        rect_contour(1.0, 1.0, 2.0, 2.0, Sign::Negative),
    ])
    .unwrap_err();

    assert!(matches!(err, TraceError::MalformedContourSequence { index: 2 }));
}

#[test]
fn test_covering_hole_erases_body() {
    let polygons = assemble(&[
        rect_contour(0.0, 0.0, 10.0, 10.0, Sign::Positive),
        rect_contour(-1.0, -1.0, 11.0, 11.0, Sign::Negative),
        rect_contour(20.0, 0.0, 25.0, 5.0, Sign::Positive),
    ])
    .unwrap();

    assert_eq!(polygons.len(), 1);
    assert_eq!(polygons[0].area(), 25.0);
}

#[test]
fn test_leading_hole_is_malformed() {
    let err = assemble(&[
        rect_contour(0.0, 0.0, 10.0, 10.0, Sign::Negative),
        rect_contour(0.0, 0.0, 10.0, 10.0, Sign::Positive),
    ])
    .unwrap_err();

    assert!(matches!(err, TraceError::MalformedContourSequence { index: 0 }));
}

#[test]
fn test_bodies_without_holes_keep_order_and_winding() {
    let contours = [
        rect_contour(0.0, 0.0, 1.0, 1.0, Sign::Positive),
        rect_contour(5.0, 5.0, 7.0, 7.0, Sign::Positive),
    ];
    let flat = flatten_contours(&contours, 0.25).unwrap();
    let polygons = assemble(&contours).unwrap();

    assert_eq!(polygons[0], flat[0].polygon);
    assert_eq!(polygons[1], flat[1].polygon);
}
