//! Polygon boolean operations
//!
//! The assembler only needs two operations on simple rings, so they sit
//! behind [`PolygonBoolean`] and can be faked in tests. [`GeoBoolean`] is the
//! production engine, built on the `geo` crate.
//!
//! `geo` returns polygons with interior rings; footprint polygons cannot
//! carry holes, so each interior ring is stitched into the exterior with a
//! zero-width horizontal slit ("keyhole").

use crate::types::{Point2D, Polygon};
use geo::{BooleanOps, Coord, LineString, MultiPolygon};

/// Result of a boolean operation; the error is a human-readable reason
pub type BooleanResult = Result<Vec<Polygon>, String>;

/// Boolean operations on simple closed rings
pub trait PolygonBoolean {
    /// `body` minus `hole`. May yield several disjoint pieces, or none.
    fn subtract(&self, body: &Polygon, hole: &Polygon) -> BooleanResult;

    /// `a` or `b`. Yields more than one polygon when they are disjoint.
    fn union(&self, a: &Polygon, b: &Polygon) -> BooleanResult;
}

/// Boolean engine backed by `geo::BooleanOps`
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoBoolean;

impl PolygonBoolean for GeoBoolean {
    fn subtract(&self, body: &Polygon, hole: &Polygon) -> BooleanResult {
        let body = to_geo(body)?;
        let hole = to_geo(hole)?;
        from_geo(&body.difference(&hole))
    }

    fn union(&self, a: &Polygon, b: &Polygon) -> BooleanResult {
        let a = to_geo(a)?;
        let b = to_geo(b)?;
        from_geo(&a.union(&b))
    }
}

fn to_geo(poly: &Polygon) -> Result<geo::Polygon<f64>, String> {
    if poly.len() < 3 {
        return Err(format!("polygon has {} points, need at least 3", poly.len()));
    }
    if poly.points.iter().any(|p| !p.is_finite()) {
        return Err("polygon has non-finite coordinates".to_string());
    }

    let mut ring: Vec<Coord<f64>> = poly.points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied())
        && first != last
    {
        ring.push(first);
    }

    Ok(geo::Polygon::new(LineString::new(ring), vec![]))
}

fn from_geo(multi: &MultiPolygon<f64>) -> BooleanResult {
    let mut out = Vec::with_capacity(multi.0.len());
    for poly in &multi.0 {
        let exterior = open_ring(poly.exterior());
        if exterior.len() < 3 {
            continue;
        }
        let holes: Vec<Vec<Point2D>> = poly
            .interiors()
            .iter()
            .map(open_ring)
            .filter(|h| h.len() >= 3)
            .collect();
        out.push(Polygon::new(keyhole(exterior, holes)?));
    }
    Ok(out)
}

/// Ring without its closing duplicate
fn open_ring(ring: &LineString<f64>) -> Vec<Point2D> {
    let mut points: Vec<Point2D> = ring.coords().map(|c| Point2D::new(c.x, c.y)).collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// Join holes into an outer ring through zero-width bridges.
///
/// Holes are merged in order of their leftmost vertex; each is connected to
/// the nearest edge hit by a ray cast left from that vertex. Holes merged
/// earlier become part of the ring, so later rays cannot cross them.
pub fn keyhole(outer: Vec<Point2D>, mut holes: Vec<Vec<Point2D>>) -> Result<Vec<Point2D>, String> {
    if holes.is_empty() {
        return Ok(outer);
    }

    let outer_area = signed_area(&outer);
    holes.sort_by(|a, b| leftmost(a).1.x.total_cmp(&leftmost(b).1.x));

    let mut ring = outer;
    for hole in holes {
        let (h_idx, h) = leftmost(&hole);

        let mut best: Option<(usize, f64)> = None;
        let n = ring.len();
        for i in 0..n {
            let a = ring[i];
            let b = ring[(i + 1) % n];
            if (a.y > h.y) == (b.y > h.y) {
                continue;
            }
            let x = a.x + (h.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if x <= h.x && best.is_none_or(|(_, bx)| x > bx) {
                best = Some((i, x));
            }
        }

        let Some((edge, x)) = best else {
            return Err(format!("hole at ({}, {}) lies outside its ring", h.x, h.y));
        };

        let bridge = Point2D::new(x, h.y);
        let next = (edge + 1) % n;
        let anchor = if ring[edge] == bridge {
            edge
        } else if ring[next] == bridge {
            next
        } else {
            ring.insert(edge + 1, bridge);
            edge + 1
        };

        // walk the hole starting at its bridge vertex, against the outer winding
        let mut walk: Vec<Point2D> = hole[h_idx..].iter().chain(&hole[..h_idx]).copied().collect();
        if (signed_area(&hole) > 0.0) == (outer_area > 0.0) {
            walk[1..].reverse();
        }
        walk.push(h);
        walk.push(ring[anchor]);

        ring.splice(anchor + 1..anchor + 1, walk);
    }

    ring.dedup();
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    Ok(ring)
}

fn leftmost(points: &[Point2D]) -> (usize, Point2D) {
    let mut idx = 0;
    for (i, p) in points.iter().enumerate() {
        let q = points[idx];
        if p.x < q.x || (p.x == q.x && p.y < q.y) {
            idx = i;
        }
    }
    (idx, points[idx])
}

fn signed_area(points: &[Point2D]) -> f64 {
    Polygon::new(points.to_vec()).signed_area()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
        Polygon::new(vec![
            Point2D::new(x0, y0),
            Point2D::new(x1, y0),
            Point2D::new(x1, y1),
            Point2D::new(x0, y1),
        ])
    }

    #[test]
    fn test_subtract_inner_hole_gives_single_keyhole_ring() {
        let result = GeoBoolean
            .subtract(&rect(0.0, 0.0, 10.0, 10.0), &rect(3.0, 3.0, 7.0, 7.0))
            .unwrap();
        assert_eq!(result.len(), 1);
        assert!((result[0].area() - 84.0).abs() < 1e-3);
    }

    #[test]
    fn test_subtract_splitting_hole_gives_two_pieces() {
        let result = GeoBoolean
            .subtract(&rect(0.0, 0.0, 10.0, 10.0), &rect(4.0, -1.0, 6.0, 11.0))
            .unwrap();
        assert_eq!(result.len(), 2);
        let total: f64 = result.iter().map(|p| p.area()).sum();
        assert!((total - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_subtract_covering_hole_leaves_nothing() {
        let result = GeoBoolean
            .subtract(&rect(1.0, 1.0, 2.0, 2.0), &rect(0.0, 0.0, 3.0, 3.0))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_union_overlapping_and_disjoint() {
        let merged = GeoBoolean
            .union(&rect(0.0, 0.0, 2.0, 2.0), &rect(1.0, 0.0, 3.0, 2.0))
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert!((merged[0].area() - 6.0).abs() < 1e-3);

        let apart = GeoBoolean
            .union(&rect(0.0, 0.0, 1.0, 1.0), &rect(5.0, 5.0, 6.0, 6.0))
            .unwrap();
        assert_eq!(apart.len(), 2);
    }

    #[test]
    fn test_degenerate_input_is_error() {
        let line = Polygon::new(vec![Point2D::new(0.0, 0.0), Point2D::new(1.0, 1.0)]);
        assert!(GeoBoolean.subtract(&line, &rect(0.0, 0.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn test_keyhole_bridges_to_left_edge() {
        let outer = rect(0.0, 0.0, 10.0, 10.0).points;
        let hole = rect(4.0, 4.0, 6.0, 6.0).points;
        let ring = keyhole(outer, vec![hole]).unwrap();

        // outer 4 + bridge 2 + hole 4 + hole start repeated 1
        assert_eq!(ring.len(), 11);
        assert!(ring.contains(&Point2D::new(0.0, 4.0)));
        assert!((Polygon::new(ring).area() - 96.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyhole_two_holes_keeps_area() {
        let outer = rect(0.0, 0.0, 20.0, 10.0).points;
        let holes = vec![
            rect(12.0, 2.0, 16.0, 6.0).points,
            rect(2.0, 2.0, 6.0, 8.0).points,
        ];
        let ring = keyhole(outer, holes).unwrap();
        assert!((Polygon::new(ring).area() - (200.0 - 16.0 - 24.0)).abs() < 1e-9);
    }
}
