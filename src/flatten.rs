//! Curve flattening
//!
//! Approximates cubic Bezier segments by straight runs whose deviation from
//! the true curve stays under a fixed bound. The step size follows the
//! curvature rule used by KiCad's bitmap2component: the second derivative of
//! a cubic peaks at an endpoint, so one interval fits the whole segment.
//! Output must stay point-for-point identical to that rule, since vertex
//! counts end up in reference footprint files.

use crate::error::{Result, Stage, TraceError};
use crate::types::{CurveSegment, FlatContour, Point2D, Polygon, SignedContour};

/// Flattens curves within a maximum chordal deviation `delta`
#[derive(Debug, Clone, Copy)]
pub struct Flattener {
    delta: f64,
}

impl Flattener {
    pub fn new(delta: f64) -> Result<Self> {
        if !(delta.is_finite() && delta > 0.0) {
            return Err(TraceError::geometry(
                Stage::Flatten,
                0,
                format!("deviation bound must be positive, got {}", delta),
            ));
        }
        Ok(Self { delta })
    }

    /// Parameter step for the curve `p1..p4`
    pub fn interval(&self, p1: Point2D, p2: Point2D, p3: Point2D, p4: Point2D) -> f64 {
        let dd0 = (p1.x - 2.0 * p2.x + p3.x).powf(2.0) + (p1.y - 2.0 * p2.y + p3.y).powf(2.0);
        let dd1 = (p2.x - 2.0 * p3.x + p4.x).powf(2.0) + (p2.y - 2.0 * p3.y + p4.y).powf(2.0);
        let dd = 6.0 * dd0.max(dd1).sqrt();
        let e2 = if 8.0 * self.delta <= dd {
            8.0 * self.delta / dd
        } else {
            1.0
        };
        e2.sqrt()
    }

    /// Points approximating the curve, excluding `p1` and ending exactly at `p4`
    pub fn flatten_cubic(
        &self,
        p1: Point2D,
        p2: Point2D,
        p3: Point2D,
        p4: Point2D,
    ) -> Vec<Point2D> {
        let mut out = Vec::new();
        self.flatten_cubic_into(p1, p2, p3, p4, &mut out);
        out
    }

    pub fn flatten_cubic_into(
        &self,
        p1: Point2D,
        p2: Point2D,
        p3: Point2D,
        p4: Point2D,
        out: &mut Vec<Point2D>,
    ) {
        let interval = self.interval(p1, p2, p3, p4);
        // Same sample count as a half-open range over [0, 1) with this step
        let steps = (1.0 / interval).ceil() as usize;

        for i in 1..steps {
            let t = i as f64 * interval;
            out.push(bezier_point(t, p1, p2, p3, p4));
        }

        out.push(p4);
    }
}

/// Evaluate a cubic Bezier curve at parameter t
pub fn bezier_point(t: f64, p1: Point2D, p2: Point2D, p3: Point2D, p4: Point2D) -> Point2D {
    let mt = 1.0 - t;
    let x = p1.x * mt.powf(3.0)
        + 3.0 * p2.x * mt.powf(2.0) * t
        + 3.0 * p3.x * mt * t.powf(2.0)
        + p4.x * t.powf(3.0);
    let y = p1.y * mt.powf(3.0)
        + 3.0 * p2.y * mt.powf(2.0) * t
        + 3.0 * p3.y * mt * t.powf(2.0)
        + p4.y * t.powf(3.0);
    Point2D::new(x, y)
}

/// Reduce a traced contour to a point ring.
///
/// `index` is the contour's position in emission order and is only used for
/// error reporting.
pub fn flatten_contour(
    contour: &SignedContour,
    flattener: &Flattener,
    index: usize,
) -> Result<FlatContour> {
    let mut points = vec![contour.start];
    let mut last = contour.start;

    for segment in &contour.segments {
        match *segment {
            CurveSegment::Corner { through, to } => {
                points.push(through);
                points.push(to);
            }
            CurveSegment::CubicBezier { c0, c1, c2 } => {
                if last == c0 && c1 == c2 {
                    // straight line encoded as a cubic
                    points.push(c2);
                } else {
                    flattener.flatten_cubic_into(last, c0, c1, c2, &mut points);
                }
            }
        }
        last = segment.end();
    }

    if points.len() > 1 && points.last() == points.first() {
        points.pop();
    }

    if points.len() < 3 {
        return Err(TraceError::geometry(
            Stage::Flatten,
            index,
            format!("contour flattened to {} points", points.len()),
        ));
    }
    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(TraceError::geometry(
            Stage::Flatten,
            index,
            format!("non-finite point ({}, {})", bad.x, bad.y),
        ));
    }

    Ok(FlatContour {
        polygon: Polygon::new(points),
        sign: contour.sign,
    })
}

/// Flatten every contour, keeping emission order
pub fn flatten_contours(contours: &[SignedContour], delta: f64) -> Result<Vec<FlatContour>> {
    let flattener = Flattener::new(delta)?;
    contours
        .iter()
        .enumerate()
        .map(|(i, c)| flatten_contour(c, &flattener, i))
        .collect()
}
