//! Geometry primitives shared by every pipeline stage.
//!
//! Coordinates are plain `f64` pairs; whether a value is in pixels or in
//! millimeters is tracked by the stage that owns it, never mixed.

use std::ops::{Add, Mul, Sub};

/// 2D point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared distance from the origin
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// One piece of a traced contour.
///
/// The start of each segment is the end of the previous one (or the
/// contour's start point for the first segment).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveSegment {
    /// Two straight edges meeting at `through`
    Corner { through: Point2D, to: Point2D },
    /// Cubic Bezier with control points `c0`, `c1` ending at `c2`
    CubicBezier {
        c0: Point2D,
        c1: Point2D,
        c2: Point2D,
    },
}

impl CurveSegment {
    /// End point of the segment
    pub fn end(&self) -> Point2D {
        match self {
            CurveSegment::Corner { to, .. } => *to,
            CurveSegment::CubicBezier { c2, .. } => *c2,
        }
    }
}

/// Whether a contour adds area or removes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    /// Outer boundary of a filled region
    Positive,
    /// Hole in the most recently opened body
    Negative,
}

/// Closed curve as emitted by a tracer
#[derive(Debug, Clone, PartialEq)]
pub struct SignedContour {
    pub start: Point2D,
    pub segments: Vec<CurveSegment>,
    pub sign: Sign,
}

impl SignedContour {
    pub fn new(start: Point2D, segments: Vec<CurveSegment>, sign: Sign) -> Self {
        Self {
            start,
            segments,
            sign,
        }
    }
}

/// Contour after flattening: a point ring that still carries its sign
#[derive(Debug, Clone, PartialEq)]
pub struct FlatContour {
    pub polygon: Polygon,
    pub sign: Sign,
}

/// Closed ring of points without a closing duplicate
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub points: Vec<Point2D>,
}

impl Polygon {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shoelace signed area. Positive when the ring runs clockwise on screen
    /// (y pointing down).
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        sum / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// Same ring, opposite winding. The first point is kept in place.
    pub fn reversed(&self) -> Polygon {
        let mut points = self.points.clone();
        if points.len() > 1 {
            points[1..].reverse();
        }
        Polygon { points }
    }
}

impl From<Vec<Point2D>> for Polygon {
    fn from(points: Vec<Point2D>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point2D> for Polygon {
    fn from_iter<I: IntoIterator<Item = Point2D>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
