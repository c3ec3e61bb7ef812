//! Pixel to board coordinate mapping

use crate::error::{Result, Stage, TraceError};
use crate::types::{Point2D, Polygon};

/// Millimeters per pixel at the given resolution
pub fn dpmm_for_dpi(dpi: f64) -> Result<f64> {
    if !(dpi.is_finite() && dpi > 0.0) {
        return Err(TraceError::InvalidImage(format!(
            "dpi must be positive, got {}",
            dpi
        )));
    }
    Ok(25.4 / dpi)
}

/// Map pixel-space polygons to millimeters.
///
/// With `center`, the image center becomes the origin. Placement is not
/// applied here; the serializer writes it once as the footprint position.
pub fn map_polygons(
    polygons: &[Polygon],
    width: u32,
    height: u32,
    dpmm: f64,
    center: bool,
) -> Result<Vec<Polygon>> {
    let offset = if center {
        Point2D::new(-(width as f64) / 2.0, -(height as f64) / 2.0)
    } else {
        Point2D::default()
    };

    polygons
        .iter()
        .enumerate()
        .map(|(index, poly)| {
            if poly.len() < 3 {
                return Err(TraceError::geometry(
                    Stage::Mapping,
                    index,
                    format!("polygon has {} points", poly.len()),
                ));
            }
            Ok(poly
                .points
                .iter()
                .map(|p| Point2D::new((p.x + offset.x) * dpmm, (p.y + offset.y) * dpmm))
                .collect())
        })
        .collect()
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    /// Empty bounds; invalid until a point is added
    pub fn new() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    pub fn update(&mut self, p: Point2D) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn is_valid(&self) -> bool {
        self.min_x.is_finite() && self.min_y.is_finite()
    }

    /// Overlap test; boxes that only share an edge count as touching
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// Combined bounds of a set of polygons
pub fn polygons_bounds(polygons: &[Polygon]) -> Bounds {
    let mut bounds = Bounds::default();
    for p in polygons.iter().flat_map(|poly| poly.points.iter()) {
        bounds.update(*p);
    }
    bounds
}
