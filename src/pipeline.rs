//! Raster to footprint conversion
//!
//! The conversion process:
//! 1. Flatten alpha over white and threshold into a two-level bitmap
//! 2. Trace the bitmap into signed contours
//! 3. Flatten curves into polygons
//! 4. Subtract holes from their bodies
//! 5. Scale to millimeters (optionally centered on the image)
//! 6. Serialize as a KiCad footprint

use crate::assemble::assemble_polygons;
use crate::bitmap::prepare_image;
use crate::boolean::GeoBoolean;
use crate::error::{Result, TraceError};
use crate::flatten::flatten_contours;
use crate::footprint::{Footprint, IdSource, RandomIds, serialize_footprint};
use crate::mapping::{dpmm_for_dpi, map_polygons};
use crate::tracer::TracerKind;
use crate::types::{Point2D, Polygon};
use image::{DynamicImage, GenericImageView, ImageReader};
use rayon::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Board layer a footprint is drawn on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Layer {
    #[default]
    #[value(name = "F.SilkS")]
    FrontSilkscreen,
    #[value(name = "B.SilkS")]
    BackSilkscreen,
    #[value(name = "F.Cu")]
    FrontCopper,
    #[value(name = "B.Cu")]
    BackCopper,
    #[value(name = "F.Mask")]
    FrontMask,
    #[value(name = "B.Mask")]
    BackMask,
    #[value(name = "User.Drawings")]
    UserDrawings,
    #[value(name = "User.Comments")]
    UserComments,
}

impl Layer {
    pub const ALL: [Layer; 8] = [
        Layer::FrontSilkscreen,
        Layer::BackSilkscreen,
        Layer::FrontCopper,
        Layer::BackCopper,
        Layer::FrontMask,
        Layer::BackMask,
        Layer::UserDrawings,
        Layer::UserComments,
    ];

    /// KiCad layer name
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::FrontSilkscreen => "F.SilkS",
            Layer::BackSilkscreen => "B.SilkS",
            Layer::FrontCopper => "F.Cu",
            Layer::BackCopper => "B.Cu",
            Layer::FrontMask => "F.Mask",
            Layer::BackMask => "B.Mask",
            Layer::UserDrawings => "User.Drawings",
            Layer::UserComments => "User.Comments",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Layer::ALL
            .into_iter()
            .find(|layer| layer.as_str() == s)
            .ok_or_else(|| format!("unknown layer '{}'", s))
    }
}

/// Options for tracing an image into a footprint
#[derive(Debug, Clone)]
pub struct TraceOptions {
    /// Trace the light parts of the image instead of the dark ones
    pub invert: bool,
    /// Gray level (0-255) separating light from dark (default: 127)
    pub threshold: u8,
    /// Image resolution in dots per inch (default: 2540)
    pub dpi: f64,
    pub layer: Layer,
    /// Put the origin at the image center instead of the top-left corner
    pub center: bool,
    /// Footprint position on the board, in millimeters
    pub placement: Point2D,
    /// Maximum curve flattening error in pixels (default: 0.25)
    pub bezier_resolution: f64,
    /// Drop regions of at most this many pixels (0 keeps everything)
    pub turd_size: u32,
    /// Footprint name
    pub name: String,
    pub tracer: TracerKind,
}

impl Default for TraceOptions {
    fn default() -> Self {
        Self {
            invert: false,
            threshold: 127,
            dpi: 2540.0,
            layer: Layer::default(),
            center: true,
            placement: Point2D::default(),
            bezier_resolution: 0.25,
            turd_size: 0,
            name: "Graphics".to_string(),
            tracer: TracerKind::default(),
        }
    }
}

/// Trace an image into final pixel-space polygons, holes already subtracted
pub fn trace_polygons(image: &DynamicImage, options: &TraceOptions) -> Result<Vec<Polygon>> {
    let (width, height) = image.dimensions();
    info!(
        width,
        height,
        threshold = options.threshold,
        invert = options.invert,
        "tracing image"
    );

    let bitmap = prepare_image(image, options.threshold, options.invert)?;

    let contours = options.tracer.tracer().trace(&bitmap, options.turd_size)?;
    debug!(contours = contours.len(), tracer = ?options.tracer, "traced contours");

    let flat = flatten_contours(&contours, options.bezier_resolution)?;
    let polygons = assemble_polygons(&flat, &GeoBoolean)?;
    debug!(polygons = polygons.len(), "assembled polygons");

    Ok(polygons)
}

/// Trace an image into a footprint in board coordinates
pub fn trace_footprint(image: &DynamicImage, options: &TraceOptions) -> Result<Footprint> {
    let dpmm = dpmm_for_dpi(options.dpi)?;
    let polygons = trace_polygons(image, options)?;

    let (width, height) = image.dimensions();
    let mapped = map_polygons(&polygons, width, height, dpmm, options.center)?;
    info!(
        polygons = mapped.len(),
        dpi = options.dpi,
        layer = %options.layer,
        "mapped to board coordinates"
    );

    Ok(Footprint::new(
        &options.name,
        options.layer.as_str(),
        options.placement,
        mapped,
    ))
}

/// Trace an image into footprint text, drawing `tstamp` ids from `ids`
pub fn trace_with_ids(
    image: &DynamicImage,
    options: &TraceOptions,
    ids: &mut dyn IdSource,
) -> Result<String> {
    let footprint = trace_footprint(image, options)?;
    serialize_footprint(&footprint, ids)
}

/// Trace an image into footprint text.
///
/// Fails with [`TraceError::EmptyFootprint`] when nothing on the image
/// falls on the traced side of the threshold.
pub fn trace(image: &DynamicImage, options: &TraceOptions) -> Result<String> {
    trace_with_ids(image, options, &mut RandomIds)
}

/// Trace an encoded image (PNG, JPEG) held in memory
pub fn trace_bytes(image_bytes: &[u8], options: &TraceOptions) -> Result<String> {
    let img = ImageReader::new(Cursor::new(image_bytes))
        .with_guessed_format()?
        .decode()?;
    trace(&img, options)
}

/// Trace an image file
pub fn trace_file<P: AsRef<Path>>(path: P, options: &TraceOptions) -> Result<String> {
    let img = ImageReader::open(path.as_ref())?.decode()?;
    trace(&img, options)
}

/// Per-layer overrides for a batch conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerJob {
    pub layer: Layer,
    pub invert: bool,
    pub threshold: u8,
}

impl LayerJob {
    pub fn new(layer: Layer) -> Self {
        Self {
            layer,
            invert: false,
            threshold: TraceOptions::default().threshold,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert = !self.invert;
        self
    }
}

/// Outcome of one layer in [`trace_layers`]
#[derive(Debug)]
pub struct LayerOutcome {
    pub layer: Layer,
    pub result: Result<String>,
}

/// Trace the same image once per job, in parallel.
///
/// Every job gets its own pipeline run; a failing layer is reported in its
/// outcome and does not affect the others. Outcomes are in job order.
pub fn trace_layers(
    image: &DynamicImage,
    base: &TraceOptions,
    jobs: &[LayerJob],
) -> Vec<LayerOutcome> {
    jobs.par_iter()
        .map(|job| {
            let options = TraceOptions {
                layer: job.layer,
                invert: job.invert,
                threshold: job.threshold,
                ..base.clone()
            };
            let result = trace(image, &options);
            match &result {
                Err(TraceError::EmptyFootprint) => {
                    warn!(layer = %job.layer, "layer is empty, skipping")
                }
                Err(e) => warn!(layer = %job.layer, error = %e, "layer failed"),
                Ok(_) => debug!(layer = %job.layer, "layer done"),
            }
            LayerOutcome {
                layer: job.layer,
                result,
            }
        })
        .collect()
}
