//! Two-level bitmap generation
//!
//! Flattens artwork onto a white background, reduces it to grayscale and
//! thresholds it into foreground/background cells for the tracer.

use crate::error::{Result, TraceError};
use image::{DynamicImage, GrayImage, Rgb, RgbImage, Rgba};
use tracing::debug;

/// Binary image, row-major, `true` marks foreground
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl Bitmap {
    /// Create an all-background bitmap
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TraceError::InvalidImage(format!(
                "bitmap dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        Ok(Self {
            width,
            height,
            cells: vec![false; width as usize * height as usize],
        })
    }

    /// Build a bitmap from row-major cells
    pub fn from_cells(width: u32, height: u32, cells: Vec<bool>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(TraceError::InvalidImage(format!(
                "bitmap dimensions must be non-zero, got {}x{}",
                width, height
            )));
        }
        if cells.len() != width as usize * height as usize {
            return Err(TraceError::InvalidImage(format!(
                "expected {} cells for {}x{}, got {}",
                width as usize * height as usize,
                width,
                height,
                cells.len()
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    /// Number of foreground cells
    pub fn count_foreground(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// Threshold a single-channel image.
///
/// A pixel is foreground when it is at or under `threshold`; `invert` flips
/// the polarity.
pub fn threshold_image(image: &GrayImage, threshold: u8, invert: bool) -> Result<Bitmap> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TraceError::InvalidImage(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }

    debug!(threshold, invert, "applying threshold");

    let cells = image
        .pixels()
        .map(|px| (px.0[0] > threshold) == invert)
        .collect();

    Bitmap::from_cells(width, height, cells)
}

/// Composite an image over white and reduce it to grayscale
pub fn flatten_to_gray(image: &DynamicImage) -> GrayImage {
    if !image.color().has_alpha() {
        return image.to_luma8();
    }

    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);

    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let Rgba([r, g, b, a]) = *src;
        *dst = Rgb([over_white(r, a), over_white(g, a), over_white(b, a)]);
    }

    DynamicImage::ImageRgb8(rgb).to_luma8()
}

fn over_white(channel: u8, alpha: u8) -> u8 {
    let c = channel as u32;
    let a = alpha as u32;
    ((c * a + 255 * (255 - a) + 127) / 255) as u8
}

/// Load-side preparation: flatten, grayscale, threshold
pub fn prepare_image(image: &DynamicImage, threshold: u8, invert: bool) -> Result<Bitmap> {
    debug!(
        width = image.width(),
        height = image.height(),
        "converting to black & white"
    );
    let gray = flatten_to_gray(image);
    threshold_image(&gray, threshold, invert)
}
