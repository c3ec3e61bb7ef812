//! Bitmap to contour tracing
//!
//! Tracers turn a two-level bitmap into signed contours. The assembler relies
//! on one ordering rule: every hole is emitted right after the body that
//! encloses it, before any other body is opened. Both tracers here honour it.
//!
//! - [`OutlineTracer`]: exact pixel-edge outlines made of corner segments
//! - [`VtracerTracer`]: smoothed spline outlines produced by `vtracer`

mod outline;
mod spline;

use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::types::SignedContour;

pub use outline::OutlineTracer;
pub use spline::{VtracerTracer, parse_path_data};

/// Produces signed contours from a bitmap
pub trait ContourTracer {
    /// Trace `bitmap`. Regions whose area is at most `turd_size` pixels are
    /// discarded; pass `0` to keep every detail.
    fn trace(&self, bitmap: &Bitmap, turd_size: u32) -> Result<Vec<SignedContour>>;
}

/// Tracer selection for configuration and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TracerKind {
    /// Pixel-exact outlines
    #[default]
    Outline,
    /// Smoothed spline outlines
    Vtracer,
}

impl TracerKind {
    pub fn tracer(self) -> Box<dyn ContourTracer + Send + Sync> {
        match self {
            TracerKind::Outline => Box::new(OutlineTracer),
            TracerKind::Vtracer => Box::new(VtracerTracer::default()),
        }
    }
}
