//! # pcb-trace
//!
//! A Rust library for turning raster artwork into KiCad PCB footprints.
//!
//! ## Features
//!
//! - **Thresholding**: Flatten transparency over white and split the image into foreground
//!   and background
//! - **Tracing**: Pixel-exact outlines or smoothed vtracer splines
//! - **Hole Subtraction**: Nested contours become filled polygons with their holes cut out
//! - **Footprint Output**: Byte-reproducible `fp_poly` footprints in millimeters
//!
//! ## Example - Single Layer
//!
//! ```rust,ignore
//! use pcb_trace::{TraceOptions, trace_file};
//!
//! let footprint = trace_file("logo.png", &TraceOptions::default()).unwrap();
//! std::fs::write("logo.kicad_mod", footprint).unwrap();
//! ```
//!
//! ## Example - Several Layers
//!
//! ```rust,ignore
//! use pcb_trace::{Layer, LayerJob, TraceOptions, trace_layers};
//!
//! let image = image::open("logo.png").unwrap();
//! let jobs = [
//!     LayerJob::new(Layer::FrontSilkscreen),
//!     LayerJob::new(Layer::FrontMask).inverted(),
//! ];
//! for outcome in trace_layers(&image, &TraceOptions::default(), &jobs) {
//!     println!("{}: {}", outcome.layer, outcome.result.is_ok());
//! }
//! ```

pub mod assemble;
pub mod bitmap;
pub mod boolean;
pub mod error;
pub mod flatten;
pub mod footprint;
pub mod mapping;
pub mod pipeline;
pub mod sexpr;
pub mod tracer;
pub mod types;

// Re-export commonly used items
pub use error::{Result, Stage, TraceError};
pub use footprint::{Footprint, IdSource, RandomIds, SequentialIds, mask_tstamps};
pub use pipeline::{
    Layer, LayerJob, LayerOutcome, TraceOptions, trace, trace_bytes, trace_file, trace_footprint,
    trace_layers, trace_polygons, trace_with_ids,
};
pub use tracer::{ContourTracer, TracerKind};
pub use types::{CurveSegment, Point2D, Polygon, Sign, SignedContour};
