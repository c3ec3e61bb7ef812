//! Error types for the tracing pipeline.
//!
//! Every stage returns these as typed results. Nothing here is retried:
//! geometric failures are deterministic.

use std::fmt;
use thiserror::Error;

/// Pipeline stage that produced a [`TraceError::GeometryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Flatten,
    Subtract,
    Union,
    Mapping,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Flatten => "flatten",
            Stage::Subtract => "subtract",
            Stage::Union => "union",
            Stage::Mapping => "mapping",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while converting artwork to a footprint.
#[derive(Error, Debug)]
pub enum TraceError {
    /// The raster input is empty or malformed.
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A hole arrived with no enclosing body.
    #[error("Malformed contour sequence: hole at contour {index} has no enclosing body")]
    MalformedContourSequence { index: usize },

    /// Degenerate or self-intersecting geometry.
    #[error("Geometry error during {stage} at polygon {index}: {reason}")]
    GeometryError {
        stage: Stage,
        index: usize,
        reason: String,
    },

    /// Nothing to serialize.
    #[error("Footprint has no polygons")]
    EmptyFootprint,

    /// The contour tracer backend failed.
    #[error("Tracer failed: {0}")]
    Tracer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

impl TraceError {
    pub fn geometry(stage: Stage, index: usize, reason: impl Into<String>) -> Self {
        TraceError::GeometryError {
            stage,
            index,
            reason: reason.into(),
        }
    }

    /// True for the "layer has nothing on it" signal, which callers usually
    /// treat as a skip rather than a failure.
    pub fn is_empty_footprint(&self) -> bool {
        matches!(self, TraceError::EmptyFootprint)
    }
}

pub type Result<T> = std::result::Result<T, TraceError>;
