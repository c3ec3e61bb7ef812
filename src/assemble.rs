//! Polygon assembly
//!
//! Rebuilds filled polygons from a stream of flattened, signed contours.
//! Nesting is inferred from emission order alone: a hole always belongs to
//! the most recently opened body. The open bodies form a LIFO stack owned by
//! a single [`assemble_polygons`] call; because holes only ever touch the
//! top entry, the stack doubles as the output arena and preserves insertion
//! order.

use crate::boolean::PolygonBoolean;
use crate::error::{Result, Stage, TraceError};
use crate::mapping::{Bounds, polygons_bounds};
use crate::types::{FlatContour, Polygon, Sign};
use std::slice;
use tracing::debug;

/// One body and the disjoint pieces it was cut into
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGroup {
    /// Empty once a hole has erased the whole body
    pub body: Polygon,
    /// Extra disjoint pieces left after a hole split the body
    pub fragments: Vec<Polygon>,
}

impl PolygonGroup {
    pub fn new(body: Polygon) -> Self {
        Self {
            body,
            fragments: Vec::new(),
        }
    }

    pub fn is_erased(&self) -> bool {
        self.body.is_empty()
    }

    /// Final polygons contributed by this group, in slot order
    pub fn into_polygons(self) -> impl Iterator<Item = Polygon> {
        let body = (!self.body.is_empty()).then_some(self.body);
        body.into_iter().chain(self.fragments)
    }

    fn take_pieces(&mut self) -> Vec<Polygon> {
        let body = std::mem::take(&mut self.body);
        let fragments = std::mem::take(&mut self.fragments);
        std::iter::once(body)
            .filter(|p| !p.is_empty())
            .chain(fragments)
            .collect()
    }

    fn set_pieces(&mut self, mut pieces: Vec<Polygon>) {
        if pieces.is_empty() {
            self.body = Polygon::default();
            self.fragments.clear();
        } else {
            self.body = pieces.remove(0);
            self.fragments = pieces;
        }
    }
}

/// Resolve holes into their bodies.
///
/// Subtraction that splits a body is followed by a merge pass: the first two
/// pieces are unioned repeatedly until the union stops collapsing them. A
/// later hole for a split body is cut from every piece its bounding box
/// touches. A hole for a body that an earlier hole erased breaks the nesting
/// order and fails with [`TraceError::MalformedContourSequence`].
pub fn assemble_polygons<B>(contours: &[FlatContour], boolean: &B) -> Result<Vec<Polygon>>
where
    B: PolygonBoolean + ?Sized,
{
    let mut stack: Vec<PolygonGroup> = Vec::new();

    for (index, contour) in contours.iter().enumerate() {
        match contour.sign {
            Sign::Positive => {
                stack.push(PolygonGroup::new(contour.polygon.clone()));
            }
            Sign::Negative => {
                let Some(top) = stack.last_mut() else {
                    return Err(TraceError::MalformedContourSequence { index });
                };
                if top.is_erased() {
                    return Err(TraceError::MalformedContourSequence { index });
                }

                let hole = &contour.polygon;
                let hole_bounds = polygons_bounds(slice::from_ref(hole));
                let pieces = top.take_pieces();
                let split = pieces.len() > 1;

                let mut next = Vec::with_capacity(pieces.len());
                for piece in pieces {
                    if split && !touches(&piece, &hole_bounds) {
                        next.push(piece);
                        continue;
                    }
                    let cut = boolean
                        .subtract(&piece, hole)
                        .map_err(|reason| TraceError::geometry(Stage::Subtract, index, reason))?;
                    next.extend(merge_fragments(cut, boolean, index)?);
                }

                if next.len() > 1 {
                    debug!(index, pieces = next.len(), "body is split into disjoint pieces");
                }
                top.set_pieces(next);
            }
        }
    }

    Ok(stack.into_iter().flat_map(PolygonGroup::into_polygons).collect())
}

fn touches(piece: &Polygon, hole_bounds: &Bounds) -> bool {
    polygons_bounds(slice::from_ref(piece)).intersects(hole_bounds)
}

fn merge_fragments<B>(mut pieces: Vec<Polygon>, boolean: &B, index: usize) -> Result<Vec<Polygon>>
where
    B: PolygonBoolean + ?Sized,
{
    while pieces.len() > 1 {
        let merged = boolean
            .union(&pieces[0], &pieces[1])
            .map_err(|reason| TraceError::geometry(Stage::Union, index, reason))?;

        match merged.len() {
            0 => {
                return Err(TraceError::geometry(
                    Stage::Union,
                    index,
                    "union of two fragments produced nothing",
                ));
            }
            1 => {
                let rest = pieces.split_off(2);
                pieces = merged.into_iter().chain(rest).collect();
            }
            _ => break,
        }
    }
    Ok(pieces)
}
