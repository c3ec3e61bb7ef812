//! KiCad footprint serialization

use crate::error::{Result, TraceError};
use crate::sexpr::SExpr;
use crate::types::{Point2D, Polygon};
use uuid::Uuid;

/// Board-only graphic footprint with filled polygons
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub name: String,
    pub layer: String,
    /// Footprint position on the board, in millimeters
    pub placement: Point2D,
    /// Polygons in millimeters relative to `placement`
    pub polygons: Vec<Polygon>,
}

impl Footprint {
    pub fn new(name: &str, layer: &str, placement: Point2D, polygons: Vec<Polygon>) -> Self {
        Self {
            name: name.to_string(),
            layer: layer.to_string(),
            placement,
            polygons,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Supplies the opaque `tstamp` identifiers
pub trait IdSource {
    fn next_id(&mut self) -> String;
}

/// Random version 4 UUIDs
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Counting UUIDs starting from 1, for reproducible output
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    counter: u128,
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> String {
        self.counter += 1;
        Uuid::from_u128(self.counter).to_string()
    }
}

/// Render a footprint as KiCad S-expression text.
///
/// Ids are drawn in document order: the footprint first, then one per
/// polygon. Fails with [`TraceError::EmptyFootprint`] when there are no
/// polygons.
pub fn serialize_footprint(footprint: &Footprint, ids: &mut dyn IdSource) -> Result<String> {
    if footprint.is_empty() {
        return Err(TraceError::EmptyFootprint);
    }

    let mut items = vec![
        SExpr::string(&footprint.name),
        SExpr::list("layer", vec![SExpr::string(&footprint.layer)]),
        SExpr::list(
            "at",
            vec![
                SExpr::Float(footprint.placement.x),
                SExpr::Float(footprint.placement.y),
            ],
        ),
        SExpr::list(
            "attr",
            vec![
                SExpr::symbol("board_only"),
                SExpr::symbol("exclude_from_pos_files"),
                SExpr::symbol("exclude_from_bom"),
            ],
        ),
        tstamp(ids),
    ];

    for polygon in &footprint.polygons {
        items.push(fp_poly(polygon, &footprint.layer, ids));
    }

    Ok(SExpr::list("footprint", items).render())
}

fn fp_poly(polygon: &Polygon, layer: &str, ids: &mut dyn IdSource) -> SExpr {
    let pts = polygon
        .points
        .iter()
        .map(|p| SExpr::list("xy", vec![SExpr::Float(p.x), SExpr::Float(p.y)]))
        .collect();

    SExpr::list(
        "fp_poly",
        vec![
            SExpr::list("pts", pts),
            SExpr::list("layer", vec![SExpr::string(layer)]),
            SExpr::list("fill", vec![SExpr::symbol("solid")]),
            SExpr::list("width", vec![SExpr::Int(0)]),
            tstamp(ids),
        ],
    )
}

fn tstamp(ids: &mut dyn IdSource) -> SExpr {
    SExpr::list("tstamp", vec![SExpr::Str(ids.next_id())])
}

/// Replace every `tstamp` id with `*` so outputs can be compared
pub fn mask_tstamps(text: &str) -> String {
    const OPEN: &str = "(tstamp \"";

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(OPEN) {
        let id_start = pos + OPEN.len();
        out.push_str(&rest[..id_start]);
        match rest[id_start..].find('"') {
            Some(len) => {
                out.push('*');
                rest = &rest[id_start + len..];
            }
            None => {
                rest = &rest[id_start..];
                break;
            }
        }
    }
    out.push_str(rest);
    out
}
