//! Spline tracing using vtracer
//!
//! Runs vtracer in binary mode and reads the contours back out of the SVG
//! path data it emits. Each `<path>` element holds one region: its first
//! sub-path is the outline, every following sub-path is a hole of it.

use super::ContourTracer;
use crate::bitmap::Bitmap;
use crate::error::{Result, TraceError};
use crate::types::{CurveSegment, Point2D, Sign, SignedContour};
use ::vtracer::{ColorImage, ColorMode, Config, convert};
use tracing::debug;

/// Tracer backed by vtracer's spline fitting
#[derive(Debug, Clone, Copy)]
pub struct VtracerTracer {
    /// Minimum angle (degrees) kept as a corner
    pub corner_threshold: i32,
    /// Decimal places in the intermediate SVG
    pub path_precision: u32,
}

impl Default for VtracerTracer {
    fn default() -> Self {
        Self {
            corner_threshold: 60,
            path_precision: 6,
        }
    }
}

impl ContourTracer for VtracerTracer {
    fn trace(&self, bitmap: &Bitmap, turd_size: u32) -> Result<Vec<SignedContour>> {
        if bitmap.count_foreground() == 0 {
            return Ok(Vec::new());
        }

        // Foreground black, background white
        let mut pixels = Vec::with_capacity(bitmap.cells().len() * 4);
        for &cell in bitmap.cells() {
            let v = if cell { 0 } else { 255 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }

        let color_image = ColorImage {
            pixels,
            width: bitmap.width() as usize,
            height: bitmap.height() as usize,
        };

        let config = Config {
            color_mode: ColorMode::Binary,
            filter_speckle: turd_size as usize,
            corner_threshold: self.corner_threshold,
            path_precision: Some(self.path_precision),
            ..Default::default()
        };

        let svg_file = convert(color_image, config)
            .map_err(|e| TraceError::Tracer(format!("vtracer conversion failed: {}", e)))?;

        let contours = extract_contours(&svg_file.to_string())?;
        debug!(contours = contours.len(), "traced splines");
        Ok(contours)
    }
}

/// Pull every `<path>` out of vtracer's SVG as signed contours
fn extract_contours(svg_content: &str) -> Result<Vec<SignedContour>> {
    let mut contours = Vec::new();

    for line in svg_content.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("<path") {
            continue;
        }
        let Some(d) = extract_attribute(trimmed, "d") else {
            continue;
        };
        let offset = extract_translate_transform(trimmed).unwrap_or_default();

        let subpaths = parse_path_data(d)?;
        for (i, mut contour) in subpaths.into_iter().enumerate() {
            contour.sign = if i == 0 { Sign::Positive } else { Sign::Negative };
            contours.push(translate_contour(contour, offset));
        }
    }

    Ok(contours)
}

fn extract_attribute<'a>(element: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {}=\"", name);
    let start = element.find(&needle)? + needle.len();
    let end = element[start..].find('"')?;
    Some(&element[start..start + end])
}

/// Extract translate(x,y) values from a transform attribute
fn extract_translate_transform(path_element: &str) -> Option<Point2D> {
    let transform = extract_attribute(path_element, "transform")?;
    let values = transform.strip_prefix("translate(")?.strip_suffix(')')?;

    // "x,y" or "x y"
    let mut parts = values.split([',', ' ']).filter(|s| !s.is_empty());
    let x = parts.next()?.trim().parse::<f64>().ok()?;
    let y = parts.next()?.trim().parse::<f64>().ok()?;
    Some(Point2D::new(x, y))
}

fn translate_contour(contour: SignedContour, offset: Point2D) -> SignedContour {
    if offset == Point2D::default() {
        return contour;
    }
    let segments = contour
        .segments
        .into_iter()
        .map(|seg| match seg {
            CurveSegment::Corner { through, to } => CurveSegment::Corner {
                through: through + offset,
                to: to + offset,
            },
            CurveSegment::CubicBezier { c0, c1, c2 } => CurveSegment::CubicBezier {
                c0: c0 + offset,
                c1: c1 + offset,
                c2: c2 + offset,
            },
        })
        .collect();
    SignedContour::new(contour.start + offset, segments, contour.sign)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char),
    Number(f64),
}

fn tokenize(d: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = d.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphabetic() && c != 'e' && c != 'E' {
            tokens.push(Token::Command(c));
            chars.next();
        } else if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() {
            let mut num_str = String::new();
            num_str.push(c);
            chars.next();

            while let Some(&next) = chars.peek() {
                if next.is_ascii_digit()
                    || next == '.'
                    || next == 'e'
                    || next == 'E'
                    || ((next == '-' || next == '+') && num_str.ends_with(['e', 'E']))
                {
                    num_str.push(next);
                    chars.next();
                } else {
                    break;
                }
            }

            let value = num_str
                .parse::<f64>()
                .map_err(|_| TraceError::Tracer(format!("bad number '{}' in path data", num_str)))?;
            tokens.push(Token::Number(value));
        } else {
            // separators
            chars.next();
        }
    }

    Ok(tokens)
}

/// Parse SVG path data into contours, one per sub-path.
///
/// Supports `M L H V C Z` in absolute and relative form. Straight runs are
/// stored as cubics whose first control point sits on the start and whose
/// second sits on the end, which the flattener passes through unsplit.
/// Every returned contour is marked [`Sign::Positive`]; callers assign signs.
pub fn parse_path_data(d: &str) -> Result<Vec<SignedContour>> {
    let tokens = tokenize(d)?;
    let mut contours = Vec::new();

    let mut start = Point2D::default();
    let mut cursor = Point2D::default();
    let mut segments: Vec<CurveSegment> = Vec::new();
    let mut command: Option<char> = None;
    let mut i = 0;

    let mut finish = |start: Point2D, cursor: Point2D, segments: &mut Vec<CurveSegment>| {
        if segments.is_empty() {
            return;
        }
        if cursor != start {
            segments.push(line_to(cursor, start));
        }
        contours.push(SignedContour::new(start, std::mem::take(segments), Sign::Positive));
    };

    while i < tokens.len() {
        let cmd = match tokens[i] {
            Token::Command(c) => {
                i += 1;
                c
            }
            Token::Number(_) => match command {
                // extra coordinates after a moveto are implicit linetos
                Some('M') => 'L',
                Some('m') => 'l',
                Some(c) => c,
                None => {
                    return Err(TraceError::Tracer(
                        "path data must start with a command".to_string(),
                    ));
                }
            },
        };

        let relative = cmd.is_ascii_lowercase();
        let base = if relative { cursor } else { Point2D::default() };

        match cmd.to_ascii_uppercase() {
            'M' => {
                let p = read_point(&tokens, &mut i)? + base;
                finish(start, cursor, &mut segments);
                start = p;
                cursor = p;
            }
            'L' => {
                let p = read_point(&tokens, &mut i)? + base;
                segments.push(line_to(cursor, p));
                cursor = p;
            }
            'H' => {
                let x = read_number(&tokens, &mut i)? + base.x;
                let p = Point2D::new(x, cursor.y);
                segments.push(line_to(cursor, p));
                cursor = p;
            }
            'V' => {
                let y = read_number(&tokens, &mut i)? + base.y;
                let p = Point2D::new(cursor.x, y);
                segments.push(line_to(cursor, p));
                cursor = p;
            }
            'C' => {
                let c0 = read_point(&tokens, &mut i)? + base;
                let c1 = read_point(&tokens, &mut i)? + base;
                let c2 = read_point(&tokens, &mut i)? + base;
                segments.push(CurveSegment::CubicBezier { c0, c1, c2 });
                cursor = c2;
            }
            'Z' => {
                finish(start, cursor, &mut segments);
                cursor = start;
            }
            other => {
                return Err(TraceError::Tracer(format!(
                    "unsupported path command '{}'",
                    other
                )));
            }
        }
        command = Some(cmd);
    }

    finish(start, cursor, &mut segments);
    Ok(contours)
}

fn line_to(from: Point2D, to: Point2D) -> CurveSegment {
    CurveSegment::CubicBezier {
        c0: from,
        c1: to,
        c2: to,
    }
}

fn read_number(tokens: &[Token], i: &mut usize) -> Result<f64> {
    match tokens.get(*i) {
        Some(Token::Number(n)) => {
            *i += 1;
            Ok(*n)
        }
        _ => Err(TraceError::Tracer(
            "path data ended in the middle of a command".to_string(),
        )),
    }
}

fn read_point(tokens: &[Token], i: &mut usize) -> Result<Point2D> {
    let x = read_number(tokens, i)?;
    let y = read_number(tokens, i)?;
    Ok(Point2D::new(x, y))
}
