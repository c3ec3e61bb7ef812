//! Pixel-edge outline tracer
//!
//! Labels connected regions (foreground 4-connected, background
//! 8-connected), builds the region nesting tree and walks the pixel cracks
//! around each region. Collinear runs collapse, so every emitted vertex is a
//! real corner of the artwork.

use super::ContourTracer;
use crate::bitmap::Bitmap;
use crate::error::Result;
use crate::types::{CurveSegment, Point2D, Polygon, Sign, SignedContour};
use tracing::debug;

/// Region id shared by every background pixel connected to the image border
const OUTSIDE: usize = 0;

/// Exact outline tracer
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineTracer;

impl ContourTracer for OutlineTracer {
    fn trace(&self, bitmap: &Bitmap, turd_size: u32) -> Result<Vec<SignedContour>> {
        let regions = Regions::label(bitmap);
        let mut contours = Vec::new();

        // Depth-first over bodies: body, its holes, then bodies inside those holes
        let mut work: Vec<usize> = regions.children[OUTSIDE].iter().rev().copied().collect();
        while let Some(body) = work.pop() {
            let outline = regions.outline(body);
            if outline.area() <= turd_size as f64 {
                continue;
            }
            contours.push(to_contour(&outline, Sign::Positive));

            let mut islands = Vec::new();
            for &hole in &regions.children[body] {
                let outline = regions.outline(hole);
                if outline.area() <= turd_size as f64 {
                    continue;
                }
                contours.push(to_contour(&outline.reversed(), Sign::Negative));
                islands.extend(regions.children[hole].iter().copied());
            }
            work.extend(islands.into_iter().rev());
        }

        debug!(
            regions = regions.first.len(),
            contours = contours.len(),
            "traced outlines"
        );
        Ok(contours)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    East,
    South,
    West,
    North,
}

impl Dir {
    fn step(self) -> (i64, i64) {
        match self {
            Dir::East => (1, 0),
            Dir::South => (0, 1),
            Dir::West => (-1, 0),
            Dir::North => (0, -1),
        }
    }

    /// Clockwise on screen (y down)
    fn right(self) -> Dir {
        match self {
            Dir::East => Dir::South,
            Dir::South => Dir::West,
            Dir::West => Dir::North,
            Dir::North => Dir::East,
        }
    }

    fn left(self) -> Dir {
        match self {
            Dir::East => Dir::North,
            Dir::North => Dir::West,
            Dir::West => Dir::South,
            Dir::South => Dir::East,
        }
    }

    /// Pixels ahead-left and ahead-right of a grid vertex
    fn ahead(self, vx: i64, vy: i64) -> ((i64, i64), (i64, i64)) {
        match self {
            Dir::East => ((vx, vy - 1), (vx, vy)),
            Dir::South => ((vx, vy), (vx - 1, vy)),
            Dir::West => ((vx - 1, vy), (vx - 1, vy - 1)),
            Dir::North => ((vx - 1, vy - 1), (vx, vy - 1)),
        }
    }
}

/// Connected regions of a bitmap and their nesting
struct Regions {
    width: i64,
    height: i64,
    labels: Vec<usize>,
    /// Raster-first pixel of each region
    first: Vec<(i64, i64)>,
    foreground: Vec<bool>,
    /// Regions directly enclosed by each region, in raster order
    children: Vec<Vec<usize>>,
}

impl Regions {
    fn label(bitmap: &Bitmap) -> Self {
        let width = bitmap.width() as i64;
        let height = bitmap.height() as i64;
        let mut regions = Regions {
            width,
            height,
            labels: vec![usize::MAX; (width * height) as usize],
            first: vec![(-1, -1)],
            foreground: vec![false],
            children: vec![Vec::new()],
        };

        // Border-connected background belongs to the outside region
        for y in 0..height {
            for x in 0..width {
                let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                if on_border && !bitmap.get(x as u32, y as u32) && regions.at(x, y).is_none() {
                    regions.flood(bitmap, x, y, OUTSIDE, false);
                }
            }
        }

        for y in 0..height {
            for x in 0..width {
                if regions.at(x, y).is_some() {
                    continue;
                }
                let fg = bitmap.get(x as u32, y as u32);
                // Raster order guarantees these neighbours are already labelled
                let parent = if fg {
                    regions.at(x - 1, y).unwrap_or(OUTSIDE)
                } else {
                    regions.at(x, y - 1).unwrap_or(OUTSIDE)
                };

                let id = regions.first.len();
                regions.first.push((x, y));
                regions.foreground.push(fg);
                regions.children.push(Vec::new());
                regions.children[parent].push(id);
                regions.flood(bitmap, x, y, id, fg);
            }
        }

        regions
    }

    fn at(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        let label = self.labels[(y * self.width + x) as usize];
        (label != usize::MAX).then_some(label)
    }

    fn flood(&mut self, bitmap: &Bitmap, x: i64, y: i64, id: usize, fg: bool) {
        const FOUR: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        const EIGHT: [(i64, i64); 8] = [
            (1, 0),
            (-1, 0),
            (0, 1),
            (0, -1),
            (1, 1),
            (1, -1),
            (-1, 1),
            (-1, -1),
        ];
        let neighbours: &[(i64, i64)] = if fg { &FOUR } else { &EIGHT };

        let mut queue = vec![(x, y)];
        self.labels[(y * self.width + x) as usize] = id;
        while let Some((cx, cy)) = queue.pop() {
            for (dx, dy) in neighbours {
                let (nx, ny) = (cx + dx, cy + dy);
                if nx < 0 || ny < 0 || nx >= self.width || ny >= self.height {
                    continue;
                }
                let idx = (ny * self.width + nx) as usize;
                if self.labels[idx] == usize::MAX && bitmap.get(nx as u32, ny as u32) == fg {
                    self.labels[idx] = id;
                    queue.push((nx, ny));
                }
            }
        }
    }

    fn inside(&self, id: usize, (x, y): (i64, i64)) -> bool {
        self.at(x, y) == Some(id)
    }

    /// Outer boundary of a region, clockwise on screen, corners only
    fn outline(&self, id: usize) -> Polygon {
        let start = self.first[id];
        let eight_connected = !self.foreground[id];

        let (mut vx, mut vy) = start;
        let mut dir = Dir::East;
        let mut corners = vec![Point2D::new(vx as f64, vy as f64)];

        loop {
            let (dx, dy) = dir.step();
            vx += dx;
            vy += dy;
            if (vx, vy) == start {
                break;
            }

            let (left, right) = dir.ahead(vx, vy);
            let (left, right) = (self.inside(id, left), self.inside(id, right));
            let next = if eight_connected {
                if left {
                    dir.left()
                } else if right {
                    dir
                } else {
                    dir.right()
                }
            } else if !right {
                dir.right()
            } else if left {
                dir.left()
            } else {
                dir
            };

            if next != dir {
                corners.push(Point2D::new(vx as f64, vy as f64));
                dir = next;
            }
        }

        Polygon::new(corners)
    }
}

/// Express a corner ring as corner segments starting and ending at its
/// first vertex
fn to_contour(ring: &Polygon, sign: Sign) -> SignedContour {
    let pts = &ring.points;
    let n = pts.len();
    let mut segments = Vec::with_capacity(n / 2 + 1);

    let mut k = 1;
    while k < n {
        segments.push(CurveSegment::Corner {
            through: pts[k],
            to: pts[(k + 1) % n],
        });
        k += 2;
    }
    if n % 2 == 0 {
        return SignedContour::new(pts[0], segments, sign);
    }

    // odd rings close with a straight run
    let last = pts[n - 1];
    segments.push(CurveSegment::CubicBezier {
        c0: last,
        c1: pts[0],
        c2: pts[0],
    });
    SignedContour::new(pts[0], segments, sign)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap_from(rows: &[&str]) -> Bitmap {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let cells = rows
            .iter()
            .flat_map(|r| r.chars().map(|c| c == '#'))
            .collect();
        Bitmap::from_cells(width, height, cells).unwrap()
    }

    fn corners(contour: &SignedContour) -> Vec<(f64, f64)> {
        let mut pts = vec![(contour.start.x, contour.start.y)];
        for seg in &contour.segments {
            if let CurveSegment::Corner { through, to } = seg {
                pts.push((through.x, through.y));
                pts.push((to.x, to.y));
            }
        }
        pts
    }

    #[test]
    fn test_empty_bitmap_has_no_contours() {
        let bitmap = bitmap_from(&["....", "...."]);
        assert!(OutlineTracer.trace(&bitmap, 0).unwrap().is_empty());
    }

    #[test]
    fn test_square_is_four_corners() {
        let bitmap = bitmap_from(&["....", ".##.", ".##.", "...."]);
        let contours = OutlineTracer.trace(&bitmap, 0).unwrap();

        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].sign, Sign::Positive);
        assert_eq!(
            corners(&contours[0]),
            vec![(1.0, 1.0), (3.0, 1.0), (3.0, 3.0), (1.0, 3.0), (1.0, 1.0)]
        );
    }

    #[test]
    fn test_full_bitmap_traces_image_border() {
        let bitmap = bitmap_from(&["###", "###"]);
        let contours = OutlineTracer.trace(&bitmap, 0).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(
            corners(&contours[0]),
            vec![(0.0, 0.0), (3.0, 0.0), (3.0, 2.0), (0.0, 2.0), (0.0, 0.0)]
        );
    }

    #[test]
    fn test_ring_emits_body_then_hole() {
        let bitmap = bitmap_from(&["#####", "#...#", "#...#", "#####"]);
        let contours = OutlineTracer.trace(&bitmap, 0).unwrap();

        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].sign, Sign::Positive);
        assert_eq!(contours[1].sign, Sign::Negative);
        assert_eq!(contours[1].start, Point2D::new(1.0, 1.0));
    }

    #[test]
    fn test_island_follows_enclosing_holes() {
        let bitmap = bitmap_from(&[
            "#######", //
            "#.....#", //
            "#.###.#", //
            "#.#.#.#", //
            "#.###.#", //
            "#.....#", //
            "#######", //
        ]);
        let contours = OutlineTracer.trace(&bitmap, 0).unwrap();
        let signs: Vec<Sign> = contours.iter().map(|c| c.sign).collect();
        assert_eq!(
            signs,
            vec![Sign::Positive, Sign::Negative, Sign::Positive, Sign::Negative]
        );
        assert_eq!(contours[2].start, Point2D::new(2.0, 2.0));
        assert_eq!(contours[3].start, Point2D::new(3.0, 3.0));
    }

    #[test]
    fn test_diagonal_pixels_are_separate_bodies() {
        let bitmap = bitmap_from(&["#.", ".#"]);
        let contours = OutlineTracer.trace(&bitmap, 0).unwrap();
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(|c| c.sign == Sign::Positive));
    }

    #[test]
    fn test_turd_size_drops_small_regions() {
        let bitmap = bitmap_from(&["#....", ".....", "..###", "..###"]);
        let contours = OutlineTracer.trace(&bitmap, 2).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].start, Point2D::new(2.0, 2.0));
    }

    #[test]
    fn test_l_shape_has_six_corners() {
        let bitmap = bitmap_from(&["#..", "#..", "###"]);
        let contours = OutlineTracer.trace(&bitmap, 0).unwrap();
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].segments.len(), 3);
    }

    #[test]
    fn test_hole_winds_against_body() {
        let bitmap = bitmap_from(&["####", "#..#", "####"]);
        let contours = OutlineTracer.trace(&bitmap, 0).unwrap();
        let ring = |c: &SignedContour| {
            let mut pts: Vec<Point2D> = corners(c).into_iter().map(Point2D::from).collect();
            pts.pop();
            Polygon::new(pts)
        };
        assert!(ring(&contours[0]).signed_area() > 0.0);
        assert!(ring(&contours[1]).signed_area() < 0.0);
    }
}
