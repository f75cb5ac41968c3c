//! Small 2D geometry helpers shared by the dual-mesh builder and the
//! flow layers.

use kurbo::{Point, Vec2};

use crate::canvas::Canvas;
use crate::error::{MapError, Result};

/// Arrow anchor, as a fraction of the way from `p` to `q`.
const ARROW_ANCHOR: f64 = 0.2;
const ARROW_SHAFT_LENGTH: f64 = 0.35;
const ARROW_HEAD_LENGTH: f64 = 0.25;
const ARROW_SHAFT_WIDTH: f64 = 0.1;
const ARROW_HEAD_WIDTH: f64 = 0.3;

/// Number of vertices in an arrow outline.
pub const ARROW_VERTICES: usize = 7;

pub fn centroid(a: Point, b: Point, c: Point) -> Point {
    Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0)
}

/// Linear blend from `a` (at `t = 0`) to `b` (at `t = 1`), exact at both
/// ends.
pub fn mix(a: Point, b: Point, t: f64) -> Point {
    Point::new(a.x * (1.0 - t) + b.x * t, a.y * (1.0 - t) + b.y * t)
}

/// The point equidistant from `a`, `b` and `c`.
///
/// Collinear or coincident input has no circumcenter and fails with
/// [`MapError::DegenerateGeometry`].
pub fn circumcenter(a: Point, b: Point, c: Point) -> Result<Point> {
    let ab = b - a;
    let ac = c - a;
    let d = 2.0 * ab.cross(ac);
    if d.abs() < 1e-12 {
        return Err(MapError::DegenerateGeometry { a, b, c });
    }
    let ab2 = ab.hypot2();
    let ac2 = ac.hypot2();
    let ux = (ac.y * ab2 - ab.y * ac2) / d;
    let uy = (ab.x * ac2 - ac.x * ab2) / d;
    Ok(a + Vec2::new(ux, uy))
}

/// Outline of an arrow pointing from `p` toward `q`.
///
/// Shaft and head sizes scale with `|q - p|`. The outline starts at the
/// left tail corner and runs around the tip back to the right tail corner.
/// When `p == q` every vertex collapses onto `p`.
pub fn arrow_outline(p: Point, q: Point) -> [Point; ARROW_VERTICES] {
    let d = q - p;
    let n = Vec2::new(-d.y, d.x);
    let anchor = p + d * ARROW_ANCHOR;
    let neck = anchor + d * ARROW_SHAFT_LENGTH;
    let tip = neck + d * ARROW_HEAD_LENGTH;
    let shaft = n * (ARROW_SHAFT_WIDTH / 2.0);
    let head = n * (ARROW_HEAD_WIDTH / 2.0);
    [
        anchor + shaft,
        neck + shaft,
        neck + head,
        tip,
        neck - head,
        neck - shaft,
        anchor - shaft,
    ]
}

/// Fills an arrow from `p` toward `q` as one closed path.
pub fn draw_arrow(canvas: &mut dyn Canvas, p: Point, q: Point) {
    let outline = arrow_outline(p, q);
    canvas.begin_path();
    canvas.move_to(outline[0]);
    for &point in &outline[1..] {
        canvas.line_to(point);
    }
    canvas.close_path();
    canvas.fill();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments_cross(a: Point, b: Point, c: Point, d: Point) -> bool {
        let orient = |p: Point, q: Point, r: Point| (q - p).cross(r - p);
        let d1 = orient(c, d, a);
        let d2 = orient(c, d, b);
        let d3 = orient(a, b, c);
        let d4 = orient(a, b, d);
        (d1 > 0.0) != (d2 > 0.0) && (d3 > 0.0) != (d4 > 0.0) && d1 != 0.0 && d2 != 0.0
    }

    fn is_simple(outline: &[Point]) -> bool {
        let n = outline.len();
        for i in 0..n {
            for j in (i + 1)..n {
                // Adjacent edges share a vertex.
                if j == i + 1 || (i == 0 && j == n - 1) {
                    continue;
                }
                let (a, b) = (outline[i], outline[(i + 1) % n]);
                let (c, d) = (outline[j], outline[(j + 1) % n]);
                if segments_cross(a, b, c, d) {
                    return false;
                }
            }
        }
        true
    }

    #[test]
    fn test_circumcenter_right_triangle() {
        let c = circumcenter(Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(0.0, 2.0)).unwrap();
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circumcenter_is_equidistant() {
        let (a, b, c) = (Point::new(13.0, 7.0), Point::new(80.0, 22.0), Point::new(41.0, 95.0));
        let o = circumcenter(a, b, c).unwrap();
        let ra = (a - o).hypot();
        assert!(((b - o).hypot() - ra).abs() < 1e-9);
        assert!(((c - o).hypot() - ra).abs() < 1e-9);
    }

    #[test]
    fn test_circumcenter_degenerate() {
        let result = circumcenter(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 2.0));
        assert!(matches!(result, Err(MapError::DegenerateGeometry { .. })));
        let same = Point::new(5.0, 5.0);
        assert!(circumcenter(same, same, same).is_err());
    }

    #[test]
    fn test_mixing_at_one_is_circumcenter() {
        let (a, b, c) = (Point::new(0.0, 0.0), Point::new(2.0, 0.0), Point::new(0.0, 2.0));
        let center = centroid(a, b, c);
        assert!((center.x - 2.0 / 3.0).abs() < 1e-12);
        let circum = circumcenter(a, b, c).unwrap();
        assert_eq!(mix(center, circum, 1.0), circum);
        assert_eq!(mix(center, circum, 0.0), center);
    }

    #[test]
    fn test_arrow_outline_is_simple() {
        let pairs = [
            (Point::new(0.0, 0.0), Point::new(10.0, 0.0)),
            (Point::new(5.0, 5.0), Point::new(-3.0, 12.0)),
            (Point::new(100.0, 40.0), Point::new(100.0, 39.0)),
            (Point::new(-7.5, 2.0), Point::new(300.0, -250.0)),
        ];
        for (p, q) in pairs {
            let outline = arrow_outline(p, q);
            assert_eq!(outline.len(), ARROW_VERTICES);
            assert!(is_simple(&outline), "arrow {:?} -> {:?} self-intersects", p, q);
        }
    }

    #[test]
    fn test_arrow_tip_and_anchor() {
        let outline = arrow_outline(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!((outline[3].x - 8.0).abs() < 1e-12);
        assert_eq!(outline[3].y, 0.0);
        // Tail straddles the anchor at 20%.
        assert!((outline[0].x - 2.0).abs() < 1e-12);
        assert!((outline[0].y + outline[6].y).abs() < 1e-12);
    }

    #[test]
    fn test_arrow_degenerate_collapses() {
        let p = Point::new(3.0, 4.0);
        assert!(arrow_outline(p, p).iter().all(|&v| v == p));
    }
}
