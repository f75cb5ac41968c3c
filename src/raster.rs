//! Software rasterizer behind the [`Canvas`] trait.
//!
//! Paths are transformed into device space as they are built, filled with
//! the even-odd rule by scanline, and blended source-over into an
//! `RgbaImage`. Strokes are expanded into quads (plus join discs for wide
//! lines) whose union is painted in one pass, so overlapping segments of a
//! translucent stroke do not darken.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect, Vec2};

use crate::canvas::Canvas;
use crate::error::Result;
use crate::font;
use crate::style::{Color, Style};

/// Widest stroke drawn without join discs, in pixels.
const JOIN_THRESHOLD: f64 = 2.0;
const MAX_ARC_SEGMENTS: usize = 256;

#[derive(Clone, Copy, Debug)]
struct State {
    transform: Affine,
    fill: Color,
    stroke: Color,
    line_width: f64,
    alpha: f64,
}

impl Default for State {
    fn default() -> Self {
        let style = Style::default();
        Self {
            transform: Affine::IDENTITY,
            fill: style.fill,
            stroke: style.stroke,
            line_width: style.line_width,
            alpha: style.alpha,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Subpath {
    points: Vec<Point>,
    closed: bool,
}

/// Edge of a device-space polygon.
#[derive(Clone, Copy, Debug)]
struct Edge {
    a: Point,
    b: Point,
}

impl Edge {
    /// Where this edge crosses the horizontal line at `y`, if it does.
    fn crossing(&self, y: f64) -> Option<f64> {
        let (top, bottom) = if self.a.y < self.b.y { (self.a, self.b) } else { (self.b, self.a) };
        if top.y == bottom.y || y < top.y || y >= bottom.y {
            return None;
        }
        Some(top.x + (y - top.y) * (bottom.x - top.x) / (bottom.y - top.y))
    }
}

fn polygon_edges(points: &[Point], edges: &mut Vec<Edge>) {
    if points.len() < 2 {
        return;
    }
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        edges.push(Edge { a, b });
    }
}

/// Even-odd spans of `edges` on one scanline.
fn even_odd_spans(edges: &[Edge], y: f64, spans: &mut Vec<(f64, f64)>) {
    let mut xs: Vec<f64> = edges.iter().filter_map(|e| e.crossing(y)).collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    for pair in xs.chunks_exact(2) {
        spans.push((pair[0], pair[1]));
    }
}

fn vertical_extent(edges: &[Edge]) -> Option<(f64, f64)> {
    edges.iter().fold(None, |extent, e| {
        let (lo, hi) = (e.a.y.min(e.b.y), e.a.y.max(e.b.y));
        Some(match extent {
            None => (lo, hi),
            Some((min, max)) => (min.min(lo), max.max(hi)),
        })
    })
}

pub struct RasterCanvas {
    image: RgbaImage,
    state: State,
    stack: Vec<State>,
    path: Vec<Subpath>,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            state: State::default(),
            stack: Vec::new(),
            path: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }

    /// Pixels packed as `0xAARRGGBB`, row-major, for window buffers.
    pub fn to_argb_buffer(&self) -> Vec<u32> {
        self.image
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
            })
            .collect()
    }

    fn current_subpath(&mut self) -> &mut Subpath {
        if self.path.last().map_or(true, |sub| sub.closed) {
            self.path.push(Subpath::default());
        }
        // Just pushed if it was missing.
        let last = self.path.len() - 1;
        &mut self.path[last]
    }

    /// Device pixels per user unit under the current transform.
    fn device_scale(&self) -> f64 {
        self.state.transform.determinant().abs().sqrt()
    }

    /// Paint the union of `polygons`' even-odd interiors once.
    fn paint_union(&mut self, polygons: &[Vec<Edge>], color: Color) {
        let Some((top, bottom)) = polygons
            .iter()
            .filter_map(|edges| vertical_extent(edges))
            .reduce(|(a, b), (c, d)| (a.min(c), b.max(d)))
        else {
            return;
        };
        let mut spans = Vec::new();
        for row in self.row_range(top, bottom) {
            let y = row as f64 + 0.5;
            spans.clear();
            for edges in polygons {
                even_odd_spans(edges, y, &mut spans);
            }
            spans.sort_by(|a, b| a.0.total_cmp(&b.0));
            let mut merged: Vec<(f64, f64)> = Vec::with_capacity(spans.len());
            for &(start, end) in spans.iter() {
                match merged.last_mut() {
                    Some(last) if start <= last.1 => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            for (start, end) in merged {
                self.paint_span(row, start, end, color);
            }
        }
    }

    /// Paint the even-odd interior of all `edges` taken together.
    fn paint_even_odd(&mut self, edges: &[Edge], color: Color) {
        let Some((top, bottom)) = vertical_extent(edges) else { return };
        let mut spans = Vec::new();
        for row in self.row_range(top, bottom) {
            spans.clear();
            even_odd_spans(edges, row as f64 + 0.5, &mut spans);
            for &(start, end) in spans.iter() {
                self.paint_span(row, start, end, color);
            }
        }
    }

    fn row_range(&self, top: f64, bottom: f64) -> std::ops::Range<u32> {
        let height = self.image.height() as f64;
        let first = (top - 0.5).ceil().clamp(0.0, height) as u32;
        let last = (bottom - 0.5).ceil().clamp(0.0, height) as u32;
        first..last
    }

    /// Pixels whose centers fall in `[start, end)`.
    fn paint_span(&mut self, row: u32, start: f64, end: f64, color: Color) {
        let width = self.image.width() as f64;
        let first = (start - 0.5).ceil().clamp(0.0, width) as u32;
        let last = (end - 0.5).ceil().clamp(0.0, width) as u32;
        let alpha = color.a as f32 / 255.0 * self.state.alpha as f32;
        for x in first..last {
            let pixel = self.image.get_pixel_mut(x, row);
            *pixel = blend(*pixel, color, alpha);
        }
    }

    fn take_path(&mut self) -> Vec<Subpath> {
        std::mem::take(&mut self.path)
    }
}

/// Source-over with straight alpha.
fn blend(dst: Rgba<u8>, src: Color, alpha: f32) -> Rgba<u8> {
    if alpha <= 0.0 {
        return dst;
    }
    let dst_alpha = dst.0[3] as f32 / 255.0;
    let out_alpha = alpha + dst_alpha * (1.0 - alpha);
    let channel = |s: u8, d: u8| {
        let value = (s as f32 * alpha + d as f32 * dst_alpha * (1.0 - alpha)) / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src.r, dst.0[0]),
        channel(src.g, dst.0[1]),
        channel(src.b, dst.0[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}

/// The rectangle covering segment `a`-`b` at the given width.
fn segment_quad(a: Point, b: Point, width: f64) -> Option<[Point; 4]> {
    let d = b - a;
    let length = d.hypot();
    if length == 0.0 {
        return None;
    }
    let n = Vec2::new(-d.y, d.x) * (width / 2.0 / length);
    Some([a + n, b + n, b - n, a - n])
}

fn disc(center: Point, radius: f64) -> Vec<Point> {
    let segments = ((radius * 2.0).ceil() as usize).clamp(8, 64);
    (0..segments)
        .map(|i| {
            let angle = i as f64 / segments as f64 * std::f64::consts::TAU;
            center + Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

impl Canvas for RasterCanvas {
    fn size(&self) -> (f64, f64) {
        (self.image.width() as f64, self.image.height() as f64)
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn transform(&mut self, affine: Affine) {
        self.state.transform = self.state.transform * affine;
    }

    fn set_style(&mut self, style: &Style) {
        self.state.fill = style.fill;
        self.state.stroke = style.stroke;
        self.state.line_width = style.line_width;
        self.state.alpha = style.alpha;
    }

    fn set_fill(&mut self, color: Color) {
        self.state.fill = color;
    }

    fn set_stroke(&mut self, color: Color) {
        self.state.stroke = color;
    }

    fn set_line_width(&mut self, width: f64) {
        self.state.line_width = width;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, p: Point) {
        let p = self.state.transform * p;
        self.path.push(Subpath {
            points: vec![p],
            closed: false,
        });
    }

    fn line_to(&mut self, p: Point) {
        let p = self.state.transform * p;
        self.current_subpath().points.push(p);
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        let sweep = end - start;
        let device_radius = radius * self.device_scale();
        let segments = ((sweep.abs() * device_radius / 2.0).ceil() as usize).clamp(8, MAX_ARC_SEGMENTS);
        let transform = self.state.transform;
        let points = (0..=segments).map(|i| {
            let angle = start + sweep * i as f64 / segments as f64;
            transform * (center + Vec2::new(angle.cos(), angle.sin()) * radius)
        });
        self.current_subpath().points.extend(points);
    }

    fn close_path(&mut self) {
        if let Some(sub) = self.path.last_mut() {
            sub.closed = true;
        }
    }

    fn fill(&mut self) {
        let path = self.take_path();
        let mut edges = Vec::new();
        for sub in &path {
            polygon_edges(&sub.points, &mut edges);
        }
        let color = self.state.fill;
        self.paint_even_odd(&edges, color);
        self.path = path;
    }

    fn stroke(&mut self) {
        let path = self.take_path();
        let width = (self.state.line_width * self.device_scale()).max(1.0);
        let mut polygons = Vec::new();
        for sub in &path {
            let mut segments: Vec<(Point, Point)> = sub.points.windows(2).map(|w| (w[0], w[1])).collect();
            if sub.closed && sub.points.len() > 2 {
                segments.push((sub.points[sub.points.len() - 1], sub.points[0]));
            }
            for (a, b) in segments {
                if let Some(quad) = segment_quad(a, b, width) {
                    let mut edges = Vec::with_capacity(4);
                    polygon_edges(&quad, &mut edges);
                    polygons.push(edges);
                }
            }
            if width > JOIN_THRESHOLD {
                for &p in &sub.points {
                    let mut edges = Vec::new();
                    polygon_edges(&disc(p, width / 2.0), &mut edges);
                    polygons.push(edges);
                }
            }
        }
        let color = self.state.stroke;
        self.paint_union(&polygons, color);
        self.path = path;
    }

    fn fill_rect(&mut self, rect: Rect) {
        let transform = self.state.transform;
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ]
        .map(|p| transform * p);
        let mut edges = Vec::with_capacity(4);
        polygon_edges(&corners, &mut edges);
        let color = self.state.fill;
        self.paint_even_odd(&edges, color);
    }

    /// Text is set in the 5x7 bitmap font at a fixed pixel size, centered
    /// on `at`, in the fill color.
    fn fill_text(&mut self, text: &str, at: Point) {
        let at = self.state.transform * at;
        let left = (at.x - font::text_width(text) as f64 / 2.0).round();
        let top = (at.y - font::GLYPH_HEIGHT as f64 / 2.0).round();
        let color = self.state.fill;
        let alpha = color.a as f32 / 255.0 * self.state.alpha as f32;
        let (width, height) = (self.image.width() as f64, self.image.height() as f64);
        for (dx, dy) in font::lit_pixels(text) {
            let (x, y) = (left + dx as f64, top + dy as f64);
            if x < 0.0 || y < 0.0 || x >= width || y >= height {
                continue;
            }
            let pixel = self.image.get_pixel_mut(x as u32, y as u32);
            *pixel = blend(*pixel, color, alpha);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::circle_path;

    const RED: Color = Color::rgb(255, 0, 0);

    fn pixel(canvas: &RasterCanvas, x: u32, y: u32) -> [u8; 4] {
        canvas.image().get_pixel(x, y).0
    }

    fn square(canvas: &mut RasterCanvas, x0: f64, y0: f64, x1: f64, y1: f64) {
        canvas.move_to(Point::new(x0, y0));
        canvas.line_to(Point::new(x1, y0));
        canvas.line_to(Point::new(x1, y1));
        canvas.line_to(Point::new(x0, y1));
        canvas.close_path();
    }

    #[test]
    fn test_fill_rect_covers_canvas() {
        let mut canvas = RasterCanvas::new(20, 10);
        canvas.set_fill(Color::WHITE);
        canvas.fill_rect(Rect::new(0.0, 0.0, 20.0, 10.0));
        assert!(canvas.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_transformed_fill_rect() {
        let mut canvas = RasterCanvas::new(20, 20);
        canvas.transform(Affine::scale(0.02));
        canvas.set_fill(RED);
        canvas.fill_rect(Rect::new(0.0, 0.0, 500.0, 500.0));
        assert_eq!(pixel(&canvas, 5, 5), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 15, 15), [0, 0, 0, 0]);
    }

    #[test]
    fn test_even_odd_leaves_hole() {
        let mut canvas = RasterCanvas::new(30, 30);
        canvas.set_fill(RED);
        canvas.begin_path();
        square(&mut canvas, 0.0, 0.0, 30.0, 30.0);
        square(&mut canvas, 10.0, 10.0, 20.0, 20.0);
        canvas.fill();
        assert_eq!(pixel(&canvas, 5, 5)[0], 255);
        assert_eq!(pixel(&canvas, 15, 15), [0, 0, 0, 0]);
    }

    #[test]
    fn test_alpha_blends_over_background() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.set_fill(Color::WHITE);
        canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        canvas.set_fill(Color::BLACK.with_alpha(128));
        canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0));
        let [r, g, b, a] = pixel(&canvas, 1, 1);
        assert!((126..=128).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_stroke_union_paints_once() {
        let mut canvas = RasterCanvas::new(20, 20);
        canvas.set_fill(Color::WHITE);
        canvas.fill_rect(Rect::new(0.0, 0.0, 20.0, 20.0));
        canvas.set_stroke(Color::BLACK.with_alpha(128));
        canvas.set_line_width(4.0);
        canvas.begin_path();
        // Two overlapping segments through the same pixels.
        canvas.move_to(Point::new(2.0, 10.0));
        canvas.line_to(Point::new(18.0, 10.0));
        canvas.move_to(Point::new(2.0, 10.0));
        canvas.line_to(Point::new(18.0, 10.0));
        canvas.stroke();
        let once = pixel(&canvas, 10, 10);
        assert!((126..=128).contains(&once[0]));
        assert_eq!(pixel(&canvas, 10, 2), [255, 255, 255, 255]);
    }

    #[test]
    fn test_circle_fill() {
        let mut canvas = RasterCanvas::new(20, 20);
        canvas.set_fill(RED);
        circle_path(&mut canvas, Point::new(10.0, 10.0), 5.0);
        canvas.fill();
        assert_eq!(pixel(&canvas, 10, 10), [255, 0, 0, 255]);
        assert_eq!(pixel(&canvas, 1, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&canvas, 16, 10), [0, 0, 0, 0]);
    }

    #[test]
    fn test_restore_brings_back_state() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.set_fill(RED);
        canvas.save();
        canvas.set_fill(Color::WHITE);
        canvas.transform(Affine::translate((100.0, 100.0)));
        canvas.restore();
        canvas.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(pixel(&canvas, 0, 0), [255, 0, 0, 255]);
        // Unbalanced restore is ignored.
        canvas.restore();
    }

    #[test]
    fn test_argb_buffer_layout() {
        let mut canvas = RasterCanvas::new(2, 1);
        canvas.set_fill(Color::rgba(0x11, 0x22, 0x33, 0xff));
        canvas.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(canvas.to_argb_buffer(), vec![0xff112233, 0]);
    }

    #[test]
    fn test_save_png_round_trip() {
        let mut canvas = RasterCanvas::new(8, 8);
        canvas.set_fill(RED);
        canvas.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0));
        let path = std::env::temp_dir().join(format!("raster-test-{}.png", std::process::id()));
        canvas.save_png(&path).unwrap();
        let loaded = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.get_pixel(3, 3).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_fill_text_paints_glyphs_centered() {
        let mut canvas = RasterCanvas::new(40, 20);
        canvas.transform(Affine::scale(2.0));
        canvas.set_fill(RED);
        canvas.fill_text("1", Point::new(10.0, 5.0));
        let lit: Vec<(u32, u32)> = canvas
            .image()
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [255, 0, 0, 255])
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(lit.len(), font::lit_pixels("1").count());
        // Glyph box is 5x7 around device point (20, 10).
        assert!(lit.iter().all(|&(x, y)| (17..23).contains(&x) && (6..14).contains(&y)));
    }

    #[test]
    fn test_fill_text_clips_at_edges() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.set_fill(RED);
        canvas.fill_text("88", Point::new(0.0, 0.0));
        canvas.fill_text("88", Point::new(-100.0, -100.0));
        assert!(canvas.image().pixels().any(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_labels_reach_the_image() {
        use crate::layers::Layer;
        use crate::mesh::MeshBuilder;
        use crate::render::{render, RenderOptions};

        let mesh = MeshBuilder::new(100.0).seed(3).build().unwrap();
        let options = RenderOptions::default();
        let mut plain = RasterCanvas::new(400, 400);
        render(&mut plain, &mesh, &[Some(Layer::polygon_edges())], &options).unwrap();
        let mut labeled = RasterCanvas::new(400, 400);
        let layers = [
            Some(Layer::polygon_edges()),
            Some(Layer::polygon_labels(|r| Some(r.to_string()))),
        ];
        render(&mut labeled, &mesh, &layers, &options).unwrap();
        assert_ne!(plain.image().as_raw(), labeled.image().as_raw());
    }
}
