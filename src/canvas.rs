//! 2D immediate-mode drawing surface.
//!
//! The calls mirror an HTML canvas context closely enough that layers read
//! like ordinary canvas code. [`Recorder`] keeps every call as a [`DrawOp`]
//! so tests can assert on what a layer drew without rasterizing anything.

use kurbo::{Affine, Point, Rect};

use crate::style::{Color, Style};

pub trait Canvas {
    /// Surface size in device units.
    fn size(&self) -> (f64, f64);

    /// Push transform and style state.
    fn save(&mut self);
    /// Pop the state pushed by the matching `save`.
    fn restore(&mut self);
    /// Post-multiply the current transform.
    fn transform(&mut self, affine: Affine);

    fn set_style(&mut self, style: &Style);
    fn set_fill(&mut self, color: Color);
    fn set_stroke(&mut self, color: Color);
    fn set_line_width(&mut self, width: f64);

    fn begin_path(&mut self);
    fn move_to(&mut self, p: Point);
    fn line_to(&mut self, p: Point);
    /// Circular arc from angle `start` to `end` (radians, clockwise on screen).
    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64);
    fn close_path(&mut self);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn fill_rect(&mut self, rect: Rect);
    fn fill_text(&mut self, text: &str, at: Point);
}

/// Draws a full circle as its own path.
pub fn circle_path(canvas: &mut dyn Canvas, center: Point, radius: f64) {
    canvas.begin_path();
    canvas.arc(center, radius, 0.0, std::f64::consts::TAU);
    canvas.close_path();
}

/// Draws a single line segment as its own path and strokes it.
pub fn stroke_line(canvas: &mut dyn Canvas, a: Point, b: Point) {
    canvas.begin_path();
    canvas.move_to(a);
    canvas.line_to(b);
    canvas.stroke();
}

/// One recorded canvas call.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    Transform(Affine),
    SetStyle(Style),
    SetFill(Color),
    SetStroke(Color),
    SetLineWidth(f64),
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    Arc {
        center: Point,
        radius: f64,
        start: f64,
        end: f64,
    },
    ClosePath,
    Fill,
    Stroke,
    FillRect(Rect),
    FillText { text: String, at: Point },
}

/// A canvas that only records.
#[derive(Clone, Debug)]
pub struct Recorder {
    width: f64,
    height: f64,
    pub ops: Vec<DrawOp>,
}

impl Recorder {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    /// Number of recorded ops matching `pred`.
    pub fn count(&self, pred: impl Fn(&DrawOp) -> bool) -> usize {
        self.ops.iter().filter(|op| pred(op)).count()
    }

    /// Current save depth after replaying every op.
    pub fn save_depth(&self) -> isize {
        self.ops.iter().fold(0, |depth, op| match op {
            DrawOp::Save => depth + 1,
            DrawOp::Restore => depth - 1,
            _ => depth,
        })
    }
}

impl Canvas for Recorder {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        self.ops.push(DrawOp::Restore);
    }

    fn transform(&mut self, affine: Affine) {
        self.ops.push(DrawOp::Transform(affine));
    }

    fn set_style(&mut self, style: &Style) {
        self.ops.push(DrawOp::SetStyle(*style));
    }

    fn set_fill(&mut self, color: Color) {
        self.ops.push(DrawOp::SetFill(color));
    }

    fn set_stroke(&mut self, color: Color) {
        self.ops.push(DrawOp::SetStroke(color));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::SetLineWidth(width));
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, p: Point) {
        self.ops.push(DrawOp::MoveTo(p));
    }

    fn line_to(&mut self, p: Point) {
        self.ops.push(DrawOp::LineTo(p));
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        self.ops.push(DrawOp::Arc {
            center,
            radius,
            start,
            end,
        });
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn fill(&mut self) {
        self.ops.push(DrawOp::Fill);
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn fill_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::FillRect(rect));
    }

    fn fill_text(&mut self, text: &str, at: Point) {
        self.ops.push(DrawOp::FillText {
            text: text.to_string(),
            at,
        });
    }
}
