//! Drawing layers
//!
//! A layer is a style plus a [`LayerKind`] describing what to draw and which
//! attribute data to draw it from. Layers never touch program state; their
//! only effect is the calls they make on the canvas. A [`LayerList`] keeps
//! them in painter's order, and `None` entries are skipped.

use kurbo::Point;

use crate::canvas::{circle_path, stroke_line, Canvas};
use crate::error::{require_len, ElementKind, MapError, Result};
use crate::geometry::draw_arrow;
use crate::mesh::TriangleMesh;
use crate::style::{Color, Style, StyleOverrides};

/// Color for one element; `None` skips it.
pub type ColorFn<'a> = Box<dyn Fn(usize) -> Option<Color> + 'a>;
/// Color for one side from `(side, first, second)`; `None` skips it.
pub type EdgeColorFn<'a> = Box<dyn Fn(usize, usize, usize) -> Option<Color> + 'a>;
/// Text for one element; `None` skips it.
pub type LabelFn<'a> = Box<dyn Fn(usize) -> Option<String> + 'a>;

pub enum LayerKind<'a> {
    /// Edges of the triangle mesh, each drawn once.
    TriangleEdges,
    /// Edges of the polygon dual, each drawn once.
    PolygonEdges { color: Option<EdgeColorFn<'a>> },
    TriangleCenters { color: Option<ColorFn<'a>> },
    PolygonCenters { color: Option<ColorFn<'a>> },
    TriangleLabels { label: LabelFn<'a> },
    PolygonLabels { label: LabelFn<'a> },
    /// Every solid region filled through its surrounding triangle centers.
    PolygonColors { color: ColorFn<'a> },
    /// Arrows from each triangle toward its downslope neighbor.
    Drainage {
        t_downslope_s: &'a [Option<usize>],
        r_ocean: &'a [bool],
    },
    /// River segments, wider with more flow.
    Rivers { s_flow: &'a [f32] },
    Springs { spring_t: &'a [usize] },
}

pub struct Layer<'a> {
    pub style: StyleOverrides,
    pub kind: LayerKind<'a>,
}

impl<'a> Layer<'a> {
    pub fn new(kind: LayerKind<'a>) -> Self {
        Self {
            style: StyleOverrides::new(),
            kind,
        }
    }

    pub fn triangle_edges() -> Self {
        Self::new(LayerKind::TriangleEdges)
    }

    pub fn polygon_edges() -> Self {
        Self::new(LayerKind::PolygonEdges { color: None })
    }

    pub fn polygon_edges_colored(color: impl Fn(usize, usize, usize) -> Option<Color> + 'a) -> Self {
        Self::new(LayerKind::PolygonEdges {
            color: Some(Box::new(color)),
        })
    }

    pub fn triangle_centers() -> Self {
        Self::new(LayerKind::TriangleCenters { color: None })
    }

    pub fn triangle_centers_colored(color: impl Fn(usize) -> Option<Color> + 'a) -> Self {
        Self::new(LayerKind::TriangleCenters {
            color: Some(Box::new(color)),
        })
    }

    pub fn polygon_centers() -> Self {
        Self::new(LayerKind::PolygonCenters { color: None })
    }

    pub fn polygon_centers_colored(color: impl Fn(usize) -> Option<Color> + 'a) -> Self {
        Self::new(LayerKind::PolygonCenters {
            color: Some(Box::new(color)),
        })
    }

    pub fn triangle_labels(label: impl Fn(usize) -> Option<String> + 'a) -> Self {
        Self::new(LayerKind::TriangleLabels { label: Box::new(label) })
    }

    pub fn polygon_labels(label: impl Fn(usize) -> Option<String> + 'a) -> Self {
        Self::new(LayerKind::PolygonLabels { label: Box::new(label) })
    }

    pub fn polygon_colors(color: impl Fn(usize) -> Option<Color> + 'a) -> Self {
        Self::new(LayerKind::PolygonColors { color: Box::new(color) })
    }

    pub fn drainage(t_downslope_s: &'a [Option<usize>], r_ocean: &'a [bool]) -> Self {
        Self::new(LayerKind::Drainage { t_downslope_s, r_ocean })
    }

    pub fn rivers(s_flow: &'a [f32]) -> Self {
        Self::new(LayerKind::Rivers { s_flow })
    }

    pub fn springs(spring_t: &'a [usize]) -> Self {
        Self::new(LayerKind::Springs { spring_t })
    }

    /// Replace the caller-level style overrides.
    pub fn with_style(mut self, style: StyleOverrides) -> Self {
        self.style = style;
        self
    }

    pub fn name(&self) -> &'static str {
        match self.kind {
            LayerKind::TriangleEdges => "triangle-edges",
            LayerKind::PolygonEdges { .. } => "polygon-edges",
            LayerKind::TriangleCenters { .. } => "triangle-centers",
            LayerKind::PolygonCenters { .. } => "polygon-centers",
            LayerKind::TriangleLabels { .. } => "triangle-labels",
            LayerKind::PolygonLabels { .. } => "polygon-labels",
            LayerKind::PolygonColors { .. } => "polygon-colors",
            LayerKind::Drainage { .. } => "drainage",
            LayerKind::Rivers { .. } => "rivers",
            LayerKind::Springs { .. } => "springs",
        }
    }

    /// The layer-level defaults for this kind.
    pub fn defaults(&self) -> StyleOverrides {
        let base = StyleOverrides::new();
        match self.kind {
            LayerKind::TriangleEdges => base.stroke(Color::BLACK).line_width(1.0),
            LayerKind::PolygonEdges { .. } => base.stroke(Color::WHITE).line_width(1.5),
            LayerKind::TriangleCenters { .. } => base.fill(Color::rgb(0x88, 0x88, 0x88)).stroke(Color::WHITE).radius(4.0),
            LayerKind::PolygonCenters { .. } => base.fill(Color::BLACK).stroke(Color::WHITE).radius(5.0),
            LayerKind::TriangleLabels { .. } | LayerKind::PolygonLabels { .. } => base.fill(Color::BLACK),
            LayerKind::PolygonColors { .. } => base.line_width(1.0),
            LayerKind::Drainage { .. } => base.fill(Color::rgb(0x00, 0x00, 0x00).with_alpha(0x99)),
            LayerKind::Rivers { .. } => base.stroke(Color::rgb(0x22, 0x55, 0x88)).line_width(0.5),
            LayerKind::Springs { .. } => base.fill(Color::WHITE).stroke(Color::BLACK).line_width(0.5).radius(3.0),
        }
    }

    /// Global defaults < layer defaults < caller overrides.
    pub fn resolved_style(&self) -> Style {
        Style::merge(&self.defaults(), &self.style)
    }

    /// Emit this layer's draw calls. The caller has already applied `style`.
    pub fn draw(&self, canvas: &mut dyn Canvas, mesh: &TriangleMesh, style: &Style) -> Result<()> {
        match &self.kind {
            LayerKind::TriangleEdges => {
                canvas.begin_path();
                for s in 0..mesh.num_solid_sides() {
                    if s < mesh.s_opposite(s) {
                        canvas.move_to(mesh.r_pos(mesh.s_begin_r(s)));
                        canvas.line_to(mesh.r_pos(mesh.s_end_r(s)));
                    }
                }
                canvas.stroke();
            }
            LayerKind::PolygonEdges { color } => draw_polygon_edges(canvas, mesh, color.as_ref()),
            LayerKind::TriangleCenters { color } => {
                for t in 0..mesh.num_solid_triangles() {
                    draw_point(canvas, mesh.t_pos(t), style.radius, color.as_ref().map(|f| f(t)));
                }
            }
            LayerKind::PolygonCenters { color } => {
                for r in 0..mesh.num_solid_regions() {
                    let radius = if mesh.r_is_boundary(r) {
                        style.radius / 2.0
                    } else {
                        style.radius
                    };
                    draw_point(canvas, mesh.r_pos(r), radius, color.as_ref().map(|f| f(r)));
                }
            }
            LayerKind::TriangleLabels { label } => {
                for t in 0..mesh.num_solid_triangles() {
                    if let Some(text) = label(t) {
                        canvas.fill_text(&text, mesh.t_pos(t));
                    }
                }
            }
            LayerKind::PolygonLabels { label } => {
                for r in 0..mesh.num_solid_regions() {
                    if let Some(text) = label(r) {
                        canvas.fill_text(&text, mesh.r_pos(r));
                    }
                }
            }
            LayerKind::PolygonColors { color } => {
                for r in 0..mesh.num_solid_regions() {
                    let Some(fill) = color(r) else { continue };
                    canvas.set_fill(fill);
                    canvas.set_stroke(fill);
                    let triangles = mesh.r_circulate_t(r);
                    canvas.begin_path();
                    canvas.move_to(mesh.t_pos(triangles[0]));
                    for &t in &triangles[1..] {
                        canvas.line_to(mesh.t_pos(t));
                    }
                    canvas.close_path();
                    canvas.fill();
                    if style.line_width > 0.0 {
                        canvas.stroke();
                    }
                }
            }
            LayerKind::Drainage { t_downslope_s, r_ocean } => {
                require_len("t_downslope_s", t_downslope_s, mesh.num_solid_triangles())?;
                require_len("r_ocean", r_ocean, mesh.num_regions())?;
                for t in 0..mesh.num_solid_triangles() {
                    let Some(s) = t_downslope_s[t] else { continue };
                    if s >= mesh.num_sides() {
                        return Err(MapError::InvalidMeshReference {
                            kind: ElementKind::Side,
                            index: s,
                            count: mesh.num_sides(),
                        });
                    }
                    let next = mesh.s_outer_t(s);
                    if next == t {
                        continue;
                    }
                    if r_ocean[mesh.s_begin_r(s)] || r_ocean[mesh.s_end_r(s)] {
                        continue;
                    }
                    draw_arrow(canvas, mesh.t_pos(t), mesh.t_pos(next));
                }
            }
            LayerKind::Rivers { s_flow } => {
                require_len("s_flow", s_flow, mesh.num_solid_sides())?;
                for s in 0..mesh.num_solid_sides() {
                    let flow = s_flow[s];
                    if !(flow > 0.0) {
                        continue;
                    }
                    canvas.set_line_width(river_width(style.line_width, flow));
                    stroke_line(canvas, mesh.t_pos(mesh.s_inner_t(s)), mesh.t_pos(mesh.s_outer_t(s)));
                }
            }
            LayerKind::Springs { spring_t } => {
                for &t in spring_t.iter() {
                    let t = mesh.check_triangle(t)?;
                    circle_path(canvas, mesh.t_pos(t), style.radius);
                    canvas.fill();
                    canvas.stroke();
                }
            }
        }
        Ok(())
    }
}

/// Stroke width of a river side: area grows with flow, so width follows
/// its square root.
pub fn river_width(base: f64, flow: f32) -> f64 {
    base * (flow as f64).sqrt()
}

fn draw_polygon_edges(canvas: &mut dyn Canvas, mesh: &TriangleMesh, color: Option<&EdgeColorFn<'_>>) {
    let canonical = |s: usize| mesh.s_inner_t(s) > mesh.s_outer_t(s);
    match color {
        None => {
            canvas.begin_path();
            for s in (0..mesh.num_sides()).filter(|&s| canonical(s)) {
                canvas.move_to(mesh.t_pos(mesh.s_inner_t(s)));
                canvas.line_to(mesh.t_pos(mesh.s_outer_t(s)));
            }
            canvas.stroke();
        }
        Some(color) => {
            for s in (0..mesh.num_sides()).filter(|&s| canonical(s)) {
                let (inner, outer) = (mesh.s_inner_t(s), mesh.s_outer_t(s));
                let Some(stroke) = color(s, inner, outer) else { continue };
                canvas.set_stroke(stroke);
                stroke_line(canvas, mesh.t_pos(inner), mesh.t_pos(outer));
            }
        }
    }
}

/// `None` color: plain style, filled and outlined. `Some(None)`: skipped.
fn draw_point(canvas: &mut dyn Canvas, at: Point, radius: f64, color: Option<Option<Color>>) {
    match color {
        None => {
            circle_path(canvas, at, radius);
            canvas.fill();
            canvas.stroke();
        }
        Some(Some(fill)) => {
            canvas.set_fill(fill);
            circle_path(canvas, at, radius);
            canvas.fill();
        }
        Some(None) => {}
    }
}

/// Layers in painter's order; later entries draw over earlier ones.
#[derive(Default)]
pub struct LayerList<'a> {
    layers: Vec<Option<Layer<'a>>>,
}

impl<'a> LayerList<'a> {
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn push(mut self, layer: Layer<'a>) -> Self {
        self.layers.push(Some(layer));
        self
    }

    /// Pushes `layer` only when `condition` holds; otherwise a skipped slot.
    pub fn push_if(mut self, condition: bool, layer: Layer<'a>) -> Self {
        self.layers.push(condition.then_some(layer));
        self
    }

    pub fn maybe(mut self, layer: Option<Layer<'a>>) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn layers(&self) -> &[Option<Layer<'a>>] {
        &self.layers
    }

    /// Names of the layers that will draw, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.layers.iter().flatten().map(Layer::name).collect()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
