//! Draws a layer list onto a canvas.

use std::ops::{Deref, DerefMut};

use kurbo::{Affine, Rect, Vec2};
use tracing::trace;

use crate::canvas::Canvas;
use crate::error::{MapError, Result};
use crate::layers::Layer;
use crate::mesh::{TriangleMesh, MAP_SIZE};
use crate::style::Color;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    pub background: Color,
    /// Magnification about the map center; 1.0 shows the whole map.
    pub zoom: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: Color::rgb(0x44, 0x44, 0x7a),
            zoom: 1.0,
        }
    }
}

impl RenderOptions {
    /// Default options at `zoom`, which must be finite and positive.
    pub fn with_zoom(zoom: f64) -> Result<Self> {
        let options = Self {
            zoom,
            ..Self::default()
        };
        options.validate()?;
        Ok(options)
    }

    fn validate(&self) -> Result<()> {
        if self.zoom.is_finite() && self.zoom > 0.0 {
            Ok(())
        } else {
            Err(MapError::InvalidZoom(self.zoom))
        }
    }
}

/// Saves on creation and restores on drop, so an early return still
/// leaves the canvas balanced.
struct SaveGuard<'c> {
    canvas: &'c mut dyn Canvas,
}

impl<'c> SaveGuard<'c> {
    fn new(canvas: &'c mut dyn Canvas) -> Self {
        canvas.save();
        Self { canvas }
    }
}

impl Drop for SaveGuard<'_> {
    fn drop(&mut self) {
        self.canvas.restore();
    }
}

impl<'c> Deref for SaveGuard<'c> {
    type Target = dyn Canvas + 'c;

    fn deref(&self) -> &Self::Target {
        &*self.canvas
    }
}

impl DerefMut for SaveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.canvas
    }
}

/// Magnification by `zoom` about the map center.
pub fn zoom_transform(zoom: f64) -> Affine {
    let center = Vec2::new(MAP_SIZE / 2.0, MAP_SIZE / 2.0);
    Affine::translate(center) * Affine::scale(zoom) * Affine::translate(-center)
}

/// Draw `layers` in order. Skipped (`None`) entries emit nothing.
pub fn render(
    canvas: &mut dyn Canvas,
    mesh: &TriangleMesh,
    layers: &[Option<Layer<'_>>],
    options: &RenderOptions,
) -> Result<()> {
    options.validate()?;
    let (width, height) = canvas.size();
    let mut frame = SaveGuard::new(canvas);
    frame.transform(Affine::scale_non_uniform(width / MAP_SIZE, height / MAP_SIZE));
    frame.set_fill(options.background);
    frame.fill_rect(Rect::new(0.0, 0.0, MAP_SIZE, MAP_SIZE));
    if options.zoom != 1.0 {
        frame.transform(zoom_transform(options.zoom));
    }

    for layer in layers.iter().flatten() {
        let mut scope = SaveGuard::new(&mut *frame);
        let style = layer.resolved_style();
        scope.set_style(&style);
        trace!(layer = layer.name(), "drawing layer");
        layer.draw(&mut *scope, mesh, &style)?;
    }
    Ok(())
}
