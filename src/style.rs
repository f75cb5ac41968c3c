//! Drawing styles and their three-level merge.
//!
//! Precedence, lowest first: [`Style::default`] (global defaults), the
//! layer's own defaults, then the overrides the caller passed when building
//! the layer.

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};

/// An 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn hex(text: &str) -> Result<Self> {
        let invalid = || MapError::InvalidColor(text.to_string());
        let digits = text.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.is_ascii() || (digits.len() != 6 && digits.len() != 8) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Blend toward `other`; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let channel = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
        Color::rgba(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
            channel(self.a, other.a),
        )
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

/// A fully resolved drawing style.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub stroke: Color,
    pub fill: Color,
    pub line_width: f64,
    /// Global opacity applied on top of the colors' own alpha (0.0-1.0).
    pub alpha: f64,
    /// Radius for point layers.
    pub radius: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Color::BLACK,
            fill: Color::WHITE,
            line_width: 1.0,
            alpha: 1.0,
            radius: 5.0,
        }
    }
}

/// Partial style; `None` fields fall through to the level below.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleOverrides {
    pub stroke: Option<Color>,
    pub fill: Option<Color>,
    pub line_width: Option<f64>,
    pub alpha: Option<f64>,
    pub radius: Option<f64>,
}

impl StyleOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stroke(mut self, color: Color) -> Self {
        self.stroke = Some(color);
        self
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    pub fn line_width(mut self, width: f64) -> Self {
        self.line_width = Some(width);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Fields set in `self` win over the ones in `base`.
    fn over(&self, base: Style) -> Style {
        Style {
            stroke: self.stroke.unwrap_or(base.stroke),
            fill: self.fill.unwrap_or(base.fill),
            line_width: self.line_width.unwrap_or(base.line_width),
            alpha: self.alpha.unwrap_or(base.alpha).clamp(0.0, 1.0),
            radius: self.radius.unwrap_or(base.radius),
        }
    }
}

impl Style {
    /// Resolve `defaults < layer_defaults < overrides`.
    pub fn merge(layer_defaults: &StyleOverrides, overrides: &StyleOverrides) -> Style {
        overrides.over(layer_defaults.over(Style::default()))
    }
}
