//! Polygon map generation library
//!
//! Builds island maps on a half-edge dual mesh and draws them as stacks of
//! layers. Re-exports modules for use by binaries and tools.

pub mod biomes;
pub mod canvas;
pub mod diagram;
pub mod dual;
pub mod elevation;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layers;
pub mod map_export;
pub mod mesh;
pub mod moisture;
pub mod pipeline;
pub mod raster;
pub mod render;
pub mod rivers;
pub mod seeds;
pub mod style;
pub mod viewer;
pub mod water;

pub use error::{MapError, Result};
