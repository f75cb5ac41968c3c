//! Error types for mesh queries, recomputation and rendering.
//!
//! Geometry and ordering errors abort the current recompute or render; the
//! caller keeps whatever snapshot it had before.

use kurbo::Point;

/// Which element family an index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Region,
    Triangle,
    Side,
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementKind::Region => write!(f, "region"),
            ElementKind::Triangle => write!(f, "triangle"),
            ElementKind::Side => write!(f, "side"),
        }
    }
}

/// Errors that can occur while building meshes, recomputing a snapshot, or
/// drawing a diagram.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// An element id outside `[0, count)`.
    #[error("{kind} {index} out of range (mesh has {count})")]
    InvalidMeshReference {
        kind: ElementKind,
        index: usize,
        count: usize,
    },

    /// Circumcenter requested for collinear or coincident points.
    #[error("degenerate triangle ({a:?}, {b:?}, {c:?}) has no circumcenter")]
    DegenerateGeometry { a: Point, b: Point, c: Point },

    /// An attribute array was absent or shorter than the mesh requires.
    /// Always an ordering bug in the caller.
    #[error("attribute `{name}` has {found} entries, expected {expected}")]
    MissingAttribute {
        name: &'static str,
        expected: usize,
        found: usize,
    },

    /// Rendering was asked for before any recompute succeeded.
    #[error("no snapshot computed yet; call recompute first")]
    StaleSnapshot,

    /// Mesh construction parameters that cannot produce a mesh.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// Zoom that is not a finite positive factor.
    #[error("zoom {0} must be finite and greater than 0")]
    InvalidZoom(f64),

    /// A color literal that is not `#rrggbb` or `#rrggbbaa`.
    #[error("invalid color literal `{0}`")]
    InvalidColor(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MapError>;

/// Checks that an attribute array covers `expected` elements.
pub fn require_len<T>(name: &'static str, values: &[T], expected: usize) -> Result<()> {
    if values.len() < expected {
        return Err(MapError::MissingAttribute {
            name,
            expected,
            found: values.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_len() {
        assert!(require_len("r_water", &[true, false], 2).is_ok());
        let err = require_len("r_water", &[true], 2).unwrap_err();
        assert!(matches!(
            err,
            MapError::MissingAttribute { name: "r_water", expected: 2, found: 1 }
        ));
    }

    #[test]
    fn test_messages_name_the_element() {
        let err = MapError::InvalidMeshReference {
            kind: ElementKind::Triangle,
            index: 12,
            count: 10,
        };
        assert_eq!(err.to_string(), "triangle 12 out of range (mesh has 10)");
    }
}
