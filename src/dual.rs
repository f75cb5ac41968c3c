//! Dual-mesh center mixing
//!
//! Moves every solid triangle center along the line from its centroid to its
//! circumcenter. At `mix = 0` the dual polygons are built from centroids; at
//! `mix = 1` they are the true circumcenter dual, which is a Voronoi diagram
//! when the triangulation is Delaunay.

use tracing::debug;

use crate::error::Result;
use crate::geometry::{centroid, circumcenter, mix};
use crate::mesh::TriangleMesh;

pub struct DualMeshBuilder<'a> {
    mesh: &'a TriangleMesh,
}

impl<'a> DualMeshBuilder<'a> {
    pub fn new(mesh: &'a TriangleMesh) -> Self {
        Self { mesh }
    }

    /// Build a mesh with the same topology and mixed triangle centers.
    /// `amount` is clamped to `[0, 1]`. Ghost triangle centers are kept.
    /// Circumcenters are only needed when `amount > 0`, so a degenerate
    /// triangle fails the build only then.
    pub fn mix(&self, amount: f64) -> Result<TriangleMesh> {
        let amount = amount.clamp(0.0, 1.0);
        let mesh = self.mesh;
        let mut t_center = Vec::with_capacity(mesh.num_triangles());
        for t in 0..mesh.num_triangles() {
            if mesh.t_is_ghost(t) {
                t_center.push(mesh.t_pos(t));
                continue;
            }
            let [a, b, c] = mesh.t_circulate_r(t).map(|r| mesh.r_pos(r));
            let center = centroid(a, b, c);
            if amount == 0.0 {
                t_center.push(center);
            } else {
                t_center.push(mix(center, circumcenter(a, b, c)?, amount));
            }
        }
        debug!(amount, triangles = mesh.num_solid_triangles(), "mixed dual centers");
        mesh.with_centers(t_center)
    }
}
