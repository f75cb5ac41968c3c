//! Half-edge dual mesh
//!
//! The same index space describes two meshes at once: regions are the
//! vertices of the triangle mesh and the polygons of its dual, triangles are
//! the faces of the triangle mesh and the vertices of the dual. Every
//! triangle owns three directed sides; side `s` belongs to triangle `s / 3`.
//!
//! Solid elements come first. A single ghost region closes the hull: every
//! hull side gets a ghost triangle joining it to the ghost region, so every
//! side has an opposite and circulation never hits an open edge.

use std::collections::HashMap;

use kurbo::Point;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{ElementKind, MapError, Result};
use crate::geometry;

/// Side length of the logical square every mesh lives in.
pub const MAP_SIZE: f64 = 1000.0;

/// Finest grid `MeshBuilder` will lay out, in cells per axis.
pub const MAX_GRID_CELLS: usize = 2000;

/// A closed triangle mesh and its polygon dual.
#[derive(Clone, Debug)]
pub struct TriangleMesh {
    /// Region positions; the ghost region sits last.
    r_pos: Vec<Point>,
    /// Triangle centers (centroids unless replaced via `with_centers`).
    t_center: Vec<Point>,
    /// Region each side starts at.
    s_start_r: Vec<usize>,
    s_opposite: Vec<usize>,
    /// One side ending at each region, the starting point for circulation.
    r_in_s: Vec<usize>,
    r_boundary: Vec<bool>,
    num_solid_regions: usize,
    num_solid_triangles: usize,
}

#[inline]
pub fn s_next(s: usize) -> usize {
    if s % 3 == 2 {
        s - 2
    } else {
        s + 1
    }
}

#[inline]
pub fn s_prev(s: usize) -> usize {
    if s % 3 == 0 {
        s + 2
    } else {
        s - 1
    }
}

impl TriangleMesh {
    /// Build a mesh from solid points and consistently wound triangles.
    ///
    /// The triangles must form a manifold disk: every directed edge appears
    /// at most once and the hull is a single loop.
    pub fn from_triangles(points: Vec<Point>, triangles: &[[usize; 3]]) -> Result<Self> {
        let num_solid_regions = points.len();
        let num_solid_triangles = triangles.len();
        if num_solid_triangles == 0 {
            return Err(MapError::InvalidMesh("no triangles".to_string()));
        }

        let mut s_start_r = Vec::with_capacity(3 * num_solid_triangles + 64);
        for tri in triangles {
            for &r in tri {
                if r >= num_solid_regions {
                    return Err(MapError::InvalidMeshReference {
                        kind: ElementKind::Region,
                        index: r,
                        count: num_solid_regions,
                    });
                }
                s_start_r.push(r);
            }
        }

        let solid_sides = s_start_r.len();
        let mut edge_side = HashMap::with_capacity(solid_sides);
        for s in 0..solid_sides {
            let key = (s_start_r[s], s_start_r[s_next(s)]);
            if edge_side.insert(key, s).is_some() {
                return Err(MapError::InvalidMesh(format!(
                    "directed edge {:?} appears twice (inconsistent winding?)",
                    key
                )));
            }
        }

        // Close every hull side with a ghost triangle (v, u, ghost).
        let ghost_r = num_solid_regions;
        let hull: Vec<usize> = (0..solid_sides)
            .filter(|&s| !edge_side.contains_key(&(s_start_r[s_next(s)], s_start_r[s])))
            .collect();
        for &s in &hull {
            let u = s_start_r[s];
            let v = s_start_r[s_next(s)];
            let base = s_start_r.len();
            s_start_r.extend_from_slice(&[v, u, ghost_r]);
            edge_side.insert((v, u), base);
            edge_side.insert((u, ghost_r), base + 1);
            edge_side.insert((ghost_r, v), base + 2);
        }

        let num_sides = s_start_r.len();
        let mut s_opposite = vec![0; num_sides];
        for s in 0..num_sides {
            let begin = s_start_r[s];
            let end = s_start_r[s_next(s)];
            match edge_side.get(&(end, begin)) {
                Some(&opposite) => s_opposite[s] = opposite,
                None => {
                    return Err(MapError::InvalidMesh(format!(
                        "side {} ({} -> {}) has no opposite after closing the hull",
                        s, begin, end
                    )))
                }
            }
        }

        let mut r_pos = points;
        r_pos.push(Point::new(MAP_SIZE / 2.0, MAP_SIZE / 2.0));

        let mut r_in_s = vec![usize::MAX; num_solid_regions + 1];
        for s in 0..num_sides {
            r_in_s[s_start_r[s_next(s)]] = s;
        }
        if let Some(r) = r_in_s.iter().position(|&s| s == usize::MAX) {
            return Err(MapError::InvalidMesh(format!("region {} is not used by any triangle", r)));
        }

        let mut r_boundary = vec![false; num_solid_regions + 1];
        for &s in &hull {
            r_boundary[s_start_r[s]] = true;
            r_boundary[s_start_r[s_next(s)]] = true;
        }

        let num_triangles = num_sides / 3;
        let t_center = (0..num_triangles)
            .map(|t| {
                let a = r_pos[s_start_r[3 * t]];
                let b = r_pos[s_start_r[3 * t + 1]];
                if t < num_solid_triangles {
                    geometry::centroid(a, b, r_pos[s_start_r[3 * t + 2]])
                } else {
                    a.midpoint(b)
                }
            })
            .collect();

        Ok(Self {
            r_pos,
            t_center,
            s_start_r,
            s_opposite,
            r_in_s,
            r_boundary,
            num_solid_regions,
            num_solid_triangles,
        })
    }

    /// Same topology, different triangle centers.
    pub fn with_centers(&self, t_center: Vec<Point>) -> Result<Self> {
        if t_center.len() != self.num_triangles() {
            return Err(MapError::MissingAttribute {
                name: "t_center",
                expected: self.num_triangles(),
                found: t_center.len(),
            });
        }
        Ok(Self {
            t_center,
            ..self.clone()
        })
    }

    pub fn num_regions(&self) -> usize {
        self.r_pos.len()
    }

    pub fn num_solid_regions(&self) -> usize {
        self.num_solid_regions
    }

    pub fn num_triangles(&self) -> usize {
        self.t_center.len()
    }

    pub fn num_solid_triangles(&self) -> usize {
        self.num_solid_triangles
    }

    pub fn num_sides(&self) -> usize {
        self.s_start_r.len()
    }

    pub fn num_solid_sides(&self) -> usize {
        3 * self.num_solid_triangles
    }

    pub fn r_pos(&self, r: usize) -> Point {
        self.r_pos[r]
    }

    pub fn t_pos(&self, t: usize) -> Point {
        self.t_center[t]
    }

    pub fn s_begin_r(&self, s: usize) -> usize {
        self.s_start_r[s]
    }

    pub fn s_end_r(&self, s: usize) -> usize {
        self.s_start_r[s_next(s)]
    }

    pub fn s_inner_t(&self, s: usize) -> usize {
        s / 3
    }

    pub fn s_outer_t(&self, s: usize) -> usize {
        self.s_opposite[s] / 3
    }

    pub fn s_opposite(&self, s: usize) -> usize {
        self.s_opposite[s]
    }

    pub fn r_is_ghost(&self, r: usize) -> bool {
        r == self.num_solid_regions
    }

    pub fn t_is_ghost(&self, t: usize) -> bool {
        t >= self.num_solid_triangles
    }

    /// True for solid regions on the hull.
    pub fn r_is_boundary(&self, r: usize) -> bool {
        self.r_boundary[r]
    }

    /// Triangles around a region, in winding order.
    pub fn r_circulate_t(&self, r: usize) -> Vec<usize> {
        self.circulate(r).map(|s| s / 3).collect()
    }

    /// Neighboring regions of a region, in winding order. Boundary regions
    /// include the ghost region.
    pub fn r_circulate_r(&self, r: usize) -> Vec<usize> {
        self.circulate(r).map(|s| self.s_start_r[s]).collect()
    }

    pub fn t_circulate_r(&self, t: usize) -> [usize; 3] {
        [
            self.s_start_r[3 * t],
            self.s_start_r[3 * t + 1],
            self.s_start_r[3 * t + 2],
        ]
    }

    /// Validates a region id coming from outside the mesh.
    pub fn check_region(&self, r: usize) -> Result<usize> {
        if r < self.num_regions() {
            Ok(r)
        } else {
            Err(MapError::InvalidMeshReference {
                kind: ElementKind::Region,
                index: r,
                count: self.num_regions(),
            })
        }
    }

    /// Validates a triangle id coming from outside the mesh.
    pub fn check_triangle(&self, t: usize) -> Result<usize> {
        if t < self.num_triangles() {
            Ok(t)
        } else {
            Err(MapError::InvalidMeshReference {
                kind: ElementKind::Triangle,
                index: t,
                count: self.num_triangles(),
            })
        }
    }

    /// Walks the sides ending at `r`.
    fn circulate(&self, r: usize) -> impl Iterator<Item = usize> + '_ {
        let s0 = self.r_in_s[r];
        let mut incoming = Some(s0);
        std::iter::from_fn(move || {
            let current = incoming?;
            let next = self.s_opposite[s_next(current)];
            incoming = if next == s0 { None } else { Some(next) };
            Some(current)
        })
    }
}

/// Builds a jittered-grid mesh covering the logical map square.
#[derive(Clone, Debug)]
pub struct MeshBuilder {
    spacing: f64,
    jitter: f64,
    seed: u64,
}

impl MeshBuilder {
    pub fn new(spacing: f64) -> Self {
        Self {
            spacing,
            jitter: 0.2,
            seed: 0,
        }
    }

    /// Maximum jitter as a fraction of the grid step. Clamped below a
    /// quarter step so no triangle can flip.
    pub fn jitter(mut self, fraction: f64) -> Self {
        self.jitter = fraction.clamp(0.0, 0.24);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn build(&self) -> Result<TriangleMesh> {
        if !(self.spacing > 0.0) || self.spacing > MAP_SIZE / 2.0 {
            return Err(MapError::InvalidMesh(format!(
                "spacing {} must be in (0, {}]",
                self.spacing,
                MAP_SIZE / 2.0
            )));
        }
        let cells = (MAP_SIZE / self.spacing).round().max(2.0);
        if cells > MAX_GRID_CELLS as f64 {
            return Err(MapError::InvalidMesh(format!(
                "spacing {} needs {} cells per axis, at most {} allowed",
                self.spacing, cells, MAX_GRID_CELLS
            )));
        }
        let cells = cells as usize;
        let step = MAP_SIZE / cells as f64;
        let amount = self.jitter * step;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let index = |i: usize, j: usize| j * (cells + 1) + i;
        let mut points = Vec::with_capacity((cells + 1) * (cells + 1));
        for j in 0..=cells {
            for i in 0..=cells {
                let mut p = Point::new(i as f64 * step, j as f64 * step);
                let on_hull = i == 0 || j == 0 || i == cells || j == cells;
                if !on_hull && amount > 0.0 {
                    p.x += rng.gen_range(-amount..=amount);
                    p.y += rng.gen_range(-amount..=amount);
                }
                points.push(p);
            }
        }

        let mut triangles = Vec::with_capacity(2 * cells * cells);
        for j in 0..cells {
            for i in 0..cells {
                let a = index(i, j);
                let b = index(i + 1, j);
                let c = index(i + 1, j + 1);
                let d = index(i, j + 1);
                if (i + j) % 2 == 0 {
                    triangles.push([a, b, c]);
                    triangles.push([a, c, d]);
                } else {
                    triangles.push([a, b, d]);
                    triangles.push([b, c, d]);
                }
            }
        }

        TriangleMesh::from_triangles(points, &triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_mesh() -> TriangleMesh {
        MeshBuilder::new(250.0).seed(7).build().unwrap()
    }

    #[test]
    fn test_counts() {
        let mesh = small_mesh();
        // 4x4 cells, 5x5 points, 16 hull sides.
        assert_eq!(mesh.num_solid_regions(), 25);
        assert_eq!(mesh.num_regions(), 26);
        assert_eq!(mesh.num_solid_triangles(), 32);
        assert_eq!(mesh.num_triangles(), 32 + 16);
        assert_eq!(mesh.num_sides(), 3 * mesh.num_triangles());
        assert_eq!(mesh.num_solid_sides(), 96);
    }

    #[test]
    fn test_opposites_are_involutions() {
        let mesh = small_mesh();
        for s in 0..mesh.num_sides() {
            let o = mesh.s_opposite(s);
            assert_ne!(o, s);
            assert_eq!(mesh.s_opposite(o), s);
            assert_eq!(mesh.s_begin_r(s), mesh.s_end_r(o));
            assert_ne!(mesh.s_inner_t(s), mesh.s_outer_t(s));
        }
    }

    #[test]
    fn test_circulation_closes() {
        let mesh = small_mesh();
        for r in 0..mesh.num_regions() {
            let triangles = mesh.r_circulate_t(r);
            let neighbors = mesh.r_circulate_r(r);
            assert_eq!(triangles.len(), neighbors.len());
            for t in triangles {
                assert!(mesh.t_circulate_r(t).contains(&r));
            }
        }
        // Interior point of a grid split along alternating diagonals.
        let center = 2 * 5 + 2;
        assert!(!mesh.r_is_boundary(center));
        assert!(!mesh.r_circulate_r(center).contains(&mesh.num_solid_regions()));
    }

    #[test]
    fn test_boundary_regions_touch_ghost() {
        let mesh = small_mesh();
        let ghost = mesh.num_solid_regions();
        for r in 0..mesh.num_solid_regions() {
            let touches_ghost = mesh.r_circulate_r(r).contains(&ghost);
            assert_eq!(mesh.r_is_boundary(r), touches_ghost, "region {}", r);
        }
        assert_eq!(mesh.r_circulate_r(ghost).len(), 16);
    }

    #[test]
    fn test_solid_centers_are_centroids() {
        let mesh = small_mesh();
        for t in 0..mesh.num_solid_triangles() {
            let [a, b, c] = mesh.t_circulate_r(t);
            let expected = geometry::centroid(mesh.r_pos(a), mesh.r_pos(b), mesh.r_pos(c));
            assert_eq!(mesh.t_pos(t), expected);
        }
    }

    #[test]
    fn test_same_seed_same_points() {
        let a = MeshBuilder::new(100.0).seed(3).build().unwrap();
        let b = MeshBuilder::new(100.0).seed(3).build().unwrap();
        let c = MeshBuilder::new(100.0).seed(4).build().unwrap();
        let pos = |m: &TriangleMesh| (0..m.num_regions()).map(|r| m.r_pos(r)).collect::<Vec<_>>();
        assert_eq!(pos(&a), pos(&b));
        assert_ne!(pos(&a), pos(&c));
    }

    #[test]
    fn test_check_rejects_out_of_range() {
        let mesh = small_mesh();
        assert!(mesh.check_triangle(mesh.num_triangles() - 1).is_ok());
        assert!(matches!(
            mesh.check_triangle(mesh.num_triangles()),
            Err(MapError::InvalidMeshReference { kind: ElementKind::Triangle, .. })
        ));
        assert!(mesh.check_region(1000).is_err());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(MeshBuilder::new(0.0).build().is_err());
        assert!(matches!(
            MeshBuilder::new(0.001).build(),
            Err(MapError::InvalidMesh(_))
        ));
        assert!(MeshBuilder::new(MAP_SIZE / MAX_GRID_CELLS as f64 * 0.9).build().is_err());
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(0.0, 1.0)];
        assert!(TriangleMesh::from_triangles(points.clone(), &[[0, 1, 5]]).is_err());
        assert!(TriangleMesh::from_triangles(points, &[[0, 1, 2], [0, 1, 2]]).is_err());
    }
}
