//! Water and ocean classification
//!
//! Land is a noisy island shape centered in the map square. Water regions
//! connected to the outside of the map are ocean; the rest are lakes.

use std::collections::VecDeque;

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::error::{require_len, Result};
use crate::mesh::{TriangleMesh, MAP_SIZE};

const FBM_OCTAVES: u32 = 5;

/// Island shape controls.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandShape {
    /// 0.0 = noisy coastline, 1.0 = round island
    pub round: f64,
    /// 0.0 = small island, 1.0 = land reaches the map edge
    pub inflate: f64,
}

impl Default for IslandShape {
    fn default() -> Self {
        Self {
            round: 0.5,
            inflate: 0.4,
        }
    }
}

/// Fractal noise in `[-1, 1]`, octaves normalized by total amplitude.
pub fn fbm(noise: &Perlin, x: f64, y: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..FBM_OCTAVES {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    total / max_value
}

/// Per-region water flag.
pub fn assign_r_water(mesh: &TriangleMesh, noise: &Perlin, shape: &IslandShape) -> Result<Vec<bool>> {
    let half = MAP_SIZE / 2.0;
    let r_water = (0..mesh.num_regions())
        .map(|r| {
            if mesh.r_is_ghost(r) || mesh.r_is_boundary(r) {
                return true;
            }
            let p = mesh.r_pos(r);
            let nx = (p.x - half) / half;
            let ny = (p.y - half) / half;
            let distance = nx.abs().max(ny.abs());
            let n = fbm(noise, nx, ny);
            let n = n * (1.0 - shape.round) + 0.5 * shape.round;
            n - (1.0 - shape.inflate) * distance * distance < 0.0
        })
        .collect();
    Ok(r_water)
}

/// Per-region ocean flag: water reachable from the ghost region through water.
pub fn assign_r_ocean(mesh: &TriangleMesh, r_water: &[bool]) -> Result<Vec<bool>> {
    require_len("r_water", r_water, mesh.num_regions())?;

    let mut r_ocean = vec![false; mesh.num_regions()];
    let mut queue = VecDeque::new();
    for r in 0..mesh.num_regions() {
        if r_water[r] && (mesh.r_is_ghost(r) || mesh.r_is_boundary(r)) {
            r_ocean[r] = true;
            queue.push_back(r);
        }
    }

    while let Some(current) = queue.pop_front() {
        for neighbor in mesh.r_circulate_r(current) {
            if r_water[neighbor] && !r_ocean[neighbor] {
                r_ocean[neighbor] = true;
                queue.push_back(neighbor);
            }
        }
    }

    Ok(r_ocean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuilder;
    use noise::Seedable;

    #[test]
    fn test_boundary_is_water() {
        let mesh = MeshBuilder::new(50.0).seed(1).build().unwrap();
        let noise = Perlin::new(1).set_seed(42);
        let r_water = assign_r_water(&mesh, &noise, &IslandShape::default()).unwrap();
        assert_eq!(r_water.len(), mesh.num_regions());
        for r in 0..mesh.num_regions() {
            if mesh.r_is_boundary(r) || mesh.r_is_ghost(r) {
                assert!(r_water[r]);
            }
        }
        assert!(r_water.iter().any(|&w| !w), "island has no land");
    }

    #[test]
    fn test_round_island_is_centered() {
        let mesh = MeshBuilder::new(50.0).seed(1).build().unwrap();
        let noise = Perlin::new(1).set_seed(42);
        let shape = IslandShape { round: 1.0, inflate: 0.5 };
        let r_water = assign_r_water(&mesh, &noise, &shape).unwrap();
        // With full rounding water depends on distance from the center only.
        for r in 0..mesh.num_solid_regions() {
            if mesh.r_is_boundary(r) {
                continue;
            }
            let p = mesh.r_pos(r);
            let d = ((p.x - 500.0).abs().max((p.y - 500.0).abs())) / 500.0;
            assert_eq!(r_water[r], 0.5 - 0.5 * d * d < 0.0);
        }
    }

    #[test]
    fn test_ocean_floods_from_edge_only() {
        let mesh = MeshBuilder::new(250.0).build().unwrap();
        // Everything is land except the hull and the center point.
        let center = 2 * 5 + 2;
        let mut r_water: Vec<bool> = (0..mesh.num_regions())
            .map(|r| mesh.r_is_ghost(r) || mesh.r_is_boundary(r))
            .collect();
        r_water[center] = true;

        let r_ocean = assign_r_ocean(&mesh, &r_water).unwrap();
        assert!(!r_ocean[center], "enclosed water is a lake");
        for r in 0..mesh.num_regions() {
            if mesh.r_is_boundary(r) {
                assert!(r_ocean[r]);
            }
            if !r_water[r] {
                assert!(!r_ocean[r]);
            }
        }
    }

    #[test]
    fn test_ocean_requires_water_array() {
        let mesh = MeshBuilder::new(250.0).build().unwrap();
        assert!(assign_r_ocean(&mesh, &[true; 3]).is_err());
    }
}
