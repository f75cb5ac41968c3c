//! Elevation from distance to the coast
//!
//! Triangles are ranked by breadth-first distance from the coastline. The
//! search remembers which side each land triangle was reached through; the
//! opposite of that side is its downslope side, which rivers later follow
//! back to the sea. Crossing a lake costs nothing, so lakes come out flat.

use std::collections::VecDeque;

use rand::Rng;

use crate::error::{require_len, Result};
use crate::mesh::TriangleMesh;

/// Highest elevation an ocean region may have after averaging.
const MAX_OCEAN_ELEVATION: f32 = -0.01;

/// Per-triangle output of the elevation stage.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleElevation {
    /// -1.0 (deepest ocean) to 1.0 (farthest from any coast)
    pub t_elevation: Vec<f32>,
    /// Search distance from the coastline; `None` if unreachable.
    pub t_coastdistance: Vec<Option<u32>>,
    /// Side the water leaves through, `None` for ocean and sinks.
    pub t_downslope_s: Vec<Option<usize>>,
}

pub fn assign_t_elevation<R: Rng>(
    mesh: &TriangleMesh,
    r_ocean: &[bool],
    r_water: &[bool],
    rng: &mut R,
) -> Result<TriangleElevation> {
    require_len("r_ocean", r_ocean, mesh.num_regions())?;
    require_len("r_water", r_water, mesh.num_regions())?;

    let num_triangles = mesh.num_triangles();
    let t_ocean = |t: usize| r_ocean[mesh.s_begin_r(3 * t)];
    let r_lake = |r: usize| r_water[r] && !r_ocean[r];
    let s_lake = |s: usize| r_lake(mesh.s_begin_r(s)) || r_lake(mesh.s_end_r(s));

    let mut t_coastdistance: Vec<Option<u32>> = vec![None; num_triangles];
    let mut t_downslope_s = vec![None; num_triangles];
    let mut queue = VecDeque::new();

    for t in 0..num_triangles {
        if !t_ocean(t) {
            continue;
        }
        let on_coast = (0..3).any(|j| !t_ocean(mesh.s_outer_t(3 * t + j)));
        if on_coast {
            t_coastdistance[t] = Some(0);
            queue.push_back(t);
        }
    }

    let mut max_land_distance = 1;
    let mut max_ocean_distance = 1;
    while let Some(current) = queue.pop_front() {
        let current_distance = t_coastdistance[current].unwrap_or(0);
        let offset = rng.gen_range(0..3);
        for j in 0..3 {
            let s = 3 * current + (j + offset) % 3;
            let neighbor = mesh.s_outer_t(s);
            let lake = s_lake(s);
            let distance = current_distance + if lake { 0 } else { 1 };
            let improves = match t_coastdistance[neighbor] {
                None => true,
                Some(existing) => distance < existing,
            };
            if !improves {
                continue;
            }
            t_coastdistance[neighbor] = Some(distance);
            if t_ocean(neighbor) {
                max_ocean_distance = max_ocean_distance.max(distance);
                t_downslope_s[neighbor] = None;
            } else {
                max_land_distance = max_land_distance.max(distance);
                t_downslope_s[neighbor] = Some(mesh.s_opposite(s));
            }
            if lake {
                queue.push_front(neighbor);
            } else {
                queue.push_back(neighbor);
            }
        }
    }

    let t_elevation = (0..num_triangles)
        .map(|t| {
            let d = t_coastdistance[t].unwrap_or(0) as f32;
            if t_ocean(t) {
                -d / max_ocean_distance as f32
            } else {
                d / max_land_distance as f32
            }
        })
        .collect();

    Ok(TriangleElevation {
        t_elevation,
        t_coastdistance,
        t_downslope_s,
    })
}

/// Region elevation: mean of the surrounding triangles, kept below sea
/// level for ocean regions.
pub fn assign_r_elevation(mesh: &TriangleMesh, t_elevation: &[f32], r_ocean: &[bool]) -> Result<Vec<f32>> {
    require_len("t_elevation", t_elevation, mesh.num_triangles())?;
    require_len("r_ocean", r_ocean, mesh.num_regions())?;

    let r_elevation = (0..mesh.num_regions())
        .map(|r| {
            let triangles = mesh.r_circulate_t(r);
            let sum: f32 = triangles.iter().map(|&t| t_elevation[t]).sum();
            let mean = sum / triangles.len().max(1) as f32;
            if r_ocean[r] {
                mean.min(MAX_OCEAN_ELEVATION)
            } else {
                mean
            }
        })
        .collect();
    Ok(r_elevation)
}
