//! Moisture from distance to fresh water
//!
//! Rivers and lakes seed a breadth-first search over land; moisture falls
//! off with the square root of normalized distance.

use std::collections::{BTreeSet, VecDeque};

use crate::error::{require_len, Result};
use crate::mesh::TriangleMesh;

/// Regions next to a flowing side, plus every lake region.
pub fn find_moisture_seeds_r(
    mesh: &TriangleMesh,
    s_flow: &[f32],
    r_ocean: &[bool],
    r_water: &[bool],
) -> Result<BTreeSet<usize>> {
    require_len("s_flow", s_flow, mesh.num_sides())?;
    require_len("r_ocean", r_ocean, mesh.num_regions())?;
    require_len("r_water", r_water, mesh.num_regions())?;

    let mut seeds = BTreeSet::new();
    for s in 0..mesh.num_solid_sides() {
        if s_flow[s] > 0.0 {
            seeds.insert(mesh.s_begin_r(s));
            seeds.insert(mesh.s_end_r(s));
        }
    }
    for r in 0..mesh.num_solid_regions() {
        if r_water[r] && !r_ocean[r] {
            seeds.insert(r);
        }
    }
    Ok(seeds)
}

/// Per-region moisture in `[0, 1]`.
pub fn assign_r_moisture(mesh: &TriangleMesh, r_water: &[bool], seeds: &BTreeSet<usize>) -> Result<Vec<f32>> {
    require_len("r_water", r_water, mesh.num_regions())?;

    let mut r_waterdistance: Vec<Option<u32>> = vec![None; mesh.num_regions()];
    let mut queue = VecDeque::new();
    for &r in seeds {
        mesh.check_region(r)?;
        r_waterdistance[r] = Some(0);
        queue.push_back(r);
    }

    let mut max_distance = 1;
    while let Some(current) = queue.pop_front() {
        let next_distance = r_waterdistance[current].unwrap_or(0) + 1;
        for neighbor in mesh.r_circulate_r(current) {
            if r_water[neighbor] || r_waterdistance[neighbor].is_some() {
                continue;
            }
            r_waterdistance[neighbor] = Some(next_distance);
            max_distance = max_distance.max(next_distance);
            queue.push_back(neighbor);
        }
    }

    let r_moisture = (0..mesh.num_regions())
        .map(|r| {
            if r_water[r] {
                return 1.0;
            }
            match r_waterdistance[r] {
                Some(d) => 1.0 - (d as f32 / max_distance as f32).sqrt(),
                None => 0.0,
            }
        })
        .collect();
    Ok(r_moisture)
}
