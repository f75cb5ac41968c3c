//! Staged recompute of every map attribute
//!
//! Stages run in a fixed order, each reading only what earlier stages
//! produced:
//!
//! 1. water (noise + island shape)
//! 2. ocean (flood from the map edge)
//! 3. triangle elevation, coast distance, downslope sides
//! 4. region elevation
//! 5. spring candidates, shuffled; the first `num_rivers` become rivers
//! 6. side flow
//! 7. moisture seeds, then moisture
//! 8. biomes
//!
//! A run either yields a complete [`Snapshot`] or an error; there is no
//! partial result. Random generators are built fresh from the seeds on
//! every run, so equal inputs give equal snapshots.

use std::collections::BTreeSet;
use std::time::Instant;

use noise::Perlin;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::biomes::{self, Biome};
use crate::elevation::{self, TriangleElevation};
use crate::error::Result;
use crate::mesh::TriangleMesh;
use crate::moisture;
use crate::rivers;
use crate::seeds::DiagramSeeds;
use crate::water::{self, IslandShape};

/// Tunable parameters of one recompute.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapParams {
    pub island: IslandShape,
    /// How many spring candidates become rivers.
    pub num_rivers: usize,
    /// Added to every region's temperature before biome lookup.
    pub temperature_bias: f32,
    /// Added to every region's moisture before biome lookup.
    pub moisture_bias: f32,
}

impl Default for MapParams {
    fn default() -> Self {
        Self {
            island: IslandShape::default(),
            num_rivers: 30,
            temperature_bias: 0.0,
            moisture_bias: 0.0,
        }
    }
}

/// Every attribute array from one recompute.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub r_water: Vec<bool>,
    pub r_ocean: Vec<bool>,
    pub t_elevation: Vec<f32>,
    pub t_coastdistance: Vec<Option<u32>>,
    pub t_downslope_s: Vec<Option<usize>>,
    pub r_elevation: Vec<f32>,
    /// All spring candidates, in shuffled order.
    pub spring_t: Vec<usize>,
    /// The springs that became rivers.
    pub river_t: Vec<usize>,
    pub s_flow: Vec<f32>,
    pub r_moisture: Vec<f32>,
    pub r_biome: Vec<Biome>,
}

/// The stage functions the orchestrator calls, one method per stage.
///
/// [`TerrainStages`] forwards to the stage modules; other implementations
/// exist to swap a stage out (tests use one that fails on purpose).
pub trait StageFunctions {
    fn water(&self, mesh: &TriangleMesh, noise: &Perlin, shape: &IslandShape) -> Result<Vec<bool>> {
        water::assign_r_water(mesh, noise, shape)
    }

    fn ocean(&self, mesh: &TriangleMesh, r_water: &[bool]) -> Result<Vec<bool>> {
        water::assign_r_ocean(mesh, r_water)
    }

    fn elevation(
        &self,
        mesh: &TriangleMesh,
        r_ocean: &[bool],
        r_water: &[bool],
        rng: &mut ChaCha8Rng,
    ) -> Result<TriangleElevation> {
        elevation::assign_t_elevation(mesh, r_ocean, r_water, rng)
    }

    fn region_elevation(&self, mesh: &TriangleMesh, t_elevation: &[f32], r_ocean: &[bool]) -> Result<Vec<f32>> {
        elevation::assign_r_elevation(mesh, t_elevation, r_ocean)
    }

    fn springs(
        &self,
        mesh: &TriangleMesh,
        r_water: &[bool],
        t_elevation: &[f32],
        t_downslope_s: &[Option<usize>],
    ) -> Result<Vec<usize>> {
        rivers::find_spring_t(mesh, r_water, t_elevation, t_downslope_s)
    }

    fn flow(
        &self,
        mesh: &TriangleMesh,
        t_downslope_s: &[Option<usize>],
        river_t: &[usize],
        t_elevation: &[f32],
    ) -> Result<Vec<f32>> {
        rivers::assign_s_flow(mesh, t_downslope_s, river_t, t_elevation)
    }

    fn moisture_seeds(
        &self,
        mesh: &TriangleMesh,
        s_flow: &[f32],
        r_ocean: &[bool],
        r_water: &[bool],
    ) -> Result<BTreeSet<usize>> {
        moisture::find_moisture_seeds_r(mesh, s_flow, r_ocean, r_water)
    }

    fn moisture(&self, mesh: &TriangleMesh, r_water: &[bool], seeds: &BTreeSet<usize>) -> Result<Vec<f32>> {
        moisture::assign_r_moisture(mesh, r_water, seeds)
    }

    #[allow(clippy::too_many_arguments)]
    fn biomes(
        &self,
        mesh: &TriangleMesh,
        r_ocean: &[bool],
        r_water: &[bool],
        r_elevation: &[f32],
        r_moisture: &[f32],
        temperature_bias: f32,
        moisture_bias: f32,
    ) -> Result<Vec<Biome>> {
        biomes::assign_r_biome(
            mesh,
            r_ocean,
            r_water,
            r_elevation,
            r_moisture,
            temperature_bias,
            moisture_bias,
        )
    }
}

/// The production stage set.
#[derive(Clone, Copy, Debug, Default)]
pub struct TerrainStages;

impl StageFunctions for TerrainStages {}

/// Run every stage in order and bundle the results.
pub fn recompute<S: StageFunctions + ?Sized>(
    stages: &S,
    mesh: &TriangleMesh,
    seeds: &DiagramSeeds,
    params: &MapParams,
) -> Result<Snapshot> {
    let start = Instant::now();

    let noise = Perlin::new(seeds.island as u32);
    let r_water = stages.water(mesh, &noise, &params.island)?;
    let r_ocean = stages.ocean(mesh, &r_water)?;
    debug!(
        water = r_water.iter().filter(|&&w| w).count(),
        ocean = r_ocean.iter().filter(|&&o| o).count(),
        "water assigned"
    );

    let mut drainage_rng = ChaCha8Rng::seed_from_u64(seeds.drainage);
    let TriangleElevation {
        t_elevation,
        t_coastdistance,
        t_downslope_s,
    } = stages.elevation(mesh, &r_ocean, &r_water, &mut drainage_rng)?;
    let r_elevation = stages.region_elevation(mesh, &t_elevation, &r_ocean)?;
    debug!("elevation assigned");

    let mut spring_t = stages.springs(mesh, &r_water, &t_elevation, &t_downslope_s)?;
    let mut river_rng = ChaCha8Rng::seed_from_u64(seeds.rivers);
    spring_t.shuffle(&mut river_rng);
    let river_t: Vec<usize> = spring_t.iter().take(params.num_rivers).copied().collect();
    let s_flow = stages.flow(mesh, &t_downslope_s, &river_t, &t_elevation)?;
    debug!(springs = spring_t.len(), rivers = river_t.len(), "rivers traced");

    let moisture_seeds = stages.moisture_seeds(mesh, &s_flow, &r_ocean, &r_water)?;
    let r_moisture = stages.moisture(mesh, &r_water, &moisture_seeds)?;
    debug!(seeds = moisture_seeds.len(), "moisture assigned");

    let r_biome = stages.biomes(
        mesh,
        &r_ocean,
        &r_water,
        &r_elevation,
        &r_moisture,
        params.temperature_bias,
        params.moisture_bias,
    )?;

    info!(
        regions = mesh.num_solid_regions(),
        triangles = mesh.num_solid_triangles(),
        rivers = river_t.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "recomputed map"
    );

    Ok(Snapshot {
        r_water,
        r_ocean,
        t_elevation,
        t_coastdistance,
        t_downslope_s,
        r_elevation,
        spring_t,
        river_t,
        s_flow,
        r_moisture,
        r_biome,
    })
}
