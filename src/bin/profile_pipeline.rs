//! Profiling tool to identify performance bottlenecks

use std::time::{Duration, Instant};

use polygon_mapgen::diagram::{Diagram, Show};
use polygon_mapgen::dual::DualMeshBuilder;
use polygon_mapgen::mesh::MeshBuilder;
use polygon_mapgen::pipeline::{recompute, MapParams, TerrainStages};
use polygon_mapgen::raster::RasterCanvas;
use polygon_mapgen::render::RenderOptions;
use polygon_mapgen::seeds::DiagramSeeds;

fn percent(part: Duration, total: Duration) -> f64 {
    100.0 * part.as_secs_f64() / total.as_secs_f64()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let spacing = 5.0;
    let seed = 1337u64;
    let size = 1000;

    println!("=== Performance Profiling ===");

    // Profile mesh construction
    let start = Instant::now();
    let mesh = MeshBuilder::new(spacing).seed(seed).build()?;
    let mesh_time = start.elapsed();
    println!(
        "Mesh construction: {:?} ({} regions, {} triangles)",
        mesh_time,
        mesh.num_solid_regions(),
        mesh.num_solid_triangles()
    );

    // Profile dual center mixing
    let start = Instant::now();
    let _dual = DualMeshBuilder::new(&mesh).mix(1.0)?;
    let dual_time = start.elapsed();
    println!("Dual mixing: {:?}", dual_time);

    // Profile the stage pipeline
    let seeds = DiagramSeeds::from_master(seed);
    let params = MapParams::default();
    let start = Instant::now();
    let snapshot = recompute(&TerrainStages, &mesh, &seeds, &params)?;
    let recompute_time = start.elapsed();
    println!("Recompute: {:?}", recompute_time);
    println!("  Rivers: {} of {} springs", snapshot.river_t.len(), snapshot.spring_t.len());

    // Profile rasterizing (the big one)
    let mut diagram = Diagram::new(mesh, seeds)?;
    diagram.recompute()?;
    let mut render_time = Duration::ZERO;
    for &show in Show::all() {
        diagram.set_show(show);
        let mut canvas = RasterCanvas::new(size, size);
        let start = Instant::now();
        diagram.render(&mut canvas, &RenderOptions::default())?;
        let elapsed = start.elapsed();
        println!("  Render {:<10} {:?}", show.name(), elapsed);
        render_time += elapsed;
    }
    println!("Render all views: {:?}", render_time);

    // Summary
    let total = mesh_time + dual_time + recompute_time + render_time;
    println!("\n=== Summary ===");
    println!("Mesh:       {:>8.2}% ({:?})", percent(mesh_time, total), mesh_time);
    println!("Dual:       {:>8.2}% ({:?})", percent(dual_time, total), dual_time);
    println!("Recompute:  {:>8.2}% ({:?})", percent(recompute_time, total), recompute_time);
    println!("Render:     {:>8.2}% ({:?})", percent(render_time, total), render_time);
    println!("─────────────────────────────────");
    println!("Total:      {:?}", total);
    Ok(())
}
