use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use polygon_mapgen::diagram::{Diagram, Show};
use polygon_mapgen::mesh::MeshBuilder;
use polygon_mapgen::pipeline::MapParams;
use polygon_mapgen::raster::RasterCanvas;
use polygon_mapgen::render::RenderOptions;
use polygon_mapgen::seeds::DiagramSeeds;
use polygon_mapgen::viewer;

#[derive(Parser, Debug)]
#[command(name = "polygon_mapgen")]
#[command(about = "Generate polygon island maps and draw them as layered diagrams")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Distance between mesh points in map units (map is 1000 units wide)
    #[arg(long)]
    spacing: Option<f64>,

    /// Seed for the mesh point jitter
    #[arg(long)]
    jitter_seed: Option<u64>,

    /// What to draw: points, delaunay, voronoi, labels, water, ocean,
    /// elevation, drainage, rivers, moisture, biomes
    #[arg(long)]
    show: Option<Show>,

    /// Dual centers: 0 = centroids, 1 = circumcenters
    #[arg(long)]
    mix: Option<f64>,

    /// Number of rivers
    #[arg(long)]
    rivers: Option<usize>,

    #[arg(long, allow_negative_numbers = true)]
    temperature_bias: Option<f32>,

    #[arg(long, allow_negative_numbers = true)]
    moisture_bias: Option<f32>,

    /// Island roundness (0 = noisy, 1 = round)
    #[arg(long)]
    round: Option<f64>,

    /// Island size (0 = small, 1 = fills the map)
    #[arg(long)]
    inflate: Option<f64>,

    /// JSON file with defaults for any of the options above
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the rendered map to this PNG file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output image size in pixels
    #[arg(long, default_value = "1000")]
    size: u32,

    /// Zoom about the map center
    #[arg(long, default_value = "1.0")]
    zoom: f64,

    /// Export the computed map as JSON
    #[arg(long)]
    export_map: Option<PathBuf>,

    /// Open the interactive viewer
    #[arg(long)]
    view: bool,
}

/// Settings read from `--config`; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    seed: Option<u64>,
    spacing: Option<f64>,
    jitter_seed: Option<u64>,
    show: Option<Show>,
    mix: Option<f64>,
    params: MapParams,
}

/// Fully resolved run settings.
#[derive(Debug, PartialEq)]
struct Settings {
    seed: u64,
    spacing: f64,
    jitter_seed: u64,
    show: Show,
    mix: f64,
    params: MapParams,
}

const DEFAULT_SPACING: f64 = 20.0;

fn load_config(path: &Path) -> Result<FileConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Defaults < config file < command line.
fn resolve(args: &Args, file: FileConfig, random_seed: impl FnOnce() -> u64) -> Settings {
    let mut params = file.params;
    if let Some(rivers) = args.rivers {
        params.num_rivers = rivers;
    }
    if let Some(bias) = args.temperature_bias {
        params.temperature_bias = bias;
    }
    if let Some(bias) = args.moisture_bias {
        params.moisture_bias = bias;
    }
    if let Some(round) = args.round {
        params.island.round = round;
    }
    if let Some(inflate) = args.inflate {
        params.island.inflate = inflate;
    }
    Settings {
        seed: args.seed.or(file.seed).unwrap_or_else(random_seed),
        spacing: args.spacing.or(file.spacing).unwrap_or(DEFAULT_SPACING),
        jitter_seed: args.jitter_seed.or(file.jitter_seed).unwrap_or(0),
        show: args.show.or(file.show).unwrap_or_default(),
        mix: args.mix.or(file.mix).unwrap_or(0.0),
        params,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let file = match &args.config {
        Some(path) => load_config(path)?,
        None => FileConfig::default(),
    };
    let settings = resolve(&args, file, rand::random);
    let options = RenderOptions::with_zoom(args.zoom)?;

    println!("Generating map with seed: {}", settings.seed);
    let mesh = MeshBuilder::new(settings.spacing).seed(settings.jitter_seed).build()?;
    println!(
        "Mesh: {} regions, {} triangles",
        mesh.num_solid_regions(),
        mesh.num_solid_triangles()
    );

    let mut diagram = Diagram::new(mesh, DiagramSeeds::from_master(settings.seed))?;
    diagram.set_params(settings.params);
    diagram.set_show(settings.show);
    diagram.set_center_mix(settings.mix)?;

    let snapshot = diagram.recompute()?;
    let land = snapshot.r_water.iter().filter(|&&w| !w).count();
    println!("Land regions: {}, rivers: {}", land, snapshot.river_t.len());

    if let Some(path) = &args.output {
        let mut canvas = RasterCanvas::new(args.size, args.size);
        diagram.render(&mut canvas, &options)?;
        canvas.save_png(path)?;
        println!("Saved {} view to: {}", settings.show, path.display());
    }

    if let Some(path) = &args.export_map {
        diagram.export()?.write_json(path)?;
        println!("Exported map to: {}", path.display());
    }

    if args.view {
        viewer::run_viewer(diagram, args.size as usize, options)?;
    } else if args.output.is_none() && args.export_map.is_none() {
        println!("Nothing to write; pass --output, --export-map or --view.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_beats_config_beats_defaults() {
        let args = Args::parse_from(["polygon_mapgen", "--rivers", "7", "--temperature-bias", "-0.2", "--show", "rivers"]);
        let file: FileConfig = serde_json::from_str(
            r#"{ "seed": 5, "show": "elevation", "params": { "num_rivers": 50, "moisture_bias": 0.1 } }"#,
        )
        .unwrap();
        let settings = resolve(&args, file, || unreachable!());

        assert_eq!(settings.seed, 5);
        assert_eq!(settings.show, Show::Rivers);
        assert_eq!(settings.params.num_rivers, 7);
        assert_eq!(settings.params.temperature_bias, -0.2);
        assert_eq!(settings.params.moisture_bias, 0.1);
        assert_eq!(settings.params.island, MapParams::default().island);
        assert_eq!(settings.spacing, DEFAULT_SPACING);
    }

    #[test]
    fn test_random_seed_only_when_unset() {
        let args = Args::parse_from(["polygon_mapgen"]);
        let settings = resolve(&args, FileConfig::default(), || 123);
        assert_eq!(settings.seed, 123);
        assert_eq!(settings.show, Show::Biomes);
        assert_eq!(settings.params, MapParams::default());
    }

    #[test]
    fn test_unknown_config_keys_rejected() {
        assert!(serde_json::from_str::<FileConfig>(r#"{ "sead": 1 }"#).is_err());
    }
}
