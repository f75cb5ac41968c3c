//! One interactive map view
//!
//! A [`Diagram`] owns a mesh, the seeds and parameters that drive the
//! stages, a [`Show`] filter picking what to draw, and the last good
//! [`Snapshot`]. Setters only change inputs; [`Diagram::recompute`] swaps in
//! a new snapshot, or leaves the old one alone if any stage fails.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::canvas::Canvas;
use crate::dual::DualMeshBuilder;
use crate::error::{MapError, Result};
use crate::layers::{Layer, LayerList};
use crate::map_export::MapExport;
use crate::mesh::TriangleMesh;
use crate::pipeline::{self, MapParams, Snapshot, StageFunctions, TerrainStages};
use crate::render::{self, RenderOptions};
use crate::seeds::DiagramSeeds;
use crate::style::{Color, StyleOverrides};

/// What a diagram draws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Show {
    Points,
    Delaunay,
    Voronoi,
    Labels,
    Water,
    Ocean,
    Elevation,
    Drainage,
    Rivers,
    Moisture,
    #[default]
    Biomes,
}

impl Show {
    pub fn all() -> &'static [Show] {
        use Show::*;
        &[
            Points, Delaunay, Voronoi, Labels, Water, Ocean, Elevation, Drainage, Rivers, Moisture, Biomes,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Show::Points => "points",
            Show::Delaunay => "delaunay",
            Show::Voronoi => "voronoi",
            Show::Labels => "labels",
            Show::Water => "water",
            Show::Ocean => "ocean",
            Show::Elevation => "elevation",
            Show::Drainage => "drainage",
            Show::Rivers => "rivers",
            Show::Moisture => "moisture",
            Show::Biomes => "biomes",
        }
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Show {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Show::all()
            .iter()
            .copied()
            .find(|show| show.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Show::all().iter().map(Show::name).collect();
                format!("unknown show mode `{}` (expected one of: {})", s, names.join(", "))
            })
    }
}

const LAND: Color = Color::rgb(0xa0, 0x90, 0x77);
const LAKE: Color = Color::rgb(0x33, 0x66, 0x99);
const OCEAN: Color = Color::rgb(0x44, 0x44, 0x7a);
const COAST: Color = Color::rgb(0x00, 0x00, 0x00);
const RIVER: Color = Color::rgb(0x22, 0x55, 0x88);

/// Deep ocean to shallows below zero; lowland green through brown to snow
/// above.
pub fn elevation_color(e: f32) -> Color {
    if e < 0.0 {
        Color::rgb(0x22, 0x22, 0x55).lerp(Color::rgb(0x55, 0x66, 0xaa), 1.0 + e)
    } else if e < 0.5 {
        Color::rgb(0x55, 0x88, 0x44).lerp(Color::rgb(0x99, 0x88, 0x55), e * 2.0)
    } else {
        Color::rgb(0x99, 0x88, 0x55).lerp(Color::WHITE, (e - 0.5) * 2.0)
    }
}

/// Dry sand to wet green to blue.
pub fn moisture_color(m: f32) -> Color {
    if m < 0.5 {
        Color::rgb(0xcc, 0xbb, 0x88).lerp(Color::rgb(0x44, 0x99, 0x55), m * 2.0)
    } else {
        Color::rgb(0x44, 0x99, 0x55).lerp(Color::rgb(0x22, 0x55, 0x99), (m - 0.5) * 2.0)
    }
}

pub struct Diagram<S = TerrainStages> {
    mesh: TriangleMesh,
    /// `mesh` with triangle centers mixed toward circumcenters; what gets drawn.
    dual: TriangleMesh,
    seeds: DiagramSeeds,
    params: MapParams,
    show: Show,
    center_mix: f64,
    snapshot: Option<Snapshot>,
    stages: S,
}

impl Diagram<TerrainStages> {
    pub fn new(mesh: TriangleMesh, seeds: DiagramSeeds) -> Result<Self> {
        Self::with_stages(mesh, seeds, TerrainStages)
    }
}

impl<S: StageFunctions> Diagram<S> {
    /// A diagram whose recompute calls `stages`.
    pub fn with_stages(mesh: TriangleMesh, seeds: DiagramSeeds, stages: S) -> Result<Self> {
        let dual = DualMeshBuilder::new(&mesh).mix(0.0)?;
        Ok(Self {
            mesh,
            dual,
            seeds,
            params: MapParams::default(),
            show: Show::default(),
            center_mix: 0.0,
            snapshot: None,
            stages,
        })
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    pub fn dual(&self) -> &TriangleMesh {
        &self.dual
    }

    pub fn seeds(&self) -> DiagramSeeds {
        self.seeds
    }

    pub fn params(&self) -> &MapParams {
        &self.params
    }

    pub fn show(&self) -> Show {
        self.show
    }

    pub fn center_mix(&self) -> f64 {
        self.center_mix
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn set_params(&mut self, params: MapParams) {
        self.params = params;
    }

    pub fn set_seeds(&mut self, seeds: DiagramSeeds) {
        self.seeds = seeds;
    }

    pub fn set_show(&mut self, show: Show) {
        self.show = show;
    }

    /// Move dual centers between centroid (0) and circumcenter (1). On a
    /// degenerate triangle the previous dual stays.
    pub fn set_center_mix(&mut self, amount: f64) -> Result<()> {
        let amount = amount.clamp(0.0, 1.0);
        self.dual = DualMeshBuilder::new(&self.mesh).mix(amount)?;
        self.center_mix = amount;
        Ok(())
    }

    /// Run every stage and replace the snapshot, or keep the old one on
    /// error.
    pub fn recompute(&mut self) -> Result<&Snapshot> {
        match pipeline::recompute(&self.stages, &self.mesh, &self.seeds, &self.params) {
            Ok(snapshot) => Ok(&*self.snapshot.insert(snapshot)),
            Err(err) => {
                warn!(error = %err, "recompute failed; keeping previous snapshot");
                Err(err)
            }
        }
    }

    fn current(&self) -> Result<&Snapshot> {
        self.snapshot.as_ref().ok_or(MapError::StaleSnapshot)
    }

    /// Layers for the current show mode over the last snapshot.
    pub fn layers(&self) -> Result<LayerList<'_>> {
        let snap = self.current()?;
        let mesh = &self.dual;
        let coastline = move || {
            Layer::polygon_edges_colored(move |s, _, _| {
                let (a, b) = (mesh.s_begin_r(s), mesh.s_end_r(s));
                (snap.r_ocean[a] != snap.r_ocean[b]).then_some(COAST)
            })
            .with_style(StyleOverrides::new().line_width(2.0))
        };
        let elevation = move || {
            Layer::polygon_colors(move |r| Some(elevation_color(snap.r_elevation[r])))
        };
        let rivers = move || {
            Layer::rivers(&snap.s_flow).with_style(StyleOverrides::new().stroke(RIVER))
        };
        let outlines = StyleOverrides::new().stroke(Color::BLACK.with_alpha(0x40));

        let list = match self.show {
            Show::Points => LayerList::new().push(Layer::polygon_centers()),
            Show::Delaunay => LayerList::new()
                .push(Layer::triangle_edges())
                .push(Layer::polygon_centers()),
            Show::Voronoi => LayerList::new()
                .push(Layer::polygon_edges())
                .push(Layer::triangle_centers())
                .push(Layer::polygon_centers()),
            Show::Labels => LayerList::new()
                .push(Layer::polygon_edges())
                .push(Layer::polygon_labels(|r| Some(r.to_string())))
                .push(Layer::triangle_labels(|t| Some(t.to_string())).with_style(
                    StyleOverrides::new().fill(Color::rgb(0x88, 0x88, 0x88)),
                )),
            Show::Water => LayerList::new()
                .push(Layer::polygon_colors(move |r| {
                    Some(if snap.r_water[r] { LAKE } else { LAND })
                }))
                .push(Layer::polygon_edges().with_style(outlines)),
            Show::Ocean => LayerList::new()
                .push(Layer::polygon_colors(move |r| {
                    Some(match (snap.r_ocean[r], snap.r_water[r]) {
                        (true, _) => OCEAN,
                        (false, true) => LAKE,
                        (false, false) => LAND,
                    })
                }))
                .push(Layer::polygon_edges().with_style(outlines)),
            Show::Elevation => LayerList::new().push(elevation()).push(coastline()),
            Show::Drainage => LayerList::new()
                .push(elevation())
                .push(coastline())
                .push(Layer::drainage(&snap.t_downslope_s, &snap.r_ocean)),
            Show::Rivers => LayerList::new()
                .push(elevation())
                .push(coastline())
                .push(rivers())
                .push_if(!snap.river_t.is_empty(), Layer::springs(&snap.river_t)),
            Show::Moisture => LayerList::new()
                .push(Layer::polygon_colors(move |r| {
                    (!snap.r_ocean[r]).then(|| moisture_color(snap.r_moisture[r]))
                }))
                .push(coastline())
                .push(rivers()),
            Show::Biomes => LayerList::new()
                .push(Layer::polygon_colors(move |r| Some(snap.r_biome[r].color())))
                .push(coastline())
                .push(rivers()),
        };
        debug!(show = %self.show, layers = ?list.names(), "selected layers");
        Ok(list)
    }

    pub fn render(&self, canvas: &mut dyn Canvas, options: &RenderOptions) -> Result<()> {
        let layers = self.layers()?;
        render::render(canvas, &self.dual, layers.layers(), options)
    }

    pub fn export(&self) -> Result<MapExport> {
        MapExport::build(&self.dual, self.current()?)
    }
}
