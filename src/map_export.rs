//! JSON export of a computed map
//!
//! Only solid elements are written. Positions are rounded to whole map
//! units; elevation and moisture keep full precision so a reloaded export
//! compares equal to the snapshot it came from.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::biomes::Biome;
use crate::error::{require_len, Result};
use crate::mesh::TriangleMesh;
use crate::pipeline::Snapshot;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapExport {
    /// Biome per solid region.
    pub biome: Vec<Biome>,
    /// The three regions of each solid triangle, in winding order.
    pub t_r: Vec<[usize; 3]>,
    /// Solid triangles around each solid region, in winding order.
    pub r_t: Vec<Vec<usize>>,
    /// `[x, y, elevation]` per solid triangle.
    pub t_xyz: Vec<[f64; 3]>,
    /// `[x, y, elevation]` per solid region.
    pub r_xyz: Vec<[f64; 3]>,
    pub r_moisture: Vec<f32>,
}

impl MapExport {
    pub fn build(mesh: &TriangleMesh, snapshot: &Snapshot) -> Result<Self> {
        let regions = mesh.num_solid_regions();
        let triangles = mesh.num_solid_triangles();
        require_len("r_biome", &snapshot.r_biome, regions)?;
        require_len("r_elevation", &snapshot.r_elevation, regions)?;
        require_len("r_moisture", &snapshot.r_moisture, regions)?;
        require_len("t_elevation", &snapshot.t_elevation, triangles)?;

        let t_r = (0..triangles).map(|t| mesh.t_circulate_r(t)).collect();
        let r_t = (0..regions)
            .map(|r| {
                mesh.r_circulate_t(r)
                    .into_iter()
                    .filter(|&t| !mesh.t_is_ghost(t))
                    .collect()
            })
            .collect();
        let t_xyz = (0..triangles)
            .map(|t| {
                let p = mesh.t_pos(t);
                [p.x.round(), p.y.round(), snapshot.t_elevation[t] as f64]
            })
            .collect();
        let r_xyz = (0..regions)
            .map(|r| {
                let p = mesh.r_pos(r);
                [p.x.round(), p.y.round(), snapshot.r_elevation[r] as f64]
            })
            .collect();

        Ok(Self {
            biome: snapshot.r_biome[..regions].to_vec(),
            t_r,
            r_t,
            t_xyz,
            r_xyz,
            r_moisture: snapshot.r_moisture[..regions].to_vec(),
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!(path = %path.display(), regions = self.biome.len(), "wrote map export");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuilder;
    use crate::pipeline::{recompute, MapParams, TerrainStages};
    use crate::seeds::DiagramSeeds;

    fn exported() -> (TriangleMesh, Snapshot, MapExport) {
        let mesh = MeshBuilder::new(50.0).seed(8).build().unwrap();
        let snapshot = recompute(&TerrainStages, &mesh, &DiagramSeeds::from_master(8), &MapParams::default()).unwrap();
        let export = MapExport::build(&mesh, &snapshot).unwrap();
        (mesh, snapshot, export)
    }

    #[test]
    fn test_solid_elements_only() {
        let (mesh, _, export) = exported();
        assert_eq!(export.biome.len(), mesh.num_solid_regions());
        assert_eq!(export.r_xyz.len(), mesh.num_solid_regions());
        assert_eq!(export.r_t.len(), mesh.num_solid_regions());
        assert_eq!(export.r_moisture.len(), mesh.num_solid_regions());
        assert_eq!(export.t_r.len(), mesh.num_solid_triangles());
        assert_eq!(export.t_xyz.len(), mesh.num_solid_triangles());
        assert!(export.t_r.iter().flatten().all(|&r| r < mesh.num_solid_regions()));
        assert!(export.r_t.iter().flatten().all(|&t| t < mesh.num_solid_triangles()));

        let interior = (0..mesh.num_solid_regions()).find(|&r| !mesh.r_is_boundary(r)).unwrap();
        assert_eq!(export.r_t[interior], mesh.r_circulate_t(interior));
        let boundary = (0..mesh.num_solid_regions()).find(|&r| mesh.r_is_boundary(r)).unwrap();
        assert!(export.r_t[boundary].len() < mesh.r_circulate_t(boundary).len());
    }

    #[test]
    fn test_positions_rounded_values_exact() {
        let (mesh, snapshot, export) = exported();
        for (t, xyz) in export.t_xyz.iter().enumerate() {
            assert_eq!(xyz[0], mesh.t_pos(t).x.round());
            assert_eq!(xyz[1].fract(), 0.0);
            assert_eq!(xyz[2] as f32, snapshot.t_elevation[t]);
        }
        for (r, xyz) in export.r_xyz.iter().enumerate() {
            assert_eq!(xyz[2] as f32, snapshot.r_elevation[r]);
        }
    }

    #[test]
    fn test_json_round_trip() {
        let (_, snapshot, export) = exported();
        let json = export.to_json().unwrap();
        assert!(json.contains("\"biome\""));
        let loaded = MapExport::from_json(&json).unwrap();
        assert_eq!(loaded, export);
        assert_eq!(&loaded.r_moisture[..], &snapshot.r_moisture[..loaded.r_moisture.len()]);
    }

    #[test]
    fn test_write_json() {
        let (_, _, export) = exported();
        let path = std::env::temp_dir().join(format!("map-export-{}.json", std::process::id()));
        export.write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(MapExport::from_json(&text).unwrap(), export);
    }

    #[test]
    fn test_short_snapshot_is_rejected() {
        let (mesh, mut snapshot, _) = exported();
        snapshot.r_moisture.truncate(3);
        assert!(MapExport::build(&mesh, &snapshot).is_err());
    }
}
