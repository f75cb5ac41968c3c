//! Biome classification
//!
//! A Whittaker-style table over temperature and moisture, after ocean,
//! lake and coast have been split off.

use serde::{Deserialize, Serialize};

use crate::error::{require_len, Result};
use crate::mesh::TriangleMesh;
use crate::style::Color;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Biome {
    Ocean,
    Lake,
    Marsh,
    Ice,
    Beach,
    Snow,
    Tundra,
    Bare,
    Scorched,
    Taiga,
    Shrubland,
    TemperateDesert,
    TemperateRainForest,
    TemperateDeciduousForest,
    Grassland,
    SubtropicalDesert,
    TropicalRainForest,
    TropicalSeasonalForest,
}

impl Biome {
    pub fn all() -> &'static [Biome] {
        use Biome::*;
        &[
            Ocean,
            Lake,
            Marsh,
            Ice,
            Beach,
            Snow,
            Tundra,
            Bare,
            Scorched,
            Taiga,
            Shrubland,
            TemperateDesert,
            TemperateRainForest,
            TemperateDeciduousForest,
            Grassland,
            SubtropicalDesert,
            TropicalRainForest,
            TropicalSeasonalForest,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Biome::Ocean => "Ocean",
            Biome::Lake => "Lake",
            Biome::Marsh => "Marsh",
            Biome::Ice => "Ice",
            Biome::Beach => "Beach",
            Biome::Snow => "Snow",
            Biome::Tundra => "Tundra",
            Biome::Bare => "Bare",
            Biome::Scorched => "Scorched",
            Biome::Taiga => "Taiga",
            Biome::Shrubland => "Shrubland",
            Biome::TemperateDesert => "Temperate Desert",
            Biome::TemperateRainForest => "Temperate Rain Forest",
            Biome::TemperateDeciduousForest => "Temperate Deciduous Forest",
            Biome::Grassland => "Grassland",
            Biome::SubtropicalDesert => "Subtropical Desert",
            Biome::TropicalRainForest => "Tropical Rain Forest",
            Biome::TropicalSeasonalForest => "Tropical Seasonal Forest",
        }
    }

    /// Map color for the filled-polygon layer.
    pub fn color(&self) -> Color {
        match self {
            Biome::Ocean => Color::rgb(0x44, 0x44, 0x7a),
            Biome::Lake => Color::rgb(0x33, 0x66, 0x99),
            Biome::Marsh => Color::rgb(0x2f, 0x66, 0x66),
            Biome::Ice => Color::rgb(0x99, 0xff, 0xff),
            Biome::Beach => Color::rgb(0xa0, 0x90, 0x77),
            Biome::Snow => Color::rgb(0xff, 0xff, 0xff),
            Biome::Tundra => Color::rgb(0xbb, 0xbb, 0xaa),
            Biome::Bare => Color::rgb(0x88, 0x88, 0x88),
            Biome::Scorched => Color::rgb(0x55, 0x55, 0x55),
            Biome::Taiga => Color::rgb(0x99, 0xaa, 0x77),
            Biome::Shrubland => Color::rgb(0x88, 0x99, 0x77),
            Biome::TemperateDesert => Color::rgb(0xc9, 0xd2, 0x9b),
            Biome::TemperateRainForest => Color::rgb(0x44, 0x88, 0x55),
            Biome::TemperateDeciduousForest => Color::rgb(0x67, 0x94, 0x59),
            Biome::Grassland => Color::rgb(0x88, 0xaa, 0x55),
            Biome::SubtropicalDesert => Color::rgb(0xd2, 0xb9, 0x8b),
            Biome::TropicalRainForest => Color::rgb(0x33, 0x77, 0x55),
            Biome::TropicalSeasonalForest => Color::rgb(0x55, 0x99, 0x44),
        }
    }
}

/// Classify one region.
pub fn classify(ocean: bool, water: bool, coast: bool, temperature: f32, moisture: f32) -> Biome {
    if ocean {
        Biome::Ocean
    } else if water {
        if temperature > 0.9 {
            Biome::Marsh
        } else if temperature < 0.2 {
            Biome::Ice
        } else {
            Biome::Lake
        }
    } else if coast {
        Biome::Beach
    } else if temperature < 0.2 {
        if moisture > 0.50 {
            Biome::Snow
        } else if moisture > 0.33 {
            Biome::Tundra
        } else if moisture > 0.16 {
            Biome::Bare
        } else {
            Biome::Scorched
        }
    } else if temperature < 0.4 {
        if moisture > 0.66 {
            Biome::Taiga
        } else if moisture > 0.33 {
            Biome::Shrubland
        } else {
            Biome::TemperateDesert
        }
    } else if temperature < 0.7 {
        if moisture > 0.83 {
            Biome::TemperateRainForest
        } else if moisture > 0.50 {
            Biome::TemperateDeciduousForest
        } else if moisture > 0.16 {
            Biome::Grassland
        } else {
            Biome::TemperateDesert
        }
    } else if moisture > 0.66 {
        Biome::TropicalRainForest
    } else if moisture > 0.33 {
        Biome::TropicalSeasonalForest
    } else if moisture > 0.16 {
        Biome::Grassland
    } else {
        Biome::SubtropicalDesert
    }
}

/// Per-region biome. Temperature falls with elevation; both biases shift
/// the lookup uniformly.
pub fn assign_r_biome(
    mesh: &TriangleMesh,
    r_ocean: &[bool],
    r_water: &[bool],
    r_elevation: &[f32],
    r_moisture: &[f32],
    temperature_bias: f32,
    moisture_bias: f32,
) -> Result<Vec<Biome>> {
    require_len("r_ocean", r_ocean, mesh.num_regions())?;
    require_len("r_water", r_water, mesh.num_regions())?;
    require_len("r_elevation", r_elevation, mesh.num_regions())?;
    require_len("r_moisture", r_moisture, mesh.num_regions())?;

    let r_biome = (0..mesh.num_regions())
        .map(|r| {
            let coast = !r_ocean[r] && mesh.r_circulate_r(r).iter().any(|&n| r_ocean[n]);
            let temperature = 1.0 - r_elevation[r] + temperature_bias;
            let moisture = r_moisture[r] + moisture_bias;
            classify(r_ocean[r], r_water[r], coast, temperature, moisture)
        })
        .collect();
    Ok(r_biome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshBuilder;

    #[test]
    fn test_classify_table() {
        assert_eq!(classify(true, true, false, 0.5, 0.5), Biome::Ocean);
        assert_eq!(classify(false, true, false, 0.95, 0.5), Biome::Marsh);
        assert_eq!(classify(false, true, false, 0.1, 0.5), Biome::Ice);
        assert_eq!(classify(false, true, false, 0.5, 0.5), Biome::Lake);
        assert_eq!(classify(false, false, true, 0.5, 0.5), Biome::Beach);
        assert_eq!(classify(false, false, false, 0.1, 0.9), Biome::Snow);
        assert_eq!(classify(false, false, false, 0.1, 0.0), Biome::Scorched);
        assert_eq!(classify(false, false, false, 0.3, 0.7), Biome::Taiga);
        assert_eq!(classify(false, false, false, 0.5, 0.9), Biome::TemperateRainForest);
        assert_eq!(classify(false, false, false, 0.5, 0.3), Biome::Grassland);
        assert_eq!(classify(false, false, false, 0.8, 0.1), Biome::SubtropicalDesert);
        assert_eq!(classify(false, false, false, 0.8, 0.7), Biome::TropicalRainForest);
    }

    #[test]
    fn test_bias_shifts_biomes() {
        let mesh = MeshBuilder::new(100.0).build().unwrap();
        let n = mesh.num_regions();
        let r_ocean = vec![false; n];
        let r_water = vec![false; n];
        let r_elevation = vec![0.5; n];
        let r_moisture = vec![0.5; n];

        let base = assign_r_biome(&mesh, &r_ocean, &r_water, &r_elevation, &r_moisture, 0.0, 0.0).unwrap();
        assert!(base.iter().all(|&b| b == Biome::TemperateDeciduousForest || b == Biome::Grassland));

        let cold = assign_r_biome(&mesh, &r_ocean, &r_water, &r_elevation, &r_moisture, -0.4, 0.0).unwrap();
        assert!(cold.iter().all(|&b| b == Biome::Tundra));

        let wet = assign_r_biome(&mesh, &r_ocean, &r_water, &r_elevation, &r_moisture, 0.0, 0.4).unwrap();
        assert!(wet.iter().all(|&b| b == Biome::TemperateRainForest));
    }

    #[test]
    fn test_coast_is_beach() {
        let mesh = MeshBuilder::new(250.0).build().unwrap();
        let n = mesh.num_regions();
        let r_ocean: Vec<bool> = (0..n).map(|r| mesh.r_is_ghost(r) || mesh.r_is_boundary(r)).collect();
        let r_elevation = vec![0.5; n];
        let r_moisture = vec![0.5; n];
        let biomes = assign_r_biome(&mesh, &r_ocean, &r_ocean, &r_elevation, &r_moisture, 0.0, 0.0).unwrap();
        for r in 0..n {
            if r_ocean[r] {
                assert_eq!(biomes[r], Biome::Ocean);
            } else {
                // Every interior point of a 4x4 grid touches the hull ring
                // except the center.
                let expected_beach = r != 12;
                assert_eq!(biomes[r] == Biome::Beach, expected_beach, "region {}", r);
            }
        }
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&Biome::TemperateDeciduousForest).unwrap();
        assert_eq!(json, "\"TEMPERATE_DECIDUOUS_FOREST\"");
        assert_eq!(Biome::all().len(), 18);
    }
}
