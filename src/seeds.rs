//! Seed management for diagram recomputation
//!
//! Each randomized stage gets its own seed, derived from a master seed by
//! default, so one stage can be re-rolled while the others stay fixed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Seeds for every randomized stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Island shape noise
    pub island: u64,
    /// Tie-breaking order of the coast-distance search
    pub drainage: u64,
    /// Which spring candidates become rivers
    pub rivers: u64,
}

impl DiagramSeeds {
    /// Derive all stage seeds deterministically from a master seed.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            island: derive_seed(master, "island"),
            drainage: derive_seed(master, "drainage"),
            rivers: derive_seed(master, "rivers"),
        }
    }

    /// Create a builder for overriding individual seeds
    pub fn builder(master: u64) -> DiagramSeedsBuilder {
        DiagramSeedsBuilder::new(master)
    }
}

impl Default for DiagramSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Builder for overriding individual seeds while deriving the rest
pub struct DiagramSeedsBuilder {
    seeds: DiagramSeeds,
}

impl DiagramSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: DiagramSeeds::from_master(master),
        }
    }

    pub fn island(mut self, seed: u64) -> Self {
        self.seeds.island = seed;
        self
    }

    pub fn drainage(mut self, seed: u64) -> Self {
        self.seeds.drainage = seed;
        self
    }

    pub fn rivers(mut self, seed: u64) -> Self {
        self.seeds.rivers = seed;
        self
    }

    pub fn build(self) -> DiagramSeeds {
        self.seeds
    }
}

/// Derive a sub-seed from a master seed and a stage name.
fn derive_seed(master: u64, stage: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stage.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for DiagramSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DiagramSeeds {{ master: {}, island: {}, drainage: {}, rivers: {} }}",
            self.master, self.island, self.drainage, self.rivers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        assert_eq!(DiagramSeeds::from_master(12345), DiagramSeeds::from_master(12345));
    }

    #[test]
    fn test_different_stages_get_different_seeds() {
        let seeds = DiagramSeeds::from_master(12345);
        assert_ne!(seeds.island, seeds.drainage);
        assert_ne!(seeds.drainage, seeds.rivers);
    }

    #[test]
    fn test_builder_override() {
        let seeds = DiagramSeeds::builder(12345).rivers(99999).build();
        assert_eq!(seeds.rivers, 99999);

        let derived = DiagramSeeds::from_master(12345);
        assert_eq!(seeds.island, derived.island);
        assert_eq!(seeds.drainage, derived.drainage);
    }
}
