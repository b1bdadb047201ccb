//! Grid and station components: grids, station membership, shuttles, maps.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// Rigid structure entities can be parented to (station deck, shuttle)
#[derive(Debug, Clone, Copy, Default)]
pub struct Grid;

/// Station record: the entity every station grid points at
#[derive(Debug, Clone, Default)]
pub struct Station;

/// Links a grid to the station that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationMember {
    pub station: Entity,
}

/// Grid taking part in the cargo trade map
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeStation;

/// Grid that cannot be deconstructed or damaged by tile tools
#[derive(Debug, Clone, Copy, Default)]
pub struct ProtectedGrid;

/// Living being: alive or dead, it is never cargo
#[derive(Debug, Clone, Copy, Default)]
pub struct LivingBeing;

/// Flight model of a grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShuttleBody {
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl Default for ShuttleBody {
    fn default() -> Self {
        Self {
            linear_damping: 0.05,
            angular_damping: 0.05,
        }
    }
}

/// Component kinds an FTL destination can allow through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    CargoShuttle,
    Shuttle,
}

/// Map an FTL jump may target. An empty whitelist admits everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FtlDestination {
    pub whitelist: Vec<Capability>,
}

impl FtlDestination {
    pub fn allows(&self, capabilities: &[Capability]) -> bool {
        self.whitelist.is_empty() || self.whitelist.iter().any(|c| capabilities.contains(c))
    }
}

/// Identifier of a map (a self-contained space grids float in)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub u32);

impl std::fmt::Display for MapId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "map {}", self.0)
    }
}

/// Root entity of a map; grids on the map are parented to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRoot {
    pub id: MapId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ftl_whitelist() {
        let open = FtlDestination::default();
        assert!(open.allows(&[]));

        let cargo_only = FtlDestination {
            whitelist: vec![Capability::CargoShuttle],
        };
        assert!(cargo_only.allows(&[Capability::Shuttle, Capability::CargoShuttle]));
        assert!(!cargo_only.allows(&[Capability::Shuttle]));
    }
}
