//! Trade-post layouts - the grids spawned onto the trade map

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::components::{
    CargoPallet, CargoPalletConsole, EntityName, Fixture, Grid, LookupCategory, Transform, Vec2,
};

/// A set of grids loaded onto a map together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeLayout {
    pub grids: Vec<GridLayout>,
}

/// One grid and the cargo fittings bolted to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    pub name: String,
    /// Position on the map
    #[serde(default)]
    pub position: Vec2,
    /// Pallet centres, grid-local
    #[serde(default)]
    pub pallets: Vec<Vec2>,
    /// Pallet console positions, grid-local
    #[serde(default)]
    pub pallet_consoles: Vec<Vec2>,
}

impl TradeLayout {
    /// The stock outpost: one grid with a 2x3 pallet bay and a sale console
    pub fn default_outpost() -> Self {
        let pallets = (0..3)
            .flat_map(|x| (0..2).map(move |y| Vec2::new(x as f32, y as f32)))
            .collect();
        Self {
            grids: vec![GridLayout {
                name: "Trade Outpost".to_string(),
                position: Vec2::ZERO,
                pallets,
                pallet_consoles: vec![Vec2::new(-2.0, 0.0)],
            }],
        }
    }
}

/// Spawn every grid of `layout` under `map_root`; returns the grid entities
pub fn spawn_layout(world: &mut World, map_root: Entity, layout: &TradeLayout) -> Vec<Entity> {
    let mut grids = Vec::with_capacity(layout.grids.len());

    for grid_layout in &layout.grids {
        let xform = Transform::new(map_root, grid_layout.position.x, grid_layout.position.y);
        let grid = world.spawn((Grid, xform, EntityName::new(&grid_layout.name)));

        for pos in &grid_layout.pallets {
            world.spawn((
                CargoPallet,
                Transform::new(grid, pos.x, pos.y).anchored(),
                Fixture::tile(),
                LookupCategory::Static,
            ));
        }
        for pos in &grid_layout.pallet_consoles {
            world.spawn((
                CargoPalletConsole::default(),
                Transform::new(grid, pos.x, pos.y).anchored(),
                Fixture::tile(),
                LookupCategory::Static,
            ));
        }

        grids.push(grid);
    }

    grids
}
