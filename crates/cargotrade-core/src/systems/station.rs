//! Station registry lookups

use hecs::{Entity, World};

use crate::components::{StationCargoOrderDatabase, StationMember};
use crate::world::WorldQuery;

/// Station owning the grid `entity` is on
pub fn owning_station(world: &World, entity: Entity) -> Option<Entity> {
    let grid = world.grid_of(entity)?;
    world.get::<&StationMember>(grid).ok().map(|m| m.station)
}

pub fn has_order_database(world: &World, station: Entity) -> bool {
    world
        .entity(station)
        .map_or(false, |r| r.has::<StationCargoOrderDatabase>())
}

/// Clear any order database pointing at `shuttle`
pub fn detach_shuttle(world: &mut World, shuttle: Entity) {
    for (_, db) in world.query_mut::<&mut StationCargoOrderDatabase>() {
        if db.shuttle == Some(shuttle) {
            db.shuttle = None;
        }
    }
}
