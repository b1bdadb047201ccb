//! Order projection - which queued orders fit on the cargo shuttle right now

use hecs::{Entity, World};

use crate::components::{CargoOrder, CargoShuttleConsole, StationCargoOrderDatabase};
use crate::systems::{cargo_space, owning_station};
use crate::world::{Tag, WorldQuery};

/// Project the order queue onto `capacity` pallet slots.
///
/// Orders are taken in queue order. Unapproved orders are skipped and use no
/// space. An approved order that does not fit in full is emitted as a
/// partial copy sized to the remaining space, which ends the projection.
/// The queue itself is never modified.
pub fn project_orders(orders: &[CargoOrder], capacity: u32) -> Vec<CargoOrder> {
    let mut projected = Vec::new();
    let mut space_remaining = capacity;

    for order in orders {
        if space_remaining == 0 {
            break;
        }
        if !order.approved {
            continue;
        }

        let num_to_ship = order.remaining_to_ship();
        if num_to_ship > space_remaining {
            projected.push(order.partial(space_remaining));
            space_remaining = 0;
        } else {
            projected.push(order.clone());
            space_remaining -= num_to_ship;
        }
    }

    projected
}

/// Orders that fit on the shuttle referenced by a station's order database.
///
/// Capacity is the pallet count of the shuttle grid. No database, no live
/// cargo shuttle or an empty queue all project to nothing.
pub fn projected_orders(world: &World, station: Option<Entity>) -> Vec<CargoOrder> {
    let Some(station) = station else {
        log::debug!("No station to project orders for");
        return Vec::new();
    };
    let Ok(db) = world.get::<&StationCargoOrderDatabase>(station) else {
        log::warn!("Station {:?} has no cargo order database", station);
        return Vec::new();
    };
    let Some(shuttle) = db
        .shuttle
        .filter(|s| world.exists(*s) && world.has_tag(*s, Tag::CargoShuttle))
    else {
        log::debug!("Station {:?} has no cargo shuttle", station);
        return Vec::new();
    };
    if db.orders.is_empty() {
        return Vec::new();
    }

    project_orders(&db.orders, cargo_space(world, shuttle))
}

/// What a shuttle console displays
#[derive(Debug, Clone, PartialEq)]
pub struct ShuttleConsoleState {
    /// `None` when the console is not on a station
    pub station_name: Option<String>,
    /// `None` when the station has no shuttle (or it has no name)
    pub shuttle_name: Option<String>,
    pub orders: Vec<CargoOrder>,
}

/// Build the display state for a shuttle console
pub fn shuttle_console_state(world: &World, console: Entity) -> ShuttleConsoleState {
    let station = owning_station(world, console);
    let shuttle = station.and_then(|s| {
        world
            .get::<&StationCargoOrderDatabase>(s)
            .ok()
            .and_then(|db| db.shuttle)
    });

    ShuttleConsoleState {
        station_name: station.and_then(|s| world.name(s)),
        shuttle_name: shuttle
            .and_then(|s| world.name(s))
            .filter(|name| !name.is_empty()),
        orders: projected_orders(world, station),
    }
}

/// Refresh every shuttle console belonging to `station`
pub fn refresh_shuttle_consoles(
    world: &World,
    station: Entity,
) -> Vec<(Entity, ShuttleConsoleState)> {
    let mut consoles: Vec<Entity> = world
        .query::<&CargoShuttleConsole>()
        .iter()
        .map(|(e, _)| e)
        .filter(|e| owning_station(world, *e) == Some(station))
        .collect();
    consoles.sort_by_key(|e| e.id());

    consoles
        .into_iter()
        .map(|console| (console, shuttle_console_state(world, console)))
        .collect()
}
