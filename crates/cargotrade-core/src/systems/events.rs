//! Outgoing notifications - sale events and console refreshes
//!
//! Sale listeners run synchronously while the sold entities still exist, so a
//! bounty tracker can inspect what was sold before it is deleted. Everything
//! else is queued for the presentation layer to drain.

use std::collections::HashSet;

use hecs::{Entity, World};

use crate::components::MapId;
use crate::systems::{PalletConsoleState, ShuttleConsoleState};

/// Raised after the price of a sale is known and before anything is deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySoldEvent {
    /// Station credited with the sale, if the grid belongs to one
    pub station: Option<Entity>,
    pub sold: HashSet<Entity>,
}

/// Notifications produced by the cargo systems
#[derive(Debug, Clone, PartialEq)]
pub enum CargoEvent {
    EntitySold(EntitySoldEvent),
    PalletConsoleUpdated {
        console: Entity,
        state: PalletConsoleState,
    },
    ShuttleConsoleUpdated {
        console: Entity,
        state: ShuttleConsoleState,
    },
    /// Cash paid out for a sale
    CashSpawned {
        console: Entity,
        stack: Entity,
        count: i64,
    },
    SoundPlayed {
        source: Entity,
        sound: &'static str,
    },
    /// Pilot consoles should re-read shuttle destinations
    ShuttleConsolesRefreshed,
    TradePostCreated {
        map: MapId,
        name: String,
    },
    TradePostRemoved {
        map: MapId,
    },
}

/// Something that must see a sale before the goods disappear
pub trait SaleListener {
    fn on_entity_sold(&mut self, world: &World, event: &EntitySoldEvent);
}

/// Queue of cargo notifications plus synchronous sale listeners
#[derive(Default)]
pub struct EventBus {
    queue: Vec<CargoEvent>,
    sale_listeners: Vec<Box<dyn SaleListener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe_sales(&mut self, listener: Box<dyn SaleListener>) {
        self.sale_listeners.push(listener);
    }

    pub fn publish(&mut self, event: CargoEvent) {
        self.queue.push(event);
    }

    /// Run every sale listener against the current world, then queue the event
    pub fn publish_sale(&mut self, world: &World, event: EntitySoldEvent) {
        for listener in &mut self.sale_listeners {
            listener.on_entity_sold(world, &event);
        }
        self.queue.push(CargoEvent::EntitySold(event));
    }

    /// Take every queued event, oldest first
    pub fn drain(&mut self) -> Vec<CargoEvent> {
        std::mem::take(&mut self.queue)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queue", &self.queue)
            .field("sale_listeners", &self.sale_listeners.len())
            .finish()
    }
}
