//! Cargo engine - owns the world and routes messages to the cargo systems

use std::collections::HashMap;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::components::*;
use crate::config::CargoConfig;
use crate::maps::{JsonLayoutLoader, MapLoader, MapRegistry};
use crate::messages::{CargoMessage, MessageKind};
use crate::services::{BountyExemptions, ComponentPricing, NoBounties, PriceOracle};
use crate::systems::*;
use crate::world::WorldQuery;

/// Sound cue played by a pallet console after a sale
pub const APPROVE_SOUND: &str = "/Audio/Effects/Cargo/ping.ogg";

/// Message handler registered in the dispatch table
pub type Handler = fn(&mut CargoEngine, &CargoMessage);

/// Main cargo engine
pub struct CargoEngine {
    /// ECS world containing all entities
    pub world: World,
    /// Live maps
    pub maps: MapRegistry,
    /// Outgoing notifications
    pub events: EventBus,
    pub config: CargoConfig,

    trade_post: TradePost,
    loader: Box<dyn MapLoader>,
    pricing: Box<dyn PriceOracle>,
    bounties: Box<dyn BountyExemptions>,
    rng: StdRng,
    handlers: HashMap<MessageKind, Handler>,
}

impl CargoEngine {
    /// Engine with component pricing, no bounties and layouts read from the
    /// working directory
    pub fn new(config: CargoConfig) -> Self {
        Self {
            world: World::new(),
            maps: MapRegistry::new(),
            events: EventBus::new(),
            config,
            trade_post: TradePost::new(),
            loader: Box::new(JsonLayoutLoader::new(".")),
            pricing: Box::new(ComponentPricing),
            bounties: Box::new(NoBounties),
            rng: StdRng::from_entropy(),
            handlers: default_handlers(),
        }
    }

    pub fn with_loader(mut self, loader: impl MapLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn with_pricing(mut self, pricing: impl PriceOracle + 'static) -> Self {
        self.pricing = Box::new(pricing);
        self
    }

    pub fn with_bounties(mut self, bounties: impl BountyExemptions + 'static) -> Self {
        self.bounties = Box::new(bounties);
        self
    }

    /// Swap the bounty exemptions mid-session, e.g. when a contract completes
    pub fn set_bounties(&mut self, bounties: impl BountyExemptions + 'static) {
        self.bounties = Box::new(bounties);
    }

    /// Reproducible trade-station names
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Replace the handler for one kind of message
    pub fn register_handler(&mut self, kind: MessageKind, handler: Handler) {
        self.handlers.insert(kind, handler);
    }

    /// Route a message to its handler. Returns false if none is registered.
    pub fn handle(&mut self, message: CargoMessage) -> bool {
        let Some(handler) = self.handlers.get(&message.kind()).copied() else {
            log::debug!("No handler for {:?}", message.kind());
            return false;
        };
        handler(self, &message);
        true
    }

    /// Projection of `orders` onto `capacity` pallet slots
    pub fn project(&self, orders: &[CargoOrder], capacity: u32) -> Vec<CargoOrder> {
        project_orders(orders, capacity)
    }

    /// Orders that fit on the station's cargo shuttle right now
    pub fn projected_orders(&self, station: Entity) -> Vec<CargoOrder> {
        projected_orders(&self.world, Some(station))
    }

    pub fn appraise(&self, grid: Entity) -> Appraisal {
        appraise_grid(
            &self.world,
            grid,
            self.pricing.as_ref(),
            self.bounties.as_ref(),
        )
    }

    pub fn sell(&mut self, grid: Entity, station: Option<Entity>) -> SaleOutcome {
        sell_pallets(
            &mut self.world,
            grid,
            station,
            self.pricing.as_ref(),
            self.bounties.as_ref(),
            &mut self.events,
        )
    }

    pub fn trade_post(&self) -> TradePost {
        self.trade_post
    }

    pub fn trade_post_state(&self) -> TradePostState {
        self.trade_post.state(&self.world, &self.maps)
    }

    pub fn setup_trade_post(&mut self) {
        setup_trade_post(
            &mut self.world,
            &mut self.maps,
            self.loader.as_ref(),
            &mut self.trade_post,
            &self.config,
            &mut self.rng,
            &mut self.events,
        );
    }

    pub fn cleanup_trade_station(&mut self) {
        cleanup_trade_station(
            &mut self.world,
            &mut self.maps,
            &mut self.trade_post,
            &mut self.events,
        );
    }

    /// Take every queued notification
    pub fn drain_events(&mut self) -> Vec<CargoEvent> {
        self.events.drain()
    }

    fn update_pallet_console(&mut self, console: Entity) {
        let state = pallet_console_state(
            &self.world,
            console,
            self.pricing.as_ref(),
            self.bounties.as_ref(),
        );
        self.events
            .publish(CargoEvent::PalletConsoleUpdated { console, state });
    }

    fn update_shuttle_console(&mut self, console: Entity) {
        let state = shuttle_console_state(&self.world, console);
        self.events
            .publish(CargoEvent::ShuttleConsoleUpdated { console, state });
    }

    /// Pay out a sale as a cash stack dropped where the console stands
    fn spawn_cash(&mut self, console: Entity, amount: f64) -> Option<Entity> {
        let xform = self.world.transform(console)?;
        let stack_type = self
            .world
            .get::<&CargoPalletConsole>(console)
            .ok()
            .and_then(|c| c.cash_type.clone())
            .unwrap_or_else(|| self.config.cash_type.clone());

        let count = amount as i64;
        let stack = self.world.spawn((
            CashStack { stack_type, count },
            Transform {
                anchored: false,
                ..xform
            },
            Fixture::new(0.3, 0.3),
            LookupCategory::Dynamic,
        ));
        self.events.publish(CargoEvent::CashSpawned {
            console,
            stack,
            count,
        });
        Some(stack)
    }
}

impl Default for CargoEngine {
    fn default() -> Self {
        Self::new(CargoConfig::default())
    }
}

fn default_handlers() -> HashMap<MessageKind, Handler> {
    let mut handlers: HashMap<MessageKind, Handler> = HashMap::new();
    handlers.insert(MessageKind::PalletUiOpened, on_pallet_console_refresh);
    handlers.insert(MessageKind::PalletAppraise, on_pallet_console_refresh);
    handlers.insert(MessageKind::PalletSell, on_pallet_sell);
    handlers.insert(MessageKind::ShuttleConsoleStartup, on_shuttle_console_startup);
    handlers.insert(MessageKind::CargoShuttleChanged, on_cargo_shuttle_changed);
    handlers.insert(MessageKind::GridSplit, on_grid_split);
    handlers.insert(MessageKind::RoundRestartCleanup, on_round_restart);
    handlers.insert(MessageKind::StationInitialized, on_station_initialized);
    handlers.insert(MessageKind::GridFillChanged, on_grid_fill_changed);
    handlers
}

// Opening the sale window and pressing appraise do the same thing: rescan.
// Nothing updates live as goods move, which keeps conveyor spam cheap.
fn on_pallet_console_refresh(engine: &mut CargoEngine, message: &CargoMessage) {
    let (CargoMessage::PalletUiOpened { console, actor }
    | CargoMessage::PalletAppraise { console, actor }) = message
    else {
        return;
    };
    if actor.is_none() {
        return;
    }
    engine.update_pallet_console(*console);
}

fn on_pallet_sell(engine: &mut CargoEngine, message: &CargoMessage) {
    let CargoMessage::PalletSell { console, actor } = message else {
        return;
    };
    if actor.is_none() {
        log::debug!("Ignoring sale request without an actor");
        return;
    }
    let console = *console;

    let Some(grid) = engine.world.grid_of(console) else {
        log::warn!("Pallet console {:?} is not on a grid; nothing to sell", console);
        engine.events.publish(CargoEvent::PalletConsoleUpdated {
            console,
            state: PalletConsoleState::default(),
        });
        return;
    };

    let station = owning_station(&engine.world, console);
    let outcome = engine.sell(grid, station);
    if !outcome.sold {
        return;
    }

    engine.spawn_cash(console, outcome.amount);
    engine.events.publish(CargoEvent::SoundPlayed {
        source: console,
        sound: APPROVE_SOUND,
    });
    engine.update_pallet_console(console);
}

fn on_shuttle_console_startup(engine: &mut CargoEngine, message: &CargoMessage) {
    if let CargoMessage::ShuttleConsoleStartup { console } = message {
        engine.update_shuttle_console(*console);
    }
}

fn on_cargo_shuttle_changed(engine: &mut CargoEngine, message: &CargoMessage) {
    let CargoMessage::CargoShuttleChanged { shuttle } = message else {
        return;
    };

    // Pilot consoles that are already open
    engine.events.publish(CargoEvent::ShuttleConsolesRefreshed);

    let station = engine
        .world
        .get::<&CargoShuttle>(*shuttle)
        .ok()
        .and_then(|s| s.station);
    let Some(station) = station else {
        return;
    };

    for (console, state) in refresh_shuttle_consoles(&engine.world, station) {
        engine
            .events
            .publish(CargoEvent::ShuttleConsoleUpdated { console, state });
    }
}

fn on_grid_split(engine: &mut CargoEngine, message: &CargoMessage) {
    if let CargoMessage::GridSplit { grid, new_grids } = message {
        on_trade_split(&mut engine.world, *grid, new_grids);
    }
}

fn on_round_restart(engine: &mut CargoEngine, _message: &CargoMessage) {
    engine.cleanup_trade_station();
}

fn on_station_initialized(engine: &mut CargoEngine, message: &CargoMessage) {
    let CargoMessage::StationInitialized { station } = message else {
        return;
    };
    // No cargo department, no trade post
    if !has_order_database(&engine.world, *station) {
        return;
    }
    if engine.config.grid_fill {
        engine.setup_trade_post();
    }
}

fn on_grid_fill_changed(engine: &mut CargoEngine, message: &CargoMessage) {
    if let CargoMessage::GridFillChanged { enabled } = message {
        engine.config.grid_fill = *enabled;
        if *enabled {
            engine.setup_trade_post();
        }
    }
}
