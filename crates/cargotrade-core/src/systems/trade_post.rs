//! Trade post lifecycle - the shared map cargo shuttles fly to and sell at
//!
//! The state is never stored as a flag. It is read back from the world each
//! time: no live map means `Absent`, a live map without an FTL destination
//! means the layout never loaded (`Created`), otherwise `Active`.

use hecs::{Entity, World};
use rand::Rng;

use crate::components::{Capability, FtlDestination, MapId, ShuttleBody};
use crate::config::CargoConfig;
use crate::generation::trade_station_name;
use crate::maps::{MapLoader, MapManager};
use crate::systems::{detach_shuttle, CargoEvent, EventBus};
use crate::world::{Tag, WorldMut, WorldQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradePostState {
    Absent,
    Created,
    Active,
}

/// Handle to the session's trade map
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradePost {
    map: Option<MapId>,
}

impl TradePost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self) -> Option<MapId> {
        self.map
    }

    /// Live map, if the handle still points at one
    pub fn live_map(&self, world: &World, maps: &dyn MapManager) -> Option<MapId> {
        self.map.filter(|m| maps.map_exists(world, *m))
    }

    pub fn state(&self, world: &World, maps: &dyn MapManager) -> TradePostState {
        let Some(map) = self.live_map(world, maps) else {
            return TradePostState::Absent;
        };
        let active = maps
            .map_entity(map)
            .and_then(|root| world.entity(root).ok())
            .map_or(false, |r| r.has::<FtlDestination>());
        if active {
            TradePostState::Active
        } else {
            TradePostState::Created
        }
    }
}

/// Create and populate the trade map unless one is already live.
///
/// Every root grid of the layout becomes a protected, damped trade station,
/// and the map only admits cargo shuttles. A failed load leaves an empty map
/// behind; that is logged, not fatal.
pub fn setup_trade_post(
    world: &mut World,
    maps: &mut dyn MapManager,
    loader: &dyn MapLoader,
    post: &mut TradePost,
    config: &CargoConfig,
    rng: &mut impl Rng,
    bus: &mut EventBus,
) {
    if post.live_map(world, maps).is_some() {
        return;
    }

    let map = maps.create_map(world);
    post.map = Some(map);
    log::info!("Created trade map {}", map);

    let Some(root) = maps.map_entity(map) else {
        return;
    };

    let grids = loader
        .try_load(world, root, &config.trade_layout_path)
        .unwrap_or_default();
    if grids.is_empty() {
        log::warn!(
            "Trade post layout {} produced no grids; cargo trading is unavailable",
            config.trade_layout_path
        );
        return;
    }

    for grid in &grids {
        prepare_trade_grid(world, *grid, config.shuttle_damping);
    }

    if let Err(e) = world.insert_one(
        root,
        FtlDestination {
            whitelist: vec![Capability::CargoShuttle],
        },
    ) {
        log::warn!("Could not restrict trade map to cargo shuttles: {}", e);
    }

    let name = trade_station_name(&config.trade_station_name, rng);
    if let Err(e) = world.set_name(root, &name) {
        log::warn!("Could not name trade map: {}", e);
    }
    log::info!("{} is open for trade ({} grids)", name, grids.len());

    bus.publish(CargoEvent::TradePostCreated { map, name });
    bus.publish(CargoEvent::ShuttleConsolesRefreshed);
}

fn prepare_trade_grid(world: &mut World, grid: Entity, damping: f32) {
    for tag in [Tag::ProtectedGrid, Tag::TradeStation] {
        if let Err(e) = world.ensure_tag(grid, tag) {
            log::warn!("Could not tag trade grid: {}", e);
        }
    }
    if let Err(e) = world.insert_one(
        grid,
        ShuttleBody {
            linear_damping: damping,
            angular_damping: damping,
        },
    ) {
        log::warn!("Could not damp trade grid: {}", e);
    }
}

/// Tear the trade map down at the end of a round.
///
/// Cargo shuttles are deleted wherever they are (one may be docked at the
/// station rather than on the trade map) and detached from their stations.
pub fn cleanup_trade_station(
    world: &mut World,
    maps: &mut dyn MapManager,
    post: &mut TradePost,
    bus: &mut EventBus,
) {
    let Some(map) = post.live_map(world, maps) else {
        post.map = None;
        debug_assert!(
            world.tagged(Tag::CargoShuttle).is_empty(),
            "cargo shuttle outlived its trade map"
        );
        return;
    };

    if let Err(e) = maps.delete_map(world, map) {
        log::warn!("Failed to delete trade map: {}", e);
    }
    post.map = None;

    for shuttle in world.tagged(Tag::CargoShuttle) {
        detach_shuttle(world, shuttle);
        if let Err(e) = world.delete(shuttle) {
            log::warn!("Failed to delete cargo shuttle: {}", e);
        }
    }

    log::info!("Removed trade map {}", map);
    bus.publish(CargoEvent::TradePostRemoved { map });
}

/// Fragments of a broken trade station are still trade stations
pub fn on_trade_split(world: &mut World, grid: Entity, new_grids: &[Entity]) {
    if !world.has_tag(grid, Tag::TradeStation) {
        return;
    }
    for fragment in new_grids {
        if let Err(e) = world.ensure_tag(*fragment, Tag::TradeStation) {
            log::warn!("Could not tag split grid: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;
    use crate::generation::TradeLayout;
    use crate::maps::{InMemoryLayouts, MapRegistry};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Harness {
        world: World,
        maps: MapRegistry,
        loader: InMemoryLayouts,
        post: TradePost,
        config: CargoConfig,
        rng: StdRng,
        bus: EventBus,
    }

    impl Harness {
        fn new() -> Self {
            let config = CargoConfig::default();
            Self {
                world: World::new(),
                maps: MapRegistry::new(),
                loader: InMemoryLayouts::new()
                    .with_layout(config.trade_layout_path.clone(), TradeLayout::default_outpost()),
                post: TradePost::new(),
                config,
                rng: StdRng::seed_from_u64(1),
                bus: EventBus::new(),
            }
        }

        fn setup(&mut self) {
            setup_trade_post(
                &mut self.world,
                &mut self.maps,
                &self.loader,
                &mut self.post,
                &self.config,
                &mut self.rng,
                &mut self.bus,
            );
        }

        fn cleanup(&mut self) {
            cleanup_trade_station(&mut self.world, &mut self.maps, &mut self.post, &mut self.bus);
        }

        fn state(&self) -> TradePostState {
            self.post.state(&self.world, &self.maps)
        }
    }

    #[test]
    fn test_setup_activates_trade_post() {
        let mut h = Harness::new();
        assert_eq!(h.state(), TradePostState::Absent);

        h.setup();

        assert_eq!(h.state(), TradePostState::Active);
        let root = h.maps.map_entity(h.post.map().unwrap()).unwrap();
        let name = h.world.name(root).unwrap();
        assert!(name.starts_with("Automated Trade Station "));

        let ftl = h.world.get::<&FtlDestination>(root).unwrap();
        assert_eq!(ftl.whitelist, vec![Capability::CargoShuttle]);
        drop(ftl);

        let stations = h.world.tagged(Tag::TradeStation);
        assert_eq!(stations.len(), 1);
        assert!(h.world.has_tag(stations[0], Tag::ProtectedGrid));
        let body = h.world.get::<&ShuttleBody>(stations[0]).unwrap();
        assert_eq!(body.linear_damping, 10000.0);
        assert_eq!(body.angular_damping, 10000.0);
    }

    #[test]
    fn test_setup_is_idempotent() {
        let mut h = Harness::new();
        h.setup();
        let first = h.post.map();
        h.bus.drain();

        h.setup();

        assert_eq!(h.post.map(), first);
        assert_eq!(h.maps.len(), 1);
        assert!(h.bus.is_empty());
    }

    #[test]
    fn test_failed_load_stays_created() {
        let mut h = Harness::new();
        h.config.trade_layout_path = "/Maps/nowhere.json".to_string();

        h.setup();

        assert_eq!(h.state(), TradePostState::Created);
        assert!(h.world.tagged(Tag::TradeStation).is_empty());
        assert!(h.bus.is_empty());
    }

    #[test]
    fn test_cleanup_removes_map_and_shuttles() {
        let mut h = Harness::new();
        h.setup();

        let shuttle = h.world.spawn((Grid, Transform::default(), CargoShuttle::default()));
        let station = h
            .world
            .spawn((Station, StationCargoOrderDatabase::new().with_shuttle(shuttle)));

        h.cleanup();

        assert_eq!(h.state(), TradePostState::Absent);
        assert_eq!(h.post.map(), None);
        assert!(h.maps.is_empty());
        assert!(!h.world.contains(shuttle));
        assert!(h.world.tagged(Tag::TradeStation).is_empty());
        let db = h.world.get::<&StationCargoOrderDatabase>(station).unwrap();
        assert_eq!(db.shuttle, None);
    }

    #[test]
    fn test_cleanup_without_map_is_noop() {
        let mut h = Harness::new();
        h.cleanup();
        assert_eq!(h.state(), TradePostState::Absent);
        assert!(h.bus.is_empty());
    }

    #[test]
    fn test_setup_again_after_cleanup() {
        let mut h = Harness::new();
        h.setup();
        let first = h.post.map();
        h.cleanup();
        h.setup();

        assert_eq!(h.state(), TradePostState::Active);
        assert_ne!(h.post.map(), first);
    }

    /// Reports a grid that is despawned before it can be prepared
    struct VanishingGrid;

    impl MapLoader for VanishingGrid {
        fn try_load(
            &self,
            world: &mut World,
            _map_root: Entity,
            _path: &str,
        ) -> Option<Vec<Entity>> {
            let grid = world.spawn((Grid,));
            let _ = world.despawn(grid);
            Some(vec![grid])
        }
    }

    #[test]
    fn test_setup_survives_vanished_grid() {
        let mut h = Harness::new();
        setup_trade_post(
            &mut h.world,
            &mut h.maps,
            &VanishingGrid,
            &mut h.post,
            &h.config,
            &mut h.rng,
            &mut h.bus,
        );

        assert_eq!(h.state(), TradePostState::Active);
        assert!(h.world.tagged(Tag::TradeStation).is_empty());
        assert!(h.world.query::<&ShuttleBody>().iter().next().is_none());
    }

    #[test]
    fn test_split_fragments_stay_trade_stations() {
        let mut world = World::new();
        let station = world.spawn((Grid, TradeStation));
        let plain = world.spawn((Grid,));
        let a = world.spawn((Grid,));
        let b = world.spawn((Grid,));
        let c = world.spawn((Grid,));

        on_trade_split(&mut world, station, &[a, b]);
        on_trade_split(&mut world, plain, &[c]);

        assert!(world.has_tag(a, Tag::TradeStation));
        assert!(world.has_tag(b, Tag::TradeStation));
        assert!(!world.has_tag(c, Tag::TradeStation));
    }
}
