//! Maps and layout loading
//!
//! A map is a root entity; grids on the map are parented to it, so deleting
//! the map takes everything on it along.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use hecs::{Entity, World};

use crate::components::{MapId, MapRoot, Transform};
use crate::error::{CargoError, Result};
use crate::generation::{spawn_layout, TradeLayout};
use crate::world::{WorldMut, WorldQuery};

/// Creates, looks up and deletes maps
pub trait MapManager {
    fn create_map(&mut self, world: &mut World) -> MapId;

    fn delete_map(&mut self, world: &mut World, map: MapId) -> Result<()>;

    /// Live check: the map is registered and its root entity still exists
    fn map_exists(&self, world: &World, map: MapId) -> bool;

    fn map_entity(&self, map: MapId) -> Option<Entity>;
}

/// Loads a named layout onto a map
pub trait MapLoader {
    /// Root grids spawned by the load, or `None` if the layout could not be
    /// read. The caller decides how bad that is.
    fn try_load(&self, world: &mut World, map_root: Entity, path: &str) -> Option<Vec<Entity>>;
}

/// Registry of live maps
#[derive(Debug, Clone, Default)]
pub struct MapRegistry {
    maps: BTreeMap<MapId, Entity>,
    next_id: u32,
}

impl MapRegistry {
    pub fn new() -> Self {
        Self {
            maps: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl MapManager for MapRegistry {
    fn create_map(&mut self, world: &mut World) -> MapId {
        let id = MapId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        let root = world.spawn((MapRoot { id },));
        self.maps.insert(id, root);
        id
    }

    fn delete_map(&mut self, world: &mut World, map: MapId) -> Result<()> {
        let root = self.maps.remove(&map).ok_or(CargoError::NoSuchMap(map))?;
        world.delete(root)
    }

    fn map_exists(&self, world: &World, map: MapId) -> bool {
        self.maps.get(&map).map_or(false, |root| world.exists(*root))
    }

    fn map_entity(&self, map: MapId) -> Option<Entity> {
        self.maps.get(&map).copied()
    }
}

/// Map an entity sits on, found by walking up to a map root
pub fn map_of(world: &World, entity: Entity) -> Option<MapId> {
    let mut current = entity;
    for _ in 0..64 {
        if let Ok(root) = world.get::<&MapRoot>(current) {
            return Some(root.id);
        }
        current = world.get::<&Transform>(current).ok()?.parent?;
    }
    None
}

/// Resource path of the trade-post layout shipped with the crate
pub const BUNDLED_TRADE_LAYOUT: &str = "/data/trading_outpost.json";

const BUNDLED_TRADE_LAYOUT_JSON: &str = include_str!("../../../data/trading_outpost.json");

/// Reads JSON layouts from a resource directory.
///
/// Layout paths are resource paths such as `/Maps/Shuttles/outpost.json`,
/// resolved relative to `root`. A file on disk always wins; if
/// [`BUNDLED_TRADE_LAYOUT`] is missing from `root`, the copy compiled into
/// the crate is used.
#[derive(Debug, Clone)]
pub struct JsonLayoutLoader {
    root: PathBuf,
}

impl JsonLayoutLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn read_layout(&self, path: &str) -> Result<TradeLayout> {
        let file = match std::fs::File::open(self.root.join(path.trim_start_matches('/'))) {
            Ok(file) => file,
            Err(e)
                if e.kind() == std::io::ErrorKind::NotFound && path == BUNDLED_TRADE_LAYOUT =>
            {
                log::debug!("{} not under {}, using bundled copy", path, self.root.display());
                return Ok(serde_json::from_str(BUNDLED_TRADE_LAYOUT_JSON)?);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

impl MapLoader for JsonLayoutLoader {
    fn try_load(&self, world: &mut World, map_root: Entity, path: &str) -> Option<Vec<Entity>> {
        match self.read_layout(path) {
            Ok(layout) => Some(spawn_layout(world, map_root, &layout)),
            Err(e) => {
                log::warn!("Failed to load layout {}: {}", path, e);
                None
            }
        }
    }
}

/// Layouts held in memory, keyed by path
#[derive(Debug, Clone, Default)]
pub struct InMemoryLayouts {
    layouts: HashMap<String, TradeLayout>,
}

impl InMemoryLayouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, path: impl Into<String>, layout: TradeLayout) -> Self {
        self.layouts.insert(path.into(), layout);
        self
    }
}

impl MapLoader for InMemoryLayouts {
    fn try_load(&self, world: &mut World, map_root: Entity, path: &str) -> Option<Vec<Entity>> {
        let Some(layout) = self.layouts.get(path) else {
            log::warn!("No layout registered at {}", path);
            return None;
        };
        Some(spawn_layout(world, map_root, layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Grid;

    #[test]
    fn test_create_and_delete_map() {
        let mut world = World::new();
        let mut maps = MapRegistry::new();

        let map = maps.create_map(&mut world);
        let root = maps.map_entity(map).unwrap();
        let grid = world.spawn((Grid, Transform::new(root, 0.0, 0.0)));
        let on_grid = world.spawn((Transform::new(grid, 1.0, 1.0),));

        assert!(maps.map_exists(&world, map));
        assert_eq!(map_of(&world, on_grid), Some(map));

        maps.delete_map(&mut world, map).unwrap();

        assert!(!maps.map_exists(&world, map));
        assert!(!world.contains(grid));
        assert!(!world.contains(on_grid));
        assert!(matches!(
            maps.delete_map(&mut world, map),
            Err(CargoError::NoSuchMap(_))
        ));
    }

    #[test]
    fn test_map_ids_are_unique() {
        let mut world = World::new();
        let mut maps = MapRegistry::default();
        let a = maps.create_map(&mut world);
        let b = maps.create_map(&mut world);
        assert_ne!(a, b);
        assert_eq!(maps.len(), 2);
    }

    #[test]
    fn test_map_gone_when_root_despawned() {
        let mut world = World::new();
        let mut maps = MapRegistry::new();
        let map = maps.create_map(&mut world);

        world.despawn(maps.map_entity(map).unwrap()).unwrap();
        assert!(!maps.map_exists(&world, map));
    }

    #[test]
    fn test_missing_layout_file_loads_nothing() {
        let mut world = World::new();
        let root = world.spawn(());
        let loader = JsonLayoutLoader::new("/nonexistent-resources");

        assert!(loader.try_load(&mut world, root, "/Maps/missing.json").is_none());
        assert!(matches!(
            loader.read_layout("/Maps/missing.json"),
            Err(CargoError::Io(_))
        ));
    }

    #[test]
    fn test_bundled_layout_when_not_on_disk() {
        let mut world = World::new();
        let root = world.spawn(());
        let loader = JsonLayoutLoader::new("/nonexistent-resources");

        let grids = loader
            .try_load(&mut world, root, BUNDLED_TRADE_LAYOUT)
            .unwrap();
        assert_eq!(grids.len(), 2);
        assert_eq!(world.name(grids[0]).as_deref(), Some("Trade Outpost"));
    }

    #[test]
    fn test_json_layout_from_disk() {
        let dir = std::env::temp_dir().join(format!("cargotrade-layout-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("Maps")).unwrap();
        std::fs::write(
            dir.join("Maps/post.json"),
            r#"{ "grids": [ { "name": "Dock", "pallets": [ { "x": 0.0, "y": 0.0 } ] } ] }"#,
        )
        .unwrap();

        let mut world = World::new();
        let root = world.spawn(());
        let grids = JsonLayoutLoader::new(&dir)
            .try_load(&mut world, root, "/Maps/post.json")
            .unwrap();

        assert_eq!(grids.len(), 1);
        assert_eq!(world.name(grids[0]).as_deref(), Some("Dock"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_in_memory_layouts() {
        let mut world = World::new();
        let root = world.spawn(());
        let loader = InMemoryLayouts::new().with_layout("post", TradeLayout::default_outpost());

        assert_eq!(loader.try_load(&mut world, root, "post").map(|g| g.len()), Some(1));
        assert!(loader.try_load(&mut world, root, "other").is_none());
    }
}
