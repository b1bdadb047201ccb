//! Pallet discovery and shuttle capacity
//!
//! Pallets are never cached: every call rescans the live world, so a pallet
//! that was unbolted or moved since the last call simply stops counting.

use hecs::Entity;

use crate::components::LookupFlags;
use crate::world::{Tag, WorldQuery};

/// Anchored pallets parented directly to `grid`.
///
/// A loose pallet could be drifting or falling, so it cannot delimit a
/// delivery or sale zone; it is skipped, as is any pallet on another grid.
pub fn cargo_pallets<W: WorldQuery + ?Sized>(world: &W, grid: Entity) -> Vec<Entity> {
    world
        .tagged(Tag::Pallet)
        .into_iter()
        .filter(|pallet| {
            world
                .transform(*pallet)
                .map_or(false, |xform| xform.parent == Some(grid) && xform.anchored)
        })
        .collect()
}

/// Order units the grid can take in one delivery: one per pallet
pub fn cargo_space<W: WorldQuery + ?Sized>(world: &W, grid: Entity) -> u32 {
    cargo_pallets(world, grid).len() as u32
}

/// Pallets from `pallets` with nothing dynamic resting on them
pub fn free_cargo_pallets<W: WorldQuery + ?Sized>(
    world: &W,
    grid: Entity,
    pallets: &[Entity],
) -> Vec<Entity> {
    pallets
        .iter()
        .copied()
        .filter(|pallet| match world.aabb_no_container(*pallet) {
            Some(area) => !world.any_intersecting(grid, &area, LookupFlags::DYNAMIC),
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;
    use hecs::World;

    fn spawn_pallet(world: &mut World, grid: Entity, x: f32, anchored: bool) -> Entity {
        let mut xform = Transform::new(grid, x, 0.0);
        xform.anchored = anchored;
        world.spawn((CargoPallet, xform, Fixture::tile(), LookupCategory::Static))
    }

    #[test]
    fn test_only_anchored_pallets_on_grid_count() {
        let mut world = World::new();
        let shuttle = world.spawn((Grid, Transform::default()));
        let station = world.spawn((Grid, Transform::default()));

        let a = spawn_pallet(&mut world, shuttle, 0.0, true);
        let b = spawn_pallet(&mut world, shuttle, 1.0, true);
        spawn_pallet(&mut world, shuttle, 2.0, false);
        spawn_pallet(&mut world, station, 0.0, true);

        assert_eq!(cargo_pallets(&world, shuttle), vec![a, b]);
        assert_eq!(cargo_space(&world, shuttle), 2);
    }

    #[test]
    fn test_no_pallets_means_no_space() {
        let mut world = World::new();
        let shuttle = world.spawn((Grid, Transform::default()));
        assert_eq!(cargo_space(&world, shuttle), 0);
    }

    #[test]
    fn test_free_pallets_skip_occupied() {
        let mut world = World::new();
        let shuttle = world.spawn((Grid, Transform::default()));
        let occupied = spawn_pallet(&mut world, shuttle, 0.0, true);
        let free = spawn_pallet(&mut world, shuttle, 1.0, true);

        world.spawn((
            Transform::new(shuttle, 0.0, 0.0),
            Fixture::new(0.5, 0.5),
            LookupCategory::Dynamic,
        ));
        // Sundries do not block a delivery slot
        world.spawn((
            Transform::new(shuttle, 1.0, 0.0),
            Fixture::new(0.2, 0.2),
            LookupCategory::Sundries,
        ));

        let pallets = cargo_pallets(&world, shuttle);
        assert_eq!(free_cargo_pallets(&world, shuttle, &pallets), vec![free]);
        assert!(!free_cargo_pallets(&world, shuttle, &pallets).contains(&occupied));
    }
}
