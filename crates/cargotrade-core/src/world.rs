//! World queries - the narrow interface the cargo systems read the world through.
//!
//! Systems ask about capability tags, transforms, containment and spatial
//! overlap through [`WorldQuery`] rather than probing components directly.
//! The `hecs::World` implementation maps each [`Tag`] onto a marker
//! component.

use std::collections::HashSet;

use hecs::{Component, Entity, World};

use crate::components::*;
use crate::error::{CargoError, Result};

/// Guard against runaway parent chains
const MAX_PARENT_DEPTH: usize = 64;

/// Capability tags the cargo systems care about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Grid,
    Pallet,
    LivingBeing,
    SaleDenylist,
    TradeStation,
    ProtectedGrid,
    CargoShuttle,
}

/// Read access to entities, tags, containment and spatial lookups
pub trait WorldQuery {
    fn exists(&self, entity: Entity) -> bool;

    fn has_tag(&self, entity: Entity, tag: Tag) -> bool;

    /// Every entity carrying `tag`, in entity id order
    fn tagged(&self, tag: Tag) -> Vec<Entity>;

    fn transform(&self, entity: Entity) -> Option<Transform>;

    fn fixture(&self, entity: Entity) -> Option<Fixture>;

    fn name(&self, entity: Entity) -> Option<String>;

    /// Entities whose transform parent is `entity`, in entity id order
    fn children(&self, entity: Entity) -> Vec<Entity>;

    /// Direct children of `grid` in one of the `flags` categories whose
    /// bounds overlap `area` (grid-local). Contained entities are never
    /// returned because their parent is their container, not the grid.
    fn intersecting(&self, grid: Entity, area: &Aabb, flags: LookupFlags) -> Vec<Entity>;

    fn any_intersecting(&self, grid: Entity, area: &Aabb, flags: LookupFlags) -> bool {
        !self.intersecting(grid, area, flags).is_empty()
    }

    /// Grid-local bounds of an entity, ignoring whatever it sits inside
    fn aabb_no_container(&self, entity: Entity) -> Option<Aabb> {
        let xform = self.transform(entity)?;
        Some(bounds_for(self.fixture(entity), &xform))
    }

    /// Entities overlapping `target`'s own bounds on its parent grid
    fn entities_intersecting(&self, target: Entity, flags: LookupFlags) -> Vec<Entity> {
        let Some(grid) = self.transform(target).and_then(|x| x.parent) else {
            return Vec::new();
        };
        let Some(area) = self.aabb_no_container(target) else {
            return Vec::new();
        };
        self.intersecting(grid, &area, flags)
            .into_iter()
            .filter(|e| *e != target)
            .collect()
    }

    /// The grid an entity is on: itself if it is a grid, otherwise the
    /// first grid up its parent chain
    fn grid_of(&self, entity: Entity) -> Option<Entity> {
        let mut current = entity;
        for _ in 0..MAX_PARENT_DEPTH {
            if self.has_tag(current, Tag::Grid) {
                return Some(current);
            }
            current = self.transform(current)?.parent?;
        }
        None
    }
}

/// Mutations the cargo systems perform
pub trait WorldMut: WorldQuery {
    /// Delete an entity and everything contained in it
    fn delete(&mut self, entity: Entity) -> Result<()>;

    /// Add `tag` if it is not already present
    fn ensure_tag(&mut self, entity: Entity, tag: Tag) -> Result<()>;

    fn set_name(&mut self, entity: Entity, name: &str) -> Result<()>;
}

/// Bounds of a fixture placed by a transform; no fixture means a point
pub fn bounds_for(fixture: Option<Fixture>, xform: &Transform) -> Aabb {
    match fixture {
        Some(f) => f.bounds_at(xform.local_position, xform.local_rotation),
        None => Aabb::centered(xform.local_position, Vec2::ZERO),
    }
}

fn entities_with<T: Component>(world: &World) -> Vec<Entity> {
    let mut found: Vec<Entity> = world.query::<&T>().iter().map(|(e, _)| e).collect();
    found.sort_by_key(|e| e.id());
    found
}

fn has<T: Component>(world: &World, entity: Entity) -> bool {
    world.entity(entity).map_or(false, |r| r.has::<T>())
}

fn ensure<T: Component>(world: &mut World, entity: Entity, component: T) -> Result<()> {
    if has::<T>(world, entity) {
        return Ok(());
    }
    world
        .insert_one(entity, component)
        .map_err(|_| CargoError::NoSuchEntity(entity))
}

impl WorldQuery for World {
    fn exists(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn has_tag(&self, entity: Entity, tag: Tag) -> bool {
        match tag {
            Tag::Grid => has::<Grid>(self, entity),
            Tag::Pallet => has::<CargoPallet>(self, entity),
            Tag::LivingBeing => has::<LivingBeing>(self, entity),
            Tag::SaleDenylist => has::<SaleDenylist>(self, entity),
            Tag::TradeStation => has::<TradeStation>(self, entity),
            Tag::ProtectedGrid => has::<ProtectedGrid>(self, entity),
            Tag::CargoShuttle => has::<CargoShuttle>(self, entity),
        }
    }

    fn tagged(&self, tag: Tag) -> Vec<Entity> {
        match tag {
            Tag::Grid => entities_with::<Grid>(self),
            Tag::Pallet => entities_with::<CargoPallet>(self),
            Tag::LivingBeing => entities_with::<LivingBeing>(self),
            Tag::SaleDenylist => entities_with::<SaleDenylist>(self),
            Tag::TradeStation => entities_with::<TradeStation>(self),
            Tag::ProtectedGrid => entities_with::<ProtectedGrid>(self),
            Tag::CargoShuttle => entities_with::<CargoShuttle>(self),
        }
    }

    fn transform(&self, entity: Entity) -> Option<Transform> {
        self.get::<&Transform>(entity).ok().map(|x| *x)
    }

    fn fixture(&self, entity: Entity) -> Option<Fixture> {
        self.get::<&Fixture>(entity).ok().map(|f| *f)
    }

    fn name(&self, entity: Entity) -> Option<String> {
        self.get::<&EntityName>(entity).ok().map(|n| n.0.clone())
    }

    fn children(&self, entity: Entity) -> Vec<Entity> {
        let mut children: Vec<Entity> = self
            .query::<&Transform>()
            .iter()
            .filter(|(_, xform)| xform.parent == Some(entity))
            .map(|(e, _)| e)
            .collect();
        children.sort_by_key(|e| e.id());
        children
    }

    fn intersecting(&self, grid: Entity, area: &Aabb, flags: LookupFlags) -> Vec<Entity> {
        let mut hits: Vec<Entity> = self
            .query::<(&Transform, &LookupCategory, Option<&Fixture>)>()
            .iter()
            .filter(|(_, (xform, category, _))| {
                xform.parent == Some(grid) && flags.contains(category.flag())
            })
            .filter(|(_, (xform, _, fixture))| {
                bounds_for(fixture.copied(), xform).intersects(area)
            })
            .map(|(e, _)| e)
            .collect();
        hits.sort_by_key(|e| e.id());
        hits
    }
}

impl WorldMut for World {
    fn delete(&mut self, entity: Entity) -> Result<()> {
        if !self.contains(entity) {
            return Err(CargoError::NoSuchEntity(entity));
        }

        // Gather the containment tree first; despawning while walking would
        // lose the parent links.
        let mut doomed = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            doomed.push(current);
            stack.extend(self.children(current));
        }

        for e in doomed {
            let _ = self.despawn(e);
        }
        Ok(())
    }

    fn ensure_tag(&mut self, entity: Entity, tag: Tag) -> Result<()> {
        match tag {
            Tag::Grid => ensure(self, entity, Grid),
            Tag::Pallet => ensure(self, entity, CargoPallet),
            Tag::LivingBeing => ensure(self, entity, LivingBeing),
            Tag::SaleDenylist => ensure(self, entity, SaleDenylist),
            Tag::TradeStation => ensure(self, entity, TradeStation),
            Tag::ProtectedGrid => ensure(self, entity, ProtectedGrid),
            Tag::CargoShuttle => ensure(self, entity, CargoShuttle::default()),
        }
    }

    fn set_name(&mut self, entity: Entity, name: &str) -> Result<()> {
        self.insert_one(entity, EntityName::new(name))
            .map_err(|_| CargoError::NoSuchEntity(entity))
    }
}
