//! Outside collaborators the sale evaluator consults: appraisal and bounties.

use std::collections::{HashMap, HashSet};

use hecs::{Entity, World};

use crate::components::StaticPrice;
use crate::world::WorldQuery;

/// Appraises what an entity would fetch at the trade station
pub trait PriceOracle {
    /// Value of the entity including everything inside it. Zero means
    /// "not for sale", not "worthless".
    fn price(&self, world: &World, entity: Entity) -> f64;
}

/// Prices from [`StaticPrice`] components, summed over contents.
///
/// A container is worth its own price plus that of everything it holds, so
/// the sale evaluator only ever needs to price top-level items.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentPricing;

impl ComponentPricing {
    fn price_inner(&self, world: &World, entity: Entity, seen: &mut HashSet<Entity>) -> f64 {
        if !seen.insert(entity) {
            return 0.0;
        }
        let own = world.get::<&StaticPrice>(entity).map_or(0.0, |p| p.0);
        own + world
            .children(entity)
            .into_iter()
            .map(|child| self.price_inner(world, child, seen))
            .sum::<f64>()
    }
}

impl PriceOracle for ComponentPricing {
    fn price(&self, world: &World, entity: Entity) -> f64 {
        self.price_inner(world, entity, &mut HashSet::new())
    }
}

/// Decides which contained entities are let through the living-being veto
/// because they fulfil a bounty
pub trait BountyExemptions {
    fn is_exempt(&self, container: Entity, child: Entity) -> bool;
}

/// No bounties in play
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBounties;

impl BountyExemptions for NoBounties {
    fn is_exempt(&self, _container: Entity, _child: Entity) -> bool {
        false
    }
}

/// A flat exemption set, regardless of which container holds the entity
impl BountyExemptions for HashSet<Entity> {
    fn is_exempt(&self, _container: Entity, child: Entity) -> bool {
        self.contains(&child)
    }
}

/// Bounty containers whose contents completed a contract, keyed by the
/// container. Only the entities counted toward that container's bounty are
/// exempt, and only while they sit inside it.
#[derive(Debug, Clone, Default)]
pub struct CompletedBounties {
    completed: HashMap<Entity, HashSet<Entity>>,
}

impl CompletedBounties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&mut self, container: Entity, entities: impl IntoIterator<Item = Entity>) {
        self.completed
            .entry(container)
            .or_default()
            .extend(entities);
    }

    pub fn revoke(&mut self, container: Entity) {
        self.completed.remove(&container);
    }

    pub fn is_complete(&self, container: Entity) -> bool {
        self.completed.contains_key(&container)
    }
}

impl BountyExemptions for CompletedBounties {
    fn is_exempt(&self, container: Entity, child: Entity) -> bool {
        self.completed
            .get(&container)
            .map_or(false, |set| set.contains(&child))
    }
}
