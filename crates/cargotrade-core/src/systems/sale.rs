//! Pallet sales - appraising and selling whatever rests on a grid's pallets

use std::collections::HashSet;

use hecs::{Entity, World};

use crate::components::LookupFlags;
use crate::services::{BountyExemptions, PriceOracle};
use crate::systems::{cargo_pallets, owning_station, EntitySoldEvent, EventBus};
use crate::world::{Tag, WorldMut, WorldQuery};

/// Goods found on a grid's pallets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PalletGoods {
    /// In discovery order, each entity once
    pub to_sell: Vec<Entity>,
    pub amount: f64,
}

impl PalletGoods {
    pub fn count(&self) -> usize {
        self.to_sell.len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_sell.is_empty()
    }

    pub fn as_set(&self) -> HashSet<Entity> {
        self.to_sell.iter().copied().collect()
    }
}

/// Result of a read-only appraisal
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Appraisal {
    pub count: usize,
    pub amount: f64,
}

/// Result of a sale
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SaleOutcome {
    pub sold: bool,
    pub amount: f64,
}

/// What a pallet console displays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PalletConsoleState {
    pub appraisal: i64,
    pub count: usize,
    /// False when the console is not on a grid
    pub enabled: bool,
}

/// Whether `entity` may be sold: neither it nor anything inside it is a
/// living being, except contents a completed bounty exempts.
///
/// Each entity is visited at most once per call, so a malformed containment
/// cycle terminates instead of recursing forever.
pub fn can_sell<W, B>(world: &W, entity: Entity, bounties: &B) -> bool
where
    W: WorldQuery + ?Sized,
    B: BountyExemptions + ?Sized,
{
    let mut visited = HashSet::new();
    can_sell_inner(world, entity, bounties, &mut visited)
}

fn can_sell_inner<W, B>(
    world: &W,
    entity: Entity,
    bounties: &B,
    visited: &mut HashSet<Entity>,
) -> bool
where
    W: WorldQuery + ?Sized,
    B: BountyExemptions + ?Sized,
{
    if !visited.insert(entity) {
        return true;
    }

    if world.has_tag(entity, Tag::LivingBeing) {
        return false;
    }

    for child in world.children(entity) {
        if bounties.is_exempt(entity, child) {
            continue;
        }
        if !can_sell_inner(world, child, bounties, visited) {
            return false;
        }
    }

    true
}

/// Collect everything sellable on the grid's pallets and its total value.
///
/// Items on several pallets are counted once. Anchored fixtures, anything
/// holding a living being, denylisted entities and zero-priced entities are
/// left where they are.
pub fn pallet_goods(
    world: &World,
    grid: Entity,
    pricing: &dyn PriceOracle,
    bounties: &dyn BountyExemptions,
) -> PalletGoods {
    let mut goods = PalletGoods::default();
    let mut seen = HashSet::new();

    for pallet in cargo_pallets(world, grid) {
        // Containers already carry the price of their contents, so only
        // top-level entities resting on the pallet are considered.
        let candidates =
            world.entities_intersecting(pallet, LookupFlags::DYNAMIC | LookupFlags::SUNDRIES);

        for ent in candidates {
            if seen.contains(&ent) {
                continue;
            }
            if let Some(xform) = world.transform(ent) {
                if xform.anchored || !can_sell(world, ent, bounties) {
                    continue;
                }
            }
            if world.has_tag(ent, Tag::SaleDenylist) {
                continue;
            }

            let price = pricing.price(world, ent);
            if price == 0.0 {
                continue;
            }

            seen.insert(ent);
            goods.to_sell.push(ent);
            goods.amount += price;
        }
    }

    goods
}

/// Read-only count and value of what the grid's pallets hold
pub fn appraise_grid(
    world: &World,
    grid: Entity,
    pricing: &dyn PriceOracle,
    bounties: &dyn BountyExemptions,
) -> Appraisal {
    let goods = pallet_goods(world, grid, pricing, bounties);
    Appraisal {
        count: goods.count(),
        amount: goods.amount,
    }
}

/// Sell everything on the grid's pallets.
///
/// One [`EntitySoldEvent`] is published while the goods still exist, then
/// every sold entity is deleted. Deletion is best effort: an entity that
/// vanished in between is logged and skipped, and the sale still stands.
pub fn sell_pallets(
    world: &mut World,
    grid: Entity,
    station: Option<Entity>,
    pricing: &dyn PriceOracle,
    bounties: &dyn BountyExemptions,
    bus: &mut EventBus,
) -> SaleOutcome {
    let station = station.or_else(|| owning_station(world, grid));
    let goods = pallet_goods(world, grid, pricing, bounties);

    log::debug!("Cargo sold {} entities for {}", goods.count(), goods.amount);

    if goods.is_empty() {
        return SaleOutcome {
            sold: false,
            amount: goods.amount,
        };
    }

    bus.publish_sale(
        world,
        EntitySoldEvent {
            station,
            sold: goods.as_set(),
        },
    );

    for ent in &goods.to_sell {
        if let Err(e) = world.delete(*ent) {
            log::warn!("Sold entity could not be deleted: {}", e);
        }
    }

    SaleOutcome {
        sold: true,
        amount: goods.amount,
    }
}

/// Display state for a pallet console; a console off-grid is disabled
pub fn pallet_console_state(
    world: &World,
    console: Entity,
    pricing: &dyn PriceOracle,
    bounties: &dyn BountyExemptions,
) -> PalletConsoleState {
    let Some(grid) = world.grid_of(console) else {
        log::debug!("Pallet console {:?} is not on a grid", console);
        return PalletConsoleState::default();
    };

    let appraisal = appraise_grid(world, grid, pricing, bounties);
    PalletConsoleState {
        appraisal: appraisal.amount as i64,
        count: appraisal.count,
        enabled: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::*;
    use crate::services::{ComponentPricing, NoBounties};
    use crate::systems::CargoEvent;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Scene {
        world: World,
        grid: Entity,
        station: Entity,
    }

    fn scene(pallet_xs: &[f32]) -> Scene {
        let mut world = World::new();
        let station = world.spawn((Station, EntityName::new("Trade Hub")));
        let grid = world.spawn((Grid, Transform::default(), StationMember { station }));
        for x in pallet_xs {
            world.spawn((
                CargoPallet,
                Transform::new(grid, *x, 0.0).anchored(),
                Fixture::tile(),
                LookupCategory::Static,
            ));
        }
        Scene {
            world,
            grid,
            station,
        }
    }

    fn item(world: &mut World, grid: Entity, x: f32, price: f64) -> Entity {
        world.spawn((
            Transform::new(grid, x, 0.0),
            Fixture::new(0.4, 0.4),
            LookupCategory::Dynamic,
            StaticPrice(price),
        ))
    }

    #[test]
    fn test_appraise_sums_items_on_pallets() {
        let mut s = scene(&[0.0, 2.0]);
        item(&mut s.world, s.grid, 0.0, 100.0);
        item(&mut s.world, s.grid, 2.1, 25.5);
        // Off every pallet
        item(&mut s.world, s.grid, 5.0, 999.0);

        let appraisal = appraise_grid(&s.world, s.grid, &ComponentPricing, &NoBounties);
        assert_eq!(appraisal.count, 2);
        assert_eq!(appraisal.amount, 125.5);
    }

    #[test]
    fn test_item_spanning_two_pallets_counted_once() {
        let mut s = scene(&[0.0, 1.0]);
        s.world.spawn((
            Transform::new(s.grid, 0.5, 0.0),
            Fixture::new(1.0, 0.5),
            LookupCategory::Dynamic,
            StaticPrice(40.0),
        ));

        let goods = pallet_goods(&s.world, s.grid, &ComponentPricing, &NoBounties);
        assert_eq!(goods.count(), 1);
        assert_eq!(goods.amount, 40.0);
    }

    #[test]
    fn test_unanchored_pallet_is_not_a_sale_zone() {
        let mut s = scene(&[]);
        s.world.spawn((
            CargoPallet,
            Transform::new(s.grid, 0.0, 0.0),
            Fixture::tile(),
            LookupCategory::Dynamic,
        ));
        item(&mut s.world, s.grid, 0.0, 10.0);

        let appraisal = appraise_grid(&s.world, s.grid, &ComponentPricing, &NoBounties);
        assert_eq!(appraisal, Appraisal::default());
    }

    #[test]
    fn test_excluded_entities() {
        let mut s = scene(&[0.0]);
        let anchored = item(&mut s.world, s.grid, 0.0, 10.0);
        s.world
            .get::<&mut Transform>(anchored)
            .unwrap()
            .anchored = true;
        let denied = item(&mut s.world, s.grid, 0.1, 10.0);
        s.world.insert_one(denied, SaleDenylist).unwrap();
        let mob = item(&mut s.world, s.grid, -0.1, 10.0);
        s.world.insert_one(mob, LivingBeing).unwrap();
        item(&mut s.world, s.grid, 0.2, 0.0);
        let kept = item(&mut s.world, s.grid, -0.2, 3.0);

        let goods = pallet_goods(&s.world, s.grid, &ComponentPricing, &NoBounties);
        assert_eq!(goods.to_sell, vec![kept]);
        assert_eq!(goods.amount, 3.0);
    }

    #[test]
    fn test_only_dynamic_and_sundries_are_for_sale() {
        let mut s = scene(&[0.0]);
        let coin = s.world.spawn((
            Transform::new(s.grid, 0.1, 0.1),
            Fixture::new(0.1, 0.1),
            LookupCategory::Sundries,
            StaticPrice(5.0),
        ));
        // A wall-mounted machine reaching over the pallet
        let machine = s.world.spawn((
            Transform::new(s.grid, 0.0, 0.8),
            Fixture::new(1.0, 0.5),
            LookupCategory::Static,
            StaticPrice(2000.0),
        ));
        let crate_ = item(&mut s.world, s.grid, 0.0, 20.0);

        let goods = pallet_goods(&s.world, s.grid, &ComponentPricing, &NoBounties);
        assert_eq!(goods.as_set(), [coin, crate_].into_iter().collect::<HashSet<_>>());
        assert_eq!(goods.amount, 25.0);

        let mut bus = EventBus::new();
        let outcome = sell_pallets(
            &mut s.world,
            s.grid,
            None,
            &ComponentPricing,
            &NoBounties,
            &mut bus,
        );
        assert!(outcome.sold);
        assert!(!s.world.contains(coin));
        assert!(s.world.contains(machine));
    }

    #[test]
    fn test_nested_living_being_vetoes_container() {
        let mut s = scene(&[0.0]);
        let locker = item(&mut s.world, s.grid, 0.0, 80.0);
        let bag = s.world.spawn((Transform::contained_in(locker),));
        let monkey = s.world.spawn((Transform::contained_in(bag), LivingBeing));

        assert!(!can_sell(&s.world, locker, &NoBounties));
        assert_eq!(
            appraise_grid(&s.world, s.grid, &ComponentPricing, &NoBounties).count,
            0
        );

        let bounty: HashSet<Entity> = [monkey].into_iter().collect();
        assert!(can_sell(&s.world, locker, &bounty));
        assert_eq!(
            appraise_grid(&s.world, s.grid, &ComponentPricing, &bounty).count,
            1
        );
    }

    #[test]
    fn test_bounty_must_cover_every_living_being() {
        let mut s = scene(&[0.0]);
        let crate_ = item(&mut s.world, s.grid, 0.0, 10.0);
        let exempt = s.world.spawn((Transform::contained_in(crate_), LivingBeing));
        s.world.spawn((Transform::contained_in(crate_), LivingBeing));

        let bounty: HashSet<Entity> = [exempt].into_iter().collect();
        assert!(!can_sell(&s.world, crate_, &bounty));
    }

    #[test]
    fn test_bounty_exempts_whole_subtree() {
        let mut world = World::new();
        let crate_ = world.spawn((Transform::default(),));
        let cage = world.spawn((Transform::contained_in(crate_),));
        world.spawn((Transform::contained_in(cage), LivingBeing));

        let bounty: HashSet<Entity> = [cage].into_iter().collect();
        assert!(can_sell(&world, crate_, &bounty));
    }

    #[test]
    fn test_containment_cycle_terminates() {
        let mut world = World::new();
        let a = world.spawn(());
        let b = world.spawn((Transform::contained_in(a),));
        world.insert_one(a, Transform::contained_in(b)).unwrap();

        assert!(can_sell(&world, a, &NoBounties));

        world.insert_one(b, LivingBeing).unwrap();
        assert!(!can_sell(&world, a, &NoBounties));
    }

    #[test]
    fn test_appraise_is_side_effect_free() {
        let mut s = scene(&[0.0]);
        item(&mut s.world, s.grid, 0.0, 12.0);

        let first = appraise_grid(&s.world, s.grid, &ComponentPricing, &NoBounties);
        let second = appraise_grid(&s.world, s.grid, &ComponentPricing, &NoBounties);
        assert_eq!(first, second);
        assert_eq!(s.world.len(), 4);
    }

    #[test]
    fn test_empty_sale_emits_nothing() {
        let mut s = scene(&[0.0]);
        let mut bus = EventBus::new();
        let before = s.world.len();

        let outcome = sell_pallets(
            &mut s.world,
            s.grid,
            None,
            &ComponentPricing,
            &NoBounties,
            &mut bus,
        );

        assert_eq!(outcome, SaleOutcome::default());
        assert!(bus.is_empty());
        assert_eq!(s.world.len(), before);
    }

    struct ExistenceProbe(Rc<RefCell<Vec<bool>>>);

    impl crate::systems::SaleListener for ExistenceProbe {
        fn on_entity_sold(&mut self, world: &World, event: &EntitySoldEvent) {
            let mut seen = self.0.borrow_mut();
            for ent in &event.sold {
                seen.push(world.contains(*ent));
            }
        }
    }

    #[test]
    fn test_sale_event_precedes_deletion() {
        let mut s = scene(&[0.0, 1.0]);
        let a = item(&mut s.world, s.grid, 0.0, 10.0);
        let b = item(&mut s.world, s.grid, 1.0, 15.0);
        let contents = s.world.spawn((Transform::contained_in(a), StaticPrice(5.0)));

        let probe = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        bus.subscribe_sales(Box::new(ExistenceProbe(probe.clone())));

        let outcome = sell_pallets(
            &mut s.world,
            s.grid,
            None,
            &ComponentPricing,
            &NoBounties,
            &mut bus,
        );

        assert!(outcome.sold);
        assert_eq!(outcome.amount, 30.0);
        assert_eq!(*probe.borrow(), vec![true, true]);

        let events = bus.drain();
        assert_eq!(events.len(), 1);
        match &events[0] {
            CargoEvent::EntitySold(ev) => {
                assert_eq!(ev.station, Some(s.station));
                assert_eq!(ev.sold, [a, b].into_iter().collect());
            }
            other => panic!("unexpected event {:?}", other),
        }

        assert!(!s.world.contains(a));
        assert!(!s.world.contains(b));
        assert!(!s.world.contains(contents));
        assert_eq!(
            appraise_grid(&s.world, s.grid, &ComponentPricing, &NoBounties),
            Appraisal::default()
        );
    }

    #[test]
    fn test_pallet_console_state() {
        let mut s = scene(&[0.0]);
        item(&mut s.world, s.grid, 0.0, 99.9);
        let console = s.world.spawn((
            CargoPalletConsole::default(),
            Transform::new(s.grid, 3.0, 3.0).anchored(),
        ));
        let adrift = s.world.spawn((CargoPalletConsole::default(), Transform::default()));

        let state = pallet_console_state(&s.world, console, &ComponentPricing, &NoBounties);
        assert_eq!(
            state,
            PalletConsoleState {
                appraisal: 99,
                count: 1,
                enabled: true
            }
        );
        assert_eq!(
            pallet_console_state(&s.world, adrift, &ComponentPricing, &NoBounties),
            PalletConsoleState::default()
        );
    }
}
