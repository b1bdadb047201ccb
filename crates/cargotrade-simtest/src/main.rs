//! CargoTrade Headless Scenario Harness
//!
//! Plays a trading round against the shipped trade-post layout and checks
//! every step: layout data, order projection, trade post setup, pallet sales,
//! grid split and round restart. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p cargotrade-simtest
//!   cargo run -p cargotrade-simtest -- --verbose

use cargotrade_core::generation::TradeLayout;
use cargotrade_core::maps::{map_of, InMemoryLayouts, MapManager};
use cargotrade_core::prelude::*;
use cargotrade_core::services::CompletedBounties;
use cargotrade_core::systems::{
    cargo_pallets, free_cargo_pallets, project_orders, CargoEvent, TradePostState,
};
use hecs::Entity;

// ── Trade-post layout (same JSON the game loads) ────────────────────────
const LAYOUT_JSON: &str = include_str!("../../../data/trading_outpost.json");

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== CargoTrade Scenario Harness ===\n");

    let mut results = Vec::new();

    // 1. Layout data validation
    let layout = match validate_layout(&mut results) {
        Some(layout) => layout,
        None => TradeLayout::default_outpost(),
    };

    // 2. Order projection sweep
    results.extend(validate_projection(verbose));

    // 3. Full round on the shipped layout
    results.extend(validate_round(layout, verbose));

    // 4. Config parsing
    results.extend(validate_config());

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Layout ───────────────────────────────────────────────────────────

fn validate_layout(results: &mut Vec<TestResult>) -> Option<TradeLayout> {
    println!("--- Trade Post Layout ---");

    let layout: TradeLayout = match serde_json::from_str(LAYOUT_JSON) {
        Ok(l) => l,
        Err(e) => {
            results.push(TestResult {
                name: "layout_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return None;
        }
    };

    results.push(TestResult {
        name: "layout_has_grids".into(),
        passed: !layout.grids.is_empty(),
        detail: format!("{} grids", layout.grids.len()),
    });

    let bare: Vec<&str> = layout
        .grids
        .iter()
        .filter(|g| g.pallets.is_empty())
        .map(|g| g.name.as_str())
        .collect();
    results.push(TestResult {
        name: "layout_every_grid_has_pallets".into(),
        passed: bare.is_empty(),
        detail: if bare.is_empty() {
            "every grid carries pallets".into()
        } else {
            format!("grids without pallets: {}", bare.join(", "))
        },
    });

    let consoles: usize = layout.grids.iter().map(|g| g.pallet_consoles.len()).sum();
    results.push(TestResult {
        name: "layout_has_sale_console".into(),
        passed: consoles > 0,
        detail: format!("{} pallet consoles", consoles),
    });

    // Two pallets on one spot would count the same goods twice over
    let mut overlapping = 0;
    for g in &layout.grids {
        for (i, a) in g.pallets.iter().enumerate() {
            if g.pallets[i + 1..].iter().any(|b| a == b) {
                overlapping += 1;
            }
        }
    }
    results.push(TestResult {
        name: "layout_pallets_distinct".into(),
        passed: overlapping == 0,
        detail: format!("{} duplicated pallet positions", overlapping),
    });

    Some(layout)
}

// ── 2. Projection ───────────────────────────────────────────────────────

fn order(id: u32, qty: u32, dispatched: u32, approved: bool) -> CargoOrder {
    let mut o = CargoOrder::new(id, "Crate", 100, qty, "Cargo", "Restock").with_dispatched(dispatched);
    o.approved = approved;
    o
}

fn validate_projection(verbose: bool) -> Vec<TestResult> {
    println!("--- Order Projection ---");
    let mut results = Vec::new();

    let queue = vec![order(1, 10, 0, true), order(2, 5, 2, true)];

    let tight = project_orders(&queue, 6);
    results.push(TestResult {
        name: "projection_splits_first_order".into(),
        passed: tight.len() == 1 && tight[0].order_id == 1 && tight[0].order_quantity == 6,
        detail: format!("{} orders, first qty {:?}", tight.len(), tight.first().map(|o| o.order_quantity)),
    });

    let roomy = project_orders(&queue, 20);
    results.push(TestResult {
        name: "projection_fits_both".into(),
        passed: roomy == queue,
        detail: format!("{} of {} orders unchanged", roomy.len(), queue.len()),
    });

    let mixed = vec![
        order(1, 3, 0, false),
        order(2, 4, 0, true),
        order(3, 4, 1, true),
        order(4, 2, 0, true),
    ];
    let mut over_capacity = Vec::new();
    for capacity in 0..=12 {
        let projected = project_orders(&mixed, capacity);
        let used: u32 = projected
            .iter()
            .map(|p| {
                if mixed.contains(p) {
                    p.remaining_to_ship()
                } else {
                    p.order_quantity
                }
            })
            .sum();
        if verbose {
            println!(
                "  capacity {:>2}: {:?}",
                capacity,
                projected
                    .iter()
                    .map(|p| (p.order_id, p.order_quantity))
                    .collect::<Vec<_>>()
            );
        }
        if used > capacity || projected.iter().any(|p| !p.approved) {
            over_capacity.push(capacity);
        }
    }
    results.push(TestResult {
        name: "projection_capacity_sweep".into(),
        passed: over_capacity.is_empty(),
        detail: if over_capacity.is_empty() {
            "capacities 0-12 respected, unapproved skipped".into()
        } else {
            format!("violations at capacities {:?}", over_capacity)
        },
    });

    results
}

// ── 3. Round ────────────────────────────────────────────────────────────

fn console_on(engine: &CargoEngine, grid: Entity) -> Option<Entity> {
    let mut query = engine.world.query::<(&CargoPalletConsole, &Transform)>();
    let found = query
        .iter()
        .find(|(_, (_, xform))| xform.parent == Some(grid))
        .map(|(e, _)| e);
    found
}

fn validate_round(layout: TradeLayout, verbose: bool) -> Vec<TestResult> {
    println!("--- Trading Round ---");
    let mut results = Vec::new();

    let config = CargoConfig::default();
    let grid_count = layout.grids.len();
    let loader = InMemoryLayouts::new().with_layout(config.trade_layout_path.clone(), layout);
    let mut engine = CargoEngine::new(config).with_loader(loader).with_seed(7);

    let station = engine.world.spawn((Station, EntityName::new("Relay Nine")));
    let shuttle = engine.world.spawn((
        Grid,
        Transform::default(),
        StationMember { station },
        CargoShuttle {
            station: Some(station),
        },
    ));
    for x in 0..4 {
        engine.world.spawn((
            CargoPallet,
            Transform::new(shuttle, x as f32, 0.0).anchored(),
            Fixture::tile(),
            LookupCategory::Static,
        ));
    }
    let mut db = StationCargoOrderDatabase::new().with_shuttle(shuttle);
    db.push(order(1, 3, 0, true));
    db.push(order(2, 5, 0, false));
    db.push(order(3, 4, 0, true));
    let _ = engine.world.insert_one(station, db);

    engine.handle(CargoMessage::StationInitialized { station });
    let events = engine.drain_events();

    results.push(TestResult {
        name: "round_trade_post_active".into(),
        passed: engine.trade_post_state() == TradePostState::Active,
        detail: format!("{:?}", engine.trade_post_state()),
    });

    let post_name = events.iter().find_map(|e| match e {
        CargoEvent::TradePostCreated { name, .. } => Some(name.clone()),
        _ => None,
    });
    results.push(TestResult {
        name: "round_trade_post_named".into(),
        passed: post_name
            .as_deref()
            .is_some_and(|n| n.starts_with("Automated Trade Station ") && n.len() == 27),
        detail: format!("{:?}", post_name),
    });

    let stations = engine.world.tagged(Tag::TradeStation);
    let protected = stations
        .iter()
        .all(|g| engine.world.has_tag(*g, Tag::ProtectedGrid));
    results.push(TestResult {
        name: "round_trade_grids_tagged".into(),
        passed: stations.len() == grid_count && protected,
        detail: format!("{} of {} grids tagged, protected={}", stations.len(), grid_count, protected),
    });

    let trade_map = engine.trade_post().map();
    let on_trade_map = stations
        .iter()
        .all(|g| trade_map.is_some() && map_of(&engine.world, *g) == trade_map);
    let cargo_only = trade_map
        .and_then(|m| engine.maps.map_entity(m))
        .and_then(|root| {
            engine
                .world
                .get::<&FtlDestination>(root)
                .ok()
                .map(|ftl| {
                    ftl.allows(&[Capability::CargoShuttle]) && !ftl.allows(&[Capability::Shuttle])
                })
        })
        .unwrap_or(false);
    results.push(TestResult {
        name: "round_trade_map_cargo_only".into(),
        passed: on_trade_map && cargo_only,
        detail: format!("grids on map={}, cargo-only FTL={}", on_trade_map, cargo_only),
    });

    let projected = engine.projected_orders(station);
    let shape: Vec<(u32, u32)> = projected
        .iter()
        .map(|o| (o.order_id, o.order_quantity))
        .collect();
    results.push(TestResult {
        name: "round_shuttle_projection".into(),
        passed: shape == vec![(1, 3), (3, 1)],
        detail: format!("{:?}", shape),
    });

    // Goods on the first grid's pallets: one sellable, one with a stowaway
    let Some(&grid) = stations.first() else {
        return results;
    };
    let goods = engine.world.spawn((
        Transform::new(grid, 0.0, 0.0),
        Fixture::new(0.5, 0.5),
        LookupCategory::Dynamic,
        StaticPrice(150.0),
    ));
    let crate_ = engine.world.spawn((
        Transform::new(grid, 1.0, 0.0),
        Fixture::new(0.5, 0.5),
        LookupCategory::Dynamic,
        StaticPrice(900.0),
    ));
    let stowaway = engine
        .world
        .spawn((Transform::contained_in(crate_), LivingBeing));

    let pallets = cargo_pallets(&engine.world, grid);
    let free = free_cargo_pallets(&engine.world, grid, &pallets);
    results.push(TestResult {
        name: "round_loaded_pallets_not_free".into(),
        passed: free.len() + 2 == pallets.len(),
        detail: format!("{} of {} pallets free", free.len(), pallets.len()),
    });

    let appraisal = engine.appraise(grid);
    results.push(TestResult {
        name: "round_appraisal_skips_stowaway".into(),
        passed: appraisal.count == 1 && appraisal.amount == 150.0,
        detail: format!("{} items worth {}", appraisal.count, appraisal.amount),
    });

    if let Some(console) = console_on(&engine, grid) {
        let trader = engine.world.spawn((LivingBeing,));
        engine.handle(CargoMessage::PalletSell {
            console,
            actor: Some(trader),
        });
        let events = engine.drain_events();
        if verbose {
            for e in &events {
                println!("  event: {:?}", e);
            }
        }
        let paid: i64 = events
            .iter()
            .filter_map(|e| match e {
                CargoEvent::CashSpawned { count, .. } => Some(*count),
                _ => None,
            })
            .sum();
        results.push(TestResult {
            name: "round_sale_pays_out".into(),
            passed: paid == 150 && !engine.world.contains(goods) && engine.world.contains(crate_),
            detail: format!("paid {}", paid),
        });
    } else {
        results.push(TestResult {
            name: "round_sale_pays_out".into(),
            passed: false,
            detail: "no pallet console on the trade grid".into(),
        });
    }

    let mut bounties = CompletedBounties::new();
    bounties.complete(crate_, [stowaway]);
    engine.set_bounties(bounties);
    let vouched = engine.appraise(grid);
    results.push(TestResult {
        name: "round_bounty_releases_crate".into(),
        passed: vouched.count == 1 && vouched.amount == 900.0,
        detail: format!("{} items worth {}", vouched.count, vouched.amount),
    });

    let fragment = engine.world.spawn((Grid, Transform::default()));
    engine.handle(CargoMessage::GridSplit {
        grid,
        new_grids: vec![fragment],
    });
    results.push(TestResult {
        name: "round_split_keeps_trade_tag".into(),
        passed: engine.world.has_tag(fragment, Tag::TradeStation),
        detail: "fragment inherits TradeStation".into(),
    });

    let map_root = engine
        .trade_post()
        .map()
        .and_then(|m| engine.maps.map_entity(m));
    engine.handle(CargoMessage::RoundRestartCleanup);
    results.push(TestResult {
        name: "round_restart_cleans_up".into(),
        passed: engine.trade_post_state() == TradePostState::Absent
            && engine.world.tagged(Tag::CargoShuttle).is_empty()
            && map_root.is_some_and(|r| !engine.world.contains(r)),
        detail: format!(
            "{:?}, {} maps live",
            engine.trade_post_state(),
            engine.maps.len()
        ),
    });

    results
}

// ── 4. Config ───────────────────────────────────────────────────────────

fn validate_config() -> Vec<TestResult> {
    println!("--- Config ---");
    let mut results = Vec::new();

    match CargoConfig::from_json_str(r#"{ "grid_fill": false, "cash_type": "Doubloon" }"#) {
        Ok(config) => results.push(TestResult {
            name: "config_partial_json".into(),
            passed: !config.grid_fill
                && config.cash_type == "Doubloon"
                && config.trade_station_name == "Automated Trade Station",
            detail: format!("{:?}", config),
        }),
        Err(e) => results.push(TestResult {
            name: "config_partial_json".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    let mut engine = CargoEngine::new(CargoConfig::default());
    let station = engine
        .world
        .spawn((Station, StationCargoOrderDatabase::new()));
    engine.handle(CargoMessage::StationInitialized { station });
    results.push(TestResult {
        name: "config_default_layout_loads".into(),
        passed: engine.trade_post_state() == TradePostState::Active,
        detail: format!("{:?}", engine.trade_post_state()),
    });

    let mut engine = CargoEngine::new(CargoConfig::default().with_grid_fill(false));
    let station = engine
        .world
        .spawn((Station, StationCargoOrderDatabase::new()));
    engine.handle(CargoMessage::StationInitialized { station });
    results.push(TestResult {
        name: "config_grid_fill_off".into(),
        passed: engine.trade_post_state() == TradePostState::Absent,
        detail: "no trade post without grid fill".into(),
    });

    results
}
