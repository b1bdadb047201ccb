//! CargoTrade Core - shuttle cargo orders and pallet sales
//!
//! Two pieces of station economy built on a `hecs` world:
//! - **Order projection**: which approved orders fit on the cargo shuttle,
//!   one order unit per anchored pallet, splitting the last order if needed
//! - **Pallet sales**: appraise and sell whatever rests on a grid's pallets,
//!   refusing fixtures, denylisted entities, zero-priced goods and anything
//!   that holds a living being (unless a completed bounty vouches for it)
//!
//! Around them sits the trade post: a shared map, created per round, that
//! cargo shuttles fly to.
//!
//! # Architecture
//!
//! - **Components**: pure data (transforms, pallets, order databases, tags)
//! - **World queries**: the [`world::WorldQuery`] trait every system reads through
//! - **Systems**: free functions over the world
//! - **Engine**: owns the world and routes [`messages::CargoMessage`]s through
//!   a dispatch table
//!
//! # Example
//!
//! ```rust,no_run
//! use cargotrade_core::prelude::*;
//!
//! let mut engine = CargoEngine::new(CargoConfig::default());
//! let grid = engine.world.spawn((Grid, Transform::default()));
//!
//! let appraisal = engine.appraise(grid);
//! println!("{} items worth {}", appraisal.count, appraisal.amount);
//! ```

pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod maps;
pub mod messages;
pub mod services;
pub mod systems;
pub mod world;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::CargoConfig;
    pub use crate::engine::CargoEngine;
    pub use crate::messages::{CargoMessage, MessageKind};
    pub use crate::world::{Tag, WorldMut, WorldQuery};
}
