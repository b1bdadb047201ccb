//! Component definitions for the cargo world.
//!
//! Components are pure data structs attached to entities.
//! They have no behavior - that lives in systems.

mod cargo;
mod common;
mod station;

pub use cargo::*;
pub use common::*;
pub use station::*;
