//! Systems - logic that reads and updates the cargo world

mod events;
mod orders;
mod pallets;
mod sale;
mod station;
mod trade_post;

pub use events::*;
pub use orders::*;
pub use pallets::*;
pub use sale::*;
pub use station::*;
pub use trade_post::*;
