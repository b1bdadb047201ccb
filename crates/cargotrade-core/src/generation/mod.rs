//! Generation - spawning trade-post layouts and naming them

mod layout;
mod names;

pub use layout::*;
pub use names::*;
