//! Cargo trade configuration

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::maps::BUNDLED_TRADE_LAYOUT;

/// Tunables for the trade post and pallet sales.
///
/// Every field has a default, so a JSON file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CargoConfig {
    /// Build the trade post automatically when a cargo station starts
    pub grid_fill: bool,
    /// Layout loaded onto the trade map
    pub trade_layout_path: String,
    /// Linear and angular damping given to trade-post grids so they never drift
    pub shuttle_damping: f32,
    /// Name prefix for the trade map; a three-digit number is appended
    pub trade_station_name: String,
    /// Default stack type paid out by pallet consoles
    pub cash_type: String,
}

impl Default for CargoConfig {
    fn default() -> Self {
        Self {
            grid_fill: true,
            trade_layout_path: BUNDLED_TRADE_LAYOUT.to_string(),
            shuttle_damping: 10000.0,
            trade_station_name: "Automated Trade Station".to_string(),
            cash_type: "Credit".to_string(),
        }
    }
}

impl CargoConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_grid_fill(mut self, enabled: bool) -> Self {
        self.grid_fill = enabled;
        self
    }
}
