//! Cargo components: orders, pallets, consoles and pricing.

use hecs::Entity;
use serde::{Deserialize, Serialize};

/// A purchase request queued at a station
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoOrder {
    pub order_id: u32,
    pub product_id: String,
    /// Price per unit
    pub price: i32,
    pub order_quantity: u32,
    /// Never exceeds `order_quantity`
    pub num_dispatched: u32,
    pub requester: String,
    pub reason: String,
    pub approved: bool,
}

impl CargoOrder {
    pub fn new(
        order_id: u32,
        product_id: impl Into<String>,
        price: i32,
        order_quantity: u32,
        requester: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            product_id: product_id.into(),
            price,
            order_quantity,
            num_dispatched: 0,
            requester: requester.into(),
            reason: reason.into(),
            approved: false,
        }
    }

    pub fn approved(mut self) -> Self {
        self.approved = true;
        self
    }

    pub fn with_dispatched(mut self, dispatched: u32) -> Self {
        self.num_dispatched = dispatched.min(self.order_quantity);
        self
    }

    /// Units still waiting to go out on the shuttle
    pub fn remaining_to_ship(&self) -> u32 {
        self.order_quantity.saturating_sub(self.num_dispatched)
    }

    /// Record dispatched units, clamped so the order never over-ships.
    /// Returns how many units were actually recorded.
    pub fn dispatch(&mut self, units: u32) -> u32 {
        let recorded = units.min(self.remaining_to_ship());
        self.num_dispatched += recorded;
        recorded
    }

    pub fn is_fulfilled(&self) -> bool {
        self.num_dispatched >= self.order_quantity
    }

    /// Copy of this order carrying only `quantity` units, used when the
    /// shuttle cannot fit the whole order
    pub fn partial(&self, quantity: u32) -> Self {
        Self {
            order_id: self.order_id,
            product_id: self.product_id.clone(),
            price: self.price,
            order_quantity: quantity,
            num_dispatched: 0,
            requester: self.requester.clone(),
            reason: self.reason.clone(),
            approved: self.approved,
        }
    }
}

/// Order queue owned by a station. Insertion order is allocation priority.
#[derive(Debug, Clone, Default)]
pub struct StationCargoOrderDatabase {
    pub orders: Vec<CargoOrder>,
    /// Grid of the station's cargo shuttle, if it has one
    pub shuttle: Option<Entity>,
}

impl StationCargoOrderDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shuttle(mut self, shuttle: Entity) -> Self {
        self.shuttle = Some(shuttle);
        self
    }

    pub fn push(&mut self, order: CargoOrder) {
        self.orders.push(order);
    }

    pub fn get_mut(&mut self, order_id: u32) -> Option<&mut CargoOrder> {
        self.orders.iter_mut().find(|o| o.order_id == order_id)
    }

    /// Drop orders that have shipped in full
    pub fn remove_fulfilled(&mut self) {
        self.orders.retain(|o| !o.is_fulfilled());
    }
}

/// Marks a grid as a station's cargo shuttle
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoShuttle {
    pub station: Option<Entity>,
}

/// Anchored delivery/sale slot on a grid
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoPallet;

/// Console that appraises and sells what sits on the grid's pallets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CargoPalletConsole {
    /// Stack type paid out on a sale; the configured cash type if unset
    pub cash_type: Option<String>,
}

impl CargoPalletConsole {
    pub fn paying(cash_type: impl Into<String>) -> Self {
        Self {
            cash_type: Some(cash_type.into()),
        }
    }
}

/// Console showing the orders the station's shuttle will carry
#[derive(Debug, Clone, Copy, Default)]
pub struct CargoShuttleConsole;

/// Base appraisal of a single entity, excluding anything it contains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticPrice(pub f64);

/// Never sold, whatever it is worth (players, protected objects)
#[derive(Debug, Clone, Copy, Default)]
pub struct SaleDenylist;

/// Stack of currency spawned by a successful sale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashStack {
    pub stack_type: String,
    pub count: i64,
}
