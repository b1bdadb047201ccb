//! Incoming messages the engine reacts to

use hecs::Entity;

/// Discriminant used to key the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    PalletUiOpened,
    PalletAppraise,
    PalletSell,
    ShuttleConsoleStartup,
    CargoShuttleChanged,
    GridSplit,
    RoundRestartCleanup,
    StationInitialized,
    GridFillChanged,
}

/// A console interaction or world notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CargoMessage {
    /// Someone opened a pallet console's sale window
    PalletUiOpened {
        console: Entity,
        actor: Option<Entity>,
    },
    /// Refresh button on a pallet console
    PalletAppraise {
        console: Entity,
        actor: Option<Entity>,
    },
    PalletSell {
        console: Entity,
        actor: Option<Entity>,
    },
    ShuttleConsoleStartup {
        console: Entity,
    },
    /// A cargo shuttle was created, moved or changed hands
    CargoShuttleChanged {
        shuttle: Entity,
    },
    GridSplit {
        grid: Entity,
        new_grids: Vec<Entity>,
    },
    RoundRestartCleanup,
    StationInitialized {
        station: Entity,
    },
    GridFillChanged {
        enabled: bool,
    },
}

impl CargoMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            CargoMessage::PalletUiOpened { .. } => MessageKind::PalletUiOpened,
            CargoMessage::PalletAppraise { .. } => MessageKind::PalletAppraise,
            CargoMessage::PalletSell { .. } => MessageKind::PalletSell,
            CargoMessage::ShuttleConsoleStartup { .. } => MessageKind::ShuttleConsoleStartup,
            CargoMessage::CargoShuttleChanged { .. } => MessageKind::CargoShuttleChanged,
            CargoMessage::GridSplit { .. } => MessageKind::GridSplit,
            CargoMessage::RoundRestartCleanup => MessageKind::RoundRestartCleanup,
            CargoMessage::StationInitialized { .. } => MessageKind::StationInitialized,
            CargoMessage::GridFillChanged { .. } => MessageKind::GridFillChanged,
        }
    }
}
