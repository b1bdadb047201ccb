//! Errors surfaced by the cargo engine.
//!
//! Most missing-data conditions (no grid, no order database, no shuttle) are
//! soft failures and never reach this type; they log and return an empty
//! result instead.

use hecs::Entity;

use crate::components::MapId;

/// Errors that can occur while touching the world or loading data
#[derive(Debug)]
pub enum CargoError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NoSuchEntity(Entity),
    NoSuchMap(MapId),
}

impl From<std::io::Error> for CargoError {
    fn from(e: std::io::Error) -> Self {
        CargoError::Io(e)
    }
}

impl From<serde_json::Error> for CargoError {
    fn from(e: serde_json::Error) -> Self {
        CargoError::Json(e)
    }
}

impl std::fmt::Display for CargoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CargoError::Io(e) => write!(f, "IO error: {}", e),
            CargoError::Json(e) => write!(f, "JSON error: {}", e),
            CargoError::NoSuchEntity(e) => write!(f, "No such entity: {:?}", e),
            CargoError::NoSuchMap(id) => write!(f, "No such map: {}", id),
        }
    }
}

impl std::error::Error for CargoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CargoError::Io(e) => Some(e),
            CargoError::Json(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CargoError>;
