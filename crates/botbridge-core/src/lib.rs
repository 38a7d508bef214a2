//! # botbridge-core
//!
//! Core types shared by every layer of the bot bridge:
//! - Entity model (NPCs, players, tile objects, ground and inventory items)
//! - World points and the tile distance metric
//! - Immutable snapshots
//! - Action selectors, requests and receipts
//! - Error taxonomy

pub mod action;
pub mod entity;
pub mod error;
pub mod location;
pub mod snapshot;

pub use action::{ActionRequest, ActionSelector, ActionTarget, DispatchReceipt};
pub use entity::{Entity, EntityDetails, EntityHandle, EntityKind, INVENTORY_SLOTS};
pub use error::{BridgeError, Result, error_codes};
pub use location::WorldPoint;
pub use snapshot::{CaptureStats, Snapshot};
