//! Entity model shared by snapshots, queries and dispatch

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::location::WorldPoint;

/// Kinds of entity a snapshot can be captured for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EntityKind {
    Npc,
    Player,
    TileObject,
    GroundItem,
    InventoryItem,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Npc => "npc",
            EntityKind::Player => "player",
            EntityKind::TileObject => "tile object",
            EntityKind::GroundItem => "ground item",
            EntityKind::InventoryItem => "inventory item",
        };
        f.write_str(name)
    }
}

/// Slots in the local actor's inventory
pub const INVENTORY_SLOTS: u8 = 28;

/// Snapshot-local handle for an entity.
///
/// Only meaningful within the snapshot that produced it; the same real
/// entity may get a different handle on the next capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityHandle(pub u64);

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind-specific fields. The variant decides the entity's kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum EntityDetails {
    Npc {
        #[serde(rename = "CombatLevel", default)]
        combat_level: u32,
    },
    Player {
        #[serde(rename = "CombatLevel", default)]
        combat_level: u32,
    },
    TileObject,
    GroundItem {
        #[serde(rename = "Quantity", default = "default_quantity")]
        quantity: u32,
    },
    InventoryItem {
        #[serde(rename = "Slot")]
        slot: u8,
        #[serde(rename = "Quantity", default = "default_quantity")]
        quantity: u32,
    },
}

fn default_quantity() -> u32 {
    1
}

impl EntityDetails {
    pub fn kind(&self) -> EntityKind {
        match self {
            EntityDetails::Npc { .. } => EntityKind::Npc,
            EntityDetails::Player { .. } => EntityKind::Player,
            EntityDetails::TileObject => EntityKind::TileObject,
            EntityDetails::GroundItem { .. } => EntityKind::GroundItem,
            EntityDetails::InventoryItem { .. } => EntityKind::InventoryItem,
        }
    }
}

/// An NPC, player, object or item as seen at one tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Entity {
    pub handle: EntityHandle,
    /// Definition id (shared by every entity of the same type)
    pub id: u32,
    pub name: String,
    pub location: WorldPoint,
    /// Interaction menu, in menu order
    #[serde(default)]
    pub actions: Vec<String>,
    pub details: EntityDetails,
}

impl Entity {
    pub fn new(
        handle: EntityHandle,
        id: u32,
        name: impl Into<String>,
        location: WorldPoint,
        details: EntityDetails,
    ) -> Self {
        Self {
            handle,
            id,
            name: name.into(),
            location,
            actions: Vec::new(),
            details,
        }
    }

    pub fn npc(handle: u64, id: u32, name: impl Into<String>, location: WorldPoint) -> Self {
        Self::new(
            EntityHandle(handle),
            id,
            name,
            location,
            EntityDetails::Npc { combat_level: 0 },
        )
    }

    pub fn player(handle: u64, name: impl Into<String>, location: WorldPoint) -> Self {
        Self::new(
            EntityHandle(handle),
            0,
            name,
            location,
            EntityDetails::Player { combat_level: 3 },
        )
    }

    pub fn tile_object(handle: u64, id: u32, name: impl Into<String>, location: WorldPoint) -> Self {
        Self::new(EntityHandle(handle), id, name, location, EntityDetails::TileObject)
    }

    pub fn ground_item(
        handle: u64,
        id: u32,
        name: impl Into<String>,
        location: WorldPoint,
        quantity: u32,
    ) -> Self {
        Self::new(
            EntityHandle(handle),
            id,
            name,
            location,
            EntityDetails::GroundItem { quantity },
        )
    }

    pub fn inventory_item(
        handle: u64,
        id: u32,
        name: impl Into<String>,
        slot: u8,
        quantity: u32,
        location: WorldPoint,
    ) -> Self {
        Self::new(
            EntityHandle(handle),
            id,
            name,
            location,
            EntityDetails::InventoryItem { slot, quantity },
        )
    }

    /// Builder-style helper for setting the action menu
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.details.kind()
    }

    /// Stack size for items, 1 for everything else
    pub fn quantity(&self) -> u32 {
        match self.details {
            EntityDetails::GroundItem { quantity } => quantity,
            EntityDetails::InventoryItem { quantity, .. } => quantity,
            _ => 1,
        }
    }

    pub fn has_action(&self, label: &str) -> bool {
        self.actions.iter().any(|a| a.eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' {} (id {}) at {}",
            self.kind(),
            self.name,
            self.handle,
            self.id,
            self.location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_decide_kind() {
        let banker = Entity::npc(1, 394, "Banker", WorldPoint::new(0, 0, 0));
        assert_eq!(banker.kind(), EntityKind::Npc);

        let logs = Entity::inventory_item(2, 1511, "Logs", 4, 1, WorldPoint::new(0, 0, 0));
        assert_eq!(logs.kind(), EntityKind::InventoryItem);
        assert_eq!(logs.quantity(), 1);
    }

    #[test]
    fn test_entity_from_json() {
        let json = r#"{
            "Handle": 7,
            "Id": 995,
            "Name": "Coins",
            "Location": {"X": 3222, "Y": 3218},
            "Actions": ["Take", "Examine"],
            "Details": {"Type": "GroundItem", "Quantity": 25}
        }"#;
        let entity: Entity = serde_json::from_str(json).unwrap();

        assert_eq!(entity.handle, EntityHandle(7));
        assert_eq!(entity.kind(), EntityKind::GroundItem);
        assert_eq!(entity.quantity(), 25);
        assert!(entity.has_action("take"));
        assert!(!entity.has_action("Drop"));
    }
}
