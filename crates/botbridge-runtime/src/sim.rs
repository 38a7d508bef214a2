//! In-memory world for demos and tests
//!
//! `SimWorld` is a small tile world loaded from a JSON scenario. It is not
//! `Send`: build it on the owner thread (see [`crate::spawn_owner_thread`]).
//! Actions it understands:
//! - `Drop` on an inventory item moves it to the ground under the local actor
//! - `Take` on a ground item moves it into the first free inventory slot
//!
//! Every other action, including any action with a target, is accepted and
//! only recorded in the action log. Failed actions leave the world and the
//! log untouched.

use crate::world::WorldModel;
use botbridge_core::{
    ActionRequest, BridgeError, Entity, EntityDetails, EntityHandle, EntityKind, INVENTORY_SLOTS,
    Result, WorldPoint,
};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::path::Path;
use tracing::debug;

const GROUND_ITEM_ACTIONS: [&str; 2] = ["Take", "Examine"];
const INVENTORY_ITEM_ACTIONS: [&str; 3] = ["Use", "Drop", "Examine"];

/// Initial world state, as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Scenario {
    pub local_player: Option<WorldPoint>,
    /// Handle of the player entity that is the local actor
    pub local_handle: Option<u64>,
    pub tick: u64,
    /// Entities further than this from the local actor are not loaded
    pub loaded_radius: Option<u32>,
    pub entities: Vec<Entity>,
}

impl Scenario {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }
}

pub struct SimWorld {
    tick: Cell<u64>,
    local: Cell<Option<WorldPoint>>,
    local_handle: Option<EntityHandle>,
    loaded_radius: Option<u32>,
    entities: RefCell<Vec<Entity>>,
    next_handle: Cell<u64>,
    log: RefCell<Vec<ActionRequest>>,
}

impl SimWorld {
    pub fn new(local: WorldPoint) -> Self {
        Self::from_scenario(Scenario {
            local_player: Some(local),
            ..Scenario::default()
        })
    }

    pub fn from_scenario(scenario: Scenario) -> Self {
        let world = Self {
            tick: Cell::new(scenario.tick),
            local: Cell::new(scenario.local_player),
            local_handle: scenario.local_handle.map(EntityHandle),
            loaded_radius: scenario.loaded_radius,
            entities: RefCell::new(Vec::with_capacity(scenario.entities.len())),
            next_handle: Cell::new(1),
            log: RefCell::new(Vec::new()),
        };
        for entity in scenario.entities {
            world.insert(entity);
        }
        world
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::from_scenario(Scenario::from_json_str(text)?))
    }

    /// Add an entity, keeping its handle. Returns the handle.
    pub fn insert(&self, entity: Entity) -> EntityHandle {
        let handle = entity.handle;
        if handle.0 >= self.next_handle.get() {
            self.next_handle.set(handle.0 + 1);
        }
        self.entities.borrow_mut().push(entity);
        handle
    }

    pub fn remove(&self, handle: EntityHandle) -> Option<Entity> {
        let mut entities = self.entities.borrow_mut();
        let index = entities.iter().position(|e| e.handle == handle)?;
        Some(entities.remove(index))
    }

    pub fn set_local_position(&self, point: Option<WorldPoint>) {
        self.local.set(point);
    }

    /// Every request the world has executed, oldest first
    pub fn action_log(&self) -> Vec<ActionRequest> {
        self.log.borrow().clone()
    }

    fn allocate_handle(&self) -> EntityHandle {
        let handle = self.next_handle.get();
        self.next_handle.set(handle + 1);
        EntityHandle(handle)
    }

    fn free_slot(&self) -> Option<u8> {
        let entities = self.entities.borrow();
        (0..INVENTORY_SLOTS).find(|slot| {
            !entities.iter().any(|e| {
                matches!(e.details, EntityDetails::InventoryItem { slot: taken, .. } if taken == *slot)
            })
        })
    }

    fn drop_item(&self, handle: EntityHandle) -> Result<()> {
        let location = self.local.get().ok_or_else(|| {
            BridgeError::World("cannot drop items while logged out".into())
        })?;
        let Some(item) = self.remove(handle) else {
            return Ok(());
        };
        let quantity = item.quantity();
        let dropped = Entity::ground_item(
            self.allocate_handle().0,
            item.id,
            item.name,
            location,
            quantity,
        )
        .with_actions(GROUND_ITEM_ACTIONS);
        debug!(item = %dropped, "Item dropped");
        self.insert(dropped);
        Ok(())
    }

    fn take_item(&self, handle: EntityHandle) -> Result<()> {
        let Some(slot) = self.free_slot() else {
            return Err(BridgeError::World("no free inventory slot".into()));
        };
        let Some(item) = self.remove(handle) else {
            return Ok(());
        };
        let location = self.local.get().unwrap_or(item.location);
        let quantity = item.quantity();
        let taken = Entity::inventory_item(
            self.allocate_handle().0,
            item.id,
            item.name,
            slot,
            quantity,
            location,
        )
        .with_actions(INVENTORY_ITEM_ACTIONS);
        debug!(item = %taken, slot, "Item taken");
        self.insert(taken);
        Ok(())
    }

    fn contains(&self, kind: EntityKind, handle: EntityHandle) -> bool {
        self.entities
            .borrow()
            .iter()
            .any(|e| e.handle == handle && e.kind() == kind)
    }
}

impl WorldModel for SimWorld {
    fn tick(&self) -> u64 {
        self.tick.get()
    }

    fn local_position(&self) -> Option<WorldPoint> {
        self.local.get()
    }

    fn local_player(&self) -> Option<Entity> {
        let handle = self.local_handle?;
        self.local.get()?;
        self.capture(EntityKind::Player)
            .into_iter()
            .find(|e| e.handle == handle)
    }

    fn capture(&self, kind: EntityKind) -> Vec<Entity> {
        let local = self.local.get();
        self.entities
            .borrow()
            .iter()
            .filter(|e| e.kind() == kind)
            .map(|e| {
                let mut entity = e.clone();
                // Carried items and the local actor's own entity follow the
                // local position
                let follows_local = kind == EntityKind::InventoryItem
                    || (kind == EntityKind::Player && Some(e.handle) == self.local_handle);
                if let (true, Some(local)) = (follows_local, local) {
                    entity.location = local;
                }
                entity
            })
            .collect()
    }

    fn is_loaded(&self, point: &WorldPoint) -> bool {
        match (self.loaded_radius, self.local.get()) {
            (None, _) => true,
            // Every plane of a region is loaded together
            (Some(radius), Some(local)) => {
                let level = WorldPoint::new(point.x, point.y, local.plane);
                local.is_within_distance(&level, radius)
            }
            (Some(_), None) => false,
        }
    }

    fn send_action(&self, request: &ActionRequest) -> Result<()> {
        if !self.contains(request.kind, request.handle) {
            return Err(BridgeError::World(format!(
                "{} {} is gone",
                request.kind, request.handle
            )));
        }
        if let Some(target) = &request.target {
            if !self.contains(target.kind, target.handle) {
                return Err(BridgeError::World(format!(
                    "target {} {} is gone",
                    target.kind, target.handle
                )));
            }
        }

        let action = request.action.to_lowercase();
        match (request.kind, action.as_str(), &request.target) {
            (EntityKind::InventoryItem, "drop", None) => self.drop_item(request.handle)?,
            (EntityKind::GroundItem, "take", None) => self.take_item(request.handle)?,
            _ => {}
        }
        self.log.borrow_mut().push(request.clone());
        Ok(())
    }

    fn advance(&self) {
        self.tick.set(self.tick.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> WorldPoint {
        WorldPoint::new(3200, 3200, 0)
    }

    fn request(world: &SimWorld, kind: EntityKind, name: &str, action: &str) -> ActionRequest {
        let entity = world
            .capture(kind)
            .into_iter()
            .find(|e| e.name == name)
            .unwrap();
        let index = entity.actions.iter().position(|a| a == action).unwrap();
        ActionRequest::for_entity(&entity, index).unwrap()
    }

    #[test]
    fn test_scenario_from_json() {
        let json = r#"{
            "LocalPlayer": { "X": 3200, "Y": 3200 },
            "Tick": 12,
            "Entities": [
                {
                    "Handle": 7,
                    "Id": 394,
                    "Name": "Banker",
                    "Location": { "X": 3201, "Y": 3201 },
                    "Actions": ["Talk-to", "Bank"],
                    "Details": { "Type": "Npc", "CombatLevel": 0 }
                }
            ]
        }"#;
        let world = SimWorld::from_json(json).unwrap();
        assert_eq!(world.tick(), 12);
        assert_eq!(world.local_position(), Some(origin()));

        let npcs = world.capture(EntityKind::Npc);
        assert_eq!(npcs.len(), 1);
        assert_eq!(npcs[0].handle, EntityHandle(7));
        assert!(world.capture(EntityKind::Player).is_empty());

        // Fresh handles never collide with loaded ones
        assert_eq!(world.allocate_handle(), EntityHandle(8));
    }

    #[test]
    fn test_drop_then_take() {
        let world = SimWorld::new(origin());
        world.insert(
            Entity::inventory_item(1, 1511, "Logs", 0, 1, origin()).with_actions(INVENTORY_ITEM_ACTIONS),
        );

        let drop = request(&world, EntityKind::InventoryItem, "Logs", "Drop");
        world.send_action(&drop).unwrap();
        assert!(world.capture(EntityKind::InventoryItem).is_empty());
        let ground = world.capture(EntityKind::GroundItem);
        assert_eq!(ground.len(), 1);
        assert_eq!(ground[0].location, origin());

        let take = request(&world, EntityKind::GroundItem, "Logs", "Take");
        world.send_action(&take).unwrap();
        assert!(world.capture(EntityKind::GroundItem).is_empty());
        let inventory = world.capture(EntityKind::InventoryItem);
        assert_eq!(
            inventory[0].details,
            EntityDetails::InventoryItem { slot: 0, quantity: 1 }
        );
        assert_eq!(world.action_log().len(), 2);
    }

    #[test]
    fn test_take_with_full_inventory_fails() {
        let world = SimWorld::new(origin());
        for slot in 0..INVENTORY_SLOTS {
            world.insert(Entity::inventory_item(100 + slot as u64, 1511, "Logs", slot, 1, origin()));
        }
        world.insert(Entity::ground_item(1, 995, "Coins", origin(), 25).with_actions(GROUND_ITEM_ACTIONS));

        let take = request(&world, EntityKind::GroundItem, "Coins", "Take");
        let err = world.send_action(&take).unwrap_err();
        assert!(matches!(err, BridgeError::World(_)));
        assert_eq!(world.capture(EntityKind::GroundItem).len(), 1);
        assert!(world.action_log().is_empty());
    }

    #[test]
    fn test_drop_while_logged_out_keeps_item() {
        let world = SimWorld::new(origin());
        world.insert(
            Entity::inventory_item(1, 1511, "Logs", 0, 1, origin()).with_actions(INVENTORY_ITEM_ACTIONS),
        );
        let drop = request(&world, EntityKind::InventoryItem, "Logs", "Drop");
        world.set_local_position(None);

        let err = world.send_action(&drop).unwrap_err();
        assert!(matches!(err, BridgeError::World(_)));
        assert_eq!(world.capture(EntityKind::InventoryItem).len(), 1);
        assert!(world.capture(EntityKind::GroundItem).is_empty());
        assert!(world.action_log().is_empty());
    }

    #[test]
    fn test_use_on_target() {
        let world = SimWorld::new(origin());
        world.insert(
            Entity::inventory_item(1, 1511, "Logs", 0, 1, origin()).with_actions(INVENTORY_ITEM_ACTIONS),
        );
        let fire = Entity::tile_object(2, 26185, "Fire", origin());
        world.insert(fire.clone());

        let use_logs = request(&world, EntityKind::InventoryItem, "Logs", "Use").with_target(&fire);
        world.send_action(&use_logs).unwrap();
        assert_eq!(world.action_log(), [use_logs.clone()]);
        // Using an item leaves it in the inventory
        assert_eq!(world.capture(EntityKind::InventoryItem).len(), 1);

        world.remove(EntityHandle(2));
        assert!(matches!(world.send_action(&use_logs), Err(BridgeError::World(_))));
        assert_eq!(world.action_log().len(), 1);
    }

    #[test]
    fn test_local_player_follows_position() {
        let world = SimWorld::from_scenario(Scenario {
            local_player: Some(origin()),
            local_handle: Some(3),
            entities: vec![
                Entity::player(3, "Lumbot", WorldPoint::new(0, 0, 0)),
                Entity::player(4, "Zezima", WorldPoint::new(3201, 3201, 0)),
            ],
            ..Scenario::default()
        });
        assert_eq!(world.local_player().map(|p| p.location), Some(origin()));

        let moved = WorldPoint::new(3210, 3205, 1);
        world.set_local_position(Some(moved));
        let me = world.local_player().unwrap();
        assert_eq!((me.name.as_str(), me.location), ("Lumbot", moved));

        world.set_local_position(None);
        assert_eq!(world.local_player(), None);
        assert_eq!(SimWorld::new(origin()).local_player(), None);
    }

    #[test]
    fn test_loaded_radius() {
        let world = SimWorld::from_scenario(Scenario {
            local_player: Some(origin()),
            loaded_radius: Some(15),
            ..Scenario::default()
        });
        assert!(world.is_loaded(&WorldPoint::new(3215, 3185, 0)));
        assert!(!world.is_loaded(&WorldPoint::new(3216, 3200, 0)));
        assert!(world.is_loaded(&WorldPoint::new(3200, 3200, 2)));

        world.set_local_position(None);
        assert!(!world.is_loaded(&origin()));
    }

    #[test]
    fn test_action_on_missing_entity_fails() {
        let world = SimWorld::new(origin());
        let ghost = Entity::npc(42, 1, "Ghost", origin()).with_actions(["Talk-to"]);
        let request = ActionRequest::for_entity(&ghost, 0).unwrap();
        assert!(matches!(world.send_action(&request), Err(BridgeError::World(_))));
        assert!(world.action_log().is_empty());
    }
}
