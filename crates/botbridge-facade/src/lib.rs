//! # botbridge-facade
//!
//! Script-facing lookup sugar over the bot bridge runtime.
//!
//! Every facade is a thin layer over `ClientContext::query` and
//! `ClientContext::dispatch`; none of them touch the world directly:
//! - `EntityApi` for NPCs, players and game objects
//! - `GroundItems` adds picking up to the ground item lookups
//! - `Inventory` for the local actor's carried items
//! - `Calculations` for tile distances and planes
//!
//! Bring [`ScriptApi`] into scope to reach them from a context:
//!
//! ```ignore
//! let banker = ctx.npcs().closest_named(["Banker"])?;
//! ctx.npcs().interact(banker.as_ref(), "Bank")?;
//! ```

pub mod calculations;
pub mod entities;
pub mod ground_items;
pub mod inventory;

pub use calculations::Calculations;
pub use entities::EntityApi;
pub use ground_items::GroundItems;
pub use inventory::Inventory;

use botbridge_core::EntityKind;
use botbridge_runtime::{ClientContext, WorldModel};

/// Facade accessors for a [`ClientContext`]
pub trait ScriptApi<W: WorldModel> {
    fn npcs(&self) -> EntityApi<W>;
    fn players(&self) -> EntityApi<W>;
    fn game_objects(&self) -> EntityApi<W>;
    fn ground_items(&self) -> GroundItems<W>;
    fn inventory(&self) -> Inventory<W>;
    fn calculations(&self) -> Calculations<W>;
}

impl<W: WorldModel> ScriptApi<W> for ClientContext<W> {
    fn npcs(&self) -> EntityApi<W> {
        EntityApi::new(self.clone(), EntityKind::Npc)
    }

    fn players(&self) -> EntityApi<W> {
        EntityApi::new(self.clone(), EntityKind::Player)
    }

    fn game_objects(&self) -> EntityApi<W> {
        EntityApi::new(self.clone(), EntityKind::TileObject)
    }

    fn ground_items(&self) -> GroundItems<W> {
        GroundItems::new(self.clone())
    }

    fn inventory(&self) -> Inventory<W> {
        Inventory::new(self.clone())
    }

    fn calculations(&self) -> Calculations<W> {
        Calculations::new(self.clone())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use botbridge_core::{Entity, WorldPoint};
    use botbridge_runtime::{
        BridgeConfig, ClientContext, OwnerThread, Scenario, SimWorld, spawn_owner_thread,
    };
    use std::time::Duration;

    pub const HOME: WorldPoint = WorldPoint::new(3208, 3220, 2);

    /// Lumbridge castle, top floor
    pub fn castle() -> Scenario {
        Scenario {
            local_player: Some(HOME),
            local_handle: Some(9),
            tick: 100,
            loaded_radius: Some(32),
            entities: vec![
                Entity::npc(1, 394, "Banker", WorldPoint::new(3208, 3222, 2))
                    .with_actions(["Talk-to", "Bank", "Collect"]),
                Entity::npc(2, 395, "Banker", WorldPoint::new(3210, 3222, 2))
                    .with_actions(["Talk-to", "Bank", "Collect"]),
                Entity::npc(3, 3106, "Guard", WorldPoint::new(3205, 3215, 2))
                    .with_actions(["Talk-to", "Attack"]),
                Entity::npc(4, 0, "Cook", WorldPoint::new(3209, 3214, 0))
                    .with_actions(["Talk-to"]),
                Entity::player(5, "Zezima", WorldPoint::new(3207, 3219, 2))
                    .with_actions(["Follow", "Trade with", "Report"]),
                Entity::player(9, "Lumbot", HOME),
                Entity::tile_object(6, 18491, "Bank booth", WorldPoint::new(3208, 3221, 2))
                    .with_actions(["Bank", "Collect"]),
                Entity::tile_object(7, 16672, "Staircase", WorldPoint::new(3205, 3209, 2))
                    .with_actions(["Climb-down"]),
                Entity::ground_item(8, 995, "Coins", WorldPoint::new(3209, 3219, 2), 25)
                    .with_actions(["Take", "Examine"]),
                Entity::inventory_item(20, 1511, "Logs", 0, 1, HOME)
                    .with_actions(["Use", "Drop", "Examine"]),
                Entity::inventory_item(21, 1511, "Logs", 1, 1, HOME)
                    .with_actions(["Use", "Drop", "Examine"]),
                Entity::inventory_item(22, 590, "Tinderbox", 2, 1, HOME)
                    .with_actions(["Use", "Drop", "Examine"]),
                Entity::inventory_item(23, 995, "Coins", 5, 120, HOME)
                    .with_actions(["Use", "Drop", "Examine"]),
            ],
        }
    }

    pub fn start(scenario: Scenario) -> (ClientContext<SimWorld>, OwnerThread) {
        let config = BridgeConfig::default().with_tick_interval(Duration::from_millis(5));
        spawn_owner_thread(config, move || SimWorld::from_scenario(scenario)).unwrap()
    }
}
