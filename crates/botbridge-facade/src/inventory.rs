//! Local actor's inventory

use botbridge_core::{
    ActionSelector, BridgeError, Entity, EntityDetails, EntityKind, INVENTORY_SLOTS, Result,
};
use botbridge_runtime::{ClientContext, Search, WorldModel};
use std::collections::HashSet;
use tracing::debug;

pub struct Inventory<W> {
    ctx: ClientContext<W>,
}

impl<W> Clone for Inventory<W> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

fn slot_of(item: &Entity) -> u8 {
    match item.details {
        EntityDetails::InventoryItem { slot, .. } => slot,
        _ => u8::MAX,
    }
}

impl<W: WorldModel> Inventory<W> {
    pub fn new(ctx: ClientContext<W>) -> Self {
        Self { ctx }
    }

    pub fn query(&self) -> Search<W> {
        self.ctx.query(EntityKind::InventoryItem)
    }

    /// Carried items in slot order
    pub fn items(&self) -> Result<Vec<Entity>> {
        let mut items = self.query().collect()?;
        items.sort_by_key(slot_of);
        Ok(items)
    }

    /// Stacks matching `search`, in slot order
    fn stacks(&self, search: Search<W>) -> Result<Vec<Entity>> {
        let mut items = search.collect()?;
        items.sort_by_key(slot_of);
        Ok(items)
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        self.query().with_name(name).exists()
    }

    pub fn contains_id(&self, id: u32) -> Result<bool> {
        self.query().with_id(id).exists()
    }

    /// True when every one of `names` is carried
    pub fn contains_all<I, S>(&self, names: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let carried: HashSet<String> = self.items()?.into_iter().map(|i| i.name).collect();
        Ok(names.into_iter().all(|n| carried.contains(n.as_ref())))
    }

    pub fn contains_any<I, S>(&self, names: I) -> Result<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query().with_names(names).exists()
    }

    /// Total quantity of `name` across all stacks
    pub fn count(&self, name: &str) -> Result<u32> {
        let items = self.query().with_name(name).collect()?;
        Ok(items.iter().map(Entity::quantity).sum())
    }

    pub fn count_id(&self, id: u32) -> Result<u32> {
        let items = self.query().with_id(id).collect()?;
        Ok(items.iter().map(Entity::quantity).sum())
    }

    pub fn empty_slots(&self) -> Result<usize> {
        let used: HashSet<u8> = self.items()?.iter().map(slot_of).collect();
        Ok((INVENTORY_SLOTS as usize).saturating_sub(used.len()))
    }

    pub fn is_full(&self) -> Result<bool> {
        Ok(self.empty_slots()? == 0)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(!self.query().exists()?)
    }

    /// Use `selector` on the first stack of `name`. `Ok(false)` if not carried.
    pub fn interact(&self, name: &str, selector: impl Into<ActionSelector>) -> Result<bool> {
        let stacks = self.stacks(self.query().with_name(name))?;
        self.interact_first(stacks, selector)
    }

    pub fn interact_id(&self, id: u32, selector: impl Into<ActionSelector>) -> Result<bool> {
        let stacks = self.stacks(self.query().with_id(id))?;
        self.interact_first(stacks, selector)
    }

    fn interact_first(
        &self,
        stacks: Vec<Entity>,
        selector: impl Into<ActionSelector>,
    ) -> Result<bool> {
        let Some(item) = stacks.into_iter().next() else {
            debug!("Not in inventory");
            return Ok(false);
        };
        self.ctx.dispatch(&item, selector)?;
        Ok(true)
    }

    pub fn drop(&self, name: &str) -> Result<bool> {
        self.interact(name, "Drop")
    }

    pub fn drop_id(&self, id: u32) -> Result<bool> {
        self.interact_id(id, "Drop")
    }

    /// Drop every stack of `name`. Returns how many drops were dispatched.
    pub fn drop_all(&self, name: &str) -> Result<usize> {
        self.drop_stacks(self.stacks(self.query().with_name(name))?)
    }

    /// Drop every stack whose id is in `ids`
    pub fn drop_all_ids(&self, ids: impl IntoIterator<Item = u32>) -> Result<usize> {
        self.drop_stacks(self.stacks(self.query().with_ids(ids))?)
    }

    fn drop_stacks(&self, items: Vec<Entity>) -> Result<usize> {
        for item in &items {
            self.ctx.dispatch(item, "Drop")?;
        }
        debug!(dropped = items.len(), "Dropped all");
        Ok(items.len())
    }

    /// Use a carried item on another entity of any kind, including another
    /// carried item. `Ok(false)` when either side is missing.
    pub fn use_item_on(&self, item: Option<&Entity>, target: Option<&Entity>) -> Result<bool> {
        let (Some(item), Some(target)) = (item, target) else {
            return Ok(false);
        };
        if item.kind() != EntityKind::InventoryItem {
            return Err(BridgeError::InvalidArgument(format!(
                "{} is not a carried item",
                item
            )));
        }
        self.ctx.dispatch_on(item, "Use", target)?;
        Ok(true)
    }
}
