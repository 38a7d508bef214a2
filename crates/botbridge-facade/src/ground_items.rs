//! Items lying on the ground

use crate::entities::EntityApi;
use botbridge_core::{Entity, EntityKind, Result};
use botbridge_runtime::{ClientContext, WorldModel};
use std::ops::Deref;

const TAKE: &str = "Take";

/// Ground item lookups plus picking items up.
///
/// Derefs to [`EntityApi`] for the shared lookups.
pub struct GroundItems<W> {
    api: EntityApi<W>,
}

impl<W> Clone for GroundItems<W> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
        }
    }
}

impl<W> Deref for GroundItems<W> {
    type Target = EntityApi<W>;

    fn deref(&self) -> &Self::Target {
        &self.api
    }
}

impl<W: WorldModel> GroundItems<W> {
    pub fn new(ctx: ClientContext<W>) -> Self {
        Self {
            api: EntityApi::new(ctx, EntityKind::GroundItem),
        }
    }

    /// Pick up `item`. `Ok(false)` when there is no item.
    pub fn take(&self, item: Option<&Entity>) -> Result<bool> {
        self.api.interact(item, TAKE)
    }

    /// Pick up the closest item called `name`
    pub fn take_named(&self, name: &str) -> Result<bool> {
        self.api.interact_named(name, TAKE)
    }

    pub fn take_id(&self, id: u32) -> Result<bool> {
        self.api.interact_id(id, TAKE)
    }
}
