//! Action dispatch

use crate::invoker::{InvocationHandle, Invoker};
use crate::world::WorldModel;
use botbridge_core::{ActionRequest, ActionSelector, BridgeError, DispatchReceipt, Entity, Result};
use tracing::{debug, info};

/// Resolve `selector` against `entity`'s action menu.
///
/// Names match exactly first, then case-insensitively. Indices are
/// bounds-checked.
pub fn resolve_action(entity: &Entity, selector: &ActionSelector) -> Result<usize> {
    match selector {
        ActionSelector::Name(label) => resolve_name(entity, label),
        ActionSelector::Index(index) => {
            if *index < entity.actions.len() {
                Ok(*index)
            } else {
                Err(BridgeError::InvalidArgument(format!(
                    "action index {} out of range for {} ({} actions)",
                    index,
                    entity.name,
                    entity.actions.len()
                )))
            }
        }
        ActionSelector::FirstOf(labels) => {
            if labels.is_empty() {
                return Err(BridgeError::InvalidArgument(
                    "no action labels given".into(),
                ));
            }
            for label in labels {
                match resolve_name(entity, label) {
                    Err(BridgeError::ActionNotAvailable { .. }) => continue,
                    other => return other,
                }
            }
            Err(BridgeError::ActionNotAvailable {
                entity: entity.name.clone(),
                action: labels.join(" / "),
            })
        }
    }
}

fn resolve_name(entity: &Entity, label: &str) -> Result<usize> {
    if label.is_empty() {
        return Err(BridgeError::InvalidArgument("empty action label".into()));
    }
    entity
        .actions
        .iter()
        .position(|a| a == label)
        .or_else(|| {
            entity
                .actions
                .iter()
                .position(|a| a.to_lowercase() == label.to_lowercase())
        })
        .ok_or_else(|| BridgeError::ActionNotAvailable {
            entity: entity.name.clone(),
            action: label.to_string(),
        })
}

/// Resolves actions on the caller's thread and executes them on the owner
/// thread.
///
/// Success means the owner thread handed the request to the world; it does
/// not wait for any visible effect.
pub struct ActionDispatcher<W> {
    invoker: Invoker<W>,
}

impl<W> Clone for ActionDispatcher<W> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
        }
    }
}

impl<W: WorldModel> ActionDispatcher<W> {
    pub fn new(invoker: Invoker<W>) -> Self {
        Self { invoker }
    }

    /// Resolve and execute, blocking until the owner thread has run it
    pub fn dispatch(
        &self,
        entity: &Entity,
        selector: impl Into<ActionSelector>,
    ) -> Result<DispatchReceipt> {
        let request = prepare(entity, &selector.into())?;
        let receipt = self.invoker.submit(move |world: &W| execute(world, request))?;
        info!(
            tick = receipt.tick,
            action = %receipt.action,
            entity = %entity,
            "Dispatched action"
        );
        Ok(receipt)
    }

    /// Dispatch a two-entity action: `selector` on `entity`, landing on
    /// `target`
    pub fn dispatch_on(
        &self,
        entity: &Entity,
        selector: impl Into<ActionSelector>,
        target: &Entity,
    ) -> Result<DispatchReceipt> {
        if entity.kind() == target.kind() && entity.handle == target.handle {
            return Err(BridgeError::InvalidArgument(format!(
                "cannot use {} on itself",
                entity
            )));
        }
        let request = prepare(entity, &selector.into())?.with_target(target);
        let receipt = self.invoker.submit(move |world: &W| execute(world, request))?;
        info!(
            tick = receipt.tick,
            action = %receipt.action,
            entity = %entity,
            on = %target,
            "Dispatched action"
        );
        Ok(receipt)
    }

    /// Resolve now, execute later. Resolution errors are returned right away.
    pub fn dispatch_async(
        &self,
        entity: &Entity,
        selector: impl Into<ActionSelector>,
    ) -> Result<InvocationHandle<DispatchReceipt>> {
        let request = prepare(entity, &selector.into())?;
        self.invoker.submit_async(move |world: &W| execute(world, request))
    }
}

fn prepare(entity: &Entity, selector: &ActionSelector) -> Result<ActionRequest> {
    let index = resolve_action(entity, selector)?;
    let request = ActionRequest::for_entity(entity, index).ok_or_else(|| {
        BridgeError::InvalidArgument(format!("action index {} out of range", index))
    })?;
    debug!(%selector, index, entity = %entity, "Resolved action");
    Ok(request)
}

fn execute<W: WorldModel>(world: &W, request: ActionRequest) -> Result<DispatchReceipt> {
    world.send_action(&request)?;
    Ok(DispatchReceipt {
        tick: world.tick(),
        action: request.action,
        action_index: request.action_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::sim::SimWorld;
    use botbridge_core::{EntityKind, WorldPoint};

    fn banker() -> Entity {
        Entity::npc(1, 394, "Banker", WorldPoint::new(0, 0, 0)).with_actions(["Talk-to", "Bank"])
    }

    #[test]
    fn test_resolve_by_name() {
        let banker = banker();
        assert_eq!(resolve_action(&banker, &"Bank".into()), Ok(1));
        assert_eq!(resolve_action(&banker, &"talk-to".into()), Ok(0));
        assert_eq!(
            resolve_action(&banker, &"Attack".into()),
            Err(BridgeError::ActionNotAvailable {
                entity: "Banker".into(),
                action: "Attack".into()
            })
        );
        assert!(matches!(
            resolve_action(&banker, &"".into()),
            Err(BridgeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_exact_match_wins_over_case_insensitive() {
        let chest = Entity::tile_object(9, 100, "Chest", WorldPoint::new(0, 0, 0))
            .with_actions(["OPEN", "Open"]);
        assert_eq!(resolve_action(&chest, &"Open".into()), Ok(1));
        assert_eq!(resolve_action(&chest, &"open".into()), Ok(0));
    }

    #[test]
    fn test_resolve_by_index() {
        let banker = banker();
        assert_eq!(resolve_action(&banker, &ActionSelector::Index(1)), Ok(1));
        assert!(matches!(
            resolve_action(&banker, &ActionSelector::Index(5)),
            Err(BridgeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_resolve_first_of() {
        let banker = banker();
        let labels: &[&str] = &["Attack", "bank", "Talk-to"];
        assert_eq!(resolve_action(&banker, &labels.into()), Ok(1));

        let none: &[&str] = &["Attack", "Pickpocket"];
        assert!(matches!(
            resolve_action(&banker, &none.into()),
            Err(BridgeError::ActionNotAvailable { .. })
        ));
        assert!(matches!(
            resolve_action(&banker, &ActionSelector::FirstOf(Vec::new())),
            Err(BridgeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_dispatch_runs_on_owner_thread() {
        let world = SimWorld::new(WorldPoint::new(0, 0, 0));
        world.insert(banker());

        let (invoker, binding) = Invoker::new(BridgeConfig::default());
        let owner = binding.bind(world).unwrap();
        let dispatcher = ActionDispatcher::new(invoker);

        let receipt = dispatcher.dispatch(&banker(), "Bank").unwrap();
        assert_eq!(receipt.action, "Bank");
        assert_eq!(receipt.action_index, 1);
        assert_eq!(receipt.tick, 0);

        let err = dispatcher.dispatch(&banker(), 5usize).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));

        let log = owner.world().action_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, EntityKind::Npc);
        assert_eq!(log[0].action, "Bank");
    }

    #[test]
    fn test_dispatch_on_target() {
        let here = WorldPoint::new(0, 0, 0);
        let bones = Entity::inventory_item(2, 526, "Bones", 0, 1, here).with_actions(["Use", "Bury"]);
        let world = SimWorld::new(here);
        world.insert(banker());
        world.insert(bones.clone());

        let (invoker, binding) = Invoker::new(BridgeConfig::default());
        let owner = binding.bind(world).unwrap();
        let dispatcher = ActionDispatcher::new(invoker);

        let receipt = dispatcher.dispatch_on(&bones, "use", &banker()).unwrap();
        assert_eq!(receipt.action, "Use");

        let err = dispatcher.dispatch_on(&bones, "Use", &bones).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));

        let log = owner.world().action_log();
        assert_eq!(log.len(), 1);
        let target = log[0].target.as_ref().unwrap();
        assert_eq!((target.kind, target.handle), (EntityKind::Npc, banker().handle));
    }
}
