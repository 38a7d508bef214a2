//! Per-kind entity lookups

use botbridge_core::{ActionSelector, Entity, EntityKind, Result, WorldPoint};
use botbridge_runtime::{ClientContext, Search, WorldModel};
use tracing::debug;

/// Lookups and interactions for one entity kind.
///
/// `closest*` methods measure from the local actor and return `Ok(None)`
/// when nothing matches.
pub struct EntityApi<W> {
    ctx: ClientContext<W>,
    kind: EntityKind,
}

impl<W> Clone for EntityApi<W> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            kind: self.kind,
        }
    }
}

impl<W: WorldModel> EntityApi<W> {
    pub fn new(ctx: ClientContext<W>, kind: EntityKind) -> Self {
        Self { ctx, kind }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Start a custom query over this kind
    pub fn query(&self) -> Search<W> {
        self.ctx.query(self.kind)
    }

    pub fn all(&self) -> Result<Vec<Entity>> {
        self.query().collect()
    }

    pub fn all_matching(
        &self,
        predicate: impl Fn(&Entity) -> bool + Send + Sync + 'static,
    ) -> Result<Vec<Entity>> {
        self.query().keep_if(predicate).collect()
    }

    pub fn all_named<I, S>(&self, names: I) -> Result<Vec<Entity>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query().with_names(names).collect()
    }

    pub fn all_with_ids(&self, ids: impl IntoIterator<Item = u32>) -> Result<Vec<Entity>> {
        self.query().with_ids(ids).collect()
    }

    pub fn closest(&self) -> Result<Option<Entity>> {
        self.query().sort_nearest().first()
    }

    pub fn closest_matching(
        &self,
        predicate: impl Fn(&Entity) -> bool + Send + Sync + 'static,
    ) -> Result<Option<Entity>> {
        self.query().keep_if(predicate).sort_nearest().first()
    }

    pub fn closest_named<I, S>(&self, names: I) -> Result<Option<Entity>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query().with_names(names).sort_nearest().first()
    }

    pub fn closest_with_ids(&self, ids: impl IntoIterator<Item = u32>) -> Result<Option<Entity>> {
        self.query().with_ids(ids).sort_nearest().first()
    }

    /// Closest entity whose name contains `text`, ignoring case
    pub fn closest_containing(&self, text: &str) -> Result<Option<Entity>> {
        self.query().with_name_contains(text).sort_nearest().first()
    }

    /// Closest entity to `point` rather than to the local actor
    pub fn closest_at(&self, point: WorldPoint) -> Result<Option<Entity>> {
        self.query().relative_to(point).sort_nearest().first()
    }

    /// Closest entity no more than `distance` tiles from the local actor
    pub fn closest_within_distance(&self, distance: u32) -> Result<Option<Entity>> {
        self.query().within_distance(distance).sort_nearest().first()
    }

    pub fn closest_with_action(&self, label: &str) -> Result<Option<Entity>> {
        self.query().with_action(label).sort_nearest().first()
    }

    /// Entity standing exactly on `point`
    pub fn at(&self, point: WorldPoint) -> Result<Option<Entity>> {
        self.query().at_location(point).first()
    }

    pub fn all_at(&self, point: WorldPoint) -> Result<Vec<Entity>> {
        self.query().at_location(point).collect()
    }

    pub fn named_at(&self, point: WorldPoint, name: &str) -> Result<Option<Entity>> {
        self.query().at_location(point).with_name(name).first()
    }

    pub fn with_id_at(&self, point: WorldPoint, id: u32) -> Result<Option<Entity>> {
        self.query().at_location(point).with_id(id).first()
    }

    pub fn contains_named(&self, name: &str) -> Result<bool> {
        self.query().with_name(name).exists()
    }

    pub fn contains_id(&self, id: u32) -> Result<bool> {
        self.query().with_id(id).exists()
    }

    /// Dispatch `selector` on `entity`.
    ///
    /// Returns `Ok(false)` when there is no entity, so a lookup result can be
    /// passed straight in.
    pub fn interact(
        &self,
        entity: Option<&Entity>,
        selector: impl Into<ActionSelector>,
    ) -> Result<bool> {
        let Some(entity) = entity else {
            debug!(kind = %self.kind, "Nothing to interact with");
            return Ok(false);
        };
        self.ctx.dispatch(entity, selector)?;
        Ok(true)
    }

    /// Interact with the closest entity called `name`
    pub fn interact_named(&self, name: &str, selector: impl Into<ActionSelector>) -> Result<bool> {
        let target = self.closest_named([name])?;
        self.interact(target.as_ref(), selector)
    }

    pub fn interact_id(&self, id: u32, selector: impl Into<ActionSelector>) -> Result<bool> {
        let target = self.closest_with_ids([id])?;
        self.interact(target.as_ref(), selector)
    }
}

#[cfg(test)]
mod tests {
    use crate::ScriptApi;
    use crate::testing::{HOME, castle, start};
    use botbridge_core::{BridgeError, EntityHandle, WorldPoint};
    use botbridge_runtime::SimWorld;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_closest_lookups() {
        let (ctx, owner) = start(castle());
        let npcs = ctx.npcs();

        let banker = assert_ok!(npcs.closest_named(["Banker"])).unwrap();
        assert_eq!(banker.handle, EntityHandle(1));

        assert_eq!(assert_ok!(npcs.closest()).unwrap().handle, EntityHandle(1));
        // Cook is on the ground floor but still the only match
        assert_eq!(
            assert_ok!(npcs.closest_containing("COOK")).map(|e| e.handle),
            Some(EntityHandle(4))
        );
        assert_eq!(
            assert_ok!(npcs.closest_with_ids([395])).map(|e| e.handle),
            Some(EntityHandle(2))
        );
        assert_eq!(
            assert_ok!(npcs.closest_with_action("attack")).map(|e| e.name),
            Some("Guard".to_string())
        );
        assert_eq!(
            assert_ok!(npcs.closest_at(WorldPoint::new(3211, 3223, 2))).map(|e| e.handle),
            Some(EntityHandle(2))
        );
        assert_eq!(
            assert_ok!(npcs.closest_matching(|e| e.location.y < 3220)).map(|e| e.name),
            Some("Guard".to_string())
        );
        assert_eq!(
            assert_ok!(npcs.closest_within_distance(3)).map(|e| e.handle),
            Some(EntityHandle(1))
        );
        // Cook is downstairs: no distance reaches him
        assert_eq!(
            assert_ok!(npcs.closest_within_distance(u32::MAX)).map(|e| e.name),
            Some("Banker".to_string())
        );
        assert_eq!(assert_ok!(npcs.closest_within_distance(1)), None);
        assert_ok!(owner.shutdown());
    }

    #[test]
    fn test_players() {
        let (ctx, owner) = start(castle());
        let players = ctx.players();

        let me = assert_ok!(ctx.local_player()).unwrap();
        assert_eq!((me.name.as_str(), me.location), ("Lumbot", HOME));
        assert_eq!(
            assert_ok!(players.closest_within_distance(0)).map(|p| p.handle),
            Some(me.handle)
        );
        assert_eq!(
            assert_ok!(players.closest_within_distance(5)).map(|p| p.handle),
            Some(me.handle)
        );
        assert_eq!(
            assert_ok!(players.closest_named(["Zezima"])).map(|p| p.location),
            Some(WorldPoint::new(3207, 3219, 2))
        );

        assert_ok!(ctx.submit(|world: &SimWorld| {
            world.set_local_position(None);
            Ok(())
        }));
        assert_eq!(assert_ok!(ctx.local_player()), None);
        assert_eq!(assert_ok!(players.closest_within_distance(5)), None);
        assert_ok!(owner.shutdown());
    }

    #[test]
    fn test_location_and_presence_lookups() {
        let (ctx, owner) = start(castle());
        let objects = ctx.game_objects();
        let booth = WorldPoint::new(3208, 3221, 2);

        assert_eq!(assert_ok!(objects.all_at(booth)).len(), 1);
        assert!(assert_ok!(objects.all_at(HOME)).is_empty());
        assert_eq!(
            assert_ok!(objects.named_at(booth, "Bank booth")).map(|o| o.id),
            Some(18491)
        );
        assert_eq!(assert_ok!(objects.named_at(booth, "Staircase")), None);
        assert_eq!(
            assert_ok!(objects.with_id_at(booth, 18491)).map(|o| o.handle),
            Some(EntityHandle(6))
        );

        assert!(assert_ok!(objects.contains_named("Staircase")));
        assert!(!assert_ok!(objects.contains_named("Furnace")));
        assert!(assert_ok!(objects.contains_id(16672)));
        assert!(!assert_ok!(ctx.npcs().contains_id(1)));

        assert!(assert_ok!(objects.interact_id(16672, "Climb-down")));
        assert!(!assert_ok!(objects.interact_id(1, "Climb-down")));
        assert_ok!(owner.shutdown());
    }

    #[test]
    fn test_all_lookups() {
        let (ctx, owner) = start(castle());

        assert_eq!(assert_ok!(ctx.npcs().all()).len(), 4);
        assert_eq!(assert_ok!(ctx.npcs().all_named(["Banker", "Cook"])).len(), 3);
        assert_eq!(assert_ok!(ctx.npcs().all_with_ids([3106, 0])).len(), 2);
        assert_eq!(
            assert_ok!(ctx.game_objects().all_matching(|e| e.has_action("bank"))).len(),
            1
        );
        assert_eq!(
            assert_ok!(ctx.players().at(WorldPoint::new(3207, 3219, 2))).map(|e| e.name),
            Some("Zezima".to_string())
        );

        let err = assert_err!(ctx.npcs().all_named(Vec::<String>::new()));
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
        assert_ok!(owner.shutdown());
    }

    #[test]
    fn test_interact() {
        let (ctx, owner) = start(castle());
        let objects = ctx.game_objects();

        let booth = assert_ok!(objects.closest_named(["Bank booth"]));
        assert!(assert_ok!(objects.interact(booth.as_ref(), "bank")));
        assert!(!assert_ok!(objects.interact(None, "Bank")));
        assert!(!assert_ok!(objects.interact_named("Furnace", "Smelt")));

        let err = assert_err!(ctx.npcs().interact_named("Banker", "Attack"));
        assert!(matches!(err, BridgeError::ActionNotAvailable { .. }));

        assert!(assert_ok!(ctx.ground_items().interact_named("Coins", "Take")));
        assert_eq!(assert_ok!(ctx.ground_items().all()).len(), 0);

        let log = assert_ok!(ctx.submit(|world: &SimWorld| Ok(world.action_log())));
        let actions: Vec<_> = log.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(actions, ["Bank", "Take"]);
        assert!(log.iter().all(|r| r.location != HOME));
        assert_ok!(owner.shutdown());
    }
}
