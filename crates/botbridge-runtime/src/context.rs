//! Injectable client context

use crate::config::BridgeConfig;
use crate::dispatch::ActionDispatcher;
use crate::invoker::{InvocationHandle, Invoker, Lifecycle, OwnerBinding};
use crate::query::Search;
use crate::snapshot::SnapshotProvider;
use crate::world::WorldModel;
use botbridge_core::{ActionSelector, DispatchReceipt, Entity, EntityKind, Result, Snapshot, WorldPoint};
use std::time::Duration;

/// Everything a script needs to read and act on one world.
///
/// Cheap to clone and `Send + Sync`: hand a clone to every script, timer and
/// callback thread. Nothing here touches the world directly; all of it goes
/// through the owner thread's queue.
pub struct ClientContext<W> {
    invoker: Invoker<W>,
    snapshots: SnapshotProvider<W>,
    dispatcher: ActionDispatcher<W>,
}

impl<W> Clone for ClientContext<W> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
            snapshots: self.snapshots.clone(),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<W: WorldModel> ClientContext<W> {
    /// Create a context and the binding its owner thread must claim.
    ///
    /// Until the binding is bound every call fails with
    /// `OwnerThreadUnavailable`.
    pub fn new(config: BridgeConfig) -> (Self, OwnerBinding<W>) {
        let (invoker, binding) = Invoker::new(config);
        (Self::from_invoker(invoker), binding)
    }

    pub fn from_invoker(invoker: Invoker<W>) -> Self {
        Self {
            snapshots: SnapshotProvider::new(invoker.clone()),
            dispatcher: ActionDispatcher::new(invoker.clone()),
            invoker,
        }
    }

    pub fn invoker(&self) -> &Invoker<W> {
        &self.invoker
    }

    pub fn config(&self) -> &BridgeConfig {
        self.invoker.config()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.invoker.lifecycle()
    }

    pub fn submit<T, F>(&self, work: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        self.invoker.submit(work)
    }

    pub fn submit_with_timeout<T, F>(&self, work: F, timeout: Duration) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        self.invoker.submit_with_timeout(work, timeout)
    }

    pub fn submit_async<T, F>(&self, work: F) -> Result<InvocationHandle<T>>
    where
        T: Send + 'static,
        F: FnOnce(&W) -> Result<T> + Send + 'static,
    {
        self.invoker.submit_async(work)
    }

    pub fn snapshot(&self, kind: EntityKind) -> Result<Snapshot> {
        self.snapshots.snapshot(kind)
    }

    pub fn local_position(&self) -> Result<Option<WorldPoint>> {
        self.snapshots.local_position()
    }

    /// The local actor's own player entity. `None` while logged out.
    pub fn local_player(&self) -> Result<Option<Entity>> {
        self.snapshots.local_player()
    }

    /// Start a query over entities of `kind`
    pub fn query(&self, kind: EntityKind) -> Search<W> {
        Search::new(self.snapshots.clone(), kind)
    }

    pub fn dispatch(
        &self,
        entity: &Entity,
        selector: impl Into<ActionSelector>,
    ) -> Result<DispatchReceipt> {
        self.dispatcher.dispatch(entity, selector)
    }

    /// Two-entity dispatch, e.g. using an item on an NPC
    pub fn dispatch_on(
        &self,
        entity: &Entity,
        selector: impl Into<ActionSelector>,
        target: &Entity,
    ) -> Result<DispatchReceipt> {
        self.dispatcher.dispatch_on(entity, selector, target)
    }

    pub fn dispatch_async(
        &self,
        entity: &Entity,
        selector: impl Into<ActionSelector>,
    ) -> Result<InvocationHandle<DispatchReceipt>> {
        self.dispatcher.dispatch_async(entity, selector)
    }
}
