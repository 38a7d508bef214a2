//! Snapshot provider

use crate::invoker::Invoker;
use crate::world::WorldModel;
use botbridge_core::{Entity, EntityKind, Result, Snapshot, WorldPoint};
use tracing::{debug, warn};

/// Captures snapshots on the owner thread
pub struct SnapshotProvider<W> {
    invoker: Invoker<W>,
}

impl<W> Clone for SnapshotProvider<W> {
    fn clone(&self) -> Self {
        Self {
            invoker: self.invoker.clone(),
        }
    }
}

impl<W: WorldModel> SnapshotProvider<W> {
    pub fn new(invoker: Invoker<W>) -> Self {
        Self { invoker }
    }

    /// Every loaded entity of `kind`, as one consistent value
    pub fn snapshot(&self, kind: EntityKind) -> Result<Snapshot> {
        self.invoker.submit(move |world: &W| Ok(capture(world, kind)))
    }

    /// Local actor's location, read on the owner thread
    pub fn local_position(&self) -> Result<Option<WorldPoint>> {
        self.invoker.submit(|world: &W| Ok(world.local_position()))
    }

    pub fn local_player(&self) -> Result<Option<Entity>> {
        self.invoker.submit(|world: &W| Ok(world.local_player()))
    }
}

/// Build a snapshot from the live world. Must run on the owner thread.
pub(crate) fn capture<W: WorldModel>(world: &W, kind: EntityKind) -> Snapshot {
    let tick = world.tick();
    let origin = world.local_position();
    let raw = world.capture(kind);

    let captured = raw.len();
    let loaded: Vec<_> = raw
        .into_iter()
        .filter(|entity| world.is_loaded(&entity.location))
        .collect();
    let unloaded = captured - loaded.len();

    let (snapshot, stats) = Snapshot::from_capture(kind, tick, origin, loaded);
    if !stats.is_clean() {
        warn!(
            %kind,
            tick,
            wrong_kind = stats.wrong_kind,
            duplicates = stats.duplicates,
            "World returned entities that were dropped from the snapshot"
        );
    }
    debug!(%kind, tick, count = snapshot.len(), unloaded, "Captured snapshot");
    snapshot
}
