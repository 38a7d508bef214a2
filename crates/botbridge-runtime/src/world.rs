//! World model trait

use botbridge_core::{ActionRequest, Entity, EntityKind, Result, WorldPoint};

/// The live world, owned by the owner thread.
///
/// Implementations are never shared across threads: the owner loop holds the
/// only instance and hands out `&Self` to work running on that thread. Use
/// interior mutability (`Cell`/`RefCell`) for state that actions change.
pub trait WorldModel: 'static {
    /// Current simulation tick
    fn tick(&self) -> u64;

    /// Location of the local actor, if logged in
    fn local_position(&self) -> Option<WorldPoint>;

    /// The local actor as a player entity, if the world tracks one
    fn local_player(&self) -> Option<Entity> {
        None
    }

    /// Every entity of `kind` the world currently knows about
    fn capture(&self, kind: EntityKind) -> Vec<Entity>;

    /// Whether `point` lies in the loaded/rendered region
    fn is_loaded(&self, _point: &WorldPoint) -> bool {
        true
    }

    /// Encode and send a resolved action. Terminal step of a dispatch.
    fn send_action(&self, request: &ActionRequest) -> Result<()>;

    /// Advance one tick. Called by the owner loop in continuous mode;
    /// host-driven worlds advance themselves and leave this empty.
    fn advance(&self) {}
}
