//! Immutable point-in-time entity captures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::entity::{Entity, EntityHandle, EntityKind};
use crate::error::Result;
use crate::location::WorldPoint;

/// Entities of one kind that existed together at one tick.
///
/// A snapshot is a value: nothing in it refers back to live world state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Snapshot {
    kind: EntityKind,
    tick: u64,
    /// Local actor's location at capture time
    origin: Option<WorldPoint>,
    entities: Vec<Entity>,
}

/// What was discarded while building a snapshot from a raw capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub wrong_kind: usize,
    pub duplicates: usize,
}

impl CaptureStats {
    pub fn is_clean(&self) -> bool {
        self.wrong_kind == 0 && self.duplicates == 0
    }
}

impl Snapshot {
    /// Build a snapshot from raw world output.
    ///
    /// Entities of another kind are dropped and only the first entity per
    /// handle is kept, so handles are unique within the result.
    pub fn from_capture(
        kind: EntityKind,
        tick: u64,
        origin: Option<WorldPoint>,
        raw: Vec<Entity>,
    ) -> (Self, CaptureStats) {
        let mut stats = CaptureStats::default();
        let mut seen: HashSet<EntityHandle> = HashSet::with_capacity(raw.len());
        let mut entities = Vec::with_capacity(raw.len());

        for entity in raw {
            if entity.kind() != kind {
                stats.wrong_kind += 1;
                continue;
            }
            if !seen.insert(entity.handle) {
                stats.duplicates += 1;
                continue;
            }
            entities.push(entity);
        }

        (
            Self {
                kind,
                tick,
                origin,
                entities,
            },
            stats,
        )
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn origin(&self) -> Option<WorldPoint> {
        self.origin
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, handle: EntityHandle) -> Option<&Entity> {
        self.entities.iter().find(|e| e.handle == handle)
    }

    /// SHA-256 of the snapshot's JSON encoding, hex encoded.
    ///
    /// Equal snapshots always produce equal fingerprints.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&bytes);
        Ok(hex::encode(digest))
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: i32, y: i32) -> WorldPoint {
        WorldPoint::new(x, y, 0)
    }

    #[test]
    fn test_capture_drops_duplicates_and_wrong_kind() {
        let raw = vec![
            Entity::npc(1, 394, "Banker", at(0, 0)),
            Entity::npc(1, 394, "Banker (stale)", at(9, 9)),
            Entity::player(2, "Zezima", at(1, 1)),
            Entity::npc(3, 3106, "Guard", at(4, 4)),
        ];
        let (snapshot, stats) = Snapshot::from_capture(EntityKind::Npc, 5, Some(at(1, 1)), raw);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.entities()[0].name, "Banker");
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.wrong_kind, 1);
        assert!(!stats.is_clean());
        assert_eq!(snapshot.get(EntityHandle(3)).map(|e| e.id), Some(3106));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let raw = vec![Entity::npc(1, 394, "Banker", at(0, 0)).with_actions(["Talk-to", "Bank"])];
        let (a, _) = Snapshot::from_capture(EntityKind::Npc, 5, None, raw.clone());
        let (b, _) = Snapshot::from_capture(EntityKind::Npc, 5, None, raw);
        let (c, _) = Snapshot::from_capture(EntityKind::Npc, 6, None, Vec::new());

        let fa = a.fingerprint().unwrap();
        assert_eq!(fa.len(), 64);
        assert_eq!(fa, b.fingerprint().unwrap());
        assert_ne!(fa, c.fingerprint().unwrap());
    }
}
