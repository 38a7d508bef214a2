//! Filter stages and sort orders

use botbridge_core::{Entity, WorldPoint};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied entity test for composition the named stages don't cover
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Entity) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn test(&self, entity: &Entity) -> bool {
        (self.0)(entity)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// One narrowing stage. Stages combine with AND; the values inside a set
/// stage combine with OR.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Definition id is one of these
    Ids(BTreeSet<u32>),
    /// Name is exactly one of these
    Names(BTreeSet<String>),
    /// Case-insensitive substring of the name. Stored lowercased.
    NameContains(String),
    AtLocation(WorldPoint),
    /// Tile distance to the reference point is at most this
    WithinDistance(u32),
    /// Action menu has this label, case-insensitive
    WithAction(String),
    Custom(Predicate),
}

impl Filter {
    pub fn name_contains(text: &str) -> Self {
        Filter::NameContains(text.to_lowercase())
    }

    /// Test one entity. Distance stages fail when there is no reference point.
    pub fn matches(&self, entity: &Entity, reference: Option<&WorldPoint>) -> bool {
        match self {
            Filter::Ids(ids) => ids.contains(&entity.id),
            Filter::Names(names) => names.contains(&entity.name),
            Filter::NameContains(needle) => entity.name.to_lowercase().contains(needle.as_str()),
            Filter::AtLocation(point) => entity.location == *point,
            Filter::WithinDistance(max) => {
                reference.is_some_and(|origin| origin.is_within_distance(&entity.location, *max))
            }
            Filter::WithAction(label) => entity.has_action(label),
            Filter::Custom(predicate) => predicate.test(entity),
        }
    }

    /// Set stages that can never match anything
    pub(crate) fn is_empty_set(&self) -> bool {
        match self {
            Filter::Ids(ids) => ids.is_empty(),
            Filter::Names(names) => names.is_empty(),
            _ => false,
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Filter::Ids(_) => "with_ids",
            Filter::Names(_) => "with_names",
            Filter::NameContains(_) => "with_name_contains",
            Filter::AtLocation(_) => "at_location",
            Filter::WithinDistance(_) => "within_distance",
            Filter::WithAction(_) => "with_action",
            Filter::Custom(_) => "keep_if",
        }
    }
}

/// Ordering applied after filtering. Both orders are stable: entities at
/// equal distance keep their snapshot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Nearest,
    Furthest,
}
