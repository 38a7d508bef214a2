//! Fluent entity queries
//!
//! An [`EntityQuery`] is a pure description: kind, filter stages, optional
//! sort and optional reference point. It can be evaluated against any
//! [`Snapshot`] any number of times with the same result. A [`Search`] binds
//! a query to a [`SnapshotProvider`] so each terminal call captures a fresh
//! snapshot first.

mod filter;

pub use filter::{Filter, Predicate, SortOrder};

use crate::snapshot::SnapshotProvider;
use crate::world::WorldModel;
use botbridge_core::{BridgeError, Entity, EntityKind, Result, Snapshot, WorldPoint};
use std::cmp::Reverse;
use tracing::trace;

/// Filter/sort description over one entity kind
#[derive(Debug, Clone)]
pub struct EntityQuery {
    kind: EntityKind,
    filters: Vec<Filter>,
    sort: Option<SortOrder>,
    reference: Option<WorldPoint>,
}

impl EntityQuery {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            filters: Vec::new(),
            sort: None,
            reference: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }

    /// Explicit reference point, if one was set with `relative_to`
    pub fn reference(&self) -> Option<WorldPoint> {
        self.reference
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_ids(self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.filter(Filter::Ids(ids.into_iter().collect()))
    }

    pub fn with_id(self, id: u32) -> Self {
        self.with_ids([id])
    }

    pub fn with_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(Filter::Names(names.into_iter().map(Into::into).collect()))
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_names([name])
    }

    pub fn with_name_contains(self, text: &str) -> Self {
        self.filter(Filter::name_contains(text))
    }

    pub fn at_location(self, point: WorldPoint) -> Self {
        self.filter(Filter::AtLocation(point))
    }

    pub fn within_distance(self, max: u32) -> Self {
        self.filter(Filter::WithinDistance(max))
    }

    pub fn with_action(self, label: impl Into<String>) -> Self {
        self.filter(Filter::WithAction(label.into()))
    }

    pub fn keep_if(self, predicate: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
        self.filter(Filter::Custom(Predicate::new(predicate)))
    }

    pub fn sort_nearest(mut self) -> Self {
        self.sort = Some(SortOrder::Nearest);
        self
    }

    pub fn sort_furthest(mut self) -> Self {
        self.sort = Some(SortOrder::Furthest);
        self
    }

    /// Measure distances from `point` instead of the snapshot origin
    pub fn relative_to(mut self, point: WorldPoint) -> Self {
        self.reference = Some(point);
        self
    }

    /// Reject queries that can never be satisfied because a set stage is empty
    pub fn validate(&self) -> Result<()> {
        match self.filters.iter().find(|f| f.is_empty_set()) {
            Some(filter) => Err(BridgeError::InvalidArgument(format!(
                "{} needs at least one value",
                filter.describe()
            ))),
            None => Ok(()),
        }
    }

    fn reference_for(&self, snapshot: &Snapshot) -> Option<WorldPoint> {
        self.reference.or(snapshot.origin())
    }

    /// True when `entity` passes every stage
    pub fn matches(&self, entity: &Entity, reference: Option<&WorldPoint>) -> bool {
        entity.kind() == self.kind && self.filters.iter().all(|f| f.matches(entity, reference))
    }

    fn matching<'a>(
        &'a self,
        snapshot: &'a Snapshot,
        reference: Option<WorldPoint>,
    ) -> impl Iterator<Item = &'a Entity> + 'a {
        snapshot
            .iter()
            .filter(move |entity| self.matches(entity, reference.as_ref()))
    }

    /// Every match, in sort order (snapshot order when unsorted)
    pub fn collect_from(&self, snapshot: &Snapshot) -> Vec<Entity> {
        let reference = self.reference_for(snapshot);
        let mut found: Vec<Entity> = self.matching(snapshot, reference).cloned().collect();

        if let (Some(order), Some(origin)) = (self.sort, reference) {
            match order {
                SortOrder::Nearest => found.sort_by_key(|e| origin.distance_to(&e.location)),
                SortOrder::Furthest => {
                    found.sort_by_key(|e| Reverse(origin.distance_to(&e.location)))
                }
            }
        }
        trace!(kind = %self.kind, tick = snapshot.tick(), found = found.len(), "Query collected");
        found
    }

    /// Head of `collect_from` without materializing it
    pub fn first_from(&self, snapshot: &Snapshot) -> Option<Entity> {
        let reference = self.reference_for(snapshot);
        let mut matching = self.matching(snapshot, reference);

        // min_by_key keeps the earliest of equal keys, matching the stable sort
        let first = match (self.sort, reference) {
            (Some(SortOrder::Nearest), Some(origin)) => {
                matching.min_by_key(|e| origin.distance_to(&e.location))
            }
            (Some(SortOrder::Furthest), Some(origin)) => {
                matching.min_by_key(|e| Reverse(origin.distance_to(&e.location)))
            }
            _ => matching.next(),
        };
        first.cloned()
    }

    pub fn count_from(&self, snapshot: &Snapshot) -> usize {
        let reference = self.reference_for(snapshot);
        self.matching(snapshot, reference).count()
    }
}

/// A query bound to a live world through its snapshot provider
pub struct Search<W> {
    provider: SnapshotProvider<W>,
    query: EntityQuery,
}

impl<W> Clone for Search<W> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            query: self.query.clone(),
        }
    }
}

impl<W: WorldModel> Search<W> {
    pub fn new(provider: SnapshotProvider<W>, kind: EntityKind) -> Self {
        Self {
            provider,
            query: EntityQuery::new(kind),
        }
    }

    pub fn query(&self) -> &EntityQuery {
        &self.query
    }

    fn map(self, f: impl FnOnce(EntityQuery) -> EntityQuery) -> Self {
        Self {
            provider: self.provider,
            query: f(self.query),
        }
    }

    pub fn filter(self, filter: Filter) -> Self {
        self.map(|q| q.filter(filter))
    }

    pub fn with_ids(self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.map(|q| q.with_ids(ids))
    }

    pub fn with_id(self, id: u32) -> Self {
        self.map(|q| q.with_id(id))
    }

    pub fn with_names<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map(|q| q.with_names(names))
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.map(|q| q.with_name(name))
    }

    pub fn with_name_contains(self, text: &str) -> Self {
        self.map(|q| q.with_name_contains(text))
    }

    pub fn at_location(self, point: WorldPoint) -> Self {
        self.map(|q| q.at_location(point))
    }

    pub fn within_distance(self, max: u32) -> Self {
        self.map(|q| q.within_distance(max))
    }

    pub fn with_action(self, label: impl Into<String>) -> Self {
        self.map(|q| q.with_action(label))
    }

    pub fn keep_if(self, predicate: impl Fn(&Entity) -> bool + Send + Sync + 'static) -> Self {
        self.map(|q| q.keep_if(predicate))
    }

    pub fn sort_nearest(self) -> Self {
        self.map(EntityQuery::sort_nearest)
    }

    pub fn sort_furthest(self) -> Self {
        self.map(EntityQuery::sort_furthest)
    }

    pub fn relative_to(self, point: WorldPoint) -> Self {
        self.map(|q| q.relative_to(point))
    }

    /// Capture the snapshot this search would run against
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.query.validate()?;
        self.provider.snapshot(self.query.kind)
    }

    pub fn collect(&self) -> Result<Vec<Entity>> {
        Ok(self.query.collect_from(&self.snapshot()?))
    }

    /// First match, or `Ok(None)` when nothing matched
    pub fn first(&self) -> Result<Option<Entity>> {
        Ok(self.query.first_from(&self.snapshot()?))
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.query.count_from(&self.snapshot()?))
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(self.first()?.is_some())
    }
}
