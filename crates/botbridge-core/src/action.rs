//! Action selectors and the requests handed to the world model

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entity::{Entity, EntityHandle, EntityKind};
use crate::location::WorldPoint;

/// How a caller names the menu action to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", content = "Value", rename_all = "PascalCase")]
pub enum ActionSelector {
    /// Match by label: exact first, then case-insensitive
    Name(String),
    /// Position in the entity's action list
    Index(usize),
    /// Try each label in order with the `Name` rules; first hit wins
    FirstOf(Vec<String>),
}

impl From<&str> for ActionSelector {
    fn from(label: &str) -> Self {
        ActionSelector::Name(label.to_string())
    }
}

impl From<String> for ActionSelector {
    fn from(label: String) -> Self {
        ActionSelector::Name(label)
    }
}

impl From<usize> for ActionSelector {
    fn from(index: usize) -> Self {
        ActionSelector::Index(index)
    }
}

impl From<Vec<String>> for ActionSelector {
    fn from(labels: Vec<String>) -> Self {
        ActionSelector::FirstOf(labels)
    }
}

impl From<&[&str]> for ActionSelector {
    fn from(labels: &[&str]) -> Self {
        ActionSelector::FirstOf(labels.iter().map(|s| s.to_string()).collect())
    }
}

impl fmt::Display for ActionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSelector::Name(label) => write!(f, "'{}'", label),
            ActionSelector::Index(index) => write!(f, "#{}", index),
            ActionSelector::FirstOf(labels) => write!(f, "any of {:?}", labels),
        }
    }
}

/// A resolved world-mutating request. Transient: built for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionRequest {
    pub kind: EntityKind,
    pub handle: EntityHandle,
    pub id: u32,
    pub action_index: usize,
    pub action: String,
    pub location: WorldPoint,
    /// Second entity for two-entity actions such as using an item on an NPC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<ActionTarget>,
}

impl ActionRequest {
    /// Returns `None` when `action_index` is outside the entity's menu
    pub fn for_entity(entity: &Entity, action_index: usize) -> Option<Self> {
        let action = entity.actions.get(action_index)?.clone();
        Some(Self {
            kind: entity.kind(),
            handle: entity.handle,
            id: entity.id,
            action_index,
            action,
            location: entity.location,
            target: None,
        })
    }

    pub fn with_target(mut self, target: &Entity) -> Self {
        self.target = Some(ActionTarget::of(target));
        self
    }
}

/// The entity a two-entity action lands on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActionTarget {
    pub kind: EntityKind,
    pub handle: EntityHandle,
    pub id: u32,
    pub location: WorldPoint,
}

impl ActionTarget {
    pub fn of(entity: &Entity) -> Self {
        Self {
            kind: entity.kind(),
            handle: entity.handle,
            id: entity.id,
            location: entity.location,
        }
    }
}

/// Proof that the owner thread executed a request.
///
/// Says nothing about whether the intended effect was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DispatchReceipt {
    /// Owner-thread tick the request executed on
    pub tick: u64,
    pub action: String,
    pub action_index: usize,
}
