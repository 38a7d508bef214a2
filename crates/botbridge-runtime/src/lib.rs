//! # botbridge-runtime
//!
//! Cross-thread bridge between scripts and a live, single-owner world model.
//!
//! This crate provides:
//! - `Invoker` for running work on the owner thread from any thread
//! - `OwnerLoop` and `spawn_owner_thread` for driving the owner side
//! - `SnapshotProvider` for consistent point-in-time entity captures
//! - `EntityQuery` and `Search` for fluent filter/sort/first queries
//! - `ActionDispatcher` for resolving and executing menu actions
//! - `ClientContext` bundling all of the above for scripts
//! - `SimWorld`, an in-memory `WorldModel` for demos and tests

pub mod config;
pub mod context;
pub mod dispatch;
pub mod invoker;
pub mod query;
pub mod sim;
pub mod snapshot;
pub mod world;

pub use config::BridgeConfig;
pub use context::ClientContext;
pub use dispatch::{ActionDispatcher, resolve_action};
pub use invoker::{
    InvocationHandle, Invoker, Lifecycle, OwnerBinding, OwnerLoop, OwnerThread, TaskStatus,
    spawn_owner_thread,
};
pub use query::{EntityQuery, Filter, Predicate, Search, SortOrder};
pub use sim::{Scenario, SimWorld};
pub use snapshot::SnapshotProvider;
pub use world::WorldModel;
