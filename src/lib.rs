//! # Kiln Core
//!
//! Reconciliation core of the Kiln build control plane. Drives declared
//! builds to container images and workloads through pluggable execution
//! engines, and keeps the ownership graph consistent when components go
//! away.
//!
//! ## Overview
//!
//! Everything runs as level-triggered reconciliation: a pass reads the
//! entity fresh, converges it one step toward its declared spec, persists
//! what changed, and reports whether to come back. Passes are idempotent
//! end to end, so re-delivered or duplicated triggers are harmless.
//!
//! ## Key Features
//!
//! - **Generic driver**: fetch, route, persist, single-flight, and
//!   deadline handling shared by every controller
//! - **Pluggable engines**: build execution strategies resolved through a
//!   registry, with a workflow-run engine included
//! - **Forward-only build lifecycle**: validated, provisioned, submitted,
//!   observed, and closed out with typed conditions at each step
//! - **Cascading deletion**: components drain their dependents through a
//!   cleanup guard before they are removed
//!
//! ## Module Organization
//!
//! - [`orchestration`]: reconcile driver and entity controllers
//! - [`state_machine`]: build phases and the machine advancing them
//! - [`engine`]: build engine contract, registry, and execution client
//! - [`store`]: object persistence with optimistic concurrency
//! - [`models`]: typed entities, identity, and conditions
//! - [`config`], [`logging`], [`error`], [`constants`]: runtime plumbing

pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod store;

pub use config::KilnConfig;
pub use error::{ErrorClass, KilnError, Result};
pub use models::{Build, Component, Kind, ResourceKey, Workload};
pub use orchestration::{Driver, EntityHandler, Verdict};
pub use state_machine::{BuildPhase, BuildStateMachine};
pub use store::{Store, StoreError};

/// Crate version, re-exported for embedding runtimes.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
