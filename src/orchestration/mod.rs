//! # Orchestration
//!
//! The control-loop driver and the entity controllers plugged into it.
//!
//! ## Module Organization
//!
//! - [`driver`]: generic fetch-reconcile-persist engine with single-flight
//!   and deadline enforcement
//! - [`build_controller`]: build lifecycle handler
//! - [`component_finalizer`]: component guard attachment and cascade
//!   deletion
//! - [`types`]: verdicts and driver configuration

pub mod build_controller;
pub mod component_finalizer;
pub mod driver;
pub mod types;

pub use build_controller::BuildController;
pub use component_finalizer::ComponentFinalizer;
pub use driver::{Driver, EntityHandler};
pub use types::{DriverConfig, Verdict};
