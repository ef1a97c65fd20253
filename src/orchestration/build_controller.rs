//! # Build Controller
//!
//! [`EntityHandler`] binding the build state machine into the generic
//! driver. All lifecycle logic lives in the state machine; this layer only
//! routes driver callbacks.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::EngineRegistry;
use crate::error::Result;
use crate::models::Build;
use crate::state_machine::BuildStateMachine;
use crate::store::Store;

use super::driver::EntityHandler;
use super::types::Verdict;

pub struct BuildController {
    machine: BuildStateMachine,
}

impl BuildController {
    pub fn new(store: Store, engines: Arc<EngineRegistry>, poll_interval: Duration) -> Self {
        Self {
            machine: BuildStateMachine::new(store, engines, poll_interval),
        }
    }
}

#[async_trait]
impl EntityHandler for BuildController {
    type Entity = Build;

    async fn reconcile(&self, build: &mut Build) -> Result<Verdict> {
        self.machine.advance(build).await
    }

    /// Builds carry no cleanup guards of their own; deletion needs no
    /// teardown beyond the store removing the object.
    async fn finalize(&self, _build: &mut Build) -> Result<Verdict> {
        Ok(Verdict::Done)
    }
}
