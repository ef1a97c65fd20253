//! # Component Finalizer
//!
//! Cascade deletion coordinator for components. Live components get a
//! cleanup guard attached before anything depends on them; deleting
//! components have their dependents swept (builds, workloads, runner
//! identities, result grants) and only lose the guard once every dependent
//! is gone.
//!
//! The sweep is re-entrant: each pass re-lists dependents fresh, so
//! objects created after deletion began are still caught, and dependents
//! blocked on their own cleanup guards simply keep the component in the
//! finalizing state. The coordinator never removes a guard it does not
//! own.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use crate::constants::{finalizers, reasons};
use crate::error::Result;
use crate::models::{Component, Condition, ConditionType, Kind, ResourceKey};
use crate::store::Store;

use super::driver::EntityHandler;
use super::types::Verdict;

pub struct ComponentFinalizer {
    store: Store,
    /// Delay between sweeps while dependents are still draining.
    retry_delay: Duration,
}

impl ComponentFinalizer {
    pub fn new(store: Store, retry_delay: Duration) -> Self {
        Self { store, retry_delay }
    }

    /// Delete every dependent of `component` once, then report what is
    /// still left. Dependents guarded by their own finalizers stay listed
    /// until those guards drain.
    async fn sweep_dependents(&self, component: &ResourceKey) -> Result<Vec<(Kind, usize)>> {
        for kind in Component::DEPENDENT_KINDS {
            let owned = self.store.list_owned(*kind, component).await?;
            let keys: Vec<ResourceKey> = owned.iter().map(|object| object.key()).collect();
            let deletions = keys.iter().map(|key| self.store.delete(*kind, key));
            futures::future::try_join_all(deletions).await?;
        }

        let mut remaining = Vec::new();
        for kind in Component::DEPENDENT_KINDS {
            let count = self.store.list_owned(*kind, component).await?.len();
            if count > 0 {
                remaining.push((*kind, count));
            }
        }
        Ok(remaining)
    }
}

#[async_trait]
impl EntityHandler for ComponentFinalizer {
    type Entity = Component;

    /// Guard the component before dependents accumulate, and report it
    /// ready.
    async fn reconcile(&self, component: &mut Component) -> Result<Verdict> {
        if component.meta.add_finalizer(finalizers::COMPONENT_CLEANUP) {
            debug!(component = %component.meta.key(), "Attached cleanup guard");
        }
        component.status.conditions.set(Condition::observed(
            ConditionType::Ready,
            &component.meta,
            reasons::component::PROVISIONED,
            "Component provisioned",
        ));
        Ok(Verdict::Done)
    }

    async fn finalize(&self, component: &mut Component) -> Result<Verdict> {
        if !component.meta.has_finalizer(finalizers::COMPONENT_CLEANUP) {
            debug!(component = %component.meta.key(), "Cleanup guard not ours to manage");
            return Ok(Verdict::Done);
        }

        // Surface the finalizing state before the first sweep touches
        // anything, so observers see why dependents start disappearing.
        if !component.status.conditions.has(ConditionType::Finalizing) {
            component.status.conditions.set(Condition::observed(
                ConditionType::Finalizing,
                &component.meta,
                reasons::component::FINALIZING,
                "Cascade deletion started",
            ));
            return Ok(Verdict::RetryNow);
        }

        let key = component.meta.key();
        let remaining = self.sweep_dependents(&key).await?;

        if !remaining.is_empty() {
            let detail = remaining
                .iter()
                .map(|(kind, count)| format!("{kind}={count}"))
                .collect::<Vec<_>>()
                .join(", ");
            debug!(
                component = %key,
                remaining = %detail,
                "Dependents still draining"
            );
            component.status.conditions.set(Condition::observed(
                ConditionType::Finalizing,
                &component.meta,
                reasons::component::AWAITING_DEPENDENTS,
                &format!("Waiting on dependents: {detail}"),
            ));
            return Ok(Verdict::RetryAfter(self.retry_delay));
        }

        component.meta.remove_finalizer(finalizers::COMPONENT_CLEANUP);
        info!(component = %key, "🛡️ Cascade complete, releasing cleanup guard");
        Ok(Verdict::Done)
    }
}
