//! # Reconcile Driver
//!
//! Generic control-loop engine shared by every entity controller. The
//! driver owns the mechanics a correct reconciler needs and keeps entity
//! logic out of them:
//!
//! - **Fetch-fresh**: each pass re-reads the entity; handlers never see a
//!   cached object
//! - **Routing**: entities marked for deletion go to `finalize`, live ones
//!   to `reconcile`
//! - **Persistence**: status changes are written back once per pass, with
//!   write conflicts downgraded to an immediate retry
//! - **Single-flight**: concurrent passes for the same key collapse into
//!   one; the loser is told to come back
//! - **Deadline**: a pass that outlives the configured deadline is
//!   abandoned with a transient error
//!
//! Scheduling (queues, backoff between passes, watch streams) stays with
//! the embedding runtime; the driver only reports each pass's [`Verdict`].

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{KilnError, Result};
use crate::models::{Resource, ResourceKey};
use crate::store::Store;

use super::types::{DriverConfig, Verdict};

/// Entity-specific reconciliation logic plugged into a [`Driver`].
///
/// Handlers mutate the entity in place; the driver persists whatever
/// changed after the pass. Both methods must be safe to call repeatedly
/// for the same entity.
#[async_trait]
pub trait EntityHandler: Send + Sync {
    type Entity: Resource;

    /// Converge a live entity toward its spec.
    async fn reconcile(&self, entity: &mut Self::Entity) -> Result<Verdict>;

    /// Progress cleanup of an entity marked for deletion.
    async fn finalize(&self, entity: &mut Self::Entity) -> Result<Verdict>;
}

/// Control-loop engine for one entity kind.
pub struct Driver<H: EntityHandler> {
    store: Store,
    handler: H,
    config: DriverConfig,
    in_flight: DashMap<ResourceKey, ()>,
}

impl<H: EntityHandler> Driver<H> {
    pub fn new(store: Store, handler: H, config: DriverConfig) -> Self {
        Self {
            store,
            handler,
            config,
            in_flight: DashMap::new(),
        }
    }

    /// Run one reconcile pass for the entity at `key`.
    ///
    /// Returns [`Verdict::RetryNow`] without touching the entity when a
    /// pass for the same key is already in flight.
    pub async fn reconcile(&self, key: &ResourceKey) -> Result<Verdict> {
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!(key = %key, "Pass already in flight, deferring");
                return Ok(Verdict::RetryNow);
            }
            Entry::Vacant(slot) => {
                slot.insert(());
            }
        }
        let _guard = FlightGuard {
            map: &self.in_flight,
            key: key.clone(),
        };

        let result = match tokio::time::timeout(self.config.deadline, self.run_pass(key)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(key = %key, deadline = ?self.config.deadline, "Reconcile pass abandoned");
                Err(KilnError::DeadlineExceeded {
                    key: key.clone(),
                    deadline: self.config.deadline,
                })
            }
        };
        if let Err(e) = &result {
            warn!(key = %key, error = %e, transient = e.is_transient(), "Reconcile pass failed");
        }
        result
    }

    async fn run_pass(&self, key: &ResourceKey) -> Result<Verdict> {
        let mut entity: H::Entity = match self.store.get(key).await {
            Ok(entity) => entity,
            Err(e) if e.is_not_found() => {
                debug!(key = %key, "Entity gone, nothing to reconcile");
                return Ok(Verdict::Done);
            }
            Err(e) => return Err(e.into()),
        };

        let before = snapshot(&entity)?;
        let verdict = if entity.meta().is_deleting() {
            self.handler.finalize(&mut entity).await?
        } else {
            self.handler.reconcile(&mut entity).await?
        };

        if snapshot(&entity)? != before {
            match self.store.update(&entity).await {
                Ok(_) => {}
                Err(e) if e.is_conflict() => {
                    debug!(key = %key, "Entity changed under us, retrying with fresh state");
                    return Ok(Verdict::RetryNow);
                }
                Err(e) if e.is_not_found() => {
                    debug!(key = %key, "Entity removed mid-pass");
                    return Ok(Verdict::Done);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(verdict)
    }
}

fn snapshot<R: Resource>(entity: &R) -> Result<serde_json::Value> {
    serde_json::to_value(entity)
        .map_err(|e| KilnError::Internal(format!("Failed to snapshot entity: {e}")))
}

/// Releases the single-flight claim when the pass ends, panics included.
struct FlightGuard<'a> {
    map: &'a DashMap<ResourceKey, ()>,
    key: ResourceKey,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.key);
    }
}
