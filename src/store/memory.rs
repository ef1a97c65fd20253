//! # In-Memory Store
//!
//! Reference [`RawStore`] backed by process memory. A single lock guards
//! the object map and the owner index together so a write and its index
//! maintenance land atomically. Suitable for tests and single-process
//! deployments; the trait seam keeps reconcilers unaware of the backing.

use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use async_trait::async_trait;

use crate::models::{Kind, ResourceKey};

use super::{ListFilter, Object, RawStore, StoreError, StoreResult};

type Slot = (Kind, ResourceKey);

#[derive(Default)]
struct MemoryState {
    objects: HashMap<Slot, Object>,
    /// Owner component key to the dependents naming it.
    owner_index: HashMap<ResourceKey, HashSet<Slot>>,
}

impl MemoryState {
    fn index_insert(&mut self, owner: &Option<ResourceKey>, slot: Slot) {
        if let Some(owner) = owner {
            self.owner_index.entry(owner.clone()).or_default().insert(slot);
        }
    }

    fn index_remove(&mut self, owner: &Option<ResourceKey>, slot: &Slot) {
        if let Some(owner) = owner {
            if let Some(members) = self.owner_index.get_mut(owner) {
                members.remove(slot);
                if members.is_empty() {
                    self.owner_index.remove(owner);
                }
            }
        }
    }

    fn remove(&mut self, slot: &Slot) -> Option<Object> {
        let removed = self.objects.remove(slot)?;
        self.index_remove(&removed.owner, slot);
        Some(removed)
    }
}

/// In-memory object store with optimistic concurrency and an owner index.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects across all kinds. Test helper.
    pub fn len(&self) -> usize {
        self.state.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().objects.is_empty()
    }
}

#[async_trait]
impl RawStore for MemoryStore {
    async fn get(&self, kind: Kind, key: &ResourceKey) -> StoreResult<Object> {
        let state = self.state.read();
        state
            .objects
            .get(&(kind, key.clone()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                kind,
                key: key.clone(),
            })
    }

    async fn create(&self, mut object: Object) -> StoreResult<Object> {
        let slot = (object.kind, object.key());
        let mut state = self.state.write();

        if state.objects.contains_key(&slot) {
            return Err(StoreError::AlreadyExists {
                kind: slot.0,
                key: slot.1,
            });
        }

        object.meta.uid = Some(Uuid::now_v7());
        object.meta.created_at = Some(Utc::now());
        object.meta.resource_version = 1;
        object.meta.deletion_requested_at = None;

        let owner = object.owner.clone();
        state.objects.insert(slot.clone(), object.clone());
        state.index_insert(&owner, slot);
        Ok(object)
    }

    async fn update(&self, mut object: Object) -> StoreResult<Object> {
        let slot = (object.kind, object.key());
        let mut state = self.state.write();

        let (stored_meta, old_owner) = {
            let stored = state
                .objects
                .get(&slot)
                .ok_or_else(|| StoreError::NotFound {
                    kind: slot.0,
                    key: slot.1.clone(),
                })?;
            (stored.meta.clone(), stored.owner.clone())
        };

        if stored_meta.resource_version != object.meta.resource_version {
            return Err(StoreError::Conflict {
                kind: slot.0,
                key: slot.1,
            });
        }

        // Store-managed fields always win over whatever the caller carried.
        object.meta.uid = stored_meta.uid;
        object.meta.created_at = stored_meta.created_at;
        object.meta.deletion_requested_at = stored_meta.deletion_requested_at;
        object.meta.resource_version = stored_meta.resource_version + 1;

        // A marked object whose last guard was just removed is gone.
        if object.meta.is_deleting() && object.meta.finalizers.is_empty() {
            state.remove(&slot);
            return Ok(object);
        }

        let new_owner = object.owner.clone();
        if old_owner != new_owner {
            state.index_remove(&old_owner, &slot);
            state.index_insert(&new_owner, slot.clone());
        }
        state.objects.insert(slot, object.clone());
        Ok(object)
    }

    async fn delete(&self, kind: Kind, key: &ResourceKey) -> StoreResult<()> {
        let slot = (kind, key.clone());
        let mut state = self.state.write();

        let guarded = state
            .objects
            .get(&slot)
            .map(|stored| !stored.meta.finalizers.is_empty())
            .ok_or_else(|| StoreError::NotFound {
                kind,
                key: key.clone(),
            })?;

        if !guarded {
            state.remove(&slot);
            return Ok(());
        }

        // Guarded: mark once and wait for the guards to drain.
        if let Some(stored) = state.objects.get_mut(&slot) {
            if stored.meta.deletion_requested_at.is_none() {
                stored.meta.deletion_requested_at = Some(Utc::now());
                stored.meta.resource_version += 1;
            }
        }
        Ok(())
    }

    async fn list(&self, kind: Kind, filter: &ListFilter) -> StoreResult<Vec<Object>> {
        let state = self.state.read();

        let mut results: Vec<Object> = match &filter.owner {
            Some(owner) => state
                .owner_index
                .get(owner)
                .into_iter()
                .flatten()
                .filter(|(k, _)| *k == kind)
                .filter_map(|slot| state.objects.get(slot))
                .cloned()
                .collect(),
            None => state
                .objects
                .iter()
                .filter(|((k, _), _)| *k == kind)
                .map(|(_, object)| object.clone())
                .collect(),
        };

        if let Some(namespace) = &filter.namespace {
            results.retain(|object| &object.meta.namespace == namespace);
        }
        results.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(results)
    }
}
