//! # Object Store
//!
//! Persistence seam for the reconciliation core. The store speaks a
//! dynamic [`Object`] envelope so one implementation serves every entity
//! kind; the [`Store`] facade layers typed access on top for reconcilers
//! that know what they are reading.
//!
//! ## Key Features
//!
//! - **Optimistic concurrency**: updates carry the resource version they
//!   were read at; a stale version fails with [`StoreError::Conflict`]
//! - **Owner-keyed index**: dependents are listable by owning component
//!   without scanning a namespace
//! - **Finalizer-aware deletion**: deleting a guarded object marks it and
//!   defers physical removal until its guard list drains

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::models::{Kind, ObjectMeta, Resource, ResourceKey};

pub mod ensure;
pub mod memory;

pub use memory::MemoryStore;

/// Errors surfaced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {key} not found")]
    NotFound { kind: Kind, key: ResourceKey },

    #[error("{kind} {key} already exists")]
    AlreadyExists { kind: Kind, key: ResourceKey },

    #[error("{kind} {key} was modified concurrently")]
    Conflict { kind: Kind, key: ResourceKey },

    #[error("Failed to encode or decode {kind} payload: {source}")]
    Codec {
        kind: Kind,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, StoreError::AlreadyExists { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Constraints applied to a list operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub namespace: Option<String>,
    pub owner: Option<ResourceKey>,
}

impl ListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn in_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            owner: None,
        }
    }

    /// Restrict to objects owned by the given component key.
    pub fn owned_by(owner: ResourceKey) -> Self {
        Self {
            namespace: Some(owner.namespace.clone()),
            owner: Some(owner),
        }
    }
}

/// Dynamic envelope the raw store persists.
///
/// The typed model round-trips through `payload`; `meta` and `owner` are
/// lifted out of the payload so the store can manage lifecycle fields and
/// maintain the owner index without understanding entity schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub kind: Kind,
    pub meta: ObjectMeta,
    pub owner: Option<ResourceKey>,
    pub payload: Value,
}

impl Object {
    pub fn from_resource<R: Resource>(resource: &R) -> StoreResult<Self> {
        let payload = serde_json::to_value(resource).map_err(|source| StoreError::Codec {
            kind: R::KIND,
            source,
        })?;
        Ok(Self {
            kind: R::KIND,
            meta: resource.meta().clone(),
            owner: resource.owner(),
            payload,
        })
    }

    /// Decode the payload back into its typed model, with the envelope's
    /// store-managed metadata taking precedence over whatever the payload
    /// was serialized with.
    pub fn into_resource<R: Resource>(self) -> StoreResult<R> {
        let kind = self.kind;
        let mut resource: R =
            serde_json::from_value(self.payload).map_err(|source| StoreError::Codec {
                kind,
                source,
            })?;
        *resource.meta_mut() = self.meta;
        Ok(resource)
    }

    pub fn key(&self) -> ResourceKey {
        self.meta.key()
    }
}

/// Object-safe persistence contract.
///
/// Implementations assign uid, created_at, and resource versions; enforce
/// create/update preconditions; and keep the owner index consistent with
/// the objects' owner references.
#[async_trait]
pub trait RawStore: Send + Sync {
    async fn get(&self, kind: Kind, key: &ResourceKey) -> StoreResult<Object>;

    /// Persist a new object. Fails with [`StoreError::AlreadyExists`] when
    /// the (kind, key) slot is taken.
    async fn create(&self, object: Object) -> StoreResult<Object>;

    /// Replace an existing object. The incoming resource version must
    /// match the stored one or the write fails with
    /// [`StoreError::Conflict`].
    async fn update(&self, object: Object) -> StoreResult<Object>;

    /// Request deletion. Unguarded objects are removed immediately;
    /// guarded objects are marked and removed when the last guard drops.
    async fn delete(&self, kind: Kind, key: &ResourceKey) -> StoreResult<()>;

    async fn list(&self, kind: Kind, filter: &ListFilter) -> StoreResult<Vec<Object>>;
}

/// Cloneable typed facade over a [`RawStore`].
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn RawStore>,
}

impl Store {
    pub fn new(inner: Arc<dyn RawStore>) -> Self {
        Self { inner }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub async fn get<R: Resource>(&self, key: &ResourceKey) -> StoreResult<R> {
        self.inner.get(R::KIND, key).await?.into_resource()
    }

    pub async fn create<R: Resource>(&self, resource: &R) -> StoreResult<R> {
        let object = Object::from_resource(resource)?;
        self.inner.create(object).await?.into_resource()
    }

    pub async fn update<R: Resource>(&self, resource: &R) -> StoreResult<R> {
        let object = Object::from_resource(resource)?;
        self.inner.update(object).await?.into_resource()
    }

    /// Request deletion of an object. Absent objects are treated as
    /// already deleted.
    pub async fn delete(&self, kind: Kind, key: &ResourceKey) -> StoreResult<()> {
        match self.inner.delete(kind, key).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn list<R: Resource>(&self, filter: &ListFilter) -> StoreResult<Vec<R>> {
        let objects = self.inner.list(R::KIND, filter).await?;
        objects.into_iter().map(Object::into_resource).collect()
    }

    /// List raw objects of a kind owned by the given component key.
    pub async fn list_owned(&self, kind: Kind, owner: &ResourceKey) -> StoreResult<Vec<Object>> {
        self.inner
            .list(kind, &ListFilter::owned_by(owner.clone()))
            .await
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
