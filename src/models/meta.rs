//! # Object Identity and Metadata
//!
//! Identity, ownership, and lifecycle metadata shared by every entity the
//! reconciliation core manages. `ObjectMeta` carries the store-managed
//! fields (uid, resource version, deletion marker, cleanup guards) while
//! typed specs and statuses live on the individual models.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kinds of objects the backing store manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Build request driven through an external execution system.
    Build,
    /// Deployable parent entity owning builds and their products.
    Component,
    /// Materialized workload produced from a successful build.
    Workload,
    /// Project-scoped execution namespace provisioned for runs.
    Workspace,
    /// Execution identity a run executes as.
    RunnerIdentity,
    /// Grant scoping an identity to result reporting only.
    ResultGrant,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Build => "build",
            Kind::Component => "component",
            Kind::Workload => "workload",
            Kind::Workspace => "workspace",
            Kind::RunnerIdentity => "runner_identity",
            Kind::ResultGrant => "result_grant",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "build" => Ok(Kind::Build),
            "component" => Ok(Kind::Component),
            "workload" => Ok(Kind::Workload),
            "workspace" => Ok(Kind::Workspace),
            "runner_identity" => Ok(Kind::RunnerIdentity),
            "result_grant" => Ok(Kind::ResultGrant),
            _ => Err(format!("Invalid kind: {s}")),
        }
    }
}

/// Namespace-scoped identity of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Logical owner reference recorded on a dependent's spec.
///
/// Dependents name their owning component; owner-keyed lookups resolve
/// against the (namespace, component) pair, never against a cached
/// relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerRef {
    pub project: String,
    pub component: String,
}

impl OwnerRef {
    pub fn new(project: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            component: component.into(),
        }
    }

    /// Key of the owning component within the given namespace.
    pub fn component_key(&self, namespace: &str) -> ResourceKey {
        ResourceKey::new(namespace, self.component.clone())
    }
}

/// Store-managed lifecycle metadata attached to every object.
///
/// `uid`, `resource_version`, and `created_at` are assigned by the store on
/// create and must not be forged by callers. `deletion_requested_at` is the
/// deletion marker: once set, the object survives only until its cleanup
/// guard list drains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Store-assigned unique identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<Uuid>,
    /// Spec revision observed by conditions; caller-owned.
    pub generation: i64,
    /// Optimistic concurrency token; a stale token rejects the write.
    pub resource_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Deletion marker; set by the store when delete is requested while
    /// cleanup guards remain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletion_requested_at: Option<DateTime<Utc>>,
    /// Cleanup guards blocking physical removal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
}

impl ObjectMeta {
    pub fn named(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            uid: None,
            generation: 1,
            resource_version: 0,
            created_at: None,
            deletion_requested_at: None,
            finalizers: Vec::new(),
        }
    }

    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Whether deletion has been requested for this object.
    pub fn is_deleting(&self) -> bool {
        self.deletion_requested_at.is_some()
    }

    pub fn has_finalizer(&self, name: &str) -> bool {
        self.finalizers.iter().any(|f| f == name)
    }

    /// Attach a cleanup guard; returns true when the guard was newly added.
    pub fn add_finalizer(&mut self, name: &str) -> bool {
        if self.has_finalizer(name) {
            return false;
        }
        self.finalizers.push(name.to_string());
        true
    }

    /// Remove a cleanup guard; returns true when the guard was present.
    pub fn remove_finalizer(&mut self, name: &str) -> bool {
        let before = self.finalizers.len();
        self.finalizers.retain(|f| f != name);
        self.finalizers.len() != before
    }
}

/// Typed object the store can persist.
///
/// Implementations bridge between the typed model and the dynamic envelope
/// the raw store operates on; `owner()` feeds the owner-keyed secondary
/// index used by cascade deletion.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync + Sized {
    const KIND: Kind;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Key of the logical owner named by this object's spec, if any.
    fn owner(&self) -> Option<ResourceKey> {
        None
    }

    fn key(&self) -> ResourceKey {
        self.meta().key()
    }
}
