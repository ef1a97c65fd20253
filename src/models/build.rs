//! # Build Entity
//!
//! A build request: source repository plus template, owned by a component,
//! driven to a container image (and optionally a workload manifest) by an
//! execution engine. The status block is written only by the reconciler;
//! callers own the spec.

use serde::{Deserialize, Serialize};

use crate::state_machine::phases::BuildPhase;

use super::condition::Conditions;
use super::meta::{Kind, ObjectMeta, OwnerRef, Resource, ResourceKey};

/// Source repository coordinates a build resolves its input from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub url: String,
    /// Branch, tag, or commit to build.
    pub revision: String,
    /// Optional path within the repository holding the buildable source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subpath: Option<String>,
}

impl RepositoryRef {
    pub fn new(url: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            revision: revision.into(),
            subpath: None,
        }
    }
}

/// Caller-owned build request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildSpec {
    /// Engine to execute the build with; the registry default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Engine-side template naming the build recipe.
    pub template: String,
    pub owner: OwnerRef,
    pub repository: RepositoryRef,
}

impl BuildSpec {
    /// Structural validation; failures are terminal until the spec changes.
    pub fn validate(&self) -> Result<(), String> {
        if self.owner.project.trim().is_empty() {
            return Err("owner.project must not be empty".to_string());
        }
        if self.owner.component.trim().is_empty() {
            return Err("owner.component must not be empty".to_string());
        }
        if self.template.trim().is_empty() {
            return Err("template must not be empty".to_string());
        }
        if self.repository.url.trim().is_empty() {
            return Err("repository.url must not be empty".to_string());
        }
        Ok(())
    }
}

/// Reconciler-owned build status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildStatus {
    #[serde(default)]
    pub conditions: Conditions,
    #[serde(default)]
    pub phase: BuildPhase,
    /// Image reference published by a succeeded run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub meta: ObjectMeta,
    pub spec: BuildSpec,
    #[serde(default)]
    pub status: BuildStatus,
}

impl Build {
    pub fn new(meta: ObjectMeta, spec: BuildSpec) -> Self {
        Self {
            meta,
            spec,
            status: BuildStatus::default(),
        }
    }
}

impl Resource for Build {
    const KIND: Kind = Kind::Build;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }

    fn owner(&self) -> Option<ResourceKey> {
        Some(self.spec.owner.component_key(&self.meta.namespace))
    }
}
