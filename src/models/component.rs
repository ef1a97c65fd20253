//! # Component Entity
//!
//! The deployable parent in the ownership graph. Builds, workloads, runner
//! identities, and result grants all name a component as their owner; when
//! a component is deleted the cascade coordinator drains those dependents
//! before the component itself is removed.

use serde::{Deserialize, Serialize};

use super::condition::Conditions;
use super::meta::{Kind, ObjectMeta, Resource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSpec {
    /// Project this component belongs to.
    pub project: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub meta: ObjectMeta,
    pub spec: ComponentSpec,
    #[serde(default)]
    pub status: ComponentStatus,
}

impl Component {
    /// Kinds swept during cascade deletion, in deletion order.
    ///
    /// Workspaces are project-scoped and shared across components, so they
    /// are never part of a component's cascade.
    pub const DEPENDENT_KINDS: &'static [Kind] = &[
        Kind::Build,
        Kind::Workload,
        Kind::RunnerIdentity,
        Kind::ResultGrant,
    ];

    pub fn new(meta: ObjectMeta, spec: ComponentSpec) -> Self {
        Self {
            meta,
            spec,
            status: ComponentStatus::default(),
        }
    }
}

impl Resource for Component {
    const KIND: Kind = Kind::Component;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }
}
