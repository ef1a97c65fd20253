//! # Execution-Plane Entities
//!
//! Prerequisites a build run needs on the execution plane: a project-scoped
//! workspace to run in, a runner identity to execute as, and a result grant
//! that scopes the identity down to reporting run results. All three are
//! ensured idempotently before every submission.

use serde::{Deserialize, Serialize};

use super::meta::{Kind, ObjectMeta, OwnerRef, Resource, ResourceKey};

/// Execution namespace shared by all builds of a project.
///
/// Workspaces are project-scoped rather than component-owned, so component
/// deletion leaves them in place for the project's other components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub meta: ObjectMeta,
    pub spec: WorkspaceSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    pub project: String,
}

impl Workspace {
    /// Workspace name shared by a project's builds.
    pub fn name_for_project(project: &str) -> String {
        format!("{project}-builds")
    }

    pub fn for_project(namespace: &str, project: &str) -> Self {
        Self {
            meta: ObjectMeta::named(namespace, Self::name_for_project(project)),
            spec: WorkspaceSpec {
                project: project.to_string(),
            },
        }
    }
}

impl Resource for Workspace {
    const KIND: Kind = Kind::Workspace;

    fn meta(&self) -> &ObjectMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.meta
    }
}

/// Identity a component's build runs execute as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerIdentity {
    pub meta: ObjectMeta,
    pub spec: RunnerIdentitySpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerIdentitySpec {
    pub owner: OwnerRef,
}

impl RunnerIdentity {
    pub fn name_for_component(component: &str) -> String {
        format!("{component}-runner")
    }

    pub fn for_owner(namespace: &str, owner: OwnerRef) -> Self {
        Self {
            meta: ObjectMeta::named(namespace, Self::name_for_component(&owner.component)),
            spec: RunnerIdentitySpec { owner },
        }
    }
}

impl Resource for RunnerIdentity {
    const KIND: Kind = Kind::RunnerIdentity;

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

/// Grant restricting a runner identity to result reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultGrant {
    pub meta: ObjectMeta,
    pub spec: ResultGrantSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultGrantSpec {
    pub owner: OwnerRef,
    /// Role granted; always the result-writer role in this core.
    pub role: String,
    /// Identity the grant applies to.
    pub identity: String,
}

impl ResultGrant {
    pub const RESULT_WRITER_ROLE: &'static str = "result-writer";

    pub fn name_for_component(component: &str) -> String {
        format!("{component}-runner-results")
    }

    /// Grant scoping the component's runner identity to result writes.
    pub fn for_runner(namespace: &str, owner: OwnerRef) -> Self {
        let identity = RunnerIdentity::name_for_component(&owner.component);
        Self {
            meta: ObjectMeta::named(namespace, Self::name_for_component(&owner.component)),
            spec: ResultGrantSpec {
                owner,
                role: Self::RESULT_WRITER_ROLE.to_string(),
                identity,
            },
        }
    }
}

impl Resource for ResultGrant {
    const KIND: Kind = Kind::ResultGrant;

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
