//! # Entity Models
//!
//! Typed entities managed by the reconciliation core, plus the identity
//! and condition primitives they share. Every entity splits into a
//! caller-owned spec and a reconciler-owned status.
//!
//! ## Module Organization
//!
//! - [`meta`]: kinds, keys, ownership references, lifecycle metadata
//! - [`condition`]: typed status conditions with latest-wins semantics
//! - [`build`]: build requests and their status
//! - [`component`]: the owning parent entity
//! - [`workload`]: deployment products of succeeded builds
//! - [`execution`]: workspace, runner identity, and result grant

pub mod build;
pub mod component;
pub mod condition;
pub mod execution;
pub mod meta;
pub mod workload;

pub use build::{Build, BuildSpec, BuildStatus, RepositoryRef};
pub use component::{Component, ComponentSpec, ComponentStatus};
pub use condition::{Condition, ConditionType, Conditions};
pub use execution::{
    ResultGrant, ResultGrantSpec, RunnerIdentity, RunnerIdentitySpec, Workspace, WorkspaceSpec,
};
pub use meta::{Kind, ObjectMeta, OwnerRef, Resource, ResourceKey};
pub use workload::{EnvVar, Workload, WorkloadManifest, WorkloadSpec, WorkloadStatus};
