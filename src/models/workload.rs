//! # Workload Entity
//!
//! Deployment product materialized from a succeeded build. The build's run
//! may export a workload manifest blob; the reconciler parses it, combines
//! it with the built image, and ensures a workload named after the build.

use serde::{Deserialize, Serialize};

use super::condition::Conditions;
use super::meta::{Kind, ObjectMeta, OwnerRef, Resource, ResourceKey};

/// Environment variable entry carried through from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

/// Manifest blob exported by a build run.
///
/// Parsed strictly: unknown fields reject the manifest rather than being
/// silently dropped, since a typo here would otherwise deploy a workload
/// missing half its intended configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadManifest {
    /// Image override; the build's published image when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

fn default_replicas() -> u32 {
    1
}

impl WorkloadManifest {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    pub owner: OwnerRef,
    pub image: String,
    pub replicas: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadStatus {
    #[serde(default)]
    pub conditions: Conditions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub meta: ObjectMeta,
    pub spec: WorkloadSpec,
    #[serde(default)]
    pub status: WorkloadStatus,
}

impl Workload {
    /// Build a workload from a parsed manifest and the image the run
    /// published. The workload inherits the build's name so repeated
    /// reconcile passes converge on one object.
    pub fn from_manifest(
        namespace: &str,
        build_name: &str,
        owner: OwnerRef,
        image: String,
        manifest: &WorkloadManifest,
    ) -> Self {
        let image = manifest.image.clone().unwrap_or(image);
        Self {
            meta: ObjectMeta::named(namespace, build_name),
            spec: WorkloadSpec {
                owner,
                image,
                replicas: manifest.replicas,
                env: manifest.env.clone(),
            },
            status: WorkloadStatus::default(),
        }
    }
}

impl Resource for Workload {
    const KIND: Kind = Kind::Workload;

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
