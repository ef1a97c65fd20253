//! # Execution Plane Client
//!
//! Contract against the external system that actually runs builds. The
//! reconciler only ever submits runs, polls their phase, and reads step
//! outputs; everything else about the execution plane stays behind this
//! trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::system::RUN_NAME_SUFFIX;
use crate::models::Build;

/// Phase reported by the execution plane for a run.
///
/// Parsed tolerantly: phases this core does not know about map to
/// [`RunPhase::Unknown`] instead of failing the reconcile, since execution
/// planes grow phases faster than clients learn them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Running,
    Succeeded,
    Failed,
    Error,
    Unknown,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            RunPhase::Running => "running",
            RunPhase::Succeeded => "succeeded",
            RunPhase::Failed => "failed",
            RunPhase::Error => "error",
            RunPhase::Unknown => "unknown",
        };
        write!(f, "{phase}")
    }
}

impl std::str::FromStr for RunPhase {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "running" => RunPhase::Running,
            "succeeded" => RunPhase::Succeeded,
            "failed" => RunPhase::Failed,
            "error" => RunPhase::Error,
            _ => RunPhase::Unknown,
        })
    }
}

/// Named parameter passed to or read back from a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunParameter {
    pub name: String,
    pub value: String,
}

impl RunParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Submission request for a build run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    /// Deterministic run name; resubmitting the same name is rejected by
    /// the plane with an already-exists error.
    pub name: String,
    /// Workspace the run executes in.
    pub workspace: String,
    /// Template naming the build recipe on the plane.
    pub template: String,
    /// Identity the run executes as.
    pub identity: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<RunParameter>,
}

/// Errors surfaced by execution-plane calls.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Run {run} already exists")]
    AlreadyExists { run: String },

    #[error("Run {run} not found")]
    NotFound { run: String },

    #[error("Workspace {workspace} does not exist on the execution plane")]
    PlaneNotFound { workspace: String },

    #[error("Execution plane unavailable: {reason}")]
    Unavailable { reason: String },
}

impl ExecutionError {
    /// Whether retrying without a spec change can possibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExecutionError::Unavailable { .. } | ExecutionError::NotFound { .. }
        )
    }
}

/// Client against the external execution plane.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Submit a run; returns the plane-side run identifier.
    async fn submit(&self, spec: RunSpec) -> Result<String, ExecutionError>;

    /// Current phase of a run plus a human-readable status message.
    async fn get_status(&self, run: &str) -> Result<(RunPhase, String), ExecutionError>;

    /// Outputs published by a named step of a finished run.
    async fn get_outputs(&self, run: &str, step: &str)
        -> Result<Vec<RunParameter>, ExecutionError>;
}

/// Deterministic run name derived from the build's name.
///
/// Determinism is what turns duplicate submissions into plane-side
/// already-exists rejections instead of duplicate runs.
pub fn run_name(build: &Build) -> String {
    format!("{}{}", build.meta.name, RUN_NAME_SUFFIX)
}
