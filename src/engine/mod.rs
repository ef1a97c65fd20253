//! # Build Engines
//!
//! Pluggable build-execution strategies behind one trait. The state
//! machine drives builds purely through [`BuildEngine`]; which external
//! system does the building is a registry lookup away.
//!
//! ## Module Organization
//!
//! - [`execution`]: client contract against the external execution plane
//! - [`registry`]: engine lookup by identifier with a default fallback
//! - [`workflow_engine`]: the workflow-run engine shipped with this core

use async_trait::async_trait;

use crate::error::ErrorClass;
use crate::models::Build;
use crate::store::StoreError;

pub mod execution;
pub mod registry;
pub mod workflow_engine;

pub use execution::{ExecutionClient, ExecutionError, RunParameter, RunPhase, RunSpec};
pub use registry::EngineRegistry;
pub use workflow_engine::WorkflowEngine;

/// Engine-level view of a run's progress.
///
/// Collapses plane-specific phase vocabularies into the four outcomes the
/// state machine acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl From<RunPhase> for EnginePhase {
    fn from(phase: RunPhase) -> Self {
        match phase {
            RunPhase::Running => EnginePhase::Running,
            RunPhase::Succeeded => EnginePhase::Succeeded,
            RunPhase::Failed | RunPhase::Error => EnginePhase::Failed,
            RunPhase::Unknown => EnginePhase::Unknown,
        }
    }
}

/// Phase plus the plane's human-readable progress message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub phase: EnginePhase,
    pub message: String,
}

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Plane-side run identifier.
    pub run_id: String,
    /// False when an earlier pass already submitted this run.
    pub created: bool,
}

/// Products extracted from a succeeded run.
///
/// Both fields are optional; a run that exports nothing still counts as
/// succeeded, it just produces no image or workload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildArtifacts {
    pub image: Option<String>,
    /// Raw workload manifest blob, parsed downstream.
    pub manifest: Option<String>,
}

/// Errors surfaced by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No build engine registered under id '{id}'")]
    EngineNotFound { id: String },

    #[error("Build spec rejected: {reason}")]
    InvalidSpec { reason: String },

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Terminal errors fail the build permanently; transient errors leave
    /// it queued for another pass.
    pub fn class(&self) -> ErrorClass {
        match self {
            EngineError::EngineNotFound { .. } | EngineError::InvalidSpec { .. } => {
                ErrorClass::Terminal
            }
            EngineError::Execution(e) => {
                if e.is_transient() {
                    ErrorClass::Transient
                } else {
                    ErrorClass::Terminal
                }
            }
            EngineError::Store(e) => match e {
                StoreError::Codec { .. } => ErrorClass::Terminal,
                _ => ErrorClass::Transient,
            },
        }
    }
}

/// A build-execution strategy.
///
/// Implementations are stateless with respect to individual builds: every
/// method may be called repeatedly for the same build and must converge
/// rather than duplicate work.
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Registry identifier builds select this engine by.
    fn name(&self) -> &str;

    /// Materialize whatever the engine needs before a run can be
    /// submitted. Safe to call on every pass.
    async fn ensure_prerequisites(&self, build: &Build) -> Result<(), EngineError>;

    /// Submit the build's run, tolerating a run that already exists.
    async fn submit(&self, build: &Build) -> Result<Submission, EngineError>;

    /// Observed progress of the build's run.
    async fn status(&self, build: &Build) -> Result<EngineStatus, EngineError>;

    /// Collect the products of a succeeded run.
    async fn extract_artifacts(&self, build: &Build) -> Result<BuildArtifacts, EngineError>;
}

impl std::fmt::Debug for dyn BuildEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildEngine")
            .field("name", &self.name())
            .finish()
    }
}
