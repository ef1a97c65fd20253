//! # Workflow Engine
//!
//! The build engine shipped with this core. Builds become workflow runs on
//! the external execution plane: the engine provisions the run's workspace,
//! identity, and result grant, submits a deterministically named run, and
//! reads the image and manifest the run's export step publishes.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::constants::{engine::DEFAULT_ENGINE, params, steps};
use crate::models::{Build, ResultGrant, RunnerIdentity, Workspace};
use crate::store::Store;

use super::execution::{run_name, ExecutionClient, ExecutionError, RunParameter, RunSpec};
use super::{BuildArtifacts, BuildEngine, EngineError, EngineStatus, Submission};

/// Build engine backed by workflow runs on the execution plane.
pub struct WorkflowEngine {
    store: Store,
    runs: Arc<dyn ExecutionClient>,
}

impl WorkflowEngine {
    pub fn new(store: Store, runs: Arc<dyn ExecutionClient>) -> Self {
        Self { store, runs }
    }

    fn run_spec(&self, build: &Build) -> RunSpec {
        let owner = &build.spec.owner;
        let mut parameters = vec![
            RunParameter::new(params::REPO_URL, build.spec.repository.url.clone()),
            RunParameter::new(params::REPO_REVISION, build.spec.repository.revision.clone()),
        ];
        if let Some(subpath) = &build.spec.repository.subpath {
            parameters.push(RunParameter::new(params::REPO_SUBPATH, subpath.clone()));
        }

        RunSpec {
            name: run_name(build),
            workspace: Workspace::name_for_project(&owner.project),
            template: build.spec.template.clone(),
            identity: RunnerIdentity::name_for_component(&owner.component),
            parameters,
        }
    }
}

#[async_trait]
impl BuildEngine for WorkflowEngine {
    fn name(&self) -> &str {
        DEFAULT_ENGINE
    }

    /// Ensure the workspace, runner identity, and result grant the run
    /// needs. Each is create-if-absent, so concurrent builds of the same
    /// component converge on shared prerequisites.
    async fn ensure_prerequisites(&self, build: &Build) -> Result<(), EngineError> {
        let namespace = &build.meta.namespace;
        let owner = build.spec.owner.clone();

        self.store
            .ensure(&Workspace::for_project(namespace, &owner.project))
            .await?;
        self.store
            .ensure(&RunnerIdentity::for_owner(namespace, owner.clone()))
            .await?;
        self.store
            .ensure(&ResultGrant::for_runner(namespace, owner))
            .await?;

        debug!(
            build = %build.meta.key(),
            project = %build.spec.owner.project,
            component = %build.spec.owner.component,
            "Execution prerequisites ensured"
        );
        Ok(())
    }

    /// Submit the build's run. A run that already exists under the
    /// deterministic name is an earlier pass's submission, not a failure.
    async fn submit(&self, build: &Build) -> Result<Submission, EngineError> {
        let spec = self.run_spec(build);

        match self.runs.submit(spec).await {
            Ok(run_id) => {
                info!(build = %build.meta.key(), run_id = %run_id, "Submitted build run");
                Ok(Submission {
                    run_id,
                    created: true,
                })
            }
            Err(ExecutionError::AlreadyExists { run }) => {
                debug!(build = %build.meta.key(), run_id = %run, "Build run already submitted");
                Ok(Submission {
                    run_id: run,
                    created: false,
                })
            }
            Err(e) => Err(EngineError::Execution(e)),
        }
    }

    async fn status(&self, build: &Build) -> Result<EngineStatus, EngineError> {
        let (phase, message) = self.runs.get_status(&run_name(build)).await?;
        Ok(EngineStatus {
            phase: phase.into(),
            message,
        })
    }

    /// Read the export step's outputs. Missing parameters produce a
    /// partial result; a run may legitimately export an image without a
    /// manifest.
    async fn extract_artifacts(&self, build: &Build) -> Result<BuildArtifacts, EngineError> {
        let outputs = self.runs.get_outputs(&run_name(build), steps::EXPORT).await?;

        let mut artifacts = BuildArtifacts::default();
        for output in outputs {
            match output.name.as_str() {
                params::IMAGE_URL => artifacts.image = Some(output.value),
                params::WORKLOAD_MANIFEST => artifacts.manifest = Some(output.value),
                _ => {}
            }
        }
        Ok(artifacts)
    }
}
