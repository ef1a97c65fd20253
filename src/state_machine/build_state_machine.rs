//! # Build State Machine
//!
//! Drives a build from acceptance to a terminal phase through its engine.
//! Every pass is level-triggered: the machine re-validates the spec,
//! re-ensures prerequisites, and re-submits the run before acting on the
//! observed run phase, so a re-delivered or duplicated reconcile converges
//! instead of repeating side effects.
//!
//! ## Key Features
//!
//! - **Idempotent progression**: prerequisites and submission tolerate
//!   already-present results from earlier passes
//! - **Forward-only phases**: observed regressions never roll the recorded
//!   phase back
//! - **Terminal error reporting**: configuration mistakes fail the build
//!   with a reason instead of retrying forever

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::reasons;
use crate::engine::{
    BuildArtifacts, EngineError, EnginePhase, EngineRegistry, ExecutionError, Submission,
};
use crate::error::{ErrorClass, KilnError};
use crate::models::{Build, Condition, ConditionType, Workload, WorkloadManifest};
use crate::orchestration::types::Verdict;
use crate::store::Store;

use super::phases::BuildPhase;

/// Reconciles one build per call against its engine.
pub struct BuildStateMachine {
    store: Store,
    engines: Arc<EngineRegistry>,
    /// Delay between run status polls while the run executes.
    poll_interval: Duration,
}

impl BuildStateMachine {
    pub fn new(store: Store, engines: Arc<EngineRegistry>, poll_interval: Duration) -> Self {
        Self {
            store,
            engines,
            poll_interval,
        }
    }

    /// Advance the build one step and report how to follow up.
    ///
    /// The caller persists the mutated build; this method only computes
    /// the new status and performs engine side effects.
    pub async fn advance(&self, build: &mut Build) -> Result<Verdict, KilnError> {
        if build.status.phase.is_terminal() {
            debug!(build = %build.meta.key(), phase = %build.status.phase, "Build already terminal");
            return Ok(Verdict::Done);
        }

        if let Err(reason) = build.spec.validate() {
            fail_build(build, reasons::build::INVALID_SPEC, &reason);
            return Ok(Verdict::Done);
        }

        set_condition(
            build,
            ConditionType::Initiated,
            reasons::build::ACCEPTED,
            "Build request accepted",
        );

        let engine = match self.engines.resolve(build.spec.engine.as_deref()) {
            Ok(engine) => engine,
            Err(e @ EngineError::EngineNotFound { .. }) => {
                fail_build(build, reasons::build::ENGINE_NOT_FOUND, &e.to_string());
                return Ok(Verdict::Done);
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = engine.ensure_prerequisites(build).await {
            return self.handle_engine_error(build, e);
        }
        advance_phase(build, BuildPhase::PrerequisitesReady);

        let submission = match engine.submit(build).await {
            Ok(submission) => submission,
            Err(e) => return self.handle_engine_error(build, e),
        };
        // The run exists on the plane either way; adopted submissions from
        // an earlier pass count the same as fresh ones.
        self.record_submission(build, &submission);
        advance_phase(build, BuildPhase::Submitted);

        if submission.created {
            return Ok(Verdict::RetryNow);
        }

        let status = match engine.status(build).await {
            Ok(status) => status,
            Err(e) => return self.handle_engine_error(build, e),
        };

        match status.phase {
            EnginePhase::Running => {
                set_condition(
                    build,
                    ConditionType::InProgress,
                    reasons::build::RUN_EXECUTING,
                    &status.message,
                );
                advance_phase(build, BuildPhase::Running);
                Ok(Verdict::RetryAfter(self.poll_interval))
            }
            EnginePhase::Succeeded => {
                let artifacts = match engine.extract_artifacts(build).await {
                    Ok(artifacts) => artifacts,
                    Err(e) => return self.handle_engine_error(build, e),
                };
                self.complete_build(build, artifacts).await
            }
            EnginePhase::Failed => {
                fail_build(build, reasons::build::RUN_FAILED, &status.message);
                Ok(Verdict::Done)
            }
            EnginePhase::Unknown => {
                debug!(
                    build = %build.meta.key(),
                    "Run phase not yet known, polling again"
                );
                Ok(Verdict::RetryAfter(self.poll_interval))
            }
        }
    }

    fn record_submission(&self, build: &mut Build, submission: &Submission) {
        let message = if submission.created {
            format!("Run {} submitted", submission.run_id)
        } else {
            format!("Run {} already submitted", submission.run_id)
        };
        set_condition(
            build,
            ConditionType::Triggered,
            reasons::build::RUN_TRIGGERED,
            &message,
        );
    }

    /// Publish the run's artifacts and close the build out.
    async fn complete_build(
        &self,
        build: &mut Build,
        artifacts: BuildArtifacts,
    ) -> Result<Verdict, KilnError> {
        if let Some(image) = &artifacts.image {
            build.status.image = Some(image.clone());
        }

        if let Some(raw_manifest) = &artifacts.manifest {
            let manifest = match WorkloadManifest::parse(raw_manifest) {
                Ok(manifest) => manifest,
                Err(e) => {
                    fail_build(
                        build,
                        reasons::build::MANIFEST_INVALID,
                        &format!("Exported workload manifest rejected: {e}"),
                    );
                    return Ok(Verdict::Done);
                }
            };
            let image = artifacts.image.clone().unwrap_or_default();
            let workload = Workload::from_manifest(
                &build.meta.namespace,
                &build.meta.name,
                build.spec.owner.clone(),
                image,
                &manifest,
            );
            self.store.ensure(&workload).await?;
            info!(
                build = %build.meta.key(),
                workload = %workload.meta.key(),
                "Workload materialized from build manifest"
            );
        }

        set_condition(
            build,
            ConditionType::Completed,
            reasons::build::RUN_SUCCEEDED,
            "Build run succeeded",
        );
        advance_phase(build, BuildPhase::Succeeded);
        info!(
            build = %build.meta.key(),
            image = build.status.image.as_deref().unwrap_or("<none>"),
            "✅ Build succeeded"
        );
        Ok(Verdict::Done)
    }

    /// Terminal engine errors fail the build in place; transient ones
    /// bubble up for the driver to retry.
    fn handle_engine_error(
        &self,
        build: &mut Build,
        error: EngineError,
    ) -> Result<Verdict, KilnError> {
        match error.class() {
            ErrorClass::Terminal => {
                fail_build(build, terminal_reason(&error), &error.to_string());
                Ok(Verdict::Done)
            }
            ErrorClass::Transient => Err(error.into()),
        }
    }
}

/// Reason catalog entry for a terminal engine error.
fn terminal_reason(error: &EngineError) -> &'static str {
    match error {
        EngineError::EngineNotFound { .. } => reasons::build::ENGINE_NOT_FOUND,
        EngineError::InvalidSpec { .. } => reasons::build::INVALID_SPEC,
        EngineError::Execution(ExecutionError::PlaneNotFound { .. }) => {
            reasons::build::PLANE_NOT_FOUND
        }
        _ => reasons::build::RUN_FAILED,
    }
}

fn set_condition(build: &mut Build, condition_type: ConditionType, reason: &str, message: &str) {
    build
        .status
        .conditions
        .set(Condition::observed(condition_type, &build.meta, reason, message));
}

/// Move the recorded phase forward, never backward.
fn advance_phase(build: &mut Build, next: BuildPhase) {
    let current = build.status.phase;
    if current == next || !current.can_advance_to(next) {
        return;
    }
    debug!(build = %build.meta.key(), from = %current, to = %next, "Build phase advanced");
    build.status.phase = next;
}

/// Record a permanent failure with its reason.
fn fail_build(build: &mut Build, reason: &str, message: &str) {
    warn!(build = %build.meta.key(), reason = %reason, message = %message, "Build failed");
    set_condition(build, ConditionType::Failed, reason, message);
    advance_phase(build, BuildPhase::Failed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BuildSpec, ObjectMeta, OwnerRef, RepositoryRef};

    fn build() -> Build {
        Build::new(
            ObjectMeta::named("team-a", "frontend-v1"),
            BuildSpec {
                engine: None,
                template: "buildpack".to_string(),
                owner: OwnerRef::new("shop", "frontend"),
                repository: RepositoryRef::new("https://git.example.com/shop/app.git", "main"),
            },
        )
    }

    #[test]
    fn test_fail_build_records_reason_and_phase() {
        let mut b = build();
        fail_build(&mut b, reasons::build::INVALID_SPEC, "template must not be empty");

        assert_eq!(b.status.phase, BuildPhase::Failed);
        let condition = b.status.conditions.get(ConditionType::Failed).unwrap();
        assert_eq!(condition.reason, reasons::build::INVALID_SPEC);
        assert!(condition.status);
    }

    #[test]
    fn test_advance_phase_never_regresses() {
        let mut b = build();
        advance_phase(&mut b, BuildPhase::Running);
        advance_phase(&mut b, BuildPhase::Submitted);
        assert_eq!(b.status.phase, BuildPhase::Running);
    }

    #[test]
    fn test_terminal_reason_mapping() {
        assert_eq!(
            terminal_reason(&EngineError::EngineNotFound {
                id: "kaniko".to_string()
            }),
            reasons::build::ENGINE_NOT_FOUND
        );
        assert_eq!(
            terminal_reason(&EngineError::Execution(ExecutionError::PlaneNotFound {
                workspace: "shop-builds".to_string()
            })),
            reasons::build::PLANE_NOT_FOUND
        );
        assert_eq!(
            terminal_reason(&EngineError::InvalidSpec {
                reason: "empty".to_string()
            }),
            reasons::build::INVALID_SPEC
        );
    }
}
