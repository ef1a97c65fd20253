//! Shared test infrastructure: a scriptable execution-plane fake, entity
//! builders, and pre-wired drivers.

#![allow(dead_code)]

pub mod strategies;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use kiln_core::config::KilnConfig;
use kiln_core::engine::{
    EngineRegistry, ExecutionClient, ExecutionError, RunParameter, RunPhase, RunSpec,
    WorkflowEngine,
};
use kiln_core::models::{
    Build, BuildSpec, Component, ComponentSpec, Kind, ObjectMeta, OwnerRef, RepositoryRef,
    ResourceKey,
};
use kiln_core::orchestration::{BuildController, ComponentFinalizer, Driver, DriverConfig};
use kiln_core::store::{ListFilter, MemoryStore, Object, RawStore, Store, StoreResult};

/// Failure the fake can be scripted to return from submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFailure {
    PlaneNotFound,
    Unavailable,
}

#[derive(Default)]
struct FakeState {
    /// Scripted (phase, message) per run name.
    phases: HashMap<String, (RunPhase, String)>,
    /// Scripted export-step outputs per run name.
    outputs: HashMap<String, Vec<RunParameter>>,
    /// Runs that exist on the plane.
    existing: HashSet<String>,
    /// Every submit call, accepted or not.
    submit_attempts: Vec<RunSpec>,
    /// Steps outputs were requested for.
    output_steps: Vec<String>,
    submit_failure: Option<SubmitFailure>,
    submit_delay: Option<Duration>,
}

/// Execution-plane fake that records interactions and replays scripted
/// phases and outputs.
#[derive(Clone, Default)]
pub struct FakeExecutionClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakeExecutionClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_run_phase(self, run: &str, phase: RunPhase, message: &str) -> Self {
        self.set_run_phase(run, phase, message);
        self
    }

    pub fn with_outputs(self, run: &str, outputs: Vec<RunParameter>) -> Self {
        self.state.lock().outputs.insert(run.to_string(), outputs);
        self
    }

    pub fn with_existing_run(self, run: &str) -> Self {
        self.state.lock().existing.insert(run.to_string());
        self
    }

    pub fn with_submit_failure(self, failure: SubmitFailure) -> Self {
        self.state.lock().submit_failure = Some(failure);
        self
    }

    pub fn with_submit_delay(self, delay: Duration) -> Self {
        self.state.lock().submit_delay = Some(delay);
        self
    }

    /// Re-script a run's phase mid-test, simulating plane-side progress.
    pub fn set_run_phase(&self, run: &str, phase: RunPhase, message: &str) {
        self.state
            .lock()
            .phases
            .insert(run.to_string(), (phase, message.to_string()));
    }

    pub fn clear_submit_failure(&self) {
        self.state.lock().submit_failure = None;
    }

    pub fn submit_attempts(&self) -> Vec<RunSpec> {
        self.state.lock().submit_attempts.clone()
    }

    pub fn created_runs(&self) -> Vec<String> {
        let mut runs: Vec<String> = self.state.lock().existing.iter().cloned().collect();
        runs.sort();
        runs
    }

    pub fn output_steps(&self) -> Vec<String> {
        self.state.lock().output_steps.clone()
    }
}

#[async_trait]
impl ExecutionClient for FakeExecutionClient {
    async fn submit(&self, spec: RunSpec) -> Result<String, ExecutionError> {
        let delay = self.state.lock().submit_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        state.submit_attempts.push(spec.clone());

        match state.submit_failure {
            Some(SubmitFailure::PlaneNotFound) => {
                return Err(ExecutionError::PlaneNotFound {
                    workspace: spec.workspace,
                });
            }
            Some(SubmitFailure::Unavailable) => {
                return Err(ExecutionError::Unavailable {
                    reason: "scripted outage".to_string(),
                });
            }
            None => {}
        }

        if !state.existing.insert(spec.name.clone()) {
            return Err(ExecutionError::AlreadyExists { run: spec.name });
        }
        Ok(spec.name)
    }

    async fn get_status(&self, run: &str) -> Result<(RunPhase, String), ExecutionError> {
        let state = self.state.lock();
        if !state.existing.contains(run) {
            return Err(ExecutionError::NotFound {
                run: run.to_string(),
            });
        }
        Ok(state
            .phases
            .get(run)
            .cloned()
            .unwrap_or((RunPhase::Unknown, String::new())))
    }

    async fn get_outputs(
        &self,
        run: &str,
        step: &str,
    ) -> Result<Vec<RunParameter>, ExecutionError> {
        let mut state = self.state.lock();
        state.output_steps.push(step.to_string());
        if !state.existing.contains(run) {
            return Err(ExecutionError::NotFound {
                run: run.to_string(),
            });
        }
        Ok(state.outputs.get(run).cloned().unwrap_or_default())
    }
}

/// Delete requests observed by a [`CountingStore`], shared with the test.
#[derive(Clone, Default)]
pub struct DeleteLog {
    calls: Arc<Mutex<Vec<(Kind, ResourceKey)>>>,
}

impl DeleteLog {
    pub fn total(&self) -> usize {
        self.calls.lock().len()
    }

    /// Delete requests that targeted the given key.
    pub fn for_key(&self, key: &ResourceKey) -> usize {
        self.calls.lock().iter().filter(|(_, k)| k == key).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, kind: Kind, key: &ResourceKey) {
        self.calls.lock().push((kind, key.clone()));
    }
}

/// In-memory store that records every delete request passing through it.
pub struct CountingStore {
    inner: MemoryStore,
    deletes: DeleteLog,
}

#[async_trait]
impl RawStore for CountingStore {
    async fn get(&self, kind: Kind, key: &ResourceKey) -> StoreResult<Object> {
        self.inner.get(kind, key).await
    }

    async fn create(&self, object: Object) -> StoreResult<Object> {
        self.inner.create(object).await
    }

    async fn update(&self, object: Object) -> StoreResult<Object> {
        self.inner.update(object).await
    }

    async fn delete(&self, kind: Kind, key: &ResourceKey) -> StoreResult<()> {
        self.deletes.record(kind, key);
        self.inner.delete(kind, key).await
    }

    async fn list(&self, kind: Kind, filter: &ListFilter) -> StoreResult<Vec<Object>> {
        self.inner.list(kind, filter).await
    }
}

/// Store whose delete traffic is visible to the test through the returned
/// [`DeleteLog`].
pub fn counting_store() -> (Store, DeleteLog) {
    let deletes = DeleteLog::default();
    let store = Store::new(Arc::new(CountingStore {
        inner: MemoryStore::new(),
        deletes: deletes.clone(),
    }));
    (store, deletes)
}

pub fn build_named(namespace: &str, name: &str, component: &str) -> Build {
    Build::new(
        ObjectMeta::named(namespace, name),
        BuildSpec {
            engine: None,
            template: "buildpack".to_string(),
            owner: OwnerRef::new("shop", component),
            repository: RepositoryRef::new("https://git.example.com/shop/app.git", "main"),
        },
    )
}

pub fn component_named(namespace: &str, name: &str, project: &str) -> Component {
    Component::new(
        ObjectMeta::named(namespace, name),
        ComponentSpec {
            project: project.to_string(),
        },
    )
}

/// Registry holding a workflow engine wired to the given fake plane.
pub fn workflow_registry(store: &Store, client: &FakeExecutionClient) -> Arc<EngineRegistry> {
    let registry = EngineRegistry::new();
    registry.register(Arc::new(WorkflowEngine::new(
        store.clone(),
        Arc::new(client.clone()),
    )));
    Arc::new(registry)
}

/// Build driver with test-sized timings over a fresh workflow registry.
pub fn build_driver(store: &Store, client: &FakeExecutionClient) -> Driver<BuildController> {
    let config = KilnConfig::for_testing();
    let controller = BuildController::new(
        store.clone(),
        workflow_registry(store, client),
        config.run_poll_interval(),
    );
    Driver::new(store.clone(), controller, DriverConfig::for_testing())
}

/// Component driver with test-sized timings.
pub fn component_driver(store: &Store) -> Driver<ComponentFinalizer> {
    let config = KilnConfig::for_testing();
    let finalizer = ComponentFinalizer::new(store.clone(), config.finalizer_retry());
    Driver::new(store.clone(), finalizer, DriverConfig::for_testing())
}
