//! # System Constants
//!
//! Core constants that define the operational boundaries of the Kiln
//! reconciliation core: cleanup guard names, condition reason catalogs,
//! engine identifiers, and the named run outputs the reference engine
//! extracts artifacts from.
//!
//! Condition reasons are standardized to one vocabulary per entity kind;
//! controllers must not invent reasons outside these catalogs.

/// Cleanup guard (finalizer) identifiers.
pub mod finalizers {
    /// Guard held by the component controller while owned dependents are
    /// being torn down. The backing store completes deletion of a component
    /// only after this guard is removed.
    pub const COMPONENT_CLEANUP: &str = "kiln.dev/component-cleanup";
}

/// Build engine identifiers.
pub mod engine {
    /// Engine used when a build spec does not name one explicitly.
    pub const DEFAULT_ENGINE: &str = "workflow";
}

/// Named execution steps the reference engine inspects.
pub mod steps {
    /// Step whose output parameters carry the produced artifacts.
    pub const EXPORT: &str = "export";
}

/// Named run output parameters produced by the export step.
pub mod params {
    /// Source repository URL handed to the run.
    pub const REPO_URL: &str = "repo-url";

    /// Branch, tag, or commit the run checks out.
    pub const REPO_REVISION: &str = "repo-revision";

    /// Path within the repository holding the buildable source.
    pub const REPO_SUBPATH: &str = "repo-subpath";

    /// Fully qualified reference of the built image.
    pub const IMAGE_URL: &str = "image-url";

    /// Serialized workload manifest used for downstream materialization.
    pub const WORKLOAD_MANIFEST: &str = "workload-manifest";
}

/// Machine-readable condition reasons, one catalog per entity kind.
pub mod reasons {
    /// Reasons recorded on `Build` conditions.
    pub mod build {
        /// Build entity observed for the first time.
        pub const ACCEPTED: &str = "BuildAccepted";

        /// A run was handed to the execution system.
        pub const RUN_TRIGGERED: &str = "RunTriggered";

        /// The execution system reports the run as in flight.
        pub const RUN_EXECUTING: &str = "RunExecuting";

        /// The run finished and artifacts were recorded.
        pub const RUN_SUCCEEDED: &str = "RunSucceeded";

        /// The run finished unsuccessfully.
        pub const RUN_FAILED: &str = "RunFailed";

        /// Spec names an engine identifier with no registered implementation.
        pub const ENGINE_NOT_FOUND: &str = "EngineNotFound";

        /// Spec failed validation (malformed owner or repository reference).
        pub const INVALID_SPEC: &str = "InvalidSpec";

        /// Extracted manifest blob could not be deserialized.
        pub const MANIFEST_INVALID: &str = "ManifestInvalid";

        /// Execution plane for the build's workspace is not provisioned.
        pub const PLANE_NOT_FOUND: &str = "ExecutionPlaneNotFound";
    }

    /// Reasons recorded on `Component` conditions.
    pub mod component {
        /// Cleanup guard attached and the component is being served.
        pub const PROVISIONED: &str = "Provisioned";

        /// Deletion observed; dependent teardown is starting.
        pub const FINALIZING: &str = "Finalizing";

        /// Dependents remain (in-flight deletion or independently guarded).
        pub const AWAITING_DEPENDENTS: &str = "AwaitingDependents";
    }
}

/// Default scheduling intervals, overridable through `KilnConfig`.
pub mod defaults {
    /// Poll interval while a run is executing.
    pub const RUN_POLL_INTERVAL_SECS: u64 = 20;

    /// Fixed short delay between cascade-deletion passes.
    pub const FINALIZER_RETRY_SECS: u64 = 5;

    /// Deadline for a single reconciliation invocation.
    pub const RECONCILE_DEADLINE_SECS: u64 = 60;
}

/// System-wide constants.
pub mod system {
    /// Version compatibility marker.
    pub const KILN_CORE_VERSION: &str = "0.1.0";

    /// Suffix appended to a build name to derive its run name.
    pub const RUN_NAME_SUFFIX: &str = "-run";
}
