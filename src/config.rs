//! # Configuration
//!
//! Runtime tuning for the reconciliation core. Values resolve in three
//! layers: compiled defaults, an optional TOML file, then `KILN_`-prefixed
//! environment variables, each layer overriding the one below.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::constants::{defaults, engine};
use crate::error::KilnError;

#[derive(Debug, Clone, Deserialize)]
pub struct KilnConfig {
    /// Engine used by builds that name none.
    pub default_engine: String,
    /// Delay between run status polls while a build run executes.
    pub run_poll_interval_secs: u64,
    /// Delay between cascade sweeps while dependents drain.
    pub finalizer_retry_secs: u64,
    /// Upper bound on a single reconcile pass.
    pub reconcile_deadline_secs: u64,
    /// Emit logs as JSON instead of human-readable lines.
    pub log_json: bool,
}

impl Default for KilnConfig {
    fn default() -> Self {
        Self {
            default_engine: engine::DEFAULT_ENGINE.to_string(),
            run_poll_interval_secs: defaults::RUN_POLL_INTERVAL_SECS,
            finalizer_retry_secs: defaults::FINALIZER_RETRY_SECS,
            reconcile_deadline_secs: defaults::RECONCILE_DEADLINE_SECS,
            log_json: false,
        }
    }
}

impl KilnConfig {
    /// Configuration sized for fast tests: no poll delays, short deadline.
    pub fn for_testing() -> Self {
        Self {
            default_engine: engine::DEFAULT_ENGINE.to_string(),
            run_poll_interval_secs: 0,
            finalizer_retry_secs: 0,
            reconcile_deadline_secs: 5,
            log_json: false,
        }
    }

    /// Load configuration, layering an optional file and the environment
    /// over the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, KilnError> {
        let settings = Self::build_settings(path)
            .map_err(|e| KilnError::Configuration(format!("Failed to load config: {e}")))?;
        let config: KilnConfig = settings
            .try_deserialize()
            .map_err(|e| KilnError::Configuration(format!("Invalid config: {e}")))?;
        config.validate()?;
        debug!(
            default_engine = %config.default_engine,
            run_poll_interval_secs = config.run_poll_interval_secs,
            reconcile_deadline_secs = config.reconcile_deadline_secs,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn build_settings(path: Option<&Path>) -> Result<config::Config, config::ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("default_engine", engine::DEFAULT_ENGINE)?
            .set_default("run_poll_interval_secs", defaults::RUN_POLL_INTERVAL_SECS)?
            .set_default("finalizer_retry_secs", defaults::FINALIZER_RETRY_SECS)?
            .set_default("reconcile_deadline_secs", defaults::RECONCILE_DEADLINE_SECS)?
            .set_default("log_json", false)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }

        builder
            .add_source(config::Environment::with_prefix("KILN"))
            .build()
    }

    pub fn validate(&self) -> Result<(), KilnError> {
        if self.default_engine.trim().is_empty() {
            return Err(KilnError::Configuration(
                "default_engine must not be empty".to_string(),
            ));
        }
        if self.reconcile_deadline_secs == 0 {
            return Err(KilnError::Configuration(
                "reconcile_deadline_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn run_poll_interval(&self) -> Duration {
        Duration::from_secs(self.run_poll_interval_secs)
    }

    pub fn finalizer_retry(&self) -> Duration {
        Duration::from_secs(self.finalizer_retry_secs)
    }

    pub fn reconcile_deadline(&self) -> Duration {
        Duration::from_secs(self.reconcile_deadline_secs)
    }
}
