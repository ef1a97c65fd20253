//! # Error Types
//!
//! Crate-level error type aggregating the module errors, plus the
//! terminal/transient classification reconcilers act on. Terminal errors
//! are reported on the failing entity and never retried; transient errors
//! leave the entity queued for another pass.

use std::time::Duration;

use crate::engine::EngineError;
use crate::models::ResourceKey;
use crate::store::StoreError;

/// How an error should be acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retrying cannot succeed until the spec changes; report and stop.
    Terminal,
    /// Retrying may succeed; surface the error and try again later.
    Transient,
}

/// Top-level error for reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum KilnError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Reconcile of {key} exceeded its {deadline:?} deadline")]
    DeadlineExceeded { key: ResourceKey, deadline: Duration },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KilnError {
    pub fn class(&self) -> ErrorClass {
        match self {
            KilnError::Store(e) => match e {
                StoreError::Codec { .. } => ErrorClass::Terminal,
                _ => ErrorClass::Transient,
            },
            KilnError::Engine(e) => e.class(),
            KilnError::Configuration(_) => ErrorClass::Terminal,
            KilnError::DeadlineExceeded { .. } => ErrorClass::Transient,
            KilnError::Internal(_) => ErrorClass::Transient,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

pub type Result<T> = std::result::Result<T, KilnError>;
