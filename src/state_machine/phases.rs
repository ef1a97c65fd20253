//! # Build Phases
//!
//! Coarse lifecycle summary a build advances through. Phases only move
//! forward: observation of an earlier stage never rolls a later phase
//! back, which keeps re-delivered reconciles from rewriting history.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle phase of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    /// Accepted and validated, prerequisites not yet in place.
    #[default]
    Initiated,
    /// Execution-plane prerequisites materialized.
    PrerequisitesReady,
    /// Run submitted to the execution plane.
    Submitted,
    /// Run observed executing.
    Running,
    /// Run finished and artifacts were collected.
    Succeeded,
    /// Build failed permanently.
    Failed,
}

impl BuildPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildPhase::Initiated => "initiated",
            BuildPhase::PrerequisitesReady => "prerequisites_ready",
            BuildPhase::Submitted => "submitted",
            BuildPhase::Running => "running",
            BuildPhase::Succeeded => "succeeded",
            BuildPhase::Failed => "failed",
        }
    }

    /// Terminal phases are never left, not even for Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildPhase::Succeeded | BuildPhase::Failed)
    }

    fn ordinal(&self) -> u8 {
        match self {
            BuildPhase::Initiated => 0,
            BuildPhase::PrerequisitesReady => 1,
            BuildPhase::Submitted => 2,
            BuildPhase::Running => 3,
            BuildPhase::Succeeded => 4,
            BuildPhase::Failed => 4,
        }
    }

    /// Whether moving to `next` advances the lifecycle. Re-asserting the
    /// current phase is allowed; moving backward or leaving a terminal
    /// phase is not.
    pub fn can_advance_to(&self, next: BuildPhase) -> bool {
        if *self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next.ordinal() > self.ordinal()
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BuildPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(BuildPhase::Initiated),
            "prerequisites_ready" => Ok(BuildPhase::PrerequisitesReady),
            "submitted" => Ok(BuildPhase::Submitted),
            "running" => Ok(BuildPhase::Running),
            "succeeded" => Ok(BuildPhase::Succeeded),
            "failed" => Ok(BuildPhase::Failed),
            _ => Err(format!("Invalid build phase: {s}")),
        }
    }
}
