//! # Status Conditions
//!
//! Typed condition records mirrored onto entity statuses. Each condition
//! type appears at most once per object; writing a condition replaces the
//! previous record of the same type (latest wins) so consumers always read
//! the current verdict for a type rather than a history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::meta::ObjectMeta;

/// Condition types reported across entity lifecycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    /// Request accepted and validated.
    Initiated,
    /// External run submitted.
    Triggered,
    /// External run observed executing.
    InProgress,
    /// Terminal success.
    Completed,
    /// Terminal failure.
    Failed,
    /// Cascade deletion in progress.
    Finalizing,
    /// Entity provisioned and serving.
    Ready,
}

impl ConditionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::Initiated => "initiated",
            ConditionType::Triggered => "triggered",
            ConditionType::InProgress => "in_progress",
            ConditionType::Completed => "completed",
            ConditionType::Failed => "failed",
            ConditionType::Finalizing => "finalizing",
            ConditionType::Ready => "ready",
        }
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single observation about an object at a point in its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub condition_type: ConditionType,
    pub status: bool,
    /// Machine-readable reason drawn from the per-entity reason catalog.
    pub reason: String,
    /// Human-readable detail; free-form.
    pub message: String,
    /// Spec generation this observation was made against.
    pub observed_generation: i64,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    pub fn new(
        condition_type: ConditionType,
        status: bool,
        reason: impl Into<String>,
        message: impl Into<String>,
        observed_generation: i64,
    ) -> Self {
        Self {
            condition_type,
            status,
            reason: reason.into(),
            message: message.into(),
            observed_generation,
            last_transition_time: Utc::now(),
        }
    }

    /// Convenience constructor for a true condition observed against the
    /// given object's current generation.
    pub fn observed(
        condition_type: ConditionType,
        meta: &ObjectMeta,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(condition_type, true, reason, message, meta.generation)
    }
}

/// Ordered set of conditions with at most one record per type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conditions(Vec<Condition>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a condition, replacing any existing record of the same type.
    ///
    /// A write that changes nothing observable (same status, reason,
    /// message, and generation) leaves the stored record untouched so
    /// repeated reconcile passes do not churn transition timestamps. When
    /// only the status flag is unchanged the record is updated in place but
    /// keeps its original transition time.
    pub fn set(&mut self, condition: Condition) {
        match self
            .0
            .iter_mut()
            .find(|c| c.condition_type == condition.condition_type)
        {
            Some(existing) => {
                if existing.status == condition.status
                    && existing.reason == condition.reason
                    && existing.message == condition.message
                    && existing.observed_generation == condition.observed_generation
                {
                    return;
                }
                let transition_time = if existing.status == condition.status {
                    existing.last_transition_time
                } else {
                    condition.last_transition_time
                };
                *existing = Condition {
                    last_transition_time: transition_time,
                    ..condition
                };
            }
            None => self.0.push(condition),
        }
    }

    pub fn get(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.0.iter().find(|c| c.condition_type == condition_type)
    }

    /// Whether a condition of this type is present with status true.
    pub fn is_true(&self, condition_type: ConditionType) -> bool {
        self.get(condition_type).map(|c| c.status).unwrap_or(false)
    }

    pub fn has(&self, condition_type: ConditionType) -> bool {
        self.get(condition_type).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
