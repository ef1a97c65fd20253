//! Proptest strategies for reconciliation-core domain values.

use proptest::prelude::*;

use kiln_core::models::{Condition, ConditionType};
use kiln_core::state_machine::BuildPhase;

pub fn arb_condition_type() -> impl Strategy<Value = ConditionType> {
    prop_oneof![
        Just(ConditionType::Initiated),
        Just(ConditionType::Triggered),
        Just(ConditionType::InProgress),
        Just(ConditionType::Completed),
        Just(ConditionType::Failed),
        Just(ConditionType::Finalizing),
        Just(ConditionType::Ready),
    ]
}

pub fn arb_build_phase() -> impl Strategy<Value = BuildPhase> {
    prop_oneof![
        Just(BuildPhase::Initiated),
        Just(BuildPhase::PrerequisitesReady),
        Just(BuildPhase::Submitted),
        Just(BuildPhase::Running),
        Just(BuildPhase::Succeeded),
        Just(BuildPhase::Failed),
    ]
}

pub fn arb_condition() -> impl Strategy<Value = Condition> {
    (
        arb_condition_type(),
        any::<bool>(),
        "[A-Za-z]{3,16}",
        "[a-z ]{0,32}",
        1..100i64,
    )
        .prop_map(|(condition_type, status, reason, message, generation)| {
            Condition::new(condition_type, status, reason, message, generation)
        })
}

/// Names resembling what users actually call builds and components.
pub fn arb_entity_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,30}[a-z0-9]"
}
