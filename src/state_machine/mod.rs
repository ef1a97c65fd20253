//! # State Machine
//!
//! Build lifecycle management: the phase vocabulary and the level-triggered
//! machine that advances builds through it.

pub mod build_state_machine;
pub mod phases;

pub use build_state_machine::BuildStateMachine;
pub use phases::BuildPhase;
