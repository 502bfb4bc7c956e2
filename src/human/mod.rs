//! Human involvement coordination.

pub mod coordinator;

pub use coordinator::{HumanLoopReport, HumanTaskCoordinator, InterventionCategory};
