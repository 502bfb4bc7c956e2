//! Core data model for the remediation engine.
//!
//! Everything here is plain serde data shared between the analysis,
//! decision, workflow and orchestration layers:
//! - `signal`: the violation/activity bundle presented to the engine
//! - `decision`: the chosen remediation strategy and its metadata
//! - `workflow`: typed workflow steps and the workflow container
//! - `task`: human task records for manual/review work
//! - `metrics`: process-wide aggregate counters

pub mod decision;
pub mod metrics;
pub mod signal;
pub mod task;
pub mod workflow;

pub use decision::{RemediationDecision, RemediationType};
pub use metrics::{MetricsSnapshot, RemediationMetrics};
pub use signal::{ProcessingActivity, RemediationSignal, RiskLevel, Violation};
pub use task::{HumanTask, TaskStatus};
pub use workflow::{
    ActionType, RemediationWorkflow, StepStatus, WorkflowStep, WorkflowStatus,
};
