//! Workflow construction and execution.
//!
//! - `generator`: turns free-text remediation actions plus the decision
//!   into an ordered list of typed steps
//! - `dispatcher`: runs the steps sequentially through a handler table
//!   keyed by action type, halting on the first failure
//! - `handlers`: built-in step handlers for every known action type
//! - `validation`: pre-execution sanity checks over the assembled plan

pub mod dispatcher;
pub mod generator;
pub mod handlers;
pub mod validation;

pub use dispatcher::{ExecutionReport, StepExecutionDispatcher, StepHandler, StepResult};
pub use generator::WorkflowStepGenerator;
pub use handlers::builtin_handlers;
pub use validation::{PlanValidation, validate_plan};
