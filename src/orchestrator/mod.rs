//! Per-signal orchestration.
//!
//! One run carries a signal through analyze → decide → plan → execute (or
//! the human loop) → finalize. Every stage records progress markers in the
//! run state; stage failures become recorded errors and route the run to a
//! degraded finish instead of propagating.

pub mod runner;
pub mod state;

pub use runner::Orchestrator;
pub use state::{ExecutionSummary, OrchestrationState, RunStatus};
