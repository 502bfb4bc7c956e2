//! Signal analysis: complexity and feasibility scoring.
//!
//! Both assessors are pure functions over a `RemediationSignal`:
//! - `complexity`: weighted technical/regulatory/data/system-impact score
//! - `feasibility`: per-action automation feasibility with blockers and
//!   prerequisites
//!
//! Neither has a failure mode; feasibility degrades to a minimal result on
//! internal errors instead of returning one.

pub mod complexity;
pub mod feasibility;

pub use complexity::{ComplexityAssessor, ComplexityReport};
pub use feasibility::{
    ActionFeasibility, FeasibilityReport, FeasibilityValidator, PatternFamily,
};
