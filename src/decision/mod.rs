//! The hybrid decision procedure.
//!
//! Per signal the engine runs a small pipeline:
//!
//! 1. **Attempt advisory**: serialize the signal plus analysis factors and
//!    call the advisory service (`advisory`)
//! 2. **Validate payload**: parse and range-check the response (`payload`)
//! 3. **Accept or fall back**: an accepted payload becomes the decision,
//!    anything else takes the deterministic rule tree (`fallback`)
//! 4. **Override pass**: risk/feasibility/complexity guards that force
//!    automation levels down (`overrides`)
//!
//! Advisory failure is expected and recoverable: the pipeline always emits a
//! valid decision and never returns an error to the orchestrator.

pub mod advisory;
pub mod engine;
pub mod fallback;
pub mod overrides;
pub mod payload;

pub use advisory::{
    AdvisoryClient, AdvisoryOutcome, AdvisoryRequest, HttpAdvisoryClient, StaticAdvisoryClient,
};
pub use engine::DecisionEngine;
pub use fallback::{
    CrossSystemImpact, conservative_decision, cross_system_impact, rule_based_decision,
};
pub use overrides::apply_overrides;
pub use payload::{parse_payload, validate_payload, ValidatedPayload};
