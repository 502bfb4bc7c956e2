//! Decision-only processing (`remedy decide`).

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use remedy::analysis::{ComplexityAssessor, FeasibilityValidator};
use remedy::config::EngineConfig;
use remedy::decision::DecisionEngine;
use remedy::engine::read_signals;
use remedy::model::RemediationDecision;

#[derive(Serialize)]
struct DecisionOutput {
    violation_id: String,
    auto_approve: bool,
    decision: RemediationDecision,
}

pub async fn cmd_decide(config_path: Option<&Path>, signal_path: &Path, json: bool) -> Result<()> {
    let config = EngineConfig::load_or_default(config_path)?;
    let signals = read_signals(signal_path)?;

    let engine = DecisionEngine::from_config(&config.advisory);
    let assessor = ComplexityAssessor::new();
    let validator = FeasibilityValidator::new();

    let mut outputs = Vec::with_capacity(signals.len());
    for signal in &signals {
        let complexity = assessor.assess(signal);
        let feasibility = validator.validate(signal, None);
        let decision = engine.decide(signal, &complexity, &feasibility).await;
        outputs.push(DecisionOutput {
            violation_id: signal.violation.id.clone(),
            auto_approve: decision.auto_approve(),
            decision,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
        return Ok(());
    }

    for output in &outputs {
        let decision = &output.decision;
        println!(
            "[{}] {} (confidence {:.2}, effort {} min, risk if delayed: {})",
            output.violation_id,
            decision.remediation_type.as_str(),
            decision.confidence_score,
            decision.estimated_effort,
            decision.risk_if_delayed.as_str()
        );
        if output.auto_approve {
            println!("  auto-approve: eligible without human sign-off");
        }
        println!("  reasoning: {}", decision.reasoning);
        for prerequisite in &decision.prerequisites {
            println!("  prerequisite: {prerequisite}");
        }
        for action in &decision.recommended_actions {
            println!("  recommended: {action}");
        }
    }
    Ok(())
}
