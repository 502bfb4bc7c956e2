//! Analysis-only scoring (`remedy assess`).

use anyhow::Result;
use serde::Serialize;
use std::path::Path;

use remedy::analysis::{ComplexityAssessor, ComplexityReport, FeasibilityReport, FeasibilityValidator};
use remedy::engine::read_signals;

#[derive(Serialize)]
struct Assessment {
    violation_id: String,
    complexity: ComplexityReport,
    feasibility: FeasibilityReport,
}

pub fn cmd_assess(signal_path: &Path, json: bool) -> Result<()> {
    let signals = read_signals(signal_path)?;
    let assessor = ComplexityAssessor::new();
    let validator = FeasibilityValidator::new();

    let assessments: Vec<Assessment> = signals
        .iter()
        .map(|signal| Assessment {
            violation_id: signal.violation.id.clone(),
            complexity: assessor.assess(signal),
            feasibility: validator.validate(signal, None),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&assessments)?);
        return Ok(());
    }

    for assessment in &assessments {
        println!("[{}]", assessment.violation_id);
        println!(
            "  complexity: {:.2} (data {:.2}, technical {:.2}, regulatory {:.2}, system {:.2})",
            assessment.complexity.overall_complexity,
            assessment.complexity.data_complexity,
            assessment.complexity.technical_complexity,
            assessment.complexity.regulatory_complexity,
            assessment.complexity.system_impact
        );
        for factor in &assessment.complexity.complexity_factors {
            println!("    factor: {factor}");
        }
        println!(
            "  feasibility: {:.2} ({} of {} action(s) match automation patterns)",
            assessment.feasibility.feasibility_score,
            assessment.feasibility.automation_pattern_hits,
            assessment.feasibility.actions.len()
        );
        for blocker in &assessment.feasibility.blockers {
            println!("    blocker: {blocker}");
        }
        for prerequisite in &assessment.feasibility.prerequisites {
            println!("    prerequisite: {prerequisite}");
        }
    }
    Ok(())
}
