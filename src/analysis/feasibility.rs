//! Automation feasibility validation.
//!
//! Each remediation action is matched against an ordered table of
//! automation-pattern families (keyword set, feasibility coefficient,
//! prerequisites, risk factors). The aggregate score weighs:
//!
//! - 40% average per-action feasibility
//! - 30% system capability score
//! - 30% integration score (cross-border, automated decisions, recipients)
//!
//! penalized 20% when the accompanying decision's confidence is below 0.7.
//! Validation never fails: an internal error degrades to a minimal result
//! (score 0.1) carrying the error text for diagnostics.

use serde::{Deserialize, Serialize};

use crate::model::{RemediationDecision, RemediationSignal, RemediationType};

const WEIGHT_ACTION: f64 = 0.4;
const WEIGHT_SYSTEM: f64 = 0.3;
const WEIGHT_INTEGRATION: f64 = 0.3;

/// Feasibility assigned to actions matching no known pattern family.
const UNMATCHED_FEASIBILITY: f64 = 0.3;

/// Score returned when validation itself fails.
const MINIMAL_FEASIBILITY: f64 = 0.1;

/// One automation-pattern family: keyword set plus what automating it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternFamily {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub feasibility: f64,
    pub prerequisites: &'static [&'static str],
    pub risk_factors: &'static [&'static str],
}

/// Ordered pattern table; first-match order matters for reporting, matched
/// feasibility takes the maximum across all matching families.
const AUTOMATION_PATTERNS: &[PatternFamily] = &[
    PatternFamily {
        name: "data_retention",
        keywords: &["retention", "delete", "purge", "archive"],
        feasibility: 0.9,
        prerequisites: &["Data inventory complete", "Backup verification"],
        risk_factors: &["Irreversible data loss"],
    },
    PatternFamily {
        name: "consent_management",
        keywords: &["consent", "withdraw", "opt-out", "unsubscribe"],
        feasibility: 0.8,
        prerequisites: &["Consent records accessible"],
        risk_factors: &["Service interruption"],
    },
    PatternFamily {
        name: "data_portability",
        keywords: &["export", "download", "portability", "transfer"],
        feasibility: 0.7,
        prerequisites: &["Data format standardized"],
        risk_factors: &["Data exposure during transfer"],
    },
    PatternFamily {
        name: "access_control",
        keywords: &["access", "permission", "role", "authorization"],
        feasibility: 0.8,
        prerequisites: &["Identity system integration"],
        risk_factors: &["Privilege escalation"],
    },
    PatternFamily {
        name: "data_minimization",
        keywords: &["minimize", "reduce", "limit", "necessary"],
        feasibility: 0.6,
        prerequisites: &["Data usage analysis"],
        risk_factors: &["Functionality loss"],
    },
    PatternFamily {
        name: "encryption",
        keywords: &["encrypt", "protection", "secure", "hash"],
        feasibility: 0.9,
        prerequisites: &["Key management system"],
        risk_factors: &["Performance impact"],
    },
    PatternFamily {
        name: "anonymization",
        keywords: &["anonymize", "pseudonymize", "de-identify"],
        feasibility: 0.5,
        prerequisites: &["Anonymization tooling validated"],
        risk_factors: &["Re-identification risk"],
    },
];

/// Per-action match result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionFeasibility {
    pub action: String,
    pub feasibility: f64,
    pub matched_families: Vec<String>,
}

/// Aggregate feasibility result for one signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeasibilityReport {
    /// Always within [0, 1]
    pub feasibility_score: f64,
    pub average_action_feasibility: f64,
    pub system_capability_score: f64,
    pub integration_score: f64,
    pub actions: Vec<ActionFeasibility>,
    /// Count of actions matching at least one automation pattern
    pub automation_pattern_hits: usize,
    pub blockers: Vec<String>,
    /// De-duplicated, order preserving
    pub prerequisites: Vec<String>,
    pub recommended_adjustments: Vec<String>,
    /// Set only when validation itself failed and degraded to the minimal result
    pub error: Option<String>,
}

/// Validates how much of a remediation plan can run without a human.
#[derive(Debug, Clone, Default)]
pub struct FeasibilityValidator {
    /// System capabilities known to be unavailable; each missing entry
    /// becomes a blocker and lowers the capability score.
    missing_capabilities: Vec<String>,
}

impl FeasibilityValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_capability(mut self, capability: impl Into<String>) -> Self {
        self.missing_capabilities.push(capability.into());
        self
    }

    /// Score the signal's remediation actions. The decision is optional:
    /// during initial analysis none exists yet; when present its confidence
    /// and type refine the penalty and the recommended adjustments.
    pub fn validate(
        &self,
        signal: &RemediationSignal,
        decision: Option<&RemediationDecision>,
    ) -> FeasibilityReport {
        match self.try_validate(signal, decision) {
            Ok(report) => report,
            Err(err) => FeasibilityReport {
                feasibility_score: MINIMAL_FEASIBILITY,
                error: Some(err.to_string()),
                blockers: vec![format!("Feasibility validation failed: {err}")],
                ..FeasibilityReport::default()
            },
        }
    }

    fn try_validate(
        &self,
        signal: &RemediationSignal,
        decision: Option<&RemediationDecision>,
    ) -> anyhow::Result<FeasibilityReport> {
        let actions = self.analyze_actions(&signal.violation.remediation_actions);

        let average_action_feasibility = if actions.is_empty() {
            UNMATCHED_FEASIBILITY
        } else {
            actions.iter().map(|a| a.feasibility).sum::<f64>() / actions.len() as f64
        };
        let automation_pattern_hits = actions
            .iter()
            .filter(|a| !a.matched_families.is_empty())
            .count();

        let system_capability_score =
            (0.85 - 0.1 * self.missing_capabilities.len() as f64).clamp(0.0, 1.0);
        let integration_score = self.integration_score(signal);

        let mut feasibility_score = WEIGHT_ACTION * average_action_feasibility
            + WEIGHT_SYSTEM * system_capability_score
            + WEIGHT_INTEGRATION * integration_score;
        if let Some(decision) = decision
            && decision.confidence_score < 0.7
        {
            feasibility_score *= 0.8;
        }
        let feasibility_score = feasibility_score.clamp(0.0, 1.0);

        let blockers = self.identify_blockers(&actions);
        let prerequisites = self.compile_prerequisites(&actions);
        let recommended_adjustments = self.recommend_adjustments(
            feasibility_score,
            decision.map(|d| d.remediation_type),
        );

        Ok(FeasibilityReport {
            feasibility_score,
            average_action_feasibility,
            system_capability_score,
            integration_score,
            actions,
            automation_pattern_hits,
            blockers,
            prerequisites,
            recommended_adjustments,
            error: None,
        })
    }

    fn analyze_actions(&self, actions: &[String]) -> Vec<ActionFeasibility> {
        actions
            .iter()
            .map(|action| {
                let lower = action.to_lowercase();
                let matched: Vec<&PatternFamily> = AUTOMATION_PATTERNS
                    .iter()
                    .filter(|family| family.keywords.iter().any(|kw| lower.contains(kw)))
                    .collect();

                // Multiple matches take the most automatable family's score
                let feasibility = matched
                    .iter()
                    .map(|family| family.feasibility)
                    .fold(f64::NAN, f64::max);
                let feasibility = if feasibility.is_nan() {
                    UNMATCHED_FEASIBILITY
                } else {
                    feasibility
                };

                ActionFeasibility {
                    action: action.clone(),
                    feasibility,
                    matched_families: matched.iter().map(|f| f.name.to_string()).collect(),
                }
            })
            .collect()
    }

    fn integration_score(&self, signal: &RemediationSignal) -> f64 {
        let mut factors = Vec::new();
        if signal.violation.cross_border_transfer {
            factors.push(0.6);
        }
        if signal.violation.automated_decision_making {
            factors.push(0.7);
        }
        if signal.violation.recipients.len() > 2 {
            factors.push(0.5);
        }

        let avg_complexity = if factors.is_empty() {
            0.2
        } else {
            factors.iter().sum::<f64>() / factors.len() as f64
        };
        (1.0 - avg_complexity).clamp(0.0, 1.0)
    }

    fn identify_blockers(&self, actions: &[ActionFeasibility]) -> Vec<String> {
        let mut blockers = Vec::new();

        for action in actions {
            if action.feasibility < 0.4 {
                blockers.push(format!("Low automation potential for: {}", action.action));
            }
        }
        for capability in &self.missing_capabilities {
            blockers.push(format!("Missing system capability: {capability}"));
        }
        for action in actions {
            for family_name in &action.matched_families {
                if let Some(family) = AUTOMATION_PATTERNS.iter().find(|f| f.name == family_name) {
                    for risk in family.risk_factors {
                        blockers.push(format!("Risk factor for {}: {risk}", action.action));
                    }
                }
            }
        }

        blockers
    }

    fn compile_prerequisites(&self, actions: &[ActionFeasibility]) -> Vec<String> {
        let mut prerequisites: Vec<String> = Vec::new();
        for action in actions {
            for family_name in &action.matched_families {
                if let Some(family) = AUTOMATION_PATTERNS.iter().find(|f| f.name == family_name) {
                    for prereq in family.prerequisites {
                        if !prerequisites.iter().any(|existing| existing == prereq) {
                            prerequisites.push(prereq.to_string());
                        }
                    }
                }
            }
        }
        prerequisites
    }

    fn recommend_adjustments(
        &self,
        feasibility_score: f64,
        current_type: Option<RemediationType>,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        if feasibility_score < 0.4 && current_type == Some(RemediationType::Automatic) {
            recommendations
                .push("Consider changing to human_in_loop due to low feasibility".to_string());
        }
        if feasibility_score > 0.8 && current_type == Some(RemediationType::ManualOnly) {
            recommendations
                .push("Consider automatic remediation due to high feasibility".to_string());
        }
        if (0.4..=0.7).contains(&feasibility_score) {
            recommendations.push("human_in_loop approach recommended for oversight".to_string());
        }
        if feasibility_score < 0.6 {
            recommendations.push("Implement additional validation steps".to_string());
            recommendations.push("Consider phased approach with manual verification".to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProcessingActivity, RiskLevel, Violation};

    fn signal_with_actions(actions: Vec<&str>) -> RemediationSignal {
        let violation = Violation::new("v-1", "test violation", RiskLevel::Medium)
            .with_actions(actions.into_iter().map(String::from).collect());
        RemediationSignal::new(violation, ProcessingActivity::new("a-1", "activity"))
    }

    #[test]
    fn test_unmatched_action_gets_default_feasibility() {
        let signal = signal_with_actions(vec!["Recalibrate the telescope"]);
        let report = FeasibilityValidator::new().validate(&signal, None);
        assert_eq!(report.actions.len(), 1);
        assert_eq!(report.actions[0].feasibility, 0.3);
        assert!(report.actions[0].matched_families.is_empty());
        assert_eq!(report.automation_pattern_hits, 0);
    }

    #[test]
    fn test_multi_match_takes_maximum() {
        // "delete" (data_retention 0.9) and "export" (data_portability 0.7)
        let signal = signal_with_actions(vec!["Export then delete user records"]);
        let report = FeasibilityValidator::new().validate(&signal, None);
        assert_eq!(report.actions[0].feasibility, 0.9);
        assert!(report.actions[0].matched_families.len() >= 2);
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let signal = signal_with_actions(vec![
            "Delete stale records",
            "Encrypt archived exports",
            "Anonymize analytics events",
        ]);
        let report = FeasibilityValidator::new().validate(&signal, None);
        assert!((0.0..=1.0).contains(&report.feasibility_score));
    }

    #[test]
    fn test_low_confidence_decision_applies_penalty() {
        let signal = signal_with_actions(vec!["Delete stale records"]);
        let validator = FeasibilityValidator::new();

        let confident = RemediationDecision::new(
            RemediationType::Automatic,
            0.9,
            "x",
            RiskLevel::Low,
        );
        let shaky = RemediationDecision::new(
            RemediationType::Automatic,
            0.5,
            "x",
            RiskLevel::Low,
        );

        let base = validator.validate(&signal, Some(&confident));
        let penalized = validator.validate(&signal, Some(&shaky));
        assert!((penalized.feasibility_score - base.feasibility_score * 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_prerequisites_deduplicated_preserving_order() {
        // Both actions match data_retention; its prerequisites appear once
        let signal = signal_with_actions(vec!["Purge old logs", "Delete expired backups"]);
        let report = FeasibilityValidator::new().validate(&signal, None);
        assert_eq!(
            report.prerequisites,
            vec![
                "Data inventory complete".to_string(),
                "Backup verification".to_string()
            ]
        );
    }

    #[test]
    fn test_missing_capability_becomes_blocker() {
        let signal = signal_with_actions(vec!["Delete stale records"]);
        let validator = FeasibilityValidator::new().with_missing_capability("backup_systems");
        let report = validator.validate(&signal, None);
        assert!(
            report
                .blockers
                .iter()
                .any(|b| b.contains("backup_systems"))
        );
        assert!(report.system_capability_score < 0.85);
    }

    #[test]
    fn test_validation_is_idempotent() {
        let signal = signal_with_actions(vec!["Withdraw consent records", "Encrypt exports"]);
        let validator = FeasibilityValidator::new();
        assert_eq!(
            validator.validate(&signal, None),
            validator.validate(&signal, None)
        );
    }

    #[test]
    fn test_empty_action_list_uses_default_average() {
        let signal = signal_with_actions(vec![]);
        let report = FeasibilityValidator::new().validate(&signal, None);
        assert_eq!(report.average_action_feasibility, 0.3);
        assert!(report.feasibility_score > 0.0);
    }

    #[test]
    fn test_midrange_score_recommends_oversight() {
        let signal = signal_with_actions(vec!["Recalibrate the telescope"]);
        let report = FeasibilityValidator::new().validate(&signal, None);
        assert!(
            report
                .recommended_adjustments
                .iter()
                .any(|r| r.contains("human_in_loop"))
        );
    }
}
