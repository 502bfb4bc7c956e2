//! Complexity assessment.
//!
//! Scores four dimensions of a signal and combines them into an overall
//! complexity in [0, 1]:
//!
//! | Dimension             | Weight |
//! |-----------------------|--------|
//! | data_complexity       | 0.25   |
//! | technical_complexity  | 0.30   |
//! | regulatory_complexity | 0.25   |
//! | system_impact         | 0.20   |
//!
//! Sub-scores come from lookup tables (data type, framework, risk level)
//! plus linear adjustments for counts and flags. Deterministic and pure;
//! an empty signal scores the 0.2 default.

use serde::{Deserialize, Serialize};

use crate::model::{RemediationSignal, RiskLevel};

const WEIGHT_DATA: f64 = 0.25;
const WEIGHT_TECHNICAL: f64 = 0.30;
const WEIGHT_REGULATORY: f64 = 0.25;
const WEIGHT_SYSTEM_IMPACT: f64 = 0.20;

/// Default complexity when a signal carries no scorable inputs.
const DEFAULT_COMPLEXITY: f64 = 0.2;

/// Base sensitivity score per data-type category.
const DATA_TYPE_SCORES: &[(&str, f64)] = &[
    ("personal", 0.3),
    ("sensitive", 0.6),
    ("financial", 0.7),
    ("health", 0.8),
    ("biometric", 0.9),
    ("location", 0.4),
    ("behavioral", 0.5),
];

/// Base regulatory score per framework identifier.
const FRAMEWORK_SCORES: &[(&str, f64)] = &[
    ("gdpr_eu", 0.8),
    ("pdpa_singapore", 0.6),
    ("ccpa_california", 0.7),
    ("pipeda_canada", 0.5),
    ("lgpd_brazil", 0.6),
];

/// Complexity contribution of common remediation verbs.
const ACTION_VERB_SCORES: &[(&str, f64)] = &[
    ("purge", 0.8),
    ("anonymize", 0.9),
    ("pseudonymize", 0.9),
    ("delete", 0.6),
    ("encrypt", 0.7),
    ("update", 0.3),
    ("notify", 0.2),
    ("review", 0.1),
    ("document", 0.1),
];

/// Per-dimension scores plus the weighted overall value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ComplexityReport {
    pub data_complexity: f64,
    pub technical_complexity: f64,
    pub regulatory_complexity: f64,
    pub system_impact: f64,
    pub overall_complexity: f64,
    /// Human-readable indicators that contributed to the score
    pub complexity_factors: Vec<String>,
}

/// Pure scorer for signal complexity.
#[derive(Debug, Clone, Default)]
pub struct ComplexityAssessor;

impl ComplexityAssessor {
    pub fn new() -> Self {
        Self
    }

    pub fn assess(&self, signal: &RemediationSignal) -> ComplexityReport {
        let mut factors = Vec::new();

        let data_complexity = self.data_complexity(signal, &mut factors);
        let technical_complexity = self.technical_complexity(signal, &mut factors);
        let regulatory_complexity = self.regulatory_complexity(signal, &mut factors);
        let system_impact = self.system_impact(signal, &mut factors);

        let overall_complexity = (WEIGHT_DATA * data_complexity
            + WEIGHT_TECHNICAL * technical_complexity
            + WEIGHT_REGULATORY * regulatory_complexity
            + WEIGHT_SYSTEM_IMPACT * system_impact)
            .clamp(0.0, 1.0);

        ComplexityReport {
            data_complexity,
            technical_complexity,
            regulatory_complexity,
            system_impact,
            overall_complexity,
            complexity_factors: factors,
        }
    }

    fn data_complexity(&self, signal: &RemediationSignal, factors: &mut Vec<String>) -> f64 {
        let data_types = &signal.violation.data_types;
        if data_types.is_empty() {
            return DEFAULT_COMPLEXITY;
        }

        let scores: Vec<f64> = data_types
            .iter()
            .map(|dt| lookup(DATA_TYPE_SCORES, dt).unwrap_or(0.3))
            .collect();
        let max = scores.iter().cloned().fold(0.0_f64, f64::max);
        let avg = scores.iter().sum::<f64>() / scores.len() as f64;
        let variety = (data_types.len() as f64 / 5.0).min(1.0) * 0.2;

        if max >= 0.7 {
            factors.push("high sensitivity data types involved".to_string());
        }
        if data_types.len() >= 3 {
            factors.push(format!("{} distinct data type categories", data_types.len()));
        }

        let urgency_factor = match signal.urgency {
            RiskLevel::Low => 0.8,
            RiskLevel::Medium => 1.0,
            RiskLevel::High => 1.2,
            RiskLevel::Critical => 1.5,
        };

        ((max * 0.6 + avg * 0.4 + variety) * urgency_factor).clamp(0.0, 1.0)
    }

    fn technical_complexity(&self, signal: &RemediationSignal, factors: &mut Vec<String>) -> f64 {
        let violation = &signal.violation;
        let mut score = 0.2;

        if violation.cross_border_transfer {
            score += 0.2;
            factors.push("cross-border data transfer".to_string());
        }
        if violation.automated_decision_making {
            score += 0.2;
            factors.push("automated decision making in scope".to_string());
        }

        let extra_recipients = violation.recipients.len().saturating_sub(2).min(3);
        if extra_recipients > 0 {
            score += 0.1 * extra_recipients as f64;
            factors.push(format!("{} data recipients", violation.recipients.len()));
        }

        score += self.action_verb_complexity(&violation.remediation_actions) * 0.3;
        score.clamp(0.0, 1.0)
    }

    fn action_verb_complexity(&self, actions: &[String]) -> f64 {
        if actions.is_empty() {
            return 0.0;
        }
        let total: f64 = actions
            .iter()
            .map(|action| {
                let lower = action.to_lowercase();
                ACTION_VERB_SCORES
                    .iter()
                    .find(|(verb, _)| lower.contains(verb))
                    .map(|(_, score)| *score)
                    .unwrap_or(0.2)
            })
            .sum();
        total / actions.len() as f64
    }

    fn regulatory_complexity(&self, signal: &RemediationSignal, factors: &mut Vec<String>) -> f64 {
        let base = lookup(FRAMEWORK_SCORES, &signal.framework).unwrap_or(0.5);
        let risk_multiplier = match signal.violation.risk_level {
            RiskLevel::Low => 0.3,
            RiskLevel::Medium => 0.5,
            RiskLevel::High => 0.8,
            RiskLevel::Critical => 1.0,
        };
        if signal.violation.risk_level >= RiskLevel::High {
            factors.push(format!(
                "{} risk violation under {}",
                signal.violation.risk_level.as_str(),
                signal.framework
            ));
        }
        (base * risk_multiplier).clamp(0.0, 1.0)
    }

    fn system_impact(&self, signal: &RemediationSignal, factors: &mut Vec<String>) -> f64 {
        let mut score = 0.1;

        let system_count = signal.activity.systems.len();
        score += (system_count as f64 * 0.1).min(0.4);
        if system_count > 1 {
            factors.push(format!("{} systems affected", system_count));
        }

        if signal.violation.cross_border_transfer {
            score += 0.2;
        }
        if signal.violation.automated_decision_making {
            score += 0.2;
        }

        let destructive = signal
            .violation
            .remediation_actions
            .iter()
            .filter(|action| {
                let lower = action.to_lowercase();
                lower.contains("delete") || lower.contains("purge") || lower.contains("modify")
            })
            .count();
        if destructive > 0 {
            score += 0.1 * destructive as f64;
            factors.push(format!("{} destructive remediation action(s)", destructive));
        }

        score.clamp(0.0, 1.0)
    }
}

fn lookup(table: &[(&str, f64)], key: &str) -> Option<f64> {
    let key = key.to_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, score)| *score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProcessingActivity, Violation};

    fn minimal_signal() -> RemediationSignal {
        let violation = Violation::new("v-1", "Retention exceeded", RiskLevel::Low);
        let activity = ProcessingActivity::new("a-1", "Marketing");
        RemediationSignal::new(violation, activity)
    }

    fn rich_signal() -> RemediationSignal {
        let violation = Violation::new("v-2", "Unlawful biometric processing", RiskLevel::Critical)
            .with_framework("gdpr_eu")
            .with_data_types(vec![
                "biometric".to_string(),
                "health".to_string(),
                "personal".to_string(),
            ])
            .with_recipients(vec![
                "vendor-a".to_string(),
                "vendor-b".to_string(),
                "vendor-c".to_string(),
                "vendor-d".to_string(),
            ])
            .with_cross_border_transfer(true)
            .with_automated_decision_making(true)
            .with_actions(vec![
                "Purge biometric templates".to_string(),
                "Anonymize historical records".to_string(),
            ]);
        let activity = ProcessingActivity::new("a-2", "Access control")
            .with_systems(vec!["idp".to_string(), "hr-db".to_string(), "vault".to_string()]);
        RemediationSignal::new(violation, activity)
    }

    #[test]
    fn test_empty_signal_gets_default_data_complexity() {
        let report = ComplexityAssessor::new().assess(&minimal_signal());
        assert_eq!(report.data_complexity, 0.2);
        assert!(report.overall_complexity > 0.0);
        assert!(report.overall_complexity <= 1.0);
    }

    #[test]
    fn test_all_scores_within_unit_interval() {
        let report = ComplexityAssessor::new().assess(&rich_signal());
        for score in [
            report.data_complexity,
            report.technical_complexity,
            report.regulatory_complexity,
            report.system_impact,
            report.overall_complexity,
        ] {
            assert!((0.0..=1.0).contains(&score), "score out of range: {score}");
        }
    }

    #[test]
    fn test_rich_signal_scores_higher_than_minimal() {
        let assessor = ComplexityAssessor::new();
        let low = assessor.assess(&minimal_signal());
        let high = assessor.assess(&rich_signal());
        assert!(high.overall_complexity > low.overall_complexity);
        assert!(!high.complexity_factors.is_empty());
    }

    #[test]
    fn test_assessment_is_idempotent() {
        let assessor = ComplexityAssessor::new();
        let signal = rich_signal();
        let first = assessor.assess(&signal);
        let second = assessor.assess(&signal);
        assert_eq!(first, second);
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let report = ComplexityAssessor::new().assess(&rich_signal());
        let expected = (0.25 * report.data_complexity
            + 0.30 * report.technical_complexity
            + 0.25 * report.regulatory_complexity
            + 0.20 * report.system_impact)
            .clamp(0.0, 1.0);
        assert!((report.overall_complexity - expected).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_framework_uses_middle_base() {
        let mut signal = minimal_signal();
        signal.framework = "unknown_framework".to_string();
        signal.violation.risk_level = RiskLevel::Critical;
        let report = ComplexityAssessor::new().assess(&signal);
        // 0.5 base at critical multiplier 1.0
        assert!((report.regulatory_complexity - 0.5).abs() < 1e-9);
    }
}
