//! Decision engine: advisory attempt, fallback, override pass.

use std::sync::Arc;

use crate::analysis::{ComplexityReport, FeasibilityReport};
use crate::config::AdvisoryConfig;
use crate::model::{RemediationDecision, RemediationSignal};

use super::advisory::{AdvisoryClient, AdvisoryOutcome, AdvisoryRequest, HttpAdvisoryClient};
use super::fallback::rule_based_decision;
use super::overrides::apply_overrides;
use super::payload::{parse_payload, validate_payload, ValidatedPayload};

/// Produces exactly one valid decision per signal. Advisory failure is
/// recoverable by design; no error escapes `decide`.
pub struct DecisionEngine {
    advisory: Option<Arc<dyn AdvisoryClient>>,
    config: AdvisoryConfig,
}

impl DecisionEngine {
    /// Engine with no advisory service; every decision takes the rule tree.
    pub fn rule_based_only() -> Self {
        Self {
            advisory: None,
            config: AdvisoryConfig::default(),
        }
    }

    /// Engine backed by an explicit advisory client (tests, custom transports).
    pub fn with_client(config: AdvisoryConfig, client: Arc<dyn AdvisoryClient>) -> Self {
        Self {
            advisory: Some(client),
            config,
        }
    }

    /// Engine from configuration: HTTP advisory when an endpoint is set,
    /// rule-based only otherwise.
    pub fn from_config(config: &AdvisoryConfig) -> Self {
        match &config.endpoint {
            Some(endpoint) => Self::with_client(
                config.clone(),
                Arc::new(HttpAdvisoryClient::new(endpoint.clone())),
            ),
            None => Self {
                advisory: None,
                config: config.clone(),
            },
        }
    }

    /// Decide how to remediate the signal.
    pub async fn decide(
        &self,
        signal: &RemediationSignal,
        complexity: &ComplexityReport,
        feasibility: &FeasibilityReport,
    ) -> RemediationDecision {
        let outcome = self.attempt_advisory(signal, complexity, feasibility).await;

        let mut decision = match outcome {
            AdvisoryOutcome::Accepted { payload } => decision_from_payload(payload),
            AdvisoryOutcome::Rejected { .. } => {
                rule_based_decision(signal, complexity, feasibility)
            }
        };

        apply_overrides(
            &mut decision,
            signal,
            complexity.overall_complexity,
            feasibility.feasibility_score,
        );
        decision
    }

    /// Run the advisory call end to end: transport, parse, validate.
    pub async fn attempt_advisory(
        &self,
        signal: &RemediationSignal,
        complexity: &ComplexityReport,
        feasibility: &FeasibilityReport,
    ) -> AdvisoryOutcome {
        let Some(client) = &self.advisory else {
            return AdvisoryOutcome::Rejected {
                reason: "advisory service not configured".to_string(),
            };
        };

        let request = AdvisoryRequest::build(&self.config, signal, complexity, feasibility);
        let text = match client.advise(&request).await {
            Ok(text) => text,
            Err(err) => {
                return AdvisoryOutcome::Rejected {
                    reason: err.to_string(),
                };
            }
        };

        let value = match parse_payload(&text) {
            Ok(value) => value,
            Err(err) => {
                return AdvisoryOutcome::Rejected {
                    reason: err.to_string(),
                };
            }
        };

        match validate_payload(&value) {
            Ok(payload) => AdvisoryOutcome::Accepted { payload },
            Err(err) => AdvisoryOutcome::Rejected {
                reason: err.to_string(),
            },
        }
    }
}

fn decision_from_payload(payload: ValidatedPayload) -> RemediationDecision {
    RemediationDecision::new(
        payload.remediation_type,
        payload.confidence_score,
        payload.reasoning,
        payload.risk_if_delayed,
    )
    .with_estimated_effort(payload.estimated_effort.max(1))
    .with_prerequisites(payload.prerequisites)
    .with_recommended_actions(payload.recommended_actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ComplexityAssessor, FeasibilityValidator};
    use crate::decision::advisory::StaticAdvisoryClient;
    use crate::model::{ProcessingActivity, RemediationType, RiskLevel, Violation};

    fn signal(risk: RiskLevel, actions: Vec<&str>) -> RemediationSignal {
        let violation = Violation::new("v-1", "test violation", risk)
            .with_actions(actions.into_iter().map(String::from).collect());
        RemediationSignal::new(violation, ProcessingActivity::new("a-1", "activity"))
    }

    async fn decide_with(
        engine: &DecisionEngine,
        signal: &RemediationSignal,
    ) -> RemediationDecision {
        let complexity = ComplexityAssessor::new().assess(signal);
        let feasibility = FeasibilityValidator::new().validate(signal, None);
        engine.decide(signal, &complexity, &feasibility).await
    }

    fn advisory_json(remediation_type: &str, confidence: f64) -> String {
        serde_json::json!({
            "remediation_type": remediation_type,
            "confidence_score": confidence,
            "reasoning": "Advisory reasoning",
            "estimated_effort": 45,
            "risk_if_delayed": "medium",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_valid_advisory_payload_is_accepted() {
        let engine = DecisionEngine::with_client(
            AdvisoryConfig::default(),
            Arc::new(StaticAdvisoryClient::answering(advisory_json(
                "human_in_loop",
                0.88,
            ))),
        );
        let decision =
            decide_with(&engine, &signal(RiskLevel::Medium, vec!["Notify users"])).await;
        assert_eq!(decision.remediation_type, RemediationType::HumanInLoop);
        assert_eq!(decision.estimated_effort, 45);
        assert!(decision.reasoning.contains("Advisory reasoning"));
    }

    #[tokio::test]
    async fn test_advisory_failure_falls_back_to_rules() {
        let engine = DecisionEngine::with_client(
            AdvisoryConfig::default(),
            Arc::new(StaticAdvisoryClient::failing()),
        );
        let decision =
            decide_with(&engine, &signal(RiskLevel::Low, vec!["Update preference"])).await;
        assert_eq!(decision.remediation_type, RemediationType::Automatic);
        assert!(decision.confidence_score >= 0.7);
    }

    #[tokio::test]
    async fn test_invalid_payload_falls_back_to_rules() {
        let engine = DecisionEngine::with_client(
            AdvisoryConfig::default(),
            Arc::new(StaticAdvisoryClient::answering(
                "{\"remediation_type\": \"teleport\", \"confidence_score\": 2.0}",
            )),
        );
        let decision =
            decide_with(&engine, &signal(RiskLevel::Low, vec!["Update preference"])).await;
        assert_eq!(decision.remediation_type, RemediationType::Automatic);
    }

    #[tokio::test]
    async fn test_critical_policy_is_manual_even_with_valid_advisory() {
        // Advisory says automatic with high confidence; the override pass
        // still forbids unattended automation at critical risk.
        let engine = DecisionEngine::with_client(
            AdvisoryConfig::default(),
            Arc::new(StaticAdvisoryClient::answering(advisory_json(
                "automatic", 0.95,
            ))),
        );
        let decision = decide_with(
            &engine,
            &signal(RiskLevel::Critical, vec!["Update privacy policy"]),
        )
        .await;
        assert_eq!(decision.remediation_type, RemediationType::ManualOnly);
    }

    #[tokio::test]
    async fn test_rule_based_only_engine_never_calls_advisory() {
        let engine = DecisionEngine::rule_based_only();
        let sig = signal(RiskLevel::Low, vec!["Update preference"]);
        let complexity = ComplexityAssessor::new().assess(&sig);
        let feasibility = FeasibilityValidator::new().validate(&sig, None);
        let outcome = engine.attempt_advisory(&sig, &complexity, &feasibility).await;
        assert!(matches!(outcome, AdvisoryOutcome::Rejected { .. }));
    }

    #[tokio::test]
    async fn test_confidence_always_in_unit_interval() {
        let engine = DecisionEngine::rule_based_only();
        for risk in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            let decision = decide_with(
                &engine,
                &signal(risk, vec!["Delete records", "Notify users", "Audit access"]),
            )
            .await;
            assert!((0.0..=1.0).contains(&decision.confidence_score));
        }
    }
}
