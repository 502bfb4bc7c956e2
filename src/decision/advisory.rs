//! Advisory service client.
//!
//! The advisory service is an opaque collaborator: it receives a structured
//! request and returns text that should contain a JSON decision payload.
//! `AdvisoryClient` is the seam; the real implementation speaks HTTP via
//! reqwest, the test double returns canned text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analysis::{ComplexityReport, FeasibilityReport};
use crate::config::AdvisoryConfig;
use crate::errors::DecisionError;
use crate::model::RemediationSignal;

use super::payload::ValidatedPayload;

/// Outcome of the advisory attempt, consumed by a plain match in the
/// decision engine. Rejection is ordinary control flow, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AdvisoryOutcome {
    Accepted { payload: ValidatedPayload },
    Rejected { reason: String },
}

/// The structured request sent to the advisory service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub model: String,
    pub max_tokens: u32,
    pub prompt: String,
}

impl AdvisoryRequest {
    /// Build the advisory prompt from the signal and the analysis factors.
    pub fn build(
        config: &AdvisoryConfig,
        signal: &RemediationSignal,
        complexity: &ComplexityReport,
        feasibility: &FeasibilityReport,
    ) -> Self {
        let violation = &signal.violation;
        let prompt = format!(
            "You are a compliance remediation specialist. Analyze this violation and \
             choose the best remediation approach.\n\n\
             VIOLATION:\n\
             Id: {id}\n\
             Description: {description}\n\
             Risk level: {risk}\n\
             Framework: {framework}\n\
             Proposed actions: {actions}\n\n\
             ACTIVITY:\n\
             Name: {activity_name}\n\
             Purpose: {purpose}\n\
             Cross-border transfer: {cross_border}\n\
             Automated decision making: {automated}\n\n\
             ANALYSIS:\n\
             Overall complexity: {overall:.2}\n\
             Technical complexity: {technical:.2}\n\
             Regulatory complexity: {regulatory:.2}\n\
             Feasibility score: {feasibility:.2}\n\
             Blockers: {blockers}\n\n\
             Respond with a single JSON object with keys: remediation_type \
             (automatic|human_in_loop|manual_only), confidence_score (0-1), \
             reasoning (string), estimated_effort (minutes), risk_if_delayed \
             (low|medium|high|critical), prerequisites (list), \
             recommended_actions (list).",
            id = violation.id,
            description = violation.description,
            risk = violation.risk_level.as_str(),
            framework = signal.framework,
            actions = violation.remediation_actions.join("; "),
            activity_name = signal.activity.name,
            purpose = signal.activity.purpose,
            cross_border = violation.cross_border_transfer,
            automated = violation.automated_decision_making,
            overall = complexity.overall_complexity,
            technical = complexity.technical_complexity,
            regulatory = complexity.regulatory_complexity,
            feasibility = feasibility.feasibility_score,
            blockers = feasibility.blockers.join("; "),
        );

        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            prompt,
        }
    }
}

/// Seam for the advisory service call. Implementations return the raw
/// response text; parsing and validation happen in the decision engine.
#[async_trait]
pub trait AdvisoryClient: Send + Sync {
    async fn advise(&self, request: &AdvisoryRequest) -> Result<String, DecisionError>;
}

/// HTTP-backed advisory client.
#[derive(Debug, Clone)]
pub struct HttpAdvisoryClient {
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct AdvisoryHttpResponse {
    #[serde(default)]
    content: String,
}

impl HttpAdvisoryClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AdvisoryClient for HttpAdvisoryClient {
    async fn advise(&self, request: &AdvisoryRequest) -> Result<String, DecisionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(DecisionError::AdvisoryTransport)?
            .error_for_status()
            .map_err(DecisionError::AdvisoryTransport)?;

        let body: AdvisoryHttpResponse = response
            .json()
            .await
            .map_err(DecisionError::AdvisoryTransport)?;
        Ok(body.content)
    }
}

/// Test double returning a fixed response (or a fixed failure).
#[derive(Debug, Clone, Default)]
pub struct StaticAdvisoryClient {
    response: Option<String>,
}

impl StaticAdvisoryClient {
    /// Always answers with the given text.
    pub fn answering(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
        }
    }

    /// Always fails, driving callers down the fallback path.
    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl AdvisoryClient for StaticAdvisoryClient {
    async fn advise(&self, _request: &AdvisoryRequest) -> Result<String, DecisionError> {
        match &self.response {
            Some(text) => Ok(text.clone()),
            None => Err(DecisionError::UnparsableResponse),
        }
    }
}
