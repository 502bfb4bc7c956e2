//! Advisory payload parsing and validation.
//!
//! The advisory service answers in text. `parse_payload` recovers a JSON
//! object from it (direct parse, then `{...}` extraction, then a keyword
//! scan of the raw text); `validate_payload` range-checks the object into a
//! `ValidatedPayload`. Any failure here feeds the rule-based fallback.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

use crate::errors::DecisionError;
use crate::model::{RemediationType, RiskLevel};

static BRACE_SCAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{.*\}").unwrap());

/// A fully validated advisory payload, ready to become a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedPayload {
    pub remediation_type: RemediationType,
    pub confidence_score: f64,
    pub reasoning: String,
    pub estimated_effort: u32,
    pub risk_if_delayed: RiskLevel,
    pub prerequisites: Vec<String>,
    pub recommended_actions: Vec<String>,
}

/// Recover a JSON object from advisory response text.
pub fn parse_payload(text: &str) -> Result<Value, DecisionError> {
    let trimmed = text.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(Value::Object(map));
    }

    // The response often wraps the object in prose; take the outermost braces
    if let Some(found) = BRACE_SCAN.find(trimmed)
        && let Ok(Value::Object(map)) = serde_json::from_str::<Value>(found.as_str())
    {
        return Ok(Value::Object(map));
    }

    keyword_scan(trimmed).ok_or(DecisionError::UnparsableResponse)
}

/// Last-resort recovery: build a conservative payload from keywords in the
/// raw text. Returns `None` when the text mentions nothing recognizable.
fn keyword_scan(text: &str) -> Option<Value> {
    let lower = text.to_lowercase();
    let mentions_any = ["automatic", "manual", "high", "risk"]
        .iter()
        .any(|kw| lower.contains(kw));
    if !mentions_any {
        return None;
    }

    let remediation_type = if lower.contains("manual") {
        "manual_only"
    } else if lower.contains("automatic") {
        "automatic"
    } else {
        "human_in_loop"
    };
    let risk_if_delayed = if lower.contains("high") || lower.contains("risk") {
        "high"
    } else {
        "medium"
    };

    Some(serde_json::json!({
        "remediation_type": remediation_type,
        "confidence_score": 0.5,
        "reasoning": "Recovered from non-JSON advisory response",
        "estimated_effort": 60,
        "risk_if_delayed": risk_if_delayed,
        "prerequisites": ["Manual review required"],
    }))
}

/// Range-check a parsed payload into a `ValidatedPayload`.
pub fn validate_payload(value: &Value) -> Result<ValidatedPayload, DecisionError> {
    let remediation_type = required_str(value, "remediation_type")?;
    let remediation_type =
        RemediationType::parse(remediation_type).ok_or(DecisionError::InvalidField {
            field: "remediation_type",
            message: format!("unknown type '{remediation_type}'"),
        })?;

    let confidence_score = value
        .get("confidence_score")
        .ok_or(DecisionError::MissingField {
            field: "confidence_score",
        })?
        .as_f64()
        .ok_or(DecisionError::InvalidField {
            field: "confidence_score",
            message: "not a number".to_string(),
        })?;
    if !(0.0..=1.0).contains(&confidence_score) {
        return Err(DecisionError::InvalidField {
            field: "confidence_score",
            message: format!("{confidence_score} outside [0, 1]"),
        });
    }

    let reasoning = required_str(value, "reasoning")?.to_string();

    let estimated_effort = value
        .get("estimated_effort")
        .ok_or(DecisionError::MissingField {
            field: "estimated_effort",
        })?
        .as_u64()
        .ok_or(DecisionError::InvalidField {
            field: "estimated_effort",
            message: "not a non-negative integer".to_string(),
        })?;
    let estimated_effort = u32::try_from(estimated_effort).map_err(|_| {
        DecisionError::InvalidField {
            field: "estimated_effort",
            message: format!("{estimated_effort} too large"),
        }
    })?;

    let risk_raw = required_str(value, "risk_if_delayed")?;
    let risk_if_delayed = RiskLevel::parse(risk_raw).ok_or(DecisionError::InvalidField {
        field: "risk_if_delayed",
        message: format!("unknown risk level '{risk_raw}'"),
    })?;

    Ok(ValidatedPayload {
        remediation_type,
        confidence_score,
        reasoning,
        estimated_effort,
        risk_if_delayed,
        prerequisites: string_list(value, "prerequisites"),
        recommended_actions: string_list(value, "recommended_actions"),
    })
}

fn required_str<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, DecisionError> {
    value
        .get(field)
        .ok_or(DecisionError::MissingField { field })?
        .as_str()
        .ok_or(DecisionError::InvalidField {
            field,
            message: "not a string".to_string(),
        })
}

fn string_list(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
