//! Typed error hierarchy for the remediation engine.
//!
//! Three top-level enums cover the three subsystems:
//! - `DecisionError`: advisory transport and payload failures
//! - `WorkflowError`: step generation and dispatch failures
//! - `EngineError`: configuration and run plumbing failures
//!
//! Decision errors never escape the decision engine; any variant resolves
//! to the rule-based fallback path.

use thiserror::Error;

/// Errors from the advisory call and payload validation.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("Advisory service request failed: {0}")]
    AdvisoryTransport(#[source] reqwest::Error),

    #[error("Advisory response contained no parsable JSON object")]
    UnparsableResponse,

    #[error("Advisory payload missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Advisory payload field '{field}' is out of range or malformed: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from workflow generation and step dispatch.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Unsupported action type: {action_type}")]
    UnsupportedActionType { action_type: String },

    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    #[error("Workflow {id} has no steps")]
    EmptyWorkflow { id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from engine setup and run plumbing.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read config file at {path}: {source}")]
    ConfigReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ConfigParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to read signal file at {path}: {source}")]
    SignalReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse signal file at {path}: {source}")]
    SignalParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Concurrency limiter closed unexpectedly")]
    LimiterClosed,

    #[error("Run for violation {violation_id} panicked or was aborted")]
    RunAborted { violation_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
