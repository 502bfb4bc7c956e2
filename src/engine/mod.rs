//! The remediation engine: entry point and concurrency control.
//!
//! One `RemediationEngine` owns the orchestrator wiring and an admission
//! semaphore sized by `max_concurrent_workflows`. `process_signal` handles a
//! single signal; `process_batch` fans a batch out over spawned tasks, each
//! holding a permit for its whole run, and returns summaries in input order.

use futures::future::join_all;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::EngineConfig;
use crate::decision::DecisionEngine;
use crate::errors::EngineError;
use crate::human::HumanTaskCoordinator;
use crate::model::{MetricsSnapshot, RemediationMetrics, RemediationSignal};
use crate::notify::{NotificationTransport, NullTransport, RecordingTransport};
use crate::orchestrator::{ExecutionSummary, Orchestrator};
use crate::queue::{InMemoryQueue, QueuePublisher};
use crate::workflow::{StepExecutionDispatcher, builtin_handlers};

/// Top-level engine. Cheap to share behind an `Arc`; every run goes through
/// the same orchestrator and the same admission semaphore.
pub struct RemediationEngine {
    config: EngineConfig,
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<RemediationMetrics>,
    limiter: Arc<Semaphore>,
}

impl RemediationEngine {
    /// Engine with in-process collaborators: an in-memory queue and the
    /// recording notification transport.
    pub fn new(config: EngineConfig) -> Self {
        let transport: Arc<dyn NotificationTransport> = if config.enable_notifications {
            Arc::new(RecordingTransport::new())
        } else {
            Arc::new(NullTransport)
        };
        Self::with_collaborators(config, Arc::new(InMemoryQueue::new()), transport)
    }

    /// Engine over explicit queue and notification implementations.
    pub fn with_collaborators(
        config: EngineConfig,
        queue: Arc<dyn QueuePublisher>,
        transport: Arc<dyn NotificationTransport>,
    ) -> Self {
        let metrics = Arc::new(RemediationMetrics::new());
        let dispatcher = StepExecutionDispatcher::with_handlers(builtin_handlers(
            queue,
            config.queues.clone(),
            transport.clone(),
        ));
        let orchestrator = Orchestrator::new(
            DecisionEngine::from_config(&config.advisory),
            dispatcher,
            HumanTaskCoordinator::new(transport),
            metrics.clone(),
        );
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_workflows.max(1)));
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            metrics,
            limiter,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Process one signal under the admission semaphore.
    pub async fn process_signal(
        &self,
        signal: RemediationSignal,
    ) -> Result<ExecutionSummary, EngineError> {
        let _permit = self
            .limiter
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| EngineError::LimiterClosed)?;
        Ok(self.orchestrator.run(signal).await)
    }

    /// Process a batch concurrently, at most `max_concurrent_workflows` at a
    /// time. Summaries come back in input order.
    pub async fn process_batch(
        &self,
        signals: Vec<RemediationSignal>,
    ) -> Result<Vec<ExecutionSummary>, EngineError> {
        tracing::info!(
            count = signals.len(),
            limit = self.config.max_concurrent_workflows,
            "processing signal batch"
        );
        let mut handles = Vec::with_capacity(signals.len());
        for signal in signals {
            let permit = self
                .limiter
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::LimiterClosed)?;
            let orchestrator = self.orchestrator.clone();
            let violation_id = signal.violation.id.clone();
            let handle = tokio::spawn(async move {
                let summary = orchestrator.run(signal).await;
                drop(permit);
                summary
            });
            handles.push((violation_id, handle));
        }

        let (ids, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let mut summaries = Vec::with_capacity(ids.len());
        for (violation_id, joined) in ids.into_iter().zip(join_all(handles).await) {
            match joined {
                Ok(summary) => summaries.push(summary),
                Err(_) => return Err(EngineError::RunAborted { violation_id }),
            }
        }
        Ok(summaries)
    }
}

/// Read one signal, or a JSON array of signals, from a file.
pub fn read_signals(path: &Path) -> Result<Vec<RemediationSignal>, EngineError> {
    let raw = std::fs::read_to_string(path).map_err(|source| EngineError::SignalReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value =
        serde_json::from_str(&raw).map_err(|source| EngineError::SignalParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

    let parse = |value: Value| {
        serde_json::from_value(value).map_err(|source| EngineError::SignalParseFailed {
            path: path.to_path_buf(),
            source,
        })
    };
    match value {
        Value::Array(items) => items.into_iter().map(parse).collect(),
        other => Ok(vec![parse(other)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProcessingActivity, RiskLevel, Violation};
    use crate::orchestrator::RunStatus;
    use std::fs;
    use tempfile::tempdir;

    fn signal(id: &str, risk: RiskLevel) -> RemediationSignal {
        let violation = Violation::new(id, "retention period exceeded", risk)
            .with_framework("gdpr_eu")
            .with_actions(vec!["Update retention settings".to_string()]);
        RemediationSignal::new(violation, ProcessingActivity::new("a-1", "activity"))
    }

    #[tokio::test]
    async fn test_single_signal_round_trip() {
        let engine = RemediationEngine::new(EngineConfig::default());
        let summary = engine
            .process_signal(signal("v-1", RiskLevel::Low))
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(engine.metrics_snapshot().total_processed, 1);
    }

    #[tokio::test]
    async fn test_automatic_run_publishes_queue_handoff() {
        use crate::config::QueueConfig;
        use crate::notify::RecordingTransport;

        let queue = Arc::new(InMemoryQueue::new());
        let transport: Arc<dyn NotificationTransport> = Arc::new(RecordingTransport::new());
        let engine = RemediationEngine::with_collaborators(
            EngineConfig::default(),
            queue.clone(),
            transport,
        );

        let summary = engine
            .process_signal(signal("v-q", RiskLevel::Low))
            .await
            .unwrap();
        assert_eq!(summary.status, RunStatus::Completed);

        let messages = queue.messages_on(&QueueConfig::default().main_queue).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["violation_id"], "v-q");
        assert_eq!(messages[1]["mode"], "auto");
    }

    #[tokio::test]
    async fn test_batch_preserves_input_order() {
        let engine = RemediationEngine::new(
            EngineConfig::default().with_max_concurrent_workflows(2),
        );
        let signals = (0..6)
            .map(|i| signal(&format!("v-{i}"), RiskLevel::Low))
            .collect();
        let summaries = engine.process_batch(signals).await.unwrap();

        assert_eq!(summaries.len(), 6);
        for (i, summary) in summaries.iter().enumerate() {
            assert_eq!(summary.violation_id, format!("v-{i}"));
        }
        assert_eq!(engine.metrics_snapshot().total_processed, 6);
    }

    #[tokio::test]
    async fn test_batch_mixes_automatic_and_human_routes() {
        let engine = RemediationEngine::new(EngineConfig::default());
        let summaries = engine
            .process_batch(vec![
                signal("v-auto", RiskLevel::Low),
                signal("v-critical", RiskLevel::Critical),
            ])
            .await
            .unwrap();

        assert_eq!(summaries[0].status, RunStatus::Completed);
        assert_eq!(summaries[1].status, RunStatus::RequiresHuman);
        assert_eq!(engine.metrics_snapshot().total_requiring_human, 1);
    }

    #[test]
    fn test_read_signals_accepts_object_or_array() {
        let dir = tempdir().unwrap();
        let single = dir.path().join("single.json");
        fs::write(
            &single,
            serde_json::to_string(&signal("v-1", RiskLevel::Low)).unwrap(),
        )
        .unwrap();
        assert_eq!(read_signals(&single).unwrap().len(), 1);

        let batch = dir.path().join("batch.json");
        fs::write(
            &batch,
            serde_json::to_string(&vec![
                signal("v-1", RiskLevel::Low),
                signal("v-2", RiskLevel::High),
            ])
            .unwrap(),
        )
        .unwrap();
        let signals = read_signals(&batch).unwrap();
        assert_eq!(signals.len(), 2);
        assert_eq!(signals[1].violation.id, "v-2");
    }

    #[test]
    fn test_read_signals_reports_parse_failures() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_signals(&path),
            Err(EngineError::SignalParseFailed { .. })
        ));
    }
}
