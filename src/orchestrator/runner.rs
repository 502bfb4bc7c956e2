//! The stage pipeline for one signal.

use std::sync::Arc;

use crate::analysis::{ComplexityAssessor, FeasibilityValidator};
use crate::decision::{DecisionEngine, conservative_decision};
use crate::errors::WorkflowError;
use crate::human::HumanTaskCoordinator;
use crate::model::{RemediationMetrics, RemediationType, StepStatus, WorkflowStatus};
use crate::workflow::{StepExecutionDispatcher, WorkflowStepGenerator, validate_plan};

use super::state::{ExecutionSummary, OrchestrationState};
use crate::model::RemediationSignal;

/// Drives one signal through analysis, decision, planning and either
/// automated execution or the human loop. Never returns an error; every
/// failure is recorded in the summary instead.
pub struct Orchestrator {
    decision_engine: DecisionEngine,
    complexity: ComplexityAssessor,
    feasibility: FeasibilityValidator,
    generator: WorkflowStepGenerator,
    dispatcher: StepExecutionDispatcher,
    coordinator: HumanTaskCoordinator,
    metrics: Arc<RemediationMetrics>,
}

impl Orchestrator {
    pub fn new(
        decision_engine: DecisionEngine,
        dispatcher: StepExecutionDispatcher,
        coordinator: HumanTaskCoordinator,
        metrics: Arc<RemediationMetrics>,
    ) -> Self {
        Self {
            decision_engine,
            complexity: ComplexityAssessor::new(),
            dispatcher,
            coordinator,
            metrics,
            feasibility: FeasibilityValidator::new(),
            generator: WorkflowStepGenerator::new(),
        }
    }

    /// Run the full pipeline for one signal.
    pub async fn run(&self, signal: RemediationSignal) -> ExecutionSummary {
        let mut state = OrchestrationState::new(signal);

        self.analyze(&mut state);
        self.decide(&mut state).await;
        self.plan(&mut state);

        let route = self.route(&state);
        match route {
            Route::Execute => self.execute(&mut state).await,
            Route::HumanLoop => self.human_loop(&mut state).await,
            Route::Abort => state.mark("run_aborted"),
        }

        self.finalize(state)
    }

    fn analyze(&self, state: &mut OrchestrationState) {
        state.mark("analyze_started");
        state.complexity = Some(self.complexity.assess(&state.signal));
        state.feasibility = Some(self.feasibility.validate(&state.signal, None));
        state.mark("analyze_completed");
    }

    async fn decide(&self, state: &mut OrchestrationState) {
        state.mark("decide_started");
        // Analysis has no failure mode, both reports are always present here
        let (complexity, feasibility) = match (state.complexity.clone(), state.feasibility.clone())
        {
            (Some(c), Some(f)) => (c, f),
            _ => {
                state.record_error("analysis reports missing, using conservative decision");
                state.decision = Some(conservative_decision(&state.signal));
                state.mark("decide_failed");
                return;
            }
        };

        let decision = self
            .decision_engine
            .decide(&state.signal, &complexity, &feasibility)
            .await;
        self.metrics.record_processed(
            decision.remediation_type,
            state.signal.violation.risk_level,
            &state.signal.framework,
        );
        state.decision = Some(decision);
        state.mark("decide_completed");
    }

    fn plan(&self, state: &mut OrchestrationState) {
        let Some(decision) = state.decision.clone() else {
            return;
        };

        state.mark("plan_started");
        let workflow = self.generator.generate(&state.signal, &decision);
        let validation = validate_plan(&state.signal, &decision, &workflow);
        if !validation.valid {
            for error in &validation.errors {
                state.record_error(error.clone());
            }
            state.mark("plan_rejected");
        } else {
            state.mark("plan_completed");
        }
        state.validation = Some(validation);
        state.workflow = Some(workflow);
    }

    fn route(&self, state: &OrchestrationState) -> Route {
        let plan_rejected = state.validation.as_ref().is_some_and(|v| !v.valid);
        if state.decision.is_none()
            || state.workflow.is_none()
            || plan_rejected
            || state.has_blocking_error()
        {
            return Route::Abort;
        }
        match state.decision.as_ref().map(|d| d.remediation_type) {
            Some(RemediationType::Automatic) => Route::Execute,
            _ => Route::HumanLoop,
        }
    }

    async fn execute(&self, state: &mut OrchestrationState) {
        let Some(workflow) = state.workflow.as_mut() else {
            return;
        };

        state.execution_path.push("execute_started".to_string());
        let report = self.dispatcher.execute_workflow(workflow).await;
        if let Some(error) = &report.first_error {
            let failed_step = state
                .workflow
                .as_ref()
                .and_then(|wf| wf.steps.iter().find(|s| s.status == StepStatus::Failed))
                .map(|s| s.name.clone())
                .unwrap_or_default();
            state.record_error(
                WorkflowError::StepFailed {
                    step: failed_step,
                    message: error.clone(),
                }
                .to_string(),
            );
            state.mark("execute_failed");
        } else {
            state.mark("execute_completed");
        }
        state.execution = Some(report);
    }

    async fn human_loop(&self, state: &mut OrchestrationState) {
        let (Some(decision), Some(workflow), Some(complexity)) =
            (&state.decision, &mut state.workflow, &state.complexity)
        else {
            return;
        };

        state.execution_path.push("human_loop_started".to_string());
        let report = self
            .coordinator
            .coordinate(
                &state.signal,
                decision,
                workflow,
                complexity.overall_complexity,
            )
            .await;
        workflow.status = WorkflowStatus::RequiresHuman;
        self.metrics.record_requiring_human();
        state.human_loop = Some(report);
        state.mark("human_loop_completed");
    }

    fn finalize(&self, mut state: OrchestrationState) -> ExecutionSummary {
        state.mark("finalize");
        let status = state.derive_status();
        match status {
            super::state::RunStatus::Completed => self.metrics.record_completed(),
            super::state::RunStatus::Failed => {
                tracing::warn!(
                    violation_id = %state.signal.violation.id,
                    errors = state.errors.len(),
                    "remediation run failed"
                );
                self.metrics.record_failed();
            }
            super::state::RunStatus::RequiresHuman => {}
        }
        tracing::debug!(violation_id = %state.signal.violation.id, ?status, "run finished");
        ExecutionSummary::from_state(state, self.metrics.snapshot())
    }
}

enum Route {
    Execute,
    HumanLoop,
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueueConfig;
    use crate::model::{ProcessingActivity, RiskLevel, Violation};
    use crate::notify::RecordingTransport;
    use crate::orchestrator::RunStatus;
    use crate::queue::InMemoryQueue;
    use crate::workflow::builtin_handlers;

    fn orchestrator() -> Orchestrator {
        let transport = Arc::new(RecordingTransport::new());
        let queue = Arc::new(InMemoryQueue::new());
        Orchestrator::new(
            DecisionEngine::rule_based_only(),
            StepExecutionDispatcher::with_handlers(builtin_handlers(
                queue,
                QueueConfig::default(),
                transport.clone(),
            )),
            HumanTaskCoordinator::new(transport),
            Arc::new(RemediationMetrics::new()),
        )
    }

    fn signal(risk: RiskLevel, actions: Vec<&str>) -> RemediationSignal {
        let violation = Violation::new("v-1", "test violation", risk)
            .with_framework("gdpr_eu")
            .with_actions(actions.into_iter().map(String::from).collect());
        RemediationSignal::new(violation, ProcessingActivity::new("a-1", "activity"))
    }

    #[tokio::test]
    async fn test_low_risk_signal_executes_automatically() {
        let summary = orchestrator()
            .run(signal(RiskLevel::Low, vec!["Update retention settings"]))
            .await;

        assert_eq!(summary.status, RunStatus::Completed);
        assert!(summary.success);
        assert!(
            summary
                .execution_path
                .contains(&"execute_completed".to_string())
        );
        assert!(summary.human_loop.is_none());
        assert_eq!(summary.metrics.total_completed, 1);
    }

    #[tokio::test]
    async fn test_high_risk_signal_routes_to_human_loop() {
        let summary = orchestrator()
            .run(signal(
                RiskLevel::High,
                vec!["Delete user records", "Notify affected users"],
            ))
            .await;

        assert_eq!(summary.status, RunStatus::RequiresHuman);
        let human_loop = summary.human_loop.expect("human loop report");
        assert!(!human_loop.tasks.is_empty());
        assert!(summary.execution.is_none());
        assert_eq!(summary.metrics.total_requiring_human, 1);
        assert!(
            summary
                .next_steps
                .iter()
                .all(|s| s.starts_with("Complete task"))
        );
    }

    #[tokio::test]
    async fn test_critical_signal_never_executes() {
        let summary = orchestrator()
            .run(signal(RiskLevel::Critical, vec!["Purge unauthorized data"]))
            .await;

        assert_ne!(summary.status, RunStatus::Completed);
        assert!(summary.execution.is_none());
        let decision = summary.decision.expect("decision");
        assert_ne!(decision.remediation_type, RemediationType::Automatic);
    }

    #[tokio::test]
    async fn test_missing_analysis_falls_back_to_conservative_decision() {
        let orchestrator = orchestrator();
        let mut state =
            OrchestrationState::new(signal(RiskLevel::Medium, vec!["Update settings"]));

        // Reports deliberately absent; decide must still leave a usable decision
        orchestrator.decide(&mut state).await;

        let decision = state.decision.expect("conservative decision");
        assert_eq!(decision.remediation_type, RemediationType::HumanInLoop);
        assert!((decision.confidence_score - 0.3).abs() < 1e-9);
        assert_eq!(decision.estimated_effort, 180);
        assert!(!state.errors.is_empty());
        assert!(state.execution_path.contains(&"decide_failed".to_string()));
    }

    #[tokio::test]
    async fn test_execution_failure_is_recorded_not_raised() {
        use crate::model::{ActionType, RemediationWorkflow, WorkflowStep};
        use crate::workflow::{StepHandler, StepResult};
        use async_trait::async_trait;
        use std::collections::HashMap;

        struct AlwaysFail;

        #[async_trait]
        impl StepHandler for AlwaysFail {
            async fn execute(
                &self,
                _step: &WorkflowStep,
                _wf: &RemediationWorkflow,
            ) -> StepResult {
                StepResult::failed("simulated outage")
            }
        }

        let handlers: HashMap<ActionType, Arc<dyn StepHandler>> = [
            ActionType::ApiCall,
            ActionType::DataAnalysis,
            ActionType::PrerequisiteValidation,
            ActionType::CompletionVerification,
            ActionType::ComplianceStatusUpdate,
        ]
        .into_iter()
        .map(|t| (t, Arc::new(AlwaysFail) as Arc<dyn StepHandler>))
        .collect();

        let transport = Arc::new(RecordingTransport::new());
        let orchestrator = Orchestrator::new(
            DecisionEngine::rule_based_only(),
            StepExecutionDispatcher::with_handlers(handlers),
            HumanTaskCoordinator::new(transport),
            Arc::new(RemediationMetrics::new()),
        );

        let summary = orchestrator
            .run(signal(RiskLevel::Low, vec!["Update retention settings"]))
            .await;
        assert_eq!(summary.status, RunStatus::Failed);
        assert!(summary.errors.iter().any(|e| e.contains("simulated outage")));
        assert_eq!(summary.metrics.total_failed, 1);
    }

    #[tokio::test]
    async fn test_execution_path_records_every_stage() {
        let summary = orchestrator()
            .run(signal(RiskLevel::Low, vec!["Update retention settings"]))
            .await;
        for marker in [
            "analyze_started",
            "analyze_completed",
            "decide_started",
            "decide_completed",
            "plan_started",
            "plan_completed",
            "execute_started",
            "finalize",
        ] {
            assert!(
                summary.execution_path.contains(&marker.to_string()),
                "missing marker {marker}"
            );
        }
    }
}
