//! End-to-end signal processing (`remedy run`).

use anyhow::Result;
use std::path::Path;

use remedy::config::EngineConfig;
use remedy::engine::{RemediationEngine, read_signals};
use remedy::orchestrator::{ExecutionSummary, RunStatus};

pub async fn cmd_run(config_path: Option<&Path>, signal_path: &Path, json: bool) -> Result<()> {
    let config = EngineConfig::load_or_default(config_path)?;
    let signals = read_signals(signal_path)?;
    if signals.is_empty() {
        anyhow::bail!("Signal file {} contains no signals", signal_path.display());
    }

    let engine = RemediationEngine::new(config);
    let summaries = engine.process_batch(signals).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        for summary in &summaries {
            print_summary(summary);
        }
        let metrics = engine.metrics_snapshot();
        println!(
            "Processed {} signal(s): {} completed, {} awaiting humans, {} failed",
            metrics.total_processed,
            metrics.total_completed,
            metrics.total_requiring_human,
            metrics.total_failed
        );
    }

    let failed = summaries
        .iter()
        .filter(|s| s.status == RunStatus::Failed)
        .count();
    if failed > 0 {
        anyhow::bail!("{} signal(s) failed to process", failed);
    }
    Ok(())
}

fn print_summary(summary: &ExecutionSummary) {
    let status = match summary.status {
        RunStatus::Completed => "completed",
        RunStatus::RequiresHuman => "requires human",
        RunStatus::Failed => "failed",
    };
    println!("[{}] {} -> {}", summary.violation_id, summary.signal_summary, status);

    if let Some(decision) = &summary.decision {
        println!(
            "  decision: {} (confidence {:.2}, effort {} min)",
            decision.remediation_type.as_str(),
            decision.confidence_score,
            decision.estimated_effort
        );
    }
    if let Some(workflow) = &summary.workflow {
        println!(
            "  workflow: {} step(s), {} completed",
            workflow.step_count(),
            workflow.completed_steps()
        );
    }
    if let Some(human_loop) = &summary.human_loop {
        println!(
            "  human tasks: {} created, {} notification(s) sent, {} reminder(s) scheduled",
            human_loop.tasks.len(),
            human_loop.notifications_sent,
            human_loop.reminders_scheduled
        );
    }
    for error in &summary.errors {
        eprintln!("  error: {error}");
    }
    for step in &summary.next_steps {
        println!("  next: {step}");
    }
}
