//! Process-wide aggregate counters.
//!
//! One `RemediationMetrics` instance lives in the engine context and is
//! shared by every concurrent run. Scalar totals are atomics; the keyed
//! counts sit behind a mutex since they are touched once per run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::decision::RemediationType;
use super::signal::RiskLevel;

/// Shared counters updated by concurrent orchestration runs.
#[derive(Debug, Default)]
pub struct RemediationMetrics {
    total_processed: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
    total_requiring_human: AtomicU64,
    by_type: Mutex<HashMap<String, u64>>,
    by_risk_level: Mutex<HashMap<String, u64>>,
    by_framework: Mutex<HashMap<String, u64>>,
}

/// Point-in-time copy of the counters, safe to serialize into summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MetricsSnapshot {
    pub total_processed: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub total_requiring_human: u64,
    pub by_type: HashMap<String, u64>,
    pub by_risk_level: HashMap<String, u64>,
    pub by_framework: HashMap<String, u64>,
}

impl RemediationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_processed(
        &self,
        remediation_type: RemediationType,
        risk_level: RiskLevel,
        framework: &str,
    ) {
        self.total_processed.fetch_add(1, Ordering::Relaxed);
        bump(&self.by_type, remediation_type.as_str());
        bump(&self.by_risk_level, risk_level.as_str());
        bump(&self.by_framework, framework);
    }

    pub fn record_completed(&self) {
        self.total_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.total_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_requiring_human(&self) {
        self.total_requiring_human.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_processed: self.total_processed.load(Ordering::Relaxed),
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            total_requiring_human: self.total_requiring_human.load(Ordering::Relaxed),
            by_type: clone_map(&self.by_type),
            by_risk_level: clone_map(&self.by_risk_level),
            by_framework: clone_map(&self.by_framework),
        }
    }
}

fn bump(map: &Mutex<HashMap<String, u64>>, key: &str) {
    let mut guard = match map.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard.entry(key.to_string()).or_insert(0) += 1;
}

fn clone_map(map: &Mutex<HashMap<String, u64>>) -> HashMap<String, u64> {
    match map.lock() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
