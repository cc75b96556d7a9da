mod types;

pub use types::{AttemptMetrics, AttemptOutcome, MetricsSnapshot, SystemMetrics};

use std::sync::Arc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

const MAX_RECENT_ATTEMPTS: usize = 20;

/// Counters for the decode loop, plus process CPU/RAM so the throttle can be
/// judged against what it actually costs.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_attempts: Vec<AttemptMetrics>,
    attempt_count: u64,
    cropped_count: u64,
    throttled_count: u64,
    transient_failure_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // Baseline refresh; CPU usage is a delta between two refreshes.
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_attempts: Vec::with_capacity(MAX_RECENT_ATTEMPTS),
                attempt_count: 0,
                cropped_count: 0,
                throttled_count: 0,
                transient_failure_count: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_attempt(&self, metrics: AttemptMetrics) {
        let mut state = self.inner.lock().await;

        state.attempt_count += 1;
        if metrics.cropped {
            state.cropped_count += 1;
        }
        if metrics.outcome == AttemptOutcome::TransientFailure {
            state.transient_failure_count += 1;
        }

        state.recent_attempts.push(metrics);
        if state.recent_attempts.len() > MAX_RECENT_ATTEMPTS {
            state.recent_attempts.remove(0);
        }
    }

    pub async fn record_throttled(&self) {
        self.inner.lock().await.throttled_count += 1;
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;

        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system_metrics = if let Some(process) = state.system.process(pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        MetricsSnapshot {
            system: system_metrics,
            recent_attempts: state.recent_attempts.clone(),
            attempt_count: state.attempt_count,
            cropped_count: state.cropped_count,
            throttled_count: state.throttled_count,
            transient_failure_count: state.transient_failure_count,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_attempts.clear();
        state.attempt_count = 0;
        state.cropped_count = 0;
        state.throttled_count = 0;
        state.transient_failure_count = 0;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
