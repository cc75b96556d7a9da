use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOutcome {
    NoCode,
    Decoded,
    Duplicate,
    TransientFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptMetrics {
    pub timestamp: DateTime<Utc>,
    pub decode_ms: u64,
    pub cropped: bool,
    pub frame_width: u32,
    pub frame_height: u32,
    pub outcome: AttemptOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_attempts: Vec<AttemptMetrics>,
    pub attempt_count: u64,
    pub cropped_count: u64,
    pub throttled_count: u64,
    pub transient_failure_count: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_attempts: Vec::new(),
            attempt_count: 0,
            cropped_count: 0,
            throttled_count: 0,
            transient_failure_count: 0,
        }
    }
}
