use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::DetectionEngine;
use crate::scanner::ScanError;

use super::{FeedbackState, ManualStartLabel};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ScanStatus {
    #[default]
    Idle,
    Starting,
    Scanning,
    ManualStartRequired,
    Failed,
    Completed,
    Stopped,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Idle => "Idle",
            ScanStatus::Starting => "Starting",
            ScanStatus::Scanning => "Scanning",
            ScanStatus::ManualStartRequired => "ManualStartRequired",
            ScanStatus::Failed => "Failed",
            ScanStatus::Completed => "Completed",
            ScanStatus::Stopped => "Stopped",
        }
    }
}

/// Serializable view of a scan session handed back to the host after every
/// intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub status: ScanStatus,
    pub scanning: bool,
    pub engine: DetectionEngine,
    pub feedback: FeedbackState,
    pub manual_start: Option<ManualStartLabel>,
    pub error: Option<ScanError>,
    pub last_decoded: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub stream_id: Option<String>,
    pub navigated_to: Option<String>,
}
