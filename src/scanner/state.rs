use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::DetectionEngine;
use crate::models::{
    DecodedPayload, FeedbackMessage, FeedbackState, ManualStartLabel, ScanStatus, SessionInfo,
};

use super::ScanError;

/// Lifecycle of one scan session (one page view).
#[derive(Debug, Clone)]
pub struct ScanState {
    pub session_id: String,
    pub status: ScanStatus,
    /// Cooperative cancellation flag, read once per loop iteration.
    pub scanning: bool,
    pub engine: DetectionEngine,
    pub last_decoded: Option<DecodedPayload>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub feedback: FeedbackMessage,
    pub manual_start: Option<ManualStartLabel>,
    pub error: Option<ScanError>,
    /// Id of the stream the session holds; `Some` exactly while it owns one.
    pub stream_id: Option<String>,
    pub navigated_to: Option<String>,
    /// Set when the camera was released because the page went hidden.
    pub stopped_by_visibility: bool,
    /// Bumped by every start and every stop. A start attempt that finds a
    /// different value after an await has been superseded.
    pub start_generation: u64,
}

impl Default for ScanState {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            status: ScanStatus::Idle,
            scanning: false,
            engine: DetectionEngine::None,
            last_decoded: None,
            last_attempt_at: None,
            feedback: FeedbackMessage::Idle,
            manual_start: None,
            error: None,
            stream_id: None,
            navigated_to: None,
            stopped_by_visibility: false,
            start_generation: 0,
        }
    }
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stream is held, being acquired, or the loop is running.
    pub fn is_busy(&self) -> bool {
        self.stream_id.is_some() || self.scanning || self.status == ScanStatus::Starting
    }

    /// Returns the generation of this start attempt.
    pub fn begin_start(&mut self, user_initiated: bool) -> u64 {
        self.start_generation += 1;
        self.status = ScanStatus::Starting;
        self.manual_start = None;
        self.error = None;
        self.stopped_by_visibility = false;
        self.feedback = if user_initiated {
            FeedbackMessage::StartingCamera
        } else {
            FeedbackMessage::RequestingPermission
        };
        self.start_generation
    }

    pub fn is_current_start(&self, generation: u64) -> bool {
        self.start_generation == generation
    }

    pub fn set_feedback(&mut self, message: FeedbackMessage) {
        self.feedback = message;
    }

    pub fn require_manual_start(&mut self, message: FeedbackMessage) {
        self.release();
        self.status = ScanStatus::ManualStartRequired;
        self.feedback = message;
        self.manual_start = Some(ManualStartLabel::TapToStart);
    }

    pub fn fail(&mut self, error: ScanError) {
        self.release();
        self.status = ScanStatus::Failed;
        self.feedback = error.feedback();
        self.manual_start = error
            .is_user_recoverable()
            .then_some(ManualStartLabel::TryAgain);
        self.error = Some(error);
    }

    pub fn begin_scanning(&mut self, engine: DetectionEngine) {
        self.scanning = true;
        self.engine = engine;
        self.status = ScanStatus::Scanning;
        if engine == DetectionEngine::None {
            self.feedback = FeedbackMessage::NoDecoder;
            self.error = Some(ScanError::NoDecodingEngineAvailable);
        } else {
            self.feedback = FeedbackMessage::CameraActive;
        }
    }

    /// Debounce: `false` when `payload` repeats the last accepted one.
    pub fn accept_payload(&mut self, payload: &DecodedPayload) -> bool {
        if self.last_decoded.as_ref() == Some(payload) {
            return false;
        }
        self.last_decoded = Some(payload.clone());
        self.feedback = FeedbackMessage::Detected;
        true
    }

    pub fn complete(&mut self, target: String) {
        self.release();
        self.status = ScanStatus::Completed;
        self.navigated_to = Some(target);
    }

    /// Drops the scanning flag and the stream marker; status is left alone.
    pub fn release(&mut self) {
        self.scanning = false;
        self.stream_id = None;
    }

    /// Also supersedes any start attempt still waiting on the camera.
    pub fn stop(&mut self) {
        self.release();
        self.start_generation += 1;
        if matches!(self.status, ScanStatus::Scanning | ScanStatus::Starting) {
            self.status = ScanStatus::Stopped;
            self.feedback = FeedbackMessage::Stopped;
        }
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            session_id: self.session_id.clone(),
            status: self.status,
            scanning: self.scanning,
            engine: self.engine,
            feedback: FeedbackState::from(&self.feedback),
            manual_start: self.manual_start,
            error: self.error.clone(),
            last_decoded: self.last_decoded.as_ref().map(|p| p.to_string()),
            last_attempt_at: self.last_attempt_at,
            stream_id: self.stream_id.clone(),
            navigated_to: self.navigated_to.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(raw: &str) -> DecodedPayload {
        DecodedPayload::new(raw).unwrap()
    }

    #[test]
    fn immediate_repeats_are_suppressed() {
        let mut state = ScanState::new();
        let fired: Vec<&str> = ["A", "A", "B", "A"]
            .into_iter()
            .filter(|raw| state.accept_payload(&payload(raw)))
            .collect();
        assert_eq!(fired, vec!["A", "B", "A"]);
    }

    #[test]
    fn automatic_start_asks_for_permission() {
        let mut state = ScanState::new();
        state.begin_start(false);
        assert_eq!(state.status, ScanStatus::Starting);
        assert_eq!(state.feedback, FeedbackMessage::RequestingPermission);
        assert!(state.is_busy());

        state.begin_start(true);
        assert_eq!(state.feedback, FeedbackMessage::StartingCamera);
    }

    #[test]
    fn failure_offers_retry_and_keeps_error_flag() {
        let mut state = ScanState::new();
        state.stream_id = Some("s1".into());
        state.fail(ScanError::DeviceBusy);

        let info = state.info();
        assert_eq!(info.status, ScanStatus::Failed);
        assert!(info.feedback.is_error);
        assert_eq!(info.manual_start, Some(ManualStartLabel::TryAgain));
        assert!(info.stream_id.is_none());
        assert!(!state.is_busy());
    }

    #[test]
    fn missing_engine_is_reported_while_scanning() {
        let mut state = ScanState::new();
        state.begin_scanning(DetectionEngine::None);
        assert!(state.scanning);
        assert_eq!(state.error, Some(ScanError::NoDecodingEngineAvailable));
        assert!(state.info().feedback.is_error);
    }

    #[test]
    fn stop_only_rewrites_active_statuses() {
        let mut state = ScanState::new();
        state.begin_scanning(DetectionEngine::LibraryDecoder);
        state.stop();
        assert_eq!(state.status, ScanStatus::Stopped);

        state.complete("/truss/generic/?qr=1".into());
        state.stop();
        assert_eq!(state.status, ScanStatus::Completed);
    }

    #[test]
    fn stopping_an_active_session_clears_camera_prompt() {
        let mut state = ScanState::new();
        state.begin_scanning(DetectionEngine::LibraryDecoder);
        assert_eq!(state.feedback, FeedbackMessage::CameraActive);

        state.stop();
        let info = state.info();
        assert_eq!(info.feedback.message, "Scanner stopped.");
        assert!(!info.feedback.is_error);
    }

    #[test]
    fn stop_supersedes_pending_start() {
        let mut state = ScanState::new();
        let generation = state.begin_start(false);
        assert!(state.is_current_start(generation));

        state.stop();
        assert!(!state.is_current_start(generation));
        assert_eq!(state.status, ScanStatus::Stopped);

        let next = state.begin_start(true);
        assert!(state.is_current_start(next));
        assert_ne!(next, generation);
    }

    #[test]
    fn retry_offered_only_for_recoverable_failures() {
        let mut state = ScanState::new();
        state.fail(ScanError::Unsupported);
        assert_eq!(state.status, ScanStatus::Failed);
        assert!(state.manual_start.is_none());

        state.fail(ScanError::Camera("AbortError".into()));
        assert_eq!(state.manual_start, Some(ManualStartLabel::TryAgain));
    }
}
