use serde::{Deserialize, Serialize};

use crate::models::{FeedbackMessage, ManualStartLabel, SessionInfo};
use crate::{log_info, log_warn};

use super::{ScanController, ScanError};

const ENABLE_LOGS: bool = true;

/// What the host page reports. The controller never subscribes to events
/// itself; the host maps its listeners onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScanIntent {
    /// Page loaded.
    Boot,
    /// Explicit start button.
    Start,
    /// Manual-start affordance tapped.
    ManualStart,
    Cancel,
    Back,
    /// Page shown again; `persisted` when restored from the back/forward cache.
    #[serde(rename_all = "camelCase")]
    PageShow { persisted: bool },
    Unload,
    #[serde(rename_all = "camelCase")]
    VisibilityChanged { hidden: bool },
}

impl ScanController {
    pub async fn dispatch(&self, intent: ScanIntent) -> SessionInfo {
        log_info!("scan intent: {intent:?}");
        match intent {
            ScanIntent::Boot => self.boot().await,
            ScanIntent::Start | ScanIntent::ManualStart => {
                self.hide_manual_start().await;
                self.start_camera(true).await
            }
            ScanIntent::Cancel => {
                self.stop_camera().await;
                let mut state = self.state.lock().await;
                state.set_feedback(FeedbackMessage::Stopped);
                state.manual_start = Some(ManualStartLabel::Restart);
                self.publish(&state);
                state.info()
            }
            ScanIntent::Back => {
                let info = self.stop_camera().await;
                let home = self.settings.home_path.clone();
                self.navigator().navigate(&home);
                info
            }
            ScanIntent::PageShow { persisted: true } => {
                {
                    let mut state = self.state.lock().await;
                    state.set_feedback(FeedbackMessage::Reloading);
                    self.publish(&state);
                }
                self.start_camera(true).await
            }
            ScanIntent::PageShow { persisted: false } => self.get_state().await,
            ScanIntent::Unload => self.stop_camera().await,
            ScanIntent::VisibilityChanged { hidden: true } => {
                let was_active = self.state.lock().await.is_busy();
                let info = self.stop_camera().await;
                if was_active {
                    let mut state = self.state.lock().await;
                    state.stopped_by_visibility = true;
                    return state.info();
                }
                info
            }
            ScanIntent::VisibilityChanged { hidden: false } => {
                let resume = self.state.lock().await.stopped_by_visibility;
                if resume {
                    self.start_camera(false).await
                } else {
                    self.get_state().await
                }
            }
        }
    }

    async fn boot(&self) -> SessionInfo {
        if !self.devices().is_supported() {
            log_warn!("camera access unsupported on this host");
            let mut state = self.state.lock().await;
            state.fail(ScanError::Unsupported);
            self.publish(&state);
            return state.info();
        }
        self.start_camera(false).await
    }

    async fn hide_manual_start(&self) {
        let mut state = self.state.lock().await;
        if state.manual_start.take().is_some() {
            self.publish(&state);
        }
    }
}
