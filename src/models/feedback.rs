use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed catalogue of user-facing scanner messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackMessage {
    Idle,
    RequestingPermission,
    StartingCamera,
    TryingFallback,
    CameraActive,
    NoDecoder,
    PermissionDenied,
    DeviceNotFound,
    DeviceBusy,
    Other(String),
    TapToStart,
    PlaybackBlocked,
    PlaybackFailed,
    Detected,
    Stopped,
    Reloading,
    Unsupported,
}

impl FeedbackMessage {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            FeedbackMessage::NoDecoder
                | FeedbackMessage::PermissionDenied
                | FeedbackMessage::DeviceNotFound
                | FeedbackMessage::DeviceBusy
                | FeedbackMessage::Other(_)
                | FeedbackMessage::PlaybackFailed
                | FeedbackMessage::Unsupported
        )
    }
}

impl fmt::Display for FeedbackMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackMessage::Idle => f.write_str(""),
            FeedbackMessage::RequestingPermission => f.write_str("Requesting camera permission..."),
            FeedbackMessage::StartingCamera => f.write_str("Starting camera..."),
            FeedbackMessage::TryingFallback => f.write_str("Trying fallback camera..."),
            FeedbackMessage::CameraActive => f.write_str("Camera active. Point at the QR code."),
            FeedbackMessage::NoDecoder => {
                f.write_str("Camera active, but no QR decoder is available on this device.")
            }
            FeedbackMessage::PermissionDenied => {
                f.write_str("Permission denied. Enable camera access in your browser settings.")
            }
            FeedbackMessage::DeviceNotFound => f.write_str("No camera available."),
            FeedbackMessage::DeviceBusy => f.write_str("Camera is in use by another app."),
            FeedbackMessage::Other(name) => write!(f, "Camera error ({name})."),
            FeedbackMessage::TapToStart => f.write_str("Tap the button to start the camera."),
            FeedbackMessage::PlaybackBlocked => {
                f.write_str("Tap to enable video (blocked by the browser).")
            }
            FeedbackMessage::PlaybackFailed => f.write_str("Failed to start video."),
            FeedbackMessage::Detected => f.write_str("QR detected. Redirecting..."),
            FeedbackMessage::Stopped => f.write_str("Scanner stopped."),
            FeedbackMessage::Reloading => f.write_str("Reloading camera..."),
            FeedbackMessage::Unsupported => {
                f.write_str("This device does not support camera access.")
            }
        }
    }
}

/// Label shown on the manual-start affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualStartLabel {
    TapToStart,
    TryAgain,
    Restart,
}

impl ManualStartLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManualStartLabel::TapToStart => "Tap to start camera",
            ManualStartLabel::TryAgain => "Try again",
            ManualStartLabel::Restart => "Restart scanner",
        }
    }
}

/// What the feedback element currently shows. Always derived from a
/// [`FeedbackMessage`], never edited on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackState {
    pub message: String,
    pub is_error: bool,
}

impl From<&FeedbackMessage> for FeedbackState {
    fn from(message: &FeedbackMessage) -> Self {
        Self {
            message: message.to_string(),
            is_error: message.is_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_errors_carry_the_error_flag() {
        let state = FeedbackState::from(&FeedbackMessage::DeviceBusy);
        assert!(state.is_error);
        assert_eq!(state.message, "Camera is in use by another app.");

        let state = FeedbackState::from(&FeedbackMessage::PlaybackBlocked);
        assert!(!state.is_error);
    }

    #[test]
    fn other_errors_name_the_exception() {
        let msg = FeedbackMessage::Other("AbortError".into());
        assert_eq!(msg.to_string(), "Camera error (AbortError).");
    }
}
