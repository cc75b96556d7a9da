use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::CameraError;
use crate::models::FeedbackMessage;

/// Everything that can go wrong in a scan session, as the host sees it.
/// None of these take the page down: the first four come with a retry
/// affordance, a missing engine leaves the camera running, and transient
/// decode failures never leave the loop.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum ScanError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    DeviceNotFound,
    #[error("camera busy")]
    DeviceBusy,
    #[error("video playback blocked")]
    PlaybackBlocked,
    #[error("no QR decoding engine available")]
    NoDecodingEngineAvailable,
    #[error("transient decode failure: {0}")]
    TransientDecodeFailure(String),
    #[error("camera access unsupported")]
    Unsupported,
    #[error("camera error ({0})")]
    Camera(String),
}

impl ScanError {
    pub fn feedback(&self) -> FeedbackMessage {
        match self {
            ScanError::PermissionDenied => FeedbackMessage::PermissionDenied,
            ScanError::DeviceNotFound => FeedbackMessage::DeviceNotFound,
            ScanError::DeviceBusy => FeedbackMessage::DeviceBusy,
            ScanError::PlaybackBlocked => FeedbackMessage::PlaybackFailed,
            ScanError::NoDecodingEngineAvailable => FeedbackMessage::NoDecoder,
            ScanError::TransientDecodeFailure(_) => FeedbackMessage::CameraActive,
            ScanError::Unsupported => FeedbackMessage::Unsupported,
            ScanError::Camera(name) => FeedbackMessage::Other(name.clone()),
        }
    }

    /// Whether the host should offer a retry button for this error.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            ScanError::PermissionDenied
                | ScanError::DeviceNotFound
                | ScanError::DeviceBusy
                | ScanError::PlaybackBlocked
                | ScanError::Camera(_)
        )
    }
}

impl From<&CameraError> for ScanError {
    fn from(err: &CameraError) -> Self {
        match err {
            CameraError::PermissionDenied => ScanError::PermissionDenied,
            CameraError::DeviceNotFound | CameraError::Overconstrained => ScanError::DeviceNotFound,
            CameraError::DeviceBusy => ScanError::DeviceBusy,
            CameraError::PlaybackBlocked(_) => ScanError::PlaybackBlocked,
            CameraError::Unsupported => ScanError::Unsupported,
            CameraError::Other { name, .. } => ScanError::Camera(name.clone()),
        }
    }
}
