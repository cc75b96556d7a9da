use thiserror::Error;

use crate::models::FeedbackMessage;

/// Failures from stream acquisition and video playback, keyed on the DOM
/// exception names a browser host reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no camera device found")]
    DeviceNotFound,
    #[error("no camera satisfies the requested constraints")]
    Overconstrained,
    #[error("camera is already in use")]
    DeviceBusy,
    #[error("video playback was blocked: {0}")]
    PlaybackBlocked(String),
    #[error("camera access is not supported")]
    Unsupported,
    #[error("{name}: {message}")]
    Other { name: String, message: String },
}

impl CameraError {
    pub fn from_dom_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" => CameraError::PermissionDenied,
            "NotFoundError" => CameraError::DeviceNotFound,
            "OverconstrainedError" => CameraError::Overconstrained,
            "NotReadableError" | "TrackStartError" => CameraError::DeviceBusy,
            "NotSupportedError" => CameraError::Unsupported,
            _ => CameraError::Other {
                name: name.to_string(),
                message: message.to_string(),
            },
        }
    }

    pub fn dom_name(&self) -> &str {
        match self {
            CameraError::PermissionDenied => "NotAllowedError",
            CameraError::DeviceNotFound => "NotFoundError",
            CameraError::Overconstrained => "OverconstrainedError",
            CameraError::DeviceBusy => "NotReadableError",
            CameraError::PlaybackBlocked(_) => "PlaybackBlocked",
            CameraError::Unsupported => "NotSupportedError",
            CameraError::Other { name, .. } => name,
        }
    }

    /// Errors worth a second request without the facing-mode constraint.
    pub fn wants_unconstrained_retry(&self) -> bool {
        matches!(self, CameraError::DeviceNotFound | CameraError::Overconstrained)
    }

    /// Permission prompts and autoplay are refused without a user gesture;
    /// both show up either as `NotAllowedError` or as a message about `play`.
    pub fn is_autoplay_block(&self) -> bool {
        match self {
            CameraError::PermissionDenied | CameraError::PlaybackBlocked(_) => true,
            CameraError::Other { message, .. } => message.to_lowercase().contains("play"),
            _ => false,
        }
    }

    pub fn feedback(&self) -> FeedbackMessage {
        match self {
            CameraError::PermissionDenied => FeedbackMessage::PermissionDenied,
            CameraError::DeviceNotFound | CameraError::Overconstrained => {
                FeedbackMessage::DeviceNotFound
            }
            CameraError::DeviceBusy => FeedbackMessage::DeviceBusy,
            CameraError::PlaybackBlocked(_) => FeedbackMessage::PlaybackFailed,
            CameraError::Unsupported => FeedbackMessage::Unsupported,
            CameraError::Other { name, .. } => FeedbackMessage::Other(name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_names_map_onto_the_taxonomy() {
        assert_eq!(
            CameraError::from_dom_name("NotAllowedError", ""),
            CameraError::PermissionDenied
        );
        assert_eq!(
            CameraError::from_dom_name("NotReadableError", "Could not start video source"),
            CameraError::DeviceBusy
        );
        assert_eq!(
            CameraError::from_dom_name("AbortError", "aborted").dom_name(),
            "AbortError"
        );
    }

    #[test]
    fn only_missing_devices_retry_unconstrained() {
        assert!(CameraError::DeviceNotFound.wants_unconstrained_retry());
        assert!(CameraError::Overconstrained.wants_unconstrained_retry());
        assert!(!CameraError::PermissionDenied.wants_unconstrained_retry());
        assert!(!CameraError::DeviceBusy.wants_unconstrained_retry());
    }

    #[test]
    fn play_messages_count_as_autoplay_blocks() {
        let err = CameraError::from_dom_name("AbortError", "The play() request was interrupted");
        assert!(err.is_autoplay_block());
        assert!(!CameraError::DeviceBusy.is_autoplay_block());
    }

    #[test]
    fn missing_and_overconstrained_share_a_message() {
        assert_eq!(
            CameraError::Overconstrained.feedback(),
            CameraError::DeviceNotFound.feedback()
        );
    }
}
