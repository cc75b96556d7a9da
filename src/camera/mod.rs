//! Camera seam between the scan controller and whatever owns the hardware.
//!
//! A browser host implements these traits over `getUserMedia` and a `<video>`
//! element; [`image_sequence`] replays still images for the CLI and tests.

mod error;
pub mod image_sequence;

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::models::Rect;

pub use error::CameraError;
pub use image_sequence::{HeadlessSurface, ImageSequenceDevices};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    Environment,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VideoConstraint {
    /// Any camera will do.
    Any,
    /// Prefer a camera facing this way.
    Facing { ideal: FacingMode },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaConstraints {
    pub video: VideoConstraint,
    pub audio: bool,
}

impl MediaConstraints {
    /// First request: the rear camera, no audio.
    pub fn rear_camera() -> Self {
        Self {
            video: VideoConstraint::Facing {
                ideal: FacingMode::Environment,
            },
            audio: false,
        }
    }

    /// Fallback request: any video device.
    pub fn any_camera() -> Self {
        Self {
            video: VideoConstraint::Any,
            audio: false,
        }
    }
}

/// One live video track of a stream.
pub trait VideoTrack: Send + Sync {
    fn label(&self) -> &str;
    /// Latest frame in native pixel size, or `None` while no frame is available.
    fn grab_frame(&self) -> Option<RgbaImage>;
    /// Native `(width, height)` the track currently delivers.
    fn frame_size(&self) -> Option<(u32, u32)>;
    /// Stops the track. Calling it again has no effect.
    fn stop(&self);
    fn is_live(&self) -> bool;
}

/// Handle to the device tracks. Owned exclusively by one scan session.
pub trait MediaStream: Send + Sync {
    fn id(&self) -> &str;
    fn video_track(&self) -> Option<Arc<dyn VideoTrack>>;
    /// Stops every track; safe to repeat.
    fn stop_tracks(&self);
}

#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Whether the host can request camera streams at all.
    fn is_supported(&self) -> bool {
        true
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError>;
}

/// The element the stream renders into and frames are read back from.
#[async_trait]
pub trait VideoSurface: Send + Sync {
    fn attach(&self, stream: &dyn MediaStream);
    async fn play(&self) -> Result<(), CameraError>;
    fn detach(&self);
    /// Equivalent of `readyState == HAVE_ENOUGH_DATA`.
    fn is_ready(&self) -> bool;
    fn capture_frame(&self) -> Option<RgbaImage>;
    /// On-screen bounds of the video, used to map the target overlay.
    fn display_rect(&self) -> Option<Rect>;
}

/// Optional on-screen overlay marking where the user should hold the code.
pub trait TargetFrame: Send + Sync {
    fn display_rect(&self) -> Option<Rect>;
}

/// A target overlay at a fixed position.
#[derive(Debug, Clone, Copy)]
pub struct FixedTargetFrame(pub Rect);

impl TargetFrame for FixedTargetFrame {
    fn display_rect(&self) -> Option<Rect> {
        Some(self.0)
    }
}
