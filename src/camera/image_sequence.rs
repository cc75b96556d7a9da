use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use image::RgbaImage;
use log::info;
use uuid::Uuid;

use crate::models::Rect;

use super::{
    CameraError, FacingMode, MediaConstraints, MediaDevices, MediaStream, VideoConstraint,
    VideoSurface, VideoTrack,
};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// Replays the still images of a directory as a camera, one image per grab,
/// looping at the end.
pub struct ImageSequenceDevices {
    dir: PathBuf,
    facing: FacingMode,
}

impl ImageSequenceDevices {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            facing: FacingMode::Environment,
        }
    }

    /// Pretend to be a camera facing `facing`. A request for the other facing
    /// mode fails with `OverconstrainedError`.
    pub fn with_facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }
}

#[async_trait]
impl MediaDevices for ImageSequenceDevices {
    fn is_supported(&self) -> bool {
        self.dir.is_dir()
    }

    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        if let VideoConstraint::Facing { ideal } = constraints.video {
            if ideal != self.facing {
                return Err(CameraError::Overconstrained);
            }
        }

        let dir = self.dir.clone();
        let frames = tokio::task::spawn_blocking(move || load_frames(&dir))
            .await
            .map_err(|err| CameraError::Other {
                name: "AbortError".into(),
                message: format!("frame loader join failed: {err}"),
            })??;

        info!(
            "image sequence camera opened {} frame(s) from {}",
            frames.len(),
            self.dir.display()
        );

        let track = Arc::new(ImageSequenceTrack {
            label: format!("image-sequence:{}", self.dir.display()),
            frames,
            cursor: AtomicUsize::new(0),
            live: AtomicBool::new(true),
        });

        Ok(Box::new(ImageSequenceStream {
            id: Uuid::new_v4().to_string(),
            track,
        }))
    }
}

fn load_frames(dir: &Path) -> Result<Vec<RgbaImage>, CameraError> {
    let entries = std::fs::read_dir(dir).map_err(|_| CameraError::DeviceNotFound)?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FRAME_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(CameraError::DeviceNotFound);
    }

    paths
        .iter()
        .map(|path| {
            image::open(path)
                .map(|img| img.to_rgba8())
                .map_err(|err| CameraError::Other {
                    name: "NotReadableError".into(),
                    message: format!("failed to decode {}: {err}", path.display()),
                })
        })
        .collect()
}

struct ImageSequenceTrack {
    label: String,
    frames: Vec<RgbaImage>,
    cursor: AtomicUsize,
    live: AtomicBool,
}

impl VideoTrack for ImageSequenceTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn grab_frame(&self) -> Option<RgbaImage> {
        if !self.is_live() || self.frames.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.frames.len();
        self.frames.get(index).cloned()
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|frame| frame.dimensions())
    }

    fn stop(&self) {
        self.live.store(false, Ordering::Release);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

struct ImageSequenceStream {
    id: String,
    track: Arc<ImageSequenceTrack>,
}

impl MediaStream for ImageSequenceStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn video_track(&self) -> Option<Arc<dyn VideoTrack>> {
        Some(self.track.clone())
    }

    fn stop_tracks(&self) {
        self.track.stop();
    }
}

/// A video surface with no screen behind it. Frames come straight from the
/// attached track; the display rect is either configured or the native frame
/// size at scale 1.
#[derive(Default)]
pub struct HeadlessSurface {
    track: Mutex<Option<Arc<dyn VideoTrack>>>,
    display: Option<Rect>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_display_rect(mut self, rect: Rect) -> Self {
        self.display = Some(rect);
        self
    }

    fn current_track(&self) -> Option<Arc<dyn VideoTrack>> {
        let guard = match self.track.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }
}

#[async_trait]
impl VideoSurface for HeadlessSurface {
    fn attach(&self, stream: &dyn MediaStream) {
        let mut guard = match self.track.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = stream.video_track();
    }

    async fn play(&self) -> Result<(), CameraError> {
        match self.current_track() {
            Some(track) if track.is_live() => Ok(()),
            _ => Err(CameraError::PlaybackBlocked(
                "no live track attached to the surface".into(),
            )),
        }
    }

    fn detach(&self) {
        let mut guard = match self.track.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = None;
    }

    fn is_ready(&self) -> bool {
        self.current_track()
            .map(|track| track.is_live())
            .unwrap_or(false)
    }

    fn capture_frame(&self) -> Option<RgbaImage> {
        self.current_track()?.grab_frame()
    }

    fn display_rect(&self) -> Option<Rect> {
        if self.display.is_some() {
            return self.display;
        }
        let (width, height) = self.current_track()?.frame_size()?;
        Some(Rect::new(0.0, 0.0, width as f64, height as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_frames(dir: &Path, count: u32) {
        for i in 0..count {
            let img = RgbaImage::from_pixel(8 + i, 8, Rgba([i as u8, 0, 0, 255]));
            img.save(dir.join(format!("frame_{i:02}.png"))).unwrap();
        }
    }

    #[tokio::test]
    async fn empty_directory_has_no_camera() {
        let dir = tempfile::tempdir().unwrap();
        let devices = ImageSequenceDevices::new(dir.path());
        let err = devices
            .get_user_media(&MediaConstraints::any_camera())
            .await
            .err()
            .unwrap();
        assert_eq!(err, CameraError::DeviceNotFound);
    }

    #[tokio::test]
    async fn facing_mismatch_is_overconstrained() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 1);
        let devices = ImageSequenceDevices::new(dir.path()).with_facing(FacingMode::User);

        let err = devices
            .get_user_media(&MediaConstraints::rear_camera())
            .await
            .err()
            .unwrap();
        assert_eq!(err, CameraError::Overconstrained);
        assert!(devices
            .get_user_media(&MediaConstraints::any_camera())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn surface_cycles_frames_until_tracks_stop() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 2);
        let devices = ImageSequenceDevices::new(dir.path());
        let stream = devices
            .get_user_media(&MediaConstraints::rear_camera())
            .await
            .unwrap();

        let surface = HeadlessSurface::new();
        assert!(!surface.is_ready());
        surface.attach(stream.as_ref());
        surface.play().await.unwrap();

        let widths: Vec<u32> = (0..3)
            .map(|_| surface.capture_frame().unwrap().width())
            .collect();
        assert_eq!(widths, vec![8, 9, 8]);

        stream.stop_tracks();
        stream.stop_tracks();
        assert!(!surface.is_ready());
        assert!(surface.capture_frame().is_none());
        assert!(surface.play().await.is_err());
    }
}
