//! Pluggable QR decoding backends and the capability probe that picks one.

#[cfg(feature = "rqrr")]
pub mod rqrr;
pub mod selector;

use std::sync::Arc;

use async_trait::async_trait;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use selector::{EngineCatalog, SelectedEngine};

/// Which kind of backend a session ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum DetectionEngine {
    #[default]
    None,
    PlatformDetector,
    LibraryDecoder,
}

impl DetectionEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionEngine::None => "none",
            DetectionEngine::PlatformDetector => "platform-detector",
            DetectionEngine::LibraryDecoder => "library-decoder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeFormat {
    QrCode,
    Code128,
    Ean13,
    DataMatrix,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// One bad frame. Expected now and then; the loop keeps going.
    #[error("frame decode failed: {0}")]
    Transient(String),
    /// The backend cannot be used at all.
    #[error("decoder unavailable: {0}")]
    Unavailable(String),
}

/// Extracts a QR payload from one (possibly cropped) frame.
pub trait FrameDecoder: Send + Sync {
    fn name(&self) -> &str;
    /// `Ok(None)` when the frame holds no readable code.
    fn decode(&self, frame: &RgbaImage) -> Result<Option<String>, DecodeError>;
}

/// A barcode detector provided by the host platform.
#[async_trait]
pub trait PlatformDetector: Send + Sync {
    async fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DecodeError>;
    fn decoder(&self) -> Arc<dyn FrameDecoder>;
}

/// A third-party decoder that has to be loaded before use.
#[async_trait]
pub trait LibraryLoader: Send + Sync {
    fn name(&self) -> &str;
    async fn load(&self) -> Result<Arc<dyn FrameDecoder>, DecodeError>;
}
