use std::{fmt, sync::Arc};

use crate::{log_info, log_warn};

use super::{BarcodeFormat, DetectionEngine, FrameDecoder, LibraryLoader, PlatformDetector};

const ENABLE_LOGS: bool = true;

/// Decoding backends a host makes available, in priority order: the platform
/// detector first, then each library loader.
#[derive(Default, Clone)]
pub struct EngineCatalog {
    platform: Option<Arc<dyn PlatformDetector>>,
    libraries: Vec<Arc<dyn LibraryLoader>>,
}

/// Outcome of the capability probe. `decoder` is `None` exactly when `kind`
/// is [`DetectionEngine::None`].
#[derive(Clone)]
pub struct SelectedEngine {
    pub kind: DetectionEngine,
    pub decoder: Option<Arc<dyn FrameDecoder>>,
}

impl SelectedEngine {
    pub fn none() -> Self {
        Self {
            kind: DetectionEngine::None,
            decoder: None,
        }
    }
}

impl fmt::Debug for SelectedEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedEngine")
            .field("kind", &self.kind)
            .field("decoder", &self.decoder.as_ref().map(|d| d.name().to_string()))
            .finish()
    }
}

impl EngineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, detector: Arc<dyn PlatformDetector>) -> Self {
        self.platform = Some(detector);
        self
    }

    pub fn with_library(mut self, loader: Arc<dyn LibraryLoader>) -> Self {
        self.libraries.push(loader);
        self
    }

    /// Catalog with every decoder compiled into this crate.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut catalog = Self::new();
        #[cfg(feature = "rqrr")]
        {
            catalog = catalog.with_library(Arc::new(super::rqrr::RqrrLoader));
        }
        catalog
    }

    /// Probes the backends in priority order; first one available wins.
    pub async fn select(&self) -> SelectedEngine {
        if let Some(platform) = &self.platform {
            match platform.supported_formats().await {
                Ok(formats) if formats.contains(&BarcodeFormat::QrCode) => {
                    log_info!("using platform barcode detector");
                    return SelectedEngine {
                        kind: DetectionEngine::PlatformDetector,
                        decoder: Some(platform.decoder()),
                    };
                }
                Ok(formats) => {
                    log_info!(
                        "platform detector lacks qr_code support ({} format(s) advertised)",
                        formats.len()
                    );
                }
                Err(err) => log_warn!("platform detector probe failed: {err}"),
            }
        }

        for loader in &self.libraries {
            match loader.load().await {
                Ok(decoder) => {
                    log_info!("using library decoder {}", loader.name());
                    return SelectedEngine {
                        kind: DetectionEngine::LibraryDecoder,
                        decoder: Some(decoder),
                    };
                }
                Err(err) => log_warn!("library decoder {} failed to load: {err}", loader.name()),
            }
        }

        log_warn!("no QR decoding engine available; camera will run without decoding");
        SelectedEngine::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::DecodeError;
    use async_trait::async_trait;
    use image::RgbaImage;

    struct NamedDecoder(&'static str);

    impl FrameDecoder for NamedDecoder {
        fn name(&self) -> &str {
            self.0
        }

        fn decode(&self, _frame: &RgbaImage) -> Result<Option<String>, DecodeError> {
            Ok(None)
        }
    }

    struct Platform(Result<Vec<BarcodeFormat>, DecodeError>);

    #[async_trait]
    impl PlatformDetector for Platform {
        async fn supported_formats(&self) -> Result<Vec<BarcodeFormat>, DecodeError> {
            self.0.clone()
        }

        fn decoder(&self) -> Arc<dyn FrameDecoder> {
            Arc::new(NamedDecoder("platform"))
        }
    }

    struct Loader(&'static str, bool);

    #[async_trait]
    impl LibraryLoader for Loader {
        fn name(&self) -> &str {
            self.0
        }

        async fn load(&self) -> Result<Arc<dyn FrameDecoder>, DecodeError> {
            if self.1 {
                Ok(Arc::new(NamedDecoder(self.0)))
            } else {
                Err(DecodeError::Unavailable("script failed to load".into()))
            }
        }
    }

    #[tokio::test]
    async fn platform_detector_with_qr_support_wins() {
        let catalog = EngineCatalog::new()
            .with_platform(Arc::new(Platform(Ok(vec![BarcodeFormat::QrCode]))))
            .with_library(Arc::new(Loader("jsqr", true)));

        let selected = catalog.select().await;
        assert_eq!(selected.kind, DetectionEngine::PlatformDetector);
        assert_eq!(selected.decoder.unwrap().name(), "platform");
    }

    #[tokio::test]
    async fn unavailable_platform_falls_through_to_library() {
        let catalog = EngineCatalog::new()
            .with_platform(Arc::new(Platform(Err(DecodeError::Unavailable(
                "BarcodeDetector is not defined".into(),
            )))))
            .with_library(Arc::new(Loader("jsqr", true)));

        assert_eq!(catalog.select().await.kind, DetectionEngine::LibraryDecoder);
    }

    #[tokio::test]
    async fn platform_without_qr_format_is_skipped() {
        let catalog = EngineCatalog::new()
            .with_platform(Arc::new(Platform(Ok(vec![BarcodeFormat::Ean13]))))
            .with_library(Arc::new(Loader("zxing", true)));

        let selected = catalog.select().await;
        assert_eq!(selected.kind, DetectionEngine::LibraryDecoder);
        assert_eq!(selected.decoder.unwrap().name(), "zxing");
    }

    #[tokio::test]
    async fn libraries_are_tried_in_order() {
        let catalog = EngineCatalog::new()
            .with_library(Arc::new(Loader("jsqr", false)))
            .with_library(Arc::new(Loader("zxing", true)));

        assert_eq!(catalog.select().await.decoder.unwrap().name(), "zxing");
    }

    #[tokio::test]
    async fn nothing_available_selects_none() {
        let catalog = EngineCatalog::new().with_library(Arc::new(Loader("jsqr", false)));

        let selected = catalog.select().await;
        assert_eq!(selected.kind, DetectionEngine::None);
        assert!(selected.decoder.is_none());
    }
}
