use std::sync::Arc;

use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    camera::{
        CameraError, MediaConstraints, MediaDevices, MediaStream, TargetFrame, VideoSurface,
    },
    engine::{DetectionEngine, EngineCatalog, SelectedEngine},
    metrics::{MetricsCollector, MetricsSnapshot},
    models::{DecodedPayload, FeedbackMessage, SessionInfo},
    navigation::{build_navigation_target, Navigator},
    settings::ScannerSettings,
    utils::env_flag,
};
use crate::{log_debug, log_error, log_info, log_warn};

use super::{loop_worker::scan_loop, ScanError, ScanState};

const ENABLE_LOGS: bool = true;

struct ScanLoopHandle {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns one scan session: the stream, the decode loop and the state the
/// host renders. Cloning shares the same session.
#[derive(Clone)]
pub struct ScanController {
    pub(super) state: Arc<Mutex<ScanState>>,
    stream: Arc<Mutex<Option<Box<dyn MediaStream>>>>,
    scan_loop: Arc<Mutex<Option<ScanLoopHandle>>>,
    engine: Arc<Mutex<Option<SelectedEngine>>>,
    devices: Arc<dyn MediaDevices>,
    pub(super) surface: Arc<dyn VideoSurface>,
    pub(super) target_frame: Option<Arc<dyn TargetFrame>>,
    catalog: EngineCatalog,
    navigator: Arc<dyn Navigator>,
    pub(super) settings: ScannerSettings,
    pub(super) metrics: MetricsCollector,
    pub(super) verbose: bool,
    updates: Arc<watch::Sender<SessionInfo>>,
}

impl ScanController {
    pub fn new(
        devices: Arc<dyn MediaDevices>,
        surface: Arc<dyn VideoSurface>,
        navigator: Arc<dyn Navigator>,
        settings: ScannerSettings,
    ) -> Self {
        let state = ScanState::new();
        let (updates, _) = watch::channel(state.info());

        Self {
            state: Arc::new(Mutex::new(state)),
            stream: Arc::new(Mutex::new(None)),
            scan_loop: Arc::new(Mutex::new(None)),
            engine: Arc::new(Mutex::new(None)),
            devices,
            surface,
            target_frame: None,
            catalog: EngineCatalog::builtin(),
            navigator,
            settings,
            metrics: MetricsCollector::new(),
            verbose: env_flag("TRUSS_SCAN_DEBUG"),
            updates: Arc::new(updates),
        }
    }

    pub fn with_catalog(mut self, catalog: EngineCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_target_frame(mut self, frame: Arc<dyn TargetFrame>) -> Self {
        self.target_frame = Some(frame);
        self
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    pub(super) fn devices(&self) -> &Arc<dyn MediaDevices> {
        &self.devices
    }

    pub(super) fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Every state change is published here.
    pub fn subscribe(&self) -> watch::Receiver<SessionInfo> {
        self.updates.subscribe()
    }

    pub async fn get_state(&self) -> SessionInfo {
        self.state.lock().await.info()
    }

    pub async fn get_metrics(&self) -> MetricsSnapshot {
        self.metrics.get_snapshot().await
    }

    /// Acquires the camera, starts playback, picks a decoder and spawns the
    /// decode loop. A no-op while a stream is held or being acquired.
    ///
    /// A stop that lands while this is suspended supersedes the attempt: the
    /// stream it eventually gets is stopped instead of used.
    pub async fn start_camera(&self, user_initiated: bool) -> SessionInfo {
        let generation = {
            let mut state = self.state.lock().await;
            if state.is_busy() {
                log_debug!("start_camera ignored: session already active");
                return state.info();
            }
            let generation = state.begin_start(user_initiated);
            self.publish(&state);
            generation
        };

        let stream = match self.acquire_stream(user_initiated, generation).await {
            Ok(stream) => stream,
            Err(outcome) => return outcome,
        };

        let stream_id = stream.id().to_string();
        {
            // Checked and stored under the state lock: a stop either lands
            // before (and the stream is dropped here) or after (and finds it).
            let mut state = self.state.lock().await;
            if !state.is_current_start(generation) {
                drop(state);
                stream.stop_tracks();
                log_info!("start superseded by a stop; camera stream {stream_id} released");
                return self.get_state().await;
            }
            state.stream_id = Some(stream_id.clone());
            self.surface.attach(stream.as_ref());
            *self.stream.lock().await = Some(stream);
        }

        if let Err(err) = self.surface.play().await {
            if !self.is_current_start(generation).await {
                return self.abandon_start(&stream_id).await;
            }
            log_warn!("video playback failed for stream {stream_id}: {err}");
            self.release_camera(false).await;

            let mut state = self.state.lock().await;
            if user_initiated {
                state.fail(ScanError::PlaybackBlocked);
            } else {
                state.require_manual_start(FeedbackMessage::PlaybackBlocked);
            }
            self.publish(&state);
            return state.info();
        }

        let engine = self.resolve_engine().await;
        self.metrics.reset().await;

        let cancel_token = CancellationToken::new();
        {
            let mut state = self.state.lock().await;
            if !state.is_current_start(generation) {
                drop(state);
                return self.abandon_start(&stream_id).await;
            }
            state.begin_scanning(engine.kind);
            self.publish(&state);
        }

        {
            // Hold the slot while spawning so a fast detection in the loop
            // cannot release the camera before the handle is stored.
            let mut slot = self.scan_loop.lock().await;
            let handle = tokio::spawn(scan_loop(
                self.clone(),
                engine.decoder.clone(),
                cancel_token.clone(),
            ));
            *slot = Some(ScanLoopHandle {
                handle,
                cancel_token,
            });
        }

        log_info!(
            "scan session started: stream={stream_id} engine={}",
            engine.kind.as_str()
        );
        self.get_state().await
    }

    async fn is_current_start(&self, generation: u64) -> bool {
        self.state.lock().await.is_current_start(generation)
    }

    /// Stops a stream whose start attempt was superseded. The stop that
    /// superseded it may already have released it.
    async fn abandon_start(&self, stream_id: &str) -> SessionInfo {
        let stale = {
            let mut slot = self.stream.lock().await;
            let ours = slot
                .as_ref()
                .map(|stream| stream.id() == stream_id)
                .unwrap_or(false);
            if ours {
                slot.take()
            } else {
                None
            }
        };
        if let Some(stream) = stale {
            stream.stop_tracks();
            self.surface.detach();
        }
        log_info!("start superseded by a stop; camera stream {stream_id} released");
        self.get_state().await
    }

    /// Rear camera first, any camera second. On failure the session is
    /// already moved to its final state and that snapshot is returned.
    async fn acquire_stream(
        &self,
        user_initiated: bool,
        generation: u64,
    ) -> Result<Box<dyn MediaStream>, SessionInfo> {
        let first = self
            .devices
            .get_user_media(&MediaConstraints::rear_camera())
            .await;

        let err = match first {
            Ok(stream) => return Ok(stream),
            Err(err) => err,
        };

        let mut state = self.state.lock().await;
        if !state.is_current_start(generation) {
            return Err(state.info());
        }

        if err.wants_unconstrained_retry() {
            log_info!("rear camera unavailable ({err}); retrying with any camera");
            state.set_feedback(FeedbackMessage::TryingFallback);
            self.publish(&state);
            drop(state);

            let retry = self
                .devices
                .get_user_media(&MediaConstraints::any_camera())
                .await;
            return match retry {
                Ok(stream) => Ok(stream),
                Err(retry_err) => {
                    if self.is_current_start(generation).await {
                        Err(self.fail_with(&retry_err).await)
                    } else {
                        Err(self.get_state().await)
                    }
                }
            };
        }

        if !user_initiated && err.is_autoplay_block() {
            log_info!("automatic camera start refused ({err}); waiting for a user gesture");
            state.require_manual_start(FeedbackMessage::TapToStart);
            self.publish(&state);
            return Err(state.info());
        }

        drop(state);
        Err(self.fail_with(&err).await)
    }

    async fn fail_with(&self, err: &CameraError) -> SessionInfo {
        log_error!("camera error: {} ({err})", err.dom_name());
        let mut state = self.state.lock().await;
        state.fail(ScanError::from(err));
        self.publish(&state);
        state.info()
    }

    /// Which backend this session decodes with. Probes on first use.
    pub async fn select_detection_engine(&self) -> DetectionEngine {
        self.resolve_engine().await.kind
    }

    /// The probe runs once per session; later starts reuse its answer.
    async fn resolve_engine(&self) -> SelectedEngine {
        let mut cached = self.engine.lock().await;
        if let Some(engine) = cached.as_ref() {
            return engine.clone();
        }
        let engine = self.catalog.select().await;
        *cached = Some(engine.clone());
        engine
    }

    /// Releases tracks, stops the loop and unbinds the surface. Safe to call
    /// with nothing running.
    pub async fn stop_camera(&self) -> SessionInfo {
        // Supersede any pending start before releasing, so a stream it
        // acquires afterwards is abandoned rather than adopted.
        self.state.lock().await.stop();
        self.release_camera(false).await;
        let state = self.state.lock().await;
        self.publish(&state);
        state.info()
    }

    /// `from_loop` is set when the decode loop itself releases the camera;
    /// the loop cannot wait on its own handle.
    pub(super) async fn release_camera(&self, from_loop: bool) {
        self.state.lock().await.release();

        let scan_loop = self.scan_loop.lock().await.take();
        if let Some(scan_loop) = scan_loop {
            scan_loop.cancel_token.cancel();
            if !from_loop {
                if let Err(err) = scan_loop.handle.await {
                    log_warn!("scan loop task ended abnormally: {err}");
                }
            }
        }

        let stream = self.stream.lock().await.take();
        if let Some(stream) = stream {
            stream.stop_tracks();
            log_info!("camera stream {} released", stream.id());
        }

        self.surface.detach();
    }

    /// Debounces, stops the camera and navigates to the detail page.
    /// Returns the navigation target, or `None` when the payload was blank or
    /// a repeat of the previous one.
    pub async fn on_payload_detected(&self, raw: &str) -> Option<String> {
        self.handle_payload(raw, false).await
    }

    pub(super) async fn handle_payload(&self, raw: &str, from_loop: bool) -> Option<String> {
        let payload = DecodedPayload::new(raw)?;

        {
            let mut state = self.state.lock().await;
            if !state.accept_payload(&payload) {
                log_debug!("duplicate payload suppressed");
                return None;
            }
            self.publish(&state);
        }

        self.release_camera(from_loop).await;

        let target = build_navigation_target(&self.settings.detail_base_path, &payload);
        {
            let mut state = self.state.lock().await;
            state.complete(target.clone());
            self.publish(&state);
        }

        log_info!("QR payload accepted; navigating to {target}");
        self.navigator.navigate(&target);
        Some(target)
    }

    pub(super) fn publish(&self, state: &ScanState) {
        self.updates.send_replace(state.info());
    }
}
