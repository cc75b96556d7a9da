use std::sync::Arc;

use chrono::Utc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    engine::{DecodeError, FrameDecoder},
    metrics::{AttemptMetrics, AttemptOutcome},
    models::DecodedPayload,
};
use crate::{log_debug, log_info, log_warn};

use super::{
    crop::{crop_frame, map_crop_region},
    ScanController, ScanError,
};

const ENABLE_LOGS: bool = true;

/// Spaces decode attempts at least `interval` apart.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Claims the slot at `now` if the interval has elapsed.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Runs once per display refresh until cancelled, a payload is accepted, or
/// the session stops scanning. With no decoder the loop idles on the frame
/// cadence and never decodes.
pub async fn scan_loop(
    controller: ScanController,
    decoder: Option<Arc<dyn FrameDecoder>>,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(controller.settings.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut throttle = Throttle::new(controller.settings.decode_interval());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !controller.state.lock().await.scanning {
                    log_debug!("scan loop exiting: session no longer scanning");
                    break;
                }

                let Some(decoder) = decoder.as_ref() else {
                    continue;
                };

                if !controller.surface.is_ready() {
                    continue;
                }

                if !throttle.ready(Instant::now()) {
                    controller.metrics.record_throttled().await;
                    continue;
                }

                let Some(payload) = attempt_decode(&controller, decoder).await else {
                    continue;
                };

                if cancel_token.is_cancelled() {
                    break;
                }

                controller.handle_payload(payload.as_str(), true).await;
                break;
            }
            _ = cancel_token.cancelled() => {
                log_info!("scan loop cancelled");
                break;
            }
        }
    }
}

/// One decode attempt. Returns a payload only when it is non-empty and
/// differs from the last accepted one.
async fn attempt_decode(
    controller: &ScanController,
    decoder: &Arc<dyn FrameDecoder>,
) -> Option<DecodedPayload> {
    let frame = controller.surface.capture_frame()?;
    let timestamp = Utc::now();
    controller.state.lock().await.last_attempt_at = Some(timestamp);

    let (frame_width, frame_height) = frame.dimensions();
    let region = match (&controller.target_frame, controller.surface.display_rect()) {
        (Some(target), Some(video)) => target.display_rect().and_then(|overlay| {
            map_crop_region(
                video,
                overlay,
                (frame_width, frame_height),
                controller.settings.min_crop_px,
            )
        }),
        _ => None,
    };

    let started = Instant::now();
    let worker = Arc::clone(decoder);
    let result = tokio::task::spawn_blocking(move || worker.decode(&crop_frame(frame, region)))
        .await
        .unwrap_or_else(|err| Err(DecodeError::Transient(format!("decode worker join failed: {err}"))));
    let decode_ms = started.elapsed().as_millis() as u64;

    let (outcome, payload) = match result {
        Ok(Some(text)) => match DecodedPayload::new(&text) {
            Some(payload) => {
                let duplicate =
                    controller.state.lock().await.last_decoded.as_ref() == Some(&payload);
                if duplicate {
                    (AttemptOutcome::Duplicate, None)
                } else {
                    (AttemptOutcome::Decoded, Some(payload))
                }
            }
            None => (AttemptOutcome::NoCode, None),
        },
        Ok(None) => (AttemptOutcome::NoCode, None),
        Err(err) => {
            let failure = ScanError::TransientDecodeFailure(err.to_string());
            if controller.verbose {
                log_debug!("{} via {}", failure, decoder.name());
            }
            if matches!(err, DecodeError::Unavailable(_)) {
                log_warn!("decoder {} reported unavailable: {err}", decoder.name());
            }
            (AttemptOutcome::TransientFailure, None)
        }
    };

    controller
        .metrics
        .record_attempt(AttemptMetrics {
            timestamp,
            decode_ms,
            cropped: region.is_some(),
            frame_width,
            frame_height,
            outcome,
        })
        .await;

    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_spaces_attempts() {
        let mut throttle = Throttle::new(Duration::from_millis(120));
        let t0 = Instant::now();

        assert!(throttle.ready(t0));
        assert!(!throttle.ready(t0 + Duration::from_millis(16)));
        assert!(!throttle.ready(t0 + Duration::from_millis(119)));
        assert!(throttle.ready(t0 + Duration::from_millis(120)));
        assert!(!throttle.ready(t0 + Duration::from_millis(200)));
        assert!(throttle.ready(t0 + Duration::from_millis(240)));
    }

    #[test]
    fn zero_interval_never_throttles() {
        let mut throttle = Throttle::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(throttle.ready(t0));
        assert!(throttle.ready(t0));
    }
}
