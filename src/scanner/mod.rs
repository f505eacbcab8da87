//! Camera scanning: one session at a time, one decoded code per session.
//!
//! `start` opens a session and spawns a capture loop that samples frames
//! at a fixed rate. The first frame that decodes closes the session, and
//! the camera is released before the text is handed to the caller.
//!
//! The session lock is only held to lend the camera out and take it back;
//! frame I/O and decoding run without it, so stop, zoom and status calls
//! are never queued behind a slow frame.

pub mod camera;
pub mod qr;
pub mod session;
pub mod spool;
pub mod zoom;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, info, trace, warn};
use utoipa::ToSchema;

use camera::{Camera, CameraError, CameraProvider, DecodeError, DetectionRegion, QrDecoder};
use session::ScanSession;
use zoom::TouchPoint;

#[derive(Debug, Clone, Copy)]
pub struct ScanSettings {
    pub fps: u32,
    pub box_size: u32,
}

/// Fastest sampling period; `tokio::time::interval` rejects a zero period.
const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

impl ScanSettings {
    fn frame_interval(&self) -> Duration {
        (Duration::from_secs(1) / self.fps.max(1)).max(MIN_FRAME_INTERVAL)
    }
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            fps: 10,
            box_size: 250,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("a scan session is already active")]
    AlreadyScanning,

    #[error("no active scan session")]
    NotScanning,

    #[error(transparent)]
    Camera(#[from] CameraError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ZoomStatus {
    pub min: f64,
    pub max: f64,
    pub current: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ScannerStatus {
    pub scanning: bool,
    /// Present only while scanning with a camera that can zoom.
    pub zoom: Option<ZoomStatus>,
}

/// Resolves with the decoded text, or `None` if the session was stopped.
pub struct DecodeHandle {
    session: u64,
    rx: oneshot::Receiver<String>,
}

impl DecodeHandle {
    pub fn session(&self) -> u64 {
        self.session
    }

    pub async fn decoded(self) -> Option<String> {
        self.rx.await.ok()
    }
}

pub struct ScannerController {
    provider: Arc<dyn CameraProvider>,
    decoder: Arc<dyn QrDecoder>,
    settings: ScanSettings,
    slot: Arc<Mutex<Option<ScanSession>>>,
    next_id: AtomicU64,
}

impl ScannerController {
    pub fn new(
        provider: Arc<dyn CameraProvider>,
        decoder: Arc<dyn QrDecoder>,
        settings: ScanSettings,
    ) -> Self {
        Self {
            provider,
            decoder,
            settings,
            slot: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn start(&self) -> Result<DecodeHandle, ScanError> {
        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return Err(ScanError::AlreadyScanning);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = ScanSession::open(self.provider.as_ref(), id)
            .await
            .inspect_err(|e| warn!(error = %e, "Camera could not be acquired"))?;
        *slot = Some(session);
        drop(slot);

        let (tx, rx) = oneshot::channel();
        actix_web::rt::spawn(capture_loop(
            self.slot.clone(),
            self.decoder.clone(),
            id,
            self.settings.frame_interval(),
            DetectionRegion {
                size: self.settings.box_size,
            },
            tx,
        ));

        Ok(DecodeHandle { session: id, rx })
    }

    /// Close the active session, if any. Returns whether one was open.
    pub async fn stop(&self) -> bool {
        match self.slot.lock().await.take() {
            Some(session) => {
                info!(session = session.id(), "Scan session stopped");
                session.close();
                true
            }
            None => false,
        }
    }

    pub async fn status(&self) -> ScannerStatus {
        let slot = self.slot.lock().await;
        ScannerStatus {
            scanning: slot.is_some(),
            zoom: slot
                .as_ref()
                .filter(|s| s.zoom_range().is_adjustable())
                .map(|s| ZoomStatus {
                    min: s.zoom_range().min,
                    max: s.zoom_range().max,
                    current: s.zoom(),
                }),
        }
    }

    /// Returns the zoom actually applied after clamping.
    pub async fn set_zoom(&self, value: f64) -> Result<f64, ScanError> {
        let mut slot = self.slot.lock().await;
        let session = slot.as_mut().ok_or(ScanError::NotScanning)?;
        Ok(session.set_zoom(value).await)
    }

    /// Feed a touch event to the pinch gesture; returns the new zoom on a pinch move.
    pub async fn touch(
        &self,
        phase: TouchPhase,
        touches: &[TouchPoint],
    ) -> Result<Option<f64>, ScanError> {
        let mut slot = self.slot.lock().await;
        let session = slot.as_mut().ok_or(ScanError::NotScanning)?;

        Ok(match phase {
            TouchPhase::Start => {
                session.touch_start(touches);
                None
            }
            TouchPhase::Move => session.touch_move(touches).await,
            TouchPhase::End => {
                session.touch_end();
                None
            }
        })
    }

    /// Release the camera on shutdown.
    pub async fn shutdown(&self) {
        if self.stop().await {
            info!("Camera released on shutdown");
        }
    }
}

async fn capture_loop(
    slot: Arc<Mutex<Option<ScanSession>>>,
    decoder: Arc<dyn QrDecoder>,
    id: u64,
    period: Duration,
    region: DetectionRegion,
    tx: oneshot::Sender<String>,
) {
    let mut ticker = tokio::time::interval(period);

    loop {
        ticker.tick().await;

        let lent = match slot.lock().await.as_mut().filter(|s| s.id() == id) {
            Some(session) => session.lend_camera(),
            None => {
                debug!(session = id, "Capture loop finished, session closed");
                return;
            }
        };
        let Some(mut camera) = lent else {
            debug!(session = id, "Camera released, capture loop finished");
            return;
        };

        let grabbed = camera.grab_frame().await;

        {
            let mut guard = slot.lock().await;
            match guard.as_mut().filter(|s| s.id() == id) {
                Some(session) => session.restore_camera(camera).await,
                None => {
                    release_orphan(camera, id);
                    return;
                }
            }
        }

        let frame = match grabbed {
            Ok(frame) => frame,
            Err(CameraError::NoFrame) => {
                trace!(session = id, "No frame available");
                continue;
            }
            Err(e) => {
                debug!(error = %e, session = id, "Frame not captured");
                continue;
            }
        };

        let decode = {
            let decoder = decoder.clone();
            tokio::task::spawn_blocking(move || decoder.decode(&frame, region)).await
        };

        match decode {
            Ok(Ok(text)) => {
                let Some(session) = slot.lock().await.take_if(|s| s.id() == id) else {
                    debug!(session = id, "Session stopped before the decode was delivered");
                    return;
                };
                session.close();

                info!(session = id, "Code decoded");
                if tx.send(text).is_err() {
                    debug!(session = id, "Decoded text had no receiver");
                }
                return;
            }
            Ok(Err(DecodeError::NotFound)) => trace!(session = id, "No code in frame"),
            Ok(Err(e)) => debug!(error = %e, session = id, "Frame not decoded"),
            Err(e) => warn!(error = %e, session = id, "Decode task failed"),
        }
    }
}

/// Stop a camera whose session was closed while the frame was being grabbed.
fn release_orphan(mut camera: Box<dyn Camera>, id: u64) {
    match camera.stop() {
        Ok(()) => debug!(session = id, "Camera released after session closed"),
        Err(e) => warn!(error = %e, session = id, "Camera stop failed"),
    }
}
