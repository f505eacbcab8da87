use tracing::{debug, info, warn};

use super::camera::{Camera, CameraError, CameraProvider, FacingMode, ZoomRange};
use super::zoom::{PinchTracker, TouchPoint};

/// One camera acquisition: from `open` until a code is decoded, the
/// scanner is stopped, or the session is dropped.
pub struct ScanSession {
    id: u64,
    camera: Option<Box<dyn Camera>>,
    zoom_range: ZoomRange,
    zoom: f64,
    /// zoom changed while the camera was lent out
    zoom_pending: bool,
    pinch: PinchTracker,
}

impl ScanSession {
    pub async fn open(provider: &dyn CameraProvider, id: u64) -> Result<Self, CameraError> {
        let camera = provider.acquire(FacingMode::Environment).await?;

        let zoom_range = camera
            .zoom_capabilities()
            .filter(|r| r.min.is_finite() && r.max.is_finite() && r.min <= r.max)
            .unwrap_or(ZoomRange::FIXED);

        let mut session = Self {
            id,
            camera: Some(camera),
            zoom_range,
            zoom: zoom_range.min,
            zoom_pending: false,
            pinch: PinchTracker::default(),
        };

        if zoom_range.is_adjustable() {
            session.set_zoom(zoom_range.min).await;
        }

        info!(session = id, min = zoom_range.min, max = zoom_range.max, "Scan session opened");
        Ok(session)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn zoom_range(&self) -> ZoomRange {
        self.zoom_range
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Take the camera out so a frame can be grabbed without holding the
    /// session. `None` if it is already lent or released.
    pub fn lend_camera(&mut self) -> Option<Box<dyn Camera>> {
        self.camera.take()
    }

    /// Hand a lent camera back, applying any zoom requested meanwhile.
    pub async fn restore_camera(&mut self, camera: Box<dyn Camera>) {
        self.camera = Some(camera);
        if std::mem::take(&mut self.zoom_pending) {
            self.set_zoom(self.zoom).await;
        }
    }

    /// Clamp to the reported range and apply; device refusals are only logged.
    pub async fn set_zoom(&mut self, value: f64) -> f64 {
        let zoom = self.zoom_range.clamp(value);
        self.zoom = zoom;

        match self.camera.as_mut() {
            Some(camera) => {
                if let Err(e) = camera.apply_zoom(zoom).await {
                    warn!(error = %e, zoom, session = self.id, "Zoom not applied");
                }
            }
            None => self.zoom_pending = true,
        }
        zoom
    }

    pub fn touch_start(&mut self, touches: &[TouchPoint]) {
        self.pinch.touch_start(touches, self.zoom);
    }

    pub async fn touch_move(&mut self, touches: &[TouchPoint]) -> Option<f64> {
        let target = self.pinch.touch_move(touches)?;
        Some(self.set_zoom(target).await)
    }

    pub fn touch_end(&mut self) {
        self.pinch.touch_end();
    }

    /// Stop and release the camera.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            match camera.stop() {
                Ok(()) => debug!(session = self.id, "Camera released"),
                Err(e) => warn!(error = %e, session = self.id, "Camera stop failed"),
            }
        }
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.release();
    }
}
