use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// rear camera, pointed away from the operator
    Environment,
}

/// A greyscale camera frame, one byte per pixel, row major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub luma: Vec<u8>,
}

impl Frame {
    pub fn pixel(&self, x: u32, y: u32) -> u8 {
        self.luma
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
            .unwrap_or(255)
    }
}

/// Centred square in which codes are searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionRegion {
    pub size: u32,
}

impl DetectionRegion {
    /// `(x, y, width, height)` of the region clipped to a frame.
    pub fn within(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let w = self.size.min(width);
        let h = self.size.min(height);
        ((width - w) / 2, (height - h) / 2, w, h)
    }
}

/// Optical zoom capability reported by the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl ZoomRange {
    /// Range used when the camera reports no zoom capability.
    pub const FIXED: ZoomRange = ZoomRange { min: 1.0, max: 1.0 };

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }

    /// Zoom controls are only offered for a non-degenerate range.
    pub fn is_adjustable(&self) -> bool {
        self.max > self.min
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),

    #[error("no frame available")]
    NoFrame,

    #[error("camera constraint rejected: {0}")]
    Constraint(String),

    #[error("camera io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("no code found in frame")]
    NotFound,

    #[error("code could not be read: {0}")]
    Unreadable(String),
}

#[async_trait]
pub trait Camera: Send {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError>;

    /// `None` when the device has no zoom control.
    fn zoom_capabilities(&self) -> Option<ZoomRange>;

    async fn apply_zoom(&mut self, zoom: f64) -> Result<(), CameraError>;

    /// Stop capturing and release the device.
    fn stop(&mut self) -> Result<(), CameraError>;
}

#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn Camera>, CameraError>;
}

pub trait QrDecoder: Send + Sync {
    fn decode(&self, frame: &Frame, region: DetectionRegion) -> Result<String, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_is_centred_and_clipped() {
        let region = DetectionRegion { size: 250 };
        assert_eq!(region.within(640, 480), (195, 115, 250, 250));
        assert_eq!(region.within(200, 100), (0, 0, 200, 100));
    }

    #[test]
    fn zoom_range_clamps() {
        let range = ZoomRange { min: 1.0, max: 4.0 };
        assert_eq!(range.clamp(0.2), 1.0);
        assert_eq!(range.clamp(2.5), 2.5);
        assert_eq!(range.clamp(9.0), 4.0);
        assert_eq!(range.clamp(f64::NAN), 1.0);
        assert!(range.is_adjustable());
        assert!(!ZoomRange::FIXED.is_adjustable());
    }
}
