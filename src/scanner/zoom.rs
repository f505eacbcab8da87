use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, ToSchema)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

fn distance(touches: &[TouchPoint]) -> Option<f64> {
    match touches {
        [a, b] => Some(((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()),
        _ => None,
    }
}

/// Two-finger pinch state: the finger spread and zoom when the pinch began.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PinchTracker {
    baseline: Option<(f64, f64)>,
}

impl PinchTracker {
    /// Records a baseline when exactly two fingers are down.
    pub fn touch_start(&mut self, touches: &[TouchPoint], current_zoom: f64) {
        if let Some(d) = distance(touches).filter(|d| *d > 0.0) {
            self.baseline = Some((d, current_zoom));
        }
    }

    /// Unclamped zoom target for the new finger spread.
    pub fn touch_move(&self, touches: &[TouchPoint]) -> Option<f64> {
        let (base_distance, base_zoom) = self.baseline?;
        let d = distance(touches)?;
        Some(base_zoom * (d / base_distance))
    }

    pub fn touch_end(&mut self) {
        self.baseline = None;
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.baseline.is_some()
    }
}
