//! Camera backed by a spool directory of captured frames.
//!
//! A capture tool (for example a webcam snapshot daemon) writes image
//! files into the directory; each grab consumes the newest one.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

use super::camera::{Camera, CameraError, CameraProvider, FacingMode, Frame, ZoomRange};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

pub struct SpoolCameraProvider {
    dir: PathBuf,
}

impl SpoolCameraProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CameraProvider for SpoolCameraProvider {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn Camera>, CameraError> {
        let meta = tokio::fs::metadata(&self.dir).await.map_err(|e| {
            CameraError::Unavailable(format!("{}: {e}", self.dir.display()))
        })?;
        if !meta.is_dir() {
            return Err(CameraError::Unavailable(format!(
                "{} is not a directory",
                self.dir.display()
            )));
        }

        debug!(dir = %self.dir.display(), ?facing, "Spool camera acquired");
        Ok(Box::new(SpoolCamera {
            dir: self.dir.clone(),
            stopped: false,
        }))
    }
}

pub struct SpoolCamera {
    dir: PathBuf,
    stopped: bool,
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn newest_frame(dir: &Path) -> Result<Option<PathBuf>, CameraError> {
    let mut newest: Option<(SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !is_frame_file(&path) {
            continue;
        }
        let modified = std::fs::metadata(&path)?.modified()?;
        if newest.as_ref().is_none_or(|(t, _)| modified > *t) {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Read and consume the newest frame in `dir`.
fn take_frame(dir: &Path) -> Result<Frame, CameraError> {
    let path = newest_frame(dir)?.ok_or(CameraError::NoFrame)?;

    let decoded = image::open(&path);
    std::fs::remove_file(&path)?;

    let luma = decoded
        .map_err(|e| CameraError::Unavailable(format!("{}: {e}", path.display())))?
        .to_luma8();

    Ok(Frame {
        width: luma.width(),
        height: luma.height(),
        luma: luma.into_raw(),
    })
}

#[async_trait]
impl Camera for SpoolCamera {
    async fn grab_frame(&mut self) -> Result<Frame, CameraError> {
        if self.stopped {
            return Err(CameraError::Unavailable("camera stopped".to_string()));
        }
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || take_frame(&dir))
            .await
            .map_err(|e| CameraError::Unavailable(e.to_string()))?
    }

    fn zoom_capabilities(&self) -> Option<ZoomRange> {
        None
    }

    async fn apply_zoom(&mut self, _zoom: f64) -> Result<(), CameraError> {
        Err(CameraError::Constraint("spool frames have fixed zoom".to_string()))
    }

    fn stop(&mut self) -> Result<(), CameraError> {
        self.stopped = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("asistencia-spool-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[actix_web::test]
    async fn missing_directory_is_unavailable() {
        let provider = SpoolCameraProvider::new("/nonexistent/asistencia/spool");
        assert!(matches!(
            provider.acquire(FacingMode::Environment).await,
            Err(CameraError::Unavailable(_))
        ));
    }

    #[actix_web::test]
    async fn consumes_frames_and_reports_empty_spool() {
        let dir = scratch_dir("consume");
        image::GrayImage::from_pixel(4, 3, image::Luma([10u8]))
            .save(dir.join("frame.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let provider = SpoolCameraProvider::new(&dir);
        let mut camera = provider.acquire(FacingMode::Environment).await.unwrap();

        let frame = camera.grab_frame().await.unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.pixel(2, 1), 10);
        assert!(!dir.join("frame.png").exists());

        assert!(matches!(camera.grab_frame().await, Err(CameraError::NoFrame)));
        assert!(camera.zoom_capabilities().is_none());

        camera.stop().unwrap();
        assert!(camera.grab_frame().await.is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
