//! # Replay Camera
//!
//! A camera backend that plays a directory of still images as a live feed.
//!
//! ## Device Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open(dir)                                                             │
//! │    missing dir ──► NoDevice       unreadable ──► PermissionDenied      │
//! │    no images   ──► NoDevice                                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ReplayDevice (HaveNothing)                                            │
//! │        │ wait_ready(): read + decode every file, fit to the ideal size │
//! │        │   nothing decodes ──► Unknown("Video load failed")            │
//! │        ▼                                                                │
//! │  HaveEnoughData ── frame() cycles through the decoded images           │
//! │        │                                                                │
//! │        ▼ stop()                                                         │
//! │  released: no frames, is_live() == false                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::ImageFormat;
use tracing::{debug, info, warn};

use payscan_core::{AcquireError, Dimensions, FrameBuffer};
use payscan_scanner::{
    CameraBackend, CaptureConstraints, CaptureDevice, FrameSource, ImageNormalizer, LiveFlag,
    ReadyState,
};

// =============================================================================
// Backend
// =============================================================================

/// Serves the images in `dir` (file name order) as camera frames.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    dir: PathBuf,
}

impl ReplayCamera {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ReplayCamera { dir: dir.into() }
    }

    async fn list_frames(&self) -> io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut paths = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }

        paths.sort();
        Ok(paths)
    }
}

fn acquire_error(err: &io::Error) -> AcquireError {
    match err.kind() {
        io::ErrorKind::NotFound => AcquireError::NoDevice,
        io::ErrorKind::PermissionDenied => AcquireError::PermissionDenied,
        _ => AcquireError::Unknown(err.to_string()),
    }
}

#[async_trait]
impl CameraBackend for ReplayCamera {
    async fn open(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureDevice>, AcquireError> {
        let paths = self.list_frames().await.map_err(|e| {
            warn!(dir = ?self.dir, error = %e, "Cannot open replay directory");
            acquire_error(&e)
        })?;

        if paths.is_empty() {
            warn!(dir = ?self.dir, "Replay directory has no images");
            return Err(AcquireError::NoDevice);
        }

        info!(dir = ?self.dir, frames = paths.len(), "Replay camera opened");
        Ok(Box::new(ReplayDevice::new(paths, constraints)))
    }
}

// =============================================================================
// Device
// =============================================================================

/// A live replay stream.
pub struct ReplayDevice {
    paths: Vec<PathBuf>,
    frames: Vec<FrameBuffer>,
    cursor: usize,
    normalizer: ImageNormalizer,
    ready: ReadyState,
    live: LiveFlag,
}

impl ReplayDevice {
    fn new(paths: Vec<PathBuf>, constraints: &CaptureConstraints) -> Self {
        // A real sensor delivers roughly the requested size.
        let bound = constraints.ideal_width.max(constraints.ideal_height);

        ReplayDevice {
            paths,
            frames: Vec::new(),
            cursor: 0,
            normalizer: ImageNormalizer::new(bound),
            ready: ReadyState::HaveNothing,
            live: LiveFlag::new(),
        }
    }

    async fn load(&self, path: &Path) -> Option<FrameBuffer> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(?path, error = %e, "Skipping unreadable frame");
                return None;
            }
        };

        match self.normalizer.normalize_bytes(&bytes) {
            Ok(image) => Some(image.into_frame()),
            Err(e) => {
                warn!(?path, error = %e, "Skipping undecodable frame");
                None
            }
        }
    }
}

impl FrameSource for ReplayDevice {
    fn surface(&self) -> Option<Dimensions> {
        if self.frames.is_empty() {
            return None;
        }
        self.frames
            .get(self.cursor % self.frames.len())
            .map(FrameBuffer::dimensions)
    }

    fn frame(&mut self) -> Option<FrameBuffer> {
        if !self.live.is_live() || self.frames.is_empty() {
            return None;
        }

        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor = self.cursor.wrapping_add(1);
        Some(frame)
    }
}

#[async_trait]
impl CaptureDevice for ReplayDevice {
    fn ready_state(&self) -> ReadyState {
        if self.live.is_live() {
            self.ready
        } else {
            ReadyState::HaveNothing
        }
    }

    async fn wait_ready(&mut self) -> Result<(), AcquireError> {
        let mut frames = Vec::with_capacity(self.paths.len());
        for path in &self.paths {
            if !self.live.is_live() {
                return Err(AcquireError::Unknown("Camera stopped while loading".into()));
            }
            if let Some(frame) = self.load(path).await {
                frames.push(frame);
            }
        }

        if frames.is_empty() {
            return Err(AcquireError::Unknown("Video load failed".into()));
        }

        debug!(frames = frames.len(), "Replay frames buffered");
        self.frames = frames;
        self.ready = ReadyState::HaveEnoughData;
        Ok(())
    }

    fn stop(&mut self) {
        if self.live.stop() {
            debug!("Replay camera stopped");
        }
        self.frames.clear();
        self.ready = ReadyState::HaveNothing;
    }

    fn live_flag(&self) -> LiveFlag {
        self.live.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) {
        let image =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])));
        image.save(dir.join(name)).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_is_no_device() {
        let camera = ReplayCamera::new("/nonexistent/payscan-frames");
        let result = camera.open(&CaptureConstraints::default()).await;
        assert!(matches!(result, Err(AcquireError::NoDevice)));
    }

    #[tokio::test]
    async fn test_directory_without_images_is_no_device() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let result = ReplayCamera::new(dir.path())
            .open(&CaptureConstraints::default())
            .await;
        assert!(matches!(result, Err(AcquireError::NoDevice)));
    }

    #[tokio::test]
    async fn test_frames_cycle_and_fit_ideal_size() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 1280, 960);
        write_png(dir.path(), "b.png", 100, 50);
        std::fs::write(dir.path().join("readme.txt"), "skip me").unwrap();

        let mut device = ReplayCamera::new(dir.path())
            .open(&CaptureConstraints::default())
            .await
            .unwrap();
        assert_eq!(device.ready_state(), ReadyState::HaveNothing);

        device.wait_ready().await.unwrap();
        assert_eq!(device.ready_state(), ReadyState::HaveEnoughData);

        let sizes: Vec<_> = (0..3)
            .map(|_| device.frame().unwrap().dimensions())
            .collect();
        assert_eq!(
            sizes,
            vec![
                Dimensions::new(640, 480),
                Dimensions::new(100, 50),
                Dimensions::new(640, 480),
            ]
        );

        device.stop();
        assert!(!device.is_live());
        assert!(device.frame().is_none());
        assert_eq!(device.ready_state(), ReadyState::HaveNothing);
    }

    #[tokio::test]
    async fn test_stopped_flag_silences_device_before_stop() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "a.png", 64, 48);

        let mut device = ReplayCamera::new(dir.path())
            .open(&CaptureConstraints::default())
            .await
            .unwrap();
        device.wait_ready().await.unwrap();

        let flag = device.live_flag();
        assert!(flag.stop());
        assert!(!device.is_live());
        assert_eq!(device.ready_state(), ReadyState::HaveNothing);
        assert!(device.frame().is_none());

        device.stop();
        assert!(!device.is_live());
    }

    #[tokio::test]
    async fn test_undecodable_frames_fail_readiness() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let mut device = ReplayCamera::new(dir.path())
            .open(&CaptureConstraints::default())
            .await
            .unwrap();
        let err = device.wait_ready().await.unwrap_err();
        assert_eq!(err, AcquireError::Unknown("Video load failed".into()));
    }
}
