//! # Frame Sources and Capture Devices
//!
//! Abstractions over where scan frames come from.
//!
//! ## Source Types
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Frame Sources                                  │
//! │                                                                         │
//! │              ┌───────────────────────────────────┐                      │
//! │              │        trait FrameSource          │                      │
//! │              │  surface() -> Option<Dimensions>  │                      │
//! │              │  frame()   -> Option<FrameBuffer> │                      │
//! │              └─────────────┬──────────┬──────────┘                      │
//! │                            │          │                                 │
//! │        ┌───────────────────▼──┐   ┌───▼──────────────────────┐          │
//! │        │ trait CaptureDevice  │   │ NormalizedImage          │          │
//! │        │  (live camera)       │   │  (static upload buffer)  │          │
//! │        │  ready_state()       │   │  normalizer.rs           │          │
//! │        │  wait_ready().await  │   └──────────────────────────┘          │
//! │        │  stop(), is_live()   │                                         │
//! │        └──────────▲───────────┘                                         │
//! │                   │ open(constraints).await                             │
//! │        ┌──────────┴───────────┐                                         │
//! │        │ trait CameraBackend  │  platform integration (host supplied)  │
//! │        └──────────────────────┘                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The device's actual resolution may differ from the requested ideal; the
//! scanner sizes its working surface from whatever `frame()` returns.
//!
//! ## Stopping From Outside
//!
//! While `wait_ready()` is pending the device is mutably borrowed by the
//! acquiring task. The scanner keeps a clone of the device's [`LiveFlag`]
//! so a stop can mark the device released right away; the acquiring task
//! then drops the device and `stop()` frees the hardware.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use payscan_core::{AcquireError, Dimensions, FrameBuffer};

use crate::config::{CameraSettings, FacingMode};

// =============================================================================
// Capture Constraints
// =============================================================================

/// What the scanner asks a backend for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl CaptureConstraints {
    pub fn from_settings(settings: &CameraSettings) -> Self {
        CaptureConstraints {
            facing: settings.facing,
            ideal_width: settings.ideal_width,
            ideal_height: settings.ideal_height,
        }
    }

    pub fn ideal_dimensions(&self) -> Dimensions {
        Dimensions::new(self.ideal_width, self.ideal_height)
    }
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self::from_settings(&CameraSettings::default())
    }
}

// =============================================================================
// Ready State
// =============================================================================

/// How much data a live device has buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    /// Nothing buffered yet.
    HaveNothing,
    /// Stream metadata (resolution) known, no full frame yet.
    HaveMetadata,
    /// A full frame is available to grab.
    HaveEnoughData,
}

impl ReadyState {
    /// Returns true when a tick may grab and decode a frame.
    pub fn can_decode(&self) -> bool {
        matches!(self, ReadyState::HaveEnoughData)
    }
}

// =============================================================================
// Live Flag
// =============================================================================

/// Liveness shared between a device and whoever may stop it.
///
/// Starts live. Once stopped it never becomes live again.
#[derive(Debug, Clone)]
pub struct LiveFlag(Arc<AtomicBool>);

impl LiveFlag {
    pub fn new() -> Self {
        LiveFlag(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks the device released. Returns true if it was live.
    pub fn stop(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl Default for LiveFlag {
    fn default() -> Self {
        LiveFlag::new()
    }
}

// =============================================================================
// Frame Source
// =============================================================================

/// Anything that can hand the decoder a still frame.
pub trait FrameSource: Send {
    /// Size of the frame the source would produce right now, if known.
    fn surface(&self) -> Option<Dimensions>;

    /// Copies out the current frame, or `None` if no frame is available.
    fn frame(&mut self) -> Option<FrameBuffer>;
}

// =============================================================================
// Capture Device
// =============================================================================

/// A live, acquired camera stream.
///
/// Implementations should release the underlying hardware in `stop()`. The
/// scanner calls `stop()` on every exit path; calling it again must be
/// harmless.
///
/// A device whose [`LiveFlag`] was stopped must report
/// `ReadyState::HaveNothing` and hand out no frames, even before `stop()`
/// runs.
#[async_trait]
pub trait CaptureDevice: FrameSource {
    /// Current buffering state.
    fn ready_state(&self) -> ReadyState;

    /// Resolves once stream metadata is available.
    ///
    /// An error here means the stream was granted but never produced video
    /// (the "video load failed" case).
    async fn wait_ready(&mut self) -> Result<(), AcquireError>;

    /// Stops every track and releases the device.
    fn stop(&mut self);

    /// The flag `stop()` clears. The scanner holds a clone while acquiring.
    fn live_flag(&self) -> LiveFlag;

    /// Returns true while the device is held.
    fn is_live(&self) -> bool {
        self.live_flag().is_live()
    }
}

// =============================================================================
// Camera Backend
// =============================================================================

/// Platform integration that grants camera access.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Requests a device matching `constraints`.
    ///
    /// Suspends while the user or OS decides on the permission prompt.
    async fn open(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureDevice>, AcquireError>;
}

/// Backend for environments without any capture API.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedBackend;

#[async_trait]
impl CameraBackend for UnsupportedBackend {
    async fn open(
        &self,
        _constraints: &CaptureConstraints,
    ) -> Result<Box<dyn CaptureDevice>, AcquireError> {
        Err(AcquireError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraints_from_default_settings() {
        let constraints = CaptureConstraints::default();
        assert_eq!(constraints.facing, FacingMode::Environment);
        assert_eq!(constraints.ideal_dimensions(), Dimensions::new(640, 480));
    }

    #[test]
    fn test_ready_state_ordering() {
        assert!(ReadyState::HaveNothing < ReadyState::HaveMetadata);
        assert!(ReadyState::HaveMetadata < ReadyState::HaveEnoughData);
        assert!(ReadyState::HaveEnoughData.can_decode());
        assert!(!ReadyState::HaveMetadata.can_decode());
    }

    #[test]
    fn test_live_flag_stops_once_for_every_clone() {
        let flag = LiveFlag::new();
        let held = flag.clone();
        assert!(held.is_live());

        assert!(flag.stop());
        assert!(!flag.stop());
        assert!(!held.is_live());
    }

    #[tokio::test]
    async fn test_unsupported_backend() {
        let result = UnsupportedBackend.open(&CaptureConstraints::default()).await;
        assert!(matches!(result, Err(AcquireError::Unsupported)));
    }
}
