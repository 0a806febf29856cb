//! # Domain Types
//!
//! Core domain types used throughout PayScan.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ScanState     │   │   FrameBuffer   │   │  Notification   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Idle           │   │  width          │   │  severity       │       │
//! │  │  Acquiring      │   │  height         │   │  message        │       │
//! │  │  Scanning       │   │  pixels (RGBA)  │   │  created_at     │       │
//! │  │  Found / Failed │   │  row-major      │   │  lifetime_ms    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    ScanMode     │   │   Dimensions    │   │    Severity     │       │
//! │  │  Camera         │   │  width, height  │   │  Success        │       │
//! │  │  Gallery        │   │  max_side()     │   │  Error          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::FRAME_CHANNELS;

// =============================================================================
// Scan State
// =============================================================================

/// Lifecycle state of a scan session.
///
/// ## State Machine
/// ```text
///            start(Camera)                 device ready
///   Idle ───────────────────► Acquiring ─────────────────► Scanning
///    ▲   start(Gallery)           │                           │  │
///    │ ─────────────────────►     │ refused / busy / ...      │  │ tick: no code
///    │                            ▼                           │  └──► Scanning
///    │                         Failed ◄───────────────────────┤
///    │                            │        code found         ▼
///    └────────────────────────────┴──────────────────────── Found
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ScanState {
    /// No session running.
    #[default]
    Idle,
    /// Waiting for the device (or validating and loading an upload).
    Acquiring,
    /// Camera is live and the poll loop is running.
    Scanning,
    /// A code was decoded.
    Found,
    /// The session ended with an error.
    Failed,
}

impl ScanState {
    /// Returns true while a session owns resources.
    pub fn is_active(&self) -> bool {
        matches!(self, ScanState::Acquiring | ScanState::Scanning)
    }

    /// Returns true for the end-of-session states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Found | ScanState::Failed)
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanState::Idle => write!(f, "idle"),
            ScanState::Acquiring => write!(f, "acquiring"),
            ScanState::Scanning => write!(f, "scanning"),
            ScanState::Found => write!(f, "found"),
            ScanState::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// Scan Mode
// =============================================================================

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ScanMode {
    /// Live capture, polled until a code is found or the host stops it.
    Camera,
    /// A single uploaded image, one decode attempt.
    Gallery,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanMode::Camera => write!(f, "camera"),
            ScanMode::Gallery => write!(f, "gallery"),
        }
    }
}

// =============================================================================
// Dimensions
// =============================================================================

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Dimensions { width, height }
    }

    /// The longer side.
    #[inline]
    pub fn max_side(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Number of pixels.
    #[inline]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Width divided by height (0.0 for an empty height).
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// =============================================================================
// Frame Buffer
// =============================================================================

/// One still image handed to the decoder.
///
/// Pixels are row-major RGBA, 4 bytes per pixel. The constructor is the only
/// way in, so a `FrameBuffer` always has a payload matching its dimensions.
/// Frames are produced per tick (or per upload) and never retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    dimensions: Dimensions,
    pixels: Vec<u8>,
}

impl FrameBuffer {
    /// Wraps an RGBA pixel payload.
    ///
    /// ## Errors
    /// - `InvalidDimensions` if either side is zero
    /// - `MalformedFrame` if `pixels.len() != width * height * 4`
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> CoreResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }

        let expected = width as usize * height as usize * FRAME_CHANNELS;
        if pixels.len() != expected {
            return Err(CoreError::MalformedFrame {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(FrameBuffer {
            dimensions: Dimensions::new(width, height),
            pixels,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    #[inline]
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Raw RGBA bytes.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Luma of the pixel at (x, y), BT.601 weights.
    ///
    /// Returns `None` when (x, y) lies outside the frame.
    pub fn luma(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.dimensions.width || y >= self.dimensions.height {
            return None;
        }

        let idx = (y as usize * self.dimensions.width as usize + x as usize) * FRAME_CHANNELS;
        let rgb = self.pixels.get(idx..idx + 3)?;
        let [r, g, b] = [rgb[0] as u32, rgb[1] as u32, rgb[2] as u32];
        Some(((r * 299 + g * 587 + b * 114) / 1000) as u8)
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }
}

// =============================================================================
// Notification
// =============================================================================

/// Notification severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Severity {
    Success,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A transient, self-expiring message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Notification {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub severity: Severity,

    pub message: String,

    /// When the notification was raised.
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,

    /// Display lifetime in milliseconds.
    pub lifetime_ms: u64,
}

impl Notification {
    /// Creates a notification stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>, lifetime_ms: u64) -> Self {
        Notification {
            id: Uuid::new_v4().to_string(),
            severity,
            message: message.into(),
            created_at: Utc::now(),
            lifetime_ms,
        }
    }

    /// Wall-clock time after which the notification is no longer shown.
    pub fn expires_at(&self) -> DateTime<Utc> {
        let lifetime = i64::try_from(self.lifetime_ms).unwrap_or(i64::MAX);
        self.created_at + Duration::milliseconds(lifetime)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_accepts_matching_payload() {
        let frame = FrameBuffer::new(2, 3, vec![0; 24]).unwrap();
        assert_eq!(frame.dimensions(), Dimensions::new(2, 3));
        assert_eq!(frame.pixels().len(), 24);
    }

    #[test]
    fn test_frame_buffer_rejects_wrong_length() {
        let err = FrameBuffer::new(2, 2, vec![0; 15]).unwrap_err();
        assert_eq!(
            err,
            CoreError::MalformedFrame {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_frame_buffer_rejects_zero_dimension() {
        assert!(matches!(
            FrameBuffer::new(0, 4, vec![]),
            Err(CoreError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_luma() {
        let pixels = vec![255, 255, 255, 255, 0, 0, 0, 255];
        let frame = FrameBuffer::new(2, 1, pixels).unwrap();
        assert_eq!(frame.luma(0, 0), Some(255));
        assert_eq!(frame.luma(1, 0), Some(0));
    }

    #[test]
    fn test_luma_outside_frame_is_none() {
        let frame = FrameBuffer::new(2, 1, vec![0; 8]).unwrap();
        assert_eq!(frame.luma(2, 0), None);
        assert_eq!(frame.luma(0, 1), None);
        assert_eq!(frame.luma(u32::MAX, u32::MAX), None);
    }

    #[test]
    fn test_scan_state_flags() {
        assert!(ScanState::Acquiring.is_active());
        assert!(ScanState::Scanning.is_active());
        assert!(!ScanState::Idle.is_active());
        assert!(ScanState::Found.is_terminal());
        assert!(ScanState::Failed.is_terminal());
        assert!(!ScanState::Scanning.is_terminal());
        assert_eq!(ScanState::default(), ScanState::Idle);
    }

    #[test]
    fn test_notification_expiry() {
        let n = Notification::new(Severity::Success, "done", 5_000);
        assert!(!n.is_expired_at(n.created_at));
        assert!(!n.is_expired_at(n.created_at + Duration::milliseconds(4_999)));
        assert!(n.is_expired_at(n.created_at + Duration::milliseconds(5_000)));
    }

    #[test]
    fn test_notification_serializes_camel_case() {
        let n = Notification::new(Severity::Error, "oops", 5_000);
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("\"lifetimeMs\":5000"));
        assert!(json.contains("\"severity\":\"error\""));
    }

    #[test]
    fn test_dimensions_helpers() {
        let d = Dimensions::new(2000, 1000);
        assert_eq!(d.max_side(), 2000);
        assert_eq!(d.area(), 2_000_000);
        assert!((d.aspect_ratio() - 2.0).abs() < f64::EPSILON);
        assert_eq!(d.to_string(), "2000x1000");
    }
}
