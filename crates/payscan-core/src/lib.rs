//! # payscan-core: Pure Domain Logic for PayScan
//!
//! This crate holds everything about a scan that can be decided without
//! touching a camera, a file or a clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        PayScan Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Host Page (loan form)                        │   │
//! │  │   Scan button ──► Camera preview ──► qr_data / amount fields    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 payscan-scanner (Scanner)                       │   │
//! │  │     start_camera, stop_camera, scan_image, notifications        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ payscan-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  payload  │  │ geometry  │  │ validation│  │   │
//! │  │   │ ScanState │  │ `|` split │  │ fit 1024  │  │ MIME/size │  │   │
//! │  │   │FrameBuffer│  │  amount   │  │ no upscale│  │  10 MiB   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CAMERA • NO TIMERS • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ScanState, FrameBuffer, Notification, etc.)
//! - [`payload`] - Decoded payload splitting and amount extraction
//! - [`geometry`] - Aspect-preserving downscale math
//! - [`validation`] - Upload preconditions
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use payscan_core::geometry::fit_within;
//! use payscan_core::payload::DecodedPayload;
//! use payscan_core::Dimensions;
//!
//! let fitted = fit_within(Dimensions::new(2000, 1000), 1024);
//! assert_eq!(fitted, Dimensions::new(1024, 512));
//!
//! let payload = DecodedPayload::new("PAY|REF123|NOTE|450.00");
//! assert_eq!(payload.amount(), Some("450.00"));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod geometry;
pub mod payload;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{AcquireError, CoreError, ValidationError};
pub use payload::{DecodedPayload, PaymentFields};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Delay between two camera poll ticks when no code was found.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Largest side, in pixels, of an uploaded image after normalization.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// MIME prefix an upload must carry to be considered an image.
pub const ACCEPTED_MIME_PREFIX: &str = "image/";

/// How long a notification stays visible.
pub const NOTIFICATION_LIFETIME_SECS: u64 = 5;

/// Field separator inside payment payloads.
pub const PAYLOAD_DELIMITER: char = '|';

/// Position of the amount inside a delimited payload.
pub const AMOUNT_SEGMENT_INDEX: usize = 3;

/// Requested (not guaranteed) capture resolution.
pub const IDEAL_CAPTURE_WIDTH: u32 = 640;
pub const IDEAL_CAPTURE_HEIGHT: u32 = 480;

/// Bytes per pixel in a [`FrameBuffer`] (RGBA).
pub const FRAME_CHANNELS: usize = 4;
