//! # payscan-scanner: Scan Controller for PayScan
//!
//! This crate drives a QR scan from "user pressed Scan" to "payment form
//! filled in": it owns the camera, polls frames, normalizes uploads and
//! reports every outcome as a notification.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scanner Architecture                              │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Scanner (session.rs)                          │  │
//! │  │                                                                  │  │
//! │  │  Created and owned by the host page                             │  │
//! │  │  One session at a time: Idle → Acquiring → Scanning → Found     │  │
//! │  └───────┬──────────────────┬──────────────────┬────────────────────┘  │
//! │          │                  │                  │                        │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │ CameraBackend  │  │ImageNormalizer │  │  Decoder (external)    │    │
//! │  │ CaptureDevice  │  │                │  │                        │    │
//! │  │                │  │ load_from_     │  │  FrameBuffer ──►       │    │
//! │  │ open, ready,   │  │ memory, fit in │  │  Option<Payload>       │    │
//! │  │ frames, stop   │  │ 1024 px        │  │                        │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────┐    │
//! │  │NotificationSink│  │   HostForm     │  │   ScannerConfig        │    │
//! │  │                │  │                │  │                        │    │
//! │  │ success/error  │  │ reference +    │  │ TOML file + PAYSCAN_*  │    │
//! │  │ 5 s expiry     │  │ amount fields  │  │ env overrides          │    │
//! │  └────────────────┘  └────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  EVENTS (to the host page):                                            │
//! │  • ScanEvent::StateChanged - every state transition                    │
//! │  • ScanEvent::Decoded      - payload of a successful scan              │
//! │  • NotificationEvent       - notifications shown / expired             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`session`] - The `Scanner` state machine and poll loop
//! - [`device`] - Frame sources, capture devices and camera backends
//! - [`decoder`] - QR decoder boundary
//! - [`normalizer`] - Upload decoding and downscaling
//! - [`notify`] - Notification sinks and the notification center
//! - [`form`] - Host form boundary
//! - [`config`] - Scanner configuration
//! - [`error`] - Scan error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use payscan_scanner::{ImageUpload, Scanner, ScannerConfig, TracingSink};
//!
//! let config = ScannerConfig::load_or_default(None);
//! let scanner = Scanner::builder(config)
//!     .with_backend(camera_backend)
//!     .with_decoder(decoder)
//!     .with_sink(Arc::new(TracingSink))
//!     .build()?;
//!
//! // Live camera: returns once polling has started
//! scanner.start_camera().await?;
//!
//! // Gallery: one decode attempt
//! let upload = ImageUpload::from_path("image/png", "receipt.png");
//! let payload = scanner.scan_image(upload).await?;
//! println!("Amount: {:?}", payload.amount());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod decoder;
pub mod device;
pub mod error;
pub mod form;
pub mod normalizer;
pub mod notify;
pub mod session;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{FacingMode, ScannerConfig};
pub use decoder::Decoder;
pub use device::{
    CameraBackend, CaptureConstraints, CaptureDevice, FrameSource, LiveFlag, ReadyState,
    UnsupportedBackend,
};
pub use error::{ScanError, ScanResult};
pub use form::{HostForm, SharedForm};
pub use normalizer::{ImageNormalizer, NormalizedImage};
pub use notify::{NoOpSink, NotificationCenter, NotificationEvent, NotificationSink, TracingSink};
pub use session::{
    ImageUpload, ScanEvent, ScanStatus, ScanStatusDto, Scanner, ScannerBuilder, UploadSource,
    SUCCESS_MESSAGE,
};

// Re-export core types used in public signatures
pub use payscan_core::{
    AcquireError, DecodedPayload, Dimensions, FrameBuffer, Notification, PaymentFields, ScanMode,
    ScanState, Severity,
};
