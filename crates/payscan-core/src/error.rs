//! # Error Types
//!
//! Domain-specific error types for payscan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  payscan-core errors (this file)                                       │
//! │  ├── CoreError        - Malformed frames, impossible dimensions        │
//! │  ├── ValidationError  - Upload rejected before decode                  │
//! │  └── AcquireError     - Camera could not be opened                     │
//! │                                                                         │
//! │  payscan-scanner errors (separate crate)                               │
//! │  └── ScanError        - Everything the controller can report           │
//! │                                                                         │
//! │  Flow: ValidationError / AcquireError → ScanError → Notification       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (MIME type, sizes, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each user-facing variant maps to a notification message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Programming errors around pixel buffers.
///
/// These are not runtime-recoverable conditions: a frame with the wrong
/// number of bytes means the caller built it incorrectly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Pixel payload length does not match `width * height * channels`.
    #[error("Malformed frame: {width}x{height} needs {expected} bytes, got {actual}")]
    MalformedFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// A zero-sized frame or image.
    #[error("Invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

// =============================================================================
// Validation Error
// =============================================================================

/// Upload preconditions checked before any decode attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// MIME type is not an image type.
    #[error("Invalid file type '{mime_type}': please select a valid image file")]
    InvalidFileType { mime_type: String },

    /// File exceeds the upload limit.
    #[error("Image file is too large ({size} bytes, limit {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },
}

// =============================================================================
// Acquire Error
// =============================================================================

/// Reasons a capture device could not be acquired.
///
/// ## Mapping From Browser Error Names
/// ```text
/// NotAllowedError    ──► PermissionDenied
/// NotFoundError      ──► NoDevice
/// NotSupportedError  ──► Unsupported
/// NotReadableError   ──► DeviceBusy
/// "...HTTPS..."      ──► InsecureContext
/// anything else      ──► Unknown
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AcquireError {
    /// No capture API in this environment.
    #[error("Camera not supported on this device")]
    Unsupported,

    /// The user or OS refused access.
    #[error("Camera permission denied")]
    PermissionDenied,

    /// No camera hardware.
    #[error("No camera found")]
    NoDevice,

    /// Camera held by another consumer.
    #[error("Camera already in use")]
    DeviceBusy,

    /// Capture requires a secure transport.
    #[error("Camera access requires HTTPS")]
    InsecureContext,

    /// Any other acquisition failure.
    #[error("Camera acquisition failed: {0}")]
    Unknown(String),
}

impl AcquireError {
    /// Classifies a browser-style error `name` and `message`.
    ///
    /// The name wins when it is recognized; otherwise a message mentioning
    /// HTTPS is treated as an insecure context.
    pub fn from_dom_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" => AcquireError::PermissionDenied,
            "NotFoundError" => AcquireError::NoDevice,
            "NotSupportedError" => AcquireError::Unsupported,
            "NotReadableError" => AcquireError::DeviceBusy,
            _ if message.contains("HTTPS") => AcquireError::InsecureContext,
            _ => AcquireError::Unknown(message.to_string()),
        }
    }

    /// User-facing guidance for this cause.
    pub fn guidance(&self) -> &'static str {
        match self {
            AcquireError::Unsupported => "Camera not supported on this browser.",
            AcquireError::PermissionDenied => {
                "Camera permission denied. Please allow camera access and try again."
            }
            AcquireError::NoDevice => "No camera found on this device.",
            AcquireError::DeviceBusy => "Camera is already in use by another application.",
            AcquireError::InsecureContext => {
                "Camera access requires HTTPS. Please use a secure connection."
            }
            AcquireError::Unknown(_) => "Please check your camera settings and try again.",
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
