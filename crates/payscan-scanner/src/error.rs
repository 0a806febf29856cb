//! # Scan Error Types
//!
//! Error types for scanner operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Scan Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Acquisition   │  │     Upload              │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Acquire(..)    │  │  Rejected(..)           │ │
//! │  │  ConfigLoad     │  │  Cancelled      │  │  FileRead               │ │
//! │  │  ConfigSave     │  │                 │  │  ImageLoad              │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Decode       │  │    Internal     │                              │
//! │  │                 │  │                 │                              │
//! │  │  NoCodeFound    │  │  Frame(..)      │                              │
//! │  └─────────────────┘  └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant has a [`ScanError::user_message`]; the controller turns
//! failures into notifications instead of letting them escape to the host.

use payscan_core::{AcquireError, CoreError, ValidationError};
use thiserror::Error;

/// Result type alias for scanner operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Scanner error type covering all possible scan failures.
#[derive(Debug, Error)]
pub enum ScanError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid scanner configuration.
    #[error("Invalid scanner configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Acquisition Errors
    // =========================================================================
    /// The camera could not be opened.
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    /// The session was stopped or replaced while acquiring.
    #[error("Scan session was cancelled")]
    Cancelled,

    // =========================================================================
    // Upload Errors
    // =========================================================================
    /// Upload failed type/size validation.
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    /// Reading the uploaded file failed.
    #[error("Failed to read file: {0}")]
    FileRead(String),

    /// The uploaded bytes are not a decodable image.
    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    // =========================================================================
    // Decode Errors
    // =========================================================================
    /// Single gallery decode attempt found nothing.
    #[error("No QR code found in image")]
    NoCodeFound,

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// A frame could not be built from rendered pixels.
    #[error(transparent)]
    Frame(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ScanError {
    fn from(err: toml::ser::Error) -> Self {
        ScanError::ConfigSaveFailed(err.to_string())
    }
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        ScanError::ImageLoad(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ScanError {
    /// Returns true if this error came from opening the camera.
    pub fn is_acquisition_error(&self) -> bool {
        matches!(self, ScanError::Acquire(_))
    }

    /// Returns true if the upload was refused before any decode attempt.
    pub fn is_upload_rejection(&self) -> bool {
        matches!(self, ScanError::Rejected(_))
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidConfig(_)
                | ScanError::ConfigLoadFailed(_)
                | ScanError::ConfigSaveFailed(_)
        )
    }

    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ScanError::Acquire(cause) => {
                format!("Unable to access camera. {}", cause.guidance())
            }
            ScanError::Rejected(ValidationError::InvalidFileType { .. }) => {
                "Invalid file type. Please select a valid image file.".to_string()
            }
            ScanError::Rejected(ValidationError::FileTooLarge { max, .. }) => format!(
                "Image file is too large. Please select an image under {}MB.",
                max / (1024 * 1024)
            ),
            ScanError::FileRead(_) => "Failed to read file. Please try again.".to_string(),
            ScanError::ImageLoad(_) => {
                "Failed to load image. Please try a different image file.".to_string()
            }
            ScanError::NoCodeFound => "No QR code found in the selected image. \
                Please try a clearer image or different angle."
                .to_string(),
            ScanError::Cancelled => "Scan cancelled.".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert!(ScanError::Acquire(AcquireError::NoDevice).is_acquisition_error());
        assert!(ScanError::Rejected(ValidationError::FileTooLarge { size: 2, max: 1 })
            .is_upload_rejection());
        assert!(ScanError::InvalidConfig("bad".into()).is_config_error());
        assert!(!ScanError::NoCodeFound.is_config_error());
        assert!(!ScanError::NoCodeFound.is_upload_rejection());
    }

    #[test]
    fn test_acquire_message_has_prefix_and_guidance() {
        let msg = ScanError::Acquire(AcquireError::PermissionDenied).user_message();
        assert!(msg.starts_with("Unable to access camera. "));
        assert!(msg.contains("permission denied"));
        assert!(msg.contains("allow"));
    }

    #[test]
    fn test_upload_messages() {
        let invalid = ScanError::Rejected(ValidationError::InvalidFileType {
            mime_type: "text/plain".into(),
        });
        assert!(invalid.user_message().contains("Invalid file type"));

        let large = ScanError::Rejected(ValidationError::FileTooLarge {
            size: 11 * 1024 * 1024,
            max: 10 * 1024 * 1024,
        });
        assert!(large.user_message().contains("too large"));
        assert!(large.user_message().contains("10MB"));
    }

    #[test]
    fn test_file_failures_are_distinct() {
        assert_ne!(
            ScanError::FileRead("eof".into()).user_message(),
            ScanError::ImageLoad("bad magic".into()).user_message()
        );
        assert!(ScanError::ImageLoad("x".into())
            .user_message()
            .contains("Failed to load image"));
    }

    #[test]
    fn test_no_code_message() {
        let msg = ScanError::NoCodeFound.user_message();
        assert!(msg.contains("No QR code found"));
        assert!(msg.contains("clearer image"));
    }
}
