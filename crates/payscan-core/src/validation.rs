//! # Validation Module
//!
//! Upload preconditions, checked synchronously before any file read or
//! decode attempt.
//!
//! ## Usage
//! ```rust
//! use payscan_core::validation::{validate_upload, UploadLimits};
//!
//! let limits = UploadLimits::default();
//! assert!(validate_upload("image/png", 50 * 1024, &limits).is_ok());
//! assert!(validate_upload("text/plain", 50 * 1024, &limits).is_err());
//! ```

use crate::error::ValidationError;
use crate::{ACCEPTED_MIME_PREFIX, MAX_UPLOAD_BYTES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Limits applied to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadLimits {
    /// Required MIME prefix (e.g. `image/`).
    pub mime_prefix: String,
    /// Largest accepted size in bytes.
    pub max_bytes: u64,
}

impl Default for UploadLimits {
    fn default() -> Self {
        UploadLimits {
            mime_prefix: ACCEPTED_MIME_PREFIX.to_string(),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

/// Validates an upload's declared type and size.
///
/// ## Rules
/// - MIME type must start with the configured prefix (type is checked first)
/// - Size must not exceed the limit; exactly the limit is accepted
pub fn validate_upload(mime_type: &str, size: u64, limits: &UploadLimits) -> ValidationResult<()> {
    if !mime_type.starts_with(limits.mime_prefix.as_str()) {
        return Err(ValidationError::InvalidFileType {
            mime_type: mime_type.to_string(),
        });
    }

    if size > limits.max_bytes {
        return Err(ValidationError::FileTooLarge {
            size,
            max: limits.max_bytes,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_accepts_images_under_limit() {
        let limits = UploadLimits::default();
        assert!(validate_upload("image/png", 50 * 1024, &limits).is_ok());
        assert!(validate_upload("image/jpeg", 10 * MIB, &limits).is_ok());
    }

    #[test]
    fn test_rejects_non_image() {
        let limits = UploadLimits::default();
        assert_eq!(
            validate_upload("text/plain", 50 * 1024, &limits),
            Err(ValidationError::InvalidFileType {
                mime_type: "text/plain".to_string()
            })
        );
        assert!(validate_upload("", 1, &limits).is_err());
    }

    #[test]
    fn test_rejects_oversized() {
        let limits = UploadLimits::default();
        assert_eq!(
            validate_upload("image/png", 11 * MIB, &limits),
            Err(ValidationError::FileTooLarge {
                size: 11 * MIB,
                max: 10 * MIB
            })
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        let limits = UploadLimits::default();
        assert!(matches!(
            validate_upload("application/pdf", 20 * MIB, &limits),
            Err(ValidationError::InvalidFileType { .. })
        ));
    }

    #[test]
    fn test_custom_limits() {
        let limits = UploadLimits {
            mime_prefix: "image/".into(),
            max_bytes: 100,
        };
        assert!(validate_upload("image/gif", 100, &limits).is_ok());
        assert!(validate_upload("image/gif", 101, &limits).is_err());
    }
}
