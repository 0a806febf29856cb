//! # Image Normalizer
//!
//! Turns an uploaded image file into a bounded working frame.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Upload Normalization                              │
//! │                                                                         │
//! │  bytes ──► decode_bytes() ──► DynamicImage (W x H, any format)          │
//! │                                   │                                     │
//! │                                   ▼                                     │
//! │                     fit_within(W x H, max_dimension)                    │
//! │                                   │                                     │
//! │                 ┌─────────────────┴─────────────────┐                   │
//! │                 │ max(W,H) <= max                   │ max(W,H) > max    │
//! │                 ▼                                   ▼                   │
//! │            keep pixels                  resize_exact(W', H', Triangle)  │
//! │                 └─────────────────┬─────────────────┘                   │
//! │                                   ▼                                     │
//! │                   to_rgba8() ──► NormalizedImage (FrameBuffer)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Normalization is deterministic for a given source and never upscales.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::debug;

use payscan_core::geometry::{fit_within, needs_downscale};
use payscan_core::{Dimensions, FrameBuffer};

use crate::device::FrameSource;
use crate::error::{ScanError, ScanResult};

// =============================================================================
// Normalized Image
// =============================================================================

/// An upload rendered onto the working surface.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    source: Dimensions,
    frame: FrameBuffer,
}

impl NormalizedImage {
    /// Dimensions of the decoded file before resizing.
    pub fn source_dimensions(&self) -> Dimensions {
        self.source
    }

    /// Dimensions of the working surface.
    pub fn dimensions(&self) -> Dimensions {
        self.frame.dimensions()
    }

    /// Returns true if the source was shrunk.
    pub fn was_downscaled(&self) -> bool {
        self.source != self.frame.dimensions()
    }

    pub fn as_frame(&self) -> &FrameBuffer {
        &self.frame
    }

    pub fn into_frame(self) -> FrameBuffer {
        self.frame
    }
}

impl FrameSource for NormalizedImage {
    fn surface(&self) -> Option<Dimensions> {
        Some(self.frame.dimensions())
    }

    fn frame(&mut self) -> Option<FrameBuffer> {
        Some(self.frame.clone())
    }
}

// =============================================================================
// Image Normalizer
// =============================================================================

/// Bounds uploads to `max_dimension` on their longer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageNormalizer {
    max_dimension: u32,
}

impl ImageNormalizer {
    pub fn new(max_dimension: u32) -> Self {
        ImageNormalizer { max_dimension }
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Decodes an image file held in memory.
    ///
    /// ## Errors
    /// `ScanError::ImageLoad` if the bytes are not a supported image.
    pub fn decode_bytes(&self, bytes: &[u8]) -> ScanResult<DynamicImage> {
        image::load_from_memory(bytes).map_err(ScanError::from)
    }

    /// Output dimensions for a source of the given size.
    pub fn target_dimensions(&self, source: Dimensions) -> Dimensions {
        fit_within(source, self.max_dimension)
    }

    /// Renders `image` onto a working surface no larger than the bound.
    pub fn normalize(&self, image: &DynamicImage) -> ScanResult<NormalizedImage> {
        let (width, height) = image.dimensions();
        let source = Dimensions::new(width, height);
        let target = self.target_dimensions(source);

        let rgba = if needs_downscale(source, self.max_dimension) {
            debug!(
                source = %source,
                target = %target,
                "Downscaling upload to working surface"
            );
            image
                .resize_exact(target.width, target.height, FilterType::Triangle)
                .to_rgba8()
        } else {
            image.to_rgba8()
        };

        let frame = FrameBuffer::new(rgba.width(), rgba.height(), rgba.into_raw())?;

        Ok(NormalizedImage { source, frame })
    }

    /// Decodes and normalizes in one step.
    pub fn normalize_bytes(&self, bytes: &[u8]) -> ScanResult<NormalizedImage> {
        let image = self.decode_bytes(bytes)?;
        self.normalize(&image)
    }
}

impl Default for ImageNormalizer {
    fn default() -> Self {
        ImageNormalizer::new(payscan_core::DEFAULT_MAX_DIMENSION)
    }
}
