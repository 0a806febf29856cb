//! # Geometry Module
//!
//! Working-resolution math for uploaded images.
//!
//! ## Downscale Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  max(W, H) <= limit   ──►  W' = W, H' = H        (never upscale)       │
//! │                                                                         │
//! │  W > H, W > limit     ──►  W' = limit                                   │
//! │                            H' = round(H * limit / W)                    │
//! │                                                                         │
//! │  H >= W, H > limit    ──►  H' = limit                                   │
//! │                            W' = round(W * limit / H)                    │
//! │                                                                         │
//! │  Example: 2000x1000, limit 1024  ──►  1024x512                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The short side never rounds below one pixel.

use crate::types::Dimensions;

/// Fits `source` inside a `max_dimension` square, preserving aspect ratio.
///
/// ## Example
/// ```rust
/// use payscan_core::geometry::fit_within;
/// use payscan_core::Dimensions;
///
/// assert_eq!(fit_within(Dimensions::new(2000, 1000), 1024), Dimensions::new(1024, 512));
/// assert_eq!(fit_within(Dimensions::new(800, 600), 1024), Dimensions::new(800, 600));
/// ```
pub fn fit_within(source: Dimensions, max_dimension: u32) -> Dimensions {
    let Dimensions { width, height } = source;

    if width <= max_dimension && height <= max_dimension {
        return source;
    }

    if width > height {
        Dimensions::new(max_dimension, scale_side(height, max_dimension, width))
    } else {
        Dimensions::new(scale_side(width, max_dimension, height), max_dimension)
    }
}

/// Returns true if `source` would be resized by [`fit_within`].
pub fn needs_downscale(source: Dimensions, max_dimension: u32) -> bool {
    source.max_side() > max_dimension
}

/// `side * numerator / denominator`, rounded to nearest, at least 1.
fn scale_side(side: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = side as f64 * numerator as f64 / denominator as f64;
    (scaled.round() as u32).max(1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_landscape_downscale() {
        assert_eq!(
            fit_within(Dimensions::new(2000, 1000), 1024),
            Dimensions::new(1024, 512)
        );
    }

    #[test]
    fn test_portrait_downscale() {
        assert_eq!(
            fit_within(Dimensions::new(1500, 3000), 1024),
            Dimensions::new(512, 1024)
        );
    }

    #[test]
    fn test_square_downscale() {
        assert_eq!(
            fit_within(Dimensions::new(4096, 4096), 1024),
            Dimensions::new(1024, 1024)
        );
    }

    #[test]
    fn test_no_upscale() {
        assert_eq!(
            fit_within(Dimensions::new(640, 480), 1024),
            Dimensions::new(640, 480)
        );
        assert_eq!(
            fit_within(Dimensions::new(1024, 1024), 1024),
            Dimensions::new(1024, 1024)
        );
    }

    #[test]
    fn test_extreme_aspect_keeps_one_pixel() {
        assert_eq!(
            fit_within(Dimensions::new(1, 50_000), 1024),
            Dimensions::new(1, 1024)
        );
    }

    #[test]
    fn test_needs_downscale() {
        assert!(needs_downscale(Dimensions::new(1025, 10), 1024));
        assert!(!needs_downscale(Dimensions::new(1024, 10), 1024));
    }

    proptest! {
        #[test]
        fn prop_large_inputs_hit_the_bound(w in 1u32..20_000, h in 1u32..20_000) {
            let src = Dimensions::new(w, h);
            prop_assume!(src.max_side() > 1024);

            let out = fit_within(src, 1024);
            prop_assert_eq!(out.max_side(), 1024);

            // The short side stays within one pixel of the exact ratio.
            if w > h {
                let exact = out.width as f64 * h as f64 / w as f64;
                prop_assert!((out.height as f64 - exact).abs() <= 1.0);
            } else {
                let exact = out.height as f64 * w as f64 / h as f64;
                prop_assert!((out.width as f64 - exact).abs() <= 1.0);
            }
        }

        #[test]
        fn prop_small_inputs_unchanged(w in 1u32..=1024, h in 1u32..=1024) {
            let src = Dimensions::new(w, h);
            prop_assert_eq!(fit_within(src, 1024), src);
        }

        #[test]
        fn prop_deterministic(w in 1u32..20_000, h in 1u32..20_000, max in 1u32..4096) {
            let src = Dimensions::new(w, h);
            prop_assert_eq!(fit_within(src, max), fit_within(src, max));
            prop_assert!(fit_within(src, max).max_side() <= max);
        }
    }
}
