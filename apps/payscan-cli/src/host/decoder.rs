//! # rqrr Decoder
//!
//! Pure-Rust QR recognition behind the scanner's [`Decoder`] trait.
//!
//! The frame's RGBA pixels are reduced to BT.601 luma on the fly; rqrr does
//! its own thresholding and grid detection. The first grid that decodes wins.

use rqrr::PreparedImage;
use tracing::trace;

use payscan_core::{DecodedPayload, FrameBuffer};
use payscan_scanner::Decoder;

#[derive(Debug, Default, Clone, Copy)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    pub fn new() -> Self {
        RqrrDecoder
    }
}

impl Decoder for RqrrDecoder {
    fn decode(&self, frame: &FrameBuffer) -> Option<DecodedPayload> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;

        // rqrr only samples inside (width, height).
        let mut prepared = PreparedImage::prepare_from_greyscale(width, height, |x, y| {
            frame.luma(x as u32, y as u32).unwrap_or(u8::MAX)
        });
        let grids = prepared.detect_grids();
        trace!(grids = grids.len(), %width, %height, "QR grids detected");

        grids
            .iter()
            .find_map(|grid| grid.decode().ok())
            .map(|(_, content)| DecodedPayload::new(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_has_no_code() {
        let frame = FrameBuffer::new(64, 48, vec![255; 64 * 48 * 4]).unwrap();
        assert_eq!(RqrrDecoder::new().decode(&frame), None);
    }
}
