//! # Decoder Boundary
//!
//! The pixel-to-text recognizer is external. The scanner only needs
//! "payload or nothing" from it.
//!
//! ```text
//!   FrameBuffer (RGBA, W x H) ──► Decoder::decode ──► Some(DecodedPayload)
//!                                                 └─► None  (no code: not an error)
//! ```
//!
//! Malformed buffers cannot reach a decoder: [`FrameBuffer::new`] rejects
//! them, and [`decode_raw`] surfaces that as a [`CoreError`].

use payscan_core::{CoreError, DecodedPayload, FrameBuffer};

/// A QR recognizer.
pub trait Decoder: Send + Sync {
    /// Looks for a code in `frame`.
    fn decode(&self, frame: &FrameBuffer) -> Option<DecodedPayload>;
}

impl<F> Decoder for F
where
    F: Fn(&FrameBuffer) -> Option<DecodedPayload> + Send + Sync,
{
    fn decode(&self, frame: &FrameBuffer) -> Option<DecodedPayload> {
        self(frame)
    }
}

/// Decodes a raw RGBA buffer.
///
/// ## Errors
/// Returns `CoreError` when `pixels` does not match `width * height * 4`.
pub fn decode_raw<D: Decoder + ?Sized>(
    decoder: &D,
    pixels: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<Option<DecodedPayload>, CoreError> {
    let frame = FrameBuffer::new(width, height, pixels)?;
    Ok(decoder.decode(&frame))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn always(text: &'static str) -> impl Decoder {
        move |_: &FrameBuffer| Some(DecodedPayload::new(text))
    }

    #[test]
    fn test_closure_decoder() {
        let decoder = always("PAY|A|B|1.00");
        let frame = FrameBuffer::new(1, 1, vec![0; 4]).unwrap();
        assert_eq!(
            decoder.decode(&frame).map(|p| p.into_text()),
            Some("PAY|A|B|1.00".to_string())
        );
    }

    #[test]
    fn test_decode_raw_rejects_malformed_buffer() {
        let decoder = always("x");
        assert!(matches!(
            decode_raw(&decoder, vec![0; 7], 2, 1),
            Err(CoreError::MalformedFrame { .. })
        ));
    }

    #[test]
    fn test_decode_raw_not_found_is_none() {
        let decoder = |_: &FrameBuffer| -> Option<DecodedPayload> { None };
        assert_eq!(decode_raw(&decoder, vec![0; 8], 2, 1), Ok(None));
    }
}
