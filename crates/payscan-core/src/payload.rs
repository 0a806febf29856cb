//! # Payload Module
//!
//! What a decoded code means to the host form.
//!
//! ## Payload Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "PAY|REF123|NOTE|450.00"                                              │
//! │    │    │      │     │                                                  │
//! │    0    1      2     3 ◄── amount segment (only if > 3 segments)       │
//! │                                                                         │
//! │  Host form after a scan:                                               │
//! │    reference ◄── whole text, always overwritten                        │
//! │    amount    ◄── segment 3, only when the field is still empty         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A payload with fewer segments is still a valid scan; it just carries no
//! amount.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{AMOUNT_SEGMENT_INDEX, PAYLOAD_DELIMITER};

// =============================================================================
// Decoded Payload
// =============================================================================

/// Opaque text produced by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DecodedPayload {
    text: String,
}

impl DecodedPayload {
    pub fn new(text: impl Into<String>) -> Self {
        DecodedPayload { text: text.into() }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Iterates the `|`-delimited segments.
    pub fn segments(&self) -> std::str::Split<'_, char> {
        self.text.split(PAYLOAD_DELIMITER)
    }

    /// The amount segment, present only when the split yields more than
    /// three segments.
    pub fn amount(&self) -> Option<&str> {
        self.segments().nth(AMOUNT_SEGMENT_INDEX)
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl std::fmt::Display for DecodedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

// =============================================================================
// Payment Fields
// =============================================================================

/// The two host fields a scan writes into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentFields {
    /// Free-text reference field (receives the whole payload).
    pub reference: String,

    /// Numeric amount field.
    pub amount: String,
}

impl PaymentFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills the amount, as a user typing into the form would.
    pub fn with_amount(amount: impl Into<String>) -> Self {
        PaymentFields {
            reference: String::new(),
            amount: amount.into(),
        }
    }

    /// Writes a payload into the form.
    ///
    /// The reference is always replaced. The amount is written only when the
    /// payload carries one and the field is currently empty; user input is
    /// never overwritten.
    ///
    /// ## Returns
    /// `true` if the amount field was written.
    pub fn apply(&mut self, payload: &DecodedPayload) -> bool {
        self.reference = payload.text().to_string();

        match payload.amount() {
            Some(amount) if self.amount.is_empty() => {
                self.amount = amount.to_string();
                true
            }
            _ => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_amount_from_fourth_segment() {
        let payload = DecodedPayload::new("PAY|REF123|NOTE|450.00");
        assert_eq!(payload.amount(), Some("450.00"));
    }

    #[test]
    fn test_no_amount_with_three_segments() {
        assert_eq!(DecodedPayload::new("PAY|REF|NOTE").amount(), None);
        assert_eq!(DecodedPayload::new("SIMPLE").amount(), None);
    }

    #[test]
    fn test_extra_segments_still_use_index_three() {
        let payload = DecodedPayload::new("a|b|c|12.50|e|f");
        assert_eq!(payload.amount(), Some("12.50"));
    }

    #[test]
    fn test_apply_writes_reference_and_amount() {
        let mut form = PaymentFields::new();
        let written = form.apply(&DecodedPayload::new("PAY|REF123|NOTE|450.00"));
        assert!(written);
        assert_eq!(form.reference, "PAY|REF123|NOTE|450.00");
        assert_eq!(form.amount, "450.00");
    }

    #[test]
    fn test_apply_keeps_user_amount() {
        let mut form = PaymentFields::with_amount("99");
        let written = form.apply(&DecodedPayload::new("PAY|REF123|NOTE|450.00"));
        assert!(!written);
        assert_eq!(form.amount, "99");
        assert_eq!(form.reference, "PAY|REF123|NOTE|450.00");
    }

    #[test]
    fn test_apply_simple_payload_leaves_amount_untouched() {
        let mut form = PaymentFields::new();
        assert!(!form.apply(&DecodedPayload::new("SIMPLE")));
        assert_eq!(form.reference, "SIMPLE");
        assert!(form.amount.is_empty());
    }

    proptest! {
        #[test]
        fn prop_amount_written_iff_enough_segments_and_empty(
            segments in prop::collection::vec("[a-zA-Z0-9.]{0,8}", 1..8),
            prefilled in prop::option::of("[0-9]{1,4}"),
        ) {
            let text = segments.join("|");
            let payload = DecodedPayload::new(text.clone());
            let mut form = match &prefilled {
                Some(v) => PaymentFields::with_amount(v.clone()),
                None => PaymentFields::new(),
            };

            let written = form.apply(&payload);

            prop_assert_eq!(&form.reference, &text);
            if segments.len() > 3 && prefilled.is_none() {
                prop_assert!(written);
                prop_assert_eq!(&form.amount, &segments[3]);
            } else {
                prop_assert!(!written);
                prop_assert_eq!(form.amount, prefilled.unwrap_or_default());
            }
        }
    }
}
