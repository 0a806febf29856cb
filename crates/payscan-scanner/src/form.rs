//! # Host Form Boundary
//!
//! Where a successful scan writes its result: the reference text field and
//! the amount field of the host page.

use std::sync::{Arc, Mutex};

use payscan_core::{DecodedPayload, PaymentFields};

/// The host's payment form.
pub trait HostForm: Send + Sync {
    /// Writes `payload` into the form.
    ///
    /// The reference field always receives the full text. The amount field
    /// receives segment 3 only when present and the field is empty.
    fn apply_payload(&self, payload: &DecodedPayload);
}

/// Form state kept in memory, shareable with the host.
#[derive(Debug, Clone, Default)]
pub struct SharedForm {
    fields: Arc<Mutex<PaymentFields>>,
}

impl SharedForm {
    pub fn new(fields: PaymentFields) -> Self {
        SharedForm {
            fields: Arc::new(Mutex::new(fields)),
        }
    }

    /// Copy of the current field values.
    pub fn snapshot(&self) -> PaymentFields {
        self.fields
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Sets the amount field, as the user typing would.
    pub fn set_amount(&self, amount: impl Into<String>) {
        self.fields
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .amount = amount.into();
    }
}

impl HostForm for SharedForm {
    fn apply_payload(&self, payload: &DecodedPayload) {
        let mut fields = self
            .fields
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        fields.apply(payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_form_applies_payload() {
        let form = SharedForm::default();
        form.apply_payload(&DecodedPayload::new("PAY|REF123|NOTE|450.00"));

        let fields = form.snapshot();
        assert_eq!(fields.reference, "PAY|REF123|NOTE|450.00");
        assert_eq!(fields.amount, "450.00");
    }

    #[test]
    fn test_clones_share_state() {
        let form = SharedForm::default();
        let host_view = form.clone();
        host_view.set_amount("12");

        form.apply_payload(&DecodedPayload::new("PAY|REF|NOTE|450.00"));
        assert_eq!(host_view.snapshot().amount, "12");
    }
}
