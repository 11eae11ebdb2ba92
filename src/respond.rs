//! Canned reply selection.
//!
//! Three reply banks: high-confidence productive, standard productive, and
//! non-productive. The reply index is derived from a SHA-256 digest of the
//! submitted text, so the same email always receives the same reply.

use sha2::{Digest, Sha256};

use crate::classify::Label;

const PRODUCTIVE_HIGH: [&str; 3] = [
    "Thank you for contacting us. We have received your request and understand its importance. Our technical team will review your issue and provide a detailed response within 24 hours.",
    "We appreciate you reaching out regarding this matter. Your inquiry has been assigned high priority and forwarded to our specialized support team. You can expect a comprehensive response within one business day.",
    "Thank you for bringing this to our attention. We recognize the urgency of your request and have escalated it to our senior technical staff. A team member will contact you shortly with a resolution.",
];

const PRODUCTIVE_STANDARD: [&str; 3] = [
    "Thank you for your email. We have received your message and will review it accordingly. Our team will get back to you within 48 hours.",
    "We appreciate your inquiry. Your message has been logged in our system and will be addressed by our support team within 2 business days.",
    "Thank you for contacting us. We have recorded your request and will ensure it receives appropriate attention from our team.",
];

const NON_PRODUCTIVE: [&str; 3] = [
    "Thank you for your thoughtful message. We truly appreciate you taking the time to reach out and share your thoughts with us.",
    "We're grateful for your kind words and appreciate your continued engagement with our services. Thank you for being part of our community.",
    "Thank you for your email. It's always wonderful to hear from our valued clients, and we appreciate your ongoing relationship with us.",
];

/// Confidence above this picks the escalated productive bank.
const HIGH_CONFIDENCE: f32 = 0.8;

/// Select the canned reply for a classified email.
pub fn suggested_reply(label: Label, confidence: f32, original_text: &str) -> &'static str {
    let bank: &[&'static str; 3] = match (label, confidence > HIGH_CONFIDENCE) {
        (Label::Productive, true) => &PRODUCTIVE_HIGH,
        (Label::Productive, false) => &PRODUCTIVE_STANDARD,
        (Label::NonProductive, _) => &NON_PRODUCTIVE,
    };
    bank[stable_index(original_text, bank.len())]
}

/// Stable index into a bank of `len` replies, derived from the text digest.
fn stable_index(text: &str, len: usize) -> usize {
    let digest = Sha256::digest(text.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % len as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_reply() {
        let a = suggested_reply(Label::Productive, 0.9, "server down, please advise");
        let b = suggested_reply(Label::Productive, 0.9, "server down, please advise");
        assert_eq!(a, b);
    }

    #[test]
    fn high_confidence_uses_escalated_bank() {
        let reply = suggested_reply(Label::Productive, 0.95, "urgent login failure");
        assert!(PRODUCTIVE_HIGH.contains(&reply));
    }

    #[test]
    fn standard_confidence_uses_standard_bank() {
        let reply = suggested_reply(Label::Productive, 0.7, "question about invoices");
        assert!(PRODUCTIVE_STANDARD.contains(&reply));
    }

    #[test]
    fn non_productive_bank_regardless_of_confidence() {
        let reply = suggested_reply(Label::NonProductive, 0.95, "happy new year to the team");
        assert!(NON_PRODUCTIVE.contains(&reply));
    }
}
