use std::fmt;

use serde::{Deserialize, Serialize};

/// Text pulled out of a QR code. Opaque to the scanner; it is only trimmed,
/// compared for debounce and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecodedPayload(String);

impl DecodedPayload {
    /// Returns `None` for payloads that are empty after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for DecodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::DecodedPayload;

    #[test]
    fn blank_payloads_are_rejected() {
        assert!(DecodedPayload::new("").is_none());
        assert!(DecodedPayload::new("  \n\t").is_none());
    }

    #[test]
    fn payload_is_trimmed() {
        let payload = DecodedPayload::new("  https://example.test/truss/12/ \n").unwrap();
        assert_eq!(payload.as_str(), "https://example.test/truss/12/");
    }
}
