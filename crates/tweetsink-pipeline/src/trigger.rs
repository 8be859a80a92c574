use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use crate::error::TriggerError;

/// The optional JSON payload an invocation was triggered with.
///
/// Only logged for now; nothing in a run depends on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriggerPayload(Option<Value>);

impl TriggerPayload {
    /// Decodes standard base64 wrapping UTF-8 JSON. Blank input means no payload.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError`] naming the layer that failed to decode.
    pub fn decode(encoded: &str) -> Result<Self, TriggerError> {
        let encoded = encoded.trim();
        if encoded.is_empty() {
            return Ok(Self(None));
        }
        let text = String::from_utf8(STANDARD.decode(encoded)?)?;
        Ok(Self(Some(serde_json::from_str(&text)?)))
    }

    /// Like [`Self::decode`], but a payload that fails to decode is logged
    /// and treated as absent so the run still proceeds.
    #[must_use]
    pub fn decode_or_default(encoded: &str) -> Self {
        match Self::decode(encoded) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring undecodable trigger payload");
                Self::default()
            }
        }
    }

    #[must_use]
    pub fn value(&self) -> Option<&Value> {
        self.0.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_base64_json() {
        let encoded = STANDARD.encode(r#"{"source":"scheduler","attempt":1}"#);
        let payload = TriggerPayload::decode(&encoded).unwrap();
        assert_eq!(
            payload.value(),
            Some(&json!({"source": "scheduler", "attempt": 1}))
        );
    }

    #[test]
    fn blank_input_is_no_payload() {
        assert_eq!(TriggerPayload::decode("").unwrap().value(), None);
        assert_eq!(TriggerPayload::decode("  \n").unwrap().value(), None);
    }

    #[test]
    fn invalid_base64_is_rejected() {
        assert!(matches!(
            TriggerPayload::decode("not base64!"),
            Err(TriggerError::Base64(_))
        ));
    }

    #[test]
    fn non_json_content_is_rejected() {
        let encoded = STANDARD.encode("hello");
        assert!(matches!(
            TriggerPayload::decode(&encoded),
            Err(TriggerError::Json(_))
        ));
    }

    #[test]
    fn undecodable_payload_falls_back_to_none() {
        let encoded = STANDARD.encode("hello");
        assert_eq!(TriggerPayload::decode_or_default(&encoded), TriggerPayload::default());
        assert_eq!(TriggerPayload::decode_or_default("not base64!").value(), None);
    }

    #[test]
    fn valid_payload_survives_lenient_decode() {
        let encoded = STANDARD.encode(r#"{"source":"cron"}"#);
        assert_eq!(
            TriggerPayload::decode_or_default(&encoded).value(),
            Some(&json!({"source": "cron"}))
        );
    }

    #[test]
    fn non_utf8_content_is_rejected() {
        let encoded = STANDARD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(
            TriggerPayload::decode(&encoded),
            Err(TriggerError::Utf8(_))
        ));
    }
}
