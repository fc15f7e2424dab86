//! JSON response parsing.

use crate::envelope::{Envelope, ResponseParser};
use crate::error::{courier, CourierError};

/// Deserializes the envelope body as JSON into the envelope result.
///
/// On an already-failed envelope the body is still soft-parsed into the
/// result slot when possible, so server error payloads stay inspectable
/// without disturbing the original error.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonParser;

impl ResponseParser for JsonParser {
    fn parse(&self, envelope: &mut Envelope) -> Result<(), CourierError> {
        if let Some(existing) = envelope.error.clone() {
            if let Some(data) = &envelope.data {
                if !data.is_empty() {
                    if let Ok(value) = serde_json::from_slice(data) {
                        envelope.result = Some(value);
                    }
                }
            }
            return Err(existing);
        }

        match &envelope.data {
            Some(data) if !data.is_empty() => match serde_json::from_slice(data) {
                Ok(value) => {
                    envelope.result = Some(value);
                    Ok(())
                }
                Err(err) => Err(courier::json_parsing_failure(&err.to_string())),
            },
            _ => Err(courier::response_validation("empty data received")),
        }
    }
}
