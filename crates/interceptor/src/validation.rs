//! Built-in response validation.

use courier_core_types::error::courier;
use courier_core_types::Envelope;

use crate::ResponseInterceptor;

/// Validates the HTTP exchange before parsing runs.
///
/// Policy: statuses outside `[200, 300)` fail with the status as the error
/// code; empty bodies succeed (with `data = None` and parsing suppressed)
/// only on the recognized no-content statuses 204/205, and are a hard
/// validation failure on every other status. Envelopes without metadata
/// (pre-flight failures and mocks) pass through untouched.
#[derive(Clone, Debug)]
pub struct ValidationInterceptor {
    no_content_statuses: Vec<u16>,
}

impl Default for ValidationInterceptor {
    fn default() -> Self {
        Self {
            no_content_statuses: vec![204, 205],
        }
    }
}

impl ResponseInterceptor for ValidationInterceptor {
    fn intercept(&self, mut envelope: Envelope) -> Envelope {
        let Some(status) = envelope.status() else {
            return envelope;
        };

        if !(200..300).contains(&status) {
            envelope.fail(courier::status_validation(status));
            return envelope;
        }

        let empty = envelope.data.as_ref().map_or(true, |data| data.is_empty());
        if self.no_content_statuses.contains(&status) {
            // Normalize to a nil body and skip parsing entirely.
            let metadata = envelope.metadata.take();
            envelope.succeed(metadata, None);
            envelope.parser = None;
            return envelope;
        }

        if empty {
            envelope.fail(courier::response_validation("empty data received"));
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core_types::{HeaderMap, ResponseMetadata};

    fn http_envelope(status: u16, body: &[u8]) -> Envelope {
        Envelope::success(
            ResponseMetadata::new(status, HeaderMap::new()),
            Some(body.to_vec()),
            None,
        )
    }

    #[test]
    fn passes_ordinary_success_through() {
        let envelope = ValidationInterceptor::default().intercept(http_envelope(200, b"body"));
        assert!(envelope.is_success());
        assert_eq!(envelope.data.as_deref(), Some(b"body".as_slice()));
    }

    #[test]
    fn status_outside_range_fails_with_status_code() {
        let envelope = ValidationInterceptor::default().intercept(http_envelope(404, b"missing"));
        let error = envelope.error.unwrap();
        assert_eq!(error.code, 404);
    }

    #[test]
    fn no_content_status_succeeds_with_nil_data() {
        let mut input = http_envelope(204, b"");
        input.parser = Some(std::sync::Arc::new(courier_core_types::JsonParser));

        let envelope = ValidationInterceptor::default().intercept(input);
        assert!(envelope.is_success());
        assert!(envelope.data.is_none());
        assert!(envelope.parser.is_none());
        assert_eq!(envelope.status(), Some(204));
    }

    #[test]
    fn empty_body_on_other_statuses_is_a_hard_failure() {
        let envelope = ValidationInterceptor::default().intercept(http_envelope(200, b""));
        let error = envelope.error.unwrap();
        assert_eq!(error.code, courier::RESPONSE_VALIDATION);
    }

    #[test]
    fn envelopes_without_metadata_pass_untouched() {
        let envelope =
            ValidationInterceptor::default().intercept(Envelope::mocked(Vec::new(), None));
        assert!(envelope.is_success());
    }
}
