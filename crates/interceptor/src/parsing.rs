//! Built-in response parsing.

use courier_core_types::Envelope;

use crate::ResponseInterceptor;

/// Runs the envelope's configured parser, if any. Always the last response
/// interceptor, so parsers see the final validated envelope. A parser
/// error fails the envelope.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParsingInterceptor;

impl ResponseInterceptor for ParsingInterceptor {
    fn intercept(&self, mut envelope: Envelope) -> Envelope {
        let Some(parser) = envelope.parser.clone() else {
            return envelope;
        };
        if let Err(error) = parser.parse(&mut envelope) {
            envelope.error = Some(error);
        }
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core_types::error::courier;
    use courier_core_types::JsonParser;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn no_parser_means_no_result() {
        let envelope = ParsingInterceptor.intercept(Envelope::mocked(b"raw".to_vec(), None));
        assert!(envelope.is_success());
        assert!(envelope.result.is_none());
    }

    #[test]
    fn parser_success_sets_the_result() {
        let envelope = ParsingInterceptor.intercept(Envelope::mocked(
            br#"{"id": 7}"#.to_vec(),
            Some(Arc::new(JsonParser)),
        ));
        assert!(envelope.is_success());
        assert_eq!(envelope.result, Some(json!({"id": 7})));
    }

    #[test]
    fn parser_failure_fails_the_envelope() {
        let envelope = ParsingInterceptor.intercept(Envelope::mocked(
            b"definitely not json".to_vec(),
            Some(Arc::new(JsonParser)),
        ));
        let error = envelope.error.unwrap();
        assert_eq!(error.code, courier::JSON_PARSING_FAILURE);
    }
}
