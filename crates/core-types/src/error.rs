//! The structured error triple carried across the pipeline.
//!
//! Errors are never thrown across the gate/interceptor boundary; they ride
//! as data on descriptors (pre-flight) and envelopes (post-flight). The
//! `domain`/`code`/`description` triple is the wire contract between the
//! core and any UI or telemetry layer sitting on top.

use thiserror::Error;

/// A terminal, displayable error with a stable domain and numeric code.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{domain} ({code}): {description}")]
pub struct CourierError {
    /// Stable domain string, one of the `*_DOMAIN` constants below.
    pub domain: String,
    /// Numeric code; validation failures carry the HTTP status here.
    pub code: i64,
    /// Human-readable description.
    pub description: String,
}

impl CourierError {
    pub fn new(domain: impl Into<String>, code: i64, description: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            description: description.into(),
        }
    }
}

/// Errors raised while a request descriptor is being built.
pub mod service {
    use super::CourierError;

    pub const DOMAIN: &str = "ServiceErrorDomain";

    pub const EMPTY_BASE_URL: i64 = 1;
    pub const INVALID_BASE_URL: i64 = 2;
    pub const INVALID_URL: i64 = 3;
    pub const FIELDS_ENCODING_FAILURE: i64 = 4;
    pub const INVALID_QUERY_WITH_URL: i64 = 5;
    pub const JSON_ENCODING_FAILURE: i64 = 6;
    pub const MULTIPART_ENCODING_FAILURE: i64 = 7;

    pub fn empty_base_url() -> CourierError {
        CourierError::new(DOMAIN, EMPTY_BASE_URL, "The resource has an empty base URL")
    }

    pub fn invalid_base_url(url: &str) -> CourierError {
        CourierError::new(
            DOMAIN,
            INVALID_BASE_URL,
            format!("Invalid base URL: {url} | Make sure you specify a scheme (http/https) and a valid path"),
        )
    }

    pub fn invalid_url(url: &str) -> CourierError {
        CourierError::new(DOMAIN, INVALID_URL, format!("Invalid URL: {url}"))
    }

    pub fn invalid_query_with_url(url: &str) -> CourierError {
        CourierError::new(
            DOMAIN,
            INVALID_QUERY_WITH_URL,
            format!("Invalid URL after adding query string: {url}"),
        )
    }

    pub fn fields_encoding_failure(detail: &str) -> CourierError {
        CourierError::new(
            DOMAIN,
            FIELDS_ENCODING_FAILURE,
            format!("Unable to encode form fields: {detail}"),
        )
    }

    pub fn json_encoding_failure(detail: &str) -> CourierError {
        CourierError::new(
            DOMAIN,
            JSON_ENCODING_FAILURE,
            format!("Unable to serialize the request body as JSON: {detail}"),
        )
    }

    pub fn multipart_encoding_failure(detail: &str) -> CourierError {
        CourierError::new(
            DOMAIN,
            MULTIPART_ENCODING_FAILURE,
            format!("Unable to encode multipart body: {detail}"),
        )
    }
}

/// Errors raised by the execution pipeline itself.
pub mod courier {
    use super::CourierError;

    pub const DOMAIN: &str = "CourierErrorDomain";

    pub const JSON_PARSING_FAILURE: i64 = 10;
    pub const RESPONSE_VALIDATION: i64 = 11;
    pub const DISPATCH_INTERRUPTED: i64 = 12;

    pub fn json_parsing_failure(detail: &str) -> CourierError {
        CourierError::new(
            DOMAIN,
            JSON_PARSING_FAILURE,
            format!("Unable to deserialize JSON: {detail}"),
        )
    }

    /// Validation failure without an HTTP status of its own.
    pub fn response_validation(reason: &str) -> CourierError {
        CourierError::new(
            DOMAIN,
            RESPONSE_VALIDATION,
            format!("Response validation failed: {reason}"),
        )
    }

    /// Validation failure for a status outside the accepted range; the
    /// status doubles as the error code.
    pub fn status_validation(status: u16) -> CourierError {
        CourierError::new(
            DOMAIN,
            i64::from(status),
            format!("Response validation failed: HTTP status code {status}"),
        )
    }

    pub fn dispatch_interrupted() -> CourierError {
        CourierError::new(
            DOMAIN,
            DISPATCH_INTERRUPTED,
            "Dispatch was interrupted before a result was delivered",
        )
    }
}

/// Errors reported by the transport while performing the exchange.
pub mod transport {
    use super::CourierError;

    pub const DOMAIN: &str = "TransportErrorDomain";

    pub const TIMED_OUT: i64 = 1;
    pub const CONNECT: i64 = 2;
    pub const REQUEST: i64 = 3;

    pub fn failure(code: i64, detail: &str) -> CourierError {
        CourierError::new(DOMAIN, code, format!("Transport failure: {detail}"))
    }
}
