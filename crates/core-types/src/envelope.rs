//! The response envelope: a request's result in progress.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::CourierError;
use crate::HeaderMap;

/// Status line and headers of a completed HTTP exchange.
///
/// Absent from envelopes produced by pre-flight failures and mocks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseMetadata {
    pub status: u16,
    pub headers: HeaderMap,
}

impl ResponseMetadata {
    pub fn new(status: u16, headers: HeaderMap) -> Self {
        Self { status, headers }
    }
}

/// Deserializes the raw body of an [`Envelope`] into its structured result.
///
/// Parsers run as the last response interceptor. A returned error fails the
/// envelope and reaches the caller's failure path.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, envelope: &mut Envelope) -> Result<(), CourierError>;
}

/// Holds the raw result of one dispatched request while it flows through
/// the response-interceptor chain.
///
/// `error == None` after all interceptors run means success, even when no
/// parsed result exists (empty 204/205 bodies). Interceptors may rewrite
/// any field through [`Envelope::succeed`] and [`Envelope::fail`].
#[derive(Clone, Default)]
pub struct Envelope {
    pub metadata: Option<ResponseMetadata>,
    pub data: Option<Vec<u8>>,
    pub error: Option<CourierError>,
    pub result: Option<Value>,
    pub parser: Option<Arc<dyn ResponseParser>>,
}

impl Envelope {
    /// Envelope for a completed HTTP exchange.
    pub fn success(
        metadata: ResponseMetadata,
        data: Option<Vec<u8>>,
        parser: Option<Arc<dyn ResponseParser>>,
    ) -> Self {
        Self {
            metadata: Some(metadata),
            data,
            parser,
            ..Self::default()
        }
    }

    /// Envelope built purely from a mocked payload; carries no metadata.
    pub fn mocked(data: Vec<u8>, parser: Option<Arc<dyn ResponseParser>>) -> Self {
        Self {
            data: Some(data),
            parser,
            ..Self::default()
        }
    }

    /// Terminal failure envelope.
    pub fn failure(error: CourierError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Forcefully succeeds the envelope with the given metadata and data,
    /// clearing any error. An escape hatch for response interceptors.
    pub fn succeed(&mut self, metadata: Option<ResponseMetadata>, data: Option<Vec<u8>>) {
        self.metadata = metadata;
        self.data = data;
        self.error = None;
    }

    /// Forcefully fails the envelope. An escape hatch for response
    /// interceptors.
    pub fn fail(&mut self, error: CourierError) {
        self.error = Some(error);
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn status(&self) -> Option<u16> {
        self.metadata.as_ref().map(|metadata| metadata.status)
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("metadata", &self.metadata)
            .field("data_len", &self.data.as_ref().map(Vec::len))
            .field("error", &self.error)
            .field("result", &self.result)
            .field("has_parser", &self.parser.is_some())
            .finish()
    }
}
