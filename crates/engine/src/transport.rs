//! The transport seam: one capability, issue a request and hear back.

use async_trait::async_trait;

use courier_core_types::{CourierError, HeaderMap, Method};
use url::Url;

/// A single HTTP exchange, ready for the wire.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// What came back from the wire.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Performs byte-level I/O for the engine.
///
/// Everything below the exchange (pooling, TLS, timeouts, HTTP versions)
/// belongs to the implementation, not to the engine.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, CourierError>;
}

/// Transport that completes every exchange with an empty 200. Handy as a
/// stand-in while wiring tests or demos.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn perform(&self, _request: TransportRequest) -> Result<TransportResponse, CourierError> {
        Ok(TransportResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: Vec::new(),
        })
    }
}
