//! Shared test doubles for the pipeline tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use courier::{CourierError, HeaderMap, Transport, TransportRequest, TransportResponse};

/// Transport that answers every exchange with a fixed status and body,
/// counting and recording what it was asked to perform.
pub struct ScriptedTransport {
    status: u16,
    body: Vec<u8>,
    calls: AtomicUsize,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new(status: u16, body: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.to_vec(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TransportRequest> {
        self.seen.lock().last().cloned()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, CourierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(request);
        Ok(TransportResponse {
            status: self.status,
            headers: HeaderMap::new(),
            body: self.body.clone(),
        })
    }
}

/// Transport that fails every exchange with the given error.
pub struct FailingTransport {
    error: CourierError,
}

impl FailingTransport {
    pub fn new(error: CourierError) -> Arc<Self> {
        Arc::new(Self { error })
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn perform(&self, _request: TransportRequest) -> Result<TransportResponse, CourierError> {
        Err(self.error.clone())
    }
}
