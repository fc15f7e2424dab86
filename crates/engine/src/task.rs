//! One unit of work bound to a single request descriptor.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::debug;

use courier_core_types::error::service;
use courier_core_types::{Envelope, ResponseMetadata};
use courier_interceptor::{run_request_chain, RequestInterceptor};
use request_gate::SharedRequest;

use crate::transport::{Transport, TransportRequest};

/// Created per dispatch; becomes runnable only once every precondition
/// releases, runs once, reports one envelope. Not reusable.
pub(crate) struct NetworkTask {
    pub(crate) request: SharedRequest,
    /// One receiver per applicable gate, plus one for "accepted".
    pub(crate) preconditions: Vec<oneshot::Receiver<()>>,
    pub(crate) interceptors: Arc<Vec<Arc<dyn RequestInterceptor>>>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl NetworkTask {
    pub(crate) async fn run(self) -> Envelope {
        // Every precondition must release before the task may run. A closed
        // channel counts as released: the gate already recorded its failure
        // on the descriptor.
        for precondition in self.preconditions {
            let _ = precondition.await;
        }

        let request = self.request.lock().clone();

        if let Some(error) = request.creation_error.clone() {
            debug!(%error, "request failed before dispatch");
            return Envelope::failure(error);
        }

        if let Some(mock) = request.mocked.clone() {
            #[cfg(not(debug_assertions))]
            tracing::warn!("serving a mocked response in a release build; is this intentional?");
            debug!(bytes = mock.len(), "serving mocked response, transport untouched");
            return Envelope::mocked(mock, request.parser.clone());
        }

        let request = run_request_chain(&self.interceptors, request);

        // A request interceptor (multipart encoding, typically) may have
        // failed the descriptor while transforming it.
        if let Some(error) = request.creation_error.clone() {
            debug!(%error, "request failed during interception");
            return Envelope::failure(error);
        }

        let Some(url) = request.url.clone() else {
            return Envelope::failure(service::invalid_url("<missing>"));
        };

        let exchange = TransportRequest {
            url,
            method: request.method,
            headers: request.headers.clone(),
            body: request.body.clone(),
        };

        match self.transport.perform(exchange).await {
            Ok(response) => Envelope::success(
                ResponseMetadata::new(response.status, response.headers),
                Some(response.body),
                request.parser.clone(),
            ),
            Err(error) => Envelope::failure(error),
        }
    }
}
