//! The client: configuration, dispatch and delivery.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use courier_core_types::error::courier;
use courier_core_types::Envelope;
use courier_interceptor::{
    run_response_chain, MultipartEncodingInterceptor, ParsingInterceptor, RequestInterceptor,
    ResponseInterceptor, ValidationInterceptor,
};
use courier_request::{NetworkInterface, RequestDescriptor};
use request_gate::{Gate, GateRunner, SharedRequest, Waiter};

use crate::task::NetworkTask;
use crate::transport::{NoopTransport, Transport};

struct ClientInner {
    transport: Arc<dyn Transport>,
    gates: Vec<Arc<GateRunner>>,
    /// Built-in multipart encoder first, then caller configuration.
    request_interceptors: Arc<Vec<Arc<dyn RequestInterceptor>>>,
    /// Caller configuration first, then built-in validation and parsing.
    response_interceptors: Arc<Vec<Arc<dyn ResponseInterceptor>>>,
}

/// The entry point to the networking stack: keeps the gates and
/// interceptors, and services requests through its transport.
///
/// Cheap to clone; clones share the same configuration. Configuration is
/// fixed at build time: there is no way to mutate the chains while
/// requests are flowing. Dispatch must happen inside a Tokio runtime; the
/// pipeline and gate satisfaction run as spawned tasks.
#[derive(Clone)]
pub struct Courier {
    inner: Arc<ClientInner>,
}

impl Courier {
    pub fn builder() -> CourierBuilder {
        CourierBuilder::default()
    }

    /// A client over `transport` with no gates and no user interceptors.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::builder().transport(transport).build()
    }

    /// Dispatches the descriptor through the pipeline and resolves with the
    /// final envelope. Check [`Envelope::is_success`]: an error on the
    /// envelope is authoritative even when data is also present.
    pub async fn dispatch(&self, request: RequestDescriptor) -> Envelope {
        match self.submit(request).await {
            Ok(envelope) => envelope,
            Err(_) => Envelope::failure(courier::dispatch_interrupted()),
        }
    }

    /// Dispatches the descriptor and splits delivery into success/failure
    /// callbacks. Exactly one of them fires, spawned onto the descriptor's
    /// delivery handle when one is set.
    pub fn dispatch_with(
        &self,
        request: RequestDescriptor,
        on_success: impl FnOnce(Envelope) + Send + 'static,
        on_failure: impl FnOnce(Envelope) + Send + 'static,
    ) {
        let deliver_on = request.deliver_on.clone();
        let receiver = self.submit(request);
        let deliver = async move {
            let envelope = match receiver.await {
                Ok(envelope) => envelope,
                Err(_) => Envelope::failure(courier::dispatch_interrupted()),
            };
            if envelope.is_success() {
                on_success(envelope);
            } else {
                on_failure(envelope);
            }
        };
        match deliver_on {
            Some(handle) => {
                handle.spawn(deliver);
            }
            None => {
                tokio::spawn(deliver);
            }
        }
    }

    /// Registers the task's preconditions, hands the descriptor to every
    /// applicable gate, and spawns the pipeline.
    fn submit(&self, request: RequestDescriptor) -> oneshot::Receiver<Envelope> {
        let gated = request.gated;
        let shared: SharedRequest = Arc::new(Mutex::new(request));

        // The "accepted" slot is not a gate: it primes the counted wait
        // before gates may already have resolved synchronously.
        let (accepted, accepted_release) = oneshot::channel();
        let mut preconditions = vec![accepted_release];

        if gated {
            for runner in &self.inner.gates {
                let (permit, released) = oneshot::channel();
                preconditions.push(released);
                runner.evaluate(Waiter {
                    request: Arc::clone(&shared),
                    permit,
                });
            }
        }

        let task = NetworkTask {
            request: shared,
            preconditions,
            interceptors: Arc::clone(&self.inner.request_interceptors),
            transport: Arc::clone(&self.inner.transport),
        };
        let response_interceptors = Arc::clone(&self.inner.response_interceptors);

        let (completion, receiver) = oneshot::channel();
        tokio::spawn(async move {
            let envelope = task.run().await;
            let envelope = run_response_chain(&response_interceptors, envelope);
            let _ = completion.send(envelope);
        });

        let _ = accepted.send(());
        receiver
    }
}

#[async_trait]
impl NetworkInterface for Courier {
    async fn load(&self, request: RequestDescriptor) -> Envelope {
        self.dispatch(request).await
    }
}

/// Configuration-time surface: transport, gates and interceptors are
/// injected here and frozen by [`CourierBuilder::build`].
#[derive(Default)]
pub struct CourierBuilder {
    transport: Option<Arc<dyn Transport>>,
    gates: Vec<Arc<dyn Gate>>,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl CourierBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Adds a gate. Gates hold back requests that opted in via the
    /// builder's `gated(true)` until every gate releases them.
    pub fn gate(mut self, gate: Arc<dyn Gate>) -> Self {
        self.gates.push(gate);
        self
    }

    /// Adds a request interceptor; user interceptors run in registration
    /// order after the built-in multipart encoder.
    pub fn request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    /// Adds a response interceptor; user interceptors run in registration
    /// order before the built-in validation and parsing steps.
    pub fn response_interceptor(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    pub fn build(self) -> Courier {
        let transport = self.transport.unwrap_or_else(|| {
            debug!("no transport configured, falling back to the noop transport");
            Arc::new(NoopTransport)
        });

        let mut request_interceptors: Vec<Arc<dyn RequestInterceptor>> =
            vec![Arc::new(MultipartEncodingInterceptor)];
        request_interceptors.extend(self.request_interceptors);

        let mut response_interceptors = self.response_interceptors;
        response_interceptors.push(Arc::new(ValidationInterceptor::default()));
        response_interceptors.push(Arc::new(ParsingInterceptor));

        Courier {
            inner: Arc::new(ClientInner {
                transport,
                gates: self.gates.into_iter().map(GateRunner::new).collect(),
                request_interceptors: Arc::new(request_interceptors),
                response_interceptors: Arc::new(response_interceptors),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core_types::error::service;
    use courier_core_types::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::transport::{TransportRequest, TransportResponse};
    use courier_core_types::CourierError;

    struct CountingTransport {
        calls: AtomicUsize,
    }

    impl CountingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn perform(
            &self,
            _request: TransportRequest,
        ) -> Result<TransportResponse, CourierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TransportResponse {
                status: 200,
                headers: Default::default(),
                body: b"pong".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn creation_errors_never_reach_the_transport() {
        let transport = CountingTransport::new();
        let client = Courier::new(transport.clone());

        let envelope = client
            .dispatch(RequestDescriptor::new("not a url", Method::Get))
            .await;

        let error = envelope.error.unwrap();
        assert_eq!(error.code, service::INVALID_URL);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn mocked_requests_never_reach_the_transport() {
        let transport = CountingTransport::new();
        let client = Courier::new(transport.clone());

        let mut request = RequestDescriptor::new("https://example.com/mocked", Method::Get);
        request.mocked = Some(b"{\"mock\":true}".to_vec());

        let envelope = client.dispatch(request).await;
        assert!(envelope.is_success());
        assert!(envelope.metadata.is_none());
        assert_eq!(envelope.data.as_deref(), Some(b"{\"mock\":true}".as_slice()));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plain_requests_round_trip_through_the_transport() {
        let transport = CountingTransport::new();
        let client = Courier::new(transport.clone());

        let envelope = client
            .dispatch(RequestDescriptor::new("https://example.com/ping", Method::Get))
            .await;

        assert!(envelope.is_success());
        assert_eq!(envelope.status(), Some(200));
        assert_eq!(envelope.data.as_deref(), Some(b"pong".as_slice()));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn callback_delivery_fires_exactly_once() {
        let transport = CountingTransport::new();
        let client = Courier::new(transport);

        let (tx, rx) = tokio::sync::oneshot::channel();
        client.dispatch_with(
            RequestDescriptor::new("https://example.com/ping", Method::Get),
            move |envelope| {
                let _ = tx.send(envelope.status());
            },
            |_| panic!("success expected"),
        );

        assert_eq!(rx.await.unwrap(), Some(200));
    }
}
