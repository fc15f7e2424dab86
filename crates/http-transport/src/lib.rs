//! reqwest-backed [`Transport`] implementation.
//!
//! Connection pooling, TLS and timeouts all live down here; the engine
//! only ever sees the [`Transport`] trait.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use courier_core_types::error::transport;
use courier_core_types::{CourierError, HeaderMap, Method};
use courier_engine::{Transport, TransportRequest, TransportResponse};

/// Knobs for the underlying HTTP client.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            user_agent: None,
        }
    }
}

/// [`Transport`] over a pooled [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, CourierError> {
        Self::with_config(TransportConfig::default())
    }

    pub fn with_config(config: TransportConfig) -> Result<Self, CourierError> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout);
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent);
        }
        let client = builder
            .build()
            .map_err(|err| transport::failure(transport::REQUEST, &err.to_string()))?;
        Ok(Self { client })
    }

    /// Wraps an already-configured [`reqwest::Client`].
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn perform(&self, request: TransportRequest) -> Result<TransportResponse, CourierError> {
        let mut builder = self
            .client
            .request(convert_method(request.method), request.url.to_string());
        for (key, value) in request.headers.iter() {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = convert_headers(response.headers());
        let body = response.bytes().await.map_err(map_error)?.to_vec();
        debug!(status, bytes = body.len(), "exchange complete");

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}

fn convert_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn convert_headers(headers: &reqwest::header::HeaderMap) -> HeaderMap {
    headers
        .iter()
        .filter_map(|(key, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (key.as_str().to_owned(), value.to_owned()))
        })
        .collect()
}

fn map_error(err: reqwest::Error) -> CourierError {
    let code = if err.is_timeout() {
        transport::TIMED_OUT
    } else if err.is_connect() {
        transport::CONNECT
    } else {
        transport::REQUEST
    };
    transport::failure(code, &err.to_string())
}
