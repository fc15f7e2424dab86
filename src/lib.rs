//! Courier: declarative HTTP clients.
//!
//! Describe your backends as [`Service`] values, build requests with the
//! fluent resource API, and hang cross-cutting behavior (gates,
//! interceptors, mocking, parsing) off a [`Courier`] client instead of
//! touching the transport directly.
//!
//! ```no_run
//! use std::sync::Arc;
//! use courier::prelude::*;
//!
//! # async fn demo() -> Result<(), courier::CourierError> {
//! let client = courier::default_client()?;
//! let api = Service::new("https://api.example.com", Arc::new(client));
//!
//! let profile: Option<serde_json::Value> = api
//!     .get("users/42")
//!     .header("Accept", "application/json")
//!     .load_json()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use courier_core_types::{
    error, CourierError, Envelope, HeaderMap, JsonParser, Method, ResponseMetadata, ResponseParser,
};
pub use courier_engine::{
    Courier, CourierBuilder, NoopTransport, Transport, TransportRequest, TransportResponse,
};
pub use courier_interceptor::{
    MultipartEncodingInterceptor, ParsingInterceptor, RequestInterceptor, ResponseInterceptor,
    ValidationInterceptor,
};
pub use courier_request::{
    BaseResource, BodyPart, NetworkInterface, PartSource, RequestDescriptor, RequestModifiers,
    Resource, ResourceWithBody, Service,
};
pub use http_transport::{ReqwestTransport, TransportConfig};
pub use request_gate::Gate;

use std::sync::Arc;

/// Commonly used items, importable in one line.
pub mod prelude {
    pub use crate::{
        Courier, CourierError, Envelope, Gate, Method, NetworkInterface, RequestDescriptor,
        RequestInterceptor, RequestModifiers, ResponseInterceptor, ResponseParser, Service,
        Transport,
    };
}

/// A client wired to the default reqwest transport, with no gates and no
/// user interceptors.
///
/// This is a thin factory: every call builds a fresh, independent client.
/// Prefer [`Courier::builder`] for anything beyond the defaults.
pub fn default_client() -> Result<Courier, CourierError> {
    Ok(Courier::new(Arc::new(ReqwestTransport::new()?)))
}

/// Like [`default_client`], with transport knobs.
pub fn client_with_config(config: TransportConfig) -> Result<Courier, CourierError> {
    Ok(Courier::new(Arc::new(ReqwestTransport::with_config(
        config,
    )?)))
}
