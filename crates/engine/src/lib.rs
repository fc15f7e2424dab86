//! The Courier execution engine.
//!
//! Owns the configured gates and interceptor chains, coordinates gating
//! through counted preconditions, dispatches over the transport, and
//! threads every result back through the response chain to the caller.

pub mod client;
pub mod task;
pub mod transport;

pub use client::{Courier, CourierBuilder};
pub use transport::{NoopTransport, Transport, TransportRequest, TransportResponse};
