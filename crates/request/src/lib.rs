//! Web-service definitions and the fluent request builder.
//!
//! A [`Service`] names a server by base URL and yields [`Resource`] /
//! [`ResourceWithBody`] values through its HTTP-method selectors. Resources
//! are mutated fluently and consumed exactly once by the execution engine,
//! which reaches them through the [`NetworkInterface`] bridge.

pub mod descriptor;
pub mod multipart;
pub mod query;
pub mod resource;
pub mod service;

pub use descriptor::RequestDescriptor;
pub use multipart::{BodyPart, PartSource};
pub use resource::{RequestModifiers, Resource, ResourceWithBody};
pub use service::{BaseResource, NetworkInterface, Service};
