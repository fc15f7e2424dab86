//! Interceptor chains: ordered, composable transformation of a request
//! descriptor before dispatch and of a response envelope after dispatch.
//!
//! Chain application is a left fold in registration order. The engine
//! prepends the multipart encoder to the request side and appends
//! validation and parsing to the response side; everything in between is
//! caller configuration.

pub mod multipart;
pub mod parsing;
pub mod validation;

pub use multipart::MultipartEncodingInterceptor;
pub use parsing::ParsingInterceptor;
pub use validation::ValidationInterceptor;

use std::sync::Arc;

use courier_core_types::Envelope;
use courier_request::RequestDescriptor;

/// A pure transformation step applied to a descriptor before dispatch.
///
/// Must not block for long; long-running work belongs in a gate.
pub trait RequestInterceptor: Send + Sync {
    fn intercept(&self, request: RequestDescriptor) -> RequestDescriptor;
}

/// A pure transformation step applied to an envelope after dispatch.
///
/// May mutate fields freely, including the force-succeed/force-fail escape
/// hatches on [`Envelope`].
pub trait ResponseInterceptor: Send + Sync {
    fn intercept(&self, envelope: Envelope) -> Envelope;
}

/// Folds `request` through every interceptor in order; step *i*'s output
/// feeds step *i + 1*'s input.
pub fn run_request_chain(
    interceptors: &[Arc<dyn RequestInterceptor>],
    request: RequestDescriptor,
) -> RequestDescriptor {
    interceptors
        .iter()
        .fold(request, |request, interceptor| interceptor.intercept(request))
}

/// Folds `envelope` through every interceptor in order.
pub fn run_response_chain(
    interceptors: &[Arc<dyn ResponseInterceptor>],
    envelope: Envelope,
) -> Envelope {
    interceptors
        .iter()
        .fold(envelope, |envelope, interceptor| interceptor.intercept(envelope))
}
