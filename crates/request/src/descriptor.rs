//! The request descriptor: one pending HTTP call.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use courier_core_types::error::service;
use courier_core_types::{CourierError, HeaderMap, Method, ResponseParser};
use tokio::runtime::Handle;
use tracing::warn;
use url::Url;

use crate::multipart::BodyPart;

/// Everything the execution engine needs to run one request.
///
/// Built by a [`crate::Resource`] / [`crate::ResourceWithBody`], consumed
/// exactly once by the engine, never reused across dispatches. When
/// `creation_error` is set the descriptor fails fast at dispatch time
/// without ever reaching the transport.
#[derive(Clone)]
pub struct RequestDescriptor {
    /// Target URL; `None` only when `creation_error` explains why.
    pub url: Option<Url>,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Tags categorize requests so gates and interceptors can act selectively.
    pub tags: HashSet<String>,
    /// Whether the request waits for the client's gates. Off by default.
    pub gated: bool,
    /// Mocked response payload; set means the transport is never touched.
    pub mocked: Option<Vec<u8>>,
    /// Multipart parts awaiting encoding at dispatch time.
    pub multipart: Vec<BodyPart>,
    pub parser: Option<Arc<dyn ResponseParser>>,
    /// Runtime handle callback delivery is spawned onto, when set.
    pub deliver_on: Option<Handle>,
    /// Error encountered while the descriptor was being built.
    pub creation_error: Option<CourierError>,
}

impl RequestDescriptor {
    /// Parses `url` and binds it with the given method. An unparsable URL
    /// yields a descriptor pre-loaded with a creation error.
    pub fn new(url: &str, method: Method) -> Self {
        match Url::parse(url) {
            Ok(url) => Self::from_url(url, method),
            Err(_) => Self::failed(method, service::invalid_url(url)),
        }
    }

    pub fn from_url(url: Url, method: Method) -> Self {
        Self {
            url: Some(url),
            method,
            headers: HeaderMap::new(),
            body: None,
            tags: HashSet::new(),
            gated: false,
            mocked: None,
            multipart: Vec::new(),
            parser: None,
            deliver_on: None,
            creation_error: None,
        }
    }

    /// Descriptor that can only fail fast with `error`.
    pub fn failed(method: Method, error: CourierError) -> Self {
        Self {
            url: None,
            method,
            headers: HeaderMap::new(),
            body: None,
            tags: HashSet::new(),
            gated: false,
            mocked: None,
            multipart: Vec::new(),
            parser: None,
            deliver_on: None,
            creation_error: Some(error),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Sets a header, skipping empty values with a warning.
    pub fn set_header(&mut self, key: &str, value: &str) {
        if value.is_empty() {
            warn!(key, "skipping header with empty value");
            return;
        }
        self.headers.set(key, value);
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.headers.set("Content-Type", content_type);
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let url = self
            .url
            .as_ref()
            .map(Url::as_str)
            .unwrap_or("<no url>");
        writeln!(f, "URL: {url}")?;
        writeln!(f, "Method: {}", self.method)?;
        for (key, value) in self.headers.iter() {
            writeln!(f, "Header: {key}: {value}")?;
        }
        match &self.body {
            Some(body) => writeln!(f, "Body: {} bytes", body.len()),
            None => writeln!(f, "Body: empty"),
        }
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("body_len", &self.body.as_ref().map(Vec::len))
            .field("tags", &self.tags)
            .field("gated", &self.gated)
            .field("mocked", &self.mocked.is_some())
            .field("multipart_parts", &self.multipart.len())
            .field("creation_error", &self.creation_error)
            .finish()
    }
}
