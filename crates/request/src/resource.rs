//! Fluent resources: the chaining surface callers build requests with.
//!
//! Two distinct value types share the descriptor core: [`Resource`] for
//! body-less requests and [`ResourceWithBody`] for methods that may carry
//! one. Shared modifiers live on [`RequestModifiers`]; body encoding only
//! exists on [`ResourceWithBody`].

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use courier_core_types::error::{courier, service};
use courier_core_types::{CourierError, Envelope, JsonParser, ResponseParser};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::warn;
use url::Url;

use crate::descriptor::RequestDescriptor;
use crate::multipart::{BodyPart, PartSource};
use crate::query;
use crate::service::NetworkInterface;

/// Modifiers shared by both resource flavors.
///
/// Every modifier is a no-op once the descriptor carries a creation error,
/// so a chain stays safe to write without checking intermediate results.
pub trait RequestModifiers: Sized {
    fn descriptor_mut(&mut self) -> &mut RequestDescriptor;

    /// Runs `mutate` against the descriptor unless a creation error has
    /// already been recorded.
    fn apply(mut self, mutate: impl FnOnce(&mut RequestDescriptor)) -> Self {
        let descriptor = self.descriptor_mut();
        if descriptor.creation_error.is_none() {
            mutate(descriptor);
        }
        self
    }

    /// Sets a header, replacing any existing value for the key.
    fn header(self, key: &str, value: &str) -> Self {
        self.apply(|descriptor| descriptor.set_header(key, value))
    }

    /// Sets every header in `entries`, replacing values that already exist.
    fn headers<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.apply(|descriptor| {
            for (key, value) in entries {
                descriptor.set_header(key.as_ref(), value.as_ref());
            }
        })
    }

    /// Adds the credentials as a basic `Authorization` header; the pair is
    /// base64 encoded before being set.
    fn basic_auth(self, username: &str, password: &str) -> Self {
        let credential = STANDARD.encode(format!("{username}:{password}"));
        self.apply(|descriptor| {
            descriptor.set_header("Authorization", &format!("Basic {credential}"));
        })
    }

    /// Encodes `params` as query parameters appended to the resource URL.
    fn query<T: Serialize>(self, params: &T) -> Self {
        self.apply(|descriptor| {
            let Some(url) = descriptor.url.take() else {
                descriptor.creation_error = Some(service::empty_base_url());
                return;
            };
            let encoded = match query::query_string(params) {
                Ok(encoded) => encoded,
                Err(error) => {
                    descriptor.creation_error = Some(error);
                    return;
                }
            };
            let separator = if url.query().is_some() { "&" } else { "?" };
            let candidate = format!("{url}{separator}{encoded}");
            match Url::parse(&candidate) {
                Ok(url) => descriptor.url = Some(url),
                Err(_) => {
                    descriptor.creation_error = Some(service::invalid_query_with_url(&candidate));
                }
            }
        })
    }

    fn content_type(self, content_type: &str) -> Self {
        self.apply(|descriptor| descriptor.set_content_type(content_type))
    }

    fn tag(self, tag: impl Into<String>) -> Self {
        self.apply(|descriptor| {
            descriptor.tags.insert(tag.into());
        })
    }

    fn tags<I, T>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.apply(|descriptor| {
            descriptor.tags.extend(tags.into_iter().map(Into::into));
        })
    }

    /// Opts the request into (or out of) the client's gates. Off by
    /// default: ungated requests go straight to the request interceptors.
    fn gated(self, flag: bool) -> Self {
        self.apply(|descriptor| descriptor.gated = flag)
    }

    /// Mocks the response with `payload`. Mocked requests never reach the
    /// transport and skip request interceptors, but response interceptors
    /// still run.
    fn mock(self, payload: Vec<u8>) -> Self {
        self.apply(|descriptor| descriptor.mocked = Some(payload))
    }

    /// Mocks the response with a file's contents. An unreadable or empty
    /// file leaves the resource unchanged with a warning.
    fn mock_file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(payload) if !payload.is_empty() => self.mock(payload),
            Ok(_) => {
                warn!(path = %path.display(), "mock file is empty, not mocking");
                self
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "unable to read mock file, not mocking");
                self
            }
        }
    }

    /// Sets the parser the engine should run against the response body.
    fn parser(self, parser: Arc<dyn ResponseParser>) -> Self {
        self.apply(|descriptor| descriptor.parser = Some(parser))
    }

    /// Parses the response body as JSON into the envelope result.
    fn json_parser(self) -> Self {
        self.parser(Arc::new(JsonParser))
    }

    /// Spawns result delivery onto the given runtime handle instead of the
    /// engine's own context.
    fn deliver_on(self, handle: Handle) -> Self {
        self.apply(|descriptor| descriptor.deliver_on = Some(handle))
    }
}

/// A body-less request in progress (GET).
pub struct Resource {
    descriptor: RequestDescriptor,
    interface: Arc<dyn NetworkInterface>,
}

/// A request that may carry a body (POST/PUT/DELETE).
pub struct ResourceWithBody {
    descriptor: RequestDescriptor,
    interface: Arc<dyn NetworkInterface>,
}

impl RequestModifiers for Resource {
    fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }
}

impl RequestModifiers for ResourceWithBody {
    fn descriptor_mut(&mut self) -> &mut RequestDescriptor {
        &mut self.descriptor
    }
}

impl Resource {
    pub(crate) fn new(descriptor: RequestDescriptor, interface: Arc<dyn NetworkInterface>) -> Self {
        Self {
            descriptor,
            interface,
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub fn into_descriptor(self) -> RequestDescriptor {
        self.descriptor
    }

    /// Runs the request and resolves with the final envelope.
    pub async fn load(self) -> Envelope {
        self.interface.load(self.descriptor).await
    }

    /// Runs the request with a JSON parser attached and deserializes the
    /// parsed result. `Ok(None)` is a no-content success (204/205).
    pub async fn load_json<T: DeserializeOwned>(self) -> Result<Option<T>, CourierError> {
        json_result(self.json_parser().load().await)
    }

    /// Runs the request and splits delivery into success/failure callbacks,
    /// spawned onto the descriptor's delivery handle when one is set.
    pub fn load_with(
        self,
        on_success: impl FnOnce(Envelope) + Send + 'static,
        on_failure: impl FnOnce(Envelope) + Send + 'static,
    ) {
        load_split(self.interface, self.descriptor, on_success, on_failure);
    }
}

impl ResourceWithBody {
    pub(crate) fn new(descriptor: RequestDescriptor, interface: Arc<dyn NetworkInterface>) -> Self {
        Self {
            descriptor,
            interface,
        }
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub fn into_descriptor(self) -> RequestDescriptor {
        self.descriptor
    }

    /// Sets the body to form-urlencoded fields and the matching content
    /// type.
    pub fn fields<T: Serialize>(self, fields: &T) -> Self {
        self.apply(|descriptor| match query::query_string(fields) {
            Ok(encoded) => {
                descriptor.set_content_type("application/x-www-form-urlencoded");
                descriptor.body = Some(encoded.into_bytes());
            }
            Err(error) => descriptor.creation_error = Some(error),
        })
    }

    /// Sets the body to raw bytes. Without an explicit MIME type the
    /// leading byte picks one.
    pub fn data(self, data: Vec<u8>, mime_type: Option<&str>) -> Self {
        self.apply(|descriptor| {
            let mime_type = mime_type.unwrap_or_else(|| sniff_mime(&data));
            descriptor.set_content_type(mime_type);
            descriptor.body = Some(data);
        })
    }

    /// Serializes `body` as a JSON body with an `application/json` content
    /// type.
    pub fn json<T: Serialize>(self, body: &T) -> Self {
        self.apply(|descriptor| match serde_json::to_vec(body) {
            Ok(encoded) => {
                descriptor.set_content_type("application/json");
                descriptor.body = Some(encoded);
            }
            Err(err) => {
                descriptor.creation_error =
                    Some(service::json_encoding_failure(&err.to_string()));
            }
        })
    }

    /// JSON body from an already-built [`serde_json::Value`].
    pub fn json_value(self, body: &serde_json::Value) -> Self {
        self.json(body)
    }

    /// Appends an in-memory multipart part. Parts are encoded with
    /// generated boundaries when the request is dispatched.
    pub fn multipart(self, name: &str, data: Vec<u8>, mime_type: Option<&str>) -> Self {
        self.apply(|descriptor| {
            descriptor
                .multipart
                .push(BodyPart::new(name, None, mime_type, PartSource::Bytes(data)));
        })
    }

    /// Appends a file-backed multipart part; the file is read when the
    /// multipart body is encoded at dispatch time.
    pub fn multipart_file(self, name: &str, path: impl AsRef<Path>, mime_type: Option<&str>) -> Self {
        let path = path.as_ref().to_path_buf();
        self.apply(|descriptor| {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            descriptor.multipart.push(BodyPart::new(
                name,
                filename.as_deref(),
                mime_type,
                PartSource::File(path),
            ));
        })
    }

    /// Runs the request and resolves with the final envelope.
    pub async fn load(self) -> Envelope {
        self.interface.load(self.descriptor).await
    }

    /// Runs the request with a JSON parser attached and deserializes the
    /// parsed result. `Ok(None)` is a no-content success (204/205).
    pub async fn load_json<T: DeserializeOwned>(self) -> Result<Option<T>, CourierError> {
        json_result(self.json_parser().load().await)
    }

    /// Runs the request and splits delivery into success/failure callbacks,
    /// spawned onto the descriptor's delivery handle when one is set.
    pub fn load_with(
        self,
        on_success: impl FnOnce(Envelope) + Send + 'static,
        on_failure: impl FnOnce(Envelope) + Send + 'static,
    ) {
        load_split(self.interface, self.descriptor, on_success, on_failure);
    }
}

fn load_split(
    interface: Arc<dyn NetworkInterface>,
    descriptor: RequestDescriptor,
    on_success: impl FnOnce(Envelope) + Send + 'static,
    on_failure: impl FnOnce(Envelope) + Send + 'static,
) {
    let deliver_on = descriptor.deliver_on.clone();
    let deliver = async move {
        let envelope = interface.load(descriptor).await;
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

fn json_result<T: DeserializeOwned>(envelope: Envelope) -> Result<Option<T>, CourierError> {
    if let Some(error) = envelope.error {
        return Err(error);
    }
    match envelope.result {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|err| courier::json_parsing_failure(&err.to_string())),
        None => Ok(None),
    }
}

/// Picks a MIME type from the body's leading byte, falling back to a
/// generic octet stream.
fn sniff_mime(data: &[u8]) -> &'static str {
    match data.first() {
        Some(0xFF) => "image/jpeg",
        Some(0x89) => "image/png",
        Some(0x47) => "image/gif",
        Some(0x49) | Some(0x4D) => "image/tiff",
        Some(0x25) => "application/pdf",
        Some(0xD0) => "application/vnd",
        Some(0x46) => "text/plain",
        _ => "application/octet-stream",
    }
}
