//! Named web services and the base resource they hand out.

use std::sync::Arc;

use async_trait::async_trait;
use courier_core_types::error::service;
use courier_core_types::{CourierError, Envelope, Method};
use url::Url;

use crate::descriptor::RequestDescriptor;
use crate::resource::{Resource, ResourceWithBody};

/// Bridge between resources and whatever actually runs them.
///
/// The execution engine implements this; anything else that can turn a
/// descriptor into an envelope (a stub, a replay harness) can stand in.
#[async_trait]
pub trait NetworkInterface: Send + Sync {
    async fn load(&self, request: RequestDescriptor) -> Envelope;
}

/// A named server: base URL plus the interface requests travel through.
///
/// Explicit and caller-constructed; build one per backend and hand out
/// clones. There is no process-wide shared instance.
#[derive(Clone)]
pub struct Service {
    base_url: String,
    interface: Arc<dyn NetworkInterface>,
}

impl Service {
    pub fn new(base_url: impl Into<String>, interface: Arc<dyn NetworkInterface>) -> Self {
        Self {
            base_url: base_url.into(),
            interface,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The starting point for requests against this service's server.
    pub fn server(&self) -> BaseResource {
        BaseResource::new(&self.base_url, Arc::clone(&self.interface))
    }

    /// A starting point with a custom base URL, keeping this service's
    /// network interface.
    pub fn custom(&self, base_url: &str) -> BaseResource {
        BaseResource::new(base_url, Arc::clone(&self.interface))
    }

    pub fn get(&self, path: &str) -> Resource {
        self.server().get(path)
    }

    pub fn post(&self, path: &str) -> ResourceWithBody {
        self.server().post(path)
    }

    pub fn put(&self, path: &str) -> ResourceWithBody {
        self.server().put(path)
    }

    pub fn delete(&self, path: &str) -> ResourceWithBody {
        self.server().delete(path)
    }
}

/// A request rooted at a base URL, before an HTTP method is chosen.
///
/// Use the method selectors to obtain a [`Resource`] (GET) or a
/// [`ResourceWithBody`] (POST/PUT/DELETE).
pub struct BaseResource {
    url: Result<Url, CourierError>,
    interface: Arc<dyn NetworkInterface>,
}

impl BaseResource {
    fn new(base_url: &str, interface: Arc<dyn NetworkInterface>) -> Self {
        let url = if base_url.trim().is_empty() {
            Err(service::empty_base_url())
        } else {
            Url::parse(base_url).map_err(|_| service::invalid_base_url(base_url))
        };
        Self { url, interface }
    }

    pub fn get(self, path: &str) -> Resource {
        let (descriptor, interface) = self.into_parts(Method::Get, path);
        Resource::new(descriptor, interface)
    }

    pub fn post(self, path: &str) -> ResourceWithBody {
        let (descriptor, interface) = self.into_parts(Method::Post, path);
        ResourceWithBody::new(descriptor, interface)
    }

    pub fn put(self, path: &str) -> ResourceWithBody {
        let (descriptor, interface) = self.into_parts(Method::Put, path);
        ResourceWithBody::new(descriptor, interface)
    }

    pub fn delete(self, path: &str) -> ResourceWithBody {
        let (descriptor, interface) = self.into_parts(Method::Delete, path);
        ResourceWithBody::new(descriptor, interface)
    }

    fn into_parts(
        self,
        method: Method,
        path: &str,
    ) -> (RequestDescriptor, Arc<dyn NetworkInterface>) {
        let descriptor = match self.url {
            Err(error) => RequestDescriptor::failed(method, error),
            Ok(mut url) => match append_path(&mut url, path) {
                Ok(()) => RequestDescriptor::from_url(url, method),
                Err(error) => RequestDescriptor::failed(method, error),
            },
        };
        (descriptor, self.interface)
    }
}

/// Appends `path` to `url`, preserving any query substring carried inside
/// the path argument and any query already on the URL.
fn append_path(url: &mut Url, path: &str) -> Result<(), CourierError> {
    let (path_part, query_part) = match path.split_once('?') {
        Some((before, after)) => (before, Some(after)),
        None => (path, None),
    };

    let original = url.to_string();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| service::invalid_url(&original))?;
        segments.pop_if_empty();
        for segment in path_part.split('/').filter(|segment| !segment.is_empty()) {
            segments.push(segment);
        }
    }

    if let Some(query) = query_part {
        let merged = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{query}"),
            _ => query.to_string(),
        };
        url.set_query(Some(&merged));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DeadInterface;

    #[async_trait]
    impl NetworkInterface for DeadInterface {
        async fn load(&self, _request: RequestDescriptor) -> Envelope {
            Envelope::default()
        }
    }

    fn test_service(base_url: &str) -> Service {
        Service::new(base_url, Arc::new(DeadInterface))
    }

    #[test]
    fn get_appends_path_segments() {
        let resource = test_service("https://api.example.com/v1").get("users/42");
        let descriptor = resource.into_descriptor();
        assert_eq!(
            descriptor.url.unwrap().as_str(),
            "https://api.example.com/v1/users/42"
        );
        assert_eq!(descriptor.method, Method::Get);
    }

    #[test]
    fn query_inside_the_path_argument_is_preserved() {
        let resource = test_service("https://api.example.com").get("search?q=rust");
        let descriptor = resource.into_descriptor();
        assert_eq!(
            descriptor.url.unwrap().as_str(),
            "https://api.example.com/search?q=rust"
        );
    }

    #[test]
    fn invalid_base_url_predisposes_the_descriptor() {
        let resource = test_service("not a url").get("anything");
        let descriptor = resource.into_descriptor();
        let error = descriptor.creation_error.expect("creation error");
        assert_eq!(error.code, service::INVALID_BASE_URL);
        assert!(descriptor.url.is_none());
    }

    #[test]
    fn empty_base_url_is_its_own_error() {
        let resource = test_service("  ").get("x");
        let error = resource.into_descriptor().creation_error.unwrap();
        assert_eq!(error.code, service::EMPTY_BASE_URL);
    }

    #[test]
    fn post_yields_a_body_capable_resource() {
        let resource = test_service("https://api.example.com").post("items");
        let descriptor = resource.into_descriptor();
        assert_eq!(descriptor.method, Method::Post);
    }
}
