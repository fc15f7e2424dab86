//! Built-in request interceptor that encodes accumulated multipart parts.

use courier_request::multipart::encode_parts;
use courier_request::RequestDescriptor;
use tracing::warn;
use uuid::Uuid;

use crate::RequestInterceptor;

/// Serializes any accumulated multipart parts into a single encoded body
/// with a generated boundary. Always runs first among request
/// interceptors so user interceptors see the finished body.
#[derive(Clone, Copy, Debug, Default)]
pub struct MultipartEncodingInterceptor;

impl RequestInterceptor for MultipartEncodingInterceptor {
    fn intercept(&self, mut request: RequestDescriptor) -> RequestDescriptor {
        if request.multipart.is_empty() {
            return request;
        }

        let boundary = Uuid::new_v4().to_string();
        match encode_parts(&request.multipart, &boundary) {
            Ok(body) => {
                request.set_content_type(&format!("multipart/form-data; boundary={boundary}"));
                request.body = Some(body);
                request.multipart.clear();
            }
            Err(error) => {
                warn!(%error, "multipart encoding failed, failing the request");
                request.creation_error = Some(error);
            }
        }
        request
    }
}
