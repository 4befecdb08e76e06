//! Decoded HTTP request head.
//!
//! Wraps `http::Request<()>` so the decoder can hold on to the head while the
//! body bytes are still arriving, and so the connection can ask it about
//! keep-alive once the request has been answered.

use bytes::Bytes;
use http::header::CONNECTION;
use http::{HeaderMap, Method, Request, Uri, Version};

/// Represents an HTTP request head.
#[derive(Debug)]
pub struct RequestHeader {
    inner: Request<()>,
}

impl RequestHeader {
    /// Attaches the (possibly empty) body bytes, producing the full request.
    pub fn body(self, body: Bytes) -> Request<Bytes> {
        self.inner.map(|()| body)
    }

    pub fn method(&self) -> &Method {
        self.inner.method()
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn version(&self) -> Version {
        self.inner.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    /// Whether the connection should stay open after this request is answered.
    ///
    /// HTTP/1.1 keeps the connection unless the client sent `Connection: close`,
    /// HTTP/1.0 closes it unless the client sent `Connection: keep-alive`.
    pub fn keep_alive(&self) -> bool {
        keep_alive(self.version(), self.headers())
    }
}

pub(crate) fn keep_alive(version: Version, headers: &HeaderMap) -> bool {
    let has_token = |token: &str| {
        headers
            .get_all(CONNECTION)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|item| item.trim().eq_ignore_ascii_case(token))
    };

    match version {
        Version::HTTP_11 => !has_token("close"),
        _ => has_token("keep-alive"),
    }
}

impl From<Request<()>> for RequestHeader {
    #[inline]
    fn from(inner: Request<()>) -> Self {
        Self { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::RequestHeader;
    use http::{Method, Request, Version};

    fn header(version: Version, connection: Option<&str>) -> RequestHeader {
        let mut builder = Request::builder().method(Method::GET).uri("/").version(version);
        if let Some(connection) = connection {
            builder = builder.header(http::header::CONNECTION, connection);
        }
        builder.body(()).unwrap().into()
    }

    #[test]
    fn http_11_keeps_alive_by_default() {
        assert!(header(Version::HTTP_11, None).keep_alive());
        assert!(!header(Version::HTTP_11, Some("close")).keep_alive());
        assert!(!header(Version::HTTP_11, Some("Upgrade, Close")).keep_alive());
    }

    #[test]
    fn http_10_closes_by_default() {
        assert!(!header(Version::HTTP_10, None).keep_alive());
        assert!(header(Version::HTTP_10, Some("Keep-Alive")).keep_alive());
    }
}
