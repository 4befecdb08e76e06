//! The response an endpoint writes into.
//!
//! [`ResponseWriter`] collects a status, headers and body. The dispatcher turns it
//! into an `http::Response<Bytes>` once the request has been handled, whether or
//! not the endpoint called [`ResponseWriter::end`].

use bytes::{Bytes, BytesMut};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use tracing::warn;

pub(crate) const TEXT_HTML: HeaderValue = HeaderValue::from_static("text/html");

/// Headers written with the dispatcher's own responses, and with a route's
/// `http_code` when the route declares no headers.
pub(crate) fn html_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(1);
    headers.insert(CONTENT_TYPE, TEXT_HTML);
    headers
}

#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    head_written: bool,
    ended: bool,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self { status: StatusCode::OK, headers: HeaderMap::new(), body: BytesMut::new(), head_written: false, ended: false }
    }
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status and the given headers.
    ///
    /// Headers already present under the same name are replaced, others are kept.
    pub fn write_head(&mut self, status: StatusCode, headers: HeaderMap) -> &mut Self {
        if self.ended {
            warn!(%status, "write_head after end, ignored");
            return self;
        }

        self.status = status;
        self.headers.extend(headers);
        self.head_written = true;
        self
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        if self.ended {
            warn!(header = %name, "set_header after end, ignored");
            return self;
        }

        self.headers.insert(name, value);
        self
    }

    /// Appends a chunk to the body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) -> &mut Self {
        if self.ended {
            warn!("write after end, ignored");
            return self;
        }

        self.body.extend_from_slice(chunk.as_ref());
        self
    }

    /// Appends a last chunk and finishes the response; later writes are ignored.
    pub fn end(&mut self, chunk: impl AsRef<[u8]>) {
        self.write(chunk);
        self.ended = true;
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_head_written(&self) -> bool {
        self.head_written
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Discards everything written so far and answers with `status` and an html `body`.
    pub(crate) fn replace(&mut self, status: StatusCode, body: impl AsRef<[u8]>) {
        self.headers.clear();
        self.body.clear();
        self.ended = false;
        self.write_head(status, html_headers());
        self.end(body);
    }

    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body.freeze());
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ok() {
        let res = ResponseWriter::new();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(!res.is_head_written());
        assert!(!res.is_ended());
    }

    #[test]
    fn write_head_replaces_same_name_headers() {
        let mut res = ResponseWriter::new();
        res.set_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("1"));
        res.write_head(StatusCode::NOT_FOUND, html_headers());

        let mut json = HeaderMap::new();
        json.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        res.write_head(StatusCode::CREATED, json);

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(res.headers().get("x-trace").unwrap(), "1");
    }

    #[test]
    fn writes_after_end_are_ignored() {
        let mut res = ResponseWriter::new();
        res.write("hel").end("lo");
        res.write(" world");
        res.write_head(StatusCode::IM_A_TEAPOT, HeaderMap::new());

        assert!(res.is_ended());
        assert_eq!(res.body(), b"hello");
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[test]
    fn replace_discards_previous_output() {
        let mut res = ResponseWriter::new();
        res.set_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("1"));
        res.end("partial");

        res.replace(StatusCode::INTERNAL_SERVER_ERROR, "boom");

        let response = res.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(&response.body()[..], b"boom");
    }
}
