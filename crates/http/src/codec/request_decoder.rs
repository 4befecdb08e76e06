//! HTTP request decoder
//!
//! Decodes a complete request in two phases: the head through [`HeaderDecoder`],
//! then the `Content-Length` delimited body, which is handed over untouched.

use crate::codec::header_decoder::HeaderDecoder;
use crate::ensure;
use crate::protocol::{ParseError, PayloadSize, RequestHeader};
use bytes::{Bytes, BytesMut};
use http::Request;
use tokio_util::codec::Decoder;

/// Maximum size in bytes allowed for a request body
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// A decoder producing whole `Request<Bytes>` values.
///
/// # State Machine
///
/// - `pending` is `None`: currently parsing a head
/// - `pending` is `Some`: head parsed, waiting for the remaining body bytes
#[derive(Debug, Default)]
pub struct RequestDecoder {
    header_decoder: HeaderDecoder,
    pending: Option<(RequestHeader, usize)>,
}

impl RequestDecoder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for RequestDecoder {
    type Item = Request<Bytes>;
    type Error = ParseError;

    /// - `Ok(Some(request))`: a full request has been decoded
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the stream is not a valid request, the connection should be dropped
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if self.pending.is_none() {
            let Some((header, payload_size)) = self.header_decoder.decode(src)? else {
                return Ok(None);
            };

            let length = match payload_size {
                PayloadSize::Empty => 0,
                PayloadSize::Length(length) => {
                    ensure!(length <= MAX_BODY_BYTES, ParseError::too_large_body(length, MAX_BODY_BYTES));
                    usize::try_from(length).map_err(|_e| ParseError::too_large_body(length, MAX_BODY_BYTES))?
                }
                PayloadSize::Chunked => return Err(ParseError::unsupported_transfer_encoding("chunked")),
            };

            self.pending = Some((header, length));
        }

        match self.pending.take() {
            Some((header, length)) if src.len() >= length => {
                let body = src.split_to(length).freeze();
                Ok(Some(header.body(body)))
            }
            Some((header, length)) => {
                src.reserve(length - src.len());
                self.pending = Some((header, length));
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn decode_without_body() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET /hi HTTP/1.1\r\nHost: localhost\r\n\r\n");

        let request = decoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.uri().path(), "/hi");
        assert!(request.body().is_empty());
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_body_in_pieces() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("POST /echo HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello");

        assert!(decoder.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(b" world");
        let request = decoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(request.uri().path(), "/echo");
        assert_eq!(&request.body()[..], b"hello world");
    }

    #[test]
    fn decode_pipelined_requests() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n");

        let first = decoder.decode(&mut buf).unwrap().unwrap();
        let second = decoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(first.uri().path(), "/a");
        assert_eq!(second.uri().path(), "/b");
        assert!(decoder.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn reject_chunked_body() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n0\r\n\r\n");

        let result = decoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::UnsupportedTransferEncoding { .. })));
    }

    #[test]
    fn reject_too_large_body() {
        let mut decoder = RequestDecoder::new();
        let mut buf = BytesMut::from("POST / HTTP/1.1\r\nContent-Length: 4194304\r\n\r\n");

        let result = decoder.decode(&mut buf);
        assert!(matches!(result, Err(ParseError::TooLargeBody { .. })));
    }
}
