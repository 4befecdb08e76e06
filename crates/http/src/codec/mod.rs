//! HTTP codec module for encoding and decoding HTTP messages
//!
//! - [`RequestDecoder`]: turns raw bytes into `http::Request<Bytes>`, head first,
//!   then the `Content-Length` delimited body
//! - [`ResponseEncoder`]: serializes `http::Response<Bytes>` into raw bytes
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use cornercut_http::codec::RequestDecoder;
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from("GET /hi?a=1 HTTP/1.1\r\nHost: localhost\r\n\r\n");
//! let request = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(request.uri().path(), "/hi");
//! ```

mod header_decoder;
mod request_decoder;
mod response_encoder;

pub use header_decoder::HeaderDecoder;
pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;
