//! A minimal asynchronous HTTP/1.1 connection engine
//!
//! This crate is the transport underneath `cornercut-web`: it accepts bytes from a
//! socket, decodes them into `http::Request<Bytes>`, hands each request to a
//! [`handler::Handler`], and writes the returned `http::Response<Bytes>` back.
//!
//! # Features
//!
//! - HTTP/1.0 and HTTP/1.1 request decoding on top of `httparse`
//! - Keep-alive connections
//! - `Content-Length` delimited request bodies, delivered as raw bytes
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response, StatusCode};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use cornercut_http::connection::HttpConnection;
//! use cornercut_http::handler::make_handler;
//!
//! #[tokio::main]
//! async fn main() {
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             if let Err(e) = HttpConnection::new(reader, writer).process(handler).await {
//!                 error!(cause = %e, "connection shutdown");
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request<Bytes>) -> Result<Response<Bytes>, Infallible> {
//!     info!(path = request.uri().path(), "receive request");
//!     Ok(Response::builder().status(StatusCode::OK).body(Bytes::from_static(b"Hello World!\r\n")).unwrap())
//! }
//! ```
//!
//! # Limitations
//!
//! - HTTP/1.x only
//! - `Transfer-Encoding: chunked` request bodies are rejected
//! - Maximum header size: 8KB, maximum number of headers: 64, maximum body size: 1MB

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
