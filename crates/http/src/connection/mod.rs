//! HTTP connection handling module
//!
//! [`HttpConnection`] drives one accepted socket: it decodes requests one after
//! another, hands each to a [`crate::handler::Handler`] and writes the responses
//! back in order, until the peer closes or a request asks for `Connection: close`.

mod http_connection;

pub use http_connection::HttpConnection;
