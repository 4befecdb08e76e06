//! Request side types handed to every endpoint.
//!
//! - [`Request`]: the decoded HTTP request, body included as raw bytes
//! - [`QueryParams`]: the decoded query string of a request
//! - [`Context`]: the third endpoint argument, a back-reference to the [`Router`]
//!   plus the matched route's data

use std::any::Any;
use std::fmt;

use bytes::Bytes;
use http::Uri;
use tracing::warn;

use crate::Router;

/// The request type endpoints receive.
pub type Request = http::Request<Bytes>;

/// Route data as stored on a route and exposed through [`Context::data`].
pub(crate) type RouteData = dyn Any + Send + Sync;

/// Query parameters decoded from a request URI.
///
/// Keys may repeat; [`QueryParams::get`] returns the first value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Decodes the query component of `uri`, empty when there is none.
    pub fn from_uri(uri: &Uri) -> Self {
        uri.query().map(Self::parse).unwrap_or_default()
    }

    /// Decodes an `application/x-www-form-urlencoded` query string.
    ///
    /// A query that can't be decoded is logged and treated as empty.
    pub fn parse(query: &str) -> Self {
        match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
            Ok(pairs) => Self { pairs },
            Err(e) => {
                warn!(cause = %e, query, "can't decode query string");
                Self::default()
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(key, _)| key == name).map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// The context an endpoint is invoked with.
///
/// Both endpoints and custom error handlers receive a `Context`. When a request
/// matched no route, the context carries no route data.
#[derive(Clone, Copy)]
pub struct Context<'r> {
    router: &'r Router,
    data: Option<&'r RouteData>,
}

impl<'r> Context<'r> {
    pub(crate) fn new(router: &'r Router, data: Option<&'r RouteData>) -> Self {
        Self { router, data }
    }

    /// The router that dispatched this request.
    pub fn router(&self) -> &'r Router {
        self.router
    }

    /// The matched route's data, if it has data of type `T`.
    pub fn data<T: Any>(&self) -> Option<&'r T> {
        self.data.and_then(|data| data.downcast_ref::<T>())
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("has_data", &self.has_data()).finish_non_exhaustive()
    }
}
