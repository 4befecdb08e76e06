//! Route descriptors.
//!
//! A [`Route`] maps one exact path to a [`Target`] plus dispatch options:
//!
//! ```
//! use cornercut_web::{MethodTable, Route, Target, handler_fn};
//!
//! let hello = Route::new("/hi").endpoint(handler_fn(|_req, res, _ctx| {
//!     res.end("hello");
//!     Ok(())
//! }));
//!
//! // `/sum?op=add` invokes the `add` member of the `calc` module
//! let sum = Route::new("/sum").module("calc").method_param("op");
//!
//! let report = Route::new("/report")
//!     .target(Target::factory(|| Some(MethodTable::new())))
//!     .method("daily");
//! # let _ = (hello, sum, report);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use once_cell::sync::OnceCell;

use crate::Endpoint;
use crate::request::RouteData;

type EndpointFactory = dyn Fn() -> Option<Arc<dyn Endpoint>> + Send + Sync;

/// Where a route's endpoint comes from.
#[derive(Clone)]
pub enum Target {
    /// Loaded by name through the router's [`crate::ModuleLoader`]
    Module(String),
    /// Invoked to produce the endpoint; `None` means the route has no usable target
    Factory(Arc<EndpointFactory>),
    /// The endpoint itself
    Endpoint(Arc<dyn Endpoint>),
}

impl Target {
    pub fn module(name: impl Into<String>) -> Self {
        Target::Module(name.into())
    }

    pub fn factory<F, E>(f: F) -> Self
    where
        F: Fn() -> Option<E> + Send + Sync + 'static,
        E: Endpoint + 'static,
    {
        Target::Factory(Arc::new(move || f().map(|endpoint| Arc::new(endpoint) as Arc<dyn Endpoint>)))
    }

    pub fn endpoint(endpoint: impl Endpoint + 'static) -> Self {
        Target::Endpoint(Arc::new(endpoint))
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Module(name) => f.debug_tuple("Module").field(name).finish(),
            Target::Factory(_) => f.write_str("Factory"),
            Target::Endpoint(_) => f.write_str("Endpoint"),
        }
    }
}

/// The method a route invokes instead of calling its target directly.
#[derive(Clone)]
pub enum MethodRef {
    /// A member of the resolved target
    Named(String),
    /// A free function, invoked itself when the target resolves to nothing.
    ///
    /// It is not a member, so combining it with a target that resolves is a
    /// handler failure answered with 500.
    Function(Arc<dyn Endpoint>),
}

impl MethodRef {
    pub fn function(endpoint: impl Endpoint + 'static) -> Self {
        MethodRef::Function(Arc::new(endpoint))
    }
}

impl From<&str> for MethodRef {
    fn from(name: &str) -> Self {
        MethodRef::Named(name.to_owned())
    }
}

impl From<String> for MethodRef {
    fn from(name: String) -> Self {
        MethodRef::Named(name)
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            MethodRef::Function(_) => f.write_str("Function"),
        }
    }
}

pub struct Route {
    path: String,
    target: Option<Target>,
    method: Option<MethodRef>,
    method_param: Option<String>,
    data: Option<Arc<RouteData>>,
    http_code: Option<StatusCode>,
    headers: Option<HeaderMap>,
    resolved: OnceCell<Option<Arc<dyn Endpoint>>>,
}

impl Route {
    /// A route matching `path` exactly, without a target yet.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target: None,
            method: None,
            method_param: None,
            data: None,
            http_code: None,
            headers: None,
            resolved: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn module(self, name: impl Into<String>) -> Self {
        self.target(Target::module(name))
    }

    #[must_use]
    pub fn factory<F, E>(self, f: F) -> Self
    where
        F: Fn() -> Option<E> + Send + Sync + 'static,
        E: Endpoint + 'static,
    {
        self.target(Target::factory(f))
    }

    #[must_use]
    pub fn endpoint(self, endpoint: impl Endpoint + 'static) -> Self {
        self.target(Target::endpoint(endpoint))
    }

    #[must_use]
    pub fn method(mut self, method: impl Into<MethodRef>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Reads the method name from this query parameter at dispatch time.
    ///
    /// Takes precedence over [`Route::method`]; a request without the parameter
    /// is answered with HTTP 500.
    #[must_use]
    pub fn method_param(mut self, param: impl Into<String>) -> Self {
        self.method_param = Some(param.into());
        self
    }

    /// Attaches data handed to the endpoint through [`crate::Context::data`].
    #[must_use]
    pub fn data<T: Any + Send + Sync>(mut self, data: T) -> Self {
        self.data = Some(Arc::new(data));
        self
    }

    /// Status written before the endpoint is invoked.
    #[must_use]
    pub fn http_code(mut self, status: StatusCode) -> Self {
        self.http_code = Some(status);
        self
    }

    /// Headers written along with [`Route::http_code`], instead of `Content-Type: text/html`.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get_target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn get_method(&self) -> Option<&MethodRef> {
        self.method.as_ref()
    }

    pub fn get_method_param(&self) -> Option<&str> {
        self.method_param.as_deref()
    }

    pub fn get_data(&self) -> Option<&RouteData> {
        self.data.as_deref()
    }

    pub fn get_http_code(&self) -> Option<StatusCode> {
        self.http_code
    }

    pub fn get_headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub(crate) fn resolved(&self) -> &OnceCell<Option<Arc<dyn Endpoint>>> {
        &self.resolved
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("target", &self.target)
            .field("method", &self.method)
            .field("method_param", &self.method_param)
            .field("has_data", &self.data.is_some())
            .field("http_code", &self.http_code)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// One route or an ordered sequence of routes, accepted by [`crate::Router::add`].
pub trait IntoRoutes {
    fn into_routes(self) -> Vec<Route>;
}

impl IntoRoutes for Route {
    fn into_routes(self) -> Vec<Route> {
        vec![self]
    }
}

impl IntoRoutes for Vec<Route> {
    fn into_routes(self) -> Vec<Route> {
        self
    }
}

impl<const N: usize> IntoRoutes for [Route; N] {
    fn into_routes(self) -> Vec<Route> {
        self.into()
    }
}
