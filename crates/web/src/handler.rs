//! Endpoints: the resolved handlers a route dispatches to.
//!
//! An [`Endpoint`] can be invoked directly ([`Endpoint::call`]) or through one of
//! its named members ([`Endpoint::call_method`]). Both default to a failure, so an
//! implementation only provides the way it can actually be invoked:
//!
//! - [`handler_fn`] wraps a closure that is called directly
//! - [`MethodTable`] maps member names to endpoints and is only callable by name

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{Context, Request, ResponseWriter};

/// The error an endpoint fails with, answered as HTTP 500 with its text as body.
pub type HandlerError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("target is not callable")]
    NotCallable,

    #[error("target has no method named `{method}`")]
    NoSuchMethod { method: String },

    #[error("a function method can't be looked up on a target")]
    FunctionMethodOnTarget,
}

#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Invokes the endpoint itself.
    async fn call(&self, req: &Request, res: &mut ResponseWriter, ctx: &Context<'_>) -> Result<(), HandlerError> {
        let _ = (req, res, ctx);
        Err(EndpointError::NotCallable.into())
    }

    /// Invokes the endpoint's member named `method`.
    async fn call_method(
        &self,
        method: &str,
        req: &Request,
        res: &mut ResponseWriter,
        ctx: &Context<'_>,
    ) -> Result<(), HandlerError> {
        let _ = (req, res, ctx);
        Err(EndpointError::NoSuchMethod { method: method.to_owned() }.into())
    }
}

/// A closure endpoint, see [`handler_fn`].
pub struct FnEndpoint<F> {
    f: F,
}

impl<F> fmt::Debug for FnEndpoint<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnEndpoint").finish_non_exhaustive()
    }
}

/// Wraps `f` into an endpoint that is invoked directly.
///
/// ```
/// use cornercut_web::handler_fn;
///
/// let hello = handler_fn(|_req, res, _ctx| {
///     res.end("hello");
///     Ok(())
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> FnEndpoint<F>
where
    F: Fn(&Request, &mut ResponseWriter, &Context<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    FnEndpoint { f }
}

#[async_trait]
impl<F> Endpoint for FnEndpoint<F>
where
    F: Fn(&Request, &mut ResponseWriter, &Context<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    async fn call(&self, req: &Request, res: &mut ResponseWriter, ctx: &Context<'_>) -> Result<(), HandlerError> {
        (self.f)(req, res, ctx)
    }
}

/// An endpoint made of named members, invoked through a route's method name.
#[derive(Default, Clone)]
pub struct MethodTable {
    methods: HashMap<String, Arc<dyn Endpoint>>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the member `name`.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, endpoint: impl Endpoint + 'static) -> Self {
        self.methods.insert(name.into(), Arc::new(endpoint));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods.keys()).finish()
    }
}

#[async_trait]
impl Endpoint for MethodTable {
    async fn call_method(
        &self,
        method: &str,
        req: &Request,
        res: &mut ResponseWriter,
        ctx: &Context<'_>,
    ) -> Result<(), HandlerError> {
        match self.methods.get(method) {
            Some(endpoint) => endpoint.call(req, res, ctx).await,
            None => Err(EndpointError::NoSuchMethod { method: method.to_owned() }.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Router;
    use bytes::Bytes;

    fn request() -> Request {
        http::Request::builder().uri("/").body(Bytes::new()).unwrap()
    }

    fn calc() -> MethodTable {
        MethodTable::new()
            .method(
                "add",
                handler_fn(|_req, res, _ctx| {
                    res.end("3");
                    Ok(())
                }),
            )
            .method("fail", handler_fn(|_req, _res, _ctx| Err("division by zero".into())))
    }

    #[tokio::test]
    async fn fn_endpoint_is_called_directly() {
        let router = Router::new();
        let ctx = Context::new(&router, None);
        let mut res = ResponseWriter::new();

        let hello = handler_fn(|_req, res, _ctx| {
            res.end("hello");
            Ok(())
        });
        hello.call(&request(), &mut res, &ctx).await.unwrap();
        assert_eq!(res.body(), b"hello");

        let err = hello.call_method("add", &request(), &mut ResponseWriter::new(), &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "target has no method named `add`");
    }

    #[tokio::test]
    async fn method_table_dispatches_by_name() {
        let router = Router::new();
        let ctx = Context::new(&router, None);
        let table = calc();

        let mut res = ResponseWriter::new();
        table.call_method("add", &request(), &mut res, &ctx).await.unwrap();
        assert_eq!(res.body(), b"3");

        let err = table.call_method("fail", &request(), &mut ResponseWriter::new(), &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "division by zero");

        let err = table.call(&request(), &mut ResponseWriter::new(), &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "target is not callable");

        assert!(table.contains("add"));
        assert!(!table.contains("sub"));
    }
}
