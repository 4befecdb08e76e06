//! The per-request entry point of a [`Router`].
//!
//! Every request moves through the same steps: match the path, resolve the
//! route's target and method, write the route's status, invoke the endpoint.
//! Whatever goes wrong is terminated here and written to the response; a failing
//! or panicking endpoint never affects other requests.

use std::any::Any;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use bytes::Bytes;
use cornercut_http::handler::Handler;
use futures::FutureExt;
use http::{Response, StatusCode};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::loader::LoadError;
use crate::request::QueryParams;
use crate::response::html_headers;
use crate::route::Route;
use crate::router::{MethodChoice, NOT_FOUND, Resolution};
use crate::{Context, Endpoint, EndpointError, HandlerError, Request, ResponseWriter, Router};

const NOT_FOUND_BODY: &str = "404\n<br />Not found!";

/// Why a request did not end in a successful endpoint invocation.
///
/// The response has already been written when a dispatch returns one of these.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches `{path}`")]
    RouteNotFound { path: String },

    #[error("Missing required parameter, {param}")]
    MissingMethodParameter { param: String },

    #[error("Could not find module by the name, {target}")]
    TargetUnresolvable {
        target: String,
        #[source]
        source: LoadError,
    },

    #[error("route `{path}` has nothing to invoke")]
    EmptyTarget { path: String },

    #[error("{0}")]
    Handler(HandlerError),
}

impl DispatchError {
    pub fn missing_method_parameter<S: ToString>(param: S) -> Self {
        Self::MissingMethodParameter { param: param.to_string() }
    }

    pub fn target_unresolvable<S: ToString>(target: S, source: LoadError) -> Self {
        Self::TargetUnresolvable { target: target.to_string(), source }
    }

    /// Whether the request was answered with 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RouteNotFound { .. } | Self::EmptyTarget { .. })
    }
}

impl Router {
    /// Dispatches `req`, writing the outcome into `res`.
    ///
    /// - no route matches: 404, through the custom `"404"` handler if registered
    /// - missing method parameter or unloadable module: 500 naming it
    /// - nothing to invoke: 404, as if no route matched; this includes a named
    ///   method on a route whose target resolved to nothing, which is answered
    ///   with 404 rather than 500
    /// - endpoint error or panic: 500 with the error text as body
    pub async fn dispatch(&self, req: &Request, res: &mut ResponseWriter) -> Result<(), DispatchError> {
        let path = req.uri().path();

        let Some(route) = self.at(path) else {
            debug!(path, "no route matched");
            let ctx = Context::new(self, None);
            return self.not_found(req, res, &ctx, DispatchError::RouteNotFound { path: path.to_owned() }).await;
        };

        let ctx = Context::new(self, route.get_data());
        match guarded(self.invoke(&route, req, res, &ctx)).await {
            Ok(()) => Ok(()),
            Err(e @ DispatchError::EmptyTarget { .. }) => {
                debug!(path, "route resolved to nothing to invoke");
                self.not_found(req, res, &ctx, e).await
            }
            Err(e) => {
                match &e {
                    DispatchError::Handler(cause) => error!(%cause, path, "handler failed"),
                    _ => warn!(cause = %e, path, "can't resolve route"),
                }
                res.replace(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
                Err(e)
            }
        }
    }

    /// Dispatches an owned request and returns the finished response.
    pub async fn handle(&self, req: Request) -> Response<Bytes> {
        let mut res = ResponseWriter::new();
        if let Err(e) = self.dispatch(&req, &mut res).await {
            debug!(cause = %e, status = %res.status(), "request answered with an error");
        }
        res.into_response()
    }

    async fn invoke(
        &self,
        route: &Route,
        req: &Request,
        res: &mut ResponseWriter,
        ctx: &Context<'_>,
    ) -> Result<(), DispatchError> {
        let query = QueryParams::from_uri(req.uri());
        let Resolution { endpoint, method } = self.resolver.resolve(route, &query)?;

        if let Some(status) = route.get_http_code() {
            let headers = route.get_headers().cloned().unwrap_or_else(html_headers);
            res.write_head(status, headers);
        }

        let result = match (endpoint, method) {
            (None, MethodChoice::Function(f)) => f.call(req, res, ctx).await,
            (Some(_), MethodChoice::Function(_)) => Err(EndpointError::FunctionMethodOnTarget.into()),
            (Some(endpoint), MethodChoice::Named(name)) => endpoint.call_method(&name, req, res, ctx).await,
            (Some(endpoint), MethodChoice::Direct) => endpoint.call(req, res, ctx).await,
            (None, _) => return Err(DispatchError::EmptyTarget { path: route.path().to_owned() }),
        };
        result.map_err(DispatchError::Handler)
    }

    /// Writes the 404 head, then hands over to the custom `"404"` handler or
    /// writes the default body.
    async fn not_found(
        &self,
        req: &Request,
        res: &mut ResponseWriter,
        ctx: &Context<'_>,
        reason: DispatchError,
    ) -> Result<(), DispatchError> {
        res.write_head(StatusCode::NOT_FOUND, html_headers());

        let Some(handler) = self.error_handler(NOT_FOUND) else {
            res.end(NOT_FOUND_BODY);
            return Err(reason);
        };

        match guarded(async { handler.call(req, res, ctx).await.map_err(DispatchError::Handler) }).await {
            Ok(()) => Err(reason),
            Err(e) => {
                error!(cause = %e, path = req.uri().path(), "404 handler failed");
                res.replace(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Handler for Router {
    type Error = Infallible;

    async fn call(&self, req: Request) -> Result<Response<Bytes>, Self::Error> {
        Ok(self.handle(req).await)
    }
}

/// Runs `fut`, turning a panic into a [`DispatchError::Handler`].
async fn guarded<F>(fut: F) -> Result<(), DispatchError>
where
    F: Future<Output = Result<(), DispatchError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(DispatchError::Handler(panic_message(panic).into())),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(message) => *message,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => "handler panicked".to_owned(),
        },
    }
}
