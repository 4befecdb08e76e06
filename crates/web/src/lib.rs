//! A minimal HTTP request dispatcher.
//!
//! A [`Router`] holds an ordered table of [`Route`]s. Each request is matched to the
//! first route whose path equals the request path, the route's [`Target`] is resolved
//! into an [`Endpoint`], and the endpoint is invoked with the request, a
//! [`ResponseWriter`] and a [`Context`]. Failures never escape a request: they are
//! answered with 404 or 500 as described on [`Router::dispatch`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cornercut_web::{MethodTable, ModuleRegistry, Route, Router, ServerConfig, handler_fn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let calc = MethodTable::new().method(
//!         "add",
//!         handler_fn(|_req, res, _ctx| {
//!             res.end("added");
//!             Ok(())
//!         }),
//!     );
//!
//!     let router = Arc::new(Router::builder().loader(ModuleRegistry::new().register("calc", calc)).build());
//!     router
//!         .add(Route::new("/hi").endpoint(handler_fn(|_req, res, _ctx| {
//!             res.end("hello");
//!             Ok(())
//!         })))
//!         .add(Route::new("/sum").module("calc").method_param("op"));
//!
//!     let server = router.create_server(ServerConfig::new().port(8080)).await.unwrap();
//!     println!("listening on {}", server.local_addr());
//!     tokio::signal::ctrl_c().await.unwrap();
//! }
//! ```

mod dispatch;
mod handler;
mod loader;
mod request;
mod response;
mod route;
mod server;

pub mod router;

pub use dispatch::DispatchError;
pub use handler::{Endpoint, EndpointError, FnEndpoint, HandlerError, MethodTable, handler_fn};
pub use loader::{LoadError, ModuleLoader, ModuleRegistry};
pub use request::{Context, QueryParams, Request};
pub use response::ResponseWriter;
pub use route::{IntoRoutes, MethodRef, Route, Target};
pub use router::{Router, RouterBuilder};
pub use server::{ServerConfig, ServerError, ServerHandle};
