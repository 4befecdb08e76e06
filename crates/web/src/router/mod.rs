//! The router: route table, error handler registry and target resolution.
//!
//! Routes are matched by exact path equality, in registration order; the first
//! matching route wins. Both the route table and the error handler registry are
//! copy-on-write snapshots, so routes may be added while requests are dispatched.

mod resolver;

pub(crate) use resolver::{MethodChoice, Resolution, TargetResolver};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::{ArcSwap, ArcSwapOption};
use tracing::debug;

use crate::loader::{ModuleLoader, ModuleRegistry};
use crate::route::{IntoRoutes, Route};
use crate::server::ServerHandle;
use crate::Endpoint;

/// Error handler key consulted when a request ends up not found.
pub const NOT_FOUND: &str = "404";

type ErrorHandlers = HashMap<String, Arc<dyn Endpoint>>;

pub struct Router {
    routes: ArcSwap<Vec<Arc<Route>>>,
    error_handlers: ArcSwap<ErrorHandlers>,
    pub(crate) resolver: TargetResolver,
    pub(crate) webserver: ArcSwapOption<ServerHandle>,
}

impl Router {
    /// An empty router with an empty [`ModuleRegistry`], resolving targets on every request.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Appends one route or an ordered sequence of routes to the table.
    ///
    /// Nothing is validated here; a route that can't be dispatched fails when a
    /// request reaches it.
    pub fn add(&self, routes: impl IntoRoutes) -> &Self {
        let added = routes.into_routes().into_iter().map(Arc::new).collect::<Vec<_>>();
        debug!(count = added.len(), "add routes");

        self.routes.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + added.len());
            next.extend(current.iter().cloned());
            next.extend(added.iter().cloned());
            next
        });
        self
    }

    /// Finds the first registered route whose path equals `path`.
    pub fn at(&self, path: &str) -> Option<Arc<Route>> {
        self.routes.load().iter().find(|route| route.path() == path).cloned()
    }

    /// A snapshot of the route table, in registration order.
    pub fn routes(&self) -> Arc<Vec<Arc<Route>>> {
        self.routes.load_full()
    }

    /// Registers `handler` under `key`, replacing any previous handler for it.
    ///
    /// Only [`NOT_FOUND`] is consulted by the dispatcher. The handler is invoked
    /// with the 404 status and `Content-Type: text/html` already written.
    pub fn set_error_handler(&self, key: impl Into<String>, handler: impl Endpoint + 'static) -> &Self {
        let key = key.into();
        let handler: Arc<dyn Endpoint> = Arc::new(handler);

        self.error_handlers.rcu(|current| {
            let mut next = ErrorHandlers::clone(current);
            next.insert(key.clone(), Arc::clone(&handler));
            next
        });
        self
    }

    pub fn remove_error_handler(&self, key: &str) -> &Self {
        self.error_handlers.rcu(|current| {
            let mut next = ErrorHandlers::clone(current);
            next.remove(key);
            next
        });
        self
    }

    pub fn error_handler(&self, key: &str) -> Option<Arc<dyn Endpoint>> {
        self.error_handlers.load().get(key).cloned()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.load().len())
            .field("error_handlers", &self.error_handlers.load().keys().collect::<Vec<_>>())
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

pub struct RouterBuilder {
    loader: Box<dyn ModuleLoader>,
    cache_resolved_targets: bool,
    routes: Vec<Route>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self { loader: Box::new(ModuleRegistry::new()), cache_resolved_targets: false, routes: Vec::new() }
    }

    /// The loader module targets are resolved with.
    #[must_use]
    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// When set, a route's target is resolved on its first dispatch and reused
    /// afterwards; otherwise factories run and modules load on every request.
    ///
    /// Load failures are never cached.
    #[must_use]
    pub fn cache_resolved_targets(mut self, cache: bool) -> Self {
        self.cache_resolved_targets = cache;
        self
    }

    #[must_use]
    pub fn route(mut self, routes: impl IntoRoutes) -> Self {
        self.routes.extend(routes.into_routes());
        self
    }

    pub fn build(self) -> Router {
        Router {
            routes: ArcSwap::from_pointee(self.routes.into_iter().map(Arc::new).collect()),
            error_handlers: ArcSwap::from_pointee(ErrorHandlers::new()),
            resolver: TargetResolver::new(self.loader, self.cache_resolved_targets),
            webserver: ArcSwapOption::empty(),
        }
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("cache_resolved_targets", &self.cache_resolved_targets)
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}
