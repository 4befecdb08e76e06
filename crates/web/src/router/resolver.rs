use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::dispatch::DispatchError;
use crate::loader::ModuleLoader;
use crate::request::QueryParams;
use crate::route::{MethodRef, Route, Target};
use crate::Endpoint;

/// The way a resolved route is invoked.
pub(crate) enum MethodChoice {
    /// Call the endpoint itself
    Direct,
    /// Call the endpoint's member with this name
    Named(String),
    /// Call this free function, if the target resolved to nothing
    Function(Arc<dyn Endpoint>),
}

pub(crate) struct Resolution {
    pub(crate) endpoint: Option<Arc<dyn Endpoint>>,
    pub(crate) method: MethodChoice,
}

/// Turns a matched route into something invocable.
pub(crate) struct TargetResolver {
    loader: Box<dyn ModuleLoader>,
    cache_resolved_targets: bool,
}

impl TargetResolver {
    pub(crate) fn new(loader: Box<dyn ModuleLoader>, cache_resolved_targets: bool) -> Self {
        Self { loader, cache_resolved_targets }
    }

    /// Picks the method first, so a missing method parameter fails before any
    /// module is loaded or factory invoked.
    pub(crate) fn resolve(&self, route: &Route, query: &QueryParams) -> Result<Resolution, DispatchError> {
        let method = match (route.get_method_param(), route.get_method()) {
            (Some(param), _) => match query.get(param) {
                Some(name) if !name.is_empty() => MethodChoice::Named(name.to_owned()),
                _ => return Err(DispatchError::missing_method_parameter(param)),
            },
            (None, Some(MethodRef::Named(name))) => MethodChoice::Named(name.clone()),
            (None, Some(MethodRef::Function(f))) => MethodChoice::Function(Arc::clone(f)),
            (None, None) => MethodChoice::Direct,
        };

        let endpoint = if self.cache_resolved_targets {
            route.resolved().get_or_try_init(|| self.load(route))?.clone()
        } else {
            self.load(route)?
        };

        Ok(Resolution { endpoint, method })
    }

    fn load(&self, route: &Route) -> Result<Option<Arc<dyn Endpoint>>, DispatchError> {
        match route.get_target() {
            None => Ok(None),
            Some(Target::Module(name)) => {
                trace!(module = name.as_str(), path = route.path(), "load module target");
                self.loader.load(name).map(Some).map_err(|source| {
                    debug!(cause = %source, module = name.as_str(), "can't load module target");
                    DispatchError::target_unresolvable(name, source)
                })
            }
            Some(Target::Factory(factory)) => Ok(factory()),
            Some(Target::Endpoint(endpoint)) => Ok(Some(Arc::clone(endpoint))),
        }
    }
}

impl fmt::Debug for TargetResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetResolver")
            .field("cache_resolved_targets", &self.cache_resolved_targets)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{LoadError, MockModuleLoader, ModuleRegistry};
    use crate::{MethodTable, handler_fn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn calc() -> Arc<dyn Endpoint> {
        Arc::new(MethodTable::new().method("add", handler_fn(|_req, _res, _ctx| Ok(()))))
    }

    fn loading_calc(times: usize) -> MockModuleLoader {
        let mut loader = MockModuleLoader::new();
        loader.expect_load().withf(|name| name == "calc").times(times).returning(|_| Ok(calc()));
        loader
    }

    fn resolver(loader: impl ModuleLoader + 'static, cache: bool) -> TargetResolver {
        TargetResolver::new(Box::new(loader), cache)
    }

    #[test]
    fn method_param_is_read_from_query() {
        let resolver = resolver(loading_calc(1), false);
        let route = Route::new("/sum").module("calc").method_param("op");

        let resolution = resolver.resolve(&route, &QueryParams::parse("op=add")).unwrap();
        assert!(resolution.endpoint.is_some());
        assert!(matches!(resolution.method, MethodChoice::Named(name) if name == "add"));
    }

    #[test]
    fn method_param_takes_precedence_over_method() {
        let resolver = resolver(ModuleRegistry::new().register("calc", MethodTable::new()), false);
        let route = Route::new("/sum").module("calc").method("sub").method_param("op");

        let resolution = resolver.resolve(&route, &QueryParams::parse("op=add")).unwrap();
        assert!(matches!(resolution.method, MethodChoice::Named(name) if name == "add"));

        for query in ["", "op=", "op", "other=add"] {
            let err = resolver.resolve(&route, &QueryParams::parse(query)).err().unwrap();
            assert!(matches!(&err, DispatchError::MissingMethodParameter { param } if param == "op"));
        }
    }

    #[test]
    fn missing_method_parameter_loads_nothing() {
        let mut loader = MockModuleLoader::new();
        loader.expect_load().never();

        let resolver = resolver(loader, false);
        let route = Route::new("/sum").module("calc").method_param("op");

        assert!(resolver.resolve(&route, &QueryParams::default()).is_err());
    }

    #[test]
    fn unloadable_module_names_the_target() {
        let mut loader = MockModuleLoader::new();
        loader.expect_load().times(1).returning(|name| Err(LoadError::not_found(name)));

        let resolver = resolver(loader, false);
        let route = Route::new("/x").module("./does-not-exist");

        let err = resolver.resolve(&route, &QueryParams::default()).err().unwrap();
        assert!(matches!(&err, DispatchError::TargetUnresolvable { target, .. } if target == "./does-not-exist"));
    }

    #[test]
    fn module_is_loaded_on_every_request() {
        let resolver = resolver(loading_calc(3), false);
        let route = Route::new("/sum").module("calc").method("add");

        for _ in 0..3 {
            resolver.resolve(&route, &QueryParams::default()).unwrap();
        }
    }

    #[test]
    fn cached_module_is_loaded_once() {
        let resolver = resolver(loading_calc(1), true);
        let route = Route::new("/sum").module("calc").method("add");

        let first = resolver.resolve(&route, &QueryParams::default()).unwrap().endpoint.unwrap();
        let second = resolver.resolve(&route, &QueryParams::default()).unwrap().endpoint.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn load_failures_are_not_cached() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);

        let mut loader = MockModuleLoader::new();
        loader.expect_load().times(2).returning(move |name| match counter.fetch_add(1, Ordering::SeqCst) {
            0 => Err(LoadError::failed(name, "still compiling")),
            _ => Ok(calc()),
        });

        let resolver = resolver(loader, true);
        let route = Route::new("/sum").module("calc");

        assert!(resolver.resolve(&route, &QueryParams::default()).is_err());
        assert!(resolver.resolve(&route, &QueryParams::default()).is_ok());
        assert!(resolver.resolve(&route, &QueryParams::default()).is_ok());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn factory_runs_per_request_unless_cached() {
        for (cache, expected) in [(false, 3), (true, 1)] {
            let calls = Arc::new(AtomicUsize::new(0));
            let counter = Arc::clone(&calls);
            let route = Route::new("/f").factory(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(MethodTable::new())
            });

            let resolver = resolver(ModuleRegistry::new(), cache);
            for _ in 0..3 {
                assert!(resolver.resolve(&route, &QueryParams::default()).unwrap().endpoint.is_some());
            }
            assert_eq!(calls.load(Ordering::SeqCst), expected);
        }
    }

    #[test]
    fn empty_target_resolves_to_nothing() {
        let resolver = resolver(ModuleRegistry::new(), false);

        let no_target = Route::new("/none").method("fallback");
        let resolution = resolver.resolve(&no_target, &QueryParams::default()).unwrap();
        assert!(resolution.endpoint.is_none());
        assert!(matches!(resolution.method, MethodChoice::Named(_)));

        let empty_factory = Route::new("/empty").factory(|| None::<MethodTable>);
        let resolution = resolver.resolve(&empty_factory, &QueryParams::default()).unwrap();
        assert!(resolution.endpoint.is_none());
        assert!(matches!(resolution.method, MethodChoice::Direct));
    }
}
