//! Resolution of module targets.
//!
//! A route whose target is [`crate::Target::Module`] names its endpoint instead of
//! holding it. The router asks its [`ModuleLoader`] for that name when the route is
//! dispatched. [`ModuleRegistry`] is the in-process loader every router starts with.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::Endpoint;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module `{name}` is not registered")]
    NotFound { name: String },

    #[error("module `{name}` failed to load: {reason}")]
    Failed { name: String, reason: String },
}

impl LoadError {
    pub fn not_found<S: ToString>(name: S) -> Self {
        Self::NotFound { name: name.to_string() }
    }

    pub fn failed<S: ToString, R: ToString>(name: S, reason: R) -> Self {
        Self::Failed { name: name.to_string(), reason: reason.to_string() }
    }
}

/// Turns a module name into an endpoint.
///
/// Called on every dispatch of a module route unless the router caches resolved
/// targets; a loader may keep its own cache.
#[cfg_attr(test, mockall::automock)]
pub trait ModuleLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<Arc<dyn Endpoint>, LoadError>;
}

/// A fixed name to endpoint map.
#[derive(Default, Clone)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn Endpoint>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(mut self, name: impl Into<String>, endpoint: impl Endpoint + 'static) -> Self {
        self.modules.insert(name.into(), Arc::new(endpoint));
        self
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.modules.keys()).finish()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&self, name: &str) -> Result<Arc<dyn Endpoint>, LoadError> {
        self.modules.get(name).cloned().ok_or_else(|| LoadError::not_found(name))
    }
}
