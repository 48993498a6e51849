//! Configurations registered per caller-chosen scope.

use crate::core::Config;
use crate::error::Result;
use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

static NEXT_SCOPE: AtomicU64 = AtomicU64::new(1);

/// Opaque handle naming a scope, such as a plugin or a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

impl ScopeId {
    /// A handle distinct from every other handle created in this process.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_SCOPE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Configurations keyed by [`ScopeId`].
///
/// Reads are lock-free and see either the map before or after a concurrent
/// write, never a partial update.
///
/// # Examples
///
/// ```rust
/// use overlay_config::prelude::*;
/// use overlay_config::sources::MapSource;
///
/// # fn main() -> Result<()> {
/// let registry = ConfigRegistry::new();
/// let scope = ScopeId::new();
///
/// let config = registry.get_or_register_with(scope, || {
///     Config::builder()
///         .with_source(MapSource::new("plugin", [("name", "reports")]))
///         .build()
/// })?;
/// assert_eq!(config.get_value::<String>("name")?, "reports");
///
/// assert!(registry.release(scope).is_some());
/// assert!(registry.get(scope).is_none());
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ConfigRegistry {
    scopes: ArcSwap<HashMap<ScopeId, Arc<Config>>>,
}

impl ConfigRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration registered for `scope`.
    pub fn get(&self, scope: ScopeId) -> Option<Arc<Config>> {
        self.scopes.load().get(&scope).cloned()
    }

    /// Register `config` for `scope`, returning the configuration it replaces.
    pub fn register(&self, scope: ScopeId, config: Config) -> Option<Arc<Config>> {
        let config = Arc::new(config);
        let previous = self.scopes.rcu(|scopes| {
            let mut scopes = HashMap::clone(scopes);
            scopes.insert(scope, Arc::clone(&config));
            scopes
        });
        debug!(scope = scope.0, "registered configuration");
        previous.get(&scope).cloned()
    }

    /// The configuration for `scope`, building and registering it when absent.
    ///
    /// When two callers race, both may build, and the first registration wins.
    pub fn get_or_register_with<F>(&self, scope: ScopeId, build: F) -> Result<Arc<Config>>
    where
        F: FnOnce() -> Result<Config>,
    {
        if let Some(config) = self.get(scope) {
            return Ok(config);
        }
        let built = Arc::new(build()?);
        let previous = self.scopes.rcu(|scopes| {
            let mut scopes = HashMap::clone(scopes);
            scopes.entry(scope).or_insert_with(|| Arc::clone(&built));
            scopes
        });
        Ok(previous.get(&scope).cloned().unwrap_or(built))
    }

    /// Remove the configuration for `scope`.
    pub fn release(&self, scope: ScopeId) -> Option<Arc<Config>> {
        let previous = self.scopes.rcu(|scopes| {
            let mut scopes = HashMap::clone(scopes);
            scopes.remove(&scope);
            scopes
        });
        let released = previous.get(&scope).cloned();
        if released.is_some() {
            debug!(scope = scope.0, "released configuration");
        }
        released
    }

    /// Number of registered scopes.
    pub fn len(&self) -> usize {
        self.scopes.load().len()
    }

    /// Whether no scope is registered.
    pub fn is_empty(&self) -> bool {
        self.scopes.load().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MapSource;
    use std::thread;

    fn config(value: &str) -> Config {
        Config::builder()
            .with_source(MapSource::new("test", [("value", value)]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_scope_ids_are_distinct() {
        assert_ne!(ScopeId::new(), ScopeId::new());
    }

    #[test]
    fn test_register_returns_previous() {
        let registry = ConfigRegistry::new();
        let scope = ScopeId::new();
        assert!(registry.register(scope, config("a")).is_none());
        let previous = registry.register(scope, config("b")).unwrap();
        assert_eq!(previous.get_value::<String>("value").unwrap(), "a");
        assert_eq!(registry.get(scope).unwrap().get_value::<String>("value").unwrap(), "b");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_scopes_are_isolated() {
        let registry = ConfigRegistry::new();
        let (one, two) = (ScopeId::new(), ScopeId::new());
        registry.register(one, config("one"));
        registry.register(two, config("two"));
        registry.release(one);
        assert!(registry.get(one).is_none());
        assert_eq!(registry.get(two).unwrap().get_value::<String>("value").unwrap(), "two");
    }

    #[test]
    fn test_get_or_register_keeps_existing() {
        let registry = ConfigRegistry::new();
        let scope = ScopeId::new();
        registry.register(scope, config("first"));
        let config = registry
            .get_or_register_with(scope, || panic!("should not build"))
            .unwrap();
        assert_eq!(config.get_value::<String>("value").unwrap(), "first");
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(ConfigRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let scope = ScopeId::new();
                    registry.register(scope, config(&i.to_string()));
                    scope
                })
            })
            .collect();
        let scopes: Vec<ScopeId> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(registry.len(), 8);
        for scope in scopes {
            assert!(registry.get(scope).is_some());
        }
    }
}
