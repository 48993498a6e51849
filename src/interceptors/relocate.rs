//! Renamed properties: relocations and fallbacks.

use super::{ConfigInterceptor, InterceptorContext, priority, proceed_names, proceed_values};
use crate::core::ConfigValue;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// Maps a property name to another name, or to nothing.
pub type NameMapping = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

fn from_map(map: HashMap<String, String>) -> NameMapping {
    Arc::new(move |name: &str| map.get(name).cloned())
}

/// Reads a property from its new name first and its old name second.
///
/// The mapping goes from the name being looked up to its relocated name.
/// Iteration reports both names.
///
/// # Examples
///
/// ```rust
/// use overlay_config::interceptors::RelocateInterceptor;
/// use std::collections::HashMap;
///
/// let relocate = RelocateInterceptor::from_map(HashMap::from([(
///     "http.port".to_string(),
///     "server.http.port".to_string(),
/// )]));
/// ```
#[derive(Clone)]
pub struct RelocateInterceptor {
    mapping: NameMapping,
}

impl RelocateInterceptor {
    /// Relocate names through `mapping`.
    pub fn new<F>(mapping: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            mapping: Arc::new(mapping),
        }
    }

    /// Relocate names through a fixed `old -> new` table.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self {
            mapping: from_map(map),
        }
    }

    fn relocated(&self, name: &str) -> Option<String> {
        (self.mapping)(name).filter(|relocated| relocated != name)
    }
}

impl fmt::Debug for RelocateInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelocateInterceptor").finish_non_exhaustive()
    }
}

impl ConfigInterceptor for RelocateInterceptor {
    fn name(&self) -> &str {
        "relocate"
    }

    fn priority(&self) -> i32 {
        priority::LIBRARY + 1000
    }

    fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
        self.relocated(name)
            .and_then(|relocated| ctx.proceed(&relocated))
            .or_else(|| ctx.proceed(name))
    }

    fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for name in proceed_names(ctx) {
            if let Some(relocated) = self.relocated(&name) {
                names.insert(relocated);
            }
            names.insert(name);
        }
        names
    }

    fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
        proceed_values(ctx)
    }
}

/// Reads a fallback name when a property is not defined.
#[derive(Clone)]
pub struct FallbackInterceptor {
    mapping: NameMapping,
}

impl FallbackInterceptor {
    /// Fall back through `mapping`.
    pub fn new<F>(mapping: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            mapping: Arc::new(mapping),
        }
    }

    /// Fall back through a fixed `name -> fallback` table.
    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self {
            mapping: from_map(map),
        }
    }
}

impl fmt::Debug for FallbackInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackInterceptor").finish_non_exhaustive()
    }
}

impl ConfigInterceptor for FallbackInterceptor {
    fn name(&self) -> &str {
        "fallback"
    }

    fn priority(&self) -> i32 {
        priority::LIBRARY + 600
    }

    fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
        ctx.proceed(name).or_else(|| {
            let fallback = (self.mapping)(name).filter(|fallback| fallback != name)?;
            ctx.proceed(&fallback)
        })
    }

    fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
        proceed_names(ctx)
    }

    fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
        proceed_values(ctx)
    }
}
