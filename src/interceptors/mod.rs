//! The interceptor chain wrapped around the source registry.
//!
//! A lookup enters the outermost interceptor first. Each interceptor either
//! answers itself or calls [`InterceptorContext::proceed`] to reach the next
//! inward stage, ultimately the [`SourceRegistry`]. Interceptors may rewrite
//! the name on the way in and the value on the way out.
//!
//! # Priorities
//!
//! Higher priorities run further out. Interceptors with equal priority keep
//! their registration order. Built-ins sit in the library band:
//!
//! | Interceptor | Priority |
//! |---|---|
//! | [`RelocateInterceptor`] | `LIBRARY + 1000` |
//! | [`ExpressionInterceptor`] | `LIBRARY + 900` |
//! | [`ProfileInterceptor`] | `LIBRARY + 800` |
//! | [`FallbackInterceptor`] | `LIBRARY + 600` |
//! | [`LoggingInterceptor`] | `LIBRARY + 200` |
//! | [`SecretKeysInterceptor`] | `LIBRARY + 100` |

mod expression;
mod logging;
mod profile;
mod relocate;
mod secret;

pub use expression::{ExpressionInterceptor, MAX_DEPTH};
pub use logging::LoggingInterceptor;
pub use profile::{
    PROFILE_PARENT_PROPERTY, PROFILE_PRIORITY, PROFILE_PROPERTY, ProfileInterceptor, parse_profiles,
};
pub use relocate::{FallbackInterceptor, NameMapping, RelocateInterceptor};
pub use secret::SecretKeysInterceptor;

use crate::core::{ConfigValue, SourceRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Priority bands.
pub mod priority {
    /// Interceptors provided by the platform.
    pub const PLATFORM: i32 = 1000;
    /// Interceptors provided by libraries, the built-ins included.
    pub const LIBRARY: i32 = 3000;
    /// Interceptors provided by the application. The default for custom ones.
    pub const APPLICATION: i32 = 5000;
}

/// A stage of the resolution pipeline.
///
/// Every method is required. Stages that do not change iteration delegate to
/// [`proceed_names`] and [`proceed_values`].
pub trait ConfigInterceptor: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Position in the chain; higher runs further out.
    fn priority(&self) -> i32;

    /// Resolve `name`, usually by calling `ctx.proceed`.
    fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue>;

    /// Names visible at this stage.
    fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String>;

    /// Values visible at this stage.
    fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue>;
}

/// Passthrough iteration of names.
pub fn proceed_names(ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
    ctx.iterate_names()
}

/// Passthrough iteration of values.
pub fn proceed_values(ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
    ctx.iterate_values()
}

/// Whether secret properties may be read by a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretAccess {
    /// Secret values are redacted.
    #[default]
    Locked,
    /// Secret values are returned.
    Unlocked,
}

/// The remainder of the chain, as seen by one interceptor.
#[derive(Clone, Copy)]
pub struct InterceptorContext<'a> {
    chain: &'a [Arc<dyn ConfigInterceptor>],
    registry: &'a SourceRegistry,
    access: SecretAccess,
}

impl<'a> InterceptorContext<'a> {
    /// A context over `chain`, outermost first, ending in `registry`.
    pub fn new(
        chain: &'a [Arc<dyn ConfigInterceptor>],
        registry: &'a SourceRegistry,
        access: SecretAccess,
    ) -> Self {
        Self {
            chain,
            registry,
            access,
        }
    }

    /// Hand `name` to the next inward stage.
    pub fn proceed(&self, name: &str) -> Option<ConfigValue> {
        match self.chain.split_first() {
            Some((next, rest)) => next.get_value(&self.with_chain(rest), name),
            None => self.registry.resolve(name),
        }
    }

    /// Names visible to the next inward stage.
    pub fn iterate_names(&self) -> BTreeSet<String> {
        match self.chain.split_first() {
            Some((next, rest)) => next.iterate_names(&self.with_chain(rest)),
            None => self.registry.property_names(),
        }
    }

    /// Values visible to the next inward stage.
    pub fn iterate_values(&self) -> Vec<ConfigValue> {
        match self.chain.split_first() {
            Some((next, rest)) => next.iterate_values(&self.with_chain(rest)),
            None => self.registry.values(),
        }
    }

    /// Secret access of the current lookup.
    pub fn secret_access(&self) -> SecretAccess {
        self.access
    }

    /// The same position in the chain with secrets locked.
    pub fn locked(&self) -> Self {
        Self {
            access: SecretAccess::Locked,
            ..*self
        }
    }

    fn with_chain(&self, chain: &'a [Arc<dyn ConfigInterceptor>]) -> Self {
        Self { chain, ..*self }
    }
}

/// Interceptors ordered outermost first.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn ConfigInterceptor>>,
}

impl InterceptorChain {
    /// Order `interceptors` by priority, highest first, ties in given order.
    pub fn new(mut interceptors: Vec<Arc<dyn ConfigInterceptor>>) -> Self {
        interceptors.sort_by_key(|interceptor| std::cmp::Reverse(interceptor.priority()));
        Self { interceptors }
    }

    /// Insert `interceptor` after every interceptor of equal or higher priority.
    pub fn with(mut self, interceptor: Arc<dyn ConfigInterceptor>) -> Self {
        let at = self.outer_len(interceptor.priority());
        self.interceptors.insert(at, interceptor);
        self
    }

    /// Interceptors running inside the given priority.
    pub fn inner_than(&self, priority: i32) -> &[Arc<dyn ConfigInterceptor>] {
        &self.interceptors[self.outer_len(priority)..]
    }

    fn outer_len(&self, priority: i32) -> usize {
        self.interceptors
            .iter()
            .take_while(|interceptor| interceptor.priority() >= priority)
            .count()
    }

    /// A context over the whole chain.
    pub fn context<'a>(
        &'a self,
        registry: &'a SourceRegistry,
        access: SecretAccess,
    ) -> InterceptorContext<'a> {
        InterceptorContext::new(&self.interceptors, registry, access)
    }

    /// Interceptor names, outermost first.
    pub fn names(&self) -> Vec<&str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    /// Number of interceptors.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Whether the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sources::{ConfigSource, MapSource};

    /// Upper-cases values and records its name in iteration.
    pub(crate) struct Shout {
        pub(crate) priority: i32,
    }

    impl ConfigInterceptor for Shout {
        fn name(&self) -> &str {
            "shout"
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
            let value = ctx.proceed(name)?;
            let upper = value.value().map(str::to_uppercase);
            Some(value.with_value(upper))
        }

        fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
            let mut names = proceed_names(ctx);
            names.insert("shout.enabled".to_string());
            names
        }

        fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
            proceed_values(ctx)
        }
    }

    /// Answers every lookup itself.
    struct Constant;

    impl ConfigInterceptor for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn priority(&self) -> i32 {
            priority::APPLICATION
        }

        fn get_value(&self, _ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
            Some(ConfigValue::new(name, "constant"))
        }

        fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
            proceed_names(ctx)
        }

        fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
            proceed_values(ctx)
        }
    }

    pub(crate) fn registry(pairs: &[(&str, &str)]) -> SourceRegistry {
        let source: Box<dyn ConfigSource> = Box::new(MapSource::new("test", pairs.iter().copied()));
        SourceRegistry::new(vec![source])
    }

    #[test]
    fn test_proceed_reaches_registry() {
        let registry = registry(&[("a", "x")]);
        let chain = InterceptorChain::new(vec![Arc::new(Shout { priority: 1 })]);
        let ctx = chain.context(&registry, SecretAccess::Locked);
        assert_eq!(ctx.proceed("a").unwrap().value(), Some("X"));
        assert!(ctx.proceed("b").is_none());
    }

    #[test]
    fn test_short_circuit() {
        let registry = registry(&[("a", "x")]);
        let chain = InterceptorChain::new(vec![
            Arc::new(Shout { priority: priority::LIBRARY }),
            Arc::new(Constant),
        ]);
        // Constant runs outermost and never proceeds
        assert_eq!(chain.names(), vec!["constant", "shout"]);
        let ctx = chain.context(&registry, SecretAccess::Locked);
        assert_eq!(ctx.proceed("a").unwrap().value(), Some("constant"));
    }

    #[test]
    fn test_synthetic_names() {
        let registry = registry(&[("a", "x")]);
        let chain = InterceptorChain::new(vec![Arc::new(Shout { priority: 1 })]);
        let names = chain.context(&registry, SecretAccess::Locked).iterate_names();
        assert!(names.contains("a"));
        assert!(names.contains("shout.enabled"));
    }

    #[test]
    fn test_insert_and_inner_slice() {
        let chain = InterceptorChain::new(vec![
            Arc::new(Shout { priority: 10 }),
            Arc::new(Shout { priority: 30 }),
        ])
        .with(Arc::new(Shout { priority: 20 }));
        let priorities: Vec<i32> = chain.interceptors.iter().map(|i| i.priority()).collect();
        assert_eq!(priorities, vec![30, 20, 10]);
        assert_eq!(chain.inner_than(20).len(), 1);
        assert_eq!(chain.inner_than(100).len(), 3);
    }

    #[test]
    fn test_locked_context() {
        let registry = registry(&[]);
        let chain = InterceptorChain::default();
        let ctx = chain.context(&registry, SecretAccess::Unlocked);
        assert_eq!(ctx.locked().secret_access(), SecretAccess::Locked);
        assert_eq!(ctx.secret_access(), SecretAccess::Unlocked);
    }
}
