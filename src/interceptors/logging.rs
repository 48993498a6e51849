//! Tracing of every lookup.

use super::{ConfigInterceptor, InterceptorContext, SecretAccess, priority, proceed_names, proceed_values};
use crate::core::{ConfigValue, Problem};
use std::collections::BTreeSet;
use tracing::{Level, debug, enabled, trace};

const REDACTED: &str = "<redacted>";

/// Emits a `debug!` event per resolved lookup and a `trace!` event per miss.
///
/// Values of secret properties are never logged. When a lookup runs unlocked,
/// the same name is resolved again with secrets locked to find out whether it
/// is a secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor;

impl LoggingInterceptor {
    /// Create the interceptor.
    pub fn new() -> Self {
        Self
    }
}

fn is_redacted(value: &ConfigValue) -> bool {
    value.problems().contains(&Problem::SecretAccessDenied)
}

impl ConfigInterceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        "logging"
    }

    fn priority(&self) -> i32 {
        priority::LIBRARY + 200
    }

    fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
        let value = ctx.proceed(name);
        if !enabled!(Level::DEBUG) {
            return value;
        }
        match &value {
            Some(found) => {
                let secret = is_redacted(found)
                    || (ctx.secret_access() == SecretAccess::Unlocked
                        && ctx.locked().proceed(name).is_some_and(|locked| is_redacted(&locked)));
                let shown = if secret {
                    REDACTED
                } else {
                    found.value().unwrap_or_default()
                };
                debug!(
                    name,
                    value = shown,
                    location = %found.location(),
                    profile = found.profile(),
                    "resolved configuration property"
                );
            }
            None => trace!(name, "configuration property not found"),
        }
        value
    }

    fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
        proceed_names(ctx)
    }

    fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
        proceed_values(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptors::tests::registry;
    use crate::interceptors::{InterceptorChain, SecretKeysInterceptor};
    use std::sync::Arc;

    #[test]
    fn test_passthrough() {
        let registry = registry(&[("a", "1"), ("token", "t")]);
        let chain = InterceptorChain::new(vec![
            Arc::new(LoggingInterceptor::new()),
            Arc::new(SecretKeysInterceptor::new(["token"])),
        ]);
        assert_eq!(chain.names(), vec!["logging", "secret-keys"]);

        let ctx = chain.context(&registry, SecretAccess::Unlocked);
        assert_eq!(ctx.proceed("a").unwrap().value(), Some("1"));
        assert_eq!(ctx.proceed("token").unwrap().value(), Some("t"));
        assert!(ctx.proceed("b").is_none());
    }

    #[test]
    fn test_redaction_detection() {
        let redacted = ConfigValue::new("token", "t").redacted();
        assert!(is_redacted(&redacted));
        assert!(!is_redacted(&ConfigValue::new("a", "1")));
    }
}
