//! Redaction of secret properties.

use super::{ConfigInterceptor, InterceptorContext, SecretAccess, priority, proceed_names};
use crate::core::ConfigValue;
use crate::names::PropertyName;
use crate::names::segments::unprofiled;
use std::collections::{BTreeSet, HashSet};

/// Redacts values of names matching the secret patterns unless the lookup
/// runs with [`SecretAccess::Unlocked`].
///
/// Patterns use wildcard name equality, so `db.*.password` covers every
/// datasource. A profiled spelling (`%dev.db.main.password`) is a secret when
/// its unprofiled name is.
#[derive(Debug, Clone, Default)]
pub struct SecretKeysInterceptor {
    secrets: HashSet<PropertyName>,
}

impl SecretKeysInterceptor {
    /// Treat names matching `patterns` as secrets.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            secrets: patterns.into_iter().map(PropertyName::new).collect(),
        }
    }

    /// Whether `name` is a secret.
    pub fn is_secret(&self, name: &str) -> bool {
        self.secrets.contains(&PropertyName::new(unprofiled(name)))
    }

    fn gate(&self, ctx: &InterceptorContext<'_>, value: ConfigValue) -> ConfigValue {
        if ctx.secret_access() == SecretAccess::Locked && self.is_secret(value.name()) {
            value.redacted()
        } else {
            value
        }
    }
}

impl ConfigInterceptor for SecretKeysInterceptor {
    fn name(&self) -> &str {
        "secret-keys"
    }

    fn priority(&self) -> i32 {
        priority::LIBRARY + 100
    }

    fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
        let value = ctx.proceed(name)?;
        if ctx.secret_access() == SecretAccess::Locked && self.is_secret(name) {
            return Some(value.redacted());
        }
        Some(value)
    }

    fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
        proceed_names(ctx)
    }

    fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
        ctx.iterate_values()
            .into_iter()
            .map(|value| self.gate(ctx, value))
            .collect()
    }
}
