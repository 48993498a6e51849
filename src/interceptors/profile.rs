//! Profile overlays: `%dev.db.url` overrides `db.url` while `dev` is active.

use super::{ConfigInterceptor, InterceptorContext, priority, proceed_names};
use crate::core::ConfigValue;
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Comma-separated active profiles; later entries are more specific.
pub const PROFILE_PROPERTY: &str = "config.profile";

/// A single profile that every active profile inherits from.
pub const PROFILE_PARENT_PROPERTY: &str = "config.profile.parent";

/// Chain priority of the profile overlay.
pub const PROFILE_PRIORITY: i32 = priority::LIBRARY + 800;

/// Resolves names against their `%profile.` qualified spellings.
///
/// For a name `N` the active profiles are tried most specific first, and the
/// first `%p.N` found is compared with the plain `N`. The profiled value wins
/// unless the plain one comes from a strictly higher-precedence source.
/// Profiled values are reported under the plain name. Names qualified with
/// an inactive profile are iterated unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileInterceptor {
    profiles: Vec<String>,
    prefixes: Vec<String>,
}

impl ProfileInterceptor {
    /// Overlay the given profiles, most specific first.
    pub fn new(profiles: Vec<String>) -> Self {
        let prefixes = profiles.iter().map(|p| format!("%{}.", p)).collect();
        Self { profiles, prefixes }
    }

    /// Read the active profiles through `ctx`.
    ///
    /// `property` holds the comma-separated list.
    pub fn from_context(ctx: &InterceptorContext<'_>, property: &str, parent_property: &str) -> Self {
        let listed = ctx
            .proceed(property)
            .and_then(|value| value.value().map(str::to_string))
            .unwrap_or_default();
        Self::with_parent_from(ctx, parse_profiles(&listed, None), parent_property)
    }

    /// Overlay `listed`, most specific first, plus the parent read through `ctx`.
    ///
    /// The parent property is resolved with the listed profiles already
    /// applied, so `%dev.config.profile.parent` works.
    pub fn with_parent_from(ctx: &InterceptorContext<'_>, listed: Vec<String>, parent_property: &str) -> Self {
        let parent = Self::new(listed.clone())
            .get_value(ctx, parent_property)
            .and_then(|value| value.value().map(|v| v.trim().to_string()));
        Self::new(with_parent(listed, parent.as_deref()))
    }

    /// Active profiles, most specific first.
    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    fn strip<'n>(&self, name: &'n str) -> Option<&'n str> {
        self.prefixes
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix.as_str()))
    }
}

/// Parse a comma-separated profile list into most-specific-first order.
///
/// Later entries win, so `dev,local` yields `local, dev`. The parent, when
/// given, comes last.
///
/// ```rust
/// use overlay_config::interceptors::parse_profiles;
///
/// assert_eq!(parse_profiles("dev, local", Some("common")), vec!["local", "dev", "common"]);
/// assert!(parse_profiles("", None).is_empty());
/// ```
pub fn parse_profiles(value: &str, parent: Option<&str>) -> Vec<String> {
    let mut profiles: Vec<String> = Vec::new();
    for profile in value.split(',').rev().map(str::trim) {
        if !profile.is_empty() && !profiles.iter().any(|p| p == profile) {
            profiles.push(profile.to_string());
        }
    }
    with_parent(profiles, parent)
}

fn with_parent(mut profiles: Vec<String>, parent: Option<&str>) -> Vec<String> {
    if let Some(parent) = parent.map(str::trim).filter(|p| !p.is_empty()) {
        if !profiles.iter().any(|p| p == parent) {
            profiles.push(parent.to_string());
        }
    }
    profiles
}

impl ConfigInterceptor for ProfileInterceptor {
    fn name(&self) -> &str {
        "profile"
    }

    fn priority(&self) -> i32 {
        PROFILE_PRIORITY
    }

    fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
        if self.profiles.is_empty() || name.starts_with('%') {
            return ctx.proceed(name);
        }
        let profiled = self.profiles.iter().zip(&self.prefixes).find_map(|(profile, prefix)| {
            ctx.proceed(&format!("{}{}", prefix, name))
                .map(|value| value.with_name(name).with_profile(profile.as_str()))
        });
        let plain = ctx.proceed(name);
        match (profiled, plain) {
            (Some(profiled), Some(plain)) if plain.precedence_cmp(&profiled) == Ordering::Greater => {
                Some(plain)
            }
            (Some(profiled), _) => Some(profiled),
            (None, plain) => plain,
        }
    }

    fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
        proceed_names(ctx)
            .into_iter()
            .map(|name| {
                // names under inactive profiles are reported as they are
                let plain = self.strip(&name).map(str::to_string);
                plain.unwrap_or(name)
            })
            .collect()
    }

    fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
        self.iterate_names(ctx)
            .iter()
            .filter_map(|name| self.get_value(ctx, name))
            .collect()
    }
}
