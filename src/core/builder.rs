//! Builder for assembling a [`Config`] pipeline.

use crate::binding::ConfigMapping;
use crate::core::config::ConfigInner;
use crate::core::{Config, SourceRegistry};
use crate::error::{ConfigError, Result};
use crate::interceptors::{
    ConfigInterceptor, ExpressionInterceptor, FallbackInterceptor, InterceptorChain,
    InterceptorContext, LoggingInterceptor, PROFILE_PARENT_PROPERTY, PROFILE_PRIORITY,
    PROFILE_PROPERTY, ProfileInterceptor, RelocateInterceptor, SecretAccess, SecretKeysInterceptor,
    parse_profiles,
};
use crate::names::{KeyMap, NameMatcherIndex};
use crate::sources::{ConfigSource, DefaultValuesSource, EnvSource, FileSource};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Builder for a [`Config`] pipeline.
///
/// Provides a fluent interface over everything that goes into a pipeline:
/// sources, defaults, profiles, interceptors and mappings. Nothing is read
/// until [`build`](ConfigBuilder::build).
///
/// Sources are ranked by ordinal. Sources with equal ordinals rank in reverse
/// registration order, so a file added later overrides an earlier one.
///
/// # Examples
///
/// ```rust,no_run
/// use overlay_config::prelude::*;
///
/// # fn example() -> Result<()> {
/// let config = Config::builder()
///     .with_file("config/default.yaml")
///     .with_optional_file("config/local.yaml")
///     .with_env()
///     .with_default("server.port", "8080")
///     .with_secret_keys(["db.password"])
///     .build()?;
///
/// let port: u16 = config.get_value("server.port")?;
/// # Ok(())
/// # }
/// ```
pub struct ConfigBuilder {
    sources: Vec<Box<dyn ConfigSource>>,
    files: Vec<FileSource>,
    env: Option<EnvSource>,
    defaults: Vec<(String, String)>,
    profiles: Option<Vec<String>>,
    profile_property: String,
    interceptors: Vec<Arc<dyn ConfigInterceptor>>,
    relocations: HashMap<String, String>,
    fallbacks: HashMap<String, String>,
    secret_keys: Vec<String>,
    expressions: bool,
    mappings: Vec<ConfigMapping>,
    ignored: Vec<String>,
    validate_unknown: bool,
}

impl ConfigBuilder {
    /// Create a builder with no sources and expressions enabled.
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            files: Vec::new(),
            env: None,
            defaults: Vec::new(),
            profiles: None,
            profile_property: PROFILE_PROPERTY.to_string(),
            interceptors: Vec::new(),
            relocations: HashMap::new(),
            fallbacks: HashMap::new(),
            secret_keys: Vec::new(),
            expressions: true,
            mappings: Vec::new(),
            ignored: Vec::new(),
            validate_unknown: false,
        }
    }

    /// Add a configuration source.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use overlay_config::prelude::*;
    /// use overlay_config::sources::MapSource;
    ///
    /// let builder = Config::builder()
    ///     .with_source(MapSource::new("overrides", [("server.port", "9090")]).with_ordinal(400));
    /// ```
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Add several boxed sources, in registration order.
    pub fn with_sources<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn ConfigSource>>,
    {
        self.sources.extend(sources);
        self
    }

    /// Add a required file source with automatic format detection.
    ///
    /// Supported formats: YAML (.yaml, .yml), TOML (.toml), JSON (.json)
    ///
    /// Files are loaded when the pipeline is built. A file that is missing or
    /// cannot be parsed fails the build.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(FileSource::new(path));
        self
    }

    /// Add a file source that is skipped when the file does not exist.
    pub fn with_optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(FileSource::new(path).required(false));
        self
    }

    /// Add a configured file source.
    pub fn with_file_source(mut self, source: FileSource) -> Self {
        self.files.push(source);
        self
    }

    /// Add a snapshot of the process environment (ordinal 300).
    pub fn with_env(self) -> Self {
        self.with_env_source(EnvSource::new())
    }

    /// Add a configured environment source, replacing any previous one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use overlay_config::prelude::*;
    /// use overlay_config::sources::EnvSource;
    ///
    /// // APP_SERVER_PORT=8080 -> server.port = 8080
    /// let builder = Config::builder().with_env_source(EnvSource::new().with_prefix("APP"));
    /// ```
    pub fn with_env_source(mut self, source: EnvSource) -> Self {
        self.env = Some(source);
        self
    }

    /// Add a default value. `name` may contain `*` and `[*]` wildcards.
    ///
    /// Defaults rank below every source. The first default given for a name
    /// wins.
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.push((name.into(), value.into()));
        self
    }

    /// Add several default values.
    pub fn with_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults
            .extend(defaults.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Activate `profile` in addition to those already given.
    ///
    /// Profiles given here replace the profile property. Later profiles are
    /// more specific.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profiles.get_or_insert_with(Vec::new).push(profile.into());
        self
    }

    /// Activate `profiles`, later ones more specific.
    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles
            .get_or_insert_with(Vec::new)
            .extend(profiles.into_iter().map(Into::into));
        self
    }

    /// Read the active profiles from `property` instead of `config.profile`.
    pub fn with_profile_property(mut self, property: impl Into<String>) -> Self {
        self.profile_property = property.into();
        self
    }

    /// Add a custom interceptor.
    pub fn with_interceptor<I: ConfigInterceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Read `old` through the new name `new`, falling back to `old`.
    pub fn with_relocation(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.relocations.insert(old.into(), new.into());
        self
    }

    /// Relocate names through a function returning the new name.
    pub fn with_relocations<F>(self, mapping: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.with_interceptor(RelocateInterceptor::new(mapping))
    }

    /// Read `fallback` whenever `name` is not defined.
    pub fn with_fallback(mut self, name: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.fallbacks.insert(name.into(), fallback.into());
        self
    }

    /// Fall back through a function returning the fallback name.
    pub fn with_fallbacks<F>(self, mapping: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.with_interceptor(FallbackInterceptor::new(mapping))
    }

    /// Mark names matching `patterns` as secret.
    ///
    /// Secret values are only returned by a handle from
    /// [`Config::unlocked`](crate::core::Config::unlocked).
    pub fn with_secret_keys<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secret_keys.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Enable or disable `${...}` expansion. Enabled by default.
    pub fn with_expressions(mut self, enabled: bool) -> Self {
        self.expressions = enabled;
        self
    }

    /// Register a mapping.
    ///
    /// Its defaults join the defaults source and its names are used to
    /// reconcile environment variables and to validate unknown properties.
    pub fn with_mapping(mut self, mapping: ConfigMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Exclude a path from unknown-property validation.
    ///
    /// A trailing `**` excludes everything beneath the path.
    pub fn with_ignored_path(mut self, path: impl Into<String>) -> Self {
        self.ignored.push(path.into());
        self
    }

    /// Fail the build when a source defines names under a mapping prefix
    /// that the mapping does not declare.
    pub fn with_unknown_property_validation(mut self, enabled: bool) -> Self {
        self.validate_unknown = enabled;
        self
    }

    /// Assemble the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A file source cannot be loaded
    /// - Unknown-property validation is enabled and finds undeclared names
    pub fn build(self) -> Result<Config> {
        let mut sources = self.sources;
        for file in &self.files {
            sources.push(Box::new(file.load()?));
        }
        if let Some(env) = self.env {
            sources.push(Box::new(env));
        }

        let mut defaults = KeyMap::new();
        let mapping_defaults = self.mappings.iter().flat_map(ConfigMapping::defaults);
        for (path, value) in self.defaults.into_iter().chain(mapping_defaults) {
            let node = defaults.find_or_add(&path);
            if node.root_value().is_none() {
                node.put_root_value(value);
            }
        }
        sources.push(Box::new(DefaultValuesSource::new(defaults)));

        let declared: Vec<String> = self
            .mappings
            .iter()
            .flat_map(ConfigMapping::declared_names)
            .collect();
        if !declared.is_empty() {
            for source in sources.iter_mut() {
                source.reconcile(&declared);
            }
        }
        let registry = SourceRegistry::new(sources);

        let mut interceptors = self.interceptors;
        interceptors.push(Arc::new(LoggingInterceptor::new()));
        if self.expressions {
            interceptors.push(Arc::new(ExpressionInterceptor::new()));
        }
        if !self.secret_keys.is_empty() {
            interceptors.push(Arc::new(SecretKeysInterceptor::new(self.secret_keys)));
        }
        if !self.relocations.is_empty() {
            interceptors.push(Arc::new(RelocateInterceptor::from_map(self.relocations)));
        }
        if !self.fallbacks.is_empty() {
            interceptors.push(Arc::new(FallbackInterceptor::from_map(self.fallbacks)));
        }
        let chain = InterceptorChain::new(interceptors);

        let profile = {
            let inner = chain.inner_than(PROFILE_PRIORITY);
            let ctx = InterceptorContext::new(inner, &registry, SecretAccess::Locked);
            match self.profiles {
                Some(listed) => ProfileInterceptor::with_parent_from(
                    &ctx,
                    parse_profiles(&listed.join(","), None),
                    PROFILE_PARENT_PROPERTY,
                ),
                None => ProfileInterceptor::from_context(&ctx, &self.profile_property, PROFILE_PARENT_PROPERTY),
            }
        };
        let profiles = profile.profiles().to_vec();
        let chain = chain.with(Arc::new(profile));

        let mut ignored = KeyMap::new();
        for path in &self.ignored {
            ignored.find_or_add(path).put_root_value(true);
        }
        let declared = NameMatcherIndex::new(declared);

        info!(
            sources = registry.sources().len(),
            interceptors = ?chain.names(),
            profiles = ?profiles,
            mappings = self.mappings.len(),
            "configuration built"
        );

        let config = Config::new(ConfigInner {
            registry,
            chain,
            profiles,
            mappings: self.mappings,
            declared,
            ignored,
        });

        if self.validate_unknown {
            let unknown = config.unknown_properties();
            if !unknown.is_empty() {
                debug!(unknown = ?unknown, "undeclared properties under mapping prefixes");
                return Err(ConfigError::UnknownProperties(unknown));
            }
        }
        Ok(config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigValue;
    use crate::interceptors::{proceed_names, proceed_values};
    use crate::sources::MapSource;
    use std::collections::BTreeSet;

    #[test]
    fn test_builder_accumulates_files() {
        let builder = ConfigBuilder::new()
            .with_file("config1.yaml")
            .with_file("config2.yaml")
            .with_optional_file("config3.yaml");

        assert_eq!(builder.files.len(), 3);
    }

    #[test]
    fn test_missing_required_file_fails() {
        let result = ConfigBuilder::new().with_file("/nonexistent/config.yaml").build();
        assert!(matches!(result, Err(ConfigError::LoadError { .. })));
    }

    #[test]
    fn test_missing_optional_file_is_skipped() {
        let config = ConfigBuilder::new()
            .with_optional_file("/nonexistent/config.yaml")
            .build()
            .unwrap();
        assert!(config.property_names().is_empty());
    }

    #[test]
    fn test_defaults_rank_last() {
        let config = ConfigBuilder::new()
            .with_source(MapSource::new("app", [("a", "source")]))
            .with_default("a", "default")
            .with_default("b.*", "wild")
            .with_default("b.*", "ignored")
            .build()
            .unwrap();
        assert_eq!(config.get_value::<String>("a").unwrap(), "source");
        assert_eq!(config.get_value::<String>("b.anything").unwrap(), "wild");
    }

    #[test]
    fn test_profile_from_property() {
        let config = ConfigBuilder::new()
            .with_source(MapSource::new("app", [
                ("config.profile", "dev"),
                ("%dev.x", "1"),
                ("x", "2"),
            ]))
            .build()
            .unwrap();
        assert_eq!(config.profiles(), &["dev"]);
        assert_eq!(config.get_value::<u32>("x").unwrap(), 1);
    }

    #[test]
    fn test_explicit_profiles_replace_property() {
        let config = ConfigBuilder::new()
            .with_source(MapSource::new("app", [
                ("config.profile", "dev"),
                ("%prod.x", "prod"),
                ("%test.x", "test"),
            ]))
            .with_profiles(["prod", "test"])
            .build()
            .unwrap();
        assert_eq!(config.profiles(), &["test", "prod"]);
        assert_eq!(config.get_value::<String>("x").unwrap(), "test");
    }

    struct ProfileSupplier {
        priority: i32,
    }

    impl ConfigInterceptor for ProfileSupplier {
        fn name(&self) -> &str {
            "profile-supplier"
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
            if name == PROFILE_PROPERTY {
                return Some(ConfigValue::new(name, "dev"));
            }
            ctx.proceed(name)
        }

        fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
            proceed_names(ctx)
        }

        fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
            proceed_values(ctx)
        }
    }

    #[test]
    fn test_profiles_resolved_below_profile_priority() {
        let build = |priority: i32| {
            ConfigBuilder::new()
                .with_source(MapSource::new("app", [("%dev.x", "1"), ("x", "2")]))
                .with_interceptor(ProfileSupplier { priority })
                .build()
                .unwrap()
        };

        let inner = build(PROFILE_PRIORITY - 1);
        assert_eq!(inner.profiles(), &["dev"]);
        assert_eq!(inner.get_value::<u32>("x").unwrap(), 1);

        let outer = build(PROFILE_PRIORITY + 1);
        assert!(outer.profiles().is_empty());
        assert_eq!(outer.get_value::<u32>("x").unwrap(), 2);
    }

    #[test]
    fn test_custom_profile_property() {
        let config = ConfigBuilder::new()
            .with_source(MapSource::new("app", [("app.profile", "qa"), ("%qa.x", "1")]))
            .with_profile_property("app.profile")
            .build()
            .unwrap();
        assert_eq!(config.profiles(), &["qa"]);
        assert_eq!(config.get_value::<u32>("x").unwrap(), 1);
    }

    #[test]
    fn test_expressions_can_be_disabled() {
        let config = ConfigBuilder::new()
            .with_source(MapSource::new("app", [("a", "${b}"), ("b", "1")]))
            .with_expressions(false)
            .build()
            .unwrap();
        assert_eq!(config.get_value::<String>("a").unwrap(), "${b}");
    }

    #[test]
    fn test_relocation_and_fallback() {
        let config = ConfigBuilder::new()
            .with_source(MapSource::new("app", [("new.name", "relocated"), ("old.timeout", "5")]))
            .with_relocation("old.name", "new.name")
            .with_fallback("new.timeout", "old.timeout")
            .build()
            .unwrap();
        assert_eq!(config.get_value::<String>("old.name").unwrap(), "relocated");
        assert_eq!(config.get_value::<u32>("new.timeout").unwrap(), 5);
    }

    #[test]
    fn test_secret_keys() {
        let config = ConfigBuilder::new()
            .with_source(MapSource::new("app", [("db.password", "hunter2")]))
            .with_secret_keys(["db.password"])
            .build()
            .unwrap();
        assert!(matches!(
            config.get_value::<String>("db.password"),
            Err(ConfigError::SecretAccessDenied(_))
        ));
        assert_eq!(config.unlocked().get_value::<String>("db.password").unwrap(), "hunter2");
    }

    #[test]
    fn test_unknown_property_validation() {
        let mapping = ConfigMapping::builder("server").leaf("host").build();
        let result = ConfigBuilder::new()
            .with_source(MapSource::new("app", [
                ("server.host", "localhost"),
                ("server.hots", "typo"),
                ("server.legacy.a", "1"),
                ("other.x", "1"),
            ]))
            .with_mapping(mapping)
            .with_ignored_path("server.legacy.**")
            .with_unknown_property_validation(true)
            .build();
        match result {
            Err(ConfigError::UnknownProperties(names)) => assert_eq!(names, vec!["server.hots"]),
            other => panic!("expected unknown properties, got {:?}", other),
        }
    }
}
