//! The assembled configuration and its typed accessors.

use crate::binding::{ConfigMapping, materialize};
use crate::core::{ConfigBuilder, ConfigValue, Problem, RankedSource, SourceRegistry};
use crate::error::{ConfigError, Result};
use crate::interceptors::{InterceptorChain, InterceptorContext, SecretAccess};
use crate::names::segments::unprofiled;
use crate::names::{KeyMap, NameMatcherIndex};
use crate::structure::{ListMembers, MapMembers, decode_list, decode_map, split_list};
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "validation")]
use crate::core::Validate;

/// Everything a built pipeline shares between its handles.
pub(crate) struct ConfigInner {
    pub(crate) registry: SourceRegistry,
    pub(crate) chain: InterceptorChain,
    pub(crate) profiles: Vec<String>,
    pub(crate) mappings: Vec<ConfigMapping>,
    pub(crate) declared: NameMatcherIndex,
    pub(crate) ignored: KeyMap<bool>,
}

/// A built configuration pipeline.
///
/// `Config` is cheap to clone and safe to share between threads: every lookup
/// walks the immutable interceptor chain and allocates its own result.
///
/// Lookups come in two flavors. [`get_config_value`](Config::get_config_value)
/// returns whatever the chain produced, problems included. The typed accessors
/// turn absence into [`ConfigError::NotFound`], problems into errors and
/// conversion failures into [`ConfigError::ConversionError`]. For typed
/// accessors an empty value counts as absent.
///
/// # Examples
///
/// ```rust
/// use overlay_config::prelude::*;
/// use overlay_config::sources::MapSource;
///
/// # fn main() -> Result<()> {
/// let config = Config::builder()
///     .with_source(MapSource::new("app", [
///         ("server.port", "8080"),
///         ("server.hosts", "a.example,b.example"),
///         ("greeting", "listening on ${server.port}"),
///     ]))
///     .build()?;
///
/// assert_eq!(config.get_value::<u16>("server.port")?, 8080);
/// assert_eq!(config.get_values::<String>("server.hosts")?.len(), 2);
/// assert_eq!(config.get_value::<String>("greeting")?, "listening on 8080");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Config {
    inner: Arc<ConfigInner>,
    access: SecretAccess,
}

impl Config {
    /// Start assembling a pipeline.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub(crate) fn new(inner: ConfigInner) -> Self {
        Self {
            inner: Arc::new(inner),
            access: SecretAccess::Locked,
        }
    }

    /// A handle on the same pipeline that may read secret properties.
    pub fn unlocked(&self) -> Config {
        Self {
            inner: Arc::clone(&self.inner),
            access: SecretAccess::Unlocked,
        }
    }

    /// Secret access of this handle.
    pub fn secret_access(&self) -> SecretAccess {
        self.access
    }

    fn context(&self) -> InterceptorContext<'_> {
        self.inner.chain.context(&self.inner.registry, self.access)
    }

    /// The value of `name` as produced by the chain, problems included.
    pub fn get_config_value(&self, name: &str) -> Option<ConfigValue> {
        self.context().proceed(name)
    }

    /// The value of `name`, failing on recorded problems.
    pub(crate) fn checked_value(&self, name: &str) -> Result<Option<ConfigValue>> {
        let Some(value) = self.get_config_value(name) else {
            return Ok(None);
        };
        match value.problems().first() {
            None => Ok(Some(value)),
            Some(Problem::SecretAccessDenied) => Err(ConfigError::SecretAccessDenied(name.to_string())),
            Some(problem) => Err(ConfigError::ExpressionError {
                name: name.to_string(),
                reason: problem.to_string(),
            }),
        }
    }

    /// The processed value of `name`. An empty value is returned as such.
    pub fn get_raw_value(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .checked_value(name)?
            .and_then(|value| value.value().map(str::to_string)))
    }

    fn non_empty(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get_raw_value(name)?.filter(|value| !value.is_empty()))
    }

    /// Convert the value of `name` with [`FromStr`].
    pub fn get_value<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get_value_with(name, str::parse::<T>)
    }

    /// Convert the value of `name` with `convert`.
    pub fn get_value_with<T, E, F>(&self, name: &str, convert: F) -> Result<T>
    where
        E: fmt::Display,
        F: Fn(&str) -> std::result::Result<T, E>,
    {
        self.get_optional_value_with(name, convert)?
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    /// Like [`get_value`](Config::get_value), with absence as `None`.
    pub fn get_optional_value<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get_optional_value_with(name, str::parse::<T>)
    }

    /// Like [`get_value_with`](Config::get_value_with), with absence as `None`.
    pub fn get_optional_value_with<T, E, F>(&self, name: &str, convert: F) -> Result<Option<T>>
    where
        E: fmt::Display,
        F: Fn(&str) -> std::result::Result<T, E>,
    {
        self.non_empty(name)?
            .map(|raw| converted(name, &raw, &convert))
            .transpose()
    }

    /// The list at `name`, from either `name[N]` members or a comma-separated value.
    pub fn get_values<T>(&self, name: &str) -> Result<Vec<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get_optional_values(name)?
            .ok_or_else(|| ConfigError::NotFound(name.to_string()))
    }

    /// Like [`get_values`](Config::get_values), with an empty list as `None`.
    pub fn get_optional_values<T>(&self, name: &str) -> Result<Option<Vec<T>>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let names = self.property_names();
        let members = decode_list(name, names.iter().map(String::as_str), |n| {
            self.get_config_value(n)
        });
        let values = match members {
            ListMembers::Indexed(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in &elements {
                    if let Some(value) = self.get_optional_value::<T>(element)? {
                        values.push(value);
                    }
                }
                values
            }
            ListMembers::Inline { .. } => self.inline_items(name)?,
        };
        Ok((!values.is_empty()).then_some(values))
    }

    fn inline_items<T>(&self, name: &str) -> Result<Vec<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.get_raw_value(name)?.unwrap_or_default();
        split_list(&raw)
            .iter()
            .map(|item| converted(name, item, &str::parse::<T>))
            .collect()
    }

    /// The map at `name`, from either `name.key` members or a `k=v;k=v` value.
    pub fn get_map<K, V>(&self, name: &str) -> Result<BTreeMap<K, V>>
    where
        K: FromStr + Ord,
        K::Err: fmt::Display,
        V: FromStr,
        V::Err: fmt::Display,
    {
        let names = self.property_names();
        let members = decode_map(name, names.iter().map(String::as_str), |n| {
            self.get_config_value(n)
        });
        let mut map = BTreeMap::new();
        match members {
            MapMembers::Keyed(members) => {
                for (key, member) in members {
                    if let Some(value) = self.get_optional_value::<V>(&member)? {
                        map.insert(converted(&member, &key, &str::parse::<K>)?, value);
                    }
                }
            }
            MapMembers::Inline { entries, .. } => {
                for (key, value) in entries {
                    let member = format!("{}.{}", name, key);
                    map.insert(
                        converted(&member, &key, &str::parse::<K>)?,
                        converted(&member, &value, &str::parse::<V>)?,
                    );
                }
            }
        }
        if map.is_empty() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        Ok(map)
    }

    /// The map at `name` whose values are lists.
    ///
    /// Each `name.key` member is decoded as a list. An inline `k=a,b;j=c`
    /// value splits each entry on commas.
    pub fn get_map_of_lists<K, V>(&self, name: &str) -> Result<BTreeMap<K, Vec<V>>>
    where
        K: FromStr + Ord,
        K::Err: fmt::Display,
        V: FromStr,
        V::Err: fmt::Display,
    {
        let names = self.property_names();
        let members = decode_map(name, names.iter().map(String::as_str), |n| {
            self.get_config_value(n)
        });
        let mut map = BTreeMap::new();
        match members {
            MapMembers::Keyed(members) => {
                for (key, member) in members {
                    if let Some(values) = self.get_optional_values::<V>(&member)? {
                        map.insert(converted(&member, &key, &str::parse::<K>)?, values);
                    }
                }
            }
            MapMembers::Inline { entries, .. } => {
                for (key, value) in entries {
                    let member = format!("{}.{}", name, key);
                    let values = split_list(&value)
                        .iter()
                        .map(|item| converted(&member, item, &str::parse::<V>))
                        .collect::<Result<Vec<V>>>()?;
                    map.insert(converted(&member, &key, &str::parse::<K>)?, values);
                }
            }
        }
        if map.is_empty() {
            return Err(ConfigError::NotFound(name.to_string()));
        }
        Ok(map)
    }

    /// Every name visible through the chain.
    pub fn property_names(&self) -> BTreeSet<String> {
        self.context().iterate_names()
    }

    /// Every value visible through the chain.
    pub fn config_values(&self) -> Vec<ConfigValue> {
        self.context().iterate_values()
    }

    /// Active profiles, most specific first.
    pub fn profiles(&self) -> &[String] {
        &self.inner.profiles
    }

    /// Sources in rank order.
    pub fn sources(&self) -> &[RankedSource] {
        self.inner.registry.sources()
    }

    /// Registered mapping rooted at `prefix`.
    pub fn mapping(&self, prefix: &str) -> Option<&ConfigMapping> {
        self.inner.mappings.iter().find(|m| m.prefix() == prefix)
    }

    /// Materialize the mapping registered at `prefix` into `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use overlay_config::prelude::*;
    /// use overlay_config::sources::MapSource;
    /// use serde::Deserialize;
    ///
    /// #[derive(Debug, Deserialize)]
    /// #[serde(rename_all = "kebab-case")]
    /// struct Server {
    ///     host: String,
    ///     port: u16,
    ///     max_threads: usize,
    /// }
    ///
    /// # fn main() -> Result<()> {
    /// let mapping = ConfigMapping::builder("server")
    ///     .leaf("host")
    ///     .leaf_with_default("port", "8080")
    ///     .leaf_with_default("max-threads", "4")
    ///     .build();
    ///
    /// let config = Config::builder()
    ///     .with_source(MapSource::new("app", [("server.host", "localhost")]))
    ///     .with_mapping(mapping)
    ///     .build()?;
    ///
    /// let server: Server = config.get_mapping("server")?;
    /// assert_eq!(server.port, 8080);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_mapping<T: DeserializeOwned>(&self, prefix: &str) -> Result<T> {
        let mapping = self
            .mapping(prefix)
            .ok_or_else(|| ConfigError::NotFound(format!("mapping '{}'", prefix)))?;
        materialize(self, mapping)?
            .try_deserialize()
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }

    /// Materialize the mapping at `prefix` and run its [`Validate`] checks.
    #[cfg(feature = "validation")]
    pub fn get_validated_mapping<T>(&self, prefix: &str) -> Result<T>
    where
        T: DeserializeOwned + Validate,
    {
        let value: T = self.get_mapping(prefix)?;
        value.validate()?;
        Ok(value)
    }

    /// Names under a mapping prefix that no mapping declares.
    ///
    /// Only sources that validate their names are checked. Profiled names are
    /// checked in their plain spelling.
    pub fn unknown_properties(&self) -> Vec<String> {
        let inner = &self.inner;
        if inner.mappings.is_empty() {
            return Vec::new();
        }
        let mut unknown = BTreeSet::new();
        for ranked in inner.registry.sources() {
            if !ranked.source().validates_names() {
                continue;
            }
            for name in ranked.source().property_names() {
                let plain = unprofiled(&name);
                if inner.mappings.iter().any(|m| m.covers(plain))
                    && !inner.declared.matches(plain)
                    && !inner.ignored.has_root_value(plain)
                {
                    unknown.insert(plain.to_string());
                }
            }
        }
        unknown.into_iter().collect()
    }
}

fn converted<T, E, F>(name: &str, raw: &str, convert: &F) -> Result<T>
where
    E: fmt::Display,
    F: Fn(&str) -> std::result::Result<T, E>,
{
    convert(raw).map_err(|e| ConfigError::ConversionError {
        name: name.to_string(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sources", &self.inner.registry.source_names())
            .field("interceptors", &self.inner.chain.names())
            .field("profiles", &self.inner.profiles)
            .field("access", &self.access)
            .finish()
    }
}
