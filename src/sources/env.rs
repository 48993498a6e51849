//! Environment variable configuration source.

use super::ConfigSource;
use crate::names::{EnvNames, reconcile, to_dotted_name};
use std::collections::{BTreeSet, HashMap};

/// Ordinal of the environment source unless overridden.
pub const ENV_ORDINAL: i32 = 300;

/// Environment variable configuration source.
///
/// Takes a snapshot of the environment when constructed. A property such as
/// `server.max-threads` is found under `server.max-threads`, `server_max_threads`
/// or `SERVER_MAX_THREADS`, whichever exists first.
///
/// Iteration reports every raw key, its dotted form (`SERVER_MAX_THREADS` as
/// `server.max.threads`) and, once declared names are known, the declared
/// spelling (`server.max-threads`).
///
/// # Examples
///
/// ```rust
/// use overlay_config::sources::{ConfigSource, EnvSource};
///
/// let source = EnvSource::from_vars([("APP_SERVER_PORT", "8080")]).with_prefix("APP");
/// assert_eq!(source.get("server.port").as_deref(), Some("8080"));
/// ```
#[derive(Debug)]
pub struct EnvSource {
    name: String,
    names: EnvNames,
    reconciled: HashMap<String, String>,
    ordinal: i32,
}

impl EnvSource {
    /// Snapshot the process environment.
    pub fn new() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Use the given variables instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self {
            name: "EnvConfigSource".to_string(),
            names: EnvNames::new(vars),
            reconciled: HashMap::new(),
            ordinal: ENV_ORDINAL,
        }
    }

    /// Keep only variables starting with `PREFIX_`, with the prefix removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use overlay_config::sources::{ConfigSource, EnvSource};
    ///
    /// // APP_DB_URL -> db.url, OTHER_VAR is dropped
    /// let source = EnvSource::from_vars([("APP_DB_URL", "x"), ("OTHER_VAR", "y")]).with_prefix("APP");
    /// assert_eq!(source.property_names().len(), 2);
    /// ```
    pub fn with_prefix(self, prefix: &str) -> Self {
        let prefix = format!("{}_", prefix.trim_end_matches('_'));
        let vars = self
            .names
            .keys()
            .filter_map(|key| {
                let stripped = key.strip_prefix(prefix.as_str())?;
                let value = self.names.raw(key)?;
                (!stripped.is_empty()).then(|| (stripped.to_string(), value.to_string()))
            })
            .collect();
        Self {
            name: format!("EnvConfigSource[{}*]", prefix),
            names: EnvNames::new(vars),
            reconciled: HashMap::new(),
            ordinal: self.ordinal,
        }
    }

    /// Set the ordinal for this source.
    ///
    /// Higher ordinal sources override lower ordinal ones.
    pub fn with_ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Declared spelling of a raw key, once reconciled.
    pub fn reconciled_name(&self, key: &str) -> Option<&str> {
        self.reconciled.get(key).map(String::as_str)
    }
}

impl Default for EnvSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn get(&self, name: &str) -> Option<String> {
        self.names.lookup(name).map(str::to_string)
    }

    fn property_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for key in self.names.keys() {
            names.insert(key.to_string());
            names.insert(to_dotted_name(key));
            if let Some(declared) = self.reconciled.get(key) {
                names.insert(declared.clone());
            }
        }
        names
    }

    fn reconcile(&mut self, declared: &[String]) {
        self.reconciled = reconcile(declared, self.names.keys());
    }

    fn validates_names(&self) -> bool {
        false
    }
}
