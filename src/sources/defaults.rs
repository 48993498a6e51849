//! Declared default values as a configuration source.

use super::ConfigSource;
use crate::names::KeyMap;
use std::collections::BTreeSet;

/// Name reported for the defaults source.
pub const DEFAULT_VALUES_NAME: &str = "DefaultValuesConfigSource";

/// Serves defaults declared per property path, wildcards included.
///
/// A default declared for `server.*.port` answers for `server.api.port` and
/// every other concrete name the pattern matches. Only wildcard-free defaults
/// are reported by `property_names`. The ordinal is `i32::MIN`, so any other
/// source defining a name wins.
#[derive(Debug, Clone, Default)]
pub struct DefaultValuesSource {
    defaults: KeyMap<String>,
}

impl DefaultValuesSource {
    /// Wrap a trie of defaults.
    pub fn new(defaults: KeyMap<String>) -> Self {
        Self { defaults }
    }

    /// Build from `(path, value)` pairs; earlier pairs win on duplicates.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut defaults = KeyMap::new();
        for (path, value) in pairs {
            let node = defaults.find_or_add(path.as_ref());
            if node.root_value().is_none() {
                node.put_root_value(value.into());
            }
        }
        Self { defaults }
    }
}

impl ConfigSource for DefaultValuesSource {
    fn name(&self) -> &str {
        DEFAULT_VALUES_NAME
    }

    fn ordinal(&self) -> i32 {
        i32::MIN
    }

    fn get(&self, name: &str) -> Option<String> {
        self.defaults.find_root_value(name).cloned()
    }

    fn property_names(&self) -> BTreeSet<String> {
        self.defaults
            .flatten()
            .into_keys()
            .filter(|name| !name.contains('*'))
            .collect()
    }
}
