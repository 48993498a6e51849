//! Configuration source trait.

use std::collections::BTreeSet;

/// Property that overrides the ordinal of the source holding it.
pub const CONFIG_ORDINAL: &str = "config_ordinal";

/// Ordinal of a source that does not declare one.
pub const DEFAULT_ORDINAL: i32 = 100;

/// Trait for configuration sources.
///
/// Implement this trait to plug custom backends (remote APIs, databases,
/// key-value stores) into the registry. A source is queried by name and never
/// merged with other sources: the highest-ranked source defining a name wins.
///
/// `property_names` may under-report. Presence is always confirmed through
/// [`get`](ConfigSource::get).
///
/// Default ordinals:
/// - Environment variables: 300
/// - Files and in-memory maps: 100
/// - Declared defaults: `i32::MIN`
pub trait ConfigSource: Send + Sync {
    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> &str;

    /// Get the ordinal of this source (higher = takes precedence).
    ///
    /// The default reads [`CONFIG_ORDINAL`] from the source itself and falls
    /// back to [`DEFAULT_ORDINAL`].
    fn ordinal(&self) -> i32 {
        self.get(CONFIG_ORDINAL)
            .and_then(|ordinal| ordinal.trim().parse().ok())
            .unwrap_or(DEFAULT_ORDINAL)
    }

    /// Raw value of `name`. `Some("")` is a defined, empty value.
    fn get(&self, name: &str) -> Option<String>;

    /// Names this source knows about.
    fn property_names(&self) -> BTreeSet<String>;

    /// Line `name` was read from, when the source tracks it.
    fn line_number(&self, _name: &str) -> Option<u32> {
        None
    }

    /// Learn the declared property names before the source is registered.
    ///
    /// Sources whose keys lose information, such as environment variables,
    /// use this to report names in their declared spelling.
    fn reconcile(&mut self, _declared: &[String]) {}

    /// Whether names from this source are checked against declared mappings.
    ///
    /// Sources that cannot spell names exactly return `false`.
    fn validates_names(&self) -> bool {
        true
    }
}
