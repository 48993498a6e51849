//! In-memory configuration source.

use super::ConfigSource;
use super::config_source::{CONFIG_ORDINAL, DEFAULT_ORDINAL};
use std::collections::{BTreeSet, HashMap};

/// A configuration source backed by a map of strings.
///
/// # Examples
///
/// ```rust
/// use overlay_config::sources::{ConfigSource, MapSource};
///
/// let source = MapSource::new("overrides", [("server.port", "9090")]).with_ordinal(400);
/// assert_eq!(source.get("server.port").as_deref(), Some("9090"));
/// assert_eq!(source.ordinal(), 400);
/// ```
#[derive(Debug, Clone)]
pub struct MapSource {
    name: String,
    properties: HashMap<String, String>,
    ordinal: i32,
    line_numbers: HashMap<String, u32>,
}

impl MapSource {
    /// Create a source from name/value pairs.
    ///
    /// The ordinal comes from a `config_ordinal` entry when present.
    pub fn new<I, K, V>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let properties: HashMap<String, String> = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let ordinal = properties
            .get(CONFIG_ORDINAL)
            .and_then(|ordinal| ordinal.trim().parse().ok())
            .unwrap_or(DEFAULT_ORDINAL);
        Self {
            name: name.into(),
            properties,
            ordinal,
            line_numbers: HashMap::new(),
        }
    }

    /// Set the ordinal for this source.
    pub fn with_ordinal(mut self, ordinal: i32) -> Self {
        self.ordinal = ordinal;
        self
    }

    /// Record the line each property was read from.
    pub fn with_line_numbers(mut self, line_numbers: HashMap<String, u32>) -> Self {
        self.line_numbers = line_numbers;
        self
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the source holds no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl ConfigSource for MapSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ordinal(&self) -> i32 {
        self.ordinal
    }

    fn get(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn property_names(&self) -> BTreeSet<String> {
        self.properties.keys().cloned().collect()
    }

    fn line_number(&self, name: &str) -> Option<u32> {
        self.line_numbers.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_from_property() {
        let source = MapSource::new("m", [("config_ordinal", "250"), ("a", "1")]);
        assert_eq!(source.ordinal(), 250);
    }

    #[test]
    fn test_default_ordinal() {
        let source = MapSource::new("m", [("config_ordinal", "high")]);
        assert_eq!(source.ordinal(), DEFAULT_ORDINAL);
    }

    #[test]
    fn test_empty_value_is_defined() {
        let source = MapSource::new("m", [("blank", "")]);
        assert_eq!(source.get("blank").as_deref(), Some(""));
        assert_eq!(source.get("missing"), None);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_line_numbers() {
        let lines = HashMap::from([("a".to_string(), 3)]);
        let source = MapSource::new("m", [("a", "1")]).with_line_numbers(lines);
        assert_eq!(source.line_number("a"), Some(3));
        assert_eq!(source.line_number("b"), None);
    }
}
