//! Prefix-bucketed index over wildcard patterns.

use super::property_name::PropertyName;
use super::segments::{join, segment_ranges};
use std::collections::HashMap;

/// Matches names against a fixed set of wildcard patterns.
///
/// [`PropertyName`] equality cannot back a hash lookup, so patterns are
/// grouped by their leading literal segments and a candidate is only compared
/// against the patterns of the buckets its own prefixes select. Buckets are
/// tried from the longest prefix down to the empty one.
///
/// Buckets hold whole patterns, so a hit is exactly a
/// [`PropertyName::equals`] hit: a `*` in the middle of a pattern never turns
/// elastic because its literal prefix was used as the bucket key.
///
/// # Examples
///
/// ```rust
/// use overlay_config::names::NameMatcherIndex;
///
/// let index = NameMatcherIndex::new(["server.host", "server.routes.*.timeout", "tags[*]"]);
/// assert!(index.matches("server.routes.api.timeout"));
/// assert!(index.matches("tags[2]"));
/// assert!(!index.matches("server.port"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NameMatcherIndex {
    buckets: HashMap<String, Vec<PropertyName>>,
    max_prefix_segments: usize,
}

impl NameMatcherIndex {
    /// Index full patterns, bucketing each by its longest literal prefix.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut buckets: HashMap<String, Vec<PropertyName>> = HashMap::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let (prefix, _) = split_literal_prefix(pattern);
            buckets
                .entry(prefix.to_string())
                .or_default()
                .push(PropertyName::new(pattern));
        }
        Self::from_buckets(buckets)
    }

    /// Index patterns that callers have already split into prefix and suffix.
    pub fn from_prefixed<I, P, N, S>(prefixed: I) -> Self
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<String>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buckets: HashMap<String, Vec<PropertyName>> = HashMap::new();
        for (prefix, names) in prefixed {
            let prefix: String = prefix.into();
            let patterns = names
                .into_iter()
                .map(|name| {
                    let name: String = name.into();
                    PropertyName::new(join(&prefix, &name))
                })
                .collect::<Vec<_>>();
            buckets.entry(prefix).or_default().extend(patterns);
        }
        Self::from_buckets(buckets)
    }

    fn from_buckets(buckets: HashMap<String, Vec<PropertyName>>) -> Self {
        let max_prefix_segments = buckets
            .keys()
            .map(|prefix| segment_ranges(prefix).len())
            .max()
            .unwrap_or(0);
        Self {
            buckets,
            max_prefix_segments,
        }
    }

    /// Whether `name` matches any indexed pattern.
    pub fn matches(&self, name: &str) -> bool {
        let ranges = segment_ranges(name);
        if ranges.is_empty() {
            return false;
        }
        let longest = self.max_prefix_segments.min(ranges.len() - 1);
        for length in (0..=longest).rev() {
            let prefix = if length == 0 {
                ""
            } else {
                &name[..ranges[length - 1].1]
            };
            if let Some(patterns) = self.buckets.get(prefix) {
                if bucket_matches(patterns, name) {
                    return true;
                }
            }
        }
        false
    }

    /// Whether `suffix` matches a pattern registered under exactly `prefix`.
    pub fn matches_split(&self, prefix: &str, suffix: &str) -> bool {
        self.buckets
            .get(prefix)
            .is_some_and(|patterns| bucket_matches(patterns, &join(prefix, suffix)))
    }

    /// Number of indexed patterns.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Whether the index holds no patterns.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn bucket_matches(patterns: &[PropertyName], name: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| PropertyName::equals(pattern.as_str(), name))
}

/// Longest run of wildcard-free leading segments, leaving at least one segment behind.
fn split_literal_prefix(pattern: &str) -> (&str, &str) {
    let ranges = segment_ranges(pattern);
    let literal = ranges
        .iter()
        .take(ranges.len().saturating_sub(1))
        .take_while(|(start, end)| !pattern[*start..*end].contains('*'))
        .count();
    if literal == 0 {
        ("", pattern)
    } else {
        (&pattern[..ranges[literal - 1].1], &pattern[ranges[literal].0..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_literal_prefix() {
        assert_eq!(split_literal_prefix("a.b.*.c"), ("a.b", "*.c"));
        assert_eq!(split_literal_prefix("a.b.c"), ("a.b", "c"));
        assert_eq!(split_literal_prefix("*.c"), ("", "*.c"));
        assert_eq!(split_literal_prefix("list[*].x"), ("", "list[*].x"));
        assert_eq!(split_literal_prefix("single"), ("", "single"));
    }

    #[test]
    fn test_matches_across_buckets() {
        let index = NameMatcherIndex::new(["foo.bar.baz", "foo.*.qux"]);
        assert!(index.matches("foo.bar.baz"));
        // bucket "foo.bar" misses, bucket "foo" still answers
        assert!(index.matches("foo.bar.qux"));
        assert!(!index.matches("foo.bar.zzz"));
    }

    #[test]
    fn test_matches_unbucketed_wildcards() {
        let index = NameMatcherIndex::new(["*.port", "list[*]"]);
        assert!(index.matches("http.port"));
        assert!(index.matches("list[7]"));
        assert!(!index.matches("list"));
    }

    #[test]
    fn test_matches_split() {
        let index = NameMatcherIndex::from_prefixed([("server", ["host", "routes.*"])]);
        assert!(index.matches_split("server", "host"));
        assert!(index.matches_split("server", "routes.api"));
        assert!(!index.matches_split("client", "host"));
        assert!(index.matches("server.routes.api"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_middle_star_is_not_elastic() {
        let index = NameMatcherIndex::new(["a.*.c", "server.routes.*.timeout"]);
        assert!(index.matches("a.x.c"));
        assert!(!index.matches("a.x.y.c"));
        assert!(index.matches("server.routes.api.timeout"));
        assert!(!index.matches("server.routes.api.extra.timeout"));

        let index = NameMatcherIndex::from_prefixed([("a", ["*.c"])]);
        assert!(!index.matches("a.x.y.c"));
        assert!(!index.matches_split("a", "x.y.c"));
        assert!(index.matches_split("a", "x.c"));
    }

    #[test]
    fn test_empty_index() {
        let index = NameMatcherIndex::default();
        assert!(index.is_empty());
        assert!(!index.matches("anything"));
        assert!(!index.matches(""));
    }
}
