//! Wildcard-aware property names.

use super::segments::is_numeric;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A configuration name with wildcard-aware equality.
///
/// A `*` segment on either side matches one dotted (or quoted) segment on the
/// other side, and `[*]` matches any numeric index:
///
/// - `foo.bar` equals `foo.*`
/// - `foo.bar.baz` equals `foo.*.baz`
/// - `foo."bar.baz"` equals `foo.*`
/// - `foo.bar[0]` equals `foo.bar[*]`
///
/// A `*` that is the first or the last segment of its pattern may also absorb
/// several segments, so `foo.*` equals `foo.bar.baz`. Segments that carry
/// brackets are never absorbed by a plain `*`.
///
/// Equality is not transitive, so the hash only covers the bracket structure
/// outside quoted runs: equal names always hash alike, while alike hashes say
/// nothing about equality.
///
/// # Examples
///
/// ```rust
/// use overlay_config::names::PropertyName;
///
/// assert!(PropertyName::equals("foo.*", "foo.bar"));
/// assert!(PropertyName::equals("a.b[3]", "a.b[*]"));
/// assert!(!PropertyName::equals("a.b[*]", "a.b"));
/// ```
#[derive(Debug, Clone)]
pub struct PropertyName {
    name: String,
    hash: u64,
}

impl PropertyName {
    /// Create a property name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let hash = structural_hash(&name);
        Self { name, hash }
    }

    /// The underlying name.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Compare two names with wildcard semantics. Symmetric.
    pub fn equals(name: &str, other: &str) -> bool {
        name == other
            || matches(name.as_bytes(), other.as_bytes())
            || matches(other.as_bytes(), name.as_bytes())
    }
}

impl PartialEq for PropertyName {
    fn eq(&self, other: &Self) -> bool {
        Self::equals(&self.name, &other.name)
    }
}

impl Eq for PropertyName {}

impl Hash for PropertyName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for PropertyName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PropertyName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

fn structural_hash(name: &str) -> u64 {
    let mut hash: u64 = 0;
    let mut quoted = false;
    for b in name.bytes() {
        if quoted {
            if b == b'"' {
                quoted = false;
            }
            continue;
        }
        match b {
            b'"' => quoted = true,
            b'[' | b']' => hash = hash.wrapping_mul(31).wrapping_add(u64::from(b)),
            _ => {}
        }
    }
    hash
}

/// Wildcards are read from `pattern` only.
fn matches(pattern: &[u8], other: &[u8]) -> bool {
    matches_until(pattern, pattern.len(), other, other.len())
}

fn matches_until(pattern: &[u8], mut pi: usize, other: &[u8], mut oi: usize) -> bool {
    loop {
        match (pi, oi) {
            (0, 0) => return true,
            (0, _) | (_, 0) => return false,
            _ => {}
        }
        let n = pattern[pi - 1];
        let o = other[oi - 1];

        if n == b'*' && is_star_segment(pattern, pi - 1) {
            return matches_star(pattern, pi - 1, other, oi);
        }

        if n == b']' && o == b']' {
            let (Some(p_open), Some(o_open)) = (
                rfind(pattern, b'[', pi - 1),
                rfind(other, b'[', oi - 1),
            ) else {
                return false;
            };
            let p_index = &pattern[p_open + 1..pi - 1];
            let o_index = &other[o_open + 1..oi - 1];
            let same = p_index == o_index
                || (p_index == b"*" && is_numeric(o_index))
                || (o_index == b"*" && is_numeric(p_index));
            if !same {
                return false;
            }
            pi = p_open;
            oi = o_open;
            continue;
        }

        if n != o {
            return false;
        }
        pi -= 1;
        oi -= 1;
    }
}

fn matches_star(pattern: &[u8], star: usize, other: &[u8], oi: usize) -> bool {
    let Some(mut start) = segment_start(other, oi) else {
        return false;
    };
    let elastic = star == 0 || star + 1 == pattern.len();
    loop {
        if matches_until(pattern, star, other, start) {
            return true;
        }
        if !elastic || start < 2 || other[start - 1] != b'.' {
            return false;
        }
        match segment_start(other, start - 1) {
            Some(previous) => start = previous,
            None => return false,
        }
    }
}

/// A `*` standing alone between dots (or at either end), possibly indexed.
fn is_star_segment(pattern: &[u8], at: usize) -> bool {
    (at == 0 || pattern[at - 1] == b'.')
        && (at + 1 == pattern.len() || matches!(pattern[at + 1], b'.' | b'['))
}

/// Start of the non-empty, bracket-free segment ending at `end`.
fn segment_start(name: &[u8], end: usize) -> Option<usize> {
    if end == 0 {
        return None;
    }
    if name[end - 1] == b'"' {
        let open = rfind(name, b'"', end - 1)?;
        return (end - open > 2).then_some(open);
    }
    let start = name[..end]
        .iter()
        .rposition(|&b| b == b'.')
        .map_or(0, |dot| dot + 1);
    let segment = &name[start..end];
    if segment.is_empty() || segment.iter().any(|&b| b == b'[' || b == b']') {
        None
    } else {
        Some(start)
    }
}

/// Last index of `needle` in `haystack[..end]`.
fn rfind(haystack: &[u8], needle: u8, end: usize) -> Option<usize> {
    haystack[..end].iter().rposition(|&b| b == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_star_matches_one_segment() {
        assert!(PropertyName::equals("foo.*", "foo.bar"));
        assert!(PropertyName::equals("foo.bar", "foo.*"));
        assert!(PropertyName::equals("foo.*.baz", "foo.bar.baz"));
        assert!(!PropertyName::equals("foo.*.baz", "foo.bar.qux"));
    }

    #[test]
    fn test_star_matches_quoted_segment() {
        assert!(PropertyName::equals("foo.*", "foo.\"a.b\""));
        assert!(PropertyName::equals("foo.\"a.b\"", "foo.*"));
        assert!(!PropertyName::equals("foo.*", "foo.\"\""));
    }

    #[test]
    fn test_indexed() {
        assert!(PropertyName::equals("a.b[*]", "a.b[3]"));
        assert!(PropertyName::equals("a.b[3]", "a.b[*]"));
        assert!(PropertyName::equals("a.b[*]", "a.b[*]"));
        assert!(!PropertyName::equals("a.b[*]", "a.b"));
        assert!(!PropertyName::equals("a.b", "a.b[*]"));
        assert!(!PropertyName::equals("a.b[*]", "a.b[x]"));
        assert!(PropertyName::equals("a[*].c[*]", "a[0].c[12]"));
    }

    #[test]
    fn test_indexed_star_segment() {
        assert!(PropertyName::equals("m.*[*]", "m.a[0]"));
        assert!(PropertyName::equals("m.*[*].x", "m.b[3].x"));
        assert!(!PropertyName::equals("m.*[*]", "m.a"));
    }

    #[test]
    fn test_star_does_not_match_index() {
        assert!(!PropertyName::equals("foo.*", "foo.bar[0]"));
        assert!(!PropertyName::equals("*", ""));
    }

    #[test]
    fn test_elastic_edges() {
        assert!(PropertyName::equals("foo.*", "foo.bar.baz"));
        assert!(PropertyName::equals("*", "a.b.c"));
        assert!(PropertyName::equals("*.port", "server.http.port"));
        assert!(!PropertyName::equals("foo.*.baz", "foo.a.b.baz"));
        assert!(!PropertyName::equals("foo.*", "other.bar.baz"));
    }

    #[test]
    fn test_hash_set_lookup() {
        let mut secrets = HashSet::new();
        secrets.insert(PropertyName::new("db.*.password"));
        secrets.insert(PropertyName::new("tokens[*]"));

        assert!(secrets.contains(&PropertyName::new("db.main.password")));
        assert!(secrets.contains(&PropertyName::new("tokens[4]")));
        assert!(!secrets.contains(&PropertyName::new("db.main.user")));
    }

    #[test]
    fn test_equal_names_hash_alike() {
        let pairs = [
            ("foo.*", "foo.\"a[0].b\""),
            ("a.b[*]", "a.b[3]"),
            ("foo.*", "foo.bar.baz"),
        ];
        for (a, b) in pairs {
            assert!(PropertyName::equals(a, b), "{} vs {}", a, b);
            assert_eq!(structural_hash(a), structural_hash(b), "{} vs {}", a, b);
        }
    }
}
