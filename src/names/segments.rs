//! Splitting of dotted property names into segments.
//!
//! A segment ends at a `.` that is neither inside a `"..."` quoted run nor
//! inside a `[...]` bracket group. Segments keep their quotes and brackets.

/// Byte ranges of every segment of `name`, left to right.
pub(crate) fn segment_ranges(name: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    if name.is_empty() {
        return ranges;
    }
    let mut start = 0;
    let mut quoted = false;
    let mut brackets = 0usize;
    for (i, b) in name.bytes().enumerate() {
        match b {
            b'"' => quoted = !quoted,
            b'[' if !quoted => brackets += 1,
            b']' if !quoted => brackets = brackets.saturating_sub(1),
            b'.' if !quoted && brackets == 0 => {
                ranges.push((start, i));
                start = i + 1;
            }
            _ => {}
        }
    }
    ranges.push((start, name.len()));
    ranges
}

/// Segments of `name`, left to right.
pub(crate) fn split_segments(name: &str) -> Vec<&str> {
    segment_ranges(name)
        .into_iter()
        .map(|(start, end)| &name[start..end])
        .collect()
}

/// Whether `digits` is a non-empty run of ASCII digits.
pub(crate) fn is_numeric(digits: &[u8]) -> bool {
    !digits.is_empty() && digits.iter().all(u8::is_ascii_digit)
}

/// Removes surrounding quotes from a single segment.
pub(crate) fn unquoted(segment: &str) -> &str {
    if segment.len() >= 2 && segment.starts_with('"') && segment.ends_with('"') {
        &segment[1..segment.len() - 1]
    } else {
        segment
    }
}

/// Quotes `key` when it would otherwise be read as more than one segment.
pub(crate) fn quoted_if_needed(key: &str) -> String {
    if key.contains('.') && !(key.starts_with('"') && key.ends_with('"')) {
        format!("\"{}\"", key)
    } else {
        key.to_string()
    }
}

/// Joins a parent name and a child segment.
pub(crate) fn join(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else if child.starts_with('[') {
        format!("{}{}", parent, child)
    } else {
        format!("{}.{}", parent, child)
    }
}

/// Splits `name[0][*]` into `name`, `[0]`, `[*]`.
///
/// Returns the segment unchanged when any bracket group holds something other
/// than digits or `*`.
pub(crate) fn split_indexes(segment: &str) -> Vec<&str> {
    if !segment.ends_with(']') || segment.starts_with('"') {
        return vec![segment];
    }
    let Some(open) = segment.find('[') else {
        return vec![segment];
    };
    let mut parts = Vec::new();
    if open > 0 {
        parts.push(&segment[..open]);
    }
    let mut rest = &segment[open..];
    while !rest.is_empty() {
        let Some(close) = rest.find(']') else {
            return vec![segment];
        };
        let inner = &rest[1..close];
        if !rest.starts_with('[') || !(inner == "*" || is_numeric(inner.as_bytes())) {
            return vec![segment];
        }
        parts.push(&rest[..=close]);
        rest = &rest[close + 1..];
    }
    parts
}

/// Strips a leading `%profile.` qualifier.
pub(crate) fn unprofiled(name: &str) -> &str {
    if name.starts_with('%') {
        if let Some(dot) = name.find('.') {
            return &name[dot + 1..];
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_plain() {
        assert_eq!(split_segments("a.b.c"), vec!["a", "b", "c"]);
        assert!(split_segments("").is_empty());
    }

    #[test]
    fn test_split_quoted_and_indexed() {
        assert_eq!(
            split_segments("map.\"a.b\".list[0].x"),
            vec!["map", "\"a.b\"", "list[0]", "x"]
        );
    }

    #[test]
    fn test_split_indexes() {
        assert_eq!(split_indexes("list[0][*]"), vec!["list", "[0]", "[*]"]);
        assert_eq!(split_indexes("list[x]"), vec!["list[x]"]);
        assert_eq!(split_indexes("plain"), vec!["plain"]);
    }

    #[test]
    fn test_join_and_quote() {
        assert_eq!(join("a", "b"), "a.b");
        assert_eq!(join("a", "[0]"), "a[0]");
        assert_eq!(join("", "b"), "b");
        assert_eq!(quoted_if_needed("x.y"), "\"x.y\"");
        assert_eq!(unquoted("\"x.y\""), "x.y");
    }

    #[test]
    fn test_unprofiled() {
        assert_eq!(unprofiled("%dev.db.url"), "db.url");
        assert_eq!(unprofiled("db.url"), "db.url");
    }
}
