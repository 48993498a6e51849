//! Maps: `root.key` families and `k=v;k=v` scalars.

use super::list::element_index;
use super::{best_ranked, prefer_inline};
use crate::core::ConfigValue;
use crate::names::segments::unquoted;
use std::collections::BTreeMap;
use tracing::debug;

/// How a map property is represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapMembers {
    /// `(key, member name)` pairs, ordered by key.
    Keyed(Vec<(String, String)>),
    /// A single `key=value;...` scalar at the root.
    Inline {
        /// The scalar the entries came from
        value: ConfigValue,
        /// `(key, value)` pairs in scalar order, unescaped
        entries: Vec<(String, String)>,
    },
}

impl MapMembers {
    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Keyed(members) => members.len(),
            Self::Inline { entries, .. } => entries.len(),
        }
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The key segment at the start of `rest` and its byte length.
///
/// A quoted segment yields its contents. An unquoted segment ends at the first
/// `.` or `[` that is not escaped, and `\.` inside it yields a literal dot.
fn key_segment(rest: &str) -> Option<(String, usize)> {
    if rest.starts_with('"') {
        let close = rest[1..].find('"')? + 1;
        return Some((unquoted(&rest[..=close]).to_string(), close + 1));
    }
    let mut key = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '.'))) => {
                key.push('.');
                chars.next();
            }
            '.' | '[' => return (!key.is_empty()).then_some((key, i)),
            _ => key.push(c),
        }
    }
    (!key.is_empty()).then(|| (key, rest.len()))
}

/// `(key, member name)` pairs of the `root.<key>` family, ordered by key.
///
/// A member is either `root.<key>` itself or an indexed `root.<key>[N]`, which
/// makes `root.<key>` a list-valued member. Names continuing below the key
/// (`root.<key>.field`) belong to a nested group and are left out.
///
/// ```rust
/// use overlay_config::structure::keyed_member_names;
///
/// let names = ["region.us", "region.eu", "region.\"ap.south\"", "region.eu.zone", "regions.x"];
/// let members = keyed_member_names("region", names);
/// let keys: Vec<&str> = members.iter().map(|(k, _)| k.as_str()).collect();
/// assert_eq!(keys, vec!["ap.south", "eu", "us"]);
/// ```
pub fn keyed_member_names<'a, I>(root: &str, names: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut members = BTreeMap::new();
    for name in names {
        if let Some((key, member)) = keyed_member(root, name) {
            members.entry(key).or_insert(member);
        }
    }
    members.into_iter().collect()
}

fn keyed_member(root: &str, name: &str) -> Option<(String, String)> {
    let rest = member_rest(root, name)?;
    let (key, len) = key_segment(rest)?;
    let member = &name[..name.len() - rest.len() + len];
    let tail = &rest[len..];
    if tail.is_empty() {
        return Some((key, member.to_string()));
    }
    // map of lists: `root.key[0]`, `root.key[0].field`
    match element_index(member, name) {
        Some(_) => Some((key, member.to_string())),
        None => {
            if tail.starts_with('[') {
                debug!(name, "skipping map member with malformed index");
            }
            None
        }
    }
}

fn member_rest<'n>(root: &str, name: &'n str) -> Option<&'n str> {
    if root.is_empty() {
        return Some(name);
    }
    name.strip_prefix(root)?.strip_prefix('.')
}

/// Keys of the `root.<key>...` family at any depth, for maps of groups.
///
/// ```rust
/// use overlay_config::structure::group_keys;
///
/// let names = ["servers.api.host", "servers.api.port", "servers.admin.host"];
/// assert_eq!(group_keys("servers", names), vec![
///     ("admin".to_string(), "servers.admin".to_string()),
///     ("api".to_string(), "servers.api".to_string()),
/// ]);
/// ```
pub fn group_keys<'a, I>(root: &str, names: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut keys = BTreeMap::new();
    for name in names {
        let Some(rest) = member_rest(root, name) else {
            continue;
        };
        if let Some((key, len)) = key_segment(rest) {
            let member = &name[..name.len() - rest.len() + len];
            keys.entry(key).or_insert_with(|| member.to_string());
        }
    }
    keys.into_iter().collect()
}

/// Split a `key=value;key=value` scalar.
///
/// `\;`, `\=` and `\\` are literal; other escapes are kept as written. Keys
/// may be quoted to carry dots. Entries without `=` are skipped.
///
/// ```rust
/// use overlay_config::structure::split_map;
///
/// let entries = split_map("us=east;eu=we\\;st;\"a.b\"=c");
/// assert_eq!(entries, vec![
///     ("us".to_string(), "east".to_string()),
///     ("eu".to_string(), "we;st".to_string()),
///     ("a.b".to_string(), "c".to_string()),
/// ]);
/// ```
pub fn split_map(value: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut key: Option<String> = None;
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ (';' | '=' | '\\')) => current.push(escaped),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '=' if key.is_none() => key = Some(std::mem::take(&mut current)),
            ';' => finish_entry(&mut entries, key.take(), std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    finish_entry(&mut entries, key, current);
    entries
}

fn finish_entry(entries: &mut Vec<(String, String)>, key: Option<String>, value: String) {
    match key {
        Some(key) if !key.is_empty() => entries.push((unquoted(&key).to_string(), value)),
        Some(_) => debug!("skipping map entry with empty key"),
        None if value.is_empty() => {}
        None => debug!(entry = %value, "skipping map entry without '='"),
    }
}

/// Decide how the map at `root` is represented.
///
/// The keyed family and the inline scalar never merge: the scalar is used
/// only when its source strictly outranks every source defining a member of
/// the family.
pub fn decode_map<'a, I, F>(root: &str, names: I, lookup: F) -> MapMembers
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> Option<ConfigValue>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let keyed = keyed_member_names(root, names.iter().copied());
    let members = names
        .iter()
        .copied()
        .filter(|name| keyed_member(root, name).is_some());
    let family = best_ranked(members, &lookup);
    match prefer_inline(family, lookup(root)) {
        Some(value) => {
            let entries = value.value().map(split_map).unwrap_or_default();
            MapMembers::Inline { value, entries }
        }
        None => MapMembers::Keyed(keyed),
    }
}
