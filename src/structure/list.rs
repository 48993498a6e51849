//! Lists: `root[N]` families and comma-separated scalars.

use super::{best_ranked, prefer_inline};
use crate::core::ConfigValue;
use std::collections::BTreeMap;
use tracing::debug;

/// How a list property is represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMembers {
    /// Element names `root[N]`, ascending by index.
    Indexed(Vec<String>),
    /// A single scalar at the root, split on commas.
    Inline {
        /// The scalar the items came from
        value: ConfigValue,
        /// The items, unescaped
        items: Vec<String>,
    },
}

impl ListMembers {
    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Indexed(names) => names.len(),
            Self::Inline { items, .. } => items.len(),
        }
    }

    /// Whether the list has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Element names of the `root[N]` family, ascending by index.
///
/// Deeper names (`root[0].host`, `root[0][1]`) contribute their element.
/// Gaps are allowed. Bracket contents that are not a base-10 index are
/// skipped.
///
/// ```rust
/// use overlay_config::structure::indexed_element_names;
///
/// let names = ["hosts[10]", "hosts[2].port", "hosts[2].name", "hosts[x]", "hostsx[0]"];
/// assert_eq!(indexed_element_names("hosts", names), vec!["hosts[2]", "hosts[10]"]);
/// ```
pub fn indexed_element_names<'a, I>(root: &str, names: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut elements = BTreeMap::new();
    for name in names {
        if let Some((index, len)) = element_index(root, name) {
            elements.entry(index).or_insert_with(|| name[..len].to_string());
        }
    }
    elements.into_values().collect()
}

/// Index and length of the element prefix when `name` is `root[N]...`.
pub(crate) fn element_index(root: &str, name: &str) -> Option<(u64, usize)> {
    let rest = name.strip_prefix(root)?.strip_prefix('[')?;
    let Some(close) = rest.find(']') else {
        debug!(name, "skipping list member without closing bracket");
        return None;
    };
    let digits = &rest[..close];
    let index = match digits.parse::<u64>() {
        Ok(index) if digits.bytes().all(|b| b.is_ascii_digit()) => index,
        _ => {
            debug!(name, "skipping list member with malformed index");
            return None;
        }
    };
    let len = root.len() + close + 2;
    match name.as_bytes().get(len) {
        None | Some(b'.') | Some(b'[') => Some((index, len)),
        Some(_) => None,
    }
}

/// Split a comma-separated scalar.
///
/// `\,` is a literal comma and `\\` a literal backslash. Empty items are
/// dropped.
///
/// ```rust
/// use overlay_config::structure::split_list;
///
/// assert_eq!(split_list("a,b\\,c,,d"), vec!["a", "b,c", "d"]);
/// assert!(split_list("").is_empty());
/// ```
pub fn split_list(value: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ (',' | '\\')) => current.push(escaped),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            ',' => {
                if !current.is_empty() {
                    items.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        items.push(current);
    }
    items
}

/// Decide how the list at `root` is represented.
///
/// The indexed family and the inline scalar never merge: the scalar is used
/// only when its source strictly outranks every source defining a member of
/// the family.
pub fn decode_list<'a, I, F>(root: &str, names: I, lookup: F) -> ListMembers
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> Option<ConfigValue>,
{
    let names: Vec<&str> = names.into_iter().collect();
    let elements = indexed_element_names(root, names.iter().copied());
    let members = names
        .iter()
        .copied()
        .filter(|name| element_index(root, name).is_some());
    let family = best_ranked(members, &lookup);
    match prefer_inline(family, lookup(root)) {
        Some(value) => {
            let items = value.value().map(split_list).unwrap_or_default();
            ListMembers::Inline { value, items }
        }
        None => ListMembers::Indexed(elements),
    }
}
