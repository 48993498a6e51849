//! Reconstruction of lists, maps and groups from flat property names.
//!
//! A composite property has two possible spellings, which never merge:
//!
//! | Shape | Family | Inline scalar |
//! |---|---|---|
//! | list | `root[0]`, `root[1]`, ... | `root=a,b,c` |
//! | map | `root.k1`, `root.k2`, ... | `root=k1=v1;k2=v2` |
//!
//! Precedence is decided per source rank, the same way scalar lookups are:
//! the inline scalar is used only when its source strictly outranks every
//! source that defines a member of the family. Malformed members are skipped.
//!
//! Every decode re-reads the name snapshot it is given. Callers that need a
//! consistent view across several decodes take one snapshot and reuse it.

mod list;
mod map;

pub use list::{ListMembers, decode_list, indexed_element_names, split_list};
pub use map::{MapMembers, decode_map, group_keys, keyed_member_names, split_map};

use crate::core::ConfigValue;
use std::cmp::Ordering;

/// Highest-precedence value among `members`.
fn best_ranked<'a, I, F>(members: I, lookup: &F) -> Option<ConfigValue>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> Option<ConfigValue>,
{
    members
        .into_iter()
        .filter_map(lookup)
        .max_by(|a, b| a.precedence_cmp(b))
}

/// The inline value, when it should replace the family.
fn prefer_inline(family: Option<ConfigValue>, inline: Option<ConfigValue>) -> Option<ConfigValue> {
    let inline = inline.filter(|value| value.value().is_some())?;
    match family {
        Some(family) if inline.precedence_cmp(&family) != Ordering::Greater => None,
        _ => Some(inline),
    }
}
