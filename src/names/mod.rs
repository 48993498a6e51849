//! Property names: wildcard matching, prefix indexing, segment tries and
//! environment spellings.
//!
//! Names are dotted paths. A segment may be quoted (`map."a.b".port`) to carry
//! dots, and may end in bracketed indexes (`hosts[0]`). Declared patterns add
//! `*` for one segment or map key, `[*]` for one index and a trailing `**` for
//! a whole subtree.

mod env_name;
mod key_map;
mod matcher;
mod property_name;
pub(crate) mod segments;

pub use env_name::{EnvNames, reconcile, to_dotted_name, to_env_name};
pub use key_map::KeyMap;
pub use matcher::NameMatcherIndex;
pub use property_name::PropertyName;
