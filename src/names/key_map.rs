//! A multi-level key map over property name segments.

use super::segments::{join, split_indexes, split_segments};
use std::collections::{BTreeMap, HashMap};

/// A prefix trie keyed by name segments, with dedicated wildcard branches.
///
/// Paths are dotted property names. A `*` segment routes to the "any" child,
/// which answers for every plain or quoted segment that has no literal child.
/// A `[*]` segment routes to a separate index child, which only answers `[N]`
/// segments, so list wildcards never match map keys and the reverse. A trailing `**` marks the node as recursive: it then acts as
/// its own "any" child, so every name below it finds the node itself.
///
/// # Examples
///
/// ```rust
/// use overlay_config::names::KeyMap;
///
/// let mut defaults = KeyMap::new();
/// defaults.find_or_add("server.*.port").put_root_value("8080".to_string());
/// defaults.find_or_add("server.admin.port").put_root_value("9000".to_string());
///
/// assert_eq!(defaults.find_root_value("server.api.port").map(String::as_str), Some("8080"));
/// assert_eq!(defaults.find_root_value("server.admin.port").map(String::as_str), Some("9000"));
/// ```
#[derive(Debug, Clone)]
pub struct KeyMap<V> {
    children: HashMap<String, KeyMap<V>>,
    any: Option<Box<KeyMap<V>>>,
    any_index: Option<Box<KeyMap<V>>>,
    // stands in for an "any" child that points back at this node
    recursive: bool,
    root_value: Option<V>,
}

impl<V> Default for KeyMap<V> {
    fn default() -> Self {
        Self {
            children: HashMap::new(),
            any: None,
            any_index: None,
            recursive: false,
            root_value: None,
        }
    }
}

impl<V> KeyMap<V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the node for `path`, creating intermediate nodes as needed.
    pub fn find_or_add(&mut self, path: &str) -> &mut KeyMap<V> {
        let mut node = self;
        for segment in key_segments(path) {
            node = node.child_or_add(segment);
        }
        node
    }

    fn child_or_add(&mut self, segment: &str) -> &mut KeyMap<V> {
        match segment {
            "**" => {
                self.recursive = true;
                self
            }
            "*" | "[*]" if self.recursive => self,
            "*" => &mut **self.any.get_or_insert_with(Box::default),
            "[*]" => &mut **self.any_index.get_or_insert_with(Box::default),
            _ => self.children.entry(segment.to_string()).or_default(),
        }
    }

    /// Find the node for `path` without creating anything.
    pub fn find(&self, path: &str) -> Option<&KeyMap<V>> {
        let mut node = self;
        for segment in key_segments(path) {
            node = node.child(segment)?;
        }
        Some(node)
    }

    fn child(&self, segment: &str) -> Option<&KeyMap<V>> {
        let found = match segment {
            "**" => None,
            "*" => self.any.as_deref(),
            "[*]" => self.any_index.as_deref(),
            _ if segment.starts_with('[') => self
                .children
                .get(segment)
                .or(self.any_index.as_deref()),
            _ => self.children.get(segment).or(self.any.as_deref()),
        };
        found.or(if self.recursive { Some(self) } else { None })
    }

    /// The `*` child, if one exists.
    pub fn any(&self) -> Option<&KeyMap<V>> {
        self.any.as_deref()
    }

    /// The `[*]` child, if one exists.
    pub fn any_index(&self) -> Option<&KeyMap<V>> {
        self.any_index.as_deref()
    }

    /// Whether every name below this node resolves to the node itself.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Literal children by segment.
    pub fn children(&self) -> impl Iterator<Item = (&str, &KeyMap<V>)> {
        self.children.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Value stored at this node.
    pub fn root_value(&self) -> Option<&V> {
        self.root_value.as_ref()
    }

    /// Store a value at this node, returning the previous one.
    pub fn put_root_value(&mut self, value: V) -> Option<V> {
        self.root_value.replace(value)
    }

    /// Remove the value stored at this node.
    pub fn take_root_value(&mut self) -> Option<V> {
        self.root_value.take()
    }

    /// Value stored at `path`.
    pub fn find_root_value(&self, path: &str) -> Option<&V> {
        self.find(path).and_then(KeyMap::root_value)
    }

    /// Whether a value is stored at `path`.
    pub fn has_root_value(&self, path: &str) -> bool {
        self.find_root_value(path).is_some()
    }

    /// Copy every node of `other` into this map; existing values win.
    pub fn merge(&mut self, other: KeyMap<V>) {
        for (segment, child) in other.children {
            self.children.entry(segment).or_default().merge(child);
        }
        if let Some(any) = other.any {
            self.any.get_or_insert_with(Box::default).merge(*any);
        }
        if let Some(any_index) = other.any_index {
            self.any_index.get_or_insert_with(Box::default).merge(*any_index);
        }
        self.recursive |= other.recursive;
        if self.root_value.is_none() {
            self.root_value = other.root_value;
        }
    }

    /// Transform every stored value.
    pub fn map<V2, F>(&self, f: &F) -> KeyMap<V2>
    where
        F: Fn(&V) -> V2,
    {
        KeyMap {
            children: self
                .children
                .iter()
                .map(|(segment, child)| (segment.clone(), child.map(f)))
                .collect(),
            any: self.any.as_ref().map(|any| Box::new(any.map(f))),
            any_index: self.any_index.as_ref().map(|any| Box::new(any.map(f))),
            recursive: self.recursive,
            root_value: self.root_value.as_ref().map(f),
        }
    }
}

impl<V: Clone> KeyMap<V> {
    /// Flatten back to dotted names; wildcard branches appear as `*` and `[*]`.
    pub fn flatten(&self) -> BTreeMap<String, V> {
        let mut flat = BTreeMap::new();
        self.flatten_into("", &mut flat);
        flat
    }

    fn flatten_into(&self, path: &str, flat: &mut BTreeMap<String, V>) {
        if let Some(value) = &self.root_value {
            flat.insert(path.to_string(), value.clone());
        }
        for (segment, child) in &self.children {
            child.flatten_into(&join(path, segment), flat);
        }
        if let Some(any) = &self.any {
            any.flatten_into(&join(path, "*"), flat);
        }
        if let Some(any_index) = &self.any_index {
            any_index.flatten_into(&join(path, "[*]"), flat);
        }
    }
}

/// Segments as stored in the trie: `list[0]` becomes `list`, `[0]`.
fn key_segments(path: &str) -> Vec<&str> {
    split_segments(path)
        .into_iter()
        .flat_map(split_indexes)
        .collect()
}
