//! Builds a `config::Value` tree from a mapping's shape.

use super::{ConfigMapping, Shape};
use crate::core::Config;
use crate::error::{ConfigError, Result};
use crate::names::segments::{join, quoted_if_needed};
use crate::structure::{
    ListMembers, MapMembers, decode_list, decode_map, group_keys, indexed_element_names, split_list,
};
use config::{Map, Value, ValueKind};
use std::collections::BTreeSet;
use tracing::trace;

/// Read every member of `mapping` through `config`.
///
/// One name snapshot is taken up front and reused for every structural
/// decode, so the whole tree is built from a consistent view of the names.
pub(crate) fn materialize(config: &Config, mapping: &ConfigMapping) -> Result<Value> {
    let names = config.property_names();
    let walker = Walker {
        config,
        names: &names,
    };
    let table = walker.group(mapping.prefix(), mapping.members())?;
    trace!(prefix = mapping.prefix(), members = table.len(), "materialized mapping");
    Ok(table_value(table))
}

struct Walker<'a> {
    config: &'a Config,
    names: &'a BTreeSet<String>,
}

impl Walker<'_> {
    fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    fn group(&self, path: &str, members: &[(String, Shape)]) -> Result<Map<String, Value>> {
        let mut table = Map::new();
        for (name, shape) in members {
            let member = join(path, &quoted_if_needed(name));
            if let Some(value) = self.member(&member, shape)? {
                table.insert(name.clone(), value);
            }
        }
        Ok(table)
    }

    fn member(&self, path: &str, shape: &Shape) -> Result<Option<Value>> {
        match shape {
            Shape::Leaf { .. } => match self.config.get_raw_value(path)? {
                Some(raw) => Ok(Some(string_value(raw))),
                None => Err(ConfigError::NotFound(path.to_string())),
            },
            Shape::Optional => self.scalar(path),
            Shape::Group(members) => Ok(Some(table_value(self.group(path, members)?))),
            Shape::OptionalGroup(members) => {
                if !self.has_members(path) {
                    return Ok(None);
                }
                Ok(Some(table_value(self.group(path, members)?)))
            }
            Shape::List(element) => Ok(Some(array_value(self.list(path, element)?))),
            Shape::Map(value) => Ok(Some(table_value(self.map(path, value)?))),
        }
    }

    /// A scalar that may be missing; empty counts as missing.
    fn scalar(&self, path: &str) -> Result<Option<Value>> {
        Ok(self
            .config
            .get_raw_value(path)?
            .filter(|raw| !raw.is_empty())
            .map(string_value))
    }

    fn has_members(&self, path: &str) -> bool {
        self.names().any(|name| {
            name.strip_prefix(path)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
        })
    }

    fn list(&self, path: &str, element: &Shape) -> Result<Vec<Value>> {
        if let Shape::Group(members) | Shape::OptionalGroup(members) = element {
            return indexed_element_names(path, self.names())
                .iter()
                .map(|name| self.group(name, members).map(table_value))
                .collect();
        }
        match decode_list(path, self.names(), |n| self.config.get_config_value(n)) {
            ListMembers::Indexed(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for name in &elements {
                    let value = match element {
                        Shape::Leaf { .. } | Shape::Optional => self.scalar(name)?,
                        other => self.member(name, other)?,
                    };
                    values.extend(value);
                }
                Ok(values)
            }
            ListMembers::Inline { items, .. } => {
                self.config.checked_value(path)?;
                Ok(items.into_iter().map(string_value).collect())
            }
        }
    }

    fn map(&self, path: &str, value: &Shape) -> Result<Map<String, Value>> {
        let mut table = Map::new();
        if let Shape::Group(members) | Shape::OptionalGroup(members) = value {
            for (key, member) in group_keys(path, self.names()) {
                table.insert(key, table_value(self.group(&member, members)?));
            }
            return Ok(table);
        }
        match decode_map(path, self.names(), |n| self.config.get_config_value(n)) {
            MapMembers::Keyed(members) => {
                for (key, member) in members {
                    let entry = match value {
                        Shape::List(element) => Some(array_value(self.list(&member, element)?)),
                        Shape::Leaf { .. } | Shape::Optional => self.scalar(&member)?,
                        other => self.member(&member, other)?,
                    };
                    if let Some(entry) = entry {
                        table.insert(key, entry);
                    }
                }
            }
            MapMembers::Inline { entries, .. } => {
                self.config.checked_value(path)?;
                for (key, raw) in entries {
                    let entry = match value {
                        Shape::List(_) => array_value(split_list(&raw).into_iter().map(string_value).collect()),
                        _ => string_value(raw),
                    };
                    table.insert(key, entry);
                }
            }
        }
        Ok(table)
    }
}

fn string_value(raw: String) -> Value {
    Value::new(None, ValueKind::String(raw))
}

fn table_value(table: Map<String, Value>) -> Value {
    Value::new(None, ValueKind::Table(table))
}

fn array_value(values: Vec<Value>) -> Value {
    Value::new(None, ValueKind::Array(values))
}
