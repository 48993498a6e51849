//! Binding of declared shapes onto typed values.
//!
//! A [`ConfigMapping`] declares, under a prefix, which members a type reads:
//! scalars with optional defaults, groups, lists and maps. Registering it with
//! [`ConfigBuilder::with_mapping`](crate::core::ConfigBuilder::with_mapping)
//! feeds its defaults into the defaults source, its names into environment
//! reconciliation and unknown-property validation. At read time
//! [`Config::get_mapping`](crate::core::Config::get_mapping) walks the shape
//! with the structural decoders and hands the resulting tree to serde.

mod mapping;
mod materialize;

pub use mapping::{ConfigMapping, GroupBuilder, MappingBuilder, Shape};
pub(crate) use materialize::materialize;
