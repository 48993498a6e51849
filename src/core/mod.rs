//! The resolution pipeline: values, ranked sources, the assembled
//! configuration and its builder.

mod builder;
mod config;
mod registry;
mod scope;
mod value;

#[cfg(feature = "validation")]
mod validation;

pub use builder::ConfigBuilder;
pub use self::config::Config;
pub use registry::{RankedSource, SourceRegistry};
pub use scope::{ConfigRegistry, ScopeId};
pub use value::{ConfigValue, Problem};

#[cfg(feature = "validation")]
pub use validation::Validate;
