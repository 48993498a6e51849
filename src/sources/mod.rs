//! Configuration source implementations.

mod config_source;
mod defaults;
mod env;
mod file;
mod map;

pub use config_source::{CONFIG_ORDINAL, ConfigSource, DEFAULT_ORDINAL};
pub use defaults::{DEFAULT_VALUES_NAME, DefaultValuesSource};
pub use env::{ENV_ORDINAL, EnvSource};
pub use file::FileSource;
pub use map::MapSource;
