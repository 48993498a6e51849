//! # overlay-config
//!
//! Layered configuration with ranked sources, profile overlays and an
//! interceptor pipeline.
//!
//! ## Overview
//!
//! `overlay-config` resolves property names against a set of ranked sources:
//! - Sources ranked by ordinal, later registrations winning ties
//! - Profile overlays (`%dev.db.url` overrides `db.url` while `dev` is active)
//! - An interceptor chain for expressions, secrets, relocations and logging
//! - Lists and maps reconstructed from flat names (`hosts[0]`, `labels.team`)
//!   or from inline scalars (`a,b,c`, `k=v;k=v`)
//! - Environment variables matched against dotted and kebab-case names
//! - Typed mappings materialized through serde
//!
//! ## Quick Start
//!
//! ```rust
//! use overlay_config::prelude::*;
//! use overlay_config::sources::{EnvSource, MapSource};
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! #[serde(rename_all = "kebab-case")]
//! struct Server {
//!     host: String,
//!     port: u16,
//!     allowed_origins: Vec<String>,
//! }
//!
//! # fn main() -> overlay_config::error::Result<()> {
//! let server = ConfigMapping::builder("server")
//!     .leaf("host")
//!     .leaf_with_default("port", "8080")
//!     .list("allowed-origins")
//!     .build();
//!
//! let config = Config::builder()
//!     .with_source(MapSource::new("application", [
//!         ("config.profile", "dev"),
//!         ("server.host", "0.0.0.0"),
//!         ("%dev.server.host", "localhost"),
//!         ("server.allowed-origins", "https://a.example,https://b.example"),
//!     ]))
//!     .with_env_source(EnvSource::from_vars([("SERVER_PORT", "9090")]))
//!     .with_mapping(server)
//!     .build()?;
//!
//! let server: Server = config.get_mapping("server")?;
//! assert_eq!(server.host, "localhost");
//! assert_eq!(server.port, 9090);
//! assert_eq!(server.allowed_origins.len(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ## Precedence
//!
//! A scalar lookup returns the value of the highest-ranked source defining the
//! name. Values are never merged across sources. Default ordinals:
//!
//! | Source | Ordinal |
//! |---|---|
//! | Environment variables | 300 |
//! | Files and in-memory maps | 100, or `config_ordinal` |
//! | Declared defaults | `i32::MIN` |
//!
//! ## Feature Flags
//!
//! - `validation` (default): the [`Validate`](core::Validate) trait and
//!   [`Config::get_validated_mapping`](core::Config::get_validated_mapping)

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod binding;
pub mod core;
pub mod error;
pub mod interceptors;
pub mod names;
pub mod sources;
pub mod structure;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::binding::ConfigMapping;
    pub use crate::core::{Config, ConfigBuilder, ConfigRegistry, ConfigValue, ScopeId};
    pub use crate::error::{ConfigError, Result, ValidationError};
    pub use crate::sources::ConfigSource;

    #[cfg(feature = "validation")]
    pub use crate::core::Validate;
}
