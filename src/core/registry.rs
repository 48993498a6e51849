//! Ranking and querying of registered sources.

use crate::core::ConfigValue;
use crate::sources::ConfigSource;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A source together with its registration sequence.
#[derive(Clone)]
pub struct RankedSource {
    source: Arc<dyn ConfigSource>,
    ordinal: i32,
    sequence: usize,
}

impl RankedSource {
    /// The wrapped source.
    pub fn source(&self) -> &dyn ConfigSource {
        self.source.as_ref()
    }

    /// Name of the wrapped source.
    pub fn name(&self) -> &str {
        self.source.name()
    }

    /// Ordinal, read once at registration.
    pub fn ordinal(&self) -> i32 {
        self.ordinal
    }

    /// Registration order, starting at zero.
    pub fn sequence(&self) -> usize {
        self.sequence
    }
}

impl fmt::Debug for RankedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankedSource")
            .field("name", &self.name())
            .field("ordinal", &self.ordinal)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Sources ranked by ordinal, highest first; equal ordinals rank the later
/// registration first.
///
/// A scalar lookup returns the first source that defines the name. Values are
/// never merged across sources.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<RankedSource>,
}

impl SourceRegistry {
    /// Rank `sources`, taking their order as the registration order.
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        let mut ranked: Vec<RankedSource> = sources
            .into_iter()
            .enumerate()
            .map(|(sequence, source)| {
                let source: Arc<dyn ConfigSource> = Arc::from(source);
                RankedSource {
                    ordinal: source.ordinal(),
                    source,
                    sequence,
                }
            })
            .collect();
        ranked.sort_by_key(|s| (Reverse(s.ordinal), Reverse(s.sequence)));

        debug!(
            sources = ?ranked.iter().map(|s| format!("{}({})", s.name(), s.ordinal)).collect::<Vec<_>>(),
            "ranked configuration sources"
        );
        Self { sources: ranked }
    }

    /// Value of `name` from the highest-ranked source defining it.
    pub fn resolve(&self, name: &str) -> Option<ConfigValue> {
        self.sources
            .iter()
            .enumerate()
            .find_map(|(position, ranked)| {
                let value = ranked.source.get(name)?;
                Some(
                    ConfigValue::new(name, value)
                        .with_source(ranked.name(), ranked.ordinal, position)
                        .with_line_number(ranked.source.line_number(name)),
                )
            })
    }

    /// Union of the names every source reports.
    pub fn property_names(&self) -> BTreeSet<String> {
        self.sources
            .iter()
            .flat_map(|ranked| ranked.source.property_names())
            .collect()
    }

    /// Resolved value of every reported name.
    pub fn values(&self) -> Vec<ConfigValue> {
        self.property_names()
            .iter()
            .filter_map(|name| self.resolve(name))
            .collect()
    }

    /// Sources in rank order.
    pub fn sources(&self) -> &[RankedSource] {
        &self.sources
    }

    /// Source names in rank order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }
}
