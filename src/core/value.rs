//! The record returned by every lookup.

use serde::Serialize;
use std::cmp::Ordering;

/// A resolved property, together with where it came from.
///
/// Values are produced fresh by each lookup and never mutated in place. The
/// `with_*` methods return modified copies, which is how interceptors rewrite
/// names or expand values on the way out of the chain.
///
/// `value` is the processed value (expressions expanded, secrets removed),
/// while `raw_value` keeps what the source actually holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValue {
    name: String,
    value: Option<String>,
    raw_value: Option<String>,
    profile: Option<String>,
    source_name: String,
    source_ordinal: i32,
    source_position: usize,
    line_number: Option<u32>,
    problems: Vec<Problem>,
}

impl ConfigValue {
    /// Create a value that is not attached to any source.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            raw_value: Some(value.clone()),
            value: Some(value),
            profile: None,
            source_name: String::new(),
            source_ordinal: 0,
            source_position: usize::MAX,
            line_number: None,
            problems: Vec::new(),
        }
    }

    /// Attach source metadata.
    ///
    /// `position` is the rank of the source in the registry, `0` being the
    /// highest-precedence source.
    pub fn with_source(mut self, name: impl Into<String>, ordinal: i32, position: usize) -> Self {
        self.source_name = name.into();
        self.source_ordinal = ordinal;
        self.source_position = position;
        self
    }

    /// Attach the line the value was read from.
    pub fn with_line_number(mut self, line_number: Option<u32>) -> Self {
        self.line_number = line_number;
        self
    }

    /// Copy with a different name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Copy with a different processed value; the raw value is kept.
    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    /// Copy recording the profile that produced this value.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Copy with an additional problem.
    pub fn with_problem(mut self, problem: Problem) -> Self {
        self.problems.push(problem);
        self
    }

    /// Copy with the value removed and access recorded as denied.
    pub fn redacted(mut self) -> Self {
        self.value = None;
        self.raw_value = None;
        self.with_problem(Problem::SecretAccessDenied)
    }

    /// Property name, without any profile qualifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Processed value. `Some("")` is a defined, empty value.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Value as held by the source.
    pub fn raw_value(&self) -> Option<&str> {
        self.raw_value.as_deref()
    }

    /// Profile whose `%profile.` entry supplied the value.
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Name of the source that supplied the value.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Ordinal of the source that supplied the value.
    pub fn source_ordinal(&self) -> i32 {
        self.source_ordinal
    }

    /// Rank of the source in the registry; lower ranks win.
    pub fn source_position(&self) -> usize {
        self.source_position
    }

    /// Line the value was read from, when the source tracks it.
    pub fn line_number(&self) -> Option<u32> {
        self.line_number
    }

    /// Problems recorded while resolving this value.
    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    /// Whether any problem was recorded.
    pub fn has_problems(&self) -> bool {
        !self.problems.is_empty()
    }

    /// `source:line`, or just the source name.
    pub fn location(&self) -> String {
        match self.line_number {
            Some(line) => format!("{}:{}", self.source_name, line),
            None => self.source_name.clone(),
        }
    }

    /// The name as the source spells it, including any `%profile.` qualifier.
    pub fn name_profiled(&self) -> String {
        match &self.profile {
            Some(profile) => format!("%{}.{}", profile, self.name),
            None => self.name.clone(),
        }
    }

    /// Compare by source precedence. `Greater` means `self` wins.
    ///
    /// Higher ordinals win; on equal ordinals the source registered later
    /// holds the lower position and wins.
    pub fn precedence_cmp(&self, other: &ConfigValue) -> Ordering {
        self.source_ordinal
            .cmp(&other.source_ordinal)
            .then_with(|| other.source_position.cmp(&self.source_position))
    }
}

/// Something that went wrong while resolving a single value.
///
/// Problems travel with the value through the chain and only become errors
/// in the typed accessors of [`Config`](crate::core::Config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
pub enum Problem {
    /// An `${expression}` names a property that is not defined and has no default.
    #[error("expression '${{{expression}}}' cannot be resolved")]
    ExpressionNotFound {
        /// The unresolved expression body
        expression: String,
    },

    /// Expansion recursed too deeply, usually a reference cycle.
    #[error("expression expansion exceeded the maximum depth")]
    ExpressionTooDeep,

    /// The name is a secret and secrets are locked for this lookup.
    #[error("secret access denied")]
    SecretAccessDenied,
}
