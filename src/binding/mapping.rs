//! Declared configuration shapes.

use crate::names::segments::{join, quoted_if_needed};

/// Shape of one declared member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// A required scalar, with an optional default.
    Leaf {
        /// Value used when no source defines the member
        default: Option<String>,
    },
    /// A scalar that may be absent.
    Optional,
    /// Nested members.
    Group(Vec<(String, Shape)>),
    /// Nested members that may be absent as a whole.
    OptionalGroup(Vec<(String, Shape)>),
    /// Indexed elements of the given shape.
    List(Box<Shape>),
    /// Keyed entries of the given shape.
    Map(Box<Shape>),
}

fn leaf() -> Shape {
    Shape::Leaf { default: None }
}

/// A named shape bound under a prefix.
///
/// Member names are spelled as in the configuration (`max-threads`); the target
/// type maps them with serde attributes such as `rename_all = "kebab-case"`.
///
/// # Examples
///
/// ```rust
/// use overlay_config::binding::ConfigMapping;
///
/// let mapping = ConfigMapping::builder("server")
///     .leaf("host")
///     .leaf_with_default("port", "8080")
///     .optional("name")
///     .group("tls", |tls| tls.leaf("cert").optional("key"))
///     .list("tags")
///     .list_of_groups("routes", |route| route.leaf("path").leaf_with_default("timeout", "30"))
///     .map("labels")
///     .map_of_lists("aliases")
///     .map_of_groups("backends", |backend| backend.leaf("url"))
///     .build();
///
/// assert!(mapping.declared_names().contains(&"server.routes[*].timeout".to_string()));
/// assert!(mapping.defaults().contains(&("server.port".to_string(), "8080".to_string())));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMapping {
    prefix: String,
    members: Vec<(String, Shape)>,
}

impl ConfigMapping {
    /// Start declaring a mapping rooted at `prefix`.
    pub fn builder(prefix: impl Into<String>) -> MappingBuilder {
        MappingBuilder {
            prefix: prefix.into(),
            group: GroupBuilder::default(),
        }
    }

    /// Root of the mapping.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Top-level members.
    pub fn members(&self) -> &[(String, Shape)] {
        &self.members
    }

    /// Whether `name` lies under the prefix.
    pub fn covers(&self, name: &str) -> bool {
        if self.prefix.is_empty() {
            return true;
        }
        name.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
    }

    /// Every name pattern the mapping can read, wildcards included.
    pub fn declared_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        declare_group(&self.prefix, &self.members, &mut names);
        names
    }

    /// `(pattern, value)` for every member with a default.
    pub fn defaults(&self) -> Vec<(String, String)> {
        let mut defaults = Vec::new();
        collect_defaults(&self.prefix, &self.members, &mut defaults);
        defaults
    }
}

fn member_path(parent: &str, name: &str) -> String {
    join(parent, &quoted_if_needed(name))
}

fn declare_group(path: &str, members: &[(String, Shape)], names: &mut Vec<String>) {
    for (name, shape) in members {
        declare(&member_path(path, name), shape, names);
    }
}

fn declare(path: &str, shape: &Shape, names: &mut Vec<String>) {
    match shape {
        Shape::Leaf { .. } | Shape::Optional => names.push(path.to_string()),
        Shape::Group(members) | Shape::OptionalGroup(members) => declare_group(path, members, names),
        Shape::List(element) => {
            if !matches!(element.as_ref(), Shape::Group(_) | Shape::OptionalGroup(_)) {
                names.push(path.to_string());
            }
            declare(&format!("{}[*]", path), element, names);
        }
        Shape::Map(value) => {
            if !matches!(value.as_ref(), Shape::Group(_) | Shape::OptionalGroup(_)) {
                names.push(path.to_string());
            }
            declare(&join(path, "*"), value, names);
        }
    }
}

fn collect_defaults(path: &str, members: &[(String, Shape)], defaults: &mut Vec<(String, String)>) {
    for (name, shape) in members {
        collect_shape_defaults(&member_path(path, name), shape, defaults);
    }
}

fn collect_shape_defaults(path: &str, shape: &Shape, defaults: &mut Vec<(String, String)>) {
    match shape {
        Shape::Leaf { default: Some(value) } => defaults.push((path.to_string(), value.clone())),
        Shape::Leaf { default: None } | Shape::Optional => {}
        Shape::Group(members) | Shape::OptionalGroup(members) => collect_defaults(path, members, defaults),
        Shape::List(element) => collect_shape_defaults(&format!("{}[*]", path), element, defaults),
        Shape::Map(value) => collect_shape_defaults(&join(path, "*"), value, defaults),
    }
}

/// Declares the members of a group.
#[derive(Debug, Clone, Default)]
pub struct GroupBuilder {
    members: Vec<(String, Shape)>,
}

impl GroupBuilder {
    fn member(mut self, name: impl Into<String>, shape: Shape) -> Self {
        self.members.push((name.into(), shape));
        self
    }

    fn nested<F>(build: F) -> Vec<(String, Shape)>
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        build(GroupBuilder::default()).members
    }

    /// A required scalar.
    pub fn leaf(self, name: impl Into<String>) -> Self {
        self.member(name, leaf())
    }

    /// A scalar with a default.
    pub fn leaf_with_default(self, name: impl Into<String>, default: impl Into<String>) -> Self {
        self.member(
            name,
            Shape::Leaf {
                default: Some(default.into()),
            },
        )
    }

    /// A scalar that may be absent.
    pub fn optional(self, name: impl Into<String>) -> Self {
        self.member(name, Shape::Optional)
    }

    /// A nested group.
    pub fn group<F>(self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.member(name, Shape::Group(Self::nested(build)))
    }

    /// A nested group that is absent unless some member is defined.
    pub fn optional_group<F>(self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.member(name, Shape::OptionalGroup(Self::nested(build)))
    }

    /// A list of scalars.
    pub fn list(self, name: impl Into<String>) -> Self {
        self.member(name, Shape::List(Box::new(leaf())))
    }

    /// A list of groups.
    pub fn list_of_groups<F>(self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.member(name, Shape::List(Box::new(Shape::Group(Self::nested(build)))))
    }

    /// A map of scalars.
    pub fn map(self, name: impl Into<String>) -> Self {
        self.member(name, Shape::Map(Box::new(leaf())))
    }

    /// A map whose values are lists of scalars.
    pub fn map_of_lists(self, name: impl Into<String>) -> Self {
        self.member(name, Shape::Map(Box::new(Shape::List(Box::new(leaf())))))
    }

    /// A map of groups.
    pub fn map_of_groups<F>(self, name: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.member(name, Shape::Map(Box::new(Shape::Group(Self::nested(build)))))
    }
}

/// Declares a [`ConfigMapping`].
#[derive(Debug, Clone)]
pub struct MappingBuilder {
    prefix: String,
    group: GroupBuilder,
}

macro_rules! delegate {
    ($( $(#[$doc:meta])* fn $method:ident($($arg:ident: $ty:ty),*); )*) => {
        $(
            $(#[$doc])*
            pub fn $method(mut self, $($arg: $ty),*) -> Self {
                self.group = self.group.$method($($arg),*);
                self
            }
        )*
    };
}

impl MappingBuilder {
    delegate! {
        /// A required scalar.
        fn leaf(name: &str);
        /// A scalar with a default.
        fn leaf_with_default(name: &str, default: &str);
        /// A scalar that may be absent.
        fn optional(name: &str);
        /// A list of scalars.
        fn list(name: &str);
        /// A map of scalars.
        fn map(name: &str);
        /// A map whose values are lists of scalars.
        fn map_of_lists(name: &str);
    }

    /// A nested group.
    pub fn group<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.group = self.group.group(name, build);
        self
    }

    /// A nested group that is absent unless some member is defined.
    pub fn optional_group<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.group = self.group.optional_group(name, build);
        self
    }

    /// A list of groups.
    pub fn list_of_groups<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.group = self.group.list_of_groups(name, build);
        self
    }

    /// A map of groups.
    pub fn map_of_groups<F>(mut self, name: &str, build: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        self.group = self.group.map_of_groups(name, build);
        self
    }

    /// Finish the mapping.
    pub fn build(self) -> ConfigMapping {
        ConfigMapping {
            prefix: self.prefix,
            members: self.group.members,
        }
    }
}
