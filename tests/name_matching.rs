//! Property-based tests for wildcard names, the matcher index and key maps.

use overlay_config::names::{KeyMap, NameMatcherIndex, PropertyName, to_dotted_name, to_env_name};
use proptest::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of(name: &PropertyName) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish()
}

fn segment() -> impl Strategy<Value = String> {
    let base = prop_oneof![
        4 => "[a-c]{1,2}",
        2 => Just("*".to_string()),
        1 => Just("\"a.b\"".to_string()),
        1 => Just("\"c[1]\"".to_string()),
    ];
    let index = prop_oneof![
        4 => Just(String::new()),
        1 => "\\[[0-9]\\]",
        1 => Just("[*]".to_string()),
    ];
    (base, index).prop_map(|(base, index)| format!("{}{}", base, index))
}

fn concrete_name() -> impl Strategy<Value = String> {
    let segment = ("[a-c]{1,2}", prop::option::of(0u8..10))
        .prop_map(|(base, index)| match index {
            Some(index) => format!("{}[{}]", base, index),
            None => base,
        });
    prop::collection::vec(segment, 1..6).prop_map(|segments| segments.join("."))
}

fn name() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 1..5).prop_map(|segments| segments.join("."))
}

/// A concrete name the pattern must accept.
fn instantiate(pattern: &str) -> String {
    pattern
        .split('.')
        .map(|segment| segment.replace("[*]", "[7]"))
        .map(|segment| match segment.strip_prefix('*') {
            Some(rest) => format!("key{}", rest),
            None => segment,
        })
        .collect::<Vec<_>>()
        .join(".")
}

proptest! {
    #[test]
    fn test_equality_is_symmetric(a in name(), b in name()) {
        prop_assert_eq!(PropertyName::equals(&a, &b), PropertyName::equals(&b, &a));
    }

    #[test]
    fn test_equal_names_hash_alike(a in name(), b in name()) {
        let (a, b) = (PropertyName::new(a), PropertyName::new(b));
        if a == b {
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    #[test]
    fn test_pattern_matches_its_instances(pattern in name()) {
        let concrete = instantiate(&pattern);
        prop_assert!(PropertyName::equals(&pattern, &concrete), "{} vs {}", pattern, concrete);
        prop_assert_eq!(
            hash_of(&PropertyName::new(pattern.as_str())),
            hash_of(&PropertyName::new(concrete.as_str()))
        );

        let index = NameMatcherIndex::new([pattern.as_str(), "unrelated.name"]);
        prop_assert!(index.matches(&concrete), "{} vs {}", pattern, concrete);
    }

    #[test]
    fn test_index_agrees_with_equality(pattern in name(), candidate in concrete_name()) {
        let index = NameMatcherIndex::new([pattern.as_str()]);
        prop_assert_eq!(
            index.matches(&candidate),
            PropertyName::equals(&pattern, &candidate),
            "{} vs {}", pattern, candidate
        );
    }

    #[test]
    fn test_env_name_is_stable(name in "[a-z]{1,4}(\\.[a-z]{1,4}){0,3}") {
        let env = to_env_name(&name).to_ascii_uppercase();
        prop_assert_eq!(to_dotted_name(&env), name);
    }
}

#[test]
fn test_indexed_names_and_wildcards() {
    assert!(PropertyName::equals("foo.bar[0]", "foo.bar[*]"));
    assert!(PropertyName::equals("foo.*[*].x", "foo.a[3].x"));
    assert!(!PropertyName::equals("foo.bar[*]", "foo.bar"));
    assert!(!PropertyName::equals("foo.*.x", "foo.a.b.x"));
}

#[test]
fn test_matcher_index_declared_names() {
    let index = NameMatcherIndex::new([
        "server.host",
        "server.routes[*].path",
        "server.labels.*",
        "server.backends.*.url",
    ]);

    assert!(index.matches("server.host"));
    assert!(index.matches("server.routes[12].path"));
    assert!(index.matches("server.labels.team"));
    assert!(index.matches("server.labels.\"a.b\""));
    assert!(index.matches("server.backends.primary.url"));
    assert!(!index.matches("server.hots"));
    assert!(!index.matches("server.routes[0].paht"));
    assert!(!index.matches("client.host"));
    assert!(!index.matches("server.backends.primary.extra.url"));
    assert_eq!(index.len(), 4);
}

#[test]
fn test_key_map_wildcards_and_recursion() {
    let mut map = KeyMap::new();
    map.find_or_add("server.*.port").put_root_value(1);
    map.find_or_add("server.admin.port").put_root_value(2);
    map.find_or_add("hosts[*]").put_root_value(3);
    map.find_or_add("extensions.**").put_root_value(4);

    assert_eq!(map.find_root_value("server.api.port"), Some(&1));
    assert_eq!(map.find_root_value("server.admin.port"), Some(&2));
    assert_eq!(map.find_root_value("hosts[5]"), Some(&3));
    assert_eq!(map.find_root_value("extensions.a.b.c"), Some(&4));
    assert!(!map.has_root_value("server.api"));
    assert!(map.find("server").is_some_and(|node| node.any().is_some()));
}

#[test]
fn test_key_map_merge_keeps_existing_values() {
    let mut first = KeyMap::new();
    first.find_or_add("a.b").put_root_value("first");

    let mut second = KeyMap::new();
    second.find_or_add("a.b").put_root_value("second");
    second.find_or_add("a.c").put_root_value("second");

    first.merge(second);
    assert_eq!(first.find_root_value("a.b"), Some(&"first"));
    assert_eq!(first.find_root_value("a.c"), Some(&"second"));
}
