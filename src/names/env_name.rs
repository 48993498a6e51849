//! Environment variable spellings of property names.
//!
//! Environment keys only carry alphanumerics and `_`, so one key such as
//! `FOO_BAR_BAZ` can stand for `foo.bar.baz`, `foo-bar.baz` or `foo.bar-baz`.
//! Lookups go from the canonical name to the key ([`EnvNames::lookup`]);
//! iteration needs the opposite direction, which only the declared names can
//! disambiguate ([`reconcile`]).

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::trace;

/// Replace every character that is not ASCII alphanumeric with `_`.
///
/// ```rust
/// use overlay_config::names::to_env_name;
///
/// assert_eq!(to_env_name("foo.bar-baz"), "foo_bar_baz");
/// assert_eq!(to_env_name("list[0]"), "list_0_");
/// assert_eq!(to_env_name("%dev.url"), "_dev_url");
/// ```
pub fn to_env_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Best-effort dotted form of a raw environment key.
///
/// Single underscores become dots, `_N_` becomes an index, a leading `_`
/// starts a profile qualifier and a `__` pair opens or closes a quoted key.
///
/// ```rust
/// use overlay_config::names::to_dotted_name;
///
/// assert_eq!(to_dotted_name("FOO_BAR"), "foo.bar");
/// assert_eq!(to_dotted_name("HOSTS_0_"), "hosts[0]");
/// assert_eq!(to_dotted_name("_DEV_DB_URL"), "%dev.db.url");
/// assert_eq!(to_dotted_name("MAP__A_B__PORT"), "map.\"a.b\".port");
/// ```
pub fn to_dotted_name(key: &str) -> String {
    let bytes = key.as_bytes();
    let mut dotted = String::with_capacity(key.len() + 2);
    let mut quoted = false;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'_' {
            dotted.push(char::from(b.to_ascii_lowercase()));
            i += 1;
            continue;
        }
        if i == 0 {
            dotted.push('%');
            i += 1;
            continue;
        }
        if bytes.get(i + 1) == Some(&b'_') {
            if quoted {
                dotted.push('"');
                if i + 2 < bytes.len() {
                    dotted.push('.');
                }
            } else {
                dotted.push_str(".\"");
            }
            quoted = !quoted;
            i += 2;
            continue;
        }
        if !quoted {
            if let Some(end) = index_end(bytes, i) {
                dotted.push('[');
                dotted.push_str(&key[i + 1..end]);
                dotted.push(']');
                if end + 1 < bytes.len() {
                    // the separator after an index
                    dotted.push('.');
                    i = end + 2;
                } else {
                    i = end + 1;
                }
                continue;
            }
        }
        dotted.push('.');
        i += 1;
    }
    dotted
}

/// For `_<digits>_` starting at `start`, the position of the closing `_` when
/// the key ends there or continues with another `_`.
fn index_end(bytes: &[u8], start: usize) -> Option<usize> {
    let digits = bytes[start + 1..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let end = start + 1 + digits;
    let closes = digits > 0 && bytes.get(end) == Some(&b'_');
    let followed = end + 1 == bytes.len() || bytes.get(end + 1) == Some(&b'_');
    (closes && followed).then_some(end)
}

/// Forward lookups from canonical names into an environment snapshot.
///
/// Each canonical name is tried as-is, then with every non-alphanumeric
/// character replaced by `_`, then uppercased. The outcome, hit or miss, is
/// cached per canonical name. Two threads racing on the same miss compute the
/// same answer, so the cache tolerates duplicate population.
#[derive(Debug, Default)]
pub struct EnvNames {
    vars: HashMap<String, String>,
    cache: RwLock<HashMap<String, Option<String>>>,
}

impl EnvNames {
    /// Wrap a snapshot of environment variables.
    pub fn new(vars: HashMap<String, String>) -> Self {
        Self {
            vars,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Value of the environment key that `name` normalizes to.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        let key = self.resolve_key(name)?;
        self.vars.get(&key).map(String::as_str)
    }

    /// The raw key that `name` normalizes to, if any.
    pub fn resolve_key(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.cache.read().get(name) {
            return cached.clone();
        }
        let key = self.lookup_key(name);
        if key.is_none() {
            trace!(name, "no environment key for property");
        }
        self.cache.write().insert(name.to_string(), key.clone());
        key
    }

    fn lookup_key(&self, name: &str) -> Option<String> {
        if self.vars.contains_key(name) {
            return Some(name.to_string());
        }
        let sanitized = to_env_name(name);
        if self.vars.contains_key(&sanitized) {
            return Some(sanitized);
        }
        let upper = sanitized.to_ascii_uppercase();
        self.vars.contains_key(&upper).then_some(upper)
    }

    /// Raw keys of the snapshot.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Value stored under the exact raw key.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Number of cached canonical names.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

/// Map raw environment keys onto the declared names they spell.
///
/// Declared names may contain `*` for a map key and `[*]` for an index; the
/// matched key or index is taken from the environment key. Keys that match no
/// declared name are left out. When several declared names match one key, the
/// first declared wins.
///
/// ```rust
/// use overlay_config::names::reconcile;
///
/// let declared = ["foo-bar.baz".to_string(), "routes.*.url".to_string()];
/// let names = reconcile(&declared, ["FOO_BAR_BAZ", "ROUTES_API_URL", "OTHER"]);
/// assert_eq!(names.get("FOO_BAR_BAZ").map(String::as_str), Some("foo-bar.baz"));
/// assert_eq!(names.get("ROUTES_API_URL").map(String::as_str), Some("routes.api.url"));
/// assert!(!names.contains_key("OTHER"));
/// ```
pub fn reconcile<'a, I>(declared: &[String], env_keys: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut reconciled = HashMap::new();
    for key in env_keys {
        if let Some(name) = declared.iter().find_map(|pattern| env_match(pattern, key)) {
            reconciled.insert(key.to_string(), name);
        }
    }
    reconciled
}

/// Dotted spelling of `key` under `declared`, when the two line up.
fn env_match(declared: &str, key: &str) -> Option<String> {
    if let Some(name) = match_from_end(declared.as_bytes(), key.as_bytes()) {
        return Some(name);
    }
    // `_DEV_FOO` against `foo` reads as `%dev.foo`
    let rest = key.strip_prefix('_')?;
    let separator = rest.find('_')?;
    let profile = &rest[..separator];
    if profile.is_empty() {
        return None;
    }
    let name = match_from_end(declared.as_bytes(), rest[separator + 1..].as_bytes())?;
    Some(format!("%{}.{}", profile.to_ascii_lowercase(), name))
}

fn match_from_end(declared: &[u8], key: &[u8]) -> Option<String> {
    // pieces are pushed back to front
    let mut pieces: Vec<String> = Vec::new();
    let (mut i, mut j) = (declared.len(), key.len());
    loop {
        match (i, j) {
            (0, 0) => break,
            (0, _) | (_, 0) => return None,
            _ => {}
        }
        let d = declared[i - 1];

        if d == b']' {
            let open = declared[..i - 1].iter().rposition(|&b| b == b'[')?;
            let index = &declared[open + 1..i - 1];
            if j < 3 || key[j - 1] != b'_' {
                return None;
            }
            let digits = key[..j - 1]
                .iter()
                .rev()
                .take_while(|b| b.is_ascii_digit())
                .count();
            let start = j - 1 - digits;
            if digits == 0 || start == 0 || key[start - 1] != b'_' {
                return None;
            }
            let found = &key[start..j - 1];
            if index != b"*" && index != found {
                return None;
            }
            pieces.push(format!("[{}]", String::from_utf8_lossy(found)));
            i = open;
            j = start - 1;
            continue;
        }

        if d == b'*' && (i == 1 || declared[i - 2] == b'.') {
            let (segment, start) = env_segment(key, j, i == 1)?;
            pieces.push(segment);
            i -= 1;
            j = start;
            continue;
        }

        let k = key[j - 1];
        if d.is_ascii_alphanumeric() {
            if !d.eq_ignore_ascii_case(&k) {
                return None;
            }
        } else if k != b'_' && k != d {
            return None;
        }
        pieces.push(char::from(d).to_string());
        i -= 1;
        j -= 1;
    }
    pieces.reverse();
    Some(pieces.concat())
}

/// The map key ending at `end`, and where it starts.
///
/// A key that ends in `_` is a quoted key: it comes back quoted with its
/// underscores read as dots, and its start leaves the opening `_` of the `__`
/// pair to act as the separator. When `whole` is set the key runs to the start
/// of `key`.
fn env_segment(key: &[u8], end: usize, whole: bool) -> Option<(String, usize)> {
    let lower = |bytes: &[u8]| String::from_utf8_lossy(bytes).to_ascii_lowercase();
    if key[end - 1] == b'_' {
        let (inner_start, start) = if whole {
            (1, 0)
        } else {
            let open = key[..end - 1].windows(2).rposition(|w| w == b"__")?;
            (open + 2, open + 1)
        };
        if inner_start >= end - 1 || (whole && key[0] != b'_') {
            return None;
        }
        let inner = lower(&key[inner_start..end - 1]).replace('_', ".");
        return Some((format!("\"{}\"", inner), start));
    }
    let start = if whole {
        0
    } else {
        key[..end].iter().rposition(|&b| b == b'_').map_or(0, |sep| sep + 1)
    };
    if start == end || (!whole && start == 0) {
        return None;
    }
    Some((lower(&key[start..end]), start))
}
