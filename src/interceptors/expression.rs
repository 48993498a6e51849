//! Property expressions: `${name}`, `${name:default}` and nesting.

use super::{ConfigInterceptor, InterceptorContext, priority, proceed_names};
use crate::core::{ConfigValue, Problem};
use std::collections::BTreeSet;

/// Maximum nesting of expansions before giving up.
pub const MAX_DEPTH: usize = 32;

/// Expands `${...}` expressions in values.
///
/// - `${name}` is replaced by the value of `name`
/// - `${name:default}` falls back to `default` when `name` is undefined
/// - expressions nest, in the name (`${db.${env}.url}`) and in the default
/// - `\$` is a literal `$`
///
/// Referenced values are expanded in turn. An undefined reference without a
/// default, or expansion deeper than [`MAX_DEPTH`], is recorded as a
/// [`Problem`] on the returned value, whose processed value is then removed.
/// The raw value is always kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionInterceptor;

impl ExpressionInterceptor {
    /// Create the interceptor.
    pub fn new() -> Self {
        Self
    }

    fn expand_value(&self, ctx: &InterceptorContext<'_>, value: ConfigValue) -> ConfigValue {
        if !value.value().is_some_and(|text| text.contains('$')) {
            return value;
        }
        let mut problems = Vec::new();
        let expanded = expand(ctx, value.value().unwrap_or_default(), 0, &mut problems);
        if problems.is_empty() {
            return value.with_value(Some(expanded));
        }
        problems
            .into_iter()
            .fold(value.with_value(None), ConfigValue::with_problem)
    }
}

fn expand(ctx: &InterceptorContext<'_>, text: &str, depth: usize, problems: &mut Vec<Problem>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(at) = rest.find(['$', '\\']) {
        out.push_str(&rest[..at]);
        let tail = &rest[at..];
        if let Some(after) = tail.strip_prefix("\\$") {
            out.push('$');
            rest = after;
            continue;
        }
        if !tail.starts_with("${") {
            let (c, after) = tail.split_at(1);
            out.push_str(c);
            rest = after;
            continue;
        }
        let Some(close) = matching_brace(tail) else {
            // unterminated, kept verbatim
            out.push_str(tail);
            return out;
        };
        let body = &tail[2..close];
        out.push_str(&resolve(ctx, body, depth, problems));
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

fn resolve(ctx: &InterceptorContext<'_>, body: &str, depth: usize, problems: &mut Vec<Problem>) -> String {
    if depth >= MAX_DEPTH {
        if !problems.contains(&Problem::ExpressionTooDeep) {
            problems.push(Problem::ExpressionTooDeep);
        }
        return String::new();
    }
    let (key, default) = match default_separator(body) {
        Some(colon) => (&body[..colon], Some(&body[colon + 1..])),
        None => (body, None),
    };
    let key = expand(ctx, key, depth + 1, problems);
    let found = ctx.proceed(&key);
    if let Some(raw) = found.as_ref().and_then(ConfigValue::value) {
        return expand(ctx, raw, depth + 1, problems);
    }
    let carried = found.map(|value| value.problems().to_vec()).unwrap_or_default();
    let had_problems = !carried.is_empty();
    problems.extend(carried);
    match default {
        Some(default) => expand(ctx, default, depth + 1, problems),
        None => {
            if !had_problems {
                problems.push(Problem::ExpressionNotFound {
                    expression: body.to_string(),
                });
            }
            String::new()
        }
    }
}

/// Index of the `}` closing the `${` at the start of `text`.
fn matching_brace(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// First `:` outside nested expressions.
fn default_separator(body: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b':' if depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

impl ConfigInterceptor for ExpressionInterceptor {
    fn name(&self) -> &str {
        "expression"
    }

    fn priority(&self) -> i32 {
        priority::LIBRARY + 900
    }

    fn get_value(&self, ctx: &InterceptorContext<'_>, name: &str) -> Option<ConfigValue> {
        ctx.proceed(name).map(|value| self.expand_value(ctx, value))
    }

    fn iterate_names(&self, ctx: &InterceptorContext<'_>) -> BTreeSet<String> {
        proceed_names(ctx)
    }

    fn iterate_values(&self, ctx: &InterceptorContext<'_>) -> Vec<ConfigValue> {
        ctx.iterate_values()
            .into_iter()
            .map(|value| self.expand_value(ctx, value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptors::tests::registry;
    use crate::interceptors::{InterceptorChain, SecretAccess};
    use std::sync::Arc;

    fn lookup(pairs: &[(&str, &str)], name: &str) -> ConfigValue {
        let registry = registry(pairs);
        let chain = InterceptorChain::new(vec![Arc::new(ExpressionInterceptor::new())]);
        chain
            .context(&registry, SecretAccess::Locked)
            .proceed(name)
            .unwrap()
    }

    #[test]
    fn test_simple_and_nested() {
        let pairs = [
            ("host", "localhost"),
            ("port", "${http.port}"),
            ("http.port", "8080"),
            ("url", "http://${host}:${port}/"),
            ("env", "prod"),
            ("db.prod.url", "pg://prod"),
            ("db.url", "${db.${env}.url}"),
        ];
        assert_eq!(lookup(&pairs, "url").value(), Some("http://localhost:8080/"));
        assert_eq!(lookup(&pairs, "db.url").value(), Some("pg://prod"));
        assert_eq!(lookup(&pairs, "url").raw_value(), Some("http://${host}:${port}/"));
    }

    #[test]
    fn test_defaults() {
        let pairs = [
            ("a", "${missing:fallback}"),
            ("b", "${missing:${other}}"),
            ("other", "x"),
            ("c", "${missing:}"),
            ("d", "${missing:http://h:1}"),
        ];
        assert_eq!(lookup(&pairs, "a").value(), Some("fallback"));
        assert_eq!(lookup(&pairs, "b").value(), Some("x"));
        assert_eq!(lookup(&pairs, "c").value(), Some(""));
        assert_eq!(lookup(&pairs, "d").value(), Some("http://h:1"));
    }

    #[test]
    fn test_escape_and_plain_dollar() {
        let pairs = [("a", "\\${not} costs $5")];
        assert_eq!(lookup(&pairs, "a").value(), Some("${not} costs $5"));
    }

    #[test]
    fn test_missing_reference_is_problem() {
        let value = lookup(&[("a", "x-${missing}")], "a");
        assert_eq!(value.value(), None);
        assert_eq!(value.raw_value(), Some("x-${missing}"));
        assert_eq!(
            value.problems(),
            &[Problem::ExpressionNotFound {
                expression: "missing".into()
            }]
        );
    }

    #[test]
    fn test_cycle_is_too_deep() {
        let value = lookup(&[("a", "${b}"), ("b", "${a}")], "a");
        assert_eq!(value.value(), None);
        assert!(value.problems().contains(&Problem::ExpressionTooDeep));
    }

    #[test]
    fn test_unterminated_kept() {
        assert_eq!(lookup(&[("a", "${open")], "a").value(), Some("${open"));
    }
}
