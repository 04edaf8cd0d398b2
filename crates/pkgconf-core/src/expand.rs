//! Variable expander: substitutes `${name}` references using CLI/env
//! overrides first, then the file's own variables, then the empty string.
//!
//! An override whose own value contains a `${...}` reference is substituted
//! literally, once, rather than being expanded further: this keeps an
//! override like `--define-variable=prefix=${exec_prefix}` from silently
//! resolving against the *target* file's variables instead of the caller's
//! intended literal text.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::Regex;
use std::sync::LazyLock;

use crate::model::PropertyKind;

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([A-Za-z0-9_.]+)\}").unwrap());

/// Guards against pathological self-reference among file variables.
const MAX_ITERATIONS: usize = 64;

fn contains_ref(s: &str) -> bool {
    VAR_REF.is_match(s)
}

/// An override is "opaque" if its value itself contains a `${...}`
/// reference: it gets substituted literally, once, with no further
/// expansion of the substituted text.
fn is_opaque(name: &str, overrides: &HashMap<String, String>) -> bool {
    overrides.get(name).is_some_and(|v| contains_ref(v))
}

fn referenced_names(s: &str) -> Vec<String> {
    VAR_REF
        .captures_iter(s)
        .map(|c| c[1].to_string())
        .collect()
}

/// Resolves a single non-opaque reference: an override wins, then the
/// file's own variable, then the empty string.
fn resolve_non_opaque(
    name: &str,
    file_vars: &IndexMap<String, String>,
    overrides: &HashMap<String, String>,
) -> String {
    if let Some(v) = overrides.get(name) {
        // Not opaque by construction (caller already excluded opaque names).
        return v.clone();
    }
    if let Some(v) = file_vars.get(name) {
        return v.clone();
    }
    String::new()
}

/// Substitutes every `${name}` occurrence for one specific name with a
/// literal replacement string (used for the opaque, one-shot rule).
fn substitute_literal(s: &str, name: &str, replacement: &str) -> String {
    let needle = format!("${{{name}}}");
    s.replace(&needle, replacement)
}

/// Substitutes every reference in `s` simultaneously, one pass, using the
/// non-opaque resolution rule.
fn substitute_all(
    s: &str,
    file_vars: &IndexMap<String, String>,
    overrides: &HashMap<String, String>,
) -> String {
    VAR_REF
        .replace_all(s, |caps: &regex::Captures| {
            resolve_non_opaque(&caps[1], file_vars, overrides)
        })
        .into_owned()
}

/// Expands `${...}` references in `s`.
pub fn expand(
    s: &str,
    file_vars: &IndexMap<String, String>,
    overrides: &HashMap<String, String>,
) -> String {
    let mut current = s.to_string();

    for _ in 0..MAX_ITERATIONS {
        if !contains_ref(&current) {
            break;
        }

        let refs = referenced_names(&current);
        if let Some(opaque_name) = refs.iter().find(|n| is_opaque(n, overrides)) {
            let replacement = overrides.get(opaque_name).unwrap();
            current = substitute_literal(&current, opaque_name, replacement);
            break;
        }

        let next = substitute_all(&current, file_vars, overrides);
        if next == current {
            break;
        }
        current = next;
    }

    current
}

/// Expands a property's tokens, re-splitting any token whose expansion
/// changed its text.
pub fn expand_property(
    kind: PropertyKind,
    tokens: &[String],
    file_vars: &IndexMap<String, String>,
    overrides: &HashMap<String, String>,
) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let expanded = expand(token, file_vars, overrides);
        if expanded == *token {
            out.push(token.clone());
        } else {
            out.extend(kind.split(&expanded));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn overrides(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn undefined_variable_expands_to_empty() {
        let v = vars(&[]);
        let o = overrides(&[]);
        assert_eq!(expand("${missing}", &v, &o), "");
    }

    #[test]
    fn file_variable_is_substituted() {
        let v = vars(&[("prefix", "/usr")]);
        let o = overrides(&[]);
        assert_eq!(expand("${prefix}/lib", &v, &o), "/usr/lib");
    }

    #[test]
    fn nested_file_variables_expand_transitively() {
        let v = vars(&[("prefix", "/usr"), ("libdir", "${prefix}/lib")]);
        let o = overrides(&[]);
        assert_eq!(expand("${libdir}", &v, &o), "/usr/lib");
    }

    #[test]
    fn plain_override_wins_over_file_variable() {
        let v = vars(&[("prefix", "/usr")]);
        let o = overrides(&[("prefix", "/opt")]);
        assert_eq!(expand("${prefix}/lib", &v, &o), "/opt/lib");
    }

    #[test]
    fn opaque_override_is_substituted_literally_and_halts() {
        let v = vars(&[("libdir", "/real/lib")]);
        let o = overrides(&[("prefix", "${libdir}/nested")]);
        // prefix's override value itself contains a reference, so it is
        // substituted as-is (not expanded) and the whole string's expansion
        // halts immediately.
        assert_eq!(expand("${prefix}", &v, &o), "${libdir}/nested");
    }

    #[test]
    fn expansion_of_fully_resolved_string_is_a_no_op() {
        let v = vars(&[]);
        let o = overrides(&[]);
        assert_eq!(expand("-lfoo -lbar", &v, &o), "-lfoo -lbar");
    }

    #[test]
    fn expand_property_resplits_when_expansion_changes_token() {
        let v = vars(&[("extra", "-la -lb")]);
        let o = overrides(&[]);
        let tokens = vec!["${extra}".to_string()];
        let out = expand_property(PropertyKind::LibsLike, &tokens, &v, &o);
        assert_eq!(out, vec!["-la".to_string(), "-lb".to_string()]);
    }

    #[test]
    fn expand_property_keeps_unchanged_token_as_is() {
        let v = vars(&[]);
        let o = overrides(&[]);
        let tokens = vec!["-lfoo".to_string()];
        let out = expand_property(PropertyKind::LibsLike, &tokens, &v, &o);
        assert_eq!(out, vec!["-lfoo".to_string()]);
    }
}
