//! Dependency walker: recursive resolution of a package's `Requires` graph,
//! with per-node version checks and two link-order projection modes.

use std::collections::HashSet;

use log::trace;

use crate::context::Context;
use crate::error::Error;
use crate::expand;
use crate::model::{PropertyKind, REQUIRES, REQUIRES_PRIVATE, VERSION};
use crate::version::Comparator;

/// Which of `Requires` / `Requires.private` to traverse, selected by the
/// CLI driver from the active query mode.
#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    pub traverse_requires: bool,
    pub traverse_requires_private: bool,
    pub max_depth: u32,
}

impl Default for WalkOptions {
    fn default() -> Self {
        WalkOptions {
            traverse_requires: true,
            traverse_requires_private: false,
            max_depth: 2000,
        }
    }
}

/// A positional package request, optionally constrained to a version range.
#[derive(Debug, Clone)]
pub struct PackageRequest {
    pub name: String,
    pub constraint: Option<(Comparator, String)>,
}

/// The result of walking one or more root requests: the raw accumulation
/// list (duplicates permitted), whether any failure occurred, and
/// human-readable diagnostics for those failures.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub accumulated: Vec<String>,
    pub ok: bool,
    pub diagnostics: Vec<String>,
}

/// Splits a fused `name OP version` token (or bare `name`) back into parts.
pub fn parse_requires_token(token: &str) -> (String, Option<(Comparator, String)>) {
    const OPS: [&str; 6] = ["<=", ">=", "!=", "<", ">", "="];
    let mut best: Option<(usize, &str)> = None;
    for op in OPS {
        if let Some(idx) = token.find(op) {
            match best {
                Some((best_idx, best_op)) if best_idx < idx || (best_idx == idx && best_op.len() >= op.len()) => {}
                _ => best = Some((idx, op)),
            }
        }
    }
    match best {
        Some((idx, op)) => {
            let name = token[..idx].to_string();
            let version = token[idx + op.len()..].to_string();
            let comparator = op.parse().unwrap_or(Comparator::Equal);
            (name, Some((comparator, version)))
        }
        None => (token.to_string(), None),
    }
}

/// Walks every root request, accumulating into one shared list.
pub fn walk_roots(ctx: &mut Context, roots: &[PackageRequest], opts: &WalkOptions) -> WalkOutcome {
    let mut outcome = WalkOutcome {
        ok: true,
        ..Default::default()
    };
    for root in roots {
        walk_one(ctx, &root.name, root.constraint.clone(), opts, 0, &mut outcome);
    }
    outcome
}

fn walk_one(
    ctx: &mut Context,
    name: &str,
    constraint: Option<(Comparator, String)>,
    opts: &WalkOptions,
    depth: u32,
    outcome: &mut WalkOutcome,
) {
    if depth > opts.max_depth {
        outcome.ok = false;
        outcome.diagnostics.push(
            Error::MaxDepthExceeded {
                name: name.to_string(),
                depth: opts.max_depth,
            }
            .to_string(),
        );
        return;
    }

    let first_visit = ctx.cached(name).is_none();
    trace!("walking '{name}' (depth {depth}, first visit: {first_visit})");

    let pc = match ctx.lookup(name) {
        Ok(pc) => pc,
        Err(_) => {
            outcome.ok = false;
            outcome.diagnostics.push(format!("Package '{name}' was not found"));
            return;
        }
    };

    // Clone out everything needed before recursing, so the borrow of `ctx`
    // from `lookup` is released; the walker recurses with `&mut ctx`.
    let file_vars = pc.variables().clone();
    let installed_version = pc
        .property_raw(VERSION)
        .and_then(|v| v.first())
        .cloned()
        .unwrap_or_default();
    let requires_raw = pc.property_raw(REQUIRES).map(<[String]>::to_vec);
    let requires_private_raw = pc.property_raw(REQUIRES_PRIVATE).map(<[String]>::to_vec);

    outcome.accumulated.insert(0, name.to_string());

    if let Some((op, required_version)) = &constraint {
        if !op.eval(&installed_version, required_version) {
            outcome.ok = false;
            outcome.diagnostics.push(format!(
                "Requested '{name} {op} {required_version}' but version of {name} is {installed_version}"
            ));
        }
    }

    if !first_visit {
        // Already walked via another path: version check only, no re-traversal.
        return;
    }

    let overrides = ctx.overrides_for(name);
    let mut child_tokens = Vec::new();
    if opts.traverse_requires {
        if let Some(tokens) = requires_raw {
            child_tokens.extend(expand::expand_property(
                PropertyKind::RequiresLike,
                &tokens,
                &file_vars,
                &overrides,
            ));
        }
    }
    if opts.traverse_requires_private {
        if let Some(tokens) = requires_private_raw {
            child_tokens.extend(expand::expand_property(
                PropertyKind::RequiresLike,
                &tokens,
                &file_vars,
                &overrides,
            ));
        }
    }

    for token in child_tokens {
        let (child_name, child_constraint) = parse_requires_token(&token);
        walk_one(ctx, &child_name, child_constraint, opts, depth + 1, outcome);
    }
}

/// Shared-mode projection: walk head to tail, keep first occurrence, then
/// reverse. Yields dependency order (dependents before dependencies) with
/// duplicates suppressed.
pub fn project_shared(accumulated: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut deduped: Vec<String> = accumulated
        .iter()
        .filter(|name| seen.insert((*name).clone()))
        .cloned()
        .collect();
    deduped.reverse();
    deduped
}

/// Static-mode projection: reverse the raw list without dedup, so repeated
/// occurrences survive for archive-linker resolution order.
pub fn project_static(accumulated: &[String]) -> Vec<String> {
    let mut list = accumulated.to_vec();
    list.reverse();
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup(files: &[(&str, &str)]) -> (tempfile::TempDir, Context) {
        let dir = tempdir().unwrap();
        for (name, contents) in files {
            std::fs::write(dir.path().join(format!("{name}.pc")), contents).unwrap();
        }
        let ctx = Context::new(
            vec![dir.path().to_path_buf()],
            None,
            crate::context::ContextFlags::NONE,
            vec![],
        );
        (dir, ctx)
    }

    #[test]
    fn parse_requires_token_splits_name_and_constraint() {
        assert_eq!(
            parse_requires_token("foo>=1.2"),
            ("foo".to_string(), Some((Comparator::GreaterThanEqual, "1.2".to_string())))
        );
        assert_eq!(parse_requires_token("bar"), ("bar".to_string(), None));
    }

    #[test]
    fn walk_accumulates_transitive_requires() {
        let (_dir, mut ctx) = setup(&[
            (
                "a",
                "Name: a\nDescription: A\nVersion: 1.0\nRequires: b\nLibs: -la\n",
            ),
            ("b", "Name: b\nDescription: B\nVersion: 1.0\nLibs: -lb\n"),
        ]);
        let roots = vec![PackageRequest {
            name: "a".to_string(),
            constraint: None,
        }];
        let outcome = walk_roots(&mut ctx, &roots, &WalkOptions::default());
        assert!(outcome.ok);
        assert_eq!(project_shared(&outcome.accumulated), vec!["a", "b"]);
    }

    #[test]
    fn walk_reports_version_mismatch_without_aborting() {
        let (_dir, mut ctx) = setup(&[
            (
                "a",
                "Name: a\nDescription: A\nVersion: 1.0\nRequires: b >= 2.0\nLibs: -la\n",
            ),
            ("b", "Name: b\nDescription: B\nVersion: 1.5\nLibs: -lb\n"),
        ]);
        let roots = vec![PackageRequest {
            name: "a".to_string(),
            constraint: None,
        }];
        let outcome = walk_roots(&mut ctx, &roots, &WalkOptions::default());
        assert!(!outcome.ok);
        assert!(outcome.diagnostics.iter().any(|d| d.contains('b')));
        // The walk still completes rather than aborting.
        assert_eq!(project_shared(&outcome.accumulated), vec!["a", "b"]);
    }

    #[test]
    fn walk_reports_not_found_without_aborting_siblings() {
        let (_dir, mut ctx) = setup(&[(
            "a",
            "Name: a\nDescription: A\nVersion: 1.0\nRequires: missing\nLibs: -la\n",
        )]);
        let roots = vec![PackageRequest {
            name: "a".to_string(),
            constraint: None,
        }];
        let outcome = walk_roots(&mut ctx, &roots, &WalkOptions::default());
        assert!(!outcome.ok);
        assert!(outcome.diagnostics.iter().any(|d| d.contains("missing")));
    }

    #[test]
    fn project_static_preserves_duplicates_in_reverse_order() {
        let accumulated = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(project_static(&accumulated), vec!["b", "a", "b"]);
    }

    #[test]
    fn project_shared_dedupes_keeping_first_occurrence_then_reverses() {
        let accumulated = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(project_shared(&accumulated), vec!["a", "b"]);
    }

    #[test]
    fn already_cached_dependency_only_gets_a_version_check() {
        let (_dir, mut ctx) = setup(&[
            (
                "a",
                "Name: a\nDescription: A\nVersion: 1.0\nRequires: b, c\nLibs: -la\n",
            ),
            (
                "b",
                "Name: b\nDescription: B\nVersion: 1.0\nRequires: c\nLibs: -lb\n",
            ),
            ("c", "Name: c\nDescription: C\nVersion: 1.0\nLibs: -lc\n"),
        ]);
        let roots = vec![PackageRequest {
            name: "a".to_string(),
            constraint: None,
        }];
        let outcome = walk_roots(&mut ctx, &roots, &WalkOptions::default());
        assert!(outcome.ok);
        // c is reachable via both a and b; it appears twice in the raw
        // accumulation but only once after shared-mode projection.
        assert_eq!(outcome.accumulated.iter().filter(|n| *n == "c").count(), 2);
        assert_eq!(project_shared(&outcome.accumulated), vec!["a", "b", "c"]);
    }
}
