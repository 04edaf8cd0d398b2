//! Flag projector: turns a walk-ordered package list into the final
//! `cflags`/`libs` text, applying system-path filtering, direction-sensitive
//! de-duplication, and sysroot injection.
//!
//! `-I`/`-L` flags keep their first occurrence when de-duplicated, since
//! the earliest directory on the include/library search path should win;
//! `-l` flags keep their last occurrence, since static-link resolution
//! order depends on a library appearing after the objects that need it.

use std::collections::HashSet;

/// Which side of a `cflags` request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CflagsFilter {
    All,
    OnlyInclude,
    OnlyOther,
}

/// Which side of a `libs` request was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibsFilter {
    All,
    OnlyL,
    OnlyCapitalL,
    OnlyOther,
}

pub fn is_include(token: &str) -> bool {
    token.starts_with("-I")
}

pub fn is_lib_path(token: &str) -> bool {
    token.starts_with("-L")
}

pub fn is_lib_name(token: &str) -> bool {
    token.starts_with("-l")
}

/// `-I`/`-L`/defines "keep first": de-duplicates forward, preserving the
/// earliest occurrence's position.
fn dedup_keep_first(tokens: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens.filter(|t| seen.insert(t.clone())).collect()
}

/// `-l` "keeps last": de-duplicate from the right (reverse, dedupe, reverse)
/// so the latest occurrence's position is kept, satisfying static-link
/// resolution order.
fn dedup_keep_last(tokens: &[String]) -> Vec<String> {
    let mut reversed: Vec<String> = tokens.iter().rev().cloned().collect();
    let mut seen = HashSet::new();
    reversed.retain(|t| seen.insert(t.clone()));
    reversed.reverse();
    reversed
}

fn default_system_include_dirs() -> Vec<String> {
    vec!["/usr/include".to_string()]
}

/// Builds the full system-include list: `/usr/include` plus the
/// colon-separated entries of `PKG_CONFIG_SYSTEM_INCLUDE_PATH`, `C_PATH`,
/// `C_INCLUDE_PATH`, `CPLUS_INCLUDE_PATH`, in that precedence.
pub fn system_include_dirs(
    pkg_config_system_include_path: Option<&str>,
    c_path: Option<&str>,
    c_include_path: Option<&str>,
    cplus_include_path: Option<&str>,
) -> Vec<String> {
    let mut dirs = default_system_include_dirs();
    for extra in [
        pkg_config_system_include_path,
        c_path,
        c_include_path,
        cplus_include_path,
    ] {
        if let Some(value) = extra {
            dirs.extend(value.split(':').filter(|s| !s.is_empty()).map(str::to_string));
        }
    }
    dirs
}

fn is_system_include(token: &str, system_dirs: &[String]) -> bool {
    is_include(token) && system_dirs.iter().any(|dir| &token[2..] == dir)
}

/// The system libdir filter: matches `/usr/lib32*` and `/usr/lib64*` but
/// never bare `/usr/lib`.
fn is_system_libdir(token: &str) -> bool {
    is_lib_path(token) && {
        let path = &token[2..];
        path.starts_with("/usr/lib32") || path.starts_with("/usr/lib64")
    }
}

fn apply_sysroot_to_include(token: &str, sysroot: &str) -> String {
    format!("-I{sysroot}{}", &token[2..])
}

fn apply_sysroot_to_lib_path(token: &str, sysroot: &str) -> String {
    format!("-L{sysroot}{}", &token[2..])
}

fn apply_sysroot_to_lib_name(token: &str, sysroot: &str) -> String {
    format!("-l{sysroot}{}", &token[2..])
}

/// Projects Cflags tokens (already walk-ordered and expanded) to final
/// output text.
pub fn project_cflags(
    tokens: impl IntoIterator<Item = String>,
    system_dirs: &[String],
    allow_system_cflags: bool,
    sysroot: Option<&str>,
    filter: CflagsFilter,
) -> String {
    let filtered = tokens.into_iter().filter(|t| {
        allow_system_cflags || !is_system_include(t, system_dirs)
    });
    let deduped = dedup_keep_first(filtered);

    let sysrooted: Vec<String> = deduped
        .into_iter()
        .map(|t| match sysroot {
            Some(root) if is_include(&t) => apply_sysroot_to_include(&t, root),
            _ => t,
        })
        .collect();

    let selected: Vec<String> = sysrooted
        .into_iter()
        .filter(|t| match filter {
            CflagsFilter::All => true,
            CflagsFilter::OnlyInclude => is_include(t),
            CflagsFilter::OnlyOther => !is_include(t),
        })
        .collect();

    format_line(&selected)
}

/// Projects Libs tokens (plus `Libs.private` in static mode, already mixed
/// in by the caller in walk order) to final output text, splitting `-l`
/// flags from everything else so each side de-duplicates independently.
pub fn project_libs(
    tokens: impl IntoIterator<Item = String>,
    allow_system_libs: bool,
    sysroot: Option<&str>,
    filter: LibsFilter,
) -> String {
    let filtered: Vec<String> = tokens
        .into_iter()
        .filter(|t| allow_system_libs || !is_system_libdir(t))
        .collect();

    let l_and_other: Vec<String> = dedup_keep_first(
        filtered
            .iter()
            .filter(|t| !is_lib_name(t))
            .cloned(),
    );
    let l_partition_raw: Vec<String> = filtered.iter().filter(|t| is_lib_name(t)).cloned().collect();
    let l_partition = dedup_keep_last(&l_partition_raw);

    let sysroot_map = |t: String| -> String {
        match sysroot {
            Some(root) if is_lib_path(&t) => apply_sysroot_to_lib_path(&t, root),
            Some(root) if is_lib_name(&t) => apply_sysroot_to_lib_name(&t, root),
            _ => t,
        }
    };

    let l_and_other: Vec<String> = l_and_other.into_iter().map(sysroot_map).collect();
    let l_partition: Vec<String> = l_partition.into_iter().map(sysroot_map).collect();

    let combined: Vec<String> = match filter {
        LibsFilter::All => l_and_other.into_iter().chain(l_partition).collect(),
        LibsFilter::OnlyCapitalL => l_and_other.into_iter().filter(|t| is_lib_path(t)).collect(),
        LibsFilter::OnlyOther => l_and_other
            .into_iter()
            .filter(|t| !is_lib_path(t))
            .collect(),
        LibsFilter::OnlyL => l_partition,
    };

    format_line(&combined)
}

fn format_line(tokens: &[String]) -> String {
    if tokens.is_empty() {
        "\n".to_string()
    } else {
        format!("{}\n", tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_include_is_dropped_unless_allowed() {
        let dirs = system_include_dirs(None, None, None, None);
        let tokens = vec!["-I/usr/include".to_string(), "-I/opt/x/include".to_string()];
        let out = project_cflags(tokens.clone(), &dirs, false, None, CflagsFilter::All);
        assert_eq!(out, "-I/opt/x/include\n");
        let out_allowed = project_cflags(tokens, &dirs, true, None, CflagsFilter::All);
        assert_eq!(out_allowed, "-I/usr/include -I/opt/x/include\n");
    }

    #[test]
    fn cflags_dedup_preserves_first_occurrence_order() {
        let dirs = system_include_dirs(None, None, None, None);
        let tokens = vec!["-Ia".to_string(), "-Ib".to_string(), "-Ia".to_string()];
        let out = project_cflags(tokens, &dirs, true, None, CflagsFilter::All);
        assert_eq!(out, "-Ia -Ib\n");
    }

    #[test]
    fn sysroot_prefixes_include_path_after_flag() {
        let dirs = system_include_dirs(None, None, None, None);
        let tokens = vec!["-I/opt/x/include".to_string()];
        let out = project_cflags(tokens, &dirs, true, Some("/sysroot"), CflagsFilter::All);
        assert_eq!(out, "-I/sysroot/opt/x/include\n");
    }

    #[test]
    fn cflags_only_i_and_only_other_filter() {
        let dirs = system_include_dirs(None, None, None, None);
        let tokens = vec!["-Ia".to_string(), "-DFOO".to_string()];
        assert_eq!(
            project_cflags(tokens.clone(), &dirs, true, None, CflagsFilter::OnlyInclude),
            "-Ia\n"
        );
        assert_eq!(
            project_cflags(tokens, &dirs, true, None, CflagsFilter::OnlyOther),
            "-DFOO\n"
        );
    }

    #[test]
    fn system_libdir_filter_matches_lib32_lib64_but_not_bare_usr_lib() {
        assert!(is_system_libdir("-L/usr/lib32"));
        assert!(is_system_libdir("-L/usr/lib64"));
        assert!(is_system_libdir("-L/usr/lib32extra"));
        assert!(!is_system_libdir("-L/usr/lib"));
        assert!(!is_system_libdir("-L/usr/local/lib"));
    }

    #[test]
    fn libs_l_partition_dedupes_keeping_last_occurrence() {
        let tokens = vec![
            "-la".to_string(),
            "-lb".to_string(),
            "-la".to_string(),
        ];
        let out = project_libs(tokens, true, None, LibsFilter::OnlyL);
        assert_eq!(out, "-lb -la\n");
    }

    #[test]
    fn libs_combines_l_and_other_then_l_partition() {
        let tokens = vec!["-la".to_string(), "-L/opt/x/lib".to_string(), "-lb".to_string()];
        let out = project_libs(tokens, true, None, LibsFilter::All);
        assert_eq!(out, "-L/opt/x/lib -la -lb\n");
    }

    #[test]
    fn sysroot_prefixes_both_l_and_lowercase_l() {
        let tokens = vec!["-L/opt/x/lib".to_string(), "-lfoo".to_string()];
        let out = project_libs(tokens, true, Some("/sysroot"), LibsFilter::All);
        assert_eq!(out, "-L/sysroot/opt/x/lib -l/sysroot/foo\n");
    }

    #[test]
    fn empty_projection_is_just_a_newline() {
        let out = project_libs(Vec::<String>::new(), true, None, LibsFilter::All);
        assert_eq!(out, "\n");
    }
}
