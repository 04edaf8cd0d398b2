//! The value model: an in-memory representation of one parsed `.pc` file.
//!
//! [`PkgConfig`] keeps variables and properties in insertion order, so that
//! round-tripping through [`PkgConfig::serialize`] and the parser yields an
//! equivalent model, and rejects duplicate names at insertion time rather
//! than silently overwriting.

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Property names that are split and re-split the same way `Requires` is.
pub const REQUIRES: &str = "Requires";
pub const REQUIRES_PRIVATE: &str = "Requires.private";
pub const CONFLICTS: &str = "Conflicts";

/// Property names that behave like `Libs`: deduplicated in place, kept
/// first-occurrence, serialized with a single leading space.
pub const LIBS: &str = "Libs";
pub const LIBS_PRIVATE: &str = "Libs.private";

pub const NAME: &str = "Name";
pub const DESCRIPTION: &str = "Description";
pub const VERSION: &str = "Version";
pub const URL: &str = "URL";
pub const CFLAGS: &str = "Cflags";

/// Properties that must be present for a file to be valid.
pub const REQUIRED_PROPERTIES: [&str; 3] = [NAME, DESCRIPTION, VERSION];

/// Per-property-kind tokenization dispatch: each well-known property name
/// splits its raw value into tokens a different way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// `Requires`, `Requires.private`, `Conflicts`: tokens are `name` or
    /// `name OP version`, split on commas/whitespace then fused.
    RequiresLike,
    /// `Libs`, `Libs.private`: whitespace-split like [`PropertyKind::Default`],
    /// but deduplicated in place after parsing.
    LibsLike,
    /// Everything else: split on runs of unescaped whitespace.
    Default,
}

impl PropertyKind {
    /// Classifies a property name by the well-known names pkg-config gives
    /// special tokenization treatment.
    pub fn of(name: &str) -> Self {
        match name {
            REQUIRES | REQUIRES_PRIVATE | CONFLICTS => PropertyKind::RequiresLike,
            LIBS | LIBS_PRIVATE => PropertyKind::LibsLike,
            _ => PropertyKind::Default,
        }
    }

    /// Splits a raw property value into tokens using this kind's rule.
    pub fn split(self, raw: &str) -> Vec<String> {
        match self {
            PropertyKind::RequiresLike => split_requires_like(raw),
            PropertyKind::LibsLike => {
                let mut tokens = split_whitespace_preserving_escapes(raw);
                dedup_keep_first(&mut tokens);
                tokens
            }
            PropertyKind::Default => split_whitespace_preserving_escapes(raw),
        }
    }
}

/// Splits on commas/whitespace, then fuses a trailing/leading relational
/// operator back onto its neighbor so `foo >= 1.2` and `foo>=1.2` both
/// collapse to a single `"foo>=1.2"` token.
fn split_requires_like(raw: &str) -> Vec<String> {
    const OPS: [&str; 6] = ["<=", ">=", "!=", "<", ">", "="];

    let rough: Vec<&str> = raw
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();

    let mut fused: Vec<String> = Vec::with_capacity(rough.len());
    let mut i = 0;
    while i < rough.len() {
        let piece = rough[i];
        let starts_with_op = OPS.iter().any(|op| piece.starts_with(op));
        let is_bare_op = OPS.contains(&piece);

        if starts_with_op && !is_bare_op {
            // e.g. ">=1.2" glued onto the previous name token.
            if let Some(last) = fused.last_mut() {
                last.push_str(piece);
            } else {
                fused.push(piece.to_string());
            }
        } else if is_bare_op {
            // bare "foo", ">=", "1.2" sequence: glue op onto previous, then
            // glue the following version onto the (now op-bearing) token.
            if let Some(last) = fused.last_mut() {
                last.push_str(piece);
            } else {
                fused.push(piece.to_string());
            }
        } else if let Some(last) = fused.last() {
            let last_ends_with_op = OPS.iter().any(|op| last.ends_with(op));
            if last_ends_with_op {
                fused.last_mut().unwrap().push_str(piece);
            } else {
                fused.push(piece.to_string());
            }
        } else {
            fused.push(piece.to_string());
        }
        i += 1;
    }
    fused
}

/// Splits on runs of unescaped whitespace, keeping `\ ` as a literal space
/// within a token rather than as a delimiter.
fn split_whitespace_preserving_escapes(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next.is_whitespace() {
                    current.push(next);
                    chars.next();
                    continue;
                }
            }
            current.push(c);
        } else if c.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Deduplicates a token list in place, keeping each token's first occurrence.
pub fn dedup_keep_first(tokens: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    tokens.retain(|t| seen.insert(t.clone()));
}

/// One parsed `.pc` file: raw, unexpanded variables and properties, in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct PkgConfig {
    /// The package name this model was loaded under (the search key, not
    /// necessarily the `Name` property).
    pub package_name: String,
    variables: IndexMap<String, String>,
    properties: IndexMap<String, Vec<String>>,
}

impl PkgConfig {
    pub fn new(package_name: impl Into<String>) -> Self {
        PkgConfig {
            package_name: package_name.into(),
            variables: IndexMap::new(),
            properties: IndexMap::new(),
        }
    }

    /// Adds a variable; duplicate names within a file are a parse error.
    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.variables.contains_key(&name) {
            return Err(Error::ParseError {
                path: Default::default(),
                line: 0,
                message: format!("duplicate variable '{name}'"),
            });
        }
        self.variables.insert(name, value.into());
        Ok(())
    }

    /// Adds a property from its already-tokenized form; duplicate property
    /// names within a file are a parse error.
    pub fn add_property(&mut self, name: impl Into<String>, tokens: Vec<String>) -> Result<()> {
        let name = name.into();
        if self.properties.contains_key(&name) {
            return Err(Error::ParseError {
                path: Default::default(),
                line: 0,
                message: format!("duplicate property '{name}'"),
            });
        }
        self.properties.insert(name, tokens);
        Ok(())
    }

    /// Raw (unexpanded) variable lookup.
    pub fn variable_raw(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Raw (unexpanded) property tokens.
    pub fn property_raw(&self, name: &str) -> Option<&[String]> {
        self.properties.get(name).map(Vec::as_slice)
    }

    /// Variable names in original insertion order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Property names in original insertion order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn variables(&self) -> &IndexMap<String, String> {
        &self.variables
    }

    pub fn properties(&self) -> &IndexMap<String, Vec<String>> {
        &self.properties
    }

    /// Checks that `Name`, `Description`, `Version` are all present.
    pub fn validate(&self) -> Result<()> {
        for required in REQUIRED_PROPERTIES {
            if !self.properties.contains_key(required) {
                return Err(Error::Invalid {
                    path: Default::default(),
                    message: format!("missing required property '{required}'"),
                });
            }
        }
        Ok(())
    }

    /// Serializes the model back to `.pc` text: variables as `NAME=VALUE`
    /// lines in insertion order, a blank separator, then properties as
    /// `NAME: v1 v2 ...` in insertion order. `Libs`/`Libs.private` are
    /// rendered with a single leading space and are already deduplicated.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.variables {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        for (name, tokens) in &self.properties {
            out.push_str(name);
            out.push(':');
            match PropertyKind::of(name) {
                PropertyKind::LibsLike => {
                    for t in tokens {
                        out.push(' ');
                        out.push_str(t);
                    }
                }
                _ => {
                    if !tokens.is_empty() {
                        out.push(' ');
                        out.push_str(&tokens.join(" "));
                    }
                }
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_kind_classifies_well_known_names() {
        assert_eq!(PropertyKind::of(REQUIRES), PropertyKind::RequiresLike);
        assert_eq!(PropertyKind::of(REQUIRES_PRIVATE), PropertyKind::RequiresLike);
        assert_eq!(PropertyKind::of(CONFLICTS), PropertyKind::RequiresLike);
        assert_eq!(PropertyKind::of(LIBS), PropertyKind::LibsLike);
        assert_eq!(PropertyKind::of(LIBS_PRIVATE), PropertyKind::LibsLike);
        assert_eq!(PropertyKind::of(CFLAGS), PropertyKind::Default);
        assert_eq!(PropertyKind::of(NAME), PropertyKind::Default);
    }

    #[test]
    fn split_requires_like_fuses_operators() {
        assert_eq!(
            split_requires_like("foo >= 1.2, bar"),
            vec!["foo>=1.2", "bar"]
        );
        assert_eq!(split_requires_like("foo>=1.2 bar"), vec!["foo>=1.2", "bar"]);
        assert_eq!(split_requires_like("foo"), vec!["foo"]);
    }

    #[test]
    fn split_default_preserves_escaped_whitespace() {
        assert_eq!(
            split_whitespace_preserving_escapes(r"-Dfoo=a\ b -Dbar=baz"),
            vec!["-Dfoo=a b", "-Dbar=baz"]
        );
    }

    #[test]
    fn dedup_keep_first_preserves_position() {
        let mut v = vec!["-la".to_string(), "-lb".to_string(), "-la".to_string()];
        dedup_keep_first(&mut v);
        assert_eq!(v, vec!["-la", "-lb"]);
    }

    #[test]
    fn duplicate_variable_is_a_parse_error() {
        let mut pc = PkgConfig::new("foo");
        pc.add_variable("prefix", "/usr").unwrap();
        let err = pc.add_variable("prefix", "/usr/local").unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[test]
    fn duplicate_property_is_a_parse_error() {
        let mut pc = PkgConfig::new("foo");
        pc.add_property("Libs", vec!["-lfoo".to_string()]).unwrap();
        let err = pc
            .add_property("Libs", vec!["-lbar".to_string()])
            .unwrap_err();
        assert!(matches!(err, Error::ParseError { .. }));
    }

    #[test]
    fn validate_requires_name_description_version() {
        let mut pc = PkgConfig::new("foo");
        assert!(pc.validate().is_err());
        pc.add_property(NAME, vec!["foo".to_string()]).unwrap();
        pc.add_property(DESCRIPTION, vec!["Foo".to_string()]).unwrap();
        assert!(pc.validate().is_err());
        pc.add_property(VERSION, vec!["1.0".to_string()]).unwrap();
        assert!(pc.validate().is_ok());
    }

    #[test]
    fn serialize_preserves_insertion_order() {
        let mut pc = PkgConfig::new("foo");
        pc.add_variable("prefix", "/usr").unwrap();
        pc.add_variable("libdir", "${prefix}/lib").unwrap();
        pc.add_property(NAME, vec!["foo".to_string()]).unwrap();
        pc.add_property(LIBS, vec!["-lfoo".to_string(), "-lbar".to_string()])
            .unwrap();
        let text = pc.serialize();
        let prefix_idx = text.find("prefix=/usr").unwrap();
        let libdir_idx = text.find("libdir=").unwrap();
        assert!(prefix_idx < libdir_idx);
        assert!(text.contains("Libs: -lfoo -lbar"));
    }
}
