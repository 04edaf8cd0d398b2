//! Tokenizer/parser: turns a `.pc` file's text into a [`PkgConfig`].
//!
//! Backslash-newline continuations are joined into logical lines before
//! anything else runs, and the delimiter scan skips over `${...}` so a
//! variable reference containing `:` is never mistaken for the `NAME: VALUE`
//! separator. Duplicate variable or property names within one file are
//! rejected rather than having the later one silently win, and quoted
//! variable values have their surrounding quotes stripped.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{PkgConfig, PropertyKind};

/// Normalizes CRLF to LF and joins backslash-newline continuations into
/// logical lines, discarding the trailing backslash itself.
fn logical_lines(input: &str) -> Vec<String> {
    let normalized = input.replace("\r\n", "\n");
    let mut lines = Vec::new();
    let mut current = String::new();

    for raw_line in normalized.split('\n') {
        if let Some(stripped) = raw_line.strip_suffix('\\') {
            current.push_str(stripped);
        } else {
            current.push_str(raw_line);
            lines.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Strips a trailing `#` comment that is not itself escaped with a
/// backslash. Lines whose first non-whitespace character is `#` are
/// entirely comments and become empty.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'#' && (i == 0 || bytes[i - 1] != b'\\') {
            return &line[..i];
        }
        i += 1;
    }
    line
}

/// Finds the index of the first unbracketed `=` or `:`, skipping anything
/// inside `${...}` so e.g. a default value containing `:` does not get
/// mistaken for a property delimiter.
fn find_delimiter(line: &str) -> Option<(usize, char)> {
    let mut depth: u32 = 0;
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut i = 0;
    while i < chars.len() {
        let (idx, c) = chars[i];
        if c == '$' && chars.get(i + 1).map(|&(_, c)| c) == Some('{') {
            depth += 1;
            i += 2;
            continue;
        }
        if c == '}' && depth > 0 {
            depth -= 1;
            i += 1;
            continue;
        }
        if depth == 0 && (c == '=' || c == ':') {
            return Some((idx, c));
        }
        i += 1;
    }
    None
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

/// Strips one pair of surrounding double quotes, if present.
fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Parses the text of a `.pc` file located at `path` (used only for
/// diagnostics) into a [`PkgConfig`] keyed under `package_name`.
pub fn parse(package_name: &str, path: &Path, input: &str) -> Result<PkgConfig> {
    let mut pc = PkgConfig::new(package_name);

    for (lineno, raw_line) in logical_lines(input).iter().enumerate() {
        let line_no = lineno + 1;
        let line = strip_comment(raw_line);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some((idx, delim)) = find_delimiter(line) else {
            return Err(Error::ParseError {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("malformed line: {trimmed:?}"),
            });
        };

        let name = line[..idx].trim();
        let value = line[idx + 1..].trim();

        if !is_valid_name(name) {
            return Err(Error::ParseError {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("invalid name {name:?}"),
            });
        }

        match delim {
            '=' => {
                let unquoted = strip_quotes(value);
                pc.add_variable(name, unquoted).map_err(|_| Error::ParseError {
                    path: path.to_path_buf(),
                    line: line_no,
                    message: format!("duplicate variable '{name}'"),
                })?;
            }
            ':' => {
                let tokens = PropertyKind::of(name).split(value);
                pc.add_property(name, tokens).map_err(|_| Error::ParseError {
                    path: path.to_path_buf(),
                    line: line_no,
                    message: format!("duplicate property '{name}'"),
                })?;
            }
            _ => unreachable!(),
        }
    }

    Ok(pc)
}

/// Reads and parses a `.pc` file from disk.
pub fn parse_file(package_name: &str, path: &Path) -> Result<PkgConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Err(Error::Invalid {
            path: path.to_path_buf(),
            message: "file appears to be empty".to_string(),
        });
    }
    parse(package_name, path, &content)
}

/// Convenience for tests: parses from a string with a synthetic path.
pub fn parse_str(package_name: &str, input: &str) -> Result<PkgConfig> {
    parse(package_name, &PathBuf::from("<memory>"), input)
}
