//! Version comparator: a domain-specific ordering over dotted version
//! strings with alphabetic pre-release suffixes (`rc`, `beta`, `alpha`, a
//! trailing letter), distinct from RPM's `rpmvercmp`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(rc|beta|b|alpha|a)([0-9]+)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    /// One of `rc`/`beta`/`b`/`alpha`/`a` followed by digits, normalized to
    /// a single ordering letter (`a < b < r`) plus its numeric part.
    Labeled { label: char, num: u64 },
    /// A single trailing ASCII letter with no digits, e.g. `1.0.1h`.
    Letter(char),
}

impl Suffix {
    fn sort_key(self) -> (char, u64) {
        match self {
            Suffix::Labeled { label, num } => (label, num),
            Suffix::Letter(c) => (c, 0),
        }
    }
}

fn normalize_label(word: &str) -> char {
    match word {
        "a" | "alpha" => 'a',
        "b" | "beta" => 'b',
        "rc" => 'r',
        other => other.chars().next().unwrap_or('a'),
    }
}

/// Strips a trailing pre-release suffix, returning the stripped body and
/// the suffix descriptor, if any.
fn extract_suffix(s: &str) -> (&str, Option<Suffix>) {
    if let Some(caps) = SUFFIX_RE.captures(s) {
        let whole = caps.get(0).unwrap();
        let label = normalize_label(&caps[1]);
        let num: u64 = caps[2].parse().unwrap_or(0);
        return (&s[..whole.start()], Some(Suffix::Labeled { label, num }));
    }
    if let Some(last) = s.chars().last() {
        if last.is_ascii_alphabetic() {
            return (&s[..s.len() - last.len_utf8()], Some(Suffix::Letter(last)));
        }
    }
    (s, None)
}

fn parse_component(s: &str) -> u64 {
    s.parse().unwrap_or(0)
}

fn compare_suffixes(a: Option<Suffix>, b: Option<Suffix>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.sort_key().cmp(&b.sort_key()),
        // "Exactly one has a suffix: the one with a suffix is less than the
        // one without" (e.g. `1.02b1 < 1.02`).
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compares two version strings, returning an [`Ordering`].
///
/// ```
/// use pkgconf_core::version::compare_versions;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_versions("1.2.3", "1.2.3"), Ordering::Equal);
/// assert_eq!(compare_versions("1.02b1", "1.02"), Ordering::Less);
/// ```
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a_body, a_suffix) = extract_suffix(a);
    let (b_body, b_suffix) = extract_suffix(b);
    let a_parts: Vec<&str> = a_body.split('.').collect();
    let b_parts: Vec<&str> = b_body.split('.').collect();
    let len = a_parts.len().max(b_parts.len());

    for i in 0..len {
        let a_part = a_parts.get(i);
        let b_part = b_parts.get(i);

        match (a_part, b_part) {
            (Some(ap), Some(bp)) => {
                let a_last = i == a_parts.len() - 1;
                let b_last = i == b_parts.len() - 1;
                let an = parse_component(ap);
                let bn = parse_component(bp);

                if (a_suffix.is_some() || b_suffix.is_some())
                    && (a_last || b_last)
                    && an == bn
                {
                    return compare_suffixes(a_suffix, b_suffix);
                }
                if an != bn {
                    return an.cmp(&bn);
                }
            }
            // Extra trailing components make a version greater.
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => unreachable!(),
        }
    }

    Ordering::Equal
}

/// Compares `a` and `b`, returning -1, 0, or 1.
pub fn compare(a: &str, b: &str) -> i32 {
    match compare_versions(a, b) {
        Ordering::Less => -1,
        Ordering::Equal => 0,
        Ordering::Greater => 1,
    }
}

/// Compares only major and minor version components independently, used
/// for `--atleast-pkgconfig-version` self-checks.
pub fn atleast_self_version(tool_version: &str, required: &str) -> bool {
    let tool_parts: Vec<u64> = tool_version.split('.').take(2).map(parse_component).collect();
    let required_parts: Vec<u64> = required.split('.').take(2).map(parse_component).collect();
    for i in 0..2 {
        let t = tool_parts.get(i).copied().unwrap_or(0);
        let r = required_parts.get(i).copied().unwrap_or(0);
        if t < r {
            return false;
        }
    }
    true
}

/// A relational operator over version strings, used in positional
/// `name OP version` constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    LessThan,
    LessThanEqual,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
}

impl Comparator {
    /// Evaluates `installed OP required`.
    pub fn eval(self, installed: &str, required: &str) -> bool {
        let ord = compare_versions(installed, required);
        match self {
            Comparator::LessThan => ord == Ordering::Less,
            Comparator::LessThanEqual => ord != Ordering::Greater,
            Comparator::Equal => ord == Ordering::Equal,
            Comparator::NotEqual => ord != Ordering::Equal,
            Comparator::GreaterThan => ord == Ordering::Greater,
            Comparator::GreaterThanEqual => ord != Ordering::Less,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::LessThan => "<",
            Comparator::LessThanEqual => "<=",
            Comparator::Equal => "=",
            Comparator::NotEqual => "!=",
            Comparator::GreaterThan => ">",
            Comparator::GreaterThanEqual => ">=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "<" => Ok(Comparator::LessThan),
            "<=" => Ok(Comparator::LessThanEqual),
            "=" => Ok(Comparator::Equal),
            "!=" => Ok(Comparator::NotEqual),
            ">" => Ok(Comparator::GreaterThan),
            ">=" => Ok(Comparator::GreaterThanEqual),
            other => Err(Error::ArgumentError(format!(
                "unknown version comparator '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_are_equal() {
        assert_eq!(compare("1.2.3", "1.2.3"), 0);
    }

    #[test]
    fn numeric_components_compare_lockstep() {
        assert_eq!(compare("1.2.3", "1.10.0"), -1);
        assert_eq!(compare("1.10.0", "1.2.3"), 1);
    }

    #[test]
    fn extra_trailing_components_are_greater() {
        assert_eq!(compare("1.2.3.1", "1.2.3"), 1);
        assert_eq!(compare("1.2.3", "1.2.3.1"), -1);
    }

    #[test]
    fn suffix_bearing_is_less_than_no_suffix() {
        assert_eq!(compare("1.02b1", "1.02"), -1);
        assert_eq!(compare("1.02", "1.02b1"), 1);
    }

    #[test]
    fn suffix_ordering_is_alpha_beta_rc() {
        assert_eq!(compare("1.0alpha1", "1.0beta1"), -1);
        assert_eq!(compare("1.0beta1", "1.0rc1"), -1);
        assert_eq!(compare("1.0rc1", "1.0alpha1"), 1);
    }

    #[test]
    fn same_label_compares_numeric_suffix_part() {
        assert_eq!(compare("1.0rc1", "1.0rc2"), -1);
        assert_eq!(compare("1.0rc2", "1.0rc1"), 1);
    }

    #[test]
    fn trailing_letter_suffix() {
        assert_eq!(compare("1.0.1h", "1.0.1h"), 0);
        assert!(compare("1.0.1g", "1.0.1h") < 0);
    }

    #[test]
    fn comparator_totality_and_antisymmetry() {
        let pairs = [("1.0", "2.0"), ("2.0", "1.0"), ("1.0", "1.0")];
        for (a, b) in pairs {
            let ab = compare(a, b);
            let ba = compare(b, a);
            assert_eq!(ab, -ba);
            assert!((-1..=1).contains(&ab));
        }
    }

    #[test]
    fn comparator_eval_matches_operators() {
        assert!(Comparator::GreaterThanEqual.eval("2.0", "1.0"));
        assert!(Comparator::Equal.eval("1.0.1h", "1.0.1h"));
        assert!(!Comparator::Equal.eval("1.0.1h", "1.0.1"));
        assert!(Comparator::LessThan.eval("1.02b1", "1.02"));
    }

    #[test]
    fn atleast_self_version_checks_major_minor_independently() {
        assert!(atleast_self_version("2.1.0", "2.0"));
        assert!(atleast_self_version("2.1.0", "2.1"));
        assert!(!atleast_self_version("2.1.0", "2.2"));
        assert!(!atleast_self_version("1.9.0", "2.0"));
    }

    #[test]
    fn comparator_from_str_round_trips_as_str() {
        for op in ["<", "<=", "=", "!=", ">", ">="] {
            let c: Comparator = op.parse().unwrap();
            assert_eq!(c.as_str(), op);
        }
        assert!("~".parse::<Comparator>().is_err());
    }
}
