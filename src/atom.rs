//! Logic-program atom syntax shared by the builders and the solver gateway.
//!
//! Atoms are written `name(arg, ...)`; arguments may themselves be compound
//! terms or double-quoted strings, so splitting respects nesting and quotes.

use std::fmt;

use crate::error::PredicateError;

/// A parsed atom: predicate name plus its top-level arguments as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom {
    pub name: String,
    pub args: Vec<String>,
}

impl Atom {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// Parse `name(a, b)`, `name(a,b).` or a bare constant `name`.
    pub fn parse(text: &str) -> Result<Self, PredicateError> {
        let malformed = || PredicateError::MalformedAtom {
            text: text.to_string(),
        };

        let trimmed = text.trim();
        let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end();
        if trimmed.is_empty() {
            return Err(malformed());
        }

        let Some(open) = trimmed.find('(') else {
            if trimmed.contains(')') || trimmed.contains(',') {
                return Err(malformed());
            }
            return Ok(Self::new(trimmed, Vec::new()));
        };
        if !trimmed.ends_with(')') {
            return Err(malformed());
        }

        let name = trimmed[..open].trim();
        if name.is_empty() {
            return Err(malformed());
        }
        let inner = &trimmed[open + 1..trimmed.len() - 1];
        let args = split_top_level(inner).ok_or_else(malformed)?;
        Ok(Self::new(name, args))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.args.join(", "))
        }
    }
}

/// Split a comma-separated argument list at nesting depth zero.
///
/// Returns `None` on unbalanced parentheses or an unterminated string.
fn split_top_level(inner: &str) -> Option<Vec<String>> {
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' => depth += 1,
            ')' => depth = depth.checked_sub(1)?,
            ',' if depth == 0 => {
                args.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || in_string {
        return None;
    }
    args.push(inner[start..].trim().to_string());

    if args.iter().any(String::is_empty) {
        return None;
    }
    Some(args)
}

/// Turn an arbitrary word into a lower-case solver constant.
///
/// Whitespace and punctuation collapse to `_`; a leading non-letter gets a
/// `w_` prefix so the result never parses as a number or variable.
pub fn sanitize_constant(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    let mut last_underscore = false;
    for c in word.trim().chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    let out = out.trim_matches('_').to_string();
    match out.chars().next() {
        Some(c) if c.is_ascii_lowercase() => out,
        _ => format!("w_{out}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fact_with_terminator() {
        let atom = Atom::parse("event_subject(eat, cat).").unwrap();
        assert_eq!(atom.name, "event_subject");
        assert_eq!(atom.args, vec!["eat", "cat"]);
    }

    #[test]
    fn parses_solver_witness_without_spaces() {
        let atom = Atom::parse("coref(target_pronoun,cat)").unwrap();
        assert_eq!(atom.args, vec!["target_pronoun", "cat"]);
    }

    #[test]
    fn nested_and_quoted_arguments_stay_whole() {
        let atom = Atom::parse(r#"p(f(a, b), "x, y", c)"#).unwrap();
        assert_eq!(atom.args, vec!["f(a, b)", r#""x, y""#, "c"]);
    }

    #[test]
    fn bare_constant() {
        let atom = Atom::parse("raining.").unwrap();
        assert_eq!(atom, Atom::new("raining", Vec::new()));
        assert_eq!(atom.to_string(), "raining");
    }

    #[test]
    fn rejects_unbalanced() {
        assert!(Atom::parse("p(a, b").is_err());
        assert!(Atom::parse("p(a))").is_err());
        assert!(Atom::parse("p(a,)").is_err());
        assert!(Atom::parse("").is_err());
    }

    #[test]
    fn display_round_trips() {
        let atom = Atom::new("property", vec!["hungry".into(), "cat".into()]);
        assert_eq!(Atom::parse(&atom.to_string()).unwrap(), atom);
    }

    #[test]
    fn sanitize_words() {
        assert_eq!(sanitize_constant("Go Fast"), "go_fast");
        assert_eq!(sanitize_constant("can't"), "can_t");
        assert_eq!(sanitize_constant("42nd street"), "w_42nd_street");
        assert_eq!(sanitize_constant("hungry"), "hungry");
    }
}
