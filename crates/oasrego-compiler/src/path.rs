//! Conversion of OpenAPI path templates into Rego path arrays.
//!
//! A request path is matched in Rego by unifying `input.path` (an array of
//! segments) against an array literal. Literal segments become quoted
//! strings; templated segments become bare variables that bind to whatever
//! segment the request carries:
//!
//! ```text
//! /users/{id}/posts   ->   ["users", id, "posts"]
//! /                   ->   ["/"]
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches `{name}`, `{.name}`, `{;name}`, `{?name}`, each with an optional `*`.
static PATH_PARAM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[.;?]?([^{}*]+)\*?\}").expect("path parameter pattern is valid")
});

/// Prefix marking a segment that was a template variable.
const VARIABLE_MARKER: char = ':';

/// A Rego array literal matching a request path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathLiteral(String);

impl PathLiteral {
    /// Converts an OpenAPI path template.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use oasrego_compiler::PathLiteral;
    ///
    /// assert_eq!(PathLiteral::from_template("/users/{id}").as_str(), r#"["users", id]"#);
    /// assert_eq!(PathLiteral::from_template("/").as_str(), r#"["/"]"#);
    /// ```
    #[must_use]
    pub fn from_template(template: &str) -> Self {
        let marked = PATH_PARAM.replace_all(template, format!("{VARIABLE_MARKER}$1"));

        let segments: Vec<String> = marked
            .trim_start_matches('/')
            .split('/')
            .map(|segment| {
                segment.strip_prefix(VARIABLE_MARKER).map_or_else(
                    || quote(segment),
                    |variable| variable.trim_start_matches(VARIABLE_MARKER).to_string(),
                )
            })
            .collect();

        if segments.len() == 1 && segments[0] == "\"\"" {
            return Self("[\"/\"]".to_string());
        }

        Self(format!("[{}]", segments.join(", ")))
    }

    /// Returns the literal text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quotes a string as a Rego string literal.
///
/// Rego string escapes are a superset of JSON's, so JSON encoding is exact.
pub(crate) fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn convert(template: &str) -> String {
        PathLiteral::from_template(template).to_string()
    }

    #[test]
    fn test_root_path() {
        assert_eq!(convert("/"), r#"["/"]"#);
        assert_eq!(convert(""), r#"["/"]"#);
    }

    #[test]
    fn test_literal_path() {
        assert_eq!(convert("/users"), r#"["users"]"#);
        assert_eq!(convert("/api/v1/users"), r#"["api", "v1", "users"]"#);
    }

    #[test]
    fn test_simple_parameter() {
        assert_eq!(convert("/users/{id}"), r#"["users", id]"#);
        assert_eq!(
            convert("/users/{userId}/posts/{postId}"),
            r#"["users", userId, "posts", postId]"#
        );
    }

    #[test]
    fn test_operator_prefixes_are_stripped() {
        assert_eq!(convert("/a/{.b}/{;c*}"), r#"["a", b, c]"#);
        assert_eq!(convert("/a/{?b}"), r#"["a", b]"#);
        assert_eq!(convert("/a/{b*}"), r#"["a", b]"#);
        assert_eq!(convert("/a/{.b*}/{;c}/{?d*}"), r#"["a", b, c, d]"#);
    }

    #[test]
    fn test_trailing_slash_keeps_empty_segment() {
        assert_eq!(convert("/users/"), r#"["users", ""]"#);
    }

    #[test]
    fn test_malformed_template_passes_through() {
        assert_eq!(convert("/users/{id"), r#"["users", "{id"]"#);
        assert_eq!(convert("/users/{}"), r#"["users", "{}"]"#);
    }

    #[test]
    fn test_literal_segments_are_escaped() {
        assert_eq!(convert(r#"/say/"hi""#), r#"["say", "\"hi\""]"#);
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("GET"), r#""GET""#);
        assert_eq!(quote("a\\b"), r#""a\\b""#);
    }

    proptest! {
        #[test]
        fn conversion_is_total_and_bracketed(template in "(/[a-z{}.;?*]{0,8}){0,5}") {
            let literal = convert(&template);
            prop_assert!(literal.starts_with('['));
            prop_assert!(literal.ends_with(']'));
        }

        #[test]
        fn literal_segments_are_quoted(segments in prop::collection::vec("[a-z0-9-]{1,10}", 1..6)) {
            let template = format!("/{}", segments.join("/"));
            let expected: Vec<String> = segments.iter().map(|s| format!("\"{s}\"")).collect();
            prop_assert_eq!(convert(&template), format!("[{}]", expected.join(", ")));
        }

        #[test]
        fn parameters_become_variables(names in prop::collection::vec("[a-z][a-zA-Z0-9_]{0,10}", 1..5)) {
            let template: String = names.iter().map(|n| format!("/{{{n}}}")).collect();
            prop_assert_eq!(convert(&template), format!("[{}]", names.join(", ")));
        }
    }
}
