//! Rendering of policy records into one Rego module.
//!
//! Each [`FilterKind`] has its own rendering function; the blocks are
//! appended in record order after a fixed preamble that declares the
//! package, the default decision, and the decoded bearer token.

use std::fmt::{self, Write};

use tracing::debug;

use crate::error::Result;
use crate::expression::{INPUT_OBJECT, LIST_ELEMENT_VAR};
use crate::path::quote;
use crate::schema::{BooleanFilter, FieldFilter, FilterKind, ListFilter, OverwriteFilter, PolicySchema};

const INDENT: &str = "\t";

/// Renders policy records as Rego source.
///
/// # Examples
///
/// ```rust
/// use oasrego_compiler::Renderer;
///
/// let source = Renderer::new("httpapi.authz").render(&[]).unwrap();
/// assert!(source.starts_with("package httpapi.authz\n"));
/// assert!(source.contains("default allow := false"));
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    package_name: String,
}

impl Renderer {
    /// Creates a renderer for the given package.
    #[must_use]
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
        }
    }

    /// Renders the preamble followed by one block per record.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output buffer fails.
    pub fn render(&self, records: &[PolicySchema]) -> Result<String> {
        let mut out = String::new();
        write_preamble(&mut out, &self.package_name)?;
        for record in records {
            write_record(&mut out, record)?;
        }
        debug!(
            package = %self.package_name,
            records = records.len(),
            bytes = out.len(),
            "Rendered policy"
        );
        Ok(out)
    }
}

/// Writes the package header, default decision, and token decoding rule.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_preamble(out: &mut impl Write, package_name: &str) -> fmt::Result {
    writeln!(out, "package {package_name}")?;
    writeln!(out)?;
    writeln!(out, "import rego.v1")?;
    writeln!(out)?;
    writeln!(out, "default allow := false")?;
    writeln!(out)?;
    writeln!(out, "token := {{\"payload\": payload}} if {{")?;
    writeln!(out, "{INDENT}io.jwt.decode(input.token, [_, payload, _])")?;
    writeln!(out, "}}")
}

/// Writes the block for one record, preceded by a blank line.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_record(out: &mut impl Write, record: &PolicySchema) -> fmt::Result {
    match &record.kind {
        FilterKind::Field(filter) => write_field_filter(out, record, filter),
        FilterKind::List(filter) => write_list_filter(out, record, filter),
        FilterKind::Overwrite(filter) => write_overwrite_filter(out, record, filter),
        FilterKind::Boolean(filter) => write_boolean_filter(out, record, filter),
        FilterKind::Allow => write_allow(out, record),
    }
}

fn write_field_filter(out: &mut impl Write, record: &PolicySchema, filter: &FieldFilter) -> fmt::Result {
    let fields: Vec<String> = filter.mask_fields.iter().map(|f| quote(f)).collect();
    writeln!(out)?;
    writeln!(out, "filter = [{}] if {{", fields.join(", "))?;
    write_body(out, record, &[])
}

fn write_list_filter(out: &mut impl Write, record: &PolicySchema, filter: &ListFilter) -> fmt::Result {
    let mut lines = Vec::with_capacity(filter.expressions.len() + 1);
    lines.push(format!("{LIST_ELEMENT_VAR} := input.{}[_]", filter.source));
    lines.extend(filter.expressions.iter().cloned());

    writeln!(out)?;
    writeln!(out, "list_filter contains {LIST_ELEMENT_VAR} if {{")?;
    write_body(out, record, &lines)
}

fn write_overwrite_filter(
    out: &mut impl Write,
    record: &PolicySchema,
    filter: &OverwriteFilter,
) -> fmt::Result {
    let field = quote(&filter.field);
    let helper = &filter.helper_name;
    let (value_guard, pass_guard) = if filter.negated {
        (format!("not {helper}"), helper.clone())
    } else {
        (helper.clone(), format!("not {helper}"))
    };

    writeln!(out)?;
    writeln!(out, "response[{field}] = {} if {{", filter.value)?;
    write_body(out, record, &[value_guard])?;
    writeln!(out)?;
    writeln!(out, "response[{field}] = {INPUT_OBJECT}.{} if {{", filter.field)?;
    write_body(out, record, &[pass_guard])?;

    // defined even when no rule clause holds
    writeln!(out)?;
    writeln!(out, "default {helper} := false")?;

    for expressions in &filter.rule_expressions {
        writeln!(out)?;
        writeln!(out, "{helper} if {{")?;
        write_body(out, record, expressions)?;
    }
    Ok(())
}

fn write_boolean_filter(out: &mut impl Write, record: &PolicySchema, filter: &BooleanFilter) -> fmt::Result {
    for expressions in &filter.rule_expressions {
        writeln!(out)?;
        writeln!(out, "allow if {{")?;
        write_body(out, record, expressions)?;
    }
    Ok(())
}

fn write_allow(out: &mut impl Write, record: &PolicySchema) -> fmt::Result {
    writeln!(out)?;
    writeln!(out, "allow if {{")?;
    write_body(out, record, &[])
}

/// Writes the request guard, the scope checks, the extra expressions, and
/// the closing brace.
fn write_body(out: &mut impl Write, record: &PolicySchema, expressions: &[String]) -> fmt::Result {
    writeln!(out, "{INDENT}input.path = {}", record.path)?;
    writeln!(out, "{INDENT}input.method = {}", record.method)?;
    for scope in &record.scopes {
        writeln!(out, "{INDENT}token.payload.scopes[{}]", quote(scope))?;
    }
    for expression in expressions {
        writeln!(out, "{INDENT}{expression}")?;
    }
    writeln!(out, "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathLiteral;

    fn record(path: &str, scopes: &[&str], kind: FilterKind) -> PolicySchema {
        PolicySchema {
            path: PathLiteral::from_template(path),
            method: "\"GET\"".to_string(),
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
            kind,
        }
    }

    fn render_one(record: &PolicySchema) -> String {
        let mut out = String::new();
        write_record(&mut out, record).unwrap();
        out
    }

    #[test]
    fn test_preamble() {
        let source = Renderer::new("httpapi.authz").render(&[]).unwrap();

        assert_eq!(
            source,
            "package httpapi.authz\n\
             \n\
             import rego.v1\n\
             \n\
             default allow := false\n\
             \n\
             token := {\"payload\": payload} if {\n\
             \tio.jwt.decode(input.token, [_, payload, _])\n\
             }\n"
        );
    }

    #[test]
    fn test_allow_with_scopes() {
        let out = render_one(&record("/users/{id}", &["read"], FilterKind::Allow));

        assert_eq!(
            out,
            "\nallow if {\n\
             \tinput.path = [\"users\", id]\n\
             \tinput.method = \"GET\"\n\
             \ttoken.payload.scopes[\"read\"]\n\
             }\n"
        );
    }

    #[test]
    fn test_allow_without_scopes() {
        let out = render_one(&record("/", &[], FilterKind::Allow));

        assert!(out.contains("input.path = [\"/\"]"));
        assert!(!out.contains("token.payload.scopes"));
    }

    #[test]
    fn test_field_filter() {
        let out = render_one(&record(
            "/employees/{id}",
            &["hr"],
            FilterKind::Field(FieldFilter {
                mask_fields: vec!["ssn".to_string(), "salary".to_string()],
            }),
        ));

        assert_eq!(
            out,
            "\nfilter = [\"ssn\", \"salary\"] if {\n\
             \tinput.path = [\"employees\", id]\n\
             \tinput.method = \"GET\"\n\
             \ttoken.payload.scopes[\"hr\"]\n\
             }\n"
        );
    }

    #[test]
    fn test_list_filter() {
        let out = render_one(&record(
            "/employees",
            &[],
            FilterKind::List(ListFilter {
                source: "employees".to_string(),
                expressions: vec!["x.manager = token.payload.sub".to_string()],
            }),
        ));

        assert_eq!(
            out,
            "\nlist_filter contains x if {\n\
             \tinput.path = [\"employees\"]\n\
             \tinput.method = \"GET\"\n\
             \tx := input.employees[_]\n\
             \tx.manager = token.payload.sub\n\
             }\n"
        );
    }

    fn overwrite(negated: bool) -> PolicySchema {
        record(
            "/employees/{id}",
            &[],
            FilterKind::Overwrite(OverwriteFilter {
                field: "salary".to_string(),
                value: "0".to_string(),
                negated,
                helper_name: "overwrite_1".to_string(),
                rule_expressions: vec![
                    vec!["input.object.manager = token.payload.sub".to_string()],
                    vec!["\"hr\" = token.payload.roles[_]".to_string()],
                ],
            }),
        )
    }

    const GUARD: &str = "\tinput.path = [\"employees\", id]\n\tinput.method = \"GET\"\n";

    #[test]
    fn test_overwrite_filter_pair() {
        let out = render_one(&overwrite(false));

        assert!(out.contains(&format!(
            "response[\"salary\"] = 0 if {{\n{GUARD}\toverwrite_1\n}}\n"
        )));
        assert!(out.contains(&format!(
            "response[\"salary\"] = input.object.salary if {{\n{GUARD}\tnot overwrite_1\n}}\n"
        )));
        assert!(out.contains("\ndefault overwrite_1 := false\n"));
        assert_eq!(out.matches("\noverwrite_1 if {\n").count(), 2);
        assert!(out.contains("\tinput.object.manager = token.payload.sub\n"));
        assert!(out.contains("\t\"hr\" = token.payload.roles[_]\n"));
    }

    #[test]
    fn test_overwrite_filter_negated_swaps_guards() {
        let out = render_one(&overwrite(true));

        assert!(out.contains(&format!(
            "response[\"salary\"] = 0 if {{\n{GUARD}\tnot overwrite_1\n}}\n"
        )));
        assert!(out.contains(&format!(
            "response[\"salary\"] = input.object.salary if {{\n{GUARD}\toverwrite_1\n}}\n"
        )));
    }

    #[test]
    fn test_overwrite_filter_without_rules_defines_helper() {
        let out = render_one(&record(
            "/employees/{id}",
            &[],
            FilterKind::Overwrite(OverwriteFilter {
                field: "salary".to_string(),
                value: "0".to_string(),
                negated: false,
                helper_name: "overwrite_1".to_string(),
                rule_expressions: vec![],
            }),
        ));

        assert!(out.contains("\ndefault overwrite_1 := false\n"));
        assert_eq!(out.matches("\noverwrite_1 if {\n").count(), 0);
        assert!(out.contains("\tnot overwrite_1\n"));
    }

    #[test]
    fn test_boolean_filter_one_clause_per_rule() {
        let out = render_one(&record(
            "/employees/{id}",
            &["read"],
            FilterKind::Boolean(BooleanFilter {
                rule_expressions: vec![
                    vec!["id = token.payload.sub".to_string()],
                    vec![
                        "\"admin\" = token.payload.roles[_]".to_string(),
                        "not input.object.locked".to_string(),
                    ],
                ],
            }),
        ));

        assert_eq!(out.matches("\nallow if {\n").count(), 2);
        assert_eq!(out.matches("\ttoken.payload.scopes[\"read\"]\n").count(), 2);
        assert!(out.contains("\tid = token.payload.sub\n}"));
        assert!(out.contains("\t\"admin\" = token.payload.roles[_]\n\tnot input.object.locked\n}"));
    }

    #[test]
    fn test_render_preserves_record_order() {
        let records = vec![
            record("/b", &[], FilterKind::Allow),
            record("/a", &[], FilterKind::Allow),
        ];
        let source = Renderer::new("p").render(&records).unwrap();

        let b = source.find("[\"b\"]").unwrap();
        let a = source.find("[\"a\"]").unwrap();
        assert!(b < a);
    }
}
