//! Policy records built from an OpenAPI document.
//!
//! Every operation yields zero or more [`PolicySchema`] records. The ordered
//! list of records is the only input of the renderer.

use oasrego_core::{OpenApiDocument, OperationView, SecuritySchemeMap};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{CompilerError, ExtensionSite, Result};
use crate::expression::{compile_operations, compile_rules, Scope};
use crate::extension::{
    parse_extensions, FieldFilterDef, ListFilterDef, OverwriteFilterDef, FIELD_FILTER_KEY,
};
use crate::path::{quote, PathLiteral};

/// Default prefix of overwrite helper predicates.
pub const DEFAULT_HELPER_PREFIX: &str = "overwrite_";

/// Field mask returned for scope holders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    /// Field names, in declaration order.
    pub mask_fields: Vec<String>,
}

/// Element-wise filter over an input collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    /// Collection name under `input`.
    pub source: String,
    /// Body expressions each kept element satisfies.
    pub expressions: Vec<String>,
}

/// Conditional overwrite of one field of `input.object`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverwriteFilter {
    /// Field to overwrite.
    pub field: String,
    /// Rego term of the replacement value.
    pub value: String,
    /// Overwrite when the helper predicate does not hold.
    pub negated: bool,
    /// Name of the helper predicate shared by the two response rules.
    pub helper_name: String,
    /// One list of body expressions per rule.
    pub rule_expressions: Vec<Vec<String>>,
}

/// Rule-gated `allow` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanFilter {
    /// One list of body expressions per rule.
    pub rule_expressions: Vec<Vec<String>>,
}

/// The access-control behaviour a record encodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    /// `filter = [...]` gated on scopes.
    Field(FieldFilter),
    /// `list_filter contains x` over a collection.
    List(ListFilter),
    /// Paired `response[field]` rules plus helper predicates.
    Overwrite(OverwriteFilter),
    /// One `allow` clause per rule.
    Boolean(BooleanFilter),
    /// Plain `allow` on path, method and scopes.
    Allow,
}

impl FilterKind {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Field(_) => "field-filter",
            Self::List(_) => "list-filter",
            Self::Overwrite(_) => "overwrite-filter",
            Self::Boolean(_) => "boolean-filter",
            Self::Allow => "allow",
        }
    }
}

/// One generated rule-set for an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicySchema {
    /// Path array literal.
    pub path: PathLiteral,
    /// Quoted HTTP method.
    pub method: String,
    /// Token scopes the record requires.
    pub scopes: Vec<String>,
    /// Record kind.
    pub kind: FilterKind,
}

/// Builds the ordered record list for a document.
///
/// # Examples
///
/// ```rust
/// use oasrego_compiler::{FilterKind, SchemaBuilder};
/// use oasrego_core::OpenApiDocument;
///
/// let doc = OpenApiDocument::from_yaml_str(r#"
/// openapi: "3.0.0"
/// paths:
///   /users:
///     get: {}
/// "#).unwrap();
///
/// let records = SchemaBuilder::new().build(&doc).unwrap();
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].kind, FilterKind::Allow);
/// ```
#[derive(Debug)]
pub struct SchemaBuilder {
    /// Prefix of overwrite helper predicate names.
    helper_prefix: String,
    /// Overwrite filters emitted so far, across the whole document.
    overwrite_count: usize,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Creates a builder with the default helper prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::with_helper_prefix(DEFAULT_HELPER_PREFIX)
    }

    /// Creates a builder naming helper predicates `<prefix><n>`.
    #[must_use]
    pub fn with_helper_prefix(prefix: impl Into<String>) -> Self {
        Self {
            helper_prefix: prefix.into(),
            overwrite_count: 0,
        }
    }

    /// Builds the records for every operation of `doc`.
    ///
    /// # Errors
    ///
    /// Returns the first extension error encountered; no records are
    /// returned in that case.
    #[instrument(skip_all)]
    pub fn build(mut self, doc: &OpenApiDocument) -> Result<Vec<PolicySchema>> {
        let mut records = Vec::new();
        for op in doc.operations() {
            self.build_operation(&op, &mut records)?;
        }
        Ok(records)
    }

    /// Appends the records of one operation.
    ///
    /// # Errors
    ///
    /// Returns an error if an extension is malformed or references security
    /// data the operation does not declare.
    pub fn build_operation(
        &mut self,
        op: &OperationView<'_>,
        records: &mut Vec<PolicySchema>,
    ) -> Result<()> {
        let extensions = parse_extensions(op)?;
        let schemes = op.security.map(SecuritySchemeMap::resolve);

        let path = PathLiteral::from_template(op.path);
        let method = quote(op.method.as_str());
        let start = records.len();
        let record = |scopes: Vec<String>, kind: FilterKind| PolicySchema {
            path: path.clone(),
            method: method.clone(),
            scopes,
            kind,
        };

        if !extensions.field_filters.is_empty() {
            let site = ExtensionSite::new(FIELD_FILTER_KEY, op.method, op.path);
            let schemes = schemes
                .as_ref()
                .ok_or_else(|| CompilerError::MissingSecurityRequirement { site: site.clone() })?;

            for FieldFilterDef {
                scheme,
                mask_fields,
            } in extensions.field_filters
            {
                let scopes = schemes
                    .scopes(&scheme)
                    .map_err(|_| CompilerError::UnknownSecurityScheme {
                        site: site.clone(),
                        scheme: scheme.clone(),
                    })?
                    .to_vec();
                if scopes.is_empty() {
                    return Err(CompilerError::EmptyScopes {
                        site: site.clone(),
                        scheme,
                    });
                }
                records.push(record(scopes, FilterKind::Field(FieldFilter { mask_fields })));
            }
        }

        for ListFilterDef { source, operations } in extensions.list_filters {
            let expressions = compile_operations(&operations, Scope::ListElement);
            records.push(record(Vec::new(), FilterKind::List(ListFilter { source, expressions })));
        }

        for def in extensions.overwrite_filters {
            let filter = self.overwrite_filter(def);
            records.push(record(Vec::new(), FilterKind::Overwrite(filter)));
        }

        let operation_scopes = schemes
            .as_ref()
            .map(SecuritySchemeMap::all_scopes)
            .unwrap_or_default();

        if let Some(boolean_filters) = extensions.boolean_filters {
            for def in boolean_filters {
                let rule_expressions = compile_rules(&def.rules, Scope::InputObject);
                records.push(record(
                    operation_scopes.clone(),
                    FilterKind::Boolean(BooleanFilter { rule_expressions }),
                ));
            }
        } else {
            records.push(record(operation_scopes, FilterKind::Allow));
        }

        for schema in &records[start..] {
            debug!(
                path = op.path,
                method = %op.method,
                kind = schema.kind.name(),
                scopes = schema.scopes.len(),
                "Built policy record"
            );
        }

        Ok(())
    }

    fn overwrite_filter(&mut self, def: OverwriteFilterDef) -> OverwriteFilter {
        self.overwrite_count += 1;
        OverwriteFilter {
            field: def.field,
            value: value_term(def.value.as_ref()),
            negated: def.negated,
            helper_name: format!("{}{}", self.helper_prefix, self.overwrite_count),
            rule_expressions: compile_rules(&def.rules, Scope::InputObject),
        }
    }
}

/// Renders an overwrite value as a Rego term.
///
/// Strings are taken verbatim so they may name a reference; write
/// `"\"text\""` for a string literal. Other values use their JSON text.
fn value_term(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
