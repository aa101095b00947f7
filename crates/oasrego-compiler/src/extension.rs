//! Decoding of the `x-security-rego-*` operation extensions.
//!
//! Each recognised key carries an array of definitions. Payloads are decoded
//! in two steps: serde checks the JSON shape, then every operand is
//! classified into an [`Operand`] and every operation's arity is checked, so
//! the expression compiler only ever sees well-typed rules.

use std::collections::BTreeMap;

use oasrego_core::{Operand, Operation, OperationView, Operator, Rule};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{CompilerError, ExtensionSite, Result};

/// Returns a list of field names to mask, gated on token scopes.
pub const FIELD_FILTER_KEY: &str = "x-security-rego-field-filter";

/// Returns the elements of an input collection that satisfy the operations.
pub const LIST_FILTER_KEY: &str = "x-security-rego-list-filter";

/// Overwrites one field of `input.object` depending on the rules.
pub const OVERWRITE_FILTER_KEY: &str = "x-security-rego-overwrite-filter";

/// Replaces the default `allow` with rule-gated `allow` clauses.
pub const BOOLEAN_FILTER_KEY: &str = "x-security-rego-boolean-filter";

/// A field filter entry: mask these fields for holders of the scheme's scopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilterDef {
    /// Security scheme whose scopes gate the filter.
    pub scheme: String,
    /// Field names returned by the filter.
    pub mask_fields: Vec<String>,
}

/// A list filter definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ListFilterDef {
    /// Name of the collection under `input`.
    pub source: String,
    /// Conditions each kept element satisfies.
    pub operations: Vec<Operation>,
}

/// An overwrite filter definition.
#[derive(Debug, Clone, PartialEq)]
pub struct OverwriteFilterDef {
    /// Field of `input.object` to overwrite.
    pub field: String,
    /// Replacement value; `None` renders as `null`.
    pub value: Option<Value>,
    /// Overwrite when the rules do *not* hold.
    pub negated: bool,
    /// Alternative conditions.
    pub rules: Vec<Rule>,
}

/// A boolean filter definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanFilterDef {
    /// Alternative conditions, one `allow` clause each.
    pub rules: Vec<Rule>,
}

/// All recognised extensions of one operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationExtensions {
    /// Field filter entries, in declaration then scheme-name order.
    pub field_filters: Vec<FieldFilterDef>,
    /// List filters.
    pub list_filters: Vec<ListFilterDef>,
    /// Overwrite filters.
    pub overwrite_filters: Vec<OverwriteFilterDef>,
    /// Boolean filters; `Some` whenever the key is present, even if empty.
    pub boolean_filters: Option<Vec<BooleanFilterDef>>,
}

// Raw payload shapes, as written in the document.

type RawFieldFilter = BTreeMap<String, Vec<String>>;

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawOperation {
    Eq(Vec<Value>),
    Lt(Vec<Value>),
    Gte(Vec<Value>),
    Membership(Vec<Value>),
    Negation(Vec<Value>),
}

impl RawOperation {
    fn into_parts(self) -> (Operator, Vec<Value>) {
        match self {
            Self::Eq(v) => (Operator::Eq, v),
            Self::Lt(v) => (Operator::Lt, v),
            Self::Gte(v) => (Operator::Gte, v),
            Self::Membership(v) => (Operator::Membership, v),
            Self::Negation(v) => (Operator::Negation, v),
        }
    }
}

#[derive(Deserialize)]
struct RawRule {
    #[serde(default)]
    operations: Vec<RawOperation>,
}

#[derive(Deserialize)]
struct RawListFilter {
    source: String,
    #[serde(default)]
    operations: Vec<RawOperation>,
}

#[derive(Deserialize)]
struct RawOverwriteFilter {
    field: String,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    negated: bool,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Deserialize)]
struct RawBooleanFilter {
    #[serde(default)]
    rules: Vec<RawRule>,
}

/// Decodes every recognised extension of `op`.
///
/// # Errors
///
/// Returns an error naming the extension if a payload has the wrong shape,
/// an operand is not a scalar, or an operator has the wrong arity.
pub fn parse_extensions(op: &OperationView<'_>) -> Result<OperationExtensions> {
    let mut extensions = OperationExtensions::default();

    if let Some(payload) = op.extension(FIELD_FILTER_KEY) {
        let site = ExtensionSite::new(FIELD_FILTER_KEY, op.method, op.path);
        let raw: Vec<RawFieldFilter> = decode(payload, &site)?;
        extensions.field_filters = raw
            .into_iter()
            .flatten()
            .map(|(scheme, mask_fields)| FieldFilterDef {
                scheme,
                mask_fields,
            })
            .collect();
    }

    if let Some(payload) = op.extension(LIST_FILTER_KEY) {
        let site = ExtensionSite::new(LIST_FILTER_KEY, op.method, op.path);
        let raw: Vec<RawListFilter> = decode(payload, &site)?;
        extensions.list_filters = raw
            .into_iter()
            .map(|filter| {
                Ok(ListFilterDef {
                    source: filter.source,
                    operations: classify_operations(filter.operations, &site)?,
                })
            })
            .collect::<Result<_>>()?;
    }

    if let Some(payload) = op.extension(OVERWRITE_FILTER_KEY) {
        let site = ExtensionSite::new(OVERWRITE_FILTER_KEY, op.method, op.path);
        let raw: Vec<RawOverwriteFilter> = decode(payload, &site)?;
        extensions.overwrite_filters = raw
            .into_iter()
            .map(|filter| {
                Ok(OverwriteFilterDef {
                    field: filter.field,
                    value: filter.value.filter(|v| !v.is_null()),
                    negated: filter.negated,
                    rules: classify_rules(filter.rules, &site)?,
                })
            })
            .collect::<Result<_>>()?;
    }

    if let Some(payload) = op.extension(BOOLEAN_FILTER_KEY) {
        let site = ExtensionSite::new(BOOLEAN_FILTER_KEY, op.method, op.path);
        let raw: Vec<RawBooleanFilter> = decode(payload, &site)?;
        extensions.boolean_filters = Some(
            raw.into_iter()
                .map(|filter| {
                    Ok(BooleanFilterDef {
                        rules: classify_rules(filter.rules, &site)?,
                    })
                })
                .collect::<Result<_>>()?,
        );
    }

    debug!(
        path = op.path,
        method = %op.method,
        field = extensions.field_filters.len(),
        list = extensions.list_filters.len(),
        overwrite = extensions.overwrite_filters.len(),
        boolean = ?extensions.boolean_filters.as_ref().map(Vec::len),
        "Parsed operation extensions"
    );

    Ok(extensions)
}

fn decode<T: DeserializeOwned>(payload: &Value, site: &ExtensionSite) -> Result<T> {
    T::deserialize(payload).map_err(|e| CompilerError::MalformedExtension {
        site: site.clone(),
        source: e,
    })
}

fn classify_rules(rules: Vec<RawRule>, site: &ExtensionSite) -> Result<Vec<Rule>> {
    rules
        .into_iter()
        .map(|rule| classify_operations(rule.operations, site).map(Rule::new))
        .collect()
}

fn classify_operations(operations: Vec<RawOperation>, site: &ExtensionSite) -> Result<Vec<Operation>> {
    operations
        .into_iter()
        .map(|raw| {
            let (operator, values) = raw.into_parts();

            if let Some(expected) = operator.check_arity(values.len()) {
                return Err(CompilerError::InvalidArity {
                    site: site.clone(),
                    operator: operator.name(),
                    expected,
                    found: values.len(),
                });
            }

            let operands = values
                .iter()
                .map(|value| {
                    Operand::try_from(value).map_err(|e| match e {
                        oasrego_core::Error::IllegalOperandType { found } => {
                            CompilerError::IllegalOperandType {
                                site: site.clone(),
                                found,
                            }
                        }
                        other => CompilerError::Core(other),
                    })
                })
                .collect::<Result<_>>()?;

            Ok(Operation::new(operator, operands))
        })
        .collect()
}
