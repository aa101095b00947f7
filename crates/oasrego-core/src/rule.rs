//! Typed rule model shared by the extension parser and the expression compiler.
//!
//! A [`Rule`] is a conjunction of [`Operation`]s; each operation applies one
//! [`Operator`] to an ordered list of [`Operand`]s.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// A literal or symbolic reference inside a rule expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A reference (`token.payload.sub`, `$id`, `owner`) or a quoted literal.
    Str(String),
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal; rendered truncated to an integer.
    Float(f64),
}

impl TryFrom<&Value> for Operand {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Str(s.clone())),
            Value::Bool(b) => Ok(Self::Bool(*b)),
            Value::Number(n) => Ok(n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Int)),
            other => Err(Error::IllegalOperandType {
                found: json_type_name(other),
            }),
        }
    }
}

/// Returns the JSON type name of a value, for error messages.
#[must_use]
pub const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The fixed set of supported operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    /// Equality / unification.
    Eq,
    /// Less than.
    Lt,
    /// Greater than or equal.
    Gte,
    /// Collection membership.
    Membership,
    /// Logical negation of a single operand.
    Negation,
}

impl Operator {
    /// Name used in extension payloads.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Lt => "lt",
            Self::Gte => "gte",
            Self::Membership => "membership",
            Self::Negation => "negation",
        }
    }

    /// Rego text joining the operands, or prefixing the operand of a unary operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq | Self::Membership => " = ",
            Self::Lt => " < ",
            Self::Gte => " >= ",
            Self::Negation => "not ",
        }
    }

    /// Whether the operator takes exactly one operand.
    #[must_use]
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Negation)
    }

    /// Checks the operand count for this operator.
    ///
    /// Returns the expected arity description on mismatch.
    #[must_use]
    pub const fn check_arity(self, count: usize) -> Option<&'static str> {
        if self.is_unary() {
            if count == 1 {
                None
            } else {
                Some("exactly 1")
            }
        } else if count >= 2 {
            None
        } else {
            Some("at least 2")
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One operator applied to its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// The operator.
    pub operator: Operator,
    /// Operands in declaration order.
    pub operands: Vec<Operand>,
}

impl Operation {
    /// Creates an operation.
    #[must_use]
    pub const fn new(operator: Operator, operands: Vec<Operand>) -> Self {
        Self { operator, operands }
    }
}

/// A conjunction of operations guarding one generated clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rule {
    /// Operations, all of which must hold.
    pub operations: Vec<Operation>,
}

impl Rule {
    /// Creates a rule from its operations.
    #[must_use]
    pub const fn new(operations: Vec<Operation>) -> Self {
        Self { operations }
    }
}
