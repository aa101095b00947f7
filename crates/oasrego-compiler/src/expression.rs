//! Compilation of typed rules into Rego body expressions.
//!
//! Each [`Operation`] becomes one line of a rule body; the lines of a
//! [`Rule`] are conjoined by Rego's body semantics. String operands are
//! resolved against a [`Scope`]:
//!
//! | Operand                     | Emitted as                                   |
//! |-----------------------------|----------------------------------------------|
//! | `$id`                       | `id` (variable bound by the path literal)    |
//! | `"\"text\""`                | `"text"` (quoted literal, verbatim)          |
//! | `token...` / `input...`     | verbatim, `[_]` appended under `membership`  |
//! | anything else               | `x.<name>` or `input.object.<name>`          |

use oasrego_core::{Operand, Operation, Operator, Rule};

/// Variable bound to each element of a filtered list.
pub const LIST_ELEMENT_VAR: &str = "x";

/// Reference to the object an overwrite or boolean filter inspects.
pub const INPUT_OBJECT: &str = "input.object";

/// Prefix marking a path template variable.
const PATH_VARIABLE_MARKER: char = '$';

/// References resolved against the request rather than the scope.
const ROOT_REFERENCES: [&str; 2] = ["token", "input"];

/// What a plain operand name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// A field of the list element being filtered.
    ListElement,
    /// A field of `input.object`.
    InputObject,
}

impl Scope {
    fn qualify(self, name: &str) -> String {
        match self {
            Self::ListElement => format!("{LIST_ELEMENT_VAR}.{name}"),
            Self::InputObject => format!("{INPUT_OBJECT}.{name}"),
        }
    }
}

/// Compiles one operand as it appears under `operator`.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // truncation toward zero is the documented float rendering
pub fn compile_operand(operand: &Operand, operator: Operator, scope: Scope) -> String {
    match operand {
        Operand::Bool(b) => b.to_string(),
        Operand::Int(i) => i.to_string(),
        Operand::Float(f) => (*f as i64).to_string(),
        Operand::Str(s) => {
            if let Some(variable) = s.strip_prefix(PATH_VARIABLE_MARKER) {
                variable.trim_start_matches(PATH_VARIABLE_MARKER).to_string()
            } else if s.starts_with('"') {
                s.clone()
            } else if is_root_reference(s) {
                if operator == Operator::Membership {
                    format!("{s}[_]")
                } else {
                    s.clone()
                }
            } else {
                scope.qualify(s)
            }
        }
    }
}

/// Returns `true` if `s` is `token` or `input`, alone or followed by a path.
fn is_root_reference(s: &str) -> bool {
    ROOT_REFERENCES.iter().any(|root| {
        s.strip_prefix(root)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('.') || rest.starts_with('['))
    })
}

/// Compiles one operation into a single body expression.
///
/// Unary operators prefix their single operand; binary operators join the
/// operands with their symbol.
#[must_use]
pub fn compile_operation(operation: &Operation, scope: Scope) -> String {
    let operator = operation.operator;
    let operands: Vec<String> = operation
        .operands
        .iter()
        .map(|operand| compile_operand(operand, operator, scope))
        .collect();

    // unary arity is checked when the extension is parsed
    if operator.is_unary() {
        format!("{}{}", operator.symbol(), operands.concat())
    } else {
        operands.join(operator.symbol())
    }
}

/// Compiles a sequence of operations into body expressions.
#[must_use]
pub fn compile_operations(operations: &[Operation], scope: Scope) -> Vec<String> {
    operations
        .iter()
        .map(|operation| compile_operation(operation, scope))
        .collect()
}

/// Compiles each rule into its own list of body expressions.
#[must_use]
pub fn compile_rules(rules: &[Rule], scope: Scope) -> Vec<Vec<String>> {
    rules
        .iter()
        .map(|rule| compile_operations(&rule.operations, scope))
        .collect()
}
