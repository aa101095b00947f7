//! Syntax verification of generated policies.
//!
//! The rendered module is handed to `regorus`, a pure Rust implementation of
//! OPA/Rego, which parses it. Nothing is evaluated.

use tracing::{debug, instrument};

use crate::error::{CompilerError, Result};

/// Parses `source` as a Rego module.
///
/// # Arguments
///
/// * `name` - Name of the policy (for error messages)
/// * `source` - Rego source code
///
/// # Errors
///
/// Returns [`CompilerError::Verify`] if the source does not parse.
#[instrument(skip(source))]
pub fn verify_policy(name: &str, source: &str) -> Result<()> {
    let mut engine = regorus::Engine::new();
    engine
        .add_policy(name.to_string(), source.to_string())
        .map_err(|e| {
            let message = e.to_string();
            CompilerError::Verify {
                line: extract_line_from_error(&message).unwrap_or(1),
                message,
            }
        })?;

    debug!(name, "Policy parsed");
    Ok(())
}

/// Extracts a line number from a parser message.
fn extract_line_from_error(msg: &str) -> Option<usize> {
    // "line N"
    let msg_lower = msg.to_lowercase();
    if let Some(idx) = msg_lower.find("line ") {
        let rest = &msg[idx + 5..];
        if let Some(num_str) = rest.split_whitespace().next() {
            if let Ok(num) = num_str.trim_matches(|c: char| !c.is_ascii_digit()).parse() {
                return Some(num);
            }
        }
    }

    // "file:N:M"
    msg.split(':')
        .filter_map(|part| part.trim().parse::<usize>().ok())
        .find(|&num| num > 0)
}
