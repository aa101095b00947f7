//! Error types for the policy compiler.

use std::fmt;

use oasrego_core::HttpMethod;
use thiserror::Error;

/// Result type alias for compiler operations.
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Where in the document an extension was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSite {
    /// Extension key, e.g. `x-security-rego-list-filter`.
    pub key: &'static str,
    /// HTTP method of the operation.
    pub method: HttpMethod,
    /// Path template of the operation.
    pub path: String,
}

impl ExtensionSite {
    /// Creates a site.
    #[must_use]
    pub fn new(key: &'static str, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            key,
            method,
            path: path.into(),
        }
    }
}

impl fmt::Display for ExtensionSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {} {}", self.key, self.method, self.path)
    }
}

/// Errors that can occur during policy generation.
#[derive(Error, Debug)]
pub enum CompilerError {
    /// An extension payload does not have the expected JSON shape.
    #[error("malformed extension payload in {site}: {source}")]
    MalformedExtension {
        /// Offending extension.
        site: ExtensionSite,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// A field filter names a security scheme the operation does not require.
    #[error("unknown security scheme {scheme} referenced by {site}")]
    UnknownSecurityScheme {
        /// Offending extension.
        site: ExtensionSite,
        /// Scheme name.
        scheme: String,
    },

    /// A field filter is declared on an operation without security requirements.
    #[error("missing Security Requirement Object for {site}")]
    MissingSecurityRequirement {
        /// Offending extension.
        site: ExtensionSite,
    },

    /// A field filter's scheme resolves to an empty scope list.
    #[error("security scheme {scheme} requires no scopes, needed by {site}")]
    EmptyScopes {
        /// Offending extension.
        site: ExtensionSite,
        /// Scheme name.
        scheme: String,
    },

    /// A rule operand is not a string, boolean, or number.
    #[error("illegal operand type {found} in {site}")]
    IllegalOperandType {
        /// Offending extension.
        site: ExtensionSite,
        /// JSON type of the operand.
        found: &'static str,
    },

    /// An operator received the wrong number of operands.
    #[error("operator {operator} expects {expected} operand(s), found {found} in {site}")]
    InvalidArity {
        /// Offending extension.
        site: ExtensionSite,
        /// Operator name.
        operator: &'static str,
        /// Expected arity.
        expected: &'static str,
        /// Number of operands given.
        found: usize,
    },

    /// Writing the policy text failed.
    #[error("failed to render policy: {0}")]
    Render(#[from] fmt::Error),

    /// The rendered policy was rejected by the Rego parser.
    #[error("generated policy does not parse at line {line}: {message}")]
    Verify {
        /// Line reported by the parser.
        line: usize,
        /// Parser message.
        message: String,
    },

    /// Core library error.
    #[error(transparent)]
    Core(#[from] oasrego_core::Error),
}
