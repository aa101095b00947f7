//! # oasrego Compiler
//!
//! Generates Rego authorization policies from OpenAPI 3 documents annotated
//! with `x-security-rego-*` extensions.
//!
//! This crate provides functionality for:
//!
//! - Converting OpenAPI path templates into Rego path arrays
//! - Decoding the four security extensions into typed rules
//! - Compiling rules into Rego body expressions
//! - Building one policy record per generated rule-set
//! - Rendering the records as a single Rego module
//! - Optionally parsing the result with `regorus`
//!
//! ## Extensions
//!
//! | Key | Generates |
//! |---|---|
//! | `x-security-rego-field-filter` | `filter = [fields]`, gated on token scopes |
//! | `x-security-rego-list-filter` | `list_filter contains x` over an input collection |
//! | `x-security-rego-overwrite-filter` | paired `response[field]` rules and helper predicates |
//! | `x-security-rego-boolean-filter` | `allow` clauses replacing the default allow |
//!
//! ## Example
//!
//! ```rust,ignore
//! use oasrego_compiler::{Generator, GeneratorConfig};
//! use oasrego_core::OpenApiDocument;
//!
//! let doc = OpenApiDocument::from_file("openapi.yaml")?;
//! let policy = Generator::new(GeneratorConfig::new("httpapi.authz")).generate(&doc)?;
//! policy.write_to("policy.rego")?;
//! ```

pub mod config;
pub mod error;
pub mod expression;
pub mod extension;
pub mod generator;
pub mod path;
pub mod renderer;
pub mod schema;
pub mod verify;

pub use config::{GeneratorConfig, DEFAULT_OUTPUT_FILE, DEFAULT_PACKAGE_NAME};
pub use error::{CompilerError, ExtensionSite, Result};
pub use expression::Scope;
pub use extension::{
    parse_extensions, OperationExtensions, BOOLEAN_FILTER_KEY, FIELD_FILTER_KEY, LIST_FILTER_KEY,
    OVERWRITE_FILTER_KEY,
};
pub use generator::{generate, Generator};
pub use path::PathLiteral;
pub use renderer::Renderer;
pub use schema::{
    BooleanFilter, FieldFilter, FilterKind, ListFilter, OverwriteFilter, PolicySchema, SchemaBuilder,
};
pub use verify::verify_policy;
