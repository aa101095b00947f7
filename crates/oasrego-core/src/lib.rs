//! # oasrego Core
//!
//! Core types for generating Rego authorization policies from OpenAPI documents.
//!
//! This crate provides the data structures the generator consumes and produces:
//!
//! - [`OpenApiDocument`] - OpenAPI 3 document loader (JSON or YAML)
//! - [`OperationView`] - One (path, method) operation with its effective security
//! - [`SecuritySchemeMap`] - Flattened scheme-to-scopes lookup
//! - [`Rule`], [`Operation`], [`Operand`], [`Operator`] - Typed rule model
//! - [`Policy`] - The generated Rego module
//!
//! ## Example
//!
//! ```rust
//! use oasrego_core::{OpenApiDocument, SecuritySchemeMap};
//!
//! let doc = OpenApiDocument::from_json_str(r#"{
//!     "openapi": "3.0.0",
//!     "paths": {"/users": {"get": {"security": [{"oauth": ["read"]}]}}}
//! }"#).unwrap();
//!
//! for op in doc.operations() {
//!     let schemes = SecuritySchemeMap::resolve(op.security.unwrap_or_default());
//!     assert_eq!(schemes.all_scopes(), vec!["read"]);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod policy;
pub mod rule;
pub mod security;


pub use document::{HttpMethod, OpenApiDocument, OperationObject, OperationView, PathItem, SecurityRequirement};
pub use error::{Error, Result};
pub use policy::Policy;
pub use rule::{Operand, Operation, Operator, Rule};
pub use security::SecuritySchemeMap;
