//! Error types for openapi-to-rego core operations.
//!
//! This module defines the error types used throughout the `oasrego-core` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a document or classifying rule data.
#[derive(Error, Debug)]
pub enum Error {
    /// The OpenAPI document could not be read.
    #[error("Failed to read OpenAPI document {path}: {source}")]
    DocumentRead {
        /// Path to the document.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The OpenAPI document is not well-formed JSON or YAML, or misses required fields.
    #[error("Failed to parse OpenAPI document: {reason}")]
    DocumentParse {
        /// Reason for the parse failure.
        reason: String,
    },

    /// The document declares an `openapi` version other than 3.x.
    #[error("Unsupported OpenAPI version {version:?}, expected 3.x")]
    UnsupportedVersion {
        /// Version string found in the document.
        version: String,
    },

    /// The generated policy could not be written.
    #[error("Failed to write policy to {path}: {source}")]
    PolicyWrite {
        /// Destination path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A security scheme name was looked up but no requirement declares it.
    #[error("Unknown security scheme {scheme}")]
    UnknownSecurityScheme {
        /// Name of the missing scheme.
        scheme: String,
    },

    /// A rule operand is not a string, boolean, or number.
    #[error("illegal operand type: {found}")]
    IllegalOperandType {
        /// JSON type of the rejected value.
        found: &'static str,
    },
}
