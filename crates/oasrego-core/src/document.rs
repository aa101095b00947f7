//! OpenAPI 3 document model.
//!
//! Only the parts of an OpenAPI document that drive policy generation are
//! modelled: the path items, their operations, security requirements, and
//! the `x-` extensions attached to each operation. Everything else in the
//! document is accepted and ignored.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

/// One security requirement object: scheme name to required scopes.
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// A parsed OpenAPI 3 document.
///
/// # Examples
///
/// ```rust
/// use oasrego_core::OpenApiDocument;
///
/// let doc = OpenApiDocument::from_yaml_str(r#"
/// openapi: "3.0.0"
/// paths:
///   /users:
///     get: {}
/// "#).unwrap();
/// assert_eq!(doc.operations().count(), 1);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct OpenApiDocument {
    /// The declared OpenAPI version (must be 3.x).
    pub openapi: String,

    /// Document metadata.
    #[serde(default)]
    pub info: Option<Info>,

    /// Security requirements applied to operations that declare none.
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,

    /// Path templates and their operations.
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
}

/// The `info` object of a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Info {
    /// API title.
    #[serde(default)]
    pub title: Option<String>,
    /// API version.
    #[serde(default)]
    pub version: Option<String>,
}

/// A path item with up to one operation per HTTP method.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathItem {
    /// `DELETE` operation.
    pub delete: Option<OperationObject>,
    /// `GET` operation.
    pub get: Option<OperationObject>,
    /// `HEAD` operation.
    pub head: Option<OperationObject>,
    /// `OPTIONS` operation.
    pub options: Option<OperationObject>,
    /// `PATCH` operation.
    pub patch: Option<OperationObject>,
    /// `POST` operation.
    pub post: Option<OperationObject>,
    /// `PUT` operation.
    pub put: Option<OperationObject>,
    /// `TRACE` operation.
    pub trace: Option<OperationObject>,
}

impl PathItem {
    /// Returns the operation declared for `method`, if any.
    #[must_use]
    pub const fn operation(&self, method: HttpMethod) -> Option<&OperationObject> {
        match method {
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }
}

/// An operation object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "RawOperationObject")]
pub struct OperationObject {
    /// Operation identifier.
    pub operation_id: Option<String>,

    /// Security requirements; `None` when the operation does not declare any.
    pub security: Option<Vec<SecurityRequirement>>,

    extensions: BTreeMap<String, Value>,
}

/// Wire form of an operation object.
///
/// Remaining keys are buffered as YAML values, which tolerate the integer
/// keys often found under `responses`. Only `x-` keys are kept.
#[derive(Deserialize)]
struct RawOperationObject {
    #[serde(default, rename = "operationId")]
    operation_id: Option<String>,

    #[serde(default)]
    security: Option<Vec<SecurityRequirement>>,

    #[serde(flatten)]
    other: BTreeMap<String, serde_yaml::Value>,
}

impl TryFrom<RawOperationObject> for OperationObject {
    type Error = String;

    fn try_from(raw: RawOperationObject) -> std::result::Result<Self, Self::Error> {
        let extensions = raw
            .other
            .into_iter()
            .filter(|(key, _)| key.starts_with("x-"))
            .map(|(key, value)| match serde_json::to_value(value) {
                Ok(value) => Ok((key, value)),
                Err(e) => Err(format!("extension {key} is not representable as JSON: {e}")),
            })
            .collect::<std::result::Result<_, _>>()?;

        Ok(Self {
            operation_id: raw.operation_id,
            security: raw.security,
            extensions,
        })
    }
}

impl OperationObject {
    /// Returns the raw payload of the extension `key`, if present.
    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }
}

/// HTTP methods an OpenAPI path item can hold.
///
/// The declaration order is the lexicographic order of the upper-case names,
/// which is the order operations are visited in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HttpMethod {
    /// `DELETE`
    Delete,
    /// `GET`
    Get,
    /// `HEAD`
    Head,
    /// `OPTIONS`
    Options,
    /// `PATCH`
    Patch,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// All methods in visiting order.
    pub const ALL: [Self; 8] = [
        Self::Delete,
        Self::Get,
        Self::Head,
        Self::Options,
        Self::Patch,
        Self::Post,
        Self::Put,
        Self::Trace,
    ];

    /// Returns the upper-case method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single (path, method) operation together with its effective security.
#[derive(Debug, Clone, Copy)]
pub struct OperationView<'a> {
    /// Path template, e.g. `/users/{id}`.
    pub path: &'a str,
    /// HTTP method.
    pub method: HttpMethod,
    /// Effective security requirements: the operation's own, or the
    /// document-level default when the operation declares none.
    pub security: Option<&'a [SecurityRequirement]>,
    /// The operation object.
    pub operation: &'a OperationObject,
}

impl<'a> OperationView<'a> {
    /// Returns the raw payload of the extension `key`, if present.
    #[must_use]
    pub fn extension(&self, key: &str) -> Option<&'a Value> {
        self.operation.extension(key)
    }
}

impl OpenApiDocument {
    /// Loads a document from a file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is malformed, or is not
    /// an OpenAPI 3 document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "Loading OpenAPI document");

        let source = fs::read_to_string(path).map_err(|e| Error::DocumentRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_yaml_str(&source)
        }
    }

    /// Parses a document from JSON source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is malformed or not an OpenAPI 3 document.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(source).map_err(|e| Error::DocumentParse {
            reason: e.to_string(),
        })?;
        doc.check_version()
    }

    /// Parses a document from YAML (or JSON) source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is malformed or not an OpenAPI 3 document.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let doc: Self = serde_yaml::from_str(source).map_err(|e| Error::DocumentParse {
            reason: e.to_string(),
        })?;
        doc.check_version()
    }

    fn check_version(self) -> Result<Self> {
        if self.openapi.starts_with("3.") {
            Ok(self)
        } else {
            Err(Error::UnsupportedVersion {
                version: self.openapi,
            })
        }
    }

    /// Iterates over every operation, paths in lexicographic order and
    /// methods in [`HttpMethod::ALL`] order.
    pub fn operations(&self) -> impl Iterator<Item = OperationView<'_>> {
        let default_security = self.security.as_deref();

        self.paths.iter().flat_map(move |(path, item)| {
            HttpMethod::ALL.into_iter().filter_map(move |method| {
                item.operation(method).map(|operation| OperationView {
                    path: path.as_str(),
                    method,
                    security: operation.security.as_deref().or(default_security),
                    operation,
                })
            })
        })
    }
}
