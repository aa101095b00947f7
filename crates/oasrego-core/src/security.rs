//! Flattened view of an operation's security requirements.

use std::collections::BTreeMap;

use crate::document::SecurityRequirement;
use crate::error::{Error, Result};

/// Scheme name to scopes lookup for one operation.
///
/// OpenAPI allows several alternative requirement objects per operation;
/// they are flattened into one map and a scheme named more than once keeps
/// the scopes of its last occurrence.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeMap;
/// use oasrego_core::SecuritySchemeMap;
///
/// let mut req = BTreeMap::new();
/// req.insert("oauth".to_string(), vec!["read".to_string()]);
///
/// let schemes = SecuritySchemeMap::resolve(&[req]);
/// assert_eq!(schemes.scopes("oauth").unwrap(), ["read"]);
/// assert!(schemes.scopes("apiKey").is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecuritySchemeMap {
    schemes: BTreeMap<String, Vec<String>>,
}

impl SecuritySchemeMap {
    /// Flattens a list of security requirement objects.
    #[must_use]
    pub fn resolve(requirements: &[SecurityRequirement]) -> Self {
        let mut schemes = BTreeMap::new();
        for requirement in requirements {
            for (scheme, scopes) in requirement {
                schemes.insert(scheme.clone(), scopes.clone());
            }
        }
        Self { schemes }
    }

    /// Returns the scopes required for `scheme`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSecurityScheme`] if no requirement names the scheme.
    pub fn scopes(&self, scheme: &str) -> Result<&[String]> {
        self.schemes
            .get(scheme)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::UnknownSecurityScheme {
                scheme: scheme.to_string(),
            })
    }

    /// Returns every scope across all schemes, deduplicated, in scheme-name
    /// order and then declaration order.
    #[must_use]
    pub fn all_scopes(&self) -> Vec<String> {
        let mut scopes: Vec<String> = Vec::new();
        for scope in self.schemes.values().flatten() {
            if !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
        scopes
    }
}
