//! Generated policy model.
//!
//! This module defines the [`Policy`] structure returned by a generation run.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// A generated Rego policy module.
///
/// # Examples
///
/// ```rust
/// use oasrego_core::Policy;
///
/// let policy = Policy::new(
///     "httpapi.authz",
///     "package httpapi.authz\n\ndefault allow := false\n",
/// );
/// assert_eq!(policy.package_name, "httpapi.authz");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// The Rego package name (e.g., "httpapi.authz").
    pub package_name: String,

    /// Rendered Rego source code.
    pub source: String,

    /// Number of policy records the source was rendered from.
    pub record_count: usize,
}

impl Policy {
    /// Creates a new policy from source code.
    #[must_use]
    pub fn new(package_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            source: source.into(),
            record_count: 0,
        }
    }

    /// Sets the number of records the policy was rendered from.
    #[must_use]
    pub const fn with_record_count(mut self, count: usize) -> Self {
        self.record_count = count;
        self
    }

    /// Returns the number of lines in the source.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.source.lines().count()
    }

    /// Writes the source to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, &self.source).map_err(|e| Error::PolicyWrite {
            path: path.to_path_buf(),
            source: e,
        })
    }
}
