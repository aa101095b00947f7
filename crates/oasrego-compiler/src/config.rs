//! Configuration types for policy generation.

use crate::schema::DEFAULT_HELPER_PREFIX;

/// Package name used when none is configured.
pub const DEFAULT_PACKAGE_NAME: &str = "httpapi.authz";

/// Output file used by the CLI when none is configured.
pub const DEFAULT_OUTPUT_FILE: &str = "policy.rego";

/// Configuration for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Rego package of the generated module.
    pub package_name: String,

    /// Prefix of overwrite helper predicate names.
    pub helper_prefix: String,

    /// Parse the rendered module with the Rego engine before returning it.
    pub verify: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PACKAGE_NAME)
    }
}

impl GeneratorConfig {
    /// Creates a configuration for the given package.
    ///
    /// # Examples
    ///
    /// ```
    /// use oasrego_compiler::GeneratorConfig;
    ///
    /// let config = GeneratorConfig::new("petstore.authz");
    /// assert_eq!(config.package_name, "petstore.authz");
    /// assert!(!config.verify);
    /// ```
    #[must_use]
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            helper_prefix: DEFAULT_HELPER_PREFIX.to_string(),
            verify: false,
        }
    }

    /// Sets the package name.
    #[must_use]
    pub fn with_package_name(mut self, package_name: impl Into<String>) -> Self {
        self.package_name = package_name.into();
        self
    }

    /// Sets the helper predicate prefix.
    #[must_use]
    pub fn with_helper_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.helper_prefix = prefix.into();
        self
    }

    /// Enables or disables syntax verification.
    #[must_use]
    pub const fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
