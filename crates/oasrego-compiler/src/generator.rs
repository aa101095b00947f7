//! End-to-end policy generation.

use oasrego_core::{OpenApiDocument, Policy};
use tracing::{info, instrument};

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::renderer::Renderer;
use crate::schema::SchemaBuilder;
use crate::verify::verify_policy;

/// Generates a Rego policy from an annotated OpenAPI document.
///
/// Generation is all-or-nothing: the first error aborts the run and no
/// partial policy is returned.
///
/// # Examples
///
/// ```rust
/// use oasrego_compiler::{Generator, GeneratorConfig};
/// use oasrego_core::OpenApiDocument;
///
/// let doc = OpenApiDocument::from_yaml_str(r#"
/// openapi: "3.0.0"
/// paths:
///   /users/{id}:
///     get:
///       security:
///         - oauth: [read]
/// "#).unwrap();
///
/// let policy = Generator::new(GeneratorConfig::new("users.authz"))
///     .generate(&doc)
///     .unwrap();
///
/// assert!(policy.source.contains("input.path = [\"users\", id]"));
/// assert!(policy.source.contains("token.payload.scopes[\"read\"]"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    /// Creates a generator with the given configuration.
    #[must_use]
    pub const fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generates the policy for `doc`.
    ///
    /// # Errors
    ///
    /// Returns an error if an extension is malformed or inconsistent with the
    /// operation's security, if rendering fails, or, with verification
    /// enabled, if the rendered module does not parse.
    #[instrument(skip_all, fields(package = %self.config.package_name))]
    pub fn generate(&self, doc: &OpenApiDocument) -> Result<Policy> {
        let records =
            SchemaBuilder::with_helper_prefix(self.config.helper_prefix.clone()).build(doc)?;
        let source = Renderer::new(&self.config.package_name).render(&records)?;

        if self.config.verify {
            verify_policy(&format!("{}.rego", self.config.package_name), &source)?;
        }

        let policy = Policy::new(&self.config.package_name, source).with_record_count(records.len());
        let meta = doc.info.as_ref();

        info!(
            title = meta.and_then(|i| i.title.as_deref()).unwrap_or("untitled"),
            version = meta.and_then(|i| i.version.as_deref()).unwrap_or("unversioned"),
            records = policy.record_count,
            lines = policy.line_count(),
            verified = self.config.verify,
            "Generated policy"
        );

        Ok(policy)
    }
}

/// Generates the policy source for `doc` in package `package_name`.
///
/// # Errors
///
/// See [`Generator::generate`].
pub fn generate(doc: &OpenApiDocument, package_name: &str) -> Result<String> {
    Generator::new(GeneratorConfig::new(package_name))
        .generate(doc)
        .map(|policy| policy.source)
}
