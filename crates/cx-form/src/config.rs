//! Form configuration
//!
//! [`FormOptions`] holds the plain, serializable knobs; [`FormConfig`] adds
//! the schema factory and an optional starting value.

use std::fmt;
use std::sync::Arc;

use cx_schema::{
    FormKey, Schema, SchemaCapability, SchemaResult, StructuralAdapter, ValidationMode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FormError, FormResult};

/// Builds the schema capability for a form key
pub type SchemaFactory =
    Arc<dyn Fn(&FormKey) -> SchemaResult<Arc<dyn SchemaCapability>> + Send + Sync>;

/// Serializable form options
///
/// ```
/// use cx_form::FormOptions;
/// use cx_schema::ValidationMode;
///
/// let options = FormOptions::from_json(r#"{"key": "signup", "validationMode": "strict"}"#).unwrap();
/// assert_eq!(options.validation_mode, ValidationMode::Strict);
/// assert!(options.use_defaults);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FormOptions {
    /// Explicit form key; generated when absent
    pub key: Option<FormKey>,
    /// Draft strictness for the initial state
    pub validation_mode: ValidationMode,
    /// Seed the document from declared defaults
    pub use_defaults: bool,
}

impl FormOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode options from JSON
    ///
    /// # Errors
    /// Returns [`FormError::InvalidOptions`](crate::FormError::InvalidOptions)
    /// when the input is not valid options JSON.
    pub fn from_json(json: &str) -> FormResult<Self> {
        serde_json::from_str(json).map_err(FormError::InvalidOptions)
    }
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            key: None,
            validation_mode: ValidationMode::Lax,
            use_defaults: true,
        }
    }
}

/// Everything needed to open a form
#[derive(Clone)]
pub struct FormConfig {
    pub(crate) schema: SchemaFactory,
    /// Plain options
    pub options: FormOptions,
    /// Partial value layered over the synthesized document
    pub initial_state: Option<Value>,
}

impl FormConfig {
    /// Create configuration from a schema factory
    pub fn new(
        factory: impl Fn(&FormKey) -> SchemaResult<Arc<dyn SchemaCapability>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            schema: Arc::new(factory),
            options: FormOptions::default(),
            initial_state: None,
        }
    }

    /// Configuration backed by a structural schema
    #[must_use]
    pub fn structural(schema: Schema) -> Self {
        Self::new(move |key| {
            let adapter = StructuralAdapter::new(schema.clone(), key.clone())?;
            Ok(Arc::new(adapter) as Arc<dyn SchemaCapability>)
        })
    }

    /// With explicit key
    #[inline]
    #[must_use]
    pub fn with_key(mut self, key: impl Into<FormKey>) -> Self {
        self.options.key = Some(key.into());
        self
    }

    /// With starting value
    #[inline]
    #[must_use]
    pub fn with_initial_state(mut self, initial: Value) -> Self {
        self.initial_state = Some(initial);
        self
    }

    /// With draft strictness
    #[inline]
    #[must_use]
    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.options.validation_mode = mode;
        self
    }

    /// With or without declared defaults
    #[inline]
    #[must_use]
    pub fn with_defaults(mut self, use_defaults: bool) -> Self {
        self.options.use_defaults = use_defaults;
        self
    }

    /// Replace all plain options
    #[inline]
    #[must_use]
    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the schema capability for `key`
    ///
    /// # Errors
    /// Propagates the factory's [`SchemaError`](cx_schema::SchemaError).
    pub fn build_schema(&self, key: &FormKey) -> SchemaResult<Arc<dyn SchemaCapability>> {
        (self.schema)(key)
    }
}

impl fmt::Debug for FormConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormConfig")
            .field("options", &self.options)
            .field("initial_state", &self.initial_state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_default_to_lax_with_defaults() {
        let options = FormOptions::default();
        assert_eq!(options.validation_mode, ValidationMode::Lax);
        assert!(options.use_defaults);
        assert_eq!(options.key, None);
    }

    #[test]
    fn options_from_partial_json() {
        let options = FormOptions::from_json(r#"{"useDefaults": false}"#).unwrap();
        assert!(!options.use_defaults);
        assert_eq!(options.validation_mode, ValidationMode::Lax);
    }

    #[test]
    fn options_reject_bad_json() {
        assert!(FormOptions::from_json(r#"{"validationMode": "loose"}"#).is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let config = FormConfig::structural(Schema::object([("a", Schema::string())]))
            .with_key("k")
            .with_initial_state(json!({"a": "x"}))
            .with_validation_mode(ValidationMode::Strict)
            .with_defaults(false);
        assert_eq!(config.options.key, Some(FormKey::new("k")));
        assert_eq!(config.options.validation_mode, ValidationMode::Strict);
        assert!(!config.options.use_defaults);
        assert!(config.build_schema(&FormKey::new("k")).is_ok());
    }

    #[test]
    fn structural_factory_rejects_non_object_root() {
        let config = FormConfig::structural(Schema::string());
        assert!(config.build_schema(&FormKey::new("k")).is_err());
    }
}
