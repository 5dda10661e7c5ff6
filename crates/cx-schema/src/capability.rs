//! The schema capability contract
//!
//! Form machinery never inspects schema internals. Everything it needs
//! (synthesizing a valid starting document, finding the schemas behind a
//! path, validating) goes through [`SchemaCapability`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SchemaResult, ValidationError};
use crate::key::FormKey;

/// How strictly drafts are checked while deriving state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Refinements and built-in checks apply to drafts
    Strict,
    /// Only structure and types apply to drafts
    #[default]
    Lax,
}

/// Inputs to [`SchemaCapability::initial_state`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InitialStateOptions {
    /// Prefer declared defaults over zero values
    pub use_defaults: bool,
    /// Caller-provided partial value layered over the synthesized one
    pub constraints: Option<Value>,
    /// Draft strictness
    pub mode: ValidationMode,
}

impl InitialStateOptions {
    /// Options for a fresh form
    #[must_use]
    pub fn new(use_defaults: bool, mode: ValidationMode) -> Self {
        Self {
            use_defaults,
            constraints: None,
            mode,
        }
    }

    /// Lax options without defaults, as used when checking a write
    #[must_use]
    pub fn draft(constraints: Option<Value>) -> Self {
        Self {
            use_defaults: false,
            constraints,
            mode: ValidationMode::Lax,
        }
    }

    /// Set constraints
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: Value) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// Outcome of [`SchemaCapability::initial_state`]
///
/// `data` always satisfies the slimmed schema. `success` and `errors`
/// describe the value as requested, before any repair.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub data: Option<Value>,
    pub errors: Vec<ValidationError>,
    pub success: bool,
}

/// Outcome of [`SchemaCapability::validate_at_path`]
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Parsed output of the first accepting schema
    Valid { data: Option<Value> },
    /// Errors accumulated over every candidate schema
    Invalid {
        errors: Vec<ValidationError>,
        data: Option<Value>,
    },
}

impl ValidationOutcome {
    /// Whether validation passed
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Errors, empty on success
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        match self {
            Self::Valid { .. } => &[],
            Self::Invalid { errors, .. } => errors,
        }
    }

    /// Consume into the error list
    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        match self {
            Self::Valid { .. } => Vec::new(),
            Self::Invalid { errors, .. } => errors,
        }
    }
}

/// Operations a schema must provide to back a form
pub trait SchemaCapability: fmt::Debug + Send + Sync {
    /// Derive a valid document from defaults and optional constraints
    ///
    /// # Errors
    /// Returns a [`SchemaError`](crate::SchemaError) when the schema is
    /// unusable or no valid document can be derived.
    fn initial_state(&self, options: InitialStateOptions) -> SchemaResult<InitialState>;

    /// Capabilities for every schema that can govern `path`
    ///
    /// Empty when nothing resolves. Order is declaration order.
    fn schemas_at_path(&self, path: &str) -> Vec<Arc<dyn SchemaCapability>>;

    /// Validate `data` against the whole schema (`path` is `None`) or
    /// against the schemas at `path`
    fn validate_at_path(&self, data: Option<&Value>, path: Option<&str>) -> ValidationOutcome;

    /// Key stamped on produced errors
    fn form_key(&self) -> &FormKey;
}
