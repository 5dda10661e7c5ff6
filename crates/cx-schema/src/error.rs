//! Error types for schema operations
//!
//! Two kinds of failure exist:
//! - [`SchemaError`]: the schema cannot do what was asked (programming error)
//! - [`ValidationError`]: a document does not satisfy the schema (data)

use std::fmt::{self, Display, Formatter};

use cx_path::{join_segments, PathSegment};
use serde::{Deserialize, Serialize};

use crate::issue::Issue;
use crate::key::FormKey;

/// Schema programming errors
///
/// Returned when a schema is unusable for the requested operation. These
/// indicate a bug in the schema definition, not bad user input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Root schema does not describe an object
    #[error("root schema must be an object, found {found}")]
    RootNotObject { found: &'static str },

    /// Discriminated union without branches
    #[error("discriminated union on '{discriminator}' has no options")]
    EmptyDiscriminatedUnion { discriminator: String },

    /// Union without options
    #[error("union has no options")]
    EmptyUnion,

    /// Enum without values
    #[error("enum has no values")]
    EmptyEnum,

    /// Initial state could not be brought into a valid shape
    #[error("unable to derive a valid initial state: {0}")]
    Unrepairable(String),
}

impl SchemaError {
    /// Create an unrepairable-state error from the residual issues
    pub fn unrepairable(issues: &[Issue]) -> Self {
        let detail = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self::Unrepairable(detail)
    }
}

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Data validation failure tied to a field path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    /// Human readable description
    pub message: String,
    /// Location of the offending value
    pub path: Vec<PathSegment>,
    /// Form that produced the error
    pub form_key: FormKey,
}

impl ValidationError {
    /// Create a validation error
    pub fn new(message: impl Into<String>, path: Vec<PathSegment>, form_key: FormKey) -> Self {
        Self {
            message: message.into(),
            path,
            form_key,
        }
    }

    /// Convert a parser issue
    #[must_use]
    pub fn from_issue(issue: &Issue, form_key: &FormKey) -> Self {
        Self::new(issue.message.clone(), issue.path.clone(), form_key.clone())
    }

    /// Dotted form of [`Self::path`]
    #[inline]
    #[must_use]
    pub fn path_string(&self) -> String {
        join_segments(&self.path)
    }

    /// Prefix the path with `base` segments
    #[must_use]
    pub fn prefixed(mut self, base: &[PathSegment]) -> Self {
        let mut path = base.to_vec();
        path.append(&mut self.path);
        self.path = path;
        self
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_error_display() {
        let err = SchemaError::RootNotObject { found: "string" };
        assert_eq!(err.to_string(), "root schema must be an object, found string");
    }

    #[test]
    fn validation_error_display_and_prefix() {
        let err = ValidationError::new("Required", vec!["name".into()], FormKey::new("f"))
            .prefixed(&["user".into(), 0.into()]);
        assert_eq!(err.path_string(), "user.0.name");
        assert_eq!(err.to_string(), "user.0.name: Required");
    }

    #[test]
    fn validation_error_serializes_camel_case() {
        let err = ValidationError::new("bad", vec![1.into()], FormKey::new("f"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["formKey"], "f");
        assert_eq!(json["path"], serde_json::json!([1]));
    }
}
