//! Error types for form operations
//!
//! Writes never error: a rejected write returns `false` and leaves the
//! document untouched. Errors here come from construction and
//! configuration, where a schema or option set is unusable.

use cx_schema::{FormKey, SchemaError};

/// Main form error type
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Schema cannot back a form
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Initial state produced no document
    #[error("form '{0}' has no initial document")]
    EmptyDocument(FormKey),

    /// Options could not be decoded
    #[error("invalid form options: {0}")]
    InvalidOptions(#[source] serde_json::Error),

    /// Document does not fit the requested type
    #[error("cannot decode form document: {0}")]
    Decode(#[source] serde_json::Error),

    /// No open form under this key
    #[error("form '{0}' is not registered")]
    FormNotRegistered(FormKey),
}

/// Result type alias for form operations
pub type FormResult<T> = Result<T, FormError>;
