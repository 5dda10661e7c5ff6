//! Chemical-X Forms - schema-driven form state
//!
//! Keeps one authoritative document per form and everything derived from
//! it:
//! - Writes at the root or at any dot path, drafted and repaired through a
//!   [`SchemaCapability`](cx_schema::SchemaCapability)
//! - Per-leaf meta entries (last raw value, update time, connection)
//! - A lazily derived dirty/pristine summary
//! - Element bindings, focus and blur state
//! - Validation and async submission
//!
//! # Example
//!
//! ```rust,ignore
//! use cx_form::{FormConfig, FormRegistry};
//! use cx_schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::object([("name", Schema::string()), ("age", Schema::number())]);
//! let mut registry = FormRegistry::new();
//! let form = registry.open(FormConfig::structural(schema).with_key("profile"))?;
//!
//! assert!(form.set_value_at("age", json!(36)));
//! assert!(form.field_summary("age").unwrap().dirty);
//!
//! let outcome = form.handle_submit(|doc| async move {
//!     println!("submitting {doc}");
//!     Ok(())
//! }).await;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod binding;
mod config;
mod error;
mod meta;
mod registry;
mod store;
mod submit;
mod summary;

pub use binding::{ElementId, FieldState, InteractionState, Registration};
pub use config::{FormConfig, FormOptions, SchemaFactory};
pub use error::{FormError, FormResult};
pub use meta::{MetaEntry, MetaTracker, MetaUpdate};
pub use registry::FormRegistry;
pub use store::{Form, SetValue, ValidationSummary, ValueWithMeta};
pub use submit::SubmitOutcome;
pub use summary::{FormSummary, SummaryEntry};

pub use cx_schema::{FormKey, ValidationError, ValidationMode};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with forms
    pub use crate::{
        ElementId, Form, FormConfig, FormKey, FormOptions, FormRegistry, SetValue,
        SubmitOutcome, ValidationMode,
    };
    pub use cx_schema::Schema;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
