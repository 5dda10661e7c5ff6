//! Chemical-X Schema
//!
//! The contract between form machinery and a schema library, plus a
//! structural implementation of it.
//!
//! # Core Concepts
//!
//! - [`SchemaCapability`]: What a form needs from a schema
//! - [`Schema`]: Structural schema tree (objects, arrays, unions, wrappers)
//! - [`StructuralAdapter`]: [`SchemaCapability`] over a [`Schema`]
//! - [`StripConfig`]: Which wrappers [`unwrap`] and [`slim`] remove
//! - [`ValidationError`]: Path-located data error stamped with a [`FormKey`]
//!
//! # Example
//!
//! ```rust,ignore
//! use cx_schema::{InitialStateOptions, Schema, SchemaCapability, StructuralAdapter};
//!
//! let schema = Schema::object([("email", Schema::string().email())]);
//! let adapter = StructuralAdapter::new(schema, "signup".into())?;
//!
//! // Always yields a document that satisfies the schema's structure
//! let state = adapter.initial_state(InitialStateOptions::draft(None))?;
//! assert_eq!(state.data, Some(json!({"email": ""})));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod adapter;
mod capability;
mod error;
mod issue;
mod key;
mod node;
mod parse;
mod resolve;
mod strip;
mod synth;

pub use adapter::StructuralAdapter;
pub use capability::{
    InitialState, InitialStateOptions, SchemaCapability, ValidationMode, ValidationOutcome,
};
pub use error::{SchemaError, SchemaResult, ValidationError};
pub use issue::{Issue, IssueKind, ParsedType, SizeOrigin, StringFormat};
pub use key::FormKey;
pub use node::{
    ArrayCheck, ArraySchema, DiscriminatedUnion, Effect, EffectKind, NumberCheck, NumberSchema,
    ObjectSchema, Refinement, Schema, StringCheck, StringSchema, UnknownKeys,
};
pub use parse::{is_valid, safe_parse, ParseResult};
pub use resolve::schemas_at_path;
pub use strip::{slim, unwrap, StripConfig, StripRule};
pub use synth::{first_branch, generate_value, unwrap_default, zero_value};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
