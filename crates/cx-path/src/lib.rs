//! Chemical-X Paths
//!
//! Dot-separated addressing over JSON documents.
//!
//! # Core Concepts
//!
//! - [`split_path`] / [`parse_segments`]: Raw and typed segments of `user.address.city`
//! - [`PathSegment`]: Typed key/index segment used in error paths
//! - [`flatten`] / [`reconstruct`]: Leaf-path maps and their inverse
//! - [`resolve`] / [`set_at`]: Reading and writing at a path
//! - [`deep_merge`]: Key-wise and index-wise merge of documents
//!
//! # Example
//!
//! ```rust
//! use cx_path::{flatten, resolve, set_at};
//! use serde_json::json;
//!
//! let mut doc = json!({"user": {"name": "ada"}});
//! set_at(&mut doc, "user.tags.0", json!("admin")).unwrap();
//!
//! assert_eq!(resolve(&doc, "user.tags.0"), Some(&json!("admin")));
//! assert_eq!(flatten(&doc, None).len(), 2);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod access;
mod flatten;
mod merge;
mod path;

pub use access::{contains, remove_at, resolve, resolve_mut, set_at};
pub use flatten::{flatten, is_within, reconstruct, FlatMap, NO_PATH_KEY};
pub use merge::{deep_merge, merge_into};
pub use path::{
    join_path, join_segments, parse_segments, split_path, PathError, PathSegment, PATH_SEPARATOR,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
