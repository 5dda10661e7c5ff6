//! Form identity

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Opaque identifier of one form instance
///
/// Carried by every validation error and meta entry so consumers can route
/// them back to the form that produced them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormKey(String);

impl FormKey {
    /// Create a key from an explicit name
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generate a fresh random key
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Key as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FormKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for FormKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl AsRef<str> for FormKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
