//! Registry of open forms
//!
//! Owns every [`Form`] by key. Opening a key that is already open returns
//! the existing form untouched.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use cx_schema::FormKey;

use crate::config::FormConfig;
use crate::error::{FormError, FormResult};
use crate::store::Form;

/// Open forms keyed by [`FormKey`]
#[derive(Debug, Default)]
pub struct FormRegistry {
    forms: HashMap<FormKey, Form>,
}

impl FormRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the form described by `config`, or return the one already open
    ///
    /// A config without a key opens a new form under a generated key.
    ///
    /// # Errors
    /// Propagates [`Form::from_config`] errors for a new form.
    pub fn open(&mut self, config: FormConfig) -> FormResult<&mut Form> {
        let key = config
            .options
            .key
            .clone()
            .unwrap_or_else(FormKey::generate);
        match self.forms.entry(key) {
            Entry::Occupied(entry) => {
                tracing::trace!(form_key = %entry.key(), "form already open");
                Ok(entry.into_mut())
            }
            Entry::Vacant(entry) => {
                let form = Form::from_config(config.with_key(entry.key().clone()))?;
                Ok(entry.insert(form))
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &FormKey) -> Option<&Form> {
        self.forms.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &FormKey) -> Option<&mut Form> {
        self.forms.get_mut(key)
    }

    /// Form under `key`
    ///
    /// # Errors
    /// Returns [`FormError::FormNotRegistered`] when no form is open there.
    pub fn form(&self, key: &FormKey) -> FormResult<&Form> {
        self.forms
            .get(key)
            .ok_or_else(|| FormError::FormNotRegistered(key.clone()))
    }

    /// Mutable form under `key`
    ///
    /// # Errors
    /// Returns [`FormError::FormNotRegistered`] when no form is open there.
    pub fn form_mut(&mut self, key: &FormKey) -> FormResult<&mut Form> {
        self.forms
            .get_mut(key)
            .ok_or_else(|| FormError::FormNotRegistered(key.clone()))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &FormKey) -> bool {
        self.forms.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FormKey> {
        self.forms.keys()
    }

    /// Drop the form under `key`; `false` when none was open
    pub fn dispose(&mut self, key: &FormKey) -> bool {
        let removed = self.forms.remove(key).is_some();
        if removed {
            tracing::info!(form_key = %key, "form disposed");
        }
        removed
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cx_schema::Schema;
    use serde_json::json;

    fn config(key: &str) -> FormConfig {
        FormConfig::structural(Schema::object([("name", Schema::string())])).with_key(key)
    }

    #[test]
    fn open_is_idempotent_per_key() {
        let mut registry = FormRegistry::new();
        assert!(registry.open(config("a")).unwrap().set_value_at("name", json!("ada")));
        let again = registry.open(config("a")).unwrap();
        assert_eq!(again.value_at("name"), Some(json!("ada")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn keys_are_isolated() {
        let mut registry = FormRegistry::new();
        registry.open(config("a")).unwrap().set_value_at("name", json!("x"));
        registry.open(config("b")).unwrap();
        let b = registry.form(&FormKey::new("b")).unwrap();
        assert_eq!(b.value_at("name"), Some(json!("")));
        assert_eq!(registry.keys().count(), 2);
    }

    #[test]
    fn dispose_removes_form() {
        let mut registry = FormRegistry::new();
        registry.open(config("a")).unwrap();
        assert!(registry.dispose(&FormKey::new("a")));
        assert!(!registry.dispose(&FormKey::new("a")));
        assert!(registry.is_empty());
        assert!(matches!(
            registry.form(&FormKey::new("a")),
            Err(FormError::FormNotRegistered(_))
        ));
    }

    #[test]
    fn unkeyed_configs_open_distinct_forms() {
        let mut registry = FormRegistry::new();
        let schema = Schema::object([("name", Schema::string())]);
        registry.open(FormConfig::structural(schema.clone())).unwrap();
        registry.open(FormConfig::structural(schema)).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn failed_open_registers_nothing() {
        let mut registry = FormRegistry::new();
        let result = registry.open(FormConfig::structural(Schema::string()).with_key("bad"));
        assert!(result.is_err());
        assert!(!registry.contains(&FormKey::new("bad")));
    }
}
