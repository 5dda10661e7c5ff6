//! The form document store
//!
//! A [`Form`] owns one document and everything derived from it. Writes go
//! through the schema capability: a draft is synthesized and repaired, and
//! only a document the capability accepts is committed. A rejected write
//! leaves the previous snapshot in place, so the same `Arc` stays current.
//!
//! Meta entries update eagerly on commit. The summary is derived lazily
//! from the last summarised snapshot when it is read.

use std::fmt;
use std::sync::Arc;

use cx_path::{join_segments, parse_segments, remove_at, resolve, set_at};
use cx_schema::{
    FormKey, InitialStateOptions, SchemaCapability, ValidationError, ValidationOutcome,
};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::binding::{Bindings, ElementId, FieldState, Registration};
use crate::config::FormConfig;
use crate::error::{FormError, FormResult};
use crate::meta::{MetaEntry, MetaTracker, MetaUpdate};
use crate::summary::{FormSummary, SummaryEntry};

/// Payload of a write
///
/// Either a replacement value or a function from the current value to the
/// next one. A path write may call the function once per candidate schema.
pub enum SetValue<'a> {
    Value(Value),
    Update(Box<dyn FnMut(Value) -> Value + 'a>),
}

impl<'a> SetValue<'a> {
    /// Payload computed from the current value
    pub fn update(f: impl FnMut(Value) -> Value + 'a) -> Self {
        Self::Update(Box::new(f))
    }

    fn apply(&mut self, current: Value) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Update(f) => f(current),
        }
    }
}

impl From<Value> for SetValue<'_> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl fmt::Debug for SetValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Update(_) => f.write_str("Update(..)"),
        }
    }
}

/// Result of [`Form::validate`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub success: bool,
    pub errors: Vec<ValidationError>,
    pub form_key: FormKey,
}

/// Value at a path together with its meta entries, shaped alike
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueWithMeta {
    pub value: Option<Value>,
    pub meta: Option<Value>,
}

#[derive(Debug)]
struct SummaryCache {
    summary: FormSummary,
    snapshot: Arc<Value>,
    version: u64,
}

/// One form: its document, meta tracker, summary and bindings
#[derive(Debug)]
pub struct Form {
    key: FormKey,
    schema: Arc<dyn SchemaCapability>,
    document: Arc<Value>,
    version: u64,
    meta: MetaTracker,
    summary: Mutex<SummaryCache>,
    bindings: Bindings,
}

impl Form {
    /// Open a form from configuration
    ///
    /// Synthesizes the initial document with the configured defaults,
    /// constraints and validation mode, then seeds meta and summary from it.
    ///
    /// # Errors
    /// Returns [`FormError::Schema`] when the schema cannot back a form or
    /// yields no valid document, and [`FormError::EmptyDocument`] when the
    /// initial state is absent.
    pub fn from_config(config: FormConfig) -> FormResult<Self> {
        let key = config.options.key.clone().unwrap_or_else(FormKey::generate);
        let schema = config.build_schema(&key)?;

        let mut options =
            InitialStateOptions::new(config.options.use_defaults, config.options.validation_mode);
        options.constraints = config.initial_state;
        let state = schema.initial_state(options)?;
        if !state.success {
            tracing::warn!(
                form_key = %key,
                errors = state.errors.len(),
                "initial constraints were repaired"
            );
        }
        let document = state
            .data
            .ok_or_else(|| FormError::EmptyDocument(key.clone()))?;

        let mut meta = MetaTracker::new(key.clone());
        meta.update(MetaUpdate::new(&document).without_time());

        let document = Arc::new(document);
        let summary = SummaryCache {
            summary: FormSummary::seeded(&document),
            snapshot: Arc::clone(&document),
            version: 0,
        };

        tracing::info!(form_key = %key, "form opened");
        Ok(Self {
            key,
            schema,
            document,
            version: 0,
            meta,
            summary: Mutex::new(summary),
            bindings: Bindings::default(),
        })
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> &FormKey {
        &self.key
    }

    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Arc<dyn SchemaCapability> {
        &self.schema
    }

    /// Number of commits since the form opened
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    #[must_use]
    pub fn meta(&self) -> &MetaTracker {
        &self.meta
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Shared snapshot of the current document
    #[inline]
    #[must_use]
    pub fn value(&self) -> Arc<Value> {
        Arc::clone(&self.document)
    }

    /// Copy of the value at `path`
    #[must_use]
    pub fn value_at(&self, path: &str) -> Option<Value> {
        resolve(&self.document, path).cloned()
    }

    /// Value at `path` (whole document for `None`) with its meta entries
    #[must_use]
    pub fn value_with_meta(&self, path: Option<&str>) -> ValueWithMeta {
        let nested = self.meta.to_nested();
        match path {
            None => ValueWithMeta {
                value: Some((*self.document).clone()),
                meta: Some(nested),
            },
            Some(path) => ValueWithMeta {
                value: self.value_at(path),
                meta: resolve(&nested, path).cloned(),
            },
        }
    }

    /// Typed view of the document
    ///
    /// # Errors
    /// Returns [`FormError::Decode`] when the document does not fit `T`.
    pub fn value_as<T: DeserializeOwned>(&self) -> FormResult<T> {
        T::deserialize(&*self.document).map_err(FormError::Decode)
    }

    /// Summary of every leaf
    #[must_use]
    pub fn summary(&self) -> FormSummary {
        self.with_summary(Clone::clone)
    }

    /// Summary of one leaf
    #[must_use]
    pub fn field_summary(&self, path: &str) -> Option<SummaryEntry> {
        self.with_summary(|summary| summary.get(path).cloned())
    }

    /// Whether any leaf differs from its original value
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.with_summary(FormSummary::is_dirty)
    }

    /// Summary, meta and interaction state of one path
    #[must_use]
    pub fn field_state(&self, path: &str) -> FieldState {
        let summary = self.field_summary(path).unwrap_or_else(|| {
            let current = self.value_at(path).unwrap_or(Value::Null);
            SummaryEntry {
                original_value: current.clone(),
                current_value: current,
                ..SummaryEntry::default()
            }
        });
        FieldState::compose(
            summary,
            self.meta.get_or_blank(path),
            self.bindings.interaction(path),
        )
    }

    fn with_summary<R>(&self, f: impl FnOnce(&FormSummary) -> R) -> R {
        let mut cache = self.summary.lock();
        if cache.version != self.version {
            let previous = Arc::clone(&cache.snapshot);
            cache.summary.transition(Some(previous.as_ref()), &self.document);
            cache.snapshot = Arc::clone(&self.document);
            cache.version = self.version;
        }
        f(&cache.summary)
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// Replace the whole document
    ///
    /// The payload is drafted against the schema in lax mode without
    /// defaults. The write commits only when the draft is valid as given;
    /// otherwise the document is kept and `false` is returned.
    pub fn set_value<'a>(&mut self, payload: impl Into<SetValue<'a>>) -> bool {
        let mut payload = payload.into();
        let raw = payload.apply((*self.document).clone());

        let state = match self
            .schema
            .initial_state(InitialStateOptions::draft(Some(raw.clone())))
        {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(form_key = %self.key, error = %err, "root write rejected");
                return false;
            }
        };
        if !state.success {
            tracing::warn!(
                form_key = %self.key,
                errors = state.errors.len(),
                "root write rejected"
            );
            return false;
        }
        let Some(next) = state.data else {
            tracing::warn!(form_key = %self.key, "root write produced no document");
            return false;
        };

        self.commit(next, &raw, None);
        true
    }

    /// Replace the value at `path`
    ///
    /// Each schema that can govern `path` is tried in declaration order. A
    /// candidate drafts the new value (repairing it if needed), splices it
    /// into a copy of the document, and the copy is drafted against the root
    /// schema. The first candidate whose spliced document the root schema
    /// accepts is committed. If no candidate qualifies the document is
    /// unchanged and `false` is returned.
    pub fn set_value_at<'a>(&mut self, path: &str, payload: impl Into<SetValue<'a>>) -> bool {
        let mut payload = payload.into();
        let candidates = self.schema.schemas_at_path(path);
        if candidates.is_empty() {
            tracing::warn!(form_key = %self.key, path = %path, "no schema governs path");
            return false;
        }

        let existing = self.value_at(path);
        for (index, candidate) in candidates.iter().enumerate() {
            let current = match &existing {
                Some(value) => value.clone(),
                None => match candidate.initial_state(InitialStateOptions::draft(None)) {
                    Ok(state) => state.data.unwrap_or(Value::Null),
                    Err(err) => {
                        tracing::error!(
                            form_key = %self.key,
                            path = %path,
                            error = %err,
                            "candidate schema cannot synthesize a value"
                        );
                        continue;
                    }
                },
            };
            let raw = payload.apply(current);

            if let Some(next) = self.draft_candidate(candidate.as_ref(), path, &raw) {
                tracing::trace!(form_key = %self.key, path = %path, candidate = index, "candidate accepted");
                self.commit(next, &raw, Some(path));
                return true;
            }
        }

        tracing::warn!(form_key = %self.key, path = %path, "path write rejected");
        false
    }

    /// Draft `raw` under one candidate and the root schema
    ///
    /// Returns the next root document when the spliced copy parses against
    /// the root schema as is.
    fn draft_candidate(
        &self,
        candidate: &dyn SchemaCapability,
        path: &str,
        raw: &Value,
    ) -> Option<Value> {
        let nested = match candidate.initial_state(InitialStateOptions::draft(Some(raw.clone()))) {
            Ok(state) => state,
            Err(err) => {
                tracing::debug!(form_key = %self.key, path = %path, error = %err, "candidate rejected value");
                return None;
            }
        };

        let mut spliced = (*self.document).clone();
        let placed = match nested.data {
            Some(data) => set_at(&mut spliced, path, data),
            None => {
                remove_at(&mut spliced, path);
                Ok(())
            }
        };
        if let Err(err) = placed {
            tracing::debug!(form_key = %self.key, path = %path, error = %err, "cannot splice value");
            return None;
        }

        match self
            .schema
            .initial_state(InitialStateOptions::draft(Some(spliced)))
        {
            Ok(root) if root.success => root.data,
            Ok(root) => {
                tracing::debug!(
                    form_key = %self.key,
                    path = %path,
                    errors = root.errors.len(),
                    "spliced document does not parse"
                );
                None
            }
            Err(err) => {
                tracing::error!(form_key = %self.key, path = %path, error = %err, "spliced document cannot be repaired");
                None
            }
        }
    }

    fn commit(&mut self, next: Value, raw: &Value, base: Option<&str>) {
        self.document = Arc::new(next);
        self.version += 1;
        self.meta.update(MetaUpdate::new(raw).at(base));
        let pruned = self.meta.prune(&self.document);
        tracing::debug!(
            form_key = %self.key,
            path = base.unwrap_or(""),
            version = self.version,
            pruned,
            "document committed"
        );
    }

    // ---------------------------------------------------------------------
    // Validation
    // ---------------------------------------------------------------------

    /// Validate the whole document, or the value at `path`
    ///
    /// A path absent from the document yields one "not found" error without
    /// consulting the schema.
    #[must_use]
    pub fn validate(&self, path: Option<&str>) -> ValidationSummary {
        let outcome = match path {
            None => self.schema.validate_at_path(Some(self.document.as_ref()), None),
            Some(path) => match resolve(&self.document, path) {
                Some(value) => self.schema.validate_at_path(Some(value), Some(path)),
                None => {
                    let segments = parse_segments(path);
                    ValidationOutcome::Invalid {
                        errors: vec![ValidationError::new(
                            format!("Path '{}' not found in form", join_segments(&segments)),
                            segments,
                            self.key.clone(),
                        )],
                        data: None,
                    }
                }
            },
        };
        ValidationSummary {
            success: outcome.is_success(),
            errors: outcome.into_errors(),
            form_key: self.key.clone(),
        }
    }

    // ---------------------------------------------------------------------
    // Bindings
    // ---------------------------------------------------------------------

    /// Value an input bound to `path` should display
    ///
    /// The last raw value written there, else the document value.
    #[must_use]
    pub fn register(&self, path: &str) -> Registration {
        Registration {
            path: path.to_owned(),
            value: self.meta.raw_value_at(path).or_else(|| self.value_at(path)),
        }
    }

    /// Bind an element to `path`
    ///
    /// Returns `false` when the element was already bound. The first
    /// binding marks the path connected.
    pub fn register_element(&mut self, path: &str, id: ElementId) -> bool {
        let was_bound = self.bindings.bound_count(path) > 0;
        let added = self.bindings.attach(path, id);
        if added && !was_bound {
            self.set_connected(path, true);
        }
        added
    }

    /// Unbind an element from `path`, returning how many remain bound
    ///
    /// When the last element leaves, the path is marked disconnected; if it
    /// is also gone from the document its meta and interaction state are
    /// dropped.
    pub fn deregister_element(&mut self, path: &str, id: ElementId) -> usize {
        let was_bound = self.bindings.bound_count(path) > 0;
        let remaining = self.bindings.detach(path, id);
        if was_bound && remaining == 0 {
            self.set_connected(path, false);
            if resolve(&self.document, path).is_none() {
                self.meta.forget(path);
                self.bindings.forget(path);
            }
        }
        remaining
    }

    /// Record that an element at `path` gained focus
    ///
    /// Paths without a bound element are ignored.
    pub fn report_focus(&mut self, path: &str) {
        self.bindings.focus(path);
    }

    /// Record that an element at `path` lost focus
    ///
    /// Paths without a bound element are ignored.
    pub fn report_blur(&mut self, path: &str) {
        self.bindings.blur(path);
    }

    fn set_connected(&mut self, path: &str, connected: bool) {
        let raw = self
            .meta
            .raw_value_at(path)
            .or_else(|| self.value_at(path))
            .unwrap_or(Value::Null);
        self.meta.update(
            MetaUpdate::new(&raw)
                .at(Some(path))
                .connected(connected)
                .without_time(),
        );
        tracing::trace!(form_key = %self.key, path = %path, connected, "connection changed");
    }

    /// Meta entry for a leaf path, blank when untracked
    #[must_use]
    pub fn meta_entry(&self, path: &str) -> MetaEntry {
        self.meta.get_or_blank(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cx_schema::{Schema, ValidationMode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn profile() -> Schema {
        Schema::object([
            ("name", Schema::string()),
            ("age", Schema::number().int().min(0)),
            (
                "address",
                Schema::object([("city", Schema::string()), ("zip", Schema::string())]),
            ),
        ])
    }

    fn form(schema: Schema) -> Form {
        Form::from_config(FormConfig::structural(schema).with_key("test")).unwrap()
    }

    #[test]
    fn opens_with_synthesized_document() {
        let form = form(profile());
        assert_eq!(
            *form.value(),
            json!({"name": "", "age": 0, "address": {"city": "", "zip": ""}})
        );
        assert_eq!(form.version(), 0);
        assert_eq!(form.meta().get("address.city").unwrap().updated_at, None);
    }

    #[test]
    fn opens_with_initial_constraints() {
        let config = FormConfig::structural(profile())
            .with_key("test")
            .with_initial_state(json!({"name": "ada"}));
        let form = Form::from_config(config).unwrap();
        assert_eq!(form.value_at("name"), Some(json!("ada")));
        assert_eq!(form.value_at("address.zip"), Some(json!("")));
    }

    #[test]
    fn generates_key_when_absent() {
        let form = Form::from_config(FormConfig::structural(profile())).unwrap();
        assert!(!form.key().as_str().is_empty());
    }

    #[test]
    fn root_write_commits_valid_value() {
        let mut form = form(profile());
        let next = json!({"name": "ada", "age": 36, "address": {"city": "London", "zip": "N1"}});
        assert!(form.set_value(next.clone()));
        assert_eq!(*form.value(), next);
        assert_eq!(form.version(), 1);
        assert!(form.meta().get("address.city").unwrap().updated_at.is_some());
    }

    #[test]
    fn root_write_rejects_wrong_types() {
        let mut form = form(profile());
        let before = form.value();
        assert!(!form.set_value(json!({"name": 7})));
        assert!(Arc::ptr_eq(&before, &form.value()));
        assert_eq!(form.version(), 0);
    }

    #[test]
    fn root_update_function_sees_current_document() {
        let mut form = form(profile());
        let ok = form.set_value(SetValue::update(|mut doc| {
            doc["name"] = json!("grace");
            doc
        }));
        assert!(ok);
        assert_eq!(form.value_at("name"), Some(json!("grace")));
    }

    #[test]
    fn path_write_updates_leaf_and_summary() {
        let mut form = form(profile());
        assert!(form.set_value_at("address.city", json!("Paris")));
        assert_eq!(form.value_at("address.city"), Some(json!("Paris")));

        let entry = form.field_summary("address.city").unwrap();
        assert!(entry.dirty);
        assert_eq!(entry.original_value, json!(""));
        assert_eq!(entry.current_value, json!("Paris"));
        assert!(form.is_dirty());
    }

    #[test]
    fn path_write_repairs_bad_scalar() {
        let mut form = form(profile());
        assert!(form.set_value_at("age", json!("old")));
        assert_eq!(form.value_at("age"), Some(json!(0)));
        assert_eq!(form.meta().get("age").unwrap().raw_value, json!("old"));
    }

    #[test]
    fn path_write_to_unknown_path_fails() {
        let mut form = form(profile());
        let before = form.value();
        assert!(!form.set_value_at("nope", json!(1)));
        assert!(Arc::ptr_eq(&before, &form.value()));
    }

    #[test]
    fn padded_path_segments_address_nothing() {
        let mut form = form(profile());
        let before = form.value();
        assert!(!form.set_value_at("address. city", json!("Paris")));
        assert!(Arc::ptr_eq(&before, &form.value()));
        assert_eq!(form.version(), 0);
        assert!(form.meta().get("address. city").is_none());
    }

    #[test]
    fn array_index_far_past_the_end_is_rejected() {
        let schema = Schema::object([("tags", Schema::array(Schema::string()))]);
        let mut form = form(schema);
        let before = form.value();

        let far = format!("tags.{}", usize::MAX);
        assert!(!form.set_value_at(far.as_str(), json!("x")));
        assert!(!form.set_value_at("tags.3", json!("x")));
        assert!(Arc::ptr_eq(&before, &form.value()));
        assert_eq!(form.version(), 0);

        assert!(form.set_value_at("tags.0", json!("x")));
        assert_eq!(form.value_at("tags"), Some(json!(["x"])));
    }

    #[test]
    fn first_declared_union_option_wins() {
        let schema = Schema::object([(
            "value",
            Schema::union(vec![
                Schema::object([("a", Schema::string())]),
                Schema::object([("a", Schema::number())]),
            ]),
        )]);
        let mut form = form(schema);
        assert_eq!(*form.value(), json!({"value": {"a": ""}}));

        assert!(form.set_value_at("value.a", json!(5)));
        assert_eq!(*form.value(), json!({"value": {"a": ""}}));
        assert_eq!(form.meta_entry("value.a").raw_value, json!(5));
    }

    #[test]
    fn path_update_function_receives_current_value() {
        let mut form = form(profile());
        form.set_value_at("age", json!(40));
        assert!(form.set_value_at(
            "age",
            SetValue::update(|age| json!(age.as_i64().unwrap_or(0) + 1))
        ));
        assert_eq!(form.value_at("age"), Some(json!(41)));
    }

    #[test]
    fn summary_coalesces_writes_between_reads() {
        let mut form = form(profile());
        form.set_value_at("name", json!("a"));
        form.set_value_at("name", json!("b"));
        let entry = form.field_summary("name").unwrap();
        assert_eq!(entry.previous_value, Some(json!("")));
        assert_eq!(entry.current_value, json!("b"));
    }

    #[test]
    fn validate_reports_missing_path() {
        let form = form(profile());
        let summary = form.validate(Some("address.country"));
        assert!(!summary.success);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].path_string(), "address.country");
        assert_eq!(summary.form_key, FormKey::new("test"));
    }

    #[test]
    fn validate_applies_checks() {
        let config = FormConfig::structural(Schema::object([(
            "email",
            Schema::string().email(),
        )]))
        .with_key("test")
        .with_validation_mode(ValidationMode::Lax);
        let mut form = Form::from_config(config).unwrap();

        assert!(!form.validate(None).success);
        assert!(!form.validate(Some("email")).success);
        form.set_value_at("email", json!("ada@example.com"));
        assert!(form.validate(None).success);
        assert!(form.validate(Some("email")).success);
    }

    #[test]
    fn registration_prefers_raw_value() {
        let mut form = form(profile());
        assert_eq!(form.register("age").value, Some(json!(0)));
        form.set_value_at("age", json!("x"));
        assert_eq!(form.register("age").value, Some(json!("x")));
    }

    #[test]
    fn element_binding_tracks_connection() {
        let mut form = form(profile());
        assert!(form.register_element("name", ElementId(1)));
        assert!(!form.register_element("name", ElementId(1)));
        assert!(form.register_element("name", ElementId(2)));
        assert!(form.meta_entry("name").is_connected);

        assert_eq!(form.deregister_element("name", ElementId(1)), 1);
        assert!(form.meta_entry("name").is_connected);
        assert_eq!(form.deregister_element("name", ElementId(2)), 0);
        assert!(!form.meta_entry("name").is_connected);
        assert!(form.meta().get("name").is_some());
    }

    #[test]
    fn connection_does_not_advance_time() {
        let mut form = form(profile());
        form.register_element("name", ElementId(1));
        assert_eq!(form.meta_entry("name").updated_at, None);
    }

    #[test]
    fn field_state_reflects_interaction() {
        let mut form = form(profile());
        assert_eq!(form.field_state("name").touched, None);

        form.register_element("name", ElementId(1));
        form.report_focus("name");
        let state = form.field_state("name");
        assert_eq!(state.focused, Some(true));
        assert_eq!(state.touched, Some(false));

        form.report_blur("name");
        form.set_value_at("name", json!("ada"));
        let state = form.field_state("name");
        assert_eq!(state.touched, Some(true));
        assert!(state.dirty);
        assert_eq!(state.meta.raw_value, json!("ada"));
    }

    #[test]
    fn interaction_on_unbound_paths_is_ignored() {
        let mut form = form(profile());
        form.report_focus("name");
        form.report_blur("name");
        form.report_blur("no.such.path");

        form.register_element("name", ElementId(1));
        let state = form.field_state("name");
        assert_eq!(state.touched, Some(false));
        assert_eq!(state.focused, Some(false));
    }

    #[test]
    fn typed_view_of_document() {
        #[derive(serde::Deserialize)]
        struct Address {
            city: String,
        }
        #[derive(serde::Deserialize)]
        struct Profile {
            name: String,
            address: Address,
        }

        let mut form = form(profile());
        form.set_value_at("address.city", json!("Rome"));
        let profile: Profile = form.value_as().unwrap();
        assert_eq!(profile.name, "");
        assert_eq!(profile.address.city, "Rome");
    }

    #[test]
    fn value_with_meta_pairs_shapes() {
        let mut form = form(profile());
        form.set_value_at("address.city", json!("Oslo"));
        let view = form.value_with_meta(Some("address"));
        assert_eq!(view.value, Some(json!({"city": "Oslo", "zip": ""})));
        let meta = view.meta.unwrap();
        assert_eq!(meta["city"]["rawValue"], json!("Oslo"));
    }
}
