//! End-to-end behaviour of a form over structural schemas.
//!
//! Guarantees exercised here:
//! - Initial state is synthesized from the schema and is always usable.
//! - Path writes update the document, meta and summary together.
//! - Rejected writes leave the exact same snapshot in place.
//! - Writes crossing a union go to the first declared option that accepts them.
//! - Undeclared keys in initial state are dropped rather than failing the form.

use std::sync::Arc;

use cx_form::{ElementId, FormConfig, FormOptions, FormRegistry, SetValue, ValidationMode};
use cx_schema::{FormKey, InitialStateOptions, SchemaCapability, StructuralAdapter};
use cx_test_utils::{
    account_schema, account_union, init_tracing, nested_schema, open_form, open_form_with,
    profile_schema, strict_schema,
};
use pretty_assertions::assert_eq;
use serde_json::json;

/// A union resolved with empty constraints falls back to its first branch.
#[test]
fn union_with_empty_constraints_takes_first_branch() {
    let adapter = StructuralAdapter::nested(account_union(), FormKey::new("union"));
    let state = adapter
        .initial_state(InitialStateOptions::draft(Some(json!({}))))
        .unwrap();
    assert!(state.success);
    assert_eq!(state.data, Some(json!({"role": "admin", "limit": 0})));
}

/// A leaf write marks the leaf dirty against its original value.
#[test]
fn nested_write_is_summarised() {
    init_tracing();
    let mut form = open_form_with(nested_schema(), "nested", json!({"a": {"b": 1}}));

    assert!(form.set_value_at("a.b", json!(2)));
    assert_eq!(form.value_at("a.b"), Some(json!(2)));

    let entry = form.field_summary("a.b").unwrap();
    assert!(entry.dirty);
    assert!(!entry.pristine);
    assert_eq!(entry.original_value, json!(1));
    assert_eq!(entry.previous_value, Some(json!(1)));
    assert_eq!(entry.current_value, json!(2));
}

/// Undeclared keys against a strict object are rejected without a commit.
#[test]
fn strict_root_write_is_rejected() {
    let mut form = open_form(strict_schema(), "strict");
    let before = form.value();

    assert!(!form.set_value(json!({"anything": "invalid-shape"})));
    assert!(Arc::ptr_eq(&before, &form.value()));
    assert_eq!(*form.value(), json!({"title": "", "count": 0}));
    assert!(!form.is_dirty());
}

/// Writing the same raw value twice keeps the first timestamp.
#[test]
fn identical_writes_keep_meta_timestamp() {
    let mut form = open_form(nested_schema(), "meta");
    assert!(form.set_value_at("a.b", json!(5)));
    let first = form.meta_entry("a.b").updated_at;
    assert!(first.is_some());

    assert!(form.set_value_at("a.b", json!(5)));
    assert_eq!(form.meta_entry("a.b").updated_at, first);
    assert_eq!(form.version(), 2);
}

/// Opening with keys a strict object does not declare drops them.
#[test]
fn strict_initial_state_drops_undeclared_keys() {
    let initial = json!({"title": "hi", "extra": 1});
    let mut form = open_form_with(strict_schema(), "strict-open", initial.clone());
    assert_eq!(*form.value(), json!({"title": "hi", "count": 0}));

    let before = form.value();
    assert!(!form.set_value(initial));
    assert!(Arc::ptr_eq(&before, &form.value()));
}

/// A tag write is drafted by the first branch declaring the tag.
#[test]
fn tag_write_is_drafted_by_the_first_branch() {
    let mut form = open_form(account_schema(), "account");
    assert_eq!(
        *form.value(),
        json!({"owner": "", "account": {"role": "admin", "limit": 0}})
    );

    assert!(form.set_value_at("account.role", json!("guest")));
    assert_eq!(
        form.value_at("account"),
        Some(json!({"role": "admin", "limit": 0}))
    );
    assert_eq!(form.meta_entry("account.role").raw_value, json!("guest"));
}

#[test]
fn writing_a_whole_branch_object() {
    let mut form = open_form(account_schema(), "account");
    assert!(form.set_value_at(
        "account",
        json!({"role": "guest", "limit": 3, "expires": "2030-01-01"})
    ));
    assert_eq!(form.value_at("account.expires"), Some(json!("2030-01-01")));
    assert!(form.validate(Some("account")).success);

    assert!(form.set_value_at("account.role", json!("admin")));
    assert_eq!(form.value_at("account.role"), Some(json!("admin")));
}

#[test]
fn raw_input_survives_repair() {
    let mut form = open_form(profile_schema(), "profile");
    assert!(form.set_value_at("age", json!("thirty")));
    assert_eq!(form.value_at("age"), Some(json!(0)));
    assert_eq!(form.register("age").value, Some(json!("thirty")));
}

#[test]
fn defaults_follow_options() {
    let with = open_form(profile_schema(), "with");
    assert_eq!(with.value_at("newsletter"), Some(json!(true)));

    let options = FormOptions::from_json(r#"{"key": "without", "useDefaults": false}"#).unwrap();
    let without =
        cx_form::Form::from_config(FormConfig::structural(profile_schema()).with_options(options))
            .unwrap();
    assert_eq!(without.value_at("newsletter"), Some(json!(false)));
}

#[test]
fn strict_mode_applies_checks_while_opening() {
    let config = FormConfig::structural(profile_schema())
        .with_key("strict-mode")
        .with_validation_mode(ValidationMode::Strict);
    // an empty name cannot satisfy `min(1)` and no default supplies one
    assert!(cx_form::Form::from_config(config).is_err());
}

#[test]
fn array_items_are_addressable() {
    let mut form = open_form(profile_schema(), "tags");
    assert!(form.set_value_at("tags.0", json!("rust")));
    assert!(form.set_value_at("tags.1", json!("forms")));
    assert_eq!(form.value_at("tags"), Some(json!(["rust", "forms"])));
    assert_eq!(form.field_summary("tags.1").unwrap().original_value, json!("forms"));
}

#[test]
fn removed_leaves_lose_summary_and_meta() {
    let mut form = open_form(profile_schema(), "shrink");
    form.set_value_at("tags", json!(["a", "b"]));
    assert!(form.field_summary("tags.1").is_some());

    assert!(form.set_value_at("tags", json!(["a"])));
    assert!(form.field_summary("tags.1").is_none());
    assert!(form.meta().get("tags.1").is_none());
}

#[test]
fn connected_paths_keep_meta_after_removal() {
    let mut form = open_form(profile_schema(), "bound");
    form.set_value_at("tags", json!(["a", "b"]));
    form.register_element("tags.1", ElementId(7));

    form.set_value_at("tags", json!(["a"]));
    assert!(form.meta().get("tags.1").is_some());

    assert_eq!(form.deregister_element("tags.1", ElementId(7)), 0);
    assert!(form.meta().get("tags.1").is_none());
    assert_eq!(form.field_state("tags.1").touched, None);
}

#[test]
fn root_update_function_is_drafted() {
    let mut form = open_form(nested_schema(), "fn");
    let ok = form.set_value(SetValue::update(|mut doc| {
        doc["a"]["b"] = json!(9);
        doc
    }));
    assert!(ok);
    assert_eq!(form.value_at("a.b"), Some(json!(9)));
}

#[test]
fn registry_hands_out_the_same_form() {
    let mut registry = FormRegistry::new();
    let config = FormConfig::structural(nested_schema()).with_key("shared");
    registry.open(config.clone()).unwrap().set_value_at("a.b", json!(4));

    let form = registry.open(config).unwrap();
    assert_eq!(form.value_at("a.b"), Some(json!(4)));
    assert!(registry.dispose(&FormKey::new("shared")));
}
