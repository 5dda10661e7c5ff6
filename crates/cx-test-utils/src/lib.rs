//! Testing utilities for Chemical-X workspace
//!
//! Shared schema fixtures and form setup.

#![allow(missing_docs)]

use cx_form::{Form, FormConfig};
use cx_schema::{ObjectSchema, Schema};
use serde_json::json;

/// Install a test subscriber honoring `RUST_LOG`; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Person profile with a nested address and a tag list
pub fn profile_schema() -> Schema {
    Schema::object([
        ("name", Schema::string().min(1)),
        ("age", Schema::number().int().min(0)),
        ("email", Schema::string().email()),
        (
            "address",
            Schema::object([("city", Schema::string()), ("zip", Schema::string())]),
        ),
        ("tags", Schema::array(Schema::string())),
        ("newsletter", Schema::boolean().default_value(json!(true))),
    ])
}

/// `admin` / `guest` branches discriminated on `role`
pub fn account_union() -> Schema {
    Schema::discriminated_union(
        "role",
        [
            ObjectSchema::new([
                ("role", Schema::literal("admin")),
                ("limit", Schema::number()),
            ]),
            ObjectSchema::new([
                ("role", Schema::literal("guest")),
                ("limit", Schema::number()),
                ("expires", Schema::string()),
            ]),
        ],
    )
}

/// Object holding [`account_union`] under `account`
pub fn account_schema() -> Schema {
    Schema::object([("owner", Schema::string()), ("account", account_union())])
}

/// Object rejecting undeclared keys
pub fn strict_schema() -> Schema {
    Schema::object([("title", Schema::string()), ("count", Schema::number())]).strict()
}

/// `{a: {b: number}}`
pub fn nested_schema() -> Schema {
    Schema::object([("a", Schema::object([("b", Schema::number())]))])
}

/// Open a form over `schema` under `key`
pub fn open_form(schema: Schema, key: &str) -> Form {
    Form::from_config(FormConfig::structural(schema).with_key(key)).unwrap()
}

/// Open a form over `schema` seeded with `initial`
pub fn open_form_with(schema: Schema, key: &str, initial: serde_json::Value) -> Form {
    let config = FormConfig::structural(schema)
        .with_key(key)
        .with_initial_state(initial);
    Form::from_config(config).unwrap()
}
