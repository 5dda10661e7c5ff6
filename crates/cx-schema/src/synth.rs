//! Default value synthesis

use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaResult};
use crate::issue::ParsedType;
use crate::node::{DiscriminatedUnion, ObjectSchema, Schema};

/// Synthesize a type-appropriate value for `schema`
///
/// With `use_defaults`, a declared default found through nullable, optional,
/// effect and refinement wrappers takes precedence. Otherwise nullable
/// yields `null`, optional yields absence (`None`) and type nodes yield
/// their zero value. Object fields that synthesize to absence are omitted.
///
/// # Errors
/// Returns [`SchemaError`] for unions, discriminated unions or enums
/// without options.
pub fn generate_value(schema: &Schema, use_defaults: bool) -> SchemaResult<Option<Value>> {
    if use_defaults {
        if let Some(default) = unwrap_default(schema) {
            return Ok(Some(default.clone()));
        }
    }

    let value = match schema {
        Schema::String(_) => Value::String(String::new()),
        Schema::Number(_) => Value::from(0),
        Schema::Boolean => Value::Bool(false),
        Schema::Null | Schema::Nullable(_) => Value::Null,
        Schema::Literal(value) => value.clone(),
        Schema::Enum(options) => options
            .first()
            .map(|o| Value::String(o.clone()))
            .ok_or(SchemaError::EmptyEnum)?,
        Schema::Object(object) => generate_object(object, use_defaults)?,
        Schema::Array(_) => Value::Array(Vec::new()),
        Schema::Record(_) => Value::Object(Map::new()),
        Schema::Tuple(items) => Value::Array(
            items
                .iter()
                .map(|item| Ok(generate_value(item, use_defaults)?.unwrap_or(Value::Null)))
                .collect::<SchemaResult<Vec<_>>>()?,
        ),
        Schema::Union(options) => {
            let first = options.first().ok_or(SchemaError::EmptyUnion)?;
            return generate_value(first, use_defaults);
        }
        Schema::DiscriminatedUnion(union) => {
            generate_object(first_branch(union)?, use_defaults)?
        }
        Schema::Optional(_) => return Ok(None),
        Schema::Default { inner, .. }
        | Schema::Effect { inner, .. }
        | Schema::Refinement { inner, .. } => return generate_value(inner, use_defaults),
    };
    Ok(Some(value))
}

fn generate_object(object: &ObjectSchema, use_defaults: bool) -> SchemaResult<Value> {
    let mut map = Map::new();
    for (key, field) in &object.shape {
        if let Some(value) = generate_value(field, use_defaults)? {
            map.insert(key.clone(), value);
        }
    }
    Ok(Value::Object(map))
}

/// First declared branch of a discriminated union
///
/// # Errors
/// Returns [`SchemaError::EmptyDiscriminatedUnion`] when there are no branches.
pub fn first_branch(union: &DiscriminatedUnion) -> SchemaResult<&ObjectSchema> {
    union
        .options
        .first()
        .ok_or_else(|| SchemaError::EmptyDiscriminatedUnion {
            discriminator: union.discriminator.clone(),
        })
}

/// Declared default reachable through nullable, optional, effect and
/// refinement wrappers
#[must_use]
pub fn unwrap_default(schema: &Schema) -> Option<&Value> {
    match schema {
        Schema::Default { value, .. } => Some(value),
        Schema::Nullable(inner)
        | Schema::Optional(inner)
        | Schema::Effect { inner, .. }
        | Schema::Refinement { inner, .. } => unwrap_default(inner),
        _ => None,
    }
}

/// Zero value for a runtime type, when one exists
#[must_use]
pub fn zero_value(expected: ParsedType) -> Option<Value> {
    match expected {
        ParsedType::String => Some(Value::String(String::new())),
        ParsedType::Number | ParsedType::Integer | ParsedType::Float => Some(Value::from(0)),
        ParsedType::Boolean => Some(Value::Bool(false)),
        ParsedType::Null => Some(Value::Null),
        ParsedType::Object => Some(Value::Object(Map::new())),
        ParsedType::Array => Some(Value::Array(Vec::new())),
        ParsedType::Undefined => None,
    }
}
