//! Wrapper stripping
//!
//! [`unwrap`] peels wrappers off the outside of a node; [`slim`] rebuilds a
//! whole tree with the configured wrappers and checks removed at every
//! depth. Each wrapper category is governed by a [`StripRule`].

use std::fmt;
use std::sync::Arc;

use crate::node::{ArraySchema, DiscriminatedUnion, ObjectSchema, Schema};

/// Whether a wrapper category is removed
#[derive(Clone, Default)]
pub enum StripRule {
    /// Keep the wrapper
    #[default]
    Never,
    /// Remove the wrapper
    Always,
    /// Remove the wrapper when the predicate holds for that node
    When(Arc<dyn Fn(&Schema) -> bool + Send + Sync>),
}

impl StripRule {
    /// Predicate-based rule
    pub fn when(predicate: impl Fn(&Schema) -> bool + Send + Sync + 'static) -> Self {
        Self::When(Arc::new(predicate))
    }

    /// Evaluate against a node
    #[inline]
    #[must_use]
    pub fn applies(&self, schema: &Schema) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::When(predicate) => predicate(schema),
        }
    }
}

impl From<bool> for StripRule {
    fn from(strip: bool) -> Self {
        if strip {
            Self::Always
        } else {
            Self::Never
        }
    }
}

impl fmt::Debug for StripRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Never => f.write_str("Never"),
            Self::Always => f.write_str("Always"),
            Self::When(_) => f.write_str("When(..)"),
        }
    }
}

/// Which wrapper categories to strip
#[derive(Debug, Clone, Default)]
pub struct StripConfig {
    pub nullable: StripRule,
    pub optional: StripRule,
    pub default_values: StripRule,
    pub effects: StripRule,
    pub refinements: StripRule,
}

impl StripConfig {
    /// Strip nothing
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Strip every category
    #[must_use]
    pub fn all() -> Self {
        Self {
            nullable: StripRule::Always,
            optional: StripRule::Always,
            default_values: StripRule::Always,
            effects: StripRule::Always,
            refinements: StripRule::Always,
        }
    }

    /// Set the nullable rule
    #[must_use]
    pub fn nullable(mut self, rule: impl Into<StripRule>) -> Self {
        self.nullable = rule.into();
        self
    }

    /// Set the optional rule
    #[must_use]
    pub fn optional(mut self, rule: impl Into<StripRule>) -> Self {
        self.optional = rule.into();
        self
    }

    /// Set the default-value rule
    #[must_use]
    pub fn default_values(mut self, rule: impl Into<StripRule>) -> Self {
        self.default_values = rule.into();
        self
    }

    /// Set the effect rule
    #[must_use]
    pub fn effects(mut self, rule: impl Into<StripRule>) -> Self {
        self.effects = rule.into();
        self
    }

    /// Set the refinement rule
    #[must_use]
    pub fn refinements(mut self, rule: impl Into<StripRule>) -> Self {
        self.refinements = rule.into();
        self
    }

    fn strips_wrapper(&self, schema: &Schema) -> bool {
        match schema {
            Schema::Nullable(_) => self.nullable.applies(schema),
            Schema::Optional(_) => self.optional.applies(schema),
            Schema::Default { .. } => self.default_values.applies(schema),
            Schema::Effect { .. } => self.effects.applies(schema),
            Schema::Refinement { .. } => self.refinements.applies(schema),
            _ => false,
        }
    }
}

/// Peel configured wrappers from the outside in
///
/// Stops at the first wrapper that is kept or at a type node. When
/// refinements are stripped, built-in checks of the reached node are
/// dropped as well. The flag reports whether anything was removed.
#[must_use]
pub fn unwrap(schema: &Schema, config: &StripConfig) -> (Schema, bool) {
    let mut current = schema;
    let mut stripped = false;
    while config.strips_wrapper(current) {
        match current.wrapped() {
            Some(inner) => {
                current = inner;
                stripped = true;
            }
            None => break,
        }
    }
    if current.has_checks() && config.refinements.applies(current) {
        return (current.without_checks(), true);
    }
    (current.clone(), stripped)
}

/// Rebuild `schema` with configured wrappers removed at every depth
///
/// Object unknown-key policies are preserved.
#[must_use]
pub fn slim(schema: &Schema, config: &StripConfig) -> Schema {
    if config.strips_wrapper(schema) {
        if let Some(inner) = schema.wrapped() {
            return slim(inner, config);
        }
    }

    match schema {
        Schema::Object(object) => Schema::Object(slim_object(object, config)),
        Schema::Array(array) => Schema::Array(ArraySchema {
            element: Box::new(slim(&array.element, config)),
            checks: if config.refinements.applies(schema) {
                Vec::new()
            } else {
                array.checks.clone()
            },
        }),
        Schema::Record(value) => Schema::Record(Box::new(slim(value, config))),
        Schema::Tuple(items) => Schema::Tuple(items.iter().map(|s| slim(s, config)).collect()),
        Schema::Union(options) => {
            Schema::Union(options.iter().map(|s| slim(s, config)).collect())
        }
        Schema::DiscriminatedUnion(union) => Schema::DiscriminatedUnion(DiscriminatedUnion {
            discriminator: union.discriminator.clone(),
            options: union
                .options
                .iter()
                .map(|o| slim_object(o, config))
                .collect(),
        }),
        Schema::Optional(inner) => Schema::Optional(Box::new(slim(inner, config))),
        Schema::Nullable(inner) => Schema::Nullable(Box::new(slim(inner, config))),
        Schema::Default { inner, value } => Schema::Default {
            inner: Box::new(slim(inner, config)),
            value: value.clone(),
        },
        Schema::Effect { inner, effect } => Schema::Effect {
            inner: Box::new(slim(inner, config)),
            effect: effect.clone(),
        },
        Schema::Refinement { inner, refinement } => Schema::Refinement {
            inner: Box::new(slim(inner, config)),
            refinement: refinement.clone(),
        },
        Schema::String(_) | Schema::Number(_) if config.refinements.applies(schema) => {
            schema.without_checks()
        }
        other => other.clone(),
    }
}

fn slim_object(object: &ObjectSchema, config: &StripConfig) -> ObjectSchema {
    ObjectSchema {
        shape: object
            .shape
            .iter()
            .map(|(key, field)| (key.clone(), slim(field, config)))
            .collect(),
        unknown_keys: object.unknown_keys,
    }
}
