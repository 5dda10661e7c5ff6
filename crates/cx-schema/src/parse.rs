//! Structural parser
//!
//! Walks a [`Schema`] and an input value together, producing the parsed
//! output (after defaults, effects and key stripping) or the full list of
//! [`Issue`]s. Absence of a value is modelled as `None`.

use cx_path::PathSegment;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::issue::{Issue, IssueKind, ParsedType, SizeOrigin, StringFormat};
use crate::node::{
    ArrayCheck, ArraySchema, DiscriminatedUnion, EffectKind, NumberCheck, NumberSchema,
    ObjectSchema, Schema, StringCheck, StringSchema, UnknownKeys,
};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+'-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("valid email regex")
});

/// Outcome of parsing: output value (if any) or the issues found
pub type ParseResult = Result<Option<Value>, Vec<Issue>>;

/// Parse `input` against `schema`
///
/// # Errors
/// Returns every issue found; parsing does not stop at the first failure.
pub fn safe_parse(schema: &Schema, input: Option<&Value>) -> ParseResult {
    let mut ctx = ParseContext::default();
    let output = ctx.parse(schema, input);
    if ctx.issues.is_empty() {
        Ok(output)
    } else {
        Err(ctx.issues)
    }
}

/// Whether `input` parses cleanly
#[inline]
#[must_use]
pub fn is_valid(schema: &Schema, input: Option<&Value>) -> bool {
    safe_parse(schema, input).is_ok()
}

#[derive(Debug, Default)]
struct ParseContext {
    path: Vec<PathSegment>,
    issues: Vec<Issue>,
}

impl ParseContext {
    fn fork(&self) -> Self {
        Self {
            path: self.path.clone(),
            issues: Vec::new(),
        }
    }

    fn report(&mut self, kind: IssueKind) {
        self.issues.push(Issue::new(kind, self.path.clone()));
    }

    fn invalid_type(&mut self, expected: ParsedType, input: Option<&Value>) {
        self.report(IssueKind::InvalidType {
            expected,
            received: ParsedType::of(input),
        });
    }

    fn nested<T>(&mut self, segment: PathSegment, f: impl FnOnce(&mut Self) -> T) -> T {
        self.path.push(segment);
        let out = f(self);
        self.path.pop();
        out
    }

    fn parse(&mut self, schema: &Schema, input: Option<&Value>) -> Option<Value> {
        match schema {
            Schema::String(s) => self.parse_string(s, input),
            Schema::Number(n) => self.parse_number(n, input),
            Schema::Boolean => match input {
                Some(value @ Value::Bool(_)) => Some(value.clone()),
                other => {
                    self.invalid_type(ParsedType::Boolean, other);
                    None
                }
            },
            Schema::Null => match input {
                Some(Value::Null) => Some(Value::Null),
                other => {
                    self.invalid_type(ParsedType::Null, other);
                    None
                }
            },
            Schema::Literal(expected) => {
                if input == Some(expected) {
                    Some(expected.clone())
                } else {
                    self.report(IssueKind::InvalidLiteral {
                        expected: expected.clone(),
                    });
                    None
                }
            }
            Schema::Enum(options) => match input {
                Some(Value::String(s)) if options.iter().any(|o| o == s) => {
                    Some(Value::String(s.clone()))
                }
                Some(value @ Value::String(_)) => {
                    self.report(IssueKind::InvalidEnumValue {
                        options: options.clone(),
                        received: value.clone(),
                    });
                    None
                }
                other => {
                    self.invalid_type(ParsedType::String, other);
                    None
                }
            },
            Schema::Object(object) => self.parse_object(object, input),
            Schema::Array(array) => self.parse_array(array, input),
            Schema::Record(value_schema) => match input {
                Some(Value::Object(map)) => {
                    let mut out = Map::new();
                    for (key, value) in map {
                        let parsed = self.nested(PathSegment::Key(key.clone()), |ctx| {
                            ctx.parse(value_schema, Some(value))
                        });
                        if let Some(parsed) = parsed {
                            out.insert(key.clone(), parsed);
                        }
                    }
                    Some(Value::Object(out))
                }
                other => {
                    self.invalid_type(ParsedType::Object, other);
                    None
                }
            },
            Schema::Tuple(items) => self.parse_tuple(items, input),
            Schema::Union(options) => self.parse_union(options, input),
            Schema::DiscriminatedUnion(union) => self.parse_discriminated(union, input),
            Schema::Optional(inner) => match input {
                None => None,
                Some(_) => self.parse(inner, input),
            },
            Schema::Nullable(inner) => match input {
                Some(Value::Null) => Some(Value::Null),
                _ => self.parse(inner, input),
            },
            Schema::Default { inner, value } => match input {
                None => self.parse(inner, Some(value)),
                Some(_) => self.parse(inner, input),
            },
            Schema::Effect { inner, effect } => match effect.kind {
                EffectKind::Preprocess => {
                    let prepared = input.map(|v| effect.apply(v.clone()));
                    self.parse(inner, prepared.as_ref())
                }
                EffectKind::Transform => {
                    let before = self.issues.len();
                    let out = self.parse(inner, input);
                    if self.issues.len() == before {
                        out.map(|v| effect.apply(v))
                    } else {
                        out
                    }
                }
            },
            Schema::Refinement { inner, refinement } => {
                let before = self.issues.len();
                let out = self.parse(inner, input);
                if self.issues.len() == before
                    && !refinement.check(out.as_ref().unwrap_or(&Value::Null))
                {
                    self.report(IssueKind::Custom {
                        message: refinement.message.clone(),
                    });
                }
                out
            }
        }
    }

    fn parse_string(&mut self, schema: &StringSchema, input: Option<&Value>) -> Option<Value> {
        let Some(Value::String(text)) = input else {
            self.invalid_type(ParsedType::String, input);
            return None;
        };
        let length = text.chars().count();
        for check in &schema.checks {
            match check {
                StringCheck::MinLength(min) if length < *min => self.report(IssueKind::TooSmall {
                    minimum: as_bound(*min),
                    inclusive: true,
                    origin: SizeOrigin::String,
                }),
                StringCheck::MaxLength(max) if length > *max => self.report(IssueKind::TooBig {
                    maximum: as_bound(*max),
                    inclusive: true,
                    origin: SizeOrigin::String,
                }),
                StringCheck::Pattern(pattern) if !pattern.is_match(text) => {
                    self.report(IssueKind::InvalidString {
                        format: StringFormat::Regex,
                    });
                }
                StringCheck::Email if !EMAIL.is_match(text) => {
                    self.report(IssueKind::InvalidString {
                        format: StringFormat::Email,
                    });
                }
                _ => {}
            }
        }
        Some(Value::String(text.clone()))
    }

    fn parse_number(&mut self, schema: &NumberSchema, input: Option<&Value>) -> Option<Value> {
        let Some(Value::Number(number)) = input else {
            self.invalid_type(ParsedType::Number, input);
            return None;
        };
        let value = number.as_f64().unwrap_or(f64::NAN);
        for check in &schema.checks {
            match check {
                NumberCheck::Integer if value.fract() != 0.0 => {
                    self.report(IssueKind::InvalidType {
                        expected: ParsedType::Integer,
                        received: ParsedType::Float,
                    });
                }
                NumberCheck::Min {
                    value: min,
                    inclusive,
                } if value < *min || (!inclusive && value <= *min) => {
                    self.report(IssueKind::TooSmall {
                        minimum: *min,
                        inclusive: *inclusive,
                        origin: SizeOrigin::Number,
                    });
                }
                NumberCheck::Max {
                    value: max,
                    inclusive,
                } if value > *max || (!inclusive && value >= *max) => {
                    self.report(IssueKind::TooBig {
                        maximum: *max,
                        inclusive: *inclusive,
                        origin: SizeOrigin::Number,
                    });
                }
                _ => {}
            }
        }
        Some(Value::Number(number.clone()))
    }

    fn parse_object(&mut self, schema: &ObjectSchema, input: Option<&Value>) -> Option<Value> {
        let Some(Value::Object(map)) = input else {
            self.invalid_type(ParsedType::Object, input);
            return None;
        };

        let mut out = Map::new();
        for (key, field) in &schema.shape {
            let parsed = self.nested(PathSegment::Key(key.clone()), |ctx| {
                ctx.parse(field, map.get(key))
            });
            if let Some(parsed) = parsed {
                out.insert(key.clone(), parsed);
            }
        }

        let unknown = map.keys().filter(|k| !schema.shape.contains_key(k.as_str()));
        match schema.unknown_keys {
            UnknownKeys::Strip => {}
            UnknownKeys::Strict => {
                let keys: Vec<String> = unknown.cloned().collect();
                if !keys.is_empty() {
                    self.report(IssueKind::UnrecognizedKeys { keys });
                }
            }
            UnknownKeys::Passthrough => {
                for key in unknown {
                    out.insert(key.clone(), map[key].clone());
                }
            }
        }
        Some(Value::Object(out))
    }

    fn parse_array(&mut self, schema: &ArraySchema, input: Option<&Value>) -> Option<Value> {
        let Some(Value::Array(items)) = input else {
            self.invalid_type(ParsedType::Array, input);
            return None;
        };
        for check in &schema.checks {
            match *check {
                ArrayCheck::MinItems(min) if items.len() < min => {
                    self.report(IssueKind::TooSmall {
                        minimum: as_bound(min),
                        inclusive: true,
                        origin: SizeOrigin::Array,
                    });
                }
                ArrayCheck::MaxItems(max) if items.len() > max => {
                    self.report(IssueKind::TooBig {
                        maximum: as_bound(max),
                        inclusive: true,
                        origin: SizeOrigin::Array,
                    });
                }
                _ => {}
            }
        }
        let out = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.nested(PathSegment::Index(index), |ctx| {
                    ctx.parse(&schema.element, Some(item))
                })
                .unwrap_or(Value::Null)
            })
            .collect();
        Some(Value::Array(out))
    }

    fn parse_tuple(&mut self, items: &[Schema], input: Option<&Value>) -> Option<Value> {
        let Some(Value::Array(values)) = input else {
            self.invalid_type(ParsedType::Array, input);
            return None;
        };
        if values.len() < items.len() {
            self.report(IssueKind::TooSmall {
                minimum: as_bound(items.len()),
                inclusive: true,
                origin: SizeOrigin::Array,
            });
        } else if values.len() > items.len() {
            self.report(IssueKind::TooBig {
                maximum: as_bound(items.len()),
                inclusive: true,
                origin: SizeOrigin::Array,
            });
        }
        let out = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.nested(PathSegment::Index(index), |ctx| {
                    ctx.parse(item, values.get(index))
                })
                .unwrap_or(Value::Null)
            })
            .collect();
        Some(Value::Array(out))
    }

    fn parse_union(&mut self, options: &[Schema], input: Option<&Value>) -> Option<Value> {
        for option in options {
            let mut trial = self.fork();
            let out = trial.parse(option, input);
            if trial.issues.is_empty() {
                return out;
            }
        }
        self.report(IssueKind::InvalidUnion);
        None
    }

    fn parse_discriminated(
        &mut self,
        union: &DiscriminatedUnion,
        input: Option<&Value>,
    ) -> Option<Value> {
        let Some(Value::Object(map)) = input else {
            self.invalid_type(ParsedType::Object, input);
            return None;
        };
        let branch = map
            .get(&union.discriminator)
            .and_then(|tag| union.branch_for(tag));
        match branch {
            Some(branch) => self.parse_object(branch, input),
            None => {
                let options = union.tags();
                self.nested(PathSegment::Key(union.discriminator.clone()), |ctx| {
                    ctx.report(IssueKind::InvalidUnionDiscriminator { options });
                });
                None
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_bound(n: usize) -> f64 {
    n as f64
}
