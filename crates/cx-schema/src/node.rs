//! Structural schema nodes
//!
//! A [`Schema`] is a tree of type nodes and wrapper nodes. Wrappers
//! (optional, nullable, default, effect, refinement) modify the node they
//! enclose; everything else describes a value shape.
//!
//! Schemas are built fluently:
//!
//! ```rust
//! use cx_schema::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::object([
//!     ("name", Schema::string().min(1)),
//!     ("age", Schema::number().int().optional()),
//!     ("role", Schema::enumeration(["admin", "guest"]).default_value(json!("guest"))),
//! ]);
//! assert!(schema.is_object());
//! ```

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

/// Schema node
#[derive(Debug, Clone)]
pub enum Schema {
    /// UTF-8 string
    String(StringSchema),
    /// JSON number
    Number(NumberSchema),
    /// `true` / `false`
    Boolean,
    /// Only `null`
    Null,
    /// Exactly one value
    Literal(Value),
    /// One of a fixed set of strings
    Enum(Vec<String>),
    /// Fixed-shape object
    Object(ObjectSchema),
    /// Homogeneous list
    Array(ArraySchema),
    /// String-keyed map of homogeneous values
    Record(Box<Schema>),
    /// Fixed-length positional list
    Tuple(Vec<Schema>),
    /// First matching option wins
    Union(Vec<Schema>),
    /// Objects selected by a literal tag field
    DiscriminatedUnion(DiscriminatedUnion),
    /// Accepts absence
    Optional(Box<Schema>),
    /// Accepts `null`
    Nullable(Box<Schema>),
    /// Substitutes `value` for absence
    Default { inner: Box<Schema>, value: Value },
    /// Value transformation around the inner schema
    Effect { inner: Box<Schema>, effect: Effect },
    /// Custom predicate on the parsed value
    Refinement {
        inner: Box<Schema>,
        refinement: Refinement,
    },
}

/// String constraints
#[derive(Debug, Clone, Default)]
pub struct StringSchema {
    pub checks: Vec<StringCheck>,
}

/// A single string constraint
#[derive(Debug, Clone)]
pub enum StringCheck {
    /// At least this many characters
    MinLength(usize),
    /// At most this many characters
    MaxLength(usize),
    /// Must match the expression
    Pattern(Regex),
    /// Must look like an email address
    Email,
}

/// Number constraints
#[derive(Debug, Clone, Default)]
pub struct NumberSchema {
    pub checks: Vec<NumberCheck>,
}

/// A single number constraint
#[derive(Debug, Clone, PartialEq)]
pub enum NumberCheck {
    /// Lower bound
    Min { value: f64, inclusive: bool },
    /// Upper bound
    Max { value: f64, inclusive: bool },
    /// No fractional part
    Integer,
}

/// Handling of keys an object shape does not declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop them from the output
    #[default]
    Strip,
    /// Report them as an error
    Strict,
    /// Copy them through untouched
    Passthrough,
}

/// Object shape
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    pub shape: IndexMap<String, Schema>,
    pub unknown_keys: UnknownKeys,
}

impl ObjectSchema {
    /// Create an object shape from `(key, schema)` pairs
    pub fn new<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        Self {
            shape: fields.into_iter().map(|(k, s)| (k.into(), s)).collect(),
            unknown_keys: UnknownKeys::default(),
        }
    }

    /// Reject undeclared keys
    #[inline]
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.unknown_keys = UnknownKeys::Strict;
        self
    }

    /// Field schema by key
    #[inline]
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Schema> {
        self.shape.get(key)
    }
}

/// Array element and length constraints
#[derive(Debug, Clone)]
pub struct ArraySchema {
    pub element: Box<Schema>,
    pub checks: Vec<ArrayCheck>,
}

/// A single array constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayCheck {
    /// At least this many elements
    MinItems(usize),
    /// At most this many elements
    MaxItems(usize),
}

/// Union of object branches keyed by a literal tag field
#[derive(Debug, Clone)]
pub struct DiscriminatedUnion {
    pub discriminator: String,
    pub options: Vec<ObjectSchema>,
}

impl DiscriminatedUnion {
    /// Tag literal of a branch, if it declares one
    #[must_use]
    pub fn tag_of<'a>(&self, option: &'a ObjectSchema) -> Option<&'a Value> {
        match option.field(&self.discriminator)?.peel() {
            Schema::Literal(tag) => Some(tag),
            _ => None,
        }
    }

    /// All declared tags in branch order
    #[must_use]
    pub fn tags(&self) -> Vec<Value> {
        self.options
            .iter()
            .filter_map(|option| self.tag_of(option).cloned())
            .collect()
    }

    /// Branch whose tag equals `tag`
    #[must_use]
    pub fn branch_for(&self, tag: &Value) -> Option<&ObjectSchema> {
        self.options
            .iter()
            .find(|option| self.tag_of(option) == Some(tag))
    }
}

/// Kind of value transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Applied to the input before the inner schema parses it
    Preprocess,
    /// Applied to the inner schema's successful output
    Transform,
}

type EffectFn = Arc<dyn Fn(Value) -> Value + Send + Sync>;
type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Value transformation
#[derive(Clone)]
pub struct Effect {
    pub kind: EffectKind,
    apply: EffectFn,
}

impl Effect {
    /// Run the transformation
    #[inline]
    #[must_use]
    pub fn apply(&self, value: Value) -> Value {
        (self.apply)(value)
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Custom validation predicate
#[derive(Clone)]
pub struct Refinement {
    pub message: String,
    check: PredicateFn,
}

impl Refinement {
    /// Evaluate the predicate
    #[inline]
    #[must_use]
    pub fn check(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Refinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Refinement")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Schema {
    /// String node
    #[must_use]
    pub fn string() -> Self {
        Self::String(StringSchema::default())
    }

    /// Number node
    #[must_use]
    pub fn number() -> Self {
        Self::Number(NumberSchema::default())
    }

    /// Boolean node
    #[must_use]
    pub fn boolean() -> Self {
        Self::Boolean
    }

    /// Null node
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Literal node
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Enum node
    pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::Enum(values.into_iter().map(Into::into).collect())
    }

    /// Object node from `(key, schema)` pairs
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Schema)>,
    {
        Self::Object(ObjectSchema::new(fields))
    }

    /// Array node
    #[must_use]
    pub fn array(element: Schema) -> Self {
        Self::Array(ArraySchema {
            element: Box::new(element),
            checks: Vec::new(),
        })
    }

    /// Record node
    #[must_use]
    pub fn record(value: Schema) -> Self {
        Self::Record(Box::new(value))
    }

    /// Tuple node
    #[must_use]
    pub fn tuple(items: Vec<Schema>) -> Self {
        Self::Tuple(items)
    }

    /// Union node
    #[must_use]
    pub fn union(options: Vec<Schema>) -> Self {
        Self::Union(options)
    }

    /// Discriminated union node
    pub fn discriminated_union(
        discriminator: impl Into<String>,
        options: impl IntoIterator<Item = ObjectSchema>,
    ) -> Self {
        Self::DiscriminatedUnion(DiscriminatedUnion {
            discriminator: discriminator.into(),
            options: options.into_iter().collect(),
        })
    }

    /// Wrap as optional
    #[must_use]
    pub fn optional(self) -> Self {
        Self::Optional(Box::new(self))
    }

    /// Wrap as nullable
    #[must_use]
    pub fn nullable(self) -> Self {
        Self::Nullable(Box::new(self))
    }

    /// Wrap with a default value
    #[must_use]
    pub fn default_value(self, value: Value) -> Self {
        Self::Default {
            inner: Box::new(self),
            value,
        }
    }

    /// Wrap with an output transformation
    #[must_use]
    pub fn transform(self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::Effect {
            inner: Box::new(self),
            effect: Effect {
                kind: EffectKind::Transform,
                apply: Arc::new(f),
            },
        }
    }

    /// Wrap with an input transformation
    #[must_use]
    pub fn preprocess(self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self::Effect {
            inner: Box::new(self),
            effect: Effect {
                kind: EffectKind::Preprocess,
                apply: Arc::new(f),
            },
        }
    }

    /// Wrap with a custom predicate
    #[must_use]
    pub fn refine(
        self,
        message: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Refinement {
            inner: Box::new(self),
            refinement: Refinement {
                message: message.into(),
                check: Arc::new(check),
            },
        }
    }

    /// Lower bound: length for strings, value for numbers, items for arrays
    ///
    /// Other nodes are returned unchanged.
    #[must_use]
    pub fn min(self, bound: usize) -> Self {
        match self {
            Self::String(mut s) => {
                s.checks.push(StringCheck::MinLength(bound));
                Self::String(s)
            }
            Self::Number(mut n) => {
                #[allow(clippy::cast_precision_loss)]
                n.checks.push(NumberCheck::Min {
                    value: bound as f64,
                    inclusive: true,
                });
                Self::Number(n)
            }
            Self::Array(mut a) => {
                a.checks.push(ArrayCheck::MinItems(bound));
                Self::Array(a)
            }
            other => other,
        }
    }

    /// Upper bound: length for strings, value for numbers, items for arrays
    ///
    /// Other nodes are returned unchanged.
    #[must_use]
    pub fn max(self, bound: usize) -> Self {
        match self {
            Self::String(mut s) => {
                s.checks.push(StringCheck::MaxLength(bound));
                Self::String(s)
            }
            Self::Number(mut n) => {
                #[allow(clippy::cast_precision_loss)]
                n.checks.push(NumberCheck::Max {
                    value: bound as f64,
                    inclusive: true,
                });
                Self::Number(n)
            }
            Self::Array(mut a) => {
                a.checks.push(ArrayCheck::MaxItems(bound));
                Self::Array(a)
            }
            other => other,
        }
    }

    /// Exclusive numeric lower bound
    #[must_use]
    pub fn gt(self, bound: f64) -> Self {
        self.number_check(NumberCheck::Min {
            value: bound,
            inclusive: false,
        })
    }

    /// Exclusive numeric upper bound
    #[must_use]
    pub fn lt(self, bound: f64) -> Self {
        self.number_check(NumberCheck::Max {
            value: bound,
            inclusive: false,
        })
    }

    /// Require an integral number
    #[must_use]
    pub fn int(self) -> Self {
        self.number_check(NumberCheck::Integer)
    }

    /// Require an email-shaped string
    #[must_use]
    pub fn email(self) -> Self {
        self.string_check(StringCheck::Email)
    }

    /// Require the string to match `pattern`
    #[must_use]
    pub fn pattern(self, pattern: Regex) -> Self {
        self.string_check(StringCheck::Pattern(pattern))
    }

    /// Reject undeclared object keys
    #[must_use]
    pub fn strict(self) -> Self {
        self.with_unknown_keys(UnknownKeys::Strict)
    }

    /// Keep undeclared object keys
    #[must_use]
    pub fn passthrough(self) -> Self {
        self.with_unknown_keys(UnknownKeys::Passthrough)
    }

    fn number_check(self, check: NumberCheck) -> Self {
        match self {
            Self::Number(mut n) => {
                n.checks.push(check);
                Self::Number(n)
            }
            other => other,
        }
    }

    fn string_check(self, check: StringCheck) -> Self {
        match self {
            Self::String(mut s) => {
                s.checks.push(check);
                Self::String(s)
            }
            other => other,
        }
    }

    fn with_unknown_keys(self, policy: UnknownKeys) -> Self {
        match self {
            Self::Object(mut o) => {
                o.unknown_keys = policy;
                Self::Object(o)
            }
            other => other,
        }
    }

    /// Strip every wrapper, returning the innermost type node
    #[must_use]
    pub fn peel(&self) -> &Schema {
        let mut current = self;
        while let Some(inner) = current.wrapped() {
            current = inner;
        }
        current
    }

    /// Inner node of a wrapper
    #[must_use]
    pub fn wrapped(&self) -> Option<&Schema> {
        match self {
            Self::Optional(inner)
            | Self::Nullable(inner)
            | Self::Default { inner, .. }
            | Self::Effect { inner, .. }
            | Self::Refinement { inner, .. } => Some(inner),
            _ => None,
        }
    }

    /// Whether the innermost node is an object
    #[inline]
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self.peel(), Self::Object(_))
    }

    /// Whether this node carries built-in checks
    #[must_use]
    pub fn has_checks(&self) -> bool {
        match self {
            Self::String(s) => !s.checks.is_empty(),
            Self::Number(n) => !n.checks.is_empty(),
            Self::Array(a) => !a.checks.is_empty(),
            _ => false,
        }
    }

    /// Copy of this node with built-in checks removed
    #[must_use]
    pub fn without_checks(&self) -> Self {
        match self {
            Self::String(_) => Self::string(),
            Self::Number(_) => Self::number(),
            Self::Array(a) => Self::Array(ArraySchema {
                element: a.element.clone(),
                checks: Vec::new(),
            }),
            other => other.clone(),
        }
    }

    /// Short name of the node kind
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Literal(_) => "literal",
            Self::Enum(_) => "enum",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Record(_) => "record",
            Self::Tuple(_) => "tuple",
            Self::Union(_) => "union",
            Self::DiscriminatedUnion(_) => "discriminated union",
            Self::Optional(_) => "optional",
            Self::Nullable(_) => "nullable",
            Self::Default { .. } => "default",
            Self::Effect { .. } => "effect",
            Self::Refinement { .. } => "refinement",
        }
    }
}

impl From<ObjectSchema> for Schema {
    fn from(object: ObjectSchema) -> Self {
        Self::Object(object)
    }
}
