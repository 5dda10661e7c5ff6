//! Parser issues
//!
//! An [`Issue`] is one reason a value failed to parse, located by path.
//! Messages follow the usual wording of structural validators ("Required",
//! "Expected string, received number").

use std::fmt::{self, Display, Formatter};

use cx_path::{join_segments, PathSegment};
use serde::Serialize;
use serde_json::Value;

/// Runtime type classification of an input value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsedType {
    String,
    Number,
    Integer,
    Float,
    Boolean,
    Null,
    Undefined,
    Object,
    Array,
}

impl ParsedType {
    /// Classify an optional value; absence is `Undefined`
    #[must_use]
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => Self::Undefined,
            Some(Value::Null) => Self::Null,
            Some(Value::Bool(_)) => Self::Boolean,
            Some(Value::Number(_)) => Self::Number,
            Some(Value::String(_)) => Self::String,
            Some(Value::Array(_)) => Self::Array,
            Some(Value::Object(_)) => Self::Object,
        }
    }

    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Object => "object",
            Self::Array => "array",
        }
    }
}

impl Display for ParsedType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a size bound applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeOrigin {
    String,
    Number,
    Array,
}

/// Failed string format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFormat {
    Email,
    Regex,
}

/// Classification of an issue
#[derive(Debug, Clone, PartialEq)]
pub enum IssueKind {
    /// Wrong runtime type
    InvalidType {
        expected: ParsedType,
        received: ParsedType,
    },
    /// Value differs from the required literal
    InvalidLiteral { expected: Value },
    /// String not among the enum values
    InvalidEnumValue { options: Vec<String>, received: Value },
    /// Object carries undeclared keys
    UnrecognizedKeys { keys: Vec<String> },
    /// No union option matched
    InvalidUnion,
    /// Tag field holds no known branch tag
    InvalidUnionDiscriminator { options: Vec<Value> },
    /// Below a lower bound
    TooSmall {
        minimum: f64,
        inclusive: bool,
        origin: SizeOrigin,
    },
    /// Above an upper bound
    TooBig {
        maximum: f64,
        inclusive: bool,
        origin: SizeOrigin,
    },
    /// String format mismatch
    InvalidString { format: StringFormat },
    /// Refinement predicate rejected the value
    Custom { message: String },
}

impl IssueKind {
    /// Default human readable message
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidType {
                received: ParsedType::Undefined,
                ..
            } => "Required".to_owned(),
            Self::InvalidType { expected, received } => {
                format!("Expected {expected}, received {received}")
            }
            Self::InvalidLiteral { expected } => {
                format!("Invalid literal value, expected {expected}")
            }
            Self::InvalidEnumValue { options, received } => format!(
                "Invalid enum value. Expected {}, received {}",
                quote_all(options.iter().map(String::as_str)),
                render(received)
            ),
            Self::UnrecognizedKeys { keys } => format!(
                "Unrecognized key(s) in object: {}",
                keys.iter()
                    .map(|k| format!("'{k}'"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::InvalidUnion => "Invalid input".to_owned(),
            Self::InvalidUnionDiscriminator { options } => format!(
                "Invalid discriminator value. Expected {}",
                options.iter().map(render).collect::<Vec<_>>().join(" | ")
            ),
            Self::TooSmall {
                minimum,
                inclusive,
                origin,
            } => match origin {
                SizeOrigin::String => {
                    format!("String must contain at least {minimum} character(s)")
                }
                SizeOrigin::Array => format!("Array must contain at least {minimum} element(s)"),
                SizeOrigin::Number if *inclusive => {
                    format!("Number must be greater than or equal to {minimum}")
                }
                SizeOrigin::Number => format!("Number must be greater than {minimum}"),
            },
            Self::TooBig {
                maximum,
                inclusive,
                origin,
            } => match origin {
                SizeOrigin::String => {
                    format!("String must contain at most {maximum} character(s)")
                }
                SizeOrigin::Array => format!("Array must contain at most {maximum} element(s)"),
                SizeOrigin::Number if *inclusive => {
                    format!("Number must be less than or equal to {maximum}")
                }
                SizeOrigin::Number => format!("Number must be less than {maximum}"),
            },
            Self::InvalidString {
                format: StringFormat::Email,
            } => "Invalid email".to_owned(),
            Self::InvalidString {
                format: StringFormat::Regex,
            } => "Invalid".to_owned(),
            Self::Custom { message } => message.clone(),
        }
    }
}

fn quote_all<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.map(|v| format!("'{v}'")).collect::<Vec<_>>().join(" | ")
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

/// One parse failure at a path
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    pub kind: IssueKind,
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    /// Create an issue with the kind's default message
    #[must_use]
    pub fn new(kind: IssueKind, path: Vec<PathSegment>) -> Self {
        let message = kind.message();
        Self {
            kind,
            path,
            message,
        }
    }

    /// Dotted form of the path
    #[inline]
    #[must_use]
    pub fn path_string(&self) -> String {
        join_segments(&self.path)
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}
