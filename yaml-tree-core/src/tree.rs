use std::fmt::{self, Display, Formatter};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A generic document tree node.
///
/// Mapping keys are unique within a node and keep their insertion order,
/// which is also the order they are written out in.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Ordered key/value pairs.
    Mapping(Vec<(String, Node)>),
    /// Ordered child nodes.
    Sequence(Vec<Node>),
    /// Typed leaf value.
    Scalar(Scalar),
}

/// Leaf value of a [`Node`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// Errors raised when a node does not have the shape an operation needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node kind did not match the expected mapping/sequence kind.
    #[error("expected a {expected} node, found {found}")]
    InvalidShape {
        expected: &'static str,
        found: &'static str,
    },
    /// An element operation was applied to something other than a sequence.
    #[error("target is not a sequence node, found {found}")]
    NotASequence { found: &'static str },
    /// An element supplied to an append was absent.
    #[error("value at index {index} is absent")]
    NilElement { index: usize },
}

impl Node {
    /// Create an empty mapping node.
    pub fn new_mapping() -> Self {
        Node::Mapping(Vec::new())
    }

    /// Create an empty sequence node.
    pub fn new_sequence() -> Self {
        Node::Sequence(Vec::new())
    }

    /// Create a string scalar node.
    pub fn new_string(value: impl Into<String>) -> Self {
        Node::Scalar(Scalar::String(value.into()))
    }

    pub fn new_bool(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }

    pub fn new_int(value: i64) -> Self {
        Node::Scalar(Scalar::Number(Number::from(value)))
    }

    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    /// Build a sequence of string scalars.
    pub fn string_sequence<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Node::Sequence(values.into_iter().map(Node::new_string).collect())
    }

    /// Short name of the node kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Mapping(_) => "mapping",
            Node::Sequence(_) => "sequence",
            Node::Scalar(Scalar::Null) => "null",
            Node::Scalar(Scalar::Bool(_)) => "bool",
            Node::Scalar(Scalar::Number(_)) => "number",
            Node::Scalar(Scalar::String(_)) => "string",
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Node::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Node::Sequence(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(Scalar::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&[(String, Node)]> {
        match self {
            Node::Mapping(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Build a mapping-rooted tree from a plain value.
    pub fn from_plain_object(value: &Value) -> Result<Self, TreeError> {
        match value {
            Value::Object(_) => Ok(Node::from(value)),
            other => Err(TreeError::InvalidShape {
                expected: "mapping",
                found: value_kind(other),
            }),
        }
    }

    /// Convert a mapping node into a plain JSON object.
    pub fn to_plain_object(&self) -> Result<Map<String, Value>, TreeError> {
        match self.to_plain_value() {
            Value::Object(map) => Ok(map),
            _ => Err(TreeError::InvalidShape {
                expected: "mapping",
                found: self.kind(),
            }),
        }
    }

    /// Convert a sequence node into a plain JSON array.
    pub fn to_plain_array(&self) -> Result<Vec<Value>, TreeError> {
        match self.to_plain_value() {
            Value::Array(items) => Ok(items),
            _ => Err(TreeError::InvalidShape {
                expected: "sequence",
                found: self.kind(),
            }),
        }
    }

    /// Convert any node into a plain JSON value.
    pub fn to_plain_value(&self) -> Value {
        match self {
            Node::Mapping(pairs) => Value::Object(
                pairs
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_plain_value()))
                    .collect(),
            ),
            Node::Sequence(items) => Value::Array(items.iter().map(Node::to_plain_value).collect()),
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(value)) => Value::Bool(*value),
            Node::Scalar(Scalar::Number(value)) => Value::Number(value.clone()),
            Node::Scalar(Scalar::String(value)) => Value::String(value.clone()),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

impl From<&Value> for Node {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Node::null(),
            Value::Bool(value) => Node::new_bool(*value),
            Value::Number(value) => Node::Scalar(Scalar::Number(value.clone())),
            Value::String(value) => Node::new_string(value.as_str()),
            Value::Array(items) => Node::Sequence(items.iter().map(Node::from).collect()),
            Value::Object(map) => Node::Mapping(
                map.iter()
                    .map(|(key, value)| (key.clone(), Node::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::new_string(value)
    }
}

impl From<String> for Node {
    fn from(value: String) -> Self {
        Node::new_string(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::new_bool(value)
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::new_int(value)
    }
}

impl From<u16> for Node {
    fn from(value: u16) -> Self {
        Node::new_int(i64::from(value))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Sequence(items)
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Node::Mapping(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (key, value) in pairs {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Node::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Scalar(Scalar::Null) => serializer.serialize_unit(),
            Node::Scalar(Scalar::Bool(value)) => serializer.serialize_bool(*value),
            Node::Scalar(Scalar::Number(value)) => value.serialize(serializer),
            Node::Scalar(Scalar::String(value)) => serializer.serialize_str(value),
        }
    }
}

/// Compact single-line JSON rendering.
impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        write!(f, "{rendered}")
    }
}
