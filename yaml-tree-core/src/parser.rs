use std::fs;
use std::path::Path;

use serde_json::Number;
use serde_yaml::Value;
use thiserror::Error;

use crate::tree::{Node, Scalar};

/// Errors that can occur while parsing text into a [`Node`] tree.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Input could not be tokenized as YAML or JSON.
    #[error("failed to parse document: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Failed to read input file.
    #[error("failed to read document file: {0}")]
    Io(#[from] std::io::Error),
    /// Structure that has no tree representation.
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Parse YAML or JSON bytes into a [`Node`] tree.
///
/// Mapping order is kept as written. Scalar keys that are not strings are
/// converted to their text form and YAML tags are dropped.
pub fn parse(input: &[u8]) -> Result<Node, ParseError> {
    let value: Value = serde_yaml::from_slice(input)?;
    from_yaml(value)
}

/// Parse a YAML or JSON file into a [`Node`] tree.
pub fn parse_file(path: &Path) -> Result<Node, ParseError> {
    let bytes = fs::read(path)?;
    parse(&bytes)
}

fn from_yaml(value: Value) -> Result<Node, ParseError> {
    let node = match value {
        Value::Null => Node::null(),
        Value::Bool(value) => Node::new_bool(value),
        Value::Number(value) => Node::Scalar(number_scalar(&value)),
        Value::String(value) => Node::new_string(value),
        Value::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Mapping(map) => {
            let mut pairs = Vec::with_capacity(map.len());
            for (key, value) in map {
                pairs.push((key_to_string(key)?, from_yaml(value)?));
            }
            Node::Mapping(pairs)
        }
        Value::Tagged(tagged) => from_yaml(tagged.value)?,
    };
    Ok(node)
}

fn number_scalar(value: &serde_yaml::Number) -> Scalar {
    if let Some(int) = value.as_i64() {
        return Scalar::Number(Number::from(int));
    }
    if let Some(uint) = value.as_u64() {
        return Scalar::Number(Number::from(uint));
    }
    // .nan and .inf have no JSON number form
    value
        .as_f64()
        .and_then(Number::from_f64)
        .map(Scalar::Number)
        .unwrap_or_else(|| Scalar::String(value.to_string()))
}

fn key_to_string(key: Value) -> Result<String, ParseError> {
    match key {
        Value::String(key) => Ok(key),
        Value::Bool(key) => Ok(key.to_string()),
        Value::Number(key) => Ok(key.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => key_to_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => Err(ParseError::Malformed(
            "mapping keys must be scalars".to_string(),
        )),
    }
}
