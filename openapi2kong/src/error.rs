use thiserror::Error;
use yaml_tree_core::{ParseError, TreeError};

/// Errors returned by a conversion run.
///
/// None of these leave partial output behind: a failed conversion returns no
/// configuration at all.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Input bytes could not be decoded into a tree.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An entity edit hit a node of the wrong kind.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The document root, `paths`, or an extension value has the wrong shape.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    /// A `{name}` placeholder in a path template has no `in: path` parameter.
    #[error("{method} {path}: path parameter '{parameter}' is not declared")]
    UnresolvedPathParameter {
        path: String,
        method: String,
        parameter: String,
    },
    /// A server entry has no usable host.
    #[error("invalid server url '{url}': {reason}")]
    InvalidServer { url: String, reason: String },
}
