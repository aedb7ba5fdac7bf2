use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::tree::Node;

/// Text encodings supported by [`write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Yaml,
    Json,
}

/// Errors that can occur while writing a [`Node`] tree.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to write YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to write output file.
    #[error("failed to write document file: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a [`Node`] tree into text bytes.
///
/// JSON output is pretty-printed and ends with a newline.
pub fn write(node: &Node, format: Format) -> Result<Vec<u8>, WriteError> {
    match format {
        Format::Yaml => Ok(serde_yaml::to_string(node)?.into_bytes()),
        Format::Json => {
            let mut bytes = serde_json::to_vec_pretty(node)?;
            bytes.push(b'\n');
            Ok(bytes)
        }
    }
}

/// Serialize a [`Node`] tree and write it to `path`.
pub fn write_file(node: &Node, path: &Path, format: Format) -> Result<(), WriteError> {
    let bytes = write(node, format)?;
    fs::write(path, bytes)?;
    Ok(())
}
