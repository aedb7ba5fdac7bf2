use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// Settings for a single conversion run.
///
/// Loaded from TOML as:
///
/// ```toml
/// tags = ["OAS3_import"]
/// generate_validator = true
/// doc_name = "petstore"
/// uuid_namespace = "6ba7b810-9dad-11d1-80b4-00c04fd430c8"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConversionOptions {
    /// Tags appended to every generated entity, in order.
    pub tags: Vec<String>,
    /// Derive a `request-validator` plugin for every operation that has
    /// something to validate, not only where the extension asks for one.
    pub generate_validator: bool,
    /// Scopes generated ids to one document.
    pub doc_name: Option<String>,
    /// Base namespace for generated ids.
    pub uuid_namespace: Option<Uuid>,
}

impl ConversionOptions {
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_validator(mut self, enabled: bool) -> Self {
        self.generate_validator = enabled;
        self
    }

    /// Namespace all entity ids of this run are derived in.
    pub fn namespace(&self) -> Uuid {
        let base = self.uuid_namespace.unwrap_or_else(default_namespace);
        match &self.doc_name {
            Some(name) => Uuid::new_v5(&base, name.as_bytes()),
            None => base,
        }
    }
}

/// Namespace used when no `uuid_namespace` is configured.
pub fn default_namespace() -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_DNS, b"konghq.com")
}

/// Errors returned when loading an options file.
#[derive(Debug, Error)]
pub enum OptionsLoadError {
    #[error("failed to read options file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse options file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Load conversion options from a TOML file.
pub fn load_options(path: &Path) -> Result<ConversionOptions, OptionsLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| OptionsLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_options(&raw, path.display().to_string())
}

fn parse_options(raw: &str, path: String) -> Result<ConversionOptions, OptionsLoadError> {
    toml::from_str(raw).map_err(|source| OptionsLoadError::Parse { path, source })
}
