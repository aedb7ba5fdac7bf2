//! Builders for individual Kong entities.
//!
//! Every builder produces a mapping [`Node`] and goes through the same final
//! steps: extension overrides are applied field by field, then the configured
//! tags are appended.

pub mod plugin;
pub mod route;
pub mod service;

use uuid::Uuid;
use yaml_tree_core::Node;

use crate::error::ConvertError;
use crate::options::ConversionOptions;

pub use plugin::PluginOwner;
pub use route::{convert_path, RouteEntity};
pub use service::{ServiceDefaults, ServiceEntity};

/// Shared state for building the entities of one conversion run.
#[derive(Debug)]
pub struct EntityBuilder<'o> {
    options: &'o ConversionOptions,
    namespace: Uuid,
}

impl<'o> EntityBuilder<'o> {
    pub fn new(options: &'o ConversionOptions) -> Self {
        Self {
            options,
            namespace: options.namespace(),
        }
    }

    pub fn options(&self) -> &'o ConversionOptions {
        self.options
    }

    /// Stable id for an entity of `kind` called `name`.
    pub fn id(&self, name: &str, kind: &str) -> String {
        Uuid::new_v5(&self.namespace, format!("{name}.{kind}").as_bytes()).to_string()
    }

    /// Append the configured tags after any tags the entity already carries.
    pub fn apply_tags(&self, entity: &mut Node) -> Result<(), ConvertError> {
        if self.options.tags.is_empty() {
            return Ok(());
        }
        let tags = self.options.tags.iter().map(|tag| Some(Node::new_string(tag)));
        match entity.get_field_mut("tags") {
            Some(existing) => existing.append(tags)?,
            None => {
                let mut list = Node::new_sequence();
                list.append(tags)?;
                entity.set_field("tags", Some(list));
            }
        }
        Ok(())
    }
}

/// Overlay extension-provided fields onto a synthesized entity.
///
/// Each field of `overrides` replaces the entity's value; a `null` field
/// removes the synthesized one.
pub(crate) fn apply_overrides(
    entity: &mut Node,
    overrides: Option<&Node>,
    extension: &str,
) -> Result<(), ConvertError> {
    let Some(overrides) = overrides else {
        return Ok(());
    };
    let Some(pairs) = overrides.as_mapping() else {
        return Err(ConvertError::MalformedDocument(format!(
            "'{extension}' must be a mapping, found {}",
            overrides.kind()
        )));
    };
    for (key, value) in pairs {
        let value = if value.is_null() {
            None
        } else {
            Some(value.clone())
        };
        entity.set_field(key, value);
    }
    Ok(())
}

/// Lowercase, `-` separated form of a name, safe for Kong entity names.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// `{"id": <id>}` reference to another entity.
pub(crate) fn id_ref(id: &str) -> Node {
    let mut reference = Node::new_mapping();
    reference.set_field("id", Some(Node::new_string(id)));
    reference
}
