use yaml_tree_core::Node;

use super::{apply_overrides, id_ref, EntityBuilder};
use crate::error::ConvertError;
use crate::openapi::{field, Document, Operation, Parameter};

/// Name of the plugin derived from operation schemas.
pub const VALIDATOR_PLUGIN: &str = "request-validator";

/// Parameter locations the request validator understands.
const VALIDATED_LOCATIONS: [&str; 3] = ["query", "header", "path"];

/// The entity a plugin is attached to.
#[derive(Debug, Clone, Copy)]
pub enum PluginOwner<'e> {
    Service { name: &'e str, id: &'e str },
    Route { name: &'e str, id: &'e str },
}

impl PluginOwner<'_> {
    fn name(&self) -> &str {
        match self {
            PluginOwner::Service { name, .. } | PluginOwner::Route { name, .. } => name,
        }
    }

    fn field(&self) -> (&'static str, Node) {
        match self {
            PluginOwner::Service { id, .. } => ("service", id_ref(id)),
            PluginOwner::Route { id, .. } => ("route", id_ref(id)),
        }
    }
}

/// Overlay operation level plugin extensions onto path level ones by plugin
/// name, keeping first-seen order.
pub fn merge_plugin_extensions<'a>(
    outer: Vec<(&'a str, &'a Node)>,
    inner: Vec<(&'a str, &'a Node)>,
) -> Vec<(&'a str, &'a Node)> {
    let mut merged = outer;
    for (name, config) in inner {
        match merged.iter().position(|(existing, _)| *existing == name) {
            Some(idx) => merged[idx] = (name, config),
            None => merged.push((name, config)),
        }
    }
    merged
}

impl EntityBuilder<'_> {
    /// Build a plugin from an `x-kong-plugin-<name>` extension value.
    ///
    /// The extension's fields are copied as they are; the owner reference is
    /// always the entity the plugin was declared for.
    pub fn build_plugin(
        &self,
        plugin_name: &str,
        extension: &Node,
        owner: PluginOwner<'_>,
    ) -> Result<Node, ConvertError> {
        let mut node = self.plugin_skeleton(plugin_name, owner);
        apply_overrides(&mut node, Some(extension), &format!("x-kong-plugin-{plugin_name}"))?;
        self.finish_plugin(node, owner)
    }

    /// Derive a `request-validator` plugin for `operation`.
    ///
    /// Runs when validator generation is enabled or an
    /// `x-kong-plugin-request-validator` extension is in effect. Without an
    /// extension, an operation with no validated parameters and no JSON body
    /// gets no plugin.
    pub fn build_validator_plugin<'a>(
        &self,
        doc: &Document<'a>,
        operation: &Operation<'a>,
        parameters: &[Parameter<'_>],
        extension: Option<&Node>,
        owner: PluginOwner<'_>,
    ) -> Result<Option<Node>, ConvertError> {
        if !self.options().generate_validator && extension.is_none() {
            return Ok(None);
        }

        let parameter_schema = parameter_schema(doc, parameters);
        let body = body_schema(doc, operation);
        if parameter_schema.is_none() && body.is_none() && extension.is_none() {
            return Ok(None);
        }

        let mut config = Node::new_mapping();
        config.set_field("version", Some(Node::new_string("draft4")));
        if let Some((schema, content_types)) = body {
            config.set_field("body_schema", Some(Node::new_string(schema)));
            config.set_field("allowed_content_types", Some(Node::string_sequence(content_types)));
        }
        config.set_field("parameter_schema", parameter_schema);

        let mut node = self.plugin_skeleton(VALIDATOR_PLUGIN, owner);
        node.set_field("config", Some(config));
        if let Some(extension) = extension {
            let Some(pairs) = extension.as_mapping() else {
                return Err(ConvertError::MalformedDocument(format!(
                    "'x-kong-plugin-{VALIDATOR_PLUGIN}' must be a mapping, found {}",
                    extension.kind()
                )));
            };
            for (key, value) in pairs {
                if key == "config" {
                    let config = node
                        .get_field_mut("config")
                        .ok_or_else(|| ConvertError::MalformedDocument("missing config".into()))?;
                    apply_overrides(config, Some(value), "x-kong-plugin-request-validator.config")?;
                } else {
                    node.set_field(key, if value.is_null() { None } else { Some(value.clone()) });
                }
            }
        }
        self.finish_plugin(node, owner).map(Some)
    }

    fn plugin_skeleton(&self, plugin_name: &str, owner: PluginOwner<'_>) -> Node {
        let mut node = Node::new_mapping();
        node.set_field(
            "id",
            Some(Node::new_string(
                self.id(&format!("{}.{plugin_name}", owner.name()), "plugin"),
            )),
        );
        node.set_field("name", Some(Node::new_string(plugin_name)));
        node
    }

    fn finish_plugin(&self, mut node: Node, owner: PluginOwner<'_>) -> Result<Node, ConvertError> {
        let (key, reference) = owner.field();
        node.set_field(key, Some(reference));
        self.apply_tags(&mut node)?;
        Ok(node)
    }
}

/// Validator entries for query, header and path parameters.
fn parameter_schema(doc: &Document<'_>, parameters: &[Parameter<'_>]) -> Option<Node> {
    let entries: Vec<Node> = parameters
        .iter()
        .filter(|param| VALIDATED_LOCATIONS.contains(&param.location))
        .filter_map(|param| {
            let schema = doc.dereference(param.schema()?);
            let mut entry = Node::new_mapping();
            entry.set_field("in", Some(Node::new_string(param.location)));
            entry.set_field("name", Some(Node::new_string(param.name)));
            entry.set_field("required", Some(Node::new_bool(param.required())));
            entry.set_field("style", Some(Node::new_string(param.style())));
            entry.set_field("explode", Some(Node::new_bool(param.explode())));
            entry.set_field("schema", Some(Node::new_string(schema.to_string())));
            Some(entry)
        })
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(Node::Sequence(entries))
    }
}

/// Schema of the first JSON media type of the request body, as a JSON
/// string, with every declared content type.
fn body_schema<'a>(doc: &Document<'a>, operation: &Operation<'a>) -> Option<(String, Vec<String>)> {
    let content = operation
        .request_body(doc)
        .and_then(|body| field(body, "content"))
        .and_then(Node::as_mapping)?;
    let schema = content
        .iter()
        .find(|(media_type, _)| media_type.contains("json"))
        .and_then(|(_, media)| field(media, "schema"))?;

    let content_types = content.iter().map(|(media_type, _)| media_type.clone()).collect();
    Some((doc.dereference(schema).to_string(), content_types))
}
