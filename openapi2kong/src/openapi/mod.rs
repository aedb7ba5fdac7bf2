//! Read-only view over a parsed OpenAPI 3 document.
//!
//! Nothing here interprets `x-kong-*` extensions; they are only surfaced so
//! the entity builders can act on them.

pub mod parameters;
pub mod refs;
pub mod servers;

use yaml_tree_core::Node;

use crate::error::ConvertError;

pub use parameters::Parameter;
pub use servers::{Server, ServerTarget};

/// Prefix of the vendor extensions this crate reacts to.
pub const EXTENSION_PREFIX: &str = "x-kong-";

/// Prefix of plugin extensions, followed by the plugin name.
pub const PLUGIN_PREFIX: &str = "x-kong-plugin-";

/// Operation keys of a path item, in the order routes are generated.
pub const METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Look up `key` on `node` if it is a mapping.
pub(crate) fn field<'a>(node: &'a Node, key: &str) -> Option<&'a Node> {
    if node.is_mapping() {
        node.get_field(key)
    } else {
        None
    }
}

pub(crate) fn str_field<'a>(node: &'a Node, key: &str) -> Option<&'a str> {
    field(node, key).and_then(Node::as_str)
}

/// A parsed OpenAPI document.
#[derive(Debug, Clone, Copy)]
pub struct Document<'a> {
    root: &'a Node,
}

impl<'a> Document<'a> {
    /// Wrap a parsed tree, checking the shape the rest of the view relies on.
    pub fn new(root: &'a Node) -> Result<Self, ConvertError> {
        if !root.is_mapping() {
            return Err(ConvertError::MalformedDocument(format!(
                "document root must be a mapping, found {}",
                root.kind()
            )));
        }
        if let Some(paths) = root.get_field("paths") {
            if !paths.is_mapping() {
                return Err(ConvertError::MalformedDocument(format!(
                    "'paths' must be a mapping, found {}",
                    paths.kind()
                )));
            }
        }
        Ok(Self { root })
    }

    /// `info.title`, if present.
    pub fn title(&self) -> Option<&'a str> {
        field(self.root, "info").and_then(|info| str_field(info, "title"))
    }

    /// Document level servers. `None` when absent or empty.
    pub fn servers(&self) -> Result<Option<Vec<Server<'a>>>, ConvertError> {
        servers::servers_at(self.root)
    }

    pub fn extensions(&self) -> Extensions<'a> {
        Extensions::of(self.root)
    }

    /// Path items in document order.
    pub fn paths(&self) -> Vec<PathItem<'a>> {
        let Some(paths) = field(self.root, "paths").and_then(Node::as_mapping) else {
            return Vec::new();
        };
        paths
            .iter()
            .filter(|(template, _)| !template.starts_with("x-"))
            .map(|(template, node)| PathItem {
                template,
                node: self.resolve(node),
            })
            .collect()
    }

    /// Follow local `$ref` links until a non-reference node is reached.
    ///
    /// Unresolvable or remote references are returned as they are.
    pub fn resolve(&self, node: &'a Node) -> &'a Node {
        refs::resolve(self.root, node)
    }

    /// Deep copy of `node` with local schema references expanded.
    pub fn dereference(&self, node: &Node) -> Node {
        refs::dereference(self.root, node)
    }
}

/// One entry of `paths`.
#[derive(Debug, Clone, Copy)]
pub struct PathItem<'a> {
    pub template: &'a str,
    pub node: &'a Node,
}

impl<'a> PathItem<'a> {
    /// Declared operations in [`METHODS`] order.
    pub fn operations(&self) -> Vec<Operation<'a>> {
        METHODS
            .iter()
            .copied()
            .filter_map(|method| {
                field(self.node, method)
                    .filter(|node| node.is_mapping())
                    .map(|node| Operation {
                        method,
                        path: *self,
                        node,
                    })
            })
            .collect()
    }

    pub fn servers(&self) -> Result<Option<Vec<Server<'a>>>, ConvertError> {
        servers::servers_at(self.node)
    }

    pub fn extensions(&self) -> Extensions<'a> {
        Extensions::of(self.node)
    }
}

/// One HTTP operation of a path item.
#[derive(Debug, Clone, Copy)]
pub struct Operation<'a> {
    /// Lowercase method key as written in the document.
    pub method: &'static str,
    pub path: PathItem<'a>,
    pub node: &'a Node,
}

impl<'a> Operation<'a> {
    pub fn operation_id(&self) -> Option<&'a str> {
        str_field(self.node, "operationId")
    }

    pub fn summary(&self) -> Option<&'a str> {
        str_field(self.node, "summary")
    }

    pub fn description(&self) -> Option<&'a str> {
        str_field(self.node, "description")
    }

    /// Path level parameters merged with the operation's own.
    pub fn parameters(&self, doc: &Document<'a>) -> Vec<Parameter<'a>> {
        parameters::merge(
            parameters::declared(doc, field(self.path.node, "parameters")),
            parameters::declared(doc, field(self.node, "parameters")),
        )
    }

    /// The resolved `requestBody`, if any.
    pub fn request_body(&self, doc: &Document<'a>) -> Option<&'a Node> {
        field(self.node, "requestBody")
            .map(|body| doc.resolve(body))
            .filter(|body| body.is_mapping())
    }

    pub fn responses(&self) -> Option<&'a Node> {
        field(self.node, "responses").filter(|responses| responses.is_mapping())
    }

    pub fn servers(&self) -> Result<Option<Vec<Server<'a>>>, ConvertError> {
        servers::servers_at(self.node)
    }

    pub fn extensions(&self) -> Extensions<'a> {
        Extensions::of(self.node)
    }

    /// Uppercase method, as Kong expects it.
    pub fn http_method(&self) -> String {
        self.method.to_ascii_uppercase()
    }
}

/// `x-kong-*` fields of one document, path item or operation.
#[derive(Debug, Clone, Copy)]
pub struct Extensions<'a> {
    node: &'a Node,
}

impl<'a> Extensions<'a> {
    fn of(node: &'a Node) -> Self {
        Self { node }
    }

    /// Extension value by name without prefix, e.g. `get("name")` for
    /// `x-kong-name`.
    pub fn get(&self, name: &str) -> Option<&'a Node> {
        field(self.node, &format!("{EXTENSION_PREFIX}{name}"))
    }

    /// Value of `x-kong-name`.
    pub fn name(&self) -> Option<&'a str> {
        self.get("name").and_then(Node::as_str)
    }

    /// All extension fields in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Node)> {
        self.node
            .as_mapping()
            .unwrap_or_default()
            .iter()
            .filter(|(key, _)| key.starts_with(EXTENSION_PREFIX))
            .map(|(key, value)| (key.as_str(), value))
    }

    /// `x-kong-plugin-<name>` fields as `(name, value)` pairs.
    pub fn plugins(&self) -> Vec<(&'a str, &'a Node)> {
        self.iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(PLUGIN_PREFIX)
                    .filter(|name| !name.is_empty())
                    .map(|name| (name, value))
            })
            .collect()
    }

    pub fn plugin(&self, name: &str) -> Option<&'a Node> {
        field(self.node, &format!("{PLUGIN_PREFIX}{name}"))
    }
}
