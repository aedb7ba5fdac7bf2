use yaml_tree_core::Node;

use super::{apply_overrides, id_ref, slugify, EntityBuilder, ServiceEntity};
use crate::error::ConvertError;
use crate::openapi::{Operation, Parameter};

/// A built route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntity {
    pub name: String,
    pub id: String,
    pub node: Node,
}

/// Name of the route generated for `operation`.
///
/// The suffix is the operation's `x-kong-name`, else its `operationId`, else
/// the path item's `x-kong-name` or the path template followed by the method.
pub fn route_name(base: &str, operation: &Operation<'_>) -> String {
    let suffix = match operation
        .extensions()
        .name()
        .or_else(|| operation.operation_id())
    {
        Some(name) => slugify(name),
        None => {
            let path_name = operation
                .path
                .extensions()
                .name()
                .unwrap_or(operation.path.template);
            let path_slug = slugify(path_name);
            if path_slug.is_empty() {
                operation.method.to_string()
            } else {
                format!("{path_slug}_{}", operation.method)
            }
        }
    };
    format!("{base}_{suffix}")
}

/// Translate an OpenAPI path template into a Kong route path.
///
/// Templates without placeholders are returned unchanged. Otherwise every
/// `{name}` becomes a named capture and the result is an anchored Kong regex
/// path (`~/pets/(?<id>[^#?/]+)$`). Each placeholder needs a declared
/// `in: path` parameter of the same name. Capture names are unique within
/// the path: a repeated name gets a `_2`, `_3`, ... suffix.
pub fn convert_path(
    template: &str,
    method: &str,
    parameters: &[Parameter<'_>],
) -> Result<String, ConvertError> {
    if !template.contains('{') {
        return Ok(template.to_string());
    }

    let mut regex = String::from("~");
    let mut captures: Vec<String> = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        let declared = parameters
            .iter()
            .any(|param| param.location == "path" && param.name == name);
        if !declared {
            return Err(ConvertError::UnresolvedPathParameter {
                path: template.to_string(),
                method: method.to_ascii_uppercase(),
                parameter: name.to_string(),
            });
        }
        push_escaped(&mut regex, &rest[..start]);
        let capture = unique_capture(&captures, capture_name(name));
        regex.push_str(&format!("(?<{capture}>[^#?/]+)"));
        captures.push(capture);
        rest = &rest[start + len + 1..];
    }
    push_escaped(&mut regex, rest);
    regex.push('$');
    Ok(regex)
}

fn push_escaped(out: &mut String, literal: &str) {
    for ch in literal.chars() {
        if "\\.+*?()|[]{}^$".contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
}

fn unique_capture(taken: &[String], name: String) -> String {
    if !taken.contains(&name) {
        return name;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{name}_{n}");
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// PCRE group names allow `[A-Za-z0-9_]` and may not start with a digit.
fn capture_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|ch: char| ch.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

impl EntityBuilder<'_> {
    /// Build the route for one operation, owned by `service`.
    pub fn build_route(
        &self,
        name: &str,
        operation: &Operation<'_>,
        parameters: &[Parameter<'_>],
        service: &ServiceEntity,
        defaults: Option<&Node>,
    ) -> Result<RouteEntity, ConvertError> {
        let path = convert_path(operation.path.template, operation.method, parameters)?;
        let id = self.id(name, "route");

        let mut node = Node::new_mapping();
        node.set_field("id", Some(Node::new_string(&id)));
        node.set_field("name", Some(Node::new_string(name)));
        node.set_field("methods", Some(Node::string_sequence([operation.http_method()])));
        node.set_field("paths", Some(Node::string_sequence([path])));
        node.set_field("strip_path", Some(Node::new_bool(false)));
        apply_overrides(&mut node, defaults, "x-kong-route-defaults")?;
        node.set_field("service", Some(id_ref(&service.id)));
        self.apply_tags(&mut node)?;

        Ok(RouteEntity {
            name: name.to_string(),
            id,
            node,
        })
    }
}
