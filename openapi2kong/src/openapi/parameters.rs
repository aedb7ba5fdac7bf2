use yaml_tree_core::Node;

use super::{field, str_field, Document};

/// A declared operation or path item parameter, with `$ref` resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameter<'a> {
    pub name: &'a str,
    /// `in` value: `path`, `query`, `header` or `cookie`.
    pub location: &'a str,
    pub node: &'a Node,
}

impl<'a> Parameter<'a> {
    /// Path parameters are always required.
    pub fn required(&self) -> bool {
        self.location == "path"
            || field(self.node, "required")
                .and_then(Node::as_bool)
                .unwrap_or(false)
    }

    /// `style`, falling back to the location default.
    pub fn style(&self) -> &'a str {
        str_field(self.node, "style").unwrap_or(match self.location {
            "query" | "cookie" => "form",
            _ => "simple",
        })
    }

    /// `explode`, defaulting to true only for `form` style.
    pub fn explode(&self) -> bool {
        field(self.node, "explode")
            .and_then(Node::as_bool)
            .unwrap_or_else(|| self.style() == "form")
    }

    /// The parameter schema, or the schema of its first `content` entry.
    pub fn schema(&self) -> Option<&'a Node> {
        if let Some(schema) = field(self.node, "schema") {
            return Some(schema);
        }
        field(self.node, "content")
            .and_then(Node::as_mapping)
            .and_then(|media| media.first())
            .and_then(|(_, media)| field(media, "schema"))
    }
}

/// Read a `parameters` list, skipping entries without `name` or `in`.
pub(crate) fn declared<'a>(doc: &Document<'a>, list: Option<&'a Node>) -> Vec<Parameter<'a>> {
    let Some(entries) = list.and_then(Node::as_sequence) else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|entry| doc.resolve(entry))
        .filter_map(|node| {
            Some(Parameter {
                name: str_field(node, "name")?,
                location: str_field(node, "in")?,
                node,
            })
        })
        .collect()
}

/// Overlay operation parameters onto path level ones.
///
/// An operation parameter with the same `(name, in)` pair replaces the path
/// level entry in place; others are appended in declaration order.
pub(crate) fn merge<'a>(
    path_level: Vec<Parameter<'a>>,
    operation_level: Vec<Parameter<'a>>,
) -> Vec<Parameter<'a>> {
    let mut merged = path_level;
    for param in operation_level {
        match merged
            .iter()
            .position(|p| p.name == param.name && p.location == param.location)
        {
            Some(idx) => merged[idx] = param,
            None => merged.push(param),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use yaml_tree_core::{parse, Node};

    use crate::openapi::Document;

    #[test]
    fn operation_parameters_override_path_parameters() {
        let root = parse(
            br##"
paths:
  /pets/{id}:
    parameters:
      - name: id
        in: path
        description: path level
      - name: limit
        in: query
      - $ref: "#/components/parameters/trace"
    get:
      parameters:
        - name: id
          in: path
          description: operation level
        - name: limit
          in: header
components:
  parameters:
    trace:
      name: X-Trace
      in: header
"##,
        )
        .expect("parse");
        let doc = Document::new(&root).expect("document");
        let path = doc.paths()[0];
        let op = path.operations()[0];
        let params = op.parameters(&doc);

        let pairs: Vec<(&str, &str)> = params.iter().map(|p| (p.name, p.location)).collect();
        assert_eq!(
            pairs,
            vec![
                ("id", "path"),
                ("limit", "query"),
                ("X-Trace", "header"),
                ("limit", "header"),
            ]
        );
        assert_eq!(
            params[0].node.get_field("description").and_then(Node::as_str),
            Some("operation level")
        );
    }

    #[test]
    fn style_and_explode_defaults() {
        let root = parse(
            br#"
paths:
  /q:
    get:
      parameters:
        - {name: a, in: query}
        - {name: b, in: header}
        - {name: c, in: query, style: spaceDelimited}
        - {name: d, in: path, explode: true}
"#,
        )
        .expect("parse");
        let doc = Document::new(&root).expect("document");
        let params = doc.paths()[0].operations()[0].parameters(&doc);

        assert_eq!((params[0].style(), params[0].explode()), ("form", true));
        assert_eq!((params[1].style(), params[1].explode()), ("simple", false));
        assert_eq!((params[2].style(), params[2].explode()), ("spaceDelimited", false));
        assert!(params[3].explode());
        assert!(params[3].required());
        assert!(!params[0].required());
    }
}
