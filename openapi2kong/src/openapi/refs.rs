//! Local `$ref` handling (`#/components/...` style JSON pointers).

use yaml_tree_core::Node;

use super::str_field;

/// Upper bound on chained references before giving up.
const MAX_REF_HOPS: usize = 32;

fn local_ref(node: &Node) -> Option<&str> {
    str_field(node, "$ref").filter(|reference| reference.starts_with('#'))
}

/// Resolve a `#/a/b` pointer against `root`.
pub fn resolve_pointer<'a>(root: &'a Node, reference: &str) -> Option<&'a Node> {
    let pointer = reference.strip_prefix('#')?;
    if pointer.is_empty() {
        return Some(root);
    }
    let pointer = pointer.strip_prefix('/')?;

    let mut current = root;
    for segment in pointer.split('/') {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Node::Mapping(_) => current.get_field(&segment)?,
            Node::Sequence(items) => items.get(segment.parse::<usize>().ok()?)?,
            Node::Scalar(_) => return None,
        };
    }
    Some(current)
}

/// Follow a chain of local references starting at `node`.
pub fn resolve<'a>(root: &'a Node, node: &'a Node) -> &'a Node {
    let mut current = node;
    for _ in 0..MAX_REF_HOPS {
        match local_ref(current).and_then(|reference| resolve_pointer(root, reference)) {
            Some(target) => current = target,
            None => break,
        }
    }
    current
}

/// Deep copy of `node` with every resolvable local reference inlined.
///
/// A reference that would expand into itself is kept as a `$ref` node.
pub fn dereference(root: &Node, node: &Node) -> Node {
    let mut active = Vec::new();
    expand(root, node, &mut active)
}

fn expand(root: &Node, node: &Node, active: &mut Vec<String>) -> Node {
    match node {
        Node::Mapping(pairs) => {
            if let Some(reference) = local_ref(node) {
                if active.iter().any(|seen| seen == reference) {
                    return node.clone();
                }
                let Some(target) = resolve_pointer(root, reference) else {
                    return node.clone();
                };
                active.push(reference.to_string());
                let expanded = expand(root, target, active);
                active.pop();
                return expanded;
            }
            Node::Mapping(
                pairs
                    .iter()
                    .map(|(key, value)| (key.clone(), expand(root, value, active)))
                    .collect(),
            )
        }
        Node::Sequence(items) => Node::Sequence(
            items
                .iter()
                .map(|item| expand(root, item, active))
                .collect(),
        ),
        Node::Scalar(_) => node.clone(),
    }
}
