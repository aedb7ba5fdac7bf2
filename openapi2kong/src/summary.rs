use serde::Serialize;
use yaml_tree_core::Node;

/// Entity counts of a generated configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    pub services: usize,
    pub routes: usize,
    pub plugins: usize,
    pub upstreams: usize,
}

pub fn summarize(config: &Node) -> ConversionSummary {
    ConversionSummary {
        services: count(config, "services"),
        routes: count(config, "routes"),
        plugins: count(config, "plugins"),
        upstreams: count(config, "upstreams"),
    }
}

pub fn render(summary: ConversionSummary) -> String {
    format!(
        "convert_summary services={} routes={} plugins={} upstreams={}",
        summary.services, summary.routes, summary.plugins, summary.upstreams
    )
}

fn count(config: &Node, key: &str) -> usize {
    if !config.is_mapping() {
        return 0;
    }
    config
        .get_field(key)
        .and_then(Node::as_sequence)
        .map(<[Node]>::len)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use yaml_tree_core::parse;

    use super::{render, summarize};

    #[test]
    fn counts_entity_lists() {
        let config = parse(b"services: [{}, {}]\nroutes: [{}]\nplugins: []\n").expect("parse");
        assert_eq!(
            render(summarize(&config)),
            "convert_summary services=2 routes=1 plugins=0 upstreams=0"
        );
    }
}
