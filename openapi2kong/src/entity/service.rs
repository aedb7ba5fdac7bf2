use yaml_tree_core::Node;

use super::{apply_overrides, EntityBuilder};
use crate::error::ConvertError;
use crate::openapi::servers::parse_server_url;
use crate::openapi::{Server, ServerTarget};

/// Service-scoped extension values in effect for one service.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceDefaults<'a> {
    /// `x-kong-service-defaults`
    pub service: Option<&'a Node>,
    /// `x-kong-upstream-defaults`
    pub upstream: Option<&'a Node>,
}

/// A built service together with the upstream it fronts, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceEntity {
    pub name: String,
    pub id: String,
    pub node: Node,
    pub upstream: Option<Node>,
}

impl EntityBuilder<'_> {
    /// Build the service for one set of servers.
    ///
    /// The first server provides protocol, host, port and path. With more
    /// than one server, or with `x-kong-upstream-defaults` in effect, an
    /// upstream carries one target per entry and the service points at the
    /// upstream by name.
    pub fn build_service(
        &self,
        name: &str,
        servers: &[Server<'_>],
        defaults: ServiceDefaults<'_>,
    ) -> Result<ServiceEntity, ConvertError> {
        let mut targets = servers
            .iter()
            .map(|server| parse_server_url(&server.url))
            .collect::<Result<Vec<_>, _>>()?;
        if targets.is_empty() {
            targets.push(ServerTarget::localhost());
        }
        let primary = &targets[0];

        let id = self.id(name, "service");
        let upstream = if targets.len() > 1 || defaults.upstream.is_some() {
            Some(self.build_upstream(&format!("{name}.upstream"), &targets, defaults.upstream)?)
        } else {
            None
        };
        let host = match &upstream {
            Some(upstream) => upstream
                .get_field("name")
                .cloned()
                .unwrap_or_else(|| Node::new_string(&primary.host)),
            None => Node::new_string(&primary.host),
        };

        let mut node = Node::new_mapping();
        node.set_field("id", Some(Node::new_string(&id)));
        node.set_field("name", Some(Node::new_string(name)));
        node.set_field("protocol", Some(Node::new_string(&primary.protocol)));
        node.set_field("host", Some(host));
        node.set_field("port", Some(Node::from(primary.port)));
        node.set_field("path", Some(Node::new_string(&primary.path)));
        apply_overrides(&mut node, defaults.service, "x-kong-service-defaults")?;
        self.apply_tags(&mut node)?;

        Ok(ServiceEntity {
            name: name.to_string(),
            id,
            node,
            upstream,
        })
    }

    /// Build an upstream with one `host:port` target per server, duplicates
    /// included.
    pub fn build_upstream(
        &self,
        name: &str,
        targets: &[ServerTarget],
        defaults: Option<&Node>,
    ) -> Result<Node, ConvertError> {
        let mut target_list = Node::new_sequence();
        target_list.append(targets.iter().map(|target| {
            let mut entry = Node::new_mapping();
            entry.set_field("target", Some(Node::new_string(target.authority())));
            Some(entry)
        }))?;

        let mut node = Node::new_mapping();
        node.set_field("id", Some(Node::new_string(self.id(name, "upstream"))));
        node.set_field("name", Some(Node::new_string(name)));
        node.set_field("targets", Some(target_list));
        apply_overrides(&mut node, defaults, "x-kong-upstream-defaults")?;
        self.apply_tags(&mut node)?;
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use yaml_tree_core::{parse, Node};

    use super::ServiceDefaults;
    use crate::entity::EntityBuilder;
    use crate::openapi::servers::servers_at;
    use crate::options::ConversionOptions;

    #[test]
    fn single_server_service() {
        let root = parse(b"servers:\n  - url: https://api.example.com/v1\n").expect("parse");
        let servers = servers_at(&root).expect("servers").expect("declared");
        let options = ConversionOptions::default();
        let builder = EntityBuilder::new(&options);

        let service = builder
            .build_service("petstore", &servers, ServiceDefaults::default())
            .expect("service");

        assert!(service.upstream.is_none());
        let plain = serde_json::Value::Object(service.node.to_plain_object().expect("mapping"));
        assert_eq!(
            plain,
            json!({
                "id": builder.id("petstore", "service"),
                "name": "petstore",
                "protocol": "https",
                "host": "api.example.com",
                "port": 443,
                "path": "/v1",
            })
        );
    }

    #[test]
    fn no_servers_defaults_to_localhost() {
        let options = ConversionOptions::default();
        let builder = EntityBuilder::new(&options);
        let service = builder
            .build_service("svc", &[], ServiceDefaults::default())
            .expect("service");
        assert_eq!(service.node.get_field("host").and_then(Node::as_str), Some("localhost"));
        assert_eq!(service.node.get_field("port"), Some(&Node::new_int(443)));
    }

    #[test]
    fn multiple_servers_build_upstream() {
        let root = parse(
            br#"
servers:
  - url: https://one.example.com/api
  - url: https://two.example.com:8443/api
  - url: https://one.example.com/api
"#,
        )
        .expect("parse");
        let servers = servers_at(&root).expect("servers").expect("declared");
        let options = ConversionOptions::default().with_tags(["t"]);
        let builder = EntityBuilder::new(&options);

        let service = builder
            .build_service("svc", &servers, ServiceDefaults::default())
            .expect("service");

        assert_eq!(
            service.node.get_field("host").and_then(Node::as_str),
            Some("svc.upstream")
        );
        let upstream = service.upstream.expect("upstream");
        let targets = upstream
            .get_field("targets")
            .expect("targets")
            .to_plain_array()
            .expect("sequence");
        assert_eq!(
            targets,
            vec![
                json!({"target": "one.example.com:443"}),
                json!({"target": "two.example.com:8443"}),
                json!({"target": "one.example.com:443"}),
            ]
        );
        assert_eq!(upstream.get_field("tags"), Some(&Node::string_sequence(["t"])));
    }

    #[test]
    fn upstream_defaults_build_upstream_for_single_server() {
        let root = parse(
            br#"
servers:
  - url: https://api.example.com
x-kong-upstream-defaults:
  algorithm: least-connections
"#,
        )
        .expect("parse");
        let servers = servers_at(&root).expect("servers").expect("declared");
        let options = ConversionOptions::default();
        let builder = EntityBuilder::new(&options);
        let defaults = ServiceDefaults {
            service: None,
            upstream: root.get_field("x-kong-upstream-defaults"),
        };

        let service = builder.build_service("svc", &servers, defaults).expect("service");
        assert_eq!(
            service.node.get_field("host").and_then(Node::as_str),
            Some("svc.upstream")
        );
        let upstream = service.upstream.expect("upstream");
        assert_eq!(
            upstream.get_field("algorithm").and_then(Node::as_str),
            Some("least-connections")
        );
        assert_eq!(
            upstream.get_field("targets").expect("targets").to_plain_array().expect("sequence"),
            vec![json!({"target": "api.example.com:443"})]
        );
    }

    #[test]
    fn service_defaults_override_field_by_field() {
        let root = parse(
            br#"
servers:
  - url: http://backend.internal
x-kong-service-defaults:
  port: 9000
  retries: 3
  tags: [from-extension]
"#,
        )
        .expect("parse");
        let servers = servers_at(&root).expect("servers").expect("declared");
        let options = ConversionOptions::default().with_tags(["a", "b"]);
        let builder = EntityBuilder::new(&options);

        let defaults = ServiceDefaults {
            service: root.get_field("x-kong-service-defaults"),
            upstream: None,
        };
        let service = builder.build_service("svc", &servers, defaults).expect("service");

        assert_eq!(service.node.get_field("port"), Some(&Node::new_int(9000)));
        assert_eq!(service.node.get_field("protocol").and_then(Node::as_str), Some("http"));
        assert_eq!(service.node.get_field("retries"), Some(&Node::new_int(3)));
        assert_eq!(
            service.node.get_field("tags"),
            Some(&Node::string_sequence(["from-extension", "a", "b"]))
        );
    }
}
