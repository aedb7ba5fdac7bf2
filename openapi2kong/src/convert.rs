//! OpenAPI to Kong conversion orchestration.
//!
//! ## Pipeline
//!
//! 1. **Decode** — parse the input bytes into a document tree
//! 2. **View** — wrap the tree in a read-only [`Document`]
//! 3. **Document service** — build the service for the document servers,
//!    with its upstream and document level plugins
//! 4. **Routes** — for every path (document order) and method (canonical
//!    order) resolve the owning service, then build the route, its plugins
//!    and its request validator
//! 5. **Assemble** — collect services, routes, plugins and upstreams into one
//!    declarative configuration, in build order
//!
//! A path item or operation declaring its own `servers` or
//! `x-kong-service-defaults` gets a service of its own, built when its first
//! route needs it. Extensions at the nearest level win as a whole.
//!
//! Service and route names are unique within a run: a name that is already
//! taken gets a `_2`, `_3`, ... suffix in build order, so distinct templates
//! that slugify alike still get their own ids.

use std::collections::HashSet;

use yaml_tree_core::{parse, Node};

use crate::entity::plugin::{merge_plugin_extensions, VALIDATOR_PLUGIN};
use crate::entity::route::route_name;
use crate::entity::{slugify, EntityBuilder, PluginOwner, ServiceDefaults, ServiceEntity};
use crate::error::ConvertError;
use crate::openapi::{Document, Extensions, Operation, PathItem, Server};
use crate::options::ConversionOptions;

/// `_format_version` written into every generated configuration.
pub const FORMAT_VERSION: &str = "3.0";

/// Name used when a document has neither `x-kong-name` nor `info.title`.
const FALLBACK_NAME: &str = "openapi";

/// Convert OpenAPI document bytes (YAML or JSON) into a Kong declarative
/// configuration tree.
pub fn convert(input: &[u8], options: &ConversionOptions) -> Result<Node, ConvertError> {
    let root = parse(input)?;
    convert_tree(&root, options)
}

/// Convert an already parsed OpenAPI tree.
pub fn convert_tree(root: &Node, options: &ConversionOptions) -> Result<Node, ConvertError> {
    let doc = Document::new(root)?;
    let mut run = Conversion::new(doc, options)?;
    for path in doc.paths() {
        run.add_path(path)?;
    }
    run.finish()
}

/// Servers and service extensions in effect at one level of the document.
#[derive(Debug, Clone)]
struct Scope<'a> {
    servers: Vec<Server<'a>>,
    defaults: ServiceDefaults<'a>,
}

impl<'a> Scope<'a> {
    /// The scope for a nested level, or `None` if it declares nothing that
    /// would need a service of its own.
    fn nested(
        &self,
        servers: Option<Vec<Server<'a>>>,
        extensions: &Extensions<'a>,
    ) -> Option<Scope<'a>> {
        let service = extensions.get("service-defaults");
        if servers.is_none() && service.is_none() {
            return None;
        }
        Some(Scope {
            servers: servers.unwrap_or_else(|| self.servers.clone()),
            defaults: ServiceDefaults {
                service: service.or(self.defaults.service),
                upstream: extensions.get("upstream-defaults").or(self.defaults.upstream),
            },
        })
    }
}

/// Entity names handed out so far for one entity kind.
#[derive(Debug, Default)]
struct Names {
    used: HashSet<String>,
}

impl Names {
    /// `name` itself, or `name_<n>` with the smallest free `n >= 2`.
    fn claim(&mut self, name: String) -> String {
        if self.used.insert(name.clone()) {
            return name;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{name}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Accumulated state of one conversion run.
struct Conversion<'a, 'o> {
    doc: Document<'a>,
    builder: EntityBuilder<'o>,
    base_name: String,
    service_names: Names,
    route_names: Names,
    doc_scope: Scope<'a>,
    doc_service: ServiceEntity,
    services: Vec<Node>,
    routes: Vec<Node>,
    plugins: Vec<Node>,
    upstreams: Vec<Node>,
}

impl<'a, 'o> Conversion<'a, 'o> {
    fn new(doc: Document<'a>, options: &'o ConversionOptions) -> Result<Self, ConvertError> {
        let builder = EntityBuilder::new(options);
        let base_name = document_name(&doc);
        let mut service_names = Names::default();
        service_names.claim(base_name.clone());
        let extensions = doc.extensions();
        let doc_scope = Scope {
            servers: doc.servers()?.unwrap_or_default(),
            defaults: ServiceDefaults {
                service: extensions.get("service-defaults"),
                upstream: extensions.get("upstream-defaults"),
            },
        };
        let doc_service =
            builder.build_service(&base_name, &doc_scope.servers, doc_scope.defaults)?;

        let mut run = Self {
            doc,
            builder,
            base_name,
            service_names,
            route_names: Names::default(),
            doc_scope,
            doc_service: doc_service.clone(),
            services: Vec::new(),
            routes: Vec::new(),
            plugins: Vec::new(),
            upstreams: Vec::new(),
        };
        run.push_service(doc_service)?;
        Ok(run)
    }

    /// Record a service with its upstream and the document level plugins.
    fn push_service(&mut self, service: ServiceEntity) -> Result<(), ConvertError> {
        let owner = PluginOwner::Service {
            name: &service.name,
            id: &service.id,
        };
        for (plugin_name, extension) in self.doc.extensions().plugins() {
            if plugin_name != VALIDATOR_PLUGIN {
                self.plugins
                    .push(self.builder.build_plugin(plugin_name, extension, owner)?);
            }
        }
        if let Some(upstream) = &service.upstream {
            self.upstreams.push(upstream.clone());
        }
        self.services.push(service.node);
        Ok(())
    }

    fn add_path(&mut self, path: PathItem<'a>) -> Result<(), ConvertError> {
        let path_scope = self.doc_scope.nested(path.servers()?, &path.extensions());
        let mut path_service: Option<ServiceEntity> = None;

        for operation in path.operations() {
            let name = self.route_names.claim(route_name(&self.base_name, &operation));
            let scope = path_scope.as_ref().unwrap_or(&self.doc_scope);

            let service = match scope.nested(operation.servers()?, &operation.extensions()) {
                Some(op_scope) => {
                    let service_name = self.service_names.claim(name.clone());
                    let service = self.builder.build_service(
                        &service_name,
                        &op_scope.servers,
                        op_scope.defaults,
                    )?;
                    self.push_service(service.clone())?;
                    service
                }
                None => match &path_scope {
                    None => self.doc_service.clone(),
                    Some(path_scope) => {
                        if let Some(existing) = &path_service {
                            existing.clone()
                        } else {
                            let service_name = self
                                .service_names
                                .claim(path_service_name(&self.base_name, &path));
                            let service = self.builder.build_service(
                                &service_name,
                                &path_scope.servers,
                                path_scope.defaults,
                            )?;
                            self.push_service(service.clone())?;
                            path_service = Some(service.clone());
                            service
                        }
                    }
                },
            };

            self.add_operation(&name, &operation, &service)?;
        }
        Ok(())
    }

    fn add_operation(
        &mut self,
        name: &str,
        operation: &Operation<'a>,
        service: &ServiceEntity,
    ) -> Result<(), ConvertError> {
        let doc_ext = self.doc.extensions();
        let path_ext = operation.path.extensions();
        let op_ext = operation.extensions();
        let parameters = operation.parameters(&self.doc);

        let route_defaults = op_ext
            .get("route-defaults")
            .or_else(|| path_ext.get("route-defaults"))
            .or_else(|| doc_ext.get("route-defaults"));
        let route =
            self.builder
                .build_route(name, operation, &parameters, service, route_defaults)?;
        let owner = PluginOwner::Route {
            name: &route.name,
            id: &route.id,
        };

        let mut plugins = Vec::new();
        for (plugin_name, extension) in merge_plugin_extensions(path_ext.plugins(), op_ext.plugins())
        {
            if plugin_name != VALIDATOR_PLUGIN {
                plugins.push(self.builder.build_plugin(plugin_name, extension, owner)?);
            }
        }

        let validator = op_ext
            .plugin(VALIDATOR_PLUGIN)
            .or_else(|| path_ext.plugin(VALIDATOR_PLUGIN))
            .or_else(|| doc_ext.plugin(VALIDATOR_PLUGIN));
        if let Some(plugin) = self.builder.build_validator_plugin(
            &self.doc,
            operation,
            &parameters,
            validator,
            owner,
        )? {
            plugins.push(plugin);
        }

        self.routes.push(route.node);
        self.plugins.extend(plugins);
        Ok(())
    }

    fn finish(self) -> Result<Node, ConvertError> {
        let mut config = Node::new_mapping();
        config.set_field("_format_version", Some(Node::new_string(FORMAT_VERSION)));
        for (key, entities) in [
            ("services", self.services),
            ("routes", self.routes),
            ("plugins", self.plugins),
            ("upstreams", self.upstreams),
        ] {
            let mut list = Node::new_sequence();
            list.append(entities.into_iter().map(Some))?;
            config.set_field(key, Some(list));
        }
        Ok(config)
    }
}

/// Document service name: `x-kong-name`, else `info.title`, slugified.
fn document_name(doc: &Document<'_>) -> String {
    let name = doc
        .extensions()
        .name()
        .or_else(|| doc.title())
        .map(slugify)
        .unwrap_or_default();
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

fn path_service_name(base: &str, path: &PathItem<'_>) -> String {
    let suffix = slugify(path.extensions().name().unwrap_or(path.template));
    if suffix.is_empty() {
        format!("{base}_root")
    } else {
        format!("{base}_{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use yaml_tree_core::{parse, Node};

    use super::{convert, document_name, FALLBACK_NAME};
    use crate::error::ConvertError;
    use crate::openapi::Document;
    use crate::options::ConversionOptions;

    fn list<'a>(config: &'a Node, key: &str) -> &'a [Node] {
        config
            .get_field(key)
            .and_then(Node::as_sequence)
            .expect("entity list")
    }

    #[test]
    fn document_name_falls_back() {
        let root = parse(b"info: {title: 'My API!'}\n").expect("parse");
        assert_eq!(document_name(&Document::new(&root).expect("doc")), "my-api");

        let root = parse(b"info: {title: '???'}\n").expect("parse");
        assert_eq!(document_name(&Document::new(&root).expect("doc")), FALLBACK_NAME);
    }

    #[test]
    fn empty_document_yields_single_default_service() {
        let config = convert(b"openapi: 3.0.0\n", &ConversionOptions::default()).expect("convert");
        assert_eq!(list(&config, "services").len(), 1);
        assert!(list(&config, "routes").is_empty());
        assert_eq!(
            config.get_field("_format_version").and_then(Node::as_str),
            Some("3.0")
        );
    }

    #[test]
    fn path_servers_get_their_own_service() {
        let input = br#"
info: {title: shop}
servers:
  - url: https://api.example.com
paths:
  /a:
    get: {}
  /b:
    servers:
      - url: https://b.example.com
    get: {}
    post:
      servers:
        - url: https://post.example.com
"#;
        let config = convert(input, &ConversionOptions::default()).expect("convert");
        let services = list(&config, "services");
        let names: Vec<&str> = services
            .iter()
            .filter_map(|s| s.get_field("name").and_then(Node::as_str))
            .collect();
        assert_eq!(names, vec!["shop", "shop_b", "shop_b_post"]);

        let routes = list(&config, "routes");
        let service_of = |idx: usize| {
            routes[idx]
                .get_field("service")
                .and_then(|s| s.get_field("id"))
                .cloned()
        };
        assert_eq!(service_of(0), services[0].get_field("id").cloned());
        assert_eq!(service_of(1), services[1].get_field("id").cloned());
        assert_eq!(service_of(2), services[2].get_field("id").cloned());
    }

    #[test]
    fn document_plugins_attach_to_every_service() {
        let input = br#"
x-kong-plugin-cors:
  config: {origins: ["*"]}
paths:
  /a:
    x-kong-service-defaults: {retries: 1}
    get: {}
"#;
        let config = convert(input, &ConversionOptions::default()).expect("convert");
        let plugins = list(&config, "plugins");
        assert_eq!(plugins.len(), 2);
        assert!(plugins.iter().all(|p| p.get_field("service").is_some()));
        assert_eq!(
            list(&config, "services")[1].get_field("retries"),
            Some(&Node::new_int(1))
        );
    }

    #[test]
    fn templates_that_slugify_alike_get_distinct_routes() {
        let input = br#"
paths:
  /users/{id}:
    parameters:
      - {name: id, in: path}
    get: {}
  /users/id:
    get: {}
"#;
        let config = convert(input, &ConversionOptions::default()).expect("convert");
        let routes = list(&config, "routes");
        let names: Vec<&str> = routes
            .iter()
            .filter_map(|r| r.get_field("name").and_then(Node::as_str))
            .collect();
        assert_eq!(names, vec!["openapi_users-id_get", "openapi_users-id_get_2"]);
        assert_ne!(routes[0].get_field("id"), routes[1].get_field("id"));
    }

    #[test]
    fn colliding_path_services_are_suffixed() {
        let input = br#"
info: {title: shop}
paths:
  /a-b:
    servers: [{url: https://one.example.com}]
    get: {}
  /a/b:
    servers: [{url: https://two.example.com}]
    get: {}
  /c:
    get:
      x-kong-name: a-b
      x-kong-service-defaults: {retries: 2}
"#;
        let config = convert(input, &ConversionOptions::default()).expect("convert");
        let services = list(&config, "services");
        let names: Vec<&str> = services
            .iter()
            .filter_map(|s| s.get_field("name").and_then(Node::as_str))
            .collect();
        assert_eq!(names, vec!["shop", "shop_a-b", "shop_a-b_2", "shop_a-b_3"]);

        let ids: std::collections::HashSet<&str> = services
            .iter()
            .filter_map(|s| s.get_field("id").and_then(Node::as_str))
            .collect();
        assert_eq!(ids.len(), services.len());
    }

    #[test]
    fn unresolved_parameter_returns_no_output() {
        let input = b"paths:\n  /pets/{id}:\n    get: {}\n";
        let err = convert(input, &ConversionOptions::default()).expect_err("undeclared id");
        assert!(matches!(err, ConvertError::UnresolvedPathParameter { .. }));
    }

    #[test]
    fn malformed_paths_are_rejected() {
        let err = convert(b"paths: 3\n", &ConversionOptions::default()).expect_err("paths");
        assert!(matches!(err, ConvertError::MalformedDocument(_)));
    }
}
