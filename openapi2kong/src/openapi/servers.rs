use url::Url;
use yaml_tree_core::{Node, Scalar};

use super::{field, str_field};
use crate::error::ConvertError;

/// One `servers` entry with its URL variables already substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct Server<'a> {
    pub url: String,
    pub node: &'a Node,
}

/// The parts of a server URL a Kong service is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerTarget {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl ServerTarget {
    /// Target used when a document declares no servers.
    pub fn localhost() -> Self {
        Self {
            protocol: "https".to_string(),
            host: "localhost".to_string(),
            port: 443,
            path: "/".to_string(),
        }
    }

    /// `host:port`, as used for upstream targets.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read the `servers` list of a document, path item or operation.
///
/// Returns `None` when the list is absent or empty so callers inherit the
/// enclosing level's servers.
pub fn servers_at(node: &Node) -> Result<Option<Vec<Server<'_>>>, ConvertError> {
    let Some(list) = field(node, "servers") else {
        return Ok(None);
    };
    let Some(entries) = list.as_sequence() else {
        return Err(ConvertError::MalformedDocument(format!(
            "'servers' must be a sequence, found {}",
            list.kind()
        )));
    };

    let mut servers = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(url) = str_field(entry, "url") else {
            return Err(ConvertError::MalformedDocument(
                "server entry without a string 'url'".to_string(),
            ));
        };
        servers.push(Server {
            url: substitute_variables(url, field(entry, "variables")),
            node: entry,
        });
    }
    Ok(if servers.is_empty() { None } else { Some(servers) })
}

/// Replace `{name}` placeholders with the variable's `default`.
///
/// Placeholders without a default are left in place.
fn substitute_variables(url: &str, variables: Option<&Node>) -> String {
    let Some(variables) = variables.filter(|v| v.is_mapping()) else {
        return url.to_string();
    };

    let mut out = String::with_capacity(url.len());
    let mut rest = url;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        let name = &rest[start + 1..start + len];
        out.push_str(&rest[..start]);
        match field(variables, name).and_then(|var| field(var, "default")) {
            Some(Node::Scalar(Scalar::String(value))) => out.push_str(value),
            Some(Node::Scalar(Scalar::Number(value))) => out.push_str(&value.to_string()),
            _ => out.push_str(&rest[start..=start + len]),
        }
        rest = &rest[start + len + 1..];
    }
    out.push_str(rest);
    out
}

/// Split a server URL into protocol, host, port and path.
///
/// Relative URLs (`/v1`) are served from `localhost`, and URLs without a
/// scheme are read as `https`. Schemes without a known default port get 80
/// when plaintext (`http`, `ws`, `grpc`, `tcp`, `udp`) and 443 otherwise. An
/// empty path becomes `/`.
pub fn parse_server_url(raw: &str) -> Result<ServerTarget, ConvertError> {
    if raw.is_empty() || raw.starts_with('/') {
        let mut target = ServerTarget::localhost();
        if !raw.is_empty() {
            target.path = raw.to_string();
        }
        return Ok(target);
    }

    let url = match Url::parse(raw) {
        Ok(url) if url.has_host() => url,
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{raw}"))
            .map_err(|err| invalid(raw, err.to_string()))?,
        Err(err) => return Err(invalid(raw, err.to_string())),
    };

    let host = url
        .host_str()
        .filter(|host| !host.is_empty())
        .ok_or_else(|| invalid(raw, "missing host".to_string()))?;
    let port = url
        .port_or_known_default()
        .unwrap_or_else(|| default_port(url.scheme()));
    let path = match url.path() {
        "" => "/",
        path => path,
    };

    Ok(ServerTarget {
        protocol: url.scheme().to_string(),
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "http" | "ws" | "grpc" | "tcp" | "udp" => 80,
        _ => 443,
    }
}

fn invalid(url: &str, reason: String) -> ConvertError {
    ConvertError::InvalidServer {
        url: url.to_string(),
        reason,
    }
}
