//! Virtual host dispatch
//!
//! Servers sharing a listen port are grouped into one [`VirtualHosts`]
//! container which picks a server by the request's host name, in nginx
//! order: exact name, longest `*.suffix`, longest `prefix.*`, first
//! matching regular expression, then the default server.

use crate::config::{DEFAULT_SERVER_NAME, ServerDefinition};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Servers listening on one port
#[derive(Debug, Default)]
pub struct VirtualHosts {
    port: u16,
    servers: Vec<Arc<ServerDefinition>>,
    exact: HashMap<String, Arc<ServerDefinition>>,
    /// `*.example.org`, longest first
    leading_wildcards: Vec<(String, Arc<ServerDefinition>)>,
    /// `mail.*`, longest first
    trailing_wildcards: Vec<(String, Arc<ServerDefinition>)>,
    /// Non-wildcard names in registration order
    patterns: Vec<(Regex, Arc<ServerDefinition>)>,
    default: Option<Arc<ServerDefinition>>,
}

impl VirtualHosts {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Registered servers in registration order
    pub fn servers(&self) -> &[Arc<ServerDefinition>] {
        &self.servers
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Add a server and index its names.
    pub fn register(&mut self, server: ServerDefinition) {
        let server = Arc::new(server);

        for name in &server.server_names {
            let key = name.to_ascii_lowercase();
            if self.exact.contains_key(&key) {
                warn!(
                    "Duplicate server name '{}' on port {}, keeping the first",
                    name, self.port
                );
                continue;
            }
            self.exact.insert(key.clone(), server.clone());

            if let Some(suffix) = key.strip_prefix('*') {
                insert_longest_first(&mut self.leading_wildcards, suffix.to_string(), &server);
            } else if let Some(prefix) = key.strip_suffix('*') {
                insert_longest_first(&mut self.trailing_wildcards, prefix.to_string(), &server);
            } else if !key.is_empty() {
                let source = name.strip_prefix('~').unwrap_or(name);
                match Regex::new(&format!("(?i){}", source)) {
                    Ok(pattern) => self.patterns.push((pattern, server.clone())),
                    Err(e) => debug!("Server name '{}' is not a usable pattern: {}", name, e),
                }
            }
        }

        let is_default = server.default_server
            || server.server_names.iter().any(|n| n == DEFAULT_SERVER_NAME);
        if self.default.is_none() && is_default {
            self.default = Some(server.clone());
        }

        self.servers.push(server);
    }

    /// Pick the server for a `Host` value. `None` only if nothing is registered.
    pub fn dispatch(&self, host: &str) -> Option<Arc<ServerDefinition>> {
        let host = super::request::strip_port(host).to_ascii_lowercase();

        if let Some(server) = self.exact.get(&host) {
            return Some(server.clone());
        }

        let wildcard = self
            .leading_wildcards
            .iter()
            .find(|(suffix, _)| host.ends_with(suffix.as_str()))
            .or_else(|| {
                self.trailing_wildcards
                    .iter()
                    .find(|(prefix, _)| host.starts_with(prefix.as_str()))
            });
        if let Some((_, server)) = wildcard {
            return Some(server.clone());
        }

        if let Some((_, server)) = self.patterns.iter().find(|(p, _)| p.is_match(&host)) {
            return Some(server.clone());
        }

        self.default
            .clone()
            .or_else(|| self.servers.first().cloned())
    }
}

/// Stable insert keeping the list sorted by descending key length
fn insert_longest_first(
    list: &mut Vec<(String, Arc<ServerDefinition>)>,
    key: String,
    server: &Arc<ServerDefinition>,
) {
    let at = list.partition_point(|(k, _)| k.len() >= key.len());
    list.insert(at, (key, server.clone()));
}

/// Every configured port and its virtual hosts
#[derive(Debug, Default)]
pub struct Listeners {
    ports: BTreeMap<u16, VirtualHosts>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group servers by listen port
    pub fn from_servers(servers: impl IntoIterator<Item = ServerDefinition>) -> Self {
        let mut listeners = Self::new();
        for server in servers {
            listeners.register(server);
        }
        listeners
    }

    pub fn register(&mut self, server: ServerDefinition) {
        let port = server.listen_port;
        self.ports
            .entry(port)
            .or_insert_with(|| VirtualHosts::new(port))
            .register(server);
    }

    pub fn get(&self, port: u16) -> Option<&VirtualHosts> {
        self.ports.get(&port)
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// Ports in ascending order
    pub fn ports(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.keys().copied()
    }

    pub fn into_hosts(self) -> impl Iterator<Item = VirtualHosts> {
        self.ports.into_values()
    }
}
