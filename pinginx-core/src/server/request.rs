//! Request view handed to processors

use http::{Method, Uri, Version};

/// The parts of an incoming request the routing core looks at
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    /// Raw `Host` header (or URI authority), port included
    pub host: Option<String>,
    pub version: Version,
}

impl RequestInfo {
    /// Build from a request line's method, target and version
    pub fn new(method: Method, uri: &Uri, version: Version) -> Self {
        let path = match uri.path() {
            "" => "/".to_string(),
            p => p.to_string(),
        };

        Self {
            method,
            path,
            query: uri.query().map(str::to_string),
            host: uri.authority().map(|a| a.to_string()),
            version,
        }
    }

    /// A `GET` for the given target, mostly useful in tests
    pub fn get(target: &str) -> Self {
        let uri = target.parse::<Uri>().unwrap_or_else(|_| Uri::from_static("/"));
        Self::new(Method::GET, &uri, Version::HTTP_11)
    }

    /// Set the host the request was addressed to
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Request target: path plus query string
    pub fn uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// The raw request line, e.g. `GET /index.html HTTP/1.1`
    pub fn request_line(&self) -> String {
        format!("{} {} {:?}", self.method, self.uri(), self.version)
    }

    /// Host name without port, lower-cased
    pub fn host_name(&self) -> String {
        self.host
            .as_deref()
            .map(strip_port)
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

/// Strip a `:port` suffix from a host, keeping IPv6 literals intact
pub fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }

    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
