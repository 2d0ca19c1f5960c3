//! `proxy_pass <url>`

use super::Directive;
use async_trait::async_trait;
use http::Uri;
use pinginx_core::processor::require_params;
use pinginx_core::{
    DirectiveError, ForwardTarget, Location, OrderingClass, Processor, Reply, RequestInfo, Signal,
};
use std::time::Duration;

/// Bound on connecting to, reading from and writing to an upstream
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Hands the request over to an upstream server
#[derive(Debug, Default)]
pub struct ProxyPass {
    upstream: Option<Upstream>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Upstream {
    tls: bool,
    authority: String,
    host: String,
    port: u16,
    /// Path given in the URL; `None` forwards the request URI unchanged
    path: Option<String>,
}

impl Directive for ProxyPass {
    const NAMES: &'static [&'static str] = &["proxy_pass"];
}

fn parse_upstream(url: &str) -> Result<Upstream, String> {
    let uri: Uri = url.parse().map_err(|e: http::uri::InvalidUri| e.to_string())?;

    let tls = match uri.scheme_str() {
        Some("http") => false,
        Some("https") => true,
        Some(other) => return Err(format!("unsupported scheme \"{}\"", other)),
        None => return Err("missing scheme".to_string()),
    };

    let authority = uri.authority().ok_or("missing host")?;
    if authority.host().is_empty() {
        return Err("missing host".to_string());
    }

    // `Uri` reports "/" for both `http://b` and `http://b/`
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = after_scheme.contains('/').then(|| uri.path().to_string());

    Ok(Upstream {
        tls,
        authority: authority.as_str().to_string(),
        host: authority.host().to_string(),
        port: authority.port_u16().unwrap_or(if tls { 443 } else { 80 }),
        path,
    })
}

/// Join the unmatched part of a request path onto an upstream base path
fn join_path(base: &str, rest: &str) -> String {
    let rest = rest.trim_start_matches('/');
    let joined = if rest.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), rest)
    };

    if joined.starts_with('/') {
        joined
    } else {
        format!("/{}", joined)
    }
}

impl ProxyPass {
    /// Where a request routed through `location` is sent
    pub fn target(&self, location: &Location, request: &RequestInfo) -> Option<ForwardTarget> {
        let upstream = self.upstream.as_ref()?;

        let path = match &upstream.path {
            None => request.uri(),
            Some(base) => {
                let mut path = join_path(base, location.strip_prefix(&request.path));
                if let Some(query) = &request.query {
                    path.push('?');
                    path.push_str(query);
                }
                path
            }
        };

        Some(ForwardTarget {
            tls: upstream.tls,
            authority: upstream.authority.clone(),
            host: upstream.host.clone(),
            port: upstream.port,
            path,
            timeout: UPSTREAM_TIMEOUT,
        })
    }
}

#[async_trait]
impl Processor for ProxyPass {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn ordering(&self) -> OrderingClass {
        OrderingClass::Terminal
    }

    fn parse(&mut self, _: &str, directive: &str, params: &[String]) -> Result<(), DirectiveError> {
        require_params(directive, params, 1)?;
        let upstream = parse_upstream(&params[0]).map_err(|reason| DirectiveError::InvalidUrl {
            directive: directive.to_string(),
            url: params[0].clone(),
            reason,
        })?;
        self.upstream = Some(upstream);
        Ok(())
    }

    async fn execute(
        &self,
        location: &Location,
        reply: &mut Reply,
        request: &RequestInfo,
    ) -> Signal {
        match self.target(location, request) {
            Some(target) => {
                tracing::debug!(
                    "Forwarding {} to {}{}",
                    request.path,
                    target.authority,
                    target.path
                );
                reply.forward(target);
                Signal::Terminate
            }
            None => Signal::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proxy(url: &str) -> ProxyPass {
        let mut p = ProxyPass::default();
        p.parse("/", "proxy_pass", &[url.to_string()]).unwrap();
        p
    }

    fn target(url: &str, location: &str, request: &str) -> ForwardTarget {
        let location = Location::new(0, None, location).unwrap();
        proxy(url).target(&location, &RequestInfo::get(request)).unwrap()
    }

    #[test]
    fn test_path_rewrite() {
        let t = target("http://backend:9000/v1", "/api", "/api/users");
        assert_eq!(t.authority, "backend:9000");
        assert_eq!(t.host, "backend");
        assert_eq!(t.port, 9000);
        assert_eq!(t.path, "/v1/users");
        assert_eq!(t.timeout, Duration::from_secs(10));
        assert!(!t.tls);
    }

    #[test]
    fn test_no_path_keeps_request_uri() {
        let t = target("http://backend:9000", "/api", "/api/users?page=2");
        assert_eq!(t.path, "/api/users?page=2");
    }

    #[test]
    fn test_query_preserved() {
        let t = target("http://backend/v1/", "/api/", "/api/users?id=7");
        assert_eq!(t.path, "/v1/users?id=7");
        assert_eq!(t.port, 80);
    }

    #[test]
    fn test_root_path() {
        let t = target("https://backend/", "/api", "/api/users");
        assert_eq!(t.path, "/users");
        assert_eq!(t.port, 443);
        assert!(t.tls);

        let t = target("http://backend/v1/", "/api", "/api");
        assert_eq!(t.path, "/v1/");
    }

    #[test]
    fn test_invalid_url_is_fatal() {
        let mut p = ProxyPass::default();
        for url in ["backend:9000", "ftp://backend", "http://", "not a url"] {
            let err = p.parse("/", "proxy_pass", &[url.to_string()]).unwrap_err();
            assert!(err.is_fatal(), "{} should be rejected", url);
        }
    }

    #[test]
    fn test_missing_url_is_not_fatal() {
        let mut p = ProxyPass::default();
        assert!(!p.parse("/", "proxy_pass", &[]).unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_execute_forwards() {
        let p = proxy("http://backend:9000/v1");
        let location = Location::new(0, None, "/api").unwrap();
        let mut reply = Reply::new();

        let signal = p.execute(&location, &mut reply, &RequestInfo::get("/api/users")).await;
        assert_eq!(signal, Signal::Terminate);
        assert_eq!(reply.forward_target().unwrap().path, "/v1/users");
        assert!(!reply.is_untouched());
    }
}
