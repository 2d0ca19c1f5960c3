//! Pinginx HTTP listener implementation using Pingora
//!
//! 🌐 One [`PinginxProxy`] serves one port. Requests are routed in
//! `request_filter`; replies are written there directly, forwards continue
//! through Pingora's upstream phases.

use crate::route::route;
use async_trait::async_trait;
use http::{HeaderMap, Uri};
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::{Error, ErrorType, Result as PingoraResult};
use pingora_http::{RequestHeader, ResponseHeader};
use pingora_proxy::{ProxyHttp, Session};
use pinginx_core::{ForwardTarget, Reply, RequestInfo, VirtualHosts};
use std::sync::Arc;
use std::time::Instant;

/// Value of the `Server` response header
const SERVER_HEADER: &str = "pinginx";

/// Context for each request
pub struct RequestCtx {
    /// Upstream chosen by `proxy_pass`
    pub forward: Option<ForwardTarget>,
    /// Headers set by processors, applied to the upstream response
    pub headers: HeaderMap,
    /// Start time for logging
    pub start_time: Instant,
}

impl Default for RequestCtx {
    fn default() -> Self {
        Self {
            forward: None,
            headers: HeaderMap::new(),
            start_time: Instant::now(),
        }
    }
}

/// Pingora proxy logic for the virtual hosts of one port
#[derive(Clone)]
pub struct PinginxProxy {
    hosts: Arc<VirtualHosts>,
}

impl PinginxProxy {
    pub fn new(hosts: VirtualHosts) -> Self {
        Self {
            hosts: Arc::new(hosts),
        }
    }

    pub fn hosts(&self) -> &VirtualHosts {
        &self.hosts
    }

    /// Build the routing view of the downstream request
    fn request_info(session: &Session) -> RequestInfo {
        let req = session.req_header();
        let mut info = RequestInfo::new(req.method.clone(), &req.uri, req.version);
        if let Some(host) = req.headers.get("Host").and_then(|v| v.to_str().ok()) {
            info.host = Some(host.to_string());
        }
        info
    }

    /// Write a locally produced reply downstream
    async fn write_reply(session: &mut Session, reply: Reply) -> PingoraResult<()> {
        let (status, headers, body) = reply.into_parts();

        let mut header = ResponseHeader::build(status.as_u16(), Some(headers.len() + 3))?;
        for (name, value) in headers.iter() {
            header.append_header(name.clone(), value.clone())?;
        }
        header.insert_header("Content-Length", body.len().to_string())?;
        header.insert_header("Server", SERVER_HEADER)?;

        let head_only = session.req_header().method == http::Method::HEAD || body.is_empty();
        session.write_response_header(Box::new(header), head_only).await?;
        if !head_only {
            session.write_response_body(Some(body), true).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ProxyHttp for PinginxProxy {
    type CTX = RequestCtx;

    fn new_ctx(&self) -> Self::CTX {
        RequestCtx::default()
    }

    /// Route the request; answer it here unless it is forwarded
    async fn request_filter(
        &self,
        session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> PingoraResult<bool> {
        let request = Self::request_info(session);
        let mut reply = route(&self.hosts, &request).await;

        if let Some(target) = reply.forward_target().cloned() {
            ctx.headers = std::mem::take(&mut reply).into_parts().1;
            ctx.forward = Some(target);
            return Ok(false);
        }

        tracing::debug!(
            status = reply.status().as_u16(),
            elapsed_ms = ctx.start_time.elapsed().as_millis(),
            "{} {}",
            request.method,
            request.uri()
        );
        Self::write_reply(session, reply).await?;
        Ok(true)
    }

    /// Called for each forwarded request to determine the upstream
    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> PingoraResult<Box<HttpPeer>>
    where
        Self::CTX: Send + Sync,
    {
        let Some(target) = &ctx.forward else {
            return Err(Error::new(ErrorType::ConnectNoRoute));
        };

        let mut peer = HttpPeer::new(
            (target.host.as_str(), target.port),
            target.tls,
            target.host.clone(),
        );
        peer.options.connection_timeout = Some(target.timeout);
        peer.options.total_connection_timeout = Some(target.timeout);
        peer.options.read_timeout = Some(target.timeout);
        peer.options.write_timeout = Some(target.timeout);

        Ok(Box::new(peer))
    }

    /// Rewrite the request target and `Host` for the upstream
    async fn upstream_request_filter(
        &self,
        _session: &mut Session,
        upstream_request: &mut RequestHeader,
        ctx: &mut Self::CTX,
    ) -> PingoraResult<()>
    where
        Self::CTX: Send + Sync,
    {
        let Some(target) = &ctx.forward else {
            return Ok(());
        };

        let uri: Uri = target
            .path
            .parse()
            .map_err(|e| Error::because(ErrorType::InvalidHTTPHeader, "invalid upstream path", e))?;
        upstream_request.set_uri(uri);
        upstream_request.insert_header("Host", target.authority.as_str())?;

        Ok(())
    }

    /// Add headers set by processors that the upstream did not send
    async fn response_filter(
        &self,
        _session: &mut Session,
        upstream_response: &mut ResponseHeader,
        ctx: &mut Self::CTX,
    ) -> PingoraResult<()>
    where
        Self::CTX: Send + Sync,
    {
        fill_missing_headers(upstream_response, &ctx.headers)?;

        tracing::debug!(
            upstream = ?ctx.forward.as_ref().map(|t| &t.authority),
            status = upstream_response.status.as_u16(),
            elapsed_ms = ctx.start_time.elapsed().as_millis(),
            "✅ Request forwarded"
        );

        Ok(())
    }

    /// Called on errors
    fn error_while_proxy(
        &self,
        peer: &HttpPeer,
        _session: &mut Session,
        e: Box<Error>,
        ctx: &mut Self::CTX,
        _client_reused: bool,
    ) -> Box<Error> {
        tracing::error!(
            peer = %peer,
            elapsed_ms = ctx.start_time.elapsed().as_millis(),
            error = %e,
            "❌ Proxy error"
        );
        e
    }
}

/// Copy `headers` into `response`, keeping any header it already carries
fn fill_missing_headers(response: &mut ResponseHeader, headers: &HeaderMap) -> PingoraResult<()> {
    for (name, value) in headers.iter() {
        if !response.headers.contains_key(name) {
            response.insert_header(name.clone(), value.clone())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, HeaderValue};

    #[test]
    fn test_upstream_headers_win() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-served-by", HeaderValue::from_static("pinginx"));

        let mut response = ResponseHeader::build(200, None).unwrap();
        response.insert_header("Content-Type", "text/html").unwrap();
        fill_missing_headers(&mut response, &headers).unwrap();

        assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), "text/html");
        assert_eq!(response.headers.get("x-served-by").unwrap(), "pinginx");
    }

    #[test]
    fn test_missing_content_type_is_filled() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut response = ResponseHeader::build(200, None).unwrap();
        fill_missing_headers(&mut response, &headers).unwrap();

        assert_eq!(response.headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }
}
