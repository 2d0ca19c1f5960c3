//! Request-scoped response state
//!
//! Processors never touch the connection directly. They write into a
//! [`Reply`], which the listener then turns into a downstream response or,
//! when a processor asked for it, into an upstream request.

use crate::error::Result;
use bytes::{Bytes, BytesMut};
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue, LOCATION};
use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// Upstream a request should be relayed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardTarget {
    /// Connect with TLS (`https://` targets)
    pub tls: bool,
    /// `host[:port]` exactly as configured
    pub authority: String,
    pub host: String,
    pub port: u16,
    /// Path and query sent upstream
    pub path: String,
    /// Bound on connecting to and reading from the upstream
    pub timeout: Duration,
}

/// Response being built for one request
#[derive(Debug, Default)]
pub struct Reply {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: BytesMut,
    forward: Option<ForwardTarget>,
}

impl Reply {
    /// Create an empty reply
    pub fn new() -> Self {
        Self::default()
    }

    /// Status to send; `200 OK` unless a processor set one
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Set (replace) a response header
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<()> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Set a header only if no processor set it before
    pub fn set_default_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.entry(name).or_insert(value);
    }

    /// Header value as text, if set and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Append bytes to the body
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.body.extend_from_slice(data.as_ref());
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replace the body
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = BytesMut::from(body.into());
    }

    /// Answer with a redirect to `location`
    pub fn redirect(&mut self, location: &str, status: StatusCode) -> Result<()> {
        self.set_status(status);
        self.headers.insert(LOCATION, HeaderValue::from_str(location)?);
        Ok(())
    }

    /// Answer with `404 Not Found`
    pub fn not_found(&mut self) {
        self.set_status(StatusCode::NOT_FOUND);
        self.set_default_header(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.set_body(Bytes::from_static(b"404 page not found\n"));
    }

    /// Hand the request over to an upstream
    pub fn forward(&mut self, target: ForwardTarget) {
        self.forward = Some(target);
    }

    pub fn forward_target(&self) -> Option<&ForwardTarget> {
        self.forward.as_ref()
    }

    /// True if no processor produced a status, a body or a forward
    pub fn is_untouched(&self) -> bool {
        self.status.is_none() && self.body.is_empty() && self.forward.is_none()
    }

    /// Split into status, headers and body
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        let status = self.status();
        (status, self.headers, self.body.freeze())
    }
}
