//! `index`, `root` and `alias`: file serving

use super::Directive;
use async_trait::async_trait;
use http::header::{CONTENT_TYPE, HeaderValue, LAST_MODIFIED};
use http::StatusCode;
use pinginx_core::processor::require_params;
use pinginx_core::{DirectiveError, Location, OrderingClass, Processor, Reply, RequestInfo, Signal};
use pinginx_static::{FileServer, WELCOME_CONTENT_TYPE, WELCOME_PAGE};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Serves files below `root` or `alias`, the working directory otherwise
#[derive(Debug, Default)]
pub struct Index {
    index: Option<String>,
    root: Option<PathBuf>,
    alias: Option<PathBuf>,
}

impl Directive for Index {
    const NAMES: &'static [&'static str] = &["index", "root", "alias"];
}

impl Index {
    /// File server and the path to look up below it
    fn locate<'a>(&self, location: &Location, request_path: &'a str) -> (FileServer, &'a str) {
        if let Some(root) = &self.root {
            (FileServer::new(root), request_path)
        } else if let Some(alias) = &self.alias {
            (FileServer::new(alias), location.strip_prefix(request_path))
        } else {
            (FileServer::new("."), request_path)
        }
    }

    /// Path a request would be served from
    pub fn resolve(&self, location: &Location, request_path: &str) -> PathBuf {
        let (server, path) = self.locate(location, request_path);
        server.resolve(path)
    }
}

#[async_trait]
impl Processor for Index {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn ordering(&self) -> OrderingClass {
        OrderingClass::Terminal
    }

    fn parse(&mut self, _: &str, directive: &str, params: &[String]) -> Result<(), DirectiveError> {
        require_params(directive, params, 1)?;
        let value = params[0].clone();
        match directive {
            "index" => self.index = Some(value),
            "root" => self.root = Some(PathBuf::from(value)),
            "alias" => self.alias = Some(PathBuf::from(value)),
            _ => {}
        }
        Ok(())
    }

    async fn execute(
        &self,
        location: &Location,
        reply: &mut Reply,
        request: &RequestInfo,
    ) -> Signal {
        let path = request.path.as_str();

        if let (true, Some(index)) = (path.ends_with('/'), &self.index) {
            let target = format!("{}{}", path, index.trim_start_matches('/'));
            if let Err(e) = reply.redirect(&target, StatusCode::FOUND) {
                warn!("Cannot redirect to index '{}': {}", target, e);
                reply.not_found();
            }
            return Signal::Terminate;
        }

        let (server, lookup) = self.locate(location, path);
        match server.serve(lookup).await {
            Ok(Some(file)) => {
                debug!("Serving {:?} for {}", file.path, path);
                reply.set_status(StatusCode::OK);
                if let Ok(mime) = HeaderValue::from_str(&file.mime_type) {
                    reply.set_default_header(CONTENT_TYPE, mime);
                }
                if let Some(Ok(modified)) =
                    file.last_modified.as_deref().map(HeaderValue::from_str)
                {
                    reply.set_default_header(LAST_MODIFIED, modified);
                }
                reply.set_body(file.content);
            }
            Ok(None) if path == "/" => {
                reply.set_status(StatusCode::OK);
                reply.set_default_header(
                    CONTENT_TYPE,
                    HeaderValue::from_static(WELCOME_CONTENT_TYPE),
                );
                reply.set_body(WELCOME_PAGE);
            }
            Ok(None) => reply.not_found(),
            Err(e) => {
                warn!("Failed to serve {}: {}", path, e);
                reply.not_found();
            }
        }
        Signal::Terminate
    }
}
