//! `return <code> [text]` and `return <url>`

use super::Directive;
use async_trait::async_trait;
use http::StatusCode;
use pinginx_core::processor::require_params;
use pinginx_core::{DirectiveError, Location, OrderingClass, Processor, Reply, RequestInfo, Signal};
use tracing::warn;

/// Answers with a fixed status and optional body or redirect target
#[derive(Debug, Default)]
pub struct Return {
    code: Option<StatusCode>,
    text: Option<String>,
}

impl Directive for Return {
    const NAMES: &'static [&'static str] = &["return"];
}

fn is_redirect(code: StatusCode) -> bool {
    matches!(code.as_u16(), 301 | 302 | 303 | 307 | 308)
}

#[async_trait]
impl Processor for Return {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn ordering(&self) -> OrderingClass {
        OrderingClass::Terminal
    }

    fn parse(&mut self, _: &str, directive: &str, params: &[String]) -> Result<(), DirectiveError> {
        require_params(directive, params, 1)?;

        let first = &params[0];
        if params.len() == 1 && (first.starts_with("http://") || first.starts_with("https://")) {
            self.code = Some(StatusCode::FOUND);
            self.text = Some(first.clone());
            return Ok(());
        }

        let code = first
            .parse::<u16>()
            .ok()
            .and_then(|c| StatusCode::from_u16(c).ok())
            .ok_or_else(|| DirectiveError::InvalidValue {
                directive: directive.to_string(),
                value: first.clone(),
                reason: "expected an HTTP status code".to_string(),
            })?;

        self.code = Some(code);
        self.text = params.get(1).cloned();
        Ok(())
    }

    async fn execute(&self, _: &Location, reply: &mut Reply, _: &RequestInfo) -> Signal {
        let Some(code) = self.code else {
            return Signal::Continue;
        };

        reply.set_status(code);
        match &self.text {
            Some(target) if is_redirect(code) => {
                if let Err(e) = reply.redirect(target, code) {
                    warn!("Dropping redirect target '{}': {}", target, e);
                }
            }
            Some(text) => reply.write(text),
            None => {}
        }
        Signal::Terminate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run(params: &[&str]) -> Reply {
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        let mut p = Return::default();
        p.parse("/", "return", &params).unwrap();

        let location = Location::new(0, None, "/").unwrap();
        let mut reply = Reply::new();
        assert_eq!(
            p.execute(&location, &mut reply, &RequestInfo::get("/")).await,
            Signal::Terminate
        );
        reply
    }

    #[tokio::test]
    async fn test_code_and_text() {
        let reply = run(&["200", "ok"]).await;
        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.body(), b"ok");
    }

    #[tokio::test]
    async fn test_code_only() {
        let reply = run(&["204"]).await;
        assert_eq!(reply.status(), StatusCode::NO_CONTENT);
        assert!(reply.body().is_empty());
        assert!(!reply.is_untouched());
    }

    #[tokio::test]
    async fn test_redirect() {
        let reply = run(&["301", "https://example.com/new"]).await;
        assert_eq!(reply.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(reply.header("location"), Some("https://example.com/new"));
        assert!(reply.body().is_empty());

        let reply = run(&["http://example.com/"]).await;
        assert_eq!(reply.status(), StatusCode::FOUND);
        assert_eq!(reply.header("location"), Some("http://example.com/"));
    }

    #[test]
    fn test_invalid_code() {
        let mut p = Return::default();
        let err = p.parse("/", "return", &["abc".to_string()]).unwrap_err();
        assert!(matches!(err, DirectiveError::InvalidValue { .. }));
        assert!(!err.is_fatal());
        assert!(p.parse("/", "return", &["42".to_string()]).is_err());
        assert!(p.parse("/", "return", &[]).is_err());
    }
}
