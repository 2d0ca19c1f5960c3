//! `default_type <mime>`

use super::Directive;
use async_trait::async_trait;
use http::HeaderValue;
use pinginx_core::processor::require_params;
use pinginx_core::{DirectiveError, Location, OrderingClass, Processor, Reply, RequestInfo, Signal};

/// Sets the response `Content-Type`
#[derive(Debug, Default)]
pub struct DefaultType {
    value: Option<HeaderValue>,
}

impl Directive for DefaultType {
    const NAMES: &'static [&'static str] = &["default_type"];
}

#[async_trait]
impl Processor for DefaultType {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn ordering(&self) -> OrderingClass {
        OrderingClass::Continuation
    }

    fn parse(&mut self, _: &str, directive: &str, params: &[String]) -> Result<(), DirectiveError> {
        require_params(directive, params, 1)?;
        let value = HeaderValue::from_str(&params[0]).map_err(|e| DirectiveError::InvalidValue {
            directive: directive.to_string(),
            value: params[0].clone(),
            reason: e.to_string(),
        })?;
        self.value = Some(value);
        Ok(())
    }

    async fn execute(&self, _: &Location, reply: &mut Reply, _: &RequestInfo) -> Signal {
        if let Some(value) = &self.value {
            reply.set_default_header(http::header::CONTENT_TYPE, value.clone());
        }
        Signal::Continue
    }
}
