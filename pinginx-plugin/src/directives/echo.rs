//! `echo <line>...`

use super::Directive;
use async_trait::async_trait;
use pinginx_core::{DirectiveError, Location, OrderingClass, Processor, Reply, RequestInfo, Signal};

/// Writes lines to the response body. `$request` expands to the request line.
#[derive(Debug, Default)]
pub struct Echo {
    lines: Vec<String>,
}

impl Directive for Echo {
    const NAMES: &'static [&'static str] = &["echo"];
}

#[async_trait]
impl Processor for Echo {
    fn names(&self) -> &'static [&'static str] {
        Self::NAMES
    }

    fn ordering(&self) -> OrderingClass {
        OrderingClass::Continuation
    }

    fn parse(&mut self, _: &str, _: &str, params: &[String]) -> Result<(), DirectiveError> {
        self.lines.extend_from_slice(params);
        Ok(())
    }

    async fn execute(&self, _: &Location, reply: &mut Reply, request: &RequestInfo) -> Signal {
        let request_line = request.request_line();
        for line in &self.lines {
            reply.write(line.replace("$request", &request_line));
            reply.write("\n");
        }
        Signal::Continue
    }
}
