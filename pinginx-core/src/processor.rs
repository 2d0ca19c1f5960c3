//! Directive processor traits
//!
//! A processor implements one location-level behavior. It is created by a
//! [`ProcessorFactory`] while a `location` block is compiled, receives the
//! parameters of every directive it accepts, and is executed for each
//! request routed to its location.

use crate::config::Location;
use crate::server::{Reply, RequestInfo};
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Whether a processor lets the pipeline move on after running.
///
/// All continuation processors of a location run before any terminal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingClass {
    /// Decorates the response and hands over to the next processor
    Continuation,
    /// Commits the response
    Terminal,
}

impl OrderingClass {
    /// Sort key placing continuation processors first
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderingClass::Terminal)
    }
}

/// Result of executing one processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Terminate,
}

/// Errors raised while a processor parses directive parameters
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DirectiveError {
    #[error("directive \"{directive}\" requires at least {expected} parameter(s)")]
    MissingParameter { directive: String, expected: usize },

    #[error("invalid value \"{value}\" for directive \"{directive}\": {reason}")]
    InvalidValue {
        directive: String,
        value: String,
        reason: String,
    },

    #[error("invalid URL \"{url}\" in directive \"{directive}\": {reason}")]
    InvalidUrl {
        directive: String,
        url: String,
        reason: String,
    },
}

impl DirectiveError {
    /// Fatal errors abort compilation; everything else drops the directive.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DirectiveError::InvalidUrl { .. })
    }
}

/// Check that a directive received at least `expected` parameters
pub fn require_params(
    directive: &str,
    params: &[String],
    expected: usize,
) -> Result<(), DirectiveError> {
    if params.len() < expected {
        return Err(DirectiveError::MissingParameter {
            directive: directive.to_string(),
            expected,
        });
    }
    Ok(())
}

/// A location-level behavior
#[async_trait]
pub trait Processor: Send + Sync + fmt::Debug {
    /// Directive names handled by this processor
    fn names(&self) -> &'static [&'static str];

    /// Whether this processor handles the given (lower-cased) directive
    fn accepts(&self, directive: &str) -> bool {
        self.names().contains(&directive)
    }

    /// Ordering class used to sort the location's pipeline
    fn ordering(&self) -> OrderingClass;

    /// Absorb the parameters of one directive occurrence.
    ///
    /// Called once per occurrence, so repeated directives accumulate.
    fn parse(
        &mut self,
        location_path: &str,
        directive: &str,
        params: &[String],
    ) -> Result<(), DirectiveError>;

    /// Run against one request. Parsed state is read-only here.
    async fn execute(&self, location: &Location, reply: &mut Reply, request: &RequestInfo)
    -> Signal;
}

/// Creates fresh processor instances for a set of directive names
pub trait ProcessorFactory: Send + Sync {
    /// Directive names handled by the processors this factory creates
    fn names(&self) -> &'static [&'static str];

    /// Whether this factory handles the given (lower-cased) directive
    fn accepts(&self, directive: &str) -> bool {
        self.names().contains(&directive)
    }

    /// Create an empty processor
    fn create(&self) -> Box<dyn Processor>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_params() {
        let params = vec!["index.html".to_string()];
        assert!(require_params("index", &params, 1).is_ok());

        let err = require_params("return", &[], 1).unwrap_err();
        assert_eq!(
            err,
            DirectiveError::MissingParameter {
                directive: "return".to_string(),
                expected: 1,
            }
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invalid_url_is_fatal() {
        let err = DirectiveError::InvalidUrl {
            directive: "proxy_pass".to_string(),
            url: "::".to_string(),
            reason: "invalid authority".to_string(),
        };
        assert!(err.is_fatal());
    }
}
