//! Pinginx Core Library
//!
//! This crate holds the compiled routing model shared by every other
//! Pinginx crate: server definitions and their locations, the directive
//! processor traits, location matching and virtual host dispatch.

pub mod config;
pub mod error;
pub mod processor;
pub mod server;

pub use config::{Location, Modifier, Priority, ServerDefinition};
pub use error::{Error, Result};
pub use processor::{DirectiveError, OrderingClass, Processor, ProcessorFactory, Signal};
pub use server::{ForwardTarget, Listeners, Reply, RequestInfo, VirtualHosts};

/// Pinginx version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
