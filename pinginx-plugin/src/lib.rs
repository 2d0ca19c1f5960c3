//! Pinginx Directive Processors
//!
//! Location-level directives (`root`, `proxy_pass`, `return`, ...) are
//! implemented as [`pinginx_core::Processor`]s. The [`ProcessorRegistry`]
//! maps directive names to the factories creating them.

pub mod directives;
mod registry;

pub use directives::{DefaultType, Echo, Index, ProxyPass, Return, UPSTREAM_TIMEOUT};
pub use registry::ProcessorRegistry;
