//! Pinginx Request Routing
//!
//! This crate connects the compiled routing tables to the network:
//! - Per-request dispatch through virtual hosts, locations and processors
//! - Fallback responses (welcome page, 404)
//! - The Pingora proxy service that answers locally or forwards upstream

pub mod route;
pub mod server;

pub use route::{build_listeners, default_server, route};
pub use server::{PinginxProxy, RequestCtx};
