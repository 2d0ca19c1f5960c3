//! Compiled configuration

mod types;

pub use types::{
    DEFAULT_LISTEN_PORT, DEFAULT_SERVER_NAME, Location, Modifier, Priority, ServerDefinition,
};
