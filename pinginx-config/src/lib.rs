//! Pinginx Configuration Parser
//!
//! Parses and compiles nginx-style configuration files.
//!
//! # Example
//!
//! ```rust,ignore
//! use pinginx_config::compile;
//!
//! let servers = compile(r#"
//!     server {
//!         listen 8080;
//!         server_name example.com;
//!         location / { return 200 "ok"; }
//!     }
//! "#).unwrap();
//! ```

pub mod compiler;
pub mod diagnostic;
pub mod error;
pub mod parser;

pub use compiler::Compiler;
pub use diagnostic::render_diagnostic;
pub use error::{CompileError, CompileWarning, SyntaxError, SyntaxErrorKind};
pub use parser::{Command, ConfigBlock, Token, TokenKind, parse, tokenize};

use pinginx_core::ServerDefinition;
use std::path::Path;

/// Full compilation pipeline with the built-in processors: source -> servers
pub fn compile(source: &str) -> Result<Vec<ServerDefinition>, CompileError> {
    Compiler::new().compile_source(source)
}

/// Read a configuration file
pub fn read_file(path: impl AsRef<Path>) -> Result<String, CompileError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| CompileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and compile a configuration file
pub fn compile_file(path: impl AsRef<Path>) -> Result<Vec<ServerDefinition>, CompileError> {
    compile(&read_file(path)?)
}
