//! Lexer and block parser for nginx-style configuration

pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::{Command, ConfigBlock, Parser, parse};
