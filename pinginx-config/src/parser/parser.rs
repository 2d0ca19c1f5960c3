//! Block parser
//!
//! Recursive descent over the token stream:
//!
//! ```text
//! block   := command*
//! command := word+ ( ';' | '{' block '}' )
//! ```
//!
//! The parser knows nothing about directive names; it only builds the tree.

use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::parser::lexer::{Lexer, Token, TokenKind};
use serde::Serialize;
use std::ops::Range;

/// One directive with its optional nested block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub words: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<ConfigBlock>,
    /// Line of the first word
    pub line: usize,
    /// Bytes of the first word
    #[serde(skip)]
    pub span: Range<usize>,
}

impl Command {
    /// Directive name, lower-cased
    pub fn name(&self) -> String {
        self.words
            .first()
            .map(|w| w.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Words after the name
    pub fn params(&self) -> &[String] {
        self.words.get(1..).unwrap_or(&[])
    }
}

/// Ordered commands; a whole file is one block
pub type ConfigBlock = Vec<Command>;

/// Parser state
pub struct Parser<'s> {
    lexer: Lexer<'s>,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    /// Parse the entire source
    pub fn parse(&mut self) -> Result<ConfigBlock, SyntaxError> {
        self.parse_block(None)
    }

    /// Next token that is not a comment
    fn next(&mut self) -> Result<Token, SyntaxError> {
        loop {
            let token = self.lexer.scan()?;
            if !token.is(TokenKind::Comment) {
                return Ok(token);
            }
        }
    }

    /// Parse commands until EOF (top level) or the `}` closing `open`
    fn parse_block(&mut self, open: Option<&Token>) -> Result<ConfigBlock, SyntaxError> {
        let mut commands = Vec::new();
        let mut words: Vec<String> = Vec::new();
        let mut first: Option<Token> = None;

        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::Word => {
                    words.push(token.literal.clone());
                    if first.is_none() {
                        first = Some(token);
                    }
                }
                TokenKind::Semicolon | TokenKind::BraceOpen => {
                    let Some(head) = first.take() else {
                        return Err(unexpected(&token));
                    };
                    let block = if token.is(TokenKind::BraceOpen) {
                        Some(self.parse_block(Some(&token))?)
                    } else {
                        None
                    };
                    commands.push(Command {
                        words: std::mem::take(&mut words),
                        block,
                        line: head.line,
                        span: head.span,
                    });
                }
                TokenKind::BraceClose => {
                    if let Some(head) = first {
                        return Err(missing_terminator(&head));
                    }
                    if open.is_none() {
                        return Err(unexpected(&token));
                    }
                    return Ok(commands);
                }
                TokenKind::Eof => {
                    if let Some(head) = first {
                        return Err(missing_terminator(&head));
                    }
                    if let Some(open) = open {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnclosedBlock,
                            open.line,
                            open.span.clone(),
                        ));
                    }
                    return Ok(commands);
                }
                TokenKind::Comment => {}
            }
        }
    }
}

fn unexpected(token: &Token) -> SyntaxError {
    SyntaxError::new(
        SyntaxErrorKind::UnexpectedToken(token.literal.clone()),
        token.line,
        token.span.clone(),
    )
}

fn missing_terminator(head: &Token) -> SyntaxError {
    SyntaxError::new(
        SyntaxErrorKind::MissingTerminator,
        head.line,
        head.span.clone(),
    )
}

/// Parse a configuration source into its command tree
pub fn parse(source: &str) -> Result<ConfigBlock, SyntaxError> {
    Parser::new(source).parse()
}
