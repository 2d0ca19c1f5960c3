//! Configuration errors and warnings

use pinginx_core::DirectiveError;
use std::fmt;
use std::ops::Range;
use std::path::PathBuf;
use thiserror::Error;

/// What went wrong in a [`SyntaxError`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// Quoted word not closed before the end of its line
    UnterminatedQuote(char),
    /// Backslash followed by anything but `n r t " ' \`
    InvalidEscape(char),
    /// Words not followed by `;` or `{`
    MissingTerminator,
    /// End of input inside a `{ ... }` block
    UnclosedBlock,
    /// `{`, `}` or `;` where a command must begin
    UnexpectedToken(String),
    /// `location` with a modifier other than `= ^~ ~ ~*`
    UnsupportedModifier(String),
    /// `location` with the wrong shape
    InvalidLocation(String),
}

impl fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedQuote(q) => write!(f, "missing terminating {} character", q),
            Self::InvalidEscape(c) => write!(f, "invalid quoted character '\\{}'", c),
            Self::MissingTerminator => write!(f, "missing ';' or '{{' after directive"),
            Self::UnclosedBlock => write!(f, "unexpected end of input, expected '}}'"),
            Self::UnexpectedToken(t) => write!(f, "unexpected '{}'", t),
            Self::UnsupportedModifier(m) => write!(f, "unsupported location modifier \"{}\"", m),
            Self::InvalidLocation(msg) => write!(f, "invalid location: {}", msg),
        }
    }
}

/// Structural error in a configuration source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error at line {line}: {kind}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub line: usize,
    pub span: Range<usize>,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, line: usize, span: Range<usize>) -> Self {
        Self { kind, line, span }
    }
}

/// Fatal configuration error
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("invalid location pattern \"{pattern}\" at line {line}: {source}")]
    InvalidPattern {
        pattern: String,
        line: usize,
        span: Range<usize>,
        #[source]
        source: regex::Error,
    },

    #[error("{source} at line {line}")]
    Directive {
        line: usize,
        span: Range<usize>,
        #[source]
        source: DirectiveError,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Source bytes the error points at, if any
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Self::Syntax(e) => Some(e.span.clone()),
            Self::InvalidPattern { span, .. } | Self::Directive { span, .. } => Some(span.clone()),
            Self::Io { .. } => None,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Syntax(e) => Some(e.line),
            Self::InvalidPattern { line, .. } | Self::Directive { line, .. } => Some(*line),
            Self::Io { .. } => None,
        }
    }
}

/// Non-fatal problem; the directive concerned was dropped
#[derive(Debug, Clone, PartialEq)]
pub enum CompileWarning {
    /// No handler knows this directive in this context
    UnsupportedDirective {
        context: &'static str,
        name: String,
        line: usize,
    },
    /// The directive's parameters were rejected
    DroppedDirective {
        name: String,
        line: usize,
        reason: DirectiveError,
    },
}

impl CompileWarning {
    pub fn line(&self) -> usize {
        match self {
            Self::UnsupportedDirective { line, .. } | Self::DroppedDirective { line, .. } => *line,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::UnsupportedDirective { name, .. } | Self::DroppedDirective { name, .. } => name,
        }
    }
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedDirective { context, name, line } => {
                write!(f, "unsupported directive \"{}\" in {} at line {}", name, context, line)
            }
            Self::DroppedDirective { name, line, reason } => {
                write!(f, "dropped directive \"{}\" at line {}: {}", name, line, reason)
            }
        }
    }
}
