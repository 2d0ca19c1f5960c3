//! Lexer for nginx-style configuration
//!
//! - `{`, `}` and `;` are single-character tokens
//! - `#` starts a comment running to the end of the line
//! - `'...'` and `"..."` are quoted words with `\n \r \t \" \' \\` escapes
//! - anything else is a word, ended by whitespace or `;`

use crate::error::{SyntaxError, SyntaxErrorKind};
use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Lexer-level failure, turned into a [`SyntaxError`] by [`Lexer::scan`]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawError {
    /// Nothing matched; only an unterminated quote can get here
    #[default]
    Unmatched,
    InvalidEscape(char),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(error = RawError)]
enum RawToken {
    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token(";")]
    Semicolon,

    #[regex(r"#[^\n]*", |lex| lex.slice()[1..].to_string())]
    Comment(String),

    #[regex(r#"'([^'\\\n]|\\[^\n])*'"#, unquote)]
    #[regex(r#""([^"\\\n]|\\[^\n])*""#, unquote)]
    Quoted(String),

    #[regex(r#"[^ \t\r\n\f'"{};#][^ \t\r\n\f;]*"#, |lex| lex.slice().to_string())]
    Word(String),
}

/// Strip the quotes and resolve escapes
fn unquote(lex: &mut logos::Lexer<RawToken>) -> Result<String, RawError> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('\\') => result.push('\\'),
            Some(other) => return Err(RawError::InvalidEscape(other)),
            None => return Err(RawError::InvalidEscape(' ')),
        }
    }

    Ok(result)
}

/// Token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Word,
    BraceOpen,
    BraceClose,
    Semicolon,
    Comment,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Word => "word",
            TokenKind::BraceOpen => "{",
            TokenKind::BraceClose => "}",
            TokenKind::Semicolon => ";",
            TokenKind::Comment => "comment",
            TokenKind::Eof => "end of input",
        };
        f.write_str(s)
    }
}

/// A token with its position in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Word text after unquoting, comment text without `#`
    pub literal: String,
    /// 1-based line of the token's first byte
    pub line: usize,
    pub span: Range<usize>,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Pull-based scanner over a configuration source
pub struct Lexer<'s> {
    inner: logos::Lexer<'s, RawToken>,
    source: &'s str,
    line: usize,
    counted: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            inner: RawToken::lexer(source),
            source,
            line: 1,
            counted: 0,
        }
    }

    /// Line of the byte at `offset`; offsets must not go backwards
    fn line_at(&mut self, offset: usize) -> usize {
        if offset > self.counted {
            self.line += self.source[self.counted..offset].matches('\n').count();
            self.counted = offset;
        }
        self.line
    }

    /// Next token; [`TokenKind::Eof`] once the input is exhausted
    pub fn scan(&mut self) -> Result<Token, SyntaxError> {
        let Some(result) = self.inner.next() else {
            let end = self.source.len();
            return Ok(Token {
                kind: TokenKind::Eof,
                literal: String::new(),
                line: self.line_at(end),
                span: end..end,
            });
        };

        let span = self.inner.span();
        let line = self.line_at(span.start);

        let (kind, literal) = match result {
            Ok(RawToken::BraceOpen) => (TokenKind::BraceOpen, "{".to_string()),
            Ok(RawToken::BraceClose) => (TokenKind::BraceClose, "}".to_string()),
            Ok(RawToken::Semicolon) => (TokenKind::Semicolon, ";".to_string()),
            Ok(RawToken::Comment(text)) => (TokenKind::Comment, text),
            Ok(RawToken::Quoted(text)) | Ok(RawToken::Word(text)) => (TokenKind::Word, text),
            Err(RawError::InvalidEscape(c)) => {
                return Err(SyntaxError::new(SyntaxErrorKind::InvalidEscape(c), line, span));
            }
            Err(RawError::Unmatched) => {
                let quote = self.source[span.start..].chars().next().unwrap_or('\'');
                let end = self.source[span.start..]
                    .find('\n')
                    .map_or(self.source.len(), |i| span.start + i);
                return Err(SyntaxError::new(
                    SyntaxErrorKind::UnterminatedQuote(quote),
                    line,
                    span.start..end,
                ));
            }
        };

        Ok(Token {
            kind,
            literal,
            line,
            span,
        })
    }
}

/// Scan a whole source, comments included, without the final EOF token
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.scan()?;
        if token.is(TokenKind::Eof) {
            return Ok(tokens);
        }
        tokens.push(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_literals(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.literal))
            .collect()
    }

    fn word(s: &str) -> (TokenKind, String) {
        (TokenKind::Word, s.to_string())
    }

    fn punct(kind: TokenKind) -> (TokenKind, String) {
        (kind, kind.to_string())
    }

    #[test]
    fn test_scanner() {
        let source = r#"
#COMMENT
# DOUBLE #COMMENT
WORD1 WORD2;
WORD3 {
    WORD4 'SQ\t\r\n\'\"\\1' "DQ\t\r\n\'\"\\1";
}"#;
        let expected = vec![
            (TokenKind::Comment, "COMMENT".to_string()),
            (TokenKind::Comment, " DOUBLE #COMMENT".to_string()),
            word("WORD1"),
            word("WORD2"),
            punct(TokenKind::Semicolon),
            word("WORD3"),
            punct(TokenKind::BraceOpen),
            word("WORD4"),
            word("SQ\t\r\n'\"\\1"),
            word("DQ\t\r\n'\"\\1"),
            punct(TokenKind::Semicolon),
            punct(TokenKind::BraceClose),
        ];
        assert_eq!(kinds_and_literals(source), expected);

        let mut lexer = Lexer::new(source);
        for _ in 0..expected.len() {
            lexer.scan().unwrap();
        }
        assert!(lexer.scan().unwrap().is(TokenKind::Eof));
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(
            kinds_and_literals("WORD1 WORD2;"),
            vec![word("WORD1"), word("WORD2"), punct(TokenKind::Semicolon)]
        );
    }

    #[test]
    fn test_last_word() {
        assert_eq!(kinds_and_literals("WORD1"), vec![word("WORD1")]);
    }

    #[test]
    fn test_word_keeps_braces() {
        assert_eq!(
            kinds_and_literals(r"location ~ ^/a{2}$ {"),
            vec![
                word("location"),
                word("~"),
                word("^/a{2}$"),
                punct(TokenKind::BraceOpen)
            ]
        );
    }

    #[test]
    fn test_lines_and_spans() {
        let tokens = tokenize("a;\n\nb {\n}").unwrap();
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 1, 3, 3, 4]);
        assert_eq!(tokens[2].span, 4..5);
    }

    #[test]
    fn test_unterminated_single_quote() {
        let err = tokenize("'WORD2").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote('\''));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unterminated_quote_at_newline() {
        let err = tokenize("ok;\n'WORD2\nnext;").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote('\''));
        assert_eq!(err.line, 2);

        let err = tokenize("\"WORD2\n").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::UnterminatedQuote('"'));
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r"'WORD2\/'").unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::InvalidEscape('/'));

        let err = tokenize(r#""WORD2\/""#).unwrap_err();
        assert_eq!(err.kind, SyntaxErrorKind::InvalidEscape('/'));
    }
}
