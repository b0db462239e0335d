use std::fmt;

use crate::token::{Span, Token, TokenKind, TokenLiteral};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Byte that cannot start any token.
    UnexpectedCharacter(char),
    /// String literal hit a newline or end of input before its closing quote.
    UnterminatedString,
    /// Name mixing uppercase and lowercase letters.
    InvalidIdentifier(String),
    /// Operator characters that match no known operator.
    InvalidOperator(String),
    /// Digit run that does not parse as a number.
    InvalidNumber(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::InvalidIdentifier(name) => {
                write!(
                    f,
                    "invalid identifier '{name}', \
                     names must be all uppercase or all lowercase"
                )
            }
            Self::InvalidOperator(op) => write!(f, "invalid operator: {op}"),
            Self::InvalidNumber(text) => write!(f, "invalid number: {text}"),
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

/// Every error collected during one lexing pass, in source order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render_lines(.0))]
pub struct LexErrors(pub Vec<LexError>);

/// One error per line, in the order given.
pub(crate) fn render_lines<E: fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tokenize Lin source into a token stream.
///
/// The stream always ends with exactly one `Eof`, and every `Indent` is
/// matched by a `Dedent` before it.
///
/// # Errors
///
/// Returns every lexical error found in the source. Scanning keeps going
/// after an error so that one pass reports all of them, but no tokens are
/// returned unless the source is clean.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexErrors> {
    Lexer::new(input).tokenize()
}

struct Lexer<'a> {
    source: &'a str,
    input: &'a [u8],
    pos: usize,
    line: usize,
    col: usize,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
    indent_stack: Vec<usize>,
    /// Whitespace byte fixed by the first indented line.
    indent_unit: Option<u8>,
    line_start: bool,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        let source = input.strip_prefix('\u{FEFF}').unwrap_or(input);
        Self {
            source,
            input: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
            indent_stack: vec![0],
            indent_unit: None,
            line_start: false,
        }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, LexErrors> {
        while self.pos < self.input.len() {
            if self.line_start {
                self.line_start = false;
                self.read_indentation();
                continue;
            }

            let result = match self.input[self.pos] {
                b'\n' => {
                    self.read_newline();
                    Ok(())
                }
                b'\r' if self.peek_at(1) == Some(b'\n') => {
                    self.read_newline();
                    Ok(())
                }
                b' ' | b'\t' | b'\r' => {
                    self.advance();
                    Ok(())
                }
                b'#' => {
                    self.read_comment();
                    Ok(())
                }
                b'"' => self.read_string(),
                b'0'..=b'9' => self.read_number(),
                ch if is_word_byte(ch) => self.read_word(),
                ch if is_operator_byte(ch) => self.read_operator(),
                _ => Err(self.unexpected_character()),
            };

            if let Err(error) = result {
                self.errors.push(error);
            }
        }

        let end = self.span();
        self.close_blocks(0, end);
        self.push(TokenKind::Eof, "", None, end);

        tracing::debug!(
            tokens = self.tokens.len(),
            errors = self.errors.len(),
            "tokenized source"
        );

        if self.errors.is_empty() {
            Ok(self.tokens)
        } else {
            Err(LexErrors(self.errors))
        }
    }

    const fn span(&self) -> Span {
        Span {
            line: self.line,
            column: self.col,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(&byte) = self.input.get(self.pos) {
            if byte == b'\n' {
                self.line += 1;
                self.col = 1;
            } else if byte & 0xC0 != 0x80 {
                // continuation bytes belong to the previous column
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn push(&mut self, kind: TokenKind, lexeme: &str, literal: Option<TokenLiteral>, span: Span) {
        self.tokens.push(Token {
            kind,
            lexeme: lexeme.to_string(),
            literal,
            span,
        });
    }

    fn current_indent(&self) -> usize {
        self.indent_stack.last().copied().unwrap_or(0)
    }

    /// Pop every open block wider than `width`, one `Dedent` each.
    fn close_blocks(&mut self, width: usize, span: Span) {
        while width < self.current_indent() {
            self.indent_stack.pop();
            self.push(TokenKind::Dedent, "", None, span);
        }
    }

    /// Blank and comment-only lines leave the indentation stack alone.
    fn at_blank_line(&self) -> bool {
        matches!(self.peek(), None | Some(b'\n' | b'\r' | b'#'))
    }

    fn read_indentation(&mut self) {
        let span = self.span();
        let first = self.input[self.pos];

        if first != b' ' && first != b'\t' {
            if !self.at_blank_line() {
                self.close_blocks(0, span);
            }
            return;
        }

        let unit = *self.indent_unit.get_or_insert(first);
        let start = self.pos;
        self.advance();
        let mut width = 1;
        while self.peek() == Some(unit) {
            self.advance();
            width += 1;
        }
        let end = self.pos;

        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.advance();
        }
        if self.at_blank_line() {
            return;
        }

        if width > self.current_indent() {
            self.indent_stack.push(width);
            let source = self.source;
            self.push(TokenKind::Indent, &source[start..end], None, span);
        } else {
            self.close_blocks(width, span);
        }
    }

    fn read_newline(&mut self) {
        let span = self.span();
        if self.peek() == Some(b'\r') {
            self.advance();
        }
        self.advance();
        self.push(TokenKind::Newline, "\n", None, span);
        self.line_start = true;
    }

    fn read_comment(&mut self) {
        let span = self.span();
        let start = self.pos;

        while !matches!(self.peek(), None | Some(b'\n' | b'\r')) {
            self.advance();
        }

        let source = self.source;
        self.push(TokenKind::Comment, &source[start..self.pos], None, span);
    }

    fn read_string(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let start = self.pos;
        self.advance(); // skip opening quote

        loop {
            match self.peek() {
                None | Some(b'\n') => {
                    return Err(LexError {
                        kind: LexErrorKind::UnterminatedString,
                        span,
                    });
                }
                Some(b'"') => {
                    self.advance();
                    break;
                }
                Some(_) => self.advance(),
            }
        }

        let source = self.source;
        let lexeme = &source[start..self.pos];
        let text = &source[start + 1..self.pos - 1];
        self.push(
            TokenKind::String,
            lexeme,
            Some(TokenLiteral::Text(text.to_string())),
            span,
        );
        Ok(())
    }

    fn read_number(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let start = self.pos;

        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                self.advance();
            }
        }

        let source = self.source;
        let text = &source[start..self.pos];
        let Ok(value) = text.parse::<f64>() else {
            return Err(LexError {
                kind: LexErrorKind::InvalidNumber(text.to_string()),
                span,
            });
        };

        self.push(
            TokenKind::Number,
            text,
            Some(TokenLiteral::Number(value)),
            span,
        );
        Ok(())
    }

    fn read_word(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let start = self.pos;

        while self.peek().is_some_and(is_word_byte) {
            self.advance();
        }

        let source = self.source;
        let text = &source[start..self.pos];

        if let Some(kind) = TokenKind::keyword(text) {
            self.push(kind, text, None, span);
            return Ok(());
        }

        let has_upper = text.bytes().any(|b| b.is_ascii_uppercase());
        let has_lower = text.bytes().any(|b| b.is_ascii_lowercase());
        let kind = match (has_upper, has_lower) {
            (_, false) => TokenKind::Command,
            (false, true) => TokenKind::Identifier,
            (true, true) => {
                return Err(LexError {
                    kind: LexErrorKind::InvalidIdentifier(text.to_string()),
                    span,
                });
            }
        };

        self.push(kind, text, Some(TokenLiteral::Text(text.to_string())), span);
        Ok(())
    }

    fn read_operator(&mut self) -> Result<(), LexError> {
        let span = self.span();
        let start = self.pos;

        // longest match first
        let (kind, len) = if let Some(kind) = self
            .input
            .get(start..start + 2)
            .and_then(TokenKind::operator)
        {
            (kind, 2)
        } else if let Some(kind) = TokenKind::operator(&self.input[start..=start]) {
            (kind, 1)
        } else {
            self.advance();
            return Err(LexError {
                kind: LexErrorKind::InvalidOperator(char::from(self.input[start]).to_string()),
                span,
            });
        };

        for _ in 0..len {
            self.advance();
        }

        let source = self.source;
        self.push(kind, &source[start..self.pos], None, span);
        Ok(())
    }

    fn unexpected_character(&mut self) -> LexError {
        let span = self.span();
        let ch = self.source[self.pos..].chars().next().unwrap_or('\u{FFFD}');
        for _ in 0..ch.len_utf8() {
            self.advance();
        }
        LexError {
            kind: LexErrorKind::UnexpectedCharacter(ch),
            span,
        }
    }
}

const fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

const fn is_operator_byte(byte: u8) -> bool {
    matches!(
        byte,
        b'+' | b'-'
            | b'*'
            | b'/'
            | b'%'
            | b'='
            | b'.'
            | b'<'
            | b'>'
            | b'!'
            | b'&'
            | b'|'
            | b'^'
            | b'~'
            | b'('
            | b')'
            | b'['
            | b']'
            | b':'
    )
}
