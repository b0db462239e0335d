use std::fmt;
use std::rc::Rc;

use crate::ast::{Binary, BinaryOp, Body, Definition, Expr, Literal, Stmt, UnaryOp};
use crate::lexer::render_lines;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Span, Token, TokenKind, TokenLiteral};

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A specific token was required here.
    Expected {
        expected: &'static str,
        found: String,
    },
    /// No expression can start with the current token.
    ExpectedExpression { found: String },
    /// Indented line that does not follow a block header.
    UnexpectedIndent,
    /// `not` inside a comparison chain without a following `in`.
    NotWithoutIn,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::ExpectedExpression { found } => {
                write!(f, "expected expression, found {found}")
            }
            Self::UnexpectedIndent => write!(f, "unexpected indent"),
            Self::NotWithoutIn => {
                write!(f, "invalid syntax, expected 'in' after 'not'")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}

/// Every error collected during one parsing pass, in source order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render_lines(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

/// Parse a token stream into the program's top-level statements.
///
/// Comment tokens are skipped. A malformed statement is recorded and the
/// parser resynchronizes at the next line or statement keyword, so a
/// single pass reports every independent syntax error.
///
/// # Errors
///
/// Returns all collected `ParseError`s if any statement failed to parse;
/// a partial tree is never returned.
pub fn parse(tokens: &[Token]) -> Result<Vec<Stmt>, ParseErrors> {
    Parser::new(tokens).parse()
}

type Tier = fn(&mut Parser) -> Result<Expr, ParseError>;

const ADDITIVE: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Plus, BinaryOp::Add),
    (TokenKind::Minus, BinaryOp::Subtract),
];

const MULTIPLICATIVE: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::Star, BinaryOp::Multiply),
    (TokenKind::Slash, BinaryOp::Divide),
    (TokenKind::Percent, BinaryOp::Modulo),
    (TokenKind::SlashSlash, BinaryOp::FloorDivide),
];

const SHIFT: &[(TokenKind, BinaryOp)] = &[
    (TokenKind::LessLess, BinaryOp::ShiftLeft),
    (TokenKind::GreaterGreater, BinaryOp::ShiftRight),
];

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    fn new(tokens: &[Token]) -> Self {
        let mut tokens: Vec<Token> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .cloned()
            .collect();

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::new(1, 1), |t| t.span);
            tokens.push(Token {
                kind: TokenKind::Eof,
                lexeme: String::new(),
                literal: None,
                span,
            });
        }

        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Vec<Stmt>, ParseErrors> {
        let mut program = Vec::new();

        self.skip_newlines();
        while !self.is_at_end() {
            if let Some(stmt) = self.statement_or_recover() {
                program.push(stmt);
            }
        }

        tracing::debug!(
            statements = program.len(),
            errors = self.errors.len(),
            "parsed program"
        );

        if self.errors.is_empty() {
            Ok(program)
        } else {
            Err(ParseErrors(self.errors))
        }
    }

    fn statement_or_recover(&mut self) -> Option<Stmt> {
        match self.statement() {
            Ok(stmt) => {
                self.skip_newlines();
                Some(stmt)
            }
            Err(error) => {
                self.errors.push(error);
                if !self.check(TokenKind::Indent) {
                    self.synchronize();
                }
                self.skip_orphan_block();
                None
            }
        }
    }

    // -- Statements --

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        match self.peek_kind() {
            TokenKind::Init => {
                self.advance();
                let (name, value) = self.binding()?;
                Ok(Stmt::Init { name, value })
            }
            TokenKind::Set => {
                self.advance();
                let (name, value) = self.binding()?;
                Ok(Stmt::Set { name, value })
            }
            TokenKind::Return => {
                self.advance();
                self.return_statement()
            }
            TokenKind::Def => {
                self.advance();
                self.definition()
            }
            TokenKind::If => {
                self.advance();
                self.condition()
            }
            TokenKind::While => {
                self.advance();
                self.loop_statement()
            }
            TokenKind::Pass => {
                self.advance();
                self.expect_line_end()?;
                Ok(Stmt::Pass)
            }
            TokenKind::Command => {
                let name = self.advance();
                self.call_statement(name)
            }
            TokenKind::Indent => Err(self.error_here(ParseErrorKind::UnexpectedIndent)),
            _ => self.expression_statement(),
        }
    }

    /// `name expr` shared by `INIT` and `SET`.
    fn binding(&mut self) -> Result<(Token, Expr), ParseError> {
        let name = self.consume(TokenKind::Identifier, "variable name")?;
        let value = self.expression()?;
        self.expect_line_end()?;
        Ok((name, value))
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let span = self.previous().span;
        let value = if self.at_line_end() {
            None
        } else {
            Some(self.expression()?)
        };
        Ok(Stmt::Return { value, span })
    }

    fn definition(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(TokenKind::Command, "command name after DEF")?;

        let mut params = Vec::new();
        while self.check(TokenKind::Identifier) {
            params.push(self.advance());
        }

        self.consume(TokenKind::Newline, "newline after parameters")?;
        let body = self.block()?;

        Ok(Stmt::Definition(Rc::new(Definition { name, params, body })))
    }

    fn condition(&mut self) -> Result<Stmt, ParseError> {
        let test = self.expression()?;
        self.consume(TokenKind::Newline, "newline after condition")?;
        let then_branch = self.block()?;

        let else_branch = if self.match_kind(TokenKind::Else) {
            if self.match_kind(TokenKind::If) {
                Some(self.else_if()?)
            } else {
                self.consume(TokenKind::Newline, "newline after ELSE")?;
                Some(self.block()?)
            }
        } else if self.match_kind(TokenKind::Elsif) {
            Some(self.else_if()?)
        } else {
            None
        };

        Ok(Stmt::Condition {
            test,
            then_branch,
            else_branch,
        })
    }

    fn else_if(&mut self) -> Result<Body, ParseError> {
        let nested = self.condition()?;
        Ok(Body {
            statements: vec![nested],
        })
    }

    fn loop_statement(&mut self) -> Result<Stmt, ParseError> {
        let test = self.expression()?;
        self.consume(TokenKind::Newline, "newline after condition")?;
        let body = self.block()?;
        Ok(Stmt::Loop { test, body })
    }

    fn block(&mut self) -> Result<Body, ParseError> {
        self.skip_newlines();
        self.consume(TokenKind::Indent, "indented block")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::Dedent) && !self.is_at_end() {
            if let Some(stmt) = self.statement_or_recover() {
                statements.push(stmt);
            }
        }

        // a truncated stream may end before the block is closed
        self.match_kind(TokenKind::Dedent);

        Ok(Body { statements })
    }

    /// `NAME arg*` up to the end of the line.
    fn call_statement(&mut self, name: Token) -> Result<Stmt, ParseError> {
        let mut arguments = Vec::new();
        while !self.at_line_end() {
            arguments.push(self.expression()?);
        }
        Ok(Stmt::Expression(Expr::Call { name, arguments }))
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.expect_line_end()?;
        Ok(Stmt::Expression(expr))
    }

    // -- Expressions, lowest precedence first --

    fn expression(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.ternary())
    }

    fn ternary(&mut self) -> Result<Expr, ParseError> {
        let expr = self.disjunction()?;

        if self.match_kind(TokenKind::IfInline) {
            let condition = self.expression()?;
            self.consume(TokenKind::ElseInline, "'else' in conditional expression")?;
            let right = self.expression()?;
            return Ok(Expr::Ternary {
                condition: Box::new(condition),
                left: Box::new(expr),
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    fn disjunction(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(&[(TokenKind::Or, BinaryOp::Or)], Self::conjunction)
    }

    fn conjunction(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(&[(TokenKind::And, BinaryOp::And)], Self::inversion)
    }

    fn inversion(&mut self) -> Result<Expr, ParseError> {
        if self.match_kind(TokenKind::Not) {
            let span = self.previous().span;
            let right = self.inversion()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                span,
                right: Box::new(right),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.bit_or()?;
        let mut chain = Vec::new();

        while let Some((op, span)) = self.comparison_operator()? {
            let right = self.bit_or()?;
            chain.push(Binary {
                left: Box::new(left),
                op,
                span,
                right: Box::new(right.clone()),
            });
            left = right;
        }

        if chain.is_empty() {
            Ok(left)
        } else {
            Ok(Expr::Comparison(chain))
        }
    }

    fn comparison_operator(&mut self) -> Result<Option<(BinaryOp, Span)>, ParseError> {
        let span = self.peek().span;
        let op = match self.peek_kind() {
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::BangEqual => BinaryOp::NotEqual,
            TokenKind::Less => BinaryOp::Less,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::In => BinaryOp::In,
            TokenKind::Is => {
                self.advance();
                let op = if self.match_kind(TokenKind::Not) {
                    BinaryOp::IsNot
                } else {
                    BinaryOp::Is
                };
                return Ok(Some((op, span)));
            }
            TokenKind::Not => {
                self.advance();
                if self.match_kind(TokenKind::In) {
                    return Ok(Some((BinaryOp::NotIn, span)));
                }
                return Err(ParseError {
                    kind: ParseErrorKind::NotWithoutIn,
                    span,
                });
            }
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some((op, span)))
    }

    fn bit_or(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(&[(TokenKind::Pipe, BinaryOp::BitOr)], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(&[(TokenKind::Caret, BinaryOp::BitXor)], Self::bit_and)
    }

    fn bit_and(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(&[(TokenKind::Ampersand, BinaryOp::BitAnd)], Self::shift)
    }

    fn shift(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(SHIFT, Self::additive)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(ADDITIVE, Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.left_assoc(MULTIPLICATIVE, Self::unary)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_kind() {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return self.power(),
        };
        let span = self.advance().span;
        let right = self.unary()?;
        Ok(Expr::Unary {
            op,
            span,
            right: Box::new(right),
        })
    }

    /// Right-associative: `a ** b ** c` is `a ** (b ** c)`.
    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.atom()?;

        if self.match_kind(TokenKind::StarStar) {
            let span = self.previous().span;
            let exponent = self.unary()?;
            return Ok(Expr::Binary(Binary {
                left: Box::new(base),
                op: BinaryOp::Power,
                span,
                right: Box::new(exponent),
            }));
        }

        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();

        let expr = match token.kind {
            TokenKind::True => Expr::Literal(Literal::Boolean(true)),
            TokenKind::False => Expr::Literal(Literal::Boolean(false)),
            TokenKind::Null => Expr::Literal(Literal::Null),
            TokenKind::Number | TokenKind::String => Expr::Literal(literal_of(&token)),
            TokenKind::Identifier | TokenKind::Command => Expr::Variable(token),
            TokenKind::LeftParen => {
                self.advance();
                if self.check(TokenKind::Command) {
                    let name = self.advance();
                    return self.call(name);
                }
                let inner = self.expression()?;
                self.consume(TokenKind::RightParen, "')' after expression")?;
                return Ok(Expr::Grouping(Box::new(inner)));
            }
            _ => {
                return Err(ParseError {
                    kind: ParseErrorKind::ExpectedExpression {
                        found: token.describe(),
                    },
                    span: token.span,
                });
            }
        };

        self.advance();
        Ok(expr)
    }

    /// `(NAME arg*)` after the opening paren and name.
    fn call(&mut self, name: Token) -> Result<Expr, ParseError> {
        let mut arguments = Vec::new();
        while !self.check(TokenKind::RightParen) && !self.is_at_end() {
            arguments.push(self.expression()?);
        }
        self.consume(TokenKind::RightParen, "')' after arguments")?;
        Ok(Expr::Call { name, arguments })
    }

    fn left_assoc(
        &mut self,
        operators: &[(TokenKind, BinaryOp)],
        next: Tier,
    ) -> Result<Expr, ParseError> {
        let mut expr = next(self)?;

        while let Some(op) = self.match_operator(operators) {
            let span = self.previous().span;
            let right = next(self)?;
            expr = Expr::Binary(Binary {
                left: Box::new(expr),
                op,
                span,
                right: Box::new(right),
            });
        }

        Ok(expr)
    }

    // -- Token cursor --

    fn peek(&self) -> &Token {
        // never past the trailing Eof
        &self.tokens[self.pos]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind() == TokenKind::Eof
    }

    fn at_line_end(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof
        )
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek_kind() == kind
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous().clone()
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn match_operator(&mut self, operators: &[(TokenKind, BinaryOp)]) -> Option<BinaryOp> {
        let kind = self.peek_kind();
        let op = operators
            .iter()
            .find(|(candidate, _)| *candidate == kind)
            .map(|&(_, op)| op)?;
        self.pos += 1;
        Some(op)
    }

    fn consume(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(ParseErrorKind::Expected {
                expected,
                found: self.peek().describe(),
            }))
        }
    }

    /// Simple statements end at a newline, or where the enclosing block
    /// or the input ends.
    fn expect_line_end(&mut self) -> Result<(), ParseError> {
        match self.peek_kind() {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Dedent | TokenKind::Eof => Ok(()),
            _ => Err(self.error_here(ParseErrorKind::Expected {
                expected: "newline after expression",
                found: self.peek().describe(),
            })),
        }
    }

    fn skip_newlines(&mut self) {
        while self.match_kind(TokenKind::Newline) {}
    }

    fn error_here(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            kind,
            span: self.peek().span,
        }
    }

    /// Skip the indented block under a header that failed to parse, so
    /// one mistake is reported once.
    fn skip_orphan_block(&mut self) {
        if !self.check(TokenKind::Indent) {
            return;
        }

        let mut depth = 0usize;
        while !self.is_at_end() {
            match self.advance().kind {
                TokenKind::Indent => depth += 1,
                TokenKind::Dedent => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        self.skip_newlines();
    }

    /// Skip ahead to the start of the next line or statement keyword.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Newline {
                return;
            }

            match self.peek_kind() {
                TokenKind::For
                | TokenKind::If
                | TokenKind::Return
                | TokenKind::While
                | TokenKind::Init
                | TokenKind::Set => return,
                _ => {}
            }

            self.advance();
        }
    }
}

fn literal_of(token: &Token) -> Literal {
    match &token.literal {
        Some(TokenLiteral::Number(n)) => Literal::Number(*n),
        Some(TokenLiteral::Text(s)) => Literal::Text(s.clone()),
        None => Literal::Null,
    }
}
