use std::fmt;
use std::rc::Rc;

use crate::token::{Span, Token};

/// Literal value written directly in source.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// `none`.
    Null,
}

/// Binary operator, including the two-word comparison forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    FloorDivide,
    Modulo,
    Power,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Is,
    IsNot,
    In,
    NotIn,
}

impl BinaryOp {
    /// Source spelling of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::FloorDivide => "//",
            Self::Modulo => "%",
            Self::Power => "**",
            Self::ShiftLeft => "<<",
            Self::ShiftRight => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::And => "and",
            Self::Or => "or",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Is => "is",
            Self::IsNot => "is not",
            Self::In => "in",
            Self::NotIn => "not in",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Prefix operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
    Plus,
    BitNot,
}

impl UnaryOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Negate => "-",
            Self::Plus => "+",
            Self::BitNot => "~",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A binary operation. Also the element type of a comparison chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Binary {
    pub left: Box<Expr>,
    pub op: BinaryOp,
    /// Location of the (first) operator token.
    pub span: Span,
    pub right: Box<Expr>,
}

/// Expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Parenthesized expression.
    Grouping(Box<Self>),
    Binary(Binary),
    Literal(Literal),
    Unary {
        op: UnaryOp,
        span: Span,
        right: Box<Self>,
    },
    /// `left if condition else right`.
    Ternary {
        condition: Box<Self>,
        left: Box<Self>,
        right: Box<Self>,
    },
    /// Variable or command reference.
    Variable(Token),
    /// Chain of adjacent pairwise comparisons: `a < b < c` holds
    /// `[a < b, b < c]`.
    Comparison(Vec<Binary>),
    /// `(NAME arg*)` or a bare command statement.
    Call { name: Token, arguments: Vec<Self> },
}

/// Indented statement sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub statements: Vec<Stmt>,
}

/// `DEF NAME param*` declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Body,
}

/// Statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `IF test` with optional `ELSE` branch.
    Condition {
        test: Expr,
        then_branch: Body,
        else_branch: Option<Body>,
    },
    /// `WHILE test`.
    Loop { test: Expr, body: Body },
    /// Shared so that every closure created from it points at one copy.
    Definition(Rc<Definition>),
    Return { value: Option<Expr>, span: Span },
    /// `SET name value`: mutate an existing binding.
    Set { name: Token, value: Expr },
    /// `INIT name value`: declare in the current frame.
    Init { name: Token, value: Expr },
    Expression(Expr),
    Body(Body),
    Pass,
}
