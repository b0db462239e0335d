use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use crate::ast::{Binary, BinaryOp, Body, Expr, Literal, Stmt, UnaryOp};
use crate::callable::{Arity, Function};
use crate::config::RuntimeConfig;
use crate::environment::Environment;
use crate::stack::ensure_sufficient_stack;
use crate::token::{Span, Token};
use crate::value::{Value, to_int32, to_uint32};

/// Classifies a runtime error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedVariable(String),
    AlreadyDefined(String),
    CommandNotFound(String),
    /// Call target resolved to a value of the named type.
    NotCallable(&'static str),
    ArityMismatch {
        expected: Arity,
        found: usize,
    },
    InvalidOperands {
        op: &'static str,
        expected: &'static str,
    },
    InvalidOperand {
        op: &'static str,
        expected: &'static str,
    },
    RecursionLimit(usize),
    /// Writing to the interpreter's output failed.
    Output(String),
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedVariable(name) => write!(f, "undefined variable '{name}'"),
            Self::AlreadyDefined(name) => write!(f, "'{name}' already defined"),
            Self::CommandNotFound(name) => write!(f, "command '{name}' not found"),
            Self::NotCallable(type_name) => {
                write!(f, "can only call commands, found {type_name}")
            }
            Self::ArityMismatch { expected, found } => {
                write!(f, "expected {expected} arguments but got {found}")
            }
            Self::InvalidOperands { op, expected } => {
                write!(f, "operands of '{op}' must be {expected}")
            }
            Self::InvalidOperand { op, expected } => {
                write!(f, "operand of '{op}' must be {expected}")
            }
            Self::RecursionLimit(depth) => {
                write!(f, "maximum call depth of {depth} exceeded")
            }
            Self::Output(message) => write!(f, "failed to write output: {message}"),
        }
    }
}

/// Error raised while running a program. The first one aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}", location(.span.as_ref()))]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Location of the offending token, when one is known.
    pub span: Option<Span>,
}

impl RuntimeError {
    #[must_use]
    pub const fn new(kind: RuntimeErrorKind) -> Self {
        Self { kind, span: None }
    }

    #[must_use]
    pub const fn at(kind: RuntimeErrorKind, span: Span) -> Self {
        Self {
            kind,
            span: Some(span),
        }
    }

    /// Attach `span` unless a more precise one is already set.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    #[must_use]
    pub fn output(err: &io::Error) -> Self {
        Self::new(RuntimeErrorKind::Output(err.to_string()))
    }
}

fn location(span: Option<&Span>) -> String {
    span.map_or_else(String::new, |span| {
        format!(" at line {}, column {}", span.line, span.column)
    })
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    /// A `RETURN` is unwinding to the nearest call boundary.
    Return(Value),
}

/// Tree-walking evaluator.
pub struct Interpreter {
    environment: Rc<Environment>,
    output: Box<dyn Write>,
    config: RuntimeConfig,
    call_depth: usize,
}

impl Interpreter {
    /// Create an interpreter whose root scope is `globals`, writing to
    /// stdout.
    #[must_use]
    pub fn new(globals: Rc<Environment>) -> Self {
        Self {
            environment: globals,
            output: Box::new(io::stdout()),
            config: RuntimeConfig::default(),
            call_depth: 0,
        }
    }

    #[must_use]
    pub const fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Redirect everything the program prints.
    #[must_use]
    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /// Sink for native commands that produce output.
    pub fn output(&mut self) -> &mut dyn Write {
        self.output.as_mut()
    }

    /// Run `program` statement by statement against the current scope.
    ///
    /// A top-level `RETURN` ends the run early without error.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = program.len()))]
    pub fn interpret(&mut self, program: &[Stmt]) -> Result<(), RuntimeError> {
        let result = self.execute_statements(program);
        self.output.flush().map_err(|e| RuntimeError::output(&e))?;

        match result {
            Ok(Flow::Return(_)) => {
                tracing::debug!("returned from top level");
                Ok(())
            }
            Ok(Flow::Normal) => Ok(()),
            Err(error) => {
                tracing::debug!(%error, "run aborted");
                Err(error)
            }
        }
    }

    /// Run `body` inside `environment`, restoring the current scope
    /// afterwards even if the body fails.
    pub fn execute_block(
        &mut self,
        body: &Body,
        environment: Rc<Environment>,
    ) -> Result<Flow, RuntimeError> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_statements(&body.statements);
        self.environment = previous;
        result
    }

    pub(crate) fn enter_call(&mut self) -> Result<(), RuntimeError> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(RuntimeError::new(RuntimeErrorKind::RecursionLimit(
                self.config.max_call_depth,
            )));
        }
        self.call_depth += 1;
        Ok(())
    }

    pub(crate) const fn exit_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> Result<Flow, RuntimeError> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        ensure_sufficient_stack(|| self.execute_statement(stmt))
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::Init { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .define(&name.lexeme, value)
                    .map_err(|e| e.with_span(name.span))?;
            }
            Stmt::Set { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .assign(&name.lexeme, value)
                    .map_err(|e| e.with_span(name.span))?;
            }
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            // IF and WHILE bodies share the current frame.
            Stmt::Condition {
                test,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(test)?.is_truthy() {
                    return self.execute_statements(&then_branch.statements);
                }
                if let Some(else_branch) = else_branch {
                    return self.execute_statements(&else_branch.statements);
                }
            }
            Stmt::Loop { test, body } => {
                while self.evaluate(test)?.is_truthy() {
                    if let Flow::Return(value) = self.execute_statements(&body.statements)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            Stmt::Body(body) => return self.execute_statements(&body.statements),
            Stmt::Definition(declaration) => {
                let function = Function::new(Rc::clone(declaration), Rc::clone(&self.environment));
                self.environment
                    .define(&declaration.name.lexeme, Value::Callable(Rc::new(function)))
                    .map_err(|e| e.with_span(declaration.name.span))?;
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::Pass => {}
        }
        Ok(Flow::Normal)
    }

    /// Evaluate a single expression in the current scope.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Variable(name) => self.environment.get(&name.lexeme).ok_or_else(|| {
                RuntimeError::at(
                    RuntimeErrorKind::UndefinedVariable(name.lexeme.clone()),
                    name.span,
                )
            }),
            Expr::Unary { op, span, right } => {
                let right = self.evaluate(right)?;
                apply_unary(*op, &right).map_err(|kind| RuntimeError::at(kind, *span))
            }
            Expr::Binary(binary) => self.binary(binary),
            Expr::Comparison(chain) => {
                for pair in chain {
                    if !self.binary(pair)?.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                }
                Ok(Value::Boolean(true))
            }
            Expr::Ternary {
                condition,
                left,
                right,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.evaluate(left)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Call { name, arguments } => self.call(name, arguments),
        }
    }

    fn binary(&mut self, binary: &Binary) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;
        apply_binary(binary.op, &left, &right).map_err(|kind| RuntimeError::at(kind, binary.span))
    }

    /// The name is resolved at the call site, so a later rebinding wins.
    /// A missing command is reported before any argument is evaluated.
    fn call(&mut self, name: &Token, arguments: &[Expr]) -> Result<Value, RuntimeError> {
        let Some(callee) = self
            .environment
            .get(&name.lexeme)
            .filter(|value| *value != Value::Null)
        else {
            return Err(RuntimeError::at(
                RuntimeErrorKind::CommandNotFound(name.lexeme.clone()),
                name.span,
            ));
        };

        let arguments = arguments
            .iter()
            .map(|argument| self.evaluate(argument))
            .collect::<Result<Vec<_>, _>>()?;

        let callable = match callee {
            Value::Callable(callable) => callable,
            other => {
                return Err(RuntimeError::at(
                    RuntimeErrorKind::NotCallable(other.type_name()),
                    name.span,
                ));
            }
        };

        let arity = callable.arity();
        if !arity.accepts(arguments.len()) {
            return Err(RuntimeError::at(
                RuntimeErrorKind::ArityMismatch {
                    expected: arity,
                    found: arguments.len(),
                },
                name.span,
            ));
        }

        tracing::trace!(command = %name.lexeme, arguments = arguments.len(), "calling");
        callable
            .call(self, arguments)
            .map_err(|e| e.with_span(name.span))
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("config", &self.config)
            .field("call_depth", &self.call_depth)
            .finish_non_exhaustive()
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Number(n) => Value::Number(*n),
        Literal::Text(s) => Value::from(s.as_str()),
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Null => Value::Null,
    }
}

fn apply_unary(op: UnaryOp, right: &Value) -> Result<Value, RuntimeErrorKind> {
    if op == UnaryOp::Not {
        return Ok(Value::Boolean(!right.is_truthy()));
    }

    let n = right.as_number().ok_or(RuntimeErrorKind::InvalidOperand {
        op: op.symbol(),
        expected: "a number",
    })?;

    Ok(Value::Number(match op {
        UnaryOp::Negate => -n,
        UnaryOp::BitNot => f64::from(!to_int32(n)),
        UnaryOp::Plus | UnaryOp::Not => n,
    }))
}

fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeErrorKind> {
    let invalid = |expected| RuntimeErrorKind::InvalidOperands {
        op: op.symbol(),
        expected,
    };
    let numbers = || match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(invalid("two numbers")),
    };
    let texts = || match (left, right) {
        (Value::Text(a), Value::Text(b)) => Ok((a, b)),
        _ => Err(invalid("two texts")),
    };
    let arithmetic = |f: fn(f64, f64) -> f64| numbers().map(|(a, b)| Value::Number(f(a, b)));
    let bitwise = |f: fn(i32, i32) -> i32| {
        numbers().map(|(a, b)| Value::Number(f64::from(f(to_int32(a), to_int32(b)))))
    };
    let shift = |f: fn(i32, u32) -> i32| {
        numbers().map(|(a, b)| Value::Number(f64::from(f(to_int32(a), to_uint32(b)))))
    };
    let relation = |f: fn(&f64, &f64) -> bool| numbers().map(|(a, b)| Value::Boolean(f(&a, &b)));

    match op {
        BinaryOp::Add => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Text(a), Value::Text(b)) => Ok(Value::from(format!("{a}{b}"))),
            _ => Err(invalid("two numbers or two texts")),
        },
        BinaryOp::Subtract => arithmetic(|a, b| a - b),
        BinaryOp::Multiply => arithmetic(|a, b| a * b),
        BinaryOp::Divide => arithmetic(|a, b| a / b),
        BinaryOp::Modulo => arithmetic(|a, b| a % b),
        BinaryOp::FloorDivide => arithmetic(|a, b| a - a % b),
        BinaryOp::Power => arithmetic(f64::powf),
        // shift counts are masked to five bits
        BinaryOp::ShiftLeft => shift(i32::wrapping_shl),
        BinaryOp::ShiftRight => shift(i32::wrapping_shr),
        BinaryOp::BitAnd => bitwise(|a, b| a & b),
        BinaryOp::BitOr => bitwise(|a, b| a | b),
        BinaryOp::BitXor => bitwise(|a, b| a ^ b),
        BinaryOp::And => Ok(Value::Boolean(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Boolean(left.is_truthy() || right.is_truthy())),
        BinaryOp::Equal => Ok(Value::Boolean(left == right)),
        BinaryOp::NotEqual => Ok(Value::Boolean(left != right)),
        BinaryOp::Less => relation(f64::lt),
        BinaryOp::LessEqual => relation(f64::le),
        BinaryOp::Greater => relation(f64::gt),
        BinaryOp::GreaterEqual => relation(f64::ge),
        BinaryOp::Is => relation(f64::eq),
        BinaryOp::IsNot => relation(f64::ne),
        BinaryOp::In => {
            texts().map(|(needle, haystack)| Value::Boolean(haystack.contains(&**needle)))
        }
        BinaryOp::NotIn => {
            texts().map(|(needle, haystack)| Value::Boolean(!haystack.contains(&**needle)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    fn binary(op: BinaryOp, a: &Value, b: &Value) -> Value {
        apply_binary(op, a, b).expect("operation failed")
    }

    #[test]
    fn floor_divide_is_left_minus_modulo() {
        assert_eq!(binary(BinaryOp::FloorDivide, &num(7.0), &num(2.0)), num(6.0));
        assert_eq!(binary(BinaryOp::FloorDivide, &num(-7.0), &num(2.0)), num(-6.0));
        assert_eq!(binary(BinaryOp::FloorDivide, &num(7.5), &num(2.0)), num(6.0));
    }

    #[test]
    fn modulo_keeps_sign_of_dividend() {
        assert_eq!(binary(BinaryOp::Modulo, &num(-7.0), &num(3.0)), num(-1.0));
    }

    #[test]
    fn text_concatenation() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::from("ab"), &Value::from("cd")),
            Value::from("abcd")
        );
    }

    #[test]
    fn mixed_addition_fails() {
        let err = apply_binary(BinaryOp::Add, &Value::from("a"), &num(1.0)).unwrap_err();
        assert_eq!(
            err,
            RuntimeErrorKind::InvalidOperands {
                op: "+",
                expected: "two numbers or two texts"
            }
        );
    }

    #[test]
    fn bitwise_uses_int32() {
        assert_eq!(binary(BinaryOp::BitOr, &num(5.7), &num(2.0)), num(7.0));
        assert_eq!(binary(BinaryOp::ShiftLeft, &num(1.0), &num(33.0)), num(2.0));
        assert_eq!(binary(BinaryOp::ShiftLeft, &num(1.0), &num(31.0)), num(-2_147_483_648.0));
        assert_eq!(binary(BinaryOp::ShiftRight, &num(-8.0), &num(1.0)), num(-4.0));
        assert_eq!(apply_unary(UnaryOp::BitNot, &num(5.0)), Ok(num(-6.0)));
    }

    #[test]
    fn logical_operators_return_booleans() {
        assert_eq!(binary(BinaryOp::And, &num(1.0), &Value::from("x")), Value::Boolean(true));
        assert_eq!(
            binary(BinaryOp::Or, &Value::Null, &Value::Boolean(false)),
            Value::Boolean(false)
        );
    }

    #[test]
    fn membership_requires_text() {
        assert_eq!(
            binary(BinaryOp::In, &Value::from("ell"), &Value::from("hello")),
            Value::Boolean(true)
        );
        assert_eq!(
            binary(BinaryOp::NotIn, &Value::from("z"), &Value::from("hello")),
            Value::Boolean(true)
        );
        assert!(apply_binary(BinaryOp::In, &num(1.0), &Value::from("1")).is_err());
    }

    #[test]
    fn is_requires_numbers() {
        assert_eq!(binary(BinaryOp::Is, &num(2.0), &num(2.0)), Value::Boolean(true));
        assert_eq!(binary(BinaryOp::IsNot, &num(2.0), &num(3.0)), Value::Boolean(true));
        assert!(apply_binary(BinaryOp::Is, &Value::Null, &Value::Null).is_err());
    }

    #[test]
    fn equality_on_none() {
        assert_eq!(binary(BinaryOp::Equal, &Value::Null, &Value::Null), Value::Boolean(true));
        assert_eq!(binary(BinaryOp::Equal, &Value::Null, &num(0.0)), Value::Boolean(false));
    }

    #[test]
    fn unary_plus_requires_number() {
        assert_eq!(
            apply_unary(UnaryOp::Plus, &Value::from("1")),
            Err(RuntimeErrorKind::InvalidOperand {
                op: "+",
                expected: "a number"
            })
        );
        assert_eq!(apply_unary(UnaryOp::Not, &num(0.0)), Ok(Value::Boolean(false)));
    }

    #[test]
    fn error_display_with_span() {
        let err = RuntimeError::at(
            RuntimeErrorKind::UndefinedVariable("x".into()),
            Span::new(3, 7),
        );
        assert_eq!(err.to_string(), "undefined variable 'x' at line 3, column 7");
        assert_eq!(
            RuntimeError::new(RuntimeErrorKind::RecursionLimit(8)).to_string(),
            "maximum call depth of 8 exceeded"
        );
        let arity = RuntimeErrorKind::ArityMismatch {
            expected: Arity::Fixed(2),
            found: 1,
        };
        assert_eq!(arity.to_string(), "expected 2 arguments but got 1");
    }
}
