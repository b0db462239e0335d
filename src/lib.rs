//! Lexer, parser, and tree-walking interpreter for Lin, a small
//! indentation-based scripting language.
//!
//! Names carry their role in their case: `UPPERCASE` words are commands
//! (built-in or declared with `DEF`), `lowercase` words are variables,
//! and mixed case is rejected by the lexer. Blocks are delimited by
//! indentation, as in Python.
//!
//! # Quick start
//!
//! ## Run a program
//!
//! ```
//! use std::cell::RefCell;
//! use std::io::Write;
//! use std::rc::Rc;
//!
//! use lin_rs::{Interpreter, parse_str, standard_environment};
//!
//! #[derive(Clone, Default)]
//! struct Buffer(Rc<RefCell<Vec<u8>>>);
//!
//! impl Write for Buffer {
//!     fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
//!         self.0.borrow_mut().write(buf)
//!     }
//!     fn flush(&mut self) -> std::io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let source = "DEF ADD a b\n    RETURN a + b\nPRINT (ADD 1 2)\n";
//! let program = parse_str(source).unwrap();
//!
//! let buffer = Buffer::default();
//! let mut interpreter = Interpreter::new(standard_environment()).with_output(buffer.clone());
//! interpreter.interpret(&program).unwrap();
//!
//! assert_eq!(buffer.0.borrow().as_slice(), b"3\n");
//! ```
//!
//! ## Inspect the syntax tree
//!
//! ```
//! use lin_rs::{parse_str, print};
//!
//! let program = parse_str("PRINT 1 + 2 * 3\n").unwrap();
//! assert_eq!(print(&program), "(PRINT (+ 1 (* 2 3)))\n");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod callable;
pub mod config;
pub mod environment;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod printer;
mod stack;
pub mod stdlib;
pub mod token;
pub mod value;

pub use ast::{Binary, BinaryOp, Body, Definition, Expr, Literal, Stmt, UnaryOp};
pub use callable::{Arity, Callable, Function, NativeCommand};
pub use config::{DEFAULT_MAX_CALL_DEPTH, RuntimeConfig};
pub use environment::Environment;
pub use interpreter::{Flow, Interpreter, RuntimeError, RuntimeErrorKind};
pub use lexer::{LexError, LexErrorKind, LexErrors, tokenize};
pub use parser::{ParseError, ParseErrorKind, ParseErrors, parse};
pub use printer::print;
pub use stdlib::standard_environment;
pub use token::{Span, Token, TokenKind, TokenLiteral};
pub use value::Value;

/// Unified error type covering every stage of a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Syntax errors found while scanning.
    #[error("{0}")]
    Lex(#[from] LexErrors),
    /// Syntax errors found while parsing.
    #[error("{0}")]
    Parse(#[from] ParseErrors),
    /// The error that stopped execution.
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

/// Tokenize and parse a source string in one step.
pub fn parse_str(input: &str) -> Result<Vec<Stmt>, Error> {
    let tokens = tokenize(input)?;
    Ok(parse(&tokens)?)
}

/// Parse `source` and execute it with `interpreter`.
///
/// Nothing runs if the source has a syntax error.
pub fn run_with(interpreter: &mut Interpreter, source: &str) -> Result<(), Error> {
    let program = parse_str(source)?;
    interpreter.interpret(&program)?;
    Ok(())
}

/// Parse and execute `source` against a fresh standard environment,
/// printing to stdout.
pub fn run(source: &str) -> Result<(), Error> {
    run_with(&mut Interpreter::new(standard_environment()), source)
}
