use std::fmt;
use std::rc::Rc;

use crate::ast::Definition;
use crate::environment::Environment;
use crate::interpreter::{Flow, Interpreter, RuntimeError};
use crate::value::Value;

/// Number of arguments a callable accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Any number of arguments.
    Variadic,
}

impl Arity {
    #[must_use]
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Self::Fixed(n) => n == count,
            Self::Variadic => true,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Variadic => f.write_str("any"),
        }
    }
}

/// Anything a command call can resolve to.
///
/// The interpreter checks [`Callable::arity`] before calling, so
/// implementations receive exactly as many arguments as they declared.
pub trait Callable: fmt::Debug + fmt::Display {
    fn arity(&self) -> Arity;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

/// A `DEF`-declared command closed over its defining environment.
pub struct Function {
    declaration: Rc<Definition>,
    closure: Rc<Environment>,
}

impl Function {
    #[must_use]
    pub const fn new(declaration: Rc<Definition>, closure: Rc<Environment>) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

// The closure frame usually contains this function, so it is left out.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("params", &self.declaration.params.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<DEF {}>", self.name())
    }
}

impl Callable for Function {
    fn arity(&self) -> Arity {
        Arity::Fixed(self.declaration.params.len())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        let frame = Rc::new(Environment::with_enclosing(Rc::clone(&self.closure)));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            frame
                .define(&param.lexeme, argument)
                .map_err(|e| e.with_span(param.span))?;
        }

        interpreter.enter_call()?;
        let flow = interpreter.execute_block(&self.declaration.body, frame);
        interpreter.exit_call();

        let value = match flow? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Null,
        };
        tracing::trace!(command = self.name(), result = %value, "returned");
        Ok(value)
    }
}

/// Signature of a host-implemented command body.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Result<Value, RuntimeError>;

/// A command implemented in Rust.
#[derive(Debug, Clone, Copy)]
pub struct NativeCommand {
    name: &'static str,
    arity: Arity,
    func: NativeFn,
}

impl NativeCommand {
    #[must_use]
    pub const fn new(name: &'static str, arity: Arity, func: NativeFn) -> Self {
        Self { name, arity, func }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for NativeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<native command>")
    }
}

impl Callable for NativeCommand {
    fn arity(&self) -> Arity {
        self.arity
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        (self.func)(interpreter, &arguments)
    }
}
