use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::callable::{Arity, NativeCommand};
use crate::environment::Environment;
use crate::interpreter::{Interpreter, RuntimeError};
use crate::value::Value;

/// Every built-in command, in registration order.
#[must_use]
pub fn native_commands() -> Vec<NativeCommand> {
    vec![
        NativeCommand::new("PRINT", Arity::Variadic, native_print),
        NativeCommand::new("CLEAR", Arity::Fixed(0), native_clear),
        NativeCommand::new("CLOCK", Arity::Fixed(0), native_clock),
    ]
}

/// Build the root scope holding the built-in commands.
///
/// Each call returns a fresh frame, so separate runs never share state.
#[must_use]
pub fn standard_environment() -> Rc<Environment> {
    let bindings = native_commands().into_iter().map(|command| {
        let name = command.name().to_string();
        (name, Value::Callable(Rc::new(command)))
    });
    Rc::new(Environment::from_values(bindings))
}

fn native_print(interpreter: &mut Interpreter, arguments: &[Value]) -> Result<Value, RuntimeError> {
    let line = arguments
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(interpreter.output(), "{line}").map_err(|e| RuntimeError::output(&e))?;
    Ok(Value::Null)
}

fn native_clear(interpreter: &mut Interpreter, _: &[Value]) -> Result<Value, RuntimeError> {
    let out = interpreter.output();
    writeln!(out, "\x1b[H\x1b[2J")
        .and_then(|()| out.flush())
        .map_err(|e| RuntimeError::output(&e))?;
    Ok(Value::Null)
}

fn native_clock(_: &mut Interpreter, _: &[Value]) -> Result<Value, RuntimeError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0.0, |elapsed| (elapsed.as_secs_f64() * 1000.0).floor());
    Ok(Value::Number(millis))
}
