use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interpreter::{RuntimeError, RuntimeErrorKind};
use crate::value::Value;

/// One frame of the lexical scope chain.
///
/// Frames are shared through `Rc`: the interpreter's current scope, every
/// active call, and every closure created in a frame each hold a handle,
/// and the frame is dropped with the last one.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<Environment>>,
    values: RefCell<HashMap<String, Value>>,
}

impl Environment {
    /// Create a root frame with no enclosing scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root frame pre-populated with bindings.
    #[must_use]
    pub fn from_values(values: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            enclosing: None,
            values: RefCell::new(values.into_iter().collect()),
        }
    }

    /// Create a frame nested inside `enclosing`.
    #[must_use]
    pub fn with_enclosing(enclosing: Rc<Self>) -> Self {
        Self {
            enclosing: Some(enclosing),
            values: RefCell::default(),
        }
    }

    /// Declare `name` in this frame only. Shadowing an outer binding is
    /// allowed; redeclaring one in the same frame is not.
    pub fn define(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut values = self.values.borrow_mut();
        if values.contains_key(name) {
            return Err(RuntimeError::new(RuntimeErrorKind::AlreadyDefined(
                name.to_string(),
            )));
        }
        values.insert(name.to_string(), value);
        Ok(())
    }

    /// Look `name` up through the enclosing chain.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut frame = self;
        loop {
            if let Some(value) = frame.values.borrow().get(name) {
                return Some(value.clone());
            }
            frame = frame.enclosing.as_deref()?;
        }
    }

    /// Rebind the nearest existing `name` in the enclosing chain.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let mut frame = self;
        loop {
            if let Some(slot) = frame.values.borrow_mut().get_mut(name) {
                *slot = value;
                return Ok(());
            }
            frame = frame.enclosing.as_deref().ok_or_else(|| {
                RuntimeError::new(RuntimeErrorKind::UndefinedVariable(name.to_string()))
            })?;
        }
    }
}
