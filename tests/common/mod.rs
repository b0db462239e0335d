#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use lin_rs::{
    Error, Interpreter, RuntimeConfig, Token, TokenKind, run_with, standard_environment, tokenize,
};

/// Cloneable in-memory sink; every clone appends to the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `source` with the standard environment, returning the result and
/// everything it printed.
pub fn run_capture(source: &str) -> (Result<(), Error>, String) {
    run_capture_with(source, RuntimeConfig::default())
}

pub fn run_capture_with(source: &str, config: RuntimeConfig) -> (Result<(), Error>, String) {
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::new(standard_environment())
        .with_config(config)
        .with_output(buffer.clone());
    let result = run_with(&mut interpreter, source);
    (result, buffer.contents())
}

/// Run `source`, panicking on any error, and return its output.
pub fn output_of(source: &str) -> String {
    let (result, output) = run_capture(source);
    if let Err(e) = result {
        panic!("program failed: {e}\n--- source ---\n{source}\n--- output ---\n{output}");
    }
    output
}

pub fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("tokenize failed")
        .iter()
        .map(|t: &Token| t.kind)
        .collect()
}
