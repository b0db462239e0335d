//! End-to-end runs of the programs under `demos/`.

mod common;

use common::{output_of, run_capture};
use lin_rs::{Error, parse_str, print};
use pretty_assertions::assert_eq;

const FIZZBUZZ: &str = include_str!("../demos/fizzbuzz.lin");
const FUNCTIONS: &str = include_str!("../demos/functions.lin");
const COLLATZ: &str = include_str!("../demos/collatz.lin");

#[test]
fn fizzbuzz() {
    let expected = [
        "1", "2", "Fizz", "4", "Buzz", "Fizz", "7", "8", "Fizz", "Buzz", "11", "Fizz", "13", "14",
        "FizzBuzz",
    ];
    let output = output_of(FIZZBUZZ);
    assert_eq!(output.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn functions() {
    assert_eq!(
        output_of(FUNCTIONS),
        "120\n25\nHello, Lin!\n42\ntrue\n10\n"
    );
}

#[test]
fn collatz() {
    assert_eq!(output_of(COLLATZ), "steps: 111\n");
}

#[test]
fn demos_print_as_trees() {
    for (source, first_line) in [
        (FIZZBUZZ, "(INIT i 1)"),
        (FUNCTIONS, "(DEF FACT n ("),
        (COLLATZ, "(DEF STEPS n ("),
    ] {
        let program = parse_str(source).expect("parse failed");
        let printed = print(&program);
        assert_eq!(printed.lines().next(), Some(first_line));
    }
}

#[test]
fn windows_line_endings() {
    let source = FIZZBUZZ.replace('\n', "\r\n");
    assert_eq!(output_of(&source), output_of(FIZZBUZZ));
}

#[test]
fn one_bad_line_blocks_the_whole_program() {
    let source = format!("{FUNCTIONS}\nINIT broken 1 2\n");
    let (result, output) = run_capture(&source);
    let Err(Error::Parse(errors)) = result else {
        panic!("expected parse errors");
    };
    assert_eq!(errors.0.len(), 1);
    assert_eq!(output, "");
}

#[test]
fn runtime_failure_keeps_earlier_output() {
    let source = format!("{COLLATZ}PRINT (STEPS)\nPRINT \"unreached\"\n");
    let (result, output) = run_capture(&source);
    assert!(matches!(result, Err(Error::Runtime(_))));
    assert_eq!(output, "steps: 111\n");
}
