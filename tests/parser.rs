//! Parser structure, precedence, and error-recovery tests.

use lin_rs::{
    BinaryOp, Error, Expr, Literal, ParseErrorKind, ParseErrors, Stmt, parse, parse_str, tokenize,
};

fn parse_ok(input: &str) -> Vec<Stmt> {
    parse_str(input).unwrap_or_else(|e| panic!("parse failed: {e}\n--- source ---\n{input}"))
}

fn parse_errors(input: &str) -> ParseErrors {
    match parse_str(input) {
        Err(Error::Parse(errors)) => errors,
        other => panic!("expected parse errors, got {other:?}"),
    }
}

// -----------------------------------------------------------
// Program shape.
// -----------------------------------------------------------

#[test]
fn empty_program() {
    assert!(parse_ok("").is_empty());
}

#[test]
fn leading_blank_lines() {
    assert_eq!(parse_ok("\n\n\nPRINT 1\n").len(), 1);
}

#[test]
fn nested_definitions_form_one_statement() {
    let program = parse_ok("DEF HELLO\n    DEF SUM\n        PRINT 1 + 2\n\n    SUM");
    assert_eq!(program.len(), 1);

    let Stmt::Definition(hello) = &program[0] else {
        panic!("expected definition");
    };
    assert_eq!(hello.body.statements.len(), 2);
}

#[test]
fn uneven_indentation_splits_statements() {
    let program = parse_ok("DEF HELLO\n DEF SUM  \n   PRINT 1 + 2\nSUM");
    assert_eq!(program.len(), 2);
}

#[test]
fn parse_accepts_raw_token_streams() {
    let tokens = tokenize("INIT a 1\n").expect("tokenize");
    let program = parse(&tokens).expect("parse");
    assert!(matches!(&program[0], Stmt::Init { .. }));
}

// -----------------------------------------------------------
// Expressions.
// -----------------------------------------------------------

fn call_argument(program: &[Stmt]) -> &Expr {
    let Some(Stmt::Expression(Expr::Call { arguments, .. })) = program.first() else {
        panic!("expected command call, got {program:?}");
    };
    &arguments[0]
}

#[test]
fn ternary_precedence() {
    let program = parse_ok("DEF HELLO\n    PRINT 1 + 2 if 1 + 2 > 2 else 2 + 3\n");
    let Stmt::Definition(def) = &program[0] else {
        panic!("expected definition");
    };
    let Stmt::Expression(Expr::Call { arguments, .. }) = &def.body.statements[0] else {
        panic!("expected PRINT call");
    };
    let Expr::Ternary {
        condition,
        left,
        right,
    } = &arguments[0]
    else {
        panic!("expected ternary");
    };

    assert!(matches!(**condition, Expr::Comparison(_)));
    assert!(matches!(&**left, Expr::Binary(b) if b.op == BinaryOp::Add));
    assert!(matches!(&**right, Expr::Binary(b) if b.op == BinaryOp::Add));
}

#[test]
fn comparison_chain_keeps_operator_order() {
    let program = parse_ok("PRINT 4 >= 2 < 3");
    let Expr::Comparison(chain) = call_argument(&program) else {
        panic!("expected comparison");
    };
    let ops: Vec<_> = chain.iter().map(|pair| pair.op).collect();
    assert_eq!(ops, vec![BinaryOp::GreaterEqual, BinaryOp::Less]);
}

#[test]
fn unary_minus_binds_looser_than_power() {
    let program = parse_ok("PRINT -2 ** 2");
    assert!(matches!(
        call_argument(&program),
        Expr::Unary { right, .. }
            if matches!(**right, Expr::Binary(ref b) if b.op == BinaryOp::Power)
    ));
}

#[test]
fn bitwise_tiers() {
    // | < ^ < & < shifts < additive
    let program = parse_ok("PRINT 1 | 2 ^ 3 & 4 << 5 + 6");
    let Expr::Binary(or) = call_argument(&program) else {
        panic!("expected binary");
    };
    assert_eq!(or.op, BinaryOp::BitOr);
    let Expr::Binary(xor) = &*or.right else {
        panic!("expected xor");
    };
    assert_eq!(xor.op, BinaryOp::BitXor);
    let Expr::Binary(and) = &*xor.right else {
        panic!("expected and");
    };
    assert_eq!(and.op, BinaryOp::BitAnd);
    let Expr::Binary(shift) = &*and.right else {
        panic!("expected shift");
    };
    assert_eq!(shift.op, BinaryOp::ShiftLeft);
}

#[test]
fn logical_operators() {
    let program = parse_ok("PRINT a or b and not c");
    let Expr::Binary(or) = call_argument(&program) else {
        panic!("expected binary");
    };
    assert_eq!(or.op, BinaryOp::Or);
    assert!(matches!(&*or.right, Expr::Binary(b) if b.op == BinaryOp::And));
}

#[test]
fn literals() {
    let program = parse_ok("PRINT true false none 1.5 \"s\"");
    let Some(Stmt::Expression(Expr::Call { arguments, .. })) = program.first() else {
        panic!("expected call");
    };
    assert_eq!(
        arguments,
        &vec![
            Expr::Literal(Literal::Boolean(true)),
            Expr::Literal(Literal::Boolean(false)),
            Expr::Literal(Literal::Null),
            Expr::Literal(Literal::Number(1.5)),
            Expr::Literal(Literal::Text("s".into())),
        ]
    );
}

#[test]
fn elsif_chains() {
    let program = parse_ok("IF a\n  PASS\nELSIF b\n  PASS\n");
    let Stmt::Condition {
        else_branch: Some(else_branch),
        ..
    } = &program[0]
    else {
        panic!("expected condition with else");
    };
    assert!(matches!(else_branch.statements[0], Stmt::Condition { .. }));
}

// -----------------------------------------------------------
// Errors and recovery.
// -----------------------------------------------------------

#[test]
fn init_with_two_values_fails() {
    let errors = parse_errors("INIT a 1 2");
    assert_eq!(errors.0.len(), 1);
}

#[test]
fn set_with_two_values_fails() {
    let errors = parse_errors("SET a 1 2");
    assert_eq!(errors.0.len(), 1);
}

#[test]
fn mismatched_parens() {
    let errors = parse_errors("PRINT (1 + 2\n");
    assert!(matches!(
        errors.0[0].kind,
        ParseErrorKind::Expected {
            expected: "')' after expression",
            ..
        }
    ));
}

#[test]
fn missing_ternary_else() {
    let errors = parse_errors("PRINT 1 if true\n");
    assert!(matches!(
        errors.0[0].kind,
        ParseErrorKind::Expected {
            expected: "'else' in conditional expression",
            ..
        }
    ));
}

#[test]
fn not_without_in() {
    let errors = parse_errors("PRINT a not b\n");
    assert_eq!(errors.0[0].kind, ParseErrorKind::NotWithoutIn);
}

#[test]
fn def_requires_command_name() {
    let errors = parse_errors("DEF add\n  PASS\n");
    assert!(matches!(
        errors.0[0].kind,
        ParseErrorKind::Expected {
            expected: "command name after DEF",
            ..
        }
    ));
}

#[test]
fn multiple_errors_in_one_pass() {
    let errors = parse_errors("INIT 1\nPRINT 1\nSET a\nWHILE\n");
    assert_eq!(errors.0.len(), 3);
    let rendered = errors.to_string();
    assert_eq!(rendered.lines().count(), 3);
    assert!(rendered.starts_with("expected variable name, found '1' at line 1, column 6"));
}

#[test]
fn errors_inside_blocks_are_recovered() {
    let errors = parse_errors("DEF F\n  INIT a 1 2\n  PRINT a\nPRINT )\n");
    let lines: Vec<_> = errors.0.iter().map(|e| e.span.line).collect();
    assert_eq!(lines, vec![2, 4]);
}

#[test]
fn bad_block_header_reports_once() {
    let errors = parse_errors("IF )\n  PRINT 1\n  IF x\n    PRINT 2\nPRINT 3\n");
    assert_eq!(errors.0.len(), 1);
    assert_eq!(
        errors.0[0].kind,
        ParseErrorKind::ExpectedExpression {
            found: "')'".into()
        }
    );
}

#[test]
fn stray_indented_block_reports_once() {
    let errors = parse_errors("PRINT 1\n  PRINT 2\n  PRINT 3\nPRINT )\n");
    let kinds: Vec<_> = errors.0.iter().map(|e| (e.span.line, e.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (2, ParseErrorKind::UnexpectedIndent),
            (
                4,
                ParseErrorKind::ExpectedExpression {
                    found: "')'".into()
                }
            ),
        ]
    );
}

#[test]
fn lex_errors_stop_before_parsing() {
    assert!(matches!(parse_str("INIT aB 1 2"), Err(Error::Lex(_))));
}
