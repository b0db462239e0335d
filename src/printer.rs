//! Debug printer that renders a parsed program as parenthesized text.
//!
//! Each top-level statement goes on its own line. Blocks open with `(`,
//! list their statements two spaces deeper, and close with `)` on a
//! line of their own.

use crate::ast::{Body, Expr, Literal, Stmt};
use crate::value::format_number;

/// Render `program` one statement per line.
#[must_use]
pub fn print(program: &[Stmt]) -> String {
    let mut out = String::new();
    for stmt in program {
        print_stmt(&mut out, stmt, 0);
        out.push('\n');
    }
    out
}

/// Render a single expression.
#[must_use]
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn print_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    match stmt {
        Stmt::Init { name, value } => {
            out.push_str("(INIT ");
            out.push_str(&name.lexeme);
            out.push(' ');
            write_expr(out, value);
            out.push(')');
        }
        Stmt::Set { name, value } => {
            out.push_str("(SET ");
            out.push_str(&name.lexeme);
            out.push(' ');
            write_expr(out, value);
            out.push(')');
        }
        Stmt::Condition {
            test,
            then_branch,
            else_branch,
        } => {
            out.push_str("(IF ");
            write_expr(out, test);
            out.push(' ');
            print_body(out, then_branch, depth);
            if let Some(else_branch) = else_branch {
                out.push(' ');
                print_body(out, else_branch, depth);
            }
            out.push(')');
        }
        Stmt::Loop { test, body } => {
            out.push_str("(WHILE ");
            write_expr(out, test);
            out.push(' ');
            print_body(out, body, depth);
            out.push(')');
        }
        Stmt::Definition(def) => {
            out.push_str("(DEF ");
            out.push_str(&def.name.lexeme);
            for param in &def.params {
                out.push(' ');
                out.push_str(&param.lexeme);
            }
            out.push(' ');
            print_body(out, &def.body, depth);
            out.push(')');
        }
        Stmt::Return { value, .. } => {
            out.push_str("(RETURN");
            if let Some(value) = value {
                out.push(' ');
                write_expr(out, value);
            }
            out.push(')');
        }
        Stmt::Expression(expr) => write_expr(out, expr),
        Stmt::Body(body) => print_body(out, body, depth),
        Stmt::Pass => out.push_str("(PASS)"),
    }
}

fn print_body(out: &mut String, body: &Body, depth: usize) {
    out.push('(');
    for stmt in &body.statements {
        out.push('\n');
        indent(out, depth + 1);
        print_stmt(out, stmt, depth + 1);
    }
    out.push('\n');
    indent(out, depth);
    out.push(')');
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Literal(literal) => write_literal(out, literal),
        Expr::Variable(name) => out.push_str(&name.lexeme),
        Expr::Grouping(inner) => parenthesize(out, "group", &[inner.as_ref()]),
        Expr::Unary { op, right, .. } => parenthesize(out, op.symbol(), &[right.as_ref()]),
        Expr::Binary(binary) => {
            parenthesize(out, binary.op.symbol(), &[binary.left.as_ref(), binary.right.as_ref()]);
        }
        Expr::Ternary {
            condition,
            left,
            right,
        } => parenthesize(out, "ternary", &[condition.as_ref(), left.as_ref(), right.as_ref()]),
        Expr::Comparison(chain) => {
            out.push_str("(comp");
            for pair in chain {
                out.push(' ');
                parenthesize(out, pair.op.symbol(), &[pair.left.as_ref(), pair.right.as_ref()]);
            }
            out.push(')');
        }
        Expr::Call { name, arguments } => {
            out.push('(');
            out.push_str(&name.lexeme);
            for argument in arguments {
                out.push(' ');
                write_expr(out, argument);
            }
            out.push(')');
        }
    }
}

fn parenthesize(out: &mut String, label: &str, exprs: &[&Expr]) {
    out.push('(');
    out.push_str(label);
    for expr in exprs {
        out.push(' ');
        write_expr(out, expr);
    }
    out.push(')');
}

fn write_literal(out: &mut String, literal: &Literal) {
    match literal {
        Literal::Number(n) => out.push_str(&format_number(*n)),
        Literal::Text(s) => {
            out.push('"');
            out.push_str(s);
            out.push('"');
        }
        Literal::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
        Literal::Null => out.push_str("none"),
    }
}
