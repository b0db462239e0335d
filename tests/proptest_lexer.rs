//! Property-based tests with proptest.
//!
//! Generate indented programs and arbitrary text, and check the layout
//! guarantees of the token stream plus the identifier case law.

mod common;

use common::output_of;
use lin_rs::{LexErrorKind, TokenKind, parse_str, tokenize, value::format_number};
use proptest::prelude::*;

// -- Strategies --

/// Indentation levels for a run of lines: starts at 0, and each line
/// is at most one level deeper than the one before.
fn levels() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0..4usize, 1..=24).prop_map(|raw| {
        let mut levels = Vec::with_capacity(raw.len());
        let mut previous = 0;
        for (i, want) in raw.into_iter().enumerate() {
            let level = if i == 0 { 0 } else { want.min(previous + 1) };
            levels.push(level);
            previous = level;
        }
        levels
    })
}

/// Well-formed program: a line followed by a deeper one becomes an
/// `IF true` header, every other line prints its index.
fn nested_program(levels: &[usize], unit: &str) -> (String, usize) {
    let mut source = String::new();
    let mut prints = 0;
    for (i, level) in levels.iter().enumerate() {
        source.push_str(&unit.repeat(*level));
        if levels.get(i + 1).is_some_and(|next| next > level) {
            source.push_str("IF true\n");
        } else {
            source.push_str(&format!("PRINT {i}\n"));
            prints += 1;
        }
    }
    (source, prints)
}

fn count(kinds: &[TokenKind], kind: TokenKind) -> usize {
    kinds.iter().filter(|k| **k == kind).count()
}

fn assert_layout(source: &str) -> Result<(), TestCaseError> {
    if let Ok(tokens) = tokenize(source) {
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        prop_assert_eq!(count(&kinds, TokenKind::Indent), count(&kinds, TokenKind::Dedent));
        prop_assert_eq!(count(&kinds, TokenKind::Eof), 1);
        prop_assert_eq!(kinds.last(), Some(&TokenKind::Eof));
    }
    Ok(())
}

// -- Property tests --

proptest! {
    /// Every generated layout balances INDENT and DEDENT.
    #[test]
    fn indentation_balances(levels in levels(), tabs in any::<bool>()) {
        let unit = if tabs { "\t" } else { "    " };
        let (source, _) = nested_program(&levels, unit);
        assert_layout(&source)?;
    }

    /// Arbitrary printable text never breaks the layout guarantees.
    #[test]
    fn arbitrary_input_balances(source in "[ -~\t\n]{0,200}") {
        assert_layout(&source)?;
    }

    /// Ragged indentation widths are accepted and still balance.
    #[test]
    fn ragged_indentation_balances(widths in prop::collection::vec(0..9usize, 1..=16)) {
        let source: String = widths
            .iter()
            .map(|w| format!("{}PASS\n", " ".repeat(*w)))
            .collect();
        assert_layout(&source)?;
    }

    /// Nested `IF true` blocks run every PRINT exactly once, in order.
    #[test]
    fn nested_blocks_execute(levels in levels()) {
        let (source, prints) = nested_program(&levels, "  ");
        prop_assert!(parse_str(&source).is_ok(), "failed to parse:\n{}", source);
        let output = output_of(&source);
        prop_assert_eq!(output.lines().count(), prints);
    }

    /// All-uppercase names are commands.
    #[test]
    fn uppercase_is_command(name in "[A-Z][A-Z_]{0,11}") {
        prop_assume!(TokenKind::keyword(&name).is_none());
        let tokens = tokenize(&name).expect("tokenize");
        prop_assert_eq!(tokens[0].kind, TokenKind::Command);
        prop_assert_eq!(&tokens[0].lexeme, &name);
    }

    /// All-lowercase names are variables.
    #[test]
    fn lowercase_is_identifier(name in "[a-z][a-z_]{0,11}") {
        prop_assume!(TokenKind::keyword(&name).is_none());
        let tokens = tokenize(&name).expect("tokenize");
        prop_assert_eq!(tokens[0].kind, TokenKind::Identifier);
    }

    /// Names mixing cases are rejected.
    #[test]
    fn mixed_case_is_rejected(
        lower in "[a-z]{1,6}",
        upper in "[A-Z]{1,6}",
        upper_first in any::<bool>()
    ) {
        let name = if upper_first { format!("{upper}{lower}") } else { format!("{lower}{upper}") };
        let errors = tokenize(&name).unwrap_err();
        prop_assert_eq!(&errors.0[0].kind, &LexErrorKind::InvalidIdentifier(name.clone()));
    }

    /// Integral numbers render without a fractional part.
    #[test]
    fn integers_render_plainly(n in -1_000_000i32..1_000_000) {
        prop_assert_eq!(format_number(f64::from(n)), n.to_string());
    }
}
