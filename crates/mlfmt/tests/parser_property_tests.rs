#![cfg(feature = "proptest")]

use mlfmt::{format_text, lex, parse, FormatOptions, LexResult, ParseResult};
use proptest::prelude::*;
use proptest::string::string_regex;

fn leaf_exp() -> impl Strategy<Value = String> {
    let int_lit = (0u32..=10_000).prop_map(|n| n.to_string());
    let neg_lit = (1u32..=999).prop_map(|n| format!("~{n}"));
    let text_lit = string_regex("[a-z]{0,10}")
        .expect("regex")
        .prop_map(|s| format!("\"{s}\""));
    let ident = Just("value0".to_string());
    prop_oneof![int_lit, neg_lit, text_lit, ident]
}

fn exp_strategy() -> impl Strategy<Value = String> {
    leaf_exp().prop_recursive(4, 48, 8, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({a}, {b})")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} + {b}")),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} :: {b} :: nil")),
            (inner.clone(), inner.clone())
                .prop_map(|(t, e)| format!("if true then {t} else {e}")),
            inner.clone().prop_map(|e| format!("(fn x => x) {e}")),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| format!("let val inner = {a} in inner + {b} end")),
        ]
    })
}

fn program_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(exp_strategy(), 1..6).prop_map(|exps| {
        let mut out = String::new();
        for (index, exp) in exps.iter().enumerate() {
            out.push_str(&format!("val value{index} = {exp}\n"));
        }
        out
    })
}

proptest! {
    #[test]
    fn parser_never_panics_on_arbitrary_text(
        input in prop::collection::vec(any::<char>(), 0..2048)
            .prop_map(|chars| chars.into_iter().collect::<String>())
    ) {
        if let LexResult::Success(tokens) = lex(&input) {
            let _ = parse(tokens);
        }
    }

    #[test]
    fn formatter_round_trip_idempotent_on_generated_programs(program in program_strategy()) {
        let options = FormatOptions::default();
        let formatted1 = format_text(&program, &options)
            .expect("generated programs are well-formed");
        let reparsed = {
            let LexResult::Success(tokens) = lex(&formatted1) else {
                panic!("formatter output failed to lex:\n{formatted1}");
            };
            parse(tokens)
        };
        prop_assert!(
            matches!(reparsed, ParseResult::Success(_)),
            "formatter output failed to parse:\n{formatted1}"
        );
        let formatted2 = format_text(&formatted1, &options)
            .expect("formatter output reformats");
        prop_assert_eq!(formatted1, formatted2);
    }

    #[test]
    fn lines_respect_the_width_bound(program in program_strategy(), max_width in 30usize..100) {
        let options = FormatOptions { max_width, ..FormatOptions::default() };
        let formatted = format_text(&program, &options)
            .expect("generated programs are well-formed");
        for line in formatted.lines() {
            prop_assert!(
                line.chars().count() <= max_width,
                "line wider than {max_width}: {line:?}"
            );
        }
    }
}
