//! Fuzz target: lexer + parser.
//!
//! Invariants checked:
//! - Lexing and parsing must NEVER panic, on any byte soup.
//! - A lex failure still yields a usable partial token prefix.
//! - Parsing formatted output of a valid parse must succeed.

use mlfmt::{format_text, lex, parse, FormatOptions, LexResult, ParseResult};

#[test]
fn parser() {
    bolero::check!().for_each(|data: &[u8]| {
        // Cap input size to prevent pathological allocations.
        if data.len() > 64 * 1024 {
            return;
        }
        let src = String::from_utf8_lossy(data);

        // Phase 1: Lex - must not panic; failures keep their prefix.
        let tokens = match lex(&src) {
            LexResult::Success(tokens) => tokens,
            LexResult::Failure { partial, error } => {
                assert!(!error.what.is_empty());
                let _ = partial;
                return;
            }
        };

        // Phase 2: Parse - must not panic, never hangs.
        let result = parse(tokens);

        // Phase 3: If the input parses, formatting must produce output
        // that parses again.
        if matches!(result, ParseResult::Success(_)) {
            let formatted = format_text(&src, &FormatOptions::default())
                .expect("parseable input must format");
            let LexResult::Success(tokens2) = lex(&formatted) else {
                panic!("formatted output failed to lex");
            };
            assert!(
                matches!(parse(tokens2), ParseResult::Success(_)),
                "formatting broke a valid program"
            );
        }
    });
}
