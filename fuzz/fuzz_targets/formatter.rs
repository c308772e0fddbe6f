//! Fuzz target: formatter.
//!
//! Invariants checked:
//! - `format_text` must NEVER panic, even on garbage input.
//! - Output must not explode: len(output) <= 8 x len(input) + 4096.
//! - Formatting valid code twice (idempotency) must be stable.
//! - Non-default option combinations must not panic.

use mlfmt::{format_text, FormatOptions};

#[test]
fn formatter() {
    bolero::check!().for_each(|data: &[u8]| {
        // Cap input to avoid huge allocations.
        if data.len() > 64 * 1024 {
            return;
        }
        let src = String::from_utf8_lossy(data);

        // Phase 1: Default options - must not panic.
        let Ok(formatted) = format_text(&src, &FormatOptions::default()) else {
            return;
        };

        // Phase 2: Output must not explode in size.
        let max_len = src.len().saturating_mul(8).saturating_add(4096);
        assert!(
            formatted.len() <= max_len,
            "Formatter output explosion: input {} bytes -> output {} bytes (limit {})",
            src.len(),
            formatted.len(),
            max_len,
        );

        // Phase 3: Idempotency - formatting the output again must match.
        let formatted2 = format_text(&formatted, &FormatOptions::default())
            .expect("formatter output must reformat");
        assert_eq!(
            formatted, formatted2,
            "Formatter is not idempotent on this input"
        );

        // Phase 4: Non-default options must not panic.
        let narrow = FormatOptions {
            max_width: 40,
            ribbon_frac: 0.5,
            indent_width: 4,
            tab_width: 8,
        };
        let _ = format_text(&src, &narrow);

        let tight = FormatOptions {
            max_width: 1,
            ribbon_frac: 1.0,
            indent_width: 0,
            tab_width: 1,
        };
        let _ = format_text(&src, &tight);
    });
}
