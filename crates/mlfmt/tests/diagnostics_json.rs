use mlfmt::{format_text, FormatOptions};

#[test]
fn diagnostics_serialize_with_a_stable_shape() {
    let error = format_text("val s = \"oops", &FormatOptions::default())
        .expect_err("unterminated string");
    let value = serde_json::to_value(&error).expect("serialize");
    assert_eq!(value["what"], "unterminated string literal");
    assert!(value["explain"].is_string());
    assert_eq!(value["span"]["start"]["line"], 1);
    assert_eq!(value["span"]["start"]["column"], 9);
}
