use mlfmt::{format_text, FormatOptions};

fn format(src: &str) -> String {
    format_text(src, &FormatOptions::default()).expect("input should format")
}

#[test]
fn basic_fun_reflows_onto_structured_lines() {
    let input = "fun fib n = if n < 2 then n\n else fib (n-1)\n  + fib (n-2)";
    let expected = "\
fun fib n =
  if n < 2 then
    n
  else
    fib (n - 1) + fib (n - 2)
";
    assert_eq!(format(input), expected);
}

#[test]
fn block_comment_stays_attached_to_the_body() {
    let input = "fun fib n = (* c1\n               * c2 *) if n < 2 then n else 0";
    let expected = "\
fun fib n =
  (* c1
     * c2 *)
  if n < 2 then
    n
  else
    0
";
    assert_eq!(format(input), expected);
}

#[test]
fn val_group_collapses_to_one_line_per_binding() {
    let input = "val f5 = fib 5\nval f10 =\n  fib 10\nval f15 = fib 15";
    let expected = "val f5 = fib 5\nval f10 = fib 10\nval f15 = fib 15\n";
    assert_eq!(format(input), expected);
}

#[test]
fn lex_error_surfaces_as_a_diagnostic() {
    let error = format_text("val s = \"unterminated", &FormatOptions::default())
        .expect_err("unterminated string must not format");
    assert_eq!(error.what, "unterminated string literal");
    assert!(error.explain.is_some());
    assert_eq!(error.span.start.line, 1);
    assert_eq!(error.span.start.column, 9);
}

#[test]
fn user_fixity_round_trips_without_extra_parens() {
    let input = "infix 6 @@\nval x = 1 @@ 2 + 3";
    let expected = "infix 6 @@\nval x = 1 @@ 2 + 3\n";
    assert_eq!(format(input), expected);
}

#[test]
fn long_identifiers_reprint_verbatim() {
    let input = "structure A = struct val z = B.C.d end";
    let expected = "\
structure A =
struct
  val z = B.C.d
end
";
    assert_eq!(format(input), expected);
}

#[test]
fn case_rules_hang_under_the_scrutinee() {
    let input = "fun sign n = case Int.compare (n, 0) of LESS => ~1 | EQUAL => 0 | GREATER => 1";
    let expected = "\
fun sign n =
  case Int.compare (n, 0) of
    LESS => ~1
  | EQUAL => 0
  | GREATER => 1
";
    assert_eq!(format(input), expected);
}

#[test]
fn sequences_break_with_leading_delimiters() {
    let input = "val result = combine (alpha, beta, gamma, delta, epsilon) (zeta, eta, theta)";
    let options = FormatOptions {
        max_width: 20,
        ..FormatOptions::default()
    };
    let output = format_text(input, &options).expect("input should format");
    for line in output.lines() {
        assert!(
            line.chars().count() <= 20,
            "line wider than 20 columns: {line:?}"
        );
    }
    assert!(
        output.lines().any(|line| line.trim_start().starts_with(", ")),
        "continuation lines should lead with the delimiter:\n{output}"
    );
}

#[test]
fn let_spreads_over_at_least_three_lines() {
    let input = "val z = let val a = 1 in a end";
    let expected = "\
val z =
  let val a = 1
  in
    a
  end
";
    assert_eq!(format(input), expected);
}

#[test]
fn narrow_width_never_overflows_on_breakable_content() {
    let input = "fun process (alpha, beta) = transform alpha (combine beta gamma) (finish delta)";
    let options = FormatOptions {
        max_width: 24,
        ..FormatOptions::default()
    };
    let output = format_text(input, &options).expect("input should format");
    for line in output.lines() {
        assert!(
            line.chars().count() <= 24,
            "line wider than 24 columns: {line:?}"
        );
    }
}

#[test]
fn ribbon_fraction_forces_earlier_breaks() {
    let input = "val x = combine (a, b) (c, d)";
    let wide = format_text(input, &FormatOptions::default()).expect("format");
    assert_eq!(wide, "val x = combine (a, b) (c, d)\n");
    let narrow = format_text(
        input,
        &FormatOptions {
            ribbon_frac: 0.2,
            ..FormatOptions::default()
        },
    )
    .expect("format");
    assert!(narrow.lines().count() > 1, "ribbon should force breaks");
}
