use mlfmt::{format_text, lex, parse, FormatOptions, LexResult, ParseResult};

/// A corpus of parseable snippets covering the syntax the formatter
/// handles. Each must reformat, reparse, and reach a fixed point after
/// one pass.
const CORPUS: &[&str] = &[
    "fun fib n = if n < 2 then n\n else fib (n-1)\n  + fib (n-2)",
    "val (a, b) = (1, 2)\nval _ = (print \"hi\"; a + b)",
    "fun map f [] = []\n  | map f (x :: xs) = f x :: map f xs",
    "val r = {name = \"x\", value = 10}\nval n = #value r",
    "val c = #\"a\"\nval w = 0wxFF\nval h = 0x2a\nval e = 1e~7\nval pi = 3.14",
    "datatype 'a tree = Leaf | Node of 'a tree * 'a * 'a tree",
    "datatype t = T of int withtype u = t * t",
    "exception Empty\nexception Wrapped of string * int\nexception Alias = Empty",
    "abstype t = T of int with fun mk n = T n end",
    "val z = let val a = 1 val b = 2 in a + b end",
    "local fun helper x = x + 1 in fun public y = helper y end",
    "fun apply f x = f x handle Overflow => 0 | Div => 1",
    "val choose = fn true => 1 | false => 0",
    "val _ = while !running do step ()",
    "val ordered = 1 < 2 andalso 2 < 3 orelse false",
    "val typed = (identity : int -> int) 5",
    "infix 5 ##\nfun (x ## y) z = (x, y, z)",
    "nonfix +\nval sum = + (1, 2)",
    "val xs = [1, 2, 3] @ [4, 5]\nval ys = rev xs",
    "type 'a pair = 'a * 'a\ntype point = {x : real, y : real}",
    "signature STACK = sig\n  type 'a t\n  eqtype elem\n  val push : 'a t -> elem -> 'a t\n  datatype color = Red | Black\n  exception Empty\nend",
    "signature S = SIG where type t = int and type 'a u = 'a list",
    "signature W = sig\n  type t\n  structure A : sig type u end\n  sharing type A.u = t\nend",
    "structure Stack :> STACK = struct\n  datatype 'a t = Stack of 'a list\n  exception Empty\n  fun push (Stack xs) x = Stack (x :: xs)\nend",
    "structure A = struct val z = B.C.d end\nstructure B = A",
    "functor MkSet (Ord : ORD) = struct open Ord end",
    "functor F (structure S : SIG val n : int) :> SIG = struct val m = n end",
    "structure Applied = MkSet (IntOrd)\nstructure Inline = MkSet (struct val x = 1 end)",
    "datatype t = datatype A.B.t",
    "val s = \"tab\\tnewline\\n\\^G\\065\\u00e9\"\nval gap = \"start\\\n   \\end\"",
    "val x = 1; val y = 2;\nval z = x + y",
    "(* leading file comment *)\nval x = 1 (* trailing comment *)",
];

fn format(src: &str, options: &FormatOptions) -> String {
    match format_text(src, options) {
        Ok(formatted) => formatted,
        Err(error) => panic!("corpus snippet failed to format: {}\n{src}", error.what),
    }
}

#[test]
fn formatting_is_idempotent_across_the_corpus() {
    let options = FormatOptions::default();
    for src in CORPUS {
        let once = format(src, &options);
        let twice = format(&once, &options);
        assert_eq!(once, twice, "formatter not idempotent on:\n{src}\n---\n{once}");
    }
}

#[test]
fn formatted_output_always_reparses() {
    let options = FormatOptions::default();
    for src in CORPUS {
        let formatted = format(src, &options);
        let LexResult::Success(tokens) = lex(&formatted) else {
            panic!("formatted output failed to lex:\n{formatted}");
        };
        assert!(
            matches!(parse(tokens), ParseResult::Success(_)),
            "formatted output failed to parse:\n{formatted}"
        );
    }
}

#[test]
fn idempotence_holds_at_narrow_widths() {
    for max_width in [24, 40, 60] {
        let options = FormatOptions {
            max_width,
            ..FormatOptions::default()
        };
        for src in CORPUS {
            let once = format(src, &options);
            let twice = format(&once, &options);
            assert_eq!(
                once, twice,
                "formatter not idempotent at width {max_width} on:\n{src}"
            );
        }
    }
}

#[test]
fn every_comment_survives_formatting() {
    let src = "\
(* module header *)
val a = 1
(* about b *)
val b = (* inline *) 2
fun f x = (* body note *) x
";
    let formatted = format(src, &FormatOptions::default());
    for needle in [
        "(* module header *)",
        "(* about b *)",
        "(* inline *)",
        "(* body note *)",
    ] {
        assert!(
            formatted.contains(needle),
            "lost comment {needle}:\n{formatted}"
        );
    }
}

#[test]
fn wider_output_is_never_produced_than_the_input_needs() {
    // A fully flat file at the default width stays byte-identical.
    let src = "val x = 1\nval y = f x\n";
    assert_eq!(format(src, &FormatOptions::default()), src);
}
