use crate::diagnostics::Diagnostic;
use crate::lexer::{lex, LexResult};
use crate::surface::*;

fn parse_ok(src: &str) -> Ast {
    let LexResult::Success(tokens) = lex(src) else {
        panic!("lex failed on: {src}");
    };
    match parse(tokens) {
        ParseResult::Success(ast) => ast,
        ParseResult::Failure { error, .. } => {
            panic!("parse failed: {} at {:?}", error.what, error.span)
        }
    }
}

fn parse_err(src: &str) -> Diagnostic {
    let LexResult::Success(tokens) = lex(src) else {
        panic!("lex failed on: {src}");
    };
    match parse(tokens) {
        ParseResult::Success(_) => panic!("expected a parse error for: {src}"),
        ParseResult::Failure { error, .. } => error,
    }
}

/// The expression of the only `val` binding in the last core declaration.
fn last_val_exp(ast: &Ast) -> &Exp {
    fn from_dec(dec: &Dec) -> Option<&Exp> {
        match dec {
            Dec::Val { bindings, .. } => bindings.last().map(|bind| &bind.exp),
            Dec::Seq { decs, .. } => decs.iter().rev().find_map(from_dec),
            _ => None,
        }
    }
    fn from_strdec(strdec: &StrDec) -> Option<&Exp> {
        match strdec {
            StrDec::Core(dec) => from_dec(dec),
            StrDec::Seq { decs, .. } => decs.iter().rev().find_map(from_strdec),
            _ => None,
        }
    }
    ast.topdecs
        .iter()
        .rev()
        .find_map(|(topdec, _)| match topdec {
            TopDec::Str(strdec) => from_strdec(strdec),
            _ => None,
        })
        .expect("a val binding")
}

#[test]
fn user_fixity_groups_with_equal_precedence_to_the_left() {
    let ast = parse_ok("infix 6 @@\nval x = 1 @@ 2 + 3");
    let Exp::Infix { left, op, .. } = last_val_exp(&ast) else {
        panic!("expected an infix expression");
    };
    assert_eq!(op.text, "+");
    let Exp::Infix { op: inner, .. } = left.as_ref() else {
        panic!("expected `1 @@ 2` grouped first");
    };
    assert_eq!(inner.text, "@@");
}

#[test]
fn cons_is_right_associative() {
    let ast = parse_ok("val x = 1 :: 2 :: nil");
    let Exp::Infix { right, op, .. } = last_val_exp(&ast) else {
        panic!("expected an infix expression");
    };
    assert_eq!(op.text, "::");
    assert!(matches!(right.as_ref(), Exp::Infix { .. }));
}

#[test]
fn mixed_associativity_at_equal_precedence_is_an_error() {
    let error = parse_err("infixr 6 +++\nval x = 1 + 2 +++ 3");
    assert_eq!(
        error.what,
        "operators of equal precedence with mixed associativity"
    );
    assert!(error.explain.is_some());
}

#[test]
fn long_identifier_parses_as_one_reference() {
    let ast = parse_ok("structure A = struct val z = B.C.d end");
    let (TopDec::Str(StrDec::Structure { bindings, .. }), _) = &ast.topdecs[0] else {
        panic!("expected a structure binding");
    };
    let StrExp::Struct { dec, .. } = &bindings[0].strexp else {
        panic!("expected a struct body");
    };
    let StrDec::Core(Dec::Val { bindings, .. }) = dec.as_ref() else {
        panic!("expected a val binding");
    };
    let Exp::Ident { id, .. } = &bindings[0].exp else {
        panic!("expected an identifier expression");
    };
    assert_eq!(id.pretty(), "B.C.d");
    assert_eq!(id.qualifiers.len(), 2);
}

#[test]
fn fun_clause_arity_mismatch_is_an_error() {
    let error = parse_err("fun f x = x\n  | f x y = x");
    assert_eq!(error.what, "fun clause arity mismatch");
}

#[test]
fn fun_clause_name_mismatch_is_an_error() {
    let error = parse_err("fun f x = x\n  | g x = x");
    assert_eq!(error.what, "fun clauses with different function names");
}

#[test]
fn fun_clause_headers_allow_infix_and_curried_infix() {
    let ast = parse_ok("infix 5 ++\nfun (x ++ y) z = x\n  | (x ++ y) z = y");
    let last = ast.topdecs.last().expect("topdec");
    let TopDec::Str(StrDec::Seq { decs, .. }) = &last.0 else {
        panic!("expected a declaration sequence");
    };
    let StrDec::Core(Dec::Fun { bindings, .. }) = &decs[1] else {
        panic!("expected a fun declaration");
    };
    assert!(matches!(
        bindings[0].clauses[0].head,
        FunClauseHead::CurriedInfix { .. }
    ));
    assert_eq!(bindings[0].clauses[0].head.arity(), 2);

    let ast = parse_ok("infix 5 ++\nfun x ++ y = (x, y)");
    let last = ast.topdecs.last().expect("topdec");
    let TopDec::Str(StrDec::Seq { decs, .. }) = &last.0 else {
        panic!("expected a declaration sequence");
    };
    let StrDec::Core(Dec::Fun { bindings, .. }) = &decs[1] else {
        panic!("expected a fun declaration");
    };
    assert!(matches!(
        bindings[0].clauses[0].head,
        FunClauseHead::Infix { .. }
    ));
}

#[test]
fn let_scoped_fixity_is_popped_at_end() {
    let src = "val a = let infix 5 ## fun (x ## y) () = x in 1 ## 2 end\nval b = op ## 3 4";
    let ast = parse_ok(src);
    // Inside the let, `##` is infix.
    // After `end`, `##` reverts to an ordinary identifier.
    let Exp::App { func, .. } = last_val_exp(&ast) else {
        panic!("expected an application after the let scope closed");
    };
    assert!(matches!(func.as_ref(), Exp::App { .. }));
}

#[test]
fn nonfix_demotes_an_operator() {
    let ast = parse_ok("nonfix +\nval x = + (1, 2)");
    assert!(matches!(last_val_exp(&ast), Exp::App { .. }));
}

#[test]
fn handle_binds_tighter_than_infix_operators() {
    let ast = parse_ok("val x = 1 + f a handle Overflow => 0");
    let Exp::Infix { op, right, .. } = last_val_exp(&ast) else {
        panic!("expected an infix expression at the top");
    };
    assert_eq!(op.text, "+");
    assert!(matches!(right.as_ref(), Exp::Handle { .. }));
}

#[test]
fn datatype_replication_and_withtype() {
    let ast = parse_ok("datatype t = datatype A.B.t");
    let (TopDec::Str(StrDec::Core(Dec::DatatypeRepl { rhs, .. })), _) = &ast.topdecs[0] else {
        panic!("expected a datatype replication");
    };
    assert_eq!(rhs.pretty(), "A.B.t");

    let ast = parse_ok("datatype 'a t = T of 'a pair withtype 'a pair = 'a * 'a");
    let (TopDec::Str(StrDec::Core(Dec::Datatype { withtype, .. })), _) = &ast.topdecs[0] else {
        panic!("expected a datatype declaration");
    };
    assert!(withtype.is_some());
}

#[test]
fn op_prefix_is_recorded_for_reemission() {
    let ast = parse_ok("val x = foldl op+ 0 xs");
    let Exp::App { func, .. } = last_val_exp(&ast) else {
        panic!("expected an application");
    };
    let Exp::App { func: inner, arg } = func.as_ref() else {
        panic!("expected a curried application");
    };
    assert!(matches!(inner.as_ref(), Exp::App { .. }));
    let _ = arg;
}

#[test]
fn signature_with_where_type_chain() {
    let src = "signature S = SIG where type t = int and type 'a u = 'a list";
    let ast = parse_ok(src);
    let (TopDec::Sig { bindings, .. }, _) = &ast.topdecs[0] else {
        panic!("expected a signature binding");
    };
    let SigExp::Where { clauses, .. } = &bindings[0].sigexp else {
        panic!("expected where refinements");
    };
    assert_eq!(clauses.len(), 2);
    assert_eq!(clauses[1].where_kw.text, "and");
}

#[test]
fn sharing_constraint_closes_over_the_preceding_specs() {
    let src = "signature S = sig\n  type t\n  structure A : sig type u end\n  sharing type A.u = t\nend";
    let ast = parse_ok(src);
    let (TopDec::Sig { bindings, .. }, _) = &ast.topdecs[0] else {
        panic!("expected a signature binding");
    };
    let SigExp::Sig { spec, .. } = &bindings[0].sigexp else {
        panic!("expected a sig body");
    };
    let Spec::Sharing { ids, type_kw, .. } = spec.as_ref() else {
        panic!("expected a sharing constraint, got {spec:?}");
    };
    assert!(type_kw.is_some());
    assert_eq!(ids.len(), 2);
}

#[test]
fn functor_with_opened_parameter_spec() {
    let src = "functor F (structure S : SIG val n : int) = struct val m = n end";
    let ast = parse_ok(src);
    let (TopDec::Functor { bindings, .. }, _) = &ast.topdecs[0] else {
        panic!("expected a functor binding");
    };
    assert!(matches!(bindings[0].param, FunParam::Opened { .. }));
}

#[test]
fn failure_keeps_the_prefix_of_parsed_topdecs() {
    let src = "val ok = 1\nsignature S = sig val broken end";
    let LexResult::Success(tokens) = lex(src) else {
        panic!("lex failed");
    };
    let ParseResult::Failure { partial, error } = parse(tokens) else {
        panic!("expected a failure");
    };
    assert_eq!(partial.len(), 1);
    assert_eq!(error.what, "expected `:` after the value name");
}

#[test]
fn dangling_else_attaches_to_the_innermost_if() {
    let ast = parse_ok("val x = if a then if b then 1 else 2 else 3");
    let Exp::If {
        then_exp, else_exp, ..
    } = last_val_exp(&ast)
    else {
        panic!("expected an if expression");
    };
    assert!(matches!(then_exp.as_ref(), Exp::If { .. }));
    assert!(matches!(else_exp.as_ref(), Exp::Const(_)));
}

#[test]
fn abstype_with_body_declarations() {
    let src = "abstype t = T of int with fun mk n = T n end";
    let ast = parse_ok(src);
    let (TopDec::Str(StrDec::Core(Dec::Abstype { dec, .. })), _) = &ast.topdecs[0] else {
        panic!("expected an abstype declaration");
    };
    assert!(matches!(dec.as_ref(), Dec::Fun { .. }));
}
