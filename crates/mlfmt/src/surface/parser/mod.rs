use crate::diagnostics::{Diagnostic, Span};
use crate::fixity::{Assoc, Fixity, FixityEnv};
use crate::lexer::{Token, TokenKind};

use super::ast::*;

#[derive(Debug)]
pub enum ParseResult {
    Success(Ast),
    Failure {
        partial: Vec<TopDec>,
        error: Diagnostic,
    },
}

/// Parses a lexed token stream (terminated by its EOF token) into an AST.
/// The parser is fail-fast: the first syntax error aborts with the
/// top declarations parsed so far.
pub fn parse(tokens: Vec<Token>) -> ParseResult {
    let mut parser = Parser::new(tokens);
    let mut topdecs: Vec<(TopDec, Option<Token>)> = Vec::new();
    loop {
        if parser.at_eof() {
            let eof = parser.peek().clone();
            return ParseResult::Success(Ast { topdecs, eof });
        }
        match parser.parse_topdec() {
            Ok(entry) => topdecs.push(entry),
            Err(error) => {
                return ParseResult::Failure {
                    partial: topdecs.into_iter().map(|(dec, _)| dec).collect(),
                    error,
                }
            }
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    fixity: FixityEnv,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Parser {
        debug_assert!(
            tokens.last().is_some_and(|t| t.kind == TokenKind::Eof),
            "token stream must end with EOF"
        );
        Parser {
            tokens,
            pos: 0,
            fixity: FixityEnv::new(),
        }
    }

    // -- cursor --------------------------------------------------------

    fn peek(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("nonempty token stream"))
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().expect("nonempty token stream"))
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn at_symbol(&self, symbol: &str) -> bool {
        self.peek().is_symbol(symbol)
    }

    fn match_keyword(&mut self, keyword: &str) -> Option<Token> {
        if self.at_keyword(keyword) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn match_symbol(&mut self, symbol: &str) -> Option<Token> {
        if self.at_symbol(symbol) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect_keyword(&mut self, keyword: &str, what: &str) -> Result<Token, Diagnostic> {
        self.match_keyword(keyword).ok_or_else(|| self.error(what))
    }

    fn expect_symbol(&mut self, symbol: &str, what: &str) -> Result<Token, Diagnostic> {
        self.match_symbol(symbol).ok_or_else(|| self.error(what))
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn error(&self, what: &str) -> Diagnostic {
        Diagnostic::new(what, self.current_span())
    }

    fn error_explain(&self, what: &str, explain: &str) -> Diagnostic {
        Diagnostic::with_explain(what, explain, self.current_span())
    }

    // -- identifiers ---------------------------------------------------

    fn at_ident(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Ident | TokenKind::SymbolicIdent)
    }

    /// A possibly-qualified identifier: at lex time each `A`, `.`, `B`
    /// component is its own token; the parser assembles them on request.
    fn parse_long_id(&mut self) -> Result<LongId, Diagnostic> {
        if !self.at_ident() {
            return Err(self.error("expected an identifier"));
        }
        let mut qualifiers = Vec::new();
        let mut name = self.advance();
        while self.at_symbol(".") {
            if name.kind != TokenKind::Ident {
                return Err(self.error("expected a structure name before `.`"));
            }
            let dot = self.advance();
            if !self.at_ident() {
                return Err(self.error("expected an identifier after `.`"));
            }
            qualifiers.push((name, dot));
            name = self.advance();
        }
        Ok(LongId { qualifiers, name })
    }

    fn parse_plain_ident(&mut self, what: &str) -> Result<Token, Diagnostic> {
        if self.at_ident() {
            Ok(self.advance())
        } else {
            Err(self.error(what))
        }
    }

    /// True when the cursor sits on an unqualified identifier currently
    /// declared infix (or the special `=`, which is always infix in
    /// expressions). `op`-prefixed occurrences never reach this check.
    fn at_infix_operator(&self) -> bool {
        let token = self.peek();
        let is_candidate = matches!(
            token.kind,
            TokenKind::Ident | TokenKind::SymbolicIdent
        ) && !self.peek_at(1).is_symbol(".");
        if !is_candidate {
            return token.is_symbol("=");
        }
        self.fixity.lookup(&token.text).is_some()
    }

    fn operator_fixity(&self, token: &Token) -> Fixity {
        if token.is_symbol("=") {
            return Fixity {
                precedence: 4,
                assoc: Assoc::Left,
            };
        }
        self.fixity
            .lookup(&token.text)
            .expect("operator token has a fixity")
    }

    /// Optional `'a` / `('a, 'b)` binder sequence; commits to `Many` on `(`.
    fn parse_tyvarseq(&mut self) -> Result<SyntaxSeq<Token>, Diagnostic> {
        if self.peek().kind == TokenKind::TyVar {
            return Ok(SyntaxSeq::One(self.advance()));
        }
        if self.at_symbol("(") && self.peek_at(1).kind == TokenKind::TyVar {
            let left = self.advance();
            let mut elems = vec![self.advance()];
            let mut delims = Vec::new();
            while let Some(comma) = self.match_symbol(",") {
                delims.push(comma);
                if self.peek().kind != TokenKind::TyVar {
                    return Err(self.error("expected a type variable after `,`"));
                }
                elems.push(self.advance());
            }
            let right = self.expect_symbol(")", "expected `)` to close the type variable list")?;
            return Ok(SyntaxSeq::Many {
                left,
                elems,
                delims,
                right,
            });
        }
        Ok(SyntaxSeq::Empty)
    }
}

// -- infix resolution --------------------------------------------------

enum InfixItem<T> {
    Operand(T),
    Operator(Token, Fixity),
}

/// Rebrackets a flat operand/operator sequence by precedence climbing.
/// Equal precedence binds left between two left-associative operators and
/// right between two right-associative ones; mixing associativities at
/// equal precedence is a syntax error.
fn resolve_infix<T>(
    items: Vec<InfixItem<T>>,
    mk: &impl Fn(T, Token, T) -> T,
) -> Result<T, Diagnostic> {
    let mut iter = items.into_iter().peekable();
    let lhs = match iter.next() {
        Some(InfixItem::Operand(operand)) => operand,
        _ => unreachable!("infix sequence starts with an operand"),
    };
    let result = climb(lhs, &mut iter, 0, mk)?;
    debug_assert!(iter.next().is_none(), "infix sequence fully consumed");
    Ok(result)
}

fn climb<T>(
    mut lhs: T,
    iter: &mut std::iter::Peekable<std::vec::IntoIter<InfixItem<T>>>,
    min_prec: u8,
    mk: &impl Fn(T, Token, T) -> T,
) -> Result<T, Diagnostic> {
    loop {
        let fix = match iter.peek() {
            Some(InfixItem::Operator(_, fix)) if fix.precedence >= min_prec => *fix,
            _ => return Ok(lhs),
        };
        let op = match iter.next() {
            Some(InfixItem::Operator(token, _)) => token,
            _ => unreachable!(),
        };
        let mut rhs = match iter.next() {
            Some(InfixItem::Operand(operand)) => operand,
            _ => unreachable!("operators are binary"),
        };
        loop {
            let next = match iter.peek() {
                Some(InfixItem::Operator(token, next)) => {
                    if next.precedence == fix.precedence && next.assoc != fix.assoc {
                        return Err(Diagnostic::with_explain(
                            "operators of equal precedence with mixed associativity",
                            "Adjacent infix operators that share a precedence level must also share an associativity; parenthesize one side.",
                            token.span,
                        ));
                    }
                    *next
                }
                _ => break,
            };
            if next.precedence > fix.precedence {
                rhs = climb(rhs, iter, fix.precedence + 1, mk)?;
            } else if next.precedence == fix.precedence && fix.assoc == Assoc::Right {
                rhs = climb(rhs, iter, fix.precedence, mk)?;
            } else {
                break;
            }
        }
        lhs = mk(lhs, op, rhs);
    }
}

include!("tys.rs");
include!("pats.rs");
include!("exprs.rs");
include!("decs.rs");
include!("sigs.rs");
include!("strs.rs");
