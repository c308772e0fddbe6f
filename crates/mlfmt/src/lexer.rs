use crate::diagnostics::{Diagnostic, Position, Span};
use crate::syntax;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Symbol,
    Ident,
    SymbolicIdent,
    TyVar,
    Int,
    Word,
    Real,
    Char,
    String,
    PathVar,
    Eof,
}

/// A comment rides on the token that follows it in the raw stream, so the
/// parser can skip comments without losing them and the formatter can put
/// them back in front of the construct they precede.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
    pub leading_comments: Vec<Comment>,
}

impl Token {
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == keyword
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.kind == TokenKind::Symbol && self.text == symbol
    }
}

#[derive(Debug)]
pub enum LexResult {
    Success(Vec<Token>),
    Failure { partial: Vec<Token>, error: Diagnostic },
}

impl LexResult {
    pub fn tokens(&self) -> &[Token] {
        match self {
            LexResult::Success(tokens) => tokens,
            LexResult::Failure { partial, .. } => partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Sml,
    Mlb,
}

/// Lexes a Standard ML source file.
pub fn lex(content: &str) -> LexResult {
    Lexer::new(content, Mode::Sml).run()
}

/// Lexes an ML Basis manifest. Only the token shapes the path scanner needs:
/// keywords, quoted paths, bare path atoms, and `$(VAR)` references.
pub fn lex_mlb(content: &str) -> LexResult {
    Lexer::new(content, Mode::Mlb).run()
}

struct Lexer {
    chars: Vec<char>,
    index: usize,
    line: usize,
    col: usize,
    mode: Mode,
    tokens: Vec<Token>,
    pending_comments: Vec<Comment>,
}

impl Lexer {
    fn new(content: &str, mode: Mode) -> Lexer {
        Lexer {
            chars: content.chars().collect(),
            index: 0,
            line: 1,
            col: 1,
            mode,
            tokens: Vec::new(),
            pending_comments: Vec::new(),
        }
    }

    fn run(mut self) -> LexResult {
        loop {
            self.skip_whitespace();
            let start = self.mark();
            let Some(ch) = self.peek() else {
                self.push(TokenKind::Eof, start);
                return LexResult::Success(self.tokens);
            };

            let result = if ch == '(' && self.peek_at(1) == Some('*') {
                self.lex_comment()
            } else if self.mode == Mode::Mlb {
                self.lex_mlb_token()
            } else if ch == '"' {
                self.lex_string(TokenKind::String, start)
            } else if ch == '#' && self.peek_at(1) == Some('"') {
                self.advance();
                self.lex_string(TokenKind::Char, start)
            } else if ch == '\'' {
                self.lex_tyvar()
            } else if ch.is_ascii_digit() || (ch == '~' && self.peek_at(1).is_some_and(|c| c.is_ascii_digit())) {
                self.lex_number()
            } else if ch.is_ascii_alphabetic() {
                self.lex_alpha();
                Ok(())
            } else if ch == '.' {
                self.lex_dots();
                Ok(())
            } else if ch == '_' {
                self.advance();
                self.push(TokenKind::Symbol, start);
                Ok(())
            } else if syntax::PUNCTUATION.contains(&ch) {
                self.advance();
                self.push(TokenKind::Symbol, start);
                Ok(())
            } else if syntax::is_symbolic_char(ch) {
                self.lex_symbolic();
                Ok(())
            } else {
                self.advance();
                Err(Diagnostic::with_explain(
                    format!("illegal character `{ch}`"),
                    "This character cannot begin any Standard ML token.",
                    self.span_from(start),
                ))
            };

            if let Err(error) = result {
                return LexResult::Failure {
                    partial: self.tokens,
                    error,
                };
            }
        }
    }

    // -- cursor --------------------------------------------------------

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += 1;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|ch| ch.is_ascii_whitespace()) {
            self.advance();
        }
    }

    fn mark(&self) -> (usize, usize, usize) {
        (self.index, self.line, self.col)
    }

    fn span_from(&self, start: (usize, usize, usize)) -> Span {
        let (_, line, col) = start;
        Span {
            start: Position { line, column: col },
            end: Position {
                line: self.line,
                column: self.col.saturating_sub(1).max(1),
            },
        }
    }

    fn text_from(&self, start: (usize, usize, usize)) -> String {
        self.chars[start.0..self.index].iter().collect()
    }

    fn push(&mut self, kind: TokenKind, start: (usize, usize, usize)) {
        let text = self.text_from(start);
        let span = self.span_from(start);
        let leading_comments = std::mem::take(&mut self.pending_comments);
        self.tokens.push(Token {
            kind,
            text,
            span,
            leading_comments,
        });
    }

    // -- comments ------------------------------------------------------

    fn lex_comment(&mut self) -> Result<(), Diagnostic> {
        let start = self.mark();
        self.advance();
        self.advance();
        let mut depth = 1usize;
        loop {
            match self.peek() {
                Some('(') if self.peek_at(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                Some('*') if self.peek_at(1) == Some(')') => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                Some(_) => {
                    self.advance();
                }
                None => {
                    return Err(Diagnostic::with_explain(
                        "unterminated comment",
                        "Block comments are delimited by `(*` and `*)` and may nest; this one is never closed.",
                        self.span_from(start),
                    ));
                }
            }
        }
        self.pending_comments.push(Comment {
            text: self.text_from(start),
            span: self.span_from(start),
        });
        Ok(())
    }

    // -- strings and characters ----------------------------------------

    fn lex_string(
        &mut self,
        kind: TokenKind,
        start: (usize, usize, usize),
    ) -> Result<(), Diagnostic> {
        self.advance();
        loop {
            match self.peek() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => self.lex_escape(start)?,
                Some('\n') | None => {
                    return Err(Diagnostic::with_explain(
                        "unterminated string literal",
                        "String literals must close with `\"` on the same line, or continue across lines with `\\ ... \\` gaps.",
                        self.span_from(start),
                    ));
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
        self.push(kind, start);
        Ok(())
    }

    fn lex_escape(&mut self, string_start: (usize, usize, usize)) -> Result<(), Diagnostic> {
        let escape_start = self.mark();
        self.advance();
        match self.peek() {
            Some('a' | 'b' | 't' | 'n' | 'v' | 'f' | 'r' | '"' | '\\') => {
                self.advance();
                Ok(())
            }
            Some('^') => {
                self.advance();
                match self.peek() {
                    Some(ch) if ('@'..='_').contains(&ch) => {
                        self.advance();
                        Ok(())
                    }
                    _ => Err(self.invalid_escape(escape_start)),
                }
            }
            Some('u') => {
                self.advance();
                for _ in 0..4 {
                    if !self.peek().is_some_and(|ch| ch.is_ascii_hexdigit()) {
                        return Err(self.invalid_escape(escape_start));
                    }
                    self.advance();
                }
                Ok(())
            }
            Some(ch) if ch.is_ascii_digit() => {
                for _ in 0..3 {
                    if !self.peek().is_some_and(|ch| ch.is_ascii_digit()) {
                        return Err(self.invalid_escape(escape_start));
                    }
                    self.advance();
                }
                Ok(())
            }
            Some(ch) if ch.is_ascii_whitespace() => {
                // Gap: `\ <whitespace> \` continues the string on a later line.
                while self.peek().is_some_and(|ch| ch.is_ascii_whitespace()) {
                    self.advance();
                }
                if self.peek() == Some('\\') {
                    self.advance();
                    Ok(())
                } else {
                    Err(Diagnostic::with_explain(
                        "unterminated string literal",
                        "A `\\` gap must skip only whitespace and close with another `\\`.",
                        self.span_from(string_start),
                    ))
                }
            }
            _ => Err(self.invalid_escape(escape_start)),
        }
    }

    fn invalid_escape(&mut self, escape_start: (usize, usize, usize)) -> Diagnostic {
        if self.peek().is_some() {
            self.advance();
        }
        Diagnostic::with_explain(
            "invalid escape sequence",
            "Valid escapes are \\a \\b \\t \\n \\v \\f \\r \\\" \\\\ \\^C \\ddd \\uXXXX and whitespace gaps `\\ ... \\`.",
            self.span_from(escape_start),
        )
    }

    // -- identifiers and numbers ---------------------------------------

    fn lex_tyvar(&mut self) -> Result<(), Diagnostic> {
        let start = self.mark();
        while self.peek() == Some('\'') {
            self.advance();
        }
        if !self.peek().is_some_and(is_ident_continue) {
            return Err(Diagnostic::with_explain(
                "illegal character `'`",
                "A prime begins a type variable such as `'a` or `''key` and must be followed by a name.",
                self.span_from(start),
            ));
        }
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        self.push(TokenKind::TyVar, start);
        Ok(())
    }

    fn lex_alpha(&mut self) {
        let start = self.mark();
        while self.peek().is_some_and(is_ident_continue) {
            self.advance();
        }
        let text = self.text_from(start);
        let keywords = match self.mode {
            Mode::Sml => syntax::KEYWORDS_ALL,
            Mode::Mlb => syntax::KEYWORDS_MLB,
        };
        let kind = if keywords.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        self.push(kind, start);
    }

    fn lex_symbolic(&mut self) {
        let start = self.mark();
        while self.peek().is_some_and(syntax::is_symbolic_char) {
            self.advance();
        }
        let text = self.text_from(start);
        let kind = if syntax::RESERVED_SYMBOLIC.contains(&text.as_str()) {
            TokenKind::Symbol
        } else {
            TokenKind::SymbolicIdent
        };
        self.push(kind, start);
    }

    fn lex_dots(&mut self) {
        let start = self.mark();
        self.advance();
        if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
            self.advance();
            self.advance();
        }
        self.push(TokenKind::Symbol, start);
    }

    fn lex_number(&mut self) -> Result<(), Diagnostic> {
        let start = self.mark();
        if self.peek() == Some('~') {
            self.advance();
        }
        let mut kind = TokenKind::Int;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('w' | 'x')) {
            self.advance();
            let is_word = self.peek() == Some('w');
            if is_word {
                self.advance();
                kind = TokenKind::Word;
            }
            let is_hex = self.peek() == Some('x');
            if is_hex {
                self.advance();
            }
            let digits = if is_hex {
                self.take_while(|ch| ch.is_ascii_hexdigit())
            } else {
                self.take_while(|ch| ch.is_ascii_digit())
            };
            if digits == 0 {
                return Err(self.invalid_number(start));
            }
            self.push(kind, start);
            return Ok(());
        }

        self.take_while(|ch| ch.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|ch| ch.is_ascii_digit()) {
            kind = TokenKind::Real;
            self.advance();
            self.take_while(|ch| ch.is_ascii_digit());
        } else if self.peek() == Some('.') && !matches!(self.peek_at(1), Some('.')) {
            self.advance();
            return Err(self.invalid_number(start));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut lookahead = 1;
            if self.peek_at(lookahead) == Some('~') {
                lookahead += 1;
            }
            if self.peek_at(lookahead).is_some_and(|ch| ch.is_ascii_digit()) {
                kind = TokenKind::Real;
                self.advance();
                if self.peek() == Some('~') {
                    self.advance();
                }
                self.take_while(|ch| ch.is_ascii_digit());
            }
        }
        self.push(kind, start);
        Ok(())
    }

    fn invalid_number(&self, start: (usize, usize, usize)) -> Diagnostic {
        Diagnostic::with_explain(
            "invalid numeric literal",
            "Numeric literals are decimal (`42`, `~7`), hex (`0x2a`), word (`0w13`, `0wx2a`), or real (`3.14`, `1e~7`).",
            self.span_from(start),
        )
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let mut count = 0;
        while self.peek().is_some_and(&pred) {
            self.advance();
            count += 1;
        }
        count
    }

    // -- MLB mode ------------------------------------------------------

    fn lex_mlb_token(&mut self) -> Result<(), Diagnostic> {
        let start = self.mark();
        let ch = self.peek().expect("caller checked for input");
        if ch == '"' {
            return self.lex_string(TokenKind::String, start);
        }
        if ch == '$' && self.peek_at(1) == Some('(') {
            self.advance();
            self.advance();
            while self.peek().is_some_and(|ch| ch != ')' && ch != '\n') {
                self.advance();
            }
            if self.peek() != Some(')') {
                return Err(Diagnostic::new(
                    "unterminated path variable reference",
                    self.span_from(start),
                ));
            }
            self.advance();
            self.push(TokenKind::PathVar, start);
            return Ok(());
        }
        if ch == '=' {
            self.advance();
            self.push(TokenKind::Symbol, start);
            return Ok(());
        }
        let took = self.take_while(|ch| {
            !ch.is_ascii_whitespace() && !matches!(ch, '"' | '=' | ';' | '(' | ')') && ch != '$'
        });
        if took == 0 {
            self.advance();
            return Err(Diagnostic::new(
                format!("illegal character `{ch}`"),
                self.span_from(start),
            ));
        }
        let text = self.text_from(start);
        let kind = if syntax::KEYWORDS_MLB.contains(&text.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        self.push(kind, start);
        Ok(())
    }
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '\'' || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(result: &LexResult) -> Vec<String> {
        result
            .tokens()
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.text.clone())
            .collect()
    }

    #[test]
    fn lex_classifies_keywords_identifiers_and_symbols() {
        let result = lex("val rec f = fn x => x + y'2");
        let LexResult::Success(tokens) = result else {
            panic!("expected success");
        };
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Keyword,
                TokenKind::Ident,
                TokenKind::Symbol,
                TokenKind::Keyword,
                TokenKind::Ident,
                TokenKind::Symbol,
                TokenKind::Ident,
                TokenKind::SymbolicIdent,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[9].text, "y'2");
    }

    #[test]
    fn lex_round_trips_token_slices_with_whitespace() {
        let src = "fun  f 0 = 1\n  | f n = n * f (n - 1)\n";
        let LexResult::Success(tokens) = lex(src) else {
            panic!("expected success");
        };
        // Rebuild the input from slices and the gaps between spans.
        let mut rebuilt = String::new();
        let mut line = 1;
        let mut col = 1;
        for token in &tokens {
            if token.kind == TokenKind::Eof {
                break;
            }
            while line < token.span.start.line {
                rebuilt.push('\n');
                line += 1;
                col = 1;
            }
            while col < token.span.start.column {
                rebuilt.push(' ');
                col += 1;
            }
            rebuilt.push_str(&token.text);
            line = token.span.end.line;
            col = token.span.end.column + 1;
        }
        rebuilt.push('\n');
        assert_eq!(rebuilt, src);
    }

    #[test]
    fn lex_attaches_comments_to_the_following_token() {
        let src = "(* outer (* nested *) still outer *) val x = 1";
        let LexResult::Success(tokens) = lex(src) else {
            panic!("expected success");
        };
        assert!(tokens[0].is_keyword("val"));
        assert_eq!(tokens[0].leading_comments.len(), 1);
        assert_eq!(
            tokens[0].leading_comments[0].text,
            "(* outer (* nested *) still outer *)"
        );
    }

    #[test]
    fn lex_trailing_comment_rides_on_eof() {
        let LexResult::Success(tokens) = lex("val x = 1 (* done *)") else {
            panic!("expected success");
        };
        let eof = tokens.last().expect("eof token");
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.leading_comments.len(), 1);
    }

    #[test]
    fn lex_unterminated_string_keeps_partial_prefix() {
        let LexResult::Failure { partial, error } = lex("val s = \"unterminated") else {
            panic!("expected failure");
        };
        assert_eq!(
            partial.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            vec!["val", "s", "="]
        );
        assert_eq!(error.what, "unterminated string literal");
        assert!(error.explain.is_some());
        assert_eq!(error.span.start.column, 9);
    }

    #[test]
    fn lex_unterminated_comment_is_an_error() {
        let LexResult::Failure { error, .. } = lex("val x = 1 (* no close") else {
            panic!("expected failure");
        };
        assert_eq!(error.what, "unterminated comment");
    }

    #[test]
    fn lex_numeric_forms() {
        let LexResult::Success(tokens) = lex("~3 0x2a 0w13 0wxFF 3.14 1e~7 2.5e10") else {
            panic!("expected success");
        };
        let kinds: Vec<TokenKind> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Word,
                TokenKind::Word,
                TokenKind::Real,
                TokenKind::Real,
                TokenKind::Real,
            ]
        );
    }

    #[test]
    fn lex_string_escapes_and_gaps() {
        let src = "val s = \"a\\n\\t\\\\\\\"\\^G\\065\\u00e9b\"";
        assert!(matches!(lex(src), LexResult::Success(_)));
        let gap = "val s = \"start\\\n   \\end\"";
        assert!(matches!(lex(gap), LexResult::Success(_)));
        let LexResult::Failure { error, .. } = lex("val s = \"bad\\q\"") else {
            panic!("expected failure");
        };
        assert_eq!(error.what, "invalid escape sequence");
    }

    #[test]
    fn lex_char_literal_and_selector() {
        let LexResult::Success(tokens) = lex("#\"a\" #1") else {
            panic!("expected success");
        };
        assert_eq!(tokens[0].kind, TokenKind::Char);
        assert_eq!(tokens[0].text, "#\"a\"");
        assert!(tokens[1].is_symbol("#"));
        assert_eq!(tokens[2].kind, TokenKind::Int);
    }

    #[test]
    fn lex_long_identifier_components_are_distinct_tokens() {
        let LexResult::Success(tokens) = lex("B.C.d") else {
            panic!("expected success");
        };
        assert_eq!(
            tokens
                .iter()
                .filter(|t| t.kind != TokenKind::Eof)
                .map(|t| t.text.as_str())
                .collect::<Vec<_>>(),
            vec!["B", ".", "C", ".", "d"]
        );
    }

    #[test]
    fn lex_mlb_path_variable_is_one_token() {
        let LexResult::Success(tokens) = lex_mlb("$(SML_LIB)/basis/basis.mlb") else {
            panic!("expected success");
        };
        assert_eq!(tokens[0].kind, TokenKind::PathVar);
        assert_eq!(tokens[0].text, "$(SML_LIB)");
        assert_eq!(tokens[1].text, "/basis/basis.mlb");
    }

    #[test]
    fn lex_reserved_symbolic_versus_symbolic_ident() {
        let LexResult::Success(tokens) = lex("=> -> :> :: := |> =") else {
            panic!("expected success");
        };
        let kinds: Vec<(String, TokenKind)> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.text.clone(), t.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("=>".to_string(), TokenKind::Symbol),
                ("->".to_string(), TokenKind::Symbol),
                (":>".to_string(), TokenKind::Symbol),
                ("::".to_string(), TokenKind::SymbolicIdent),
                (":=".to_string(), TokenKind::SymbolicIdent),
                ("|>".to_string(), TokenKind::SymbolicIdent),
                ("=".to_string(), TokenKind::Symbol),
            ]
        );
    }
}
