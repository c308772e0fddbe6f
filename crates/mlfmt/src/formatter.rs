// Formatter pipeline:
// 1) Lex: `lexer::lex` -> tokens (comments attached to the next token).
// 2) Parse: `surface::parse` -> an AST that retains every source token.
// 3) Translate: each syntax node maps to a `Doc` (formatter/translate.rs).
// 4) Render: `doc::render` picks flat vs broken layout per group under
//    the width/ribbon budget.
//
// Formatting is a pure function of `(input, options)`: deterministic,
// idempotent, and it never reorders or respells tokens.

mod doc;
mod translate;

use crate::diagnostics::Diagnostic;
use crate::lexer::{lex, LexResult};
use crate::surface::{parse, Ast, ParseResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatOptions {
    /// Target page width.
    pub max_width: usize,
    /// Fraction of the width available past the indentation, in (0, 1].
    pub ribbon_frac: f64,
    pub indent_width: usize,
    /// Used only when measuring text that contains tab characters.
    pub tab_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            max_width: 80,
            ribbon_frac: 1.0,
            indent_width: 2,
            tab_width: 4,
        }
    }
}

pub fn format_ast(ast: &Ast, options: &FormatOptions) -> String {
    let doc = translate::ast_doc(ast, options);
    let mut out = doc::render(
        &doc,
        options.max_width.max(1),
        options.ribbon_frac,
        options.tab_width.max(1),
    );
    while out.ends_with('\n') || out.ends_with(' ') {
        out.pop();
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Lexes, parses, and formats one source file.
pub fn format_text(content: &str, options: &FormatOptions) -> Result<String, Diagnostic> {
    let tokens = match lex(content) {
        LexResult::Success(tokens) => tokens,
        LexResult::Failure { error, .. } => return Err(error),
    };
    let ast = match parse(tokens) {
        ParseResult::Success(ast) => ast,
        ParseResult::Failure { error, .. } => return Err(error),
    };
    Ok(format_ast(&ast, options))
}
