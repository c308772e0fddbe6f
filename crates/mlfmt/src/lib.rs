#![deny(clippy::unwrap_used)]

pub mod diagnostics;
mod driver;
pub mod fixity;
mod formatter;
pub mod lexer;
pub mod mlb;
pub mod surface;
pub mod syntax;

pub use diagnostics::{render_diagnostic, Diagnostic, Position, Span};
pub use driver::{expand_target, format_file, MlfmtError};
pub use formatter::{format_ast, format_text, FormatOptions};
pub use lexer::{lex, lex_mlb, Comment, LexResult, Token, TokenKind};
pub use mlb::MlbError;
pub use surface::{parse, Ast, ParseResult};
