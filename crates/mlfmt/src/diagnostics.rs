use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn merge(start: Span, end: Span) -> Span {
        Span {
            start: start.start,
            end: end.end,
        }
    }
}

/// One lex or parse error. `what` is the short headline; `explain` is an
/// optional longer paragraph of guidance shown under the source frame.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub what: String,
    pub explain: Option<String>,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(what: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic {
            what: what.into(),
            explain: None,
            span,
        }
    }

    pub fn with_explain(what: impl Into<String>, explain: impl Into<String>, span: Span) -> Diagnostic {
        Diagnostic {
            what: what.into(),
            explain: Some(explain.into()),
            span,
        }
    }
}

// ANSI color codes
const RED: &str = "\x1b[1;31m";
const DARK_GRAY: &str = "\x1b[90m";
const WHITE: &str = "\x1b[97m";
const RESET: &str = "\x1b[0m";

pub fn render_diagnostic(path: &str, diagnostic: &Diagnostic, source: Option<&str>, use_color: bool) -> String {
    let mut output = String::new();
    let start = &diagnostic.span.start;
    if use_color {
        output.push_str(&format!(
            "{RED}error{RESET} {DARK_GRAY}{}:{}:{}{RESET}\n  {WHITE}{}{RESET}\n",
            path, start.line, start.column, diagnostic.what
        ));
    } else {
        output.push_str(&format!(
            "error {}:{}:{}\n  {}\n",
            path, start.line, start.column, diagnostic.what
        ));
    }
    if let Some(source) = source {
        if let Some(frame) = render_source_frame(source, &diagnostic.span, use_color) {
            output.push_str(&frame);
        }
    }
    if let Some(explain) = &diagnostic.explain {
        output.push('\n');
        for line in explain.lines() {
            output.push_str("  ");
            output.push_str(line);
            output.push('\n');
        }
    }
    output.trim_end().to_string()
}

fn render_source_frame(source: &str, span: &Span, use_color: bool) -> Option<String> {
    let line_index = span.start.line.checked_sub(1)?;
    let line = source.lines().nth(line_index)?;
    let line_no = span.start.line;
    let width = line_no.to_string().len();

    let mut output = String::new();
    if use_color {
        output.push_str(&format!("{DARK_GRAY}{:>width$} |{RESET}\n", ""));
        output.push_str(&format!("{DARK_GRAY}{line_no:>width$} |{RESET} {line}\n"));
    } else {
        output.push_str(&format!("{:>width$} |\n", ""));
        output.push_str(&format!("{line_no:>width$} | {line}\n"));
    }

    let line_len = line.chars().count();
    let start_col = span.start.column.clamp(1, line_len + 1);
    let end_col = if span.start.line == span.end.line {
        span.end.column.clamp(start_col, line_len.max(start_col))
    } else {
        line_len.max(start_col)
    };
    let caret_len = end_col - start_col + 1;

    let padding = " ".repeat(start_col - 1);
    let carets = "^".repeat(caret_len);
    if use_color {
        output.push_str(&format!(
            "{DARK_GRAY}{:>width$} |{RESET} {padding}{RED}{carets}{RESET}\n",
            ""
        ));
    } else {
        output.push_str(&format!("{:>width$} | {padding}{carets}\n", ""));
    }
    Some(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(line: usize, column: usize, len: usize) -> Span {
        Span {
            start: Position { line, column },
            end: Position {
                line,
                column: column + len - 1,
            },
        }
    }

    #[test]
    fn renders_underline_at_the_offending_range() {
        let source = "val x = \"oops\n";
        let diag = Diagnostic::new("unterminated string literal", span(1, 9, 5));
        let rendered = render_diagnostic("test.sml", &diag, Some(source), false);
        assert!(rendered.contains("error test.sml:1:9"));
        assert!(rendered.contains("1 | val x = \"oops"));
        assert!(rendered.contains("|         ^^^^^"));
    }

    #[test]
    fn renders_explain_lines_indented() {
        let diag = Diagnostic::with_explain(
            "expected `=>` after pattern",
            "Each match rule has the shape `pat => exp`.",
            span(2, 3, 1),
        );
        let rendered = render_diagnostic("test.sml", &diag, None, false);
        assert!(rendered.ends_with("  Each match rule has the shape `pat => exp`."));
    }
}
