use std::fmt;

/// The pretty-printing algebra (Wadler/Leijen style).
///
/// Every node caches its flat width at construction, so the renderer's
/// fit checks are O(1) and the whole layout pass is linear. A width of
/// `None` means "contains a forced break" (a multi-line text run or an
/// explicit [`Doc::force_break`]); no group around it can be flat.
#[derive(Clone)]
pub enum Doc {
    Empty,
    Text {
        text: String,
        width: Option<usize>,
    },
    Space,
    /// A space in flat mode, nothing in break mode.
    SoftSpace,
    /// Zero-width, but poisons every enclosing group into break mode.
    ForceBreak,
    Beside {
        left: Box<Doc>,
        right: Box<Doc>,
        width: Option<usize>,
    },
    /// A space in flat mode; in break mode, a new line at the base
    /// indentation in effect for this node.
    AboveOrSpace {
        left: Box<Doc>,
        right: Box<Doc>,
        width: Option<usize>,
    },
    /// Nothing in flat mode; in break mode, a new line at the column
    /// where the left operand began.
    AboveOrBeside {
        left: Box<Doc>,
        right: Box<Doc>,
        width: Option<usize>,
    },
    Indent {
        amount: usize,
        doc: Box<Doc>,
    },
    Group {
        doc: Box<Doc>,
        width: Option<usize>,
    },
}

fn add(a: Option<usize>, b: Option<usize>) -> Option<usize> {
    Some(a? + b?)
}

/// Visible width of a single-line text run; tabs count as `tab_width`.
pub fn text_width(text: &str, tab_width: usize) -> usize {
    text.chars()
        .map(|ch| if ch == '\t' { tab_width } else { 1 })
        .sum()
}

impl Doc {
    pub fn empty() -> Doc {
        Doc::Empty
    }

    pub fn text(text: impl Into<String>, tab_width: usize) -> Doc {
        let text = text.into();
        let width = if text.contains('\n') {
            None
        } else {
            Some(text_width(&text, tab_width))
        };
        Doc::Text { text, width }
    }

    pub fn space() -> Doc {
        Doc::Space
    }

    pub fn softspace() -> Doc {
        Doc::SoftSpace
    }

    pub fn force_break() -> Doc {
        Doc::ForceBreak
    }

    pub fn beside(left: Doc, right: Doc) -> Doc {
        match (left, right) {
            (Doc::Empty, right) => right,
            (left, Doc::Empty) => left,
            (left, right) => {
                let width = add(left.width(), right.width());
                Doc::Beside {
                    left: Box::new(left),
                    right: Box::new(right),
                    width,
                }
            }
        }
    }

    pub fn above_or_space(left: Doc, right: Doc) -> Doc {
        let width = add(add(left.width(), Some(1)), right.width());
        Doc::AboveOrSpace {
            left: Box::new(left),
            right: Box::new(right),
            width,
        }
    }

    pub fn above_or_beside(left: Doc, right: Doc) -> Doc {
        let width = add(left.width(), right.width());
        Doc::AboveOrBeside {
            left: Box::new(left),
            right: Box::new(right),
            width,
        }
    }

    pub fn indent(amount: usize, doc: Doc) -> Doc {
        if amount == 0 {
            doc
        } else {
            Doc::Indent {
                amount,
                doc: Box::new(doc),
            }
        }
    }

    pub fn group(doc: Doc) -> Doc {
        let width = doc.width();
        Doc::Group {
            doc: Box::new(doc),
            width,
        }
    }

    pub fn width(&self) -> Option<usize> {
        match self {
            Doc::Empty => Some(0),
            Doc::Text { width, .. } => *width,
            Doc::Space | Doc::SoftSpace => Some(1),
            Doc::ForceBreak => None,
            Doc::Beside { width, .. }
            | Doc::AboveOrSpace { width, .. }
            | Doc::AboveOrBeside { width, .. }
            | Doc::Group { width, .. } => *width,
            Doc::Indent { doc, .. } => doc.width(),
        }
    }
}

impl fmt::Debug for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Doc::Empty => write!(f, "Empty"),
            Doc::Text { text, .. } => write!(f, "Text({text:?})"),
            Doc::Space => write!(f, "Space"),
            Doc::SoftSpace => write!(f, "SoftSpace"),
            Doc::ForceBreak => write!(f, "ForceBreak"),
            Doc::Beside { left, right, .. } => {
                f.debug_tuple("Beside").field(left).field(right).finish()
            }
            Doc::AboveOrSpace { left, right, .. } => f
                .debug_tuple("AboveOrSpace")
                .field(left)
                .field(right)
                .finish(),
            Doc::AboveOrBeside { left, right, .. } => f
                .debug_tuple("AboveOrBeside")
                .field(left)
                .field(right)
                .finish(),
            Doc::Indent { amount, doc } => {
                f.debug_tuple("Indent").field(amount).field(doc).finish()
            }
            Doc::Group { doc, .. } => f.debug_tuple("Group").field(doc).finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Flat,
    Break,
}

enum Work<'a> {
    Doc(usize, Mode, &'a Doc),
    Space,
    Newline(usize),
}

/// Renders a document. Groups go flat when their pre-computed flat width
/// fits both the remaining line and the ribbon budget; the decision is
/// local to each group.
pub fn render(doc: &Doc, max_width: usize, ribbon_frac: f64, tab_width: usize) -> String {
    let ribbon_frac = if ribbon_frac > 0.0 && ribbon_frac <= 1.0 {
        ribbon_frac
    } else {
        1.0
    };
    let mut out = String::new();
    let mut col = 0usize;
    let mut stack: Vec<Work> = vec![Work::Doc(0, Mode::Break, doc)];

    while let Some(work) = stack.pop() {
        match work {
            Work::Space => {
                out.push(' ');
                col += 1;
            }
            Work::Newline(indent) => {
                while out.ends_with(' ') {
                    out.pop();
                }
                out.push('\n');
                for _ in 0..indent {
                    out.push(' ');
                }
                col = indent;
            }
            Work::Doc(indent, mode, doc) => match doc {
                Doc::Empty | Doc::ForceBreak => {}
                Doc::Text { text, .. } => {
                    // Emitted verbatim; a multi-line run (a gap string)
                    // resets the column to its own last line.
                    out.push_str(text);
                    match text.rsplit_once('\n') {
                        Some((_, last)) => col = text_width(last, tab_width),
                        None => col += text_width(text, tab_width),
                    }
                }
                Doc::Space => {
                    out.push(' ');
                    col += 1;
                }
                Doc::SoftSpace => {
                    if mode == Mode::Flat {
                        out.push(' ');
                        col += 1;
                    }
                }
                Doc::Beside { left, right, .. } => {
                    stack.push(Work::Doc(indent, mode, right));
                    stack.push(Work::Doc(indent, mode, left));
                }
                Doc::AboveOrSpace { left, right, .. } => {
                    stack.push(Work::Doc(indent, mode, right));
                    match mode {
                        Mode::Flat => stack.push(Work::Space),
                        Mode::Break => stack.push(Work::Newline(indent)),
                    }
                    stack.push(Work::Doc(indent, mode, left));
                }
                Doc::AboveOrBeside { left, right, .. } => {
                    // `col` is the column the left operand is about to
                    // start at; broken continuations line up under it.
                    match mode {
                        Mode::Flat => {
                            stack.push(Work::Doc(indent, mode, right));
                        }
                        Mode::Break => {
                            stack.push(Work::Doc(col, mode, right));
                            stack.push(Work::Newline(col));
                        }
                    }
                    stack.push(Work::Doc(indent, mode, left));
                }
                Doc::Indent { amount, doc } => {
                    stack.push(Work::Doc(indent + amount, mode, doc));
                }
                Doc::Group { doc, width } => {
                    let line_budget = max_width.saturating_sub(col);
                    let ribbon_budget =
                        (ribbon_frac * max_width.saturating_sub(indent) as f64).floor() as usize;
                    let budget = line_budget.min(ribbon_budget);
                    let flat = matches!(width, Some(w) if *w <= budget);
                    let mode = if flat { Mode::Flat } else { Mode::Break };
                    stack.push(Work::Doc(indent, mode, doc));
                }
            },
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAB: usize = 4;

    fn text(s: &str) -> Doc {
        Doc::text(s, TAB)
    }

    #[test]
    fn group_flat_when_it_fits() {
        let doc = Doc::group(Doc::above_or_space(text("aaa"), text("bbb")));
        assert_eq!(render(&doc, 10, 1.0, TAB), "aaa bbb");
        assert_eq!(render(&doc, 5, 1.0, TAB), "aaa\nbbb");
    }

    #[test]
    fn above_or_space_breaks_at_base_indent() {
        let doc = Doc::indent(
            2,
            Doc::above_or_space(text("head"), text("body")),
        );
        assert_eq!(render(&doc, 80, 1.0, TAB), "head\n  body");
    }

    #[test]
    fn above_or_beside_lines_up_under_the_left_operand() {
        let doc = Doc::beside(
            text("val x = "),
            Doc::above_or_beside(text("(1"), text(", 2)")),
        );
        assert_eq!(render(&doc, 80, 1.0, TAB), "val x = (1\n        , 2)");
    }

    #[test]
    fn softspace_is_a_space_only_in_flat_mode() {
        let doc = Doc::group(Doc::beside(
            text("a"),
            Doc::beside(Doc::softspace(), text("b")),
        ));
        assert_eq!(render(&doc, 80, 1.0, TAB), "a b");
        let forced = Doc::group(Doc::beside(
            Doc::beside(text("a"), Doc::beside(Doc::softspace(), text("b"))),
            Doc::force_break(),
        ));
        assert_eq!(render(&forced, 80, 1.0, TAB), "ab");
    }

    #[test]
    fn force_break_poisons_enclosing_groups() {
        let doc = Doc::group(Doc::beside(
            Doc::above_or_space(text("a"), text("b")),
            Doc::force_break(),
        ));
        assert_eq!(render(&doc, 80, 1.0, TAB), "a\nb");
    }

    #[test]
    fn ribbon_fraction_narrows_the_budget() {
        let doc = Doc::group(Doc::above_or_space(text("aaaa"), text("bbbb")));
        // Fits the line, but half a 12-column ribbon is only 6 columns.
        assert_eq!(render(&doc, 12, 1.0, TAB), "aaaa bbbb");
        assert_eq!(render(&doc, 12, 0.5, TAB), "aaaa\nbbbb");
    }

    #[test]
    fn tabs_count_as_tab_width_when_measuring() {
        assert_eq!(text_width("\ta", 4), 5);
        let doc = Doc::group(Doc::above_or_space(text("\t\t"), text("x")));
        assert_eq!(render(&doc, 10, 1.0, TAB), "\t\t x");
        assert_eq!(render(&doc, 9, 1.0, TAB), "\t\t\nx");
    }

    #[test]
    fn multiline_text_renders_verbatim() {
        let doc = Doc::indent(2, Doc::above_or_space(text("x"), text("\"a\\\n \\b\"")));
        assert_eq!(render(&doc, 80, 1.0, TAB), "x\n  \"a\\\n \\b\"");
    }

    #[test]
    fn nested_groups_decide_locally() {
        let inner = Doc::group(Doc::above_or_space(text("bb"), text("cc")));
        let doc = Doc::group(Doc::above_or_space(text("aaaaaaaa"), inner));
        // Outer breaks, inner still fits flat on its own line.
        assert_eq!(render(&doc, 8, 1.0, TAB), "aaaaaaaa\nbb cc");
    }
}
