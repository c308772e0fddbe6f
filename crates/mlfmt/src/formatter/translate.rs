use crate::lexer::{Comment, Token};
use crate::surface::*;

use super::doc::Doc;
use super::FormatOptions;

/// Translates a whole file. Top declarations stack vertically; the EOF
/// token contributes any trailing comments.
pub(super) fn ast_doc(ast: &Ast, options: &FormatOptions) -> Doc {
    let tr = Translator { options };
    let mut parts = Vec::new();
    for (topdec, semi) in &ast.topdecs {
        let mut doc = tr.topdec(topdec);
        if let Some(semi) = semi {
            doc = Doc::beside(doc, tr.tok(semi));
        }
        parts.push(doc);
    }
    for comment in &ast.eof.leading_comments {
        parts.push(tr.comment(comment));
    }
    vsep(parts)
}

struct Translator<'a> {
    options: &'a FormatOptions,
}

/// Horizontal join with single spaces, skipping empty parts.
fn hsep(docs: Vec<Doc>) -> Doc {
    let mut iter = docs.into_iter().filter(|doc| !matches!(doc, Doc::Empty));
    let Some(first) = iter.next() else {
        return Doc::empty();
    };
    iter.fold(first, |acc, doc| {
        Doc::beside(acc, Doc::beside(Doc::space(), doc))
    })
}

/// Vertical join (one element per line in break mode), skipping empties.
fn vsep(docs: Vec<Doc>) -> Doc {
    let mut iter = docs.into_iter().filter(|doc| !matches!(doc, Doc::Empty));
    let Some(first) = iter.next() else {
        return Doc::empty();
    };
    iter.fold(first, Doc::above_or_space)
}

fn cat(docs: Vec<Doc>) -> Doc {
    docs.into_iter().fold(Doc::empty(), Doc::beside)
}

impl<'a> Translator<'a> {
    fn iw(&self) -> usize {
        self.options.indent_width
    }

    fn raw(&self, text: &str) -> Doc {
        Doc::text(text, self.options.tab_width)
    }

    /// A token with its leading comments stacked in front of it.
    fn tok(&self, token: &Token) -> Doc {
        let text = self.raw(&token.text);
        token
            .leading_comments
            .iter()
            .rev()
            .fold(text, |acc, comment| {
                Doc::above_or_space(self.comment(comment), acc)
            })
    }

    /// A comment becomes one line per row, with each continuation
    /// stripped of the comment's original first-column indentation;
    /// stacking the rows re-anchors them at the current indent. The
    /// trailing force-break keeps the comment on its own line ahead of
    /// the construct it annotates.
    fn comment(&self, comment: &Comment) -> Doc {
        if !comment.text.contains('\n') {
            return Doc::beside(self.raw(&comment.text), Doc::force_break());
        }
        let original_indent = comment.span.start.column.saturating_sub(1);
        let mut lines = Vec::new();
        for (index, line) in comment.text.split('\n').enumerate() {
            if index == 0 {
                lines.push(self.raw(line));
                continue;
            }
            let mut to_strip = original_indent;
            let mut rest = line;
            while to_strip > 0 {
                match rest.strip_prefix(' ').or_else(|| rest.strip_prefix('\t')) {
                    Some(stripped) => {
                        rest = stripped;
                        to_strip -= 1;
                    }
                    None => break,
                }
            }
            lines.push(self.raw(rest));
        }
        Doc::beside(vsep(lines), Doc::force_break())
    }

    fn longid(&self, id: &LongId) -> Doc {
        let mut parts = Vec::new();
        for (name, dot) in &id.qualifiers {
            parts.push(self.tok(name));
            parts.push(self.tok(dot));
        }
        parts.push(self.tok(&id.name));
        cat(parts)
    }

    fn opt_tok(&self, token: &Option<Token>) -> Doc {
        match token {
            Some(token) => self.tok(token),
            None => Doc::empty(),
        }
    }

    /// `sequence(open, delims, close, elems)`: flat when it fits, else one
    /// element per line with the delimiter leading each continuation,
    /// aligned under the opener.
    fn sequence(&self, open: &Token, delims: &[Token], close: &Token, elems: Vec<Doc>) -> Doc {
        if elems.is_empty() {
            return Doc::beside(self.tok(open), self.tok(close));
        }
        let mut iter = elems.into_iter();
        let first = iter.next().expect("nonempty sequence");
        let mut acc = Doc::beside(self.tok(open), first);
        for (delim, elem) in delims.iter().zip(iter) {
            acc = Doc::above_or_beside(
                acc,
                Doc::beside(self.tok(delim), Doc::beside(Doc::space(), elem)),
            );
        }
        acc = Doc::above_or_beside(acc, self.tok(close));
        Doc::group(acc)
    }

    fn syntax_seq<T>(&self, seq: &SyntaxSeq<T>, item: impl Fn(&T) -> Doc) -> Doc {
        match seq {
            SyntaxSeq::Empty => Doc::empty(),
            SyntaxSeq::One(elem) => item(elem),
            SyntaxSeq::Many {
                left,
                elems,
                delims,
                right,
            } => self.sequence(left, delims, right, elems.iter().map(item).collect()),
        }
    }

    /// A space in flat mode; in break mode, a new line one indent step
    /// deeper. Attached beside a header so breaks inside the header
    /// itself stay at the header's own indent.
    fn nest(&self, body: Doc) -> Doc {
        Doc::indent(self.iw(), Doc::above_or_space(Doc::empty(), body))
    }

    /// `<header>` grouped, body indented by `indent_width` when broken.
    fn header_body(&self, header: Doc, body: Doc) -> Doc {
        Doc::group(Doc::beside(header, self.nest(body)))
    }

    // -- types ---------------------------------------------------------

    fn ty(&self, ty: &Ty) -> Doc {
        match ty {
            Ty::Var(token) => self.tok(token),
            Ty::Record {
                left,
                rows,
                delims,
                right,
            } => {
                let rows = rows
                    .iter()
                    .map(|row| {
                        hsep(vec![
                            self.tok(&row.label),
                            self.tok(&row.colon),
                            self.ty(&row.ty),
                        ])
                    })
                    .collect();
                self.sequence(left, delims, right, rows)
            }
            Ty::Con { args, name } => match args {
                SyntaxSeq::Empty => self.longid(name),
                SyntaxSeq::One(arg) => hsep(vec![self.ty(arg), self.longid(name)]),
                SyntaxSeq::Many {
                    left,
                    elems,
                    delims,
                    right,
                } => hsep(vec![
                    self.sequence(
                        left,
                        delims,
                        right,
                        elems.iter().map(|ty| self.ty(ty)).collect(),
                    ),
                    self.longid(name),
                ]),
            },
            Ty::Paren { left, ty, right } => cat(vec![
                self.tok(left),
                self.ty(ty),
                self.tok(right),
            ]),
            Ty::Tuple { elems, delims } => {
                let mut acc = self.ty(&elems[0]);
                for (delim, elem) in delims.iter().zip(&elems[1..]) {
                    acc = Doc::above_or_space(
                        acc,
                        hsep(vec![self.tok(delim), self.ty(elem)]),
                    );
                }
                Doc::group(acc)
            }
            Ty::Arrow {
                param,
                arrow,
                result,
            } => Doc::group(Doc::above_or_space(
                self.ty(param),
                hsep(vec![self.tok(arrow), self.ty(result)]),
            )),
        }
    }

    // -- patterns ------------------------------------------------------

    fn pat(&self, pat: &Pat) -> Doc {
        match pat {
            Pat::Wildcard(token) | Pat::Const(token) => self.tok(token),
            Pat::Unit { left, right } => Doc::beside(self.tok(left), self.tok(right)),
            Pat::Ident { op_kw, id } => hsep(vec![self.opt_tok(op_kw), self.longid(id)]),
            Pat::Paren { left, pat, right } => cat(vec![
                self.tok(left),
                self.pat(pat),
                self.tok(right),
            ]),
            Pat::Tuple {
                left,
                elems,
                delims,
                right,
            }
            | Pat::List {
                left,
                elems,
                delims,
                right,
            } => self.sequence(
                left,
                delims,
                right,
                elems.iter().map(|pat| self.pat(pat)).collect(),
            ),
            Pat::Record {
                left,
                rows,
                delims,
                right,
            } => self.sequence(
                left,
                delims,
                right,
                rows.iter().map(|row| self.patrow(row)).collect(),
            ),
            Pat::Con { op_kw, id, arg } => hsep(vec![
                self.opt_tok(op_kw),
                self.longid(id),
                self.pat(arg),
            ]),
            Pat::Infix { left, op, right } => hsep(vec![
                self.pat(left),
                self.tok(op),
                self.pat(right),
            ]),
            Pat::Ascribe { pat, colon, ty } => hsep(vec![
                self.pat(pat),
                self.tok(colon),
                self.ty(ty),
            ]),
            Pat::As { lhs, as_kw, rhs } => hsep(vec![
                self.pat(lhs),
                self.tok(as_kw),
                self.pat(rhs),
            ]),
        }
    }

    fn patrow(&self, row: &PatRow) -> Doc {
        match row {
            PatRow::Rest(token) => self.tok(token),
            PatRow::Labeled { label, eq, pat } => hsep(vec![
                self.tok(label),
                self.tok(eq),
                self.pat(pat),
            ]),
            PatRow::Punned { id, ty, as_pat } => {
                let mut parts = vec![self.tok(id)];
                if let Some((colon, ty)) = ty {
                    parts.push(self.tok(colon));
                    parts.push(self.ty(ty));
                }
                if let Some((as_kw, pat)) = as_pat {
                    parts.push(self.tok(as_kw));
                    parts.push(self.pat(pat));
                }
                hsep(parts)
            }
        }
    }
}

include!("exprs.rs");
include!("decs.rs");
include!("modules.rs");
