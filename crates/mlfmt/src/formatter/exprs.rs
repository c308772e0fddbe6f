impl<'a> Translator<'a> {
    fn exp(&self, exp: &Exp) -> Doc {
        match exp {
            Exp::Const(token) => self.tok(token),
            Exp::Unit { left, right } => Doc::beside(self.tok(left), self.tok(right)),
            Exp::Ident { op_kw, id } => hsep(vec![self.opt_tok(op_kw), self.longid(id)]),
            Exp::Selector { hash, label } => Doc::beside(self.tok(hash), self.tok(label)),
            Exp::Paren { left, exp, right } => cat(vec![
                self.tok(left),
                self.exp(exp),
                self.tok(right),
            ]),
            Exp::Tuple {
                left,
                elems,
                delims,
                right,
            }
            | Exp::Sequence {
                left,
                elems,
                delims,
                right,
            }
            | Exp::List {
                left,
                elems,
                delims,
                right,
            } => self.sequence(
                left,
                delims,
                right,
                elems.iter().map(|exp| self.exp(exp)).collect(),
            ),
            Exp::Record {
                left,
                rows,
                delims,
                right,
            } => self.sequence(
                left,
                delims,
                right,
                rows.iter()
                    .map(|row| {
                        self.header_body(
                            hsep(vec![self.tok(&row.label), self.tok(&row.eq)]),
                            self.exp(&row.exp),
                        )
                    })
                    .collect(),
            ),
            Exp::App { .. } => {
                let mut args = Vec::new();
                let mut head = exp;
                while let Exp::App { func, arg } = head {
                    args.push(arg.as_ref());
                    head = func;
                }
                let mut acc = self.exp(head);
                for arg in args.into_iter().rev() {
                    acc = Doc::beside(acc, self.nest(self.exp(arg)));
                }
                Doc::group(acc)
            }
            Exp::Infix { left, op, right } => Doc::group(Doc::above_or_space(
                self.exp(left),
                hsep(vec![self.tok(op), self.exp(right)]),
            )),
            Exp::Andalso { left, kw, right } | Exp::Orelse { left, kw, right } => {
                Doc::group(Doc::above_or_space(
                    self.exp(left),
                    hsep(vec![self.tok(kw), self.exp(right)]),
                ))
            }
            Exp::Ascribe { exp, colon, ty } => Doc::group(Doc::above_or_space(
                self.exp(exp),
                hsep(vec![self.tok(colon), self.ty(ty)]),
            )),
            Exp::If { .. } => self.if_doc(exp),
            Exp::While {
                while_kw,
                cond,
                do_kw,
                body,
            } => self.header_body(
                hsep(vec![self.tok(while_kw), self.exp(cond), self.tok(do_kw)]),
                self.exp(body),
            ),
            Exp::Raise { kw, exp } => hsep(vec![self.tok(kw), self.exp(exp)]),
            Exp::Handle { exp, kw, arms } => Doc::group(Doc::above_or_space(
                self.exp(exp),
                self.match_inline(self.tok(kw), arms),
            )),
            Exp::Case {
                case_kw,
                exp,
                of_kw,
                arms,
            } => {
                let header = hsep(vec![self.tok(case_kw), self.exp(exp), self.tok(of_kw)]);
                self.match_under(header, arms)
            }
            Exp::Fn { kw, arms } => Doc::group(self.match_chain(self.tok(kw), arms)),
            Exp::Let {
                let_kw,
                dec,
                in_kw,
                body,
                delims,
                end_kw,
            } => self.let_doc(let_kw, dec, in_kw, body, delims, end_kw),
        }
    }

    /// `if`/`then`/`else` chains never lay out flat; each keyword starts
    /// its own line with the branch body indented below it.
    fn if_doc(&self, exp: &Exp) -> Doc {
        let mut parts = Vec::new();
        let mut current = exp;
        let mut else_lead: Option<Doc> = None;
        loop {
            let Exp::If {
                if_kw,
                cond,
                then_kw,
                then_exp,
                else_kw,
                else_exp,
            } = current
            else {
                break;
            };
            let mut header = vec![];
            if let Some(lead) = else_lead.take() {
                header.push(lead);
            }
            header.push(self.tok(if_kw));
            header.push(self.exp(cond));
            header.push(self.tok(then_kw));
            parts.push(Doc::beside(hsep(header), self.nest(self.exp(then_exp))));
            else_lead = Some(self.tok(else_kw));
            current = else_exp;
        }
        let else_kw = else_lead.expect("if expression has an else");
        parts.push(Doc::beside(else_kw, self.nest(self.exp(current))));
        Doc::beside(vsep(parts), Doc::force_break())
    }

    /// `head rule1 | rule2 | ...` with the bars under the head keyword:
    /// used for `fn` and `handle`.
    fn match_chain(&self, head: Doc, arms: &Match) -> Doc {
        let mut acc = hsep(vec![head, self.arm(&arms.arms[0])]);
        for (bar, arm) in arms.delims.iter().zip(&arms.arms[1..]) {
            acc = Doc::above_or_space(acc, hsep(vec![self.tok(bar), self.arm(arm)]));
        }
        acc
    }

    fn match_inline(&self, head: Doc, arms: &Match) -> Doc {
        Doc::group(self.match_chain(head, arms))
    }

    /// `case`-style layout: rules indented under the header, continuation
    /// bars two columns shallower than the rule bodies. Never flat.
    fn match_under(&self, header: Doc, arms: &Match) -> Doc {
        let mut acc = Doc::beside(header, self.nest(self.arm(&arms.arms[0])));
        for (bar, arm) in arms.delims.iter().zip(&arms.arms[1..]) {
            acc = Doc::above_or_space(acc, hsep(vec![self.tok(bar), self.arm(arm)]));
        }
        Doc::beside(acc, Doc::force_break())
    }

    fn arm(&self, arm: &Arm) -> Doc {
        self.header_body(
            hsep(vec![self.pat(&arm.pat), self.tok(&arm.arrow)]),
            self.exp(&arm.exp),
        )
    }

    /// `let`/`local` style blocks always spread over at least three lines.
    /// The `let <dec>` header may collapse onto one line only for a single
    /// plain declaration.
    fn let_doc(
        &self,
        let_kw: &Token,
        dec: &Dec,
        in_kw: &Token,
        body: &[Exp],
        delims: &[Token],
        end_kw: &Token,
    ) -> Doc {
        let single = !matches!(dec, Dec::Seq { .. } | Dec::Empty);
        let head = if single {
            Doc::group(Doc::beside(self.tok(let_kw), self.nest(self.dec(dec))))
        } else {
            Doc::beside(
                Doc::beside(self.tok(let_kw), Doc::force_break()),
                self.nest(self.dec(dec)),
            )
        };
        let mut body_parts = Vec::new();
        for (index, exp) in body.iter().enumerate() {
            let mut doc = self.exp(exp);
            if let Some(semi) = delims.get(index) {
                doc = Doc::beside(doc, self.tok(semi));
            }
            body_parts.push(doc);
        }
        let middle = Doc::beside(
            Doc::beside(self.tok(in_kw), Doc::force_break()),
            self.nest(vsep(body_parts)),
        );
        vsep(vec![head, middle, self.tok(end_kw)])
    }
}
