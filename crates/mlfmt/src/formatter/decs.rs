impl<'a> Translator<'a> {
    fn dec(&self, dec: &Dec) -> Doc {
        match dec {
            Dec::Val {
                val_kw,
                rec_kw,
                tyvars,
                bindings,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, bind) in bindings.iter().enumerate() {
                    let lead = if index == 0 {
                        hsep(vec![
                            self.tok(val_kw),
                            self.syntax_seq(tyvars, |tv| self.tok(tv)),
                            self.opt_tok(rec_kw),
                        ])
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    let header = hsep(vec![lead, self.pat(&bind.pat), self.tok(&bind.eq)]);
                    parts.push(self.header_body(header, self.exp(&bind.exp)));
                }
                vsep(parts)
            }
            Dec::Fun {
                fun_kw,
                tyvars,
                bindings,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, bind) in bindings.iter().enumerate() {
                    let lead = if index == 0 {
                        hsep(vec![
                            self.tok(fun_kw),
                            self.syntax_seq(tyvars, |tv| self.tok(tv)),
                        ])
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    parts.push(self.fun_bind(lead, bind));
                }
                vsep(parts)
            }
            Dec::Type {
                type_kw,
                bindings,
                and_kws,
            } => self.ty_binds(type_kw, bindings, and_kws),
            Dec::Datatype {
                datatype_kw,
                bindings,
                and_kws,
                withtype,
            } => {
                let mut doc = self.dat_binds(datatype_kw, bindings, and_kws);
                if let Some(withtype) = withtype {
                    doc = Doc::above_or_space(
                        doc,
                        self.ty_binds(&withtype.withtype_kw, &withtype.bindings, &withtype.and_kws),
                    );
                }
                doc
            }
            Dec::DatatypeRepl {
                datatype_kw,
                name,
                eq,
                repl_kw,
                rhs,
            } => hsep(vec![
                self.tok(datatype_kw),
                self.tok(name),
                self.tok(eq),
                self.tok(repl_kw),
                self.longid(rhs),
            ]),
            Dec::Abstype {
                abstype_kw,
                bindings,
                and_kws,
                withtype,
                with_kw,
                dec,
                end_kw,
            } => {
                let mut head = self.dat_binds(abstype_kw, bindings, and_kws);
                if let Some(withtype) = withtype {
                    head = Doc::above_or_space(
                        head,
                        self.ty_binds(&withtype.withtype_kw, &withtype.bindings, &withtype.and_kws),
                    );
                }
                vsep(vec![
                    head,
                    Doc::beside(
                        Doc::beside(self.tok(with_kw), Doc::force_break()),
                        self.nest(self.dec(dec)),
                    ),
                    self.tok(end_kw),
                ])
            }
            Dec::Exception {
                exception_kw,
                bindings,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, bind) in bindings.iter().enumerate() {
                    let lead = if index == 0 {
                        self.tok(exception_kw)
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    let mut line = vec![lead, self.opt_tok(&bind.op_kw), self.tok(&bind.name)];
                    match &bind.kind {
                        ExBindKind::Plain => {}
                        ExBindKind::OfTy(of_kw, ty) => {
                            line.push(self.tok(of_kw));
                            line.push(self.ty(ty));
                        }
                        ExBindKind::Eq { eq, op_kw, rhs } => {
                            line.push(self.tok(eq));
                            line.push(self.opt_tok(op_kw));
                            line.push(self.longid(rhs));
                        }
                    }
                    parts.push(hsep(line));
                }
                vsep(parts)
            }
            Dec::Local {
                local_kw,
                first,
                in_kw,
                second,
                end_kw,
            } => vsep(vec![
                Doc::beside(
                    Doc::beside(self.tok(local_kw), Doc::force_break()),
                    self.nest(self.dec(first)),
                ),
                Doc::beside(
                    Doc::beside(self.tok(in_kw), Doc::force_break()),
                    self.nest(self.dec(second)),
                ),
                self.tok(end_kw),
            ]),
            Dec::Open { open_kw, ids } => {
                let mut parts = vec![self.tok(open_kw)];
                parts.extend(ids.iter().map(|id| self.longid(id)));
                hsep(parts)
            }
            Dec::Infix {
                kw,
                precedence,
                ids,
            } => {
                let mut parts = vec![self.tok(kw), self.opt_tok(precedence)];
                parts.extend(ids.iter().map(|id| self.tok(id)));
                hsep(parts)
            }
            Dec::Nonfix { kw, ids } => {
                let mut parts = vec![self.tok(kw)];
                parts.extend(ids.iter().map(|id| self.tok(id)));
                hsep(parts)
            }
            Dec::Seq { decs, delims } => {
                let mut parts = Vec::new();
                for (dec, semi) in decs.iter().zip(delims) {
                    let doc = Doc::beside(self.dec(dec), self.opt_tok(semi));
                    parts.push(doc);
                }
                vsep(parts)
            }
            Dec::Empty => Doc::empty(),
        }
    }

    /// One function binding. Later clauses hang with `|` two columns
    /// shallower than the clause bodies.
    fn fun_bind(&self, lead: Doc, bind: &FunBind) -> Doc {
        let first = self.fun_clause(Some(lead), &bind.clauses[0]);
        if bind.clauses.len() == 1 {
            return first;
        }
        let mut continuations = Vec::new();
        for (bar, clause) in bind.delims.iter().zip(&bind.clauses[1..]) {
            continuations.push(hsep(vec![self.tok(bar), self.fun_clause(None, clause)]));
        }
        Doc::beside(
            Doc::beside(first, self.nest(vsep(continuations))),
            Doc::force_break(),
        )
    }

    fn fun_clause(&self, lead: Option<Doc>, clause: &FunClause) -> Doc {
        let mut header = Vec::new();
        if let Some(lead) = lead {
            header.push(lead);
        }
        match &clause.head {
            FunClauseHead::Prefix { op_kw, name, args } => {
                header.push(self.opt_tok(op_kw));
                header.push(self.tok(name));
                header.extend(args.iter().map(|pat| self.pat(pat)));
            }
            FunClauseHead::Infix { left, name, right } => {
                header.push(self.pat(left));
                header.push(self.tok(name));
                header.push(self.pat(right));
            }
            FunClauseHead::CurriedInfix {
                left_paren,
                left,
                name,
                right,
                right_paren,
                args,
            } => {
                header.push(cat(vec![
                    self.tok(left_paren),
                    hsep(vec![self.pat(left), self.tok(name), self.pat(right)]),
                    self.tok(right_paren),
                ]));
                header.extend(args.iter().map(|pat| self.pat(pat)));
            }
        }
        if let Some((colon, ty)) = &clause.ty {
            header.push(self.tok(colon));
            header.push(self.ty(ty));
        }
        header.push(self.tok(&clause.eq));
        self.header_body(hsep(header), self.exp(&clause.body))
    }

    fn ty_binds(&self, lead_kw: &Token, bindings: &[TyBind], and_kws: &[Token]) -> Doc {
        let mut parts = Vec::new();
        for (index, bind) in bindings.iter().enumerate() {
            let lead = if index == 0 {
                self.tok(lead_kw)
            } else {
                self.tok(&and_kws[index - 1])
            };
            let header = hsep(vec![
                lead,
                self.syntax_seq(&bind.tyvars, |tv| self.tok(tv)),
                self.tok(&bind.name),
                self.tok(&bind.eq),
            ]);
            parts.push(self.header_body(header, self.ty(&bind.ty)));
        }
        vsep(parts)
    }

    /// Datatype bindings: constructors indented under the header, with
    /// `|` leading each continuation at the header's indent.
    fn dat_binds(&self, lead_kw: &Token, bindings: &[DatBind], and_kws: &[Token]) -> Doc {
        let mut parts = Vec::new();
        for (index, bind) in bindings.iter().enumerate() {
            let lead = if index == 0 {
                self.tok(lead_kw)
            } else {
                self.tok(&and_kws[index - 1])
            };
            let header = hsep(vec![
                lead,
                self.syntax_seq(&bind.tyvars, |tv| self.tok(tv)),
                self.tok(&bind.name),
                self.tok(&bind.eq),
            ]);
            let mut acc = Doc::beside(header, self.nest(self.con_bind(&bind.cons[0])));
            for (bar, con) in bind.delims.iter().zip(&bind.cons[1..]) {
                acc = Doc::above_or_space(acc, hsep(vec![self.tok(bar), self.con_bind(con)]));
            }
            parts.push(Doc::group(acc));
        }
        vsep(parts)
    }

    fn con_bind(&self, con: &ConBind) -> Doc {
        let mut parts = vec![self.opt_tok(&con.op_kw), self.tok(&con.name)];
        if let Some((of_kw, ty)) = &con.of_ty {
            parts.push(self.tok(of_kw));
            parts.push(self.ty(ty));
        }
        hsep(parts)
    }
}
