impl<'a> Translator<'a> {
    fn topdec(&self, topdec: &TopDec) -> Doc {
        match topdec {
            TopDec::Str(strdec) => self.strdec(strdec),
            TopDec::Sig {
                signature_kw,
                bindings,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, bind) in bindings.iter().enumerate() {
                    let lead = if index == 0 {
                        self.tok(signature_kw)
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    let header = hsep(vec![lead, self.tok(&bind.name), self.tok(&bind.eq)]);
                    parts.push(self.bind_body(header, self.sigexp(&bind.sigexp), is_block_sigexp(&bind.sigexp)));
                }
                vsep(parts)
            }
            TopDec::Functor {
                functor_kw,
                bindings,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, bind) in bindings.iter().enumerate() {
                    let lead = if index == 0 {
                        self.tok(functor_kw)
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    parts.push(self.functor_bind(lead, bind));
                }
                vsep(parts)
            }
        }
    }

    /// `<header> = <body>`: block bodies (`struct`/`sig`) start on their
    /// own line at the binding's indent; anything else nests like a
    /// value binding.
    fn bind_body(&self, header: Doc, body: Doc, block: bool) -> Doc {
        if block {
            Doc::above_or_space(header, body)
        } else {
            self.header_body(header, body)
        }
    }

    fn functor_bind(&self, lead: Doc, bind: &FunctorBind) -> Doc {
        let param = match &bind.param {
            FunParam::Plain { name, colon, sigexp } => hsep(vec![
                self.tok(name),
                self.tok(colon),
                self.sigexp(sigexp),
            ]),
            FunParam::Opened { spec } => self.spec(spec),
        };
        let mut header = vec![
            lead,
            self.tok(&bind.name),
            cat(vec![self.tok(&bind.left), param, self.tok(&bind.right)]),
        ];
        if let Some((colon, sigexp)) = &bind.ascription {
            header.push(self.tok(colon));
            header.push(self.sigexp(sigexp));
        }
        header.push(self.tok(&bind.eq));
        self.bind_body(
            hsep(header),
            self.strexp(&bind.strexp),
            is_block_strexp(&bind.strexp),
        )
    }

    // -- signatures ----------------------------------------------------

    fn sigexp(&self, sigexp: &SigExp) -> Doc {
        match sigexp {
            SigExp::Id(name) => self.tok(name),
            SigExp::Sig {
                sig_kw,
                spec,
                end_kw,
            } => vsep(vec![
                Doc::beside(
                    Doc::beside(self.tok(sig_kw), Doc::force_break()),
                    self.nest(self.spec(spec)),
                ),
                self.tok(end_kw),
            ]),
            SigExp::Where { sigexp, clauses } => {
                let mut acc = self.sigexp(sigexp);
                for clause in clauses {
                    let refinement = hsep(vec![
                        self.tok(&clause.where_kw),
                        self.tok(&clause.type_kw),
                        self.syntax_seq(&clause.tyvars, |tv| self.tok(tv)),
                        self.longid(&clause.name),
                        self.tok(&clause.eq),
                        self.ty(&clause.ty),
                    ]);
                    acc = Doc::group(Doc::above_or_space(acc, refinement));
                }
                acc
            }
        }
    }

    fn spec(&self, spec: &Spec) -> Doc {
        match spec {
            Spec::Val {
                val_kw,
                descs,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, desc) in descs.iter().enumerate() {
                    let lead = if index == 0 {
                        self.tok(val_kw)
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    let header = hsep(vec![lead, self.tok(&desc.name), self.tok(&desc.colon)]);
                    parts.push(self.header_body(header, self.ty(&desc.ty)));
                }
                vsep(parts)
            }
            Spec::Type {
                type_kw,
                descs,
                and_kws,
            } => self.ty_descs(type_kw, descs, and_kws),
            Spec::Eqtype {
                eqtype_kw,
                descs,
                and_kws,
            } => self.ty_descs(eqtype_kw, descs, and_kws),
            Spec::Datatype {
                datatype_kw,
                bindings,
                and_kws,
            } => self.dat_binds(datatype_kw, bindings, and_kws),
            Spec::DatatypeRepl {
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
            Spec::Exception {
                exception_kw,
                descs,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, desc) in descs.iter().enumerate() {
                    let lead = if index == 0 {
                        self.tok(exception_kw)
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    parts.push(hsep(vec![lead, self.con_bind(desc)]));
                }
                vsep(parts)
            }
            Spec::Structure {
                structure_kw,
                descs,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, desc) in descs.iter().enumerate() {
                    let lead = if index == 0 {
                        self.tok(structure_kw)
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    let header = hsep(vec![lead, self.tok(&desc.name), self.tok(&desc.colon)]);
                    parts.push(self.bind_body(
                        header,
                        self.sigexp(&desc.sigexp),
                        is_block_sigexp(&desc.sigexp),
                    ));
                }
                vsep(parts)
            }
            Spec::Include {
                include_kw,
                sigexp,
            } => hsep(vec![self.tok(include_kw), self.sigexp(sigexp)]),
            Spec::Sharing {
                spec,
                sharing_kw,
                type_kw,
                ids,
                eq_delims,
            } => {
                let mut line = vec![self.tok(sharing_kw), self.opt_tok(type_kw)];
                line.push(self.longid(&ids[0]));
                for (eq, id) in eq_delims.iter().zip(&ids[1..]) {
                    line.push(self.tok(eq));
                    line.push(self.longid(id));
                }
                Doc::beside(self.spec(spec), self.nest(hsep(line)))
            }
            Spec::Seq { specs, delims } => {
                let mut parts = Vec::new();
                for (spec, semi) in specs.iter().zip(delims) {
                    parts.push(Doc::beside(self.spec(spec), self.opt_tok(semi)));
                }
                vsep(parts)
            }
            Spec::Empty => Doc::empty(),
        }
    }

    fn ty_descs(&self, lead_kw: &Token, descs: &[TyDesc], and_kws: &[Token]) -> Doc {
        let mut parts = Vec::new();
        for (index, desc) in descs.iter().enumerate() {
            let lead = if index == 0 {
                self.tok(lead_kw)
            } else {
                self.tok(&and_kws[index - 1])
            };
            let mut header = vec![
                lead,
                self.syntax_seq(&desc.tyvars, |tv| self.tok(tv)),
                self.tok(&desc.name),
            ];
            match &desc.eq_ty {
                Some((eq, ty)) => {
                    header.push(self.tok(eq));
                    parts.push(self.header_body(hsep(header), self.ty(ty)));
                }
                None => parts.push(hsep(header)),
            }
        }
        vsep(parts)
    }

    // -- structures ----------------------------------------------------

    fn strdec(&self, strdec: &StrDec) -> Doc {
        match strdec {
            StrDec::Core(dec) => self.dec(dec),
            StrDec::Structure {
                structure_kw,
                bindings,
                and_kws,
            } => {
                let mut parts = Vec::new();
                for (index, bind) in bindings.iter().enumerate() {
                    let lead = if index == 0 {
                        self.tok(structure_kw)
                    } else {
                        self.tok(&and_kws[index - 1])
                    };
                    let mut header = vec![lead, self.tok(&bind.name)];
                    if let Some((colon, sigexp)) = &bind.ascription {
                        header.push(self.tok(colon));
                        header.push(self.sigexp(sigexp));
                    }
                    header.push(self.tok(&bind.eq));
                    parts.push(self.bind_body(
                        hsep(header),
                        self.strexp(&bind.strexp),
                        is_block_strexp(&bind.strexp),
                    ));
                }
                vsep(parts)
            }
            StrDec::Local {
                local_kw,
                first,
                in_kw,
                second,
                end_kw,
            } => vsep(vec![
                Doc::beside(
                    Doc::beside(self.tok(local_kw), Doc::force_break()),
                    self.nest(self.strdec(first)),
                ),
                Doc::beside(
                    Doc::beside(self.tok(in_kw), Doc::force_break()),
                    self.nest(self.strdec(second)),
                ),
                self.tok(end_kw),
            ]),
            StrDec::Seq { decs, delims } => {
                let mut parts = Vec::new();
                for (dec, semi) in decs.iter().zip(delims) {
                    parts.push(Doc::beside(self.strdec(dec), self.opt_tok(semi)));
                }
                vsep(parts)
            }
        }
    }

    fn strexp(&self, strexp: &StrExp) -> Doc {
        match strexp {
            StrExp::Id(id) => self.longid(id),
            StrExp::Struct {
                struct_kw,
                dec,
                end_kw,
            } => vsep(vec![
                Doc::beside(
                    Doc::beside(self.tok(struct_kw), Doc::force_break()),
                    self.nest(self.strdec(dec)),
                ),
                self.tok(end_kw),
            ]),
            StrExp::Ascribe {
                strexp,
                colon,
                sigexp,
            } => hsep(vec![
                self.strexp(strexp),
                self.tok(colon),
                self.sigexp(sigexp),
            ]),
            StrExp::FunApp {
                name,
                left,
                arg,
                right,
            } => {
                let arg = match arg {
                    FunAppArg::StrExp(strexp) => self.strexp(strexp),
                    FunAppArg::StrDec(strdec) => self.strdec(strdec),
                };
                cat(vec![
                    self.tok(name),
                    Doc::space(),
                    self.tok(left),
                    arg,
                    self.tok(right),
                ])
            }
            StrExp::Let {
                let_kw,
                dec,
                in_kw,
                strexp,
                end_kw,
            } => vsep(vec![
                Doc::beside(
                    Doc::beside(self.tok(let_kw), Doc::force_break()),
                    self.nest(self.strdec(dec)),
                ),
                Doc::beside(
                    Doc::beside(self.tok(in_kw), Doc::force_break()),
                    self.nest(self.strexp(strexp)),
                ),
                self.tok(end_kw),
            ]),
        }
    }
}

fn is_block_sigexp(sigexp: &SigExp) -> bool {
    match sigexp {
        SigExp::Sig { .. } => true,
        SigExp::Where { sigexp, .. } => is_block_sigexp(sigexp),
        SigExp::Id(_) => false,
    }
}

fn is_block_strexp(strexp: &StrExp) -> bool {
    match strexp {
        StrExp::Struct { .. } | StrExp::Let { .. } => true,
        StrExp::Ascribe { strexp, .. } => is_block_strexp(strexp),
        StrExp::Id(_) | StrExp::FunApp { .. } => false,
    }
}
