impl Parser {
    fn parse_sigexp(&mut self) -> Result<SigExp, Diagnostic> {
        let base = if self.at_keyword("sig") {
            let sig_kw = self.advance();
            self.fixity.push_frame();
            let result = (|| {
                let spec = self.parse_spec()?;
                let end_kw =
                    self.expect_keyword("end", "expected `end` to close the signature body")?;
                Ok(SigExp::Sig {
                    sig_kw,
                    spec: Box::new(spec),
                    end_kw,
                })
            })();
            self.fixity.pop_frame();
            result?
        } else {
            let name = self.parse_plain_ident("expected a signature expression")?;
            SigExp::Id(name)
        };

        let mut clauses = Vec::new();
        loop {
            let continues = self.at_keyword("where")
                || (!clauses.is_empty()
                    && self.at_keyword("and")
                    && self.peek_at(1).is_keyword("type"));
            if !continues {
                break;
            }
            let where_kw = self.advance();
            let type_kw = self.expect_keyword("type", "expected `type` after `where`")?;
            let tyvars = self.parse_tyvarseq()?;
            let name = self.parse_long_id()?;
            let eq = self.expect_symbol("=", "expected `=` in the `where type` refinement")?;
            let ty = self.parse_ty()?;
            clauses.push(WhereClause {
                where_kw,
                type_kw,
                tyvars,
                name,
                eq,
                ty,
            });
        }
        if clauses.is_empty() {
            Ok(base)
        } else {
            Ok(SigExp::Where {
                sigexp: Box::new(base),
                clauses,
            })
        }
    }

    fn at_spec_start(&self) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Keyword
            && matches!(
                token.text.as_str(),
                "val" | "type" | "eqtype" | "datatype" | "exception" | "structure" | "include"
            )
    }

    /// A run of specifications. A `sharing` clause closes over everything
    /// accumulated so far, then the run continues around it.
    fn parse_spec(&mut self) -> Result<Spec, Diagnostic> {
        let mut specs: Vec<Spec> = Vec::new();
        let mut delims: Vec<Option<Token>> = Vec::new();
        loop {
            if self.at_spec_start() {
                specs.push(self.parse_spec_one()?);
                delims.push(None);
            } else if self.at_symbol(";") {
                let semi = self.advance();
                match delims.last_mut() {
                    Some(last) if last.is_none() => *last = Some(semi),
                    _ => {
                        specs.push(Spec::Empty);
                        delims.push(Some(semi));
                    }
                }
            } else if self.at_keyword("sharing") {
                let spec = collapse_specs(specs, delims);
                let sharing_kw = self.advance();
                let type_kw = self.match_keyword("type");
                let mut ids = vec![self.parse_long_id()?];
                let mut eq_delims = Vec::new();
                while let Some(eq) = self.match_symbol("=") {
                    eq_delims.push(eq);
                    ids.push(self.parse_long_id()?);
                }
                if ids.len() < 2 {
                    return Err(self.error_explain(
                        "expected `=` in the sharing constraint",
                        "A sharing constraint equates at least two names, as in `sharing type S.t = T.t`.",
                    ));
                }
                specs = vec![Spec::Sharing {
                    spec: Box::new(spec),
                    sharing_kw,
                    type_kw,
                    ids,
                    eq_delims,
                }];
                delims = vec![None];
            } else {
                break;
            }
        }
        Ok(collapse_specs(specs, delims))
    }

    fn parse_spec_one(&mut self) -> Result<Spec, Diagnostic> {
        let keyword = self.peek().text.clone();
        match keyword.as_str() {
            "val" => {
                let val_kw = self.advance();
                let mut descs = Vec::new();
                let mut and_kws = Vec::new();
                loop {
                    let name = self.parse_plain_ident("expected a value name")?;
                    let colon = self.expect_symbol(":", "expected `:` after the value name")?;
                    let ty = self.parse_ty()?;
                    descs.push(ValDesc { name, colon, ty });
                    match self.match_keyword("and") {
                        Some(and_kw) => and_kws.push(and_kw),
                        None => break,
                    }
                }
                Ok(Spec::Val {
                    val_kw,
                    descs,
                    and_kws,
                })
            }
            "type" => {
                let type_kw = self.advance();
                let (descs, and_kws) = self.parse_ty_descs()?;
                Ok(Spec::Type {
                    type_kw,
                    descs,
                    and_kws,
                })
            }
            "eqtype" => {
                let eqtype_kw = self.advance();
                let (descs, and_kws) = self.parse_ty_descs()?;
                Ok(Spec::Eqtype {
                    eqtype_kw,
                    descs,
                    and_kws,
                })
            }
            "datatype" => {
                let datatype_kw = self.advance();
                if self.peek().kind == TokenKind::Ident
                    && self.peek_at(1).is_symbol("=")
                    && self.peek_at(2).is_keyword("datatype")
                {
                    let name = self.advance();
                    let eq = self.advance();
                    let repl_kw = self.advance();
                    let rhs = self.parse_long_id()?;
                    return Ok(Spec::DatatypeRepl {
                        datatype_kw,
                        name,
                        eq,
                        repl_kw,
                        rhs,
                    });
                }
                let (bindings, and_kws) = self.parse_dat_binds()?;
                Ok(Spec::Datatype {
                    datatype_kw,
                    bindings,
                    and_kws,
                })
            }
            "exception" => {
                let exception_kw = self.advance();
                let mut descs = Vec::new();
                let mut and_kws = Vec::new();
                loop {
                    descs.push(self.parse_con_bind()?);
                    match self.match_keyword("and") {
                        Some(and_kw) => and_kws.push(and_kw),
                        None => break,
                    }
                }
                Ok(Spec::Exception {
                    exception_kw,
                    descs,
                    and_kws,
                })
            }
            "structure" => {
                let structure_kw = self.advance();
                let mut descs = Vec::new();
                let mut and_kws = Vec::new();
                loop {
                    let name = self.parse_plain_ident("expected a structure name")?;
                    let colon =
                        self.expect_symbol(":", "expected `:` after the structure name")?;
                    let sigexp = self.parse_sigexp()?;
                    descs.push(StrDesc {
                        name,
                        colon,
                        sigexp,
                    });
                    match self.match_keyword("and") {
                        Some(and_kw) => and_kws.push(and_kw),
                        None => break,
                    }
                }
                Ok(Spec::Structure {
                    structure_kw,
                    descs,
                    and_kws,
                })
            }
            "include" => {
                let include_kw = self.advance();
                let sigexp = self.parse_sigexp()?;
                Ok(Spec::Include {
                    include_kw,
                    sigexp,
                })
            }
            _ => Err(self.error("expected a specification")),
        }
    }

    /// Type descriptions: opaque (`type t`) or abbreviations
    /// (`type t = int`), `and`-chained.
    fn parse_ty_descs(&mut self) -> Result<(Vec<TyDesc>, Vec<Token>), Diagnostic> {
        let mut descs = Vec::new();
        let mut and_kws = Vec::new();
        loop {
            let tyvars = self.parse_tyvarseq()?;
            let name = self.parse_plain_ident("expected a type constructor name")?;
            let eq_ty = match self.match_symbol("=") {
                Some(eq) => Some((eq, self.parse_ty()?)),
                None => None,
            };
            descs.push(TyDesc {
                tyvars,
                name,
                eq_ty,
            });
            match self.match_keyword("and") {
                Some(and_kw) => and_kws.push(and_kw),
                None => break,
            }
        }
        Ok((descs, and_kws))
    }
}

fn collapse_specs(mut specs: Vec<Spec>, delims: Vec<Option<Token>>) -> Spec {
    if specs.is_empty() {
        return Spec::Empty;
    }
    if specs.len() == 1 && delims[0].is_none() {
        return specs.pop().expect("one specification");
    }
    Spec::Seq { specs, delims }
}
