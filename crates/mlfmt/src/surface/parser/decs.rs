impl Parser {
    fn at_dec_start(&self) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Keyword
            && matches!(
                token.text.as_str(),
                "val"
                    | "fun"
                    | "type"
                    | "datatype"
                    | "abstype"
                    | "exception"
                    | "local"
                    | "open"
                    | "infix"
                    | "infixr"
                    | "nonfix"
            )
    }

    /// A run of core declarations, possibly `;`-separated. Collapses to
    /// the single declaration (or `Empty`) when no sequencing happened.
    fn parse_dec(&mut self) -> Result<Dec, Diagnostic> {
        let mut decs: Vec<Dec> = Vec::new();
        let mut delims: Vec<Option<Token>> = Vec::new();
        loop {
            if self.at_dec_start() {
                decs.push(self.parse_single_dec()?);
                delims.push(None);
            } else if self.at_symbol(";") {
                let semi = self.advance();
                match delims.last_mut() {
                    Some(last) if last.is_none() => *last = Some(semi),
                    _ => {
                        decs.push(Dec::Empty);
                        delims.push(Some(semi));
                    }
                }
            } else {
                break;
            }
        }
        if decs.is_empty() {
            return Ok(Dec::Empty);
        }
        if decs.len() == 1 && delims[0].is_none() {
            return Ok(decs.pop().expect("one declaration"));
        }
        Ok(Dec::Seq { decs, delims })
    }

    fn parse_single_dec(&mut self) -> Result<Dec, Diagnostic> {
        let keyword = self.peek().text.clone();
        match keyword.as_str() {
            "val" => self.parse_dec_val(),
            "fun" => self.parse_dec_fun(),
            "type" => self.parse_dec_type(),
            "datatype" => self.parse_dec_datatype(),
            "abstype" => self.parse_dec_abstype(),
            "exception" => self.parse_dec_exception(),
            "local" => self.parse_dec_local(),
            "open" => self.parse_dec_open(),
            "infix" | "infixr" => self.parse_dec_infix(),
            "nonfix" => self.parse_dec_nonfix(),
            _ => Err(self.error("expected a declaration")),
        }
    }

    fn parse_dec_val(&mut self) -> Result<Dec, Diagnostic> {
        let val_kw = self.advance();
        let tyvars = self.parse_tyvarseq()?;
        let rec_kw = self.match_keyword("rec");
        let mut bindings = Vec::new();
        let mut and_kws = Vec::new();
        loop {
            let pat = self.parse_pat()?;
            let eq = self.expect_symbol("=", "expected `=` after the `val` pattern")?;
            let exp = self.parse_exp()?;
            bindings.push(ValBind { pat, eq, exp });
            match self.match_keyword("and") {
                Some(and_kw) => and_kws.push(and_kw),
                None => break,
            }
        }
        Ok(Dec::Val {
            val_kw,
            rec_kw,
            tyvars,
            bindings,
            and_kws,
        })
    }

    fn parse_dec_fun(&mut self) -> Result<Dec, Diagnostic> {
        let fun_kw = self.advance();
        let tyvars = self.parse_tyvarseq()?;
        let mut bindings = Vec::new();
        let mut and_kws = Vec::new();
        loop {
            bindings.push(self.parse_fun_bind()?);
            match self.match_keyword("and") {
                Some(and_kw) => and_kws.push(and_kw),
                None => break,
            }
        }
        Ok(Dec::Fun {
            fun_kw,
            tyvars,
            bindings,
            and_kws,
        })
    }

    fn parse_fun_bind(&mut self) -> Result<FunBind, Diagnostic> {
        let mut clauses = vec![self.parse_fun_clause()?];
        let mut delims = Vec::new();
        while let Some(bar) = self.match_symbol("|") {
            delims.push(bar);
            clauses.push(self.parse_fun_clause()?);
        }
        // All clauses of one function must agree on name and arity.
        let first = &clauses[0];
        let name = first.head.name().text.clone();
        let arity = first.head.arity();
        for clause in &clauses[1..] {
            if clause.head.name().text != name {
                return Err(Diagnostic::with_explain(
                    "fun clauses with different function names",
                    format!(
                        "This clause names `{}` but the first clause names `{}`; every clause of one binding defines the same function.",
                        clause.head.name().text, name
                    ),
                    clause.head.name().span,
                ));
            }
            if clause.head.arity() != arity {
                return Err(Diagnostic::with_explain(
                    "fun clause arity mismatch",
                    format!(
                        "This clause takes {} argument(s) but the first clause takes {}.",
                        clause.head.arity(),
                        arity
                    ),
                    clause.head.name().span,
                ));
            }
        }
        Ok(FunBind { clauses, delims })
    }

    fn parse_fun_clause(&mut self) -> Result<FunClause, Diagnostic> {
        let head = self.parse_fun_clause_head()?;
        let ty = match self.match_symbol(":") {
            Some(colon) => Some((colon, self.parse_ty()?)),
            None => None,
        };
        let eq = self.expect_symbol("=", "expected `=` after the function clause head")?;
        let body = self.parse_exp()?;
        Ok(FunClause { head, ty, eq, body })
    }

    /// Clause heads come in three shapes: `f x y`, `x ++ y`, and
    /// `(x ++ y) z`. The first atomic pattern decides which.
    fn parse_fun_clause_head(&mut self) -> Result<FunClauseHead, Diagnostic> {
        if let Some(op_kw) = self.match_keyword("op") {
            let name = self.parse_plain_ident("expected a function name after `op`")?;
            let args = self.parse_fun_args()?;
            return Ok(FunClauseHead::Prefix {
                op_kw: Some(op_kw),
                name,
                args,
            });
        }
        let first = self.parse_atpat()?;
        if self.at_pat_operator() {
            let name = self.advance();
            let right = self.parse_atpat()?;
            return Ok(FunClauseHead::Infix {
                left: first,
                name,
                right,
            });
        }
        match first {
            Pat::Ident { op_kw: None, id } if id.is_plain() => {
                let args = self.parse_fun_args()?;
                Ok(FunClauseHead::Prefix {
                    op_kw: None,
                    name: id.name,
                    args,
                })
            }
            Pat::Paren { left, pat, right } => match *pat {
                Pat::Infix {
                    left: operand_l,
                    op,
                    right: operand_r,
                } => {
                    let args = self.parse_fun_args()?;
                    Ok(FunClauseHead::CurriedInfix {
                        left_paren: left,
                        left: *operand_l,
                        name: op,
                        right: *operand_r,
                        right_paren: right,
                        args,
                    })
                }
                _ => Err(Diagnostic::with_explain(
                    "expected a function name",
                    "A parenthesized clause head must apply an infix operator, as in `fun (x ++ y) z = ...`.",
                    left.span,
                )),
            },
            _ => Err(self.error_explain(
                "expected a function name",
                "A `fun` clause begins with the function's name, an infix application, or `op`.",
            )),
        }
    }

    fn parse_fun_args(&mut self) -> Result<Vec<Pat>, Diagnostic> {
        let mut args = Vec::new();
        while self.at_atpat_start() && !self.at_pat_operator() {
            args.push(self.parse_atpat()?);
        }
        if args.is_empty() {
            return Err(self.error_explain(
                "expected an argument pattern",
                "A `fun` clause takes at least one argument; bind plain values with `val` instead.",
            ));
        }
        Ok(args)
    }

    fn parse_dec_type(&mut self) -> Result<Dec, Diagnostic> {
        let type_kw = self.advance();
        let (bindings, and_kws) = self.parse_ty_binds()?;
        Ok(Dec::Type {
            type_kw,
            bindings,
            and_kws,
        })
    }

    fn parse_ty_binds(&mut self) -> Result<(Vec<TyBind>, Vec<Token>), Diagnostic> {
        let mut bindings = Vec::new();
        let mut and_kws = Vec::new();
        loop {
            let tyvars = self.parse_tyvarseq()?;
            let name = self.parse_plain_ident("expected a type constructor name")?;
            let eq = self.expect_symbol("=", "expected `=` in the type binding")?;
            let ty = self.parse_ty()?;
            bindings.push(TyBind {
                tyvars,
                name,
                eq,
                ty,
            });
            match self.match_keyword("and") {
                Some(and_kw) => and_kws.push(and_kw),
                None => break,
            }
        }
        Ok((bindings, and_kws))
    }

    fn parse_dec_datatype(&mut self) -> Result<Dec, Diagnostic> {
        let datatype_kw = self.advance();
        if self.peek().kind == TokenKind::Ident
            && self.peek_at(1).is_symbol("=")
            && self.peek_at(2).is_keyword("datatype")
        {
            let name = self.advance();
            let eq = self.advance();
            let repl_kw = self.advance();
            let rhs = self.parse_long_id()?;
            return Ok(Dec::DatatypeRepl {
                datatype_kw,
                name,
                eq,
                repl_kw,
                rhs,
            });
        }
        let (bindings, and_kws) = self.parse_dat_binds()?;
        let withtype = self.parse_withtype()?;
        Ok(Dec::Datatype {
            datatype_kw,
            bindings,
            and_kws,
            withtype,
        })
    }

    fn parse_dat_binds(&mut self) -> Result<(Vec<DatBind>, Vec<Token>), Diagnostic> {
        let mut bindings = Vec::new();
        let mut and_kws = Vec::new();
        loop {
            bindings.push(self.parse_dat_bind()?);
            match self.match_keyword("and") {
                Some(and_kw) => and_kws.push(and_kw),
                None => break,
            }
        }
        Ok((bindings, and_kws))
    }

    fn parse_dat_bind(&mut self) -> Result<DatBind, Diagnostic> {
        let tyvars = self.parse_tyvarseq()?;
        let name = self.parse_plain_ident("expected a datatype name")?;
        let eq = self.expect_symbol("=", "expected `=` after the datatype name")?;
        let mut cons = vec![self.parse_con_bind()?];
        let mut delims = Vec::new();
        while let Some(bar) = self.match_symbol("|") {
            delims.push(bar);
            cons.push(self.parse_con_bind()?);
        }
        Ok(DatBind {
            tyvars,
            name,
            eq,
            cons,
            delims,
        })
    }

    fn parse_con_bind(&mut self) -> Result<ConBind, Diagnostic> {
        let op_kw = self.match_keyword("op");
        let name = self.parse_plain_ident("expected a constructor name")?;
        let of_ty = match self.match_keyword("of") {
            Some(of_kw) => Some((of_kw, self.parse_ty()?)),
            None => None,
        };
        Ok(ConBind { op_kw, name, of_ty })
    }

    fn parse_withtype(&mut self) -> Result<Option<WithType>, Diagnostic> {
        let Some(withtype_kw) = self.match_keyword("withtype") else {
            return Ok(None);
        };
        let (bindings, and_kws) = self.parse_ty_binds()?;
        Ok(Some(WithType {
            withtype_kw,
            bindings,
            and_kws,
        }))
    }

    fn parse_dec_abstype(&mut self) -> Result<Dec, Diagnostic> {
        let abstype_kw = self.advance();
        let (bindings, and_kws) = self.parse_dat_binds()?;
        let withtype = self.parse_withtype()?;
        let with_kw = self.expect_keyword("with", "expected `with` after the `abstype` bindings")?;
        let dec = self.parse_dec()?;
        let end_kw = self.expect_keyword("end", "expected `end` to close the `abstype`")?;
        Ok(Dec::Abstype {
            abstype_kw,
            bindings,
            and_kws,
            withtype,
            with_kw,
            dec: Box::new(dec),
            end_kw,
        })
    }

    fn parse_dec_exception(&mut self) -> Result<Dec, Diagnostic> {
        let exception_kw = self.advance();
        let mut bindings = Vec::new();
        let mut and_kws = Vec::new();
        loop {
            let op_kw = self.match_keyword("op");
            let name = self.parse_plain_ident("expected an exception name")?;
            let kind = if let Some(of_kw) = self.match_keyword("of") {
                ExBindKind::OfTy(of_kw, self.parse_ty()?)
            } else if let Some(eq) = self.match_symbol("=") {
                let rhs_op = self.match_keyword("op");
                let rhs = self.parse_long_id()?;
                ExBindKind::Eq {
                    eq,
                    op_kw: rhs_op,
                    rhs,
                }
            } else {
                ExBindKind::Plain
            };
            bindings.push(ExBind { op_kw, name, kind });
            match self.match_keyword("and") {
                Some(and_kw) => and_kws.push(and_kw),
                None => break,
            }
        }
        Ok(Dec::Exception {
            exception_kw,
            bindings,
            and_kws,
        })
    }

    fn parse_dec_local(&mut self) -> Result<Dec, Diagnostic> {
        let local_kw = self.advance();
        self.fixity.push_frame();
        let result = (|| {
            let first = self.parse_dec()?;
            let in_kw = self.expect_keyword("in", "expected `in` after the `local` declarations")?;
            let second = self.parse_dec()?;
            let end_kw = self.expect_keyword("end", "expected `end` to close the `local`")?;
            Ok(Dec::Local {
                local_kw,
                first: Box::new(first),
                in_kw,
                second: Box::new(second),
                end_kw,
            })
        })();
        self.fixity.pop_frame();
        result
    }

    fn parse_dec_open(&mut self) -> Result<Dec, Diagnostic> {
        let open_kw = self.advance();
        let mut ids = vec![self.parse_long_id()?];
        while self.at_ident() {
            ids.push(self.parse_long_id()?);
        }
        Ok(Dec::Open { open_kw, ids })
    }

    fn parse_dec_infix(&mut self) -> Result<Dec, Diagnostic> {
        let kw = self.advance();
        let assoc = if kw.text == "infixr" {
            Assoc::Right
        } else {
            Assoc::Left
        };
        let precedence = if self.peek().kind == TokenKind::Int {
            let token = self.advance();
            if token.text.len() != 1 || !token.text.chars().all(|c| c.is_ascii_digit()) {
                return Err(Diagnostic::with_explain(
                    "expected a single-digit precedence",
                    "Infix precedence is one digit, 0 through 9.",
                    token.span,
                ));
            }
            Some(token)
        } else {
            None
        };
        let prec_value: u8 = precedence
            .as_ref()
            .map(|t| t.text.parse().expect("single digit"))
            .unwrap_or(0);
        let ids = self.parse_fixity_ids()?;
        for id in &ids {
            self.fixity.extend(
                &id.text,
                Fixity {
                    precedence: prec_value,
                    assoc,
                },
            );
        }
        Ok(Dec::Infix {
            kw,
            precedence,
            ids,
        })
    }

    fn parse_dec_nonfix(&mut self) -> Result<Dec, Diagnostic> {
        let kw = self.advance();
        let ids = self.parse_fixity_ids()?;
        for id in &ids {
            self.fixity.retract(&id.text);
        }
        Ok(Dec::Nonfix { kw, ids })
    }

    fn parse_fixity_ids(&mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut ids = Vec::new();
        while self.at_ident() && !self.peek_at(1).is_symbol(".") {
            ids.push(self.advance());
        }
        if ids.is_empty() {
            return Err(self.error("expected an operator name"));
        }
        Ok(ids)
    }
}
