impl Parser {
    fn parse_topdec(&mut self) -> Result<(TopDec, Option<Token>), Diagnostic> {
        if let Some(semi) = self.match_symbol(";") {
            return Ok((TopDec::Str(StrDec::Core(Dec::Empty)), Some(semi)));
        }
        if self.at_keyword("signature") {
            let signature_kw = self.advance();
            let mut bindings = Vec::new();
            let mut and_kws = Vec::new();
            loop {
                let name = self.parse_plain_ident("expected a signature name")?;
                let eq = self.expect_symbol("=", "expected `=` after the signature name")?;
                let sigexp = self.parse_sigexp()?;
                bindings.push(SigBind { name, eq, sigexp });
                match self.match_keyword("and") {
                    Some(and_kw) => and_kws.push(and_kw),
                    None => break,
                }
            }
            let semi = self.match_symbol(";");
            return Ok((
                TopDec::Sig {
                    signature_kw,
                    bindings,
                    and_kws,
                },
                semi,
            ));
        }
        if self.at_keyword("functor") {
            let functor_kw = self.advance();
            let mut bindings = Vec::new();
            let mut and_kws = Vec::new();
            loop {
                bindings.push(self.parse_functor_bind()?);
                match self.match_keyword("and") {
                    Some(and_kw) => and_kws.push(and_kw),
                    None => break,
                }
            }
            let semi = self.match_symbol(";");
            return Ok((
                TopDec::Functor {
                    functor_kw,
                    bindings,
                    and_kws,
                },
                semi,
            ));
        }
        let before = self.pos;
        let strdec = self.parse_strdec()?;
        if self.pos == before {
            return Err(self.error("expected a top-level declaration"));
        }
        Ok((TopDec::Str(strdec), None))
    }

    fn parse_functor_bind(&mut self) -> Result<FunctorBind, Diagnostic> {
        let name = self.parse_plain_ident("expected a functor name")?;
        let left = self.expect_symbol("(", "expected `(` after the functor name")?;
        let param = if self.peek().kind == TokenKind::Ident && self.peek_at(1).is_symbol(":") {
            let param_name = self.advance();
            let colon = self.advance();
            let sigexp = self.parse_sigexp()?;
            FunParam::Plain {
                name: param_name,
                colon,
                sigexp,
            }
        } else {
            FunParam::Opened {
                spec: self.parse_spec()?,
            }
        };
        let right = self.expect_symbol(")", "expected `)` to close the functor parameter")?;
        let ascription = self.parse_sig_ascription()?;
        let eq = self.expect_symbol("=", "expected `=` after the functor header")?;
        let strexp = self.parse_strexp()?;
        Ok(FunctorBind {
            name,
            left,
            param,
            right,
            ascription,
            eq,
            strexp,
        })
    }

    fn parse_sig_ascription(&mut self) -> Result<Option<(Token, SigExp)>, Diagnostic> {
        let colon = match self.match_symbol(":") {
            Some(colon) => colon,
            None => match self.match_symbol(":>") {
                Some(colon) => colon,
                None => return Ok(None),
            },
        };
        let sigexp = self.parse_sigexp()?;
        Ok(Some((colon, sigexp)))
    }

    fn at_strdec_start(&self) -> bool {
        if self.at_dec_start() {
            return true;
        }
        let token = self.peek();
        token.kind == TokenKind::Keyword && matches!(token.text.as_str(), "structure" | "local")
    }

    /// A run of structure-level declarations, possibly `;`-separated.
    fn parse_strdec(&mut self) -> Result<StrDec, Diagnostic> {
        let mut decs: Vec<StrDec> = Vec::new();
        let mut delims: Vec<Option<Token>> = Vec::new();
        loop {
            if self.at_dec_start() {
                decs.push(StrDec::Core(self.parse_single_dec()?));
                delims.push(None);
            } else if self.at_keyword("structure") {
                decs.push(self.parse_strdec_structure()?);
                delims.push(None);
            } else if self.at_keyword("local") {
                decs.push(self.parse_strdec_local()?);
                delims.push(None);
            } else if self.at_symbol(";") {
                let semi = self.advance();
                match delims.last_mut() {
                    Some(last) if last.is_none() => *last = Some(semi),
                    _ => {
                        decs.push(StrDec::Core(Dec::Empty));
                        delims.push(Some(semi));
                    }
                }
            } else {
                break;
            }
        }
        if decs.is_empty() {
            return Ok(StrDec::Core(Dec::Empty));
        }
        if decs.len() == 1 && delims[0].is_none() {
            return Ok(decs.pop().expect("one structure declaration"));
        }
        Ok(StrDec::Seq { decs, delims })
    }

    fn parse_strdec_structure(&mut self) -> Result<StrDec, Diagnostic> {
        let structure_kw = self.advance();
        let mut bindings = Vec::new();
        let mut and_kws = Vec::new();
        loop {
            let name = self.parse_plain_ident("expected a structure name")?;
            let ascription = self.parse_sig_ascription()?;
            let eq = self.expect_symbol("=", "expected `=` after the structure name")?;
            let strexp = self.parse_strexp()?;
            bindings.push(StrBind {
                name,
                ascription,
                eq,
                strexp,
            });
            match self.match_keyword("and") {
                Some(and_kw) => and_kws.push(and_kw),
                None => break,
            }
        }
        Ok(StrDec::Structure {
            structure_kw,
            bindings,
            and_kws,
        })
    }

    fn parse_strdec_local(&mut self) -> Result<StrDec, Diagnostic> {
        let local_kw = self.advance();
        self.fixity.push_frame();
        let result = (|| {
            let first = self.parse_strdec()?;
            let in_kw = self.expect_keyword("in", "expected `in` after the `local` declarations")?;
            let second = self.parse_strdec()?;
            let end_kw = self.expect_keyword("end", "expected `end` to close the `local`")?;
            Ok(StrDec::Local {
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

    fn parse_strexp(&mut self) -> Result<StrExp, Diagnostic> {
        let base = if self.at_keyword("struct") {
            let struct_kw = self.advance();
            self.fixity.push_frame();
            let result = (|| {
                let dec = self.parse_strdec()?;
                let end_kw =
                    self.expect_keyword("end", "expected `end` to close the structure body")?;
                Ok(StrExp::Struct {
                    struct_kw,
                    dec: Box::new(dec),
                    end_kw,
                })
            })();
            self.fixity.pop_frame();
            result?
        } else if self.at_keyword("let") {
            let let_kw = self.advance();
            self.fixity.push_frame();
            let result = (|| {
                let dec = self.parse_strdec()?;
                let in_kw =
                    self.expect_keyword("in", "expected `in` after the `let` declarations")?;
                let strexp = self.parse_strexp()?;
                let end_kw =
                    self.expect_keyword("end", "expected `end` to close the `let` structure")?;
                Ok(StrExp::Let {
                    let_kw,
                    dec: Box::new(dec),
                    in_kw,
                    strexp: Box::new(strexp),
                    end_kw,
                })
            })();
            self.fixity.pop_frame();
            result?
        } else {
            let id = self.parse_long_id()?;
            if id.is_plain() && self.at_symbol("(") {
                let left = self.advance();
                let arg = if self.at_strdec_start() || self.at_symbol(";") {
                    FunAppArg::StrDec(Box::new(self.parse_strdec()?))
                } else {
                    FunAppArg::StrExp(Box::new(self.parse_strexp()?))
                };
                let right =
                    self.expect_symbol(")", "expected `)` to close the functor argument")?;
                StrExp::FunApp {
                    name: id.name,
                    left,
                    arg,
                    right,
                }
            } else {
                StrExp::Id(id)
            }
        };

        let mut strexp = base;
        loop {
            let colon = match self.match_symbol(":") {
                Some(colon) => colon,
                None => match self.match_symbol(":>") {
                    Some(colon) => colon,
                    None => break,
                },
            };
            let sigexp = self.parse_sigexp()?;
            strexp = StrExp::Ascribe {
                strexp: Box::new(strexp),
                colon,
                sigexp,
            };
        }
        Ok(strexp)
    }
}
