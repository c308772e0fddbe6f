impl Parser {
    /// Full type: tuples bind tighter than `->`, applications tighter
    /// than tuples.
    fn parse_ty(&mut self) -> Result<Ty, Diagnostic> {
        let param = self.parse_ty_tuple()?;
        if let Some(arrow) = self.match_symbol("->") {
            let result = self.parse_ty()?;
            return Ok(Ty::Arrow {
                param: Box::new(param),
                arrow,
                result: Box::new(result),
            });
        }
        Ok(param)
    }

    fn parse_ty_tuple(&mut self) -> Result<Ty, Diagnostic> {
        let first = self.parse_ty_app()?;
        if !self.at_star() {
            return Ok(first);
        }
        let mut elems = vec![first];
        let mut delims = Vec::new();
        while self.at_star() {
            delims.push(self.advance());
            elems.push(self.parse_ty_app()?);
        }
        Ok(Ty::Tuple { elems, delims })
    }

    fn at_star(&self) -> bool {
        let token = self.peek();
        token.kind == TokenKind::SymbolicIdent
            && token.text == "*"
            && !self.peek_at(1).is_symbol(".")
    }

    /// Postfix constructor applications: `int list`, `('a, 'b) pair t`.
    fn parse_ty_app(&mut self) -> Result<Ty, Diagnostic> {
        let mut ty = self.parse_ty_atom()?;
        while self.at_tycon() {
            let name = self.parse_long_id()?;
            ty = Ty::Con {
                args: SyntaxSeq::One(Box::new(ty)),
                name,
            };
        }
        Ok(ty)
    }

    fn at_tycon(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Ident => true,
            TokenKind::SymbolicIdent => token.text != "*",
            _ => false,
        }
    }

    fn parse_ty_atom(&mut self) -> Result<Ty, Diagnostic> {
        if self.peek().kind == TokenKind::TyVar {
            return Ok(Ty::Var(self.advance()));
        }
        if self.at_symbol("{") {
            return self.parse_ty_record();
        }
        if self.at_symbol("(") {
            let left = self.advance();
            let first = self.parse_ty()?;
            if self.at_symbol(",") {
                let mut elems = vec![first];
                let mut delims = Vec::new();
                while let Some(comma) = self.match_symbol(",") {
                    delims.push(comma);
                    elems.push(self.parse_ty()?);
                }
                let right =
                    self.expect_symbol(")", "expected `)` to close the type argument list")?;
                if !self.at_tycon() {
                    return Err(self.error_explain(
                        "expected a type constructor after `)`",
                        "A parenthesized comma-separated type list must be applied to a type constructor, as in `('a, 'b) pair`.",
                    ));
                }
                let name = self.parse_long_id()?;
                return Ok(Ty::Con {
                    args: SyntaxSeq::Many {
                        left,
                        elems: elems.into_iter().map(Box::new).collect(),
                        delims,
                        right,
                    },
                    name,
                });
            }
            let right = self.expect_symbol(")", "expected `)` to close the type")?;
            return Ok(Ty::Paren {
                left,
                ty: Box::new(first),
                right,
            });
        }
        if self.at_tycon() {
            let name = self.parse_long_id()?;
            return Ok(Ty::Con {
                args: SyntaxSeq::Empty,
                name,
            });
        }
        Err(self.error("expected a type"))
    }

    fn parse_ty_record(&mut self) -> Result<Ty, Diagnostic> {
        let left = self.advance();
        let mut rows = Vec::new();
        let mut delims = Vec::new();
        if !self.at_symbol("}") {
            loop {
                let label = self.parse_label("expected a record field label")?;
                let colon = self.expect_symbol(":", "expected `:` after the record field label")?;
                let ty = self.parse_ty()?;
                rows.push(TyRow { label, colon, ty });
                match self.match_symbol(",") {
                    Some(comma) => delims.push(comma),
                    None => break,
                }
            }
        }
        let right = self.expect_symbol("}", "expected `}` to close the record type")?;
        Ok(Ty::Record {
            left,
            rows,
            delims,
            right,
        })
    }

    /// Record labels are identifiers or positive numerals (`{1 = a, 2 = b}`).
    fn parse_label(&mut self, what: &str) -> Result<Token, Diagnostic> {
        match self.peek().kind {
            TokenKind::Ident | TokenKind::SymbolicIdent | TokenKind::Int => Ok(self.advance()),
            _ => Err(self.error(what)),
        }
    }
}
