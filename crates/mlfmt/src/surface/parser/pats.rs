impl Parser {
    /// Full pattern: infix chain, then `: ty` ascriptions, then `as`.
    fn parse_pat(&mut self) -> Result<Pat, Diagnostic> {
        let mut items = vec![InfixItem::Operand(self.parse_pat_operand()?)];
        while self.at_pat_operator() {
            let op = self.advance();
            let fix = self.operator_fixity(&op);
            items.push(InfixItem::Operator(op, fix));
            items.push(InfixItem::Operand(self.parse_pat_operand()?));
        }
        let mut pat = resolve_infix(items, &|left, op, right| Pat::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })?;
        while let Some(colon) = self.match_symbol(":") {
            let ty = self.parse_ty()?;
            pat = Pat::Ascribe {
                pat: Box::new(pat),
                colon,
                ty,
            };
        }
        if let Some(as_kw) = self.match_keyword("as") {
            let rhs = self.parse_pat()?;
            pat = Pat::As {
                lhs: Box::new(pat),
                as_kw,
                rhs: Box::new(rhs),
            };
        }
        Ok(pat)
    }

    /// Like [`Parser::at_infix_operator`] but `=` never acts as an
    /// operator inside patterns (it terminates the enclosing binding).
    fn at_pat_operator(&self) -> bool {
        !self.peek().is_symbol("=") && self.at_infix_operator()
    }

    /// One infix operand: an atomic pattern, or a constructor applied to
    /// a single atomic argument.
    fn parse_pat_operand(&mut self) -> Result<Pat, Diagnostic> {
        let op_kw = self.match_keyword("op");
        if op_kw.is_some() || (self.at_ident() && !self.at_pat_operator()) {
            let id = self.parse_long_id()?;
            if self.at_atpat_start() && !self.at_pat_operator() {
                let arg = self.parse_atpat()?;
                return Ok(Pat::Con {
                    op_kw,
                    id,
                    arg: Box::new(arg),
                });
            }
            return Ok(Pat::Ident { op_kw, id });
        }
        self.parse_atpat()
    }

    fn at_atpat_start(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Int
            | TokenKind::Word
            | TokenKind::Real
            | TokenKind::Char
            | TokenKind::String => true,
            TokenKind::Ident | TokenKind::SymbolicIdent => true,
            TokenKind::Keyword => token.text == "op",
            TokenKind::Symbol => matches!(token.text.as_str(), "_" | "(" | "[" | "{"),
            _ => false,
        }
    }

    fn parse_atpat(&mut self) -> Result<Pat, Diagnostic> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Symbol if token.text == "_" => Ok(Pat::Wildcard(self.advance())),
            TokenKind::Int
            | TokenKind::Word
            | TokenKind::Real
            | TokenKind::Char
            | TokenKind::String => Ok(Pat::Const(self.advance())),
            TokenKind::Keyword if token.text == "op" => {
                let op_kw = Some(self.advance());
                let id = self.parse_long_id()?;
                Ok(Pat::Ident { op_kw, id })
            }
            TokenKind::Ident | TokenKind::SymbolicIdent => {
                let id = self.parse_long_id()?;
                Ok(Pat::Ident { op_kw: None, id })
            }
            TokenKind::Symbol if token.text == "(" => self.parse_pat_parens(),
            TokenKind::Symbol if token.text == "[" => self.parse_pat_list(),
            TokenKind::Symbol if token.text == "{" => self.parse_pat_record(),
            _ => Err(self.error("expected a pattern")),
        }
    }

    fn parse_pat_parens(&mut self) -> Result<Pat, Diagnostic> {
        let left = self.advance();
        if let Some(right) = self.match_symbol(")") {
            return Ok(Pat::Unit { left, right });
        }
        let first = self.parse_pat()?;
        if self.at_symbol(",") {
            let mut elems = vec![first];
            let mut delims = Vec::new();
            while let Some(comma) = self.match_symbol(",") {
                delims.push(comma);
                elems.push(self.parse_pat()?);
            }
            let right = self.expect_symbol(")", "expected `)` to close the tuple pattern")?;
            return Ok(Pat::Tuple {
                left,
                elems,
                delims,
                right,
            });
        }
        let right = self.expect_symbol(")", "expected `)` to close the pattern")?;
        Ok(Pat::Paren {
            left,
            pat: Box::new(first),
            right,
        })
    }

    fn parse_pat_list(&mut self) -> Result<Pat, Diagnostic> {
        let left = self.advance();
        let mut elems = Vec::new();
        let mut delims = Vec::new();
        if !self.at_symbol("]") {
            loop {
                elems.push(self.parse_pat()?);
                match self.match_symbol(",") {
                    Some(comma) => delims.push(comma),
                    None => break,
                }
            }
        }
        let right = self.expect_symbol("]", "expected `]` to close the list pattern")?;
        Ok(Pat::List {
            left,
            elems,
            delims,
            right,
        })
    }

    fn parse_pat_record(&mut self) -> Result<Pat, Diagnostic> {
        let left = self.advance();
        let mut rows = Vec::new();
        let mut delims = Vec::new();
        if !self.at_symbol("}") {
            loop {
                rows.push(self.parse_patrow()?);
                match self.match_symbol(",") {
                    Some(comma) => delims.push(comma),
                    None => break,
                }
            }
        }
        let right = self.expect_symbol("}", "expected `}` to close the record pattern")?;
        Ok(Pat::Record {
            left,
            rows,
            delims,
            right,
        })
    }

    fn parse_patrow(&mut self) -> Result<PatRow, Diagnostic> {
        if self.at_symbol("...") {
            return Ok(PatRow::Rest(self.advance()));
        }
        let label = self.parse_label("expected a record pattern row")?;
        if let Some(eq) = self.match_symbol("=") {
            let pat = self.parse_pat()?;
            return Ok(PatRow::Labeled { label, eq, pat });
        }
        if label.kind != TokenKind::Ident {
            return Err(self.error_explain(
                "expected `=` after the record field label",
                "Only identifier labels can be punned; numeric labels need an explicit `label = pattern` row.",
            ));
        }
        let ty = match self.match_symbol(":") {
            Some(colon) => Some((colon, self.parse_ty()?)),
            None => None,
        };
        let as_pat = match self.match_keyword("as") {
            Some(as_kw) => Some((as_kw, Box::new(self.parse_pat()?))),
            None => None,
        };
        Ok(PatRow::Punned {
            id: label,
            ty,
            as_pat,
        })
    }
}
