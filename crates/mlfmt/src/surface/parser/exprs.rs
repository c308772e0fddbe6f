impl Parser {
    fn parse_exp(&mut self) -> Result<Exp, Diagnostic> {
        if self.at_exp_prefix_start() {
            return self.parse_exp_prefix();
        }
        self.parse_orelse()
    }

    /// The forms that extend greedily to the right: `raise`, `if`,
    /// `while`, `case`, `fn`.
    fn at_exp_prefix_start(&self) -> bool {
        let token = self.peek();
        token.kind == TokenKind::Keyword
            && matches!(token.text.as_str(), "raise" | "if" | "while" | "case" | "fn")
    }

    fn parse_exp_prefix(&mut self) -> Result<Exp, Diagnostic> {
        if let Some(kw) = self.match_keyword("raise") {
            let exp = self.parse_exp()?;
            return Ok(Exp::Raise {
                kw,
                exp: Box::new(exp),
            });
        }
        if let Some(if_kw) = self.match_keyword("if") {
            let cond = self.parse_exp()?;
            let then_kw = self.expect_keyword("then", "expected `then` after the `if` condition")?;
            let then_exp = self.parse_exp()?;
            let else_kw = self.expect_keyword_explain(
                "else",
                "expected `else` after the `then` branch",
                "Standard ML has no one-armed `if`; every `if` takes both `then` and `else` branches.",
            )?;
            let else_exp = self.parse_exp()?;
            return Ok(Exp::If {
                if_kw,
                cond: Box::new(cond),
                then_kw,
                then_exp: Box::new(then_exp),
                else_kw,
                else_exp: Box::new(else_exp),
            });
        }
        if let Some(while_kw) = self.match_keyword("while") {
            let cond = self.parse_exp()?;
            let do_kw = self.expect_keyword("do", "expected `do` after the `while` condition")?;
            let body = self.parse_exp()?;
            return Ok(Exp::While {
                while_kw,
                cond: Box::new(cond),
                do_kw,
                body: Box::new(body),
            });
        }
        if let Some(case_kw) = self.match_keyword("case") {
            let exp = self.parse_exp()?;
            let of_kw = self.expect_keyword("of", "expected `of` after the `case` scrutinee")?;
            let arms = self.parse_match()?;
            return Ok(Exp::Case {
                case_kw,
                exp: Box::new(exp),
                of_kw,
                arms,
            });
        }
        let kw = self.expect_keyword("fn", "expected an expression")?;
        let arms = self.parse_match()?;
        Ok(Exp::Fn { kw, arms })
    }

    fn expect_keyword_explain(
        &mut self,
        keyword: &str,
        what: &str,
        explain: &str,
    ) -> Result<Token, Diagnostic> {
        self.match_keyword(keyword)
            .ok_or_else(|| self.error_explain(what, explain))
    }

    fn parse_orelse(&mut self) -> Result<Exp, Diagnostic> {
        let mut lhs = self.parse_andalso()?;
        while let Some(kw) = self.match_keyword("orelse") {
            let rhs = if self.at_exp_prefix_start() {
                self.parse_exp()?
            } else {
                self.parse_andalso()?
            };
            lhs = Exp::Orelse {
                left: Box::new(lhs),
                kw,
                right: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_andalso(&mut self) -> Result<Exp, Diagnostic> {
        let mut lhs = self.parse_ascribe()?;
        while let Some(kw) = self.match_keyword("andalso") {
            let rhs = if self.at_exp_prefix_start() {
                self.parse_exp()?
            } else {
                self.parse_ascribe()?
            };
            lhs = Exp::Andalso {
                left: Box::new(lhs),
                kw,
                right: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_ascribe(&mut self) -> Result<Exp, Diagnostic> {
        let mut exp = self.parse_infexp()?;
        while let Some(colon) = self.match_symbol(":") {
            let ty = self.parse_ty()?;
            exp = Exp::Ascribe {
                exp: Box::new(exp),
                colon,
                ty,
            };
        }
        Ok(exp)
    }

    /// Phase one of infix parsing: collect the flat operand/operator
    /// sequence, then rebracket it against the fixity environment.
    fn parse_infexp(&mut self) -> Result<Exp, Diagnostic> {
        let mut items = vec![InfixItem::Operand(self.parse_app_handle()?)];
        while self.at_infix_operator() {
            let op = self.advance();
            let fix = self.operator_fixity(&op);
            items.push(InfixItem::Operator(op, fix));
            items.push(InfixItem::Operand(self.parse_app_handle()?));
        }
        resolve_infix(items, &|left, op, right| Exp::Infix {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// `handle` binds tighter than infix operators but looser than
    /// application, so it attaches here, to the application it follows.
    fn parse_app_handle(&mut self) -> Result<Exp, Diagnostic> {
        let mut exp = self.parse_appexp()?;
        while let Some(kw) = self.match_keyword("handle") {
            let arms = self.parse_match()?;
            exp = Exp::Handle {
                exp: Box::new(exp),
                kw,
                arms,
            };
        }
        Ok(exp)
    }

    fn parse_appexp(&mut self) -> Result<Exp, Diagnostic> {
        let mut exp = self.parse_atexp()?;
        while self.at_atexp_start() && !self.at_infix_operator() {
            let arg = self.parse_atexp()?;
            exp = Exp::App {
                func: Box::new(exp),
                arg: Box::new(arg),
            };
        }
        Ok(exp)
    }

    fn at_atexp_start(&self) -> bool {
        let token = self.peek();
        match token.kind {
            TokenKind::Int
            | TokenKind::Word
            | TokenKind::Real
            | TokenKind::Char
            | TokenKind::String => true,
            TokenKind::Ident | TokenKind::SymbolicIdent => true,
            TokenKind::Keyword => matches!(token.text.as_str(), "op" | "let"),
            TokenKind::Symbol => matches!(token.text.as_str(), "(" | "[" | "{" | "#"),
            _ => false,
        }
    }

    fn parse_atexp(&mut self) -> Result<Exp, Diagnostic> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int
            | TokenKind::Word
            | TokenKind::Real
            | TokenKind::Char
            | TokenKind::String => Ok(Exp::Const(self.advance())),
            TokenKind::Keyword if token.text == "op" => {
                let op_kw = Some(self.advance());
                let id = self.parse_long_id()?;
                Ok(Exp::Ident { op_kw, id })
            }
            TokenKind::Keyword if token.text == "let" => self.parse_let(),
            TokenKind::Ident | TokenKind::SymbolicIdent => {
                let id = self.parse_long_id()?;
                Ok(Exp::Ident { op_kw: None, id })
            }
            TokenKind::Symbol if token.text == "#" => {
                let hash = self.advance();
                let label = self.parse_label("expected a record label after `#`")?;
                Ok(Exp::Selector { hash, label })
            }
            TokenKind::Symbol if token.text == "(" => self.parse_exp_parens(),
            TokenKind::Symbol if token.text == "[" => self.parse_exp_list(),
            TokenKind::Symbol if token.text == "{" => self.parse_exp_record(),
            _ => Err(self.error("expected an expression")),
        }
    }

    fn parse_let(&mut self) -> Result<Exp, Diagnostic> {
        let let_kw = self.advance();
        self.fixity.push_frame();
        let result = self.parse_let_body(let_kw);
        self.fixity.pop_frame();
        result
    }

    fn parse_let_body(&mut self, let_kw: Token) -> Result<Exp, Diagnostic> {
        let dec = self.parse_dec()?;
        let in_kw = self.expect_keyword("in", "expected `in` after the `let` declarations")?;
        let mut body = vec![self.parse_exp()?];
        let mut delims = Vec::new();
        while let Some(semi) = self.match_symbol(";") {
            delims.push(semi);
            body.push(self.parse_exp()?);
        }
        let end_kw = self.expect_keyword("end", "expected `end` to close the `let` expression")?;
        Ok(Exp::Let {
            let_kw,
            dec: Box::new(dec),
            in_kw,
            body,
            delims,
            end_kw,
        })
    }

    fn parse_exp_parens(&mut self) -> Result<Exp, Diagnostic> {
        let left = self.advance();
        if let Some(right) = self.match_symbol(")") {
            return Ok(Exp::Unit { left, right });
        }
        let first = self.parse_exp()?;
        if self.at_symbol(",") {
            let mut elems = vec![first];
            let mut delims = Vec::new();
            while let Some(comma) = self.match_symbol(",") {
                delims.push(comma);
                elems.push(self.parse_exp()?);
            }
            let right = self.expect_symbol(")", "expected `)` to close the tuple")?;
            return Ok(Exp::Tuple {
                left,
                elems,
                delims,
                right,
            });
        }
        if self.at_symbol(";") {
            let mut elems = vec![first];
            let mut delims = Vec::new();
            while let Some(semi) = self.match_symbol(";") {
                delims.push(semi);
                elems.push(self.parse_exp()?);
            }
            let right = self.expect_symbol(")", "expected `)` to close the sequence")?;
            return Ok(Exp::Sequence {
                left,
                elems,
                delims,
                right,
            });
        }
        let right = self.expect_symbol(")", "expected `)` to close the expression")?;
        Ok(Exp::Paren {
            left,
            exp: Box::new(first),
            right,
        })
    }

    fn parse_exp_list(&mut self) -> Result<Exp, Diagnostic> {
        let left = self.advance();
        let mut elems = Vec::new();
        let mut delims = Vec::new();
        if !self.at_symbol("]") {
            loop {
                elems.push(self.parse_exp()?);
                match self.match_symbol(",") {
                    Some(comma) => delims.push(comma),
                    None => break,
                }
            }
        }
        let right = self.expect_symbol("]", "expected `]` to close the list")?;
        Ok(Exp::List {
            left,
            elems,
            delims,
            right,
        })
    }

    fn parse_exp_record(&mut self) -> Result<Exp, Diagnostic> {
        let left = self.advance();
        let mut rows = Vec::new();
        let mut delims = Vec::new();
        if !self.at_symbol("}") {
            loop {
                let label = self.parse_label("expected a record field label")?;
                let eq = self.expect_symbol("=", "expected `=` after the record field label")?;
                let exp = self.parse_exp()?;
                rows.push(ExpRow { label, eq, exp });
                match self.match_symbol(",") {
                    Some(comma) => delims.push(comma),
                    None => break,
                }
            }
        }
        let right = self.expect_symbol("}", "expected `}` to close the record")?;
        Ok(Exp::Record {
            left,
            rows,
            delims,
            right,
        })
    }

    /// One-or-more `pat => exp` rules separated by `|`. A nested match
    /// greedily claims the following rules, so an outer match resumes
    /// only after a parenthesized inner one.
    fn parse_match(&mut self) -> Result<Match, Diagnostic> {
        let mut arms = vec![self.parse_arm()?];
        let mut delims = Vec::new();
        while let Some(bar) = self.match_symbol("|") {
            delims.push(bar);
            arms.push(self.parse_arm()?);
        }
        Ok(Match { arms, delims })
    }

    fn parse_arm(&mut self) -> Result<Arm, Diagnostic> {
        let pat = self.parse_pat()?;
        let arrow = self.expect_symbol_explain(
            "=>",
            "expected `=>` after the pattern",
            "Each match rule has the shape `pattern => expression`.",
        )?;
        let exp = self.parse_exp()?;
        Ok(Arm { pat, arrow, exp })
    }

    fn expect_symbol_explain(
        &mut self,
        symbol: &str,
        what: &str,
        explain: &str,
    ) -> Result<Token, Diagnostic> {
        self.match_symbol(symbol)
            .ok_or_else(|| self.error_explain(what, explain))
    }
}
