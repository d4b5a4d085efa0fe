/// Expression parsing (precedence climbing).
///
/// Binary precedence comes from the operator registry:
///
/// | Level | Operators |
/// |-------|-----------|
/// | 1 | `\|\|`, `? :` |
/// | 2 | `&&` |
/// | 3 | `==` `!=` `<` `<=` `>` `>=` |
/// | 4 | `+` `-` `\|` `^` |
/// | 5 | `*` `/` `%` `<<` `>>` `&` |
///
/// All binary levels are left-associative; the ternary nests to the right through its else branch.
impl<'a> Parser<'a> {
    // ========================================================================
    // Expressions
    // ========================================================================

    fn parse_expr(&mut self) -> Spanned<Expr> {
        self.parse_binary(operators::LOWEST_PRECEDENCE)
    }

    /// Binary precedence of the current token, `0` if it does not continue an expression.
    fn token_precedence(&self) -> u8 {
        match self.peek().kind {
            TokenKind::Operator(id) => operators::precedence(id),
            TokenKind::Punctuation(PunctuationId::Question) => operators::LOWEST_PRECEDENCE,
            _ => 0,
        }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Spanned<Expr> {
        let mut lhs = self.parse_unary();

        loop {
            let precedence = self.token_precedence();
            if precedence == 0 || precedence < min_precedence {
                return lhs;
            }

            let token = self.advance();
            let op = match token.kind {
                TokenKind::Punctuation(PunctuationId::Question) => return self.parse_ternary(lhs),
                TokenKind::Operator(id) => match BinaryOp::from_operator(id) {
                    Some(op) => op,
                    None => return lhs,
                },
                _ => return lhs,
            };
            let rhs = self.parse_binary(precedence + 1);
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(Expr::Binary(Box::new(lhs), op, Box::new(rhs)), span);
        }
    }

    /// `cond ? then : else`, with `?` already consumed.
    fn parse_ternary(&mut self, cond: Spanned<Expr>) -> Spanned<Expr> {
        let then_branch = self.parse_expr();
        if self.require(PunctuationId::Colon).is_none() {
            return Spanned::new(Expr::Invalid, Span::new(cond.span.start, self.prev_end()));
        }
        let else_branch = self.parse_expr();
        let span = cond.span.merge(else_branch.span);
        Spanned::new(
            Expr::Ternary {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        )
    }

    /// Prefix `+` / `-` applied to an atom; repeated prefixes nest.
    fn parse_unary(&mut self) -> Spanned<Expr> {
        let op = match self.peek().kind {
            TokenKind::Operator(OperatorId::Plus) => UnaryOp::Plus,
            TokenKind::Operator(OperatorId::Minus) => UnaryOp::Neg,
            _ => return self.parse_atom(),
        };
        let start = self.advance().pos;
        let operand = self.parse_unary();
        let span = Span::new(start, operand.span.end);
        Spanned::new(Expr::Unary(op, Box::new(operand)), span)
    }

    fn parse_atom(&mut self) -> Spanned<Expr> {
        let token = self.peek();
        match token.kind {
            TokenKind::Ident => {
                self.advance();
                Spanned::new(Expr::Ident(token.text.clone()), token.span())
            }
            TokenKind::Int => {
                self.advance();
                Spanned::new(Expr::Literal(Literal::Int(token.text.clone())), token.span())
            }
            TokenKind::Float => {
                self.advance();
                Spanned::new(Expr::Literal(Literal::Float(token.text.clone())), token.span())
            }
            TokenKind::Punctuation(PunctuationId::LParen) => {
                self.advance();
                let inner = self.parse_expr();
                match self.require(PunctuationId::RParen) {
                    Some(end) => Spanned::new(Expr::Paren(Box::new(inner)), Span::new(token.pos, end)),
                    None => Spanned::new(Expr::Invalid, Span::new(token.pos, self.prev_end())),
                }
            }
            TokenKind::Keyword(KeywordId::Fn) => self.parse_function(),
            _ => {
                self.error(errors::unexpected_token(&token.kind.describe(), token.span()));
                // Leave closers and terminators for the enclosing construct.
                if !self.at_closer() && token.kind != TokenKind::Terminator {
                    self.advance();
                }
                Spanned::new(Expr::Invalid, token.span())
            }
        }
    }

    /// `fn(a, b) { ... }`
    fn parse_function(&mut self) -> Spanned<Expr> {
        let start = self.advance().pos;

        if !self.match_punct(PunctuationId::LParen) {
            self.error(errors::missing("'('", self.current_span()));
        }
        let mut params = Vec::new();
        while self.peek().kind == TokenKind::Ident {
            let token = self.advance();
            let name = Spanned::new(token.text.clone(), token.span());
            let entity = self.symbols.new_entity(token.text.clone(), token.span(), false, None);
            params.push(Param { name, entity });
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        if !self.match_punct(PunctuationId::RParen) {
            self.error(errors::missing("')'", self.current_span()));
        }

        if !self.check_punct(PunctuationId::LBrace) {
            self.error(errors::missing("'{'", self.current_span()));
        }
        let body = self.parse_block();
        let span = Span::new(start, body.span.end);
        Spanned::new(Expr::Function(FunctionLit { params, body }), span)
    }
}
