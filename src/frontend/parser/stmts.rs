/// Statement parsing.
///
/// Grammar (terminators are `;`, an inserted newline, or omitted before `}` / `)` / end of input):
///
/// ```text
/// stmt        = simple_stmt TERM | "return" expr TERM | block TERM? | TERM
/// simple_stmt = IDENT ":" "=" expr          (mutable declaration)
///             | IDENT ":" ":" expr          (constant declaration)
///             | IDENT "=" expr              (assignment)
///             | expr                        (expression statement)
/// block       = "{" stmt* "}"
/// ```
impl<'a> Parser<'a> {
    // ========================================================================
    // Statements
    // ========================================================================

    /// Parse one statement. `top_level` carries the id the item will get when parsing at the top level.
    fn parse_stmt(&mut self, top_level: Option<DeclId>) -> Spanned<Stmt> {
        let start = self.peek().pos;
        match self.peek().kind {
            TokenKind::Ident
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Keyword(KeywordId::Fn)
            | TokenKind::Punctuation(PunctuationId::LParen)
            | TokenKind::Operator(OperatorId::Plus | OperatorId::Minus) => {
                let stmt = self.parse_simple_stmt(top_level);
                if !matches!(stmt.node, Stmt::Invalid) {
                    self.expect_terminator();
                }
                stmt
            }
            TokenKind::Keyword(KeywordId::Return) => {
                self.advance();
                let value = self.parse_expr();
                let span = Span::new(start, value.span.end);
                self.expect_terminator();
                Spanned::new(Stmt::Return(value), span)
            }
            TokenKind::Punctuation(PunctuationId::LBrace) => {
                let block = self.parse_block();
                self.expect_terminator();
                Spanned::new(Stmt::Block(block.node), block.span)
            }
            _ => {
                let found = self.peek().kind.describe();
                self.error(errors::expected_statement(&found, self.current_span()));
                self.skip_to_terminator();
                Spanned::new(Stmt::Invalid, Span::new(start, self.prev_end().max(start)))
            }
        }
    }

    /// Declaration, assignment or expression statement; all start with an expression.
    fn parse_simple_stmt(&mut self, top_level: Option<DeclId>) -> Spanned<Stmt> {
        let lhs = self.parse_expr();

        if self.check_op(OperatorId::Assign) {
            let Expr::Ident(name) = lhs.node else {
                self.error(errors::invalid_assignment_target(lhs.span));
                return self.invalid_from(lhs.span.start);
            };
            self.advance();
            let value = self.parse_expr();
            let span = lhs.span.merge(value.span);
            let target = Spanned::new(name, lhs.span);
            return Spanned::new(Stmt::Assign(Assign { target, value }), span);
        }

        if self.check_punct(PunctuationId::Colon) {
            let Expr::Ident(name) = lhs.node else {
                self.error(errors::expected("identifier before ':'", "expression", lhs.span));
                return self.invalid_from(lhs.span.start);
            };
            self.advance();
            let constant = if self.match_punct(PunctuationId::Colon) {
                true
            } else if self.match_op(OperatorId::Assign) {
                false
            } else {
                self.error(errors::missing("'=' or ':' after ':'", self.current_span()));
                return self.invalid_from(lhs.span.start);
            };
            let value = self.parse_expr();
            let name = Spanned::new(name, lhs.span);
            let span = name.span.merge(value.span);
            let decl = self.declare(name, constant, value, top_level);
            return Spanned::new(Stmt::Decl(decl), span);
        }

        let span = lhs.span;
        Spanned::new(Stmt::Expr(lhs), span)
    }

    /// Build a declaration node and its entity.
    ///
    /// Top-level declarations are bound into the global scope immediately; a collision is reported and the new
    /// binding replaces the old one. Local declarations are bound by the checker, per check.
    fn declare(&mut self, name: Spanned<Ident>, constant: bool, value: Spanned<Expr>, top_level: Option<DeclId>) -> Decl {
        let entity = self.symbols.new_entity(name.node.clone(), name.span, constant, top_level);
        let mut redeclares = None;
        if top_level.is_some() {
            if let Some(previous) = self.symbols.declare(ScopeId::GLOBAL, entity) {
                let previous_span = self.symbols.entity(previous).span;
                self.error(errors::duplicate_declaration(&name.node, name.span, previous_span));
                redeclares = Some(previous);
            }
        }
        Decl {
            name,
            entity,
            constant,
            value,
            redeclares,
        }
    }

    /// Report-free recovery: skip the rest of the statement and return an `Invalid` node covering it.
    fn invalid_from(&mut self, start: Pos) -> Spanned<Stmt> {
        self.skip_to_terminator();
        Spanned::new(Stmt::Invalid, Span::new(start, self.prev_end().max(start)))
    }

    /// Parse `{ stmt* }`.
    ///
    /// The caller has checked for `{` (or reported its absence); a missing `{` is tolerated and the block runs
    /// to the next `}`.
    fn parse_block(&mut self) -> Spanned<Block> {
        let start = self.peek().pos;
        self.match_punct(PunctuationId::LBrace);

        let mut stmts = Vec::new();
        loop {
            self.skip_empty_statements();
            if self.is_at_end() || self.check_punct(PunctuationId::RBrace) {
                break;
            }
            stmts.push(self.parse_stmt(None));
        }

        let end = self.require(PunctuationId::RBrace).unwrap_or_else(|| self.prev_end());
        Spanned::new(Block { stmts }, Span::new(start, end.max(start)))
    }
}
