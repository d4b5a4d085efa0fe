/// Token-stream helpers and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching keywords, operators, and punctuation
/// - Terminator handling (`expect_terminator`, `skip_empty_statements`)
/// - Error recovery (`require`, `skip_to_terminator`)
impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` if the current token is [`TokenKind::Eof`].
    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &'a Token {
        // The stream always ends with `Eof`, and `advance` never moves past it.
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    /// End offset of the most recently consumed token (the current start when nothing was consumed).
    fn prev_end(&self) -> Pos {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span().end,
            None => self.peek().pos,
        }
    }

    fn current_span(&self) -> Span {
        self.peek().span()
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn check_op(&self, id: OperatorId) -> bool {
        self.peek().kind.is_operator(id)
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_op(&mut self, id: OperatorId) -> bool {
        if self.check_op(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Tokens that close an enclosing construct; a terminator may be omitted before them.
    fn at_closer(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Eof | TokenKind::Punctuation(PunctuationId::RBrace | PunctuationId::RParen)
        )
    }

    // ========================================================================
    // Diagnostics and recovery
    // ========================================================================

    fn error(&mut self, diagnostic: Diagnostic) {
        self.error_count += 1;
        self.sink.report(diagnostic);
    }

    /// Source text covered by `span`.
    fn slice(&self, span: Span) -> String {
        let end = span.end.min(self.source.len());
        let start = span.start.min(end);
        String::from_utf8_lossy(&self.source[start..end]).into_owned()
    }

    /// Skip to the next terminator (consumed) or end of input.
    fn skip_to_terminator(&mut self) {
        while !self.is_at_end() {
            if self.advance().kind == TokenKind::Terminator {
                break;
            }
        }
        self.synced_at = Some(self.pos);
    }

    /// Consume the punctuation `id`, or report it missing and skip the rest of the statement.
    ///
    /// ## Returns
    /// - `Some(end)` with the end offset of the consumed token on success.
    /// - `None` after recovery.
    fn require(&mut self, id: PunctuationId) -> Option<Pos> {
        if self.check_punct(id) {
            return Some(self.advance().span().end);
        }
        self.error(errors::missing(&format!("'{}'", punctuation::as_str(id)), self.current_span()));
        self.skip_to_terminator();
        None
    }

    /// Consume a statement terminator.
    ///
    /// A terminator may be omitted right before `}`, `)` or end of input, and is not expected again right after
    /// recovery consumed one. Anything else is reported and skipped up to the next terminator.
    fn expect_terminator(&mut self) {
        if self.synced_at == Some(self.pos) {
            return;
        }
        if self.peek().kind == TokenKind::Terminator {
            self.advance();
            return;
        }
        if self.at_closer() {
            return;
        }
        let found = self.peek().kind.describe();
        self.error(errors::missing_terminator(&found, self.current_span()));
        self.skip_to_terminator();
    }

    /// Stray terminators (`;;`, a leading `;`) are empty statements.
    fn skip_empty_statements(&mut self) {
        while self.peek().kind == TokenKind::Terminator {
            self.advance();
        }
    }
}
