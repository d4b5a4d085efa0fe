/// Parser core type and program entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::frontend::parser` to keep all parser methods in a
///   single module while avoiding a single “god file”.

/// Stand-in end of input for token streams that do not end with `Eof`.
static END_OF_INPUT: Token = Token {
    pos: 0,
    kind: TokenKind::Eof,
    text: String::new(),
};

/// Parser state.
///
/// ## Notes
/// - The parser is single-pass and never fails: every problem is reported to the sink and the
///   offending text becomes an `Invalid` node, then parsing resumes at the next terminator.
/// - Whether a statement is top level is passed down explicitly (`Option<DeclId>`), never kept as
///   parser state.
pub struct Parser<'a> {
    source: &'a [u8],
    /// Significant tokens only; comments are dropped up front. Always ends with `Eof`.
    tokens: Vec<&'a Token>,
    pos: usize,
    symbols: &'a SymbolTable,
    sink: &'a dyn DiagnosticSink,
    error_count: usize,
    /// Token index where error recovery last stopped, just past a consumed terminator.
    synced_at: Option<usize>,
}

impl<'a> Parser<'a> {
    /// Create a parser over `tokens` (as produced by [`crate::frontend::scanner::scan_all`]).
    ///
    /// ## Parameters
    /// - `source`: the scanned buffer, used to preserve the text of invalid top-level items.
    /// - `symbols`: table receiving one entity per declaration and parameter.
    pub fn new(source: &'a [u8], tokens: &'a [Token], symbols: &'a SymbolTable, sink: &'a dyn DiagnosticSink) -> Self {
        let mut significant: Vec<&'a Token> = tokens.iter().filter(|t| t.kind != TokenKind::Comment).collect();
        if significant.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            significant.push(&END_OF_INPUT);
        }
        Self {
            source,
            tokens: significant,
            pos: 0,
            symbols,
            sink,
            error_count: 0,
            synced_at: None,
        }
    }

    /// Number of problems reported so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Parse every top-level item.
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        loop {
            self.skip_empty_statements();
            if self.is_at_end() {
                break;
            }
            let id = DeclId(program.items.len() as u32);
            let item = self.parse_top_level(id);
            program.items.push(item);
        }
        program
    }

    /// Parse one top-level item; only declarations are accepted.
    fn parse_top_level(&mut self, id: DeclId) -> Spanned<TopLevel> {
        let stmt = self.parse_stmt(Some(id));
        match stmt.node {
            Stmt::Decl(decl) => Spanned::new(TopLevel::Decl(decl), stmt.span),
            Stmt::Invalid => Spanned::new(TopLevel::Invalid(self.slice(stmt.span)), stmt.span),
            _ => {
                self.error(errors::expected_top_level(stmt.span));
                Spanned::new(TopLevel::Invalid(self.slice(stmt.span)), stmt.span)
            }
        }
    }
}
