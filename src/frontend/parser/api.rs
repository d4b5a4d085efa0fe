/// Parse a token stream into an AST [`Program`].
///
/// This is the main public entrypoint for parsing.
///
/// ## Parameters
/// - `source`: the buffer the tokens were scanned from.
/// - `tokens`: token stream produced by [`crate::frontend::scanner::scan_all`].
/// - `symbols`: receives one entity per declaration and parameter; top-level names are bound in
///   [`ScopeId::GLOBAL`].
///
/// ## Notes
/// - Problems go to `sink`; the returned program always covers the whole input.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse(source: &[u8], tokens: &[Token], symbols: &SymbolTable, sink: &dyn DiagnosticSink) -> Program {
    let mut parser = Parser::new(source, tokens, symbols, sink);
    let program = parser.parse_program();
    tracing::debug!(items = program.items.len(), errors = parser.error_count(), "parsed");
    program
}
