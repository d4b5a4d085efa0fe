//! Diagnostics and error reporting for Kestrel
//!
//! Every lexical, syntactic and semantic problem becomes a [`Diagnostic`] value handed to a caller-supplied
//! [`DiagnosticSink`]. Reporting never halts processing: the scanner substitutes placeholders, the parser
//! resynchronizes, and the checker marks the enclosing statement invalid.
//!
//! ## Notes
//!
//! - Sinks are `Sync` because checker jobs may run on several worker threads at once.
//! - [`Diagnostics`] is the stock collecting sink; closures implement [`DiagnosticSink`] too.
//! - Rendering goes through `miette`'s graphical handler (see [`format_diagnostic`]).

use std::fmt;

use parking_lot::Mutex;

use crate::frontend::ast::{Pos, Span};

/// A frontend problem with location information
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    /// Secondary locations, e.g. a previous declaration.
    pub labels: Vec<(Span, String)>,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    fn with_kind(kind: DiagnosticKind, message: String, span: Span) -> Self {
        Self {
            kind,
            message,
            span,
            labels: Vec::new(),
            notes: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn lex(message: impl Into<String>, pos: Pos) -> Self {
        Self::with_kind(DiagnosticKind::Lex, message.into(), Span::new(pos, pos))
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::with_kind(DiagnosticKind::Syntax, message.into(), span)
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self::with_kind(DiagnosticKind::Semantic, message.into(), span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::with_kind(DiagnosticKind::Warning, message.into(), span)
    }

    pub fn with_label(mut self, span: Span, label: impl Into<String>) -> Self {
        self.labels.push((span, label.into()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Byte offset the diagnostic points at.
    pub fn pos(&self) -> Pos {
        self.span.start
    }

    pub fn is_error(&self) -> bool {
        self.kind != DiagnosticKind::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Lex,
    Syntax,
    Semantic,
    Warning,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Lex => write!(f, "lex error"),
            DiagnosticKind::Syntax => write!(f, "syntax error"),
            DiagnosticKind::Semantic => write!(f, "error"),
            DiagnosticKind::Warning => write!(f, "warning"),
        }
    }
}

// ============================================================================
// Sinks
// ============================================================================

/// Receiver for diagnostics.
pub trait DiagnosticSink: Sync {
    fn report(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Sync,
{
    fn report(&self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Thread-safe collecting sink.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything reported so far, in report order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.items.lock().clone()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items.into_inner()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.items.lock().iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.lock().iter().filter(|d| d.is_error()).count()
    }

    /// Messages only, handy for assertions.
    pub fn messages(&self) -> Vec<String> {
        self.items.lock().iter().map(|d| d.message.clone()).collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.items.lock().iter().filter(|d| d.message.contains(needle)).count()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::debug!(kind = %diagnostic.kind, pos = diagnostic.pos(), message = %diagnostic.message, "diagnostic");
        self.items.lock().push(diagnostic);
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Adapter that lets `miette` render a [`Diagnostic`] against its source.
struct Rendered<'a> {
    diagnostic: &'a Diagnostic,
    source: miette::NamedSource<String>,
    help: Option<String>,
}

impl fmt::Debug for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.diagnostic, f)
    }
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostic.message)
    }
}

impl std::error::Error for Rendered<'_> {}

impl miette::Diagnostic for Rendered<'_> {
    fn code<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        Some(Box::new(self.diagnostic.kind))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diagnostic.kind {
            DiagnosticKind::Warning => miette::Severity::Warning,
            _ => miette::Severity::Error,
        })
    }

    fn help<'b>(&'b self) -> Option<Box<dyn fmt::Display + 'b>> {
        self.help.as_ref().map(|h| Box::new(h) as Box<dyn fmt::Display + 'b>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
        let len = self.source.inner().len();
        let clamp = move |span: Span| {
            let start = span.start.min(len);
            let end = span.end.clamp(start, len);
            miette::SourceSpan::from(start..end)
        };
        let primary = miette::LabeledSpan::new_primary_with_span(None, clamp(self.diagnostic.span));
        let secondary = self
            .diagnostic
            .labels
            .iter()
            .map(move |(span, label)| miette::LabeledSpan::new_with_span(Some(label.clone()), clamp(*span)));
        Some(Box::new(std::iter::once(primary).chain(secondary)))
    }
}

/// Render a diagnostic with source context.
///
/// ## Parameters
/// - `file_name`: name shown in the location header.
/// - `source`: the buffer the diagnostic's offsets refer to.
/// - `color`: use ANSI colors (CLI) or plain unicode (tests, pipes).
pub fn format_diagnostic(file_name: &str, source: &[u8], diagnostic: &Diagnostic, color: bool) -> String {
    let text = String::from_utf8_lossy(source).into_owned();
    let mut help_lines: Vec<String> = diagnostic.notes.iter().map(|n| format!("note: {}", n)).collect();
    help_lines.extend(diagnostic.hints.iter().cloned());
    let rendered = Rendered {
        diagnostic,
        source: miette::NamedSource::new(file_name, text),
        help: (!help_lines.is_empty()).then(|| help_lines.join("\n")),
    };

    let theme = if color {
        miette::GraphicalTheme::unicode()
    } else {
        miette::GraphicalTheme::unicode_nocolor()
    };
    let handler = miette::GraphicalReportHandler::new_themed(theme);
    let mut out = String::new();
    if handler.render_report(&mut out, &rendered).is_err() {
        // Fall back to the one-line form; rendering only fails on formatter errors.
        out = format!("{}: {}\n", file_name, diagnostic);
    }
    out
}

// ============================================================================
// Error catalog
// ============================================================================

/// Constructors for every diagnostic the frontend emits, so wording lives in one place.
pub mod errors {
    use super::*;

    // ---- lexical -----------------------------------------------------------

    pub fn illegal_byte_order_mark(pos: Pos) -> Diagnostic {
        Diagnostic::lex("illegal byte order mark", pos)
    }

    pub fn illegal_nul(pos: Pos) -> Diagnostic {
        Diagnostic::lex("illegal character NUL", pos)
    }

    pub fn illegal_encoding(pos: Pos) -> Diagnostic {
        Diagnostic::lex("illegal UTF-8 encoding", pos)
    }

    pub fn illegal_character(ch: char, pos: Pos) -> Diagnostic {
        Diagnostic::lex(format!("illegal character {:?}", ch), pos)
    }

    pub fn comment_not_terminated(pos: Pos) -> Diagnostic {
        Diagnostic::lex("comment not terminated", pos).with_hint("close the block comment with `*/`")
    }

    pub fn illegal_number(base_name: &str, pos: Pos) -> Diagnostic {
        Diagnostic::lex(format!("illegal {} number", base_name), pos)
    }

    pub fn illegal_exponent(pos: Pos) -> Diagnostic {
        Diagnostic::lex("illegal floating-point exponent", pos)
    }

    pub fn escape_not_terminated(pos: Pos) -> Diagnostic {
        Diagnostic::lex("escape sequence not terminated", pos)
    }

    pub fn unknown_escape(pos: Pos) -> Diagnostic {
        Diagnostic::lex("unknown escape sequence", pos)
            .with_hint("valid escapes: \\a \\b \\f \\n \\r \\t \\v \\\\ \\\" \\xHH \\uHHHH \\UHHHHHHHH")
    }

    pub fn illegal_escape_character(ch: char, pos: Pos) -> Diagnostic {
        Diagnostic::lex(format!("illegal character {:?} in escape sequence", ch), pos)
    }

    pub fn invalid_code_point(pos: Pos) -> Diagnostic {
        Diagnostic::lex("escape sequence is an invalid Unicode code point", pos)
    }

    pub fn string_not_terminated(pos: Pos) -> Diagnostic {
        Diagnostic::lex("string literal not terminated", pos)
    }

    // ---- syntax ------------------------------------------------------------

    pub fn expected(what: &str, found: &str, span: Span) -> Diagnostic {
        Diagnostic::syntax(format!("expected {}, found {}", what, found), span)
    }

    /// A required token is absent: "missing ')'".
    pub fn missing(what: &str, span: Span) -> Diagnostic {
        Diagnostic::syntax(format!("missing {}", what), span)
    }

    pub fn expected_top_level(span: Span) -> Diagnostic {
        Diagnostic::syntax("expected a top level declaration", span)
            .with_hint("only `name :: value` and `name := value` are allowed at the top level")
    }

    pub fn expected_statement(found: &str, span: Span) -> Diagnostic {
        Diagnostic::syntax(format!("expected statement, found {}", found), span)
    }

    pub fn unexpected_token(found: &str, span: Span) -> Diagnostic {
        Diagnostic::syntax(format!("unexpected token {}", found), span)
    }

    pub fn missing_terminator(found: &str, span: Span) -> Diagnostic {
        Diagnostic::syntax(format!("missing terminator before {}", found), span)
            .with_hint("separate statements with a newline or `;`")
    }

    pub fn invalid_assignment_target(span: Span) -> Diagnostic {
        Diagnostic::syntax("left side of an assignment must be an identifier", span)
    }

    pub fn duplicate_declaration(name: &str, span: Span, previous: Span) -> Diagnostic {
        Diagnostic::semantic(format!("duplicate declaration of {}", name), span)
            .with_label(previous, "previous declaration was here")
    }

    // ---- semantic ----------------------------------------------------------

    pub fn unresolved_identifier(name: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("use of unresolved identifier {}", name), span)
    }

    pub fn cyclic_dependency(name: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("cyclic dependency detected: {} refers to itself", name), span)
    }

    pub fn dependency_cycle(path: &[String], span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("cyclic dependency: {}", path.join(" -> ")), span)
    }

    pub fn invalid_dependency(name: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("use of invalid declaration {}", name), span)
            .with_note(format!("{} failed to check, so nothing that depends on it can be emitted", name))
    }

    pub fn expected_constant(name: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("expected constant declaration: value of {} is not constant", name), span)
            .with_hint(format!("declare it with `{} := ...` if it is meant to be mutable", name))
    }

    pub fn assign_to_constant(name: &str, span: Span, declared: Span) -> Diagnostic {
        Diagnostic::semantic(format!("cannot assign to constant value {}", name), span)
            .with_label(declared, "declared as a constant here")
    }

    pub fn missing_return(span: Span) -> Diagnostic {
        Diagnostic::semantic("missing return: the last statement of a function must be `return`", span)
    }

    pub fn integer_out_of_range(text: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("integer literal {} is out of range", text), span)
    }

    pub fn malformed_literal(text: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("malformed numeric literal {}", text), span)
    }

    pub fn constant_overflow(op: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("constant expression overflows in `{}`", op), span)
    }

    pub fn division_by_zero(span: Span) -> Diagnostic {
        Diagnostic::semantic("constant division by zero", span)
    }

    pub fn integer_operands_required(op: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("operator `{}` requires integer operands", op), span)
    }

    pub fn function_operand(span: Span) -> Diagnostic {
        Diagnostic::semantic("a function value cannot be used as an arithmetic operand", span)
    }

    pub fn main_not_function(span: Span) -> Diagnostic {
        Diagnostic::warning("`main` is not a constant function literal, so no entry point is recorded", span)
    }

    // ---- scheduling --------------------------------------------------------

    pub fn attempts_exhausted(name: &str, attempts: u32, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("declaration {} did not resolve after {} attempts", name, attempts), span)
    }

    pub fn never_resolved(name: &str, waiting_on: &str, span: Span) -> Diagnostic {
        Diagnostic::semantic(format!("declaration {} never resolved (waiting on {})", name, waiting_on), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_counts_errors_not_warnings() {
        let sink = Diagnostics::new();
        sink.report(Diagnostic::warning("just saying", Span::new(0, 1)));
        assert!(!sink.has_errors());
        sink.report(errors::unresolved_identifier("x", Span::new(2, 3)));
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_closure_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |d: Diagnostic| {
            let pos = d.pos();
            seen.lock().push((d.message, pos));
        };
        sink.report(Diagnostic::lex("boom", 7));
        assert_eq!(seen.lock().as_slice(), &[("boom".to_string(), 7)]);
    }

    #[test]
    fn test_format_includes_message_and_labels() {
        let source = b"x :: 1\nx :: 2\n";
        let diag = errors::duplicate_declaration("x", Span::new(7, 8), Span::new(0, 1));
        let out = format_diagnostic("dup.kes", source, &diag, false);
        assert!(out.contains("duplicate declaration of x"), "{}", out);
        assert!(out.contains("previous declaration was here"), "{}", out);
        assert!(out.contains("dup.kes"), "{}", out);
    }

    #[test]
    fn test_format_clamps_spans_past_end() {
        let diag = Diagnostic::lex("eof trouble", 100);
        let out = format_diagnostic("t.kes", b"abc", &diag, false);
        assert!(out.contains("eof trouble"));
    }
}
