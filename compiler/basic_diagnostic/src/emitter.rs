//! Diagnostic collection and terminal rendering.

use std::fmt::Write as _;

use basic_ir::Span;
use rustc_hash::FxHashMap;

use crate::{Diagnostic, ErrorCode, Severity, SourceManager};

/// Accumulates diagnostics from every pipeline stage and renders them in
/// the canonical three-line format:
///
/// ```text
/// <path>:<line>:<col>: error[<code>]: <message>
/// <offending source line>
///     ^^^^
/// ```
///
/// The caret run length equals the span (token) length. The emitter owns
/// copies of the registered source buffers so rendering does not depend on
/// the caller keeping the original text alive.
#[derive(Debug, Default)]
pub struct DiagnosticEmitter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    sources: FxHashMap<u32, String>,
}

impl DiagnosticEmitter {
    pub fn new() -> Self {
        DiagnosticEmitter::default()
    }

    /// Register a source buffer for caret rendering.
    pub fn add_source(&mut self, file_id: u32, source: impl Into<String>) {
        self.sources.insert(file_id, source.into());
    }

    /// Record a diagnostic.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity == Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Record an error diagnostic.
    pub fn error(&mut self, code: ErrorCode, file_id: u32, span: Span, message: impl Into<String>) {
        self.emit(Diagnostic::error(code, file_id, span, message));
    }

    /// Record a warning diagnostic.
    pub fn warning(
        &mut self,
        code: ErrorCode,
        file_id: u32,
        span: Span,
        message: impl Into<String>,
    ) {
        self.emit(Diagnostic::warning(code, file_id, span, message));
    }

    /// Number of error-severity diagnostics recorded so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// All recorded diagnostics in insertion order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Render every diagnostic, ordered by source location and then by
    /// insertion order for equal locations.
    pub fn print_all(&self, out: &mut String, sm: &SourceManager) {
        let mut order: Vec<usize> = (0..self.diagnostics.len()).collect();
        order.sort_by_key(|&i| {
            let d = &self.diagnostics[i];
            (d.file_id, d.span.start)
        });
        for index in order {
            self.render(&self.diagnostics[index], out, sm);
        }
    }

    /// Render every diagnostic to a fresh string.
    pub fn render_all(&self, sm: &SourceManager) -> String {
        let mut out = String::new();
        self.print_all(&mut out, sm);
        out
    }

    fn render(&self, diag: &Diagnostic, out: &mut String, sm: &SourceManager) {
        let path = sm.path(diag.file_id).unwrap_or("<input>");
        let source = self
            .sources
            .get(&diag.file_id)
            .map(String::as_str)
            .or_else(|| sm.source(diag.file_id));

        let Some(text) = source else {
            let _ = writeln!(
                out,
                "{}: {}[{}]: {}",
                path, diag.severity, diag.code, diag.message
            );
            return;
        };

        let (line, col) = SourceManager::line_col(text, diag.span.start);
        let _ = writeln!(
            out,
            "{}:{}:{}: {}[{}]: {}",
            path, line, col, diag.severity, diag.code, diag.message
        );
        let line_text = SourceManager::line_text(text, line);
        let _ = writeln!(out, "{line_text}");
        let carets = diag.span.len().max(1) as usize;
        let _ = writeln!(out, "{}{}", " ".repeat(col as usize - 1), "^".repeat(carets));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_three_line_rendering() {
        let src = "10 SELECT CASE X\n20 CASE\n30 END SELECT\n";
        let mut sm = SourceManager::new();
        let fid = sm.add_file("missing_label.bas");
        let mut emitter = DiagnosticEmitter::new();
        emitter.add_source(fid, src);

        let case_at = src.find("20 CASE").map(|o| o as u32 + 3).unwrap_or(0);
        emitter.error(
            ErrorCode::CaseEmptyLabelList,
            fid,
            Span::new(case_at, case_at + 4),
            "CASE arm requires at least one label",
        );

        let expected = "missing_label.bas:2:4: error[ERR_Case_EmptyLabelList]: \
                        CASE arm requires at least one label\n\
                        20 CASE\n   \
                        ^^^^\n";
        assert_eq!(emitter.render_all(&sm), expected);
        assert_eq!(emitter.error_count(), 1);
    }

    #[test]
    fn test_ordering_by_location_then_insertion() {
        let src = "10 A\n20 B\n";
        let mut sm = SourceManager::new();
        let fid = sm.add_file("order.bas");
        let mut emitter = DiagnosticEmitter::new();
        emitter.add_source(fid, src);

        emitter.error(ErrorCode::B1101, fid, Span::new(5, 6), "second line");
        emitter.error(ErrorCode::B1101, fid, Span::new(0, 2), "first line");
        emitter.error(ErrorCode::B1102, fid, Span::new(5, 6), "second line again");

        let rendered = emitter.render_all(&sm);
        let first = rendered.find("first line").unwrap_or(usize::MAX);
        let second = rendered.find("second line").unwrap_or(usize::MAX);
        let again = rendered.find("second line again").unwrap_or(usize::MAX);
        assert!(first < second && second < again);
    }
}
