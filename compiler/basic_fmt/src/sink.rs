//! Output sink with the canonical punctuation helpers.

use std::fmt::Write as _;

use basic_ir::Stmt;

use crate::stmt::print_stmt;

/// Buffer plus formatting helpers; threaded through every print function.
pub(crate) struct Sink {
    out: String,
}

impl Sink {
    pub(crate) fn new() -> Self {
        Sink { out: String::new() }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.out
    }

    pub(crate) fn into_string(self) -> String {
        self.out
    }

    pub(crate) fn raw(&mut self, ch: char) {
        self.out.push(ch);
    }

    pub(crate) fn text(&mut self, text: &str) {
        self.out.push_str(text);
    }

    pub(crate) fn int(&mut self, value: i64) {
        let _ = write!(self.out, "{value}");
    }

    /// Floats use the shortest round-trip rendering, which is stable
    /// across platforms.
    pub(crate) fn float(&mut self, value: f64) {
        let _ = write!(self.out, "{value}");
    }

    /// `<line>:` label prefix.
    pub(crate) fn write_label(&mut self, line: i64) {
        let _ = write!(self.out, "{line}:");
    }

    /// Opening delimiter of a numbered body.
    pub(crate) fn open_body(&mut self) {
        self.out.push_str(" {");
    }

    /// Closing delimiter paired with `open_body`; also closes the owning
    /// statement's parenthesis.
    pub(crate) fn close_body(&mut self) {
        self.out.push_str("})");
    }

    /// Insert a space between list elements on every call after the first.
    pub(crate) fn separate(&mut self, first: &mut bool) {
        if !*first {
            self.out.push(' ');
        }
        *first = false;
    }

    /// Canonical `<null>` marker for missing optional values.
    pub(crate) fn write_null(&mut self) {
        self.out.push_str("<null>");
    }

    /// ` channel=#` prefix of channel statements.
    pub(crate) fn channel_prefix(&mut self) {
        self.out.push_str(" channel=#");
    }

    /// ` args=[` prefix of channel argument lists.
    pub(crate) fn args_prefix(&mut self) {
        self.out.push_str(" args=[");
    }

    /// Closing bracket of a channel argument list.
    pub(crate) fn args_suffix(&mut self) {
        self.out.push(']');
    }

    /// ` no-newline` tag for suppressed trailing newlines.
    pub(crate) fn no_newline_tag(&mut self) {
        self.out.push_str(" no-newline");
    }

    /// Print a body of numbered statements: ` {<line>:(<stmt>) ...})` with
    /// single-space separators and no trailing space before the brace.
    pub(crate) fn numbered_body(&mut self, body: &[Stmt]) {
        self.open_body();
        let mut first = true;
        for stmt in body {
            self.separate(&mut first);
            self.write_label(stmt.line);
            print_stmt(stmt, self);
        }
        self.close_body();
    }
}
