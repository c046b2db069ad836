// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Error types, diagnostics, and reporting for the assembler.

use std::fmt;

use thiserror::Error;

use crate::core::tokenizer::{Span, TokenizeError};

/// Line processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LineStatus {
    Ok = 0,
    DirEqu = 1,
    DirDs = 2,
    NothingDone = 3,
    Warning = 5,
    Error = 6,
}

/// Categories of assembler errors.
///
/// The first six are raised by instruction encoders; the rest come from
/// the driver around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AsmErrorKind {
    UnknownMnemonic,
    BadAddressingMode,
    IllegalOperand,
    OperandOutOfRange,
    PhaseError,
    MissingOperand,
    Syntax,
    Expression,
    Symbol,
    Directive,
    Cpu,
    Io,
    Cli,
}

impl AsmErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AsmErrorKind::UnknownMnemonic => "unknown mnemonic",
            AsmErrorKind::BadAddressingMode => "bad addressing mode",
            AsmErrorKind::IllegalOperand => "illegal operand",
            AsmErrorKind::OperandOutOfRange => "operand out of range",
            AsmErrorKind::PhaseError => "phase error",
            AsmErrorKind::MissingOperand => "missing operand",
            AsmErrorKind::Syntax => "syntax",
            AsmErrorKind::Expression => "expression",
            AsmErrorKind::Symbol => "symbol",
            AsmErrorKind::Directive => "directive",
            AsmErrorKind::Cpu => "cpu",
            AsmErrorKind::Io => "io",
            AsmErrorKind::Cli => "cli",
        }
    }
}

impl fmt::Display for AsmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An assembler error with a kind, message and optional source span.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AsmError {
    kind: AsmErrorKind,
    message: String,
    span: Option<Span>,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, msg: &str, param: Option<&str>) -> Self {
        Self {
            kind,
            message: format_error(msg, param),
            span: None,
        }
    }

    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach `span` unless the error already carries one.
    #[must_use]
    pub fn or_span(mut self, span: Span) -> Self {
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    pub fn unknown_mnemonic(mnemonic: &str) -> Self {
        Self::new(AsmErrorKind::UnknownMnemonic, "Unknown mnemonic", Some(mnemonic))
    }

    pub fn bad_mode(msg: &str) -> Self {
        Self::new(AsmErrorKind::BadAddressingMode, msg, None)
    }

    pub fn illegal_operand(msg: &str) -> Self {
        Self::new(AsmErrorKind::IllegalOperand, msg, None)
    }

    pub fn out_of_range(msg: &str) -> Self {
        Self::new(AsmErrorKind::OperandOutOfRange, msg, None)
    }

    pub fn missing_operand() -> Self {
        Self::new(AsmErrorKind::MissingOperand, "Missing operand", None)
    }

    pub fn phase(msg: &str) -> Self {
        Self::new(AsmErrorKind::PhaseError, msg, None)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> AsmErrorKind {
        self.kind
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }
}

impl From<TokenizeError> for AsmError {
    fn from(err: TokenizeError) -> Self {
        AsmError::new(AsmErrorKind::Syntax, &err.message, None).with_span(err.span)
    }
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

impl Severity {
    fn label(self) -> &'static str {
        match self {
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

/// A diagnostic message with location and context.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub(crate) line: u32,
    pub(crate) column: Option<usize>,
    pub(crate) severity: Severity,
    pub(crate) error: AsmError,
    pub(crate) file: Option<String>,
}

impl Diagnostic {
    pub fn new(line: u32, severity: Severity, error: AsmError) -> Self {
        let column = error.span().map(|span| span.col_start);
        Self {
            line,
            column,
            severity,
            error,
            file: None,
        }
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.file = Some(file.to_string());
        self
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn format(&self) -> String {
        format!(
            "{}: {} - {}",
            self.line,
            self.severity.label(),
            self.error.message()
        )
    }

    pub fn format_with_context(&self, lines: Option<&[String]>, use_color: bool) -> String {
        let sev = self.severity.label();
        let header = match &self.file {
            Some(file) => format!("{file}:{}: {sev}", self.line),
            None => format!("{}: {sev}", self.line),
        };

        let mut out = String::new();
        out.push_str(&header);
        out.push('\n');

        for line in build_context_lines(self.line, self.column, lines, use_color) {
            out.push_str(&line);
            out.push('\n');
        }
        out.push_str(&format!("{sev}: {}", self.error.message()));
        out
    }
}

/// Report from a successful assembly run.
#[derive(Debug)]
pub struct AsmRunReport {
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl AsmRunReport {
    pub fn new(diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            diagnostics,
            source_lines,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    /// Name the source file in every diagnostic header.
    pub fn with_file(mut self, file: &str) -> Self {
        self.diagnostics = tag_file(self.diagnostics, file);
        self
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }
}

/// Error from a failed assembly run.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct AsmRunError {
    error: AsmError,
    diagnostics: Vec<Diagnostic>,
    source_lines: Vec<String>,
}

impl AsmRunError {
    pub fn new(error: AsmError, diagnostics: Vec<Diagnostic>, source_lines: Vec<String>) -> Self {
        Self {
            error,
            diagnostics,
            source_lines,
        }
    }

    pub fn error(&self) -> &AsmError {
        &self.error
    }

    pub fn with_file(mut self, file: &str) -> Self {
        self.diagnostics = tag_file(self.diagnostics, file);
        self
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }
}

fn tag_file(diagnostics: Vec<Diagnostic>, file: &str) -> Vec<Diagnostic> {
    diagnostics.into_iter().map(|d| d.with_file(file)).collect()
}

/// Pass statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassCounts {
    pub lines: u32,
    pub errors: u32,
    pub warnings: u32,
}

impl PassCounts {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build context lines for error display.
pub fn build_context_lines(
    line_num: u32,
    column: Option<usize>,
    lines: Option<&[String]>,
    use_color: bool,
) -> Vec<String> {
    let line_idx = line_num.saturating_sub(1) as usize;
    match lines.and_then(|lines| lines.get(line_idx)) {
        Some(line) => vec![format!(
            "{:>5} | {}",
            line_num,
            highlight_line(line, column, use_color)
        )],
        None => vec![format!("{:>5} | <source unavailable>", line_num)],
    }
}

/// Mark the word starting at `column` (1-based) in red, or with a caret line
/// underneath when colour is off.
pub fn highlight_line(line: &str, column: Option<usize>, use_color: bool) -> String {
    let Some(col) = column.filter(|&c| c >= 1 && c <= line.len()) else {
        return line.to_string();
    };
    let start = col - 1;
    if !line.is_char_boundary(start) {
        return line.to_string();
    }
    let end = line[start..]
        .find(|c: char| c.is_whitespace() || c == ',')
        .map(|off| start + off.max(1))
        .unwrap_or(line.len());
    if use_color {
        format!(
            "{}\x1b[1;31m{}\x1b[0m{}",
            &line[..start],
            &line[start..end],
            &line[end..]
        )
    } else {
        format!("{line}\n      | {}^", " ".repeat(start))
    }
}

/// Format an error message with an optional parameter.
pub fn format_error(msg: &str, param: Option<&str>) -> String {
    match param {
        Some(p) => format!("{msg}: {p}"),
        None => msg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format_includes_line_and_severity() {
        let err = AsmError::new(AsmErrorKind::Directive, "Bad thing", None);
        let diag = Diagnostic::new(12, Severity::Error, err);
        assert_eq!(diag.format(), "12: ERROR - Bad thing");
    }

    #[test]
    fn unknown_mnemonic_carries_name() {
        let err = AsmError::unknown_mnemonic("FOO");
        assert_eq!(err.kind(), AsmErrorKind::UnknownMnemonic);
        assert_eq!(err.to_string(), "Unknown mnemonic: FOO");
    }

    #[test]
    fn span_sets_diagnostic_column() {
        let err = AsmError::bad_mode("nope").with_span(Span::new(3, 4, 6));
        let diag = Diagnostic::new(3, Severity::Error, err);
        assert_eq!(diag.column, Some(5));
    }

    #[test]
    fn or_span_keeps_existing_span() {
        let err = AsmError::missing_operand()
            .with_span(Span::new(1, 0, 1))
            .or_span(Span::new(1, 7, 8));
        assert_eq!(err.span().map(|s| s.col_start), Some(1));
    }

    #[test]
    fn run_error_names_the_file() {
        let diag = Diagnostic::new(4, Severity::Warning, AsmError::phase("moved"));
        let err = AsmRunError::new(AsmError::phase("moved"), vec![diag], Vec::new())
            .with_file("prog.asm");
        let text = err.diagnostics()[0].format_with_context(None, false);
        assert!(text.starts_with("prog.asm:4: WARNING"));
    }

    #[test]
    fn context_marks_column_without_color() {
        let lines = vec!["  LDA #$100".to_string()];
        let ctx = build_context_lines(1, Some(7), Some(&lines), false);
        assert_eq!(ctx[0], "    1 |   LDA #$100\n      |       ^");
    }
}
