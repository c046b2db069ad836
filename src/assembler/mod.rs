// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Two-pass assembler driver.
//!
//! Pass 1 sizes every line and collects symbols. Pass 2 encodes again with
//! the pass-1 symbol table, fills the image, writes the listing and reports
//! diagnostics. Each line's pass-1 length is kept in a ledger; a line that
//! comes out a different length in pass 2 is a phase error.

pub mod cli;
#[cfg(test)]
mod tests;

use std::fs;
use std::io::{self, Write};

use tracing::{debug, info, trace, warn};

use crate::core::assembler::error::{
    AsmError, AsmErrorKind, AsmRunError, AsmRunReport, Diagnostic, LineStatus, PassCounts,
    Severity,
};
use crate::core::assembler::listing::{ListingLine, ListingWriter};
use crate::core::cpu::Endianness;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::expr::{eval_expr, parse_expr, EvalContext, Expr, SymbolValue, Value};
use crate::core::family::{AssemblerContext, EncodeOutcome};
use crate::core::imagestore::ImageStore;
use crate::core::range::{self, Domain};
use crate::core::registry::{ModuleRegistry, ResolvedCpu};
use crate::core::state::CpuState;
use crate::core::symbol_table::{SymbolKind, SymbolTable, SymbolTableResult};
use crate::core::text_utils::expand_tabs;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

pub use cli::{validate_cli, Cli, CliConfig, VERSION};

/// Library-level configuration, built from the command line or directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblerOptions {
    /// CPU selected at the start of each pass (name or alias).
    pub cpu: String,
    /// Symbols defined before the first line.
    pub defines: Vec<(String, i64)>,
    /// Byte used for gaps in the binary image.
    pub fill: u8,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        Self {
            cpu: "6502".to_string(),
            defines: Vec::new(),
            fill: 0xFF,
        }
    }
}

/// Output of a successful run.
#[derive(Debug)]
pub struct Assembly {
    pub image: ImageStore,
    pub symbols: SymbolTable,
    pub listing: String,
    pub report: AsmRunReport,
}

impl Assembly {
    /// Contiguous image from the lowest to the highest written address.
    pub fn binary(&self, fill: u8) -> Vec<u8> {
        self.image.to_vec(fill)
    }
}

/// Run the assembler for a parsed command line.
pub fn run(cli: &Cli) -> Result<AsmRunReport, AsmRunError> {
    if cli.list_cpus {
        write_cpu_list(&ModuleRegistry::with_defaults(), io::stdout().lock())
            .map_err(|err| run_error(io_error(&err)))?;
        return Ok(AsmRunReport::new(Vec::new(), Vec::new()));
    }

    let config = validate_cli(cli)?;
    let source = fs::read_to_string(&config.input).map_err(|err| {
        run_error(AsmError::new(
            AsmErrorKind::Io,
            &format!("Cannot read {}: {err}", config.input.display()),
            None,
        ))
    })?;
    info!(input = %config.input.display(), cpu = %config.options.cpu, "assembling");

    let fill = config.options.fill;
    let file = config.input.display().to_string();
    let assembly = assemble_source(config.options, &source).map_err(|err| err.with_file(&file))?;

    if let Some(path) = &config.listing {
        fs::write(path, &assembly.listing).map_err(|err| {
            run_error(AsmError::new(
                AsmErrorKind::Io,
                &format!("Error writing {}: {err}", path.display()),
                None,
            ))
        })?;
    }
    if let Some(path) = &config.output {
        fs::write(path, assembly.binary(fill)).map_err(|err| {
            run_error(AsmError::new(
                AsmErrorKind::Io,
                &format!("Error writing {}: {err}", path.display()),
                None,
            ))
        })?;
        info!(output = %path.display(), bytes = assembly.image.num_entries(), "image written");
    }
    Ok(assembly.report.with_file(&file))
}

/// Assemble `source` in memory.
pub fn assemble_source(options: AssemblerOptions, source: &str) -> Result<Assembly, AsmRunError> {
    let lines: Vec<String> = source.lines().map(str::to_string).collect();
    let assembler = Assembler::new(options)
        .map_err(|err| AsmRunError::new(err, Vec::new(), lines.clone()))?;
    assembler.assemble(&lines)
}

/// Print the registered CPUs grouped by family.
pub fn write_cpu_list<W: Write>(registry: &ModuleRegistry, mut out: W) -> io::Result<()> {
    for family in registry.cpus_by_family() {
        writeln!(out, "{} [{}]", family.description, family.family.as_str())?;
        for cpu in family.cpus {
            let endian = match cpu.endianness {
                Endianness::Little => "little",
                Endianness::Big => "big",
            };
            write!(
                out,
                "  {:<8} {}-bit address, {endian} endian",
                cpu.name, cpu.address_bits
            )?;
            if !cpu.aliases.is_empty() {
                write!(out, " (aliases: {})", cpu.aliases.join(", "))?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

fn run_error(error: AsmError) -> AsmRunError {
    AsmRunError::new(error, Vec::new(), Vec::new())
}

fn io_error(err: &io::Error) -> AsmError {
    AsmError::new(AsmErrorKind::Io, &err.to_string(), None)
}

/// Generic directives understood on every CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive {
    Org,
    Equ,
    Set,
    Byte,
    Word,
    Long,
    Reserve,
    Align,
    Even,
    Cpu,
    End,
}

impl Directive {
    fn parse(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        Some(match upper.as_str() {
            "ORG" => Directive::Org,
            "EQU" => Directive::Equ,
            "SET" => Directive::Set,
            "DB" | "FCB" | "FCC" | "BYTE" | "DEFB" | "DEFM" | "DC.B" => Directive::Byte,
            "DW" | "FDB" | "WORD" | "DEFW" | "DC.W" => Directive::Word,
            "DL" | "LONG" | "DC.L" => Directive::Long,
            "DS" | "RMB" | "DEFS" | "BLKB" | "DS.B" => Directive::Reserve,
            "ALIGN" => Directive::Align,
            "EVEN" => Directive::Even,
            "CPU" | "PROCESSOR" => Directive::Cpu,
            "END" => Directive::End,
            _ => return None,
        })
    }
}

fn is_cpu_keyword(word: &str) -> bool {
    let word = word.strip_prefix('.').unwrap_or(word);
    word.eq_ignore_ascii_case("CPU") || word.eq_ignore_ascii_case("PROCESSOR")
}

/// `[label[:]] CPU name` read from raw text; CPU names such as `65C02` do
/// not tokenize.
fn cpu_directive(line: &str) -> Option<(Option<&str>, &str)> {
    let code = line.split(';').next().unwrap_or_default();
    let mut words = code.split_whitespace();
    let first = words.next()?;
    let (label, op) = if is_cpu_keyword(first) {
        (None, first)
    } else {
        (Some(first.trim_end_matches(':')), words.next()?)
    };
    if !is_cpu_keyword(op) {
        return None;
    }
    let name = words.next()?;
    words.next().is_none().then_some((label, name))
}

/// Symbol and address view handed to expression evaluation and handlers.
struct LineContext<'a> {
    symbols: &'a SymbolTable,
    state: &'a CpuState,
    addr: u32,
    pass: u8,
}

impl EvalContext for LineContext<'_> {
    fn lookup_symbol(&self, name: &str) -> SymbolValue {
        self.symbols.lookup(name, self.pass)
    }

    fn current_address(&self) -> i64 {
        i64::from(self.addr)
    }

    fn pass(&self) -> u8 {
        self.pass
    }
}

impl AssemblerContext for LineContext<'_> {
    fn eval(&self, expr: &Expr) -> Result<Value, AsmError> {
        Ok(eval_expr(expr, self)?)
    }

    fn current_address(&self) -> u32 {
        self.addr
    }

    fn pass(&self) -> u8 {
        self.pass
    }

    fn state(&self) -> &CpuState {
        self.state
    }
}

/// What one source line produced in the current pass.
#[derive(Debug)]
struct LineResult {
    addr: u32,
    bytes: Vec<u8>,
    /// Bytes skipped without being written (`DS`, `ALIGN`).
    reserved: u32,
    status: LineStatus,
    aux: i64,
    errors: Vec<AsmError>,
    warnings: Vec<AsmError>,
}

impl LineResult {
    fn new(addr: u32) -> Self {
        Self {
            addr,
            bytes: Vec::new(),
            reserved: 0,
            status: LineStatus::NothingDone,
            aux: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn length(&self) -> u32 {
        self.bytes.len() as u32 + self.reserved
    }

    fn take_buffer(&mut self, buf: InstructionBuffer) {
        let (bytes, errors, warnings) = buf.into_parts();
        self.bytes = bytes;
        self.errors.extend(errors);
        self.warnings.extend(warnings);
        self.status = LineStatus::Ok;
    }

    fn listing_status(&self) -> LineStatus {
        if !self.errors.is_empty() {
            LineStatus::Error
        } else if !self.warnings.is_empty() {
            LineStatus::Warning
        } else {
            self.status
        }
    }
}

/// Core assembler state.
pub struct Assembler {
    registry: ModuleRegistry,
    options: AssemblerOptions,
    symbols: SymbolTable,
    image: ImageStore,
    diagnostics: Vec<Diagnostic>,
    /// Pass-1 length of every line.
    lengths: Vec<u32>,
    cpu: ResolvedCpu,
    state: CpuState,
    /// Location counter. It is never wrapped; lines at or past the top of
    /// the address space are errors.
    addr: u64,
    pass: u8,
    ended: bool,
}

impl Assembler {
    pub fn new(options: AssemblerOptions) -> Result<Self, AsmError> {
        let registry = ModuleRegistry::with_defaults();
        let cpu = registry
            .find(&options.cpu)
            .map_err(|err| AsmError::new(AsmErrorKind::Cli, &err.to_string(), None))?;
        let mut symbols = SymbolTable::new();
        for (name, value) in &options.defines {
            if symbols.predefine(name, *value) != SymbolTableResult::Ok {
                return Err(AsmError::new(
                    AsmErrorKind::Cli,
                    "Symbol defined twice on the command line",
                    Some(name),
                ));
            }
        }
        Ok(Self {
            registry,
            options,
            symbols,
            image: ImageStore::new(),
            diagnostics: Vec::new(),
            lengths: Vec::new(),
            cpu,
            state: CpuState::new(),
            addr: 0,
            pass: 1,
            ended: false,
        })
    }

    /// Run both passes over `lines`.
    pub fn assemble(mut self, lines: &[String]) -> Result<Assembly, AsmRunError> {
        let failed = |err: AsmError, diagnostics: Vec<Diagnostic>| {
            AsmRunError::new(err, diagnostics, lines.to_vec())
        };

        self.lengths = vec![0; lines.len()];
        if let Err(err) = self.run_pass::<io::Sink>(1, lines, None) {
            return Err(failed(err, Vec::new()));
        }

        let mut out = Vec::new();
        let mut listing = ListingWriter::new(&mut out, self.cpu.descriptor.address_bits);
        let title = format!("retroasm {} Assembler v{VERSION}", self.cpu.descriptor.name);
        let counts = listing
            .header(&title)
            .map_err(|err| io_error(&err))
            .and_then(|()| self.run_pass(2, lines, Some(&mut listing)))
            .and_then(|counts| {
                listing
                    .footer(&counts, &self.symbols, self.image.num_entries())
                    .map(|()| counts)
                    .map_err(|err| io_error(&err))
            });
        let counts = match counts {
            Ok(counts) => counts,
            Err(err) => {
                let diagnostics = std::mem::take(&mut self.diagnostics);
                return Err(failed(err, diagnostics));
            }
        };

        let diagnostics = std::mem::take(&mut self.diagnostics);
        if counts.errors > 0 {
            let kind = diagnostics
                .iter()
                .find(|d| d.severity() == Severity::Error)
                .map_or(AsmErrorKind::Syntax, |d| d.error().kind());
            let summary = AsmError::new(
                kind,
                &format!("{} error(s) detected in source; no output written", counts.errors),
                None,
            );
            return Err(failed(summary, diagnostics));
        }

        Ok(Assembly {
            image: self.image,
            symbols: self.symbols,
            listing: String::from_utf8_lossy(&out).into_owned(),
            report: AsmRunReport::new(diagnostics, lines.to_vec()),
        })
    }

    fn start_pass(&mut self, pass: u8) -> Result<(), AsmError> {
        self.pass = pass;
        self.addr = 0;
        self.ended = false;
        self.cpu = self
            .registry
            .find(&self.options.cpu)
            .map_err(|err| AsmError::new(AsmErrorKind::Cpu, &err.to_string(), None))?;
        self.reset_state();
        debug!(pass, cpu = self.cpu.descriptor.name, "pass start");
        Ok(())
    }

    fn reset_state(&mut self) {
        self.state.clear();
        self.cpu.handler.pass_init(&mut self.state);
    }

    fn run_pass<W: Write>(
        &mut self,
        pass: u8,
        lines: &[String],
        mut listing: Option<&mut ListingWriter<W>>,
    ) -> Result<PassCounts, AsmError> {
        self.start_pass(pass)?;
        if pass == 2 {
            self.image = ImageStore::new();
        }
        let mut counts = PassCounts::new();

        for (idx, src) in lines.iter().enumerate() {
            if self.ended {
                break;
            }
            let line_num = idx as u32 + 1;
            let mut result = self.process_line(src, line_num);
            let length = self.settle_length(idx, line_num, &mut result);
            self.advance(length, &mut result);
            counts.lines += 1;

            if pass == 1 {
                continue;
            }
            if !result.bytes.is_empty() {
                self.image.store_slice(result.addr, &result.bytes);
            }
            if let Some(listing) = listing.as_deref_mut() {
                listing
                    .write_line(ListingLine {
                        addr: result.addr,
                        bytes: &result.bytes,
                        status: result.listing_status(),
                        aux: result.aux,
                        line_num,
                        source: &expand_tabs(src),
                    })
                    .map_err(|err| io_error(&err))?;
            }
            let reports = result
                .errors
                .into_iter()
                .map(|err| (Severity::Error, err))
                .chain(result.warnings.into_iter().map(|w| (Severity::Warning, w)));
            for (severity, err) in reports {
                match severity {
                    Severity::Error => counts.errors += 1,
                    Severity::Warning => counts.warnings += 1,
                }
                if let Some(listing) = listing.as_deref_mut() {
                    let label = match severity {
                        Severity::Error => "ERROR",
                        Severity::Warning => "WARNING",
                    };
                    let column = err.span().map(|span| span.col_start);
                    listing
                        .write_diagnostic(label, err.message(), line_num, column, lines)
                        .map_err(|err| io_error(&err))?;
                }
                self.diagnostics.push(Diagnostic::new(line_num, severity, err));
            }
        }

        debug!(
            pass,
            lines = counts.lines,
            errors = counts.errors,
            warnings = counts.warnings,
            "pass complete"
        );
        Ok(counts)
    }

    /// Record or check the line length against the pass-1 ledger. A line
    /// that failed in pass 2 without output keeps its pass-1 length so the
    /// lines after it stay where pass 1 put them.
    fn settle_length(&mut self, idx: usize, line_num: u32, result: &mut LineResult) -> u32 {
        let length = result.length();
        if self.pass == 1 {
            self.lengths[idx] = length;
            return length;
        }
        let expected = self.lengths[idx];
        if !result.errors.is_empty() && length == 0 {
            return expected;
        }
        if length != expected {
            warn!(line = line_num, expected, length, "phase error");
            result.errors.push(AsmError::phase(&format!(
                "Line length changed between passes: {expected} byte(s) in pass 1, {length} in pass 2"
            )));
        }
        length
    }

    fn advance(&mut self, length: u32, result: &mut LineResult) {
        let limit = 1u64 << self.cpu.descriptor.address_bits;
        let next = self.addr + u64::from(length);
        if length > 0 && next > limit {
            result.errors.push(AsmError::new(
                AsmErrorKind::Directive,
                "Location counter overflows the address space",
                None,
            ));
        }
        self.addr = next;
    }

    /// The location counter as an address; only lines already reported as
    /// overflowing see it truncated.
    fn location(&self) -> u32 {
        self.addr as u32
    }

    /// Label value for the current line; a label just past the last byte
    /// keeps the untruncated address.
    fn here(&self) -> i64 {
        self.addr as i64
    }

    fn context<'a>(&'a self, state: &'a CpuState) -> LineContext<'a> {
        LineContext {
            symbols: &self.symbols,
            state,
            addr: self.location(),
            pass: self.pass,
        }
    }

    fn eval(&self, expr: &Expr) -> Result<Value, AsmError> {
        self.context(&self.state).eval(expr)
    }

    /// Evaluate a value that decides layout; it must not depend on symbols
    /// defined further down.
    fn eval_defined(&self, expr: &Expr, directive: &str) -> Result<i64, AsmError> {
        let value = self.eval(expr)?;
        if !value.known {
            return Err(AsmError::new(
                AsmErrorKind::Directive,
                "Value must be defined before use",
                Some(directive),
            )
            .with_span(expr.span()));
        }
        Ok(value.value)
    }

    fn process_line(&mut self, src: &str, line_num: u32) -> LineResult {
        let mut result = LineResult::new(self.location());
        if let Err(err) = self.process(src, line_num, &mut result) {
            result.errors.push(err);
        }
        result
    }

    fn process(&mut self, src: &str, line_num: u32, result: &mut LineResult) -> Result<(), AsmError> {
        if let Some((label, name)) = cpu_directive(src) {
            if let Some(label) = label {
                self.define(label, self.here(), SymbolKind::Label, true, line_num, None)?;
            }
            return self.switch_cpu(name);
        }

        let mut cursor = TokenCursor::from_line(src, line_num)?;
        let label = split_label(&mut cursor);
        let Some((op, op_span)) = split_op(&mut cursor)? else {
            if let Some((name, span)) = &label {
                self.define(name, self.here(), SymbolKind::Label, true, line_num, Some(*span))?;
            }
            return Ok(());
        };
        let name = op.strip_prefix('.').unwrap_or(&op);
        // Without a label, `SET` is left to the CPU (Z80 `SET b,r`).
        let directive =
            Directive::parse(name).filter(|d| *d != Directive::Set || label.is_some());

        match (&label, directive) {
            (_, Some(Directive::Org | Directive::Equ | Directive::Set)) => {}
            (Some((label, span)), _) => {
                self.define(label, self.here(), SymbolKind::Label, true, line_num, Some(*span))?;
            }
            (None, _) => {}
        }

        let snapshot = self.state.clone();
        let ctx = LineContext {
            symbols: &self.symbols,
            state: &snapshot,
            addr: self.location(),
            pass: self.pass,
        };
        if let Some(outcome) = self.cpu.handler.label_op(name, &mut cursor, &ctx, &mut self.state) {
            trace!(op = name, "cpu label op");
            return outcome.map_err(|err| err.or_span(op_span));
        }

        match directive {
            Some(directive) => {
                self.directive(directive, &label, &mut cursor, line_num, op_span, result)
            }
            None if op.starts_with('.') => Err(AsmError::new(
                AsmErrorKind::Directive,
                "Unknown directive",
                Some(&op),
            )
            .with_span(op_span)),
            None => self.instruction(&op, op_span, &mut cursor, result),
        }
    }

    fn define(
        &mut self,
        name: &str,
        value: i64,
        kind: SymbolKind,
        known: bool,
        line_num: u32,
        span: Option<Span>,
    ) -> Result<(), AsmError> {
        let attach = |err: AsmError| match span {
            Some(span) => err.with_span(span),
            None => err,
        };
        match self.symbols.define(name, value, kind, self.pass, line_num) {
            SymbolTableResult::Ok => {}
            SymbolTableResult::Duplicate => {
                return Err(attach(AsmError::new(
                    AsmErrorKind::Symbol,
                    "Symbol already defined",
                    Some(name),
                )));
            }
            SymbolTableResult::Changed { previous } if kind == SymbolKind::Label => {
                warn!(symbol = name, previous, value, "label moved between passes");
                return Err(attach(AsmError::phase(&format!(
                    "Label {name} moved between passes: ${previous:X} in pass 1, ${value:X} in pass 2"
                ))));
            }
            SymbolTableResult::Changed { .. } => {}
        }
        if !known {
            self.symbols.mark_unresolved(name);
        }
        Ok(())
    }

    fn switch_cpu(&mut self, name: &str) -> Result<(), AsmError> {
        let resolved = self
            .registry
            .find(name)
            .map_err(|err| AsmError::new(AsmErrorKind::Cpu, &err.to_string(), None))?;
        debug!(pass = self.pass, cpu = resolved.descriptor.name, "cpu switch");
        self.cpu = resolved;
        self.reset_state();
        Ok(())
    }

    fn directive(
        &mut self,
        directive: Directive,
        label: &Option<(String, Span)>,
        cursor: &mut TokenCursor,
        line_num: u32,
        op_span: Span,
        result: &mut LineResult,
    ) -> Result<(), AsmError> {
        match directive {
            Directive::Org => {
                let expr = parse_expr(cursor)?;
                cursor.expect_end()?;
                let value = self.eval_defined(&expr, "ORG")?;
                let bits = self.cpu.descriptor.address_bits;
                if !Domain::Unsigned(bits).contains(value) {
                    return Err(AsmError::out_of_range(&format!(
                        "ORG address ${value:X} is outside the {bits}-bit address space"
                    ))
                    .with_span(expr.span()));
                }
                self.addr = value as u64;
                result.addr = self.location();
                if let Some((name, span)) = label {
                    self.define(name, value, SymbolKind::Label, true, line_num, Some(*span))?;
                }
                Ok(())
            }
            Directive::Equ | Directive::Set => {
                let Some((name, span)) = label else {
                    return Err(AsmError::new(
                        AsmErrorKind::Directive,
                        "Assignment needs a label",
                        None,
                    )
                    .with_span(op_span));
                };
                let expr = parse_expr(cursor)?;
                cursor.expect_end()?;
                let value = self.eval(&expr)?;
                let kind = if directive == Directive::Set {
                    SymbolKind::Set
                } else {
                    SymbolKind::Equ
                };
                self.define(name, value.value, kind, value.known, line_num, Some(*span))?;
                result.status = LineStatus::DirEqu;
                result.aux = value.value;
                Ok(())
            }
            Directive::Byte => self.data(cursor, 1, op_span, result),
            Directive::Word => self.data(cursor, 2, op_span, result),
            Directive::Long => self.data(cursor, 4, op_span, result),
            Directive::Reserve => {
                let expr = parse_expr(cursor)?;
                cursor.expect_end()?;
                let count = self.eval_defined(&expr, "DS")?;
                let count = u32::try_from(count).map_err(|_| {
                    AsmError::out_of_range(&format!("Reserve count out of range: {count}"))
                        .with_span(expr.span())
                })?;
                self.reserve(count, result);
                Ok(())
            }
            Directive::Align | Directive::Even => {
                let boundary = if directive == Directive::Even {
                    cursor.expect_end()?;
                    2
                } else {
                    let expr = parse_expr(cursor)?;
                    cursor.expect_end()?;
                    let value = self.eval_defined(&expr, "ALIGN")?;
                    u32::try_from(value).ok().filter(|v| *v > 0).ok_or_else(|| {
                        AsmError::out_of_range(&format!("Alignment must be positive: {value}"))
                            .with_span(expr.span())
                    })?
                };
                let pad = (boundary - (self.addr % u64::from(boundary)) as u32) % boundary;
                self.reserve(pad, result);
                Ok(())
            }
            Directive::Cpu => Err(AsmError::new(
                AsmErrorKind::Directive,
                "CPU needs exactly one CPU name",
                None,
            )
            .with_span(op_span)),
            Directive::End => {
                cursor.expect_end()?;
                self.ended = true;
                Ok(())
            }
        }
    }

    fn reserve(&mut self, count: u32, result: &mut LineResult) {
        result.reserved = count;
        result.status = LineStatus::DirDs;
        result.aux = i64::from(count);
    }

    /// `DB`/`DW`/`DL` item lists. Strings in `DB` emit their bytes.
    fn data(
        &mut self,
        cursor: &mut TokenCursor,
        width: u8,
        op_span: Span,
        result: &mut LineResult,
    ) -> Result<(), AsmError> {
        if cursor.at_end() {
            return Err(AsmError::missing_operand().with_span(op_span));
        }
        let mut buf = InstructionBuffer::new(self.cpu.descriptor.endianness);
        loop {
            let string = match cursor.peek_kind() {
                TokenKind::String(lit)
                    if width == 1
                        && matches!(cursor.peek_nth(1).kind, TokenKind::Comma | TokenKind::End) =>
                {
                    Some(lit.bytes.clone())
                }
                _ => None,
            };
            match string {
                Some(bytes) => {
                    cursor.advance();
                    buf.extend(&bytes);
                }
                None => {
                    let expr = parse_expr(cursor)?;
                    let value = self.eval(&expr)?;
                    let domain = Domain::Either(width * 8);
                    let masked = range::check(&mut buf, value.value, domain, "Data value", expr.span());
                    match width {
                        1 => buf.byte(masked as u8),
                        2 => buf.word(masked as u16),
                        _ => buf.long(masked as u32),
                    }
                }
            }
            if !cursor.eat(&TokenKind::Comma) {
                break;
            }
        }
        cursor.expect_end()?;
        result.take_buffer(buf);
        Ok(())
    }

    fn instruction(
        &mut self,
        mnemonic: &str,
        span: Span,
        cursor: &mut TokenCursor,
        result: &mut LineResult,
    ) -> Result<(), AsmError> {
        let mut buf = InstructionBuffer::new(self.cpu.descriptor.endianness);
        let ctx = self.context(&self.state);
        match self.cpu.handler.encode(mnemonic, cursor, &ctx, &mut buf) {
            EncodeOutcome::Ok => {
                result.take_buffer(buf);
                Ok(())
            }
            EncodeOutcome::Error(err) => Err(err.or_span(span)),
            EncodeOutcome::NotFound => Err(AsmError::unknown_mnemonic(mnemonic).with_span(span)),
            EncodeOutcome::NotApplicable => Err(AsmError::new(
                AsmErrorKind::Cpu,
                &format!("Instruction not available on {}", self.cpu.descriptor.name),
                Some(mnemonic),
            )
            .with_span(span)),
        }
    }
}

/// Take the label off the front of the line. A label starts in column 1,
/// ends with `:`, or precedes `=`/`EQU`/`SET`. A known directive in column
/// 1 without a colon is the operation, not a label.
fn split_label(cursor: &mut TokenCursor) -> Option<(String, Span)> {
    let token = cursor.peek().clone();
    let TokenKind::Identifier(name) = token.kind else {
        return None;
    };
    let next = &cursor.peek_nth(1).kind;
    let colon = *next == TokenKind::Colon;
    let assigns = match next {
        TokenKind::Operator(OperatorKind::Eq) => true,
        TokenKind::Identifier(word) => {
            word.eq_ignore_ascii_case("EQU") || word.eq_ignore_ascii_case("SET")
        }
        _ => false,
    };
    let column_one = token.span.col_start == 1 && Directive::parse(&name).is_none();
    if !(colon || assigns || column_one) {
        return None;
    }
    cursor.advance();
    cursor.eat(&TokenKind::Colon);
    Some((name, token.span))
}

/// The operation field: a mnemonic or directive (with optional leading
/// `.`), `*=` for `ORG`, or `=` for `EQU`.
fn split_op(cursor: &mut TokenCursor) -> Result<Option<(String, Span)>, AsmError> {
    let span = cursor.span();
    match cursor.peek_kind().clone() {
        TokenKind::End => Ok(None),
        TokenKind::Operator(OperatorKind::Multiply)
            if cursor.peek_nth(1).kind == TokenKind::Operator(OperatorKind::Eq) =>
        {
            cursor.advance();
            cursor.advance();
            Ok(Some(("ORG".to_string(), span.join(cursor.prev_span()))))
        }
        TokenKind::Operator(OperatorKind::Eq) => {
            cursor.advance();
            Ok(Some(("EQU".to_string(), span)))
        }
        TokenKind::Dot => {
            cursor.advance();
            match cursor.advance().kind {
                TokenKind::Identifier(name) => {
                    Ok(Some((format!(".{name}"), span.join(cursor.prev_span()))))
                }
                _ => Err(AsmError::new(AsmErrorKind::Syntax, "Expected directive after '.'", None)
                    .with_span(span)),
            }
        }
        TokenKind::Identifier(name) => {
            cursor.advance();
            Ok(Some((name, span)))
        }
        _ => Err(cursor.unexpected("instruction or directive")),
    }
}
