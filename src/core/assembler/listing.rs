// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Listing file generation.

use std::io::Write;

use crate::core::symbol_table::SymbolTable;

use super::error::{build_context_lines, LineStatus, PassCounts};

/// Data for a single listing line.
pub struct ListingLine<'a> {
    pub addr: u32,
    pub bytes: &'a [u8],
    pub status: LineStatus,
    /// Value of an `EQU` line, or the size of a `DS` reservation.
    pub aux: i64,
    pub line_num: u32,
    pub source: &'a str,
}

/// Writer for listing file output.
pub struct ListingWriter<W: Write> {
    out: W,
    addr_digits: usize,
}

/// Bytes shown on one listing row; longer lines continue on extra rows.
const BYTES_PER_ROW: usize = 8;

impl<W: Write> ListingWriter<W> {
    /// `address_bits` decides how many hex digits the address column gets.
    pub fn new(out: W, address_bits: u8) -> Self {
        let addr_digits = if address_bits > 16 { 8 } else { 4 };
        Self { out, addr_digits }
    }

    pub fn header(&mut self, title: &str) -> std::io::Result<()> {
        let w = self.addr_digits;
        writeln!(self.out, "{title}")?;
        writeln!(
            self.out,
            "{:<w$}  {:<23}  LINE  SOURCE",
            "ADDR",
            "BYTES"
        )?;
        writeln!(self.out, "{}  {}  ----  ------", "-".repeat(w), "-".repeat(23))?;
        Ok(())
    }

    pub fn write_line(&mut self, line: ListingLine<'_>) -> std::io::Result<()> {
        let w = self.addr_digits;
        let (loc, bytes_col) = match line.status {
            LineStatus::DirEqu => (String::new(), format!("= {:X}", line.aux)),
            LineStatus::DirDs => (
                format!("{:0w$X}", line.addr),
                format!("+{:X}", line.aux),
            ),
            _ if line.bytes.is_empty() => (String::new(), String::new()),
            _ => (
                format!("{:0w$X}", line.addr),
                format_bytes(&line.bytes[..line.bytes.len().min(BYTES_PER_ROW)]),
            ),
        };

        writeln!(
            self.out,
            "{:<w$}  {:<23}  {:>4}  {}",
            loc, bytes_col, line.line_num, line.source
        )?;

        if matches!(line.status, LineStatus::DirEqu | LineStatus::DirDs) {
            return Ok(());
        }
        for (ix, chunk) in line.bytes.chunks(BYTES_PER_ROW).enumerate().skip(1) {
            let addr = line.addr.wrapping_add((ix * BYTES_PER_ROW) as u32);
            writeln!(self.out, "{:0w$X}  {}", addr, format_bytes(chunk))?;
        }
        Ok(())
    }

    pub fn write_diagnostic(
        &mut self,
        kind: &str,
        msg: &str,
        line_num: u32,
        column: Option<usize>,
        source_lines: &[String],
    ) -> std::io::Result<()> {
        for line in build_context_lines(line_num, column, Some(source_lines), false) {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out, "{kind}: {msg}")
    }

    pub fn footer(
        &mut self,
        counts: &PassCounts,
        symbols: &SymbolTable,
        total_mem: usize,
    ) -> std::io::Result<()> {
        writeln!(
            self.out,
            "\nLines: {}  Errors: {}  Warnings: {}",
            counts.lines, counts.errors, counts.warnings
        )?;
        writeln!(self.out, "\nSYMBOL TABLE\n")?;
        symbols.dump(&mut self.out)?;
        writeln!(self.out, "\nTotal memory is {} bytes", total_mem)?;
        Ok(())
    }
}

/// Format bytes as hex string for listing.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_address_bytes_and_source() {
        let mut out = Vec::new();
        let mut writer = ListingWriter::new(&mut out, 16);
        writer
            .write_line(ListingLine {
                addr: 0x1000,
                bytes: &[0xa9, 0xff],
                status: LineStatus::Ok,
                aux: 0,
                line_num: 3,
                source: "    LDA #$FF",
            })
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("1000  A9 FF"));
        assert!(text.trim_end().ends_with("3      LDA #$FF"));
    }

    #[test]
    fn long_lines_wrap_bytes() {
        let mut out = Vec::new();
        let mut writer = ListingWriter::new(&mut out, 32);
        let bytes: Vec<u8> = (0..10).collect();
        writer
            .write_line(ListingLine {
                addr: 0x200,
                bytes: &bytes,
                status: LineStatus::Ok,
                aux: 0,
                line_num: 1,
                source: " DB 0,1,2,3,4,5,6,7,8,9",
            })
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "00000208  08 09");
    }

    #[test]
    fn equ_lines_show_value() {
        let mut out = Vec::new();
        let mut writer = ListingWriter::new(&mut out, 16);
        writer
            .write_line(ListingLine {
                addr: 0,
                bytes: &[],
                status: LineStatus::DirEqu,
                aux: 0x20,
                line_num: 1,
                source: "ZP EQU $20",
            })
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("      = 20"));
    }

    #[test]
    fn format_bytes_is_spaced_hex() {
        assert_eq!(format_bytes(&[0x0a, 0xff]), "0A FF");
    }
}
