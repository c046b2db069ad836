// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

use super::{
    assemble_source as assemble_with, write_cpu_list, Assembler, AssemblerOptions, Assembly,
    LineResult,
};
use crate::core::assembler::error::{AsmErrorKind, Severity};
use crate::core::registry::ModuleRegistry;

fn options(cpu: &str) -> AssemblerOptions {
    AssemblerOptions {
        cpu: cpu.to_string(),
        ..AssemblerOptions::default()
    }
}

fn assemble_source(cpu: &str, source: &str) -> Assembly {
    match assemble_with(options(cpu), source) {
        Ok(assembly) => assembly,
        Err(err) => {
            let messages: Vec<_> = err.diagnostics().iter().map(|d| d.format()).collect();
            panic!("assembly failed: {err}: {messages:?}");
        }
    }
}

fn assemble_bytes(cpu: &str, line: &str) -> Vec<u8> {
    assemble_source(cpu, line).binary(0xFF)
}

/// `(line, kind)` of every error diagnostic from a failing source.
fn errors(cpu: &str, source: &str) -> Vec<(u32, AsmErrorKind)> {
    let err = assemble_with(options(cpu), source).expect_err("assembly should fail");
    err.diagnostics()
        .iter()
        .filter(|d| d.severity() == Severity::Error)
        .map(|d| (d.line(), d.error().kind()))
        .collect()
}

#[test]
fn mos6502_scenarios() {
    assert_eq!(assemble_bytes("6502", " LDA #$FF"), [0xA9, 0xFF]);
    assert_eq!(assemble_bytes("6502", " LDA $10"), [0xA5, 0x10]);
    assert_eq!(assemble_bytes("6502", " LDA $1234"), [0xAD, 0x34, 0x12]);
    assert_eq!(assemble_bytes("6502", " LDA #'A'"), [0xA9, 0x41]);
}

#[test]
fn forward_references_take_the_wide_form_in_both_passes() {
    let source = "\
        ORG $1000
start   LDA zp
        LDA start
zp      EQU $10
";
    let assembly = assemble_source("6502", source);
    assert_eq!(
        assembly.binary(0),
        [0xAD, 0x10, 0x00, 0xAD, 0x00, 0x10]
    );
    assert_eq!(assembly.symbols.value("start"), Some(0x1000));
    assert!(assembly.report.diagnostics().is_empty());
}

#[test]
fn constants_derived_from_forward_labels_stay_unknown() {
    let source = "\
start:  LDA size
size    EQU finish-start
        NOP
finish:
";
    let assembly = assemble_source("6502", source);
    assert_eq!(assembly.binary(0), [0xAD, 0x04, 0x00, 0xEA]);
    assert_eq!(assembly.symbols.value("size"), Some(4));
}

#[test]
fn short_branch_out_of_range() {
    let source = " BEQ target\n DS 130\ntarget NOP\n";
    assert_eq!(errors("6502", source), [(1, AsmErrorKind::OperandOutOfRange)]);
    let source = " BEQ target\n DS 127\ntarget NOP\n";
    let assembly = assemble_source("6502", source);
    assert_eq!(assembly.image.get(1), Some(0x7F));
}

#[test]
fn m68000_scenario() {
    assert_eq!(
        assemble_bytes("68000", " MOVE.L #$12345678,D0"),
        [0x20, 0x3C, 0x12, 0x34, 0x56, 0x78]
    );
}

#[test]
fn z80_scenarios() {
    assert_eq!(assemble_bytes("z80", " LD A,(HL)"), [0x7E]);
    assert_eq!(assemble_bytes("z80", " LD A,(IX+5)"), [0xDD, 0x7E, 0x05]);
}

#[test]
fn z80_set_is_an_instruction_without_a_label() {
    let assembly = assemble_source("z80", " SET 3,A\ncount SET 5\ncount SET count+1\n DB count\n");
    assert_eq!(assembly.binary(0), [0xCB, 0xDF, 0x06]);
}

#[test]
fn arm_branch_limits() {
    let far = "target EQU $4000000\n BEQ target\n";
    assert_eq!(errors("ARM", far), [(2, AsmErrorKind::OperandOutOfRange)]);
    let misaligned = "target EQU $102\n BEQ target\n";
    assert_eq!(errors("ARM", misaligned), [(2, AsmErrorKind::OperandOutOfRange)]);
    let near = " BEQ target\n ORG $100000\ntarget NOP\n";
    let assembly = assemble_source("ARM", near);
    assert_eq!(assembly.image.get(3), Some(0x0A));
    assert_eq!(assembly.symbols.value("target"), Some(0x100000));
}

#[test]
fn arm_big_endian_variant() {
    assert_eq!(assemble_bytes("ARMBE", " MOV R0,#1"), [0xE3, 0xA0, 0x00, 0x01]);
    assert_eq!(assemble_bytes("ARM", " MOV R0,#1"), [0x01, 0x00, 0xA0, 0xE3]);
}

#[test]
fn data_directives_follow_cpu_endianness() {
    assert_eq!(
        assemble_bytes("6502", " DB 1,\"AB\",-1\n DW $1234\n DL $01020304"),
        [0x01, 0x41, 0x42, 0xFF, 0x34, 0x12, 0x04, 0x03, 0x02, 0x01]
    );
    assert_eq!(
        assemble_bytes("6809", " FCB 1\n FDB $1234\n DC.L 5"),
        [0x01, 0x12, 0x34, 0x00, 0x00, 0x00, 0x05]
    );
    assert_eq!(errors("6502", " DB 256"), [(1, AsmErrorKind::OperandOutOfRange)]);
    assert_eq!(errors("6502", " DW"), [(1, AsmErrorKind::MissingOperand)]);
}

#[test]
fn reserve_and_alignment_leave_gaps() {
    let assembly = assemble_source("6502", " *= $10\n DB 1\n DS 2\n DB 2\n ALIGN 8\n DB 3\n EVEN\n");
    assert_eq!(assembly.image.output_range(), Some((0x10, 0x18)));
    assert_eq!(
        assembly.binary(0xEE),
        [0x01, 0xEE, 0xEE, 0x02, 0xEE, 0xEE, 0xEE, 0xEE, 0x03]
    );
    assert_eq!(errors("6502", " DS later\nlater NOP\n"), [(1, AsmErrorKind::Directive)]);
}

#[test]
fn labels_and_assignments() {
    let source = "\
value = 3
        .ORG $200
here:   NOP
there   EQU here+value
";
    let assembly = assemble_source("6502", source);
    assert_eq!(assembly.symbols.value("VALUE"), Some(3));
    assert_eq!(assembly.symbols.value("there"), Some(0x203));
    let source = "loop NOP\nloop NOP\n";
    assert_eq!(errors("6502", source), [(2, AsmErrorKind::Symbol)]);
    assert_eq!(errors("6502", " EQU 5"), [(1, AsmErrorKind::Directive)]);
}

#[test]
fn org_label_takes_the_new_origin() {
    let assembly = assemble_source("6809", "entry ORG $C000\n NOP\n");
    assert_eq!(assembly.symbols.value("entry"), Some(0xC000));
    assert_eq!(errors("6502", " ORG $10000"), [(1, AsmErrorKind::OperandOutOfRange)]);
}

#[test]
fn cpu_switches_mid_source() {
    let source = "\
        LDA #1
        CPU z80
        LD A,B
        .cpu 65C02
        STZ $10
        PROCESSOR 6809
        FDB 1
";
    assert_eq!(
        assemble_bytes("6502", source),
        [0xA9, 0x01, 0x78, 0x64, 0x10, 0x00, 0x01]
    );
    assert_eq!(errors("6502", " CPU 8086"), [(1, AsmErrorKind::Cpu)]);
}

#[test]
fn cpu_label_ops_reach_the_handler() {
    let source = " LONGA ON\n LDA #$1234\n CPU 65816\n LDA #$12\n";
    assert_eq!(assemble_bytes("65816", source), [0xA9, 0x34, 0x12, 0xA9, 0x12]);
    let source = " SETDP $20\n LDA $2010\n";
    assert_eq!(assemble_bytes("6809", source), [0x96, 0x10]);
}

#[test]
fn undefined_and_unknown() {
    assert_eq!(errors("6502", " LDA nowhere"), [(1, AsmErrorKind::Expression)]);
    assert_eq!(errors("6502", " FROB #1"), [(1, AsmErrorKind::UnknownMnemonic)]);
    assert_eq!(errors("6502", " STZ $10"), [(1, AsmErrorKind::Cpu)]);
    assert_eq!(errors("6502", " .FOO 1"), [(1, AsmErrorKind::Directive)]);
}

#[test]
fn failed_run_summarises_the_first_error() {
    let source = " LDA nowhere\n FROB\n";
    let err = assemble_with(options("6502"), source).unwrap_err();
    assert_eq!(err.error().kind(), AsmErrorKind::Expression);
    assert!(err.error().message().starts_with("2 error(s)"));
    assert_eq!(err.diagnostics().len(), 2);
}

#[test]
fn end_stops_assembly() {
    assert_eq!(assemble_bytes("6502", " NOP\n END\n FROB\n"), [0xEA]);
}

#[test]
fn predefined_symbols() {
    let mut opts = options("6502");
    opts.defines.push(("BASE".to_string(), 0x40));
    let assembly = assemble_with(opts, " LDA BASE").unwrap();
    assert_eq!(assembly.binary(0), [0xA5, 0x40]);
    let mut opts = options("6502");
    opts.defines.push(("BASE".to_string(), 0x40));
    assert!(assemble_with(opts, "BASE NOP").is_err());
}

#[test]
fn warnings_do_not_fail_the_run() {
    let assembly = assemble_source("ARM", " MUL R0,R0,R1\n");
    assert_eq!(assembly.report.warning_count(), 1);
    assert_eq!(assembly.binary(0).len(), 4);
}

#[test]
fn listing_shows_code_and_symbols() {
    let assembly = assemble_source("6502", "start LDA #$FF\nvalue EQU $20\n");
    let listing = &assembly.listing;
    assert!(listing.contains("retroasm 6502 Assembler"));
    assert!(listing.contains("0000  A9 FF"));
    assert!(listing.contains("= 20"));
    assert!(listing.contains("SYMBOL TABLE"));
    assert!(listing.contains("start"));
}

#[test]
fn ledger_flags_length_changes() {
    let mut assembler = Assembler::new(options("6502")).unwrap();
    assembler.lengths = vec![3];
    assembler.pass = 2;
    let mut result = LineResult::new(0);
    result.bytes = vec![0xA5, 0x10];
    assert_eq!(assembler.settle_length(0, 1, &mut result), 2);
    assert_eq!(result.errors[0].kind(), AsmErrorKind::PhaseError);

    let mut failed = LineResult::new(0);
    failed.errors.push(crate::core::assembler::error::AsmError::missing_operand());
    assert_eq!(assembler.settle_length(0, 1, &mut failed), 3);
    assert_eq!(failed.errors.len(), 1);
}

#[test]
fn label_moved_between_passes_is_a_phase_error() {
    let lines: Vec<String> = [" NOP", "here NOP"].map(String::from).to_vec();
    let mut assembler = Assembler::new(options("6502")).unwrap();
    assembler.lengths = vec![0; lines.len()];
    assembler.run_pass::<std::io::Sink>(1, &lines, None).unwrap();
    assert_eq!(assembler.symbols.value("here"), Some(1));

    assembler.start_pass(2).unwrap();
    assembler.addr = 0x10;
    let result = assembler.process_line(&lines[1], 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind(), AsmErrorKind::PhaseError);
    assert!(result.errors[0].message().starts_with("Label here moved between passes"));
}

#[test]
fn extreme_branch_targets_are_line_errors() {
    let source = " B -$8000000000000000
 NOP
";
    assert_eq!(errors("ARM", source), [(1, AsmErrorKind::OperandOutOfRange)]);
    let source = " DBRA D0,-$8000000000000000
 NOP
";
    assert_eq!(errors("68000", source), [(1, AsmErrorKind::OperandOutOfRange)]);
    let source = " LDR R0,[R1,#-$8000000000000000]
";
    assert_eq!(errors("ARM", source), [(1, AsmErrorKind::OperandOutOfRange)]);
}

#[test]
fn location_counter_stops_at_the_top_of_memory() {
    let source = " ORG $FFFF
 NOP
 NOP
 NOP
";
    assert_eq!(
        errors("6502", source),
        [(3, AsmErrorKind::Directive), (4, AsmErrorKind::Directive)]
    );
    assert_eq!(errors("6502", " ORG $FFFF
 DW 1
"), [(2, AsmErrorKind::Directive)]);

    let assembly = assemble_source("6502", " ORG $FFFF
 NOP
finish
");
    assert_eq!(assembly.image.output_range(), Some((0xFFFF, 0xFFFF)));
    assert_eq!(assembly.symbols.value("finish"), Some(0x1_0000));
}

#[test]
fn unknown_initial_cpu_is_a_cli_error() {
    let err = assemble_with(options("PDP11"), " NOP").unwrap_err();
    assert_eq!(err.error().kind(), AsmErrorKind::Cli);
}

#[test]
fn cpu_list_names_every_family() {
    let mut out = Vec::new();
    write_cpu_list(&ModuleRegistry::with_defaults(), &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    for name in ["6502", "65816", "6809", "68000", "Z80", "ARMBE"] {
        assert!(text.contains(name), "{name}");
    }
    assert!(text.contains("big endian"));
}
