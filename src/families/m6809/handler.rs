// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 6809 handler implementation.

use tracing::trace;

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::expr::{parse_expr, Value};
use crate::core::family::{AssemblerContext, CpuHandler, EncodeOutcome};
use crate::core::range::{self, Domain};
use crate::core::registers::RegisterSet;
use crate::core::select::{
    branch_displacement, select_branch, select_width, BranchCandidate, Candidate, SizeForce,
};
use crate::core::state::CpuState;
use crate::core::tokenizer::{Span, TokenKind};

use super::operand::{parse_operand, IndexMode, OffsetAccumulator, OperandForm};
use super::table::{column, Class, Column, Op, INSTRUCTION_TABLE};

/// Direct-page register value assumed by `SETDP`.
pub const DP_KEY: &str = "m6809.dp";

const TRANSFER_REGS: RegisterSet =
    RegisterSet::new(&["D", "X", "Y", "U", "S", "PC", "A", "B", "CC", "DP"]);
const TRANSFER_CODES: [u8; 10] = [0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x8, 0x9, 0xA, 0xB];

const STACK_REGS: RegisterSet =
    RegisterSet::new(&["CC", "A", "B", "DP", "X", "Y", "U", "S", "PC", "D"]);
const STACK_MASKS: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x40, 0x80, 0x06];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OffsetWidth {
    Eight,
    Sixteen,
}

#[derive(Debug, Default)]
pub struct M6809Handler;

impl M6809Handler {
    pub const fn new() -> Self {
        Self
    }

    fn encode_memory(
        &self,
        mnemonic: &str,
        class: Class,
        op: Op,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let form = parse_operand(cursor)?;
        cursor.expect_end()?;
        let mode_error =
            |what: &str| AsmError::bad_mode(&format!("{what} addressing not allowed for {mnemonic}"));

        match form {
            OperandForm::None => Err(AsmError::missing_operand().with_span(cursor.span())),
            OperandForm::Immediate(expr) => {
                let opcode = column(class, op, Column::Immediate)
                    .ok_or_else(|| mode_error("Immediate").with_span(expr.span()))?;
                let value = ctx.eval(&expr)?;
                emit_opcode(buf, opcode);
                if op.wide {
                    let v = range::check(buf, value.value, Domain::WORD, "Immediate value", expr.span());
                    buf.word(v as u16);
                } else {
                    let v = range::check(buf, value.value, Domain::BYTE, "Immediate value", expr.span());
                    buf.byte(v as u8);
                }
                Ok(())
            }
            OperandForm::Direct { expr, force } => {
                let (Some(direct), Some(extended)) = (
                    column(class, op, Column::Direct),
                    column(class, op, Column::Extended),
                ) else {
                    return Err(mode_error("Memory").with_span(expr.span()));
                };
                let value = ctx.eval(&expr)?;
                let page = (ctx.state().get_or(DP_KEY, 0) & 0xFF) << 8;
                let candidates = [
                    Candidate::new(Column::Direct, 0, Domain::Range(page, page | 0xFF)),
                    Candidate::new(Column::Extended, 1, Domain::Unsigned(16)),
                ];
                let selection =
                    select_width(value, force, &candidates).map_err(|e| e.with_span(expr.span()))?;
                let v = range::check(buf, value.value, selection.domain, "Address", expr.span());
                if selection.width == Column::Direct {
                    emit_opcode(buf, direct);
                    buf.byte((value.value & 0xFF) as u8);
                } else {
                    emit_opcode(buf, extended);
                    buf.word(v as u16);
                }
                Ok(())
            }
            OperandForm::Indexed {
                mode,
                indirect,
                span,
            } => {
                let opcode = column(class, op, Column::Indexed)
                    .ok_or_else(|| mode_error("Indexed").with_span(span))?;
                emit_opcode(buf, opcode);
                self.encode_indexed(mode, indirect, span, ctx, buf)
            }
        }
    }

    /// Emit the postbyte and offset bytes of an indexed operand. The opcode
    /// must already be in `buf`.
    fn encode_indexed(
        &self,
        mode: IndexMode,
        indirect: bool,
        span: Span,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let ind = if indirect { 0x10 } else { 0x00 };
        match mode {
            IndexMode::Offset { offset: None, reg, .. } => buf.byte(0x84 | reg.bits() | ind),
            IndexMode::Offset {
                offset: Some(expr),
                force,
                reg,
            } => {
                let value = ctx.eval(&expr)?;
                if force == SizeForce::Auto && value.known {
                    if value.value == 0 {
                        buf.byte(0x84 | reg.bits() | ind);
                        return Ok(());
                    }
                    if !indirect && Domain::Signed(5).contains(value.value) {
                        buf.byte(reg.bits() | (value.value & 0x1F) as u8);
                        return Ok(());
                    }
                }
                let width = offset_width(value, force, expr.span())?;
                self.emit_offset(buf, 0x88 | reg.bits() | ind, width, value.value, expr.span());
            }
            IndexMode::Accumulator { acc, reg } => {
                let code = match acc {
                    OffsetAccumulator::A => 0x86,
                    OffsetAccumulator::B => 0x85,
                    OffsetAccumulator::D => 0x8B,
                };
                buf.byte(code | reg.bits() | ind);
            }
            IndexMode::Increment { reg, twice } => {
                buf.byte(if twice { 0x81 } else { 0x80 } | reg.bits() | ind)
            }
            IndexMode::Decrement { reg, twice } => {
                buf.byte(if twice { 0x83 } else { 0x82 } | reg.bits() | ind)
            }
            IndexMode::ProgramRelative { target, force } => {
                let value = ctx.eval(&target)?;
                // Displacement counts from the end of the instruction.
                let prefix = buf.len() as i64;
                let candidates = [
                    BranchCandidate {
                        width: OffsetWidth::Eight,
                        rank: 0,
                        base: prefix + 2,
                        domain: Domain::Signed(8),
                        reserved: None,
                    },
                    BranchCandidate {
                        width: OffsetWidth::Sixteen,
                        rank: 1,
                        base: prefix + 3,
                        domain: Domain::Signed(16),
                        reserved: None,
                    },
                ];
                let origin = ctx.current_address() as i64;
                let selection = select_branch(value, origin, force, &candidates)
                    .map_err(|e| e.with_span(target.span()))?;
                let disp = range::check_displacement(
                    buf,
                    selection.displacement,
                    selection.domain,
                    1,
                    target.span(),
                );
                if selection.width == OffsetWidth::Eight {
                    buf.byte(0x8C | ind);
                    buf.byte(disp as u8);
                } else {
                    buf.byte(0x8D | ind);
                    buf.word(disp as u16);
                }
            }
            IndexMode::ProgramOffset { offset, force } => {
                let value = ctx.eval(&offset)?;
                let width = offset_width(value, force, offset.span())?;
                self.emit_offset(buf, 0x8C | ind, width, value.value, offset.span());
            }
            IndexMode::ExtendedIndirect { address } => {
                let value = ctx.eval(&address)?;
                buf.byte(0x9F);
                let v = range::check(buf, value.value, Domain::Unsigned(16), "Address", span);
                buf.word(v as u16);
            }
        }
        Ok(())
    }

    /// `postbyte` is the 8-bit variant; the 16-bit one is the next code.
    fn emit_offset(
        &self,
        buf: &mut InstructionBuffer,
        postbyte: u8,
        width: OffsetWidth,
        value: i64,
        span: Span,
    ) {
        match width {
            OffsetWidth::Eight => {
                buf.byte(postbyte);
                let v = range::check(buf, value, Domain::Signed(8), "Offset", span);
                buf.byte(v as u8);
            }
            OffsetWidth::Sixteen => {
                buf.byte(postbyte + 1);
                let v = range::check(buf, value, Domain::Either(16), "Offset", span);
                buf.word(v as u16);
            }
        }
    }

    fn encode_branch(
        &self,
        op: Op,
        long: bool,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let target = ctx.eval(&expr)?;
        emit_opcode(buf, op.opcode);
        let origin = ctx.current_address() as i64;
        if long {
            let length = buf.len() as i64 + 2;
            let disp = branch_displacement(target.value, origin, length);
            let v = range::check_displacement(buf, disp, Domain::Signed(16), 1, expr.span());
            buf.word(v as u16);
        } else {
            let disp = branch_displacement(target.value, origin, 2);
            let v = range::check_displacement(buf, disp, Domain::Signed(8), 1, expr.span());
            buf.byte(v as u8);
        }
        Ok(())
    }

    fn encode_transfer(
        &self,
        op: Op,
        cursor: &mut TokenCursor,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let first = cursor.span();
        let src = TRANSFER_CODES[cursor.expect_register(&TRANSFER_REGS, "register")?];
        cursor.expect_comma()?;
        let dst = TRANSFER_CODES[cursor.expect_register(&TRANSFER_REGS, "register")?];
        cursor.expect_end()?;
        // Codes below 8 name 16-bit registers.
        if (src < 8) != (dst < 8) {
            return Err(AsmError::illegal_operand("Register size mismatch")
                .with_span(first.join(cursor.prev_span())));
        }
        emit_opcode(buf, op.opcode);
        buf.byte((src << 4) | dst);
        Ok(())
    }

    fn encode_stack(
        &self,
        op: Op,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let user_stack = op.opcode & 0x02 != 0;
        let own = if user_stack { "U" } else { "S" };

        let mask = if cursor.eat(&TokenKind::Hash) {
            let expr = parse_expr(cursor)?;
            let value = ctx.eval(&expr)?;
            range::check(buf, value.value, Domain::Unsigned(8), "Register mask", expr.span()) as u8
        } else {
            let mut mask = 0u8;
            loop {
                let span = cursor.span();
                let idx = cursor.expect_register(&STACK_REGS, "register")?;
                if STACK_REGS.names()[idx] == own {
                    return Err(AsmError::illegal_operand(&format!(
                        "Cannot push or pull {own} on its own stack"
                    ))
                    .with_span(span));
                }
                mask |= STACK_MASKS[idx];
                if !cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
            mask
        };
        cursor.expect_end()?;
        emit_opcode(buf, op.opcode);
        buf.byte(mask);
        Ok(())
    }

    fn set_direct_page(
        &self,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        state: &mut CpuState,
    ) -> Result<(), AsmError> {
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let value = ctx.eval(&expr)?;
        if !value.known {
            return Err(AsmError::illegal_operand("SETDP needs a value defined earlier")
                .with_span(expr.span()));
        }
        // A full page address selects its page.
        let page = if value.value > 0xFF {
            value.value >> 8
        } else {
            value.value
        };
        if !Domain::Unsigned(8).contains(page) {
            return Err(AsmError::out_of_range(&format!("Direct page out of range: {page}"))
                .with_span(expr.span()));
        }
        trace!(page, "6809 direct page");
        state.set(DP_KEY, page);
        Ok(())
    }
}

fn offset_width(
    value: Value,
    force: SizeForce,
    span: Span,
) -> Result<OffsetWidth, AsmError> {
    let candidates = [
        Candidate::new(OffsetWidth::Eight, 0, Domain::Signed(8)),
        Candidate::new(OffsetWidth::Sixteen, 1, Domain::Either(16)),
    ];
    select_width(value, force, &candidates)
        .map(|selection| selection.width)
        .map_err(|e| e.with_span(span))
}

fn emit_opcode(buf: &mut InstructionBuffer, opcode: u16) {
    if opcode > 0xFF {
        buf.byte((opcode >> 8) as u8);
    }
    buf.byte(opcode as u8);
}

impl CpuHandler for M6809Handler {
    fn encode(
        &self,
        mnemonic: &str,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> EncodeOutcome {
        let Ok(matched) = INSTRUCTION_TABLE.lookup(mnemonic) else {
            return EncodeOutcome::NotFound;
        };
        let op = matched.param();
        let result = match matched.class() {
            Class::Inherent => cursor.expect_end().map(|()| emit_opcode(buf, op.opcode)),
            Class::Branch => self.encode_branch(op, false, cursor, ctx, buf),
            Class::LongBranch => self.encode_branch(op, true, cursor, ctx, buf),
            Class::Transfer => self.encode_transfer(op, cursor, buf),
            Class::Stack => self.encode_stack(op, cursor, ctx, buf),
            class => self.encode_memory(mnemonic, class, op, cursor, ctx, buf),
        };
        result.into()
    }

    fn label_op(
        &self,
        name: &str,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        state: &mut CpuState,
    ) -> Option<Result<(), AsmError>> {
        let name = name.strip_prefix('.').unwrap_or(name);
        if !name.eq_ignore_ascii_case("SETDP") {
            return None;
        }
        Some(self.set_direct_page(cursor, ctx, state))
    }

    fn pass_init(&self, state: &mut CpuState) {
        state.set(DP_KEY, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembler::error::AsmErrorKind;
    use crate::core::cpu::Endianness;
    use crate::core::family::tests::{run, TestContext};

    fn encode_at(ctx: &TestContext, line: &str) -> Vec<u8> {
        let (bytes, errors) = run(&M6809Handler::new(), ctx, Endianness::Big, line)
            .unwrap_or_else(|e| panic!("{line}: {e}"));
        assert!(errors.is_empty(), "{line}: {errors:?}");
        bytes
    }

    fn encode(line: &str) -> Vec<u8> {
        encode_at(&TestContext::at(0x1000), line)
    }

    fn error(line: &str) -> AsmErrorKind {
        match run(&M6809Handler::new(), &TestContext::new(), Endianness::Big, line) {
            Err(err) => err.kind(),
            Ok((_, errors)) => errors.first().map(|e| e.kind()).expect("an error"),
        }
    }

    #[test]
    fn immediate_direct_extended() {
        assert_eq!(encode("LDA #$12"), [0x86, 0x12]);
        assert_eq!(encode("LDD #$1234"), [0xCC, 0x12, 0x34]);
        assert_eq!(encode("LDY #1"), [0x10, 0x8E, 0x00, 0x01]);
        assert_eq!(encode("LDA $10"), [0x96, 0x10]);
        assert_eq!(encode("LDA $1234"), [0xB6, 0x12, 0x34]);
        assert_eq!(encode("LDA >$10"), [0xB6, 0x00, 0x10]);
        assert_eq!(encode("STY $20"), [0x10, 0x9F, 0x20]);
        assert_eq!(encode("JMP $1234"), [0x7E, 0x12, 0x34]);
        assert_eq!(encode("NEG $10"), [0x00, 0x10]);
        assert_eq!(encode("SWI2"), [0x10, 0x3F]);
    }

    #[test]
    fn forward_reference_is_extended() {
        let mut ctx = TestContext::new();
        ctx.symbols.forward.insert("later".into(), 0x10);
        assert_eq!(encode_at(&ctx, "LDA later"), [0xB6, 0x00, 0x10]);
    }

    #[test]
    fn indexed_postbytes() {
        assert_eq!(encode("LDA ,X"), [0xA6, 0x84]);
        assert_eq!(encode("LDA 0,X"), [0xA6, 0x84]);
        assert_eq!(encode("LDA 5,Y"), [0xA6, 0x25]);
        assert_eq!(encode("LDA -1,X"), [0xA6, 0x1F]);
        assert_eq!(encode("LDA 100,X"), [0xA6, 0x88, 0x64]);
        assert_eq!(encode("LDA 1000,X"), [0xA6, 0x89, 0x03, 0xE8]);
        assert_eq!(encode("LDA >5,X"), [0xA6, 0x89, 0x00, 0x05]);
        assert_eq!(encode("LDA [,X]"), [0xA6, 0x94]);
        assert_eq!(encode("LDA [5,X]"), [0xA6, 0x98, 0x05]);
        assert_eq!(encode("LDA ,X+"), [0xA6, 0x80]);
        assert_eq!(encode("LDA ,X++"), [0xA6, 0x81]);
        assert_eq!(encode("LDA ,-X"), [0xA6, 0x82]);
        assert_eq!(encode("LDA ,--U"), [0xA6, 0xC3]);
        assert_eq!(encode("LDA B,X"), [0xA6, 0x85]);
        assert_eq!(encode("LDA D,Y"), [0xA6, 0xAB]);
        assert_eq!(encode("LDA [$1234]"), [0xA6, 0x9F, 0x12, 0x34]);
        assert_eq!(encode("LEAX 10,S"), [0x30, 0x6A]);
        assert_eq!(encode("CLR ,X"), [0x6F, 0x84]);
        assert_eq!(encode("LDY ,X"), [0x10, 0xAE, 0x84]);
    }

    #[test]
    fn program_counter_relative() {
        assert_eq!(encode("LDA $1010,PCR"), [0xA6, 0x8C, 0x0D]);
        assert_eq!(encode("LDA $2000,PCR"), [0xA6, 0x8D, 0x0F, 0xFC]);
        assert_eq!(encode("LEAX 4,PC"), [0x30, 0x8C, 0x04]);
    }

    #[test]
    fn branches() {
        assert_eq!(encode("BRA $1000"), [0x20, 0xFE]);
        assert_eq!(encode("BSR $1010"), [0x8D, 0x0E]);
        assert_eq!(encode("LBRA $1000"), [0x16, 0xFF, 0xFD]);
        assert_eq!(encode("LBEQ $1000"), [0x10, 0x27, 0xFF, 0xFC]);
        assert_eq!(error("BRA $2000"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn register_operands() {
        assert_eq!(encode("TFR A,B"), [0x1F, 0x89]);
        assert_eq!(encode("EXG X,Y"), [0x1E, 0x12]);
        assert_eq!(encode("PSHS A,B,X"), [0x34, 0x16]);
        assert_eq!(encode("PULS D,PC"), [0x35, 0x86]);
        assert_eq!(encode("PSHU S,CC"), [0x36, 0x41]);
        assert_eq!(encode("PSHS #$FF"), [0x34, 0xFF]);
        assert_eq!(error("TFR A,X"), AsmErrorKind::IllegalOperand);
        assert_eq!(error("PSHS S"), AsmErrorKind::IllegalOperand);
    }

    #[test]
    fn mode_restrictions() {
        assert_eq!(error("STA #1"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LEAX $10"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("ANDCC ,X"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LDA"), AsmErrorKind::MissingOperand);
        assert_eq!(error("RTS 1"), AsmErrorKind::BadAddressingMode);
    }

    #[test]
    fn setdp_moves_direct_page() {
        let handler = M6809Handler::new();
        let mut ctx = TestContext::new();
        let mut state = CpuState::new();
        let mut cursor = TokenCursor::from_line("$20", 1).unwrap();
        handler
            .label_op("SETDP", &mut cursor, &ctx, &mut state)
            .unwrap()
            .unwrap();
        ctx.state = state;
        assert_eq!(encode_at(&ctx, "LDA $2010"), [0x96, 0x10]);
        assert_eq!(encode_at(&ctx, "LDA $10"), [0xB6, 0x00, 0x10]);
        handler.pass_init(&mut ctx.state);
        assert_eq!(encode_at(&ctx, "LDA $10"), [0x96, 0x10]);
    }
}
