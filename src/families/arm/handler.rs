// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! ARM handler implementation.
//!
//! Every instruction is one 32-bit word; the condition sits in the top
//! nibble. The handler only has to pick field values, so most errors are
//! range diagnostics and the length never changes between passes.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::expr::{parse_expr, Expr};
use crate::core::family::{AssemblerContext, CpuHandler, EncodeOutcome};
use crate::core::range::{self, Domain};
use crate::core::select::branch_displacement;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

use super::operand::{
    at_register, parse_address, parse_operand2, parse_psr, parse_register_list, register,
    Address, Offset, Operand2, Shift, ShiftKind, PC,
};
use super::table::{suffix, Class, DpKind, Suffix, Width, INSTRUCTION_TABLE};

const WORD: Domain = Domain::Either(32);
/// `MOV R0, R0`
const NOP: u32 = 0xE1A0_0000;
/// The pipeline puts PC two instructions ahead.
const PC_AHEAD: i64 = 8;

/// Encode `value` as an 8-bit constant rotated right by an even amount.
pub fn encode_immediate(value: u32) -> Option<u32> {
    (0..16u32).find_map(|rot| {
        let imm = value.rotate_left(rot * 2);
        (imm <= 0xFF).then_some(rot << 8 | imm)
    })
}

/// The complementary opcode and operand for a constant that does not
/// encode directly.
fn substitute(opcode: u32, value: u32) -> Option<(u32, u32)> {
    let negated = value.wrapping_neg();
    match opcode {
        0x0 => Some((0xE, !value)),
        0xE => Some((0x0, !value)),
        0x2 => Some((0x4, negated)),
        0x4 => Some((0x2, negated)),
        0xA => Some((0xB, negated)),
        0xB => Some((0xA, negated)),
        0xD => Some((0xF, !value)),
        0xF => Some((0xD, !value)),
        _ => None,
    }
}

fn bad_mode(mnemonic: &str, span: Span) -> AsmError {
    AsmError::bad_mode(&format!("Invalid addressing mode for {mnemonic}")).with_span(span)
}

#[derive(Debug, Default)]
pub struct ArmHandler;

impl ArmHandler {
    pub const fn new() -> Self {
        Self
    }

    fn constant(
        &self,
        expr: &Expr,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let value = ctx.eval(expr)?;
        Ok(range::check(buf, value.value, WORD, "Immediate value", expr.span()) as u32)
    }

    fn shift_bits(
        &self,
        shift: &Shift,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        Ok(match shift {
            Shift::None => 0,
            Shift::Rrx => ShiftKind::Ror.bits() << 5,
            Shift::Register { kind, rs } => (*rs as u32) << 8 | kind.bits() << 5 | 0x10,
            Shift::Immediate { kind, amount } => {
                let value = ctx.eval(amount)?;
                let domain = match kind {
                    ShiftKind::Lsl => Domain::Range(0, 31),
                    ShiftKind::Lsr | ShiftKind::Asr => Domain::Range(1, 32),
                    ShiftKind::Ror => Domain::Range(1, 31),
                };
                range::check(buf, value.value, domain, "Shift amount", amount.span());
                // A 32-bit LSR/ASR is encoded as 0.
                ((value.value & 0x1F) as u32) << 7 | kind.bits() << 5
            }
        })
    }

    fn encode_data_processing(
        &self,
        kind: DpKind,
        opcode: u32,
        sfx: Suffix,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let (rd, rn) = match kind {
            DpKind::Move => {
                let rd = register(cursor)?;
                cursor.expect_comma()?;
                (rd, 0)
            }
            DpKind::Compare => {
                let rn = register(cursor)?;
                cursor.expect_comma()?;
                (0, rn)
            }
            DpKind::Normal => {
                let rd = register(cursor)?;
                cursor.expect_comma()?;
                // `ADD Rd, <op2>` is `ADD Rd, Rd, <op2>`.
                let rn = cursor
                    .speculate(|c| {
                        let rn = register(c).ok()?;
                        c.eat(&TokenKind::Comma).then_some(())?;
                        (at_register(c) || matches!(c.peek_kind(), TokenKind::Hash)).then_some(rn)
                    })
                    .unwrap_or(rd);
                (rd, rn)
            }
        };
        let (op2, span) = parse_operand2(cursor)?;
        cursor.expect_end()?;

        let set_flags = sfx.set_flags() || kind == DpKind::Compare;
        let (opcode, operand) = match op2 {
            Operand2::Register { rm, shift } => {
                (opcode, rm as u32 | self.shift_bits(&shift, ctx, buf)?)
            }
            Operand2::Immediate(expr) => {
                let value = self.constant(&expr, ctx, buf)?;
                let direct = encode_immediate(value).map(|enc| (opcode, enc));
                let swapped = || {
                    substitute(opcode, value)
                        .and_then(|(alt, v)| encode_immediate(v).map(|enc| (alt, enc)))
                };
                match direct.or_else(swapped) {
                    Some((opcode, enc)) => (opcode, 1 << 25 | enc),
                    None => {
                        buf.report(
                            AsmError::out_of_range(&format!(
                                "Immediate value 0x{value:X} cannot be encoded as a rotated 8-bit constant"
                            ))
                            .with_span(span),
                        );
                        (opcode, 1 << 25)
                    }
                }
            }
        };
        Ok(sfx.cond << 28
            | opcode << 21
            | (set_flags as u32) << 20
            | (rn as u32) << 16
            | (rd as u32) << 12
            | operand)
    }

    fn encode_multiply(
        &self,
        mnemonic: &str,
        long: bool,
        param: u32,
        sfx: Suffix,
        cursor: &mut TokenCursor,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let start = cursor.span();
        let mut regs = vec![register(cursor)?];
        let count = if long || param == 1 { 4 } else { 3 };
        for _ in 1..count {
            cursor.expect_comma()?;
            regs.push(register(cursor)?);
        }
        cursor.expect_end()?;
        let span = start.join(cursor.prev_span());
        if regs.contains(&PC) {
            return Err(AsmError::illegal_operand(&format!("{mnemonic} cannot use PC")).with_span(span));
        }
        let r = |i: usize| regs[i] as u32;
        let flags = sfx.cond << 28 | (sfx.set_flags() as u32) << 20;

        if long {
            if r(0) == r(1) {
                return Err(AsmError::illegal_operand("RdLo and RdHi must differ").with_span(span));
            }
            return Ok(flags | 0x0080_0090 | param << 21 | r(1) << 16 | r(0) << 12 | r(3) << 8 | r(2));
        }
        if r(0) == r(1) {
            buf.warn(
                AsmError::illegal_operand("Rd and Rm should differ for multiply").with_span(span),
            );
        }
        let accumulate = if param == 1 { 1 << 21 | r(3) << 12 } else { 0 };
        Ok(flags | accumulate | r(0) << 16 | r(2) << 8 | 0x90 | r(1))
    }

    /// Direction bit and magnitude of a signed offset checked against an
    /// unsigned field.
    fn signed_offset(
        &self,
        buf: &mut InstructionBuffer,
        value: i64,
        field: Domain,
        span: Span,
    ) -> (u32, u32) {
        let up = value >= 0;
        let magnitude = i64::try_from(value.unsigned_abs()).unwrap_or(i64::MAX);
        let magnitude = range::check(buf, magnitude, field, "Offset", span) as u32;
        ((up as u32) << 23, magnitude)
    }

    fn encode_transfer(
        &self,
        mnemonic: &str,
        load: bool,
        sfx: Suffix,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let rd = register(cursor)? as u32;
        cursor.expect_comma()?;
        let (address, span) = parse_address(cursor)?;
        cursor.expect_end()?;

        let width = sfx.width();
        let half = match width {
            Width::Half => Some(0xB0),
            Width::SignedByte => Some(0xD0),
            Width::SignedHalf => Some(0xF0),
            _ => None,
        };
        let user = matches!(width, Width::WordUser | Width::ByteUser);
        let byte = matches!(width, Width::Byte | Width::ByteUser);
        let base = sfx.cond << 28 | (load as u32) << 20 | rd << 12;

        let (pre, writeback, rn, offset) = match address {
            Address::Literal(expr) => {
                if !load || width != Width::Word {
                    return Err(bad_mode(mnemonic, span));
                }
                let value = self.constant(&expr, ctx, buf)?;
                let (opcode, enc) = encode_immediate(value)
                    .map(|enc| (0xD, enc))
                    .or_else(|| encode_immediate(!value).map(|enc| (0xF, enc)))
                    .ok_or_else(|| {
                        AsmError::bad_mode(&format!(
                            "Constant 0x{value:X} needs a literal pool, which is not supported"
                        ))
                        .with_span(span)
                    })?;
                return Ok(sfx.cond << 28 | 1 << 25 | opcode << 21 | rd << 12 | enc);
            }
            Address::Label(target) => {
                if user {
                    return Err(bad_mode(mnemonic, span));
                }
                let value = ctx.eval(&target)?;
                let disp =
                    branch_displacement(value.value, ctx.current_address() as i64, PC_AHEAD);
                (true, false, PC, Offset::Immediate(Expr::Number(disp, target.span())))
            }
            Address::Pre {
                rn,
                offset,
                writeback,
            } => {
                if user {
                    return Err(AsmError::bad_mode(&format!(
                        "{mnemonic} needs a post-indexed address"
                    ))
                    .with_span(span));
                }
                (true, writeback, rn, offset)
            }
            Address::Post { rn, offset } => (false, user, rn, offset),
        };

        let mut word = base | (pre as u32) << 24 | (writeback as u32) << 21 | (rn as u32) << 16;
        match half {
            None => {
                word |= 0x0400_0000 | (byte as u32) << 22;
                word |= match offset {
                    Offset::None => 1 << 23,
                    Offset::Immediate(expr) => {
                        let value = ctx.eval(&expr)?;
                        let (up, magnitude) =
                            self.signed_offset(buf, value.value, Domain::Unsigned(12), expr.span());
                        up | magnitude
                    }
                    Offset::Register {
                        subtract,
                        rm,
                        shift,
                    } => {
                        if matches!(shift, Shift::Register { .. }) {
                            return Err(bad_mode(mnemonic, span));
                        }
                        1 << 25
                            | (!subtract as u32) << 23
                            | rm as u32
                            | self.shift_bits(&shift, ctx, buf)?
                    }
                };
            }
            Some(sh) => {
                word |= sh;
                word |= match offset {
                    Offset::None => 1 << 23 | 1 << 22,
                    Offset::Immediate(expr) => {
                        let value = ctx.eval(&expr)?;
                        let (up, magnitude) =
                            self.signed_offset(buf, value.value, Domain::Unsigned(8), expr.span());
                        up | 1 << 22 | (magnitude >> 4) << 8 | (magnitude & 0xF)
                    }
                    Offset::Register {
                        subtract,
                        rm,
                        shift: Shift::None,
                    } => (!subtract as u32) << 23 | rm as u32,
                    Offset::Register { .. } => return Err(bad_mode(mnemonic, span)),
                };
            }
        }
        Ok(word)
    }

    fn encode_multiple(
        &self,
        load: bool,
        sfx: Suffix,
        cursor: &mut TokenCursor,
    ) -> Result<u32, AsmError> {
        let rn = register(cursor)? as u32;
        let writeback = cursor.eat_operator(OperatorKind::LogicNot);
        cursor.expect_comma()?;
        let list = parse_register_list(cursor)? as u32;
        let user = cursor.eat_operator(OperatorKind::BitXor);
        cursor.expect_end()?;
        Ok(sfx.cond << 28
            | 0x0800_0000
            | sfx.block_mode().bits()
            | (user as u32) << 22
            | (writeback as u32) << 21
            | (load as u32) << 20
            | rn << 16
            | list)
    }

    fn encode_branch(
        &self,
        link: bool,
        sfx: Suffix,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let target = ctx.eval(&expr)?;
        let disp = branch_displacement(target.value, ctx.current_address() as i64, PC_AHEAD);
        let offset = range::check_displacement(buf, disp, Domain::Signed(24), 4, expr.span());
        Ok(sfx.cond << 28 | 0x0A00_0000 | (link as u32) << 24 | offset as u32)
    }

    fn encode_status_write(
        &self,
        mnemonic: &str,
        sfx: Suffix,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let (spsr, mask) = parse_psr(cursor)?;
        cursor.expect_comma()?;
        let (op2, span) = parse_operand2(cursor)?;
        cursor.expect_end()?;
        let source = match op2 {
            Operand2::Register {
                rm,
                shift: Shift::None,
            } => rm as u32,
            Operand2::Immediate(expr) => {
                let value = self.constant(&expr, ctx, buf)?;
                match encode_immediate(value) {
                    Some(enc) => 1 << 25 | enc,
                    None => {
                        buf.report(
                            AsmError::out_of_range(&format!(
                                "Immediate value 0x{value:X} cannot be encoded as a rotated 8-bit constant"
                            ))
                            .with_span(span),
                        );
                        1 << 25
                    }
                }
            }
            Operand2::Register { .. } => return Err(bad_mode(mnemonic, span)),
        };
        Ok(sfx.cond << 28 | 0x0120_F000 | (spsr as u32) << 22 | mask << 16 | source)
    }

    fn encode_address(
        &self,
        sfx: Suffix,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let rd = register(cursor)? as u32;
        cursor.expect_comma()?;
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let target = ctx.eval(&expr)?;
        let disp = branch_displacement(target.value, ctx.current_address() as i64, PC_AHEAD);
        let opcode: u32 = if disp >= 0 { 0x4 } else { 0x2 };
        let magnitude = disp.unsigned_abs();
        let enc = u32::try_from(magnitude)
            .ok()
            .and_then(encode_immediate)
            .unwrap_or_else(|| {
                buf.report(
                    AsmError::out_of_range(&format!(
                        "ADR offset {disp} cannot be encoded as a rotated 8-bit constant"
                    ))
                    .with_span(expr.span()),
                );
                0
            });
        Ok(sfx.cond << 28 | 1 << 25 | opcode << 21 | (PC as u32) << 16 | rd << 12 | enc)
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_word(
        &self,
        mnemonic: &str,
        class: Class,
        param: u32,
        sfx: Suffix,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<u32, AsmError> {
        let cond = sfx.cond << 28;
        match class {
            Class::DataProc(kind) => self.encode_data_processing(kind, param, sfx, cursor, ctx, buf),
            Class::Multiply => self.encode_multiply(mnemonic, false, param, sfx, cursor, buf),
            Class::MultiplyLong => self.encode_multiply(mnemonic, true, param, sfx, cursor, buf),
            Class::Transfer => self.encode_transfer(mnemonic, param == 1, sfx, cursor, ctx, buf),
            Class::Multiple => self.encode_multiple(param == 1, sfx, cursor),
            Class::Stack => {
                let list = parse_register_list(cursor)? as u32;
                cursor.expect_end()?;
                let base = if param == 1 { 0x08BD_0000 } else { 0x092D_0000 };
                Ok(cond | base | list)
            }
            Class::Branch => self.encode_branch(param == 1, sfx, cursor, ctx, buf),
            Class::BranchExchange => {
                let rm = register(cursor)? as u32;
                cursor.expect_end()?;
                Ok(cond | 0x012F_FF10 | rm)
            }
            Class::Interrupt => {
                cursor.eat(&TokenKind::Hash);
                let expr = parse_expr(cursor)?;
                cursor.expect_end()?;
                let value = ctx.eval(&expr)?;
                let comment =
                    range::check(buf, value.value, Domain::Unsigned(24), "SWI number", expr.span());
                Ok(cond | 0x0F00_0000 | comment as u32)
            }
            Class::Swap => {
                let rd = register(cursor)? as u32;
                cursor.expect_comma()?;
                let rm = register(cursor)? as u32;
                cursor.expect_comma()?;
                cursor.expect(&TokenKind::OpenBracket, "'['")?;
                let rn = register(cursor)? as u32;
                cursor.expect(&TokenKind::CloseBracket, "']'")?;
                cursor.expect_end()?;
                Ok(cond | 0x0100_0090 | (sfx.byte() as u32) << 22 | rn << 16 | rd << 12 | rm)
            }
            Class::StatusRead => {
                let rd = register(cursor)? as u32;
                cursor.expect_comma()?;
                let (spsr, _) = parse_psr(cursor)?;
                cursor.expect_end()?;
                Ok(cond | 0x010F_0000 | (spsr as u32) << 22 | rd << 12)
            }
            Class::StatusWrite => self.encode_status_write(mnemonic, sfx, cursor, ctx, buf),
            Class::Address => self.encode_address(sfx, cursor, ctx, buf),
            Class::Nop => {
                cursor.expect_end()?;
                Ok(NOP)
            }
        }
    }
}

impl CpuHandler for ArmHandler {
    fn encode(
        &self,
        mnemonic: &str,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> EncodeOutcome {
        let Ok(matched) = INSTRUCTION_TABLE.lookup_with(mnemonic, suffix) else {
            return EncodeOutcome::NotFound;
        };
        let sfx = Suffix::from_aux(matched.aux);
        self.encode_word(
            mnemonic,
            matched.class(),
            matched.param(),
            sfx,
            cursor,
            ctx,
            buf,
        )
        .map(|word| buf.long(word))
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembler::error::AsmErrorKind;
    use crate::core::cpu::Endianness;
    use crate::core::family::tests::{run, TestContext};

    fn encode(line: &str) -> u32 {
        let ctx = TestContext::at(0x8000);
        let (bytes, errors) = run(&ArmHandler::new(), &ctx, Endianness::Little, line)
            .unwrap_or_else(|e| panic!("{line}: {e}"));
        assert!(errors.is_empty(), "{line}: {errors:?}");
        u32::from_le_bytes(bytes.try_into().expect("one word"))
    }

    fn error(line: &str) -> AsmErrorKind {
        let ctx = TestContext::at(0x8000);
        match run(&ArmHandler::new(), &ctx, Endianness::Little, line) {
            Err(err) => err.kind(),
            Ok((_, errors)) => errors.first().map(|e| e.kind()).expect("an error"),
        }
    }

    #[test]
    fn rotated_immediates() {
        assert_eq!(encode_immediate(0x1), Some(0x001));
        assert_eq!(encode_immediate(0xFF00_0000), Some(0x4FF));
        assert_eq!(encode_immediate(0x101), None);
    }

    #[test]
    fn data_processing() {
        assert_eq!(encode("MOV R0, #1"), 0xE3A0_0001);
        assert_eq!(encode("MOVEQ R0, #1"), 0x03A0_0001);
        assert_eq!(encode("MOVS R1, R2"), 0xE1B0_1002);
        assert_eq!(encode("MOV R0, #0xFF000000"), 0xE3A0_04FF);
        assert_eq!(encode("ADD R0, R1, R2, LSL #3"), 0xE081_0182);
        assert_eq!(encode("ADD R0, R1, R2, LSR R3"), 0xE081_0332);
        assert_eq!(encode("ADDEQS R0, R0, #1"), 0x0290_0001);
        assert_eq!(encode("ADD R0, #1"), 0xE280_0001);
        assert_eq!(encode("CMP R1, R2"), 0xE151_0002);
        assert_eq!(encode("TST R0, #0x80"), 0xE310_0080);
        assert_eq!(encode("MOV R1, R2, RRX"), 0xE1A0_1062);
    }

    #[test]
    fn immediate_substitution() {
        assert_eq!(encode("MOV R0, #-1"), 0xE3E0_0000);
        assert_eq!(encode("ADD R0, R1, #-4"), 0xE241_0004);
        assert_eq!(encode("CMP R0, #-1"), 0xE370_0001);
        assert_eq!(encode("AND R0, R0, #0xFFFFFF00"), 0xE3C0_00FF);
        assert_eq!(error("MOV R0, #0x101"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn multiplies() {
        assert_eq!(encode("MUL R0, R1, R2"), 0xE000_0291);
        assert_eq!(encode("MLA R0, R1, R2, R3"), 0xE020_3291);
        assert_eq!(encode("UMULL R0, R1, R2, R3"), 0xE081_0392);
        assert_eq!(encode("SMLALS R0, R1, R2, R3"), 0xE0F1_0392);
        assert_eq!(error("MUL PC, R1, R2"), AsmErrorKind::IllegalOperand);
    }

    #[test]
    fn single_transfers() {
        assert_eq!(encode("LDR R0, [R1]"), 0xE591_0000);
        assert_eq!(encode("LDR R0, [R1, #4]!"), 0xE5B1_0004);
        assert_eq!(encode("LDR R0, [R1], #-4"), 0xE411_0004);
        assert_eq!(encode("STRB R2, [R3, -R4, LSL #2]"), 0xE743_2104);
        assert_eq!(encode("LDRT R0, [R1], #4"), 0xE4B1_0004);
        assert_eq!(encode("LDR R0, 0x8010"), 0xE59F_0008);
        assert_eq!(encode("LDR R0, =0xFF"), 0xE3A0_00FF);
        assert_eq!(encode("LDR R0, =0xFFFFFFFF"), 0xE3E0_0000);
        assert_eq!(error("LDRT R0, [R1, #4]"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LDR R0, =0x12345678"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LDR R0, [R1, #4096]"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(
            error("LDR R0, [R1, #-$8000000000000000]"),
            AsmErrorKind::OperandOutOfRange
        );
    }

    #[test]
    fn halfword_transfers() {
        assert_eq!(encode("LDRH R0, [R1, #6]"), 0xE1D1_00B6);
        assert_eq!(encode("STRH R0, [R1], -R2"), 0xE001_00B2);
        assert_eq!(encode("LDRSB R0, [R1]"), 0xE1D1_00D0);
        assert_eq!(encode("LDRSH R3, [R4, #-2]"), 0xE154_30F2);
        assert_eq!(error("LDRH R0, [R1, #256]"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn block_transfers() {
        assert_eq!(encode("LDMIA R0!, {R1-R3}"), 0xE8B0_000E);
        assert_eq!(encode("STMFD SP!, {R4, LR}"), 0xE92D_4010);
        assert_eq!(encode("LDMFD SP!, {R4, PC}^"), 0xE8FD_8010);
        assert_eq!(encode("PUSH {R0, LR}"), 0xE92D_4001);
        assert_eq!(encode("POP {R0, PC}"), 0xE8BD_8001);
    }

    #[test]
    fn branches() {
        assert_eq!(encode("B 0x8000"), 0xEAFF_FFFE);
        assert_eq!(encode("BL 0x8010"), 0xEB00_0002);
        assert_eq!(encode("BNE 0x8004"), 0x1AFF_FFFF);
        assert_eq!(encode("BX LR"), 0xE12F_FF1E);
        assert_eq!(error("B 0x8002"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(error("BEQ 0x4008000"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(error("B -$8000000000000000"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(error("BL $7FFFFFFFFFFFFFFF"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn system_instructions() {
        assert_eq!(encode("SWI 0x123456"), 0xEF12_3456);
        assert_eq!(encode("SVC #0"), 0xEF00_0000);
        assert_eq!(encode("SWPB R0, R1, [R2]"), 0xE142_0091);
        assert_eq!(encode("MRS R0, CPSR"), 0xE10F_0000);
        assert_eq!(encode("MRS R1, SPSR"), 0xE14F_1000);
        assert_eq!(encode("MSR CPSR_f, #0xF0000000"), 0xE328_F20F);
        assert_eq!(encode("MSR SPSR_fc, R0"), 0xE169_F000);
        assert_eq!(encode("ADR R0, 0x8010"), 0xE28F_0008);
        assert_eq!(encode("ADR R0, 0x7FF0"), 0xE24F_0018);
        assert_eq!(error("ADR R0, -$8000000000000000"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(encode("NOP"), NOP);
    }
}
