// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 family handler implementation.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::expr::{parse_expr, Expr, Value};
use crate::core::family::{AssemblerContext, CpuHandler, EncodeOutcome};
use crate::core::range::{self, Domain};
use crate::core::select::{branch_displacement, select_width, Candidate, SizeForce};
use crate::core::state::CpuState;
use crate::core::tokenizer::{Span, TokenKind};
use crate::families::mos6502::operand::{
    parse_operand, select_part, AddressMode, Index, IndirectIndex, OperandForm,
};
use crate::families::mos6502::table::{
    bit_suffix, Class, ImmWidth, Ops, Variant, FAMILY_INSTRUCTION_TABLE,
};
use crate::m65816::state as m65816_state;

const DIRECT: Domain = Domain::Unsigned(8);
const ABSOLUTE: Domain = Domain::Unsigned(16);
const LONG: Domain = Domain::Unsigned(24);

/// Handler for one CPU of the MOS 6502 family.
#[derive(Debug, Clone, Copy)]
pub struct MOS6502Handler {
    variant: Variant,
}

impl MOS6502Handler {
    pub const fn new(variant: Variant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Number of immediate bytes under the current register widths.
    fn immediate_bytes(&self, width: ImmWidth, state: &CpuState) -> usize {
        if self.variant != Variant::M65816 {
            return 1;
        }
        match width {
            ImmWidth::Accumulator if m65816_state::accumulator_is_16bit(state) => 2,
            ImmWidth::Index if m65816_state::index_is_16bit(state) => 2,
            _ => 1,
        }
    }

    fn opcode(&self, mnemonic: &str, ops: &Ops, mode: AddressMode) -> Result<u8, AsmError> {
        if let Some(opcode) = ops.find(mode, self.variant) {
            return Ok(opcode);
        }
        if ops.has_mode(mode) {
            return Err(AsmError::bad_mode(&format!(
                "{mode:?} addressing for {mnemonic} is not available on the {}",
                self.variant.name()
            )));
        }
        Err(AsmError::bad_mode(&format!(
            "Invalid addressing mode for {mnemonic}"
        )))
    }

    fn encode_memory(
        &self,
        mnemonic: &str,
        ops: &Ops,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let form = parse_operand(cursor)?;
        cursor.expect_end()?;
        let span = form.span();

        let (expr, force, modes): (Expr, SizeForce, &[(AddressMode, u8, Domain)]) = match form {
            OperandForm::None => {
                let mode = if ops.has_mode(AddressMode::Implied) {
                    AddressMode::Implied
                } else if ops.has_mode(AddressMode::Accumulator) {
                    AddressMode::Accumulator
                } else {
                    return Err(AsmError::missing_operand().with_span(cursor.span()));
                };
                buf.byte(self.opcode(mnemonic, ops, mode)?);
                return Ok(());
            }
            OperandForm::Accumulator(span) => {
                if !ops.has_mode(AddressMode::Accumulator) {
                    return Err(AsmError::illegal_operand(&format!(
                        "Register A not allowed for {mnemonic}"
                    ))
                    .with_span(span));
                }
                buf.byte(self.opcode(mnemonic, ops, AddressMode::Accumulator)?);
                return Ok(());
            }
            OperandForm::Immediate { expr, part } => {
                let opcode = self
                    .opcode(mnemonic, ops, AddressMode::Immediate)
                    .map_err(|err| err.with_span(span))?;
                let value = ctx.eval(&select_part(expr, part))?;
                let bytes = self.immediate_bytes(ops.imm, ctx.state());
                buf.byte(opcode);
                if bytes == 2 {
                    let v = range::check(buf, value.value, Domain::WORD, "Immediate value", span);
                    buf.word(v as u16);
                } else {
                    let v = range::check(buf, value.value, Domain::BYTE, "Immediate value", span);
                    buf.byte(v as u8);
                }
                return Ok(());
            }
            OperandForm::Direct { expr, force, index } => {
                let modes: &[(AddressMode, u8, Domain)] = match index {
                    Index::None => &[
                        (AddressMode::ZeroPage, 0, DIRECT),
                        (AddressMode::Absolute, 1, ABSOLUTE),
                        (AddressMode::AbsoluteLong, 2, LONG),
                    ],
                    Index::X => &[
                        (AddressMode::ZeroPageX, 0, DIRECT),
                        (AddressMode::AbsoluteX, 1, ABSOLUTE),
                        (AddressMode::AbsoluteLongX, 2, LONG),
                    ],
                    Index::Y => &[
                        (AddressMode::ZeroPageY, 0, DIRECT),
                        (AddressMode::AbsoluteY, 1, ABSOLUTE),
                    ],
                    Index::S => &[(AddressMode::StackRelative, 0, DIRECT)],
                };
                (expr, force, modes)
            }
            OperandForm::Indirect { expr, force, index } => {
                let modes: &[(AddressMode, u8, Domain)] = match index {
                    IndirectIndex::None => &[
                        (AddressMode::ZeroPageIndirect, 0, DIRECT),
                        (AddressMode::Indirect, 1, ABSOLUTE),
                    ],
                    IndirectIndex::PreX => &[
                        (AddressMode::IndexedIndirectX, 0, DIRECT),
                        (AddressMode::AbsoluteIndexedIndirect, 1, ABSOLUTE),
                    ],
                    IndirectIndex::PostY => &[(AddressMode::IndirectIndexedY, 0, DIRECT)],
                    IndirectIndex::StackY => {
                        &[(AddressMode::StackRelativeIndirectY, 0, DIRECT)]
                    }
                };
                (expr, force, modes)
            }
            OperandForm::IndirectLong { expr, force, y } => {
                let modes: &[(AddressMode, u8, Domain)] = if y {
                    &[(AddressMode::DirectIndirectLongY, 0, DIRECT)]
                } else {
                    &[
                        (AddressMode::DirectIndirectLong, 0, DIRECT),
                        (AddressMode::AbsoluteIndirectLong, 1, ABSOLUTE),
                    ]
                };
                (expr, force, modes)
            }
        };

        let in_family: Vec<_> = modes.iter().filter(|(m, _, _)| ops.has_mode(*m)).collect();
        if in_family.is_empty() {
            return Err(AsmError::bad_mode(&format!(
                "Invalid addressing mode for {mnemonic}"
            ))
            .with_span(span));
        }
        let on_cpu: Vec<_> = in_family
            .iter()
            .filter(|(m, _, _)| ops.find(*m, self.variant).is_some())
            .collect();
        if on_cpu.is_empty() {
            return Err(AsmError::bad_mode(&format!(
                "Addressing mode for {mnemonic} is not available on the {}",
                self.variant.name()
            ))
            .with_span(span));
        }

        let value = ctx.eval(&expr)?;
        let candidates = self.candidates(&on_cpu, value, force);
        let selection = select_width(value, force, &candidates).map_err(|e| e.with_span(span))?;
        let opcode = self.opcode(mnemonic, ops, selection.width)?;
        let v = range::check(buf, value.value, selection.domain, "Address", span);

        buf.byte(opcode);
        match selection.width.operand_size() {
            1 => buf.byte(v as u8),
            2 => buf.word(v as u16),
            _ => buf.triple(v as u32),
        }
        Ok(())
    }

    /// Width candidates for a direct operand. Long forms only take part when
    /// forced with `>>` or when a known value needs them; a forward reference
    /// stays 16-bit. Absolute addresses the data bank (DBR) while long is a
    /// flat 24-bit address, so they are separate mode families and the widest
    /// form for a forward reference is absolute, not long.
    fn candidates(
        &self,
        modes: &[&&(AddressMode, u8, Domain)],
        value: Value,
        force: SizeForce,
    ) -> Vec<Candidate<AddressMode>> {
        let wants_long = force == SizeForce::ExtraLong
            || (value.known && !ABSOLUTE.contains(value.value))
            || modes.len() == 1;
        modes
            .iter()
            .filter(|(mode, _, _)| {
                wants_long
                    || !matches!(mode, AddressMode::AbsoluteLong | AddressMode::AbsoluteLongX)
            })
            .map(|(mode, rank, domain)| Candidate::new(*mode, *rank, *domain))
            .collect()
    }

    fn encode_branch(
        &self,
        opcode: u8,
        long: bool,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let target = ctx.eval(&expr)?;
        let origin = ctx.current_address() as i64;
        buf.byte(opcode);
        if long {
            let disp = branch_displacement(target.value, origin, 3);
            let v = range::check_displacement(buf, disp, Domain::Signed(16), 1, expr.span());
            buf.word(v as u16);
        } else {
            let disp = branch_displacement(target.value, origin, 2);
            let v = range::check_displacement(buf, disp, Domain::Signed(8), 1, expr.span());
            buf.byte(v as u8);
        }
        Ok(())
    }

    fn encode_bit_op(
        &self,
        class: Class,
        opcode: u8,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let zp_expr = parse_expr(cursor)?;
        let zp = ctx.eval(&zp_expr)?;
        buf.byte(opcode);
        let v = range::check(buf, zp.value, DIRECT, "Zero page address", zp_expr.span());
        buf.byte(v as u8);
        if class == Class::BitBranch {
            cursor.expect_comma()?;
            let target_expr = parse_expr(cursor)?;
            let target = ctx.eval(&target_expr)?;
            let disp = branch_displacement(target.value, ctx.current_address() as i64, 3);
            let v = range::check_displacement(buf, disp, Domain::Signed(8), 1, target_expr.span());
            buf.byte(v as u8);
        }
        cursor.expect_end()
    }

    fn encode_block_move(
        &self,
        opcode: u8,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let bank = |cursor: &mut TokenCursor| -> Result<(i64, Span), AsmError> {
            cursor.eat(&TokenKind::Hash);
            let expr = parse_expr(cursor)?;
            let value = ctx.eval(&expr)?.value;
            // A full address selects its bank.
            let bank = if value > 0xFF { value >> 16 } else { value };
            Ok((bank, expr.span()))
        };
        let (src, src_span) = bank(cursor)?;
        cursor.expect_comma()?;
        let (dst, dst_span) = bank(cursor)?;
        cursor.expect_end()?;
        buf.byte(opcode);
        let dst = range::check(buf, dst, DIRECT, "Bank", dst_span);
        let src = range::check(buf, src, DIRECT, "Bank", src_span);
        buf.byte(dst as u8);
        buf.byte(src as u8);
        Ok(())
    }
}

impl CpuHandler for MOS6502Handler {
    fn encode(
        &self,
        mnemonic: &str,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> EncodeOutcome {
        let Ok(matched) = FAMILY_INSTRUCTION_TABLE.lookup_with(mnemonic, bit_suffix) else {
            return EncodeOutcome::NotFound;
        };
        let ops = matched.param();
        if !ops.supported_by(self.variant) {
            return EncodeOutcome::NotApplicable;
        }
        let bit = matched.aux.unwrap_or(0) as u8;
        let result = match matched.class() {
            Class::Memory => self.encode_memory(mnemonic, &ops, cursor, ctx, buf),
            Class::Branch => self.encode_branch(ops.base(), false, cursor, ctx, buf),
            Class::BranchLong => self.encode_branch(ops.base(), true, cursor, ctx, buf),
            Class::BitBranch | Class::BitZeroPage => {
                self.encode_bit_op(matched.class(), ops.base() | (bit << 4), cursor, ctx, buf)
            }
            Class::BlockMove => self.encode_block_move(ops.base(), cursor, ctx, buf),
        };
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembler::error::AsmErrorKind;
    use crate::core::cpu::Endianness;
    use crate::core::family::tests::{run, TestContext};

    fn bytes(variant: Variant, ctx: &TestContext, line: &str) -> Vec<u8> {
        let (bytes, errors) = run(&MOS6502Handler::new(variant), ctx, Endianness::Little, line)
            .unwrap_or_else(|e| panic!("{line}: {e}"));
        assert!(errors.is_empty(), "{line}: {errors:?}");
        bytes
    }

    fn nmos(line: &str) -> Vec<u8> {
        bytes(Variant::M6502, &TestContext::at(0x1000), line)
    }

    #[test]
    fn selects_zero_page_for_small_known_values() {
        assert_eq!(nmos("LDA #$FF"), [0xA9, 0xFF]);
        assert_eq!(nmos("LDA $10"), [0xA5, 0x10]);
        assert_eq!(nmos("LDA $1234"), [0xAD, 0x34, 0x12]);
        assert_eq!(nmos("LDA $10,X"), [0xB5, 0x10]);
        assert_eq!(nmos("LDX $10,Y"), [0xB6, 0x10]);
        assert_eq!(nmos("LDA $10,Y"), [0xB9, 0x10, 0x00]);
    }

    #[test]
    fn forward_reference_takes_absolute() {
        let mut ctx = TestContext::at(0x1000);
        ctx.symbols.forward.insert("later".into(), 0x20);
        let handler = MOS6502Handler::new(Variant::M6502);
        let (b, errors) = run(&handler, &ctx, Endianness::Little, "LDA later").unwrap();
        assert_eq!(b, [0xAD, 0x20, 0x00]);
        assert!(errors.is_empty());
    }

    #[test]
    fn size_force_overrides() {
        assert_eq!(nmos("LDA >$10"), [0xAD, 0x10, 0x00]);
        let handler = MOS6502Handler::new(Variant::M6502);
        let (b, errors) =
            run(&handler, &TestContext::new(), Endianness::Little, "LDA <$1234").unwrap();
        assert_eq!(b, [0xA5, 0x34]);
        assert_eq!(errors[0].kind(), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn indirect_modes() {
        assert_eq!(nmos("LDA ($20,X)"), [0xA1, 0x20]);
        assert_eq!(nmos("LDA ($20),Y"), [0xB1, 0x20]);
        assert_eq!(nmos("JMP ($1234)"), [0x6C, 0x34, 0x12]);
        assert_eq!(nmos("JMP ($12)"), [0x6C, 0x12, 0x00]);
        let ctx = TestContext::new();
        assert_eq!(bytes(Variant::M65C02, &ctx, "LDA ($20)"), [0xB2, 0x20]);
        assert_eq!(bytes(Variant::M65C02, &ctx, "JMP ($1234,X)"), [0x7C, 0x34, 0x12]);
    }

    #[test]
    fn accumulator_and_implied() {
        assert_eq!(nmos("ASL"), [0x0A]);
        assert_eq!(nmos("ASL A"), [0x0A]);
        assert_eq!(nmos("RTS"), [0x60]);
        let ctx = TestContext::new();
        assert_eq!(bytes(Variant::M65C02, &ctx, "INC A"), [0x1A]);
    }

    #[test]
    fn immediate_selectors() {
        let mut ctx = TestContext::at(0);
        ctx.symbols.known.insert("vec".into(), 0x12_3456);
        let v = Variant::M65816;
        assert_eq!(bytes(v, &ctx, "LDA #<vec"), [0xA9, 0x56]);
        assert_eq!(bytes(v, &ctx, "LDA #>vec"), [0xA9, 0x34]);
        assert_eq!(bytes(v, &ctx, "LDA #^vec"), [0xA9, 0x12]);
    }

    #[test]
    fn branches_measure_from_instruction_end() {
        assert_eq!(nmos("BEQ $1010"), [0xF0, 0x0E]);
        assert_eq!(nmos("BNE $1000"), [0xD0, 0xFE]);
        let handler = MOS6502Handler::new(Variant::M6502);
        let (b, errors) =
            run(&handler, &TestContext::at(0x1000), Endianness::Little, "BEQ $1082").unwrap();
        assert_eq!(b.len(), 2);
        assert_eq!(errors[0].kind(), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn bit_instructions_use_digit_suffix() {
        let ctx = TestContext::at(0x200);
        assert_eq!(bytes(Variant::M65C02, &ctx, "RMB3 $12"), [0x37, 0x12]);
        assert_eq!(bytes(Variant::M65C02, &ctx, "BBS7 $12,$205"), [0xFF, 0x12, 0x02]);
    }

    #[test]
    fn cpu_gating_reports_not_applicable() {
        let handler = MOS6502Handler::new(Variant::M6502);
        let mut cursor = TokenCursor::from_line("", 1).unwrap();
        let mut buf = InstructionBuffer::new(Endianness::Little);
        let outcome = handler.encode("PHX", &mut cursor, &TestContext::new(), &mut buf);
        assert!(matches!(outcome, EncodeOutcome::NotApplicable));
        let outcome = handler.encode("FOO", &mut cursor, &TestContext::new(), &mut buf);
        assert!(matches!(outcome, EncodeOutcome::NotFound));
    }

    #[test]
    fn mode_missing_on_cpu_is_bad_mode() {
        let handler = MOS6502Handler::new(Variant::M6502);
        let err = run(&handler, &TestContext::new(), Endianness::Little, "LDA ($20)")
            .unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::BadAddressingMode);
        let err = run(&handler, &TestContext::new(), Endianness::Little, "STA #1").unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::BadAddressingMode);
        let err = run(&handler, &TestContext::new(), Endianness::Little, "LDA A").unwrap_err();
        assert_eq!(err.kind(), AsmErrorKind::IllegalOperand);
    }

    #[test]
    fn long_modes_on_65816() {
        let ctx = TestContext::new();
        let v = Variant::M65816;
        assert_eq!(bytes(v, &ctx, "LDA $123456"), [0xAF, 0x56, 0x34, 0x12]);
        assert_eq!(bytes(v, &ctx, "LDA >>$12"), [0xAF, 0x12, 0x00, 0x00]);
        assert_eq!(bytes(v, &ctx, "LDA $1234,X"), [0xBD, 0x34, 0x12]);
        assert_eq!(bytes(v, &ctx, "LDA [$10],Y"), [0xB7, 0x10]);
        assert_eq!(bytes(v, &ctx, "LDA 3,S"), [0xA3, 0x03]);
        assert_eq!(bytes(v, &ctx, "LDA (3,S),Y"), [0xB3, 0x03]);
        assert_eq!(bytes(v, &ctx, "JML [$1234]"), [0xDC, 0x34, 0x12]);
        assert_eq!(bytes(v, &ctx, "JSL $018000"), [0x22, 0x00, 0x80, 0x01]);
        assert_eq!(bytes(v, &ctx, "MVN $01,$02"), [0x54, 0x02, 0x01]);
        assert_eq!(bytes(v, &ctx, "REP #$30"), [0xC2, 0x30]);
    }

    #[test]
    fn forward_reference_on_65816_stays_absolute() {
        let mut ctx = TestContext::new();
        ctx.symbols.forward.insert("later".into(), 0x20);
        let (b, _) = run(
            &MOS6502Handler::new(Variant::M65816),
            &ctx,
            Endianness::Little,
            "JMP later",
        )
        .unwrap();
        assert_eq!(b, [0x4C, 0x20, 0x00]);
    }

    #[test]
    fn long_branch() {
        let ctx = TestContext::at(0x8000);
        assert_eq!(bytes(Variant::M65816, &ctx, "BRL $9003"), [0x82, 0x00, 0x10]);
    }
}
