// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 68000 handler implementation.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::expr::parse_expr;
use crate::core::family::{AssemblerContext, CpuHandler, EncodeOutcome};
use crate::core::range::{self, Domain};
use crate::core::select::{branch_displacement, select_branch, BranchCandidate, SizeForce};
use crate::core::text_utils::split_size_suffix;
use crate::core::tokenizer::Span;

use super::operand::{
    at_register_list, category, parse_ea, parse_register_list, Ea, Size, Special,
};
use super::table::{condition_suffix, AluKind, Class, Op, INSTRUCTION_TABLE};

const LONG: Domain = Domain::Either(32);

/// Extension words of a resolved effective address.
#[derive(Debug, Clone, Copy)]
enum Ext {
    None,
    Word(u16),
    Long(u32),
    /// PC-relative displacement, measured from the extension word itself.
    /// `brief` carries the index bits of the `d8(PC,Xn)` form.
    PcRelative { target: i64, brief: Option<u16> },
}

/// An effective address reduced to its 6-bit mode/register field.
#[derive(Debug, Clone, Copy)]
struct Field {
    bits: u16,
    ext: Ext,
    span: Span,
}

impl Field {
    /// The field rearranged as a `MOVE` destination (register, then mode).
    fn as_destination(&self) -> u16 {
        ((self.bits & 7) << 9) | ((self.bits >> 3) << 6)
    }
}

/// Absolute short addresses are sign-extended to 32 bits.
fn fits_short(value: i64) -> bool {
    Domain::Signed(16).contains(value) || (0xFFFF_8000..=0xFFFF_FFFF).contains(&value)
}

#[derive(Debug, Default)]
pub struct M68kHandler;

struct Line<'a> {
    mnemonic: &'a str,
    op: Op,
    suffix: Option<char>,
}

impl Line<'_> {
    fn size(&self) -> Result<Size, AsmError> {
        let Some(suffix) = self.suffix else {
            return Ok(self.op.sizes.default_size());
        };
        Size::from_suffix(suffix)
            .filter(|size| self.op.sizes.allows(*size))
            .ok_or_else(|| {
                AsmError::bad_mode(&format!("Invalid size .{suffix} for {}", self.mnemonic))
            })
    }

    fn bad_mode(&self, span: Span) -> AsmError {
        AsmError::bad_mode(&format!("Invalid addressing mode for {}", self.mnemonic))
            .with_span(span)
    }

    fn require(&self, ea: &Ea, field: &Field, categories: u8) -> Result<(), AsmError> {
        if ea.is(categories) {
            Ok(())
        } else {
            Err(self.bad_mode(field.span))
        }
    }
}

impl M68kHandler {
    pub const fn new() -> Self {
        Self
    }

    fn resolve(
        &self,
        ea: &Ea,
        size: Size,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
        span: Span,
    ) -> Result<Field, AsmError> {
        let field = |bits: u16, ext: Ext| Field { bits, ext, span };
        Ok(match ea {
            Ea::DataReg(n) => field(*n as u16, Ext::None),
            Ea::AddrReg(n) => field(0o10 | *n as u16, Ext::None),
            Ea::Indirect(n) => field(0o20 | *n as u16, Ext::None),
            Ea::PostInc(n) => field(0o30 | *n as u16, Ext::None),
            Ea::PreDec(n) => field(0o40 | *n as u16, Ext::None),
            Ea::Displacement { disp, reg } => {
                let value = ctx.eval(disp)?;
                let d = range::check(buf, value.value, Domain::Signed(16), "Displacement", disp.span());
                field(0o50 | *reg as u16, Ext::Word(d as u16))
            }
            Ea::Indexed { disp, reg, index } => {
                let d = match disp {
                    Some(disp) => {
                        let value = ctx.eval(disp)?;
                        range::check(buf, value.value, Domain::Signed(8), "Displacement", disp.span())
                    }
                    None => 0,
                };
                field(0o60 | *reg as u16, Ext::Word(index.bits() | (d as u16 & 0xFF)))
            }
            Ea::Absolute { addr, size } => {
                let value = ctx.eval(addr)?;
                let short = match size {
                    Some(size) => *size == Size::Word,
                    None => value.known && fits_short(value.value),
                };
                if short {
                    if !fits_short(value.value) {
                        buf.report(
                            AsmError::out_of_range(&format!(
                                "Absolute short address out of range: {}",
                                value.value
                            ))
                            .with_span(addr.span()),
                        );
                    }
                    field(0o70, Ext::Word(value.value as u16))
                } else {
                    let v = range::check(buf, value.value, LONG, "Address", addr.span());
                    field(0o71, Ext::Long(v as u32))
                }
            }
            Ea::PcDisplacement { target } => {
                let value = ctx.eval(target)?;
                field(
                    0o72,
                    Ext::PcRelative {
                        target: value.value,
                        brief: None,
                    },
                )
            }
            Ea::PcIndexed { target, index } => {
                let value = ctx.eval(target)?;
                field(
                    0o73,
                    Ext::PcRelative {
                        target: value.value,
                        brief: Some(index.bits()),
                    },
                )
            }
            Ea::Immediate(expr) => {
                let value = ctx.eval(expr)?;
                let ext = match size {
                    Size::Byte => Ext::Word(
                        range::check(buf, value.value, Domain::BYTE, "Immediate value", expr.span())
                            as u16,
                    ),
                    Size::Word => Ext::Word(
                        range::check(buf, value.value, Domain::WORD, "Immediate value", expr.span())
                            as u16,
                    ),
                    Size::Long => Ext::Long(
                        range::check(buf, value.value, LONG, "Immediate value", expr.span()) as u32,
                    ),
                };
                field(0o74, ext)
            }
            Ea::Special(_) => {
                return Err(AsmError::bad_mode("Status register not allowed here").with_span(span))
            }
        })
    }

    fn emit_ext(&self, buf: &mut InstructionBuffer, field: &Field, ctx: &dyn AssemblerContext) {
        match field.ext {
            Ext::None => {}
            Ext::Word(word) => buf.word(word),
            Ext::Long(long) => buf.long(long),
            Ext::PcRelative { target, brief } => {
                let pc = ctx.current_address() as i64 + buf.len() as i64;
                let disp = target.saturating_sub(pc);
                match brief {
                    None => {
                        let d = range::check(buf, disp, Domain::Signed(16), "PC displacement", field.span);
                        buf.word(d as u16);
                    }
                    Some(index) => {
                        let d = range::check(buf, disp, Domain::Signed(8), "PC displacement", field.span);
                        buf.word(index | d as u16);
                    }
                }
            }
        }
    }

    /// Emit `opcode` followed by the extension words of `fields`, in order.
    fn emit(
        &self,
        buf: &mut InstructionBuffer,
        opcode: u16,
        fields: &[&Field],
        ctx: &dyn AssemblerContext,
    ) {
        buf.word(opcode);
        for field in fields {
            self.emit_ext(buf, field, ctx);
        }
    }

    fn operand(
        &self,
        cursor: &mut TokenCursor,
        size: Size,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(Ea, Field), AsmError> {
        let start = cursor.span();
        let ea = parse_ea(cursor)?;
        let span = start.join(cursor.prev_span());
        let field = self.resolve(&ea, size, ctx, buf, span)?;
        Ok((ea, field))
    }

    /// Parse `src,dst` with the span of each operand.
    fn pair(&self, cursor: &mut TokenCursor) -> Result<(Ea, Span, Ea, Span), AsmError> {
        let start = cursor.span();
        let src = parse_ea(cursor)?;
        let src_span = start.join(cursor.prev_span());
        cursor.expect_comma()?;
        let start = cursor.span();
        let dst = parse_ea(cursor)?;
        let dst_span = start.join(cursor.prev_span());
        cursor.expect_end()?;
        Ok((src, src_span, dst, dst_span))
    }

    fn encode_move(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let (src, src_span, dst, dst_span) = self.pair(cursor)?;

        match (&src, &dst) {
            (Ea::Special(Special::Sr), _) => {
                let dst_field = self.resolve(&dst, Size::Word, ctx, buf, dst_span)?;
                line.require(&dst, &dst_field, category::DATA_ALTERABLE)?;
                self.emit(buf, 0x40C0 | dst_field.bits, &[&dst_field], ctx);
                return Ok(());
            }
            (_, Ea::Special(special @ (Special::Sr | Special::Ccr))) => {
                let src_field = self.resolve(&src, Size::Word, ctx, buf, src_span)?;
                line.require(&src, &src_field, category::DATA)?;
                let base = if *special == Special::Sr { 0x46C0 } else { 0x44C0 };
                self.emit(buf, base | src_field.bits, &[&src_field], ctx);
                return Ok(());
            }
            (Ea::Special(Special::Usp), Ea::AddrReg(n)) => {
                buf.word(0x4E68 | *n as u16);
                return Ok(());
            }
            (Ea::AddrReg(n), Ea::Special(Special::Usp)) => {
                buf.word(0x4E60 | *n as u16);
                return Ok(());
            }
            (Ea::Special(_), _) | (_, Ea::Special(_)) => return Err(line.bad_mode(src_span)),
            _ => {}
        }

        if let Ea::AddrReg(n) = dst {
            return self.move_address(line, size, &src, src_span, n, ctx, buf);
        }

        let src_field = self.resolve(&src, size, ctx, buf, src_span)?;
        let dst_field = self.resolve(&dst, size, ctx, buf, dst_span)?;
        line.require(&dst, &dst_field, category::DATA_ALTERABLE)?;
        if size == Size::Byte && matches!(src, Ea::AddrReg(_)) {
            return Err(line.bad_mode(src_span));
        }
        let code = match size {
            Size::Byte => 0x1000,
            Size::Long => 0x2000,
            Size::Word => 0x3000,
        };
        let opcode = code | dst_field.as_destination() | src_field.bits;
        self.emit(buf, opcode, &[&src_field, &dst_field], ctx);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn move_address(
        &self,
        line: &Line<'_>,
        size: Size,
        src: &Ea,
        src_span: Span,
        reg: u8,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let code = match size {
            Size::Word => 0x3000,
            Size::Long => 0x2000,
            Size::Byte => {
                return Err(AsmError::bad_mode(&format!(
                    "Byte size not allowed for {} to an address register",
                    line.mnemonic
                ))
                .with_span(src_span))
            }
        };
        let src_field = self.resolve(src, size, ctx, buf, src_span)?;
        self.emit(buf, code | 0x0040 | (reg as u16) << 9 | src_field.bits, &[&src_field], ctx);
        Ok(())
    }

    fn encode_move_multiple(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let long = if size == Size::Long { 0x0040 } else { 0 };

        let (to_registers, mask, ea, field) = if at_register_list(cursor) {
            let (mask, _) = parse_register_list(cursor)?;
            cursor.expect_comma()?;
            let (ea, field) = self.operand(cursor, size, ctx, buf)?;
            let ok = matches!(ea, Ea::PreDec(_)) || ea.is(category::CONTROL | category::ALTERABLE);
            if !ok {
                return Err(line.bad_mode(field.span));
            }
            (false, mask, ea, field)
        } else {
            let (ea, field) = self.operand(cursor, size, ctx, buf)?;
            cursor.expect_comma()?;
            let (mask, _) = parse_register_list(cursor)?;
            if !(matches!(ea, Ea::PostInc(_)) || ea.is(category::CONTROL)) {
                return Err(line.bad_mode(field.span));
            }
            (true, mask, ea, field)
        };
        cursor.expect_end()?;

        // Predecrement stores list A7 first.
        let mask = if matches!(ea, Ea::PreDec(_)) {
            mask.reverse_bits()
        } else {
            mask
        };
        let direction = if to_registers { 0x0400 } else { 0 };
        buf.word(line.op.base | direction | long | field.bits);
        buf.word(mask);
        self.emit_ext(buf, &field, ctx);
        Ok(())
    }

    fn encode_alu(
        &self,
        line: &Line<'_>,
        kind: AluKind,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let (src, src_span, dst, dst_span) = self.pair(cursor)?;
        let op = line.op;

        if let Ea::Special(special) = dst {
            if !matches!(kind, AluKind::Logic | AluKind::Exclusive)
                || !matches!(src, Ea::Immediate(_))
            {
                return Err(line.bad_mode(dst_span));
            }
            return self.immediate_to_status(op.alt, special, &src, src_span, ctx, buf);
        }

        if let (Ea::AddrReg(n), AluKind::Arith | AluKind::Compare) = (&dst, kind) {
            if size == Size::Byte {
                return Err(line.bad_mode(dst_span));
            }
            let src_field = self.resolve(&src, size, ctx, buf, src_span)?;
            let long = if size == Size::Long { 0x0100 } else { 0 };
            let opcode = op.base | 0x00C0 | long | (*n as u16) << 9 | src_field.bits;
            self.emit(buf, opcode, &[&src_field], ctx);
            return Ok(());
        }

        let immediate_form = matches!(src, Ea::Immediate(_))
            && (kind == AluKind::Exclusive || !matches!(dst, Ea::DataReg(_)));
        if immediate_form {
            return self.alu_immediate(line, op.alt, size, &src, src_span, &dst, dst_span, ctx, buf);
        }

        let src_field = self.resolve(&src, size, ctx, buf, src_span)?;
        let dst_field = self.resolve(&dst, size, ctx, buf, dst_span)?;
        let size_bits = size.bits() << 6;

        match (&dst, &src) {
            (Ea::DataReg(n), _) if kind != AluKind::Exclusive => {
                let allowed = match kind {
                    AluKind::Logic => src.is(category::DATA),
                    _ => !(size == Size::Byte && matches!(src, Ea::AddrReg(_))),
                };
                if !allowed {
                    return Err(line.bad_mode(src_span));
                }
                let opcode = op.base | (*n as u16) << 9 | size_bits | src_field.bits;
                self.emit(buf, opcode, &[&src_field], ctx);
            }
            (_, Ea::DataReg(n)) if kind != AluKind::Compare => {
                let required = if kind == AluKind::Exclusive {
                    category::DATA_ALTERABLE
                } else {
                    category::MEMORY_ALTERABLE
                };
                line.require(&dst, &dst_field, required)?;
                let opcode = op.base | 0x0100 | (*n as u16) << 9 | size_bits | dst_field.bits;
                self.emit(buf, opcode, &[&dst_field], ctx);
            }
            _ => return Err(line.bad_mode(src_span.join(dst_span))),
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn alu_immediate(
        &self,
        line: &Line<'_>,
        base: u16,
        size: Size,
        src: &Ea,
        src_span: Span,
        dst: &Ea,
        dst_span: Span,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        if !matches!(src, Ea::Immediate(_)) {
            return Err(line.bad_mode(src_span));
        }
        if let Ea::Special(special) = dst {
            // Only ANDI, ORI and EORI reach the status register.
            if !matches!(base, 0x0000 | 0x0200 | 0x0A00) {
                return Err(line.bad_mode(dst_span));
            }
            return self.immediate_to_status(base, *special, src, src_span, ctx, buf);
        }
        let src_field = self.resolve(src, size, ctx, buf, src_span)?;
        let dst_field = self.resolve(dst, size, ctx, buf, dst_span)?;
        line.require(dst, &dst_field, category::DATA_ALTERABLE)?;
        let opcode = base | size.bits() << 6 | dst_field.bits;
        self.emit(buf, opcode, &[&src_field, &dst_field], ctx);
        Ok(())
    }

    fn immediate_to_status(
        &self,
        base: u16,
        special: Special,
        src: &Ea,
        src_span: Span,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let (suffix, size) = match special {
            Special::Ccr => (0x003C, Size::Byte),
            Special::Sr => (0x007C, Size::Word),
            Special::Usp => {
                return Err(AsmError::bad_mode("USP is only valid with MOVE").with_span(src_span))
            }
        };
        let field = self.resolve(src, size, ctx, buf, src_span)?;
        self.emit(buf, base | suffix, &[&field], ctx);
        Ok(())
    }

    fn encode_quick(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let (src, src_span, dst, dst_span) = self.pair(cursor)?;
        let Ea::Immediate(expr) = &src else {
            return Err(line.bad_mode(src_span));
        };
        let value = ctx.eval(expr)?;
        let data = range::check(buf, value.value, Domain::Range(1, 8), "Quick value", expr.span());
        let dst_field = self.resolve(&dst, size, ctx, buf, dst_span)?;
        line.require(&dst, &dst_field, category::ALTERABLE)?;
        if size == Size::Byte && matches!(dst, Ea::AddrReg(_)) {
            return Err(line.bad_mode(dst_span));
        }
        let opcode = line.op.base | ((data & 7) as u16) << 9 | size.bits() << 6 | dst_field.bits;
        self.emit(buf, opcode, &[&dst_field], ctx);
        Ok(())
    }

    fn encode_extended(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let start = cursor.span();
        let src = parse_ea(cursor)?;
        cursor.expect_comma()?;
        let dst = parse_ea(cursor)?;
        cursor.expect_end()?;
        let (memory, x, y) = match (src, dst) {
            (Ea::DataReg(y), Ea::DataReg(x)) => (0, x, y),
            (Ea::PreDec(y), Ea::PreDec(x)) => (0x0008, x, y),
            _ => return Err(line.bad_mode(start.join(cursor.prev_span()))),
        };
        let size_bits = if line.op.sizes == super::table::Sizes::B {
            0
        } else {
            size.bits() << 6
        };
        buf.word(line.op.base | (x as u16) << 9 | size_bits | memory | y as u16);
        Ok(())
    }

    fn encode_compare_memory(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let start = cursor.span();
        let src = parse_ea(cursor)?;
        cursor.expect_comma()?;
        let dst = parse_ea(cursor)?;
        cursor.expect_end()?;
        let (Ea::PostInc(y), Ea::PostInc(x)) = (src, dst) else {
            return Err(line.bad_mode(start.join(cursor.prev_span())));
        };
        buf.word(line.op.base | (x as u16) << 9 | size.bits() << 6 | y as u16);
        Ok(())
    }

    /// One data-alterable operand; `size_field` adds the size bits.
    fn encode_single(
        &self,
        line: &Line<'_>,
        size_field: bool,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let (ea, field) = self.operand(cursor, size, ctx, buf)?;
        cursor.expect_end()?;
        line.require(&ea, &field, category::DATA_ALTERABLE)?;
        let size_bits = if size_field { size.bits() << 6 } else { 0 };
        self.emit(buf, line.op.base | size_bits | field.bits, &[&field], ctx);
        Ok(())
    }

    fn encode_shift(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let kind = line.op.base;
        let left = line.op.alt << 8;
        let (first, field) = self.operand(cursor, Size::Byte, ctx, buf)?;

        if cursor.at_end() {
            if let Ea::DataReg(reg) = first {
                // `LSL Dn` shifts by one.
                let size = line.size()?;
                buf.word(0xE000 | 1 << 9 | left | size.bits() << 6 | kind << 3 | reg as u16);
                return Ok(());
            }
            if line.suffix.is_some_and(|s| s != 'W') {
                return Err(AsmError::bad_mode("Memory shifts are word sized only")
                    .with_span(field.span));
            }
            line.require(&first, &field, category::MEMORY_ALTERABLE)?;
            self.emit(buf, 0xE0C0 | kind << 9 | left | field.bits, &[&field], ctx);
            return Ok(());
        }

        let size = line.size()?;
        cursor.expect_comma()?;
        let dst_span = cursor.span();
        let dst = parse_ea(cursor)?;
        cursor.expect_end()?;
        let Ea::DataReg(y) = dst else {
            return Err(line.bad_mode(dst_span));
        };
        let (count, register) = match &first {
            Ea::Immediate(expr) => {
                let value = ctx.eval(expr)?;
                let count = range::check(buf, value.value, Domain::Range(1, 8), "Shift count", expr.span());
                ((count & 7) as u16, 0)
            }
            Ea::DataReg(x) => (*x as u16, 0x0020),
            _ => return Err(line.bad_mode(field.span)),
        };
        buf.word(0xE000 | count << 9 | left | size.bits() << 6 | register | kind << 3 | y as u16);
        Ok(())
    }

    fn encode_bit(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        line.size()?;
        let kind = line.op.base << 6;
        let start = cursor.span();
        let src = parse_ea(cursor)?;
        let src_span = start.join(cursor.prev_span());
        cursor.expect_comma()?;
        let (dst, dst_field) = self.operand(cursor, Size::Byte, ctx, buf)?;
        cursor.expect_end()?;

        let testing = kind == 0;
        // `BTST Dn,#imm` is the one bit operation that tests an immediate.
        let ok = if testing {
            dst.is(category::DATA)
                && (!matches!(dst, Ea::Immediate(_)) || matches!(src, Ea::DataReg(_)))
        } else {
            dst.is(category::DATA_ALTERABLE)
        };
        if !ok {
            return Err(line.bad_mode(dst_field.span));
        }

        match src {
            Ea::Immediate(expr) => {
                let value = ctx.eval(&expr)?;
                let domain = if matches!(dst, Ea::DataReg(_)) {
                    Domain::Range(0, 31)
                } else {
                    Domain::BIT_INDEX
                };
                let bit = range::check(buf, value.value, domain, "Bit number", expr.span());
                buf.word(0x0800 | kind | dst_field.bits);
                buf.word(bit as u16);
                self.emit_ext(buf, &dst_field, ctx);
            }
            Ea::DataReg(n) => {
                let opcode = 0x0100 | (n as u16) << 9 | kind | dst_field.bits;
                self.emit(buf, opcode, &[&dst_field], ctx);
            }
            _ => return Err(line.bad_mode(src_span)),
        }
        Ok(())
    }

    fn encode_branch(
        &self,
        line: &Line<'_>,
        condition: u16,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let force = match line.suffix {
            None => SizeForce::Auto,
            Some('S' | 'B') => SizeForce::Short,
            Some('W') => SizeForce::Long,
            Some(other) => {
                return Err(AsmError::bad_mode(&format!(
                    "Branch size .{other} needs a 68020"
                )))
            }
        };
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let target = ctx.eval(&expr)?;
        let candidates = [
            BranchCandidate {
                width: Size::Byte,
                rank: 0,
                base: 2,
                domain: Domain::Signed(8),
                reserved: Some(0),
            },
            BranchCandidate {
                width: Size::Word,
                rank: 1,
                base: 2,
                domain: Domain::Signed(16),
                reserved: None,
            },
        ];
        let origin = ctx.current_address() as i64;
        let selection = select_branch(target, origin, force, &candidates)
            .map_err(|e| e.with_span(expr.span()))?;
        let opcode = 0x6000 | condition << 8;
        let disp = range::check_displacement(buf, selection.displacement, selection.domain, 1, expr.span());
        if selection.width == Size::Byte {
            if selection.displacement == 0 {
                buf.report(
                    AsmError::out_of_range("Short branch cannot target the next instruction")
                        .with_span(expr.span()),
                );
            }
            buf.word(opcode | (disp as u16 & 0xFF));
        } else {
            buf.word(opcode);
            buf.word(disp as u16);
        }
        Ok(())
    }

    fn encode_decrement_branch(
        &self,
        line: &Line<'_>,
        condition: u16,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        line.size()?;
        let reg = data_register(line, cursor)?;
        cursor.expect_comma()?;
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let target = ctx.eval(&expr)?;
        let disp = branch_displacement(target.value, ctx.current_address() as i64, 2);
        buf.word(line.op.base | condition << 8 | reg);
        let d = range::check_displacement(buf, disp, Domain::Signed(16), 1, expr.span());
        buf.word(d as u16);
        Ok(())
    }

    /// One control-mode operand. `address_reg` takes the `LEA` destination.
    fn encode_control(
        &self,
        line: &Line<'_>,
        address_reg: bool,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        line.size()?;
        let (ea, field) = self.operand(cursor, Size::Long, ctx, buf)?;
        line.require(&ea, &field, category::CONTROL)?;
        let reg = if address_reg {
            cursor.expect_comma()?;
            (address_register(line, cursor)? as u16) << 9
        } else {
            0
        };
        cursor.expect_end()?;
        self.emit(buf, line.op.base | reg | field.bits, &[&field], ctx);
        Ok(())
    }

    /// `<ea>,Dn` with a word-sized data source (`CHK`, `MULU`, ...).
    fn encode_word_to_data(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        line.size()?;
        let (ea, field) = self.operand(cursor, Size::Word, ctx, buf)?;
        line.require(&ea, &field, category::DATA)?;
        cursor.expect_comma()?;
        let reg = data_register(line, cursor)?;
        cursor.expect_end()?;
        self.emit(buf, line.op.base | reg << 9 | field.bits, &[&field], ctx);
        Ok(())
    }

    fn encode_misc(
        &self,
        line: &Line<'_>,
        class: Class,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let base = line.op.base;
        match class {
            Class::Link => {
                line.size()?;
                let reg = address_register(line, cursor)?;
                cursor.expect_comma()?;
                let disp = immediate(cursor, ctx, buf, Domain::Signed(16), "Displacement")?;
                cursor.expect_end()?;
                buf.word(base | reg as u16);
                buf.word(disp as u16);
            }
            Class::Unlink => {
                let reg = address_register(line, cursor)?;
                cursor.expect_end()?;
                buf.word(base | reg as u16);
            }
            Class::Trap => {
                let vector = immediate(cursor, ctx, buf, Domain::Range(0, 15), "Trap vector")?;
                cursor.expect_end()?;
                buf.word(base | vector as u16);
            }
            Class::Stop => {
                let value = immediate(cursor, ctx, buf, Domain::WORD, "Status value")?;
                cursor.expect_end()?;
                buf.word(base);
                buf.word(value as u16);
            }
            Class::Extend => {
                let size = line.size()?;
                let reg = data_register(line, cursor)?;
                cursor.expect_end()?;
                let long = if size == Size::Long { 0x0040 } else { 0 };
                buf.word(base | long | reg);
            }
            Class::Swap => {
                line.size()?;
                let reg = data_register(line, cursor)?;
                cursor.expect_end()?;
                buf.word(base | reg);
            }
            Class::Exchange => {
                line.size()?;
                let start = cursor.span();
                let first = parse_ea(cursor)?;
                cursor.expect_comma()?;
                let second = parse_ea(cursor)?;
                cursor.expect_end()?;
                let (mode, x, y) = match (first, second) {
                    (Ea::DataReg(x), Ea::DataReg(y)) => (0x0040, x, y),
                    (Ea::AddrReg(x), Ea::AddrReg(y)) => (0x0048, x, y),
                    (Ea::DataReg(x), Ea::AddrReg(y)) | (Ea::AddrReg(y), Ea::DataReg(x)) => {
                        (0x0088, x, y)
                    }
                    _ => return Err(line.bad_mode(start.join(cursor.prev_span()))),
                };
                buf.word(base | mode | (x as u16) << 9 | y as u16);
            }
            _ => return Err(line.bad_mode(cursor.span())),
        }
        Ok(())
    }
}

fn data_register(line: &Line<'_>, cursor: &mut TokenCursor) -> Result<u16, AsmError> {
    let span = cursor.span();
    match parse_ea(cursor)? {
        Ea::DataReg(n) => Ok(n as u16),
        _ => Err(AsmError::illegal_operand(&format!(
            "{} needs a data register here",
            line.mnemonic
        ))
        .with_span(span)),
    }
}

fn address_register(line: &Line<'_>, cursor: &mut TokenCursor) -> Result<u8, AsmError> {
    let span = cursor.span();
    match parse_ea(cursor)? {
        Ea::AddrReg(n) => Ok(n),
        _ => Err(AsmError::illegal_operand(&format!(
            "{} needs an address register here",
            line.mnemonic
        ))
        .with_span(span)),
    }
}

fn immediate(
    cursor: &mut TokenCursor,
    ctx: &dyn AssemblerContext,
    buf: &mut InstructionBuffer,
    domain: Domain,
    what: &str,
) -> Result<i64, AsmError> {
    let span = cursor.span();
    let Ea::Immediate(expr) = parse_ea(cursor)? else {
        return Err(AsmError::bad_mode(&format!("Expected #{what}")).with_span(span));
    };
    let value = ctx.eval(&expr)?;
    Ok(range::check(buf, value.value, domain, what, expr.span()))
}

impl CpuHandler for M68kHandler {
    fn encode(
        &self,
        mnemonic: &str,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> EncodeOutcome {
        let (stem, suffix) = split_size_suffix(mnemonic);
        let Ok(matched) = INSTRUCTION_TABLE.lookup_with(stem, condition_suffix) else {
            return EncodeOutcome::NotFound;
        };
        let line = Line {
            mnemonic,
            op: matched.param(),
            suffix,
        };
        let condition = matched.aux.map_or(line.op.alt, |c| c as u16);
        let result = match matched.class() {
            Class::Inherent => line
                .size()
                .and_then(|_| cursor.expect_end())
                .map(|()| buf.word(line.op.base)),
            Class::Move => self.encode_move(&line, cursor, ctx, buf),
            Class::MoveAddress => self.encode_move_address(&line, cursor, ctx, buf),
            Class::MoveQuick => self.encode_move_quick(&line, cursor, ctx, buf),
            Class::MoveMultiple => self.encode_move_multiple(&line, cursor, ctx, buf),
            Class::Alu(kind) => self.encode_alu(&line, kind, cursor, ctx, buf),
            Class::AluAddress => self.encode_alu_address(&line, cursor, ctx, buf),
            Class::AluImmediate => self.encode_alu_immediate(&line, cursor, ctx, buf),
            Class::Quick => self.encode_quick(&line, cursor, ctx, buf),
            Class::Extended => self.encode_extended(&line, cursor, buf),
            Class::CompareMemory => self.encode_compare_memory(&line, cursor, buf),
            Class::Single => self.encode_single(&line, true, cursor, ctx, buf),
            Class::SingleByte => self.encode_single(&line, false, cursor, ctx, buf),
            Class::Shift => self.encode_shift(&line, cursor, ctx, buf),
            Class::Bit => self.encode_bit(&line, cursor, ctx, buf),
            Class::Branch => self.encode_branch(&line, condition, cursor, ctx, buf),
            Class::DecrementBranch => {
                self.encode_decrement_branch(&line, condition, cursor, ctx, buf)
            }
            Class::SetCondition => {
                let set = Line {
                    op: Op {
                        base: line.op.base | condition << 8,
                        ..line.op
                    },
                    ..line
                };
                self.encode_single(&set, false, cursor, ctx, buf)
            }
            Class::LoadAddress => self.encode_control(&line, true, cursor, ctx, buf),
            Class::Control => self.encode_control(&line, false, cursor, ctx, buf),
            Class::Check | Class::MulDiv => self.encode_word_to_data(&line, cursor, ctx, buf),
            class => self.encode_misc(&line, class, cursor, ctx, buf),
        };
        result.into()
    }
}

impl M68kHandler {
    fn encode_move_address(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let (src, src_span, dst, dst_span) = self.pair(cursor)?;
        let Ea::AddrReg(n) = dst else {
            return Err(line.bad_mode(dst_span));
        };
        self.move_address(line, size, &src, src_span, n, ctx, buf)
    }

    fn encode_move_quick(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        line.size()?;
        let value = immediate(cursor, ctx, buf, Domain::BYTE, "Quick value")?;
        cursor.expect_comma()?;
        let reg = data_register(line, cursor)?;
        cursor.expect_end()?;
        buf.word(line.op.base | reg << 9 | (value as u16 & 0xFF));
        Ok(())
    }

    fn encode_alu_address(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let (src, src_span, dst, dst_span) = self.pair(cursor)?;
        let Ea::AddrReg(n) = dst else {
            return Err(line.bad_mode(dst_span));
        };
        let src_field = self.resolve(&src, size, ctx, buf, src_span)?;
        let long = if size == Size::Long { 0x0100 } else { 0 };
        self.emit(buf, line.op.base | long | (n as u16) << 9 | src_field.bits, &[&src_field], ctx);
        Ok(())
    }

    fn encode_alu_immediate(
        &self,
        line: &Line<'_>,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let size = line.size()?;
        let (src, src_span, dst, dst_span) = self.pair(cursor)?;
        self.alu_immediate(line, line.op.base, size, &src, src_span, &dst, dst_span, ctx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assembler::error::AsmErrorKind;
    use crate::core::cpu::Endianness;
    use crate::core::family::tests::{run, TestContext};

    fn words(bytes: &[u8]) -> Vec<u16> {
        bytes
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }

    fn encode_at(ctx: &TestContext, line: &str) -> Vec<u16> {
        let (bytes, errors) = run(&M68kHandler::new(), ctx, Endianness::Big, line)
            .unwrap_or_else(|e| panic!("{line}: {e}"));
        assert!(errors.is_empty(), "{line}: {errors:?}");
        words(&bytes)
    }

    fn encode(line: &str) -> Vec<u16> {
        encode_at(&TestContext::at(0x1000), line)
    }

    fn error(line: &str) -> AsmErrorKind {
        match run(&M68kHandler::new(), &TestContext::at(0x1000), Endianness::Big, line) {
            Err(err) => err.kind(),
            Ok((_, errors)) => errors.first().map(|e| e.kind()).expect("an error"),
        }
    }

    #[test]
    fn moves() {
        assert_eq!(encode("MOVEQ #1,D0"), [0x7001]);
        assert_eq!(encode("MOVEQ #-1,D7"), [0x7EFF]);
        assert_eq!(encode("MOVE.L D0,D1"), [0x2200]);
        assert_eq!(encode("MOVE.W #$1234,D0"), [0x303C, 0x1234]);
        assert_eq!(encode("MOVE.B #$12,D0"), [0x103C, 0x0012]);
        assert_eq!(encode("MOVE.B (A0)+,-(A1)"), [0x1318]);
        assert_eq!(encode("MOVE.L 4(A0),D1"), [0x2228, 0x0004]);
        assert_eq!(encode("MOVE.L $1234,D0"), [0x2038, 0x1234]);
        assert_eq!(encode("MOVE.L $12345678,D0"), [0x2039, 0x1234, 0x5678]);
        assert_eq!(encode("MOVE.L $10.L,D0"), [0x2039, 0x0000, 0x0010]);
        assert_eq!(encode("MOVEA.L A0,A1"), [0x2248]);
        assert_eq!(encode("MOVE.L A0,A1"), [0x2248]);
        assert_eq!(encode("MOVE.W $1010(PC),D0"), [0x303A, 0x000E]);
    }

    #[test]
    fn forward_absolute_is_long() {
        let mut ctx = TestContext::at(0x1000);
        ctx.symbols.forward.insert("later".into(), 0x2000);
        assert_eq!(encode_at(&ctx, "JMP later"), [0x4EF9, 0x0000, 0x2000]);
    }

    #[test]
    fn status_register_moves() {
        assert_eq!(encode("MOVE SR,D0"), [0x40C0]);
        assert_eq!(encode("MOVE D0,CCR"), [0x44C0]);
        assert_eq!(encode("MOVE #0,SR"), [0x46FC, 0x0000]);
        assert_eq!(encode("MOVE USP,A0"), [0x4E68]);
        assert_eq!(encode("MOVE A1,USP"), [0x4E61]);
        assert_eq!(encode("ANDI #$FE,CCR"), [0x023C, 0x00FE]);
        assert_eq!(encode("OR #$0700,SR"), [0x007C, 0x0700]);
    }

    #[test]
    fn move_multiple() {
        assert_eq!(encode("MOVEM.L D0-D1/A0,-(SP)"), [0x48E7, 0xC080]);
        assert_eq!(encode("MOVEM.L (SP)+,D0-D1/A0"), [0x4CDF, 0x0103]);
        assert_eq!(encode("MOVEM.W D0,4(A0)"), [0x48A8, 0x0001, 0x0004]);
    }

    #[test]
    fn alu_forms() {
        assert_eq!(encode("LEA 8(A0,D1.W),A2"), [0x45F0, 0x1008]);
        assert_eq!(encode("ADD.W D1,D2"), [0xD441]);
        assert_eq!(encode("ADD.L D1,(A0)"), [0xD390]);
        assert_eq!(encode("ADD.L A1,A0"), [0xD1C9]);
        assert_eq!(encode("ADDA.W D0,A0"), [0xD0C0]);
        assert_eq!(encode("ADDQ.W #1,D0"), [0x5240]);
        assert_eq!(encode("SUBQ.L #8,A1"), [0x5189]);
        assert_eq!(encode("ADD.W #5,(A0)"), [0x0650, 0x0005]);
        assert_eq!(encode("CMP.W D0,D1"), [0xB240]);
        assert_eq!(encode("CMPI.L #1,D0"), [0x0C80, 0x0000, 0x0001]);
        assert_eq!(encode("EOR.L D0,D1"), [0xB181]);
        assert_eq!(encode("ADDX.L D1,D2"), [0xD581]);
        assert_eq!(encode("ADDX.W -(A1),-(A2)"), [0xD549]);
        assert_eq!(encode("ABCD D0,D1"), [0xC300]);
        assert_eq!(encode("CMPM.B (A0)+,(A1)+"), [0xB308]);
        assert_eq!(encode("MULU #10,D0"), [0xC0FC, 0x000A]);
        assert_eq!(encode("CHK (A0),D1"), [0x4390]);
    }

    #[test]
    fn single_operand_and_shifts() {
        assert_eq!(encode("CLR.B D0"), [0x4200]);
        assert_eq!(encode("TST.L (A0)"), [0x4A90]);
        assert_eq!(encode("LSL.W #2,D0"), [0xE548]);
        assert_eq!(encode("ASR.L D1,D2"), [0xE2A2]);
        assert_eq!(encode("ROL.W (A0)"), [0xE7D0]);
        assert_eq!(encode("LSR D3"), [0xE24B]);
        assert_eq!(encode("BTST #3,D0"), [0x0800, 0x0003]);
        assert_eq!(encode("BSET D1,(A0)"), [0x03D0]);
        assert_eq!(encode("BTST D1,#$12"), [0x033C, 0x0012]);
        assert_eq!(error("BTST #1,#2"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("BCLR D1,#2"), AsmErrorKind::BadAddressingMode);
        assert_eq!(encode("SEQ D0"), [0x57C0]);
    }

    #[test]
    fn branches() {
        assert_eq!(encode("BRA.S $1010"), [0x600E]);
        assert_eq!(encode("BEQ $1000"), [0x67FE]);
        assert_eq!(encode("BNE $1002"), [0x6600, 0x0000]);
        assert_eq!(encode("BSR.W $1010"), [0x6100, 0x000E]);
        assert_eq!(encode("DBF D0,$1000"), [0x51C8, 0xFFFE]);
        assert_eq!(encode("DBRA D1,$1000"), [0x51C9, 0xFFFE]);
        assert_eq!(error("BRA.S $2000"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(error("BRA.L $2000"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("DBRA D0,-$8000000000000000"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(error("BRA $7FFFFFFFFFFFFFFF"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(
            error("MOVE.W -$8000000000000000(PC),D0"),
            AsmErrorKind::OperandOutOfRange
        );
    }

    #[test]
    fn control_and_misc() {
        assert_eq!(encode("JSR (A0)"), [0x4E90]);
        assert_eq!(encode("JMP $1234"), [0x4EF8, 0x1234]);
        assert_eq!(encode("PEA 4(A0)"), [0x4868, 0x0004]);
        assert_eq!(encode("LINK A6,#-8"), [0x4E56, 0xFFF8]);
        assert_eq!(encode("UNLK A6"), [0x4E5E]);
        assert_eq!(encode("TRAP #15"), [0x4E4F]);
        assert_eq!(encode("STOP #$2700"), [0x4E72, 0x2700]);
        assert_eq!(encode("SWAP D0"), [0x4840]);
        assert_eq!(encode("EXT.W D0"), [0x4880]);
        assert_eq!(encode("EXT.L D1"), [0x48C1]);
        assert_eq!(encode("EXG D0,D1"), [0xC141]);
        assert_eq!(encode("EXG A0,A1"), [0xC149]);
        assert_eq!(encode("EXG D0,A1"), [0xC189]);
        assert_eq!(encode("NOP"), [0x4E71]);
        assert_eq!(encode("RTS"), [0x4E75]);
    }

    #[test]
    fn rejected_forms() {
        assert_eq!(error("MOVE.L D0,#1"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("ADDA.B D0,A0"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LEA D0,A0"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("ADDQ #9,D0"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(error("TRAP #16"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(error("SWAP A0"), AsmErrorKind::IllegalOperand);
        assert_eq!(error("MOVE.B A0,D0"), AsmErrorKind::BadAddressingMode);
    }
}
