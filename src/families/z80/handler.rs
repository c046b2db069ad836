// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Z80 handler implementation.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::expr::{parse_expr, Expr};
use crate::core::family::{AssemblerContext, CpuHandler, EncodeOutcome};
use crate::core::range::{self, Domain};
use crate::core::select::branch_displacement;
use crate::core::tokenizer::{Span, TokenKind};

use super::operand::{parse_condition, parse_operand, Index, Operand, Pair, MEM_HL};
use super::table::{Class, INSTRUCTION_TABLE};

const A: u8 = 7;

/// An 8-bit operand location: a register (possibly an index half) or
/// `(IX+d)`/`(IY+d)`.
enum Loc<'a> {
    Reg(Option<Index>, u8),
    Indexed(Index, Option<&'a Expr>),
}

fn loc(operand: &Operand) -> Option<Loc<'_>> {
    match operand {
        Operand::AtIndex { index, disp } => Some(Loc::Indexed(*index, disp.as_ref())),
        other => other.reg8().map(|(prefix, code)| Loc::Reg(prefix, code)),
    }
}

/// `(nn)`-free 16-bit pair usable as `rr` (not `AF`).
fn rr(operand: &Operand) -> Option<Pair> {
    match operand {
        Operand::Pair(pair) if *pair != Pair::Af => Some(*pair),
        _ => None,
    }
}

type Operands = Vec<(Operand, Span)>;

fn parse_operands(cursor: &mut TokenCursor) -> Result<Operands, AsmError> {
    let mut operands = Vec::new();
    if cursor.at_end() {
        return Ok(operands);
    }
    loop {
        operands.push(parse_operand(cursor)?);
        if !cursor.eat(&TokenKind::Comma) {
            cursor.expect_end()?;
            return Ok(operands);
        }
    }
}

fn bad_mode(mnemonic: &str, span: Span) -> AsmError {
    AsmError::bad_mode(&format!("Invalid addressing mode for {mnemonic}")).with_span(span)
}

/// Span covering every operand, or `fallback` when there are none.
fn operands_span(operands: &[(Operand, Span)], fallback: Span) -> Span {
    operands
        .iter()
        .map(|(_, span)| *span)
        .reduce(Span::join)
        .unwrap_or(fallback)
}

#[derive(Debug, Default)]
pub struct Z80Handler;

impl Z80Handler {
    pub const fn new() -> Self {
        Self
    }

    fn byte(
        &self,
        buf: &mut InstructionBuffer,
        expr: &Expr,
        ctx: &dyn AssemblerContext,
    ) -> Result<(), AsmError> {
        let value = ctx.eval(expr)?;
        let v = range::check(buf, value.value, Domain::BYTE, "Immediate value", expr.span());
        buf.byte(v as u8);
        Ok(())
    }

    fn word(
        &self,
        buf: &mut InstructionBuffer,
        expr: &Expr,
        ctx: &dyn AssemblerContext,
    ) -> Result<(), AsmError> {
        let value = ctx.eval(expr)?;
        let v = range::check(buf, value.value, Domain::WORD, "Address", expr.span());
        buf.word(v as u16);
        Ok(())
    }

    fn displacement(
        &self,
        buf: &mut InstructionBuffer,
        disp: Option<&Expr>,
        ctx: &dyn AssemblerContext,
    ) -> Result<u8, AsmError> {
        let Some(expr) = disp else {
            return Ok(0);
        };
        let value = ctx.eval(expr)?;
        Ok(range::check(buf, value.value, Domain::Signed(8), "Index displacement", expr.span()) as u8)
    }

    /// Emit an operation on an 8-bit location. `opcode` receives the
    /// register code (6 for memory). `CB` page operations put the
    /// displacement before the opcode.
    #[allow(clippy::too_many_arguments)]
    fn reg_op(
        &self,
        mnemonic: &str,
        location: Loc<'_>,
        span: Span,
        cb_page: bool,
        opcode: impl Fn(u8) -> u8,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        match location {
            Loc::Reg(Some(_), _) if cb_page => Err(bad_mode(mnemonic, span)),
            Loc::Reg(prefix, code) => {
                if let Some(index) = prefix {
                    buf.byte(index.prefix());
                }
                if cb_page {
                    buf.byte(0xCB);
                }
                buf.byte(opcode(code));
                Ok(())
            }
            Loc::Indexed(index, disp) => {
                buf.byte(index.prefix());
                if cb_page {
                    buf.byte(0xCB);
                    let d = self.displacement(buf, disp, ctx)?;
                    buf.byte(d);
                    buf.byte(opcode(MEM_HL));
                } else {
                    buf.byte(opcode(MEM_HL));
                    let d = self.displacement(buf, disp, ctx)?;
                    buf.byte(d);
                }
                Ok(())
            }
        }
    }

    fn encode_load(
        &self,
        mnemonic: &str,
        operands: &Operands,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let [(dst, dst_span), (src, src_span)] = operands.as_slice() else {
            return Err(AsmError::missing_operand().with_span(operands_span(operands, Span::default())));
        };
        let span = dst_span.join(*src_span);
        let bad = || bad_mode(mnemonic, span);

        match (dst, src) {
            (Operand::Reg(A), Operand::I) => buf.extend(&[0xED, 0x57]),
            (Operand::Reg(A), Operand::R) => buf.extend(&[0xED, 0x5F]),
            (Operand::I, Operand::Reg(A)) => buf.extend(&[0xED, 0x47]),
            (Operand::R, Operand::Reg(A)) => buf.extend(&[0xED, 0x4F]),
            (Operand::Reg(A), Operand::AtPair(Pair::Bc)) => buf.byte(0x0A),
            (Operand::Reg(A), Operand::AtPair(Pair::De)) => buf.byte(0x1A),
            (Operand::AtPair(Pair::Bc), Operand::Reg(A)) => buf.byte(0x02),
            (Operand::AtPair(Pair::De), Operand::Reg(A)) => buf.byte(0x12),
            (Operand::Reg(A), Operand::Memory(addr)) => {
                buf.byte(0x3A);
                self.word(buf, addr, ctx)?;
            }
            (Operand::Memory(addr), Operand::Reg(A)) => {
                buf.byte(0x32);
                self.word(buf, addr, ctx)?;
            }
            (Operand::Reg(code), Operand::AtIndex { index, disp }) => {
                buf.byte(index.prefix());
                buf.byte(0x46 | code << 3);
                let d = self.displacement(buf, disp.as_ref(), ctx)?;
                buf.byte(d);
            }
            (Operand::AtIndex { index, disp }, Operand::Reg(code)) => {
                buf.byte(index.prefix());
                buf.byte(0x70 | code);
                let d = self.displacement(buf, disp.as_ref(), ctx)?;
                buf.byte(d);
            }
            (Operand::AtIndex { index, disp }, Operand::Value(value)) => {
                buf.byte(index.prefix());
                buf.byte(0x36);
                let d = self.displacement(buf, disp.as_ref(), ctx)?;
                buf.byte(d);
                self.byte(buf, value, ctx)?;
            }
            (Operand::Pair(Pair::Sp), Operand::Pair(Pair::Hl)) => buf.byte(0xF9),
            (Operand::Pair(Pair::Sp), Operand::IndexPair(index)) => {
                buf.extend(&[index.prefix(), 0xF9]);
            }
            (Operand::Pair(Pair::Hl), Operand::Memory(addr)) => {
                buf.byte(0x2A);
                self.word(buf, addr, ctx)?;
            }
            (Operand::IndexPair(index), Operand::Memory(addr)) => {
                buf.extend(&[index.prefix(), 0x2A]);
                self.word(buf, addr, ctx)?;
            }
            (Operand::Memory(addr), Operand::Pair(Pair::Hl)) => {
                buf.byte(0x22);
                self.word(buf, addr, ctx)?;
            }
            (Operand::Memory(addr), Operand::IndexPair(index)) => {
                buf.extend(&[index.prefix(), 0x22]);
                self.word(buf, addr, ctx)?;
            }
            (Operand::IndexPair(index), Operand::Value(value)) => {
                buf.extend(&[index.prefix(), 0x21]);
                self.word(buf, value, ctx)?;
            }
            (pair, Operand::Memory(addr)) if rr(pair).is_some() => {
                let code = rr(pair).map_or(0, Pair::code);
                buf.extend(&[0xED, 0x4B | code << 4]);
                self.word(buf, addr, ctx)?;
            }
            (Operand::Memory(addr), pair) if rr(pair).is_some() => {
                let code = rr(pair).map_or(0, Pair::code);
                buf.extend(&[0xED, 0x43 | code << 4]);
                self.word(buf, addr, ctx)?;
            }
            (pair, Operand::Value(value)) if rr(pair).is_some() => {
                let code = rr(pair).map_or(0, Pair::code);
                buf.byte(0x01 | code << 4);
                self.word(buf, value, ctx)?;
            }
            (dst, Operand::Value(value)) => {
                let Some((prefix, code)) = dst.reg8() else {
                    return Err(bad());
                };
                if let Some(index) = prefix {
                    buf.byte(index.prefix());
                }
                buf.byte(0x06 | code << 3);
                self.byte(buf, value, ctx)?;
            }
            (dst, src) => {
                let (Some((p1, c1)), Some((p2, c2))) = (dst.reg8(), src.reg8()) else {
                    return Err(bad());
                };
                let prefix = self.merge_prefix((p1, c1), (p2, c2)).ok_or_else(bad)?;
                if c1 == MEM_HL && c2 == MEM_HL {
                    return Err(bad());
                }
                if let Some(index) = prefix {
                    buf.byte(index.prefix());
                }
                buf.byte(0x40 | c1 << 3 | c2);
            }
        }
        Ok(())
    }

    /// The common prefix of a register-to-register move. Index halves
    /// replace `H`/`L`, so they cannot meet plain `H`, `L` or `(HL)`.
    fn merge_prefix(
        &self,
        (p1, c1): (Option<Index>, u8),
        (p2, c2): (Option<Index>, u8),
    ) -> Option<Option<Index>> {
        let uses_hl = |prefix: Option<Index>, code: u8| prefix.is_none() && (4..=6).contains(&code);
        match (p1, p2) {
            (Some(a), Some(b)) if a != b => None,
            (Some(_), None) if uses_hl(p2, c2) => None,
            (None, Some(_)) if uses_hl(p1, c1) => None,
            _ => Some(p1.or(p2)),
        }
    }

    fn encode_stack(
        &self,
        mnemonic: &str,
        base: u8,
        operands: &Operands,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let [(operand, span)] = operands.as_slice() else {
            return Err(AsmError::missing_operand());
        };
        match operand {
            Operand::Pair(pair) if *pair != Pair::Sp => buf.byte(base | pair.code() << 4),
            Operand::IndexPair(index) => buf.extend(&[index.prefix(), base | 0x20]),
            _ => return Err(bad_mode(mnemonic, *span)),
        }
        Ok(())
    }

    fn encode_exchange(
        &self,
        mnemonic: &str,
        operands: &Operands,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let [(first, span), (second, _)] = operands.as_slice() else {
            return Err(AsmError::missing_operand());
        };
        match (first, second) {
            (Operand::Pair(Pair::De), Operand::Pair(Pair::Hl)) => buf.byte(0xEB),
            (Operand::Pair(Pair::Af), Operand::AfShadow) => buf.byte(0x08),
            (Operand::AtPair(Pair::Sp), Operand::Pair(Pair::Hl)) => buf.byte(0xE3),
            (Operand::AtPair(Pair::Sp), Operand::IndexPair(index)) => {
                buf.extend(&[index.prefix(), 0xE3]);
            }
            _ => return Err(bad_mode(mnemonic, *span)),
        }
        Ok(())
    }

    fn encode_alu(
        &self,
        mnemonic: &str,
        op: u8,
        operands: &Operands,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let ((src, span), dst) = match operands.as_slice() {
            [only] => (only, None),
            [(dst, _), second] => (second, Some(dst)),
            _ => return Err(AsmError::missing_operand()),
        };

        match dst {
            None | Some(Operand::Reg(A)) => {}
            Some(Operand::Pair(Pair::Hl)) => {
                let pair = rr(src).ok_or_else(|| bad_mode(mnemonic, *span))?;
                let code = pair.code() << 4;
                match op {
                    0 => buf.byte(0x09 | code),
                    1 => buf.extend(&[0xED, 0x4A | code]),
                    3 => buf.extend(&[0xED, 0x42 | code]),
                    _ => return Err(bad_mode(mnemonic, *span)),
                }
                return Ok(());
            }
            Some(Operand::IndexPair(index)) if op == 0 => {
                let code = match src {
                    Operand::Pair(pair @ (Pair::Bc | Pair::De | Pair::Sp)) => pair.code(),
                    Operand::IndexPair(other) if other == index => Pair::Hl.code(),
                    _ => return Err(bad_mode(mnemonic, *span)),
                };
                buf.extend(&[index.prefix(), 0x09 | code << 4]);
                return Ok(());
            }
            Some(_) => return Err(bad_mode(mnemonic, *span)),
        }

        if let Operand::Value(value) = src {
            buf.byte(0xC6 | op << 3);
            return self.byte(buf, value, ctx);
        }
        let location = loc(src).ok_or_else(|| bad_mode(mnemonic, *span))?;
        self.reg_op(mnemonic, location, *span, false, |r| 0x80 | op << 3 | r, ctx, buf)
    }

    fn encode_step(
        &self,
        mnemonic: &str,
        decrement: u8,
        operands: &Operands,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let [(operand, span)] = operands.as_slice() else {
            return Err(AsmError::missing_operand());
        };
        if let Some(pair) = rr(operand) {
            buf.byte(0x03 | decrement << 3 | pair.code() << 4);
            return Ok(());
        }
        if let Operand::IndexPair(index) = operand {
            buf.extend(&[index.prefix(), 0x23 | decrement << 3]);
            return Ok(());
        }
        let location = loc(operand).ok_or_else(|| bad_mode(mnemonic, *span))?;
        self.reg_op(mnemonic, location, *span, false, |r| 0x04 | r << 3 | decrement, ctx, buf)
    }

    fn encode_bit(
        &self,
        mnemonic: &str,
        base: u8,
        operands: &Operands,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let [(Operand::Value(bit), _), (target, span)] = operands.as_slice() else {
            return Err(bad_mode(mnemonic, operands_span(operands, Span::default())));
        };
        let value = ctx.eval(bit)?;
        let bit = range::check(buf, value.value, Domain::BIT_INDEX, "Bit number", bit.span()) as u8;
        let location = loc(target).ok_or_else(|| bad_mode(mnemonic, *span))?;
        self.reg_op(mnemonic, location, *span, true, |r| base | bit << 3 | r, ctx, buf)
    }

    fn encode_control(
        &self,
        mnemonic: &str,
        class: Class,
        base: u8,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let condition_span = cursor.span();
        let condition = parse_condition(cursor);

        if class == Class::Return {
            cursor.expect_end()?;
            buf.byte(condition.map_or(base, |cc| 0xC0 | cc << 3));
            return Ok(());
        }
        if condition.is_some() {
            cursor.expect_comma()?;
        }

        if class == Class::Jump && condition.is_none() {
            let (operand, span) = parse_operand(cursor)?;
            cursor.expect_end()?;
            return match operand {
                Operand::AtPair(Pair::Hl) => {
                    buf.byte(0xE9);
                    Ok(())
                }
                Operand::AtIndex { index, disp: None } => {
                    buf.extend(&[index.prefix(), 0xE9]);
                    Ok(())
                }
                Operand::Value(target) => {
                    buf.byte(base);
                    self.word(buf, &target, ctx)
                }
                _ => Err(bad_mode(mnemonic, span)),
            };
        }

        let target = parse_expr(cursor)?;
        cursor.expect_end()?;

        match class {
            Class::JumpRelative | Class::DecrementJump => {
                let opcode = match condition {
                    None => base,
                    Some(cc) if cc < 4 && class == Class::JumpRelative => 0x20 | cc << 3,
                    Some(_) => {
                        return Err(AsmError::bad_mode(&format!("Invalid condition for {mnemonic}"))
                            .with_span(condition_span))
                    }
                };
                let value = ctx.eval(&target)?;
                let origin = ctx.current_address() as i64;
                let disp = branch_displacement(value.value, origin, 2);
                buf.byte(opcode);
                let e = range::check_displacement(buf, disp, Domain::Signed(8), 1, target.span());
                buf.byte(e as u8);
            }
            _ => {
                // JP cc,nn and CALL cc,nn share the condition layout.
                let opcode = match (condition, class) {
                    (None, _) => base,
                    (Some(cc), Class::Call) => 0xC4 | cc << 3,
                    (Some(cc), _) => 0xC2 | cc << 3,
                };
                buf.byte(opcode);
                self.word(buf, &target, ctx)?;
            }
        }
        Ok(())
    }

    fn encode_io(
        &self,
        mnemonic: &str,
        output: bool,
        operands: &Operands,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let span = operands_span(operands, Span::default());
        let (port, data) = match (operands.as_slice(), output) {
            ([(port, _)], false) => (port, None),
            ([(data, _), (port, _)], false) | ([(port, _), (data, _)], true) => (port, Some(data)),
            _ => return Err(bad_mode(mnemonic, span)),
        };
        match (port, data) {
            (Operand::Memory(addr), Some(Operand::Reg(A))) => {
                buf.byte(if output { 0xD3 } else { 0xDB });
                self.byte(buf, addr, ctx)?;
            }
            (Operand::AtC, Some(Operand::Reg(code))) => {
                buf.extend(&[0xED, 0x40 | code << 3 | output as u8]);
            }
            (Operand::AtC, None) => buf.extend(&[0xED, 0x70]),
            (Operand::AtC, Some(Operand::Value(zero))) if output => {
                if ctx.eval(zero)?.value != 0 {
                    return Err(bad_mode(mnemonic, zero.span()));
                }
                buf.extend(&[0xED, 0x71]);
            }
            _ => return Err(bad_mode(mnemonic, span)),
        }
        Ok(())
    }

    fn encode_special(
        &self,
        class: Class,
        base: u8,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> Result<(), AsmError> {
        let expr = parse_expr(cursor)?;
        cursor.expect_end()?;
        let value = ctx.eval(&expr)?;
        if class == Class::Restart {
            let vector = value.value;
            if value.known && (vector & !0x38 != 0) {
                buf.report(
                    AsmError::out_of_range(&format!(
                        "RST vector must be a multiple of 8 up to 38H, got {vector:X}H"
                    ))
                    .with_span(expr.span()),
                );
            }
            buf.byte(base | (vector & 0x38) as u8);
            return Ok(());
        }
        let mode = range::check(buf, value.value, Domain::Range(0, 2), "Interrupt mode", expr.span());
        buf.extend(&[0xED, [0x46, 0x56, 0x5E][mode.clamp(0, 2) as usize]]);
        Ok(())
    }
}

impl CpuHandler for Z80Handler {
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
        let param = matched.param();
        let class = matched.class();

        let result = match class {
            Class::Inherent => cursor.expect_end().map(|()| {
                if param > 0xFF {
                    buf.extend(&param.to_be_bytes());
                } else {
                    buf.byte(param as u8);
                }
            }),
            Class::Jump
            | Class::JumpRelative
            | Class::DecrementJump
            | Class::Call
            | Class::Return => self.encode_control(mnemonic, class, param as u8, cursor, ctx, buf),
            Class::Restart | Class::InterruptMode => {
                self.encode_special(class, param as u8, cursor, ctx, buf)
            }
            _ => parse_operands(cursor).and_then(|operands| {
                let op = param as u8;
                match class {
                    Class::Load => self.encode_load(mnemonic, &operands, ctx, buf),
                    Class::Push | Class::Pop => self.encode_stack(mnemonic, op, &operands, buf),
                    Class::Exchange => self.encode_exchange(mnemonic, &operands, buf),
                    Class::Alu => self.encode_alu(mnemonic, op, &operands, ctx, buf),
                    Class::Increment | Class::Decrement => {
                        self.encode_step(mnemonic, op, &operands, ctx, buf)
                    }
                    Class::Rotate => {
                        let [(operand, span)] = operands.as_slice() else {
                            return Err(AsmError::missing_operand());
                        };
                        let location = loc(operand).ok_or_else(|| bad_mode(mnemonic, *span))?;
                        self.reg_op(mnemonic, location, *span, true, |r| op << 3 | r, ctx, buf)
                    }
                    Class::Bit => self.encode_bit(mnemonic, op, &operands, ctx, buf),
                    Class::Input => self.encode_io(mnemonic, false, &operands, ctx, buf),
                    _ => self.encode_io(mnemonic, true, &operands, ctx, buf),
                }
            }),
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

    fn encode(line: &str) -> Vec<u8> {
        let ctx = TestContext::at(0x100);
        let (bytes, errors) = run(&Z80Handler::new(), &ctx, Endianness::Little, line)
            .unwrap_or_else(|e| panic!("{line}: {e}"));
        assert!(errors.is_empty(), "{line}: {errors:?}");
        bytes
    }

    fn error(line: &str) -> AsmErrorKind {
        let ctx = TestContext::at(0x100);
        match run(&Z80Handler::new(), &ctx, Endianness::Little, line) {
            Err(err) => err.kind(),
            Ok((_, errors)) => errors.first().map(|e| e.kind()).expect("an error"),
        }
    }

    #[test]
    fn loads() {
        assert_eq!(encode("LD A,(HL)"), [0x7E]);
        assert_eq!(encode("LD A,(IX+5)"), [0xDD, 0x7E, 0x05]);
        assert_eq!(encode("LD B,C"), [0x41]);
        assert_eq!(encode("LD (HL),A"), [0x77]);
        assert_eq!(encode("LD A,5"), [0x3E, 0x05]);
        assert_eq!(encode("LD (HL),12H"), [0x36, 0x12]);
        assert_eq!(encode("LD (IX+2),7"), [0xDD, 0x36, 0x02, 0x07]);
        assert_eq!(encode("LD (IY-1),B"), [0xFD, 0x70, 0xFF]);
        assert_eq!(encode("LD IXH,A"), [0xDD, 0x67]);
        assert_eq!(encode("LD HL,1234H"), [0x21, 0x34, 0x12]);
        assert_eq!(encode("LD IX,1234H"), [0xDD, 0x21, 0x34, 0x12]);
        assert_eq!(encode("LD A,(1234H)"), [0x3A, 0x34, 0x12]);
        assert_eq!(encode("LD (1234H),HL"), [0x22, 0x34, 0x12]);
        assert_eq!(encode("LD (1234H),BC"), [0xED, 0x43, 0x34, 0x12]);
        assert_eq!(encode("LD SP,(1234H)"), [0xED, 0x7B, 0x34, 0x12]);
        assert_eq!(encode("LD SP,IY"), [0xFD, 0xF9]);
        assert_eq!(encode("LD A,I"), [0xED, 0x57]);
        assert_eq!(encode("LD A,(DE)"), [0x1A]);
    }

    #[test]
    fn invalid_loads() {
        assert_eq!(error("LD H,IXL"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LD IXH,IYL"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LD (HL),(HL)"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("LD A,(IX+200)"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn stack_and_exchange() {
        assert_eq!(encode("PUSH AF"), [0xF5]);
        assert_eq!(encode("POP IX"), [0xDD, 0xE1]);
        assert_eq!(encode("EX AF,AF'"), [0x08]);
        assert_eq!(encode("EX DE,HL"), [0xEB]);
        assert_eq!(encode("EX (SP),IY"), [0xFD, 0xE3]);
        assert_eq!(error("PUSH SP"), AsmErrorKind::BadAddressingMode);
    }

    #[test]
    fn arithmetic() {
        assert_eq!(encode("ADD A,B"), [0x80]);
        assert_eq!(encode("SUB 5"), [0xD6, 0x05]);
        assert_eq!(encode("AND (IX-1)"), [0xDD, 0xA6, 0xFF]);
        assert_eq!(encode("CP A"), [0xBF]);
        assert_eq!(encode("ADD HL,SP"), [0x39]);
        assert_eq!(encode("ADC HL,DE"), [0xED, 0x5A]);
        assert_eq!(encode("SBC HL,BC"), [0xED, 0x42]);
        assert_eq!(encode("ADD IX,IX"), [0xDD, 0x29]);
        assert_eq!(encode("INC (HL)"), [0x34]);
        assert_eq!(encode("DEC IY"), [0xFD, 0x2B]);
        assert_eq!(encode("INC BC"), [0x03]);
        assert_eq!(encode("DEC (IX+3)"), [0xDD, 0x35, 0x03]);
        assert_eq!(error("SUB HL,BC"), AsmErrorKind::BadAddressingMode);
    }

    #[test]
    fn cb_page() {
        assert_eq!(encode("RLC B"), [0xCB, 0x00]);
        assert_eq!(encode("SRL (HL)"), [0xCB, 0x3E]);
        assert_eq!(encode("RL (IX+2)"), [0xDD, 0xCB, 0x02, 0x16]);
        assert_eq!(encode("BIT 7,A"), [0xCB, 0x7F]);
        assert_eq!(encode("SET 0,(IY+4)"), [0xFD, 0xCB, 0x04, 0xC6]);
        assert_eq!(encode("RES 3,(HL)"), [0xCB, 0x9E]);
        assert_eq!(error("BIT 8,A"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn control_flow() {
        assert_eq!(encode("JP 1234H"), [0xC3, 0x34, 0x12]);
        assert_eq!(encode("JP NZ,1234H"), [0xC2, 0x34, 0x12]);
        assert_eq!(encode("JP (HL)"), [0xE9]);
        assert_eq!(encode("JP (IX)"), [0xDD, 0xE9]);
        assert_eq!(encode("JR $"), [0x18, 0xFE]);
        assert_eq!(encode("JR NZ,$+5"), [0x20, 0x03]);
        assert_eq!(encode("JR C,$"), [0x38, 0xFE]);
        assert_eq!(encode("DJNZ $"), [0x10, 0xFE]);
        assert_eq!(encode("CALL M,1234H"), [0xFC, 0x34, 0x12]);
        assert_eq!(encode("CALL 1234H"), [0xCD, 0x34, 0x12]);
        assert_eq!(encode("RET"), [0xC9]);
        assert_eq!(encode("RET Z"), [0xC8]);
        assert_eq!(error("JR PO,$"), AsmErrorKind::BadAddressingMode);
        assert_eq!(error("JR $+200"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn restarts_and_modes() {
        assert_eq!(encode("RST 38H"), [0xFF]);
        assert_eq!(encode("RST 10H"), [0xD7]);
        assert_eq!(error("RST 5"), AsmErrorKind::OperandOutOfRange);
        assert_eq!(encode("IM 2"), [0xED, 0x5E]);
        assert_eq!(encode("IM 0"), [0xED, 0x46]);
        assert_eq!(error("IM 3"), AsmErrorKind::OperandOutOfRange);
    }

    #[test]
    fn ports() {
        assert_eq!(encode("IN A,(0FEH)"), [0xDB, 0xFE]);
        assert_eq!(encode("IN B,(C)"), [0xED, 0x40]);
        assert_eq!(encode("OUT (C),A"), [0xED, 0x79]);
        assert_eq!(encode("OUT (10H),A"), [0xD3, 0x10]);
        assert_eq!(encode("OUT (C),0"), [0xED, 0x71]);
    }

    #[test]
    fn inherent() {
        assert_eq!(encode("LDIR"), [0xED, 0xB0]);
        assert_eq!(encode("NOP"), [0x00]);
        assert_eq!(encode("NEG"), [0xED, 0x44]);
    }
}
