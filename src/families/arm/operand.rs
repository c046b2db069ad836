// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! ARM operand grammar: registers, shifter operands, addresses and
//! register lists.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::expr::{parse_expr, Expr};
use crate::core::registers::RegisterSet;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

const REGS: RegisterSet = RegisterSet::new(&[
    "R0", "R1", "R2", "R3", "R4", "R5", "R6", "R7", "R8", "R9", "R10", "R11", "R12", "R13",
    "R14", "R15", "SP", "LR", "PC",
]);

pub const SP: u8 = 13;
pub const PC: u8 = 15;

fn reg_number(idx: usize) -> u8 {
    if idx < 16 {
        idx as u8
    } else {
        (idx - 16) as u8 + SP
    }
}

pub fn register(cursor: &mut TokenCursor) -> Result<u8, AsmError> {
    cursor.expect_register(&REGS, "register").map(reg_number)
}

pub fn at_register(cursor: &TokenCursor) -> bool {
    cursor.peek_register(&REGS).is_some()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl ShiftKind {
    pub fn bits(self) -> u32 {
        match self {
            ShiftKind::Lsl => 0,
            ShiftKind::Lsr => 1,
            ShiftKind::Asr => 2,
            ShiftKind::Ror => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Shift {
    None,
    Immediate { kind: ShiftKind, amount: Expr },
    Register { kind: ShiftKind, rs: u8 },
    Rrx,
}

fn parse_shift(cursor: &mut TokenCursor) -> Result<Shift, AsmError> {
    let Some(name) = cursor.peek_ident().map(str::to_ascii_uppercase) else {
        return Err(cursor.unexpected("shift"));
    };
    let kind = match name.as_str() {
        "LSL" | "ASL" => ShiftKind::Lsl,
        "LSR" => ShiftKind::Lsr,
        "ASR" => ShiftKind::Asr,
        "ROR" => ShiftKind::Ror,
        "RRX" => {
            cursor.advance();
            return Ok(Shift::Rrx);
        }
        _ => return Err(cursor.unexpected("shift")),
    };
    cursor.advance();
    if cursor.eat(&TokenKind::Hash) {
        let amount = parse_expr(cursor)?;
        return Ok(Shift::Immediate { kind, amount });
    }
    let rs = register(cursor)?;
    Ok(Shift::Register { kind, rs })
}

/// Shifter operand of the data-processing instructions.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand2 {
    Immediate(Expr),
    Register { rm: u8, shift: Shift },
}

pub fn parse_operand2(cursor: &mut TokenCursor) -> Result<(Operand2, Span), AsmError> {
    let start = cursor.span();
    if cursor.eat(&TokenKind::Hash) {
        let expr = parse_expr(cursor)?;
        return Ok((Operand2::Immediate(expr), start.join(cursor.prev_span())));
    }
    let rm = register(cursor)?;
    let shift = if cursor.eat(&TokenKind::Comma) {
        parse_shift(cursor)?
    } else {
        Shift::None
    };
    Ok((Operand2::Register { rm, shift }, start.join(cursor.prev_span())))
}

#[derive(Clone, Debug, PartialEq)]
pub enum Offset {
    None,
    Immediate(Expr),
    Register { subtract: bool, rm: u8, shift: Shift },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Address {
    /// `[Rn, offset]` with optional `!` write-back.
    Pre { rn: u8, offset: Offset, writeback: bool },
    /// `[Rn], offset`
    Post { rn: u8, offset: Offset },
    /// PC-relative label.
    Label(Expr),
    /// `=expr`
    Literal(Expr),
}

fn parse_offset(cursor: &mut TokenCursor) -> Result<Offset, AsmError> {
    if cursor.eat(&TokenKind::Hash) {
        return Ok(Offset::Immediate(parse_expr(cursor)?));
    }
    let subtract = cursor.eat_operator(OperatorKind::Minus);
    if !subtract {
        cursor.eat_operator(OperatorKind::Plus);
    }
    let rm = register(cursor)?;
    let shift = if cursor.eat(&TokenKind::Comma) {
        parse_shift(cursor)?
    } else {
        Shift::None
    };
    Ok(Offset::Register {
        subtract,
        rm,
        shift,
    })
}

pub fn parse_address(cursor: &mut TokenCursor) -> Result<(Address, Span), AsmError> {
    let start = cursor.span();
    let address = if cursor.eat_operator(OperatorKind::Eq) {
        Address::Literal(parse_expr(cursor)?)
    } else if cursor.eat(&TokenKind::OpenBracket) {
        let rn = register(cursor)?;
        if cursor.eat(&TokenKind::CloseBracket) {
            if cursor.eat(&TokenKind::Comma) {
                Address::Post {
                    rn,
                    offset: parse_offset(cursor)?,
                }
            } else {
                Address::Pre {
                    rn,
                    offset: Offset::None,
                    writeback: cursor.eat_operator(OperatorKind::LogicNot),
                }
            }
        } else {
            cursor.expect_comma()?;
            let offset = parse_offset(cursor)?;
            cursor.expect(&TokenKind::CloseBracket, "']'")?;
            Address::Pre {
                rn,
                offset,
                writeback: cursor.eat_operator(OperatorKind::LogicNot),
            }
        }
    } else {
        Address::Label(parse_expr(cursor)?)
    };
    Ok((address, start.join(cursor.prev_span())))
}

/// `{R0-R3, LR}` as a 16-bit mask.
pub fn parse_register_list(cursor: &mut TokenCursor) -> Result<u16, AsmError> {
    cursor.expect(&TokenKind::OpenBrace, "'{'")?;
    let mut mask = 0u16;
    loop {
        let span = cursor.span();
        let first = register(cursor)?;
        let last = if cursor.eat_operator(OperatorKind::Minus) {
            register(cursor)?
        } else {
            first
        };
        if last < first {
            return Err(AsmError::illegal_operand("Register range must ascend").with_span(span));
        }
        for reg in first..=last {
            mask |= 1 << reg;
        }
        if !cursor.eat(&TokenKind::Comma) {
            break;
        }
    }
    cursor.expect(&TokenKind::CloseBrace, "'}'")?;
    Ok(mask)
}

/// `CPSR`/`SPSR` with an optional `_fields` suffix. Returns the `R` bit
/// and the field mask (`c`=1, `x`=2, `s`=4, `f`=8). No suffix means `fc`.
pub fn parse_psr(cursor: &mut TokenCursor) -> Result<(bool, u32), AsmError> {
    let span = cursor.span();
    let bad = || AsmError::illegal_operand("Expected CPSR or SPSR").with_span(span);
    let name = cursor.peek_ident().map(str::to_ascii_uppercase).ok_or_else(bad)?;
    let (base, fields) = name.split_once('_').unwrap_or((name.as_str(), ""));
    let spsr = match base {
        "CPSR" => false,
        "SPSR" => true,
        _ => return Err(bad()),
    };
    let mask = match fields {
        "" | "ALL" => 0x9,
        "FLG" => 0x8,
        "CTL" => 0x1,
        letters => {
            let mut mask = 0;
            for c in letters.chars() {
                let bit = match c {
                    'C' => 0x1,
                    'X' => 0x2,
                    'S' => 0x4,
                    'F' => 0x8,
                    _ => return Err(bad()),
                };
                mask |= bit;
            }
            mask
        }
    };
    cursor.advance();
    Ok((spsr, mask))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(text: &str) -> TokenCursor {
        TokenCursor::from_line(text, 1).unwrap()
    }

    #[test]
    fn register_aliases() {
        assert_eq!(register(&mut cursor("sp")).unwrap(), 13);
        assert_eq!(register(&mut cursor("LR")).unwrap(), 14);
        assert_eq!(register(&mut cursor("r15")).unwrap(), 15);
        assert!(register(&mut cursor("R16")).is_err());
    }

    #[test]
    fn shifted_operand() {
        let (op, _) = parse_operand2(&mut cursor("R2, LSL #3")).unwrap();
        assert!(matches!(
            op,
            Operand2::Register { rm: 2, shift: Shift::Immediate { kind: ShiftKind::Lsl, .. } }
        ));
        let (op, _) = parse_operand2(&mut cursor("R2, ROR R4")).unwrap();
        assert_eq!(
            op,
            Operand2::Register { rm: 2, shift: Shift::Register { kind: ShiftKind::Ror, rs: 4 } }
        );
    }

    #[test]
    fn addresses() {
        let (addr, _) = parse_address(&mut cursor("[R1, #4]!")).unwrap();
        assert!(matches!(addr, Address::Pre { rn: 1, writeback: true, .. }));
        let (addr, _) = parse_address(&mut cursor("[R1], -R2")).unwrap();
        assert!(matches!(
            addr,
            Address::Post { rn: 1, offset: Offset::Register { subtract: true, rm: 2, .. } }
        ));
        let (addr, _) = parse_address(&mut cursor("=0x1234")).unwrap();
        assert!(matches!(addr, Address::Literal(_)));
        let (addr, _) = parse_address(&mut cursor("table")).unwrap();
        assert!(matches!(addr, Address::Label(_)));
    }

    #[test]
    fn register_lists() {
        assert_eq!(parse_register_list(&mut cursor("{R0-R3, LR}")).unwrap(), 0x400F);
        assert!(parse_register_list(&mut cursor("{R3-R1}")).is_err());
    }

    #[test]
    fn status_registers() {
        assert_eq!(parse_psr(&mut cursor("CPSR")).unwrap(), (false, 0x9));
        assert_eq!(parse_psr(&mut cursor("spsr_f")).unwrap(), (true, 0x8));
        assert_eq!(parse_psr(&mut cursor("CPSR_fsxc")).unwrap(), (false, 0xF));
        assert!(parse_psr(&mut cursor("R0")).is_err());
    }
}
