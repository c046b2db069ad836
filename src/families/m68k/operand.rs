// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Effective-address grammar for the Motorola 68000.
//!
//! | Syntax | Mode | Field |
//! |--------|------|-------|
//! | `Dn` | Data register direct | `000 n` |
//! | `An` | Address register direct | `001 n` |
//! | `(An)` | Indirect | `010 n` |
//! | `(An)+` | Postincrement | `011 n` |
//! | `-(An)` | Predecrement | `100 n` |
//! | `d(An)`, `(d,An)` | Displacement | `101 n` |
//! | `d(An,Xn.s)`, `(d,An,Xn.s)` | Index | `110 n` |
//! | `e.W`, `e.L`, `e` | Absolute | `111 000/001` |
//! | `d(PC)`, `(d,PC)` | PC displacement | `111 010` |
//! | `d(PC,Xn.s)` | PC index | `111 011` |
//! | `#e` | Immediate | `111 100` |

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::expr::{parse_expr, Expr};
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};
use crate::core::text_utils::split_size_suffix;

/// Operation size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Size {
    Byte,
    Word,
    Long,
}

impl Size {
    /// The common two-bit size field (`00`, `01`, `10`).
    pub fn bits(self) -> u16 {
        match self {
            Size::Byte => 0,
            Size::Word => 1,
            Size::Long => 2,
        }
    }

    pub fn from_suffix(suffix: char) -> Option<Size> {
        match suffix {
            'B' => Some(Size::Byte),
            'W' => Some(Size::Word),
            'L' => Some(Size::Long),
            _ => None,
        }
    }
}

/// A data or address register.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    D(u8),
    A(u8),
}

/// Index register of an indexed mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexReg {
    pub reg: Reg,
    pub long: bool,
}

impl IndexReg {
    /// High byte of the brief extension word.
    pub fn bits(self) -> u16 {
        let (da, n) = match self.reg {
            Reg::D(n) => (0, n),
            Reg::A(n) => (1, n),
        };
        (da << 15) | ((n as u16) << 12) | if self.long { 0x0800 } else { 0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Special {
    Sr,
    Ccr,
    Usp,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Ea {
    DataReg(u8),
    AddrReg(u8),
    Indirect(u8),
    PostInc(u8),
    PreDec(u8),
    Displacement {
        disp: Expr,
        reg: u8,
    },
    Indexed {
        disp: Option<Expr>,
        reg: u8,
        index: IndexReg,
    },
    Absolute {
        addr: Expr,
        size: Option<Size>,
    },
    PcDisplacement {
        target: Expr,
    },
    PcIndexed {
        target: Expr,
        index: IndexReg,
    },
    Immediate(Expr),
    Special(Special),
}

/// Capability bits of an addressing mode.
pub mod category {
    pub const DATA: u8 = 0b0001;
    pub const MEMORY: u8 = 0b0010;
    pub const CONTROL: u8 = 0b0100;
    pub const ALTERABLE: u8 = 0b1000;

    pub const DATA_ALTERABLE: u8 = DATA | ALTERABLE;
    pub const MEMORY_ALTERABLE: u8 = MEMORY | ALTERABLE;
}

impl Ea {
    pub fn categories(&self) -> u8 {
        use category::*;
        match self {
            Ea::DataReg(_) => DATA | ALTERABLE,
            Ea::AddrReg(_) => ALTERABLE,
            Ea::Indirect(_)
            | Ea::Displacement { .. }
            | Ea::Indexed { .. }
            | Ea::Absolute { .. } => DATA | MEMORY | CONTROL | ALTERABLE,
            Ea::PostInc(_) | Ea::PreDec(_) => DATA | MEMORY | ALTERABLE,
            Ea::PcDisplacement { .. } | Ea::PcIndexed { .. } => DATA | MEMORY | CONTROL,
            Ea::Immediate(_) => DATA | MEMORY,
            Ea::Special(_) => 0,
        }
    }

    pub fn is(&self, required: u8) -> bool {
        self.categories() & required == required
    }
}

/// Parse a register name such as `D3`, `a7` or `SP`.
pub fn parse_reg(name: &str) -> Option<Reg> {
    if name.eq_ignore_ascii_case("SP") {
        return Some(Reg::A(7));
    }
    let bytes = name.as_bytes();
    if bytes.len() != 2 || !(b'0'..=b'7').contains(&bytes[1]) {
        return None;
    }
    let n = bytes[1] - b'0';
    match bytes[0].to_ascii_uppercase() {
        b'D' => Some(Reg::D(n)),
        b'A' => Some(Reg::A(n)),
        _ => None,
    }
}

fn parse_special(name: &str) -> Option<Special> {
    if name.eq_ignore_ascii_case("SR") {
        Some(Special::Sr)
    } else if name.eq_ignore_ascii_case("CCR") {
        Some(Special::Ccr)
    } else if name.eq_ignore_ascii_case("USP") {
        Some(Special::Usp)
    } else {
        None
    }
}

fn is_pc(name: &str) -> bool {
    name.eq_ignore_ascii_case("PC")
}

/// Parse one effective address, stopping at the separating comma.
pub fn parse_ea(cursor: &mut TokenCursor) -> Result<Ea, AsmError> {
    if cursor.at_end() {
        return Err(AsmError::missing_operand().with_span(cursor.span()));
    }

    if cursor.eat(&TokenKind::Hash) {
        return Ok(Ea::Immediate(parse_expr(cursor)?));
    }

    if let Some(name) = cursor.peek_ident() {
        if let Some(reg) = parse_reg(name) {
            cursor.advance();
            return Ok(match reg {
                Reg::D(n) => Ea::DataReg(n),
                Reg::A(n) => Ea::AddrReg(n),
            });
        }
        if let Some(special) = parse_special(name) {
            cursor.advance();
            return Ok(Ea::Special(special));
        }
    }

    if matches!(cursor.peek_kind(), TokenKind::Operator(OperatorKind::Minus))
        && matches!(cursor.peek_nth(1).kind, TokenKind::OpenParen)
    {
        let predec = cursor.speculate(|c| {
            c.advance();
            c.advance();
            let reg = address_reg(c)?;
            c.eat(&TokenKind::CloseParen).then_some(Ea::PreDec(reg))
        });
        if let Some(ea) = predec {
            return Ok(ea);
        }
    }

    if matches!(cursor.peek_kind(), TokenKind::OpenParen) {
        if let Some(ea) = cursor.speculate(parse_parenthesized) {
            return Ok(ea);
        }
    }

    let expr = parse_expr(cursor)?;
    if matches!(cursor.peek_kind(), TokenKind::OpenParen) {
        cursor.advance();
        return parse_base(cursor, Some(expr));
    }

    // `$1234.W` lexes as number, dot, identifier; `label.W` as one name.
    if cursor.eat(&TokenKind::Dot) {
        let span = cursor.span();
        let size = cursor
            .peek_ident()
            .and_then(|s| s.chars().next().filter(|_| s.len() == 1))
            .and_then(|c| Size::from_suffix(c.to_ascii_uppercase()))
            .filter(|size| *size != Size::Byte)
            .ok_or_else(|| AsmError::bad_mode("Expected .W or .L").with_span(span))?;
        cursor.advance();
        return Ok(Ea::Absolute {
            addr: expr,
            size: Some(size),
        });
    }
    if let Expr::Identifier(name, span) = &expr {
        if let (base, Some(suffix @ ('W' | 'L'))) = split_size_suffix(name) {
            return Ok(Ea::Absolute {
                addr: Expr::Identifier(base.to_string(), *span),
                size: Size::from_suffix(suffix),
            });
        }
    }
    Ok(Ea::Absolute {
        addr: expr,
        size: None,
    })
}

/// `(An)`, `(An)+`, `(d,An)`, `(d,An,Xn)`, `(An,Xn)` and the PC forms.
fn parse_parenthesized(cursor: &mut TokenCursor) -> Option<Ea> {
    cursor.advance();
    if let Some(name) = cursor.peek_ident() {
        if parse_reg(name).is_some_and(|r| matches!(r, Reg::A(_))) || is_pc(name) {
            return parse_base(cursor, None).ok();
        }
    }
    let disp = parse_expr(cursor).ok()?;
    if !cursor.eat(&TokenKind::Comma) {
        return None;
    }
    parse_base(cursor, Some(disp)).ok()
}

/// Parse `An|PC [, Xn[.s]] )` after the opening parenthesis (and an optional
/// displacement), plus a trailing `+` for postincrement.
fn parse_base(cursor: &mut TokenCursor, disp: Option<Expr>) -> Result<Ea, AsmError> {
    let span = cursor.span();
    let name = cursor
        .peek_ident()
        .ok_or_else(|| cursor.unexpected("address register or PC"))?
        .to_string();
    cursor.advance();

    let pc = is_pc(&name);
    let reg = match parse_reg(&name) {
        Some(Reg::A(n)) => Some(n),
        _ if pc => None,
        _ => {
            return Err(AsmError::illegal_operand(&format!(
                "Expected address register or PC, found '{name}'"
            ))
            .with_span(span))
        }
    };

    let index = if cursor.eat(&TokenKind::Comma) {
        Some(parse_index(cursor)?)
    } else {
        None
    };
    cursor.expect(&TokenKind::CloseParen, "')'")?;

    let zero = || Expr::Number(0, span);
    Ok(match (reg, index) {
        (Some(n), None) => match disp {
            None if cursor.eat_operator(OperatorKind::Plus) => Ea::PostInc(n),
            None => Ea::Indirect(n),
            Some(disp) => Ea::Displacement { disp, reg: n },
        },
        (Some(n), Some(index)) => Ea::Indexed {
            disp,
            reg: n,
            index,
        },
        (None, None) => Ea::PcDisplacement {
            target: disp.unwrap_or_else(zero),
        },
        (None, Some(index)) => Ea::PcIndexed {
            target: disp.unwrap_or_else(zero),
            index,
        },
    })
}

fn parse_index(cursor: &mut TokenCursor) -> Result<IndexReg, AsmError> {
    let span = cursor.span();
    let name = cursor
        .peek_ident()
        .ok_or_else(|| cursor.unexpected("index register"))?;
    let (base, suffix) = split_size_suffix(name);
    let reg = parse_reg(base)
        .ok_or_else(|| AsmError::illegal_operand("Expected index register").with_span(span))?;
    let long = match suffix {
        None | Some('W') => false,
        Some('L') => true,
        Some(_) => {
            return Err(AsmError::illegal_operand("Index size must be .W or .L").with_span(span))
        }
    };
    cursor.advance();
    Ok(IndexReg { reg, long })
}

fn address_reg(cursor: &mut TokenCursor) -> Option<u8> {
    match parse_reg(cursor.peek_ident()?)? {
        Reg::A(n) => {
            cursor.advance();
            Some(n)
        }
        Reg::D(_) => None,
    }
}

/// True when the next operand is a register list (`D0-D3/A0`, or a single
/// register followed by `/` or `-`).
pub fn at_register_list(cursor: &TokenCursor) -> bool {
    let Some(name) = cursor.peek_ident() else {
        return false;
    };
    if parse_reg(name).is_none() {
        return false;
    }
    matches!(
        cursor.peek_nth(1).kind,
        TokenKind::Operator(OperatorKind::Minus | OperatorKind::Divide)
            | TokenKind::Comma
            | TokenKind::End
    )
}

/// Parse a `MOVEM` register list into a D0..A7 bit mask.
pub fn parse_register_list(cursor: &mut TokenCursor) -> Result<(u16, Span), AsmError> {
    let start = cursor.span();
    let mut mask = 0u16;
    loop {
        let first = list_reg(cursor)?;
        let last = if cursor.eat_operator(OperatorKind::Minus) {
            list_reg(cursor)?
        } else {
            first
        };
        let (lo, hi) = (register_number(first), register_number(last));
        if lo > hi || matches!((first, last), (Reg::D(_), Reg::A(_)) | (Reg::A(_), Reg::D(_))) {
            return Err(AsmError::illegal_operand("Invalid register range")
                .with_span(start.join(cursor.prev_span())));
        }
        for n in lo..=hi {
            mask |= 1 << n;
        }
        if !cursor.eat_operator(OperatorKind::Divide) {
            break;
        }
    }
    Ok((mask, start.join(cursor.prev_span())))
}

fn register_number(reg: Reg) -> u16 {
    match reg {
        Reg::D(n) => n as u16,
        Reg::A(n) => n as u16 + 8,
    }
}

fn list_reg(cursor: &mut TokenCursor) -> Result<Reg, AsmError> {
    let reg = cursor
        .peek_ident()
        .and_then(parse_reg)
        .ok_or_else(|| cursor.unexpected("register"))?;
    cursor.advance();
    Ok(reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ea(text: &str) -> Ea {
        let mut cursor = TokenCursor::from_line(text, 1).unwrap();
        let ea = parse_ea(&mut cursor).unwrap();
        assert!(cursor.at_end(), "unconsumed tokens in {text}");
        ea
    }

    #[test]
    fn register_modes() {
        assert_eq!(ea("D3"), Ea::DataReg(3));
        assert_eq!(ea("sp"), Ea::AddrReg(7));
        assert_eq!(ea("(A0)"), Ea::Indirect(0));
        assert_eq!(ea("(A1)+"), Ea::PostInc(1));
        assert_eq!(ea("-(SP)"), Ea::PreDec(7));
        assert_eq!(ea("CCR"), Ea::Special(Special::Ccr));
    }

    #[test]
    fn displacement_and_index_forms() {
        assert!(matches!(ea("4(A0)"), Ea::Displacement { reg: 0, .. }));
        assert!(matches!(ea("(4,A0)"), Ea::Displacement { reg: 0, .. }));
        assert!(matches!(
            ea("8(A0,D1.L)"),
            Ea::Indexed {
                reg: 0,
                index: IndexReg {
                    reg: Reg::D(1),
                    long: true
                },
                ..
            }
        ));
        assert!(matches!(ea("(A2,A3)"), Ea::Indexed { disp: None, .. }));
        assert!(matches!(ea("table(PC)"), Ea::PcDisplacement { .. }));
        assert!(matches!(ea("(table,PC,D0)"), Ea::PcIndexed { .. }));
    }

    #[test]
    fn negative_expression_is_not_predecrement() {
        assert!(matches!(ea("-(4)"), Ea::Absolute { size: None, .. }));
        assert!(matches!(ea("(2+3)*4"), Ea::Absolute { .. }));
    }

    #[test]
    fn absolute_size_suffixes() {
        assert!(matches!(
            ea("$1234.W"),
            Ea::Absolute {
                size: Some(Size::Word),
                ..
            }
        ));
        match ea("label.L") {
            Ea::Absolute {
                addr: Expr::Identifier(name, _),
                size: Some(Size::Long),
            } => assert_eq!(name, "label"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    fn register_lists() {
        let mut cursor = TokenCursor::from_line("D0-D2/A0/A5-A6", 1).unwrap();
        assert!(at_register_list(&cursor));
        let (mask, _) = parse_register_list(&mut cursor).unwrap();
        assert_eq!(mask, 0b0110_0001_0000_0111);
        let mut cursor = TokenCursor::from_line("D3-D1", 1).unwrap();
        assert!(parse_register_list(&mut cursor).is_err());
    }
}
