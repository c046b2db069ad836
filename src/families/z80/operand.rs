// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Z80 operand grammar.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::expr::{parse_expr, Expr};
use crate::core::registers::RegisterSet;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

/// 8-bit registers in encoding order; slot 6 is `(HL)`.
const REGS: RegisterSet = RegisterSet::new(&["B", "C", "D", "E", "H", "L", "", "A"]);
const PAIRS: RegisterSet = RegisterSet::new(&["BC", "DE", "HL", "SP", "AF"]);
const HALVES: RegisterSet = RegisterSet::new(&["IXH", "IXL", "IYH", "IYL"]);
const INDEX: RegisterSet = RegisterSet::new(&["IX", "IY"]);

/// Register code of `(HL)` in the 8-bit register field.
pub const MEM_HL: u8 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Index {
    Ix,
    Iy,
}

impl Index {
    pub fn prefix(self) -> u8 {
        match self {
            Index::Ix => 0xDD,
            Index::Iy => 0xFD,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pair {
    Bc,
    De,
    Hl,
    Sp,
    Af,
}

impl Pair {
    /// Field value in `rr` (`SP` slot) and `qq` (`AF` slot) encodings.
    pub fn code(self) -> u8 {
        match self {
            Pair::Bc => 0,
            Pair::De => 1,
            Pair::Hl => 2,
            Pair::Sp | Pair::Af => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    /// `B C D E H L A`, by register code.
    Reg(u8),
    /// `IXH IXL IYH IYL`: code 4 (high) or 5 (low) under the index prefix.
    Half { index: Index, code: u8 },
    I,
    R,
    Pair(Pair),
    IndexPair(Index),
    AfShadow,
    /// `(BC)`, `(DE)`, `(HL)`, `(SP)`.
    AtPair(Pair),
    /// `(IX)` or `(IX+d)`.
    AtIndex { index: Index, disp: Option<Expr> },
    /// `(C)` port form of `IN`/`OUT`.
    AtC,
    /// `(nn)`
    Memory(Expr),
    Value(Expr),
}

impl Operand {
    /// 8-bit register code with the prefix it needs, if any. `(HL)` is
    /// code 6; `(IX+d)` is not included since it carries a displacement.
    pub fn reg8(&self) -> Option<(Option<Index>, u8)> {
        match self {
            Operand::Reg(code) => Some((None, *code)),
            Operand::AtPair(Pair::Hl) => Some((None, MEM_HL)),
            Operand::Half { index, code } => Some((Some(*index), *code)),
            _ => None,
        }
    }
}

fn half(idx: usize) -> Operand {
    let index = if idx < 2 { Index::Ix } else { Index::Iy };
    Operand::Half {
        index,
        code: 4 + (idx % 2) as u8,
    }
}

fn pair(idx: usize) -> Pair {
    [Pair::Bc, Pair::De, Pair::Hl, Pair::Sp, Pair::Af][idx]
}

fn index(idx: usize) -> Index {
    if idx == 0 {
        Index::Ix
    } else {
        Index::Iy
    }
}

/// Parse one operand, stopping at a comma or end of line.
pub fn parse_operand(cursor: &mut TokenCursor) -> Result<(Operand, Span), AsmError> {
    if cursor.at_operand_end() {
        return Err(AsmError::missing_operand().with_span(cursor.span()));
    }
    let start = cursor.span();

    if let Some(name) = cursor.peek_ident() {
        let upper = name.to_ascii_uppercase();
        let register = match upper.as_str() {
            "I" => Some(Operand::I),
            "R" => Some(Operand::R),
            "AF'" => Some(Operand::AfShadow),
            _ => REGS
                .index_of(&upper)
                .map(|idx| Operand::Reg(idx as u8))
                .or_else(|| PAIRS.index_of(&upper).map(|idx| Operand::Pair(pair(idx))))
                .or_else(|| HALVES.index_of(&upper).map(half))
                .or_else(|| INDEX.index_of(&upper).map(|idx| Operand::IndexPair(index(idx)))),
        };
        if let Some(operand) = register {
            cursor.advance();
            return Ok((operand, start));
        }
    }

    if matches!(cursor.peek_kind(), TokenKind::OpenParen) {
        if let Some(operand) = cursor.speculate(parenthesized) {
            let operand = operand?;
            return Ok((operand, start.join(cursor.prev_span())));
        }
    }

    let expr = parse_expr(cursor)?;
    Ok((Operand::Value(expr), start.join(cursor.prev_span())))
}

/// `( ... )` as a complete operand. Returns `None` when the parentheses only
/// group part of a larger expression.
fn parenthesized(cursor: &mut TokenCursor) -> Option<Result<Operand, AsmError>> {
    cursor.advance();
    if let Some(name) = cursor.peek_ident() {
        let upper = name.to_ascii_uppercase();
        if upper == "C" {
            cursor.advance();
            cursor.eat(&TokenKind::CloseParen).then_some(())?;
            return Some(Ok(Operand::AtC));
        }
        if let Some(idx) = PAIRS.index_of(&upper).filter(|idx| *idx < 4) {
            cursor.advance();
            cursor.eat(&TokenKind::CloseParen).then_some(())?;
            return Some(Ok(Operand::AtPair(pair(idx))));
        }
        if let Some(idx) = INDEX.index_of(&upper) {
            cursor.advance();
            return Some(indexed(cursor, index(idx)));
        }
    }
    let expr = parse_expr(cursor).ok()?;
    cursor.eat(&TokenKind::CloseParen).then_some(())?;
    cursor.at_operand_end().then_some(Ok(Operand::Memory(expr)))
}

fn indexed(cursor: &mut TokenCursor, index: Index) -> Result<Operand, AsmError> {
    if cursor.eat(&TokenKind::CloseParen) {
        return Ok(Operand::AtIndex { index, disp: None });
    }
    if !matches!(
        cursor.peek_kind(),
        TokenKind::Operator(OperatorKind::Plus | OperatorKind::Minus)
    ) {
        return Err(cursor.unexpected("'+', '-' or ')'"));
    }
    let disp = parse_expr(cursor)?;
    cursor.expect(&TokenKind::CloseParen, "')'")?;
    Ok(Operand::AtIndex {
        index,
        disp: Some(disp),
    })
}

/// Condition names in encoding order. `JR` accepts only the first four.
pub const CONDITIONS: RegisterSet =
    RegisterSet::new(&["NZ", "Z", "NC", "C", "PO", "PE", "P", "M"]);

/// Consume a condition when one leads the operand list, followed by a
/// comma or end of line.
pub fn parse_condition(cursor: &mut TokenCursor) -> Option<u8> {
    let code = cursor.peek_register(&CONDITIONS)?;
    if !matches!(
        cursor.peek_nth(1).kind,
        TokenKind::Comma | TokenKind::End
    ) {
        return None;
    }
    cursor.advance();
    Some(code as u8)
}
