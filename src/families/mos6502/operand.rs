// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand types and syntax resolver for the MOS 6502 family.
//!
//! Resolution happens in two steps. [`parse_operand`] turns the tokens into
//! an [`OperandForm`], which records only what the source *says* (`(e),Y`,
//! `e,X`, `[e]`). The handler then maps the form onto the concrete
//! [`AddressMode`]s the instruction offers and lets the width selector pick
//! between zero page, absolute and long variants.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::expr::{parse_expr, Expr, UnaryOp};
use crate::core::registers::{RegisterMatch, RegisterSet};
use crate::core::select::SizeForce;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

/// Addressing modes for the MOS 6502 family.
///
/// This enum includes all modes supported by any CPU in the family. The
/// opcode table records which CPUs accept each (mode, opcode) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressMode {
    /// No operand (NOP, RTS, BRK, etc.)
    Implied,
    /// Accumulator (ASL A, ROL A, etc.)
    Accumulator,
    /// #$nn - 8-bit (or 16-bit on the 65816) immediate value
    Immediate,
    /// $nn - Zero page / direct page
    ZeroPage,
    /// $nn,X
    ZeroPageX,
    /// $nn,Y
    ZeroPageY,
    /// $nnnn - Absolute (16-bit address)
    Absolute,
    /// $nnnn,X
    AbsoluteX,
    /// $nnnn,Y
    AbsoluteY,
    /// ($nnnn) - Indirect (JMP)
    Indirect,
    /// ($nn,X) - Indexed indirect (zero page)
    IndexedIndirectX,
    /// ($nn),Y - Indirect indexed (zero page)
    IndirectIndexedY,
    /// Relative branch offset
    Relative,

    // 65C02 extensions
    /// ($nn) - Zero page indirect
    ZeroPageIndirect,
    /// ($nnnn,X) - Absolute indexed indirect (JMP, JSR on 65816)
    AbsoluteIndexedIndirect,

    // 65816 extensions
    /// $nnnnnn - Absolute long
    AbsoluteLong,
    /// $nnnnnn,X
    AbsoluteLongX,
    /// [$nn] - Direct page indirect long
    DirectIndirectLong,
    /// [$nn],Y
    DirectIndirectLongY,
    /// [$nnnn] - Absolute indirect long (JML)
    AbsoluteIndirectLong,
    /// $nn,S - Stack relative
    StackRelative,
    /// ($nn,S),Y
    StackRelativeIndirectY,
}

impl AddressMode {
    /// Number of operand bytes for this mode (immediate excluded, its width
    /// depends on the instruction and the 65816 register widths).
    pub fn operand_size(&self) -> u8 {
        match self {
            AddressMode::Implied | AddressMode::Accumulator | AddressMode::Immediate => 0,
            AddressMode::ZeroPage
            | AddressMode::ZeroPageX
            | AddressMode::ZeroPageY
            | AddressMode::IndexedIndirectX
            | AddressMode::IndirectIndexedY
            | AddressMode::Relative
            | AddressMode::ZeroPageIndirect
            | AddressMode::DirectIndirectLong
            | AddressMode::DirectIndirectLongY
            | AddressMode::StackRelative
            | AddressMode::StackRelativeIndirectY => 1,
            AddressMode::Absolute
            | AddressMode::AbsoluteX
            | AddressMode::AbsoluteY
            | AddressMode::Indirect
            | AddressMode::AbsoluteIndexedIndirect
            | AddressMode::AbsoluteIndirectLong => 2,
            AddressMode::AbsoluteLong | AddressMode::AbsoluteLongX => 3,
        }
    }
}

/// Which part of an immediate value is used (`#<`, `#>`, `#^`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BytePart {
    Whole,
    Low,
    High,
    Bank,
}

/// Index register after a comma.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Index {
    None,
    X,
    Y,
    S,
}

/// Indirect variants written with parentheses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndirectIndex {
    /// `(e)`
    None,
    /// `(e,X)`
    PreX,
    /// `(e),Y`
    PostY,
    /// `(e,S),Y`
    StackY,
}

/// Operand syntax as written, before a concrete mode is chosen.
#[derive(Clone, Debug, PartialEq)]
pub enum OperandForm {
    None,
    Accumulator(Span),
    Immediate {
        expr: Expr,
        part: BytePart,
    },
    Direct {
        expr: Expr,
        force: SizeForce,
        index: Index,
    },
    Indirect {
        expr: Expr,
        force: SizeForce,
        index: IndirectIndex,
    },
    IndirectLong {
        expr: Expr,
        force: SizeForce,
        y: bool,
    },
}

impl OperandForm {
    pub fn span(&self) -> Span {
        match self {
            OperandForm::None => Span::default(),
            OperandForm::Accumulator(span) => *span,
            OperandForm::Immediate { expr, .. }
            | OperandForm::Direct { expr, .. }
            | OperandForm::Indirect { expr, .. }
            | OperandForm::IndirectLong { expr, .. } => expr.span(),
        }
    }
}

pub const ACCUMULATOR: RegisterSet = RegisterSet::new(&["A"]);
pub const INDEX_REGS: RegisterSet = RegisterSet::new(&["X", "Y", "S"]);

/// Resolve the operand tokens of one instruction.
pub fn parse_operand(cursor: &mut TokenCursor) -> Result<OperandForm, AsmError> {
    if cursor.at_end() {
        return Ok(OperandForm::None);
    }

    // A lone `A` is the accumulator, never a label.
    if cursor.peek_register(&ACCUMULATOR).is_some()
        && matches!(cursor.peek_nth(1).kind, TokenKind::End)
    {
        let span = cursor.advance().span;
        return Ok(OperandForm::Accumulator(span));
    }

    if cursor.eat(&TokenKind::Hash) {
        let part = if cursor.eat_operator(OperatorKind::Lt) {
            BytePart::Low
        } else if cursor.eat_operator(OperatorKind::Gt) {
            BytePart::High
        } else if cursor.eat_operator(OperatorKind::BitXor) {
            BytePart::Bank
        } else {
            BytePart::Whole
        };
        let expr = parse_expr(cursor)?;
        return Ok(OperandForm::Immediate { expr, part });
    }

    if cursor.eat(&TokenKind::OpenBracket) {
        let force = SizeForce::parse(cursor);
        let expr = parse_expr(cursor)?;
        cursor.expect(&TokenKind::CloseBracket, "']'")?;
        let y = if cursor.eat(&TokenKind::Comma) {
            expect_index(cursor, Index::Y)?;
            true
        } else {
            false
        };
        return Ok(OperandForm::IndirectLong { expr, force, y });
    }

    if matches!(cursor.peek_kind(), TokenKind::OpenParen) {
        if let Some(form) = cursor.speculate(parse_indirect) {
            return Ok(form);
        }
    }

    let force = SizeForce::parse(cursor);
    let expr = parse_expr(cursor)?;
    let index = if cursor.eat(&TokenKind::Comma) {
        match cursor.register(&INDEX_REGS) {
            RegisterMatch::Found(0) => Index::X,
            RegisterMatch::Found(1) => Index::Y,
            RegisterMatch::Found(_) => Index::S,
            RegisterMatch::NotFound => {
                return Err(AsmError::illegal_operand("Expected index register X, Y or S")
                    .with_span(cursor.span()))
            }
            RegisterMatch::EndOfLine => {
                return Err(AsmError::missing_operand().with_span(cursor.span()))
            }
        }
    } else {
        Index::None
    };
    Ok(OperandForm::Direct { expr, force, index })
}

/// `( e )`, `( e , X )`, `( e ) , Y`, `( e , S ) , Y`, complete up to the end
/// of the operand. Anything else is an expression that starts with a
/// parenthesis.
fn parse_indirect(cursor: &mut TokenCursor) -> Option<OperandForm> {
    cursor.advance();
    let force = SizeForce::parse(cursor);
    let expr = parse_expr(cursor).ok()?;
    let index = if cursor.eat(&TokenKind::Comma) {
        match cursor.register(&INDEX_REGS) {
            RegisterMatch::Found(0) => {
                cursor.eat(&TokenKind::CloseParen).then_some(IndirectIndex::PreX)?
            }
            RegisterMatch::Found(2) => {
                let closed = cursor.eat(&TokenKind::CloseParen) && cursor.eat(&TokenKind::Comma);
                (closed && cursor.register(&INDEX_REGS) == RegisterMatch::Found(1))
                    .then_some(IndirectIndex::StackY)?
            }
            _ => return None,
        }
    } else {
        if !cursor.eat(&TokenKind::CloseParen) {
            return None;
        }
        if cursor.eat(&TokenKind::Comma) {
            (cursor.register(&INDEX_REGS) == RegisterMatch::Found(1))
                .then_some(IndirectIndex::PostY)?
        } else {
            IndirectIndex::None
        }
    };
    cursor
        .at_end()
        .then_some(OperandForm::Indirect { expr, force, index })
}

fn expect_index(cursor: &mut TokenCursor, want: Index) -> Result<(), AsmError> {
    let found = match cursor.register(&INDEX_REGS) {
        RegisterMatch::Found(0) => Index::X,
        RegisterMatch::Found(1) => Index::Y,
        RegisterMatch::Found(_) => Index::S,
        RegisterMatch::NotFound => Index::None,
        RegisterMatch::EndOfLine => {
            return Err(AsmError::missing_operand().with_span(cursor.span()))
        }
    };
    if found != want {
        return Err(AsmError::illegal_operand("Wrong index register").with_span(cursor.prev_span()));
    }
    Ok(())
}

/// Apply a `#<`, `#>` or `#^` selector to an immediate expression.
pub fn select_part(expr: Expr, part: BytePart) -> Expr {
    let op = match part {
        BytePart::Whole => return expr,
        BytePart::Low => UnaryOp::Low,
        BytePart::High => UnaryOp::High,
        BytePart::Bank => UnaryOp::Bank,
    };
    let span = expr.span();
    Expr::unary(op, expr, span)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(text: &str) -> OperandForm {
        let mut cursor = TokenCursor::from_line(text, 1).unwrap();
        let form = parse_operand(&mut cursor).unwrap();
        assert!(cursor.at_end(), "unconsumed tokens in {text}");
        form
    }

    #[test]
    fn classifies_basic_forms() {
        assert_eq!(form(""), OperandForm::None);
        assert!(matches!(form("A"), OperandForm::Accumulator(_)));
        assert!(matches!(
            form("#$FF"),
            OperandForm::Immediate {
                part: BytePart::Whole,
                ..
            }
        ));
        assert!(matches!(
            form("#>label"),
            OperandForm::Immediate {
                part: BytePart::High,
                ..
            }
        ));
        assert!(matches!(
            form("$10,x"),
            OperandForm::Direct {
                index: Index::X,
                ..
            }
        ));
        assert!(matches!(
            form("3,S"),
            OperandForm::Direct {
                index: Index::S,
                ..
            }
        ));
    }

    #[test]
    fn classifies_indirect_forms() {
        assert!(matches!(
            form("($20)"),
            OperandForm::Indirect {
                index: IndirectIndex::None,
                ..
            }
        ));
        assert!(matches!(
            form("($20,X)"),
            OperandForm::Indirect {
                index: IndirectIndex::PreX,
                ..
            }
        ));
        assert!(matches!(
            form("($20),Y"),
            OperandForm::Indirect {
                index: IndirectIndex::PostY,
                ..
            }
        ));
        assert!(matches!(
            form("(3,S),Y"),
            OperandForm::Indirect {
                index: IndirectIndex::StackY,
                ..
            }
        ));
        assert!(matches!(
            form("[$20],y"),
            OperandForm::IndirectLong { y: true, .. }
        ));
    }

    #[test]
    fn parenthesised_expression_backtracks_to_direct() {
        match form("(1+2)*3") {
            OperandForm::Direct {
                index: Index::None,
                expr,
                ..
            } => assert!(matches!(expr, Expr::Binary { .. })),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            form("(4)+1,X"),
            OperandForm::Direct {
                index: Index::X,
                ..
            }
        ));
    }

    #[test]
    fn size_force_is_recorded() {
        assert!(matches!(
            form("<$1234"),
            OperandForm::Direct {
                force: SizeForce::Short,
                ..
            }
        ));
        assert!(matches!(
            form(">>$12"),
            OperandForm::Direct {
                force: SizeForce::ExtraLong,
                ..
            }
        ));
    }

    #[test]
    fn bad_index_register_is_illegal_operand() {
        let mut cursor = TokenCursor::from_line("$10,Z", 1).unwrap();
        let err = parse_operand(&mut cursor).unwrap_err();
        assert_eq!(
            err.kind(),
            crate::core::assembler::error::AsmErrorKind::IllegalOperand
        );
    }
}
