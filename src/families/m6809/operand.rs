// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Operand grammar for the Motorola 6809.
//!
//! | Syntax | Form |
//! |--------|------|
//! | `#e` | Immediate |
//! | `e`, `<e`, `>e` | Direct or extended |
//! | `,R` `e,R` | Constant offset from X, Y, U or S |
//! | `,R+` `,R++` `,-R` `,--R` | Auto increment / decrement |
//! | `A,R` `B,R` `D,R` | Accumulator offset |
//! | `e,PCR` | Program-counter relative to a target |
//! | `e,PC` | Literal offset from the program counter |
//! | `[...]` | Indirect form of any of the above; `[e]` is extended indirect |

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::expr::{parse_expr, Expr};
use crate::core::registers::{RegisterMatch, RegisterSet};
use crate::core::select::SizeForce;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

pub const INDEX_REGS: RegisterSet = RegisterSet::new(&["X", "Y", "U", "S"]);
pub const OFFSET_ACCUMULATORS: RegisterSet = RegisterSet::new(&["A", "B", "D"]);

/// Base register of an indexed operand; the value is its postbyte field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexReg {
    X = 0,
    Y = 1,
    U = 2,
    S = 3,
}

impl IndexReg {
    /// The `RR` bits of the postbyte.
    pub fn bits(self) -> u8 {
        (self as u8) << 5
    }

    fn from_index(idx: usize) -> Self {
        match idx {
            0 => IndexReg::X,
            1 => IndexReg::Y,
            2 => IndexReg::U,
            _ => IndexReg::S,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffsetAccumulator {
    A,
    B,
    D,
}

#[derive(Clone, Debug, PartialEq)]
pub enum IndexMode {
    Offset {
        offset: Option<Expr>,
        force: SizeForce,
        reg: IndexReg,
    },
    Accumulator {
        acc: OffsetAccumulator,
        reg: IndexReg,
    },
    Increment {
        reg: IndexReg,
        twice: bool,
    },
    Decrement {
        reg: IndexReg,
        twice: bool,
    },
    ProgramRelative {
        target: Expr,
        force: SizeForce,
    },
    ProgramOffset {
        offset: Expr,
        force: SizeForce,
    },
    /// `[e]`
    ExtendedIndirect {
        address: Expr,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum OperandForm {
    None,
    Immediate(Expr),
    Direct {
        expr: Expr,
        force: SizeForce,
    },
    Indexed {
        mode: IndexMode,
        indirect: bool,
        span: Span,
    },
}

/// Resolve the operand of a memory instruction.
pub fn parse_operand(cursor: &mut TokenCursor) -> Result<OperandForm, AsmError> {
    if cursor.at_end() {
        return Ok(OperandForm::None);
    }
    let start = cursor.span();

    if cursor.eat(&TokenKind::Hash) {
        return Ok(OperandForm::Immediate(parse_expr(cursor)?));
    }

    if cursor.eat(&TokenKind::OpenBracket) {
        let inner = parse_inner(cursor)?;
        cursor.expect(&TokenKind::CloseBracket, "']'")?;
        let span = start.join(cursor.prev_span());
        let mode = match inner {
            OperandForm::Direct { expr, .. } => IndexMode::ExtendedIndirect { address: expr },
            OperandForm::Indexed {
                mode: IndexMode::Increment { twice: false, .. },
                ..
            }
            | OperandForm::Indexed {
                mode: IndexMode::Decrement { twice: false, .. },
                ..
            } => {
                return Err(AsmError::illegal_operand(
                    "Single auto increment/decrement cannot be indirect",
                )
                .with_span(span))
            }
            OperandForm::Indexed { mode, .. } => mode,
            OperandForm::None | OperandForm::Immediate(_) => {
                return Err(AsmError::bad_mode("Invalid indirect operand").with_span(span))
            }
        };
        return Ok(OperandForm::Indexed {
            mode,
            indirect: true,
            span,
        });
    }

    parse_inner(cursor)
}

fn parse_inner(cursor: &mut TokenCursor) -> Result<OperandForm, AsmError> {
    let start = cursor.span();

    if cursor.eat(&TokenKind::Comma) {
        let mode = if cursor.eat_operator(OperatorKind::Minus) {
            let twice = cursor.eat_operator(OperatorKind::Minus);
            let reg = index_reg(cursor)?;
            IndexMode::Decrement { reg, twice }
        } else {
            let reg = index_reg(cursor)?;
            if cursor.eat_operator(OperatorKind::Plus) {
                let twice = cursor.eat_operator(OperatorKind::Plus);
                IndexMode::Increment { reg, twice }
            } else {
                IndexMode::Offset {
                    offset: None,
                    force: SizeForce::Auto,
                    reg,
                }
            }
        };
        return Ok(indexed(mode, start.join(cursor.prev_span())));
    }

    if let Some(acc) = cursor.peek_register(&OFFSET_ACCUMULATORS) {
        if matches!(cursor.peek_nth(1).kind, TokenKind::Comma) {
            cursor.advance();
            cursor.advance();
            let acc = match acc {
                0 => OffsetAccumulator::A,
                1 => OffsetAccumulator::B,
                _ => OffsetAccumulator::D,
            };
            let reg = index_reg(cursor)?;
            return Ok(indexed(
                IndexMode::Accumulator { acc, reg },
                start.join(cursor.prev_span()),
            ));
        }
    }

    let force = SizeForce::parse(cursor);
    let expr = parse_expr(cursor)?;
    if !cursor.eat(&TokenKind::Comma) {
        return Ok(OperandForm::Direct { expr, force });
    }
    let mode = if cursor.eat_word("PCR") {
        IndexMode::ProgramRelative {
            target: expr,
            force,
        }
    } else if cursor.eat_word("PC") {
        IndexMode::ProgramOffset {
            offset: expr,
            force,
        }
    } else {
        IndexMode::Offset {
            offset: Some(expr),
            force,
            reg: index_reg(cursor)?,
        }
    };
    Ok(indexed(mode, start.join(cursor.prev_span())))
}

fn indexed(mode: IndexMode, span: Span) -> OperandForm {
    OperandForm::Indexed {
        mode,
        indirect: false,
        span,
    }
}

fn index_reg(cursor: &mut TokenCursor) -> Result<IndexReg, AsmError> {
    match cursor.register(&INDEX_REGS) {
        RegisterMatch::Found(idx) => Ok(IndexReg::from_index(idx)),
        RegisterMatch::NotFound => Err(AsmError::illegal_operand(&format!(
            "Expected index register X, Y, U or S, found '{}'",
            cursor.peek().to_source_text()
        ))
        .with_span(cursor.span())),
        RegisterMatch::EndOfLine => Err(AsmError::missing_operand().with_span(cursor.span())),
    }
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

    fn mode(text: &str) -> (IndexMode, bool) {
        match form(text) {
            OperandForm::Indexed { mode, indirect, .. } => (mode, indirect),
            other => panic!("{text}: not indexed: {other:?}"),
        }
    }

    #[test]
    fn auto_increment_forms() {
        assert_eq!(
            mode(",X+").0,
            IndexMode::Increment {
                reg: IndexReg::X,
                twice: false
            }
        );
        assert_eq!(
            mode(",--u").0,
            IndexMode::Decrement {
                reg: IndexReg::U,
                twice: true
            }
        );
        assert_eq!(
            mode("[,Y++]"),
            (
                IndexMode::Increment {
                    reg: IndexReg::Y,
                    twice: true
                },
                true
            )
        );
    }

    #[test]
    fn accumulator_offsets_take_priority() {
        assert_eq!(
            mode("D,S").0,
            IndexMode::Accumulator {
                acc: OffsetAccumulator::D,
                reg: IndexReg::S
            }
        );
    }

    #[test]
    fn plain_expressions_are_direct() {
        assert!(matches!(form("$10"), OperandForm::Direct { .. }));
        assert!(matches!(
            form(">$10"),
            OperandForm::Direct {
                force: SizeForce::Long,
                ..
            }
        ));
        assert!(matches!(form("#1"), OperandForm::Immediate(_)));
        assert!(matches!(
            mode("[$1234]").0,
            IndexMode::ExtendedIndirect { .. }
        ));
        assert!(matches!(mode("table,PCR").0, IndexMode::ProgramRelative { .. }));
    }

    #[test]
    fn single_step_indirect_is_rejected() {
        let mut cursor = TokenCursor::from_line("[,X+]", 1).unwrap();
        assert!(parse_operand(&mut cursor).is_err());
    }
}
