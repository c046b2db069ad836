// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Expression parsing and evaluation.
//!
//! Expressions are parsed from a [`TokenCursor`] so operand resolvers can
//! stop at the first token that is not part of the value (`,X`, `)`, `(An)`)
//! and continue classifying the addressing mode from there. Evaluation
//! produces a [`Value`] carrying the *known* flag the encoding selector
//! relies on.

use thiserror::Error;

use crate::core::assembler::error::{AsmError, AsmErrorKind};
use crate::core::cursor::TokenCursor;
use crate::core::tokenizer::{OperatorKind, Span, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
    LogicNot,
    /// Low byte (`<expr` on targets that allow it).
    Low,
    /// High byte (`>expr`).
    High,
    /// Bank byte (`^expr`, 65816).
    Bank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    LogicAnd,
    LogicOr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Number(i64, Span),
    Identifier(String, Span),
    CurrentAddress(Span),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, span)
            | Expr::Identifier(_, span)
            | Expr::CurrentAddress(span)
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. } => *span,
        }
    }

    /// Wrap `expr` in a unary operator, extending the span over it.
    pub fn unary(op: UnaryOp, expr: Expr, span: Span) -> Expr {
        let span = span.join(expr.span());
        Expr::Unary {
            op,
            expr: Box::new(expr),
            span,
        }
    }
}

/// An evaluated operand value.
///
/// `known` is false when the value depends on a symbol that has not yet been
/// defined in the current pass; such values are placeholders and must not be
/// used to shrink an encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Value {
    pub value: i64,
    pub known: bool,
}

impl Value {
    pub const fn known(value: i64) -> Self {
        Self { value, known: true }
    }

    pub const fn unknown(value: i64) -> Self {
        Self {
            value,
            known: false,
        }
    }
}

/// Result of looking a symbol up during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolValue {
    /// Defined earlier in the current pass.
    Known(i64),
    /// Only defined by an earlier pass (a forward reference in this pass).
    Forward(i64),
    Undefined,
}

/// Error returned from expression evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
    pub span: Option<Span>,
}

impl EvalError {
    pub fn with_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span: Some(span),
        }
    }
}

impl From<EvalError> for AsmError {
    fn from(err: EvalError) -> Self {
        let out = AsmError::new(AsmErrorKind::Expression, &err.message, None);
        match err.span {
            Some(span) => out.with_span(span),
            None => out,
        }
    }
}

/// Symbol and location services needed to evaluate an expression.
pub trait EvalContext {
    fn lookup_symbol(&self, name: &str) -> SymbolValue;

    /// Address of the start of the current line (`*` / `$`).
    fn current_address(&self) -> i64;

    /// Current pass, 1 or 2.
    fn pass(&self) -> u8;
}

/// Evaluate an expression.
///
/// Undefined symbols evaluate to an unknown zero in pass 1 and are an error
/// in pass 2.
pub fn eval_expr(expr: &Expr, ctx: &dyn EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Number(value, _) => Ok(Value::known(*value)),
        Expr::Identifier(name, span) => match ctx.lookup_symbol(name) {
            SymbolValue::Known(value) => Ok(Value::known(value)),
            SymbolValue::Forward(value) => Ok(Value::unknown(value)),
            SymbolValue::Undefined if ctx.pass() < 2 => Ok(Value::unknown(0)),
            SymbolValue::Undefined => Err(EvalError::with_span(
                format!("Undefined symbol: {name}"),
                *span,
            )),
        },
        Expr::CurrentAddress(_) => Ok(Value::known(ctx.current_address())),
        Expr::Unary { op, expr, .. } => {
            let val = eval_expr(expr, ctx)?;
            Ok(Value {
                value: apply_unary(*op, val.value),
                known: val.known,
            })
        }
        Expr::Binary {
            op,
            left,
            right,
            span,
        } => {
            let l = eval_expr(left, ctx)?;
            let r = eval_expr(right, ctx)?;
            let known = l.known && r.known;
            match apply_binary(*op, l.value, r.value, *span) {
                Ok(value) => Ok(Value { value, known }),
                // A placeholder divisor of zero is not an error yet.
                Err(_) if !r.known => Ok(Value::unknown(0)),
                Err(err) => Err(err),
            }
        }
    }
}

/// Apply a unary operator to a value.
pub fn apply_unary(op: UnaryOp, val: i64) -> i64 {
    match op {
        UnaryOp::Plus => val,
        UnaryOp::Minus => val.wrapping_neg(),
        UnaryOp::BitNot => !val,
        UnaryOp::LogicNot => (val == 0) as i64,
        UnaryOp::Low => val & 0xff,
        UnaryOp::High => (val >> 8) & 0xff,
        UnaryOp::Bank => (val >> 16) & 0xff,
    }
}

/// Apply a binary operator to two values.
pub fn apply_binary(op: BinaryOp, l: i64, r: i64, span: Span) -> Result<i64, EvalError> {
    Ok(match op {
        BinaryOp::Add => l.wrapping_add(r),
        BinaryOp::Subtract => l.wrapping_sub(r),
        BinaryOp::Multiply => l.wrapping_mul(r),
        BinaryOp::Divide => {
            if r == 0 {
                return Err(EvalError::with_span("Division by zero", span));
            }
            l.wrapping_div(r)
        }
        BinaryOp::Mod => {
            if r == 0 {
                return Err(EvalError::with_span("Modulo by zero", span));
            }
            l.wrapping_rem(r)
        }
        BinaryOp::BitAnd => l & r,
        BinaryOp::BitOr => l | r,
        BinaryOp::BitXor => l ^ r,
        BinaryOp::Shl => l << (r & 0x3f),
        BinaryOp::Shr => ((l as u64) >> (r & 0x3f)) as i64,
        BinaryOp::Eq => (l == r) as i64,
        BinaryOp::Ne => (l != r) as i64,
        BinaryOp::Lt => (l < r) as i64,
        BinaryOp::Le => (l <= r) as i64,
        BinaryOp::Gt => (l > r) as i64,
        BinaryOp::Ge => (l >= r) as i64,
        BinaryOp::LogicAnd => ((l != 0) && (r != 0)) as i64,
        BinaryOp::LogicOr => ((l != 0) || (r != 0)) as i64,
    })
}

/// Binding power of a binary operator token; higher binds tighter.
fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    let TokenKind::Operator(op) = kind else {
        return None;
    };
    Some(match op {
        OperatorKind::LogicOr => (BinaryOp::LogicOr, 1),
        OperatorKind::LogicAnd => (BinaryOp::LogicAnd, 2),
        OperatorKind::BitOr => (BinaryOp::BitOr, 3),
        OperatorKind::BitXor => (BinaryOp::BitXor, 4),
        OperatorKind::BitAnd => (BinaryOp::BitAnd, 5),
        OperatorKind::Eq => (BinaryOp::Eq, 6),
        OperatorKind::Ne => (BinaryOp::Ne, 6),
        OperatorKind::Lt => (BinaryOp::Lt, 7),
        OperatorKind::Le => (BinaryOp::Le, 7),
        OperatorKind::Gt => (BinaryOp::Gt, 7),
        OperatorKind::Ge => (BinaryOp::Ge, 7),
        OperatorKind::Shl => (BinaryOp::Shl, 8),
        OperatorKind::Shr => (BinaryOp::Shr, 8),
        OperatorKind::Plus => (BinaryOp::Add, 9),
        OperatorKind::Minus => (BinaryOp::Subtract, 9),
        OperatorKind::Multiply => (BinaryOp::Multiply, 10),
        OperatorKind::Divide => (BinaryOp::Divide, 10),
        OperatorKind::Mod => (BinaryOp::Mod, 10),
        OperatorKind::BitNot | OperatorKind::LogicNot => return None,
    })
}

/// Parse one expression, stopping at the first token that cannot continue it.
pub fn parse_expr(cursor: &mut TokenCursor) -> Result<Expr, AsmError> {
    parse_binary(cursor, 0)
}

fn parse_binary(cursor: &mut TokenCursor, min_power: u8) -> Result<Expr, AsmError> {
    let mut left = parse_unary(cursor)?;
    while let Some((op, power)) = binary_op(cursor.peek_kind()) {
        if power <= min_power {
            break;
        }
        cursor.advance();
        let right = parse_binary(cursor, power)?;
        let span = left.span().join(right.span());
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        };
    }
    Ok(left)
}

fn parse_unary(cursor: &mut TokenCursor) -> Result<Expr, AsmError> {
    let op = match cursor.peek_kind() {
        TokenKind::Operator(OperatorKind::Plus) => UnaryOp::Plus,
        TokenKind::Operator(OperatorKind::Minus) => UnaryOp::Minus,
        TokenKind::Operator(OperatorKind::BitNot) => UnaryOp::BitNot,
        TokenKind::Operator(OperatorKind::LogicNot) => UnaryOp::LogicNot,
        _ => return parse_primary(cursor),
    };
    let span = cursor.advance().span;
    let inner = parse_unary(cursor)?;
    Ok(Expr::unary(op, inner, span))
}

fn parse_primary(cursor: &mut TokenCursor) -> Result<Expr, AsmError> {
    let token = cursor.peek().clone();
    match token.kind {
        TokenKind::Number(lit) => {
            cursor.advance();
            let value = lit.value().ok_or_else(|| {
                AsmError::new(AsmErrorKind::Expression, "Invalid number", Some(&lit.text))
                    .with_span(token.span)
            })?;
            Ok(Expr::Number(value, token.span))
        }
        TokenKind::Identifier(name) => {
            cursor.advance();
            Ok(Expr::Identifier(name, token.span))
        }
        TokenKind::String(lit) => {
            cursor.advance();
            match lit.bytes.as_slice() {
                [b] => Ok(Expr::Number(*b as i64, token.span)),
                [hi, lo] => Ok(Expr::Number(((*hi as i64) << 8) | *lo as i64, token.span)),
                _ => Err(AsmError::new(
                    AsmErrorKind::Expression,
                    "Multi-character string not allowed in expression",
                    None,
                )
                .with_span(token.span)),
            }
        }
        TokenKind::Dollar | TokenKind::Operator(OperatorKind::Multiply) => {
            cursor.advance();
            Ok(Expr::CurrentAddress(token.span))
        }
        TokenKind::OpenParen => {
            cursor.advance();
            let inner = parse_binary(cursor, 0)?;
            cursor.expect(&TokenKind::CloseParen, "')'")?;
            Ok(inner)
        }
        _ => Err(cursor.unexpected("expression")),
    }
}
