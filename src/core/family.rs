// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! CPU handler abstraction.
//!
//! # Architecture Overview
//!
//! ```text
//! Driver (labels, directives, passes) → CpuHandler → InstructionBuffer
//!                                           │
//!                       dispatch table ─────┼───── operand resolver
//!                                           │
//!                                   width selector / range checks
//! ```
//!
//! - **Driver**: splits lines, evaluates directives, owns the symbol table
//!   and the pass loop.
//! - **CpuHandler**: looks the mnemonic up in its table, resolves the
//!   operand tokens into an addressing mode and emits bytes.
//!
//! Handlers never see the symbol table directly. They evaluate expressions
//! through [`AssemblerContext`], which reports whether a value is known.

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::expr::{Expr, Value};
use crate::core::state::CpuState;

/// Outcome of asking a handler to encode one instruction.
#[derive(Debug, Clone)]
pub enum EncodeOutcome {
    /// Encoded; bytes and any recoverable diagnostics are in the buffer.
    Ok,
    /// The mnemonic is not in this handler's table.
    NotFound,
    /// The mnemonic exists in the family but not on the selected CPU.
    NotApplicable,
    /// Encoding failed. Bytes already emitted stay in the buffer.
    Error(AsmError),
}

impl EncodeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, EncodeOutcome::Ok)
    }
}

impl From<Result<(), AsmError>> for EncodeOutcome {
    fn from(result: Result<(), AsmError>) -> Self {
        match result {
            Ok(()) => EncodeOutcome::Ok,
            Err(err) => EncodeOutcome::Error(err),
        }
    }
}

/// Assembler services available to handlers while encoding.
pub trait AssemblerContext {
    /// Evaluate an expression in the current pass.
    fn eval(&self, expr: &Expr) -> Result<Value, AsmError>;

    /// Address of the instruction being encoded.
    fn current_address(&self) -> u32;

    /// Current pass, 1 or 2.
    fn pass(&self) -> u8;

    /// Mode state of the selected CPU.
    fn state(&self) -> &CpuState;
}

/// Instruction encoder for one CPU variant.
pub trait CpuHandler: Send + Sync {
    /// Encode `mnemonic` with the operands remaining in `cursor`.
    fn encode(
        &self,
        mnemonic: &str,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> EncodeOutcome;

    /// Handle a CPU-specific pseudo-op (`LONGA`, `SETDP`, ...). Returns
    /// `None` when `name` is not one of this CPU's pseudo-ops.
    fn label_op(
        &self,
        _name: &str,
        _cursor: &mut TokenCursor,
        _ctx: &dyn AssemblerContext,
        _state: &mut CpuState,
    ) -> Option<Result<(), AsmError>> {
        None
    }

    /// Reset per-pass mode state.
    fn pass_init(&self, _state: &mut CpuState) {}
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::assembler::error::AsmErrorKind;
    use crate::core::cpu::Endianness;
    use crate::core::expr::tests::MapContext;
    use crate::core::expr::{eval_expr, EvalContext};

    /// Context for handler tests backed by a symbol map.
    pub(crate) struct TestContext {
        pub symbols: MapContext,
        pub state: CpuState,
    }

    impl TestContext {
        pub fn new() -> Self {
            Self {
                symbols: MapContext::new(2),
                state: CpuState::new(),
            }
        }

        pub fn at(addr: i64) -> Self {
            let mut ctx = Self::new();
            ctx.symbols.addr = addr;
            ctx
        }
    }

    impl AssemblerContext for TestContext {
        fn eval(&self, expr: &Expr) -> Result<Value, AsmError> {
            Ok(eval_expr(expr, &self.symbols)?)
        }

        fn current_address(&self) -> u32 {
            self.symbols.current_address() as u32
        }

        fn pass(&self) -> u8 {
            self.symbols.pass
        }

        fn state(&self) -> &CpuState {
            &self.state
        }
    }

    /// Encode one source line, returning bytes and recoverable errors.
    pub(crate) fn run(
        handler: &dyn CpuHandler,
        ctx: &TestContext,
        endian: Endianness,
        line: &str,
    ) -> Result<(Vec<u8>, Vec<AsmError>), AsmError> {
        let line = line.trim();
        let (mnemonic, rest) = line.split_once(' ').unwrap_or((line, ""));
        let mut cursor = TokenCursor::from_line(rest, 1)?;
        let mut buf = InstructionBuffer::new(endian);
        match handler.encode(mnemonic, &mut cursor, ctx, &mut buf) {
            EncodeOutcome::Ok => {
                let (bytes, errors, _) = buf.into_parts();
                Ok((bytes, errors))
            }
            EncodeOutcome::Error(err) => Err(err),
            EncodeOutcome::NotFound => Err(AsmError::unknown_mnemonic(mnemonic)),
            EncodeOutcome::NotApplicable => Err(AsmError::new(
                AsmErrorKind::Cpu,
                "Not available on this CPU",
                Some(mnemonic),
            )),
        }
    }

    #[test]
    fn result_converts_to_outcome() {
        assert!(EncodeOutcome::from(Ok(())).is_ok());
        let outcome = EncodeOutcome::from(Err(AsmError::missing_operand()));
        assert!(matches!(outcome, EncodeOutcome::Error(_)));
    }
}
