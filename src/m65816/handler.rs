// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! 65816 CPU handler implementation.

use tracing::trace;

use crate::core::assembler::error::AsmError;
use crate::core::cursor::TokenCursor;
use crate::core::emit::InstructionBuffer;
use crate::core::family::{AssemblerContext, CpuHandler, EncodeOutcome};
use crate::core::state::CpuState;
use crate::families::mos6502::{MOS6502Handler, Variant};
use crate::m65816::state;

/// CPU handler for WDC 65816.
#[derive(Debug)]
pub struct M65816CpuHandler {
    baseline: MOS6502Handler,
}

impl Default for M65816CpuHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl M65816CpuHandler {
    pub fn new() -> Self {
        Self {
            baseline: MOS6502Handler::new(Variant::M65816),
        }
    }
}

impl CpuHandler for M65816CpuHandler {
    fn encode(
        &self,
        mnemonic: &str,
        cursor: &mut TokenCursor,
        ctx: &dyn AssemblerContext,
        buf: &mut InstructionBuffer,
    ) -> EncodeOutcome {
        self.baseline.encode(mnemonic, cursor, ctx, buf)
    }

    fn label_op(
        &self,
        name: &str,
        cursor: &mut TokenCursor,
        _ctx: &dyn AssemblerContext,
        cpu_state: &mut CpuState,
    ) -> Option<Result<(), AsmError>> {
        let key = state::hint_key(name)?;
        Some(state::parse_switch(cursor).map(|on| {
            trace!(key, on, "65816 width hint");
            cpu_state.set_flag(key, on);
        }))
    }

    fn pass_init(&self, cpu_state: &mut CpuState) {
        state::reset(cpu_state);
    }
}
