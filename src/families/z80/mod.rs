// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Zilog Z80 CPU family.
//!
//! Little-endian, 16-bit address space. `IX`/`IY` forms reuse the `HL`
//! opcodes behind a `DD`/`FD` prefix; on the `CB` page the displacement
//! of `(IX+d)` comes before the opcode byte.

mod handler;
pub mod module;
mod operand;
mod table;

pub use handler::Z80Handler;
pub use operand::{parse_operand, Index, Operand, Pair};
pub use table::INSTRUCTION_TABLE;
