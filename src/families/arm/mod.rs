// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! ARM CPU family.
//!
//! 32-bit fixed-width instructions with a condition field on every word.
//! Little endian by default; `ARMBE` selects big-endian output. Branches
//! and PC-relative loads are measured from the instruction address plus 8.

mod handler;
pub mod module;
mod operand;
mod table;

pub use handler::{encode_immediate, ArmHandler};
pub use operand::{parse_address, parse_operand2, Address, Operand2};
pub use table::INSTRUCTION_TABLE;
