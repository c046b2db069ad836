// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 6809 CPU family.
//!
//! Big-endian, 16-bit address space. Plain addresses use direct mode when
//! they fall in the page chosen with `SETDP` (page 0 at the start of each
//! pass) and extended mode otherwise.

mod handler;
pub mod module;
mod operand;
mod table;

pub use handler::{M6809Handler, DP_KEY};
pub use operand::{parse_operand, IndexMode, OperandForm};
pub use table::INSTRUCTION_TABLE;
