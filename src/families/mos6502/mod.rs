// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! MOS 6502 CPU family.
//!
//! One handler serves the 6502, 65C02 and 65816; the opcode table records
//! which CPUs accept each (mode, opcode) pair.
//!
//! # Addressing Modes (Family Common)
//!
//! | Syntax | Mode |
//! |--------|------|
//! | `#$20` | Immediate |
//! | `$20` | Zero Page |
//! | `$20,X` | Zero Page,X |
//! | `$20,Y` | Zero Page,Y |
//! | `$1234` | Absolute |
//! | `$1234,X` | Absolute,X |
//! | `$1234,Y` | Absolute,Y |
//! | `($20,X)` | Indexed Indirect |
//! | `($20),Y` | Indirect Indexed |
//!
//! # CPU Extensions
//!
//! - `($20)` and `($1234,X)` need a 65C02 or 65816
//! - `[$20]`, `[$20],Y`, `$123456`, `3,S` and `(3,S),Y` are 65816 only
//!
//! A value prefixed with `<`, `>` or `>>` forces the direct, absolute or
//! long form. `#<`, `#>` and `#^` pick the low, high or bank byte.

mod handler;
pub mod module;
mod operand;
mod table;

pub use handler::MOS6502Handler;
pub use operand::{parse_operand, AddressMode, OperandForm};
pub use table::{has_mnemonic, Variant, FAMILY_INSTRUCTION_TABLE};
