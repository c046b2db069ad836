// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Motorola 68000 CPU family.
//!
//! Big-endian, 24-bit address bus. Instructions are one opcode word
//! followed by the extension words of the source, then the destination.
//! Sizes come from the `.B`/`.W`/`.L` mnemonic suffix (word when absent);
//! branches take `.S` for the 8-bit form.
//!
//! | Operand        | Mode                         |
//! |----------------|------------------------------|
//! | `Dn` / `An`    | register direct              |
//! | `(An)`         | indirect                     |
//! | `(An)+`/`-(An)`| postincrement / predecrement |
//! | `d(An)`        | displacement                 |
//! | `d(An,Xn.s)`   | indexed                      |
//! | `addr[.W/.L]`  | absolute short or long       |
//! | `d(PC)`        | PC relative                  |
//! | `d(PC,Xn.s)`   | PC relative indexed          |
//! | `#expr`        | immediate                    |

mod handler;
pub mod module;
mod operand;
mod table;

pub use handler::M68kHandler;
pub use operand::{parse_ea, Ea, Size};
pub use table::INSTRUCTION_TABLE;
