// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! WDC 65816 support on top of the MOS 6502 family.
//!
//! The family table already carries the 65816 opcodes. This module adds the
//! register-width hints that decide how wide `#` operands are.

pub mod handler;
pub mod module;
pub mod state;

pub use handler::M65816CpuHandler;
